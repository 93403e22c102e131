//! First-login provisioning and password credentials.

pub mod domain;
pub mod errors;
pub mod hasher;
pub mod repo;
pub mod repository;
pub mod service;
pub mod username;

pub use errors::IdentityError;
pub use service::{IdentityConfig, IdentityService};
