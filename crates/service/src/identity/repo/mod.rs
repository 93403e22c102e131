//! Storage-backed implementations of [`super::repository::IdentityRepository`].

pub mod seaorm;
