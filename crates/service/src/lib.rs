//! Service layer for the college portal identity flows.
//! - Business logic stays independent of the web framework.
//! - Persistence sits behind `identity::repository::IdentityRepository`.
//! - External login providers sit behind `oauth::OAuthProvider`.

pub mod identity;
pub mod oauth;
#[cfg(test)]
pub mod test_support;
