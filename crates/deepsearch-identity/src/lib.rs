//! # deepsearch-identity
//!
//! Integration with the external identity provider. Two halves:
//!
//! - [`jwt`] — local verification of provider-issued bearer tokens
//!   (subject, username, email, realm roles).
//! - [`admin`] — the provider's admin REST API, called with a cached
//!   client-credentials service-account token.
//!
//! This service never issues or refreshes end-user tokens; it is handed a
//! currently-valid credential by its callers.

pub mod admin;
pub mod jwt;

pub use admin::client::IdentityAdminClient;
pub use jwt::claims::Claims;
pub use jwt::decoder::JwtDecoder;
