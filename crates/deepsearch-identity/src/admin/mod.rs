//! Identity provider admin REST API.

pub mod client;
pub mod token;

pub use client::IdentityAdminClient;
