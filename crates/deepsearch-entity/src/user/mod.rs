//! Identity provider user representations.

pub mod model;

pub use model::{IdentityUser, NewIdentityUser};
