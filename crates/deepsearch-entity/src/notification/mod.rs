//! User notifications.

pub mod model;

pub use model::{NewNotification, Notification};
