//! Request DTOs with validation rules.

use serde::{Deserialize, Serialize};
use validator::Validate;

use deepsearch_core::error::AppError;
use deepsearch_docstore::DocumentQuery;

/// Query parameters for the document listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentListQuery {
    /// Field to order results by.
    pub ordering: Option<String>,
    /// Page number.
    pub page: Option<u32>,
    /// Results per page.
    pub page_size: Option<u32>,
}

impl From<DocumentListQuery> for DocumentQuery {
    fn from(query: DocumentListQuery) -> Self {
        Self {
            ordering: query.ordering,
            page: query.page,
            page_size: query.page_size,
        }
    }
}

/// Body for creating a user in the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Desired username.
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    /// Email address.
    #[validate(email)]
    pub email: String,
    /// Initial password.
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Body for creating a notification for a user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    /// Recipient's subject id.
    #[validate(length(min = 1))]
    pub user_id: String,
    /// Short title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Notification body.
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    /// Category string.
    #[serde(default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    "info".to_string()
}

/// Run derive-based validation, mapping failures into the domain error.
pub fn validated<T: Validate>(value: T) -> Result<T, AppError> {
    value
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_rejects_short_password() {
        let req = CreateUserRequest {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(validated(req).is_err());
    }

    #[test]
    fn test_create_user_accepts_valid_input() {
        let req = CreateUserRequest {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "a-long-password".to_string(),
        };
        assert!(validated(req).is_ok());
    }

    #[test]
    fn test_notification_kind_defaults_to_info() {
        let req: CreateNotificationRequest = serde_json::from_str(
            r#"{"user_id": "u1", "title": "Hello", "message": "World"}"#,
        )
        .expect("deserialize");
        assert_eq!(req.kind, "info");
    }
}
