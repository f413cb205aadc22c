//! Inbound frame validation rules.

use deepsearch_core::error::AppError;

/// Validates a raw inbound frame before parsing.
pub fn validate_frame(raw: &str, max_bytes: usize) -> Result<(), AppError> {
    if raw.len() > max_bytes {
        return Err(AppError::validation(format!(
            "Frame exceeds maximum size of {max_bytes} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty frame"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_oversized_frame() {
        let raw = "x".repeat(100);
        assert!(validate_frame(&raw, 64).is_err());
    }

    #[test]
    fn test_rejects_blank_frame() {
        assert!(validate_frame("   ", 1024).is_err());
    }

    #[test]
    fn test_accepts_normal_frame() {
        assert!(validate_frame("{\"senderId\":\"u1\"}", 1024).is_ok());
    }
}
