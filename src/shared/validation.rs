//! Validation Utilities

use validator::{ValidationError, ValidationErrors};

use super::error::ChatError;

/// Convert validation errors to ChatError
pub fn validation_error(errors: ValidationErrors) -> ChatError {
    let message = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let detail = e
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, detail)
            })
        })
        .next()
        .unwrap_or_else(|| "Validation failed".into());

    ChatError::Validation(message)
}

/// Reject strings that are empty or contain only whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}
