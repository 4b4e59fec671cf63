/// Shared types used across the codebase

use crate::database::dynamic::DynamicValue;
use crate::error::ApiError;

/// DTOs that render themselves into a dynamic payload
pub trait Encodable {
    fn encode(&self) -> DynamicValue;
}

/// DTOs built from a decrypted dynamic payload.
///
/// Decoders call [`normalize_text`] on every string field they read, so the
/// trimming rule lives in one place rather than in each handler.
pub trait Decodable: Sized {
    fn decode(value: &DynamicValue) -> Result<Self, ApiError>;

    /// Parse wire-JSON bytes first, then decode
    fn decode_bytes(bytes: &[u8]) -> Result<Self, ApiError> {
        let value = DynamicValue::from_slice(bytes)?;
        Self::decode(&value)
    }
}

/// Strip leading and trailing spaces and tabs. Newlines are kept.
pub fn normalize_text(input: &str) -> String {
    input
        .trim_matches(|c: char| c.is_whitespace() && c != '\n' && c != '\r')
        .to_string()
}

/// Normalized string field; a missing field or a non-string reads as empty
pub fn text_field(value: &DynamicValue, key: &str) -> String {
    normalize_text(&value[key].string_value())
}

/// Normalized string field that must be present and non-empty
pub fn required_text(value: &DynamicValue, key: &str, message: &str) -> Result<String, ApiError> {
    let text = text_field(value, key);
    if text.is_empty() {
        return Err(ApiError::validation_failed(message));
    }
    Ok(text)
}

/// Normalized string field, `None` when absent or blank
pub fn optional_text(value: &DynamicValue, key: &str) -> Option<String> {
    let text = text_field(value, key);
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_keeps_newlines() {
        assert_eq!(normalize_text("  hello \t"), "hello");
        assert_eq!(normalize_text("\nline\n"), "\nline\n");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn required_text_rejects_blank_values() {
        let value = DynamicValue::map().with("name", "   ").with("city", " Ranchi ");
        let err = required_text(&value, "name", "Name is required").unwrap_err();
        assert_eq!(err.message(), "Name is required");
        assert_eq!(required_text(&value, "city", "City is required").unwrap(), "Ranchi");
        assert_eq!(optional_text(&value, "name"), None);
        assert_eq!(optional_text(&value, "missing"), None);
    }
}
