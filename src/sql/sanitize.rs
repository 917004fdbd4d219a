//! SQL identifier validation
//!
//! Identifiers cannot be bound as parameters, so table and column names are
//! always quoted through [`Dialect::quote_identifier`](crate::Dialect::quote_identifier).
//! Validation only rejects names no backend can hold.

/// Maximum identifier length (SQL Server's limit; PostgreSQL truncates at 63)
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate a table or column name
///
/// Rules:
/// - Must not be empty or whitespace only
/// - Must not contain NUL or other control characters
/// - Must not exceed [`MAX_IDENTIFIER_LENGTH`] bytes
///
/// # Example
/// ```
/// use tableio::sql::validate_identifier;
///
/// assert!(validate_identifier("people").is_ok());
/// assert!(validate_identifier("order").is_ok()); // quoted, so keywords are fine
/// assert!(validate_identifier("").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(format!(
            "Identifier {:?} contains control characters",
            name
        ));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("people").is_ok());
        assert!(validate_identifier("order_lines").is_ok());
        assert!(validate_identifier("Name").is_ok());
        assert!(validate_identifier("日本語").is_ok());
        assert!(validate_identifier("select").is_ok());
    }

    #[test]
    fn test_validate_identifier_empty() {
        let result = validate_identifier("");
        assert!(result.unwrap_err().contains("cannot be empty"));
        assert!(validate_identifier("   ").is_err());
    }

    #[test]
    fn test_validate_identifier_control_chars() {
        assert!(validate_identifier("bad\0name").is_err());
        assert!(validate_identifier("bad\nname").is_err());
    }

    #[test]
    fn test_validate_identifier_length() {
        let ok = "a".repeat(MAX_IDENTIFIER_LENGTH);
        let too_long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(validate_identifier(&ok).is_ok());
        assert!(
            validate_identifier(&too_long)
                .unwrap_err()
                .contains("maximum length")
        );
    }
}
