//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted display name, in characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 32;
/// Longest accepted user identifier, in bytes.
pub const MAX_USER_ID_LEN: usize = 64;

/// Validates that a user ID is 1 to 64 characters of `[A-Za-z0-9_-]`.
///
/// The id doubles as a profile file name, so anything that could escape the directory is refused.
///
/// # Examples
///
/// ```ignore
/// validate_user_id("ada_42")   // Ok
/// validate_user_id("../etc")   // Err - forbidden characters
/// validate_user_id("")         // Err - empty
/// ```
pub fn validate_user_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_USER_ID_LEN {
        let mut err = ValidationError::new("user_id_length");
        err.message = Some(
            format!(
                "User ID must be between 1 and {MAX_USER_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        let mut err = ValidationError::new("user_id_format");
        err.message = Some("User ID may only contain letters, digits, '_' and '-'".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a display name is not blank and at most 32 characters once trimmed.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("Display name must not be blank".into());
        return Err(err);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_DISPLAY_NAME_CHARS {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!("Display name must be at most {MAX_DISPLAY_NAME_CHARS} characters (got {chars})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id_valid() {
        assert!(validate_user_id("ada").is_ok());
        assert!(validate_user_id("Ada_Lovelace-1815").is_ok());
        assert!(validate_user_id(&"x".repeat(64)).is_ok());
    }

    #[test]
    fn test_validate_user_id_invalid_length() {
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_user_id_invalid_format() {
        assert!(validate_user_id("../secrets").is_err()); // path traversal
        assert!(validate_user_id("ada lovelace").is_err()); // space
        assert!(validate_user_id("ada.json").is_err()); // dot
        assert!(validate_user_id("adé").is_err()); // non-ascii
    }

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Ada").is_ok());
        assert!(validate_display_name("  Ada  ").is_ok());
        assert!(validate_display_name(&"é".repeat(32)).is_ok());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"a".repeat(33)).is_err());
    }
}
