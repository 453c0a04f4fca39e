//! Common validation utilities.

use validator::ValidationError;

/// Length of a group invite code.
pub const INVITE_CODE_LENGTH: usize = 10;

/// Alphabet used for group invite codes.
pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Highest score a team can be credited with in a single series.
pub const MAX_SERIES_SCORE: i32 = 99;

lazy_static::lazy_static! {
    static ref INVITE_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Z0-9]{10}$").unwrap();
}

/// Validates that an invite code is exactly 10 uppercase alphanumeric characters.
pub fn validate_invite_code(code: &str) -> Result<(), ValidationError> {
    if INVITE_CODE_REGEX.is_match(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invite_code_format");
        err.message = Some("Invite code must be 10 uppercase letters or digits".into());
        Err(err)
    }
}

/// Validates that a series score is within range (0 to 99).
pub fn validate_series_score(score: i32) -> Result<(), ValidationError> {
    if (0..=MAX_SERIES_SCORE).contains(&score) {
        Ok(())
    } else {
        let mut err = ValidationError::new("score_range");
        err.message = Some("Score must be between 0 and 99".into());
        Err(err)
    }
}

/// Validates a team name: non-blank and at most 100 characters.
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 100 {
        let mut err = ValidationError::new("team_name");
        err.message = Some("Team name must be between 1 and 100 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Normalizes an invite code typed by a user (trims and uppercases).
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_invite_code() {
        assert!(validate_invite_code("ABCDE12345").is_ok());
        assert!(validate_invite_code("0000000000").is_ok());
        assert!(validate_invite_code("ABCDE1234").is_err());
        assert!(validate_invite_code("ABCDE123456").is_err());
        assert!(validate_invite_code("abcde12345").is_err());
        assert!(validate_invite_code("ABC-E12345").is_err());
        assert!(validate_invite_code("").is_err());
    }

    #[test]
    fn test_validate_invite_code_error_message() {
        let err = validate_invite_code("nope").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Invite code must be 10 uppercase letters or digits"
        );
    }

    #[test]
    fn test_invite_code_alphabet_matches_regex() {
        let code: String = INVITE_CODE_ALPHABET
            .iter()
            .take(INVITE_CODE_LENGTH)
            .map(|b| *b as char)
            .collect();
        assert!(validate_invite_code(&code).is_ok());
        assert_eq!(INVITE_CODE_ALPHABET.len(), 36);
    }

    #[test]
    fn test_validate_series_score() {
        assert!(validate_series_score(0).is_ok());
        assert!(validate_series_score(3).is_ok());
        assert!(validate_series_score(99).is_ok());
        assert!(validate_series_score(-1).is_err());
        assert!(validate_series_score(100).is_err());
    }

    #[test]
    fn test_validate_team_name() {
        assert!(validate_team_name("T1").is_ok());
        assert!(validate_team_name("Gen.G").is_ok());
        assert!(validate_team_name("   ").is_err());
        assert!(validate_team_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_normalize_invite_code() {
        assert_eq!(normalize_invite_code("  abcde12345 "), "ABCDE12345");
    }
}
