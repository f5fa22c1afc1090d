//! Input validation applied before any request is sent
//!
//! Mirrors the backend's own rules so malformed input fails fast with a
//! field-specific message instead of a round trip.

use attendance_core::{validation_error, AttendanceResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use regex::Regex;
use std::sync::LazyLock;

/// Upper bound on the decoded photo size accepted by the backend
pub const MAX_PHOTO_BYTES: usize = 4_000_000;

static EUID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{3}\d{4}$").expect("valid euid pattern"));
static CLASS_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{4}_\d{4}_\d{3}$").expect("valid class code pattern"));
static JOIN_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{6,12}$").expect("valid join code pattern"));

const COMPONENT: &str = "validation";

/// `abc1234`: three lowercase letters and four digits
pub fn validate_euid(euid: &str) -> AttendanceResult<String> {
    let euid = euid.trim();
    if euid.is_empty() {
        return Err(validation_error!("euid is required", "euid", COMPONENT));
    }
    if euid != euid.to_lowercase() {
        return Err(validation_error!("euid must be lowercase", "euid", COMPONENT));
    }
    if !EUID_RE.is_match(euid) {
        return Err(validation_error!(
            "euid must match 'abc1234' (3 letters + 4 digits, lowercase)",
            "euid",
            COMPONENT
        ));
    }
    Ok(euid.to_string())
}

/// `abcd_1234_123`
pub fn validate_class_code(code: &str) -> AttendanceResult<String> {
    let code = code.trim();
    if code != code.to_lowercase() {
        return Err(validation_error!("code must be lowercase", "code", COMPONENT));
    }
    if !CLASS_CODE_RE.is_match(code) {
        return Err(validation_error!(
            "code must match 'abcd_1234_123' (4 letters_4 digits_3 digits, lowercase)",
            "code",
            COMPONENT
        ));
    }
    Ok(code.to_string())
}

/// 6-12 uppercase letters or digits
pub fn validate_join_code(join_code: &str) -> AttendanceResult<String> {
    let join_code = join_code.trim();
    if join_code != join_code.to_uppercase() {
        return Err(validation_error!(
            "join_code must be uppercase",
            "join_code",
            COMPONENT
        ));
    }
    if !JOIN_CODE_RE.is_match(join_code) {
        return Err(validation_error!(
            "join_code must be 6-12 chars (A-Z, 0-9)",
            "join_code",
            COMPONENT
        ));
    }
    Ok(join_code.to_string())
}

/// Non-empty standard base64 decoding to at most [`MAX_PHOTO_BYTES`]
pub fn validate_photo(photo: &str) -> AttendanceResult<String> {
    let photo = photo.trim();
    if photo.is_empty() {
        return Err(validation_error!(
            "photo must be a base64-encoded string",
            "photo",
            COMPONENT
        ));
    }

    let decoded = BASE64
        .decode(photo)
        .map_err(|_| validation_error!("photo must be valid base64", "photo", COMPONENT))?;

    if decoded.len() > MAX_PHOTO_BYTES {
        return Err(validation_error!(
            format!("photo is too large (> {} bytes)", MAX_PHOTO_BYTES),
            "photo",
            COMPONENT
        ));
    }

    Ok(photo.to_string())
}

/// Passwords are sent as typed; only emptiness is rejected
pub fn validate_password(password: &str) -> AttendanceResult<()> {
    if password.is_empty() {
        return Err(validation_error!(
            "password is required",
            "password",
            COMPONENT
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_core::AttendanceError;

    fn field_of(result: AttendanceResult<String>) -> Option<String> {
        match result {
            Err(AttendanceError::Validation { field, .. }) => field,
            _ => None,
        }
    }

    #[test]
    fn euid_rules() {
        assert_eq!(validate_euid("  gdb2356 ").unwrap(), "gdb2356");
        assert!(validate_euid("GDB2356").is_err());
        assert!(validate_euid("gd2356").is_err());
        assert!(validate_euid("e123").is_err());
        assert_eq!(field_of(validate_euid("")), Some("euid".to_string()));
    }

    #[test]
    fn class_code_rules() {
        assert_eq!(
            validate_class_code("csce_4900_500").unwrap(),
            "csce_4900_500"
        );
        assert!(validate_class_code("CSCE_4900_500").is_err());
        assert!(validate_class_code("csce-4900-500").is_err());
        assert_eq!(
            field_of(validate_class_code("cs_1_1")),
            Some("code".to_string())
        );
    }

    #[test]
    fn join_code_rules() {
        assert_eq!(validate_join_code(" AB12CD34 ").unwrap(), "AB12CD34");
        assert!(validate_join_code("ab12cd34").is_err());
        assert!(validate_join_code("AB12").is_err());
        assert!(validate_join_code("AB12CD34EF567").is_err());
    }

    #[test]
    fn photo_rules() {
        assert_eq!(validate_photo(" aGVsbG8= ").unwrap(), "aGVsbG8=");
        assert!(validate_photo("").is_err());
        assert!(validate_photo("not base64!").is_err());

        let too_big = BASE64.encode(vec![0u8; MAX_PHOTO_BYTES + 1]);
        assert_eq!(field_of(validate_photo(&too_big)), Some("photo".to_string()));
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("pw").is_ok());
        assert!(validate_password(" ").is_ok());
        assert!(validate_password("").is_err());
    }
}
