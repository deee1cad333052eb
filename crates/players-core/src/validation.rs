use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{6,20}$").expect("valid regex"));
static COUNTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").expect("valid regex"));
static LOCALE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}([_-][A-Z]{2})?$").expect("valid regex"));

/// Validator for player fields.
pub struct Validator;

impl Validator {
    /// Trim and lower-case an email address.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Validate an already normalized email.
    pub fn validate_email(email: &str) -> Result<(), ValidationError> {
        if email.is_empty() || !EMAIL_RE.is_match(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }
        Ok(())
    }

    /// Optional leading `+`, then 6 to 20 digits.
    pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
        if !PHONE_RE.is_match(phone) {
            return Err(ValidationError::InvalidPhone(phone.to_string()));
        }
        Ok(())
    }

    /// ISO 3166 alpha-2, upper case.
    pub fn validate_country_code(code: &str) -> Result<(), ValidationError> {
        if !COUNTRY_RE.is_match(code) {
            return Err(ValidationError::InvalidCountryCode(code.to_string()));
        }
        Ok(())
    }

    /// Language with optional region, e.g. `en`, `en_US`, `pt-BR`.
    pub fn validate_locale(locale: &str) -> Result<(), ValidationError> {
        if !LOCALE_RE.is_match(locale) {
            return Err(ValidationError::InvalidLocale(locale.to_string()));
        }
        Ok(())
    }

    /// Must name an IANA time zone.
    pub fn validate_time_zone(tz: &str) -> Result<(), ValidationError> {
        chrono_tz::Tz::from_str(tz)
            .map(|_| ())
            .map_err(|_| ValidationError::InvalidTimeZone(tz.to_string()))
    }

    /// A status reason must contain something other than whitespace.
    pub fn validate_reason(reason: &str) -> Result<(), ValidationError> {
        if reason.trim().is_empty() {
            return Err(ValidationError::MissingReason);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(Validator::normalize_email("  A@B.com "), "a@b.com");
    }

    #[test]
    fn test_valid_email() {
        assert!(Validator::validate_email("a@b.com").is_ok());
        assert!(Validator::validate_email("first.last+tag@example.co.uk").is_ok());
    }

    #[test]
    fn test_invalid_email() {
        assert!(Validator::validate_email("").is_err());
        assert!(Validator::validate_email("no-at-sign.com").is_err());
        assert!(Validator::validate_email("a@b").is_err());
        assert!(Validator::validate_email("a b@c.com").is_err());
        assert!(Validator::validate_email("a@@b.com").is_err());
    }

    #[test]
    fn test_phone() {
        assert!(Validator::validate_phone("+4712345678").is_ok());
        assert!(Validator::validate_phone("123456").is_ok());
        assert!(Validator::validate_phone("12345").is_err());
        assert!(Validator::validate_phone("+47 123 45 678").is_err());
        assert!(Validator::validate_phone(&"1".repeat(21)).is_err());
    }

    #[test]
    fn test_country_code() {
        assert!(Validator::validate_country_code("NO").is_ok());
        assert!(Validator::validate_country_code("no").is_err());
        assert!(Validator::validate_country_code("NOR").is_err());
    }

    #[test]
    fn test_locale() {
        assert!(Validator::validate_locale("en").is_ok());
        assert!(Validator::validate_locale("en_US").is_ok());
        assert!(Validator::validate_locale("pt-BR").is_ok());
        assert!(Validator::validate_locale("EN").is_err());
        assert!(Validator::validate_locale("en_us").is_err());
    }

    #[test]
    fn test_time_zone() {
        assert!(Validator::validate_time_zone("Europe/Oslo").is_ok());
        assert!(Validator::validate_time_zone("UTC").is_ok());
        assert!(Validator::validate_time_zone("Mars/Olympus").is_err());
    }

    #[test]
    fn test_reason() {
        assert!(Validator::validate_reason("fraud").is_ok());
        assert_eq!(
            Validator::validate_reason("   "),
            Err(ValidationError::MissingReason)
        );
        assert_eq!(
            Validator::validate_reason(""),
            Err(ValidationError::MissingReason)
        );
    }
}
