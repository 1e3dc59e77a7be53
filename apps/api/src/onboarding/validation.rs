//! Field validators for onboarding and profile edits.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::AppError;
use crate::matching::filters::{EXPERIENCE_CEILING, SALARY_CEILING};

static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").expect("valid mobile pattern"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("valid email pattern")
});
static PINCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]{5}$").expect("valid pincode pattern"));

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}

/// Trimmed, non-empty text or a validation error naming `field`.
pub fn require_text(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Ten-digit mobile number. Spaces, dashes and a `+91`, `91` or `0` prefix
/// are stripped before matching; the normalized digits are returned.
pub fn validate_mobile(raw: &str) -> Result<String, AppError> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    let digits = digits
        .strip_prefix("+91")
        .or_else(|| digits.strip_prefix("91").filter(|_| digits.len() == 12))
        .or_else(|| digits.strip_prefix("0").filter(|_| digits.len() == 11))
        .unwrap_or(&digits);
    if MOBILE_RE.is_match(digits) {
        Ok(digits.to_string())
    } else {
        Err(invalid("mobile must be a valid 10-digit number"))
    }
}

pub fn validate_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim();
    if EMAIL_RE.is_match(email) {
        Ok(email.to_lowercase())
    } else {
        Err(invalid("email address is not valid"))
    }
}

pub fn validate_pincode(raw: &str) -> Result<String, AppError> {
    let pincode = raw.trim();
    if PINCODE_RE.is_match(pincode) {
        Ok(pincode.to_string())
    } else {
        Err(invalid("pincode must be 6 digits"))
    }
}

pub fn validate_salary_range(min: Option<i64>, max: Option<i64>) -> Result<(), AppError> {
    for value in [min, max].into_iter().flatten() {
        if !(0..=SALARY_CEILING * 10).contains(&value) {
            return Err(invalid("expected salary is out of range"));
        }
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(invalid("expected salary minimum exceeds maximum"));
        }
    }
    Ok(())
}

pub fn validate_experience(years: i32) -> Result<(), AppError> {
    if years < 0 || i64::from(years) > EXPERIENCE_CEILING * 2 {
        return Err(invalid("experience years is out of range"));
    }
    Ok(())
}
