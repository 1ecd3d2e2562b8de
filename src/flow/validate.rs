//! Form input validation, run before any provider call.

use regex::Regex;

/// Normalize an email for provider calls and display masking.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// One-time codes are exactly 6 ASCII digits; anything else never reaches
/// the provider.
#[must_use]
pub fn valid_otp(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

/// Check a password against the strength policy.
///
/// Returns one message per failed rule; an empty vector means the password is
/// acceptable.
#[must_use]
pub fn password_issues(password: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();

    if password.chars().count() < 8 {
        issues.push("Password must be at least 8 characters long.");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        issues.push("Password must contain at least one lowercase letter.");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push("Password must contain at least one uppercase letter.");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("Password must contain at least one number.");
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        issues.push("Password must contain at least one special character.");
    }
    if contains_name_token(password) {
        issues.push("Password must not contain names.");
    }

    issues
}

// "john", "doe" and "name" are rejected anywhere in the password, case
// insensitive; "John12345!" must fail even though the token is glued to digits.
fn contains_name_token(password: &str) -> bool {
    Regex::new(r"(?i)(john|doe|name)").is_ok_and(|regex| regex.is_match(password))
}

/// Mask an email for display: `local@domain` becomes `l***l@domain`, leaving
/// short local parts (and strings without `@`) untouched. Pure, no side
/// effects.
#[must_use]
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return email.to_string();
    };

    let mut chars = local.chars();
    let (Some(first), Some(last)) = (chars.next(), local.chars().next_back()) else {
        return email.to_string();
    };

    if local.chars().count() <= 2 {
        return email.to_string();
    }

    format!("{first}***{last}@{domain}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_otp_requires_exactly_six_digits() {
        assert!(valid_otp("123456"));
        assert!(!valid_otp("12345"));
        assert!(!valid_otp("1234567"));
        assert!(!valid_otp("12345a"));
        assert!(!valid_otp("１２３４５６")); // non-ASCII digits
    }

    #[test]
    fn password_policy_rejects_weak_passwords() {
        assert!(!password_issues("short1!").is_empty());
        assert!(!password_issues("alllowercase1!").is_empty());
        assert!(!password_issues("NoDigits!!").is_empty());
        assert!(!password_issues("NoSpecial123").is_empty());
        assert!(!password_issues("John12345!").is_empty());
    }

    #[test]
    fn password_policy_accepts_strong_password() {
        assert_eq!(password_issues("Str0ng!Pass"), Vec::<&str>::new());
    }

    #[test]
    fn password_policy_reports_each_failed_rule() {
        let issues = password_issues("short");
        assert!(issues.contains(&"Password must be at least 8 characters long."));
        assert!(issues.contains(&"Password must contain at least one uppercase letter."));
        assert!(issues.contains(&"Password must contain at least one number."));
        assert!(issues.contains(&"Password must contain at least one special character."));
    }

    #[test]
    fn name_tokens_rejected_case_insensitive() {
        assert!(password_issues("JOHN!pass1").contains(&"Password must not contain names."));
        assert!(password_issues("MyDoe!pass1").contains(&"Password must not contain names."));
        assert!(password_issues("UserName!1a").contains(&"Password must not contain names."));
    }

    #[test]
    fn mask_email_leaves_short_local_parts() {
        assert_eq!(mask_email("jo@x.com"), "jo@x.com");
        assert_eq!(mask_email("a@x.com"), "a@x.com");
    }

    #[test]
    fn mask_email_masks_longer_local_parts() {
        assert_eq!(mask_email("john@x.com"), "j***n@x.com");
        assert_eq!(mask_email("alice@example.com"), "a***e@example.com");
    }

    #[test]
    fn mask_email_passes_through_without_at() {
        assert_eq!(mask_email("not-an-email"), "not-an-email");
    }
}
