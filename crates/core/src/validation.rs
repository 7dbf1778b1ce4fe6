//! Client-side input validation

use once_cell::sync::Lazy;
use regex::Regex;

/// word "@" word "." word, ASCII word characters, whole string
static MAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+@[A-Za-z0-9_]+\.[A-Za-z0-9_]+$").expect("mail pattern compiles")
});

/// Check whether `candidate` looks like an email address.
///
/// Matches the whole string. `a.b@c.d` and `a@b.c.d` are rejected.
///
/// # Example
/// ```
/// # use cellar_core::validation::is_mail;
/// assert!(is_mail("user@user.com"));
/// assert!(!is_mail("user.com"));
/// ```
pub fn is_mail(candidate: &str) -> bool {
    MAIL_PATTERN.is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_simple_addresses() {
        assert!(is_mail("user@user.com"));
        assert!(is_mail("admin@admin.com"));
        assert!(is_mail("a_1@b2.c3"));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "asd", "@x.com", "a@.com", "a@b.", "a@b", "a b@c.d", "a@b.c.d", "a.b@c.d"] {
            assert!(!is_mail(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_rejects_non_ascii_word_chars() {
        assert!(!is_mail("jöe@x.com"));
    }
}
