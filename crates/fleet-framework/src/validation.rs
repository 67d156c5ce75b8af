//! # Constraint Validation
//!
//! [`Violations`] collects every failed field constraint of a record; nothing short-circuits.
//! At the write boundary the whole set collapses into a single [`ServiceError::Validation`]
//! whose message lists every violation, so a client can fix everything in one round trip.
//!
//! ```rust
//! use fleet_framework::validation::Violations;
//!
//! let mut v = Violations::new();
//! v.check(false, "email", "Email must be valid");
//! v.check(false, "password", "Password must be at least 8 characters");
//! assert_eq!(
//!     v.message(),
//!     "email must be valid; password must be at least 8 characters"
//! );
//! ```

use crate::error::ServiceError;
use regex::Regex;
use std::sync::OnceLock;

/// Joins violation messages in the aggregated error.
pub const SEPARATOR: &str = "; ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Records a violation unless `ok`.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.push(field, message);
        }
    }

    pub fn require_text(&mut self, value: &str, field: &str) {
        self.check(!is_blank(value), field, format!("{field} must not be blank"));
    }

    /// Adds the violations of a nested value object, with its fields prefixed by `prefix`.
    pub fn nested(&mut self, prefix: &str, inner: Violations) {
        for v in inner.0 {
            self.0.push(Violation {
                field: format!("{prefix}.{}", v.field),
                message: v.message,
            });
        }
    }

    pub fn extend(&mut self, other: Violations) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// All messages, lower-cased, joined by [`SEPARATOR`] without a trailing one.
    pub fn message(&self) -> String {
        self.0
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>()
            .join(SEPARATOR)
            .to_lowercase()
    }

    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.message()))
        }
    }
}

/// Field-level constraints of a record or value object.
pub trait Validate {
    fn validate(&self) -> Violations;

    fn validated(&self) -> Result<(), ServiceError> {
        self.validate().into_result()
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// `local@domain.tld`
pub fn is_email(value: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
                .unwrap_or_else(|e| panic!("email pattern: {e}"))
        })
        .is_match(value)
}

/// Digits with an optional single dash, e.g. `00-950` or `10115`.
pub fn is_postal_code(value: &str) -> bool {
    static POSTAL: OnceLock<Regex> = OnceLock::new();
    POSTAL
        .get_or_init(|| {
            Regex::new(r"^[0-9]{2,5}(-[0-9]{3,4})?$").unwrap_or_else(|e| panic!("postal pattern: {e}"))
        })
        .is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_every_violation_into_one_lowercase_message() {
        let mut v = Violations::new();
        v.require_text("", "First name");
        v.check(false, "password", "Password must be at least 8 characters");
        v.check(is_email("a@b.com"), "email", "Email must be valid");
        v.check(false, "price", "Price must be greater than 0");

        assert_eq!(v.len(), 3);
        let message = v.message();
        assert_eq!(
            message,
            "first name must not be blank; password must be at least 8 characters; price must be greater than 0"
        );
        assert!(!message.ends_with(SEPARATOR.trim_end()));
        assert_eq!(v.into_result(), Err(ServiceError::Validation(message)));
    }

    #[test]
    fn message_text_ending_like_the_separator_is_kept() {
        let mut v = Violations::new();
        v.push("notes", "Unsupported characters: ; ");
        assert_eq!(v.message(), "unsupported characters: ; ");

        v.push("name", "Name must not be blank");
        assert_eq!(v.message(), "unsupported characters: ; ; name must not be blank");
    }

    #[test]
    fn empty_set_lets_the_record_through() {
        assert_eq!(Violations::new().into_result(), Ok(()));
        assert_eq!(Violations::new().message(), "");
    }

    #[test]
    fn nested_violations_keep_their_messages() {
        let mut address = Violations::new();
        address.require_text(" ", "city");
        let mut v = Violations::new();
        v.nested("address", address);
        assert_eq!(v.iter().next().map(|x| x.field.as_str()), Some("address.city"));
        assert_eq!(v.message(), "city must not be blank");
    }

    #[test]
    fn email_and_postal_formats() {
        assert!(is_email("a@b.com"));
        assert!(is_email("first.last@clinic.example.org"));
        assert!(!is_email("a@b"));
        assert!(!is_email("not an email"));
        assert!(is_postal_code("00-950"));
        assert!(is_postal_code("10115"));
        assert!(!is_postal_code("ab-123"));
    }
}
