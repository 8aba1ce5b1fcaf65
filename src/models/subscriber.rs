use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
    pub is_active: bool,
    /// Where the signup came from (modal, footer, admin, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Result of a newsletter signup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed(Subscriber),
    /// A previously unsubscribed address was switched back on; same record, same id
    Reactivated(Subscriber),
    /// The address is already subscribed and active
    AlreadyActive,
}

impl SubscribeOutcome {
    /// Whether the signup was accepted
    pub fn accepted(&self) -> bool {
        !matches!(self, SubscribeOutcome::AlreadyActive)
    }

    pub fn subscriber(&self) -> Option<&Subscriber> {
        match self {
            SubscribeOutcome::Subscribed(s) | SubscribeOutcome::Reactivated(s) => Some(s),
            SubscribeOutcome::AlreadyActive => None,
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

/// Trim and lower-case an address, rejecting anything that is not shaped like one
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if !email_regex().is_match(&email) {
        return Err(Error::Validation(format!("'{}' is not a valid email address", email)));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  X@Y.com ").unwrap(), "x@y.com");
        assert!(normalize_email("no-at-sign.com").is_err());
        assert!(normalize_email("two words@y.com").is_err());
        assert!(normalize_email("x@localhost").is_err());
    }

    #[test]
    fn test_outcome_accepted() {
        assert!(!SubscribeOutcome::AlreadyActive.accepted());
        assert!(SubscribeOutcome::AlreadyActive.subscriber().is_none());
    }

    #[test]
    fn test_source_is_optional_on_disk() {
        let json = r#"{"id":"1","email":"a@b.co",
            "subscribed_at":"2024-01-15T10:30:00Z","is_active":true}"#;
        let subscriber: Subscriber = serde_json::from_str(json).unwrap();
        assert!(subscriber.source.is_none());
        assert!(!serde_json::to_string(&subscriber).unwrap().contains("source"));
    }
}
