use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::error::Result;
use crate::models::{normalize_email, SubscribeOutcome, Subscriber};
use crate::storage::{keys, SharedStorage};
use crate::store::collection::Collection;
use crate::store::observer::Subscription;

const CSV_HEADER: [&str; 4] = ["Email", "Date d'inscription", "Statut", "Source"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscriberStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

fn seed_subscribers() -> Vec<Subscriber> {
    let seed = |id: &str, email: &str, subscribed_at: &str, is_active: bool, source: &str| {
        Subscriber {
            id: id.to_string(),
            email: email.to_string(),
            subscribed_at: DateTime::parse_from_rfc3339(subscribed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_default(),
            is_active,
            source: Some(source.to_string()),
        }
    };

    vec![
        seed("1", "aminata.diallo@email.com", "2024-01-15T10:30:00Z", true, "modal"),
        seed("2", "kofi.asante@email.com", "2024-01-14T15:45:00Z", true, "footer"),
        seed("3", "fatou.bello@email.com", "2024-01-13T09:20:00Z", false, "modal"),
        seed("4", "koudjo.amavi@email.com", "2024-01-12T14:10:00Z", true, "admin"),
        seed("5", "maman.christelle@email.com", "2024-01-11T11:55:00Z", true, "modal"),
    ]
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Newsletter subscribers, newest first
#[derive(Clone)]
pub struct SubscriberStore {
    subscribers: Collection<Subscriber>,
    clock: SharedClock,
}

impl SubscriberStore {
    pub fn new(storage: SharedStorage, clock: SharedClock) -> Self {
        Self {
            subscribers: Collection::load_or_seed(storage, keys::SUBSCRIBERS, seed_subscribers),
            clock,
        }
    }

    pub fn all(&self) -> Vec<Subscriber> {
        self.subscribers.all()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribers.subscribe(listener)
    }

    pub fn find_by_email(&self, email: &str) -> Option<Subscriber> {
        let email = email.trim().to_lowercase();
        self.subscribers.read(|subscribers| {
            subscribers
                .iter()
                .find(|s| s.email.to_lowercase() == email)
                .cloned()
        })
    }

    /// Sign up an address.
    ///
    /// Emails are unique case-insensitively. An inactive subscriber is switched
    /// back on in place and keeps its id; an active one yields `AlreadyActive`.
    pub fn add(&self, email: &str, source: Option<&str>) -> Result<SubscribeOutcome> {
        let email = normalize_email(email)?;
        let now = self.clock.now().with_timezone(&Utc);
        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string();

        let outcome = self.subscribers.commit(|subscribers| {
            let position = subscribers
                .iter()
                .position(|s| s.email.to_lowercase() == email);

            match position {
                Some(index) if subscribers[index].is_active => None,
                Some(index) => {
                    let existing = &mut subscribers[index];
                    existing.is_active = true;
                    existing.subscribed_at = now;
                    Some(SubscribeOutcome::Reactivated(existing.clone()))
                }
                None => {
                    let subscriber = Subscriber {
                        id: Uuid::new_v4().to_string(),
                        email: email.clone(),
                        subscribed_at: now,
                        is_active: true,
                        source: Some(source),
                    };
                    subscribers.insert(0, subscriber.clone());
                    Some(SubscribeOutcome::Subscribed(subscriber))
                }
            }
        });

        let outcome = outcome.unwrap_or(SubscribeOutcome::AlreadyActive);
        match &outcome {
            SubscribeOutcome::Subscribed(s) => info!("New newsletter subscriber {}", s.id),
            SubscribeOutcome::Reactivated(s) => info!("Reactivated newsletter subscriber {}", s.id),
            SubscribeOutcome::AlreadyActive => info!("Duplicate newsletter signup ignored"),
        }
        Ok(outcome)
    }

    /// Mark an address inactive. Returns false when the address is unknown.
    pub fn unsubscribe(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.subscribers
            .commit(|subscribers| {
                let subscriber = subscribers
                    .iter_mut()
                    .find(|s| s.email.to_lowercase() == email)?;
                subscriber.is_active = false;
                Some(())
            })
            .is_some()
    }

    pub fn delete(&self, id: &str) -> bool {
        let deleted = self
            .subscribers
            .commit(|subscribers| {
                let index = subscribers.iter().position(|s| s.id == id)?;
                Some(subscribers.remove(index))
            })
            .is_some();

        if deleted {
            info!("Deleted newsletter subscriber {}", id);
        }
        deleted
    }

    pub fn stats(&self) -> SubscriberStats {
        self.subscribers.read(|subscribers| {
            let active = subscribers.iter().filter(|s| s.is_active).count();
            SubscriberStats {
                total: subscribers.len(),
                active,
                inactive: subscribers.len() - active,
            }
        })
    }

    /// Header plus one line per subscriber, every field quoted
    pub fn export_csv(&self) -> String {
        self.subscribers.read(|subscribers| {
            let header = CSV_HEADER.iter().map(|h| csv_field(h)).collect::<Vec<_>>();
            let mut lines = vec![header.join(",")];

            for subscriber in subscribers {
                let date = subscriber
                    .subscribed_at
                    .with_timezone(&Local)
                    .format("%d/%m/%Y")
                    .to_string();
                let status = if subscriber.is_active { "Actif" } else { "Inactif" };
                let source = subscriber.source.as_deref().unwrap_or("Inconnu");

                let row = [subscriber.email.as_str(), date.as_str(), status, source];
                lines.push(row.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(","));
            }

            lines.join("\n")
        })
    }

    pub fn export_json(&self) -> Result<String> {
        let subscribers = self.subscribers.all();
        Ok(serde_json::to_string_pretty(&subscribers)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn store() -> (MemoryStorage, SubscriberStore) {
        let memory = MemoryStorage::default();
        let clock = ManualClock::at(2024, 2, 1, 12, 0);
        let store = SubscriberStore::new(Arc::new(memory.clone()), Arc::new(clock));
        (memory, store)
    }

    #[test]
    fn test_seed_stats() {
        let (_memory, store) = store();
        assert_eq!(
            store.stats(),
            SubscriberStats {
                total: 5,
                active: 4,
                inactive: 1
            }
        );
    }

    #[test]
    fn test_duplicate_active_email() {
        let (_memory, store) = store();

        let first = store.add("x@y.com", Some("modal")).unwrap();
        assert!(first.accepted());

        let second = store.add("X@Y.com", Some("footer")).unwrap();
        assert_eq!(second, SubscribeOutcome::AlreadyActive);
        assert!(!second.accepted());
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn test_resubscribe_reactivates_same_record() {
        let (_memory, store) = store();
        let original = store.add("x@y.com", None).unwrap().subscriber().cloned().unwrap();
        assert_eq!(original.source.as_deref(), Some("unknown"));

        assert!(store.unsubscribe("X@y.com"));
        assert!(!store.find_by_email("x@y.com").unwrap().is_active);

        match store.add("x@y.com", Some("modal")).unwrap() {
            SubscribeOutcome::Reactivated(subscriber) => {
                assert_eq!(subscriber.id, original.id);
                assert!(subscriber.is_active);
            }
            other => panic!("expected reactivation, got {:?}", other),
        }
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn test_seeded_inactive_subscriber_reactivates() {
        let (_memory, store) = store();
        let outcome = store.add("Fatou.Bello@email.com", None).unwrap();
        assert_eq!(outcome.subscriber().unwrap().id, "3");
        assert_eq!(store.stats().active, 5);
    }

    #[test]
    fn test_invalid_email_rejected() {
        let (_memory, store) = store();
        assert!(store.add("not-an-email", None).is_err());
        assert!(!store.unsubscribe("nobody@nowhere.org"));
    }

    #[test]
    fn test_delete_only_that_subscriber() {
        let (_memory, store) = store();
        let before = store.all();

        assert!(store.delete("2"));
        assert!(!store.delete("2"));

        let expected: Vec<Subscriber> = before.into_iter().filter(|s| s.id != "2").collect();
        assert_eq!(store.all(), expected);
    }

    #[test]
    fn test_export_csv() {
        let (_memory, store) = store();
        let csv = store.export_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), store.len() + 1);
        assert_eq!(lines[0], r#""Email","Date d'inscription","Statut","Source""#);
        assert!(lines[1].starts_with(r#""aminata.diallo@email.com",""#));
        assert!(lines[1].ends_with(r#","Actif","modal""#));
        assert!(lines[3].contains(r#""Inactif""#));
        assert!(lines.iter().all(|l| l.starts_with('"') && l.ends_with('"')));
    }

    #[test]
    fn test_export_csv_escapes_quotes_and_missing_source() {
        let (memory, _store) = store();
        let subscribers = vec![Subscriber {
            id: "q".to_string(),
            email: "quote\"d@y.com".to_string(),
            subscribed_at: Utc::now(),
            is_active: true,
            source: None,
        }];
        memory_set(&memory, &subscribers);

        let clock = ManualClock::at(2024, 2, 1, 12, 0);
        let store = SubscriberStore::new(Arc::new(memory), Arc::new(clock));
        let csv = store.export_csv();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with(r#""quote""d@y.com""#));
        assert!(row.ends_with(r#""Inconnu""#));
    }

    fn memory_set(memory: &MemoryStorage, subscribers: &[Subscriber]) {
        use crate::storage::Storage;
        memory
            .set_item(keys::SUBSCRIBERS, &serde_json::to_string(subscribers).unwrap())
            .unwrap();
    }

    #[test]
    fn test_export_json_round_trip() {
        let (_memory, store) = store();
        let exported: Vec<Subscriber> =
            serde_json::from_str(&store.export_json().unwrap()).unwrap();
        assert_eq!(exported, store.all());
    }
}
