use crate::error::Result;
use crate::storage::{keys, SharedStorage};

/// Boolean UI flags kept next to the stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    DarkMode,
    NewsletterSubscribed,
    NewsletterModalShown,
}

impl Preference {
    pub const ALL: [Preference; 3] = [
        Preference::DarkMode,
        Preference::NewsletterSubscribed,
        Preference::NewsletterModalShown,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Preference::DarkMode => keys::DARK_MODE,
            Preference::NewsletterSubscribed => keys::NEWSLETTER_SUBSCRIBED,
            Preference::NewsletterModalShown => keys::NEWSLETTER_MODAL_SHOWN,
        }
    }
}

#[derive(Clone)]
pub struct Preferences {
    storage: SharedStorage,
}

impl Preferences {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Unset or unreadable flags read as false
    pub fn get(&self, preference: Preference) -> bool {
        self.storage
            .get_item(preference.key())
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str::<bool>(&raw).ok())
            .unwrap_or(false)
    }

    pub fn set(&self, preference: Preference, value: bool) -> Result<()> {
        self.storage
            .set_item(preference.key(), if value { "true" } else { "false" })
    }

    pub fn toggle(&self, preference: Preference) -> Result<bool> {
        let value = !self.get(preference);
        self.set(preference, value)?;
        Ok(value)
    }
}
