use tracing::{info, warn};

use crate::config::AdminConfig;
use crate::error::{Error, Result};
use crate::storage::{keys, SharedStorage};

/// Credential check for the admin commands.
///
/// A session is nothing more than `admin_authenticated = "true"` in storage.
/// This keeps casual visitors out of the editor; it is not a security boundary.
#[derive(Clone)]
pub struct AdminGate {
    storage: SharedStorage,
    credentials: AdminConfig,
}

impl AdminGate {
    pub fn new(storage: SharedStorage, credentials: AdminConfig) -> Self {
        Self {
            storage,
            credentials,
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<bool> {
        if username != self.credentials.username || password != self.credentials.password {
            warn!("Rejected admin login for '{}'", username);
            return Ok(false);
        }

        self.storage.set_item(keys::ADMIN_AUTHENTICATED, "true")?;
        info!("Admin session opened");
        Ok(true)
    }

    pub fn logout(&self) -> Result<()> {
        self.storage.remove_item(keys::ADMIN_AUTHENTICATED)?;
        info!("Admin session closed");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(
            self.storage.get_item(keys::ADMIN_AUTHENTICATED),
            Ok(Some(value)) if value == "true"
        )
    }

    pub fn require(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(Error::PermissionDenied(
                "admin login required, run `cara-store login` first".to_string(),
            ))
        }
    }
}
