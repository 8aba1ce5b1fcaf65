pub mod file_storage;
pub mod traits;

pub use file_storage::{FileStorage, FileStorageConfig};
pub use traits::{HealthStatus, MemoryStorage, SharedStorage, Storage, StorageConfig};

/// Storage keys, shared with the layout the site has always used.
pub mod keys {
    pub const ARTICLES: &str = "articles";
    pub const COMMENTS: &str = "comments";
    pub const SUBSCRIBERS: &str = "newsletter_subscribers";
    pub const ARTICLE_VIEWS: &str = "article_views";
    pub const TODAY_VIEWED: &str = "today_viewed_articles";
    pub const DARK_MODE: &str = "darkMode";
    pub const NEWSLETTER_SUBSCRIBED: &str = "newsletter_subscribed";
    pub const NEWSLETTER_MODAL_SHOWN: &str = "newsletter_modal_shown";
    pub const ADMIN_AUTHENTICATED: &str = "admin_authenticated";
}
