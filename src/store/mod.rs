//! Persisted stores.
//!
//! Every store owns one collection that lives in memory and is written back
//! to storage in full after each change, then announces the change to its
//! listeners.

pub mod articles;
pub mod collection;
pub mod comments;
pub mod observer;
pub mod subscribers;
pub mod views;

pub use articles::{paginate, ArticleStore, Page, ARTICLES_PER_PAGE};
pub use collection::{Collection, Snapshot};
pub use comments::{CommentStats, CommentStore};
pub use observer::{Listeners, Subscription};
pub use subscribers::{SubscriberStats, SubscriberStore};
pub use views::ViewStore;
