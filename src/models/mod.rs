pub mod article;
pub mod comment;
pub mod subscriber;
pub mod views;

pub use article::{Article, Category};
pub use comment::{Comment, NewComment};
pub use subscriber::{normalize_email, SubscribeOutcome, Subscriber};
pub use views::{ArticleViews, DailyViews, GlobalViewStats, MostViewed, DAILY_HISTORY_DAYS};
