pub mod admin;
pub mod app;
pub mod background;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod preferences;
pub mod storage;
pub mod store;

pub use app::Stores;
pub use config::Config;
pub use error::{Error, Result};
