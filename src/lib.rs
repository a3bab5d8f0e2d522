pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod kv;
pub mod models;
pub mod report;
pub mod state;
pub mod tracker;
pub mod ui;
pub mod week;

pub use app::router;
pub use config::Config;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use state::AppState;
pub use tracker::WeekTracker;
pub use week::{current_week_key, WeekKey};
