pub mod app;
pub mod charts;
pub mod config;
pub mod controller;
pub mod errors;
pub mod handlers;
pub mod loader;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod table;
pub mod ui;
pub mod view;

pub use app::router;
pub use config::Config;
pub use controller::{Controller, Outcome, Phase};
pub use errors::{AppError, LoadError};
pub use loader::{DashboardSource, HttpSource, RetryPolicy};
pub use state::AppState;
pub use storage::FileSource;
