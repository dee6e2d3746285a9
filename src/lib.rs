pub mod app;
pub mod clock;
pub mod config;
pub mod counter;
pub mod detect;
pub mod errors;
pub mod handlers;
pub mod messages;
pub mod models;
pub mod queue;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use counter::{Rollover, WeekStore};
pub use queue::StoreHandle;
pub use state::AppState;
