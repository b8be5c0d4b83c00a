pub mod app_state;
pub mod config;
pub mod encoding;
pub mod types;

pub use app_state::AppState;
