pub mod core;
pub mod features;
pub mod http;
pub mod relay;
pub mod resolver;

// --- Primary core exports ---
pub use core::types;
pub use core::types::*;
pub use core::AppState;

pub use features::{ad_filter, antibot, launch, search};
pub use resolver::{AttemptFailure, ConfigResolver, RelayFailure, ResolutionOutcome};
