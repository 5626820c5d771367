// SahiBin - waste detection capture, classification and impact tracking
//
// This is the library crate containing the session engine and its data structures.
// The binary crate (main.rs) provides a command-line front end.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod session;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AggregateStats, ClassificationResult, ImageArtifact, SessionPhase, Settings};
pub use session::{SessionController, SessionError};
pub use state::{SessionChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
