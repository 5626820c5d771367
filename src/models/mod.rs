//! Data models for SahiBin.
//!
//! - [`ImageArtifact`]: an immutable captured image (camera snapshot or upload)
//! - [`ClassificationResult`]: one labelled detection with its impact estimates
//! - [`AggregateStats`] and [`fold`]: cumulative session statistics and the pure
//!   function that advances them
//! - [`SessionState`] / [`SessionPhase`]: everything the presentation layer reads
//! - [`Settings`]: user configuration loaded from `SahiBin Settings.yaml`
//!
//! State updates go through [`StateManager`](crate::state::StateManager);
//! nothing here holds a lock or performs I/O.

pub mod artifact;
pub mod config;
pub mod detection;
pub mod session_state;
pub mod stats;

pub use artifact::{AcquisitionSource, ImageArtifact};
pub use config::{CenterSettings, ClassifierBackend, ClassifierSettings, LoggingSettings, Settings};
pub use detection::{ClassificationResult, DetectionHeadline};
pub use session_state::{SessionPhase, SessionState};
pub use stats::{AggregateStats, DashboardMetric, category_breakdown, fold};
