//! Services module - capture, classification and reference lookups.
//!
//! The services are **framework-agnostic**: nothing here knows about the
//! session state machine or a UI, so each piece is testable on its own.
//!
//! # Components
//!
//! - [`capture`]: acquires an [`ImageArtifact`](crate::models::ImageArtifact)
//!   from a camera ([`CameraDevice`], scoped by [`CameraSession`]) or from
//!   uploaded bytes, rejecting anything that is not `image/*`.
//! - [`classifier`]: the [`Classifier`] trait with [`MockClassifier`] and
//!   [`RemoteClassifier`] backends, plus the [`ClassifierPolicy`] that
//!   enforces the confidence threshold, result cap and empty-result rule.
//! - [`guide`]: disposal instructions per waste category.
//! - [`centers`]: collection-center catalog with radius and material filters.
//! - [`impact`]: environmental equivalents and period projections.
//!
//! # Usage Example
//!
//! ```ignore
//! use sahibin::services::{capture, Classifier, ClassifierPolicy, MockClassifier};
//!
//! let artifact = capture::capture_from_file(bytes, "image/jpeg", None)?;
//! let raw = MockClassifier::new().classify(&artifact).await?;
//! let results = ClassifierPolicy::default().apply(raw)?;
//! ```

pub mod capture;
pub mod centers;
pub mod classifier;
pub mod guide;
pub mod impact;

pub use capture::{CameraDevice, CameraSession, CameraStream, CaptureError};
pub use classifier::{
    ClassificationError, Classifier, ClassifierPolicy, MockClassifier, RemoteClassifier,
    classifier_from_settings,
};
