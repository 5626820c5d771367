use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// MIME type used for frames snapshotted from a live camera stream.
pub const CAMERA_SNAPSHOT_MIME: &str = "image/jpeg";

/// File name given to camera snapshots, matching what an upload would carry.
pub const CAMERA_SNAPSHOT_NAME: &str = "captured-image.jpg";

/// Where an [`ImageArtifact`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionSource {
    Camera,
    Upload,
}

impl fmt::Display for AcquisitionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionSource::Camera => write!(f, "camera"),
            AcquisitionSource::Upload => write!(f, "upload"),
        }
    }
}

/// A single captured image.
///
/// The payload is held behind an `Arc<[u8]>` so snapshots handed to the
/// presentation layer share the bytes instead of copying them. Nothing on the
/// artifact can be mutated after construction; replacing the image means
/// building a new artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageArtifact {
    bytes: Arc<[u8]>,
    mime_type: String,
    source: AcquisitionSource,
    file_name: Option<String>,
    captured_at: DateTime<Utc>,
}

impl ImageArtifact {
    /// Build an artifact. Validation (MIME prefix, non-empty payload) is the
    /// job of [`crate::services::capture`]; this constructor trusts its input.
    pub(crate) fn new(
        bytes: impl Into<Arc<[u8]>>,
        mime_type: impl Into<String>,
        source: AcquisitionSource,
        file_name: Option<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            source,
            file_name,
            captured_at: Utc::now(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn source(&self) -> AcquisitionSource {
        self.source
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Name to show next to the image ("captured-image.jpg" for camera frames).
    pub fn display_name(&self) -> &str {
        match (&self.file_name, self.source) {
            (Some(name), _) => name,
            (None, AcquisitionSource::Camera) => CAMERA_SNAPSHOT_NAME,
            (None, AcquisitionSource::Upload) => "uploaded-image",
        }
    }
}
