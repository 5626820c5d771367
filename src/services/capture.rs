use crate::models::artifact::{CAMERA_SNAPSHOT_MIME, CAMERA_SNAPSHOT_NAME};
use crate::models::{AcquisitionSource, ImageArtifact};
use camino::Utf8Path;
use regex::Regex;
use std::fs;
use std::sync::LazyLock;
use thiserror::Error;

/// `type/subtype` with RFC 6838 restricted-name characters.
static MIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*)/([A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*)$")
        .expect("Invalid MIME regex")
});

/// Errors raised while acquiring an image
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Unsupported file type '{0}', expected an image")]
    InvalidMimeType(String),

    #[error("Image is empty")]
    EmptyImage,

    #[error("Capture cancelled")]
    Cancelled,

    #[error("Failed to snapshot camera frame: {0}")]
    SnapshotFailed(String),

    #[error("Failed to read image file: {0}")]
    ReadFailed(String),
}

/// A platform camera that can hand out an exclusive stream.
///
/// Implementations wrap whatever the platform offers (V4L2, a browser
/// bridge, a test double). Opening is expected to fail with
/// [`CaptureError::PermissionDenied`] or [`CaptureError::CameraUnavailable`].
#[cfg_attr(test, mockall::automock)]
pub trait CameraDevice: Send + Sync {
    fn open(&self) -> Result<Box<dyn CameraStream>, CaptureError>;
}

/// An open, exclusively held camera stream.
#[cfg_attr(test, mockall::automock)]
pub trait CameraStream: Send {
    /// Encode the current frame as JPEG.
    fn snapshot(&mut self) -> Result<Vec<u8>, CaptureError>;

    /// Stop every track of the stream. Called exactly once by [`CameraSession`].
    fn release(&mut self);
}

/// Scoped ownership of an open camera stream.
///
/// The stream is released when the session is consumed by
/// [`snapshot`](Self::snapshot) or [`cancel`](Self::cancel), and by `Drop`
/// on any other exit path (early return, `?`, panic unwinding).
pub struct CameraSession {
    stream: Option<Box<dyn CameraStream>>,
}

impl CameraSession {
    /// Acquire the device stream. The live preview is the device's concern.
    pub fn open(device: &dyn CameraDevice) -> Result<Self, CaptureError> {
        let stream = device.open().map_err(|e| {
            tracing::warn!("Error accessing camera: {}", e);
            e
        })?;
        tracing::info!("Camera stream opened");
        Ok(Self {
            stream: Some(stream),
        })
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Snapshot the current frame into a still image and release the stream.
    pub fn snapshot(mut self) -> Result<ImageArtifact, CaptureError> {
        let mut stream = self.stream.take().ok_or(CaptureError::Cancelled)?;
        let frame = stream.snapshot();
        stream.release();
        tracing::info!("Camera stream released after snapshot");

        let bytes = frame?;
        if bytes.is_empty() {
            return Err(CaptureError::SnapshotFailed("camera returned an empty frame".into()));
        }

        Ok(ImageArtifact::new(
            bytes,
            CAMERA_SNAPSHOT_MIME,
            AcquisitionSource::Camera,
            Some(CAMERA_SNAPSHOT_NAME.to_string()),
        ))
    }

    /// Abandon the capture, releasing the stream without producing an image.
    pub fn cancel(mut self) {
        self.release();
        tracing::info!("Camera capture cancelled");
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if self.stream.is_some() {
            tracing::debug!("Camera session dropped while active, releasing stream");
            self.release();
        }
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Open the camera, take one frame and release it.
pub fn capture_from_camera(device: &dyn CameraDevice) -> Result<ImageArtifact, CaptureError> {
    CameraSession::open(device)?.snapshot()
}

/// Check that a declared MIME type names an image.
///
/// Parameters (`; charset=...`) are ignored and the comparison is
/// case-insensitive. Returns the normalized `type/subtype`.
pub fn validate_image_mime(mime_type: &str) -> Result<String, CaptureError> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match MIME_PATTERN.captures(&essence) {
        Some(caps) if &caps[1] == "image" => Ok(essence),
        _ => Err(CaptureError::InvalidMimeType(mime_type.to_string())),
    }
}

/// Accept user-supplied bytes as an upload.
///
/// Non-image types are rejected with [`CaptureError::InvalidMimeType`]
/// instead of being dropped silently.
pub fn capture_from_file(
    bytes: Vec<u8>,
    mime_type: &str,
    file_name: Option<String>,
) -> Result<ImageArtifact, CaptureError> {
    let mime = validate_image_mime(mime_type).map_err(|e| {
        tracing::warn!("Rejected upload {:?}: {}", file_name, e);
        e
    })?;

    if bytes.is_empty() {
        return Err(CaptureError::EmptyImage);
    }

    tracing::info!(
        "Accepted upload {} ({} bytes, {})",
        file_name.as_deref().unwrap_or("<unnamed>"),
        bytes.len(),
        mime
    );

    Ok(ImageArtifact::new(bytes, mime, AcquisitionSource::Upload, file_name))
}

/// Guess a MIME type from a file extension.
pub fn mime_for_path(path: &Utf8Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Read a file from disk and run it through the upload path.
pub fn capture_from_path(path: &Utf8Path) -> Result<ImageArtifact, CaptureError> {
    let bytes = fs::read(path).map_err(|e| CaptureError::ReadFailed(format!("{}: {}", path, e)))?;
    capture_from_file(bytes, mime_for_path(path), path.file_name().map(str::to_string))
}
