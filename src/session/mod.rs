//! Session controller - capture → classify → accumulate.
//!
//! [`SessionController`] owns the only [`StateManager`] of a session and
//! drives it through `Idle → Capturing → Classifying → ShowingResults`.
//! Classification is awaited with a timeout and can be abandoned from any
//! clone of the controller via [`SessionController::cancel`]; results of an
//! abandoned capture are discarded by generation, never folded.

use crate::metrics::Metrics;
use crate::models::{
    AcquisitionSource, AggregateStats, ClassificationResult, ClassifierSettings,
    DetectionHeadline, ImageArtifact, SessionPhase, SessionState,
};
use crate::services::capture::{self, CameraDevice, CameraSession, CaptureError};
use crate::services::classifier::{
    ClassificationError, Classifier, ClassifierPolicy, classifier_from_settings,
};
use crate::state::{SessionChange, StateManager};
use camino::Utf8Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, watch};

/// Default upper bound on a single classification.
pub const DEFAULT_CLASSIFICATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors surfaced by session operations
///
/// Every variant is recoverable: the session is back in `Idle` (or was
/// never left) and a new capture can be started.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error("A capture is already in progress ({0})")]
    Busy(SessionPhase),

    #[error("Capture cancelled")]
    Cancelled,

    #[error("No camera capture in progress")]
    NoActiveCamera,
}

/// Orchestrates capture, classification and statistics for one session.
///
/// Cloning is cheap and every clone drives the same session, so a UI
/// thread can hold one clone to call [`cancel`](Self::cancel) while a task
/// awaits [`capture_from_file`](Self::capture_from_file) on another.
#[derive(Clone)]
pub struct SessionController {
    state: StateManager,
    classifier: Arc<dyn Classifier>,
    policy: ClassifierPolicy,
    timeout: Duration,

    /// Camera stream held between `begin_camera_capture` and
    /// `finish_camera_capture`
    camera: Arc<Mutex<Option<CameraSession>>>,

    /// Bumped on every cancel; in-flight classifications race against it
    cancel_tx: Arc<watch::Sender<u64>>,

    metrics: Arc<Metrics>,
}

impl SessionController {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        let (cancel_tx, _) = watch::channel(0);
        Self {
            state: StateManager::new(),
            classifier,
            policy: ClassifierPolicy::default(),
            timeout: DEFAULT_CLASSIFICATION_TIMEOUT,
            camera: Arc::new(Mutex::new(None)),
            cancel_tx: Arc::new(cancel_tx),
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Build a controller from the classifier section of the settings.
    pub fn from_settings(settings: &ClassifierSettings) -> anyhow::Result<Self> {
        let classifier = classifier_from_settings(settings)?;
        tracing::info!(
            "Session using {} classifier (timeout {}s, min confidence {}, max results {})",
            classifier.name(),
            settings.timeout_secs,
            settings.min_confidence,
            settings.max_results
        );
        Ok(Self::new(classifier)
            .with_policy(ClassifierPolicy::from(settings))
            .with_timeout(settings.timeout()))
    }

    pub fn with_policy(mut self, policy: ClassifierPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    // Read-only views

    pub fn snapshot(&self) -> SessionState {
        self.state.snapshot()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.read(|s| s.phase)
    }

    pub fn current_image(&self) -> Option<ImageArtifact> {
        self.state.read(|s| s.current_image.clone())
    }

    pub fn current_results(&self) -> Vec<ClassificationResult> {
        self.state.read(|s| s.current_results.clone())
    }

    pub fn primary_result(&self) -> Option<ClassificationResult> {
        self.state.read(|s| s.primary_result().cloned())
    }

    pub fn headline(&self) -> Option<DetectionHeadline> {
        self.state.read(|s| s.headline())
    }

    pub fn aggregate_stats(&self) -> AggregateStats {
        self.state.read(|s| s.stats.clone())
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.state.read(|s| s.last_error.clone())
    }

    /// Whether a camera stream is currently held open.
    pub fn camera_active(&self) -> bool {
        self.camera_slot().as_ref().is_some_and(CameraSession::is_active)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.state.subscribe()
    }

    pub fn state_manager(&self) -> &StateManager {
        &self.state
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    // Upload path

    /// Run uploaded bytes through capture, classification and the fold.
    pub async fn capture_from_file(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        file_name: Option<String>,
    ) -> Result<Vec<ClassificationResult>, SessionError> {
        let generation = self.state.begin_capture(AcquisitionSource::Upload)?;
        self.metrics.record_capture_started();

        let artifact = match capture::capture_from_file(bytes, mime_type, file_name) {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.capture_failed(generation, e)),
        };

        self.classify_and_commit(generation, artifact).await
    }

    /// Read an image from disk and process it as an upload.
    pub async fn capture_from_path(
        &self,
        path: &Utf8Path,
    ) -> Result<Vec<ClassificationResult>, SessionError> {
        let generation = self.state.begin_capture(AcquisitionSource::Upload)?;
        self.metrics.record_capture_started();

        let artifact = match capture::capture_from_path(path) {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.capture_failed(generation, e)),
        };

        self.classify_and_commit(generation, artifact).await
    }

    // Camera path

    /// Open the camera and enter `Capturing`.
    ///
    /// The stream stays open (live preview) until
    /// [`finish_camera_capture`](Self::finish_camera_capture) or
    /// [`cancel`](Self::cancel).
    pub fn begin_camera_capture(&self, device: &dyn CameraDevice) -> Result<(), SessionError> {
        let generation = self.state.begin_capture(AcquisitionSource::Camera)?;
        self.metrics.record_capture_started();

        let session = match CameraSession::open(device) {
            Ok(session) => session,
            Err(e) => return Err(self.capture_failed(generation, e)),
        };

        // `cancel` abandons under the same lock, so this check cannot race it
        let mut slot = self.camera_slot();
        let still_current = self
            .state
            .read(|s| s.generation == generation && s.phase == SessionPhase::Capturing);
        if !still_current {
            drop(slot);
            session.cancel();
            tracing::info!("Camera capture #{} abandoned while the camera was opening", generation);
            return Err(SessionError::Cancelled);
        }

        // Replacing a leftover session drops it, which releases its stream
        *slot = Some(session);
        Ok(())
    }

    /// Snapshot the open camera, release it, then classify the frame.
    pub async fn finish_camera_capture(&self) -> Result<Vec<ClassificationResult>, SessionError> {
        let session = self
            .camera_slot()
            .take()
            .ok_or(SessionError::NoActiveCamera)?;
        let generation = self.state.read(|s| s.generation);

        let artifact = match session.snapshot() {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.capture_failed(generation, e)),
        };

        self.classify_and_commit(generation, artifact).await
    }

    /// Open the camera, take a frame immediately and classify it.
    pub async fn capture_from_camera(
        &self,
        device: &dyn CameraDevice,
    ) -> Result<Vec<ClassificationResult>, SessionError> {
        self.begin_camera_capture(device)?;
        self.finish_camera_capture().await
    }

    // Control

    /// Abandon the capture in progress.
    ///
    /// Releases an open camera stream and signals any in-flight
    /// classification; its eventual result is discarded. Returns false if
    /// there was nothing to cancel.
    pub fn cancel(&self) -> bool {
        let mut slot = self.camera_slot();
        let camera = slot.take();
        let abandoned = self.state.abandon();
        drop(slot);

        if let Some(session) = camera {
            session.cancel();
        }
        if abandoned {
            self.cancel_tx.send_modify(|n| *n = n.wrapping_add(1));
            self.metrics.record_cancellation();
            tracing::info!("Capture cancelled by user");
        }
        abandoned
    }

    /// Clear the current image and results. Statistics are kept.
    pub fn retry(&self) -> Result<(), SessionError> {
        self.state.retry()?;
        tracing::info!("Session reset for a new capture");
        Ok(())
    }

    /// Zero the cumulative statistics.
    pub fn reset_stats(&self) {
        self.state.reset_stats();
        tracing::info!("Session statistics reset");
    }

    // Internals

    fn camera_slot(&self) -> std::sync::MutexGuard<'_, Option<CameraSession>> {
        self.camera.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn capture_failed(&self, generation: u64, error: CaptureError) -> SessionError {
        tracing::warn!("Capture failed: {}", error);
        self.metrics.record_capture_rejected();
        let error = SessionError::from(error);
        self.state.fail(generation, error.clone());
        error
    }

    async fn classify_and_commit(
        &self,
        generation: u64,
        artifact: ImageArtifact,
    ) -> Result<Vec<ClassificationResult>, SessionError> {
        let mut cancel_rx = self.cancel_tx.subscribe();
        if !self.state.begin_classifying(generation, artifact.clone()) {
            return Err(SessionError::Cancelled);
        }

        tracing::info!(
            "Classifying {} ({} bytes) with {} classifier",
            artifact.display_name(),
            artifact.len(),
            self.classifier.name()
        );
        let started = Instant::now();

        let outcome = tokio::select! {
            result = tokio::time::timeout(self.timeout, self.classifier.classify(&artifact)) => {
                match result {
                    Ok(raw) => raw.and_then(|raw| self.policy.apply(raw)),
                    Err(_) => Err(ClassificationError::Timeout(self.timeout)),
                }
            }
            _ = cancel_rx.changed() => {
                tracing::info!("Classification of capture #{} abandoned", generation);
                return Err(SessionError::Cancelled);
            }
        };

        let elapsed = started.elapsed();
        self.metrics.record_classification_time(elapsed);

        match outcome {
            Ok(results) => match self.state.complete_classification(generation, results.clone()) {
                Some(stats) => {
                    self.metrics.record_classification(results.len());
                    tracing::info!(
                        "Capture #{} classified in {:.2}s: {} items, primary {} | totals: {} items, {}% recyclable",
                        generation,
                        elapsed.as_secs_f32(),
                        results.len(),
                        results[0].category,
                        stats.items_detected,
                        stats.recycling_rate()
                    );
                    Ok(results)
                }
                None => Err(SessionError::Cancelled),
            },
            Err(e) => {
                match &e {
                    ClassificationError::Timeout(t) => {
                        self.metrics.record_timeout();
                        tracing::warn!("Classification timed out after {:?}", t);
                    }
                    other => {
                        self.metrics.record_classification_failure();
                        tracing::warn!("Classification failed: {}", other);
                    }
                }
                let error = SessionError::from(e);
                self.state.fail(generation, error.clone());
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("classifier", &self.classifier.name())
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .field("phase", &self.phase())
            .finish()
    }
}
