use crate::models::{AggregateStats, ClassificationResult, DetectionHeadline, ImageArtifact};
use crate::session::SessionError;
use std::fmt;

/// Phases of the capture → classify → show cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    #[default]
    Idle,
    Capturing,
    Classifying,
    ShowingResults,
}

impl SessionPhase {
    /// True while a capture or classification owns the session.
    pub fn is_busy(self) -> bool {
        matches!(self, SessionPhase::Capturing | SessionPhase::Classifying)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Capturing => "capturing",
            SessionPhase::Classifying => "classifying",
            SessionPhase::ShowingResults => "showing results",
        };
        f.write_str(name)
    }
}

/// Single source of truth for a detection session.
///
/// Wrapped in `Arc<RwLock<SessionState>>` by
/// [`StateManager`](crate::state::StateManager); never mutate it directly
/// from outside the state module. Snapshots are cheap to clone because the
/// image payload is reference counted.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: SessionPhase,

    // Current capture (cleared on retry)
    pub current_image: Option<ImageArtifact>,
    pub current_results: Vec<ClassificationResult>,

    // Cumulative across the whole session
    pub stats: AggregateStats,
    pub captures_completed: u64,

    /// Most recent failure, cleared when the next capture starts
    pub last_error: Option<SessionError>,

    /// Bumped whenever a capture starts or is abandoned; a classification
    /// finishing under an older generation is discarded.
    pub generation: u64,
}

impl SessionState {
    /// First detection of the current capture, if any.
    pub fn primary_result(&self) -> Option<&ClassificationResult> {
        self.current_results.first()
    }

    /// Headline card for the current capture; `None` when nothing is shown.
    pub fn headline(&self) -> Option<DetectionHeadline> {
        if self.current_image.is_none() || self.current_results.is_empty() {
            return None;
        }
        Some(DetectionHeadline::from_results(&self.current_results))
    }

    /// Forget the current image and results. Statistics are kept.
    pub fn clear_current(&mut self) {
        self.current_image = None;
        self.current_results.clear();
    }

    /// Zero the cumulative statistics.
    pub fn reset_stats(&mut self) {
        self.stats = AggregateStats::default();
        self.captures_completed = 0;
    }
}
