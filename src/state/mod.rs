// State management module
//
// This module provides the StateManager which wraps SessionState with thread-safe access
// using Arc<RwLock<T>> and emits change events for the presentation layer.

use crate::models::{
    AcquisitionSource, AggregateStats, ClassificationResult, ImageArtifact, SessionPhase,
    SessionState, fold,
};
use crate::session::SessionError;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when session state is modified
///
/// These events let the presentation layer react to the session without
/// polling [`StateManager::snapshot`].
#[derive(Clone, Debug, PartialEq)]
pub enum SessionChange {
    /// The session moved to a new phase
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },

    /// A new image became the current image
    ImageCaptured {
        source: AcquisitionSource,
        bytes: usize,
    },

    /// The current result list changed (empty after retry or failure)
    ResultsUpdated {
        count: usize,
        primary_category: Option<String>,
    },

    /// Aggregate statistics changed
    StatsUpdated {
        stats: AggregateStats,
    },

    /// A capture or classification failed
    ErrorRaised {
        error: SessionError,
    },

    /// Aggregate statistics were explicitly zeroed
    StatsReset,
}

/// Thread-safe session state holder with event emission
///
/// This is the only component that mutates [`SessionState`]. Besides the
/// generic [`update()`](Self::update), it exposes the transitions of the
/// capture cycle; each transition checks the current phase and the capture
/// generation so that work belonging to an abandoned capture can never
/// touch the state.
///
/// # Related Types
///
/// - [`crate::models::SessionState`]: The underlying state structure
/// - [`SessionChange`]: Event types emitted on state mutations
/// - [`crate::session::SessionController`]: Drives the transitions
pub struct StateManager {
    /// The session state protected by RwLock for thread-safe access
    state: Arc<RwLock<SessionState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<SessionChange>,
}

impl StateManager {
    /// Create a new StateManager with an idle session
    ///
    /// The broadcast channel buffers 100 events per subscriber.
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state
    pub fn snapshot(&self) -> SessionState {
        self.read(|s| s.clone())
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let phase = state_manager.read(|state| state.phase);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SessionState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// Returns the emitted events.
    pub fn update<F>(&self, update_fn: F) -> Vec<SessionChange>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);
        drop(state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.state_tx.subscribe()
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(old: &SessionState, new: &SessionState) -> Vec<SessionChange> {
        let mut changes = Vec::new();

        if old.phase != new.phase {
            changes.push(SessionChange::PhaseChanged {
                from: old.phase,
                to: new.phase,
            });
        }

        if let Some(image) = &new.current_image {
            if old.current_image.as_ref() != Some(image) {
                changes.push(SessionChange::ImageCaptured {
                    source: image.source(),
                    bytes: image.len(),
                });
            }
        }

        if old.current_results != new.current_results {
            changes.push(SessionChange::ResultsUpdated {
                count: new.current_results.len(),
                primary_category: new.primary_result().map(|r| r.category.clone()),
            });
        }

        if old.stats != new.stats {
            changes.push(SessionChange::StatsUpdated {
                stats: new.stats.clone(),
            });
        }

        if let Some(error) = &new.last_error {
            if old.last_error.as_ref() != Some(error) {
                changes.push(SessionChange::ErrorRaised {
                    error: error.clone(),
                });
            }
        }

        changes
    }

    // Session transitions

    /// Enter `Capturing`, discarding the previous image and results.
    ///
    /// Fails with [`SessionError::Busy`] while another capture or
    /// classification is in progress. Returns the generation that identifies
    /// this capture.
    pub fn begin_capture(&self, source: AcquisitionSource) -> Result<u64, SessionError> {
        let mut outcome = Err(SessionError::Busy(SessionPhase::Capturing));
        self.update(|state| {
            if state.phase.is_busy() {
                outcome = Err(SessionError::Busy(state.phase));
                return;
            }
            state.generation += 1;
            state.phase = SessionPhase::Capturing;
            state.last_error = None;
            state.clear_current();
            outcome = Ok(state.generation);
        });

        match &outcome {
            Ok(generation) => tracing::info!("Capture #{} started from {}", generation, source),
            Err(e) => tracing::warn!("Rejected {} capture: {}", source, e),
        }
        outcome
    }

    /// Hand the captured image over and enter `Classifying`.
    ///
    /// Returns false if the capture was abandoned in the meantime.
    pub fn begin_classifying(&self, generation: u64, artifact: ImageArtifact) -> bool {
        let mut accepted = false;
        self.update(|state| {
            if state.generation != generation || state.phase != SessionPhase::Capturing {
                return;
            }
            state.current_image = Some(artifact);
            state.phase = SessionPhase::Classifying;
            accepted = true;
        });
        accepted
    }

    /// Publish results, fold them into the statistics and enter
    /// `ShowingResults`.
    ///
    /// The fold happens here and nowhere else, once per accepted entry into
    /// `ShowingResults`. Returns the new statistics, or `None` if the
    /// results belong to an abandoned capture and were discarded.
    pub fn complete_classification(
        &self,
        generation: u64,
        results: Vec<ClassificationResult>,
    ) -> Option<AggregateStats> {
        let mut folded = None;
        self.update(|state| {
            if state.generation != generation || state.phase != SessionPhase::Classifying {
                return;
            }
            state.stats = fold(&state.stats, &results);
            state.current_results = results;
            state.captures_completed += 1;
            state.phase = SessionPhase::ShowingResults;
            folded = Some(state.stats.clone());
        });

        if folded.is_none() {
            tracing::info!("Discarding results of abandoned capture #{}", generation);
        }
        folded
    }

    /// Record a failure for the given capture and return to `Idle`.
    ///
    /// Statistics are left untouched. Returns false if the capture had
    /// already been abandoned.
    pub fn fail(&self, generation: u64, error: SessionError) -> bool {
        let mut applied = false;
        self.update(|state| {
            if state.generation != generation || !state.phase.is_busy() {
                return;
            }
            state.phase = SessionPhase::Idle;
            state.clear_current();
            state.last_error = Some(error);
            applied = true;
        });
        applied
    }

    /// Abandon whatever capture is in progress.
    ///
    /// Bumps the generation so late results are discarded. Returns false if
    /// nothing was in progress.
    pub fn abandon(&self) -> bool {
        let mut abandoned = false;
        self.update(|state| {
            if !state.phase.is_busy() {
                return;
            }
            state.generation += 1;
            state.phase = SessionPhase::Idle;
            state.clear_current();
            state.last_error = Some(SessionError::Cancelled);
            abandoned = true;
        });
        abandoned
    }

    /// Clear the current image and results and return to `Idle`.
    ///
    /// Aggregate statistics are kept.
    pub fn retry(&self) -> Result<Vec<SessionChange>, SessionError> {
        let mut busy = None;
        let changes = self.update(|state| {
            if state.phase.is_busy() {
                busy = Some(state.phase);
                return;
            }
            state.phase = SessionPhase::Idle;
            state.clear_current();
            state.last_error = None;
        });

        match busy {
            Some(phase) => Err(SessionError::Busy(phase)),
            None => Ok(changes),
        }
    }

    /// Zero the aggregate statistics.
    pub fn reset_stats(&self) -> Vec<SessionChange> {
        let mut changes = self.update(|state| state.reset_stats());

        let reset_event = SessionChange::StatsReset;
        let _ = self.state_tx.send(reset_event.clone());
        changes.push(reset_event);

        changes
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Cloning shares the underlying state and channel
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
