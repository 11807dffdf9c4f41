//! Stateful front of the orchestrator for interactive callers
//!
//! Holds what a form view needs between renders: whether a submission is in
//! flight, where it is, the last successful analysis and the last error
//! message. Only one submission runs at a time.

use super::orchestrator::AnalysisOrchestrator;
use super::types::{AnalysisError, AnalysisState, HotelAnalysis};
use crate::model::HotelInput;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Snapshot of a session
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    pub state: AnalysisState,
    pub analysis: Option<HotelAnalysis>,
    pub error: Option<String>,
}

/// Clears the busy flag when the submission ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct AnalysisSession {
    orchestrator: Arc<AnalysisOrchestrator>,
    busy: AtomicBool,
    view: Mutex<SessionView>,
}

impl AnalysisSession {
    pub fn new(orchestrator: Arc<AnalysisOrchestrator>) -> Self {
        Self {
            orchestrator,
            busy: AtomicBool::new(false),
            view: Mutex::new(SessionView::default()),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn view(&self) -> SessionView {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> AnalysisState {
        self.view().state
    }

    pub fn analysis(&self) -> Option<HotelAnalysis> {
        self.view().analysis
    }

    pub fn error(&self) -> Option<String> {
        self.view().error
    }

    fn update(&self, f: impl FnOnce(&mut SessionView)) {
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut view);
    }

    /// Run one submission
    ///
    /// Fails with `AnalysisError::Busy`, leaving the session untouched, when
    /// another submission is still in flight. The previous analysis stays
    /// visible until a new one succeeds.
    pub async fn submit(&self, input: &HotelInput) -> Result<HotelAnalysis, AnalysisError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("submission rejected: analysis already in progress");
            return Err(AnalysisError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        self.update(|view| view.error = None);

        let result = self
            .orchestrator
            .analyze_hotel_with(input, |state| {
                let state = state.clone();
                self.update(|view| view.state = state);
            })
            .await;

        match &result {
            Ok(analysis) => {
                let analysis = analysis.clone();
                self.update(|view| view.analysis = Some(analysis));
            }
            Err(e) => {
                let message = e.user_message();
                self.update(|view| view.error = Some(message));
            }
        }
        result
    }
}
