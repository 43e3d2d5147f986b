use foundation::handles::SourceId;
use scene::engine::{MapEngine, SourceState, SourceStatus};
use tracing::debug;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExtentFitState {
    Waiting { source: SourceId },
    Fired,
}

/// One-shot "zoom to data" controller.
///
/// Waits for the watched source to report ready with at least one feature,
/// fits the view to its extent once, then ignores everything after.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtentFit {
    state: ExtentFitState,
}

impl ExtentFit {
    pub fn new(source: SourceId) -> Self {
        Self {
            state: ExtentFitState::Waiting { source },
        }
    }

    pub fn state(&self) -> ExtentFitState {
        self.state
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.state, ExtentFitState::Waiting { .. })
    }

    /// Handles a "state changed" notification. Returns `true` if the view
    /// was fitted by this call.
    pub fn on_state_changed(
        &mut self,
        source: SourceId,
        status: &SourceStatus,
        map: &mut dyn MapEngine,
    ) -> bool {
        let ExtentFitState::Waiting { source: watched } = self.state else {
            return false;
        };
        if watched != source || status.state != SourceState::Ready || status.feature_count == 0 {
            return false;
        }
        let Some(extent) = status.extent.filter(|e| !e.is_empty()) else {
            return false;
        };

        debug!(%source, features = status.feature_count, "fit view to source extent");
        let size = map.size();
        map.fit_view(extent, size);
        self.state = ExtentFitState::Fired;
        true
    }
}
