use std::sync::Arc;

use tokio::sync::broadcast;

use super::state::PipelineState;

/// Receives a snapshot after every stage transition (Waiting→Running before
/// a stage starts, Running→Succeeded with the resolved resource id after the
/// poller finishes, Running→Failed on error).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, state: &PipelineState);
}

/// No-op reporter for unit tests and fire-and-forget callers.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _state: &PipelineState) {}
}

/// Bridges pipeline snapshots onto a broadcast channel for a progress UI.
pub struct BroadcastProgress {
    sender: Arc<broadcast::Sender<PipelineState>>,
}

impl BroadcastProgress {
    pub fn new(sender: Arc<broadcast::Sender<PipelineState>>) -> Self {
        Self { sender }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, state: &PipelineState) {
        // A send error only means nobody is listening right now.
        let _ = self.sender.send(state.clone());
    }
}
