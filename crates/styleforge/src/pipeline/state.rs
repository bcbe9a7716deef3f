//! Observable per-stage progress records for the conversion pipeline.

use serde::Serialize;

use crate::client::{OperationStatus, StageKind};

/// One stage's progress: its launch operation and, once succeeded, the
/// resource id that feeds the next stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: StageKind,
    pub status: OperationStatus,
    pub operation_id: Option<String>,
    pub resource_id: Option<String>,
}

impl StageRecord {
    fn waiting(stage: StageKind) -> Self {
        Self {
            stage,
            status: OperationStatus::Waiting,
            operation_id: None,
            resource_id: None,
        }
    }
}

/// Status of all four stages, in pipeline order. Reset to all-Waiting when
/// a new upload begins; one instance is owned by exactly one run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineState {
    stages: [StageRecord; 4],
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            stages: StageKind::ALL.map(StageRecord::waiting),
        }
    }

    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    pub fn stage(&self, kind: StageKind) -> &StageRecord {
        &self.stages[Self::index(kind)]
    }

    /// True before any stage has been started.
    pub fn is_idle(&self) -> bool {
        self.stages
            .iter()
            .all(|record| record.status == OperationStatus::Waiting)
    }

    /// Short status text for the currently running stage, or "done".
    pub fn status_line(&self) -> &'static str {
        self.stages
            .iter()
            .find(|record| record.status == OperationStatus::Running)
            .map(|record| record.stage.progress_label())
            .unwrap_or("done")
    }

    pub(crate) fn mark_running(&mut self, kind: StageKind) {
        let record = self.stage_mut(kind);
        record.status = OperationStatus::Running;
    }

    pub(crate) fn record_operation(&mut self, kind: StageKind, operation_id: &str) {
        let record = self.stage_mut(kind);
        record.operation_id = Some(operation_id.to_string());
    }

    pub(crate) fn mark_succeeded(&mut self, kind: StageKind, resource_id: &str) {
        let record = self.stage_mut(kind);
        record.status = OperationStatus::Succeeded;
        record.resource_id = Some(resource_id.to_string());
    }

    pub(crate) fn mark_failed(&mut self, kind: StageKind) {
        let record = self.stage_mut(kind);
        record.status = OperationStatus::Failed;
    }

    fn stage_mut(&mut self, kind: StageKind) -> &mut StageRecord {
        &mut self.stages[Self::index(kind)]
    }

    fn index(kind: StageKind) -> usize {
        match kind {
            StageKind::Data => 0,
            StageKind::Conversion => 1,
            StageKind::Dataset => 2,
            StageKind::Tileset => 3,
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
