use thiserror::Error;

use crate::client::{ClientError, StageKind};

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The named stage failed; earlier stages' results stay recorded in the
    /// returned [`super::PipelineState`] for display.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: StageKind,
        #[source]
        source: ClientError,
    },
}

impl PipelineError {
    pub fn stage(&self) -> StageKind {
        match self {
            PipelineError::Stage { stage, .. } => *stage,
        }
    }
}
