//! Sequences the four conversion stages, feeding each stage the previous
//! stage's resource id.

use tracing::{info_span, Instrument};

use crate::client::{poll_until_complete, PollPolicy, StageClient, StageInput, StageKind};

use super::error::PipelineError;
use super::progress::ProgressReporter;
use super::state::PipelineState;

/// Drives upload → conversion → dataset → tileset strictly in order; a
/// stage is only started once the previous stage's operation has been
/// observed as Succeeded. Callers must not start a second run while one is
/// in flight for the same state consumer.
pub struct ConversionPipeline<C> {
    client: C,
    policy: PollPolicy,
}

impl<C: StageClient> ConversionPipeline<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Runs the whole pipeline for one drawing package. Returns the final
    /// tileset id on success; on failure the error names the stage and the
    /// returned state keeps every earlier stage's Succeeded record for
    /// diagnostic display.
    pub async fn run(
        &self,
        package: Vec<u8>,
        progress: &dyn ProgressReporter,
    ) -> (Result<String, PipelineError>, PipelineState) {
        let mut state = PipelineState::new();
        progress.report(&state);

        let udid = match self
            .run_stage(StageKind::Data, StageInput::Package(package), &mut state, progress)
            .await
        {
            Ok(id) => id,
            Err(e) => return (Err(e), state),
        };

        let conversion_id = match self
            .run_stage(
                StageKind::Conversion,
                StageInput::Resource(udid),
                &mut state,
                progress,
            )
            .await
        {
            Ok(id) => id,
            Err(e) => return (Err(e), state),
        };

        let dataset_id = match self
            .run_stage(
                StageKind::Dataset,
                StageInput::Resource(conversion_id),
                &mut state,
                progress,
            )
            .await
        {
            Ok(id) => id,
            Err(e) => return (Err(e), state),
        };

        let tileset_id = match self
            .run_stage(
                StageKind::Tileset,
                StageInput::Resource(dataset_id),
                &mut state,
                progress,
            )
            .await
        {
            Ok(id) => id,
            Err(e) => return (Err(e), state),
        };

        (Ok(tileset_id), state)
    }

    async fn run_stage(
        &self,
        stage: StageKind,
        input: StageInput,
        state: &mut PipelineState,
        progress: &dyn ProgressReporter,
    ) -> Result<String, PipelineError> {
        let span = info_span!("pipeline_stage", stage = %stage);

        async {
            state.mark_running(stage);
            progress.report(state);

            let accepted = match self.client.start(stage, input).await {
                Ok(accepted) => accepted,
                Err(source) => {
                    state.mark_failed(stage);
                    progress.report(state);
                    return Err(PipelineError::Stage { stage, source });
                }
            };

            state.record_operation(stage, &accepted.operation_id);
            progress.report(state);

            let resource_id = match poll_until_complete(
                &self.client,
                stage.operations(),
                &accepted.operation_id,
                &self.policy,
            )
            .await
            {
                Ok(id) => id,
                Err(source) => {
                    state.mark_failed(stage);
                    progress.report(state);
                    return Err(PipelineError::Stage { stage, source });
                }
            };

            state.mark_succeeded(stage, &resource_id);
            progress.report(state);
            Ok(resource_id)
        }
        .instrument(span)
        .await
    }
}
