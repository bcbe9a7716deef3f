//! Integration tests for the four-stage conversion pipeline.

mod common;

use std::sync::Mutex;
use std::time::Duration;

use styleforge::client::OperationStatus;
use styleforge::pipeline::{NoopProgress, PipelineState, ProgressReporter};
use styleforge::{ConversionPipeline, PollPolicy, StageKind};

use common::FakeStageClient;

fn fast_policy() -> PollPolicy {
    PollPolicy::default().with_interval(Duration::from_millis(1))
}

/// Captures every reported snapshot for later inspection.
struct RecordingProgress {
    snapshots: Mutex<Vec<PipelineState>>,
}

impl RecordingProgress {
    fn new() -> Self {
        Self {
            snapshots: Mutex::new(Vec::new()),
        }
    }

    fn snapshots(&self) -> Vec<PipelineState> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, state: &PipelineState) {
        self.snapshots.lock().unwrap().push(state.clone());
    }
}

#[tokio::test]
async fn test_successful_run_chains_resource_ids() {
    let client = FakeStageClient::new();
    let pipeline = ConversionPipeline::new(client).with_policy(fast_policy());

    let (result, state) = pipeline.run(vec![1, 2, 3], &NoopProgress).await;
    assert_eq!(result.unwrap(), "tileset-resource");

    for kind in StageKind::ALL {
        assert_eq!(state.stage(kind).status, OperationStatus::Succeeded);
    }
    assert_eq!(
        state.stage(StageKind::Data).resource_id.as_deref(),
        Some("data-resource")
    );
}

#[tokio::test]
async fn test_each_stage_receives_previous_stage_output() {
    let client = FakeStageClient::new();
    let pipeline = ConversionPipeline::new(client).with_policy(fast_policy());

    let (result, _) = pipeline.run(vec![0; 16], &NoopProgress).await;
    assert!(result.is_ok());

    let calls = pipeline.client().calls();
    let starts: Vec<&String> = calls.iter().filter(|c| c.starts_with("start")).collect();
    assert_eq!(
        starts,
        vec![
            "start data <- package[16]",
            "start conversion <- data-resource",
            "start dataset <- conversion-resource",
            "start tileset <- dataset-resource",
        ]
    );
}

#[tokio::test]
async fn test_no_stage_starts_before_previous_succeeds() {
    let client = FakeStageClient::new().with_running_polls(2);
    let pipeline = ConversionPipeline::new(client).with_policy(fast_policy());

    let (result, _) = pipeline.run(vec![1], &NoopProgress).await;
    assert!(result.is_ok());

    // Every poll of stage N must appear before stage N+1's start. The
    // trailing space keeps "poll data" from matching "poll dataset".
    let calls = pipeline.client().calls();
    let order = ["data", "conversion", "dataset", "tileset"];
    for pair in order.windows(2) {
        let last_poll = calls
            .iter()
            .rposition(|c| c.starts_with(&format!("poll {} ", pair[0])))
            .unwrap();
        let next_start = calls
            .iter()
            .position(|c| c.starts_with(&format!("start {} ", pair[1])))
            .unwrap();
        assert!(
            last_poll < next_start,
            "{} was started before {} finished polling",
            pair[1],
            pair[0]
        );
    }
}

#[tokio::test]
async fn test_failure_keeps_earlier_stage_results() {
    let client = FakeStageClient::new().failing_at_poll(StageKind::Dataset);
    let pipeline = ConversionPipeline::new(client).with_policy(fast_policy());

    let (result, state) = pipeline.run(vec![1], &NoopProgress).await;
    let err = result.unwrap_err();
    assert_eq!(err.stage(), StageKind::Dataset);

    assert_eq!(state.stage(StageKind::Data).status, OperationStatus::Succeeded);
    assert_eq!(
        state.stage(StageKind::Conversion).status,
        OperationStatus::Succeeded
    );
    assert_eq!(
        state.stage(StageKind::Conversion).resource_id.as_deref(),
        Some("conversion-resource")
    );
    assert_eq!(state.stage(StageKind::Dataset).status, OperationStatus::Failed);
    // The tileset stage was never reached.
    assert_eq!(state.stage(StageKind::Tileset).status, OperationStatus::Waiting);
    assert!(state.stage(StageKind::Tileset).operation_id.is_none());
}

#[tokio::test]
async fn test_start_rejection_fails_the_stage_without_polling() {
    let client = FakeStageClient::new().failing_at_start(StageKind::Conversion);
    let pipeline = ConversionPipeline::new(client).with_policy(fast_policy());

    let (result, state) = pipeline.run(vec![1], &NoopProgress).await;
    assert_eq!(result.unwrap_err().stage(), StageKind::Conversion);
    assert_eq!(
        state.stage(StageKind::Conversion).status,
        OperationStatus::Failed
    );

    let calls = pipeline.client().calls();
    assert!(!calls.iter().any(|c| c.starts_with("poll conversion")));
}

#[tokio::test]
async fn test_progress_snapshots_track_stage_labels() {
    let client = FakeStageClient::new();
    let pipeline = ConversionPipeline::new(client).with_policy(fast_policy());
    let progress = RecordingProgress::new();

    let (result, _) = pipeline.run(vec![1], &progress).await;
    assert!(result.is_ok());

    let snapshots = progress.snapshots();
    assert!(snapshots.first().unwrap().is_idle());
    assert_eq!(snapshots.last().unwrap().status_line(), "done");

    let labels: Vec<&str> = snapshots.iter().map(|s| s.status_line()).collect();
    for expected in [
        "uploading...",
        "converting...",
        "creating dataset...",
        "creating tileset...",
    ] {
        assert!(labels.contains(&expected), "missing label {expected:?}");
    }
}
