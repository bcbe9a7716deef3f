//! Scripted stand-ins for the HTTP operation client.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use styleforge::client::{
    AcceptedOperation, ArtifactClient, ClientError, OperationKind, OperationSource,
    OperationStatus, OperationUpdate, Result, StageClient, StageInput, StageKind,
};

/// Drives the pipeline without a network: every stage start is accepted,
/// every operation needs `running_polls` polls before it succeeds, and a
/// stage can be scripted to fail at start or at poll time.
pub struct FakeStageClient {
    running_polls: u32,
    fail_start: Option<StageKind>,
    fail_poll: Option<StageKind>,
    poll_counts: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
}

impl FakeStageClient {
    pub fn new() -> Self {
        Self {
            running_polls: 1,
            fail_start: None,
            fail_poll: None,
            poll_counts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_running_polls(mut self, polls: u32) -> Self {
        self.running_polls = polls;
        self
    }

    pub fn failing_at_start(mut self, stage: StageKind) -> Self {
        self.fail_start = Some(stage);
        self
    }

    pub fn failing_at_poll(mut self, stage: StageKind) -> Self {
        self.fail_poll = Some(stage);
        self
    }

    /// Every call the pipeline made, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn stage_for_label(label: &str) -> Option<StageKind> {
        StageKind::ALL
            .into_iter()
            .find(|stage| stage.operations().label() == label)
    }
}

impl Default for FakeStageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationSource for FakeStageClient {
    async fn poll_once(&self, kind: OperationKind, operation_id: &str) -> Result<OperationUpdate> {
        self.record(format!("poll {} {}", kind.label(), operation_id));

        let stage = Self::stage_for_label(kind.label());
        if stage.is_some() && stage == self.fail_poll {
            return Err(ClientError::PollRejected {
                kind,
                operation_id: operation_id.to_string(),
                status: 500,
                body: "internal error".to_string(),
            });
        }

        let mut counts = self.poll_counts.lock().unwrap();
        let seen = counts.entry(operation_id.to_string()).or_insert(0);
        *seen += 1;
        if *seen <= self.running_polls {
            return Ok(OperationUpdate {
                status: OperationStatus::Running,
                resource_id: None,
            });
        }
        Ok(OperationUpdate {
            status: OperationStatus::Succeeded,
            resource_id: Some(format!("{}-resource", kind.label())),
        })
    }
}

#[async_trait]
impl StageClient for FakeStageClient {
    async fn start(&self, stage: StageKind, input: StageInput) -> Result<AcceptedOperation> {
        let input_text = match &input {
            StageInput::Package(bytes) => format!("package[{}]", bytes.len()),
            StageInput::Resource(id) => id.clone(),
        };
        self.record(format!("start {stage} <- {input_text}"));

        if Some(stage) == self.fail_start {
            return Err(ClientError::StartRejected {
                stage,
                status: 400,
                body: "bad package".to_string(),
            });
        }
        Ok(AcceptedOperation {
            operation_id: format!("op-{stage}"),
        })
    }
}

/// Serves artifact fetches from pre-routed responses and records every call
/// so tests can assert sequencing (or the absence of any call at all).
pub struct FakeArtifactClient {
    json_routes: HashMap<String, Value>,
    byte_routes: HashMap<String, Vec<u8>>,
    create_operation_id: String,
    create_resource_id: String,
    fail_delete: bool,
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeArtifactClient {
    pub fn new() -> Self {
        Self {
            json_routes: HashMap::new(),
            byte_routes: HashMap::new(),
            create_operation_id: "op-create".to_string(),
            create_resource_id: "created-artifact".to_string(),
            fail_delete: false,
            uploads: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_json(mut self, path: &str, body: Value) -> Self {
        self.json_routes.insert(path.to_string(), body);
        self
    }

    pub fn with_bytes(mut self, path: &str, body: Vec<u8>) -> Self {
        self.byte_routes.insert(path.to_string(), body);
        self
    }

    /// Scripts the id the next create's polling resolves to.
    pub fn with_created_id(mut self, resource_id: &str) -> Self {
        self.create_resource_id = resource_id.to_string();
        self
    }

    pub fn with_failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Bodies handed to `create_artifact`, in order.
    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for FakeArtifactClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationSource for FakeArtifactClient {
    async fn poll_once(&self, kind: OperationKind, operation_id: &str) -> Result<OperationUpdate> {
        self.record(format!("poll {} {}", kind.label(), operation_id));
        Ok(OperationUpdate {
            status: OperationStatus::Succeeded,
            resource_id: Some(self.create_resource_id.clone()),
        })
    }
}

#[async_trait]
impl ArtifactClient for FakeArtifactClient {
    async fn get_json(&self, path: &str, _query: &[(&str, &str)]) -> Result<Value> {
        self.record(format!("get {path}"));
        self.json_routes
            .get(path)
            .cloned()
            .ok_or_else(|| ClientError::RequestRejected {
                path: path.to_string(),
                status: 404,
                body: "not found".to_string(),
            })
    }

    async fn get_bytes(&self, path: &str, _query: &[(&str, &str)]) -> Result<Vec<u8>> {
        self.record(format!("get {path}"));
        self.byte_routes
            .get(path)
            .cloned()
            .ok_or_else(|| ClientError::RequestRejected {
                path: path.to_string(),
                status: 404,
                body: "not found".to_string(),
            })
    }

    async fn create_artifact(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<AcceptedOperation> {
        let alias = query
            .iter()
            .find(|(key, _)| *key == "alias")
            .map(|(_, value)| *value)
            .unwrap_or("");
        self.record(format!("create {path} alias={alias}"));
        self.uploads.lock().unwrap().push((path.to_string(), body));
        Ok(AcceptedOperation {
            operation_id: self.create_operation_id.clone(),
        })
    }

    async fn delete_artifact(&self, path: &str) -> Result<()> {
        self.record(format!("delete {path}"));
        if self.fail_delete {
            return Err(ClientError::RequestRejected {
                path: path.to_string(),
                status: 409,
                body: "artifact is referenced".to_string(),
            });
        }
        Ok(())
    }
}
