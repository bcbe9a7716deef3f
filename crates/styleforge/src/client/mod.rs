//! REST client for the mapping service's long-running-operation endpoints.

pub mod error;
pub mod http;
pub mod poller;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::{ClientError, Result};
pub use http::HttpOperationClient;
pub use poller::{poll_until_complete, PollPolicy};

/// The four stages of the drawing-package conversion pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Data,
    Conversion,
    Dataset,
    Tileset,
}

impl StageKind {
    pub const ALL: [StageKind; 4] = [
        StageKind::Data,
        StageKind::Conversion,
        StageKind::Dataset,
        StageKind::Tileset,
    ];

    /// Collection path the stage is started against.
    pub fn collection_path(&self) -> &'static str {
        match self {
            StageKind::Data => "/mapData",
            StageKind::Conversion => "/conversions",
            StageKind::Dataset => "/datasets",
            StageKind::Tileset => "/tilesets",
        }
    }

    /// Short progress text for display while the stage runs.
    pub fn progress_label(&self) -> &'static str {
        match self {
            StageKind::Data => "uploading...",
            StageKind::Conversion => "converting...",
            StageKind::Dataset => "creating dataset...",
            StageKind::Tileset => "creating tileset...",
        }
    }

    pub fn operations(&self) -> OperationKind {
        match self {
            StageKind::Data => OperationKind::new("/mapData", "data"),
            StageKind::Conversion => OperationKind::new("/conversions", "conversion"),
            StageKind::Dataset => OperationKind::new("/datasets", "dataset"),
            StageKind::Tileset => OperationKind::new("/tilesets", "tileset"),
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operations().label())
    }
}

/// Addresses one family of pollable operations: the collection that owns
/// them and a label for error/progress text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationKind {
    collection: &'static str,
    label: &'static str,
}

impl OperationKind {
    pub const fn new(collection: &'static str, label: &'static str) -> Self {
        Self { collection, label }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

/// Operations behind style artifact creation.
pub const STYLE_OPERATIONS: OperationKind = OperationKind::new("/styles", "style");

/// Operations behind map configuration artifact creation.
pub const MAP_CONFIGURATION_OPERATIONS: OperationKind =
    OperationKind::new("/styles/mapConfigurations", "map configuration");

/// Status reported by the service for an async operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Waiting,
    Running,
    Succeeded,
    Failed,
    /// Unrecognized wire status; treated as non-terminal.
    Other(String),
}

impl OperationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OperationStatus::Waiting => "Waiting",
            OperationStatus::Running => "Running",
            OperationStatus::Succeeded => "Succeeded",
            OperationStatus::Failed => "Failed",
            OperationStatus::Other(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Succeeded | OperationStatus::Failed)
    }
}

impl From<&str> for OperationStatus {
    fn from(s: &str) -> Self {
        match s {
            "Waiting" | "NotStarted" => OperationStatus::Waiting,
            "Running" => OperationStatus::Running,
            "Succeeded" => OperationStatus::Succeeded,
            "Failed" => OperationStatus::Failed,
            other => OperationStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OperationStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OperationStatus {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(OperationStatus::from(s.as_str()))
    }
}

/// A successfully started operation (HTTP 202 + `operation-location`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedOperation {
    pub operation_id: String,
}

/// Outcome of a single poll. `resource_id` is present once the service
/// attaches a `resource-location` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationUpdate {
    pub status: OperationStatus,
    pub resource_id: Option<String>,
}

/// Input handed to a stage when it is started: the raw drawing package for
/// the upload stage, the previous stage's resource id for the rest.
#[derive(Debug, Clone)]
pub enum StageInput {
    Package(Vec<u8>),
    Resource(String),
}

/// One poll against an operation's status endpoint.
#[async_trait]
pub trait OperationSource: Send + Sync {
    async fn poll_once(&self, kind: OperationKind, operation_id: &str) -> Result<OperationUpdate>;
}

/// Starts pipeline stages. Implemented by [`HttpOperationClient`]; tests
/// substitute scripted fakes.
#[async_trait]
pub trait StageClient: OperationSource {
    async fn start(&self, stage: StageKind, input: StageInput) -> Result<AcceptedOperation>;
}

/// Artifact-level calls used by the resolver: listings, archive downloads,
/// LRO-backed creates and deletes.
#[async_trait]
pub trait ArtifactClient: OperationSource {
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<serde_json::Value>;

    async fn get_bytes(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<u8>>;

    async fn create_artifact(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<AcceptedOperation>;

    async fn delete_artifact(&self, path: &str) -> Result<()>;
}

/// Extracts an id from an `operation-location` / `resource-location` URI:
/// the final path segment, with any query string stripped.
pub fn id_from_location(uri: &str) -> Option<String> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    let without_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
    // A bare authority with no path has no id to offer.
    let (_, segments) = without_scheme.split_once('/')?;
    let segment = segments.trim_end_matches('/').rsplit('/').next()?;
    if segment.is_empty() {
        return None;
    }
    Some(segment.to_string())
}
