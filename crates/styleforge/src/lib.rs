pub mod archive;
pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod style;

pub use archive::{ArchiveError, StyleArchive};
pub use client::{
    AcceptedOperation, ClientError, HttpOperationClient, OperationStatus, OperationUpdate,
    PollPolicy, StageInput, StageKind,
};
pub use config::{load_config, AccountConfig, ConfigError};
pub use error::{Result, StyleforgeError};
pub use pipeline::{ConversionPipeline, PipelineError, PipelineState, ProgressReporter};
pub use resolver::{CancelToken, ResolvedStyle, Resolver, ResolverError, SelectedConfiguration};
