pub mod error;
pub mod progress;
pub mod runner;
pub mod state;

pub use error::PipelineError;
pub use progress::{BroadcastProgress, NoopProgress, ProgressReporter};
pub use runner::ConversionPipeline;
pub use state::{PipelineState, StageRecord};
