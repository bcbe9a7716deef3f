use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleforgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] crate::client::ClientError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Archive error: {0}")]
    Archive(#[from] crate::archive::ArchiveError),

    #[error("Resolver error: {0}")]
    Resolver(#[from] crate::resolver::ResolverError),
}

pub type Result<T> = std::result::Result<T, StyleforgeError>;
