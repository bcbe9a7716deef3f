use thiserror::Error;

use crate::archive::ArchiveError;
use crate::client::error::ClientError;

pub type Result<T> = std::result::Result<T, ResolverError>;

#[derive(Error, Debug)]
pub enum ResolverError {
    /// A fetch within a resolve step failed. The stage names which fetch
    /// (listing, configuration, style, tileset metadata) and the body
    /// carries the server's response for diagnostics.
    #[error("failed to resolve {stage}: {body}")]
    Resolve { stage: &'static str, body: String },

    #[error("alias {0:?} uses a reserved prefix and cannot be claimed")]
    ReservedAlias(String),

    #[error("selected pairing index {index} is out of range, configuration has {count} pairings")]
    TupleOutOfRange { index: usize, count: usize },

    #[error("configuration {0} has no selectable style pairings")]
    InvalidConfiguration(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("failed to parse {context}: {source}")]
    Parse {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
