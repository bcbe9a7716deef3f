use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The bundle must contain exactly one more JSON entry than PNG entries:
    /// the root document plus one index JSON per sprite sheet.
    #[error("invalid bundle structure: {json_count} JSON and {png_count} PNG entries, expected exactly one root document and one index per image")]
    Structure { json_count: usize, png_count: usize },

    #[error("image entry {0} has no matching index JSON")]
    UnpairedSidecar(String),

    #[error("failed to parse root document {name}: {source}")]
    RootParse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize root document: {0}")]
    RootSerialize(#[source] serde_json::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
