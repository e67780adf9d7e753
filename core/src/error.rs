use thiserror::Error;

/// Errors raised by the index, codec and search layers.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown preprocessing method: {0}")]
    UnknownMethod(String),

    #[error("unknown encoding: {0} (expected gamma or delta)")]
    UnknownEncoding(String),

    #[error("zero cannot be represented by an Elias code")]
    ZeroValue,

    #[error("duplicate value {0} in delta input")]
    DuplicateValue(u32),

    #[error("corrupt encoded postings: {0}")]
    CorruptEncoding(String),

    #[error("document ordinal {0} does not fit the posting store")]
    OrdinalOverflow(u32),

    #[error("unsupported index file version {actual}, expected {expected}")]
    UnsupportedIndexVersion { expected: u32, actual: u32 },

    #[error("cached index {0} was built with a different configuration")]
    CacheMismatch(String),

    #[error("document source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptEncoding(msg.into())
    }

    /// True for errors caused by a bad method or encoding name.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::UnknownMethod(_) | Error::UnknownEncoding(_))
    }
}
