//! Inverted-index phrase search with Elias gamma / delta compressed postings.

pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod matcher;
pub mod persist;
pub mod postings;
pub mod preprocess;
pub mod search;
pub mod source;

pub use codec::{EncodedPostings, Encoding};
pub use config::{EngineConfig, OpenedEngine};
pub use error::{Error, Result};
pub use index::{DocId, IndexBuilder, IndexStats, InvertedIndex};
pub use persist::CacheStatus;
pub use postings::{PostingBackend, PostingList, PostingStore};
pub use preprocess::{Preprocessor, TextProcessor};
pub use search::{SearchEngine, SearchHit};
pub use source::{DocumentSource, FileSource, MemorySource, SqliteSource};
