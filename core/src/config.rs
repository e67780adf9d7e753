use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codec::Encoding;
use crate::error::Result;
use crate::persist::{cache_key, load_or_build, CacheStatus, IndexPaths};
use crate::preprocess::{Preprocessor, TextProcessor, DEFAULT_METHODS};
use crate::search::SearchEngine;
use crate::source::{DocumentSource, FileSource};

fn default_methods() -> Vec<String> {
    DEFAULT_METHODS.iter().map(|m| m.to_string()).collect()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./data/index")
}

/// Everything that determines which index gets built and where it is cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub source: PathBuf,
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    /// `gamma`, `delta` or none. Validated when the index is opened.
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

pub struct OpenedEngine {
    pub engine: SearchEngine,
    pub cache_key: String,
    pub status: CacheStatus,
}

impl EngineConfig {
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            methods: default_methods(),
            encoding: None,
            cache_dir: default_cache_dir(),
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn preprocessor(&self) -> Result<Preprocessor> {
        Preprocessor::from_names(&self.methods[..])
    }

    pub fn encoding(&self) -> Result<Option<Encoding>> {
        self.encoding.as_deref().map(str::parse::<Encoding>).transpose()
    }

    /// Key of the cache entry this configuration maps to. Validates methods and encoding.
    pub fn cache_key(&self) -> Result<String> {
        let processor = self.preprocessor()?;
        let source = FileSource::new(&self.source);
        Ok(cache_key(&source.identity(), &processor.method_names(), self.encoding()?))
    }

    /// Validate, load or build the index, and wrap it in a [`SearchEngine`].
    pub fn open(&self, force_rebuild: bool) -> Result<OpenedEngine> {
        let processor = self.preprocessor()?;
        let encoding = self.encoding()?;
        let source = FileSource::new(&self.source);
        let paths = IndexPaths::new(&self.cache_dir);
        let cached = load_or_build(&source, &processor, encoding, &paths, force_rebuild)?;
        tracing::info!(cache_key = %cached.cache_key, status = ?cached.status, "index ready");
        Ok(OpenedEngine {
            engine: SearchEngine::new(cached.index, cached.documents, processor),
            cache_key: cached.cache_key,
            status: cached.status,
        })
    }
}
