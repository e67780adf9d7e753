use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::codec::Encoding;
use crate::error::{Error, Result};
use crate::index::{IndexBuilder, InvertedIndex};
use crate::postings::PostingBackend;
use crate::preprocess::TextProcessor;
use crate::source::DocumentSource;

pub const INDEX_FORMAT_VERSION: u32 = 2;

/// Human-readable sidecar written next to every index blob.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub cache_key: String,
    pub source: String,
    pub methods: Vec<String>,
    pub encoding: Option<Encoding>,
    pub num_docs: u32,
    pub num_tokens: usize,
    pub created_at: String,
    pub version: u32,
}

/// On-disk blob: index configuration plus the posting store's own export.
#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    methods: Vec<String>,
    num_docs: u32,
    postings: Vec<u8>,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn index_file(&self, key: &str) -> PathBuf { self.root.join(format!("{key}.index.bin")) }
    pub fn meta(&self, key: &str) -> PathBuf { self.root.join(format!("{key}.meta.json")) }
}

/// SHA-1 over the source identity, the ordered method names and the encoding.
///
/// Fields are separated so that ("ab", ["c"]) and ("a", ["bc"]) never collide.
pub fn cache_key(source_identity: &str, methods: &[String], encoding: Option<Encoding>) -> String {
    let mut hasher = Sha1::new();
    hasher.update(source_identity.as_bytes());
    hasher.update([0u8]);
    for m in methods {
        hasher.update(m.as_bytes());
        hasher.update([0x1f]);
    }
    hasher.update([0u8]);
    hasher.update(encoding.map_or("none", |e| e.as_str()).as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn save_index(paths: &IndexPaths, key: &str, source: &str, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let file = IndexFile {
        version: INDEX_FORMAT_VERSION,
        methods: index.methods.clone(),
        num_docs: index.num_docs,
        postings: index.postings.export()?,
    };
    let mut f = File::create(paths.index_file(key))?;
    let bytes = bincode::serialize(&file)?;
    f.write_all(&bytes)?;

    let meta = MetaFile {
        cache_key: key.to_string(),
        source: source.to_string(),
        methods: index.methods().to_vec(),
        encoding: index.encoding(),
        num_docs: index.num_docs(),
        num_tokens: index.num_tokens(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: INDEX_FORMAT_VERSION,
    };
    save_meta(paths, key, &meta)?;
    tracing::info!(cache_key = key, bytes = bytes.len(), "saved index");
    Ok(())
}

/// `Ok(None)` when nothing is cached under `key`. A present but unreadable blob is an error.
pub fn load_index(paths: &IndexPaths, key: &str) -> Result<Option<InvertedIndex>> {
    let path = paths.index_file(key);
    if !path.exists() {
        return Ok(None);
    }
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let file: IndexFile = bincode::deserialize(&buf)?;
    if file.version != INDEX_FORMAT_VERSION {
        return Err(Error::UnsupportedIndexVersion { expected: INDEX_FORMAT_VERSION, actual: file.version });
    }
    let index = InvertedIndex {
        postings: PostingBackend::import(&file.postings)?,
        methods: file.methods,
        num_docs: file.num_docs,
    };
    tracing::info!(cache_key = key, num_tokens = index.num_tokens(), "loaded index from cache");
    Ok(Some(index))
}

pub fn save_meta(paths: &IndexPaths, key: &str, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta(key))?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths, key: &str) -> Result<MetaFile> {
    let mut f = File::open(paths.meta(key))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Read from an existing blob.
    Loaded,
    /// Built from the corpus and written to the cache.
    Built,
}

/// Result of [`load_or_build`]: the index together with the corpus it refers to.
pub struct CachedIndex {
    pub index: InvertedIndex,
    pub documents: Vec<String>,
    pub cache_key: String,
    pub status: CacheStatus,
}

/// Reuse the index cached for this (source, methods, encoding) triple or build and save it.
///
/// The corpus is always loaded because search returns document text. A cached
/// index is never checked against corpus contents; a differing document count
/// is only reported.
pub fn load_or_build(
    source: &dyn DocumentSource,
    processor: &dyn TextProcessor,
    encoding: Option<Encoding>,
    paths: &IndexPaths,
    force_rebuild: bool,
) -> Result<CachedIndex> {
    let identity = source.identity();
    let methods = processor.method_names();
    let key = cache_key(&identity, &methods, encoding);
    let documents = source.load()?;

    if !force_rebuild {
        if let Some(index) = load_index(paths, &key)? {
            if index.encoding() != encoding || index.methods() != methods.as_slice() {
                return Err(Error::CacheMismatch(key));
            }
            if index.num_docs() as usize != documents.len() {
                tracing::warn!(
                    cache_key = %key,
                    indexed = index.num_docs(),
                    current = documents.len(),
                    "corpus size differs from cached index; results may be stale"
                );
            }
            return Ok(CachedIndex { index, documents, cache_key: key, status: CacheStatus::Loaded });
        }
    }

    let processed: Vec<String> = documents.iter().map(|d| processor.process(d)).collect();
    let index = IndexBuilder::new(encoding).with_methods(methods).build(&processed)?;
    save_index(paths, &key, &identity, &index)?;
    Ok(CachedIndex { index, documents, cache_key: key, status: CacheStatus::Built })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::PostingStore;
    use crate::preprocess::Preprocessor;
    use crate::search::SearchEngine;
    use crate::source::MemorySource;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn key_depends_on_every_input() {
        let base = cache_key("db.sqlite", &names(&["lowercase"]), None);
        assert_eq!(base.len(), 40);
        assert_eq!(base, cache_key("db.sqlite", &names(&["lowercase"]), None));
        assert_ne!(base, cache_key("other.sqlite", &names(&["lowercase"]), None));
        assert_ne!(base, cache_key("db.sqlite", &names(&["lowercase", "lemmatize"]), None));
        assert_ne!(base, cache_key("db.sqlite", &names(&["lowercase"]), Some(Encoding::Gamma)));
        assert_ne!(
            cache_key("db.sqlite", &names(&["lowercase"]), Some(Encoding::Gamma)),
            cache_key("db.sqlite", &names(&["lowercase"]), Some(Encoding::Delta))
        );
    }

    #[test]
    fn method_order_changes_key() {
        let a = cache_key("s", &names(&["lowercase", "lemmatize"]), None);
        let b = cache_key("s", &names(&["lemmatize", "lowercase"]), None);
        assert_ne!(a, b);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let index = IndexBuilder::new(Some(Encoding::Gamma)).build(&["a b", "b c"]).unwrap();
        save_index(&paths, "k", "src", &index).unwrap();

        let loaded = load_index(&paths, "k").unwrap().unwrap();
        assert_eq!(loaded.to_map().unwrap(), index.to_map().unwrap());
        assert_eq!(loaded.postings.encoding(), Some(Encoding::Gamma));
        assert!(loaded.postings.get("c").is_ok());

        let meta = load_meta(&paths, "k").unwrap();
        assert_eq!(meta.num_docs, 2);
        assert_eq!(meta.encoding, Some(Encoding::Gamma));
        assert!(load_index(&paths, "missing").unwrap().is_none());
    }

    #[test]
    fn corrupt_blob_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        std::fs::write(paths.index_file("bad"), b"not bincode").unwrap();
        assert!(load_index(&paths, "bad").is_err());
    }

    #[test]
    fn second_open_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let source = MemorySource::new("corpus", ["Hello World", "hello there"]);
        let processor = Preprocessor::from_names(&["lowercase"]).unwrap();

        let first = load_or_build(&source, &processor, Some(Encoding::Delta), &paths, false).unwrap();
        assert_eq!(first.status, CacheStatus::Built);
        let second = load_or_build(&source, &processor, Some(Encoding::Delta), &paths, false).unwrap();
        assert_eq!(second.status, CacheStatus::Loaded);
        assert_eq!(first.cache_key, second.cache_key);
        assert_eq!(second.index.postings("hello").unwrap(), vec![0, 1]);

        let forced = load_or_build(&source, &processor, Some(Encoding::Delta), &paths, true).unwrap();
        assert_eq!(forced.status, CacheStatus::Built);
    }

    #[test]
    fn blob_carries_the_store_export() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let index = IndexBuilder::new(Some(Encoding::Delta))
            .with_methods(names(&["lowercase"]))
            .build(&["x y", "y z", "x z"])
            .unwrap();
        save_index(&paths, "k", "src", &index).unwrap();

        let raw = std::fs::read(paths.index_file("k")).unwrap();
        let file: IndexFile = bincode::deserialize(&raw).unwrap();
        assert_eq!(file.version, INDEX_FORMAT_VERSION);
        assert_eq!(file.methods, names(&["lowercase"]));
        assert_eq!(file.num_docs, 3);
        assert_eq!(file.postings, index.postings.export().unwrap());

        let store = PostingBackend::import(&file.postings).unwrap();
        assert_eq!(store.encoding(), Some(Encoding::Delta));
        assert_eq!(store.get("z").unwrap(), vec![1, 2]);
    }

    #[test]
    fn shrunken_corpus_reuses_cache_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let processor = Preprocessor::from_names(&["lowercase"]).unwrap();

        let full = MemorySource::new("s", ["a x", "b", "a y"]);
        let built = load_or_build(&full, &processor, None, &paths, false).unwrap();
        assert_eq!(built.status, CacheStatus::Built);

        // same identity, fewer documents: the stale index is reused as is
        let shrunk = MemorySource::new("s", ["a x"]);
        let cached = load_or_build(&shrunk, &processor, None, &paths, false).unwrap();
        assert_eq!(cached.status, CacheStatus::Loaded);
        assert_eq!(cached.index.postings("a").unwrap(), vec![0, 2]);

        let engine = SearchEngine::new(cached.index, cached.documents, processor);
        assert_eq!(engine.search_indices("a").unwrap(), vec![0]);
        assert_eq!(engine.search_documents("A").unwrap(), vec!["a x".to_string()]);
    }

    #[test]
    fn cached_blob_with_other_configuration_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let wanted = names(&["lowercase", "normalize_spaces"]);

        // an index built with a different method list, stored under the key of `wanted`
        let key = cache_key("s", &wanted, None);
        let other = IndexBuilder::new(None).with_methods(names(&["lowercase"])).build(&["a"]).unwrap();
        save_index(&paths, &key, "s", &other).unwrap();

        let source = MemorySource::new("s", ["a"]);
        let processor = Preprocessor::from_names(&wanted).unwrap();
        let err = load_or_build(&source, &processor, None, &paths, false).err().unwrap();
        assert!(matches!(err, Error::CacheMismatch(ref k) if *k == key));

        // same methods, wrong encoding
        let key = cache_key("s", &wanted, Some(Encoding::Gamma));
        let other = IndexBuilder::new(None).with_methods(wanted.clone()).build(&["a"]).unwrap();
        save_index(&paths, &key, "s", &other).unwrap();
        let err = load_or_build(&source, &processor, Some(Encoding::Gamma), &paths, false).err().unwrap();
        assert!(matches!(err, Error::CacheMismatch(_)));

        // an explicit rebuild replaces the bad entry
        let rebuilt = load_or_build(&source, &processor, Some(Encoding::Gamma), &paths, true).unwrap();
        assert_eq!(rebuilt.status, CacheStatus::Built);
        assert_eq!(rebuilt.index.encoding(), Some(Encoding::Gamma));
    }
}
