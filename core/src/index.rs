use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::codec::Encoding;
use crate::error::{Error, Result};
use crate::postings::{PostingBackend, PostingList, PostingStore};
use crate::preprocess::tokens;

pub type DocId = u32;

/// Token -> posting list mapping plus the configuration it was built with.
#[derive(Debug, Clone)]
pub struct InvertedIndex {
    pub(crate) postings: PostingBackend,
    pub(crate) methods: Vec<String>,
    pub(crate) num_docs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub num_docs: u32,
    pub num_tokens: usize,
    pub encoding: Option<Encoding>,
    pub payload_bytes: usize,
}

impl InvertedIndex {
    pub fn postings(&self, token: &str) -> Result<PostingList> {
        self.postings.get(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.postings.tokens()
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn num_tokens(&self) -> usize {
        self.postings.len()
    }

    pub fn encoding(&self) -> Option<Encoding> {
        self.postings.encoding()
    }

    /// Canonical preprocessing methods used at build time.
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            num_docs: self.num_docs,
            num_tokens: self.num_tokens(),
            encoding: self.encoding(),
            payload_bytes: self.postings.payload_bytes(),
        }
    }

    /// Decoded view of the whole index, independent of the storage backend.
    pub fn to_map(&self) -> Result<BTreeMap<String, PostingList>> {
        self.tokens()
            .map(|t| Ok::<_, Error>((t.to_string(), self.postings(t)?)))
            .collect()
    }
}

/// Builds an [`InvertedIndex`] from already preprocessed documents.
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    encoding: Option<Encoding>,
    methods: Vec<String>,
}

impl IndexBuilder {
    pub fn new(encoding: Option<Encoding>) -> Self {
        Self { encoding, methods: Vec::new() }
    }

    /// Records the preprocessing methods the documents went through.
    pub fn with_methods(mut self, methods: Vec<String>) -> Self {
        self.methods = methods;
        self
    }

    pub fn build<S: AsRef<str>>(&self, documents: &[S]) -> Result<InvertedIndex> {
        let num_docs = u32::try_from(documents.len())
            .map_err(|_| Error::OrdinalOverflow(u32::MAX))?;

        let mut lists: BTreeMap<&str, PostingList> = BTreeMap::new();
        for (doc_id, text) in (0..num_docs).zip(documents) {
            let mut seen_in_doc: HashSet<&str> = HashSet::new();
            for token in tokens(text.as_ref()) {
                if seen_in_doc.insert(token) {
                    lists.entry(token).or_default().push(doc_id);
                }
            }
        }

        let mut postings = PostingBackend::new(self.encoding);
        for (token, list) in lists {
            // ordinals arrive ascending; set() still normalizes
            postings.set(token, list)?;
        }
        tracing::info!(
            num_docs,
            num_tokens = postings.len(),
            encoding = ?self.encoding,
            "built inverted index"
        );
        Ok(InvertedIndex { postings, methods: self.methods.clone(), num_docs })
    }
}
