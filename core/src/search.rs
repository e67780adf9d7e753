use serde::Serialize;

use crate::error::Result;
use crate::index::{DocId, InvertedIndex};
use crate::matcher::{contains_phrase, HorspoolMatcher, Matcher};
use crate::postings::PostingList;
use crate::preprocess::{tokens, TextProcessor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub text: String,
}

/// Answers phrase queries over one index.
///
/// The engine owns the processor the index was built with, so queries and
/// documents always go through the same pipeline. It holds no mutable state
/// and can be shared between threads.
pub struct SearchEngine {
    index: InvertedIndex,
    documents: Vec<String>,
    processor: Box<dyn TextProcessor>,
    matcher: Box<dyn Matcher>,
}

impl SearchEngine {
    pub fn new(index: InvertedIndex, documents: Vec<String>, processor: impl TextProcessor + 'static) -> Self {
        Self {
            index,
            documents,
            processor: Box::new(processor),
            matcher: Box::new(HorspoolMatcher),
        }
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Documents containing every token of an already processed query.
    pub fn candidates(&self, processed_query: &str) -> Result<PostingList> {
        let mut terms: Vec<&str> = tokens(processed_query).collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        terms.sort_unstable();
        terms.dedup();
        let lists = terms
            .iter()
            .map(|t| self.index.postings(t))
            .collect::<Result<Vec<_>>>()?;
        Ok(intersect(lists))
    }

    /// Matching documents ordered by ordinal.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let processed = self.processor.process(query);
        let candidates = self.candidates(&processed)?;
        tracing::debug!(query, candidates = candidates.len(), "intersected postings");

        let mut hits = Vec::new();
        for doc_id in candidates {
            let Some(raw) = self.documents.get(doc_id as usize) else {
                tracing::warn!(doc_id, num_docs = self.documents.len(), "posting points past the corpus");
                continue;
            };
            let doc = self.processor.process(raw);
            if contains_phrase(self.matcher.as_ref(), &doc, &processed) {
                hits.push(SearchHit { doc_id, text: raw.clone() });
            }
        }
        Ok(hits)
    }

    pub fn search_indices(&self, query: &str) -> Result<Vec<DocId>> {
        Ok(self.search(query)?.into_iter().map(|h| h.doc_id).collect())
    }

    pub fn search_documents(&self, query: &str) -> Result<Vec<String>> {
        Ok(self.search(query)?.into_iter().map(|h| h.text).collect())
    }
}

/// Intersection of sorted posting lists. No lists, or any empty list, gives an empty result.
pub fn intersect(mut lists: Vec<PostingList>) -> PostingList {
    if lists.is_empty() {
        return Vec::new();
    }
    lists.sort_by_key(Vec::len);
    let mut iter = lists.into_iter();
    let mut acc = iter.next().unwrap_or_default();
    for list in iter {
        if acc.is_empty() {
            break;
        }
        acc = intersect_pair(&acc, &list);
    }
    acc
}

fn intersect_pair(a: &[DocId], b: &[DocId]) -> PostingList {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
