//! Token -> posting list storage with a plain and a codec-backed backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::codec::{EncodedPostings, Encoding};
use crate::error::{Error, Result};
use crate::DocId;

/// Sorted, duplicate-free document ordinals.
pub type PostingList = Vec<DocId>;

/// Lookup/update contract shared by both backends. Ordinals are zero-based on both sides.
pub trait PostingStore {
    /// Unknown tokens yield an empty list.
    fn get(&self, token: &str) -> Result<PostingList>;
    fn set(&mut self, token: &str, postings: PostingList) -> Result<()>;
    fn tokens(&self) -> Box<dyn Iterator<Item = &str> + '_>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize(mut postings: PostingList) -> PostingList {
    postings.sort_unstable();
    postings.dedup();
    postings
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlainStore {
    lists: BTreeMap<String, PostingList>,
}

impl PostingStore for PlainStore {
    fn get(&self, token: &str) -> Result<PostingList> {
        Ok(self.lists.get(token).cloned().unwrap_or_default())
    }

    fn set(&mut self, token: &str, postings: PostingList) -> Result<()> {
        self.lists.insert(token.to_string(), normalize(postings));
        Ok(())
    }

    fn tokens(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.lists.keys().map(String::as_str))
    }

    fn len(&self) -> usize {
        self.lists.len()
    }
}

/// Stores every list through `encoding`, shifted by +1 so ordinal 0 is encodable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedStore {
    encoding: Encoding,
    lists: BTreeMap<String, EncodedPostings>,
}

impl EncodedStore {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding, lists: BTreeMap::new() }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Total size of the packed bit buffers.
    pub fn payload_bytes(&self) -> usize {
        self.lists.values().map(EncodedPostings::byte_len).sum()
    }
}

impl PostingStore for EncodedStore {
    fn get(&self, token: &str) -> Result<PostingList> {
        let Some(encoded) = self.lists.get(token) else {
            return Ok(Vec::new());
        };
        let mut values = self.encoding.decode(encoded)?;
        for v in values.iter_mut() {
            // the encoder never produces 0, so this only trips on foreign data
            *v = v.checked_sub(1).ok_or_else(|| Error::corrupt("stored ordinal 0"))?;
        }
        Ok(values)
    }

    fn set(&mut self, token: &str, postings: PostingList) -> Result<()> {
        let shifted = normalize(postings)
            .into_iter()
            .map(|d| d.checked_add(1).ok_or(Error::OrdinalOverflow(d)))
            .collect::<Result<Vec<_>>>()?;
        let encoded = self.encoding.encode(&shifted)?;
        self.lists.insert(token.to_string(), encoded);
        Ok(())
    }

    fn tokens(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.lists.keys().map(String::as_str))
    }

    fn len(&self) -> usize {
        self.lists.len()
    }
}

/// Backend chosen once, when the index is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PostingBackend {
    Plain(PlainStore),
    Encoded(EncodedStore),
}

impl PostingBackend {
    pub fn new(encoding: Option<Encoding>) -> Self {
        match encoding {
            Some(e) => PostingBackend::Encoded(EncodedStore::new(e)),
            None => PostingBackend::Plain(PlainStore::default()),
        }
    }

    pub fn encoding(&self) -> Option<Encoding> {
        match self {
            PostingBackend::Plain(_) => None,
            PostingBackend::Encoded(s) => Some(s.encoding()),
        }
    }

    /// Bytes held by posting data: 4 per ordinal for plain lists, packed size otherwise.
    pub fn payload_bytes(&self) -> usize {
        match self {
            PostingBackend::Plain(s) => {
                s.lists.values().map(|l| l.len() * std::mem::size_of::<DocId>()).sum()
            }
            PostingBackend::Encoded(s) => s.payload_bytes(),
        }
    }

    /// Serialize the whole store, including which codec it uses.
    pub fn export(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn import(blob: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(blob)?)
    }
}

impl PostingStore for PostingBackend {
    fn get(&self, token: &str) -> Result<PostingList> {
        match self {
            PostingBackend::Plain(s) => s.get(token),
            PostingBackend::Encoded(s) => s.get(token),
        }
    }

    fn set(&mut self, token: &str, postings: PostingList) -> Result<()> {
        match self {
            PostingBackend::Plain(s) => s.set(token, postings),
            PostingBackend::Encoded(s) => s.set(token, postings),
        }
    }

    fn tokens(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            PostingBackend::Plain(s) => s.tokens(),
            PostingBackend::Encoded(s) => s.tokens(),
        }
    }

    fn len(&self) -> usize {
        match self {
            PostingBackend::Plain(s) => s.len(),
            PostingBackend::Encoded(s) => s.len(),
        }
    }
}
