//! Universal integer codes for posting lists.

pub mod delta;
pub mod gamma;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Codec used by the encoded posting backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Gamma,
    Delta,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Gamma => "gamma",
            Encoding::Delta => "delta",
        }
    }

    pub fn encode(&self, values: &[u32]) -> Result<EncodedPostings> {
        match self {
            Encoding::Gamma => {
                let (bits, bit_len) = gamma::encode(values)?;
                Ok(EncodedPostings { bits, bit_len, first: 0 })
            }
            Encoding::Delta => {
                let (bits, bit_len, first) = delta::encode(values)?;
                Ok(EncodedPostings { bits, bit_len, first })
            }
        }
    }

    /// Always allocates a fresh output vector.
    pub fn decode(&self, encoded: &EncodedPostings) -> Result<Vec<u32>> {
        match self {
            Encoding::Gamma => gamma::decode(&encoded.bits, encoded.bit_len),
            Encoding::Delta => delta::decode(&encoded.bits, encoded.bit_len, encoded.first),
        }
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gamma" | "eliasgamma" => Ok(Encoding::Gamma),
            "delta" | "eliasdelta" => Ok(Encoding::Delta),
            _ => Err(Error::UnknownEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A posting list as stored by the encoded backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPostings {
    pub bits: Vec<u8>,
    /// Meaningful bits in `bits`; the rest of the last byte is padding.
    pub bit_len: u64,
    /// First value of a delta stream, 0 otherwise.
    pub first: u32,
}

impl EncodedPostings {
    pub fn byte_len(&self) -> usize {
        self.bits.len()
    }
}
