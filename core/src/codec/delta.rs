//! Gap coding on top of [`gamma`](super::gamma).
//!
//! The input is sorted, the first value is kept outside the bitstream and the
//! gaps between neighbours are gamma coded. A zero `first` marks a stream that
//! holds at most one value and is plain gamma.

use super::gamma;
use crate::error::{Error, Result};

/// Returns `(bytes, bit_len, first)`.
pub fn encode(values: &[u32]) -> Result<(Vec<u8>, u64, u32)> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    match sorted.as_slice() {
        [] => Ok((Vec::new(), 0, 0)),
        [single] => {
            let (bytes, bit_len) = gamma::encode(&[*single])?;
            Ok((bytes, bit_len, 0))
        }
        [first, ..] => {
            if *first == 0 {
                return Err(Error::ZeroValue);
            }
            let mut gaps = Vec::with_capacity(sorted.len() - 1);
            for w in sorted.windows(2) {
                if w[0] == w[1] {
                    return Err(Error::DuplicateValue(w[0]));
                }
                gaps.push(w[1] - w[0]);
            }
            let (bytes, bit_len) = gamma::encode(&gaps)?;
            Ok((bytes, bit_len, *first))
        }
    }
}

pub fn decode(bytes: &[u8], bit_len: u64, first: u32) -> Result<Vec<u32>> {
    let gaps = gamma::decode(bytes, bit_len)?;
    if first == 0 {
        if gaps.len() > 1 {
            return Err(Error::corrupt("gap stream without a first value"));
        }
        return Ok(gaps);
    }

    let mut out = Vec::with_capacity(gaps.len() + 1);
    let mut acc = first;
    out.push(acc);
    for gap in gaps {
        acc = acc
            .checked_add(gap)
            .ok_or_else(|| Error::corrupt("prefix sum overflows u32"))?;
        out.push(acc);
    }
    Ok(out)
}
