//! Elias gamma code.
//!
//! A value `v >= 1` with `l = floor(log2 v)` is written as `l` zero bits, a
//! one bit, then the low `l` bits of `v`, most significant first. Codes are
//! concatenated and the final byte is padded with zero bits; the returned bit
//! length marks where the meaningful bits end.

use bit_vec::BitVec;

use crate::error::{Error, Result};

/// Encode `values` into a packed buffer. Returns the bytes and the number of meaningful bits.
pub fn encode(values: &[u32]) -> Result<(Vec<u8>, u64)> {
    let mut bits = BitVec::new();
    for &v in values {
        push_code(&mut bits, v)?;
    }
    let bit_len = bits.len() as u64;
    Ok((bits.to_bytes(), bit_len))
}

fn push_code(bits: &mut BitVec, value: u32) -> Result<()> {
    if value == 0 {
        return Err(Error::ZeroValue);
    }
    let l = 31 - value.leading_zeros();
    for _ in 0..l {
        bits.push(false);
    }
    bits.push(true);
    for i in (0..l).rev() {
        bits.push((value >> i) & 1 == 1);
    }
    Ok(())
}

/// Decode the first `bit_len` bits of `bytes`. Padding past `bit_len` is never read.
pub fn decode(bytes: &[u8], bit_len: u64) -> Result<Vec<u32>> {
    if bit_len == 0 {
        return Ok(Vec::new());
    }
    let available = bytes.len() as u64 * 8;
    if bit_len > available {
        return Err(Error::corrupt(format!(
            "bit length {bit_len} exceeds buffer of {available} bits"
        )));
    }

    let bits = BitVec::from_bytes(bytes);
    let end = bit_len as usize;
    let mut pos = 0usize;
    let mut out = Vec::new();
    while pos < end {
        // unary length prefix
        let mut l = 0u32;
        loop {
            if pos >= end {
                return Err(Error::corrupt("unterminated length prefix"));
            }
            let bit = bits[pos];
            pos += 1;
            if bit {
                break;
            }
            l += 1;
        }
        if l > 31 {
            return Err(Error::corrupt(format!("length prefix {l} too long for u32")));
        }
        if pos + l as usize > end {
            return Err(Error::corrupt("truncated mantissa"));
        }
        let mut value = 1u32;
        for _ in 0..l {
            value = (value << 1) | bits[pos] as u32;
            pos += 1;
        }
        out.push(value);
    }
    Ok(out)
}
