//! Variable-byte posting-list codec.
//!
//! Values are stored as deltas between consecutive elements (the first delta
//! is relative to 0) so encoded magnitudes stay small. Each delta is written
//! as base-`B` digits, most significant first; the final digit of a delta has
//! `B` added to it, marking the end of that value.

use crate::error::{IndexError, Result};
use crate::ordered::OrderedSet;

/// Default coding base. Digits fit a byte for any base up to 128.
pub const DEFAULT_BASE: u32 = 128;

/// Rejects bases the byte-oriented coding cannot represent.
pub fn validate_base(base: u32) -> Result<()> {
    if !(2..=128).contains(&base) {
        return Err(IndexError::InvalidBase(base));
    }
    Ok(())
}

fn encode_delta(value: u64, base: u32, out: &mut Vec<u8>) -> Result<()> {
    if value == 0 {
        return Err(IndexError::NonPositiveValue);
    }
    let start = out.len();
    let mut remaining = value;
    while remaining > 0 {
        out.push((remaining % base as u64) as u8);
        remaining /= base as u64;
    }
    out[start..].reverse();
    // Terminator: the last digit of every delta carries the base as a marker.
    let last = out.len() - 1;
    out[last] += base as u8;
    Ok(())
}

/// Decodes a full byte buffer back into the absolute values it encodes.
pub fn decode_sequence(bytes: &[u8], base: u32) -> Result<Vec<u64>> {
    validate_base(base)?;
    let mut values = Vec::new();
    let mut accumulator: u64 = 0;
    let mut in_value = false;
    let mut last_value: u64 = 0;
    for &byte in bytes {
        let digit = byte as u32;
        if digit >= base * 2 {
            return Err(IndexError::CorruptPostingBytes { byte, base });
        }
        if digit >= base {
            let delta = accumulator * base as u64 + (digit - base) as u64;
            last_value += delta;
            values.push(last_value);
            accumulator = 0;
            in_value = false;
        } else {
            accumulator = accumulator * base as u64 + digit as u64;
            in_value = true;
        }
    }
    if in_value {
        return Err(IndexError::UnterminatedValue);
    }
    Ok(values)
}

/// Append-only compressed sequence of strictly increasing positive integers.
///
/// Holds document ids for the traditional index and global token positions
/// for the positional one. Append order encodes the monotonicity invariant
/// directly into the byte stream, so out-of-order appends fail loudly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingList {
    bytes: Vec<u8>,
    last_element: u64,
    base: u32,
}

impl PostingList {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            last_element: 0,
            base: DEFAULT_BASE,
        }
    }

    pub fn with_base(base: u32) -> Result<Self> {
        validate_base(base)?;
        Ok(Self {
            bytes: Vec::new(),
            last_element: 0,
            base,
        })
    }

    /// Rehydrates a list stored at the default base, re-deriving the last
    /// element by decoding. Fails on corrupt bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_base(bytes, DEFAULT_BASE)
    }

    pub fn from_bytes_with_base(bytes: Vec<u8>, base: u32) -> Result<Self> {
        let decoded = decode_sequence(&bytes, base)?;
        let last_element = decoded.last().copied().unwrap_or(0);
        Ok(Self {
            bytes,
            last_element,
            base,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encoded_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn last_element(&self) -> u64 {
        self.last_element
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Appends `value`, which must be strictly greater than the last element.
    pub fn append(&mut self, value: u64) -> Result<()> {
        if value <= self.last_element {
            return Err(IndexError::NonMonotonicAppend {
                last: self.last_element,
                value,
            });
        }
        encode_delta(value - self.last_element, self.base, &mut self.bytes)?;
        self.last_element = value;
        Ok(())
    }

    /// Like [`append`](Self::append), but silently skips a value equal to the
    /// last element. The builders use this to suppress duplicate entries for
    /// the same document or token.
    pub fn append_guarded(&mut self, value: u64) -> Result<()> {
        if value == self.last_element && !self.is_empty() {
            return Ok(());
        }
        self.append(value)
    }

    /// Decodes the full list into an [`OrderedSet`], validating the
    /// strictly-increasing invariant along the way.
    pub fn decode(&self) -> Result<OrderedSet> {
        OrderedSet::new(decode_sequence(&self.bytes, self.base)?)
    }
}

impl Default for PostingList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(values: &[u64], base: u32) {
        let mut list = PostingList::with_base(base).unwrap();
        for &v in values {
            list.append(v).unwrap();
        }
        let decoded = list.decode().unwrap();
        assert_eq!(decoded.items(), values);
    }

    #[test]
    fn roundtrip_at_base_128() {
        roundtrip(&[1, 2, 3, 130, 5000, 1_000_000, 1_000_001], 128);
    }

    #[test]
    fn roundtrip_at_base_16() {
        roundtrip(&[5, 9, 17, 255, 4096, 70_000], 16);
    }

    #[test]
    fn roundtrip_at_base_2() {
        roundtrip(&[1, 3, 4, 19], 2);
    }

    #[test]
    fn append_rejects_non_monotonic_values() {
        let mut list = PostingList::new();
        list.append(5).unwrap();
        assert!(matches!(
            list.append(5),
            Err(IndexError::NonMonotonicAppend { last: 5, value: 5 })
        ));
        assert!(list.append(3).is_err());
        list.append(9).unwrap();
        assert_eq!(list.decode().unwrap().items(), &[5, 9]);
    }

    #[test]
    fn guarded_append_skips_repeated_value() {
        let mut list = PostingList::new();
        list.append_guarded(7).unwrap();
        list.append_guarded(7).unwrap();
        list.append_guarded(8).unwrap();
        assert!(list.append_guarded(3).is_err());
        assert_eq!(list.decode().unwrap().items(), &[7, 8]);
    }

    #[test]
    fn from_bytes_restores_last_element() {
        let mut list = PostingList::new();
        list.append(12).unwrap();
        list.append(90).unwrap();
        let restored = PostingList::from_bytes(list.as_bytes().to_vec()).unwrap();
        assert_eq!(restored.last_element(), 90);
        assert_eq!(restored.decode().unwrap().items(), &[12, 90]);
    }

    #[test]
    fn decode_rejects_out_of_range_byte() {
        // Base 16 allows bytes up to 31; 40 is neither digit nor terminator.
        let err = decode_sequence(&[40], 16).unwrap_err();
        assert!(matches!(
            err,
            IndexError::CorruptPostingBytes { byte: 40, base: 16 }
        ));
    }

    #[test]
    fn decode_rejects_unterminated_value() {
        // A bare digit without the terminator marker never closes its delta.
        assert!(matches!(
            decode_sequence(&[3], 16),
            Err(IndexError::UnterminatedValue)
        ));
    }

    #[test]
    fn decode_of_empty_buffer_is_empty() {
        assert!(decode_sequence(&[], 128).unwrap().is_empty());
    }

    #[test]
    fn invalid_bases_are_rejected() {
        assert!(PostingList::with_base(1).is_err());
        assert!(PostingList::with_base(129).is_err());
        assert!(PostingList::with_base(2).is_ok());
    }

    #[test]
    fn zero_cannot_be_encoded() {
        let mut list = PostingList::new();
        assert!(list.append(0).is_err());
    }
}
