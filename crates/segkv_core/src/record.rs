//! Record codec.
//!
//! A record is one key-value pair as laid out on disk. Records are
//! self-delimiting: the length of the whole record is recoverable from the
//! leading length field, so segments need no external framing.
//!
//! ## Record Format
//!
//! ```text
//! | total_len (4) | key_len (4) | key (N) | value_len (4) | value (M) |
//! ```
//!
//! All length fields are u32 little-endian. `total_len` counts the entire
//! record including the three length fields: `total_len = 12 + N + M`.

use crate::error::{StoreError, StoreResult};
use std::io::{self, Read};

/// A single key-value record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The key, stored as UTF-8 bytes.
    pub key: String,
    /// The value, stored as UTF-8 bytes.
    pub value: String,
}

impl Record {
    /// Combined size of the three length fields.
    const LENGTH_FIELDS: usize = 12;

    /// Creates a new record.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encodes the record to bytes.
    ///
    /// Encoding is a pure function of the key and value and is injective
    /// over distinct pairs.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let key = self.key.as_bytes();
        let value = self.value.as_bytes();
        let total_len = Self::LENGTH_FIELDS + key.len() + value.len();

        let mut buf = Vec::with_capacity(total_len);
        buf.extend_from_slice(&(total_len as u32).to_le_bytes());
        buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        buf.extend_from_slice(value);
        buf
    }

    /// Returns the encoded size of this record in bytes.
    #[must_use]
    pub fn encoded_size(&self) -> u64 {
        (Self::LENGTH_FIELDS + self.key.len() + self.value.len()) as u64
    }

    /// Reads one record from a stream positioned at a record boundary.
    ///
    /// Returns `Ok(Some((record, n)))` where `n` is exactly the number of
    /// bytes consumed, or `Ok(None)` at a clean end of stream (zero bytes
    /// available). A partially-present record, length fields that do not
    /// reconcile, or non-UTF-8 key/value bytes produce
    /// [`StoreError::CorruptRecord`].
    pub fn read_from<R: Read>(reader: &mut R) -> StoreResult<Option<(Self, u64)>> {
        let mut len_buf = [0u8; 4];
        if read_length_header(reader, &mut len_buf)?.is_none() {
            return Ok(None);
        }

        let total_len = u32::from_le_bytes(len_buf) as usize;
        if total_len < Self::LENGTH_FIELDS {
            return Err(StoreError::corrupt_record(format!(
                "record length {total_len} is shorter than the {} byte header",
                Self::LENGTH_FIELDS
            )));
        }

        let mut rest = vec![0u8; total_len - 4];
        reader.read_exact(&mut rest).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => StoreError::corrupt_record(format!(
                "record truncated: expected {} bytes after the length field",
                total_len - 4
            )),
            _ => StoreError::Io(err),
        })?;

        let key_len = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        if Self::LENGTH_FIELDS + key_len > total_len {
            return Err(StoreError::corrupt_record(format!(
                "key length {key_len} exceeds record length {total_len}"
            )));
        }

        let vl = 4 + key_len;
        let value_len =
            u32::from_le_bytes([rest[vl], rest[vl + 1], rest[vl + 2], rest[vl + 3]]) as usize;
        if Self::LENGTH_FIELDS + key_len + value_len != total_len {
            return Err(StoreError::corrupt_record(format!(
                "length fields do not reconcile: total {total_len}, key {key_len}, value {value_len}"
            )));
        }

        let key = std::str::from_utf8(&rest[4..4 + key_len])
            .map_err(|_| StoreError::corrupt_record("key is not valid UTF-8"))?
            .to_string();
        let value = std::str::from_utf8(&rest[vl + 4..])
            .map_err(|_| StoreError::corrupt_record("value is not valid UTF-8"))?
            .to_string();

        Ok(Some((Self { key, value }, total_len as u64)))
    }
}

/// Fills the 4-byte length header, distinguishing a clean end of stream
/// (`None`) from a truncated header (corrupt).
fn read_length_header<R: Read>(reader: &mut R, buf: &mut [u8; 4]) -> StoreResult<Option<()>> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    match filled {
        0 => Ok(None),
        4 => Ok(Some(())),
        n => Err(StoreError::corrupt_record(format!(
            "truncated length header: {n} of 4 bytes"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn record_roundtrip() {
        let record = Record::new("key1", "value1");
        let encoded = record.encode();
        assert_eq!(encoded.len() as u64, record.encoded_size());

        let mut cursor = Cursor::new(encoded);
        let (decoded, n) = Record::read_from(&mut cursor).unwrap().unwrap();
        assert_eq!(decoded, record);
        assert_eq!(n, record.encoded_size());
    }

    #[test]
    fn empty_key_and_value_roundtrip() {
        let record = Record::new("", "");
        let mut cursor = Cursor::new(record.encode());
        let (decoded, n) = Record::read_from(&mut cursor).unwrap().unwrap();
        assert_eq!(decoded, record);
        assert_eq!(n, 12);
    }

    #[test]
    fn consecutive_records_consume_exact_bytes() {
        let records = [
            Record::new("a", "1"),
            Record::new("bb", "22"),
            Record::new("ccc", "333"),
        ];
        let mut stream = Vec::new();
        for record in &records {
            stream.extend_from_slice(&record.encode());
        }

        let mut cursor = Cursor::new(stream);
        for record in &records {
            let (decoded, n) = Record::read_from(&mut cursor).unwrap().unwrap();
            assert_eq!(&decoded, record);
            assert_eq!(n, record.encoded_size());
        }
        assert!(Record::read_from(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn clean_end_of_stream() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(Record::read_from(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn truncated_header_is_corrupt() {
        let mut cursor = Cursor::new(vec![0x10, 0x00]);
        let result = Record::read_from(&mut cursor);
        assert!(matches!(result, Err(StoreError::CorruptRecord { .. })));
    }

    #[test]
    fn truncated_body_is_corrupt() {
        let mut encoded = Record::new("key", "value").encode();
        encoded.truncate(encoded.len() - 3);

        let mut cursor = Cursor::new(encoded);
        let result = Record::read_from(&mut cursor);
        assert!(matches!(result, Err(StoreError::CorruptRecord { .. })));
    }

    #[test]
    fn undersized_total_length_is_corrupt() {
        let mut cursor = Cursor::new(4u32.to_le_bytes().to_vec());
        let result = Record::read_from(&mut cursor);
        assert!(matches!(result, Err(StoreError::CorruptRecord { .. })));
    }

    #[test]
    fn unreconciled_lengths_are_corrupt() {
        let mut encoded = Record::new("key", "value").encode();
        // Inflate the key length so the fields no longer add up.
        encoded[4] = 0xFF;

        let mut cursor = Cursor::new(encoded);
        let result = Record::read_from(&mut cursor);
        assert!(matches!(result, Err(StoreError::CorruptRecord { .. })));
    }

    #[test]
    fn non_utf8_value_is_corrupt() {
        let mut encoded = Record::new("key", "val").encode();
        let value_start = encoded.len() - 3;
        encoded[value_start] = 0xFF;

        let mut cursor = Cursor::new(encoded);
        let result = Record::read_from(&mut cursor);
        assert!(matches!(result, Err(StoreError::CorruptRecord { .. })));
    }

    #[test]
    fn distinct_pairs_encode_distinctly() {
        // The split between key and value must be unambiguous.
        let a = Record::new("ab", "c");
        let b = Record::new("a", "bc");
        assert_ne!(a.encode(), b.encode());
    }
}
