//! Wire codec for posting lists and chunk header strings.
//!
//! Postings are written as `(doc_id_delta, position)` varint pairs with no
//! count prefix; the stream simply ends at the last pair. The position field
//! is context dependent: when the doc-id delta is zero the value is the
//! absolute position (same document, positions strictly ascending), otherwise
//! it is the wrapping difference from the previous posting's position. The
//! wrapping arithmetic lets a new document start at a lower position than the
//! previous document ended at without widening the field.

use std::io::Read;

use crate::error::{QuillError, Result};
use crate::index::{DocumentId, TermPosition, TermTracker};
use crate::util::varint;

/// Append a length-prefixed string to the buffer.
pub fn write_string(buffer: &mut Vec<u8>, text: &str) {
    varint::write_u64(buffer, text.len() as u64);
    buffer.extend_from_slice(text.as_bytes());
}

/// Read one length-prefixed string from the reader.
pub fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let length = varint::read_one(reader)?
        .ok_or_else(|| QuillError::other("missing string length in chunk header"))?;
    if length == 0 {
        return Ok(String::new());
    }

    let mut bytes = vec![0u8; length as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| QuillError::other("chunk header string is not utf-8"))
}

/// Append a delta-compressed posting stream to the buffer.
///
/// The iterator must yield postings in ascending `(doc_id, position)` order.
pub fn write_postings<'a>(buffer: &mut Vec<u8>, postings: impl Iterator<Item = &'a TermTracker>) {
    let mut last_doc_id: DocumentId = 0;
    let mut last_position: TermPosition = 0;

    for posting in postings {
        let doc_id_delta = posting.doc_id - last_doc_id;
        let position_field = if doc_id_delta == 0 {
            posting.position
        } else {
            posting.position.wrapping_sub(last_position)
        };

        varint::write_u64(buffer, doc_id_delta);
        varint::write_u64(buffer, position_field);

        last_doc_id = posting.doc_id;
        last_position = posting.position;
    }
}

/// Streaming decoder for a delta-compressed posting list.
///
/// Yields postings in the order they were written. The first read error turns
/// into `Some(Err(..))` and the iterator is fused afterwards; a posting with
/// a doc-id delta but no position field is reported as corruption rather than
/// silently dropped.
pub struct PostingsReader<R> {
    reader: R,
    doc_id: DocumentId,
    position: TermPosition,
    failed: bool,
}

impl<R: Read> PostingsReader<R> {
    /// Start decoding postings from `reader`, which must be positioned at the
    /// first pair.
    pub fn new(reader: R) -> Self {
        PostingsReader {
            reader,
            doc_id: 0,
            position: 0,
            failed: false,
        }
    }

    fn next_posting(&mut self) -> Result<Option<TermTracker>> {
        let doc_id_delta = match varint::read_one(&mut self.reader)? {
            Some(delta) => delta,
            None => return Ok(None),
        };
        let position_field = varint::read_one(&mut self.reader)?
            .ok_or_else(|| QuillError::other("posting stream truncated after doc-id delta"))?;

        self.doc_id = self.doc_id.wrapping_add(doc_id_delta);
        if doc_id_delta == 0 {
            self.position = position_field;
        } else {
            self.position = self.position.wrapping_add(position_field);
        }

        Ok(Some(TermTracker::new(self.doc_id, self.position)))
    }
}

impl<R: Read> Iterator for PostingsReader<R> {
    type Item = Result<TermTracker>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_posting() {
            Ok(Some(posting)) => Some(Ok(posting)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn round_trip(postings: &[TermTracker]) -> Vec<TermTracker> {
        let mut buffer = Vec::new();
        write_postings(&mut buffer, postings.iter());
        PostingsReader::new(Cursor::new(buffer))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_string_round_trip() {
        let mut buffer = Vec::new();
        write_string(&mut buffer, "term-hello");
        write_string(&mut buffer, "");
        write_string(&mut buffer, "next");

        let mut cursor = Cursor::new(buffer);
        assert_eq!(read_string(&mut cursor).unwrap(), "term-hello");
        assert_eq!(read_string(&mut cursor).unwrap(), "");
        assert_eq!(read_string(&mut cursor).unwrap(), "next");
    }

    #[test]
    fn test_empty_posting_list() {
        assert!(round_trip(&[]).is_empty());
    }

    #[test]
    fn test_same_document_positions_round_trip() {
        let postings = vec![
            TermTracker::new(1, 0),
            TermTracker::new(1, 3),
            TermTracker::new(1, 250),
        ];
        assert_eq!(round_trip(&postings), postings);
    }

    #[test]
    fn test_new_document_with_lower_position() {
        // Document 2 starts at a position below where document 1 ended; the
        // wrapping delta must reproduce it exactly.
        let postings = vec![
            TermTracker::new(1, 900),
            TermTracker::new(2, 4),
            TermTracker::new(2, 7),
            TermTracker::new(5, 0),
        ];
        assert_eq!(round_trip(&postings), postings);
    }

    #[test]
    fn test_large_gaps_round_trip() {
        let postings = vec![
            TermTracker::new(7, 1 << 40),
            TermTracker::new(1 << 50, 2),
            TermTracker::new((1 << 50) + 1, u64::MAX),
        ];
        assert_eq!(round_trip(&postings), postings);
    }

    #[test]
    fn test_single_byte_deltas_for_dense_lists() {
        // Consecutive documents with small positions compress to two bytes
        // per posting.
        let postings: Vec<_> = (1..=100).map(|doc| TermTracker::new(doc, 0)).collect();
        let mut buffer = Vec::new();
        write_postings(&mut buffer, postings.iter());
        assert_eq!(buffer.len(), 200);
    }

    #[test]
    fn test_truncated_pair_is_reported() {
        let mut buffer = Vec::new();
        write_postings(&mut buffer, [TermTracker::new(3, 5)].iter());
        buffer.pop();

        let results: Vec<_> = PostingsReader::new(Cursor::new(buffer)).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn test_reader_fuses_after_error() {
        // Doc-id delta present, position missing entirely.
        let buffer = varint::encode_u64(4);
        let mut reader = PostingsReader::new(Cursor::new(buffer));
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }
}
