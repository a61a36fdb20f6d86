//! Ordering rules for a stream of record events.
//!
//! ```text
//! stream := record* EndOfFile?
//! record := Metadata* Header BlockChunk* BlockEnd
//! ```
//!
//! Checksums are carried through to the summary but never computed or
//! compared here.

use crate::model::{BlockEnd, Message, MessageTag, Metadata};

/// Errors reported by [`SequenceValidator`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("expected {expected}, found {found}")]
    UnexpectedMessage {
        expected: &'static str,
        found: MessageTag,
    },

    #[error("{0} after EndOfFile")]
    AfterEndOfFile(MessageTag),

    #[error("stream ended inside a record ({chunks} chunks received)")]
    UnterminatedRecord { chunks: u64 },
}

/// A record whose BlockEnd has been observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    /// Metadata announced for this record, if any.
    pub metadata: Option<Metadata>,
    pub version: String,
    pub field_count: usize,
    pub chunk_count: u64,
    pub block_len: u64,
    pub checksums: BlockEnd,
}

#[derive(Debug)]
enum State {
    ExpectHeader { metadata: Option<Metadata> },
    Block(RecordSummary),
    Finished,
}

/// Tracks where a message stream is within the record grammar.
#[derive(Debug)]
pub struct SequenceValidator {
    state: State,
    messages: u64,
    records: u64,
}

impl SequenceValidator {
    pub fn new() -> Self {
        Self {
            state: State::ExpectHeader { metadata: None },
            messages: 0,
            records: 0,
        }
    }

    /// Feed the next message. Returns a summary when it closes a record.
    ///
    /// A rejected message leaves the validator in the state it was in.
    pub fn observe(&mut self, message: &Message) -> Result<Option<RecordSummary>, SequenceError> {
        let state = std::mem::replace(&mut self.state, State::Finished);

        let (next, result) = match (state, message) {
            (State::Finished, other) => (
                State::Finished,
                Err(SequenceError::AfterEndOfFile(other.tag())),
            ),

            (State::ExpectHeader { .. }, Message::Metadata(metadata)) => (
                State::ExpectHeader {
                    metadata: Some(metadata.clone()),
                },
                Ok(None),
            ),
            (State::ExpectHeader { metadata }, Message::Header(header)) => (
                State::Block(RecordSummary {
                    metadata,
                    version: header.version.clone(),
                    field_count: header.fields.len(),
                    chunk_count: 0,
                    block_len: 0,
                    checksums: BlockEnd::default(),
                }),
                Ok(None),
            ),
            (State::ExpectHeader { metadata: None }, Message::EndOfFile) => {
                (State::Finished, Ok(None))
            }
            (state @ State::ExpectHeader { .. }, other) => (
                state,
                Err(SequenceError::UnexpectedMessage {
                    expected: "Header",
                    found: other.tag(),
                }),
            ),

            (State::Block(mut record), Message::BlockChunk(chunk)) => {
                record.chunk_count += 1;
                record.block_len += chunk.data.len() as u64;
                (State::Block(record), Ok(None))
            }
            (State::Block(mut record), Message::BlockEnd(end)) => {
                record.checksums = *end;
                self.records += 1;
                tracing::debug!(
                    records = self.records,
                    chunks = record.chunk_count,
                    block_len = record.block_len,
                    "record complete"
                );
                (State::ExpectHeader { metadata: None }, Ok(Some(record)))
            }
            (state @ State::Block(_), other) => (
                state,
                Err(SequenceError::UnexpectedMessage {
                    expected: "BlockChunk or BlockEnd",
                    found: other.tag(),
                }),
            ),
        };

        self.state = next;
        if result.is_ok() {
            self.messages += 1;
        }
        result
    }

    /// Check that the stream did not stop inside a record.
    pub fn finish(&self) -> Result<(), SequenceError> {
        match &self.state {
            State::Block(record) => Err(SequenceError::UnterminatedRecord {
                chunks: record.chunk_count,
            }),
            State::ExpectHeader {
                metadata: Some(_), ..
            } => Err(SequenceError::UnterminatedRecord { chunks: 0 }),
            _ => Ok(()),
        }
    }

    /// Messages accepted so far.
    pub fn messages(&self) -> u64 {
        self.messages
    }

    /// Records closed so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// True once EndOfFile has been observed.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }
}

impl Default for SequenceValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(body: &[&[u8]], end: BlockEnd) -> Vec<Message> {
        let mut messages = vec![Message::header(
            "WARC/1.1",
            [("WARC-Record-Type", "resource"), ("Content-Length", "12")],
        )];
        messages.extend(body.iter().map(|chunk| Message::block_chunk(chunk.to_vec())));
        messages.push(Message::block_end(end));
        messages
    }

    #[test]
    fn accepts_well_formed_stream() {
        let mut messages = vec![Message::metadata("a.warc", 0)];
        messages.extend(record(&[b"Hello ", b"world!"], BlockEnd::crc32c(2073618257)));
        messages.extend(record(&[], BlockEnd::default()));
        messages.push(Message::EndOfFile);

        let mut validator = SequenceValidator::new();
        let mut summaries = Vec::new();
        for message in &messages {
            if let Some(summary) = validator.observe(message).unwrap() {
                summaries.push(summary);
            }
        }

        validator.finish().unwrap();
        assert!(validator.is_finished());
        assert_eq!(validator.records(), 2);
        assert_eq!(validator.messages(), messages.len() as u64);

        assert_eq!(summaries[0].metadata, Some(Metadata::new("a.warc", 0)));
        assert_eq!(summaries[0].version, "WARC/1.1");
        assert_eq!(summaries[0].field_count, 2);
        assert_eq!(summaries[0].chunk_count, 2);
        assert_eq!(summaries[0].block_len, 12);
        assert_eq!(summaries[0].checksums, BlockEnd::crc32c(2073618257));

        assert_eq!(summaries[1].metadata, None);
        assert_eq!(summaries[1].chunk_count, 0);
    }

    #[test]
    fn stream_without_end_of_file_is_fine() {
        let mut validator = SequenceValidator::new();
        for message in record(&[b"x"], BlockEnd::crc32c(1)) {
            validator.observe(&message).unwrap();
        }
        validator.finish().unwrap();
        assert!(!validator.is_finished());
    }

    #[test]
    fn chunk_before_header_is_rejected() {
        let mut validator = SequenceValidator::new();
        let err = validator
            .observe(&Message::block_chunk(b"x".to_vec()))
            .unwrap_err();
        assert_eq!(
            err,
            SequenceError::UnexpectedMessage {
                expected: "Header",
                found: MessageTag::BlockChunk
            }
        );
        assert_eq!(validator.messages(), 0);

        // State is unchanged, so a header is still accepted.
        validator
            .observe(&Message::header("WARC/1.1", [("a", "b")]))
            .unwrap();
    }

    #[test]
    fn header_inside_block_is_rejected() {
        let mut validator = SequenceValidator::new();
        validator
            .observe(&Message::header("WARC/1.1", Vec::<(String, String)>::new()))
            .unwrap();
        let err = validator
            .observe(&Message::header("WARC/1.1", Vec::<(String, String)>::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            SequenceError::UnexpectedMessage {
                found: MessageTag::Header,
                ..
            }
        ));
        assert_eq!(
            validator.finish(),
            Err(SequenceError::UnterminatedRecord { chunks: 0 })
        );
    }

    #[test]
    fn nothing_after_end_of_file() {
        let mut validator = SequenceValidator::new();
        validator.observe(&Message::EndOfFile).unwrap();
        let err = validator
            .observe(&Message::metadata("a.warc", 0))
            .unwrap_err();
        assert_eq!(err, SequenceError::AfterEndOfFile(MessageTag::Metadata));
    }

    #[test]
    fn end_of_file_after_metadata_is_rejected() {
        let mut validator = SequenceValidator::new();
        validator.observe(&Message::metadata("a.warc", 0)).unwrap();
        let err = validator.observe(&Message::EndOfFile).unwrap_err();
        assert!(matches!(
            err,
            SequenceError::UnexpectedMessage {
                found: MessageTag::EndOfFile,
                ..
            }
        ));
        assert!(validator.finish().is_err());
    }

    #[test]
    fn unterminated_record_reports_chunks() {
        let mut validator = SequenceValidator::new();
        let messages = record(&[b"a", b"b", b"c"], BlockEnd::default());
        for message in &messages[..messages.len() - 1] {
            validator.observe(message).unwrap();
        }
        assert_eq!(
            validator.finish(),
            Err(SequenceError::UnterminatedRecord { chunks: 3 })
        );
    }
}
