//! Producer and consumer on the two ends of a socket pair.
//!
//! The producer splits a WARC record body into small chunks and writes the
//! record as a message sequence; the consumer decodes it back and checks
//! the ordering.
//!
//! Run with:
//!   cargo run -p warcseq --example record-pipe

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::os::unix::net::UnixStream;
    use std::thread;

    use warcseq::message::SequenceValidator;
    use warcseq::{decode, BlockEnd, Message, MessageWriter};

    let (producer, consumer) = UnixStream::pair()?;

    let handle = thread::spawn(move || -> Result<u64, warcseq::MessageError> {
        let body = b"Hello world!";
        let mut writer = MessageWriter::new(producer);
        writer.write_message(&Message::metadata("example.warc.gz", 0))?;
        writer.write_message(&Message::header(
            "WARC/1.1",
            [
                ("WARC-Type", "resource"),
                ("Content-Length", "12"),
            ],
        ))?;
        for chunk in body.chunks(5) {
            writer.write_message(&Message::block_chunk(chunk.to_vec()))?;
        }
        writer.write_message(&Message::block_end(BlockEnd::crc32c(2073618257)))?;
        writer.write_message(&Message::EndOfFile)?;
        Ok(writer.messages_written())
    });

    let mut validator = SequenceValidator::new();
    for message in decode(consumer) {
        let message = message?;
        eprintln!("received {}", message.tag());
        if let Some(record) = validator.observe(&message)? {
            eprintln!(
                "record {} complete: {} chunks, {} bytes, crc32c={:?}",
                record.version, record.chunk_count, record.block_len, record.checksums.crc32c
            );
        }
    }
    validator.finish()?;

    let written = handle.join().map_err(|_| "producer panicked")??;
    eprintln!("{written} messages written, {} accepted", validator.messages());
    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("record-pipe requires a unix platform");
}
