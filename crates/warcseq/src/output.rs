use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use warcseq_message::{Message, RecordSummary};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Rows per table block. Long streams print one table per block instead of
/// holding every row until the end.
const TABLE_ROWS: usize = 64;

/// Prints decoded messages. Table rows are written in blocks of
/// [`TABLE_ROWS`]; the last partial block is written by [`finish`].
///
/// [`finish`]: MessagePrinter::finish
pub struct MessagePrinter<W: Write> {
    out: W,
    format: OutputFormat,
    table: Table,
    pending: usize,
    printed: u64,
}

impl<W: Write> MessagePrinter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            table: message_table(),
            pending: 0,
            printed: 0,
        }
    }

    pub fn print(&mut self, message: &Message) -> io::Result<()> {
        let index = self.printed;
        self.printed += 1;
        match self.format {
            OutputFormat::Json => {
                let line = serde_json::to_string(message).map_err(io::Error::other)?;
                writeln!(self.out, "{line}")
            }
            OutputFormat::Table => {
                self.table.add_row(vec![
                    index.to_string(),
                    message.tag().to_string(),
                    describe(message),
                ]);
                self.pending += 1;
                if self.pending == TABLE_ROWS {
                    self.write_table()?;
                }
                Ok(())
            }
            OutputFormat::Pretty => {
                let details = describe(message);
                if details.is_empty() {
                    writeln!(self.out, "#{index} {}", message.tag())
                } else {
                    writeln!(self.out, "#{index} {} {details}", message.tag())
                }
            }
        }
    }

    pub fn printed(&self) -> u64 {
        self.printed
    }

    /// Write pending rows and flush. Call once after the last message.
    pub fn finish(mut self) -> io::Result<W> {
        self.write_table()?;
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_table(&mut self) -> io::Result<()> {
        if self.pending == 0 {
            return Ok(());
        }
        let table = std::mem::replace(&mut self.table, message_table());
        self.pending = 0;
        writeln!(self.out, "{table}")?;
        self.out.flush()
    }
}

fn message_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "TAG", "DETAILS"]);
    table
}

/// One-line human description of a message, without its tag.
pub fn describe(message: &Message) -> String {
    match message {
        Message::Metadata(metadata) => {
            format!("file={} position={}", metadata.file, metadata.position)
        }
        Message::Header(header) => {
            let mut out = format!("version={} fields={}", header.version, header.fields.len());
            if let Some(kind) = header.field("WARC-Type") {
                out.push_str(&format!(" type={kind}"));
            }
            out
        }
        Message::BlockChunk(chunk) => format!("bytes={}", chunk.data.len()),
        Message::BlockEnd(end) => {
            let mut parts = Vec::new();
            if let Some(value) = end.crc32 {
                parts.push(format!("crc32={value}"));
            }
            if let Some(value) = end.crc32c {
                parts.push(format!("crc32c={value}"));
            }
            if let Some(value) = end.xxh3 {
                parts.push(format!("xxh3={value}"));
            }
            if parts.is_empty() {
                "no checksums".to_string()
            } else {
                parts.join(" ")
            }
        }
        Message::EndOfFile => String::new(),
    }
}

#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    pub protocol: u8,
    pub messages: u64,
    pub records: u64,
    pub chunks: u64,
    pub block_bytes: u64,
    pub end_of_file: bool,
}

impl CheckReport {
    pub fn add_record(&mut self, record: &RecordSummary) {
        self.records += 1;
        self.chunks += record.chunk_count;
        self.block_bytes += record.block_len;
    }
}

pub fn print_report<W: Write>(
    mut out: W,
    report: &CheckReport,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let line = serde_json::to_string(report).map_err(io::Error::other)?;
            writeln!(out, "{line}")?;
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["protocol".to_string(), report.protocol.to_string()])
                .add_row(vec!["messages".to_string(), report.messages.to_string()])
                .add_row(vec!["records".to_string(), report.records.to_string()])
                .add_row(vec!["chunks".to_string(), report.chunks.to_string()])
                .add_row(vec!["block_bytes".to_string(), report.block_bytes.to_string()])
                .add_row(vec!["end_of_file".to_string(), report.end_of_file.to_string()]);
            writeln!(out, "{table}")?;
        }
        OutputFormat::Pretty => {
            writeln!(
                out,
                "ok: protocol={} messages={} records={} chunks={} block_bytes={} end_of_file={}",
                report.protocol,
                report.messages,
                report.records,
                report.chunks,
                report.block_bytes,
                report.end_of_file
            )?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use warcseq_message::BlockEnd;

    use super::*;

    fn render(format: OutputFormat, messages: &[Message]) -> String {
        let mut printer = MessagePrinter::new(Vec::new(), format);
        for message in messages {
            printer.print(message).unwrap();
        }
        String::from_utf8(printer.finish().unwrap()).unwrap()
    }

    #[test]
    fn json_lines_use_structured_form() {
        let out = render(
            OutputFormat::Json,
            &[
                Message::block_chunk(b"Hello world!".to_vec()),
                Message::EndOfFile,
            ],
        );
        assert_eq!(
            out,
            "{\"BlockChunk\":{\"data\":\"SGVsbG8gd29ybGQh\"}}\n{\"EndOfFile\":{}}\n"
        );
    }

    #[test]
    fn pretty_lines_are_indexed() {
        let out = render(
            OutputFormat::Pretty,
            &[
                Message::header("WARC/1.1", [("WARC-Type", "resource")]),
                Message::block_end(BlockEnd::crc32c(2073618257)),
                Message::EndOfFile,
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "#0 Header version=WARC/1.1 fields=1 type=resource");
        assert_eq!(lines[1], "#1 BlockEnd crc32c=2073618257");
        assert_eq!(lines[2], "#2 EndOfFile");
    }

    #[test]
    fn table_is_written_on_finish() {
        let out = render(OutputFormat::Table, &[Message::metadata("a.warc", 7)]);
        assert!(out.contains("TAG"));
        assert!(out.contains("Metadata"));
        assert!(out.contains("file=a.warc position=7"));

        assert!(render(OutputFormat::Table, &[]).is_empty());
    }

    #[test]
    fn table_rows_are_written_in_blocks() {
        let mut printer = MessagePrinter::new(Vec::new(), OutputFormat::Table);
        for _ in 0..TABLE_ROWS - 1 {
            printer.print(&Message::EndOfFile).unwrap();
        }
        assert!(printer.out.is_empty());

        printer.print(&Message::EndOfFile).unwrap();
        let first_block = printer.out.len();
        assert!(first_block > 0);
        assert!(String::from_utf8_lossy(&printer.out).contains(&format!("{}", TABLE_ROWS - 1)));

        printer.print(&Message::metadata("tail.warc", 1)).unwrap();
        assert_eq!(printer.out.len(), first_block);

        let out = String::from_utf8(printer.finish().unwrap()).unwrap();
        assert_eq!(out.matches("TAG").count(), 2);
        assert!(out[first_block..].contains("tail.warc"));
    }

    #[test]
    fn describe_block_end_without_checksums() {
        assert_eq!(
            describe(&Message::block_end(BlockEnd::default())),
            "no checksums"
        );
    }

    #[test]
    fn report_json_is_single_line() {
        let report = CheckReport {
            protocol: 2,
            messages: 4,
            records: 1,
            chunks: 2,
            block_bytes: 12,
            end_of_file: true,
        };
        let mut out = Vec::new();
        print_report(&mut out, &report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["records"], 1);
        assert_eq!(value["block_bytes"], 12);
        assert_eq!(value["end_of_file"], true);
    }
}
