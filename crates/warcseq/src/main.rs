mod cmd;
mod exit;
mod input;
mod logging;
mod output;

use clap::Parser;
use warcseq_message::{ProtocolVersion, StreamFormat};

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "warcseq",
    version,
    about = "Inspect and produce record-separated WARC event streams"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        env = "WARCSEQ_LOG_FORMAT",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "warn",
        env = "WARCSEQ_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    /// Protocol version of the message set (1 or 2).
    #[arg(
        long,
        value_name = "VERSION",
        default_value_t = ProtocolVersion::LATEST,
        env = "WARCSEQ_PROTOCOL",
        global = true
    )]
    protocol: ProtocolVersion,

    /// Message stream format: json-seq, jsonl or cbor-seq.
    #[arg(
        long,
        value_name = "FORMAT",
        default_value_t = StreamFormat::JsonSeq,
        env = "WARCSEQ_STREAM_FORMAT",
        global = true
    )]
    stream_format: StreamFormat,

    /// Largest accepted frame, in bytes.
    #[arg(long, value_name = "BYTES", global = true)]
    max_frame_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit::USAGE
            } else {
                exit::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.log_format, cli.log_level);

    let ctx = Context {
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        protocol: cli.protocol,
        stream_format: cli.stream_format,
        max_frame_size: cli.max_frame_size,
    };
    tracing::debug!(
        protocol = %ctx.protocol,
        stream_format = %ctx.stream_format,
        format = ?ctx.format,
        "starting"
    );

    match cmd::run(cli.command, &ctx) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
