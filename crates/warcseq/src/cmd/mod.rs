use clap::{Args, Subcommand};
use warcseq_message::{MessageConfig, ProtocolVersion, StreamFormat};

use crate::exit::CliResult;
use crate::input::Input;
use crate::output::OutputFormat;

pub mod check;
pub mod dump;
pub mod frame;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a message stream and print each message.
    Dump(DumpArgs),
    /// Decode a message stream and verify record ordering.
    Check(CheckArgs),
    /// Write newline-delimited structured JSON to stdout as a message stream.
    Frame(FrameArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Options shared by every stream command.
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    pub protocol: ProtocolVersion,
    pub stream_format: StreamFormat,
    pub max_frame_size: Option<usize>,
}

impl Context {
    pub fn message_config(&self) -> MessageConfig {
        let mut config = MessageConfig {
            version: self.protocol,
            format: self.stream_format,
            ..MessageConfig::default()
        };
        if let Some(max) = self.max_frame_size {
            config.frame.max_frame_size = max;
        }
        config
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Dump(args) => dump::run(args, ctx),
        Command::Check(args) => check::run(args, ctx),
        Command::Frame(args) => frame::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Input path, or `-` for stdin.
    #[arg(default_value = "-")]
    pub input: Input,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input path, or `-` for stdin.
    #[arg(default_value = "-")]
    pub input: Input,
    /// Fail unless the stream ends with EndOfFile.
    #[arg(long)]
    pub require_eof: bool,
}

#[derive(Args, Debug)]
pub struct FrameArgs {
    /// Input path with one structured message per line, or `-` for stdin.
    #[arg(default_value = "-")]
    pub input: Input,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
