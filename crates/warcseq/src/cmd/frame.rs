use std::io::BufRead;

use bytes::Bytes;
use warcseq_message::{decode_segment, MessageWriter};

use crate::cmd::{Context, FrameArgs};
use crate::exit::{io_error, message_error, CliResult, SUCCESS};

pub fn run(args: FrameArgs, ctx: &Context) -> CliResult<i32> {
    let source = args
        .input
        .open_buffered()
        .map_err(|err| io_error(&format!("open {} failed", args.input), err))?;
    let mut writer = MessageWriter::with_config(std::io::stdout().lock(), ctx.message_config());

    for (index, line) in source.lines().enumerate() {
        let line = line.map_err(|err| io_error(&format!("read {} failed", args.input), err))?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let context = format!("line {}", index + 1);
        let message = decode_segment(Bytes::copy_from_slice(text.as_bytes()), ctx.protocol)
            .map_err(|err| message_error(&context, err.into()))?;
        writer
            .write_message(&message)
            .map_err(|err| message_error(&context, err))?;
    }

    writer
        .flush()
        .map_err(|err| message_error("flush failed", err))?;
    tracing::debug!(messages = writer.messages_written(), "frame complete");
    Ok(SUCCESS)
}
