use warcseq_message::MessageReader;

use crate::cmd::{Context, DumpArgs};
use crate::exit::{io_error, message_error, CliResult, SUCCESS};
use crate::output::MessagePrinter;

pub fn run(args: DumpArgs, ctx: &Context) -> CliResult<i32> {
    let source = args
        .input
        .open()
        .map_err(|err| io_error(&format!("open {} failed", args.input), err))?;
    let mut reader = MessageReader::with_config(source, ctx.message_config());
    let mut printer = MessagePrinter::new(std::io::stdout().lock(), ctx.format);

    let mut failure = None;
    while args.count.is_none_or(|count| printer.printed() < count) {
        match reader.read_message() {
            Ok(Some(message)) => printer
                .print(&message)
                .map_err(|err| io_error("write failed", err))?,
            Ok(None) => break,
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    // Messages decoded before a failure are still shown.
    printer
        .finish()
        .map_err(|err| io_error("write failed", err))?;

    if let Some(err) = failure {
        return Err(message_error(
            &format!("decode failed after {} messages", reader.messages_read()),
            err,
        ));
    }

    tracing::debug!(messages = reader.messages_read(), "dump complete");
    Ok(SUCCESS)
}
