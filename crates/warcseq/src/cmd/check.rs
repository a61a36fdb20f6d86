use warcseq_message::{MessageReader, SequenceValidator};

use crate::cmd::{CheckArgs, Context};
use crate::exit::{
    io_error, message_error, sequence_error, CliError, CliResult, DATA_INVALID, SUCCESS,
};
use crate::output::{print_report, CheckReport};

pub fn run(args: CheckArgs, ctx: &Context) -> CliResult<i32> {
    let source = args
        .input
        .open()
        .map_err(|err| io_error(&format!("open {} failed", args.input), err))?;
    let reader = MessageReader::with_config(source, ctx.message_config());

    let mut validator = SequenceValidator::new();
    let mut report = CheckReport {
        protocol: ctx.protocol.number(),
        ..CheckReport::default()
    };

    for message in reader {
        let message = message.map_err(|err| {
            message_error(
                &format!("decode failed at message {}", validator.messages() + 1),
                err,
            )
        })?;
        let closed = validator.observe(&message).map_err(|err| {
            sequence_error(
                &format!("out of order at message {}", validator.messages() + 1),
                err,
            )
        })?;
        if let Some(record) = closed {
            tracing::debug!(
                records = validator.records(),
                version = %record.version,
                block_len = record.block_len,
                "record ok"
            );
            report.add_record(&record);
        }
    }

    validator
        .finish()
        .map_err(|err| sequence_error("incomplete stream", err))?;
    if args.require_eof && !validator.is_finished() {
        return Err(CliError::new(DATA_INVALID, "incomplete stream: missing EndOfFile"));
    }

    report.messages = validator.messages();
    report.end_of_file = validator.is_finished();
    print_report(std::io::stdout().lock(), &report, ctx.format)
        .map_err(|err| io_error("write failed", err))?;

    Ok(SUCCESS)
}
