use warcseq_message::{MessageTag, ProtocolVersion};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("warcseq {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: warcseq");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("protocol_latest: {}", ProtocolVersion::LATEST);
    for version in [ProtocolVersion::V1, ProtocolVersion::V2] {
        let tags: Vec<&str> = version.tags().iter().map(|tag| tag.as_str()).collect();
        println!("protocol_v{}: {}", version.number(), tags.join(","));
    }
    println!("block_end_fields: {}", ProtocolVersion::LATEST.block_end_fields().join(","));
    println!("message_tags: {}", MessageTag::ALL.len());
    println!(
        "target: {}",
        option_env!("WARCSEQ_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("WARCSEQ_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
