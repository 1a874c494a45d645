use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("radiolink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: radiolink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("RADIOLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "header_version: {} (header {} bytes, message record {} bytes)",
        radiolink_frame::VERSION,
        radiolink_frame::HEADER_SIZE,
        radiolink_frame::MESSAGE_SIZE
    );
    println!(
        "features: station={}, async={}, cli=true",
        cfg!(feature = "station"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}
