use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("e2eprims {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: e2eprims");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("E2EPRIMS_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("E2EPRIMS_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("checksum: CRC-16/XMODEM (poly 0x1021, init 0x0000)");
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
