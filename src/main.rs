//! sso-bridge binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match sso_bridge::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
