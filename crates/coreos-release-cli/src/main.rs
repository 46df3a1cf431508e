#![forbid(unsafe_code)]

//! Binary entrypoint for the `coreos-release` CLI.

use std::process;

fn main() {
    let exit_code = coreos_release_cli::run();
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
