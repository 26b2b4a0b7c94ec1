mod platform;

use std::process::ExitCode;

use clap::Parser;

fn main() -> anyhow::Result<ExitCode> {
    let args = platform::args::Args::parse();
    platform::run_app(args)
}
