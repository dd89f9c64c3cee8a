use clap::Parser;
use tradebot::cli::{run, Cli};
use tradebot::logging::init_logging;

fn main() -> std::process::ExitCode {
    init_logging();
    run(Cli::parse())
}
