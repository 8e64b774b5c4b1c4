pub mod cli;
pub mod jq_exec;

use colored::Colorize;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(verbose: bool) {
    let default = if verbose { "polydsl=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn main() {
    let command_line_interface = cli::CommandLineInterface::load();
    init_logging(command_line_interface.verbose());
    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
