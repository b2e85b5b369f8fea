// sidenote CLI entry point.

use clap::Parser;

mod client;
mod commands;
mod exit_code;
mod output;

#[derive(Parser)]
#[command(name = "sidenote", about = "Notes with automatic saving, naming and AI continuation")]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match commands::run(cli.command) {
        Ok(()) => exit_code::ExitCode::Success.into(),
        Err(error) => exit_code::ExitCode::from_error(&error).into(),
    }
}
