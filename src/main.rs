mod cli;
mod mapping;
mod rewriter;
mod scanner;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Re-export Command from cli module
use cli::Command;

/// Debian packaging helper for Java projects
///
/// Rewrites .properties files so bundled JAR references point at
/// system-installed paths, then prints the packages and classpath
/// entries the rewritten tree depends on.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output JSON (default output is the plain shell-usable lines)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr only; stdout carries the shell-usable output lines.
    let filter = EnvFilter::try_new(&args.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    cli::handle_command(args.command, args.json)
}
