use anyhow::Result;
use clap::Parser;
use pomscan::cli::{AppContext, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Warnings (skipped descriptors, failed classpath lookups) go to stderr
    // so emitted JSON on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Import(args) => pomscan::core::aggregate::run(args, &ctx),
        Commands::Locate(args) => pomscan::core::pom::locate_run(args),
        Commands::Init(args) => pomscan::infra::config::init(args, &ctx),
        Commands::Completions(args) => pomscan::completion::run(args),
    }
}
