use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "pomscan")]
#[command(
    about = "A fast CLI for discovering Maven projects and generating editor workspace files with aggregated classpaths"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress output and non-essential messages
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory tree for pom.xml files and generate workspace file(s)
    Import(ImportArgs),

    /// Print the nearest directory at or above a path that contains a pom.xml
    Locate(LocateArgs),

    /// Initialize a pomscan.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser)]
pub struct ImportArgs {
    /// Root directory to scan for pom.xml descriptors
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Use full group ids in project names instead of per-segment initials
    #[arg(long)]
    pub long_names: bool,

    /// Emit one workspace file per discovered pom.xml instead of a merged one
    #[arg(long)]
    pub per_project: bool,

    /// Maximum concurrent mvn invocations
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Additional glob patterns to prune from the walk
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Merged workspace output path (default: <root>/<root-name>.<ext>)
    #[arg(short, long, conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Print the merged workspace document to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Maven executable to invoke
    #[arg(long)]
    pub mvn: Option<String>,

    /// Per-invocation timeout in seconds (0 disables)
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Parser)]
pub struct LocateArgs {
    /// File or directory to resolve to its nearest enclosing Maven project
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
