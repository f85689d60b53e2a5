//! **pomscan** - Fast CLI for discovering Maven projects and generating editor workspace files
//!
//! Walks a directory tree for `pom.xml` descriptors, resolves each project's
//! dependency classpath through `mvn -N dependency:build-classpath` under a
//! bounded worker pool, and assembles workspace documents with deterministic
//! folder ordering. One broken build never aborts the scan.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core scanning pipeline - descriptor parsing, classpath resolution, aggregation
pub mod core {
    /// pom.xml descriptor parsing, coordinate naming, nearest-pom lookup
    pub mod pom;
    pub use pom::{Pom, PomError, find_nearest_pom};

    /// Bounded-concurrency classpath resolution via the mvn subprocess
    pub mod classpath;
    pub use classpath::{ClasspathResolver, MvnInvoker, MvnOptions, MvnTool};

    /// Scan orchestration: walk, name, resolve, assemble
    pub mod aggregate;
    pub use aggregate::{Options, aggregate, run as import_run};

    /// Workspace document model and emission
    pub mod workspace;
    pub use workspace::{Folder, WorkspaceDocument, WorkspacePlan};
}

/// Infrastructure - configuration, walking, and path utilities (lean architecture)
pub mod infra {
    /// Configuration management with TOML support
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Descriptor-discovery directory walking with early pruning
    pub mod walk;
    pub use walk::PomWalker;

    /// Path helpers for user-supplied inputs
    pub mod utils;
    // Keep utils private - not part of the public API
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use self::core::{Pom, PomError, WorkspaceDocument, WorkspacePlan, import_run};
pub use infra::{Config, PomWalker, load_config};
