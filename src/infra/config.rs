use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Extra glob patterns pruned from the walk (hidden and build-output
    /// directories are always pruned)
    pub ignore_patterns: Vec<String>,

    /// Directory name produced by the build tool; pruned from walks and used
    /// for the synthesized classes/test-classes classpath entries
    pub build_output_dir: String,

    /// Use full group ids in project names instead of per-segment initials
    pub long_project_names: bool,

    /// Emit one workspace file per discovered pom.xml
    pub project_per_pom: bool,

    /// Maximum concurrent mvn invocations
    pub jobs: usize,

    /// File extension for emitted workspace documents
    pub workspace_ext: String,

    /// Settings key carrying the classpath list in emitted documents
    pub classpath_key: String,

    /// Attach folder_exclude_patterns hiding the build output dir to each folder
    pub exclude_build_output: bool,

    /// Maven invocation settings
    pub mvn: MvnSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MvnSection
{
    /// Maven executable (default: mvn, mvn.cmd on Windows)
    pub command: Option<String>,

    /// Alternate user settings file, passed via -s
    pub settings_file: Option<PathBuf>,

    /// Maven installation directory; <m2_home>/bin/<command> is invoked when set
    pub m2_home: Option<PathBuf>,

    /// Per-invocation timeout in seconds (0 disables)
    pub timeout_secs: u64,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            ignore_patterns: Vec::new(),
            build_output_dir: "target".to_string(),
            long_project_names: false,
            project_per_pom: false,
            jobs: 4,
            workspace_ext: "sublime-project".to_string(),
            classpath_key: "java_classpath".to_string(),
            exclude_build_output: false,
            mvn: MvnSection::default(),
        }
    }
}

impl Default for MvnSection
{
    fn default() -> Self
    {
        Self { command: None, settings_file: None, m2_home: None, timeout_secs: 60 }
    }
}

pub fn load_config() -> Result<Config>
{
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    let config_paths = ["pomscan.toml", ".pomscan.toml"];

    for path in &config_paths
    {
        if Path::new(path).exists()
        {
            builder = builder.add_source(config::File::with_name(path));
            break;
        }
    }

    // Add environment variables with POMSCAN_ prefix
    builder = builder.add_source(config::Environment::with_prefix("POMSCAN").separator("_"));

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("pomscan.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
