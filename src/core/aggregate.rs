//! Scan orchestration: walk -> name -> resolve -> assemble -> publish.
//!
//! The controlling thread does everything except classpath resolution,
//! which fans out on the bounded pool in `classpath::resolve_all`. Per
//! project failures (unparseable descriptor, broken build) degrade that
//! project only; a bad scan root fails the whole operation.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::warn;

use crate::cli::{AppContext, ImportArgs};
use crate::core::classpath::{ClasspathResolver, MvnInvoker, MvnOptions, MvnTool};
use crate::core::pom::Pom;
use crate::core::workspace::{
    Folder, WorkspaceDocument, WorkspacePlan, publish, workspace_file_name,
};
use crate::infra::config::Config;
use crate::infra::utils::resolve_user_path;
use crate::infra::walk::{POM_FILE, PomWalker};

/// Scan options, resolved once from config + CLI flags and passed
/// explicitly everywhere. There is no process-wide settings state.
#[derive(Debug, Clone)]
pub struct Options {
    pub long_names: bool,
    pub per_project: bool,
    pub jobs: usize,
    pub build_output_dir: String,
    pub ignore_patterns: Vec<String>,
    pub workspace_ext: String,
    pub classpath_key: String,
    pub exclude_build_output: bool,
    pub mvn: MvnOptions,
}

impl Options {
    /// Merge config file values with CLI flags; flags win.
    pub fn from_config(config: &Config, args: &ImportArgs) -> Self {
        let timeout_secs = args.timeout.unwrap_or(config.mvn.timeout_secs);

        Self {
            long_names: args.long_names || config.long_project_names,
            per_project: args.per_project || config.project_per_pom,
            jobs: args.jobs.unwrap_or(config.jobs).max(1),
            build_output_dir: config.build_output_dir.clone(),
            ignore_patterns: config
                .ignore_patterns
                .iter()
                .chain(args.ignore.iter())
                .cloned()
                .collect(),
            workspace_ext: config.workspace_ext.clone(),
            classpath_key: config.classpath_key.clone(),
            exclude_build_output: config.exclude_build_output,
            mvn: MvnOptions {
                command: args.mvn.clone().or_else(|| config.mvn.command.clone()),
                settings_file: config.mvn.settings_file.clone(),
                m2_home: config.mvn.m2_home.clone(),
                timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            },
        }
    }
}

/// A discovered project that survived descriptor parsing.
#[derive(Debug)]
struct Project {
    dir: Utf8PathBuf,
    name: String,
}

/// Walk the tree, name every project, resolve classpaths under the
/// concurrency cap, and assemble the workspace plan.
pub fn aggregate<T: MvnInvoker>(
    root: &Utf8Path,
    opts: &Options,
    resolver: &ClasspathResolver<T>,
    each_done: impl Fn(&Utf8Path) + Sync,
) -> Result<WorkspacePlan> {
    let walker = PomWalker::new(&opts.build_output_dir, &opts.ignore_patterns)?;
    let dirs = walker.walk(root.as_std_path())?;

    // Name every candidate. Descriptors that fail to parse (or that lack a
    // resolvable coordinate) drop their project here, with a warning.
    let mut projects = Vec::new();
    for dir in dirs {
        let Ok(dir) = Utf8PathBuf::from_path_buf(dir) else {
            warn!("skipping non-unicode project path under {root}");
            continue;
        };
        let pom_path = dir.join(POM_FILE);
        match Pom::parse(pom_path.as_std_path()).and_then(|pom| pom.project_name(opts.long_names))
        {
            Ok(name) => projects.push(Project { dir, name }),
            Err(err) => warn!("skipping project: {err}"),
        }
    }

    // Name order drives folder order; resolution order never shows through.
    projects.sort_by(|a, b| a.name.cmp(&b.name));

    let dirs: Vec<Utf8PathBuf> = projects.iter().map(|p| p.dir.clone()).collect();
    let mut resolved = resolver.resolve_all(&dirs, opts.jobs, each_done)?;

    if opts.per_project {
        let documents = projects
            .iter()
            .map(|project| {
                let own = resolved.remove(&project.dir).unwrap_or_default();
                let classpath =
                    with_synthesized(synthesized_entries(&project.dir, &opts.build_output_dir), own);
                let target = project
                    .dir
                    .join(workspace_file_name(&project.dir, &opts.workspace_ext));
                let document = WorkspaceDocument::new(
                    vec![folder_for(project, opts)],
                    &opts.classpath_key,
                    classpath,
                );
                (target, document)
            })
            .collect();

        Ok(WorkspacePlan::PerProject(documents))
    } else {
        let mut merged: BTreeSet<Utf8PathBuf> = BTreeSet::new();
        for project in &projects {
            merged.extend(synthesized_entries(&project.dir, &opts.build_output_dir));
        }
        for entries in resolved.into_values() {
            merged.extend(entries);
        }

        let folders = projects.iter().map(|p| folder_for(p, opts)).collect();
        let document = WorkspaceDocument::new(
            folders,
            &opts.classpath_key,
            merged.into_iter().collect(),
        );
        let target = root.join(workspace_file_name(root, &opts.workspace_ext));

        Ok(WorkspacePlan::Merged { document, target })
    }
}

/// Every project contributes its (possibly not yet built) output
/// directories. These skip the existence filter applied to tool-resolved
/// entries.
fn synthesized_entries(dir: &Utf8Path, build_output_dir: &str) -> Vec<Utf8PathBuf> {
    let out = dir.join(build_output_dir);
    vec![out.join("classes"), out.join("test-classes")]
}

/// Synthesized entries first, then resolved ones, set-deduplicated.
fn with_synthesized(
    synthesized: Vec<Utf8PathBuf>,
    resolved: BTreeSet<Utf8PathBuf>,
) -> Vec<Utf8PathBuf> {
    let mut list = synthesized;
    for entry in resolved {
        if !list.contains(&entry) {
            list.push(entry);
        }
    }
    list
}

enum Paint {
    Yellow,
    Green,
}

/// Colorize `text` unless --no-color is in effect.
fn paint(ctx: &AppContext, text: &str, color: Paint) -> String {
    if ctx.no_color {
        return text.to_string();
    }
    match color {
        Paint::Yellow => text.yellow().to_string(),
        Paint::Green => text.green().to_string(),
    }
}

fn folder_for(project: &Project, opts: &Options) -> Folder {
    Folder {
        path: project.dir.clone(),
        name: project.name.clone(),
        folder_exclude_patterns: opts
            .exclude_build_output
            .then(|| vec![opts.build_output_dir.clone()]),
    }
}

/// CLI entry for `pomscan import`.
pub fn run(args: ImportArgs, ctx: &AppContext) -> Result<()> {
    let config = crate::infra::config::load_config().unwrap_or_default();
    let opts = Options::from_config(&config, &args);

    let root = resolve_user_path(&args.path);
    if !root.is_dir() {
        anyhow::bail!("scan root {} is not a directory", root.display());
    }
    let root = Utf8PathBuf::from_path_buf(root)
        .map_err(|p| anyhow::anyhow!("scan root {} is not valid unicode", p.display()))?;

    if opts.per_project && (args.stdout || args.output.is_some()) {
        anyhow::bail!("--stdout and --output apply to merged mode only");
    }

    if ctx.dry_run {
        if !ctx.quiet {
            println!("{}", paint(ctx, "DRY RUN: Would scan:", Paint::Yellow));
            println!("  Root: {root}");
            println!(
                "  Mode: {}",
                if opts.per_project {
                    "one workspace per pom"
                } else {
                    "single merged workspace"
                }
            );
            println!(
                "  Names: {}",
                if opts.long_names { "long" } else { "short" }
            );
            println!("  Jobs: {}", opts.jobs);
            println!("  Build output dir: {}", opts.build_output_dir);
        }
        return Ok(());
    }

    let resolver = ClasspathResolver::new(MvnTool::new(opts.mvn.clone()));

    let progress = if ctx.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner} {msg}").expect("valid template"));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message("Scanning for poms...");
        pb
    };

    let plan = aggregate(&root, &opts, &resolver, |dir| {
        progress.set_message(format!("resolved {dir}"));
    })?;
    progress.finish_and_clear();

    // --output redirects the merged document
    let plan = match (plan, &args.output) {
        (WorkspacePlan::Merged { document, .. }, Some(out)) => {
            let target = Utf8PathBuf::from_path_buf(resolve_user_path(out))
                .map_err(|p| anyhow::anyhow!("output path {} is not valid unicode", p.display()))?;
            WorkspacePlan::Merged { document, target }
        }
        (plan, _) => plan,
    };

    publish(&plan, args.stdout, ctx.quiet)?;

    // The summary would trail the JSON document on stdout; skip it there
    if !ctx.quiet && !args.stdout {
        match &plan {
            WorkspacePlan::Merged { document, .. } => {
                let entries: usize = document.settings.values().map(|v| v.len()).sum();
                println!(
                    "{} {} project(s), {} classpath entries",
                    paint(ctx, "Imported", Paint::Green),
                    document.folders.len(),
                    entries
                );
            }
            WorkspacePlan::PerProject(documents) => {
                println!(
                    "{} {} project(s), one workspace each",
                    paint(ctx, "Imported", Paint::Green),
                    documents.len()
                );
            }
        }
    }

    Ok(())
}
