//! Classpath resolution through `mvn -N dependency:build-classpath`.
//!
//! One subprocess per project directory, fanned out on a dedicated worker
//! pool so at most `jobs` invocations are ever in flight. Resolution never
//! fails the scan: any failure (tool missing, non-zero exit, timeout, no
//! classpath line) degrades that project to an empty set with a warning.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, warn};

/// Build-tool log lines start with a bracketed uppercase tag, e.g. `[INFO] `.
/// The first stdout line that does NOT match is the classpath string.
fn log_line_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[[A-Z]+\] ").expect("valid regex"))
}

/// Separator between classpath entries printed by the build tool.
fn path_list_separator() -> char {
    if cfg!(windows) { ';' } else { ':' }
}

/// Maven invocation settings, resolved once from config + CLI.
#[derive(Debug, Clone)]
pub struct MvnOptions {
    /// Explicit executable; overrides both PATH lookup and `m2_home`.
    pub command: Option<String>,

    /// Alternate user settings file, passed via `-s`.
    pub settings_file: Option<PathBuf>,

    /// Maven installation directory; `<m2_home>/bin/mvn` is invoked when set.
    pub m2_home: Option<PathBuf>,

    /// Per-invocation deadline; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for MvnOptions {
    fn default() -> Self {
        Self {
            command: None,
            settings_file: None,
            m2_home: None,
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl MvnOptions {
    fn executable(&self) -> PathBuf {
        if let Some(cmd) = &self.command {
            return PathBuf::from(cmd);
        }
        let name = if cfg!(windows) { "mvn.cmd" } else { "mvn" };
        match &self.m2_home {
            Some(home) => home.join("bin").join(name),
            None => PathBuf::from(name),
        }
    }
}

/// Captured output of one build-tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub status_ok: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Subprocess seam: tests substitute scripted or counting doubles for the
/// real mvn binary.
pub trait MvnInvoker: Sync {
    /// Run the non-recursive classpath goal with `dir` as working directory.
    fn build_classpath(&self, dir: &Utf8Path) -> Result<ToolOutput>;
}

/// The real `mvn` subprocess invoker.
pub struct MvnTool {
    options: MvnOptions,
}

impl MvnTool {
    pub fn new(options: MvnOptions) -> Self {
        Self { options }
    }
}

impl MvnInvoker for MvnTool {
    fn build_classpath(&self, dir: &Utf8Path) -> Result<ToolOutput> {
        let exe = self.options.executable();

        let mut cmd = Command::new(&exe);
        cmd.current_dir(dir);
        if let Some(settings) = &self.options.settings_file {
            cmd.arg("-s").arg(settings);
        }
        // -N: resolve this pom only; nested modules are separate invocations.
        cmd.arg("-N").arg("dependency:build-classpath");
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning {} in {dir}", exe.display()))?;

        // Drain both pipes on their own threads so a chatty build cannot
        // deadlock against a full pipe buffer while we watch the deadline.
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdout_handle = std::thread::spawn(move || read_pipe(stdout_pipe));
        let stderr_handle = std::thread::spawn(move || read_pipe(stderr_pipe));

        let status = match self.options.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit)?,
            None => Some(child.wait().context("waiting for mvn")?),
        };

        let stdout = stdout_handle.join().unwrap_or_default();
        let stderr = stderr_handle.join().unwrap_or_default();

        let Some(status) = status else {
            anyhow::bail!(
                "timed out after {}s",
                self.options.timeout.unwrap_or_default().as_secs()
            );
        };

        Ok(ToolOutput {
            status_ok: status.success(),
            stdout,
            stderr,
        })
    }
}

fn read_pipe<R: Read>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Poll the child until it exits or the deadline passes. On expiry the
/// process is killed and `None` is returned.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait().context("polling mvn")? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Extract classpath entries from captured stdout: the first non-log line
/// is the classpath string; entries are split on the platform path-list
/// separator, trimmed, and existence-filtered. `None` means no classpath
/// line was present at all.
fn parse_classpath_output(stdout: &str) -> Option<BTreeSet<Utf8PathBuf>> {
    let line = stdout
        .lines()
        .find(|line| !log_line_pattern().is_match(line))?;

    let mut entries = BTreeSet::new();
    for segment in line.split(path_list_separator()) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let path = Utf8Path::new(segment);
        // Tool-resolved entries must exist right now; stale repo paths and
        // interpolation leftovers are dropped here.
        if path.is_file() || path.is_dir() {
            entries.insert(path.to_path_buf());
        }
    }
    Some(entries)
}

/// Classpath resolver carrying the partial-failure policy.
pub struct ClasspathResolver<T: MvnInvoker> {
    invoker: T,
}

impl<T: MvnInvoker> ClasspathResolver<T> {
    pub fn new(invoker: T) -> Self {
        Self { invoker }
    }

    /// Resolve one project directory. Infallible by policy: failures are
    /// logged and yield the empty set.
    pub fn resolve(&self, dir: &Utf8Path) -> BTreeSet<Utf8PathBuf> {
        match self.try_resolve(dir) {
            Ok(entries) => {
                debug!("{}: {} classpath entries", dir, entries.len());
                entries
            }
            Err(err) => {
                warn!("no classpath for pom in {dir}: {err:#}");
                BTreeSet::new()
            }
        }
    }

    fn try_resolve(&self, dir: &Utf8Path) -> Result<BTreeSet<Utf8PathBuf>> {
        let output = self.invoker.build_classpath(dir)?;

        if !output.status_ok {
            let detail = output
                .stdout
                .lines()
                .find(|l| l.starts_with("[ERROR]"))
                .or_else(|| output.stderr.lines().next())
                .unwrap_or("no diagnostic output");
            anyhow::bail!("mvn exited with failure: {detail}");
        }

        parse_classpath_output(&output.stdout)
            .ok_or_else(|| anyhow::anyhow!("no classpath line in mvn output"))
    }

    /// Resolve every directory with at most `jobs` invocations in flight.
    /// Runs on a dedicated pool so the global rayon pool's width never
    /// changes how many subprocesses get spawned. `each_done` fires after
    /// every completed resolution (for progress reporting).
    pub fn resolve_all<F>(
        &self,
        dirs: &[Utf8PathBuf],
        jobs: usize,
        each_done: F,
    ) -> Result<BTreeMap<Utf8PathBuf, BTreeSet<Utf8PathBuf>>>
    where
        F: Fn(&Utf8Path) + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .thread_name(|i| format!("classpath-{i}"))
            .build()
            .context("building classpath worker pool")?;

        // Each worker owns its private result set until collection; the
        // merged view only exists after the pool has drained.
        let results: Vec<(Utf8PathBuf, BTreeSet<Utf8PathBuf>)> = pool.install(|| {
            dirs.par_iter()
                .map(|dir| {
                    let entries = self.resolve(dir);
                    each_done(dir);
                    (dir.clone(), entries)
                })
                .collect()
        });

        Ok(results.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tempfile::TempDir;

    use super::*;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("utf8 temp path")
    }

    #[test]
    fn first_non_log_line_is_the_classpath() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("a.jar");
        fs::write(&jar, b"jar").unwrap();

        let stdout = format!(
            "[INFO] Scanning for projects...\n\
             [WARNING] something odd\n\
             [INFO] Dependencies classpath:\n\
             {}\n\
             [INFO] BUILD SUCCESS\n",
            jar.display()
        );

        let entries = parse_classpath_output(&stdout).expect("classpath line");
        assert_eq!(entries.len(), 1);
        assert!(entries.contains(&utf8(&jar)));
    }

    #[test]
    fn log_only_output_means_no_classpath() {
        let stdout = "[INFO] Scanning...\n[ERROR] broken\n";
        assert!(parse_classpath_output(stdout).is_none());
    }

    #[test]
    fn entries_are_split_trimmed_and_existence_filtered() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("dep.jar");
        let dir = tmp.path().join("classes");
        fs::write(&jar, b"jar").unwrap();
        fs::create_dir(&dir).unwrap();

        let sep = path_list_separator();
        let stdout = format!(
            "{} {sep} {}{sep}/definitely/missing/x.jar\n",
            jar.display(),
            dir.display()
        );

        let entries = parse_classpath_output(&stdout).expect("classpath line");
        assert_eq!(entries.len(), 2);
        assert!(entries.contains(&utf8(&jar)));
        assert!(entries.contains(&utf8(&dir)));
    }

    /// Invoker double with scripted output.
    struct Scripted {
        stdout: String,
        ok: bool,
    }

    impl MvnInvoker for Scripted {
        fn build_classpath(&self, _dir: &Utf8Path) -> Result<ToolOutput> {
            Ok(ToolOutput {
                status_ok: self.ok,
                stdout: self.stdout.clone(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn non_zero_exit_degrades_to_empty_set() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("a.jar");
        fs::write(&jar, b"jar").unwrap();

        // Output would parse fine, but the exit status is authoritative
        let resolver = ClasspathResolver::new(Scripted {
            stdout: format!("{}\n", jar.display()),
            ok: false,
        });

        assert!(resolver.resolve(&utf8(tmp.path())).is_empty());
    }

    #[test]
    fn spawn_failure_degrades_to_empty_set() {
        struct Exploding;
        impl MvnInvoker for Exploding {
            fn build_classpath(&self, _dir: &Utf8Path) -> Result<ToolOutput> {
                anyhow::bail!("No such file or directory")
            }
        }

        let resolver = ClasspathResolver::new(Exploding);
        let tmp = TempDir::new().unwrap();
        assert!(resolver.resolve(&utf8(tmp.path())).is_empty());
    }

    /// Invoker double that tracks how many invocations run concurrently.
    struct Counting {
        in_flight: AtomicUsize,
        high_water: AtomicUsize,
    }

    impl MvnInvoker for Counting {
        fn build_classpath(&self, _dir: &Utf8Path) -> Result<ToolOutput> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.high_water.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(25));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            Ok(ToolOutput {
                status_ok: true,
                stdout: "\n".to_string(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn at_most_jobs_invocations_in_flight() {
        let resolver = ClasspathResolver::new(Counting {
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        });

        let dirs: Vec<Utf8PathBuf> = (0..9)
            .map(|i| Utf8PathBuf::from(format!("/virtual/project-{i}")))
            .collect();

        let results = resolver.resolve_all(&dirs, 4, |_| {}).expect("resolve_all");

        assert_eq!(results.len(), 9);
        let peak = resolver.invoker.high_water.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak concurrency was {peak}");
        assert!(peak >= 2, "expected some overlap, saw {peak}");
    }

    #[cfg(unix)]
    mod subprocess {
        use std::os::unix::fs::PermissionsExt;

        use super::*;

        fn write_script(dir: &std::path::Path, body: &str) -> PathBuf {
            let path = dir.join("fake-mvn.sh");
            fs::write(&path, body).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn real_subprocess_roundtrip() {
            let tmp = TempDir::new().unwrap();
            let project = tmp.path().join("proj");
            fs::create_dir_all(project.join("lib")).unwrap();
            fs::write(project.join("lib/a.jar"), b"jar").unwrap();

            let script = write_script(
                tmp.path(),
                "#!/bin/sh\n\
                 echo '[INFO] Scanning for projects...'\n\
                 echo '[INFO] Dependencies classpath:'\n\
                 echo \"$PWD/lib/a.jar:$PWD/lib\"\n",
            );

            let resolver = ClasspathResolver::new(MvnTool::new(MvnOptions {
                command: Some(script.display().to_string()),
                ..MvnOptions::default()
            }));

            let entries = resolver.resolve(&utf8(&project));
            assert_eq!(entries.len(), 2);
        }

        #[test]
        fn hung_invocation_is_killed_at_the_deadline() {
            let tmp = TempDir::new().unwrap();
            // exec so the kill reaches sleep itself, not just the shell
            let script = write_script(tmp.path(), "#!/bin/sh\nexec sleep 30\n");

            let resolver = ClasspathResolver::new(MvnTool::new(MvnOptions {
                command: Some(script.display().to_string()),
                timeout: Some(Duration::from_millis(300)),
                ..MvnOptions::default()
            }));

            let started = Instant::now();
            let entries = resolver.resolve(&utf8(tmp.path()));

            assert!(entries.is_empty());
            assert!(
                started.elapsed() < Duration::from_secs(10),
                "kill did not take effect"
            );
        }
    }
}
