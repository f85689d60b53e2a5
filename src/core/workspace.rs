//! Workspace document model and emission.
//!
//! The document shape follows the host editor's project format: a `folders`
//! list of `{path, name}` entries plus a `settings` block carrying the
//! classpath list under a configurable key. Field order is insignificant;
//! serde_json pretty output keeps diffs readable.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::warn;

/// One workspace folder: a project directory plus its display name.
#[derive(Debug, Clone, Serialize)]
pub struct Folder {
    pub path: Utf8PathBuf,
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_exclude_patterns: Option<Vec<String>>,
}

/// A host-editor workspace document.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceDocument {
    pub folders: Vec<Folder>,
    pub settings: BTreeMap<String, Vec<Utf8PathBuf>>,
}

impl WorkspaceDocument {
    pub fn new(folders: Vec<Folder>, classpath_key: &str, classpath: Vec<Utf8PathBuf>) -> Self {
        let mut settings = BTreeMap::new();
        settings.insert(classpath_key.to_string(), classpath);
        Self { folders, settings }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing workspace document")
    }
}

/// Assembled output of one scan: a single merged document with its
/// destination, or one document per project, each next to its pom.
#[derive(Debug)]
pub enum WorkspacePlan {
    Merged {
        document: WorkspaceDocument,
        target: Utf8PathBuf,
    },
    PerProject(Vec<(Utf8PathBuf, WorkspaceDocument)>),
}

/// File name for a workspace document derived from `dir`: the directory
/// basename plus the configured extension.
pub fn workspace_file_name(dir: &Utf8Path, ext: &str) -> String {
    format!("{}.{ext}", dir.file_name().unwrap_or("workspace"))
}

/// Publish the plan. Merged documents go to stdout or their target file;
/// per-project documents are written best-effort: an unwritable project
/// logs a warning and the rest are still attempted.
pub fn publish(plan: &WorkspacePlan, to_stdout: bool, quiet: bool) -> Result<()> {
    match plan {
        WorkspacePlan::Merged { document, target } => {
            let json = document.to_json()?;
            if to_stdout {
                println!("{json}");
            } else {
                std::fs::write(target, json).with_context(|| format!("writing {target}"))?;
                if !quiet {
                    println!("Wrote {target}");
                }
            }
        }
        WorkspacePlan::PerProject(documents) => {
            let mut written = 0usize;
            for (target, document) in documents {
                let json = document.to_json()?;
                match std::fs::write(target, json) {
                    Ok(()) => written += 1,
                    Err(err) => warn!("could not write {target}: {err}"),
                }
            }
            if !quiet {
                println!("Wrote {written} of {} workspace files", documents.len());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> WorkspaceDocument {
        WorkspaceDocument::new(
            vec![Folder {
                path: Utf8PathBuf::from("/work/app"),
                name: "c.x:app:PROJECT".to_string(),
                folder_exclude_patterns: None,
            }],
            "java_classpath",
            vec![Utf8PathBuf::from("/work/app/target/classes")],
        )
    }

    #[test]
    fn json_shape_has_folders_and_settings() {
        let json = doc().to_json().expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["folders"][0]["path"], "/work/app");
        assert_eq!(value["folders"][0]["name"], "c.x:app:PROJECT");
        assert_eq!(
            value["settings"]["java_classpath"][0],
            "/work/app/target/classes"
        );
        // Absent excludes stay out of the serialized form entirely
        assert!(value["folders"][0].get("folder_exclude_patterns").is_none());
    }

    #[test]
    fn exclude_patterns_serialize_when_present() {
        let mut document = doc();
        document.folders[0].folder_exclude_patterns = Some(vec!["target".to_string()]);

        let value: serde_json::Value =
            serde_json::from_str(&document.to_json().unwrap()).unwrap();
        assert_eq!(value["folders"][0]["folder_exclude_patterns"][0], "target");
    }

    #[test]
    fn workspace_file_names_follow_the_directory() {
        assert_eq!(
            workspace_file_name(Utf8Path::new("/work/my-app"), "sublime-project"),
            "my-app.sublime-project"
        );
    }

    #[test]
    fn per_project_publish_survives_an_unwritable_target() {
        let tmp = tempfile::TempDir::new().unwrap();
        let good = Utf8PathBuf::from_path_buf(tmp.path().join("a.sublime-project")).unwrap();
        let bad = Utf8PathBuf::from_path_buf(tmp.path().join("missing/dir/b.sublime-project"))
            .unwrap();

        let plan = WorkspacePlan::PerProject(vec![
            (bad, doc()),
            (good.clone(), doc()),
        ]);

        publish(&plan, false, true).expect("best-effort publish");
        assert!(good.as_std_path().is_file());
    }
}
