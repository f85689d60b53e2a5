//! pom.xml descriptor parsing and project naming.
//!
//! Only the immediate children of the document root are inspected: a
//! project's own `groupId`/`artifactId` are top-level by convention, and the
//! inherited group id lives one level down inside `<parent>`. Maven poms
//! carry an XML namespace, so tags are matched by local name.

use std::path::{Path, PathBuf};

use anyhow::Result;
use itertools::Itertools;
use thiserror::Error;

use crate::cli::LocateArgs;
use crate::infra::utils::resolve_user_path;
use crate::infra::walk::POM_FILE;

/// Descriptor parsing and naming errors. A failing descriptor drops its
/// project from the scan; it never aborts the aggregation.
#[derive(Debug, Error)]
pub enum PomError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed descriptor {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("descriptor {path} has no groupId (own or parent)")]
    MissingGroupId { path: PathBuf },

    #[error("descriptor {path} has no artifactId")]
    MissingArtifactId { path: PathBuf },
}

/// Identity fields of one parsed descriptor.
#[derive(Debug, Clone, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub parent_group_id: Option<String>,

    /// Where the descriptor was read from, for error reporting.
    path: PathBuf,
}

impl Pom {
    /// Parse a descriptor file into its coordinate fields.
    pub fn parse(path: &Path) -> Result<Self, PomError> {
        let contents = std::fs::read_to_string(path).map_err(|source| PomError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let doc = roxmltree::Document::parse(&contents).map_err(|source| PomError::Xml {
            path: path.to_path_buf(),
            source,
        })?;

        let mut pom = Pom {
            path: path.to_path_buf(),
            ..Pom::default()
        };

        for node in doc.root_element().children().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "groupId" => pom.group_id = element_text(&node),
                "artifactId" => pom.artifact_id = element_text(&node),
                "parent" => {
                    pom.parent_group_id = node
                        .children()
                        .filter(|n| n.is_element())
                        .find(|n| n.tag_name().name() == "groupId")
                        .and_then(|n| element_text(&n));
                }
                _ => {}
            }
        }

        Ok(pom)
    }

    /// The descriptor's own group id, falling back to the parent's.
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id.as_deref().or(self.parent_group_id.as_deref())
    }

    /// Format the display/sort name `<group>:<artifact>:PROJECT`.
    /// Short mode abbreviates the group id to per-segment initials
    /// (`com.example.foo` -> `c.e.f`).
    pub fn project_name(&self, long_names: bool) -> Result<String, PomError> {
        let group = self
            .effective_group_id()
            .ok_or_else(|| PomError::MissingGroupId {
                path: self.path.clone(),
            })?;
        let artifact = self
            .artifact_id
            .as_deref()
            .ok_or_else(|| PomError::MissingArtifactId {
                path: self.path.clone(),
            })?;

        let group = if long_names {
            group.to_string()
        } else {
            initials(group)
        };

        Ok(format!("{group}:{artifact}:PROJECT"))
    }
}

fn element_text(node: &roxmltree::Node<'_, '_>) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// `com.example.foo` -> `c.e.f`. Empty segments are dropped.
fn initials(group_id: &str) -> String {
    group_id
        .split('.')
        .filter_map(|segment| segment.chars().next())
        .join(".")
}

/// Nearest directory at or above `start` that directly contains a
/// descriptor. `start` may be a file or a directory.
pub fn find_nearest_pom(start: &Path) -> Option<PathBuf> {
    let mut current = if start.is_dir() {
        Some(start)
    } else {
        start.parent()
    };

    while let Some(dir) = current {
        if dir.join(POM_FILE).is_file() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

/// CLI entry for `pomscan locate`.
pub fn locate_run(args: LocateArgs) -> Result<()> {
    let start = resolve_user_path(&args.path);
    let dir = find_nearest_pom(&start)
        .ok_or_else(|| anyhow::anyhow!("no {POM_FILE} found for path {}", start.display()))?;

    println!("{}", dir.display());
    Ok(())
}
