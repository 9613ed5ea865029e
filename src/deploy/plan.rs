// ABOUTME: Expansion of local source paths into the files a deployment transfers.
// ABOUTME: Maps each file to its remote location and enforces object-size limits.

use super::error::{DeployError, SizeViolation, SizeViolations};
use crate::types::RemotePath;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One regular file of the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub source: PathBuf,
    /// Location on the node, relative to the login directory unless absolute.
    pub remote: String,
    pub size: u64,
}

/// Files to transfer and the top-level sources pushed to carry them.
///
/// A file `f` lands at `<dest>/<basename f>`; every file below a directory
/// `d` lands at `<dest>/<basename d>/<path relative to d>`.
#[derive(Debug, Clone, Default)]
pub struct TransferPlan {
    roots: Vec<PathBuf>,
    entries: Vec<PlanEntry>,
}

impl TransferPlan {
    pub fn resolve(sources: &[PathBuf], dest: &RemotePath) -> Result<Self, DeployError> {
        if sources.is_empty() {
            return Err(DeployError::NoSources);
        }

        let mut plan = TransferPlan::default();
        for source in sources {
            let metadata = std::fs::metadata(source).map_err(|e| read_error(source, e))?;
            let root = root_path(source)?;
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    DeployError::config_error(format!("cannot deploy {}", source.display()))
                })?;

            if metadata.is_dir() {
                plan.walk_directory(&root, &dest.join(&name))?;
            } else {
                plan.add(PlanEntry {
                    source: root.clone(),
                    remote: dest.join(&name),
                    size: metadata.len(),
                })?;
            }
            plan.roots.push(root);
        }

        tracing::debug!(
            "resolved {} source(s) into {} file(s), {} bytes",
            plan.roots.len(),
            plan.entries.len(),
            plan.total_bytes()
        );
        Ok(plan)
    }

    fn walk_directory(&mut self, root: &Path, remote_root: &str) -> Result<(), DeployError> {
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                read_error(&path, io::Error::from(e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let size = entry
                .metadata()
                .map_err(|e| read_error(entry.path(), io::Error::from(e)))?
                .len();

            self.add(PlanEntry {
                source: entry.path().to_path_buf(),
                remote: format!("{}/{}", remote_root, relative),
                size,
            })?;
        }
        Ok(())
    }

    /// Remote file lists are newline separated, so names may not contain one.
    fn add(&mut self, entry: PlanEntry) -> Result<(), DeployError> {
        if entry.remote.contains('\n') {
            return Err(DeployError::config_error(format!(
                "file name contains a newline: {}",
                entry.source.display()
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Top-level sources in input order; these are what gets pushed.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn remote_files(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.remote.as_str())
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    /// Fail with every file larger than `limit` bytes.
    pub fn check_size(&self, limit: u64) -> Result<(), DeployError> {
        let files: Vec<SizeViolation> = self
            .entries
            .iter()
            .filter(|e| e.size > limit)
            .map(|e| SizeViolation {
                path: e.source.clone(),
                size: e.size,
            })
            .collect();

        if files.is_empty() {
            Ok(())
        } else {
            Err(DeployError::SizeConstraint(SizeViolations { limit, files }))
        }
    }
}

/// Strip trailing separators and resolve paths without a final component (`.`, `..`).
fn root_path(source: &Path) -> Result<PathBuf, DeployError> {
    let trimmed: PathBuf = source.components().collect();
    if trimmed.file_name().is_some() {
        return Ok(trimmed);
    }
    trimmed
        .canonicalize()
        .map_err(|e| read_error(source, e))
}

fn read_error(path: &Path, source: io::Error) -> DeployError {
    if source.kind() == io::ErrorKind::NotFound {
        DeployError::SourceNotFound(path.to_path_buf())
    } else {
        DeployError::SourceRead {
            path: path.to_path_buf(),
            source,
        }
    }
}
