use crate::{
    errors::{FileOperation, IoError},
    manifest::Manifest,
};
use indexmap::IndexMap;
use miette::Diagnostic;
use std::{
    collections::HashSet,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error, Diagnostic)]
pub enum CheckError {
    #[error("I/O error within check domain")]
    #[diagnostic(code(lampgen::check::io))]
    Io(#[from] IoError),

    #[error("{missing} missing and {modified} modified file(s) under '{}'", .base_dir.display())]
    #[diagnostic(
        code(lampgen::check::drift),
        help("Run `lampgen generate` on the same directory to restore the scaffold.")
    )]
    Drift {
        base_dir: PathBuf,
        missing: usize,
        modified: usize,
    },
}

/// How a path below the base directory compares with the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drift {
    Unchanged,
    Modified,
    Missing,
    /// On disk but not named by the manifest. Informational only.
    Extra,
}
impl Drift {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Modified => "modified",
            Self::Missing => "missing",
            Self::Extra => "extra",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub base_dir: PathBuf,
    /// Relative paths: manifest entries first in manifest order, then extras in walk order.
    pub entries: IndexMap<PathBuf, Drift>,
}
impl CheckReport {
    pub fn count(&self, drift: Drift) -> usize {
        self.entries.values().filter(|entry| **entry == drift).count()
    }

    /// `true` when every manifest file is present with the expected content.
    pub fn is_clean(&self) -> bool {
        self.count(Drift::Missing) == 0 && self.count(Drift::Modified) == 0
    }

    /// Turns a report with missing or modified files into [`CheckError::Drift`].
    pub fn into_result(self) -> Result<Self, CheckError> {
        if self.is_clean() {
            Ok(self)
        } else {
            Err(CheckError::Drift {
                missing: self.count(Drift::Missing),
                modified: self.count(Drift::Modified),
                base_dir: self.base_dir,
            })
        }
    }
}

fn compare(target: &Path, expected: &[u8]) -> Result<Drift, IoError> {
    if target.is_dir() {
        return Ok(Drift::Modified);
    }

    match std::fs::read(target) {
        Ok(actual) if actual == expected => Ok(Drift::Unchanged),
        Ok(_) => Ok(Drift::Modified),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(Drift::Missing),
        Err(error) => Err(IoError::new(FileOperation::Read, target.into(), error)),
    }
}

/// Compares the files below `base_dir` with `manifest` without writing anything.
///
/// # Errors
///
/// Returns [`CheckError::Io`] when a file exists but cannot be read, or the directory walk
/// fails. Drift itself is reported through the returned [`CheckReport`].
pub fn check(base_dir: &Path, manifest: &Manifest) -> Result<CheckReport, CheckError> {
    let mut entries = IndexMap::new();

    for spec in manifest {
        let relative = spec.normalized_path();
        let drift = compare(&base_dir.join(&relative), spec.content.as_bytes())?;

        log::debug!("{}: {}", relative.display(), drift.label());

        entries.insert(relative, drift);
    }

    if base_dir.is_dir() {
        let known: HashSet<PathBuf> = entries.keys().cloned().collect();

        for entry in WalkDir::new(base_dir).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(error) => {
                    let path = error.path().unwrap_or_else(|| Path::new(""));

                    Err(IoError::new(
                        FileOperation::Read,
                        path.to_path_buf(),
                        error.into(),
                    ))?
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(base_dir) else {
                continue;
            };

            if !known.contains(relative) {
                entries.insert(relative.to_path_buf(), Drift::Extra);
            }
        }
    }

    let report = CheckReport {
        base_dir: base_dir.to_path_buf(),
        entries,
    };

    log::info!(
        "checked {}: {} unchanged, {} modified, {} missing, {} extra",
        base_dir.display(),
        report.count(Drift::Unchanged),
        report.count(Drift::Modified),
        report.count(Drift::Missing),
        report.count(Drift::Extra)
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{blueprint::lamp_stack, materialize::materialize};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn freshly_generated_tree_is_clean() {
        let tmp = TempDir::new().expect("tempdir");
        let manifest = lamp_stack();
        materialize(tmp.path(), &manifest).expect("materialize");

        let report = check(tmp.path(), &manifest).expect("check");

        assert!(report.is_clean());
        assert_eq!(report.count(Drift::Unchanged), manifest.len());
        assert_eq!(report.count(Drift::Extra), 0);
    }

    #[test]
    fn missing_base_dir_reports_everything_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let manifest = lamp_stack();

        let report = check(&tmp.path().join("nowhere"), &manifest).expect("check");

        assert_eq!(report.count(Drift::Missing), manifest.len());
        assert!(!report.is_clean());
    }

    #[test]
    fn classifies_modified_missing_and_extra() {
        let tmp = TempDir::new().expect("tempdir");
        let manifest = lamp_stack();
        materialize(tmp.path(), &manifest).expect("materialize");

        fs::write(tmp.path().join("playbook.yml"), "---\n- hosts: all\n").expect("edit");
        fs::remove_file(tmp.path().join("inventory/prod.ini")).expect("remove");
        fs::write(tmp.path().join("roles/apache/files.txt"), "extra\n").expect("add");

        let report = check(tmp.path(), &manifest).expect("check");

        assert_eq!(
            report.entries.get(Path::new("playbook.yml")),
            Some(&Drift::Modified)
        );
        assert_eq!(
            report.entries.get(Path::new("inventory/prod.ini")),
            Some(&Drift::Missing)
        );
        assert_eq!(
            report.entries.get(Path::new("roles/apache/files.txt")),
            Some(&Drift::Extra)
        );

        match report.into_result() {
            Err(CheckError::Drift {
                missing, modified, ..
            }) => {
                assert_eq!(missing, 1);
                assert_eq!(modified, 1);
            }
            other => panic!("expected drift, got {other:?}"),
        }
    }

    #[test]
    fn extra_files_alone_do_not_count_as_drift() {
        let tmp = TempDir::new().expect("tempdir");
        let manifest = lamp_stack();
        materialize(tmp.path(), &manifest).expect("materialize");
        fs::write(tmp.path().join("README.md"), "notes\n").expect("add");

        let report = check(tmp.path(), &manifest).expect("check");

        assert_eq!(report.count(Drift::Extra), 1);
        assert!(report.into_result().is_ok());
    }
}
