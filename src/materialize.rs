use crate::{
    errors::{FileOperation, IoError},
    manifest::{Manifest, PathViolation},
    transactions::{Active, RollbackOperation, Transaction},
    utils::first_missing_ancestor,
};
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ScaffoldError {
    #[error("refusing to write '{path}': {reason}")]
    #[diagnostic(
        code(lampgen::scaffold::invalid_path),
        help("File paths must be relative and stay inside the base directory.")
    )]
    InvalidPath {
        path: String,
        reason: PathViolation,
    },

    #[error("stopped after writing {} of {total} file(s)", .written.len())]
    #[diagnostic(
        code(lampgen::scaffold::io),
        help("Files written before the failure were left in place. Fix the cause and run again, or use --atomic.")
    )]
    Io {
        #[source]
        source: IoError,
        written: Vec<PathBuf>,
        total: usize,
    },

    #[error("stopped before all {total} file(s) were written; changes were rolled back")]
    #[diagnostic(code(lampgen::scaffold::rolled_back))]
    RolledBack {
        #[source]
        source: IoError,
        total: usize,
    },
}

impl ScaffoldError {
    /// The path whose directory creation or write failed, if any.
    pub fn failed_path(&self) -> Option<&Path> {
        match self {
            Self::InvalidPath { .. } => None,
            Self::Io { source, .. } | Self::RolledBack { source, .. } => Some(source.path.as_path()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Undo every change made so far when a write fails.
    pub atomic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Created,
    Overwritten,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub status: WriteStatus,
}

/// Outcome of a successful run, one entry per file in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Materialized {
    pub files: Vec<WrittenFile>,
}

/// Writes every [`FileSpec`](crate::manifest::FileSpec) of `manifest` below `base_dir`.
///
/// Missing directories (including `base_dir` and its ancestors) are created and existing files
/// are truncated and replaced. Content is written verbatim. Running it twice yields the same
/// tree as running it once.
///
/// # Errors
///
/// Returns a [`ScaffoldError`] if:
///
/// - A path in the manifest is empty, absolute or contains `..`. Nothing is written.
/// - A directory cannot be created or a file cannot be written. The remaining files are
///   skipped and the error lists the files already written.
pub fn materialize(base_dir: &Path, manifest: &Manifest) -> Result<Materialized, ScaffoldError> {
    materialize_with(base_dir, manifest, Options::default())
}

/// Same as [`materialize`], with [`Options`] controlling rollback on failure.
pub fn materialize_with(
    base_dir: &Path,
    manifest: &Manifest,
    options: Options,
) -> Result<Materialized, ScaffoldError> {
    for spec in manifest {
        spec.check_path()
            .map_err(|reason| ScaffoldError::InvalidPath {
                path: spec.path.to_string(),
                reason,
            })?;
    }

    log::debug!(
        "materializing {} file(s) into {}",
        manifest.len(),
        base_dir.display()
    );

    let mut trx = options.atomic.then(Transaction::<Active>::new);
    let mut written = Vec::with_capacity(manifest.len());

    match apply_manifest(base_dir, manifest, trx.as_mut(), &mut written) {
        Ok(()) => {
            if let Some(trx) = trx {
                trx.commit();
            }

            log::info!(
                "wrote {} file(s) into {}",
                written.len(),
                base_dir.display()
            );

            Ok(Materialized { files: written })
        }
        Err(source) => {
            let total = manifest.len();

            match trx {
                Some(trx) => {
                    // dropping the uncommitted transaction undoes everything recorded so far
                    drop(trx);
                    Err(ScaffoldError::RolledBack { source, total })
                }
                None => Err(ScaffoldError::Io {
                    source,
                    written: written.into_iter().map(|file| file.path).collect(),
                    total,
                }),
            }
        }
    }
}

fn apply_manifest(
    base_dir: &Path,
    manifest: &Manifest,
    mut trx: Option<&mut Transaction<Active>>,
    written: &mut Vec<WrittenFile>,
) -> Result<(), IoError> {
    create_directory(trx.as_deref_mut(), base_dir)?;

    for spec in manifest {
        let target = base_dir.join(spec.relative_path());

        if let Some(parent) = target.parent() {
            create_directory(trx.as_deref_mut(), parent)?;
        }

        let status = write_file(trx.as_deref_mut(), &target, &spec.content)?;

        written.push(WrittenFile {
            path: target,
            status,
        });
    }

    Ok(())
}
/// Creates all directories in the specified path if they do not exist.
///
/// When a transaction is present, the outermost directory that has to be created is registered
/// as a [`RollbackOperation::RemoveDir`] before creating it. Directories that already existed are
/// never registered.
fn create_directory(
    trx: Option<&mut Transaction<Active>>,
    path: &Path,
) -> Result<(), IoError> {
    let created = first_missing_ancestor(path);

    // registered up front: create_dir_all can fail after creating the outer directories
    if let (Some(trx), Some(created)) = (trx, &created) {
        trx.add_operation(RollbackOperation::RemoveDir(created.clone()));
    }

    std::fs::create_dir_all(path)
        .map_err(|error| IoError::new(FileOperation::Mkdir, path.into(), error))?;

    if let Some(created) = created {
        log::debug!("created directory {}", created.display());
    }

    Ok(())
}
/// Truncates or creates the file at `path` and writes `contents` to it.
///
/// With a transaction present the undo step is registered before writing, so a write that fails
/// halfway through still gets restored: previous bytes for an existing file, removal for a new one.
fn write_file(
    trx: Option<&mut Transaction<Active>>,
    path: &Path,
    contents: &str,
) -> Result<WriteStatus, IoError> {
    let status = if path.is_file() {
        WriteStatus::Overwritten
    } else {
        WriteStatus::Created
    };

    if let Some(trx) = trx {
        let operation = match status {
            WriteStatus::Overwritten => RollbackOperation::RestoreFile {
                path: path.to_path_buf(),
                contents: std::fs::read(path)
                    .map_err(|error| IoError::new(FileOperation::Read, path.into(), error))?,
            },
            WriteStatus::Created => RollbackOperation::RemoveFile(path.to_path_buf()),
        };

        trx.add_operation(operation);
    }

    std::fs::write(path, contents)
        .map_err(|error| IoError::new(FileOperation::Write, path.into(), error))?;

    log::debug!("wrote {} ({} bytes)", path.display(), contents.len());

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{blueprint::lamp_stack, manifest::FileSpec};
    use std::fs;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    /// Relative path and content (`None` for directories) of everything below `root`.
    fn snapshot(root: &Path) -> Vec<(PathBuf, Option<Vec<u8>>)> {
        let mut entries: Vec<_> = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .map(|entry| {
                let relative = entry
                    .path()
                    .strip_prefix(root)
                    .expect("entry below root")
                    .to_path_buf();
                let content = entry
                    .file_type()
                    .is_file()
                    .then(|| fs::read(entry.path()).expect("readable file"));
                (relative, content)
            })
            .collect();
        entries.sort();
        entries
    }

    fn single(path: &'static str, content: &'static str) -> Manifest {
        [FileSpec::new(path, content)].into_iter().collect()
    }

    #[test]
    fn writes_nested_file_and_creates_parents() {
        let tmp = TempDir::new().expect("tempdir");
        let base = tmp.path().join("x");

        let result = materialize(&base, &single("a/b/c.txt", "hi\n")).expect("materialize");

        assert!(base.join("a/b").is_dir());
        assert_eq!(
            fs::read_to_string(base.join("a/b/c.txt")).expect("read"),
            "hi\n"
        );
        assert_eq!(
            result.files,
            vec![WrittenFile {
                path: base.join("a/b/c.txt"),
                status: WriteStatus::Created,
            }]
        );
    }

    #[test]
    fn every_blueprint_file_lands_byte_for_byte() {
        let tmp = TempDir::new().expect("tempdir");
        let base = tmp.path().join("deep/missing/base");
        let manifest = lamp_stack();

        materialize(&base, &manifest).expect("materialize");

        for spec in &manifest {
            let on_disk = fs::read(base.join(spec.relative_path())).expect("read");
            assert_eq!(on_disk, spec.content.as_bytes(), "{}", spec.path);
        }
        assert!(base.join("roles/apache/templates").is_dir());
    }

    #[test]
    fn directory_tree_mirrors_path_prefixes() {
        let tmp = TempDir::new().expect("tempdir");
        let manifest = lamp_stack();

        materialize(tmp.path(), &manifest).expect("materialize");

        let mut expected: Vec<PathBuf> = manifest.directories().into_iter().collect();
        expected.extend(manifest.iter().map(|spec| spec.relative_path().to_path_buf()));
        expected.sort();

        let actual: Vec<PathBuf> = snapshot(tmp.path())
            .into_iter()
            .map(|(path, _)| path)
            .collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn empty_manifest_still_creates_base_dir() {
        let tmp = TempDir::new().expect("tempdir");
        let base = tmp.path().join("fresh");

        let result = materialize(&base, &Manifest::new()).expect("materialize");

        assert!(base.is_dir());
        assert!(result.files.is_empty());
    }

    #[test]
    fn running_twice_is_idempotent() {
        let tmp = TempDir::new().expect("tempdir");
        let manifest = lamp_stack();

        materialize(tmp.path(), &manifest).expect("first run");
        let once = snapshot(tmp.path());

        let second = materialize(tmp.path(), &manifest).expect("second run");
        let twice = snapshot(tmp.path());

        assert_eq!(once, twice);
        assert!(second
            .files
            .iter()
            .all(|file| file.status == WriteStatus::Overwritten));
    }

    #[test]
    fn existing_file_is_replaced_not_appended() {
        let tmp = TempDir::new().expect("tempdir");
        let cfg = tmp.path().join("ansible.cfg");
        fs::write(&cfg, "[defaults]\nforks = 500\nsomething much longer than the new file\n")
            .expect("seed");

        let result = materialize(tmp.path(), &single("ansible.cfg", "[defaults]\n"))
            .expect("materialize");

        assert_eq!(fs::read_to_string(&cfg).expect("read"), "[defaults]\n");
        assert_eq!(result.files[0].status, WriteStatus::Overwritten);
    }

    #[test]
    fn escaping_path_is_rejected_before_writing_anything() {
        let tmp = TempDir::new().expect("tempdir");
        let base = tmp.path().join("base");
        let manifest: Manifest = [
            FileSpec::new("ansible.cfg", "ok\n"),
            FileSpec::new("../escape.txt", "nope\n"),
        ]
        .into_iter()
        .collect();

        let error = materialize(&base, &manifest).expect_err("must be rejected");

        assert!(matches!(
            error,
            ScaffoldError::InvalidPath {
                reason: PathViolation::ParentSegment,
                ..
            }
        ));
        assert!(!base.exists());
        assert!(!tmp.path().join("escape.txt").exists());
    }

    #[test]
    fn unusable_base_dir_reports_the_failing_path() {
        let tmp = TempDir::new().expect("tempdir");
        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, "").expect("seed");
        let base = blocker.join("base");

        let error = materialize(&base, &lamp_stack()).expect_err("must fail");

        match &error {
            ScaffoldError::Io {
                source,
                written,
                total,
            } => {
                assert_eq!(source.operation, FileOperation::Mkdir);
                assert_eq!(source.path, base);
                assert!(written.is_empty());
                assert_eq!(*total, 12);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(error.failed_path(), Some(base.as_path()));
    }

    #[test]
    fn write_failure_aborts_and_lists_files_already_written() {
        let tmp = TempDir::new().expect("tempdir");
        // a directory where playbook.yml should go makes the write fail
        fs::create_dir_all(tmp.path().join("playbook.yml")).expect("seed");

        let error = materialize(tmp.path(), &lamp_stack()).expect_err("must fail");

        match error {
            ScaffoldError::Io {
                source, written, ..
            } => {
                assert_eq!(source.operation, FileOperation::Write);
                assert_eq!(source.path, tmp.path().join("playbook.yml"));
                assert_eq!(
                    written,
                    vec![
                        tmp.path().join("ansible.cfg"),
                        tmp.path().join("inventory/dev.ini"),
                        tmp.path().join("inventory/staging.ini"),
                        tmp.path().join("inventory/prod.ini"),
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(tmp.path().join("inventory/prod.ini").is_file());
        assert!(!tmp.path().join("roles").exists());
    }

    #[test]
    fn atomic_failure_restores_previous_state() {
        let tmp = TempDir::new().expect("tempdir");
        fs::write(tmp.path().join("ansible.cfg"), "mine\n").expect("seed");
        fs::create_dir_all(tmp.path().join("roles/php/handlers/main.yml")).expect("seed");
        let before = snapshot(tmp.path());

        let error = materialize_with(tmp.path(), &lamp_stack(), Options { atomic: true })
            .expect_err("must fail");

        assert!(matches!(error, ScaffoldError::RolledBack { total: 12, .. }));
        assert_eq!(
            error.failed_path(),
            Some(tmp.path().join("roles/php/handlers/main.yml").as_path())
        );
        assert_eq!(snapshot(tmp.path()), before);
    }

    #[test]
    fn atomic_failure_removes_partially_created_directories() {
        let tmp = TempDir::new().expect("tempdir");
        // the outer directory gets created, the over-long name below it does not
        let base = tmp.path().join("fresh").join("a".repeat(300));

        let error = materialize_with(&base, &lamp_stack(), Options { atomic: true })
            .expect_err("must fail");

        assert!(matches!(error, ScaffoldError::RolledBack { total: 12, .. }));
        assert!(!tmp.path().join("fresh").exists());
    }

    #[test]
    fn atomic_success_keeps_everything() {
        let tmp = TempDir::new().expect("tempdir");
        let base = tmp.path().join("base");

        let result = materialize_with(&base, &lamp_stack(), Options { atomic: true })
            .expect("materialize");

        assert_eq!(result.files.len(), 12);
        assert!(base.join("roles/php/handlers/main.yml").is_file());
    }
}
