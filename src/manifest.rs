use indexmap::IndexSet;
use std::{
    borrow::Cow,
    path::{Component, Path, PathBuf},
};

/// Reason a relative path was refused before anything touched the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathViolation {
    #[error("the path is empty")]
    Empty,
    #[error("the path is absolute")]
    Absolute,
    #[error("the path contains a '..' segment")]
    ParentSegment,
}

/// A single file to be written: a slash-separated path relative to the base directory and the
/// exact text that should end up in it.
///
/// The content is opaque. Placeholders such as `{{ ansible_hostname }}` are written as-is and
/// left for Ansible to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub path: Cow<'static, str>,
    pub content: Cow<'static, str>,
}
impl FileSpec {
    pub fn new(path: impl Into<Cow<'static, str>>, content: impl Into<Cow<'static, str>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn relative_path(&self) -> &Path {
        Path::new(self.path.as_ref())
    }

    /// The relative path with `.` segments dropped, as it appears below the base directory.
    pub fn normalized_path(&self) -> PathBuf {
        self.relative_path()
            .components()
            .filter(|component| matches!(component, Component::Normal(_)))
            .collect()
    }

    /// Ensures the path stays inside whatever base directory it is later joined onto.
    pub fn check_path(&self) -> Result<(), PathViolation> {
        let mut normal_segments = 0;

        for component in self.relative_path().components() {
            match component {
                Component::Normal(_) => normal_segments += 1,
                Component::CurDir => {}
                Component::ParentDir => return Err(PathViolation::ParentSegment),
                Component::RootDir | Component::Prefix(_) => return Err(PathViolation::Absolute),
            }
        }

        // "" and "." both end up here
        if normal_segments == 0 {
            return Err(PathViolation::Empty);
        }

        Ok(())
    }
}

/// Ordered sequence of [`FileSpec`] values. Files are written in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    files: Vec<FileSpec>,
}
impl Manifest {
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    pub fn push(&mut self, spec: FileSpec) {
        self.files.push(spec);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileSpec> {
        self.files.iter()
    }

    pub fn get(&self, path: &str) -> Option<&FileSpec> {
        self.files.iter().find(|spec| spec.path == path)
    }

    /// Every directory implied by the file paths, parents before children, in the order they
    /// are first needed.
    pub fn directories(&self) -> IndexSet<PathBuf> {
        let mut directories = IndexSet::new();

        for spec in &self.files {
            let normalized = spec.normalized_path();
            let Some(parent) = normalized.parent() else {
                continue;
            };

            let mut chain: Vec<&Path> = parent
                .ancestors()
                .filter(|ancestor| !ancestor.as_os_str().is_empty())
                .collect();
            chain.reverse();

            for directory in chain {
                directories.insert(directory.to_path_buf());
            }
        }

        directories
    }
}
impl FromIterator<FileSpec> for Manifest {
    fn from_iter<I: IntoIterator<Item = FileSpec>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}
impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a FileSpec;
    type IntoIter = std::slice::Iter<'a, FileSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}
