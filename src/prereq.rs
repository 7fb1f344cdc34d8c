//! Presence checks for the artifacts an engine needs before it can run.

use std::path::{Path, PathBuf};

use crate::error::TtsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    File,
    Directory,
}

/// An externally supplied file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: &'static str,
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn file(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            path: path.into(),
            kind: ArtifactKind::File,
        }
    }

    pub fn dir(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            path: path.into(),
            kind: ArtifactKind::Directory,
        }
    }

    fn is_present(&self) -> bool {
        let path: &Path = &self.path;
        match self.kind {
            ArtifactKind::File => path.is_file(),
            ArtifactKind::Directory => path.is_dir(),
        }
    }
}

/// Fail with the first artifact that is missing.
pub fn check(artifacts: &[Artifact]) -> Result<(), TtsError> {
    for artifact in artifacts {
        if !artifact.is_present() {
            return Err(TtsError::MissingPrerequisite {
                artifact: artifact.name,
                path: artifact.path.clone(),
            });
        }
        log::debug!("Found {} at {}", artifact.name, artifact.path.display());
    }
    Ok(())
}
