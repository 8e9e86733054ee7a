//! Test support utilities and fixtures for graft integration tests

pub mod fixtures;

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A directory tree living in a temporary directory
///
/// Removed when dropped.
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Builder-style variant of [`SourceTree::write`]
    pub fn with_file(self, relative: &str, contents: &str) -> Self {
        self.write(relative, contents);
        self
    }

    /// Write a file (creating parent directories), returning its path
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        fs::write(&path, contents).expect("failed to write fixture file");
        path
    }

    /// Create an empty directory
    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(&path).expect("failed to create dir");
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.join(relative).exists()
    }

    /// Read a file of the tree, panicking with the path when absent
    pub fn read(&self, relative: &str) -> String {
        let path = self.join(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
    }

    /// SHA-256 of every file, keyed by path relative to the tree root
    pub fn digests(&self) -> BTreeMap<PathBuf, String> {
        content_digests(self.path())
    }

    /// Every file path relative to the tree root, sorted
    pub fn files(&self) -> Vec<String> {
        self.digests()
            .into_keys()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect()
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA-256 of every file below `root`, keyed by relative path
pub fn content_digests(root: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let bytes = fs::read(entry.path()).expect("failed to read file for digest");
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("walked path is below root")
                .to_path_buf();
            (relative, format!("{:x}", Sha256::digest(&bytes)))
        })
        .collect()
}
