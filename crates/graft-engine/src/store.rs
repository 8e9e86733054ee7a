//! File store abstraction
//!
//! The engine reads sources and writes the destination tree only through
//! [`FileStore`], so copy logic can be exercised against any backing store.

use graft_foundation::module_name::{join_mod, mod_to_path};
use graft_foundation::{GraftError, GraftResult, IoResultExt};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{INITIALIZER_FILE, SOURCE_EXTENSION};

/// Synchronous file operations used by the engine
pub trait FileStore {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> GraftResult<String>;

    /// Create a new file; returns `false` without touching anything when the
    /// path already exists
    fn create_file(&self, path: &Path, contents: &str) -> GraftResult<bool>;

    /// Create or replace a file
    fn write_file(&self, path: &Path, contents: &str) -> GraftResult<()>;

    /// Create every missing directory between `stop_at` and the parent of
    /// `file`, dropping an initializer containing `marker` into each one
    ///
    /// Returns the initializers created.
    fn ensure_package_dirs(
        &self,
        file: &Path,
        stop_at: &Path,
        marker: &str,
    ) -> GraftResult<Vec<PathBuf>>;

    /// Remove a directory tree; returns whether it existed
    fn remove_tree(&self, path: &Path) -> GraftResult<bool>;
}

/// [`FileStore`] backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl FileStore for LocalFileStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_to_string(&self, path: &Path) -> GraftResult<String> {
        fs::read_to_string(path).with_path(path)
    }

    fn create_file(&self, path: &Path, contents: &str) -> GraftResult<bool> {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(GraftError::io(path, e)),
        };
        file.write_all(contents.as_bytes()).with_path(path)?;
        Ok(true)
    }

    fn write_file(&self, path: &Path, contents: &str) -> GraftResult<()> {
        fs::write(path, contents).with_path(path)
    }

    fn ensure_package_dirs(
        &self,
        file: &Path,
        stop_at: &Path,
        marker: &str,
    ) -> GraftResult<Vec<PathBuf>> {
        let Some(parent) = file.parent() else {
            return Ok(Vec::new());
        };

        // Outermost first, so every initializer lands in an existing directory
        let mut missing: Vec<&Path> = parent
            .ancestors()
            .take_while(|dir| *dir != stop_at && dir.starts_with(stop_at))
            .filter(|dir| !dir.is_dir())
            .collect();
        missing.reverse();

        let mut created = Vec::new();
        for dir in missing {
            debug!(dir = %dir.display(), "Creating directory");
            fs::create_dir(dir).with_path(dir)?;
            let initializer = dir.join(INITIALIZER_FILE);
            if self.create_file(&initializer, marker)? {
                debug!(path = %initializer.display(), "Dropped package initializer");
                created.push(initializer);
            }
        }
        Ok(created)
    }

    fn remove_tree(&self, path: &Path) -> GraftResult<bool> {
        if !path.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(path).with_path(path)?;
        Ok(true)
    }
}

/// Tells whether the consumer already provides a shared module
pub trait SharedModuleOracle {
    /// The consumer's dotted module for `module`, if it exists there
    fn locate(&self, module: &str) -> Option<String>;
}

/// Destination project rooted at `dest_dir` whose package is `base`
pub struct DestinationTree<'a> {
    store: &'a dyn FileStore,
    dest_dir: &'a Path,
    base: &'a str,
}

impl<'a> DestinationTree<'a> {
    pub fn new(store: &'a dyn FileStore, dest_dir: &'a Path, base: &'a str) -> Self {
        Self {
            store,
            dest_dir,
            base,
        }
    }

    /// Path of the leaf file `<dest>/<base>/<module>.py`
    pub fn leaf_path(&self, module: &str) -> PathBuf {
        self.dest_dir
            .join(mod_to_path(&join_mod([self.base, module])))
            .with_extension(SOURCE_EXTENSION)
    }
}

impl SharedModuleOracle for DestinationTree<'_> {
    fn locate(&self, module: &str) -> Option<String> {
        let path = self.leaf_path(module);
        (self.store.exists(&path) && !self.store.is_dir(&path)).then(|| join_mod([self.base, module]))
    }
}
