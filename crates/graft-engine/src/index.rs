//! Module index of a source tree
//!
//! Walks the library root once and maps every source file to its dotted
//! module name. Package initializers are recorded under the name of the
//! directory they initialize.

use crate::constants::{INITIALIZER_STEM, SOURCE_EXTENSION};
use graft_foundation::module_name::join_mod;
use graft_foundation::{GraftError, GraftResult, IoResultExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// One source file of the indexed library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Dotted name relative to the library root (`utils.misc`)
    pub name: String,
    /// Absolute path of the file
    pub path: PathBuf,
    /// Path relative to the source directory, starting with the library root
    /// directory (`taskflow/utils/misc.py`)
    pub relative_path: PathBuf,
    /// Whether the file initializes a package rather than being a leaf module
    pub is_package_root: bool,
}

/// Package name → initializer record
pub type RootModuleMap = BTreeMap<String, ModuleRecord>;

/// Every module of a library, built once per run
#[derive(Debug, Clone)]
pub struct ModuleIndex {
    library: String,
    source_dir: PathBuf,
    records: Vec<ModuleRecord>,
    modules: BTreeMap<String, ModuleRecord>,
    packages: RootModuleMap,
    library_initializer: Option<ModuleRecord>,
}

impl ModuleIndex {
    /// Index `<source_dir>/<library>`
    pub fn build(source_dir: &Path, library: &str) -> GraftResult<Self> {
        let root = source_dir.join(library);
        if !root.is_dir() {
            return Err(GraftError::source_tree(
                &root,
                format!("library root '{}' is missing or not a directory", library),
            ));
        }
        let source_dir = source_dir.canonicalize().with_path(source_dir)?;
        let root = source_dir.join(library);

        let mut index = Self {
            library: library.to_string(),
            source_dir: source_dir.clone(),
            records: Vec::new(),
            modules: BTreeMap::new(),
            packages: RootModuleMap::new(),
            library_initializer: None,
        };

        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&root).to_path_buf();
                GraftError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SOURCE_EXTENSION) {
                continue;
            }
            let Ok(within_root) = path.strip_prefix(&root) else {
                continue;
            };
            index.insert(path, within_root)?;
        }

        debug!(
            library = %index.library,
            modules = index.modules.len(),
            packages = index.packages.len(),
            "Indexed source tree"
        );
        Ok(index)
    }

    fn insert(&mut self, path: &Path, within_root: &Path) -> GraftResult<()> {
        let Some(stem) = within_root
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.split('.').next())
        else {
            return Ok(());
        };

        let mut pieces: Vec<&str> = Vec::new();
        if let Some(parent) = within_root.parent() {
            for component in parent.components() {
                let Some(piece) = component.as_os_str().to_str() else {
                    return Err(GraftError::source_tree(
                        path,
                        "path is not valid UTF-8",
                    ));
                };
                pieces.push(piece);
            }
        }

        let is_package_root = stem == INITIALIZER_STEM;
        if !is_package_root {
            pieces.push(stem);
        }

        let record = ModuleRecord {
            name: join_mod(&pieces),
            path: path.to_path_buf(),
            relative_path: path
                .strip_prefix(&self.source_dir)
                .unwrap_or(path)
                .to_path_buf(),
            is_package_root,
        };

        if record.name.is_empty() {
            if is_package_root {
                self.library_initializer = Some(record);
            }
            return Ok(());
        }

        if is_package_root {
            self.packages.insert(record.name.clone(), record.clone());
        } else {
            self.modules.insert(record.name.clone(), record.clone());
        }
        self.records.push(record);
        Ok(())
    }

    /// Leaf module by dotted name
    pub fn module(&self, name: &str) -> Option<&ModuleRecord> {
        self.modules.get(name)
    }

    /// Package initializer by dotted name
    pub fn package(&self, name: &str) -> Option<&ModuleRecord> {
        self.packages.get(name)
    }

    /// Whether `name` is a leaf module or a package
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name) || self.packages.contains_key(name)
    }

    /// Every leaf and package record in walk order
    pub fn records(&self) -> &[ModuleRecord] {
        &self.records
    }

    pub fn root_modules(&self) -> &RootModuleMap {
        &self.packages
    }

    /// The `<library>/__init__.py` record, if the library root has one
    pub fn library_initializer(&self) -> Option<&ModuleRecord> {
        self.library_initializer.as_ref()
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    /// Canonical source directory the library root lives in
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }
}
