//! Entry point adjustment
//!
//! Engines and persistence backends are discovered through entry point
//! groups named after the library. Once copied they must be registered under
//! the consumer's namespace: the namespace variables in the copied sources are
//! rewritten and the library's `[entry_points]` groups are merged into the
//! consumer's `setup.cfg`.

use crate::constants::{assignment_pattern, ENTRY_POINTS_SECTION, SETUP_CFG};
use crate::index::ModuleIndex;
use crate::store::FileStore;
use graft_foundation::module_name::{is_dotted_prefix, join_mod, mod_to_path};
use graft_foundation::{GraftError, GraftResult, IniDocument, Location};
use regex::Captures;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A copied module whose presence requires an entry point adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrypointRule {
    /// Copied module (or module prefix) triggering the rule
    pub trigger: &'static str,
    /// Module assigning the namespace variable
    pub target: &'static str,
    /// Variable holding the entry point namespace
    pub variable: &'static str,
    /// Entry point group, relative to the library name
    pub group: &'static str,
}

impl EntrypointRule {
    /// Group name used by the library (`taskflow.engines`)
    pub fn source_group(&self, library: &str) -> String {
        join_mod([library, self.group])
    }

    /// Group name used once copied (`myproj.taskflow.engines`)
    pub fn relocated_group(&self, base: &str, library: &str) -> String {
        join_mod([base, library, self.group])
    }
}

pub const ENTRYPOINT_RULES: &[EntrypointRule] = &[
    EntrypointRule {
        trigger: "engines",
        target: "engines.helpers",
        variable: "ENGINES_NAMESPACE",
        group: "engines",
    },
    EntrypointRule {
        trigger: "engines.helpers",
        target: "engines.helpers",
        variable: "ENGINES_NAMESPACE",
        group: "engines",
    },
    EntrypointRule {
        trigger: "persistence.backends",
        target: "persistence.backends",
        variable: "BACKEND_NAMESPACE",
        group: "persistence",
    },
];

/// What an adjustment touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrypointReport {
    /// Relocated entry point groups, sorted
    pub groups: Vec<String>,
    /// Copied files whose namespace variable was rewritten
    pub adjusted: Vec<PathBuf>,
    /// The consumer manifest, when it was created or changed
    pub manifest: Option<PathBuf>,
    /// Whether the consumer manifest existed beforehand
    pub manifest_existed: bool,
}

pub struct EntrypointAdjuster<'a> {
    store: &'a dyn FileStore,
    index: &'a ModuleIndex,
    dest_dir: &'a Path,
    base: &'a str,
}

impl<'a> EntrypointAdjuster<'a> {
    pub fn new(
        store: &'a dyn FileStore,
        index: &'a ModuleIndex,
        dest_dir: &'a Path,
        base: &'a str,
    ) -> Self {
        Self {
            store,
            index,
            dest_dir,
            base,
        }
    }

    /// Adjust entry points for the copied `modules`
    pub fn adjust(&self, modules: &[String]) -> GraftResult<EntrypointReport> {
        let mut report = EntrypointReport::default();
        let library = self.index.library();

        let mut needed: Vec<&EntrypointRule> = ENTRYPOINT_RULES
            .iter()
            .filter(|rule| modules.iter().any(|m| is_dotted_prefix(rule.trigger, m)))
            .collect();
        if needed.is_empty() {
            return Ok(report);
        }
        needed.sort_by_key(|rule| rule.trigger);

        info!(
            rules = needed.len(),
            "Adjusting entry point referencing modules"
        );

        let mut applied: Vec<&EntrypointRule> = Vec::new();
        for rule in needed {
            if applied.iter().any(|done| done.target == rule.target) {
                continue;
            }
            let path = self.target_file(rule.target)?;
            let value = rule.relocated_group(self.base, library);
            if self.set_namespace(&path, rule.variable, &value)? {
                report.adjusted.push(path);
            }
            applied.push(rule);
        }

        applied.sort_by_key(|rule| rule.group);
        report.groups = applied
            .iter()
            .map(|rule| rule.relocated_group(self.base, library))
            .collect();

        let manifest = self.dest_dir.join(SETUP_CFG);
        report.manifest_existed = self.store.exists(&manifest);
        if self.merge_manifest(&manifest, &applied, modules)? {
            report.manifest = Some(manifest.clone());
        }
        warn_entrypoints(&manifest, report.manifest_existed);

        Ok(report)
    }

    /// Destination file defining `target`
    fn target_file(&self, target: &str) -> GraftResult<PathBuf> {
        let record = self
            .index
            .package(target)
            .or_else(|| self.index.module(target))
            .ok_or_else(|| {
                GraftError::module_not_found(
                    join_mod([self.index.library(), target]),
                    Location::Unknown,
                )
            })?;
        let path = self
            .dest_dir
            .join(mod_to_path(self.base))
            .join(&record.relative_path);
        if !self.store.exists(&path) {
            return Err(GraftError::module_not_found(
                join_mod([self.base, self.index.library(), target]),
                Location::Unknown,
            ));
        }
        Ok(path)
    }

    /// Point `variable` at `value`; returns whether the file changed
    fn set_namespace(&self, path: &Path, variable: &str, value: &str) -> GraftResult<bool> {
        let pattern = assignment_pattern(variable)?;
        let content = self.store.read_to_string(path)?;
        // `$` in the value stays literal
        let updated = pattern.replace_all(&content, |caps: &Captures| {
            format!("{}{} = '{}'", &caps["indent"], variable, value)
        });
        if updated == content {
            return Ok(false);
        }
        debug!(
            path = %path.display(),
            variable,
            value,
            "Adjusted entry point namespace"
        );
        self.store.write_file(path, &updated)?;
        Ok(true)
    }

    /// Merge the library's entry point groups into the consumer manifest;
    /// returns whether the manifest was written
    fn merge_manifest(
        &self,
        manifest: &Path,
        rules: &[&EntrypointRule],
        modules: &[String],
    ) -> GraftResult<bool> {
        let library = self.index.library();
        let source_manifest = self.index.source_dir().join(SETUP_CFG);
        if !self.store.exists(&source_manifest) {
            return Err(GraftError::manifest(
                &source_manifest,
                "library manifest not found",
            ));
        }
        let source = IniDocument::parse(&self.store.read_to_string(&source_manifest)?);

        let original = if self.store.exists(manifest) {
            Some(self.store.read_to_string(manifest)?)
        } else {
            None
        };
        let mut doc = IniDocument::parse(original.as_deref().unwrap_or(""));

        for rule in rules {
            let group = rule.source_group(library);
            let relocated = rule.relocated_group(self.base, library);
            let lines = source
                .values(ENTRY_POINTS_SECTION, &group)
                .ok_or_else(|| {
                    GraftError::manifest(
                        &source_manifest,
                        format!("no '{}' group in [{}]", group, ENTRY_POINTS_SECTION),
                    )
                })?;

            let entries: Vec<String> = lines
                .iter()
                .filter(|line| take_entrypoint_line(line, library, modules))
                .map(|line| relocate_entrypoint_line(line, library, self.base))
                .collect();
            for entry in &entries {
                debug!(group = %relocated, entry = %entry, "Registered entry point");
            }
            doc.set_list(ENTRY_POINTS_SECTION, &relocated, &entries);
        }

        let rendered = doc.to_string();
        if original.as_deref() == Some(rendered.as_str()) {
            return Ok(false);
        }
        self.store.write_file(manifest, &rendered)?;
        Ok(true)
    }
}

/// Whether a library entry point line should be carried over
///
/// Blank lines, comments and unparseable lines are kept; registrations are
/// kept only when their module is (a prefix of) something copied.
pub fn take_entrypoint_line(line: &str, library: &str, modules: &[String]) -> bool {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return true;
    }
    let Some((_name, target)) = line.split_once('=') else {
        return true;
    };
    let module = target.split(':').next().unwrap_or("").trim();
    let module = module
        .strip_prefix(library)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(module);
    if module.is_empty() {
        return false;
    }
    modules.iter().any(|m| is_dotted_prefix(module, m))
}

/// Point a registration at the relocated module (`name = base.library.x:Y`)
fn relocate_entrypoint_line(line: &str, library: &str, base: &str) -> String {
    let Some((name, target)) = line.split_once('=') else {
        return line.to_string();
    };
    let trimmed = target.trim_start();
    let lead = &target[..target.len() - trimmed.len()];
    let module = trimmed.split(':').next().unwrap_or("");
    if is_dotted_prefix(library, module.trim()) {
        format!("{}={}{}.{}", name, lead, base, trimmed)
    } else {
        line.to_string()
    }
}

fn warn_entrypoints(manifest: &Path, existed: bool) {
    let action = if existed { "updated" } else { "created" };
    warn!(
        manifest = %manifest.display(),
        "Please install stevedore [https://pypi.org/project/stevedore/] so that \
         entry points can be loaded. The setup.cfg required to discover them was {} \
         and needs pbr [https://pypi.org/project/pbr/] or setuptools to be read.",
        action
    );
}
