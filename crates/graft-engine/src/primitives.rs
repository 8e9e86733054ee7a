//! Primitive requests
//!
//! A primitive is what a consumer asks for: `task`, `flow.linear_flow`,
//! `engines.action_engine`, `persistence.impl_memory`. Requests are
//! validated without touching the filesystem; expansion into concrete
//! module names happens against a [`ModuleIndex`].

use crate::index::ModuleIndex;
use graft_foundation::module_name::join_mod;
use graft_foundation::{GraftError, GraftResult, Location};
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::str::FromStr;

/// Categories a consumer may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveCategory {
    Decorators,
    Engines,
    Exceptions,
    Flow,
    Persistence,
    Storage,
    Task,
}

impl PrimitiveCategory {
    pub const ALL: [PrimitiveCategory; 7] = [
        Self::Decorators,
        Self::Engines,
        Self::Exceptions,
        Self::Flow,
        Self::Persistence,
        Self::Storage,
        Self::Task,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decorators => "decorators",
            Self::Engines => "engines",
            Self::Exceptions => "exceptions",
            Self::Flow => "flow",
            Self::Persistence => "persistence",
            Self::Storage => "storage",
            Self::Task => "task",
        }
    }

    fn allowed() -> String {
        Self::ALL
            .iter()
            .map(PrimitiveCategory::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PrimitiveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveCategory {
    type Err = GraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| {
                GraftError::invalid_request(format!(
                    "Unknown primitive '{}' ({} allowed)",
                    s,
                    Self::allowed()
                ))
            })
    }
}

/// Validated primitive request: category → sub-names, both in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimitiveRequest {
    entries: IndexMap<PrimitiveCategory, Vec<String>>,
}

impl PrimitiveRequest {
    /// Parse `category[.sub]` entries
    ///
    /// Blank entries are skipped. Unknown categories are all reported at
    /// once; an empty category or an empty request is rejected.
    ///
    /// # Example
    ///
    /// ```rust
    /// use graft_engine::primitives::{PrimitiveCategory, PrimitiveRequest};
    ///
    /// let request = PrimitiveRequest::parse(["flow.linear_flow", "task", ""]).unwrap();
    /// assert_eq!(request.sub_names(PrimitiveCategory::Flow), ["linear_flow"]);
    /// assert!(PrimitiveRequest::parse(["bogus.thing"]).is_err());
    /// ```
    pub fn parse<I, S>(items: I) -> GraftResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: IndexMap<PrimitiveCategory, Vec<String>> = IndexMap::new();
        let mut unknown: Vec<String> = Vec::new();

        for item in items {
            let item = item.as_ref().trim();
            if item.is_empty() {
                continue;
            }
            let (category, sub) = item.split_once('.').unwrap_or((item, ""));
            let (category, sub) = (category.trim(), sub.trim());
            if category.is_empty() {
                return Err(GraftError::invalid_request(format!(
                    "Primitive '{}' has no category",
                    item
                )));
            }

            let Ok(category) = category.parse::<PrimitiveCategory>() else {
                if !unknown.iter().any(|u| u == category) {
                    unknown.push(category.to_string());
                }
                continue;
            };

            let subs = entries.entry(category).or_default();
            if !sub.is_empty() && !subs.iter().any(|s| s == sub) {
                subs.push(sub.to_string());
            }
        }

        if !unknown.is_empty() {
            unknown.sort();
            return Err(GraftError::invalid_request(format!(
                "Unknown primitives ({}) are being copied ({} allowed)",
                unknown.join(", "),
                PrimitiveCategory::allowed()
            )));
        }
        if entries.is_empty() {
            return Err(GraftError::invalid_request("No primitives requested"));
        }

        Ok(Self { entries })
    }

    /// Requested categories, in request order
    pub fn categories(&self) -> impl Iterator<Item = PrimitiveCategory> + '_ {
        self.entries.keys().copied()
    }

    /// Whether `category` was requested, with or without sub-names
    pub fn contains(&self, category: PrimitiveCategory) -> bool {
        self.entries.contains_key(&category)
    }

    pub fn sub_names(&self, category: PrimitiveCategory) -> &[String] {
        self.entries
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Concrete module names needed for this request
    ///
    /// Flow patterns, engines and persistence backends pull in their shared
    /// support modules; every category but `flow` is also a module itself.
    pub fn expand(&self, index: &ModuleIndex) -> GraftResult<Vec<String>> {
        let mut expanded: IndexSet<String> = IndexSet::new();

        // A bare category still pulls in its support modules
        if self.contains(PrimitiveCategory::Flow) {
            expanded.insert("patterns".to_string());
            for pattern in self.sub_names(PrimitiveCategory::Flow) {
                expanded.insert(require_leaf(index, ["patterns", pattern.as_str()])?);
            }
        }

        if self.contains(PrimitiveCategory::Engines) {
            expanded.insert("engines".to_string());
            expanded.insert("engines.base".to_string());
            for engine in self.sub_names(PrimitiveCategory::Engines) {
                expanded.insert(join_mod(["engines", engine.as_str()]));
                expanded.insert(require_leaf(index, ["engines", engine.as_str(), "engine"])?);
            }
        }

        if self.contains(PrimitiveCategory::Persistence) {
            expanded.insert("persistence".to_string());
            expanded.insert("persistence.logbook".to_string());
            for backend in self.sub_names(PrimitiveCategory::Persistence) {
                expanded.insert(require_leaf(
                    index,
                    ["persistence", "backends", backend.as_str()],
                )?);
            }
        }

        for category in self.categories() {
            if category != PrimitiveCategory::Flow {
                expanded.insert(category.as_str().to_string());
            }
        }

        for module in &expanded {
            if !index.contains(module) {
                return Err(GraftError::module_not_found(
                    join_mod([index.library(), module.as_str()]),
                    Location::Unknown,
                ));
            }
        }

        Ok(expanded.into_iter().collect())
    }
}

fn require_leaf<'a>(
    index: &ModuleIndex,
    pieces: impl IntoIterator<Item = &'a str>,
) -> GraftResult<String> {
    let module = join_mod(pieces);
    if index.module(&module).is_none() {
        return Err(GraftError::module_not_found(
            join_mod([index.library(), module.as_str()]),
            Location::Unknown,
        ));
    }
    Ok(module)
}
