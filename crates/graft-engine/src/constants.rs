//! Constants and regex patterns for the engine
//!
//! File-layout conventions of the source library, the machine-generated
//! marker, and the patterns making up the supported import grammar.

use graft_foundation::{GraftError, GraftResult};
use once_cell::sync::Lazy;
use regex::Regex;

// === Source Layout ===

/// Extension of source files
pub const SOURCE_EXTENSION: &str = "py";

/// File stem of a package initializer
pub const INITIALIZER_STEM: &str = "__init__";

/// File name of a package initializer
pub const INITIALIZER_FILE: &str = "__init__.py";

// === Generated Output ===

/// Lines prepended to every copied file
pub const MACHINE_GENERATED: [&str; 2] = [
    "# DO NOT EDIT THIS FILE BY HAND -- YOUR CHANGES WILL BE OVERWRITTEN",
    "",
];

/// [`MACHINE_GENERATED`] as file content; also the whole content of placeholder initializers
pub const GENERATED_HEADER: &str =
    "# DO NOT EDIT THIS FILE BY HAND -- YOUR CHANGES WILL BE OVERWRITTEN\n\n";

// === Packaging Metadata ===

/// Packaging manifest holding entry point registrations
pub const SETUP_CFG: &str = "setup.cfg";

/// Manifest section listing entry point groups
pub const ENTRY_POINTS_SECTION: &str = "entry_points";

// === Regex Patterns ===

/// The `import <names>` clause of a from-import
///
/// Matches: `import misc`, `import reflection as refl`
pub static IMPORT_CLAUSE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^import\s+(?P<names>.+)$").expect("Import clause regex pattern should be valid")
});

/// A trailing ` as <alias>` on the imported names
///
/// Matches: `reflection as refl`
pub static ALIAS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>.+?)\s+as\s+(?P<alias>\S+)$").expect("Alias regex pattern should be valid")
});

/// The dotted sub-path between the library root and `import`
///
/// Matches: `.utils import misc`, `.openstack.common import uuidutils`
pub static RELATIVE_PREFIX_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\.(?P<prefix>\S*)\s+(?P<clause>import\b.*)$")
        .expect("Relative prefix regex pattern should be valid")
});

// === Pattern Builders ===

/// Pattern recognizing `from <library>` at the start of a line
///
/// The library name must be followed by `.`, whitespace or the end of the
/// line, so `from taskflowx import y` is not an import of `taskflow`.
pub(crate) fn root_marker_pattern(library: &str) -> GraftResult<Regex> {
    let pattern = format!(
        r"^(?P<indent>\s*)from\s+{}(?P<rest>[.\s].*)?$",
        regex::escape(library)
    );
    Regex::new(&pattern).map_err(|e| {
        GraftError::config(format!("Invalid library name '{}': {}", library, e))
    })
}

/// Pattern of the top-directory literal that scripts use to locate the library
pub(crate) fn topdir_pattern(library: &str) -> GraftResult<Regex> {
    let pattern = format!(r#"possible_topdir, "{}",$"#, regex::escape(library));
    Regex::new(&pattern).map_err(|e| {
        GraftError::config(format!("Invalid library name '{}': {}", library, e))
    })
}

/// Pattern of a namespace variable assignment (`ENGINES_NAMESPACE = ...`)
pub(crate) fn assignment_pattern(variable: &str) -> GraftResult<Regex> {
    let pattern = format!(
        r"(?m)^(?P<indent>[ \t]*){}[ \t]*=[^\r\n]*",
        regex::escape(variable)
    );
    Regex::new(&pattern).map_err(|e| {
        GraftError::config(format!("Invalid entry point variable '{}': {}", variable, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_header_matches_marker_lines() {
        let joined: String = MACHINE_GENERATED.iter().map(|l| format!("{}\n", l)).collect();
        assert_eq!(joined, GENERATED_HEADER);
    }

    #[test]
    fn test_root_marker_requires_word_boundary() {
        let re = root_marker_pattern("taskflow").unwrap();
        assert!(re.is_match("from taskflow import task"));
        assert!(re.is_match("    from taskflow.utils import misc"));
        assert!(re.is_match("from taskflow"));
        assert!(!re.is_match("from taskflowx import y"));
        assert!(!re.is_match("import taskflow"));
    }

    #[test]
    fn test_topdir_pattern_is_anchored_at_line_end() {
        let re = topdir_pattern("taskflow").unwrap();
        assert!(re.is_match(r#"os.path.join(possible_topdir, "taskflow","#));
        assert!(!re.is_match(r#"os.path.join(possible_topdir, "taskflow", "x")"#));
    }

    #[test]
    fn test_assignment_pattern() {
        let re = assignment_pattern("ENGINES_NAMESPACE").unwrap();
        assert!(re.is_match("ENGINES_NAMESPACE = 'taskflow.engines'"));
        assert!(re.is_match("x = 1\n    ENGINES_NAMESPACE='a'\n"));
        assert!(!re.is_match("OTHER_ENGINES_NAMESPACE = 'a'"));
    }
}
