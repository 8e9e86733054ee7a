//! Dotted module-name utilities
//!
//! Module names are dotted paths (`engines.action_engine.engine`) relative to
//! a library root. These helpers keep the joining/splitting rules in one place
//! so the index, resolver and rewriter agree on them.

use std::path::PathBuf;

/// Join module pieces with `.`, skipping empty pieces
///
/// # Example
///
/// ```rust
/// use graft_foundation::module_name::join_mod;
///
/// assert_eq!(join_mod(["myproj", "taskflow", ""]), "myproj.taskflow");
/// assert_eq!(join_mod(["", "utils", "misc"]), "utils.misc");
/// assert_eq!(join_mod(Vec::<String>::new()), "");
/// ```
pub fn join_mod<I, S>(pieces: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for piece in pieces {
        let piece = piece.as_ref();
        if piece.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push('.');
        }
        joined.push_str(piece);
    }
    joined
}

/// Split dotted text into trimmed, non-empty segments
///
/// # Example
///
/// ```rust
/// use graft_foundation::module_name::split_mod;
///
/// assert_eq!(split_mod("openstack.common.utils"), vec!["openstack", "common", "utils"]);
/// assert_eq!(split_mod(" a . b .."), vec!["a", "b"]);
/// assert!(split_mod("").is_empty());
/// ```
pub fn split_mod(text: &str) -> Vec<&str> {
    text.split('.')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Whether `prefix` names `name` itself or one of its ancestors
///
/// Only whole segments count: `engines` is a dotted prefix of
/// `engines.base` but not of `enginesx`.
///
/// # Example
///
/// ```rust
/// use graft_foundation::module_name::is_dotted_prefix;
///
/// assert!(is_dotted_prefix("engines", "engines"));
/// assert!(is_dotted_prefix("engines", "engines.base"));
/// assert!(!is_dotted_prefix("engines", "enginesx"));
/// assert!(!is_dotted_prefix("", "engines"));
/// ```
pub fn is_dotted_prefix(prefix: &str, name: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    match name.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// Map a dotted module name onto a relative filesystem path (no extension)
pub fn mod_to_path(module: &str) -> PathBuf {
    split_mod(module).into_iter().collect()
}

/// Whether `name` is a non-empty dotted sequence of identifiers
pub fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) if first == '_' || first.is_ascii_alphabetic() => {
                    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
                }
                _ => false,
            }
        })
}
