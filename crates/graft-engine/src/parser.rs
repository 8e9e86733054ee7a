//! Import statement parser
//!
//! Recognizes the narrow import grammar the library uses for its own
//! modules:
//!
//! ```text
//! from <library>[.<prefix>] import <names>[ as <alias>][ #<comment>]
//! ```
//!
//! Every other line is reported as [`ParsedLine::NotAnImport`] and left
//! alone by callers.

use crate::constants::{
    root_marker_pattern, ALIAS_PATTERN, IMPORT_CLAUSE_PATTERN, RELATIVE_PREFIX_PATTERN,
};
use graft_foundation::module_name::{is_valid_module_name, join_mod};
use graft_foundation::GraftResult;
use regex::Regex;

/// Comment trailing an import, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailingComment {
    /// Whitespace between the statement and the `#`
    pub gap: String,
    /// Everything after the `#`
    pub text: String,
}

/// One parsed import line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// Leading indentation
    pub indent: String,
    /// Dotted sub-path between the library root and `import` (may be empty)
    pub prefix: String,
    /// Imported name list
    pub postfix: String,
    pub alias: Option<String>,
    pub comment: Option<TrailingComment>,
    /// The original line, without terminator
    pub raw: String,
}

impl ImportStatement {
    /// Prefix and postfix joined into one dotted reference
    pub fn importing(&self) -> String {
        join_mod([self.prefix.as_str(), self.postfix.as_str()])
    }

    /// Individual imported names (`a, b as c` → `a`, `b`)
    pub fn names(&self) -> Vec<&str> {
        self.postfix
            .trim_matches(|c| c == '(' || c == ')')
            .split(',')
            .filter_map(|piece| piece.split_whitespace().next())
            .collect()
    }

    /// Rebuild the statement so it imports from `module`
    ///
    /// Indentation, alias and comment are carried over unchanged.
    pub fn reform(&self, module: &str) -> String {
        let mut line = format!("{}from {} import {}", self.indent, module, self.postfix);
        if let Some(alias) = &self.alias {
            line.push_str(" as ");
            line.push_str(alias);
        }
        if let Some(comment) = &self.comment {
            line.push_str(&comment.gap);
            line.push('#');
            line.push_str(&comment.text);
        }
        line
    }
}

/// Outcome of parsing one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Matched(ImportStatement),
    NotAnImport,
    /// The line starts with `from <library>` but is not a well-formed import
    Malformed(String),
}

/// Parser for imports of one library
#[derive(Debug, Clone)]
pub struct ImportParser {
    library: String,
    root_marker: Regex,
}

impl ImportParser {
    pub fn new(library: &str) -> GraftResult<Self> {
        Ok(Self {
            library: library.to_string(),
            root_marker: root_marker_pattern(library)?,
        })
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    /// Parse a single line (without its terminator)
    pub fn parse_line(&self, line: &str) -> ParsedLine {
        let Some(captures) = self.root_marker.captures(line) else {
            return ParsedLine::NotAnImport;
        };
        let indent = captures.name("indent").map_or("", |m| m.as_str());
        let rest = captures.name("rest").map_or("", |m| m.as_str());

        let (body, comment) = match rest.split_once('#') {
            Some((body, text)) => {
                let statement = body.trim_end();
                let comment = TrailingComment {
                    gap: body[statement.len()..].to_string(),
                    text: text.to_string(),
                };
                (statement, Some(comment))
            }
            None => (rest.trim_end(), None),
        };

        let body = body.trim_start();
        if body.is_empty() {
            return self.malformed("nothing follows the library name");
        }

        let (prefix, clause) = if body.starts_with('.') {
            let Some(relative) = RELATIVE_PREFIX_PATTERN.captures(body) else {
                return self.malformed("expected 'import' after the module prefix");
            };
            let prefix = relative.name("prefix").map_or("", |m| m.as_str());
            if !prefix.is_empty() && !is_valid_module_name(prefix) {
                return self.malformed(&format!("invalid module prefix '.{}'", prefix));
            }
            let clause = relative.name("clause").map_or("", |m| m.as_str());
            (prefix, clause)
        } else {
            ("", body)
        };

        let Some(names) = IMPORT_CLAUSE_PATTERN
            .captures(clause)
            .and_then(|c| c.name("names"))
            .map(|m| m.as_str().trim())
        else {
            return self.malformed("expected 'import <names>'");
        };

        let (postfix, alias) = match ALIAS_PATTERN.captures(names) {
            Some(aliased) => (
                aliased.name("name").map_or("", |m| m.as_str().trim()),
                aliased.name("alias").map(|m| m.as_str().to_string()),
            ),
            None => (names, None),
        };

        if postfix.is_empty() {
            return self.malformed("no imported names");
        }
        if postfix.ends_with('\\') || postfix.matches('(').count() != postfix.matches(')').count()
        {
            return self.malformed("multi-line imports are not supported");
        }

        ParsedLine::Matched(ImportStatement {
            indent: indent.to_string(),
            prefix: prefix.to_string(),
            postfix: postfix.to_string(),
            alias,
            comment,
            raw: line.to_string(),
        })
    }

    fn malformed(&self, reason: &str) -> ParsedLine {
        ParsedLine::Malformed(format!("{} in 'from {}' import", reason, self.library))
    }
}
