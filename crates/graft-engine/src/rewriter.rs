//! Import rewriting for copied files
//!
//! Every import of the library is pointed at `<base>.<library>`, or at the
//! consumer's own shared namespace when the imported module is one the
//! consumer already vendors.

use crate::constants::{topdir_pattern, GENERATED_HEADER};
use crate::index::ModuleIndex;
use crate::parser::{ImportParser, ImportStatement, ParsedLine};
use crate::resolver::ModuleResolver;
use graft_foundation::module_name::{join_mod, split_mod};
use graft_foundation::{GraftError, GraftResult, Location};
use regex::{NoExpand, Regex};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub struct ImportRewriter<'a> {
    parser: &'a ImportParser,
    resolver: ModuleResolver<'a>,
    base: String,
    library: String,
    shared_namespace: String,
    shared: &'a BTreeMap<String, String>,
    topdir: Regex,
    topdir_replacement: String,
}

impl<'a> ImportRewriter<'a> {
    /// `shared` maps library modules to the consumer modules replacing them
    pub fn new(
        parser: &'a ImportParser,
        index: &'a ModuleIndex,
        base: &str,
        shared_namespace: &str,
        shared: &'a BTreeMap<String, String>,
    ) -> GraftResult<Self> {
        Ok(Self {
            parser,
            resolver: ModuleResolver::new(index),
            base: base.to_string(),
            library: index.library().to_string(),
            shared_namespace: shared_namespace.to_string(),
            shared,
            topdir: topdir_pattern(index.library())?,
            topdir_replacement: format!(r#"possible_topdir, "{}","#, base),
        })
    }

    /// Produce the destination content for `source`
    ///
    /// `file` is only used for diagnostics. Line numbers in errors refer to
    /// the source file. Line terminators are preserved.
    pub fn rewrite(&self, source: &str, file: &Path) -> GraftResult<String> {
        let mut output = String::with_capacity(GENERATED_HEADER.len() + source.len());
        output.push_str(GENERATED_HEADER);

        for (idx, chunk) in source.split_inclusive('\n').enumerate() {
            let (line, terminator) = split_terminator(chunk);
            let location = || Location::line(file, idx + 1, line);

            let rewritten = match self.parser.parse_line(line) {
                ParsedLine::NotAnImport => line.to_string(),
                ParsedLine::Malformed(reason) => {
                    return Err(GraftError::malformed_import(reason, location()));
                }
                ParsedLine::Matched(statement) => {
                    let module = self.target_module(&statement, &location())?;
                    let reformed = statement.reform(&module);
                    if reformed != line {
                        debug!(
                            file = %file.display(),
                            line = idx + 1,
                            from = %line.trim(),
                            to = %reformed.trim(),
                            "Rewrote import"
                        );
                    }
                    reformed
                }
            };

            let rewritten = self
                .topdir
                .replace(&rewritten, NoExpand(&self.topdir_replacement));
            output.push_str(&rewritten);
            output.push_str(terminator);
        }

        Ok(output)
    }

    /// Module a statement should import from after the copy
    pub fn target_module(
        &self,
        statement: &ImportStatement,
        location: &Location,
    ) -> GraftResult<String> {
        let targets = self.resolver.resolve_statement(statement, location)?;
        let shared_targets = targets
            .iter()
            .filter(|t| self.shared.contains_key(t.as_str()))
            .count();

        let is_shared = self.shared.contains_key(&statement.importing())
            || shared_targets == targets.len();
        if !is_shared && shared_targets > 0 {
            return Err(GraftError::malformed_import(
                format!(
                    "imports both modules from '{}.{}' and modules being copied",
                    self.base, self.shared_namespace
                ),
                location.clone(),
            ));
        }

        if is_shared {
            let skip = split_mod(&self.shared_namespace).len();
            let mut pieces = vec![self.base.as_str(), self.shared_namespace.as_str()];
            pieces.extend(split_mod(&statement.prefix).into_iter().skip(skip));
            Ok(join_mod(pieces))
        } else {
            Ok(join_mod([
                self.base.as_str(),
                self.library.as_str(),
                statement.prefix.as_str(),
            ]))
        }
    }
}

/// Split a line from its `\n` or `\r\n` terminator
fn split_terminator(chunk: &str) -> (&str, &str) {
    if let Some(line) = chunk.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = chunk.strip_suffix('\n') {
        (line, "\n")
    } else {
        (chunk, "")
    }
}
