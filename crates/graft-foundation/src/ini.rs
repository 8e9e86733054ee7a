//! INI document model
//!
//! A minimal, formatting-preserving model of the INI dialect used by
//! `setup.cfg` and `.conf` files: `[section]` headers, `key = value` (or
//! `key: value`) options, indented continuation lines, `#`/`;` comments.
//!
//! Lines the model does not touch are written back verbatim, so editing a
//! single option produces a minimal diff.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    /// Blank line, comment, or anything unrecognized
    Raw(String),
    /// An option: its key and every raw line it spans (first line included)
    Option { key: String, lines: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    header: String,
    entries: Vec<Entry>,
}

/// A parsed INI document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    preamble: Vec<String>,
    sections: Vec<Section>,
}

impl IniDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse INI text; never fails, unknown lines are kept verbatim
    pub fn parse(text: &str) -> Self {
        let mut doc = Self::default();

        for line in text.lines() {
            let trimmed = line.trim();

            if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() >= 2 {
                doc.sections.push(Section {
                    name: trimmed[1..trimmed.len() - 1].trim().to_string(),
                    header: line.to_string(),
                    entries: Vec::new(),
                });
                continue;
            }

            let Some(section) = doc.sections.last_mut() else {
                doc.preamble.push(line.to_string());
                continue;
            };

            let continues_option = line.starts_with(char::is_whitespace)
                && !trimmed.is_empty()
                && matches!(section.entries.last(), Some(Entry::Option { .. }));
            if continues_option {
                if let Some(Entry::Option { lines, .. }) = section.entries.last_mut() {
                    lines.push(line.to_string());
                }
                continue;
            }

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                section.entries.push(Entry::Raw(line.to_string()));
                continue;
            }

            match split_key(line) {
                Some((key, _)) => section.entries.push(Entry::Option {
                    key: key.to_string(),
                    lines: vec![line.to_string()],
                }),
                None => section.entries.push(Entry::Raw(line.to_string())),
            }
        }

        doc
    }

    /// Names of all sections in document order
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.section(section).is_some()
    }

    /// Value lines of an option
    ///
    /// The text after the separator is the first line (dropped when empty),
    /// continuation lines follow with their indentation trimmed.
    pub fn values(&self, section: &str, key: &str) -> Option<Vec<String>> {
        let lines = self.option_lines(section, key)?;
        let mut values = Vec::with_capacity(lines.len());

        if let Some((_, first)) = lines.first().and_then(|l| split_key(l)) {
            let first = first.trim();
            if !first.is_empty() {
                values.push(first.to_string());
            }
        }
        values.extend(lines.iter().skip(1).map(|l| l.trim().to_string()));
        Some(values)
    }

    /// Single-string value of an option (continuation lines joined by `\n`)
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.values(section, key).map(|values| values.join("\n"))
    }

    /// Set an option, replacing it in place or appending it to the section
    ///
    /// The section is created at the end of the document when missing. A
    /// single value renders as `key = value`, several values render one per
    /// indented continuation line.
    pub fn set(&mut self, section: &str, key: &str, values: &[String]) {
        self.set_rendered(section, key, render_option(key, values));
    }

    /// Like [`IniDocument::set`], but always uses continuation lines
    ///
    /// This is the layout `setup.cfg` uses for entry point groups.
    pub fn set_list(&mut self, section: &str, key: &str, values: &[String]) {
        self.set_rendered(section, key, render_list(key, values));
    }

    fn set_rendered(&mut self, section: &str, key: &str, rendered: Vec<String>) {

        if !self.has_section(section) {
            let needs_gap = !self.sections.is_empty()
                || self.preamble.iter().any(|l| !l.trim().is_empty());
            if needs_gap {
                self.push_trailing_blank();
            }
            self.sections.push(Section {
                name: section.to_string(),
                header: format!("[{}]", section),
                entries: Vec::new(),
            });
        }

        let Some(target) = self.sections.iter_mut().find(|s| s.name == section) else {
            return;
        };

        for entry in target.entries.iter_mut() {
            if let Entry::Option { key: existing, lines } = entry {
                if existing == key {
                    *lines = rendered;
                    return;
                }
            }
        }

        // Keep trailing blank lines after the new option so sections stay separated
        let insert_at = target
            .entries
            .iter()
            .rposition(|e| !matches!(e, Entry::Raw(l) if l.trim().is_empty()))
            .map_or(0, |idx| idx + 1);
        target.entries.insert(
            insert_at,
            Entry::Option {
                key: key.to_string(),
                lines: rendered,
            },
        );
    }

    /// Remove an option; returns whether it existed
    pub fn remove(&mut self, section: &str, key: &str) -> bool {
        let Some(target) = self.sections.iter_mut().find(|s| s.name == section) else {
            return false;
        };
        let before = target.entries.len();
        target
            .entries
            .retain(|e| !matches!(e, Entry::Option { key: existing, .. } if existing == key));
        before != target.entries.len()
    }

    fn section(&self, section: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == section)
    }

    fn option_lines(&self, section: &str, key: &str) -> Option<&[String]> {
        self.section(section)?
            .entries
            .iter()
            .find_map(|entry| match entry {
                Entry::Option {
                    key: existing,
                    lines,
                } if existing == key => Some(lines.as_slice()),
                _ => None,
            })
    }

    fn push_trailing_blank(&mut self) {
        let ends_blank = match self.sections.last() {
            Some(last) => matches!(last.entries.last(), Some(Entry::Raw(l)) if l.trim().is_empty()),
            None => matches!(self.preamble.last(), Some(l) if l.trim().is_empty()),
        };
        if ends_blank {
            return;
        }
        match self.sections.last_mut() {
            Some(last) => last.entries.push(Entry::Raw(String::new())),
            None => self.preamble.push(String::new()),
        }
    }
}

impl fmt::Display for IniDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.preamble {
            writeln!(f, "{}", line)?;
        }
        for section in &self.sections {
            writeln!(f, "{}", section.header)?;
            for entry in &section.entries {
                match entry {
                    Entry::Raw(line) => writeln!(f, "{}", line)?,
                    Entry::Option { lines, .. } => {
                        for line in lines {
                            writeln!(f, "{}", line)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Split `key = value` / `key: value` at whichever separator comes first
fn split_key(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(['=', ':'])?;
    let key = line[..idx].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, &line[idx + 1..]))
}

fn render_option(key: &str, values: &[String]) -> Vec<String> {
    match values {
        [] => vec![format!("{} =", key)],
        [single] => vec![format!("{} = {}", key, single)],
        many => render_list(key, many),
    }
}

fn render_list(key: &str, values: &[String]) -> Vec<String> {
    let mut lines = vec![format!("{} =", key)];
    lines.extend(values.iter().map(|v| {
        if v.is_empty() {
            String::new()
        } else {
            format!("    {}", v)
        }
    }));
    lines
}
