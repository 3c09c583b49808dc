/*!
# Legacy Alias Rewriting

Renames deprecated identifiers inside converted definitions and collects the
imports the new names need. The table comes from `convert.config.json`:

```json
[
  { "old_name": "NGS.Dialog", "name": "Dialog", "path": "ngs/util/Dialog" }
]
```

All entries are matched in one combined pass, so text produced by one
replacement is never rescanned by another entry.
*/

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// One rename: `old_name` becomes `name`, imported from module `path`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub old_name: String,
    pub name: String,
    pub path: String,
}

/// Ordered, read-only rename table shared by every unit of a run
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
    matcher: Option<Regex>,
    /// First entry index for every distinct old name
    slots: HashMap<String, usize>,
}

impl AliasTable {
    pub fn new(entries: Vec<AliasEntry>) -> Result<Self, ConfigError> {
        let mut slots = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            if entry.old_name.is_empty() {
                warn!(name = %entry.name, "ignoring alias entry with an empty old_name");
                continue;
            }
            if slots.contains_key(&entry.old_name) {
                warn!(old_name = %entry.old_name, "duplicate alias entry, the first one is used");
                continue;
            }
            slots.insert(entry.old_name.clone(), idx);
        }

        // Longer names first so the alternation prefers them at the same position
        let mut names: Vec<&str> = slots.keys().map(String::as_str).collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let matcher = if names.is_empty() {
            None
        } else {
            let pattern = names
                .iter()
                .map(|name| regex::escape(name))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&pattern)?)
        };

        Ok(Self {
            entries,
            matcher,
            slots,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table from a JSON file; a missing file yields an empty table
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no alias table, alias rewriting disabled");
                return Ok(Self::empty());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let entries: Vec<AliasEntry> =
            serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), entries = entries.len(), "loaded alias table");
        Self::new(entries)
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_none()
    }

    /// Start rewriting one unit
    pub fn rewriter(&self) -> AliasRewriter<'_> {
        AliasRewriter {
            table: self,
            matched: vec![false; self.entries.len()],
        }
    }
}

/// Rewrites the texts of one unit and remembers which entries fired
pub struct AliasRewriter<'a> {
    table: &'a AliasTable,
    matched: Vec<bool>,
}

impl<'a> AliasRewriter<'a> {
    pub fn rewrite(&mut self, text: &str) -> String {
        let Some(matcher) = &self.table.matcher else {
            return text.to_string();
        };
        let table = self.table;
        let matched = &mut self.matched;
        matcher
            .replace_all(text, |caps: &Captures<'_>| {
                let slot = table.slots[&caps[0]];
                matched[slot] = true;
                table.entries[slot].name.clone()
            })
            .into_owned()
    }

    /// Entries that fired, in table order, without repeating a new name
    pub fn into_imports(self) -> Vec<&'a AliasEntry> {
        let mut seen = Vec::new();
        let mut imports = Vec::new();
        for (entry, matched) in self.table.entries.iter().zip(self.matched) {
            if matched && !seen.contains(&entry.name.as_str()) {
                seen.push(entry.name.as_str());
                imports.push(entry);
            }
        }
        imports
    }
}
