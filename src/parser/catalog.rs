//! Parameter catalog construction.
//!
//! Three sources merge into one ordered name → metadata mapping, earlier
//! sources winning on name conflicts: explicit `-- @param` directives, then
//! `DECLARE` statements, then bare `@name` / `:name` placeholder references.

use crate::params::{ParamMeta, ParamType};
use once_cell::sync::Lazy;
use regex::Regex;

static PARAM_DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*--\s*@param\s+(\w+)(?:\s*:\s*(\w+))?(?:\s*=\s*(.+))?$")
        .unwrap_or_else(|e| panic!("Internal error: invalid param directive pattern: {}", e))
});

static DECLARE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*DECLARE\s+@(\w+)\s+([^=;]+)(?:\s*=\s*([^;]+))?")
        .unwrap_or_else(|e| panic!("Internal error: invalid declare pattern: {}", e))
});

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[@:](\w+)")
        .unwrap_or_else(|e| panic!("Internal error: invalid placeholder pattern: {}", e))
});

/// Ordered name → metadata mapping for one query text.
///
/// Iteration order is first-seen order across the three build passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamCatalog {
    entries: Vec<ParamMeta>,
}

impl ParamCatalog {
    /// Get metadata by parameter name.
    pub fn get(&self, name: &str) -> Option<&ParamMeta> {
        self.entries.iter().find(|m| m.name == name)
    }

    /// Whether a parameter with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate entries in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, ParamMeta> {
        self.entries.iter()
    }

    /// Parameter names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|m| m.name.as_str())
    }

    /// Number of cataloged parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace an existing entry in place, or append. A repeated `@param`
    /// directive keeps its first position but takes the latest metadata.
    fn upsert(&mut self, meta: ParamMeta) {
        match self.entries.iter_mut().find(|m| m.name == meta.name) {
            Some(existing) => *existing = meta,
            None => self.entries.push(meta),
        }
    }

    /// Append unless the name is already present.
    fn insert_if_absent(&mut self, meta: ParamMeta) {
        if !self.contains(&meta.name) {
            self.entries.push(meta);
        }
    }
}

/// Build the catalog for one source text.
///
/// Never fails: lines that match none of the patterns simply do not
/// contribute.
pub fn build(content: &str) -> ParamCatalog {
    let mut catalog = ParamCatalog::default();

    // Pass 1: explicit directives.
    for line in content.lines() {
        if let Some(caps) = PARAM_DIRECTIVE_RE.captures(line) {
            catalog.upsert(ParamMeta {
                name: caps[1].to_string(),
                ty: caps
                    .get(2)
                    .and_then(|m| ParamType::from_directive(m.as_str())),
                default: caps.get(3).map(|m| m.as_str().trim().to_string()),
            });
        }
    }

    // Pass 2: DECLARE statements, with type inference from the SQL type.
    for line in content.lines() {
        if let Some(caps) = DECLARE_RE.captures(line) {
            catalog.insert_if_absent(ParamMeta {
                name: caps[1].to_string(),
                ty: ParamType::from_sql_type(&caps[2]),
                default: caps.get(3).map(|m| m.as_str().trim().to_string()),
            });
        }
    }

    // Pass 3: bare placeholders, with line comments stripped so directive
    // comments do not register phantom parameters.
    let stripped: Vec<&str> = content.lines().map(strip_line_comment).collect();
    for caps in PLACEHOLDER_RE.captures_iter(&stripped.join("\n")) {
        catalog.insert_if_absent(ParamMeta::untyped(&caps[1]));
    }

    catalog
}

fn strip_line_comment(line: &str) -> &str {
    match line.find("--") {
        Some(idx) => &line[..idx],
        None => line,
    }
}
