//! Single-pass line classification of an annotated SQL source.
//!
//! The scanner produces a tagged line list; downstream consumers (method and
//! auth extraction, catalog building, body assembly) read the list instead of
//! re-scanning the text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Directive names the scanner recognizes. A comment line carrying any other
/// `@name` is not a directive; it stays in the body as an inert comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Param,
    Method,
    Auth,
    CountQuery,
}

impl DirectiveKind {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "param" => Some(DirectiveKind::Param),
            "method" => Some(DirectiveKind::Method),
            "auth" => Some(DirectiveKind::Auth),
            "countquery" => Some(DirectiveKind::CountQuery),
            _ => None,
        }
    }
}

/// One classified source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLine {
    /// A recognized `-- @<name> <args>` directive comment.
    Directive { kind: DirectiveKind, args: String },

    /// A `DECLARE @...` line, excluded from the body but feeding the catalog.
    Declare(String),

    /// A line diverted into the count-query buffer.
    CountBlock(String),

    /// Everything else: the main query body.
    Body(String),
}

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^--\s*@([A-Za-z]+)\s*(.*)$")
        .unwrap_or_else(|e| panic!("Internal error: invalid directive pattern: {}", e))
});

static DECLARE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*DECLARE\b")
        .unwrap_or_else(|e| panic!("Internal error: invalid declare pattern: {}", e))
});

/// Classify every line of a source text in one pass.
///
/// Directive recognition runs ahead of count-block diversion, so a recognized
/// directive appearing after `@countQuery` is still honored rather than
/// buffered. The count block ends with the first diverted line containing a
/// `;` (that line included).
pub fn classify(content: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut in_count = false;

    for line in content.lines() {
        if let Some(caps) = DIRECTIVE_RE.captures(line.trim()) {
            if let Some(kind) = DirectiveKind::from_name(&caps[1]) {
                if kind == DirectiveKind::CountQuery {
                    in_count = true;
                }
                lines.push(SourceLine::Directive {
                    kind,
                    args: caps[2].trim().to_string(),
                });
                continue;
            }
        }

        if in_count {
            if line.contains(';') {
                in_count = false;
            }
            lines.push(SourceLine::CountBlock(line.to_string()));
            continue;
        }

        if DECLARE_RE.is_match(line) {
            lines.push(SourceLine::Declare(line.to_string()));
            continue;
        }

        lines.push(SourceLine::Body(line.to_string()));
    }

    lines
}
