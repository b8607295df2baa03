//! Directive and statement extraction for annotated SQL sources.
//!
//! A source text is parsed exactly once into a [`ParsedQuery`]; every request
//! against that source reuses the result. The grammar is line-oriented:
//!
//! ```text
//! -- @param <name>[: <type>][= <default>]
//! -- @method <GET|POST>
//! -- @auth [basic|bearer <tok1>,<tok2>,...]
//! -- @countQuery
//! DECLARE @<name> <sqlType> [= <default>]
//! ```
//!
//! Parsing is lenient and never fails: unrecognized directive comments stay
//! in the body as inert comments, and malformed arguments fall back to
//! defaults.

mod catalog;
mod scan;

pub use catalog::ParamCatalog;
pub use scan::{classify, DirectiveKind, SourceLine};

use crate::auth::AuthRequirement;
use crate::request::HttpMethod;
use tracing::debug;

/// A query source parsed once and reused for every request against it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    /// Ordered parameter catalog.
    pub params: ParamCatalog,

    /// HTTP method the endpoint answers to.
    pub method: HttpMethod,

    /// Authentication the endpoint demands.
    pub auth: AuthRequirement,

    /// First semicolon-terminated statement of the main body.
    pub sql: String,

    /// Held-out count query, when a `@countQuery` block is present.
    pub count_query: Option<String>,
}

/// Parse an annotated SQL text into a [`ParsedQuery`].
pub fn parse(content: &str) -> ParsedQuery {
    let params = catalog::build(content);

    let mut method = HttpMethod::Get;
    let mut auth = AuthRequirement::Anonymous;
    let mut body_lines: Vec<&str> = Vec::new();
    let mut count_lines: Vec<&str> = Vec::new();

    let lines = scan::classify(content);
    for line in &lines {
        match line {
            SourceLine::Directive {
                kind: DirectiveKind::Method,
                args,
            } => {
                method = if args.eq_ignore_ascii_case("POST") {
                    HttpMethod::Post
                } else {
                    HttpMethod::Get
                };
            }
            SourceLine::Directive {
                kind: DirectiveKind::Auth,
                args,
            } => {
                auth = AuthRequirement::from_directive(args);
            }
            // @param lines feed the catalog; @countQuery only switches the
            // scanner state. Neither reaches the body.
            SourceLine::Directive { .. } => {}
            SourceLine::Declare(_) => {}
            SourceLine::CountBlock(raw) => count_lines.push(raw.as_str()),
            SourceLine::Body(raw) => body_lines.push(raw.as_str()),
        }
    }

    let sql = first_statement(&body_lines.join("\n"));
    let count_query = if count_lines.is_empty() {
        None
    } else {
        Some(first_statement(&count_lines.join("\n")))
    };

    debug!(
        %method,
        params = params.len(),
        paginated = count_query.is_some(),
        "parsed query source"
    );

    ParsedQuery {
        params,
        method,
        auth,
        sql,
        count_query,
    }
}

/// Reduce a buffer to its first semicolon-terminated statement: text up to
/// and including the first `;`, trimmed, or the whole trimmed text when no
/// `;` exists.
///
/// Deliberately blind to semicolons inside string literals; the format is
/// single-statement by construction and this exact rule is part of it.
fn first_statement(sql: &str) -> String {
    match sql.find(';') {
        Some(idx) => sql[..=idx].trim().to_string(),
        None => sql.trim().to_string(),
    }
}
