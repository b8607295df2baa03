//! Request authentication strategies.

use crate::error::EndpointError;
use crate::request::EndpointRequest;
use std::collections::HashSet;
use tracing::debug;

/// Exact, case-sensitive prefix a bearer Authorization header must carry.
const BEARER_PREFIX: &str = "Bearer ";

/// Authentication an endpoint demands, declared via `-- @auth`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthRequirement {
    /// No check. The default when the directive is absent or unrecognized.
    #[default]
    Anonymous,

    /// The request must carry an established session marker.
    SessionRequired,

    /// The Authorization header must present one of the allowed tokens.
    BearerToken(HashSet<String>),
}

impl AuthRequirement {
    /// Interpret the argument of an `-- @auth` directive.
    ///
    /// A token starting with `basic` (case-insensitive) demands a session;
    /// one starting with `bearer` takes the remainder after that prefix as a
    /// comma-separated token list, trimmed, empties dropped. Anything else
    /// is anonymous.
    pub fn from_directive(args: &str) -> Self {
        let arg = args.trim();
        let lower = arg.to_ascii_lowercase();

        if lower.starts_with("basic") {
            AuthRequirement::SessionRequired
        } else if lower.starts_with("bearer") {
            let rest = arg.get("bearer".len()..).unwrap_or("");
            let tokens: HashSet<String> = rest
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
            AuthRequirement::BearerToken(tokens)
        } else {
            AuthRequirement::Anonymous
        }
    }

    /// Check one request against this requirement.
    pub fn check(&self, request: &EndpointRequest) -> Result<(), EndpointError> {
        match self {
            AuthRequirement::Anonymous => Ok(()),
            AuthRequirement::SessionRequired => {
                if request.has_session() {
                    Ok(())
                } else {
                    debug!("rejecting request without an established session");
                    Err(EndpointError::Unauthorized)
                }
            }
            AuthRequirement::BearerToken(allowed) => {
                let token = request
                    .header("authorization")
                    .and_then(|h| h.strip_prefix(BEARER_PREFIX));
                match token {
                    Some(t) if allowed.contains(t) => Ok(()),
                    _ => {
                        debug!("rejecting request without an allowed bearer token");
                        Err(EndpointError::Unauthorized)
                    }
                }
            }
        }
    }
}
