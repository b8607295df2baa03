//! Parse-once registry of endpoint queries.
//!
//! A source text is parsed when it is registered; the resulting
//! [`ParsedQuery`] is shared by every subsequent request against it. Naming
//! (route-path derivation, filesystem scanning) stays with the host service;
//! the registry only maps the names it is given to parsed queries.

use crate::parser::{self, ParsedQuery};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Concurrent name → parsed query map.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    entries: RwLock<HashMap<String, Arc<ParsedQuery>>>,
}

impl EndpointRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a source text and register it under `name`, replacing any
    /// previous entry. Returns the shared parsed query.
    pub fn register(&self, name: impl Into<String>, source: &str) -> Arc<ParsedQuery> {
        let name = name.into();
        let parsed = Arc::new(parser::parse(source));
        debug!(endpoint = %name, method = %parsed.method, "registered endpoint");
        self.entries.write().insert(name, Arc::clone(&parsed));
        parsed
    }

    /// Look up a registered endpoint by name.
    pub fn get(&self, name: &str) -> Option<Arc<ParsedQuery>> {
        self.entries.read().get(name).cloned()
    }

    /// Registered endpoint names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
