//! The query-execution gateway consumed by the pipeline.
//!
//! The concrete database driver lives outside this crate. The surrounding
//! service opens and owns the connection or pool, wraps it in a
//! [`QueryGateway`] implementation, and injects it into the pipeline, which
//! only borrows it per call. Timeouts, cancellation, and retry policy all
//! belong to the implementation.

use crate::params::ResolvedParams;
use async_trait::async_trait;
use serde_json::Value;

/// One result row: an ordered column → value mapping.
///
/// Insertion order is preserved (serde_json's `preserve_order` feature), so
/// "the first column" is well-defined. Pagination reads the total count from
/// the first column of the first count-query row by position, never by name.
pub type Row = serde_json::Map<String, Value>;

/// Opaque gateway failure, mapped to an execution error by the pipeline.
pub type GatewayError = Box<dyn std::error::Error + Send + Sync>;

/// Executes parameterized SQL and returns ordered rows.
///
/// Implementations must bind `params` as named parameters; interpolating
/// values into the SQL text is never acceptable.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Execute one statement with the given named parameters.
    async fn query(&self, sql: &str, params: &ResolvedParams) -> Result<Vec<Row>, GatewayError>;
}
