//! The per-request execution pipeline.
//!
//! Sequences method check → auth check → parameter resolution → optional
//! count execution → main execution → response shaping. The first failure
//! aborts the request; every failure happens before any result is returned,
//! so no partial rows ever escape.

use crate::error::EndpointError;
use crate::gateway::{QueryGateway, Row};
use crate::params::{coerce, ParamValue, ResolvedParams};
use crate::parser::ParsedQuery;
use crate::request::EndpointRequest;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Pagination metadata attached when a count query is configured.
///
/// `offset` and `limit` mirror the resolved parameters of those names when
/// they are numeric; `total_count` is the first column of the first
/// count-query row. Unset fields are omitted from the JSON, not emitted as
/// null.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Value>,

    #[serde(rename = "totalCount", skip_serializing_if = "Option::is_none")]
    pub total_count: Option<Value>,
}

/// Shaped response for one request: `{ rows }` or `{ meta, rows }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,

    pub rows: Vec<Row>,
}

/// Run one request through a parsed query.
///
/// The gateway is borrowed for the duration of the call; the pipeline holds
/// no state of its own across requests.
pub async fn execute(
    query: &ParsedQuery,
    gateway: &dyn QueryGateway,
    request: &EndpointRequest,
) -> Result<EndpointResponse, EndpointError> {
    if !query.method.matches(request.verb()) {
        debug!(expected = %query.method, actual = request.verb(), "method mismatch");
        return Err(EndpointError::method_not_allowed(
            query.method,
            request.verb(),
        ));
    }

    query.auth.check(request)?;

    let params = resolve_params(query, request)?;

    let meta = match &query.count_query {
        Some(count_sql) => {
            let count_rows = run(gateway, count_sql, &params).await?;
            let total_count = count_rows
                .first()
                .and_then(|row| row.values().next().cloned());
            Some(ResponseMeta {
                offset: numeric_param(&params, "offset"),
                limit: numeric_param(&params, "limit"),
                total_count,
            })
        }
        None => None,
    };

    let rows = run(gateway, &query.sql, &params).await?;
    debug!(rows = rows.len(), paginated = meta.is_some(), "query executed");

    Ok(EndpointResponse { meta, rows })
}

/// Resolve request inputs against the catalog, in catalog order.
///
/// Defaults go through the same coercion as request input. A parameter with
/// neither an input value nor a default is omitted entirely; the resolved
/// set never holds null placeholders.
fn resolve_params(
    query: &ParsedQuery,
    request: &EndpointRequest,
) -> Result<ResolvedParams, EndpointError> {
    let mut resolved = ResolvedParams::new();

    for meta in query.params.iter() {
        let raw = request
            .value(query.method, &meta.name)
            .or(meta.default.as_deref());
        if let Some(raw) = raw {
            let value = coerce(&meta.name, meta.ty, raw)?;
            resolved.insert(meta.name.clone(), value);
        }
    }

    Ok(resolved)
}

fn numeric_param(params: &ResolvedParams, name: &str) -> Option<Value> {
    params
        .get(name)
        .filter(|v| v.is_numeric())
        .map(ParamValue::to_json)
}

async fn run(
    gateway: &dyn QueryGateway,
    sql: &str,
    params: &ResolvedParams,
) -> Result<Vec<Row>, EndpointError> {
    gateway
        .query(sql, params)
        .await
        .map_err(EndpointError::from_gateway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;
    use crate::parser::parse;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::HashMap;

    /// Gateway double: canned rows per SQL text, calls recorded.
    #[derive(Default)]
    struct FakeGateway {
        responses: HashMap<String, Vec<Row>>,
        calls: Mutex<Vec<(String, ResolvedParams)>>,
    }

    impl FakeGateway {
        fn with_response(mut self, sql: &str, rows: Vec<Row>) -> Self {
            self.responses.insert(sql.to_string(), rows);
            self
        }

        fn calls(&self) -> Vec<(String, ResolvedParams)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl QueryGateway for FakeGateway {
        async fn query(
            &self,
            sql: &str,
            params: &ResolvedParams,
        ) -> Result<Vec<Row>, GatewayError> {
            self.calls.lock().push((sql.to_string(), params.clone()));
            Ok(self.responses.get(sql).cloned().unwrap_or_default())
        }
    }

    /// Gateway double that always fails.
    struct BrokenGateway;

    #[async_trait]
    impl QueryGateway for BrokenGateway {
        async fn query(&self, _: &str, _: &ResolvedParams) -> Result<Vec<Row>, GatewayError> {
            Err("connection lost".into())
        }
    }

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn test_method_mismatch_is_rejected_first() {
        let query = parse("-- @method POST\n-- @auth basic\nSELECT 1;");
        let gateway = FakeGateway::default();
        // No session either; the method check must fire before auth.
        let err = execute(&query, &gateway, &EndpointRequest::get())
            .await
            .unwrap_err();
        assert!(matches!(err, EndpointError::MethodNotAllowed { .. }));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_aborts_before_execution() {
        let query = parse("-- @auth basic\nSELECT 1;");
        let gateway = FakeGateway::default();
        let err = execute(&query, &gateway, &EndpointRequest::get())
            .await
            .unwrap_err();
        assert!(matches!(err, EndpointError::Unauthorized));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_coercion_failure_aborts_before_execution() {
        let query = parse("-- @param id: int\nSELECT * FROM t WHERE id = @id;");
        let gateway = FakeGateway::default();
        let request = EndpointRequest::get().with_query_param("id", "seven");
        let err = execute(&query, &gateway, &request).await.unwrap_err();
        assert!(matches!(
            err,
            EndpointError::InvalidParameterValue { ref name, .. } if name == "id"
        ));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_params_resolve_from_input_and_defaults() {
        let query = parse(
            "-- @param limit: int = 10\nSELECT * FROM t WHERE id = @id LIMIT @limit;",
        );
        let gateway = FakeGateway::default();
        let request = EndpointRequest::get().with_query_param("id", "7");
        execute(&query, &gateway, &request).await.unwrap();

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        let (_, params) = &calls[0];
        assert_eq!(params.get("limit"), Some(&ParamValue::Int(10)));
        assert_eq!(params.get("id"), Some(&ParamValue::String("7".to_string())));
    }

    #[tokio::test]
    async fn test_missing_param_without_default_is_omitted() {
        let query = parse("SELECT * FROM t WHERE id = @id;");
        let gateway = FakeGateway::default();
        execute(&query, &gateway, &EndpointRequest::get())
            .await
            .unwrap();

        let calls = gateway.calls();
        assert!(calls[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_post_reads_body_not_query_string() {
        let query = parse("-- @method POST\nSELECT * FROM t WHERE id = @id;");
        let gateway = FakeGateway::default();
        let request = EndpointRequest::post()
            .with_query_param("id", "ignored")
            .with_body_param("id", "9");
        execute(&query, &gateway, &request).await.unwrap();

        let calls = gateway.calls();
        assert_eq!(
            calls[0].1.get("id"),
            Some(&ParamValue::String("9".to_string()))
        );
    }

    #[tokio::test]
    async fn test_count_query_shapes_meta() {
        let source = "\
-- @param offset: int = 0
-- @countQuery
SELECT COUNT(*) FROM t;
SELECT * FROM t;";
        let query = parse(source);
        let gateway = FakeGateway::default()
            .with_response("SELECT COUNT(*) FROM t;", rows(vec![json!({"total": 5})]))
            .with_response("SELECT * FROM t;", rows(vec![json!({"ok": true})]));

        let response = execute(&query, &gateway, &EndpointRequest::get())
            .await
            .unwrap();

        let meta = response.meta.unwrap();
        assert_eq!(meta.offset, Some(json!(0)));
        assert_eq!(meta.limit, None);
        assert_eq!(meta.total_count, Some(json!(5)));
        assert_eq!(response.rows, rows(vec![json!({"ok": true})]));
    }

    #[tokio::test]
    async fn test_total_count_is_positional_not_named() {
        let query = parse("-- @countQuery\nSELECT COUNT(*) FROM t;\nSELECT 1;");
        let gateway = FakeGateway::default().with_response(
            "SELECT COUNT(*) FROM t;",
            rows(vec![json!({"whatever_alias": 12, "second": 99})]),
        );

        let response = execute(&query, &gateway, &EndpointRequest::get())
            .await
            .unwrap();
        assert_eq!(response.meta.unwrap().total_count, Some(json!(12)));
    }

    #[tokio::test]
    async fn test_empty_count_result_leaves_total_unset() {
        let query = parse("-- @countQuery\nSELECT COUNT(*) FROM t;\nSELECT 1;");
        let gateway = FakeGateway::default();

        let response = execute(&query, &gateway, &EndpointRequest::get())
            .await
            .unwrap();
        let meta = response.meta.unwrap();
        assert_eq!(meta.total_count, None);
    }

    #[tokio::test]
    async fn test_non_numeric_offset_is_not_mirrored() {
        let source = "\
-- @param offset = soon
-- @countQuery
SELECT COUNT(*) FROM t;
SELECT * FROM t WHERE x > @offset;";
        let query = parse(source);
        let gateway = FakeGateway::default();

        let response = execute(&query, &gateway, &EndpointRequest::get())
            .await
            .unwrap();
        assert_eq!(response.meta.unwrap().offset, None);
    }

    #[tokio::test]
    async fn test_gateway_failure_maps_to_execution_error() {
        let query = parse("SELECT 1;");
        let err = execute(&query, &BrokenGateway, &EndpointRequest::get())
            .await
            .unwrap_err();
        assert!(matches!(err, EndpointError::Execution { .. }));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_response_without_count_has_no_meta() {
        let query = parse("SELECT 1;");
        let gateway =
            FakeGateway::default().with_response("SELECT 1;", rows(vec![json!({"a": 1})]));
        let response = execute(&query, &gateway, &EndpointRequest::get())
            .await
            .unwrap();
        assert_eq!(response.meta, None);

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body, json!({"rows": [{"a": 1}]}));
    }
}
