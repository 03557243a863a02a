use std::collections::BTreeMap;

use models::{OperationRef, ParamType};
use serde_json::{Map, Value};

use super::mapping::ParameterMap;
use super::validator::ValidationReport;
use crate::errors::ServiceError;

/// Arguments sorted into the parts of an HTTP request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParts {
    /// Path with placeholders substituted; empty for GraphQL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    /// JSON body fields, or GraphQL variables.
    pub body: Option<Map<String, Value>>,
}

impl RequestParts {
    /// Query string without the leading `?`, or `None` when empty.
    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        Some(pairs.join("&"))
    }

    fn body_mut(&mut self) -> &mut Map<String, Value> {
        self.body.get_or_insert_with(Map::new)
    }
}

/// Render a scalar argument for a URL or header.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Sort resolved arguments into request slots. Arguments without a
/// declaration go to the query string for read endpoints and to the body
/// otherwise; GraphQL sends everything but headers as variables.
pub fn classify(
    op: OperationRef<'_>,
    params: &ParameterMap,
    args: &Map<String, Value>,
) -> Result<RequestParts, ServiceError> {
    let mut parts = RequestParts::default();

    if let Some(template) = op.path_template() {
        parts.path = substitute_path(template, args)?;
    }

    for (name, value) in args {
        let slot = match (params.get(name).map(|s| s.param_type), op) {
            (Some(ParamType::Header), _) => ParamType::Header,
            (_, OperationRef::GraphQl(_)) => ParamType::Body,
            (Some(t), _) => t,
            (None, _) if op.is_read() => ParamType::Query,
            (None, _) => ParamType::Body,
        };
        match slot {
            ParamType::Path => {}
            ParamType::Query => push_query(&mut parts.query, name, value),
            ParamType::Header => {
                if !value.is_null() {
                    parts.headers.insert(name.clone(), value_to_string(value));
                }
            }
            ParamType::Body => {
                parts.body_mut().insert(name.clone(), value.clone());
            }
        }
    }
    Ok(parts)
}

fn push_query(query: &mut Vec<(String, String)>, name: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items.iter().filter(|v| !v.is_null()) {
                query.push((name.to_string(), value_to_string(item)));
            }
        }
        other => query.push((name.to_string(), value_to_string(other))),
    }
}

fn substitute_path(template: &str, args: &Map<String, Value>) -> Result<String, ServiceError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut missing = Vec::new();
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else { break };
        out.push_str(&rest[..start]);
        let name = rest[start + 1..start + len].trim();
        match args.get(name).filter(|v| !v.is_null()) {
            Some(value) => out.push_str(&urlencoding::encode(&value_to_string(value))),
            None => missing.push(name.to_string()),
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);

    if !missing.is_empty() {
        let errors = missing.iter().map(|n| format!("missing required parameter '{n}'")).collect();
        return Err(ServiceError::Validation {
            report: ValidationReport { valid: false, errors, missing, ..Default::default() },
            help: None,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{EndpointConfig, GraphQLOperationConfig};
    use serde_json::json;

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    fn endpoint(v: Value) -> EndpointConfig {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn rest_arguments_fill_their_slots() {
        let e = endpoint(json!({
            "name": "comment", "method": "POST", "path": "/repos/{owner}/{repo}/comments",
            "parameters": [
                {"name": "body", "type": "body", "required": true},
                {"name": "dry_run", "type": "query"},
                {"name": "X-Trace", "type": "header"}
            ]
        }));
        let op = OperationRef::Rest(&e);
        let params = ParameterMap::build(op);
        let parts = classify(
            op,
            &params,
            &args(json!({
                "owner": "rust lang", "repo": "rust", "body": "hi",
                "dry_run": true, "X-Trace": 7, "extra": {"k": 1}
            })),
        )
        .unwrap();
        assert_eq!(parts.path, "/repos/rust%20lang/rust/comments");
        assert_eq!(parts.query, vec![("dry_run".to_string(), "true".to_string())]);
        assert_eq!(parts.headers.get("X-Trace").map(String::as_str), Some("7"));
        assert_eq!(parts.body, Some(args(json!({"body": "hi", "extra": {"k": 1}}))));
    }

    #[test]
    fn undeclared_args_go_to_query_for_reads() {
        let e = endpoint(json!({"name": "search", "method": "GET", "path": "/search"}));
        let op = OperationRef::Rest(&e);
        let parts = classify(op, &ParameterMap::build(op), &args(json!({"q": "a&b", "tag": ["x", "y"]}))).unwrap();
        assert!(parts.body.is_none());
        assert_eq!(parts.query_string().unwrap(), "q=a%26b&tag=x&tag=y");
    }

    #[test]
    fn missing_path_value_is_reported() {
        let e = endpoint(json!({"name": "getUser", "method": "GET", "path": "/users/{id}"}));
        let op = OperationRef::Rest(&e);
        let err = classify(op, &ParameterMap::build(op), &Map::new()).unwrap_err();
        match err {
            ServiceError::Validation { report, .. } => assert_eq!(report.missing, vec!["id"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn graphql_arguments_become_variables() {
        let o: GraphQLOperationConfig = serde_json::from_value(json!({
            "name": "repo", "type": "query", "query": "query($owner: String!) { repository(owner: $owner) { id } }",
            "parameters": [{"name": "owner", "type": "query", "required": true}, {"name": "X-Req", "type": "header"}]
        }))
        .unwrap();
        let op = OperationRef::GraphQl(&o);
        let parts = classify(op, &ParameterMap::build(op), &args(json!({"owner": "rust-lang", "X-Req": "1", "first": 5}))).unwrap();
        assert_eq!(parts.path, "");
        assert!(parts.query.is_empty());
        assert_eq!(parts.body, Some(args(json!({"owner": "rust-lang", "first": 5}))));
        assert_eq!(parts.headers.len(), 1);
    }
}
