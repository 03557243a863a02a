use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ModelError;
use crate::parameter::ParameterConfig;
use crate::transform::TransformSpec;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Read methods are the only ones that may be cached.
    pub fn is_read(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Query,
    Mutation,
}

/// REST endpoint: method + path template, e.g. `GET /users/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterConfig>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub default_params: Map<String, Value>,
    #[serde(rename = "cacheTTL", default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformSpec>,
}

/// GraphQL query or mutation sent as `{query, variables}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLOperationConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterConfig>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub default_params: Map<String, Value>,
    #[serde(rename = "cacheTTL", default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformSpec>,
}

/// Borrowed view over either kind of operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperationRef<'a> {
    Rest(&'a EndpointConfig),
    GraphQl(&'a GraphQLOperationConfig),
}

impl<'a> OperationRef<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            OperationRef::Rest(e) => &e.name,
            OperationRef::GraphQl(o) => &o.name,
        }
    }

    pub fn is_read(&self) -> bool {
        match self {
            OperationRef::Rest(e) => e.method.is_read(),
            OperationRef::GraphQl(o) => o.operation_type == OperationType::Query,
        }
    }

    pub fn is_graphql(&self) -> bool {
        matches!(self, OperationRef::GraphQl(_))
    }

    /// Path template for REST endpoints; GraphQL operations have none.
    pub fn path_template(&self) -> Option<&'a str> {
        match self {
            OperationRef::Rest(e) => Some(&e.path),
            OperationRef::GraphQl(_) => None,
        }
    }

    pub fn parameters(&self) -> &'a [ParameterConfig] {
        match self {
            OperationRef::Rest(e) => &e.parameters,
            OperationRef::GraphQl(o) => &o.parameters,
        }
    }

    pub fn default_params(&self) -> &'a Map<String, Value> {
        match self {
            OperationRef::Rest(e) => &e.default_params,
            OperationRef::GraphQl(o) => &o.default_params,
        }
    }

    pub fn cache_ttl(&self) -> Option<u64> {
        match self {
            OperationRef::Rest(e) => e.cache_ttl,
            OperationRef::GraphQl(o) => o.cache_ttl,
        }
    }

    pub fn transform(&self) -> Option<&'a TransformSpec> {
        match self {
            OperationRef::Rest(e) => e.transform.as_ref(),
            OperationRef::GraphQl(o) => o.transform.as_ref(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        if self.name().trim().is_empty() {
            return Err(ModelError::Validation("operation name must not be empty".into()));
        }
        if let Some(path) = self.path_template() {
            if !path.starts_with('/') {
                return Err(ModelError::Validation(format!(
                    "endpoint '{}': path must start with '/'",
                    self.name()
                )));
            }
        }
        if self.cache_ttl().is_some() && !self.is_read() {
            return Err(ModelError::Validation(format!(
                "operation '{}': cacheTTL is only valid for read operations",
                self.name()
            )));
        }
        Ok(())
    }
}

/// Names of `{placeholder}` segments in a path template, in order of appearance.
pub fn path_placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else { break };
        let name = after[..end].trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholders_in_order_without_duplicates() {
        assert_eq!(path_placeholders("/repos/{owner}/{repo}/issues/{owner}"), vec!["owner", "repo"]);
        assert!(path_placeholders("/users").is_empty());
        assert_eq!(path_placeholders("/a/{unterminated"), Vec::<String>::new());
    }

    #[test]
    fn endpoint_deserializes_camel_case() {
        let e: EndpointConfig = serde_json::from_value(json!({
            "name": "listIssues",
            "method": "GET",
            "path": "/issues",
            "defaultParams": {"state": "open"},
            "cacheTTL": 60,
            "transform": {"fields": ["id"]}
        }))
        .unwrap();
        assert_eq!(e.cache_ttl, Some(60));
        assert_eq!(e.default_params.get("state"), Some(&json!("open")));
        assert!(OperationRef::Rest(&e).is_read());
    }

    #[test]
    fn cache_ttl_rejected_on_writes() {
        let e: EndpointConfig = serde_json::from_value(json!({
            "name": "create", "method": "POST", "path": "/items", "cacheTTL": 5
        }))
        .unwrap();
        assert!(matches!(OperationRef::Rest(&e).validate(), Err(ModelError::Validation(_))));
    }
}
