use models::{AliasConfig, OperationRef, ServiceConfig, Target};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::ServiceError;

/// Outcome of resolving a user-facing name to an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub operation: OperationRef<'a>,
    pub alias: Option<&'a AliasConfig>,
    pub merged_args: Map<String, Value>,
}

/// Resolves alias-or-operation names within one service.
#[derive(Debug, Clone, Copy)]
pub struct AliasResolver<'a> {
    service: &'a ServiceConfig,
}

impl<'a> AliasResolver<'a> {
    pub fn new(service: &'a ServiceConfig) -> Self {
        Self { service }
    }

    pub fn resolve(&self, name: &str, args: Map<String, Value>) -> Result<Resolution<'a>, ServiceError> {
        match self.service.lookup(name) {
            Some(Target::Alias(alias)) => {
                let operation = self.service.operation(&alias.endpoint).ok_or_else(|| ServiceError::Config {
                    message: format!(
                        "alias '{}' in service '{}' references unknown operation '{}'",
                        alias.name, self.service.service_name, alias.endpoint
                    ),
                    help: Some(self.operations_help()),
                })?;
                debug!(alias = %alias.name, operation = operation.name(), "resolved alias");
                Ok(Resolution { operation, alias: Some(alias), merged_args: merge_args(&alias.args, args) })
            }
            Some(Target::Operation(operation)) => Ok(Resolution { operation, alias: None, merged_args: args }),
            None => Err(ServiceError::Config {
                message: format!("'{}' is not an alias or operation of service '{}'", name, self.service.service_name),
                help: Some(self.names_help()),
            }),
        }
    }

    fn operations_help(&self) -> String {
        format!("available operations: {}", self.service.operation_names().join(", "))
    }

    fn names_help(&self) -> String {
        let aliases = self.service.visible_alias_names();
        if aliases.is_empty() {
            self.operations_help()
        } else {
            format!("available aliases: {}; {}", aliases.join(", "), self.operations_help())
        }
    }
}

/// Overlay caller arguments on alias defaults. Caller values win; when both
/// sides hold plain objects they merge one level deep.
pub fn merge_args(defaults: &Map<String, Value>, caller: Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (key, value) in caller {
        let value = match (merged.get(&key), value) {
            (Some(Value::Object(base)), Value::Object(overlay)) => {
                let mut combined = base.clone();
                combined.extend(overlay);
                Value::Object(combined)
            }
            (_, value) => value,
        };
        merged.insert(key, value);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    fn service() -> ServiceConfig {
        serde_json::from_value(json!({
            "serviceName": "users",
            "baseUrl": "https://api.example.com",
            "endpoints": [{"name": "getUser", "method": "GET", "path": "/users/{id}"}],
            "aliases": [
                {"name": "me", "endpoint": "getUser", "args": {"id": "1"}},
                {"name": "secret", "endpoint": "getUser", "hidden": true}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn alias_defaults_apply_when_caller_is_silent() {
        let svc = service();
        let res = AliasResolver::new(&svc).resolve("me", Map::new()).unwrap();
        assert_eq!(res.operation.name(), "getUser");
        assert_eq!(res.merged_args, args(json!({"id": "1"})));
        assert_eq!(res.alias.map(|a| a.name.as_str()), Some("me"));
    }

    #[test]
    fn caller_overrides_alias() {
        let svc = service();
        let res = AliasResolver::new(&svc).resolve("me", args(json!({"id": "5"}))).unwrap();
        assert_eq!(res.merged_args, args(json!({"id": "5"})));
    }

    #[test]
    fn operation_name_passes_args_through() {
        let svc = service();
        let res = AliasResolver::new(&svc).resolve("getUser", args(json!({"id": 9}))).unwrap();
        assert!(res.alias.is_none());
        assert_eq!(res.merged_args, args(json!({"id": 9})));
    }

    #[test]
    fn unknown_name_lists_visible_names() {
        let svc = service();
        let err = AliasResolver::new(&svc).resolve("nope", Map::new()).unwrap_err();
        assert!(matches!(err, ServiceError::Config { .. }));
        let help = err.help().unwrap();
        assert!(help.contains("me"));
        assert!(help.contains("getUser"));
        assert!(!help.contains("secret"));
    }

    #[test]
    fn dangling_alias_is_a_config_error() {
        let mut svc = service();
        svc.aliases[0].endpoint = "gone".into();
        let err = AliasResolver::new(&svc).resolve("me", Map::new()).unwrap_err();
        assert!(matches!(err, ServiceError::Config { message, .. } if message.contains("gone")));
    }

    #[test]
    fn nested_objects_merge_one_level() {
        let merged = merge_args(
            &args(json!({"filter": {"status": "open"}, "limit": 10})),
            args(json!({"filter": {"label": "bug"}})),
        );
        assert_eq!(merged, args(json!({"filter": {"status": "open", "label": "bug"}, "limit": 10})));

        // only one level: deeper objects are replaced, not merged
        let merged = merge_args(
            &args(json!({"filter": {"range": {"from": 1, "to": 2}}})),
            args(json!({"filter": {"range": {"to": 5}}})),
        );
        assert_eq!(merged, args(json!({"filter": {"range": {"to": 5}}})));

        // arrays and scalars replace outright
        let merged = merge_args(&args(json!({"tags": ["a"], "q": {"x": 1}})), args(json!({"tags": ["b"], "q": "raw"})));
        assert_eq!(merged, args(json!({"tags": ["b"], "q": "raw"})));
    }
}
