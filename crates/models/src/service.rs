use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::alias::AliasConfig;
use crate::auth::AuthConfig;
use crate::endpoint::{EndpointConfig, GraphQLOperationConfig, OperationRef};
use crate::errors::ModelError;

/// 服务定义：一个 base URL 下的全部操作与别名
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub service_name: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EndpointConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub graphql_operations: Vec<GraphQLOperationConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<AliasConfig>,
}

/// Result of looking a name up in a service.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Target<'a> {
    Alias(&'a AliasConfig),
    Operation(OperationRef<'a>),
}

impl ServiceConfig {
    /// Parse and validate a service definition from JSON.
    pub fn from_json_str(s: &str) -> Result<Self, ModelError> {
        let cfg: ServiceConfig = serde_json::from_str(s).map_err(|e| ModelError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn is_graphql(&self) -> bool {
        !self.graphql_operations.is_empty()
    }

    /// All operations in declaration order.
    pub fn operations(&self) -> impl Iterator<Item = OperationRef<'_>> {
        self.endpoints
            .iter()
            .map(OperationRef::Rest)
            .chain(self.graphql_operations.iter().map(OperationRef::GraphQl))
    }

    pub fn operation(&self, name: &str) -> Option<OperationRef<'_>> {
        self.operations().find(|op| op.name() == name)
    }

    pub fn alias(&self, name: &str) -> Option<&AliasConfig> {
        self.aliases.iter().find(|a| a.name == name)
    }

    /// Aliases take precedence; validation guarantees the names never overlap.
    pub fn lookup(&self, name: &str) -> Option<Target<'_>> {
        if let Some(alias) = self.alias(name) {
            return Some(Target::Alias(alias));
        }
        self.operation(name).map(Target::Operation)
    }

    pub fn operation_names(&self) -> Vec<&str> {
        self.operations().map(|op| op.name()).collect()
    }

    /// Alias names suitable for help output; hidden aliases are left out.
    pub fn visible_alias_names(&self) -> Vec<&str> {
        self.aliases.iter().filter(|a| !a.hidden).map(|a| a.name.as_str()).collect()
    }

    /// 统一校验：名称、base URL、操作与别名的一致性
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.service_name.trim().is_empty() {
            return Err(ModelError::Validation("serviceName must not be empty".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ModelError::Validation("baseUrl must start with http(s)".into()));
        }
        match (self.endpoints.is_empty(), self.graphql_operations.is_empty()) {
            (true, true) => {
                return Err(ModelError::Validation(
                    "service must declare endpoints or graphqlOperations".into(),
                ))
            }
            (false, false) => {
                return Err(ModelError::Validation(
                    "service cannot declare both endpoints and graphqlOperations".into(),
                ))
            }
            _ => {}
        }

        let mut op_names = HashSet::new();
        for op in self.operations() {
            op.validate()?;
            if !op_names.insert(op.name()) {
                return Err(ModelError::DuplicateName { kind: "operation", name: op.name().to_string() });
            }
        }

        let mut alias_names = HashSet::new();
        for alias in &self.aliases {
            if !alias_names.insert(alias.name.as_str()) {
                return Err(ModelError::DuplicateName { kind: "alias", name: alias.name.clone() });
            }
            if op_names.contains(alias.name.as_str()) {
                return Err(ModelError::AliasCollision(alias.name.clone()));
            }
            if !op_names.contains(alias.endpoint.as_str()) {
                return Err(ModelError::UnknownAliasTarget {
                    alias: alias.name.clone(),
                    target: alias.endpoint.clone(),
                });
            }
        }
        Ok(())
    }
}
