use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named shortcut: an operation plus preset arguments.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AliasConfig {
    pub name: String,
    /// Name of the endpoint or GraphQL operation this alias calls.
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}
