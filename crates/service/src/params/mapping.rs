use std::collections::BTreeMap;

use models::endpoint::path_placeholders;
use models::{OperationRef, ParamType, ParameterSchema};
use tracing::warn;

/// Effective declaration of one parameter after merging path-derived and
/// explicit declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub param_type: ParamType,
    pub required: bool,
    pub schema: Option<ParameterSchema>,
}

/// Parameter name -> declaration for one operation, plus configuration
/// warnings noticed while building it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    entries: BTreeMap<String, ParameterSpec>,
    warnings: Vec<String>,
}

impl ParameterMap {
    /// Path placeholders become required path parameters first; explicit
    /// declarations are overlaid but cannot change a placeholder's slot or
    /// make it optional.
    pub fn build(op: OperationRef<'_>) -> Self {
        let mut map = Self::default();
        let placeholders = op.path_template().map(path_placeholders).unwrap_or_default();
        for name in &placeholders {
            map.entries.insert(
                name.clone(),
                ParameterSpec { param_type: ParamType::Path, required: true, schema: None },
            );
        }

        for decl in op.parameters() {
            if placeholders.contains(&decl.name) {
                if decl.param_type != ParamType::Path || !decl.required {
                    let msg = format!(
                        "operation '{}': parameter '{}' comes from the path template and stays a required path parameter",
                        op.name(),
                        decl.name
                    );
                    warn!("{msg}");
                    map.warnings.push(msg);
                }
                if let Some(spec) = map.entries.get_mut(&decl.name) {
                    spec.schema = decl.schema.clone();
                }
                continue;
            }
            map.entries.insert(
                decl.name.clone(),
                ParameterSpec { param_type: decl.param_type, required: decl.required, schema: decl.schema.clone() },
            );
        }
        map
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterSpec)> {
        self.entries.iter()
    }

    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter(|(_, s)| s.required).map(|(n, _)| n.as_str())
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
