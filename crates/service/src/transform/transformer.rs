use std::borrow::Cow;

use models::{RenameRule, TransformConfig};
use serde_json::{Map, Value};
use tracing::debug;

use super::TransformError;
use crate::field_path::{self, WILDCARD_PREFIX};

/// Applies one `{fields, rename}` step to a JSON value.
///
/// Extraction runs before renaming. The input is never mutated; renaming works
/// on a copy. Any failure yields the untouched input from [`transform`].
///
/// [`transform`]: ResponseTransformer::transform
#[derive(Debug, Clone)]
pub struct ResponseTransformer {
    config: TransformConfig,
}

impl ResponseTransformer {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Transform `data`, returning it unchanged when the step fails.
    pub fn transform(&self, data: Value) -> Value {
        match self.apply(&data) {
            Ok(out) => out,
            Err(e) => {
                debug!(error = %e, "transform failed; returning input unchanged");
                data
            }
        }
    }

    /// Fallible form used by the pipeline so it can observe failures.
    pub fn apply(&self, data: &Value) -> Result<Value, TransformError> {
        let mut out = match self.config.fields.as_deref() {
            Some(fields) if !fields.is_empty() => extract(data, fields)?,
            _ => data.clone(),
        };
        if let Some(rules) = self.config.rename.as_deref() {
            if !rules.is_empty() {
                out = rename(out, rules)?;
            }
        }
        Ok(out)
    }
}

fn strip_wildcard(path: &str) -> Option<&str> {
    path.strip_prefix(WILDCARD_PREFIX)
}

fn extract(data: &Value, fields: &[String]) -> Result<Value, TransformError> {
    match data {
        Value::Array(items) => {
            // `[*].x` fields address the elements themselves; strip one level.
            let per_item: Cow<[String]> = if fields.iter().all(|f| strip_wildcard(f).is_some()) {
                Cow::Owned(fields.iter().filter_map(|f| strip_wildcard(f)).map(str::to_string).collect())
            } else {
                Cow::Borrowed(fields)
            };
            let projected = items
                .iter()
                .map(|item| extract(item, &per_item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(projected))
        }
        Value::Object(_) => {
            let mut result = Value::Object(Map::new());
            for field in fields {
                let Some(value) = field_path::get(data, field) else {
                    continue;
                };
                match field_path::split_wildcard(field) {
                    // `items[*].id` lands under `items`
                    Some((head, _)) if !head.is_empty() => field_path::set(&mut result, head, value)?,
                    Some(_) => {}
                    None => field_path::set(&mut result, field, value)?,
                }
            }
            Ok(result)
        }
        other => Ok(other.clone()),
    }
}

fn rename(data: Value, rules: &[RenameRule]) -> Result<Value, TransformError> {
    match data {
        Value::Array(items) => {
            let all_wildcard = rules
                .iter()
                .all(|r| strip_wildcard(&r.from).is_some() && strip_wildcard(&r.to).is_some());
            let per_item: Cow<[RenameRule]> = if all_wildcard {
                Cow::Owned(
                    rules
                        .iter()
                        .map(|r| RenameRule::new(&r.from[WILDCARD_PREFIX.len()..], &r.to[WILDCARD_PREFIX.len()..]))
                        .collect(),
                )
            } else {
                Cow::Borrowed(rules)
            };
            let renamed = items
                .into_iter()
                .map(|item| rename(item, &per_item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(renamed))
        }
        Value::Object(_) => {
            let mut data = data;
            for rule in rules {
                rename_one(&mut data, rule)?;
            }
            Ok(data)
        }
        other => Ok(other),
    }
}

fn rename_one(data: &mut Value, rule: &RenameRule) -> Result<(), TransformError> {
    if rule.from == rule.to {
        return Ok(());
    }

    if field_path::is_wildcard(&rule.from) || field_path::is_wildcard(&rule.to) {
        let (Some((from_head, Some(from_tail))), Some((to_head, Some(to_tail)))) =
            (field_path::split_wildcard(&rule.from), field_path::split_wildcard(&rule.to))
        else {
            return Err(unsupported(rule));
        };
        if from_head != to_head {
            return Err(unsupported(rule));
        }
        if let Some(Value::Array(items)) = field_path::get_mut(data, from_head) {
            let inner = [RenameRule::new(from_tail, to_tail)];
            for item in items.iter_mut() {
                *item = rename(item.take(), &inner)?;
            }
        }
        return Ok(());
    }

    if rule.from.contains('.') || rule.to.contains('.') {
        if let Some(value) = field_path::get(data, &rule.from) {
            field_path::set(data, &rule.to, value)?;
            field_path::delete(data, &rule.from);
        }
        return Ok(());
    }

    if let Value::Object(map) = data {
        if let Some(value) = map.remove(&rule.from) {
            map.insert(rule.to.clone(), value);
        }
    }
    Ok(())
}

fn unsupported(rule: &RenameRule) -> TransformError {
    TransformError::UnsupportedRename { from: rule.from.clone(), to: rule.to.clone() }
}
