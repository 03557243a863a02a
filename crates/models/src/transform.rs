use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One `oldPath -> newPath` rename, kept in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenameRule {
    pub from: String,
    pub to: String,
}

impl RenameRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

/// Field extraction followed by renaming, applied to one response value.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TransformConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, with = "ordered_rename", skip_serializing_if = "Option::is_none")]
    pub rename: Option<Vec<RenameRule>>,
}

impl TransformConfig {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fields: Some(fields.into_iter().map(Into::into).collect()), rename: None }
    }

    pub fn rename<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self {
            fields: None,
            rename: Some(pairs.into_iter().map(|(a, b)| RenameRule::new(a, b)).collect()),
        }
    }
}

/// The `transform` field of an operation: a single step or an ordered chain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TransformSpec {
    Chain(Vec<TransformConfig>),
    Single(TransformConfig),
}

impl TransformSpec {
    pub fn steps(&self) -> Vec<TransformConfig> {
        match self {
            TransformSpec::Single(cfg) => vec![cfg.clone()],
            TransformSpec::Chain(list) => list.clone(),
        }
    }
}

// serde_json maps are sorted by key; rename order matters, so read the map ourselves.
mod ordered_rename {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Vec<RenameRule>>, ser: S) -> Result<S::Ok, S::Error> {
        match value {
            None => ser.serialize_none(),
            Some(rules) => {
                let mut map = ser.serialize_map(Some(rules.len()))?;
                for rule in rules {
                    map.serialize_entry(&rule.from, &rule.to)?;
                }
                map.end()
            }
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Vec<RenameRule>>, D::Error> {
        struct RenameVisitor;

        impl<'de> Visitor<'de> for RenameVisitor {
            type Value = Option<Vec<RenameRule>>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of old path to new path")
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D: Deserializer<'de>>(self, de: D) -> Result<Self::Value, D::Error> {
                de.deserialize_map(self)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut rules = Vec::new();
                while let Some((from, to)) = access.next_entry::<String, String>()? {
                    rules.push(RenameRule { from, to });
                }
                Ok(Some(rules))
            }
        }

        de.deserialize_option(RenameVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rename_keeps_declaration_order() {
        let cfg: TransformConfig =
            serde_json::from_str(r#"{"rename": {"z": "a", "b": "c", "a": "y"}}"#).unwrap();
        let rules = cfg.rename.unwrap();
        let order: Vec<&str> = rules.iter().map(|r| r.from.as_str()).collect();
        assert_eq!(order, vec!["z", "b", "a"]);
    }

    #[test]
    fn spec_accepts_single_or_chain() {
        let single: TransformSpec = serde_json::from_value(json!({"fields": ["id"]})).unwrap();
        assert_eq!(single.steps().len(), 1);

        let chain: TransformSpec =
            serde_json::from_value(json!([{"fields": ["id"]}, {"rename": {"id": "key"}}])).unwrap();
        let steps = chain.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].rename.as_ref().unwrap()[0], RenameRule::new("id", "key"));
    }

    #[test]
    fn serializes_rename_as_map() {
        let cfg = TransformConfig::rename([("a", "b")]);
        assert_eq!(serde_json::to_value(&cfg).unwrap(), json!({"rename": {"a": "b"}}));
    }
}
