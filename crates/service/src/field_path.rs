//! Dotted field-path addressing over `serde_json::Value`.
//!
//! Grammar:
//! - segments separated by `.`: `user.address.city`
//! - a segment may carry numeric indices: `items[0].name`, `grid[1][2]`
//! - `[*].` maps the remainder of the path over every element of the array
//!   found at the preceding segments: `items[*].id`
//!
//! `get` never fails; a path that leads nowhere yields `None`.
//! `set` creates intermediate objects but never arrays, and rejects wildcards.
//! Arrays grow by at most one slot per `set` (an append); further indices are
//! out of range.
//! `delete` is a no-op when any intermediate segment is absent.

use serde_json::{Map, Value};
use thiserror::Error;

/// Marker meaning "every element of this array".
pub const WILDCARD: &str = "[*]";
/// Wildcard marker followed by the rest of a path.
pub const WILDCARD_PREFIX: &str = "[*].";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldPathError {
    #[error("wildcard path '{0}' cannot be assigned directly")]
    WildcardTarget(String),
    #[error("cannot descend into non-container value at '{segment}' of '{path}'")]
    NotContainer { path: String, segment: String },
    #[error("index {index} of '{path}' is past the end of an array of length {len}")]
    IndexOutOfRange { path: String, index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    /// Segment as an object key; indices become their decimal string.
    fn as_key(&self) -> String {
        match self {
            Segment::Key(k) => k.clone(),
            Segment::Index(i) => i.to_string(),
        }
    }

    /// Segment as an array position; numeric keys count as positions.
    fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Key(k) => k.parse().ok(),
            Segment::Index(i) => Some(*i),
        }
    }
}

fn parse_segments(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for part in path.split('.').filter(|p| !p.is_empty()) {
        match part.find('[').and_then(|open| parse_indices(&part[open..]).map(|idx| (open, idx))) {
            Some((open, indices)) => {
                if open > 0 {
                    segments.push(Segment::Key(part[..open].to_string()));
                }
                segments.extend(indices.into_iter().map(Segment::Index));
            }
            None => segments.push(Segment::Key(part.to_string())),
        }
    }
    segments
}

// `[0][12]` -> [0, 12]; anything else is not an index suffix.
fn parse_indices(mut s: &str) -> Option<Vec<usize>> {
    let mut out = Vec::new();
    while !s.is_empty() {
        let inner = s.strip_prefix('[')?;
        let close = inner.find(']')?;
        out.push(inner[..close].parse().ok()?);
        s = &inner[close + 1..];
    }
    Some(out)
}

/// Split a path at its first wildcard: `a.b[*].c` -> (`a.b`, Some(`c`)),
/// `a[*]` -> (`a`, None). Paths without a wildcard yield `None`.
pub fn split_wildcard(path: &str) -> Option<(&str, Option<&str>)> {
    if let Some(pos) = path.find(WILDCARD_PREFIX) {
        return Some((&path[..pos], Some(&path[pos + WILDCARD_PREFIX.len()..])));
    }
    path.strip_suffix(WILDCARD).map(|head| (head, None))
}

pub fn is_wildcard(path: &str) -> bool {
    path.contains(WILDCARD)
}

fn step<'a>(current: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(&segment.as_key()),
        Value::Array(items) => items.get(segment.as_index()?),
        _ => None,
    }
}

fn step_mut<'a>(current: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match current {
        Value::Object(map) => map.get_mut(&segment.as_key()),
        Value::Array(items) => items.get_mut(segment.as_index()?),
        _ => None,
    }
}

fn get_ref<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    parse_segments(path).iter().try_fold(root, step)
}

/// Resolve a path. Wildcard paths produce an array with one entry per element,
/// `null` where the remainder does not resolve.
pub fn get(root: &Value, path: &str) -> Option<Value> {
    match split_wildcard(path) {
        Some((head, tail)) => {
            let Value::Array(items) = get_ref(root, head)? else {
                return None;
            };
            let projected = items
                .iter()
                .map(|item| match tail {
                    Some(rest) => get(item, rest).unwrap_or(Value::Null),
                    None => item.clone(),
                })
                .collect();
            Some(Value::Array(projected))
        }
        None => get_ref(root, path).cloned(),
    }
}

/// Mutable access to a non-wildcard path.
pub fn get_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    if is_wildcard(path) {
        return None;
    }
    let mut current = root;
    for segment in parse_segments(path) {
        current = step_mut(current, &segment)?;
    }
    Some(current)
}

fn not_container(path: &str, segment: &Segment) -> FieldPathError {
    FieldPathError::NotContainer { path: path.to_string(), segment: segment.as_key() }
}

fn grow_for(items: &mut Vec<Value>, idx: usize, path: &str) -> Result<(), FieldPathError> {
    match idx.cmp(&items.len()) {
        std::cmp::Ordering::Less => Ok(()),
        std::cmp::Ordering::Equal => {
            items.push(Value::Null);
            Ok(())
        }
        std::cmp::Ordering::Greater => {
            Err(FieldPathError::IndexOutOfRange { path: path.to_string(), index: idx, len: items.len() })
        }
    }
}

// Child slot for an intermediate segment, created as an object when absent or null.
fn child_or_create<'a>(
    current: &'a mut Value,
    segment: &Segment,
    path: &str,
) -> Result<&'a mut Value, FieldPathError> {
    let slot = match current {
        Value::Object(map) => map.entry(segment.as_key()).or_insert(Value::Null),
        Value::Array(items) => {
            let idx = segment.as_index().ok_or_else(|| not_container(path, segment))?;
            grow_for(items, idx, path)?;
            &mut items[idx]
        }
        _ => return Err(not_container(path, segment)),
    };
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    if !(slot.is_object() || slot.is_array()) {
        return Err(not_container(path, segment));
    }
    Ok(slot)
}

/// Assign `value` at `path`, creating intermediate objects.
pub fn set(root: &mut Value, path: &str, value: Value) -> Result<(), FieldPathError> {
    if is_wildcard(path) {
        return Err(FieldPathError::WildcardTarget(path.to_string()));
    }
    let segments = parse_segments(path);
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for segment in parents {
        current = child_or_create(current, segment, path)?;
    }
    match current {
        Value::Object(map) => {
            map.insert(last.as_key(), value);
        }
        Value::Array(items) => {
            let idx = last.as_index().ok_or_else(|| not_container(path, last))?;
            grow_for(items, idx, path)?;
            items[idx] = value;
        }
        _ => return Err(not_container(path, last)),
    }
    Ok(())
}

/// Remove the value at `path`. Array slots are nulled rather than shifted so
/// sibling positions stay stable.
pub fn delete(root: &mut Value, path: &str) {
    if is_wildcard(path) {
        return;
    }
    let segments = parse_segments(path);
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = root;
    for segment in parents {
        match step_mut(current, segment) {
            Some(next) => current = next,
            None => return,
        }
    }
    match current {
        Value::Object(map) => {
            map.remove(&last.as_key());
        }
        Value::Array(items) => {
            if let Some(slot) = last.as_index().and_then(|idx| items.get_mut(idx)) {
                *slot = Value::Null;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order() -> Value {
        json!({
            "customer": {"name": "Ada", "address": {"city": "London"}},
            "items": [
                {"id": 1, "name": "pen", "price": 2},
                {"id": 2, "name": "ink", "price": 5},
                {"id": 3, "price": 9}
            ],
            "total": 16
        })
    }

    #[test]
    fn parses_keys_and_indices() {
        assert_eq!(
            parse_segments("items[0].name"),
            vec![Segment::Key("items".into()), Segment::Index(0), Segment::Key("name".into())]
        );
        assert_eq!(parse_segments("grid[1][2]"), vec![
            Segment::Key("grid".into()),
            Segment::Index(1),
            Segment::Index(2)
        ]);
        assert_eq!(parse_segments("odd[x]"), vec![Segment::Key("odd[x]".into())]);
        assert!(parse_segments("").is_empty());
    }

    #[test]
    fn get_resolves_nested_and_indexed() {
        let data = order();
        assert_eq!(get(&data, "customer.address.city"), Some(json!("London")));
        assert_eq!(get(&data, "items[1].name"), Some(json!("ink")));
        assert_eq!(get(&data, "items.1.price"), Some(json!(5)));
        assert_eq!(get(&data, ""), Some(data.clone()));
    }

    #[test]
    fn get_missing_or_through_scalar_is_none() {
        let data = order();
        assert_eq!(get(&data, "customer.phone"), None);
        assert_eq!(get(&data, "customer.phone.number"), None);
        assert_eq!(get(&data, "total.value"), None);
        assert_eq!(get(&data, "items[9].name"), None);
        assert_eq!(get(&json!(null), "a.b"), None);
    }

    #[test]
    fn wildcard_get_projects_each_element() {
        let data = order();
        assert_eq!(get(&data, "items[*].id"), Some(json!([1, 2, 3])));
        assert_eq!(get(&data, "items[*].name"), Some(json!(["pen", "ink", null])));
        assert_eq!(get(&data, "items[*]"), Some(data["items"].clone()));
        assert_eq!(get(&data, "customer[*].name"), None);
        assert_eq!(get(&json!([{"a": 1}, {"a": 2}]), "[*].a"), Some(json!([1, 2])));
    }

    #[test]
    fn nested_wildcards() {
        let data = json!({"groups": [{"users": [{"id": 1}, {"id": 2}]}, {"users": [{"id": 3}]}]});
        assert_eq!(get(&data, "groups[*].users[*].id"), Some(json!([[1, 2], [3]])));
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut v = json!({});
        set(&mut v, "a.b.c", json!(1)).unwrap();
        assert_eq!(v, json!({"a": {"b": {"c": 1}}}));

        // indices on freshly created containers become object keys
        let mut v = json!({});
        set(&mut v, "items[0].name", json!("pen")).unwrap();
        assert_eq!(v, json!({"items": {"0": {"name": "pen"}}}));
    }

    #[test]
    fn set_into_existing_array_is_positional() {
        let mut v = order();
        set(&mut v, "items[1].name", json!("quill")).unwrap();
        assert_eq!(v["items"][1]["name"], json!("quill"));
        assert_eq!(v["items"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn set_rejects_wildcards_and_scalars() {
        let mut v = order();
        assert_eq!(
            set(&mut v, "items[*].id", json!(0)),
            Err(FieldPathError::WildcardTarget("items[*].id".into()))
        );
        assert!(matches!(set(&mut v, "total.amount", json!(1)), Err(FieldPathError::NotContainer { .. })));
    }

    #[test]
    fn set_appends_but_never_pads_arrays() {
        let mut v = order();
        set(&mut v, "items[3]", json!({"id": 4})).unwrap();
        assert_eq!(v["items"].as_array().unwrap().len(), 4);
        set(&mut v, "items.4.id", json!(5)).unwrap();
        assert_eq!(v["items"][4], json!({"id": 5}));

        let before = v.clone();
        assert_eq!(
            set(&mut v, "items.4000000000", json!(0)),
            Err(FieldPathError::IndexOutOfRange { path: "items.4000000000".into(), index: 4_000_000_000, len: 5 })
        );
        assert!(matches!(set(&mut v, "items[7].id", json!(0)), Err(FieldPathError::IndexOutOfRange { .. })));
        assert_eq!(v, before);
    }

    #[test]
    fn delete_is_noop_for_missing_parents() {
        let mut v = order();
        let before = v.clone();
        delete(&mut v, "customer.phone.number");
        delete(&mut v, "nothing.here");
        assert_eq!(v, before);

        delete(&mut v, "customer.address.city");
        assert_eq!(v["customer"]["address"], json!({}));
        delete(&mut v, "items[0]");
        assert_eq!(v["items"][0], Value::Null);
    }
}
