//! Layered configuration store.
//!
//! Every layer is a flat map from dotted key to JSON value. JSON documents
//! are flattened on load (nested objects become dotted keys, arrays stay
//! leaf values). Layers added later override earlier ones key by key, so a
//! recorded bootstrap layer placed over the base configuration wins.

use crate::error::{EvError, EvResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ConfigLayer {
    pub source: String,
    entries: BTreeMap<String, Value>,
}

impl ConfigLayer {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Build a layer from a JSON document. The top level must be an object.
    pub fn from_json_value(source: impl Into<String>, doc: Value) -> EvResult<Self> {
        let mut layer = Self::new(source);
        match doc {
            Value::Object(map) => {
                for (k, v) in map {
                    flatten_into(&k, v, &mut layer.entries);
                }
                Ok(layer)
            }
            other => Err(EvError::Config {
                key: layer.source.clone(),
                reason: format!("top level must be an object, found {}", json_kind(&other)),
            }),
        }
    }

    pub fn from_json_str(source: impl Into<String>, text: &str) -> EvResult<Self> {
        let source = source.into();
        let doc: Value = serde_json::from_str(text)
            .map_err(|e| anyhow::anyhow!("Cannot parse {source}: {e}"))?;
        Self::from_json_value(source, doc)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> EvResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(e.kind(), format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(path.display().to_string(), &content)
    }

    /// Build a layer from `key = value` lines. Values stay strings; the
    /// typed getters on ConfigStore parse them on demand.
    pub fn from_properties_str(source: impl Into<String>, text: &str) -> Self {
        let mut layer = Self::new(source);
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some(split) = line.find(|c: char| c == '=' || c == ':') else {
                log::warn!("{}: ignoring line without separator: {line}", layer.source);
                continue;
            };
            let (key, value) = line.split_at(split);
            layer.set(key.trim(), Value::String(value[1..].trim().to_string()));
        }
        layer
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

fn flatten_into(prefix: &str, value: Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                flatten_into(&format!("{prefix}.{k}"), v, out);
            }
        }
        leaf => {
            out.insert(prefix.to_string(), leaf);
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null      => "null",
        Value::Bool(_)   => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_)  => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered stack of configuration layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    layers: Vec<ConfigLayer>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, layer: ConfigLayer) {
        log::debug!("config: adding layer '{}' ({} keys)", layer.source, layer.len());
        self.layers.push(layer);
    }

    /// Raw lookup; the most recently added layer holding the key wins.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.layers.iter().rev().find_map(|l| l.get(key))
    }

    /// All keys across layers, deduplicated and sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .layers
            .iter()
            .flat_map(|l| l.entries.keys().map(String::as_str))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    pub fn get_str(&self, key: &str) -> EvResult<Option<String>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(type_error(key, "a string", other)),
        }
    }

    pub fn get_f64(&self, key: &str) -> EvResult<Option<f64>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| type_error(key, "a float", &Value::Number(n.clone()))),
            Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|e| EvError::Config {
                key: key.to_string(),
                reason: format!("'{s}' is not a number: {e}"),
            }),
            Some(other) => Err(type_error(key, "a number", other)),
        }
    }

    pub fn get_i64(&self, key: &str) -> EvResult<Option<i64>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| type_error(key, "an integer", &Value::Number(n.clone()))),
            Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|e| EvError::Config {
                key: key.to_string(),
                reason: format!("'{s}' is not an integer: {e}"),
            }),
            Some(other) => Err(type_error(key, "an integer", other)),
        }
    }

    pub fn get_u32(&self, key: &str) -> EvResult<Option<u32>> {
        match self.get_i64(key)? {
            None => Ok(None),
            Some(v) => u32::try_from(v).map(Some).map_err(|_| EvError::Config {
                key: key.to_string(),
                reason: format!("{v} is out of range for an unsigned 32-bit value"),
            }),
        }
    }

    /// A list is either a JSON array or a comma-separated string.
    pub fn get_list(&self, key: &str) -> EvResult<Option<Vec<String>>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    other => Err(type_error(key, "a list of strings", other)),
                })
                .collect::<EvResult<Vec<_>>>()
                .map(Some),
            Some(Value::String(s)) => Ok(Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(String::from)
                    .collect(),
            )),
            Some(other) => Err(type_error(key, "a list", other)),
        }
    }

    /// Scope lookups to `<prefix>.<name>`.
    pub fn instance<'a>(&'a self, prefix: &str, name: &str) -> InstanceView<'a> {
        InstanceView {
            store: self,
            prefix: format!("{prefix}.{name}"),
        }
    }
}

fn type_error(key: &str, expected: &str, found: &Value) -> EvError {
    EvError::Config {
        key: key.to_string(),
        reason: format!("expected {expected}, found {}", json_kind(found)),
    }
}

/// Configuration for a single named instance.
pub struct InstanceView<'a> {
    store: &'a ConfigStore,
    prefix: String,
}

impl<'a> InstanceView<'a> {
    pub fn key(&self, field: &str) -> String {
        format!("{}.{field}", self.prefix)
    }

    fn require<T>(&self, field: &str, v: Option<T>) -> EvResult<T> {
        v.ok_or_else(|| EvError::MissingKey { key: self.key(field) })
    }

    pub fn required_str(&self, field: &str) -> EvResult<String> {
        let v = self.store.get_str(&self.key(field))?;
        self.require(field, v)
    }

    pub fn required_f64(&self, field: &str) -> EvResult<f64> {
        let v = self.store.get_f64(&self.key(field))?;
        self.require(field, v)
    }

    pub fn required_u32(&self, field: &str) -> EvResult<u32> {
        let v = self.store.get_u32(&self.key(field))?;
        self.require(field, v)
    }

    pub fn optional_f64(&self, field: &str) -> EvResult<Option<f64>> {
        self.store.get_f64(&self.key(field))
    }

    pub fn optional_u32(&self, field: &str) -> EvResult<Option<u32>> {
        self.store.get_u32(&self.key(field))
    }

    pub fn optional_list(&self, field: &str) -> EvResult<Option<Vec<String>>> {
        self.store.get_list(&self.key(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_flatten_to_dotted_keys() {
        let layer = ConfigLayer::from_json_value(
            "t",
            json!({ "a": { "b": { "c": 3, "list": [1, 2] } } }),
        )
        .unwrap();
        assert_eq!(layer.get("a.b.c"), Some(&json!(3)));
        assert_eq!(layer.get("a.b.list"), Some(&json!([1, 2])));
        assert_eq!(layer.len(), 2);
    }

    #[test]
    fn later_layer_overrides_earlier() {
        let mut store = ConfigStore::new();
        store.add_layer(ConfigLayer::from_json_value("base", json!({ "x": { "y": 1, "z": 2 } })).unwrap());
        store.add_layer(ConfigLayer::from_properties_str("override", "x.y = 5\n# comment\n"));
        assert_eq!(store.get_i64("x.y").unwrap(), Some(5));
        assert_eq!(store.get_i64("x.z").unwrap(), Some(2));
        assert_eq!(store.keys(), vec!["x.y", "x.z"]);
    }

    #[test]
    fn comma_separated_strings_are_lists() {
        let store = {
            let mut s = ConfigStore::new();
            s.add_layer(ConfigLayer::from_properties_str("p", "names = a, b ,c"));
            s
        };
        assert_eq!(
            store.get_list("names").unwrap(),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn mistyped_value_names_the_key() {
        let mut store = ConfigStore::new();
        store.add_layer(ConfigLayer::from_json_value("t", json!({ "n": "abc" })).unwrap());
        match store.get_f64("n") {
            Err(EvError::Config { key, .. }) => assert_eq!(key, "n"),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_field_is_reported() {
        let store = ConfigStore::new();
        let view = store.instance("evcustomer.beans.carType", "Tesla_40_kWh");
        match view.required_f64("maxCapacity") {
            Err(EvError::MissingKey { key }) => {
                assert_eq!(key, "evcustomer.beans.carType.Tesla_40_kWh.maxCapacity")
            }
            other => panic!("expected missing key, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        match ConfigLayer::from_json_file("no/such/dir/ev_customers.json") {
            Err(EvError::Io(e)) => assert!(e.to_string().contains("ev_customers.json"), "{e}"),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_json_names_its_source() {
        let err = ConfigLayer::from_json_str("broken.json", "{ not json").unwrap_err();
        assert!(matches!(err, EvError::Other(_)));
        assert!(err.to_string().contains("broken.json"), "{err}");
    }

    #[test]
    fn top_level_must_be_object() {
        assert!(ConfigLayer::from_json_value("t", json!([1, 2])).is_err());
    }
}
