use super::capability::Capability;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parameters whose values are compared case-insensitively when deriving a cache key.
const CASE_INSENSITIVE_PARAMS: &[&str] = &["word", "language", "speed", "game_type", "difficulty"];

/// A request for one generated artifact. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    capability: Capability,
    #[serde(default)]
    parameters: BTreeMap<String, Value>,
}

impl GenerationRequest {
    pub fn new(capability: Capability, parameters: BTreeMap<String, Value>) -> Self {
        Self {
            capability,
            parameters,
        }
    }

    pub fn builder(capability: Capability) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            capability,
            parameters: BTreeMap::new(),
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name).filter(|v| !v.is_null())
    }

    /// String parameter, trimmed. Numbers are rendered as text.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.param(name)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// String parameter or an empty string; fallbacks must render whatever they get.
    pub fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.param(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.param(name)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> &[Value] {
        match self.param(name) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Integer parameter clamped to `[min, max]`, `default` when absent or unparsable.
    pub fn bounded(&self, name: &str, default: i64, min: i64, max: i64) -> i64 {
        self.integer(name).unwrap_or(default).clamp(min, max)
    }

    /// Parameters in the canonical form used for cache keys: strings trimmed,
    /// case-folded where the parameter is case-insensitive, nulls dropped.
    pub fn normalized_parameters(&self) -> BTreeMap<String, Value> {
        self.parameters
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let fold = CASE_INSENSITIVE_PARAMS.contains(&k.as_str());
                (k.trim().to_string(), normalize_value(v, fold))
            })
            .collect()
    }
}

fn normalize_value(value: &Value, fold: bool) -> Value {
    match value {
        Value::String(s) if fold => Value::String(s.trim().to_lowercase()),
        Value::String(s) => Value::String(s.trim().to_string()),
        Value::Array(items) => Value::Array(items.iter().map(|v| normalize_value(v, fold)).collect()),
        // Sorted explicitly: serde_json may be built with `preserve_order`.
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), normalize_value(v, fold)))
                .collect::<BTreeMap<_, _>>()
                .into_iter()
                .collect(),
        ),
        other => other.clone(),
    }
}

pub struct GenerationRequestBuilder {
    capability: Capability,
    parameters: BTreeMap<String, Value>,
}

impl GenerationRequestBuilder {
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn param_opt<V: Into<Value>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    pub fn build(self) -> GenerationRequest {
        GenerationRequest::new(self.capability, self.parameters)
    }
}
