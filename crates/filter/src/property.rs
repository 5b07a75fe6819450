//! Declared filter properties
//!
//! Every filter factory declares the properties it reads. Each declaration
//! has a name, a description, a kind and an optional default. When a filter
//! is built, each declared property is resolved from, in order:
//!
//! 1. the value configured on the `FilterConfig` node
//! 2. a deployment-wide default from `PropertyDefaults`
//! 3. the declaration's own default
//!
//! A property with none of the three is missing.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

/// Kind a property value must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// JSON string
    String,
    /// Non-negative integer
    Integer,
    /// JSON boolean
    Boolean,
    /// Any JSON value
    Json,
}

impl PropertyKind {
    /// True if `value` has this kind
    pub fn admits(self, value: &Value) -> bool {
        match self {
            PropertyKind::String => value.is_string(),
            PropertyKind::Integer => value.is_u64(),
            PropertyKind::Boolean => value.is_boolean(),
            PropertyKind::Json => true,
        }
    }

    /// Name used in error messages
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::String => "string",
            PropertyKind::Integer => "non-negative integer",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Json => "json",
        }
    }
}

/// Declaration of one filter property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    /// Property name as written in configuration
    pub name: &'static str,
    /// What the property controls
    pub description: &'static str,
    /// Required kind of the value
    pub kind: PropertyKind,
    /// Value used when neither configuration nor defaults supply one
    pub default: Option<Value>,
}

impl PropertySpec {
    /// Property with no default
    pub fn required(name: &'static str, description: &'static str, kind: PropertyKind) -> Self {
        Self {
            name,
            description,
            kind,
            default: None,
        }
    }

    /// Property with a default
    pub fn optional(
        name: &'static str,
        description: &'static str,
        kind: PropertyKind,
        default: impl Into<Value>,
    ) -> Self {
        Self {
            name,
            description,
            kind,
            default: Some(default.into()),
        }
    }
}

/// Property values after resolution, keyed by property name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedProperties {
    values: HashMap<String, Value>,
}

impl ResolvedProperties {
    pub(crate) fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Raw resolved value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Resolved string value
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Resolved integer value
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_u64)
    }

    /// Resolved boolean value
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }
}

/// Deployment-wide property defaults, keyed by filter type then property
///
/// ```toml
/// [defaults.most_recent_by_group]
/// count = 3
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDefaults {
    values: BTreeMap<String, BTreeMap<String, Value>>,
}

impl PropertyDefaults {
    /// Empty defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default of `property` for filters of `type_name`
    pub fn set(&mut self, type_name: impl Into<String>, property: impl Into<String>, value: impl Into<Value>) {
        self.values
            .entry(type_name.into())
            .or_default()
            .insert(property.into(), value.into());
    }

    /// Default of `property` for filters of `type_name`
    pub fn resolve(&self, type_name: &str, property: &str) -> Option<&Value> {
        self.values.get(type_name).and_then(|props| props.get(property))
    }
}

impl From<BTreeMap<String, BTreeMap<String, Value>>> for PropertyDefaults {
    fn from(values: BTreeMap<String, BTreeMap<String, Value>>) -> Self {
        Self { values }
    }
}
