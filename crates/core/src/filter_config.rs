//! Declarative filter configuration tree
//!
//! A `FilterConfig` names a registered filter type, carries its property
//! values, and lists child configurations for composite filters. It has no
//! behavior of its own; the filter registry turns it into filter objects.
//!
//! ```toml
//! [[filters]]
//! type = "script"
//! properties = { script = "annotation.payload.priority > 2" }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node of a filter configuration tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Registered filter type name
    #[serde(alias = "type")]
    pub name: String,
    /// Property values by property name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, serde_json::Value>,
    /// Child configurations, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FilterConfig>,
}

impl FilterConfig {
    /// Node with no properties or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set a property value
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Append a child configuration
    pub fn with_child(mut self, child: FilterConfig) -> Self {
        self.children.push(child);
        self
    }

    /// Configured value of a property, if any
    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }
}
