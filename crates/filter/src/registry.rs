//! Filter registry: builds filters from declarative configuration
//!
//! The registry maps filter type names to factories. A factory declares the
//! properties it reads and carries a constructor closure, so the store can
//! assemble a filter chain from configuration without knowing any concrete
//! filter type.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut registry = FilterRegistry::<u64>::with_builtins();
//!
//! // Register a custom filter type (last registration wins)
//! registry.register("always", FilterFactory::leaf(vec![], |_| Ok(Box::new(Always))));
//!
//! let outcome = registry.build_chain(&config.filters);
//! for problem in &outcome.diagnostics {
//!     warn!("dropped filter: {}", problem);
//! }
//! ```
//!
//! ## Failure handling
//!
//! Building is fail-soft. A node that cannot be built is logged, recorded as
//! a diagnostic and dropped; its siblings and the rest of the tree are still
//! built. Callers decide whether diagnostics are fatal.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use annostore_core::{AnnotationFilter, Coordinate, FilterConfig};

use crate::chain::FilterChain;
use crate::error::FilterBuildError;
use crate::filters::{AllOfFilter, AnyOfFilter, GroupRecencyFilter, NotFilter, ScriptableFilter};
use crate::property::{PropertyDefaults, PropertyKind, PropertySpec, ResolvedProperties};

/// Boxed filter produced by a factory
pub type BoxedFilter<T> = Box<dyn AnnotationFilter<T>>;

type Constructor<T> =
    dyn Fn(&ResolvedProperties, Vec<BoxedFilter<T>>) -> Result<BoxedFilter<T>, String> + Send + Sync;

/// Default per-group budget of `most_recent_by_group`
pub const DEFAULT_RECENT_COUNT: u64 = 10;

/// Declared properties plus a constructor for one filter type
pub struct FilterFactory<T: Coordinate> {
    properties: Vec<PropertySpec>,
    takes_children: bool,
    construct: Arc<Constructor<T>>,
}

impl<T: Coordinate> FilterFactory<T> {
    /// Factory for a filter without children
    pub fn leaf<F>(properties: Vec<PropertySpec>, construct: F) -> Self
    where
        F: Fn(&ResolvedProperties) -> Result<BoxedFilter<T>, String> + Send + Sync + 'static,
    {
        Self {
            properties,
            takes_children: false,
            construct: Arc::new(move |props: &ResolvedProperties, _children: Vec<BoxedFilter<T>>| {
                construct(props)
            }),
        }
    }

    /// Factory for a filter composed from its built children
    pub fn composite<F>(properties: Vec<PropertySpec>, construct: F) -> Self
    where
        F: Fn(&ResolvedProperties, Vec<BoxedFilter<T>>) -> Result<BoxedFilter<T>, String>
            + Send
            + Sync
            + 'static,
    {
        Self {
            properties,
            takes_children: true,
            construct: Arc::new(construct),
        }
    }

    /// Declared properties
    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    /// True if the factory builds from child configurations
    pub fn takes_children(&self) -> bool {
        self.takes_children
    }
}

impl<T: Coordinate> Clone for FilterFactory<T> {
    fn clone(&self) -> Self {
        Self {
            properties: self.properties.clone(),
            takes_children: self.takes_children,
            construct: Arc::clone(&self.construct),
        }
    }
}

impl<T: Coordinate> fmt::Debug for FilterFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterFactory")
            .field("properties", &self.properties.iter().map(|p| p.name).collect::<Vec<_>>())
            .field("takes_children", &self.takes_children)
            .finish()
    }
}

/// Result of building one configuration tree
#[derive(Debug)]
pub struct BuildOutcome<T: Coordinate> {
    /// The built filter, or `None` if the root node failed
    pub filter: Option<BoxedFilter<T>>,
    /// Every node that was dropped, with the reason
    pub diagnostics: Vec<FilterBuildError>,
}

/// Result of building a list of top-level configurations into a chain
#[derive(Debug)]
pub struct ChainOutcome<T: Coordinate> {
    /// Chain of the nodes that built successfully, in configured order
    pub chain: FilterChain<T>,
    /// Every node that was dropped, with the reason
    pub diagnostics: Vec<FilterBuildError>,
}

/// Registry of filter factories by type name
pub struct FilterRegistry<T: Coordinate> {
    factories: HashMap<String, FilterFactory<T>>,
    defaults: PropertyDefaults,
}

impl<T: Coordinate> FilterRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        FilterRegistry {
            factories: HashMap::new(),
            defaults: PropertyDefaults::new(),
        }
    }

    /// Registry with the built-in filter types
    ///
    /// | Type | Properties | Children |
    /// |------|------------|----------|
    /// | `script` | `script` (string, required) | none |
    /// | `most_recent_by_group` | `count` (integer, default 10) | none |
    /// | `all` | none | any number |
    /// | `any` | none | any number |
    /// | `not` | none | exactly one |
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            ScriptableFilter::TYPE_NAME,
            FilterFactory::leaf(
                vec![PropertySpec::required(
                    "script",
                    "Boolean expression evaluated against the variable `annotation`",
                    PropertyKind::String,
                )],
                |props| {
                    let source = props.get_str("script").unwrap_or_default();
                    let filter = ScriptableFilter::new(source).map_err(|e| e.to_string())?;
                    Ok(Box::new(filter) as BoxedFilter<T>)
                },
            ),
        );
        registry.register(
            GroupRecencyFilter::TYPE_NAME,
            FilterFactory::leaf(
                vec![PropertySpec::optional(
                    "count",
                    "Number of most recent annotations kept per group",
                    PropertyKind::Integer,
                    DEFAULT_RECENT_COUNT,
                )],
                |props| {
                    let count = props.get_u64("count").unwrap_or(DEFAULT_RECENT_COUNT);
                    let count = usize::try_from(count).map_err(|_| format!("count {} is too large", count))?;
                    Ok(Box::new(GroupRecencyFilter::new(count)) as BoxedFilter<T>)
                },
            ),
        );
        registry.register(
            AllOfFilter::<T>::TYPE_NAME,
            FilterFactory::composite(vec![], |_, children| {
                Ok(Box::new(AllOfFilter::new(children)) as BoxedFilter<T>)
            }),
        );
        registry.register(
            AnyOfFilter::<T>::TYPE_NAME,
            FilterFactory::composite(vec![], |_, children| {
                Ok(Box::new(AnyOfFilter::new(children)) as BoxedFilter<T>)
            }),
        );
        registry.register(
            NotFilter::<T>::TYPE_NAME,
            FilterFactory::composite(vec![], |_, mut children| {
                if children.len() != 1 {
                    return Err(format!("expects exactly one child, got {}", children.len()));
                }
                let inner = children.remove(0);
                Ok(Box::new(NotFilter::new(inner)) as BoxedFilter<T>)
            }),
        );
        registry
    }

    /// Register a factory; replaces any factory already registered under `type_name`
    pub fn register(&mut self, type_name: impl Into<String>, factory: FilterFactory<T>) {
        let type_name = type_name.into();
        if self.factories.insert(type_name.clone(), factory).is_some() {
            debug!(type_name = %type_name, "replaced filter factory");
        }
    }

    /// Remove a factory
    pub fn unregister(&mut self, type_name: &str) -> Option<FilterFactory<T>> {
        self.factories.remove(type_name)
    }

    /// Get factory by type name
    pub fn get(&self, type_name: &str) -> Option<&FilterFactory<T>> {
        self.factories.get(type_name)
    }

    /// Check if a type name is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// All registered type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Replace the deployment-wide property defaults
    pub fn set_defaults(&mut self, defaults: PropertyDefaults) {
        self.defaults = defaults;
    }

    /// Deployment-wide property defaults
    pub fn defaults(&self) -> &PropertyDefaults {
        &self.defaults
    }

    /// Build one configuration tree
    ///
    /// Failed child nodes are dropped from their parent; a failed root yields
    /// `filter: None`. All failures are returned as diagnostics.
    pub fn build(&self, config: &FilterConfig) -> BuildOutcome<T> {
        let mut diagnostics = Vec::new();
        let filter = self.build_node(config, "filter", &mut diagnostics);
        BuildOutcome { filter, diagnostics }
    }

    /// Build a list of top-level configurations into a chain
    ///
    /// Nodes are addressed as `filters[i]` in diagnostics.
    pub fn build_chain(&self, configs: &[FilterConfig]) -> ChainOutcome<T> {
        let mut diagnostics = Vec::new();
        let filters: Vec<BoxedFilter<T>> = configs
            .iter()
            .enumerate()
            .filter_map(|(i, config)| self.build_node(config, &format!("filters[{}]", i), &mut diagnostics))
            .collect();
        debug!(
            configured = configs.len(),
            built = filters.len(),
            dropped = diagnostics.len(),
            "built filter chain"
        );
        ChainOutcome {
            chain: FilterChain::new(filters),
            diagnostics,
        }
    }

    fn build_node(
        &self,
        config: &FilterConfig,
        path: &str,
        diagnostics: &mut Vec<FilterBuildError>,
    ) -> Option<BoxedFilter<T>> {
        let type_name = config.name.as_str();
        let factory = match self.factories.get(type_name) {
            Some(factory) => factory,
            None => {
                return reject(
                    diagnostics,
                    FilterBuildError::UnknownFilterType {
                        type_name: type_name.to_string(),
                        path: path.to_string(),
                    },
                )
            }
        };

        let props = match self.resolve_properties(factory, config, path) {
            Ok(props) => props,
            Err(e) => return reject(diagnostics, e),
        };

        for name in config.properties.keys() {
            if !factory.properties.iter().any(|p| p.name == name.as_str()) {
                debug!(type_name, path, property = %name, "ignoring undeclared filter property");
            }
        }

        if !factory.takes_children && !config.children.is_empty() {
            return reject(
                diagnostics,
                FilterBuildError::FilterConstruction {
                    type_name: type_name.to_string(),
                    reason: format!("does not take children, {} configured", config.children.len()),
                    path: path.to_string(),
                },
            );
        }

        let children: Vec<BoxedFilter<T>> = config
            .children
            .iter()
            .enumerate()
            .filter_map(|(i, child)| {
                self.build_node(child, &format!("{}.children[{}]", path, i), diagnostics)
            })
            .collect();

        match (factory.construct)(&props, children) {
            Ok(filter) => Some(filter),
            Err(reason) => reject(
                diagnostics,
                FilterBuildError::FilterConstruction {
                    type_name: type_name.to_string(),
                    reason,
                    path: path.to_string(),
                },
            ),
        }
    }

    fn resolve_properties(
        &self,
        factory: &FilterFactory<T>,
        config: &FilterConfig,
        path: &str,
    ) -> Result<ResolvedProperties, FilterBuildError> {
        let type_name = config.name.as_str();
        let mut resolved = ResolvedProperties::default();
        for spec in &factory.properties {
            let value = config
                .property(spec.name)
                .or_else(|| self.defaults.resolve(type_name, spec.name))
                .or(spec.default.as_ref())
                .ok_or_else(|| FilterBuildError::MissingProperty {
                    type_name: type_name.to_string(),
                    property: spec.name.to_string(),
                    path: path.to_string(),
                })?;
            if !spec.kind.admits(value) {
                return Err(FilterBuildError::InvalidProperty {
                    type_name: type_name.to_string(),
                    property: spec.name.to_string(),
                    expected: spec.kind.as_str().to_string(),
                    actual: value.to_string(),
                    path: path.to_string(),
                });
            }
            resolved.insert(spec.name, value.clone());
        }
        Ok(resolved)
    }
}

fn reject<T: Coordinate>(diagnostics: &mut Vec<FilterBuildError>, error: FilterBuildError) -> Option<BoxedFilter<T>> {
    warn!(path = error.path(), error = %error, "dropping filter node");
    diagnostics.push(error);
    None
}

impl<T: Coordinate> Default for FilterRegistry<T> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl<T: Coordinate> fmt::Debug for FilterRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("type_names", &self.type_names())
            .field("defaults", &self.defaults)
            .finish()
    }
}
