//! Value providers: keyed string values from route data and the query string.

use crate::request::RequestContext;
use pallas_core::{keys, RouteValues};
use pallas_metadata::BindingSource;
use std::fmt;
use std::sync::Arc;

/// The values found for one key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueProviderResult {
    values: Vec<String>,
}

impl ValueProviderResult {
    /// No values.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Wraps the values found.
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Returns `true` if nothing was found.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.values.is_empty()
    }

    /// The first value.
    #[must_use]
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Every value, in request order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for ValueProviderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.values.join(","))
    }
}

/// A source of keyed string values.
pub trait ValueProvider: Send + Sync + fmt::Debug {
    /// Where the values come from.
    fn binding_source(&self) -> BindingSource;

    /// Whether any key equals `prefix` or is nested under it.
    fn contains_prefix(&self, prefix: &str) -> bool;

    /// The values for `key`.
    fn get_value(&self, key: &str) -> ValueProviderResult;
}

/// Values from the route.
#[derive(Debug, Clone)]
pub struct RouteValueProvider {
    values: RouteValues,
}

impl RouteValueProvider {
    /// Wraps route values.
    #[must_use]
    pub fn new(values: RouteValues) -> Self {
        Self { values }
    }
}

impl ValueProvider for RouteValueProvider {
    fn binding_source(&self) -> BindingSource {
        BindingSource::Path
    }

    fn contains_prefix(&self, prefix: &str) -> bool {
        self.values.contains_prefix(prefix)
    }

    fn get_value(&self, key: &str) -> ValueProviderResult {
        self.values
            .get(key)
            .map_or_else(ValueProviderResult::none, |v| {
                ValueProviderResult::new(vec![v.to_string()])
            })
    }
}

/// Values from the query string. Repeated keys yield several values.
#[derive(Debug, Clone, Default)]
pub struct QueryStringValueProvider {
    pairs: Vec<(String, String)>,
}

impl QueryStringValueProvider {
    /// Parses a raw query string. Unparseable input yields no values.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
            Ok(pairs) => Self { pairs },
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed query string");
                Self::default()
            }
        }
    }
}

impl ValueProvider for QueryStringValueProvider {
    fn binding_source(&self) -> BindingSource {
        BindingSource::Query
    }

    fn contains_prefix(&self, prefix: &str) -> bool {
        self.pairs.iter().any(|(k, _)| keys::is_prefix_of(prefix, k))
    }

    fn get_value(&self, key: &str) -> ValueProviderResult {
        ValueProviderResult::new(
            self.pairs
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.clone())
                .collect(),
        )
    }
}

/// Consults providers in order; the first with values wins.
#[derive(Debug, Clone, Default)]
pub struct CompositeValueProvider {
    providers: Vec<Arc<dyn ValueProvider>>,
}

impl CompositeValueProvider {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default providers for a request: route values, then query string.
    #[must_use]
    pub fn for_request(request: &RequestContext) -> Self {
        Self::new()
            .with(RouteValueProvider::new(request.route_values().clone()))
            .with(QueryStringValueProvider::parse(
                request.query_string().unwrap_or(""),
            ))
    }

    /// Appends a provider.
    #[must_use]
    pub fn with(mut self, provider: impl ValueProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Keeps only the providers for `source`.
    #[must_use]
    pub fn filter(&self, source: BindingSource) -> Self {
        Self {
            providers: self
                .providers
                .iter()
                .filter(|p| p.binding_source() == source)
                .cloned()
                .collect(),
        }
    }

    /// Number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if there are no providers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ValueProvider for CompositeValueProvider {
    fn binding_source(&self) -> BindingSource {
        BindingSource::ModelBinding
    }

    fn contains_prefix(&self, prefix: &str) -> bool {
        self.providers.iter().any(|p| p.contains_prefix(prefix))
    }

    fn get_value(&self, key: &str) -> ValueProviderResult {
        self.providers
            .iter()
            .map(|p| p.get_value(key))
            .find(|r| !r.is_none())
            .unwrap_or_default()
    }
}
