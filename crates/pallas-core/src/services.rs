//! Typed service registry.
//!
//! Services are registered at application startup and resolved by type when
//! controllers are activated, when filter factories create filters, and when a
//! parameter is bound from services.
//!
//! # Example
//!
//! ```rust
//! use pallas_core::services::Services;
//! use std::sync::Arc;
//!
//! struct Clock;
//!
//! let mut services = Services::new();
//! services.register(Arc::new(Clock));
//!
//! let clock: Option<Arc<Clock>> = services.resolve();
//! assert!(clock.is_some());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Error when a service cannot be resolved.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to resolve {type_name}: {reason}")]
pub struct ServiceError {
    /// The type name that could not be resolved.
    pub type_name: &'static str,
    /// The reason for the failure.
    pub reason: String,
}

impl ServiceError {
    /// Creates an error for a service that was never registered.
    pub fn not_registered<T>() -> Self {
        Self::not_registered_named(std::any::type_name::<T>())
    }

    /// Creates an error for a service known only by name.
    pub fn not_registered_named(type_name: &'static str) -> Self {
        Self {
            type_name,
            reason: "service not registered".to_string(),
        }
    }
}

/// A registry of shared services keyed by type.
///
/// The registry is `Send + Sync` and is shared by every request through an
/// `Arc`. Registration happens before the application starts serving.
#[derive(Default, Clone)]
pub struct Services {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers a service, replacing any previous registration of the same type.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.entries.insert(TypeId::of::<T>(), service);
    }

    /// Builder-style variant of [`register`](Self::register).
    #[must_use]
    pub fn with<T: Send + Sync + 'static>(mut self, service: Arc<T>) -> Self {
        self.register(service);
        self
    }

    /// Resolves a service by type.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|s| s.clone().downcast::<T>().ok())
    }

    /// Resolves a service or returns an error.
    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ServiceError> {
        self.resolve().ok_or_else(ServiceError::not_registered::<T>)
    }

    /// Resolves a service by its runtime `TypeId`.
    ///
    /// Used by binders that only know the parameter type through metadata.
    #[must_use]
    pub fn resolve_erased(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries.get(&type_id).cloned()
    }

    /// Checks if a service is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("service_count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Repository {
        name: &'static str,
    }

    #[test]
    fn test_register_and_resolve() {
        let mut services = Services::new();
        services.register(Arc::new(Repository { name: "orders" }));

        let repo: Arc<Repository> = services.resolve().unwrap();
        assert_eq!(repo.name, "orders");
        assert!(services.contains::<Repository>());
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn test_resolve_required_missing() {
        let services = Services::new();
        let err = services.resolve_required::<Repository>().unwrap_err();
        assert!(err.to_string().contains("Repository"));
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn test_resolve_erased() {
        let services = Services::new().with(Arc::new(Repository { name: "users" }));
        let erased = services
            .resolve_erased(TypeId::of::<Repository>())
            .unwrap();
        let repo = erased.downcast::<Repository>().unwrap();
        assert_eq!(repo.name, "users");
        assert!(services.resolve_erased(TypeId::of::<String>()).is_none());
    }

    #[test]
    fn test_debug_reports_count() {
        let services = Services::new().with(Arc::new(Repository { name: "x" }));
        let debug = format!("{services:?}");
        assert!(debug.contains("service_count: 1"));
    }
}
