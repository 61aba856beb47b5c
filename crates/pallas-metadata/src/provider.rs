//! Metadata providers: the owners and caches of metadata nodes.

use crate::attributes::ModelAttributes;
use crate::details::{CompositeMetadataDetailsProvider, MetadataDetailsProvider};
use crate::identity::ModelMetadataIdentity;
use crate::metadata::{MetadataDetails, ModelMetadata};
use crate::type_info::{ParameterInfo, Reflect, TypeInfo};
use dashmap::DashMap;
use std::any::TypeId;
use std::hash::Hash;
use std::sync::{Arc, OnceLock, Weak};

/// Produces shared metadata nodes.
pub trait ModelMetadataProvider: Send + Sync {
    /// Metadata of a type.
    fn get_metadata_for_type(&self, model_type: &TypeInfo) -> Arc<ModelMetadata>;

    /// Metadata of every declared property of `container`, in declaration order.
    fn get_metadata_for_properties(&self, container: &TypeInfo) -> Vec<Arc<ModelMetadata>>;

    /// Metadata of an action parameter.
    fn get_metadata_for_parameter(&self, parameter: &ParameterInfo) -> Arc<ModelMetadata>;
}

type Cell<V> = Arc<OnceLock<V>>;

/// Caching provider backed by a [`MetadataDetailsProvider`].
///
/// Every identity maps to one compute-once cell. The cell is cloned out of the
/// map before it is initialized, so no map shard lock is held while a node is
/// built, and concurrent first requests for one identity observe the same node.
///
/// # Example
///
/// ```
/// use pallas_metadata::{DefaultModelMetadataProvider, ModelMetadataProvider, Reflect};
/// use std::sync::Arc;
///
/// let provider = DefaultModelMetadataProvider::with_defaults();
/// let first = provider.get_metadata_for_type(&i32::type_info());
/// let second = provider.get_metadata_for_type(&i32::type_info());
/// assert!(Arc::ptr_eq(&first, &second));
/// assert!(first.is_required());
/// ```
pub struct DefaultModelMetadataProvider {
    this: Weak<DefaultModelMetadataProvider>,
    details_provider: Arc<dyn MetadataDetailsProvider>,
    types: DashMap<TypeId, Cell<Arc<ModelMetadata>>>,
    properties: DashMap<TypeId, Cell<Vec<Arc<ModelMetadata>>>>,
    parameters: DashMap<ModelMetadataIdentity, Cell<Arc<ModelMetadata>>>,
}

impl DefaultModelMetadataProvider {
    /// Creates a provider using `details_provider` for every node.
    #[must_use]
    pub fn new(details_provider: Arc<dyn MetadataDetailsProvider>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            details_provider,
            types: DashMap::new(),
            properties: DashMap::new(),
            parameters: DashMap::new(),
        })
    }

    /// Creates a provider with the framework's binding and display providers.
    #[must_use]
    pub fn with_defaults() -> Arc<Self> {
        Self::new(Arc::new(CompositeMetadataDetailsProvider::with_defaults()))
    }

    /// Metadata of `T`.
    #[must_use]
    pub fn metadata_for<T: Reflect>(&self) -> Arc<ModelMetadata> {
        self.get_metadata_for_type(&T::type_info())
    }

    /// The details provider shared by all nodes.
    #[must_use]
    pub fn details_provider(&self) -> &Arc<dyn MetadataDetailsProvider> {
        &self.details_provider
    }

    /// Number of cached type nodes.
    #[must_use]
    pub fn cached_type_count(&self) -> usize {
        self.types.len()
    }

    fn create(&self, details: MetadataDetails) -> Arc<ModelMetadata> {
        let provider: Weak<dyn ModelMetadataProvider> = self.this.clone();
        tracing::trace!(node = %details.key, "creating metadata node");
        Arc::new(ModelMetadata::new(
            provider,
            self.details_provider.clone(),
            details,
        ))
    }
}

fn cell<K: Eq + Hash, V>(map: &DashMap<K, Cell<V>>, key: K) -> Cell<V> {
    map.entry(key).or_default().clone()
}

impl ModelMetadataProvider for DefaultModelMetadataProvider {
    fn get_metadata_for_type(&self, model_type: &TypeInfo) -> Arc<ModelMetadata> {
        let slot = cell(&self.types, model_type.type_id());
        slot.get_or_init(|| {
            let key = ModelMetadataIdentity::for_type(model_type.clone());
            self.create(MetadataDetails::new(key, ModelAttributes::for_type(model_type)))
        })
        .clone()
    }

    fn get_metadata_for_properties(&self, container: &TypeInfo) -> Vec<Arc<ModelMetadata>> {
        let slot = cell(&self.properties, container.type_id());
        slot.get_or_init(|| {
            container
                .properties()
                .iter()
                .map(|property| {
                    let property_type = property.property_type();
                    let attributes =
                        ModelAttributes::for_property(container, property, &property_type);
                    let key = ModelMetadataIdentity::for_property(
                        property_type,
                        property.name(),
                        container.clone(),
                    );
                    self.create(MetadataDetails::new(key, attributes).with_property(property.clone()))
                })
                .collect()
        })
        .clone()
    }

    fn get_metadata_for_parameter(&self, parameter: &ParameterInfo) -> Arc<ModelMetadata> {
        let key = ModelMetadataIdentity::for_parameter(
            parameter.parameter_type().clone(),
            parameter.name(),
            parameter.owner(),
        );
        let slot = cell(&self.parameters, key.clone());
        slot.get_or_init(|| {
            self.create(MetadataDetails::new(key, ModelAttributes::for_parameter(parameter)))
        })
        .clone()
    }
}

impl std::fmt::Debug for DefaultModelMetadataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultModelMetadataProvider")
            .field("types", &self.types.len())
            .field("properties", &self.properties.len())
            .field("parameters", &self.parameters.len())
            .finish_non_exhaustive()
    }
}
