//! Binder selection and caching.
//!
//! [`ModelBinderFactory`] asks its providers in order for a binder and
//! caches the answer per metadata identity and binding info, so every
//! request for the same member reuses one binder instance.

use crate::binders::{
    BodyModelBinder, CollectionModelBinder, ComplexTypeModelBinder, HeaderModelBinder,
    ModelBinder, ServicesModelBinder, SimpleTypeModelBinder,
};
use crate::context::BindingInfo;
use crate::error::BindingError;
use crate::formatters::{InputFormatter, JsonInputFormatter, PlainTextInputFormatter};
use crate::messages::BindingMessages;
use dashmap::DashMap;
use pallas_metadata::{BindingSource, ModelMetadata, ModelMetadataIdentity};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// What a binder provider sees.
#[derive(Debug)]
pub struct ModelBinderProviderContext<'a> {
    /// Metadata of the model.
    pub metadata: &'a Arc<ModelMetadata>,
    /// Effective binding info.
    pub binding_info: &'a BindingInfo,
}

/// Offers a binder for some models.
pub trait ModelBinderProvider: Send + Sync + std::fmt::Debug {
    /// Returns a binder if this provider handles the model.
    fn get_binder(&self, context: &ModelBinderProviderContext<'_>) -> Option<Arc<dyn ModelBinder>>;
}

/// Binders registered by name and selected with [`ModelBinderAttribute`].
///
/// [`ModelBinderAttribute`]: pallas_metadata::ModelBinderAttribute
#[derive(Debug, Default, Clone)]
pub struct ModelBinderRegistry {
    binders: HashMap<String, Arc<dyn ModelBinder>>,
}

impl ModelBinderRegistry {
    /// Registers a binder under `name`.
    pub fn register(&mut self, name: impl Into<String>, binder: Arc<dyn ModelBinder>) {
        self.binders.insert(name.into(), binder);
    }

    /// Looks up a binder.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ModelBinder>> {
        self.binders.get(name)
    }

    /// Number of registered binders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.binders.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }
}

#[derive(Debug)]
struct BinderTypeProvider(Arc<ModelBinderRegistry>);

impl ModelBinderProvider for BinderTypeProvider {
    fn get_binder(&self, context: &ModelBinderProviderContext<'_>) -> Option<Arc<dyn ModelBinder>> {
        let name = context.binding_info.binder_type.as_deref()?;
        self.0.get(name).cloned()
    }
}

#[derive(Debug)]
struct SourceProvider {
    source: BindingSource,
    binder: Arc<dyn ModelBinder>,
}

impl ModelBinderProvider for SourceProvider {
    fn get_binder(&self, context: &ModelBinderProviderContext<'_>) -> Option<Arc<dyn ModelBinder>> {
        (context.binding_info.binding_source == Some(self.source)).then(|| self.binder.clone())
    }
}

#[derive(Debug)]
struct SimpleTypeProvider;

impl ModelBinderProvider for SimpleTypeProvider {
    fn get_binder(&self, context: &ModelBinderProviderContext<'_>) -> Option<Arc<dyn ModelBinder>> {
        (!context.metadata.is_complex_type())
            .then(|| Arc::new(SimpleTypeModelBinder) as Arc<dyn ModelBinder>)
    }
}

#[derive(Debug)]
struct CollectionProvider;

impl ModelBinderProvider for CollectionProvider {
    fn get_binder(&self, context: &ModelBinderProviderContext<'_>) -> Option<Arc<dyn ModelBinder>> {
        context
            .metadata
            .is_enumerable_type()
            .then(|| Arc::new(CollectionModelBinder) as Arc<dyn ModelBinder>)
    }
}

#[derive(Debug)]
struct ComplexTypeProvider;

impl ModelBinderProvider for ComplexTypeProvider {
    fn get_binder(&self, context: &ModelBinderProviderContext<'_>) -> Option<Arc<dyn ModelBinder>> {
        let metadata = context.metadata;
        (metadata.is_complex_type() && !metadata.is_enumerable_type())
            .then(|| Arc::new(ComplexTypeModelBinder) as Arc<dyn ModelBinder>)
    }
}

type BinderKey = (ModelMetadataIdentity, BindingInfo);

/// Selects binders through a provider chain and caches them.
///
/// Built-in provider order: named binder, services, body, header, simple
/// type, collection, complex type. Providers added with
/// [`ModelBinderFactoryBuilder::provider`] run before the built-ins.
///
/// # Example
///
/// ```
/// use pallas_binding::{BindingInfo, ModelBinderFactory};
/// use pallas_metadata::{DefaultModelMetadataProvider, ModelMetadataProvider, Reflect};
///
/// let metadata = DefaultModelMetadataProvider::with_defaults();
/// let factory = ModelBinderFactory::new();
/// let int = metadata.get_metadata_for_type(&i32::type_info());
///
/// let first = factory.create_binder(&int, &BindingInfo::default()).unwrap();
/// let second = factory.create_binder(&int, &BindingInfo::default()).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug)]
pub struct ModelBinderFactory {
    providers: Vec<Arc<dyn ModelBinderProvider>>,
    registry: Arc<ModelBinderRegistry>,
    formatters: Arc<[Arc<dyn InputFormatter>]>,
    messages: BindingMessages,
    cache: DashMap<BinderKey, Arc<OnceLock<Option<Arc<dyn ModelBinder>>>>>,
}

impl Default for ModelBinderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBinderFactory {
    /// A factory with the JSON and plain-text formatters and no named binders.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().default_formatters().build()
    }

    /// Starts configuring a factory.
    #[must_use]
    pub fn builder() -> ModelBinderFactoryBuilder {
        ModelBinderFactoryBuilder::default()
    }

    /// Message templates shared by every binder.
    #[must_use]
    pub fn messages(&self) -> &BindingMessages {
        &self.messages
    }

    /// The registered input formatters.
    #[must_use]
    pub fn formatters(&self) -> &[Arc<dyn InputFormatter>] {
        &self.formatters
    }

    /// Number of cached binder selections.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Binder for a member, using the binding info of its metadata.
    pub fn create_binder_for(
        &self,
        metadata: &Arc<ModelMetadata>,
    ) -> Result<Arc<dyn ModelBinder>, BindingError> {
        self.create_binder(metadata, &BindingInfo::from_metadata(metadata))
    }

    /// Binder for a model with explicit binding info.
    ///
    /// # Errors
    ///
    /// [`BindingError::UnknownBinder`] when the info names an unregistered
    /// binder, [`BindingError::BinderNotFound`] when no provider handles the
    /// model.
    pub fn create_binder(
        &self,
        metadata: &Arc<ModelMetadata>,
        binding_info: &BindingInfo,
    ) -> Result<Arc<dyn ModelBinder>, BindingError> {
        if let Some(name) = binding_info.binder_type.as_deref() {
            if self.registry.get(name).is_none() {
                return Err(BindingError::unknown_binder(name));
            }
        }

        let key = (metadata.identity().clone(), binding_info.clone());
        let cell = self.cache.entry(key).or_default().clone();
        cell.get_or_init(|| {
            let context = ModelBinderProviderContext {
                metadata,
                binding_info,
            };
            let binder = self
                .providers
                .iter()
                .find_map(|provider| provider.get_binder(&context));
            tracing::trace!(
                model = %metadata.identity(),
                found = binder.is_some(),
                "selected model binder"
            );
            binder
        })
        .clone()
        .ok_or_else(|| BindingError::binder_not_found(metadata.model_type().name()))
    }
}

/// Builder for [`ModelBinderFactory`].
#[derive(Debug, Default)]
pub struct ModelBinderFactoryBuilder {
    providers: Vec<Arc<dyn ModelBinderProvider>>,
    registry: ModelBinderRegistry,
    formatters: Vec<Arc<dyn InputFormatter>>,
    messages: BindingMessages,
    allow_empty_body: bool,
}

impl ModelBinderFactoryBuilder {
    /// Adds the JSON and plain-text formatters.
    #[must_use]
    pub fn default_formatters(self) -> Self {
        self.formatter(JsonInputFormatter::default())
            .formatter(PlainTextInputFormatter)
    }

    /// Appends an input formatter.
    #[must_use]
    pub fn formatter(mut self, formatter: impl InputFormatter + 'static) -> Self {
        self.formatters.push(Arc::new(formatter));
        self
    }

    /// Registers a named binder.
    #[must_use]
    pub fn binder(mut self, name: impl Into<String>, binder: impl ModelBinder + 'static) -> Self {
        self.registry.register(name, Arc::new(binder));
        self
    }

    /// Adds a provider that runs before the built-in ones.
    #[must_use]
    pub fn provider(mut self, provider: impl ModelBinderProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Replaces the message templates.
    #[must_use]
    pub fn messages(mut self, messages: BindingMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Binds empty bodies as the type default.
    #[must_use]
    pub fn allow_empty_body(mut self, allow: bool) -> Self {
        self.allow_empty_body = allow;
        self
    }

    /// Builds the factory.
    #[must_use]
    pub fn build(self) -> ModelBinderFactory {
        let registry = Arc::new(self.registry);
        let formatters: Arc<[Arc<dyn InputFormatter>]> = self.formatters.into();
        let body = BodyModelBinder::new(formatters.clone()).allow_empty_body(self.allow_empty_body);

        let mut providers = self.providers;
        providers.push(Arc::new(BinderTypeProvider(registry.clone())));
        providers.push(Arc::new(SourceProvider {
            source: BindingSource::Services,
            binder: Arc::new(ServicesModelBinder),
        }));
        providers.push(Arc::new(SourceProvider {
            source: BindingSource::Body,
            binder: Arc::new(body),
        }));
        providers.push(Arc::new(SourceProvider {
            source: BindingSource::Header,
            binder: Arc::new(HeaderModelBinder),
        }));
        providers.push(Arc::new(SimpleTypeProvider));
        providers.push(Arc::new(CollectionProvider));
        providers.push(Arc::new(ComplexTypeProvider));

        ModelBinderFactory {
            providers,
            registry,
            formatters,
            messages: self.messages,
            cache: DashMap::new(),
        }
    }
}
