//! Per-node validator cache.

use crate::validator::{
    ModelValidator, ModelValidatorProvider, ModelValidatorProviderContext, ValidatorItem,
};
use dashmap::DashMap;
use pallas_metadata::{ModelMetadata, ModelMetadataIdentity};
use std::fmt;
use std::sync::{Arc, OnceLock};

type Validators = Arc<[Arc<dyn ModelValidator>]>;

#[derive(Debug)]
struct CacheEntry {
    /// The resolved slots, kept so non-reusable validators can be rebuilt.
    items: Vec<ValidatorItem>,
    /// Set when every validator is reusable.
    validators: Option<Validators>,
}

/// Resolves and caches validators per metadata identity.
///
/// Resolution for an identity runs once; later calls return the same
/// validators. Slots a provider marked non-reusable are handed back to the
/// provider on every call so it can build a fresh validator.
pub struct ValidatorCache {
    provider: Arc<dyn ModelValidatorProvider>,
    entries: DashMap<ModelMetadataIdentity, Arc<OnceLock<CacheEntry>>>,
}

impl ValidatorCache {
    /// Creates an empty cache over `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn ModelValidatorProvider>) -> Self {
        Self {
            provider,
            entries: DashMap::new(),
        }
    }

    /// The validators of `metadata`, in provider order.
    pub fn get_validators(&self, metadata: &ModelMetadata) -> Validators {
        let cell = self
            .entries
            .entry(metadata.identity().clone())
            .or_default()
            .clone();
        let entry = cell.get_or_init(|| self.resolve(metadata));

        if let Some(validators) = &entry.validators {
            return validators.clone();
        }

        let mut context = ModelValidatorProviderContext::new(metadata);
        context.results = entry
            .items
            .iter()
            .map(|item| {
                if item.is_reusable {
                    item.clone()
                } else {
                    ValidatorItem {
                        validator: None,
                        ..item.clone()
                    }
                }
            })
            .collect();
        self.provider.create_validators(&mut context);
        collect(&context.results)
    }

    /// Number of cached identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve(&self, metadata: &ModelMetadata) -> CacheEntry {
        let mut context = ModelValidatorProviderContext::new(metadata);
        self.provider.create_validators(&mut context);
        let items = context.results;

        let all_reusable = items.iter().all(|item| item.is_reusable);
        let validators = all_reusable.then(|| collect(&items));
        tracing::trace!(
            node = %metadata,
            validators = items.iter().filter(|i| i.validator.is_some()).count(),
            reusable = all_reusable,
            "resolved validators"
        );
        CacheEntry { items, validators }
    }
}

fn collect(items: &[ValidatorItem]) -> Validators {
    items
        .iter()
        .filter_map(|item| item.validator.clone())
        .collect::<Vec<_>>()
        .into()
}

impl fmt::Debug for ValidatorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorCache")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
