//! Process-wide entity descriptor cache.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use super::{Entity, EntityDescriptor};

/// Write-once cache of entity descriptors keyed by type.
///
/// Descriptors are immutable once published, so a poisoned lock still holds
/// consistent data and is recovered instead of propagated.
#[derive(Debug, Default)]
pub struct EntityMetadataCache {
    entries: RwLock<HashMap<TypeId, Arc<EntityDescriptor>>>,
}

impl EntityMetadataCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide cache.
    pub fn global() -> &'static Self {
        static CACHE: OnceLock<EntityMetadataCache> = OnceLock::new();
        CACHE.get_or_init(Self::new)
    }

    /// Returns the descriptor of `E`, building it on first access.
    pub fn describe<E: Entity>(&self) -> Arc<EntityDescriptor> {
        let key = TypeId::of::<E>();
        if let Some(found) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(found);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(key).or_insert_with(|| {
            let descriptor = E::descriptor();
            debug!(
                table = descriptor.table(),
                columns = descriptor.columns().len(),
                "Described entity"
            );
            Arc::new(descriptor)
        }))
    }

    /// Returns the number of cached descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been described yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns the descriptor of `E` from the process-wide cache.
pub fn describe<E: Entity>() -> Arc<EntityDescriptor> {
    EntityMetadataCache::global().describe::<E>()
}
