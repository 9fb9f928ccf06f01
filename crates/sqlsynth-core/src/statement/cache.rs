//! Process-wide cache of by-type statements.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::{GeneratedStatement, TemplateKind};
use crate::dialect::DialectKind;
use crate::entity::Entity;
use crate::error::Result;

type CacheKey = (TypeId, DialectKind, TemplateKind);

/// Caches templates per entity type, dialect and template kind.
///
/// Failed builds are not cached; the next request retries them.
#[derive(Debug, Default)]
pub struct StatementCache {
    entries: RwLock<HashMap<CacheKey, Arc<GeneratedStatement>>>,
}

impl StatementCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide cache.
    pub fn global() -> &'static Self {
        static CACHE: OnceLock<StatementCache> = OnceLock::new();
        CACHE.get_or_init(Self::new)
    }

    /// Returns the cached statement, or builds and publishes it.
    ///
    /// Two threads racing on the same key may both build; the first
    /// published value wins and both callers receive it.
    pub fn get_or_build<E, F>(
        &self,
        dialect: DialectKind,
        kind: &TemplateKind,
        build: F,
    ) -> Result<Arc<GeneratedStatement>>
    where
        E: Entity,
        F: FnOnce() -> Result<GeneratedStatement>,
    {
        let key = (TypeId::of::<E>(), dialect, kind.clone());
        if let Some(found) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(found));
        }

        let built = Arc::new(build()?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(built)))
    }

    /// Returns the number of cached statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no statement has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityDescriptor;
    use crate::error::Error;
    use crate::statement::WritePolicy;
    use crate::value::SqlValue;

    struct Item;

    impl Entity for Item {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("item").primary_key("id", "id")
        }

        fn field_value(&self, _field: &str) -> Option<SqlValue> {
            None
        }
    }

    fn stmt(sql: &str) -> Result<GeneratedStatement> {
        Ok(GeneratedStatement::new("item", sql.to_owned(), vec!["id"]))
    }

    #[test]
    fn test_statement_is_built_once_per_key() {
        let cache = StatementCache::new();
        let kind = TemplateKind::Insert;

        let first = cache
            .get_or_build::<Item, _>(DialectKind::MySql, &kind, || stmt("a"))
            .unwrap();
        let again = cache
            .get_or_build::<Item, _>(DialectKind::MySql, &kind, || panic!("rebuilt"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        cache
            .get_or_build::<Item, _>(DialectKind::Sqlite, &kind, || stmt("b"))
            .unwrap();
        cache
            .get_or_build::<Item, _>(
                DialectKind::MySql,
                &TemplateKind::Merge(WritePolicy::hard()),
                || stmt("c"),
            )
            .unwrap();
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let cache = StatementCache::new();
        let err = cache
            .get_or_build::<Item, _>(DialectKind::MySql, &TemplateKind::DeleteByKey, || {
                Err(Error::PrimaryKeyNotFound {
                    entity: "item".into(),
                    operation: "delete",
                })
            })
            .unwrap_err();
        assert!(matches!(err, Error::PrimaryKeyNotFound { .. }));
        assert!(cache.is_empty());
    }
}
