//! Dialect selection from connection URLs.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use tracing::debug;

use super::{Dialect, DialectKind};
use crate::error::{Error, Result};

/// Markers matched against the lowercased connection URL, in priority order.
const MARKERS: &[(&str, DialectKind)] = &[
    ("mysql", DialectKind::MySql),
    ("mariadb", DialectKind::MySql),
    ("oracle11g", DialectKind::OracleLegacy),
    ("oracle", DialectKind::Oracle),
    ("postgres", DialectKind::PostgreSql),
    ("sqlserver", DialectKind::SqlServer),
    ("mssql", DialectKind::SqlServer),
    ("sqlite", DialectKind::Sqlite),
];

/// Maps connection sources to dialects.
///
/// Resolution results are cached per connection source for the lifetime of
/// the registry.
#[derive(Debug, Default)]
pub struct DialectRegistry {
    resolved: RwLock<HashMap<String, DialectKind>>,
}

impl DialectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<DialectRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::new)
    }

    /// Detects the dialect of a connection URL or configuration string.
    ///
    /// The first marker contained in the URL wins.
    pub fn detect(url: &str) -> Result<DialectKind> {
        let lowered = url.to_ascii_lowercase();
        MARKERS
            .iter()
            .find(|(marker, _)| lowered.contains(marker))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| Error::NoSuitableDialect(url.to_owned()))
    }

    /// Returns the dialect for a connection source, detecting it once.
    pub fn resolve(&self, source: &str) -> Result<&'static dyn Dialect> {
        if let Some(kind) = self
            .resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source)
        {
            return Ok(kind.dialect());
        }

        let kind = Self::detect(source)?;
        debug!(dialect = %kind, "Resolved dialect for connection source");
        self.resolved
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source.to_owned(), kind);
        Ok(kind.dialect())
    }
}
