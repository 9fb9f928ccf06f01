//! Statement synthesis.
//!
//! Statements come in two families:
//!
//! - **Templates** are built from the entity type alone. Every column is a
//!   placeholder, so one template serves every row of a batch and is cached
//!   per type, dialect and [`TemplateKind`].
//! - **Instance statements** are built from a live value. Null columns that
//!   are not hard-listed are left out of the statement entirely, so their
//!   shape depends on the data and they are never cached.
//!
//! ```ignore
//! use sqlsynth_core::dialect::DialectKind;
//! use sqlsynth_core::statement::{StatementSynthesizer, WritePolicy};
//!
//! let synth = StatementSynthesizer::new(DialectKind::MySql.dialect());
//! let stmt = synth.merge_instance(&staff, &WritePolicy::soft())?;
//! let params = stmt.bind(&staff)?;
//! ```

mod cache;
mod synth;

use std::collections::BTreeSet;

pub use cache::StatementCache;
pub use synth::StatementSynthesizer;

use crate::entity::{Entity, FieldRef};
use crate::error::{Error, Result};
use crate::value::SqlValue;

/// SQL text together with the fields bound to its placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStatement {
    table: &'static str,
    sql: String,
    bound_fields: Vec<FieldRef>,
}

impl GeneratedStatement {
    pub(crate) fn new(table: &'static str, sql: String, bound_fields: Vec<FieldRef>) -> Self {
        Self {
            table,
            sql,
            bound_fields,
        }
    }

    /// Returns the statement text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the fields in placeholder order.
    #[must_use]
    pub fn bound_fields(&self) -> &[FieldRef] {
        &self.bound_fields
    }

    /// Returns the target table.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// Reads the bound fields of `entity` in placeholder order.
    pub fn bind<E: Entity>(&self, entity: &E) -> Result<Vec<SqlValue>> {
        self.bound_fields
            .iter()
            .map(|field| {
                entity.field_value(field).ok_or_else(|| Error::DataAccess {
                    entity: self.table.to_owned(),
                    field: (*field).to_owned(),
                })
            })
            .collect()
    }
}

/// Which non-key fields are overwritten regardless of their value.
///
/// A soft write keeps the stored value of a column whose new value is null;
/// a hard write always overwrites it. Individual fields may be listed as hard
/// on an otherwise soft policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WritePolicy {
    overwrite_all: bool,
    hard_fields: BTreeSet<String>,
}

impl WritePolicy {
    /// Null values leave the stored column untouched.
    #[must_use]
    pub fn soft() -> Self {
        Self::default()
    }

    /// Every field is written, nulls included.
    #[must_use]
    pub fn hard() -> Self {
        Self {
            overwrite_all: true,
            hard_fields: BTreeSet::new(),
        }
    }

    /// Marks one field as hard.
    #[must_use]
    pub fn with_hard_field(mut self, field: impl Into<String>) -> Self {
        self.hard_fields.insert(field.into());
        self
    }

    /// Returns whether `field` is written even when null.
    #[must_use]
    pub fn is_hard(&self, field: &str) -> bool {
        self.overwrite_all || self.hard_fields.contains(field)
    }

    /// Returns the individually listed hard fields.
    pub fn hard_fields(&self) -> impl Iterator<Item = &str> {
        self.hard_fields.iter().map(String::as_str)
    }
}

/// The by-type statements the synthesizer can build and cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// `INSERT` of every column.
    Insert,
    /// `UPDATE … WHERE <keys>`; soft columns fall back to the stored value.
    UpdateByKey(WritePolicy),
    /// `DELETE … WHERE <keys>`.
    DeleteByKey,
    /// `SELECT <columns> … WHERE <keys>`.
    SelectByKey,
    /// Insert-or-update of every column.
    Merge(WritePolicy),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_hardness() {
        assert!(!WritePolicy::soft().is_hard("name"));
        assert!(WritePolicy::hard().is_hard("name"));

        let part = WritePolicy::soft().with_hard_field("name");
        assert!(part.is_hard("name"));
        assert!(!part.is_hard("email"));
        assert_eq!(part.hard_fields().collect::<Vec<_>>(), ["name"]);
    }

    #[test]
    fn test_policy_is_a_stable_cache_key() {
        let a = WritePolicy::soft().with_hard_field("b").with_hard_field("a");
        let b = WritePolicy::soft().with_hard_field("a").with_hard_field("b");
        assert_eq!(TemplateKind::Merge(a), TemplateKind::Merge(b));
    }
}
