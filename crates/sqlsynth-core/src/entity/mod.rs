//! Entity metadata.
//!
//! An entity is a Rust struct mapped onto one table. The `#[derive(Entity)]`
//! macro from `sqlsynth-derive` implements [`Entity`] by emitting an
//! [`EntityDescriptor`] built from the struct's fields, and a field accessor
//! that turns a field of a live instance into a [`SqlValue`].
//!
//! ```ignore
//! use sqlsynth_derive::Entity;
//!
//! #[derive(Entity)]
//! #[entity(table = "staff")]
//! struct Staff {
//!     #[column(primary_key)]
//!     staff_id: String,
//!     staff_name: Option<String>,
//!     position: Option<String>,
//! }
//! ```

mod cache;

pub use cache::{describe, EntityMetadataCache};

use crate::error::{Error, Result};
use crate::value::SqlValue;

/// Reference to an entity field by its Rust field name.
pub type FieldRef = &'static str;

/// Trait implemented by every entity type.
pub trait Entity: 'static {
    /// Builds the descriptor for this type.
    ///
    /// Called once per type; use [`describe`] to get the cached value.
    fn descriptor() -> EntityDescriptor;

    /// Reads a field of this instance as a bindable value.
    ///
    /// Returns `None` when the entity has no field of that name.
    fn field_value(&self, field: &str) -> Option<SqlValue>;
}

/// One mapped field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// The Rust field the column is read from.
    pub field: FieldRef,
    /// The SQL column name.
    pub column: &'static str,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

/// Table name and ordered columns of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    table: &'static str,
    columns: Vec<ColumnDescriptor>,
}

impl EntityDescriptor {
    /// Creates an empty descriptor for the given table.
    #[must_use]
    pub const fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
        }
    }

    /// Appends a regular column.
    #[must_use]
    pub fn column(self, field: FieldRef, column: &'static str) -> Self {
        self.declare(ColumnDescriptor {
            field,
            column,
            primary_key: false,
        })
    }

    /// Appends a primary-key column.
    #[must_use]
    pub fn primary_key(self, field: FieldRef, column: &'static str) -> Self {
        self.declare(ColumnDescriptor {
            field,
            column,
            primary_key: true,
        })
    }

    /// Embeds the columns of another entity at the current position.
    ///
    /// Columns already declared on this descriptor shadow embedded columns
    /// with the same field name.
    #[must_use]
    pub fn embed(mut self, base: Self) -> Self {
        for col in base.columns {
            if self.find_field(col.field).is_none() {
                self.columns.push(col);
            }
        }
        self
    }

    /// Declares an own column. A previously embedded column with the same
    /// field name is replaced in place.
    fn declare(mut self, col: ColumnDescriptor) -> Self {
        match self.columns.iter_mut().find(|c| c.field == col.field) {
            Some(existing) => *existing = col,
            None => self.columns.push(col),
        }
        self
    }

    /// Returns the table name.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// Returns all columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Returns the primary-key columns in declaration order.
    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Returns the non-key columns in declaration order.
    pub fn non_key_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| !c.primary_key)
    }

    /// Looks up a column by field name.
    #[must_use]
    pub fn find_field(&self, field: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Fails with `ColumnNotFound` when the entity maps no column at all.
    pub fn require_columns(&self, operation: &'static str) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::ColumnNotFound {
                entity: self.table.to_owned(),
                operation,
            });
        }
        Ok(())
    }

    /// Fails with `PrimaryKeyNotFound` when the entity has no key column.
    pub fn require_primary_key(&self, operation: &'static str) -> Result<()> {
        self.require_columns(operation)?;
        if self.primary_keys().next().is_none() {
            return Err(Error::PrimaryKeyNotFound {
                entity: self.table.to_owned(),
                operation,
            });
        }
        Ok(())
    }
}
