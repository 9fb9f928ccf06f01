//! Per-dialect statement synthesis.

use std::sync::Arc;

use tracing::debug;

use super::{GeneratedStatement, StatementCache, TemplateKind, WritePolicy};
use crate::dialect::{insert_values, Dialect, MergePlan};
use crate::entity::{describe, ColumnDescriptor, Entity, EntityDescriptor, FieldRef};
use crate::error::{Error, Result};

/// Builds INSERT, UPDATE, DELETE, SELECT and MERGE statements for one
/// dialect.
#[derive(Debug, Clone, Copy)]
pub struct StatementSynthesizer<'d> {
    dialect: &'d dyn Dialect,
}

impl<'d> StatementSynthesizer<'d> {
    /// Creates a synthesizer for `dialect`.
    #[must_use]
    pub const fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect }
    }

    /// Returns the dialect this synthesizer renders for.
    #[must_use]
    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Returns the cached by-type statement for `E`, building it on first
    /// use.
    pub fn template<E: Entity>(&self, kind: &TemplateKind) -> Result<Arc<GeneratedStatement>> {
        StatementCache::global().get_or_build::<E, _>(self.dialect.kind(), kind, || {
            let descriptor = describe::<E>();
            self.build_template(&descriptor, kind)
        })
    }

    /// Builds a by-type statement without consulting the cache.
    pub fn build_template(
        &self,
        descriptor: &EntityDescriptor,
        kind: &TemplateKind,
    ) -> Result<GeneratedStatement> {
        match kind {
            TemplateKind::Insert => self.insert(descriptor),
            TemplateKind::UpdateByKey(policy) => self.update_by_key(descriptor, policy),
            TemplateKind::DeleteByKey => self.delete_by_key(descriptor),
            TemplateKind::SelectByKey => self.select_by_key(descriptor),
            TemplateKind::Merge(policy) => self.merge(descriptor, policy),
        }
    }

    /// `INSERT INTO t (<all columns>) VALUES (?, …)`.
    pub fn insert(&self, descriptor: &EntityDescriptor) -> Result<GeneratedStatement> {
        descriptor.require_columns("insert")?;
        let columns: Vec<&ColumnDescriptor> = descriptor.columns().iter().collect();
        Ok(self.insert_of(descriptor, &columns))
    }

    /// `UPDATE t SET … WHERE <keys>` for every non-key column.
    ///
    /// Hard columns are assigned directly; soft columns keep the stored
    /// value when the bound value is null.
    pub fn update_by_key(
        &self,
        descriptor: &EntityDescriptor,
        policy: &WritePolicy,
    ) -> Result<GeneratedStatement> {
        descriptor.require_primary_key("update")?;
        check_policy(descriptor, policy)?;
        let fallback = self.dialect.null_fallback();

        let assignments: Vec<(String, FieldRef)> = descriptor
            .non_key_columns()
            .map(|c| {
                let set = if policy.is_hard(c.field) {
                    format!("{} = ?", c.column)
                } else {
                    format!("{0} = {fallback}(?, {0})", c.column)
                };
                (set, c.field)
            })
            .collect();

        self.update_of(descriptor, assignments)
    }

    /// `DELETE FROM t WHERE <keys>`.
    pub fn delete_by_key(&self, descriptor: &EntityDescriptor) -> Result<GeneratedStatement> {
        descriptor.require_primary_key("delete")?;
        let (predicate, keys) = key_predicate(descriptor);
        let sql = format!("DELETE FROM {} WHERE {predicate}", descriptor.table());
        Ok(self.finish(descriptor, sql, keys))
    }

    /// `SELECT <columns> FROM t WHERE <keys>`.
    pub fn select_by_key(&self, descriptor: &EntityDescriptor) -> Result<GeneratedStatement> {
        descriptor.require_primary_key("get")?;
        let columns: Vec<&str> = descriptor.columns().iter().map(|c| c.column).collect();
        let (predicate, keys) = key_predicate(descriptor);
        let sql = format!(
            "SELECT {} FROM {} WHERE {predicate}",
            columns.join(", "),
            descriptor.table()
        );
        Ok(self.finish(descriptor, sql, keys))
    }

    /// Insert-or-update of every column.
    ///
    /// Hard columns overwrite the stored value; soft columns keep it when the
    /// incoming value is null.
    pub fn merge(
        &self,
        descriptor: &EntityDescriptor,
        policy: &WritePolicy,
    ) -> Result<GeneratedStatement> {
        descriptor.require_primary_key("merge")?;
        check_policy(descriptor, policy)?;
        let columns: Vec<&ColumnDescriptor> = descriptor.columns().iter().collect();
        Ok(self.merge_of(descriptor, &columns, |c| {
            if policy.is_hard(c.field) {
                self.dialect.set_clause(descriptor.table(), c.column)
            } else {
                self.dialect.set_if_null_clause(descriptor.table(), c.column)
            }
        }))
    }

    /// `INSERT` of the non-null and hard-listed columns of `entity`.
    pub fn insert_instance<E: Entity>(
        &self,
        entity: &E,
        policy: &WritePolicy,
    ) -> Result<GeneratedStatement> {
        let descriptor = describe::<E>();
        descriptor.require_columns("insert")?;
        check_policy(&descriptor, policy)?;

        let columns = written_columns(&descriptor, entity, policy, false)?;
        if columns.is_empty() {
            return Err(Error::ColumnNotFound {
                entity: descriptor.table().to_owned(),
                operation: "insert",
            });
        }
        Ok(self.insert_of(&descriptor, &columns))
    }

    /// `UPDATE … WHERE <keys>` of the non-null and hard-listed non-key
    /// columns of `entity`.
    pub fn update_instance<E: Entity>(
        &self,
        entity: &E,
        policy: &WritePolicy,
    ) -> Result<GeneratedStatement> {
        let descriptor = describe::<E>();
        descriptor.require_primary_key("update")?;
        check_policy(&descriptor, policy)?;

        let written = written_columns(&descriptor, entity, policy, false)?;
        let assignments: Vec<(String, FieldRef)> = written
            .into_iter()
            .filter(|c| !c.primary_key)
            .map(|c| (format!("{} = ?", c.column), c.field))
            .collect();

        self.update_of(&descriptor, assignments)
    }

    /// Insert-or-update of the key columns plus the non-null and hard-listed
    /// columns of `entity`.
    ///
    /// When no non-key column survives, the insert-if-not-exists form is
    /// produced.
    pub fn merge_instance<E: Entity>(
        &self,
        entity: &E,
        policy: &WritePolicy,
    ) -> Result<GeneratedStatement> {
        let descriptor = describe::<E>();
        descriptor.require_primary_key("merge")?;
        check_policy(&descriptor, policy)?;

        let columns = written_columns(&descriptor, entity, policy, true)?;
        Ok(self.merge_of(&descriptor, &columns, |c| {
            self.dialect.set_clause(descriptor.table(), c.column)
        }))
    }

    fn insert_of(
        &self,
        descriptor: &EntityDescriptor,
        columns: &[&ColumnDescriptor],
    ) -> GeneratedStatement {
        let names: Vec<&str> = columns.iter().map(|c| c.column).collect();
        let sql = insert_values(descriptor.table(), &names);
        self.finish(descriptor, sql, columns.iter().map(|c| c.field).collect())
    }

    fn update_of(
        &self,
        descriptor: &EntityDescriptor,
        assignments: Vec<(String, FieldRef)>,
    ) -> Result<GeneratedStatement> {
        if assignments.is_empty() {
            return Err(Error::ColumnNotFound {
                entity: descriptor.table().to_owned(),
                operation: "update",
            });
        }

        let (sets, mut bound): (Vec<String>, Vec<FieldRef>) = assignments.into_iter().unzip();
        let (predicate, keys) = key_predicate(descriptor);
        bound.extend(keys);

        let sql = format!(
            "UPDATE {} SET {} WHERE {predicate}",
            descriptor.table(),
            sets.join(", ")
        );
        Ok(self.finish(descriptor, sql, bound))
    }

    fn merge_of(
        &self,
        descriptor: &EntityDescriptor,
        columns: &[&ColumnDescriptor],
        assign: impl Fn(&ColumnDescriptor) -> String,
    ) -> GeneratedStatement {
        let mut plan = MergePlan {
            table: descriptor.table(),
            columns: Vec::with_capacity(columns.len()),
            keys: Vec::new(),
            assignments: Vec::new(),
        };
        for col in columns {
            plan.columns.push(col.column);
            if col.primary_key {
                plan.keys.push(col.column);
            } else {
                plan.assignments.push(assign(*col));
            }
        }

        let sql = self.dialect.merge_statement(&plan);
        self.finish(descriptor, sql, columns.iter().map(|c| c.field).collect())
    }

    fn finish(
        &self,
        descriptor: &EntityDescriptor,
        sql: String,
        bound: Vec<FieldRef>,
    ) -> GeneratedStatement {
        debug!(
            dialect = self.dialect.name(),
            table = descriptor.table(),
            sql = %sql,
            "Synthesized statement"
        );
        GeneratedStatement::new(descriptor.table(), sql, bound)
    }
}

/// `k1 = ? AND k2 = ?` plus the key fields in the same order.
fn key_predicate(descriptor: &EntityDescriptor) -> (String, Vec<FieldRef>) {
    let keys: Vec<&ColumnDescriptor> = descriptor.primary_keys().collect();
    let predicate: Vec<String> = keys.iter().map(|k| format!("{} = ?", k.column)).collect();
    (
        predicate.join(" AND "),
        keys.iter().map(|k| k.field).collect(),
    )
}

/// Columns of `entity` that a soft write touches: non-null or hard-listed
/// values, plus every key column when `keep_keys` is set.
fn written_columns<'a, E: Entity>(
    descriptor: &'a EntityDescriptor,
    entity: &E,
    policy: &WritePolicy,
    keep_keys: bool,
) -> Result<Vec<&'a ColumnDescriptor>> {
    let mut written = Vec::with_capacity(descriptor.columns().len());
    for col in descriptor.columns() {
        if (keep_keys && col.primary_key) || policy.is_hard(col.field) {
            written.push(col);
            continue;
        }
        let value = entity.field_value(col.field).ok_or_else(|| Error::DataAccess {
            entity: descriptor.table().to_owned(),
            field: col.field.to_owned(),
        })?;
        if !value.is_null() {
            written.push(col);
        }
    }
    Ok(written)
}

/// Rejects hard-listed fields the entity does not map.
fn check_policy(descriptor: &EntityDescriptor, policy: &WritePolicy) -> Result<()> {
    match policy
        .hard_fields()
        .find(|field| descriptor.find_field(field).is_none())
    {
        Some(unknown) => Err(Error::DataAccess {
            entity: descriptor.table().to_owned(),
            field: unknown.to_owned(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{DialectKind, MySqlDialect, OracleDialect, PostgresDialect};
    use crate::value::{SqlValue, ToSqlValue};

    struct Staff {
        staff_id: String,
        staff_name: Option<String>,
        position: Option<String>,
    }

    impl Entity for Staff {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("staff")
                .primary_key("staff_id", "staff_id")
                .column("staff_name", "staff_name")
                .column("position", "position")
        }

        fn field_value(&self, field: &str) -> Option<SqlValue> {
            match field {
                "staff_id" => Some(self.staff_id.clone().to_sql_value()),
                "staff_name" => Some(self.staff_name.clone().to_sql_value()),
                "position" => Some(self.position.clone().to_sql_value()),
                _ => None,
            }
        }
    }

    fn engineer() -> Staff {
        Staff {
            staff_id: String::from("1"),
            staff_name: None,
            position: Some(String::from("Eng")),
        }
    }

    #[test]
    fn test_soft_merge_omits_null_columns() {
        let synth = StatementSynthesizer::new(&MySqlDialect);
        let stmt = synth.merge_instance(&engineer(), &WritePolicy::soft()).unwrap();

        assert_eq!(
            stmt.sql(),
            "INSERT INTO staff (staff_id, position) VALUES (?, ?) \
             ON DUPLICATE KEY UPDATE position = VALUES(position)"
        );
        assert_eq!(stmt.bound_fields(), ["staff_id", "position"]);
        assert_eq!(
            stmt.bind(&engineer()).unwrap(),
            vec![SqlValue::Text(String::from("1")), SqlValue::Text(String::from("Eng"))]
        );
    }

    #[test]
    fn test_hard_listed_null_is_written() {
        let synth = StatementSynthesizer::new(&PostgresDialect);
        let policy = WritePolicy::soft().with_hard_field("staff_name");
        let stmt = synth.merge_instance(&engineer(), &policy).unwrap();

        assert_eq!(
            stmt.sql(),
            "INSERT INTO staff (staff_id, staff_name, position) VALUES (?, ?, ?) \
             ON CONFLICT (staff_id) DO UPDATE SET \
             staff_name = EXCLUDED.staff_name, position = EXCLUDED.position"
        );
        assert_eq!(stmt.bind(&engineer()).unwrap()[1], SqlValue::Null);
    }

    #[test]
    fn test_merge_with_only_null_values_becomes_insert_if_absent() {
        let oracle = OracleDialect::new();
        let synth = StatementSynthesizer::new(&oracle);
        let blank = Staff {
            staff_id: String::from("2"),
            staff_name: None,
            position: None,
        };
        let stmt = synth.merge_instance(&blank, &WritePolicy::soft()).unwrap();
        assert_eq!(
            stmt.sql(),
            "MERGE INTO staff X USING (SELECT ? staff_id FROM DUAL) Y \
             ON (X.staff_id = Y.staff_id) \
             WHEN NOT MATCHED THEN INSERT (staff_id) VALUES (Y.staff_id)"
        );
    }

    #[test]
    fn test_part_hard_update_template() {
        let synth = StatementSynthesizer::new(DialectKind::Oracle.dialect());
        let policy = WritePolicy::soft().with_hard_field("position");
        let stmt = synth.update_by_key(&Staff::descriptor(), &policy).unwrap();

        assert_eq!(
            stmt.sql(),
            "UPDATE staff SET staff_name = NVL(?, staff_name), position = ? WHERE staff_id = ?"
        );
        assert_eq!(stmt.bound_fields(), ["staff_name", "position", "staff_id"]);
    }

    #[test]
    fn test_soft_update_instance_skips_null_set() {
        let synth = StatementSynthesizer::new(&MySqlDialect);
        let stmt = synth.update_instance(&engineer(), &WritePolicy::soft()).unwrap();
        assert_eq!(stmt.sql(), "UPDATE staff SET position = ? WHERE staff_id = ?");

        let stmt = synth.update_instance(&engineer(), &WritePolicy::hard()).unwrap();
        assert_eq!(
            stmt.sql(),
            "UPDATE staff SET staff_name = ?, position = ? WHERE staff_id = ?"
        );
    }

    #[test]
    fn test_update_instance_with_nothing_to_set_fails() {
        let synth = StatementSynthesizer::new(&MySqlDialect);
        let blank = Staff {
            staff_id: String::from("3"),
            staff_name: None,
            position: None,
        };
        let err = synth.update_instance(&blank, &WritePolicy::soft()).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { operation: "update", .. }));
    }

    #[test]
    fn test_unknown_hard_field_is_rejected() {
        let synth = StatementSynthesizer::new(&MySqlDialect);
        let policy = WritePolicy::soft().with_hard_field("salary");
        let err = synth.merge(&Staff::descriptor(), &policy).unwrap_err();
        assert!(matches!(err, Error::DataAccess { field, .. } if field == "salary"));
    }

    #[test]
    fn test_delete_and_select_by_key() {
        let synth = StatementSynthesizer::new(&MySqlDialect);
        let desc = Staff::descriptor();
        assert_eq!(
            synth.delete_by_key(&desc).unwrap().sql(),
            "DELETE FROM staff WHERE staff_id = ?"
        );
        assert_eq!(
            synth.select_by_key(&desc).unwrap().sql(),
            "SELECT staff_id, staff_name, position FROM staff WHERE staff_id = ?"
        );
    }

    #[test]
    fn test_templates_are_shared() {
        let synth = StatementSynthesizer::new(DialectKind::Sqlite.dialect());
        let first = synth.template::<Staff>(&TemplateKind::Insert).unwrap();
        let second = synth.template::<Staff>(&TemplateKind::Insert).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            first.sql(),
            "INSERT INTO staff (staff_id, staff_name, position) VALUES (?, ?, ?)"
        );

        let merge = synth
            .template::<Staff>(&TemplateKind::Merge(WritePolicy::soft()))
            .unwrap();
        assert_eq!(
            merge.sql(),
            "INSERT INTO staff (staff_id, staff_name, position) VALUES (?, ?, ?) \
             ON CONFLICT (staff_id) DO UPDATE SET \
             staff_name = COALESCE(excluded.staff_name, staff.staff_name), \
             position = COALESCE(excluded.position, staff.position)"
        );
    }
}
