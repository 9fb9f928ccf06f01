//! SQL dialect support.
//!
//! Upsert and pagination syntax differ fundamentally between databases.
//! Each database family is a small struct implementing [`Dialect`], which
//! supplies the SQL fragments the synthesizer and the pagination rewriter
//! stitch together.
//!
//! | dialect | upsert form | page strategy |
//! |---|---|---|
//! | MySQL | `ON DUPLICATE KEY UPDATE` | `LIMIT … OFFSET …` |
//! | PostgreSQL | `ON CONFLICT … DO UPDATE` | `LIMIT … OFFSET …` |
//! | SQLite | `ON CONFLICT … DO UPDATE` | `LIMIT … OFFSET …` |
//! | Oracle | `MERGE … USING … FROM DUAL` | `OFFSET … FETCH NEXT …` |
//! | Oracle 11g | `MERGE … USING … FROM DUAL` | nested `ROWNUM` |
//! | SQL Server | `MERGE … USING …;` | `OFFSET … FETCH NEXT …` |

mod mysql;
mod oracle;
mod postgres;
mod registry;
mod sqlite;
mod sqlserver;

use std::fmt;
use std::str::FromStr;

pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use registry::DialectRegistry;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use crate::error::{Error, Result};
use crate::page::{PageRequest, PagedQuery};
use crate::scan::ScanOptions;

/// How a dialect bounds a result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStrategy {
    /// `LIMIT <size> OFFSET <skip>` appended to the query.
    LimitOffset,
    /// `OFFSET <skip> ROW FETCH NEXT <size> ROW ONLY`; needs an ORDER BY.
    OffsetFetch,
    /// Nested sub-selects filtering on `ROWNUM`.
    RowNum,
}

/// Identifies a database family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    /// MySQL and MariaDB.
    MySql,
    /// PostgreSQL.
    PostgreSql,
    /// SQLite 3.24 or later.
    Sqlite,
    /// Oracle 12c or later, paging with `OFFSET … FETCH`.
    Oracle,
    /// Oracle 11g and earlier, paging with `ROWNUM`.
    OracleLegacy,
    /// Microsoft SQL Server 2012 or later.
    SqlServer,
}

impl DialectKind {
    /// All supported dialects.
    pub const ALL: [Self; 6] = [
        Self::MySql,
        Self::PostgreSql,
        Self::Sqlite,
        Self::Oracle,
        Self::OracleLegacy,
        Self::SqlServer,
    ];

    /// Returns the canonical dialect name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::Sqlite => "sqlite",
            Self::Oracle => "oracle",
            Self::OracleLegacy => "oracle11g",
            Self::SqlServer => "sqlserver",
        }
    }

    /// Returns the shared dialect implementation.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        static MYSQL: MySqlDialect = MySqlDialect::new();
        static POSTGRES: PostgresDialect = PostgresDialect::new();
        static SQLITE: SqliteDialect = SqliteDialect::new();
        static ORACLE: OracleDialect = OracleDialect::new();
        static ORACLE_LEGACY: OracleDialect = OracleDialect::legacy();
        static SQLSERVER: SqlServerDialect = SqlServerDialect::new();

        match self {
            Self::MySql => &MYSQL,
            Self::PostgreSql => &POSTGRES,
            Self::Sqlite => &SQLITE,
            Self::Oracle => &ORACLE,
            Self::OracleLegacy => &ORACLE_LEGACY,
            Self::SqlServer => &SQLSERVER,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialectKind {
    type Err = Error;

    /// Parses an explicit dialect name (not a connection URL).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Self::PostgreSql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "oracle" => Ok(Self::Oracle),
            "oracle11g" | "oracle-legacy" => Ok(Self::OracleLegacy),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            _ => Err(Error::NoSuitableDialect(s.to_owned())),
        }
    }
}

/// The pieces of a merge statement, prepared by the synthesizer.
///
/// `assignments` are already rendered through [`Dialect::set_clause`] or
/// [`Dialect::set_if_null_clause`]. An empty assignment list asks for the
/// insert-if-not-exists form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan<'a> {
    /// Target table.
    pub table: &'a str,
    /// Every inserted column, in bind order.
    pub columns: Vec<&'a str>,
    /// Primary-key columns (conflict target or join predicate).
    pub keys: Vec<&'a str>,
    /// Rendered SET entries for the non-key columns.
    pub assignments: Vec<String>,
}

/// Trait for dialect-specific SQL fragments.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Returns the database family.
    fn kind(&self) -> DialectKind;

    /// Returns the name of the dialect.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Returns the function keeping the first non-null argument
    /// (`COALESCE`, `IFNULL`, `NVL`, `ISNULL`).
    fn null_fallback(&self) -> &'static str {
        "COALESCE"
    }

    /// Returns whether the merge form needs an explicit key equality
    /// predicate and a source sub-select (`MERGE … USING`), as opposed to a
    /// native conflict clause.
    fn uses_merge_join(&self) -> bool {
        false
    }

    /// SET entry overwriting `column` with the incoming value.
    fn set_clause(&self, table: &str, column: &str) -> String;

    /// SET entry overwriting `column` only when the incoming value is not
    /// null.
    fn set_if_null_clause(&self, table: &str, column: &str) -> String;

    /// Renders the full insert-or-update statement.
    fn merge_statement(&self, plan: &MergePlan<'_>) -> String;

    /// Returns how this dialect bounds a page.
    fn page_strategy(&self) -> PageStrategy;

    /// Returns the lexing rules for queries written in this dialect.
    fn scan_options(&self) -> ScanOptions {
        ScanOptions::default()
    }

    /// Rewrites `sql` into its count and page queries.
    fn paginate(&self, sql: &str, page: PageRequest) -> Result<PagedQuery> {
        crate::page::rewrite_with(sql, self.page_strategy(), self.scan_options(), page)
    }
}

/// Returns `n` comma-separated `?` placeholders.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Renders `INSERT INTO t (a, b) VALUES (?, ?)`.
pub(crate) fn insert_values(table: &str, columns: &[&str]) -> String {
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders(columns.len())
    )
}

/// Renders the `MERGE … USING` form shared by Oracle and SQL Server.
///
/// `source_from` completes the source sub-select (` FROM DUAL` on Oracle)
/// and `terminator` closes the statement (`;` on SQL Server).
pub(crate) fn merge_using(plan: &MergePlan<'_>, source_from: &str, terminator: &str) -> String {
    let source: Vec<String> = plan.columns.iter().map(|c| format!("? {c}")).collect();
    let join: Vec<String> = plan.keys.iter().map(|k| format!("X.{k} = Y.{k}")).collect();
    let inserted: Vec<String> = plan.columns.iter().map(|c| format!("Y.{c}")).collect();

    let mut sql = format!(
        "MERGE INTO {} X USING (SELECT {}{source_from}) Y ON ({})",
        plan.table,
        source.join(", "),
        join.join(" AND ")
    );
    if !plan.assignments.is_empty() {
        sql.push_str(" WHEN MATCHED THEN UPDATE SET ");
        sql.push_str(&plan.assignments.join(", "));
    }
    sql.push_str(&format!(
        " WHEN NOT MATCHED THEN INSERT ({}) VALUES ({})",
        plan.columns.join(", "),
        inserted.join(", ")
    ));
    sql.push_str(terminator);
    sql
}

/// Renders the `INSERT … ON CONFLICT` form shared by PostgreSQL and SQLite.
pub(crate) fn on_conflict(plan: &MergePlan<'_>) -> String {
    let mut sql = insert_values(plan.table, &plan.columns);
    sql.push_str(&format!(" ON CONFLICT ({})", plan.keys.join(", ")));
    if plan.assignments.is_empty() {
        sql.push_str(" DO NOTHING");
    } else {
        sql.push_str(" DO UPDATE SET ");
        sql.push_str(&plan.assignments.join(", "));
    }
    sql
}
