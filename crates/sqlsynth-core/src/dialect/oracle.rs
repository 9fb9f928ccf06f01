//! Oracle dialect.

use super::{merge_using, Dialect, DialectKind, MergePlan, PageStrategy};

/// Oracle dialect.
///
/// Upserts use `MERGE INTO … USING (SELECT … FROM DUAL)`. Oracle 12c and
/// later page with `OFFSET … FETCH NEXT`; [`OracleDialect::legacy`] pages
/// with nested `ROWNUM` filters for older servers.
#[derive(Debug, Clone, Copy)]
pub struct OracleDialect {
    rownum_paging: bool,
}

impl OracleDialect {
    /// Creates an Oracle 12c+ dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rownum_paging: false,
        }
    }

    /// Creates an Oracle dialect paging through `ROWNUM` (11g and older).
    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            rownum_paging: true,
        }
    }
}

impl Default for OracleDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for OracleDialect {
    fn kind(&self) -> DialectKind {
        if self.rownum_paging {
            DialectKind::OracleLegacy
        } else {
            DialectKind::Oracle
        }
    }

    fn null_fallback(&self) -> &'static str {
        "NVL"
    }

    fn uses_merge_join(&self) -> bool {
        true
    }

    fn set_clause(&self, _table: &str, column: &str) -> String {
        format!("X.{column} = Y.{column}")
    }

    fn set_if_null_clause(&self, _table: &str, column: &str) -> String {
        format!("X.{column} = NVL(Y.{column}, X.{column})")
    }

    fn merge_statement(&self, plan: &MergePlan<'_>) -> String {
        merge_using(plan, " FROM DUAL", "")
    }

    fn page_strategy(&self) -> PageStrategy {
        if self.rownum_paging {
            PageStrategy::RowNum
        } else {
            PageStrategy::OffsetFetch
        }
    }
}
