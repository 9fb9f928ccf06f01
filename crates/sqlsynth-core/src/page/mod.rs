//! Pagination rewriting.
//!
//! A caller query is turned into two statements: one counting every row the
//! query returns, and one returning a single page of it. The rewrite works on
//! the clause offsets recorded by [`scan`](crate::scan::scan), so the
//! caller's WHERE, GROUP BY, ORDER BY and sub-queries are kept verbatim.

use tracing::debug;

use crate::dialect::PageStrategy;
use crate::error::{Error, Result};
use crate::scan::{scan_cached, ScanOptions, SqlMetaData};

/// Alias of the derived table wrapping the caller query.
pub const WRAP_ALIAS: &str = "SQLTOOL";

/// Constant column injected to give unordered queries a stable ORDER BY.
pub const SYNTHETIC_COLUMN: &str = "page_col";

/// Row number column of the nested `ROWNUM` form.
pub const ROWNUM_COLUMN: &str = "page_rn";

/// A 1-based page of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub current_page: u64,
    /// Rows per page.
    pub page_size: u32,
}

impl PageRequest {
    /// Creates a page request. Bounds are checked when the request is used.
    #[must_use]
    pub const fn new(current_page: u64, page_size: u32) -> Self {
        Self {
            current_page,
            page_size,
        }
    }

    /// Rejects page zero and an empty page size.
    pub fn validate(&self) -> Result<()> {
        if self.current_page == 0 {
            return Err(Error::InvalidPageRequest(String::from(
                "page numbers start at 1",
            )));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidPageRequest(String::from(
                "page size must be at least 1",
            )));
        }
        Ok(())
    }

    /// Returns the number of rows skipped before this page.
    pub fn offset(&self) -> Result<u64> {
        self.validate()?;
        (self.current_page - 1)
            .checked_mul(u64::from(self.page_size))
            .ok_or_else(|| {
                Error::InvalidPageRequest(format!(
                    "offset of page {} with size {} overflows",
                    self.current_page, self.page_size
                ))
            })
    }
}

/// The count and page statements produced for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedQuery {
    /// `SELECT COUNT(*)` over the caller query.
    pub count_sql: String,
    /// The caller query bounded to the requested page.
    pub page_sql: String,
}

/// One page of rows plus the totals needed to navigate the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    /// Rows matched by the whole query.
    pub total: u64,
    /// `ceil(total / page_size)`.
    pub total_pages: u64,
    /// The requested page number.
    pub current_page: u64,
    /// The requested page size.
    pub page_size: u32,
    /// Rows of this page.
    pub rows: Vec<T>,
}

impl<T> PageResult<T> {
    /// Creates a page result; `total_pages` is derived from `total`.
    #[must_use]
    pub fn new(page: PageRequest, total: u64, rows: Vec<T>) -> Self {
        Self {
            total,
            total_pages: total_pages(total, page.page_size),
            current_page: page.current_page,
            page_size: page.page_size,
            rows,
        }
    }

    /// A result for a query that matched nothing.
    #[must_use]
    pub fn empty(page: PageRequest) -> Self {
        Self::new(page, 0, Vec::new())
    }
}

/// Returns the number of pages of `page_size` rows needed for `total` rows.
#[must_use]
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    match page_size {
        0 => 0,
        size => total.div_ceil(u64::from(size)),
    }
}

/// Rewrites `sql` into its count and page statements, lexing it with the
/// default rules.
///
/// Any paging clause already present is replaced. Dialects paging with
/// `OFFSET … FETCH` require an ORDER BY and reject it next to `TOP`; such
/// queries are wrapped and ordered by a constant column. A trailing suffix
/// such as `FOR UPDATE` is kept at the end of the page statement.
pub fn rewrite(sql: &str, strategy: PageStrategy, page: PageRequest) -> Result<PagedQuery> {
    rewrite_with(sql, strategy, ScanOptions::default(), page)
}

/// Like [`rewrite`], lexing `sql` with `options`.
pub fn rewrite_with(
    sql: &str,
    strategy: PageStrategy,
    options: ScanOptions,
    page: PageRequest,
) -> Result<PagedQuery> {
    let offset = page.offset()?;
    let size = u64::from(page.page_size);

    let meta = scan_cached(sql, options);
    if meta.select.is_none() {
        return Err(Error::MissingSelect(sql.to_owned()));
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM ({}) {WRAP_ALIAS}",
        meta.without_ordering(sql)
    );

    let body = meta.without_paging(sql);
    let mut page_sql = match strategy {
        PageStrategy::LimitOffset => format!("{body} LIMIT {size} OFFSET {offset}"),
        PageStrategy::OffsetFetch => {
            let clause = format!("OFFSET {offset} ROW FETCH NEXT {size} ROW ONLY");
            if is_ordered(&meta) && meta.top.is_none() {
                format!("{body} {clause}")
            } else {
                format!(
                    "SELECT 1 AS {SYNTHETIC_COLUMN}, {WRAP_ALIAS}.* FROM ({body}) {WRAP_ALIAS} \
                     ORDER BY {SYNTHETIC_COLUMN} {clause}"
                )
            }
        }
        PageStrategy::RowNum => {
            let end = offset.checked_add(size).ok_or_else(|| {
                Error::InvalidPageRequest(format!(
                    "end row of page {} overflows",
                    page.current_page
                ))
            })?;
            format!(
                "SELECT * FROM (SELECT {WRAP_ALIAS}.*, ROWNUM AS {ROWNUM_COLUMN} \
                 FROM ({body}) {WRAP_ALIAS} WHERE ROWNUM <= {end}) \
                 WHERE {ROWNUM_COLUMN} > {offset}"
            )
        }
    };

    let trailing = meta.trailing(sql);
    if !trailing.is_empty() {
        if !trailing.starts_with(';') {
            page_sql.push(' ');
        }
        page_sql.push_str(trailing);
    }

    debug!(?strategy, count_sql = %count_sql, page_sql = %page_sql, "Rewrote query for paging");
    Ok(PagedQuery {
        count_sql,
        page_sql,
    })
}

/// Whether an ORDER BY survives once the paging clause is stripped.
fn is_ordered(meta: &SqlMetaData) -> bool {
    match (meta.order_by, meta.paging_clause) {
        (Some(order), Some(paging)) => order < paging,
        (order, _) => order.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(current_page: u64, page_size: u32) -> PageRequest {
        PageRequest::new(current_page, page_size)
    }

    #[test]
    fn test_unordered_offset_fetch_gets_synthetic_column() {
        let q = rewrite("SELECT * FROM t", PageStrategy::OffsetFetch, page(2, 10)).unwrap();
        assert_eq!(
            q.page_sql,
            "SELECT 1 AS page_col, SQLTOOL.* FROM (SELECT * FROM t) SQLTOOL \
             ORDER BY page_col OFFSET 10 ROW FETCH NEXT 10 ROW ONLY"
        );
        assert_eq!(q.count_sql, "SELECT COUNT(*) FROM (SELECT * FROM t) SQLTOOL");
    }

    #[test]
    fn test_ordered_offset_fetch_appends_clause() {
        let sql = "SELECT id, name FROM users ORDER BY name";
        let q = rewrite(sql, PageStrategy::OffsetFetch, page(1, 25)).unwrap();
        assert_eq!(
            q.page_sql,
            "SELECT id, name FROM users ORDER BY name OFFSET 0 ROW FETCH NEXT 25 ROW ONLY"
        );
        assert_eq!(q.count_sql, "SELECT COUNT(*) FROM (SELECT id, name FROM users) SQLTOOL");
    }

    #[test]
    fn test_existing_paging_clause_is_replaced() {
        let sql = "SELECT * FROM t ORDER BY id LIMIT 5 OFFSET 100";
        let q = rewrite(sql, PageStrategy::LimitOffset, page(3, 20)).unwrap();
        assert_eq!(q.page_sql, "SELECT * FROM t ORDER BY id LIMIT 20 OFFSET 40");

        let sql = "SELECT * FROM t ORDER BY id OFFSET 5 ROWS FETCH NEXT 5 ROWS ONLY";
        let q = rewrite(sql, PageStrategy::OffsetFetch, page(3, 20)).unwrap();
        assert_eq!(
            q.page_sql,
            "SELECT * FROM t ORDER BY id OFFSET 40 ROW FETCH NEXT 20 ROW ONLY"
        );
        assert_eq!(q.count_sql, "SELECT COUNT(*) FROM (SELECT * FROM t) SQLTOOL");
    }

    #[test]
    fn test_unordered_paging_clause_is_wrapped() {
        let sql = "SELECT * FROM t FETCH FIRST 5 ROWS ONLY";
        let q = rewrite(sql, PageStrategy::OffsetFetch, page(1, 5)).unwrap();
        assert_eq!(
            q.page_sql,
            "SELECT 1 AS page_col, SQLTOOL.* FROM (SELECT * FROM t) SQLTOOL \
             ORDER BY page_col OFFSET 0 ROW FETCH NEXT 5 ROW ONLY"
        );
    }

    #[test]
    fn test_trailing_suffix_is_preserved() {
        let sql = "SELECT * FROM t WHERE a = ? ORDER BY a FOR UPDATE";
        let q = rewrite(sql, PageStrategy::LimitOffset, page(2, 10)).unwrap();
        assert_eq!(
            q.page_sql,
            "SELECT * FROM t WHERE a = ? ORDER BY a LIMIT 10 OFFSET 10 FOR UPDATE"
        );
        assert_eq!(q.count_sql, "SELECT COUNT(*) FROM (SELECT * FROM t WHERE a = ?) SQLTOOL");

        let q = rewrite("SELECT * FROM t;", PageStrategy::LimitOffset, page(1, 10)).unwrap();
        assert_eq!(q.page_sql, "SELECT * FROM t LIMIT 10 OFFSET 0;");
    }

    #[test]
    fn test_rownum_nesting() {
        let sql = "SELECT * FROM emp ORDER BY hired";
        let q = rewrite(sql, PageStrategy::RowNum, page(3, 10)).unwrap();
        assert_eq!(
            q.page_sql,
            "SELECT * FROM (SELECT SQLTOOL.*, ROWNUM AS page_rn \
             FROM (SELECT * FROM emp ORDER BY hired) SQLTOOL WHERE ROWNUM <= 30) \
             WHERE page_rn > 20"
        );
    }

    #[test]
    fn test_order_by_in_literal_is_not_a_clause() {
        let sql = "SELECT * FROM t WHERE note = 'order by'";
        let q = rewrite(sql, PageStrategy::OffsetFetch, page(1, 10)).unwrap();
        assert!(q.page_sql.starts_with("SELECT 1 AS page_col"));
        assert_eq!(
            q.count_sql,
            "SELECT COUNT(*) FROM (SELECT * FROM t WHERE note = 'order by') SQLTOOL"
        );
    }

    #[test]
    fn test_top_query_is_wrapped_for_offset_fetch() {
        let sql = "SELECT TOP 100 * FROM t ORDER BY id";
        let q = rewrite(sql, PageStrategy::OffsetFetch, page(2, 10)).unwrap();
        assert_eq!(
            q.page_sql,
            "SELECT 1 AS page_col, SQLTOOL.* FROM (SELECT TOP 100 * FROM t ORDER BY id) SQLTOOL \
             ORDER BY page_col OFFSET 10 ROW FETCH NEXT 10 ROW ONLY"
        );
        assert_eq!(q.count_sql, "SELECT COUNT(*) FROM (SELECT TOP 100 * FROM t) SQLTOOL");
    }

    #[test]
    fn test_backslash_escapes_keep_literal_whole() {
        let sql = r"SELECT * FROM t WHERE note = 'it\'s order by date'";
        let mysql = ScanOptions {
            backslash_escapes: true,
        };
        let q = rewrite_with(sql, PageStrategy::LimitOffset, mysql, page(1, 10)).unwrap();
        assert_eq!(q.count_sql, format!("SELECT COUNT(*) FROM ({sql}) SQLTOOL"));
        assert_eq!(q.page_sql, format!("{sql} LIMIT 10 OFFSET 0"));
    }

    #[test]
    fn test_invalid_requests() {
        for bad in [page(0, 10), page(1, 0)] {
            let err = rewrite("SELECT 1", PageStrategy::LimitOffset, bad).unwrap_err();
            assert!(matches!(err, Error::InvalidPageRequest(_)));
        }

        let err = page(u64::MAX, u32::MAX).offset().unwrap_err();
        assert!(matches!(err, Error::InvalidPageRequest(_)));

        let err = rewrite("DELETE FROM t", PageStrategy::LimitOffset, page(1, 10)).unwrap_err();
        assert!(matches!(err, Error::MissingSelect(_)));
    }

    #[test]
    fn test_large_offsets_use_u64() {
        let big = page(5_000_000, 4_000);
        let q = rewrite("SELECT * FROM t", PageStrategy::LimitOffset, big).unwrap();
        assert_eq!(q.page_sql, "SELECT * FROM t LIMIT 4000 OFFSET 19999996000");
    }

    #[test]
    fn test_total_pages_law() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);

        let empty: PageResult<()> = PageResult::empty(page(4, 10));
        assert_eq!(empty.total_pages, 0);
        assert!(empty.rows.is_empty());
        assert_eq!(empty.current_page, 4);
    }
}
