//! Paged query execution.

use sqlsynth_core::{BoxError, Dialect, Error, PageRequest, PageResult, Result, SqlValue};
use tracing::debug;

use crate::connection::QueryConnection;

/// Runs one page of `sql` against `conn`.
///
/// The count query runs first; when it reports no rows the page query is
/// skipped. `params` are bound to both queries, and `map` turns each driver
/// row into a `T`.
pub async fn fetch_page<C, T, F>(
    conn: &mut C,
    dialect: &dyn Dialect,
    sql: &str,
    params: &[SqlValue],
    page: PageRequest,
    mut map: F,
) -> Result<PageResult<T>>
where
    C: QueryConnection,
    F: FnMut(C::Row) -> std::result::Result<T, BoxError>,
{
    let paged = dialect.paginate(sql, page)?;

    let total = conn
        .fetch_count(&paged.count_sql, params)
        .await
        .map_err(|source| Error::execution(&paged.count_sql, source))?;
    if total == 0 {
        debug!(dialect = dialect.name(), "Query matched no rows, skipping page query");
        return Ok(PageResult::empty(page));
    }

    let rows = conn
        .fetch_rows(&paged.page_sql, params)
        .await
        .map_err(|source| Error::execution(&paged.page_sql, source))?;
    let rows = rows
        .into_iter()
        .map(&mut map)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|source| Error::execution(&paged.page_sql, source))?;

    debug!(
        total,
        page = page.current_page,
        rows = rows.len(),
        "Fetched page"
    );
    Ok(PageResult::new(page, total, rows))
}
