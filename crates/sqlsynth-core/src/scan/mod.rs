//! Clause-position scanning of SELECT statements.
//!
//! The scanner does not parse SQL. It lexes the text once, tracks
//! parenthesis depth, and records the byte offsets of the clauses the
//! pagination rewriter needs to cut and splice. Keywords inside string
//! literals, quoted identifiers, comments and sub-queries are never
//! recorded, and `LIMIT`/`OFFSET` only count as paging when they follow the
//! top-level FROM and are followed by a row count.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use lru::LruCache;
use serde::Serialize;
use tracing::debug;

use crate::lexer::{Keyword, Lexer, Token, TokenKind};

/// Number of distinct query texts kept by [`scan_cached`].
pub const SCAN_CACHE_CAPACITY: usize = 256;

/// Lexing rules that differ between databases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScanOptions {
    /// A backslash escapes the next character inside quoted strings.
    pub backslash_escapes: bool,
}

/// Byte offsets of the top-level clauses of a query.
///
/// Every offset points at the first byte of its keyword and is `None` when
/// the clause is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SqlMetaData {
    /// The first top-level `SELECT`.
    pub select: Option<usize>,
    /// A `TOP` row limit on the top-level SELECT.
    pub top: Option<usize>,
    /// The first top-level `FROM` after `SELECT`.
    pub from: Option<usize>,
    /// The last top-level `GROUP BY`.
    pub group_by: Option<usize>,
    /// The last top-level `ORDER BY`.
    pub order_by: Option<usize>,
    /// The first top-level `LIMIT`, `OFFSET` or `FETCH FIRST|NEXT`.
    pub paging_clause: Option<usize>,
    /// Start of the first token.
    pub embed_start: Option<usize>,
    /// End of the region that can be wrapped in a sub-select: the start of
    /// a trailing suffix or `;`, otherwise the end of the last token.
    pub embed_end: Option<usize>,
    /// Length of the scanned text.
    pub length: usize,
}

impl SqlMetaData {
    /// Returns the wrappable part of `sql`.
    #[must_use]
    pub fn embedded<'a>(&self, sql: &'a str) -> &'a str {
        match (self.embed_start, self.embed_end) {
            (Some(start), Some(end)) => &sql[start..end],
            _ => "",
        }
    }

    /// Returns the wrappable part of `sql` without its paging clause.
    #[must_use]
    pub fn without_paging<'a>(&self, sql: &'a str) -> &'a str {
        self.cut(sql, self.paging_clause)
    }

    /// Returns the wrappable part of `sql` without ORDER BY and paging.
    #[must_use]
    pub fn without_ordering<'a>(&self, sql: &'a str) -> &'a str {
        let cut = match (self.order_by, self.paging_clause) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.cut(sql, cut)
    }

    /// Returns whatever follows the wrappable region, leading whitespace
    /// removed.
    #[must_use]
    pub fn trailing<'a>(&self, sql: &'a str) -> &'a str {
        self.embed_end.map_or("", |end| sql[end..].trim())
    }

    fn cut<'a>(&self, sql: &'a str, at: Option<usize>) -> &'a str {
        let Some(start) = self.embed_start else {
            return "";
        };
        let end = self.embed_end.unwrap_or(self.length);
        let end = at.filter(|&at| at >= start && at < end).unwrap_or(end);
        sql[start..end].trim_end()
    }
}

/// Scans `sql` with the default lexing rules and records its top-level
/// clause offsets.
#[must_use]
pub fn scan(sql: &str) -> SqlMetaData {
    scan_with(sql, ScanOptions::default())
}

/// Scans `sql` with the given lexing rules.
#[must_use]
pub fn scan_with(sql: &str, options: ScanOptions) -> SqlMetaData {
    Scanner::new(sql, options).run()
}

/// Like [`scan_with`], memoized per query text and options in a bounded LRU
/// cache.
#[must_use]
pub fn scan_cached(sql: &str, options: ScanOptions) -> Arc<SqlMetaData> {
    type Key = (ScanOptions, String);
    static CACHE: OnceLock<Mutex<LruCache<Key, Arc<SqlMetaData>>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| {
        let capacity = NonZeroUsize::new(SCAN_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Mutex::new(LruCache::new(capacity))
    });

    let key = (options, sql.to_owned());
    let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(found) = cache.get(&key) {
        return Arc::clone(found);
    }

    let meta = Arc::new(scan_with(sql, options));
    debug!(sql, ?options, ?meta, "Scanned query");
    cache.put(key, Arc::clone(&meta));
    meta
}

struct Scanner<'a> {
    sql: &'a str,
    tokens: Vec<Token>,
    meta: SqlMetaData,
}

impl<'a> Scanner<'a> {
    fn new(sql: &'a str, options: ScanOptions) -> Self {
        Self {
            sql,
            tokens: Lexer::new(sql)
                .backslash_escapes(options.backslash_escapes)
                .tokenize(),
            meta: SqlMetaData {
                length: sql.len(),
                ..SqlMetaData::default()
            },
        }
    }

    fn keyword_at(&self, index: usize) -> Option<Keyword> {
        self.tokens.get(index).and_then(Token::keyword)
    }

    fn kind_at(&self, index: usize) -> Option<TokenKind> {
        self.tokens.get(index).map(|t| t.kind)
    }

    fn text_at(&self, index: usize) -> &'a str {
        self.tokens.get(index).map_or("", |t| t.span.slice(self.sql))
    }

    fn run(mut self) -> SqlMetaData {
        let mut depth = 0usize;
        let mut last_end = None;

        for i in 0..self.tokens.len() {
            let token = self.tokens[i];
            if token.is_eof() {
                break;
            }
            if self.meta.embed_start.is_none() {
                self.meta.embed_start = Some(token.span.start);
            }

            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth = depth.saturating_sub(1),
                _ => {}
            }

            if depth == 0 && self.is_trailing_suffix(i) {
                self.meta.embed_end = Some(token.span.start);
                return self.meta;
            }
            last_end = Some(token.span.end);

            if depth == 0 {
                if let Some(keyword) = token.keyword() {
                    self.record(i, keyword, token.span.start);
                }
            }
        }

        self.meta.embed_end = last_end;
        self.meta
    }

    fn record(&mut self, i: usize, keyword: Keyword, at: usize) {
        match keyword {
            Keyword::Select if self.meta.select.is_none() => {
                self.meta.select = Some(at);
                self.meta.top = self.top_clause(i + 1);
            }
            Keyword::From if self.meta.select.is_some() && self.meta.from.is_none() => {
                self.meta.from = Some(at);
            }
            Keyword::Group if self.keyword_at(i + 1) == Some(Keyword::By) => {
                self.meta.group_by = Some(at);
            }
            Keyword::Order if self.keyword_at(i + 1) == Some(Keyword::By) => {
                self.meta.order_by = Some(at);
                // Paging always follows the ordering it bounds
                if self.meta.paging_clause.is_some_and(|paging| paging < at) {
                    self.meta.paging_clause = None;
                }
            }
            Keyword::Limit | Keyword::Offset
                if self.meta.paging_clause.is_none()
                    && self.meta.from.is_some()
                    && self.starts_row_count(i + 1) =>
            {
                self.meta.paging_clause = Some(at);
            }
            Keyword::Fetch
                if self.meta.paging_clause.is_none()
                    && self.meta.from.is_some()
                    && matches!(
                        self.keyword_at(i + 1),
                        Some(Keyword::First | Keyword::Next)
                    ) =>
            {
                self.meta.paging_clause = Some(at);
            }
            _ => {}
        }
    }

    /// Finds `TOP` right after `SELECT [DISTINCT | UNIQUE | ALL]`.
    fn top_clause(&self, mut i: usize) -> Option<usize> {
        if matches!(
            self.keyword_at(i),
            Some(Keyword::Distinct | Keyword::Unique | Keyword::All)
        ) {
            i += 1;
        }
        if self.keyword_at(i) == Some(Keyword::Top) && self.starts_row_count(i + 1) {
            return self.tokens.get(i).map(|t| t.span.start);
        }
        None
    }

    /// Whether the token at `i` can open a row count: a number, a
    /// parenthesized expression, `ALL`, or a bind parameter (`?`, `$1`,
    /// `:name`, `@name`).
    fn starts_row_count(&self, i: usize) -> bool {
        match self.kind_at(i) {
            Some(TokenKind::Number | TokenKind::LeftParen | TokenKind::Keyword(Keyword::All)) => {
                true
            }
            Some(TokenKind::Symbol) => matches!(self.text_at(i), "?" | "$" | ":" | "@"),
            _ => false,
        }
    }

    fn is_trailing_suffix(&self, i: usize) -> bool {
        match self.kind_at(i) {
            Some(TokenKind::Semicolon) => true,
            Some(TokenKind::Keyword(Keyword::For)) => matches!(
                self.keyword_at(i + 1),
                Some(
                    Keyword::Update
                        | Keyword::Share
                        | Keyword::Read
                        | Keyword::No
                        | Keyword::Key
                        | Keyword::Xml
                        | Keyword::Json
                        | Keyword::Browse
                )
            ),
            Some(TokenKind::Keyword(Keyword::Lock)) => {
                self.keyword_at(i + 1) == Some(Keyword::In)
                    && self.keyword_at(i + 2) == Some(Keyword::Share)
                    && self.keyword_at(i + 3) == Some(Keyword::Mode)
            }
            Some(TokenKind::Keyword(Keyword::Option)) => {
                self.kind_at(i + 1) == Some(TokenKind::LeftParen)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(sql: &str, needle: &str) -> Option<usize> {
        sql.find(needle)
    }

    #[test]
    fn test_simple_query() {
        let sql = "SELECT id, name FROM users WHERE active = 1 ORDER BY name";
        let meta = scan(sql);
        assert_eq!(meta.select, Some(0));
        assert_eq!(meta.top, None);
        assert_eq!(meta.from, at(sql, "FROM"));
        assert_eq!(meta.order_by, at(sql, "ORDER BY"));
        assert_eq!(meta.group_by, None);
        assert_eq!(meta.paging_clause, None);
        assert_eq!(meta.embed_start, Some(0));
        assert_eq!(meta.embed_end, Some(sql.len()));
        assert_eq!(meta.length, sql.len());
    }

    #[test]
    fn test_keywords_in_literals_are_ignored() {
        let sql = "SELECT 'order by x' AS note, \"FROM\" FROM t -- ORDER BY y\n/* LIMIT 5 */";
        let meta = scan(sql);
        assert_eq!(meta.order_by, None);
        assert_eq!(meta.paging_clause, None);
        assert_eq!(meta.from, at(sql, "FROM t"));
        assert_eq!(meta.embed_end, Some(sql.find("FROM t").unwrap() + "FROM t".len()));
    }

    #[test]
    fn test_subquery_clauses_are_ignored() {
        let sql = "SELECT a FROM (SELECT a FROM b ORDER BY a LIMIT 3) x GROUP BY a";
        let meta = scan(sql);
        assert_eq!(meta.from, Some(9));
        assert_eq!(meta.order_by, None);
        assert_eq!(meta.paging_clause, None);
        assert_eq!(meta.group_by, at(sql, "GROUP BY"));
    }

    #[test]
    fn test_last_order_by_wins() {
        let sql = "SELECT a FROM x ORDER BY a UNION SELECT a FROM y ORDER BY a DESC";
        let meta = scan(sql);
        assert_eq!(meta.order_by, sql.rfind("ORDER BY"));
        assert_eq!(meta.from, at(sql, "FROM x"));
    }

    #[test]
    fn test_cte_finds_outer_select() {
        let sql = "WITH recent AS (SELECT * FROM orders) SELECT * FROM recent ORDER BY id";
        let meta = scan(sql);
        assert_eq!(meta.select, sql.rfind("SELECT"));
        assert_eq!(meta.from, at(sql, "FROM recent"));
        assert_eq!(meta.embed_start, Some(0));
    }

    #[test]
    fn test_top_clause() {
        let sql = "SELECT DISTINCT TOP 10 PERCENT WITH TIES name FROM t";
        assert_eq!(scan(sql).top, at(sql, "TOP"));

        let sql = "SELECT TOP (@n) name FROM t";
        assert_eq!(scan(sql).top, at(sql, "TOP"));

        // A column named top
        assert_eq!(scan("SELECT top FROM t").top, None);
        assert_eq!(scan("SELECT a FROM (SELECT TOP 1 a FROM t) x").top, None);
    }

    #[test]
    fn test_paging_clauses() {
        let sql = "SELECT * FROM t ORDER BY id LIMIT 10 OFFSET 20";
        assert_eq!(scan(sql).paging_clause, at(sql, "LIMIT"));

        let sql = "SELECT * FROM t ORDER BY id OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY";
        assert_eq!(scan(sql).paging_clause, at(sql, "OFFSET"));

        let sql = "SELECT * FROM t FETCH FIRST 5 ROWS ONLY";
        assert_eq!(scan(sql).paging_clause, at(sql, "FETCH"));

        let sql = "SELECT * FROM t LIMIT ? OFFSET ?";
        assert_eq!(scan(sql).paging_clause, at(sql, "LIMIT"));

        let sql = "SELECT * FROM t LIMIT $1";
        assert_eq!(scan(sql).paging_clause, at(sql, "LIMIT"));
    }

    #[test]
    fn test_paging_words_used_as_columns() {
        let sql = "SELECT id, offset FROM tz ORDER BY id";
        let meta = scan(sql);
        assert_eq!(meta.paging_clause, None);
        assert_eq!(meta.order_by, at(sql, "ORDER BY"));
        assert_eq!(meta.without_ordering(sql), "SELECT id, offset FROM tz");

        let sql = "SELECT * FROM tz WHERE offset > 3 AND `limit` = 1 ORDER BY offset";
        let meta = scan(sql);
        assert_eq!(meta.paging_clause, None);
        assert_eq!(meta.without_paging(sql), sql);

        let sql = "SELECT id FROM tz WHERE x = offset ORDER BY id LIMIT 5";
        assert_eq!(scan(sql).paging_clause, at(sql, "LIMIT"));
    }

    #[test]
    fn test_backslash_escaped_quote() {
        let sql = r"SELECT * FROM t WHERE note = 'it\'s order by date'";
        let mysql = ScanOptions {
            backslash_escapes: true,
        };
        let meta = scan_with(sql, mysql);
        assert_eq!(meta.order_by, None);
        assert_eq!(meta.embed_end, Some(sql.len()));
        assert_eq!(meta.without_ordering(sql), sql);

        // Standard SQL keeps the backslash inside `'C:\'`
        let sql = r"SELECT * FROM t WHERE dir = 'C:\' ORDER BY id";
        assert_eq!(scan(sql).order_by, at(sql, "ORDER BY"));
    }

    #[test]
    fn test_trailing_suffix_ends_embedded_region() {
        let sql = "SELECT * FROM t WHERE id = ? FOR UPDATE";
        let meta = scan(sql);
        assert_eq!(meta.embed_end, at(sql, "FOR UPDATE"));
        assert_eq!(meta.embedded(sql), "SELECT * FROM t WHERE id = ? ");
        assert_eq!(meta.trailing(sql), "FOR UPDATE");

        let sql = "SELECT * FROM t LOCK IN SHARE MODE";
        assert_eq!(scan(sql).embed_end, at(sql, "LOCK"));

        let sql = "SELECT * FROM t OPTION (RECOMPILE)";
        assert_eq!(scan(sql).embed_end, at(sql, "OPTION"));

        let sql = "  SELECT * FROM t;  ";
        let meta = scan(sql);
        assert_eq!(meta.embed_start, Some(2));
        assert_eq!(meta.embedded(sql), "SELECT * FROM t");
        assert_eq!(meta.trailing(sql), ";");
    }

    #[test]
    fn test_clauses_after_suffix_are_ignored() {
        let sql = "SELECT * FROM t FOR UPDATE OF t.id NOWAIT ORDER BY x";
        assert_eq!(scan(sql).order_by, None);
    }

    #[test]
    fn test_missing_select() {
        let meta = scan("UPDATE t SET a = 1");
        assert_eq!(meta.select, None);
        assert_eq!(scan("").embed_start, None);
    }

    #[test]
    fn test_region_helpers() {
        let sql = "SELECT * FROM t ORDER BY id LIMIT 5 FOR UPDATE";
        let meta = scan(sql);
        assert_eq!(meta.without_paging(sql), "SELECT * FROM t ORDER BY id");
        assert_eq!(meta.without_ordering(sql), "SELECT * FROM t");
    }

    #[test]
    fn test_scan_cached_reuses_result() {
        let sql = "SELECT cached FROM t";
        let first = scan_cached(sql, ScanOptions::default());
        let second = scan_cached(sql, ScanOptions::default());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, scan(sql));

        let escaped = scan_cached(
            sql,
            ScanOptions {
                backslash_escapes: true,
            },
        );
        assert!(!Arc::ptr_eq(&first, &escaped));
    }
}
