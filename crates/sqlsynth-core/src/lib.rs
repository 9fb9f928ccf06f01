//! # sqlsynth-core
//!
//! Dialect-aware statement synthesis and pagination rewriting.
//!
//! This crate provides:
//! - Entity metadata, described once per type and cached process-wide
//! - INSERT, UPDATE, DELETE, SELECT and insert-or-update ("merge")
//!   statements for MySQL, PostgreSQL, SQLite, Oracle and SQL Server
//! - A clause-position scanner for arbitrary SELECT statements
//! - Rewriting of a SELECT into a count query and a page query
//!
//! ## Statement Synthesis
//!
//! Statements are always parameterized. The synthesizer returns the SQL
//! text together with the fields to bind, in placeholder order:
//!
//! ```rust
//! use sqlsynth_core::{DialectKind, EntityDescriptor, StatementSynthesizer, WritePolicy};
//!
//! let staff = EntityDescriptor::new("staff")
//!     .primary_key("staff_id", "staff_id")
//!     .column("staff_name", "staff_name");
//!
//! let synth = StatementSynthesizer::new(DialectKind::MySql.dialect());
//! let stmt = synth.merge(&staff, &WritePolicy::soft()).unwrap();
//!
//! assert_eq!(
//!     stmt.sql(),
//!     "INSERT INTO staff (staff_id, staff_name) VALUES (?, ?) \
//!      ON DUPLICATE KEY UPDATE staff_name = IFNULL(VALUES(staff_name), staff_name)"
//! );
//! assert_eq!(stmt.bound_fields(), ["staff_id", "staff_name"]);
//! ```
//!
//! ## Pagination
//!
//! ```rust
//! use sqlsynth_core::{DialectKind, PageRequest};
//!
//! let paged = DialectKind::SqlServer
//!     .dialect()
//!     .paginate("SELECT * FROM t", PageRequest::new(2, 10))
//!     .unwrap();
//!
//! assert_eq!(paged.count_sql, "SELECT COUNT(*) FROM (SELECT * FROM t) SQLTOOL");
//! assert!(paged.page_sql.ends_with("OFFSET 10 ROW FETCH NEXT 10 ROW ONLY"));
//! ```

pub mod dialect;
pub mod entity;
pub mod error;
pub mod lexer;
pub mod page;
pub mod scan;
pub mod statement;
pub mod value;

pub use dialect::{Dialect, DialectKind, DialectRegistry, PageStrategy};
pub use entity::{describe, ColumnDescriptor, Entity, EntityDescriptor, FieldRef};
pub use error::{BoxError, Error, Result};
pub use page::{PageRequest, PageResult, PagedQuery};
pub use scan::{scan, scan_with, ScanOptions, SqlMetaData};
pub use statement::{GeneratedStatement, StatementSynthesizer, TemplateKind, WritePolicy};
pub use value::{SqlValue, ToSqlValue};
