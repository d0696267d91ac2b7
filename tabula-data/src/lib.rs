//! # tabula-data: table-agnostic data access
//!
//! Backend-neutral building blocks for addressing tables by name at runtime:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`GenericRepository`] | CRUD, count/exists, raw query and DDL over one table |
//! | [`RepositoryRegistry`] | Lazily-populated table name → repository cache |
//! | [`Backend`] | Capability contract a storage client must provide |
//! | [`TableQuery`] | Fluent description of one table-scoped statement |
//! | [`FilterMap`], [`QueryOptions`] | Equality filters and read options |
//! | [`TableSchema`] | Table descriptor used for DDL synthesis |
//! | [`DataError`] | Configuration, backend and decode failures |
//!
//! Rows stay type-erased ([`Row`]) inside the core; typed views are chosen by
//! the caller through the repository's `T` parameter.

pub mod backend;
pub mod error;
pub mod filter;
pub mod page;
pub mod query;
pub mod registry;
pub mod repository;
pub mod schema;

pub use backend::{Backend, BackendResponse};
pub use error::{BackendError, DataError};
pub use filter::{FilterMap, Row};
pub use page::{OrderBy, QueryOptions, RowRange};
pub use query::{Action, CountMode, Returning, TableQuery};
pub use registry::RepositoryRegistry;
pub use repository::{GenericRepository, EXECUTE_SQL};
pub use schema::{ColumnDef, ColumnRef, ForeignKey, TableSchema};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        Backend, DataError, FilterMap, GenericRepository, QueryOptions, RepositoryRegistry, Row,
        TableSchema,
    };
}
