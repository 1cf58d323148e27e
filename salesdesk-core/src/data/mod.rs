//! Table loading, caching, and schema normalization

pub mod cache;
pub mod loader;
pub mod normalize;
pub mod schema;
pub mod source;

pub use cache::{CacheMeta, CacheStatus, TableCache};
pub use loader::{TableLoader, DEFAULT_TTL_DAYS};
pub use schema::{ColumnMap, SalesSchema, SchemaError};
pub use source::{DataError, FileSource, HttpSource, TableSource};
