/// Loading and validation of settings for every component.
pub mod config;
/// In-memory indexes: LRU cache, prefix trie, quadtree.
pub mod database;
/// Settings error and re-exports of the domain error types.
pub mod error;
/// `tracing-subscriber` initialization.
pub mod logging;
/// Query coordinator: debounce, deduplication, cancellation, ordered delivery.
pub mod query;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Per-component configuration and the layered loader.
pub use crate::config::{CacheConfig, PrefixConfig, QueryConfig, Settings, SpatialConfig};
/// Index structures and their building blocks.
pub use database::{
    Boundary, CharSet, DuplicatePolicy, EvictionPolicy, LruCache, LruPolicy, Point, PrefixIndex,
    QuadTreeStats, SpatialIndex, ValidationError,
};
/// Error types and result aliases.
pub use error::{
    CacheError, ErrorExt, PrefixError, QueryError, SettingsError, SightlineResult, SpatialError,
    StackError, StatusCode,
};
/// Logging setup.
pub use logging::{init_logging, LogFormat, LoggingConfig};
/// Coordinator API.
pub use query::{
    CancelToken, CoordinatorStats, IndexBackend, Lane, QueryBackend, QueryCoordinator, QueryKind,
    QueryOutput, QueryResult, Request, RequestId,
};
