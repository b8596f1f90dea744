//! Schema document model, loading and caching.

mod document;
mod loader;

pub use document::{MethodDef, NamespaceDef, ObjectDef, OrderedMap, PropertyDef, SchemaDocument};
pub use loader::{
    CacheStatus, CachedSchema, FetchedSchema, Fetcher, HttpFetcher, LoadedSchema, SchemaCache,
    SchemaLoader, SchemaOrigin, SchemaSource, DEFAULT_SCHEMA_URL,
};
