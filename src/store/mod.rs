mod document;
mod kv;
mod memory;
mod mongo_backend;
mod redis_backend;

pub use document::{DocumentCollection, DocumentQueryService};
pub use kv::{KeyValueBackend, KeyValueStore};
pub use memory::{MemoryCollection, MemoryStore};
pub use mongo_backend::MongoCollection;
pub use redis_backend::RedisStore;
