pub mod api;
pub mod conf;
pub mod core;
pub mod query;
pub mod store;

#[cfg(feature = "testutil")]
pub mod testutil;
