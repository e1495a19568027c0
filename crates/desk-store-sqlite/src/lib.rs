//! SQLite backend for desk.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;
mod subscriptions;

pub mod error;

pub use error::{Error, Result};
pub use schema::LATEST_VERSION;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
