//! Core types, store traits and services for desk, the support-ticket and
//! subscription back office.
//!
//! This crate has no HTTP or database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// Store and notifier traits use return-position `impl Future + Send`; backends
// implement them with plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod message;
pub mod notify;
pub mod renewal;
pub mod service;
pub mod store;
pub mod subscription;
pub mod ticket;

pub use error::{Error, ErrorKind, Result};
pub use renewal::RenewalService;
pub use service::TicketService;
