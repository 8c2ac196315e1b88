//! Core types, validation, permission policy and the profile service for the
//! faculty profiles repository.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::ProfileStore`] and
//! [`store::RecordIndex`]; the HTTP layer drives [`service::ProfileService`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod permissions;
pub mod profile;
pub mod record;
pub mod schema;
pub mod search;
pub mod service;
pub mod store;

pub use error::{Error, Result};
