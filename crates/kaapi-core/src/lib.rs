//! Core types, trait definitions and the review service for Kaapi.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod effects;
pub mod entity;
pub mod error;
pub mod identity;
pub mod review;
pub mod service;
pub mod store;
pub mod submission;

pub use error::{Error, Result, ReviewError};
