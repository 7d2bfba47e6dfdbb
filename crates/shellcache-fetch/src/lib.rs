//! shellcache Network Layer
//!
//! This crate provides the client used to reach the application origin,
//! behind a `Fetcher` trait so strategies can run against fakes.

pub mod client;
pub mod error;

pub use client::{Fetcher, OriginClient, OriginClientConfig};
pub use error::FetchError;
