//! shellcache Core Business Logic
//!
//! This crate provides the caching layer itself: request classification,
//! the caching strategies, FIFO eviction, and the install/activate
//! lifecycle of cache versions.

pub mod classify;
pub mod config;
pub mod error;
pub mod eviction;
pub mod lifecycle;
pub mod registration;
pub mod request;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod testing;

pub use classify::{Classifier, RequestClass};
pub use config::{
    CacheSettings, InMemorySettingsProvider, SettingsProvider, StoreNames, StorePrefixes,
    StrategyConfig,
};
pub use error::CoreError;
pub use eviction::enforce_limit;
pub use lifecycle::{Lifecycle, LifecycleState};
pub use registration::{Registration, RegisterOutcome, RegistrationStatus, spawn_update_task};
pub use request::{CacheRequest, Destination};
pub use strategy::{
    Binding, EngineStats, Served, ServedFrom, Strategy, StrategyEngine, WritePolicy,
    WriteSequencer,
};
pub use worker::{Bindings, Handled, Worker};
