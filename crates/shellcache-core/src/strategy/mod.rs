//! Caching strategies

mod engine;
mod policy;
mod sequence;

pub use engine::{Binding, EngineStats, Served, ServedFrom, StrategyEngine};
pub use policy::{ParsePolicyError, Strategy, WritePolicy};
pub use sequence::WriteSequencer;
