//! Caching strategies and write policies

use serde::{Deserialize, Serialize};
use shellcache_storage::ResponseSnapshot;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing a strategy or write policy
#[derive(Debug, Clone)]
pub struct ParsePolicyError(String);

impl fmt::Display for ParsePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid policy: {}", self.0)
    }
}

impl std::error::Error for ParsePolicyError {}

/// How a request is answered from the network and a cache store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Serve from cache, fall back to the network on a miss
    CacheFirst,
    /// Serve from the network, fall back to cache on a network error
    NetworkFirst,
    /// Serve from cache immediately, refresh from the network in the background
    StaleWhileRevalidate,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cache-first" => Ok(Strategy::CacheFirst),
            "network-first" => Ok(Strategy::NetworkFirst),
            "stale-while-revalidate" | "swr" => Ok(Strategy::StaleWhileRevalidate),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Which network responses are written into a store
///
/// Fixed for the lifetime of a worker version. Partial (206) and
/// not-modified (304) responses never describe the full resource and are
/// never stored under any policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Store every response the network produced, whatever its status
    #[default]
    All,
    /// Store 2xx responses only
    SuccessOnly,
}

impl WritePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WritePolicy::All => "all",
            WritePolicy::SuccessOnly => "success-only",
        }
    }

    pub fn should_store(&self, response: &ResponseSnapshot) -> bool {
        if matches!(response.status, 206 | 304) {
            return false;
        }

        match self {
            WritePolicy::All => true,
            WritePolicy::SuccessOnly => response.is_success(),
        }
    }
}

impl FromStr for WritePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(WritePolicy::All),
            "success-only" => Ok(WritePolicy::SuccessOnly),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}
