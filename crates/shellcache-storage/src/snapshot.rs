//! Captured response snapshots

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A response as it was captured from the network
///
/// Snapshots are immutable once stored; a newer capture for the same key
/// replaces the old one in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub captured_at: DateTime<Utc>,
}

impl ResponseSnapshot {
    /// Capture a response now
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            captured_at: Utc::now(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header value (case-insensitive name match)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body size in bytes
    pub fn size(&self) -> u64 {
        self.body.len() as u64
    }
}
