//! Request classification
//!
//! Maps every intercepted request to exactly one class using only static
//! properties of the request: its destination and its URL. The result never
//! depends on cache contents or on the network.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use url::Url;

use crate::config::CacheSettings;
use crate::request::{CacheRequest, Destination};

/// Class of an intercepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// App shell: pre-known assets, documents, scripts and stylesheets
    StaticShell,
    /// Same-origin API endpoints
    Api,
    /// Everything else
    Other,
}

impl RequestClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::StaticShell => "static_shell",
            RequestClass::Api => "api",
            RequestClass::Other => "other",
        }
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier for one cache version
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Url,
    app_shell: HashSet<String>,
    api_prefix: String,
}

impl Classifier {
    pub fn new(settings: &CacheSettings, origin: Url) -> Self {
        Self {
            origin,
            app_shell: settings.app_shell.iter().cloned().collect(),
            api_prefix: settings.api_prefix.clone(),
        }
    }

    /// Classify a request; total, and stable for the lifetime of the classifier
    pub fn classify(&self, request: &CacheRequest) -> RequestClass {
        let same_origin = request.is_same_origin(&self.origin);

        if same_origin && self.app_shell.contains(request.path()) {
            return RequestClass::StaticShell;
        }

        if matches!(
            request.destination,
            Destination::Document | Destination::Script | Destination::Style
        ) {
            return RequestClass::StaticShell;
        }

        if same_origin && request.path().starts_with(&self.api_prefix) {
            return RequestClass::Api;
        }

        RequestClass::Other
    }
}
