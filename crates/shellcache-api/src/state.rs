//! Application state

use shellcache_core::{Registration, SettingsProvider};
use shellcache_fetch::Fetcher;
use std::sync::Arc;

/// Prometheus render handle for the metrics endpoint
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<Registration>,
    /// Network used for passthrough of non-GET requests
    pub fetcher: Arc<dyn Fetcher>,
    pub settings: Arc<dyn SettingsProvider>,
}

impl AppState {
    pub fn new(
        registration: Arc<Registration>,
        fetcher: Arc<dyn Fetcher>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            registration,
            fetcher,
            settings,
        }
    }
}
