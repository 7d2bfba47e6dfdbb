//! One cache version: classifier, strategy bindings and lifecycle

use shellcache_fetch::Fetcher;
use shellcache_storage::{CacheStorage, ResponseSnapshot};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::classify::{Classifier, RequestClass};
use crate::config::CacheSettings;
use crate::error::CoreError;
use crate::lifecycle::Lifecycle;
use crate::request::CacheRequest;
use crate::strategy::{Binding, EngineStats, Served, ServedFrom, Strategy, StrategyEngine};

/// Class to binding map, fixed when the version is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    pub static_shell: Binding,
    pub api: Binding,
    pub other: Binding,
}

impl Bindings {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        let names = settings.store_names();
        Self {
            static_shell: Binding {
                strategy: settings.strategies.static_shell,
                store: names.static_shell,
                max_entries: None,
            },
            api: Binding {
                strategy: settings.strategies.api,
                store: names.api,
                max_entries: None,
            },
            other: Binding {
                strategy: settings.strategies.other,
                store: names.dynamic,
                max_entries: Some(settings.dynamic_max_entries),
            },
        }
    }

    pub fn get(&self, class: RequestClass) -> &Binding {
        match class {
            RequestClass::StaticShell => &self.static_shell,
            RequestClass::Api => &self.api,
            RequestClass::Other => &self.other,
        }
    }
}

/// Outcome of routing one request
#[derive(Debug, Clone)]
pub struct Handled {
    /// Class and strategy, absent for a passthrough
    pub route: Option<(RequestClass, Strategy)>,
    pub response: ResponseSnapshot,
    pub from: ServedFrom,
}

impl Handled {
    pub(crate) fn passthrough(response: ResponseSnapshot) -> Self {
        Self {
            route: None,
            response,
            from: ServedFrom::Passthrough,
        }
    }
}

pub struct Worker {
    classifier: Classifier,
    bindings: Bindings,
    engine: StrategyEngine,
    lifecycle: Lifecycle,
}

impl Worker {
    /// Build a worker for `settings`; it starts `Unregistered`
    pub fn new(
        settings: &CacheSettings,
        origin: Url,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;

        Ok(Self {
            classifier: Classifier::new(settings, origin.clone()),
            bindings: Bindings::from_settings(settings),
            engine: StrategyEngine::new(
                storage.clone(),
                fetcher.clone(),
                settings.write_policy,
                settings.ordered_revalidation,
            ),
            lifecycle: Lifecycle::new(settings, origin, storage, fetcher),
        })
    }

    pub fn version(&self) -> &str {
        self.lifecycle.version()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub async fn stats(&self) -> EngineStats {
        self.engine.stats().await
    }

    /// Classify `request` and answer it with the bound strategy
    pub async fn handle(&self, request: &CacheRequest) -> Result<Handled, CoreError> {
        let class = self.classifier.classify(request);
        let binding = self.bindings.get(class);

        debug!(
            "{} {} -> {} via {} ({})",
            request.destination,
            request.url,
            class,
            binding.strategy,
            binding.store
        );
        metrics::counter!(
            "shellcache_requests_total",
            "class" => class.as_str(),
            "strategy" => binding.strategy.as_str()
        )
        .increment(1);

        let Served { response, from } = self.engine.execute(request, binding).await?;

        Ok(Handled {
            route: Some((class, binding.strategy)),
            response,
            from,
        })
    }
}
