// crates/xgeo-core/src/engine.rs

//! The engine as one object: pipeline, store and render scheduling wired
//! together with an explicit lifecycle.
//!
//! ```rust
//! use xgeo_core::{EngineConfig, GeoEngine, MemoryStorage};
//!
//! let mut engine = GeoEngine::new(MemoryStorage::new(), EngineConfig::default());
//! let body = r#"{"rest_id": "1",
//!     "core": {"screen_name": "maple"},
//!     "about_profile": {"account_based_in": "Canada"},
//!     "profile_transparency": {}}"#;
//! let merged = engine.ingest_text(body, "https://x.com/i/api/graphql/q/UserAbout", None);
//! assert_eq!(merged.len(), 1);
//! assert!(engine.store().lookup_by_handle("@Maple").is_some());
//! ```

use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::GeoObservation;
use crate::pipeline::SignalPipeline;
use crate::reconcile::{PresentationTarget, ReconcileReport, RenderReconciler, RenderScheduler};
use crate::storage::EntryStorage;
use crate::store::{EntryStore, MergeOutcome};
use crate::tree::Payload;

#[derive(Debug)]
pub struct GeoEngine<S: EntryStorage> {
    config: EngineConfig,
    pipeline: SignalPipeline,
    store: EntryStore<S>,
    reconciler: RenderReconciler,
    scheduler: RenderScheduler,
}

impl<S: EntryStorage> GeoEngine<S> {
    /// An engine with an empty store.
    pub fn new(storage: S, config: EngineConfig) -> Self {
        let store = EntryStore::new(storage, &config);
        Self::assemble(store, config)
    }

    /// An engine seeded from `storage`, with a first render already requested.
    pub fn restore(storage: S, config: EngineConfig) -> Result<Self> {
        let store = EntryStore::restore(storage, &config)?;
        let engine = Self::assemble(store, config);
        engine.scheduler.request();
        Ok(engine)
    }

    fn assemble(store: EntryStore<S>, config: EngineConfig) -> Self {
        Self {
            pipeline: SignalPipeline::new(&config),
            store,
            reconciler: RenderReconciler::new(),
            scheduler: RenderScheduler::new(),
            config,
        }
    }

    pub fn with_reconciler(mut self, reconciler: RenderReconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Run one intercepted response through the pipeline and merge what it
    /// yields. A render is requested if any entry visibly changed.
    pub fn ingest(&mut self, payload: &Payload, url: &str, request: Option<&str>) -> Vec<MergeOutcome> {
        let observations = self.pipeline.process(payload, url, request);
        self.merge_all(observations)
    }

    /// [`ingest`](Self::ingest) for a raw response body.
    pub fn ingest_text(&mut self, body: &str, url: &str, request: Option<&str>) -> Vec<MergeOutcome> {
        let observations = self.pipeline.process_text(body, url, request);
        self.merge_all(observations)
    }

    /// Merge observations produced elsewhere.
    pub fn merge_all(&mut self, observations: Vec<GeoObservation>) -> Vec<MergeOutcome> {
        let outcomes: Vec<_> = observations
            .into_iter()
            .map(|obs| self.store.merge(obs))
            .collect();
        if outcomes.iter().any(|o| o.changed) {
            self.scheduler.request();
        }
        outcomes
    }

    /// The view changed; reconcile on the next tick.
    pub fn notify_view_changed(&self) {
        self.scheduler.request();
    }

    /// The host's tick: reconcile `targets` if a pass is pending.
    pub fn render<T: PresentationTarget>(&self, targets: &mut [T]) -> Option<ReconcileReport> {
        self.scheduler
            .run_pending(|| self.reconciler.reconcile(&self.store, targets))
    }

    /// Drop every entry and schedule a full reconciliation.
    pub fn clear(&mut self) -> Result<usize> {
        let removed = self.store.clear_all()?;
        self.scheduler.request();
        Ok(removed)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &SignalPipeline {
        &self.pipeline
    }

    pub fn store(&self) -> &EntryStore<S> {
        &self.store
    }

    pub fn reconciler(&self) -> &RenderReconciler {
        &self.reconciler
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }
}
