//! Experiment state store
//!
//! Single source of truth shared by every wizard step: the in-progress
//! selection, the reference catalog with its per-kind fetch status, and
//! the history of completed runs. Every mutation bumps a version on a
//! watch channel so views can re-render.

use crate::catalog::{CatalogKind, ReferenceCatalog};
use crate::error::Result;
use crate::gateway::{CreateExperimentRequest, ExperimentGateway, ExperimentRun};
use crate::selection::{AlgorithmDefaults, ExperimentSelection, SelectionUpdate};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Fetch status of one catalog kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStatus {
    pub loading: bool,
    /// Set once a fetch for this kind has succeeded
    pub loaded: bool,
    /// Message of the most recent failed fetch
    pub error: Option<String>,
}

/// Status of experiment submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionStatus {
    pub running: bool,
    pub error: Option<String>,
}

/// Point-in-time copy of the whole store
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub selection: ExperimentSelection,
    pub catalog: ReferenceCatalog,
    pub catalog_status: HashMap<CatalogKind, CatalogStatus>,
    pub submission: SubmissionStatus,
    pub history: Vec<ExperimentRun>,
}

/// Catalog as shown to the user, with the kinds that were substituted
#[derive(Debug, Clone)]
pub struct CatalogView {
    pub catalog: ReferenceCatalog,
    pub fallback_kinds: Vec<CatalogKind>,
}

impl CatalogView {
    pub fn uses_fallback(&self, kind: CatalogKind) -> bool {
        self.fallback_kinds.contains(&kind)
    }
}

/// Shared experiment state
pub struct ExperimentStore {
    gateway: Arc<dyn ExperimentGateway>,
    defaults: AlgorithmDefaults,
    state: RwLock<StoreSnapshot>,
    version: watch::Sender<u64>,
}

impl ExperimentStore {
    /// Create an empty store without touching the network
    pub fn new(gateway: Arc<dyn ExperimentGateway>, defaults: AlgorithmDefaults) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            gateway,
            defaults,
            state: RwLock::new(StoreSnapshot::default()),
            version,
        }
    }

    /// Create the store and load every catalog kind once
    pub async fn open(gateway: Arc<dyn ExperimentGateway>, defaults: AlgorithmDefaults) -> Arc<Self> {
        let store = Arc::new(Self::new(gateway, defaults));
        store.fetch_all_catalogs().await;
        store
    }

    /// Receiver that changes on every mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    fn notify(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut StoreSnapshot) -> R) -> R {
        let result = {
            let mut state = self.state.write();
            f(&mut state)
        };
        self.notify();
        result
    }

    pub fn defaults(&self) -> &AlgorithmDefaults {
        &self.defaults
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.read().clone()
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn selection(&self) -> ExperimentSelection {
        self.state.read().selection.clone()
    }

    /// Shallow-merge `update` into the selection. No validation.
    pub fn update_selection(&self, update: SelectionUpdate) {
        debug!(?update, "Updating selection");
        self.mutate(|state| state.selection.apply(update));
    }

    pub fn is_selection_complete(&self) -> bool {
        self.state.read().selection.is_complete()
    }

    /// Start a new experiment; catalog and history are kept
    pub fn reset_selection(&self) {
        self.mutate(|state| {
            state.selection = ExperimentSelection::default();
            state.submission = SubmissionStatus::default();
        });
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    pub fn catalog(&self) -> ReferenceCatalog {
        self.state.read().catalog.clone()
    }

    pub fn catalog_status(&self, kind: CatalogKind) -> CatalogStatus {
        self.state
            .read()
            .catalog_status
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Fetch one catalog kind and replace its slice.
    ///
    /// On failure the error is recorded for that kind and the previous
    /// slice is left as it was. Returns the number of entries loaded.
    pub async fn fetch_catalog(&self, kind: CatalogKind) -> Result<usize> {
        self.mutate(|state| {
            let status = state.catalog_status.entry(kind).or_default();
            status.loading = true;
        });

        let outcome = self.gateway.fetch_catalog(kind).await;

        self.mutate(|state| {
            let result = match outcome {
                Ok(slice) => {
                    let count = slice.len();
                    state.catalog.replace(slice);
                    Ok(count)
                }
                Err(e) => Err(e),
            };
            let status = state.catalog_status.entry(kind).or_default();
            status.loading = false;
            match &result {
                Ok(count) => {
                    status.loaded = true;
                    status.error = None;
                    info!(kind = %kind, count, "Catalog loaded");
                }
                Err(e) => {
                    status.error = Some(e.to_string());
                    warn!(kind = %kind, "Catalog fetch failed: {}", e);
                }
            }
            result
        })
    }

    /// Fetch every catalog kind concurrently. Failures are recorded per kind.
    pub async fn fetch_all_catalogs(&self) {
        let fetches = CatalogKind::ALL.map(|kind| self.fetch_catalog(kind));
        let _ = futures::future::join_all(fetches).await;
    }

    /// Fetch `kind` unless its last fetch succeeded
    pub async fn ensure_catalog(&self, kind: CatalogKind) -> Result<usize> {
        let status = self.catalog_status(kind);
        if status.loaded && !status.loading && status.error.is_none() {
            return Ok(self.state.read().catalog.len(kind));
        }
        self.fetch_catalog(kind).await
    }

    /// Catalog with the static list substituted for every kind whose fetch
    /// failed and left the slice empty
    pub fn catalog_with_fallback(&self) -> CatalogView {
        let state = self.state.read();
        let mut catalog = state.catalog.clone();
        let mut fallback_kinds = Vec::new();
        let fallback = ReferenceCatalog::fallback();

        for kind in CatalogKind::ALL {
            let failed = state
                .catalog_status
                .get(&kind)
                .map(|s| s.error.is_some())
                .unwrap_or(false);
            if failed && catalog.is_empty(kind) {
                catalog.take_slice_from(&fallback, kind);
                fallback_kinds.push(kind);
            }
        }

        CatalogView {
            catalog,
            fallback_kinds,
        }
    }

    // ------------------------------------------------------------------
    // Experiments
    // ------------------------------------------------------------------

    pub fn submission_status(&self) -> SubmissionStatus {
        self.state.read().submission.clone()
    }

    pub fn history(&self) -> Vec<ExperimentRun> {
        self.state.read().history.clone()
    }

    pub fn latest_run(&self) -> Option<ExperimentRun> {
        self.state.read().history.last().cloned()
    }

    /// Message of the last failed submission, if any
    pub fn last_error(&self) -> Option<String> {
        self.state.read().submission.error.clone()
    }

    /// Request that would be sent for the current selection
    pub fn build_request(&self) -> CreateExperimentRequest {
        CreateExperimentRequest::from_selection(&self.state.read().selection, &self.defaults)
    }

    /// Create and run an experiment for the current selection.
    ///
    /// On success the run is appended to history and returned. On failure
    /// the error is recorded, history is unchanged, and the error is
    /// returned to the caller.
    pub async fn create_and_run_experiment(&self) -> Result<ExperimentRun> {
        let request = self.build_request();
        self.mutate(|state| {
            state.submission.running = true;
            state.submission.error = None;
        });

        let outcome = async {
            let record = self.gateway.create_experiment(&request).await?;
            self.gateway.run_experiment(record.id).await
        }
        .await;

        self.mutate(|state| {
            state.submission.running = false;
            match &outcome {
                Ok(run) => {
                    state.history.push(run.clone());
                    info!(run_id = run.id, history = state.history.len(), "Run recorded");
                }
                Err(e) => {
                    state.submission.error = Some(e.to_string());
                    warn!(system = %request.system_id, "Experiment failed: {}", e);
                }
            }
        });

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BasisSetInfo, ExperimentTypeInfo, SystemInfo};
    use crate::error::LabError;
    use crate::gateway::{DataSource, ExperimentRecord};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Gateway that serves the fallback catalog and records requests
    #[derive(Default)]
    struct StubGateway {
        fail_systems: bool,
        requests: Mutex<Vec<CreateExperimentRequest>>,
    }

    #[async_trait]
    impl ExperimentGateway for StubGateway {
        async fn list_systems(&self) -> Result<Vec<SystemInfo>> {
            if self.fail_systems {
                return Err(LabError::Network("connection refused".to_string()));
            }
            Ok(ReferenceCatalog::fallback().systems)
        }

        async fn list_basis_sets(&self) -> Result<Vec<BasisSetInfo>> {
            Ok(ReferenceCatalog::fallback().basis_sets)
        }

        async fn list_experiment_types(&self) -> Result<Vec<ExperimentTypeInfo>> {
            Ok(ReferenceCatalog::fallback().experiment_types)
        }

        async fn create_experiment(&self, request: &CreateExperimentRequest) -> Result<ExperimentRecord> {
            self.requests.lock().push(request.clone());
            Ok(ExperimentRecord {
                id: 41,
                name: Some(request.name.clone()),
                system_id: request.system_id.clone(),
                basis_set: request.basis_set.clone(),
                experiment_type: request.experiment_type.clone(),
                configuration: request.configuration.clone(),
                created_at: None,
            })
        }

        async fn run_experiment(&self, experiment_id: i64) -> Result<ExperimentRun> {
            Ok(ExperimentRun {
                id: 7,
                experiment_id: Some(experiment_id),
                system_id: Some("h2o".to_string()),
                basis_set: Some("sto-3g".to_string()),
                energy: -74.9631,
                reference_energy: Some(-74.963),
                iterations: 18,
                runtime: 2.5,
                converged: Some(true),
                convergence: None,
                data: serde_json::Value::Null,
                created_at: None,
                source: DataSource::Live,
            })
        }
    }

    fn store_with(gateway: StubGateway) -> (Arc<StubGateway>, ExperimentStore) {
        let gateway = Arc::new(gateway);
        let store = ExperimentStore::new(gateway.clone(), AlgorithmDefaults::default());
        (gateway, store)
    }

    #[tokio::test]
    async fn test_open_loads_every_kind() {
        let store = ExperimentStore::open(Arc::new(StubGateway::default()), AlgorithmDefaults::default()).await;
        for kind in CatalogKind::ALL {
            let status = store.catalog_status(kind);
            assert!(status.loaded, "{} not loaded", kind);
            assert!(!status.loading);
            assert!(status.error.is_none());
        }
        assert_eq!(store.catalog().systems.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_fetch_records_error_and_falls_back() {
        let (_, store) = store_with(StubGateway {
            fail_systems: true,
            ..Default::default()
        });
        store.fetch_all_catalogs().await;

        let status = store.catalog_status(CatalogKind::Systems);
        assert!(!status.loaded);
        assert!(status.error.unwrap().contains("connection refused"));
        assert!(store.catalog().systems.is_empty());

        let view = store.catalog_with_fallback();
        assert_eq!(view.fallback_kinds, vec![CatalogKind::Systems]);
        assert_eq!(view.catalog.systems.len(), 4);
        assert!(!view.uses_fallback(CatalogKind::BasisSets));
    }

    #[tokio::test]
    async fn test_ensure_catalog_skips_loaded_kind() {
        let (_, store) = store_with(StubGateway::default());
        store.fetch_catalog(CatalogKind::BasisSets).await.unwrap();
        let before = store.version();
        assert_eq!(store.ensure_catalog(CatalogKind::BasisSets).await.unwrap(), 5);
        assert_eq!(store.version(), before);
    }

    #[tokio::test]
    async fn test_snapshot_reflects_every_slice() {
        let (_, store) = store_with(StubGateway::default());
        store.fetch_all_catalogs().await;
        store.update_selection(SelectionUpdate::new().system_id("ch4"));
        store.create_and_run_experiment().await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.selection.system_id, "ch4");
        assert_eq!(snapshot.catalog.systems.len(), 4);
        assert!(snapshot.catalog_status[&CatalogKind::ExperimentTypes].loaded);
        assert_eq!(snapshot.history.len(), 1);
        assert!(!snapshot.submission.running);
        assert_eq!(snapshot.submission.error, None);
    }

    #[tokio::test]
    async fn test_request_uses_defaults_for_unset_keys() {
        let (gateway, store) = store_with(StubGateway::default());
        store.update_selection(
            SelectionUpdate::new()
                .system_id("h2o")
                .basis_set("sto-3g")
                .experiment_type("ground"),
        );
        store.create_and_run_experiment().await.unwrap();

        let requests = gateway.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].configuration["ansatz"], serde_json::json!("TwoLocal"));
        assert_eq!(requests[0].configuration["hamiltonian"], serde_json::json!("Electronic Structure"));
    }

    #[tokio::test]
    async fn test_mutations_notify_subscribers() {
        let (_, store) = store_with(StubGateway::default());
        let mut rx = store.subscribe();
        store.update_selection(SelectionUpdate::new().system_id("co2"));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();
        assert_eq!(*rx.borrow(), 1);
    }

    #[tokio::test]
    async fn test_reset_keeps_history() {
        let (_, store) = store_with(StubGateway::default());
        store.update_selection(SelectionUpdate::new().system_id("h2o"));
        store.create_and_run_experiment().await.unwrap();
        store.reset_selection();

        assert_eq!(store.selection(), ExperimentSelection::default());
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.latest_run().unwrap().id, 7);
    }
}
