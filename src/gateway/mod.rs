//! Remote data gateway
//!
//! Everything that knows the request/response shapes of the quantum
//! computation service. The rest of the crate talks to the
//! [`ExperimentGateway`] trait; [`HttpGateway`] is the JSON-over-HTTP
//! implementation.

pub mod client;
pub mod types;

use crate::catalog::{BasisSetInfo, CatalogKind, CatalogSlice, ExperimentTypeInfo, SystemInfo};
use crate::error::Result;
use async_trait::async_trait;

pub use client::{error_from_body, HttpGateway};
pub use types::{
    CreateExperimentRequest, DataSource, DipoleMoment, Displacement, ExcitedState,
    ExperimentRecord, ExperimentRun, GeometryAtom, HealthResponse, OptimizationStep,
    OptimizedGeometry, Orbital, ResultDetails, VibrationalMode,
};

/// Request/response boundary to the computation service.
///
/// One attempt per call; retry policy belongs to the caller.
#[async_trait]
pub trait ExperimentGateway: Send + Sync {
    async fn list_systems(&self) -> Result<Vec<SystemInfo>>;

    async fn list_basis_sets(&self) -> Result<Vec<BasisSetInfo>>;

    async fn list_experiment_types(&self) -> Result<Vec<ExperimentTypeInfo>>;

    /// Register an experiment; the returned record carries the new id
    async fn create_experiment(&self, request: &CreateExperimentRequest) -> Result<ExperimentRecord>;

    async fn run_experiment(&self, experiment_id: i64) -> Result<ExperimentRun>;

    /// Fetch one catalog slice
    async fn fetch_catalog(&self, kind: CatalogKind) -> Result<CatalogSlice> {
        Ok(match kind {
            CatalogKind::Systems => CatalogSlice::Systems(self.list_systems().await?),
            CatalogKind::BasisSets => CatalogSlice::BasisSets(self.list_basis_sets().await?),
            CatalogKind::ExperimentTypes => {
                CatalogSlice::ExperimentTypes(self.list_experiment_types().await?)
            }
        })
    }
}
