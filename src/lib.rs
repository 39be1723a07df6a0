//! Quantum Lab
//!
//! Core of a multi-step wizard for configuring simulated quantum-chemistry
//! experiments. Computation happens in an external service; this crate
//! holds the state the wizard steps share and the plumbing around it.
//!
//! ## Module Structure
//!
//! - `selection`: the in-progress experiment and algorithm defaults
//! - `catalog`: selectable systems, basis sets and experiment types
//! - `gateway`: request/response boundary to the computation service
//! - `store`: shared experiment state, catalog status and run history
//! - `navigation`: wizard steps and the transition controller
//! - `systems`: molecule table and resource estimation
//! - `placeholder`: labelled stand-in results when the service fails
//! - `publish`: mock ledger publishing of results
//! - `config`: runtime configuration

pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod navigation;
pub mod placeholder;
pub mod publish;
pub mod selection;
pub mod store;
pub mod systems;

pub use catalog::{
    BasisSetGroup, BasisSetInfo, CatalogKind, CatalogSlice, ExperimentTypeInfo, ReferenceCatalog,
    SystemInfo,
};
pub use config::{ApiConfig, LabConfig, WizardConfig};
pub use error::{FieldError, LabError, Result};
pub use gateway::{
    CreateExperimentRequest, DataSource, ExperimentGateway, ExperimentRecord, ExperimentRun,
    HttpGateway,
};
pub use navigation::{Direction, NavigationController, NavigationState, TransitionTimings, WizardStep};
pub use placeholder::placeholder_run;
pub use publish::{MockLedger, PublishReceipt};
pub use selection::{AlgorithmDefaults, Configuration, ExperimentSelection, SelectionUpdate};
pub use store::{CatalogStatus, CatalogView, ExperimentStore, StoreSnapshot, SubmissionStatus};
pub use systems::{ExperimentKind, MolecularSystem, ResourceEstimate};
