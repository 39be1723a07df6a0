use crate::catalog::{BasisSetInfo, ExperimentTypeInfo, SystemInfo};
use crate::selection::{AlgorithmDefaults, Configuration, ExperimentSelection};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemsResponse {
    pub systems: Vec<SystemInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasisSetsResponse {
    pub basis_sets: Vec<BasisSetInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentTypesResponse {
    pub experiment_types: Vec<ExperimentTypeInfo>,
}

/// Body of `POST /experiments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateExperimentRequest {
    pub name: String,
    pub system_id: String,
    pub basis_set: String,
    pub experiment_type: String,
    pub configuration: Configuration,
}

impl CreateExperimentRequest {
    /// Build a request from the selection, filling unset configuration keys
    /// from `defaults`
    pub fn from_selection(selection: &ExperimentSelection, defaults: &AlgorithmDefaults) -> Self {
        Self {
            name: format!("Experiment {}", selection.system_id),
            system_id: selection.system_id.clone(),
            basis_set: selection.basis_set.clone(),
            experiment_type: selection.experiment_type.clone(),
            configuration: selection.configuration_with_defaults(defaults),
        }
    }
}

/// Experiment as stored by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub system_id: String,
    #[serde(default)]
    pub basis_set: String,
    #[serde(default)]
    pub experiment_type: String,
    #[serde(default)]
    pub configuration: Configuration,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Where a run's numbers came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Returned by the computation service
    #[default]
    Live,
    /// Synthesized locally because the service failed
    Placeholder,
}

/// Result of running an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRun {
    pub id: i64,
    #[serde(default)]
    pub experiment_id: Option<i64>,
    #[serde(default)]
    pub system_id: Option<String>,
    #[serde(default)]
    pub basis_set: Option<String>,
    pub energy: f64,
    #[serde(default)]
    pub reference_energy: Option<f64>,
    pub iterations: u32,
    pub runtime: f64,
    #[serde(default)]
    pub converged: Option<bool>,
    #[serde(default)]
    pub convergence: Option<f64>,
    /// Orbitals, convergence history and other payloads
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub source: DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orbital {
    pub index: u32,
    pub energy: f64,
    pub occupation: f64,
    #[serde(default)]
    pub symmetry: Option<String>,
}

/// One excited state, energies relative to the ground state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcitedState {
    pub state: u32,
    /// Hartree
    pub excitation_energy: f64,
    pub excitation_energy_ev: f64,
    pub total_energy: f64,
    pub oscillator_strength: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryAtom {
    pub symbol: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedGeometry {
    pub atoms: Vec<GeometryAtom>,
    #[serde(default)]
    pub charge: i32,
    #[serde(default = "default_multiplicity")]
    pub multiplicity: u32,
}

fn default_multiplicity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStep {
    pub step: u32,
    pub energy: f64,
    pub rms_gradient: f64,
    pub max_force: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    pub atom: u32,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

/// Normal mode; frequency in cm^-1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibrationalMode {
    pub mode: u32,
    pub frequency: f64,
    pub intensity: f64,
    #[serde(default)]
    pub reduced_mass: Option<f64>,
    #[serde(default)]
    pub force_constant: Option<f64>,
    #[serde(default)]
    pub displacements: Vec<Displacement>,
}

/// Dipole vector in debye
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DipoleMoment {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub total: f64,
}

impl DipoleMoment {
    pub fn from_components(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            total: (x * x + y * y + z * z).sqrt(),
        }
    }
}

impl ExperimentRun {
    pub fn is_placeholder(&self) -> bool {
        self.source == DataSource::Placeholder
    }

    /// Deviation from the reference energy, in hartree
    pub fn energy_error(&self) -> Option<f64> {
        self.reference_energy.map(|reference| self.energy - reference)
    }

    fn payload<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn orbitals(&self) -> Vec<Orbital> {
        self.payload("orbitals").unwrap_or_default()
    }

    /// Energy per optimizer iteration, when the service reports it
    pub fn convergence_history(&self) -> Vec<f64> {
        self.data
            .get("convergence_history")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default()
    }

    /// Electronic structure method, e.g. "RHF" or "TD-RHF"
    pub fn method(&self) -> Option<&str> {
        self.data.get("method").and_then(Value::as_str)
    }

    pub fn excited_states(&self) -> Vec<ExcitedState> {
        self.payload("excited_states").unwrap_or_default()
    }

    pub fn optimized_geometry(&self) -> Option<OptimizedGeometry> {
        self.payload("optimized_geometry")
    }

    pub fn optimization_steps(&self) -> Vec<OptimizationStep> {
        self.payload("optimization_steps").unwrap_or_default()
    }

    pub fn vibrations(&self) -> Vec<VibrationalMode> {
        self.payload("vibrations").unwrap_or_default()
    }

    /// kcal/mol
    pub fn zero_point_energy(&self) -> Option<f64> {
        self.data.get("zero_point_energy").and_then(Value::as_f64)
    }

    /// Accepts both `{x, y, z, total}` and a bare `[x, y, z]` vector
    pub fn dipole_moment(&self) -> Option<DipoleMoment> {
        match self.data.get("dipole_moment")? {
            Value::Array(parts) => match parts.as_slice() {
                [x, y, z] => Some(DipoleMoment::from_components(
                    x.as_f64()?,
                    y.as_f64()?,
                    z.as_f64()?,
                )),
                _ => None,
            },
            other => serde_json::from_value(other.clone()).ok(),
        }
    }
}

/// `GET /results/{id}/details`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDetails {
    pub id: i64,
    pub experiment_id: i64,
    pub energy: f64,
    #[serde(default)]
    pub reference_energy: Option<f64>,
    pub iterations: u32,
    pub runtime: f64,
    #[serde(default)]
    pub convergence: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    pub system_name: String,
    #[serde(default)]
    pub configuration: Configuration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub using_mock: bool,
}
