//! Molecular systems known to the lab
//!
//! Geometry, reference energies and a rough resource model for each
//! supported molecule. Lookups by id fail loudly on unknown systems.

use crate::error::{LabError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    H,
    C,
    N,
    O,
}

impl Element {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::H => "H",
            Self::C => "C",
            Self::N => "N",
            Self::O => "O",
        }
    }

    pub fn electrons(&self) -> u32 {
        match self {
            Self::H => 1,
            Self::C => 6,
            Self::N => 7,
            Self::O => 8,
        }
    }
}

/// Atom position in Angstrom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub element: Element,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

const fn atom(element: Element, x: f64, y: f64, z: f64) -> Atom {
    Atom { element, x, y, z }
}

const WATER: [Atom; 3] = [
    atom(Element::O, 0.0, 0.0, 0.0),
    atom(Element::H, 0.0, 0.757, 0.587),
    atom(Element::H, 0.0, -0.757, 0.587),
];

const METHANE: [Atom; 5] = [
    atom(Element::C, 0.0, 0.0, 0.0),
    atom(Element::H, 0.626, 0.626, 0.626),
    atom(Element::H, -0.626, -0.626, 0.626),
    atom(Element::H, -0.626, 0.626, -0.626),
    atom(Element::H, 0.626, -0.626, -0.626),
];

const AMMONIA: [Atom; 4] = [
    atom(Element::N, 0.0, 0.0, 0.0),
    atom(Element::H, 0.0, -0.934, -0.374),
    atom(Element::H, 0.809, 0.467, -0.374),
    atom(Element::H, -0.809, 0.467, -0.374),
];

const CARBON_DIOXIDE: [Atom; 3] = [
    atom(Element::C, 0.0, 0.0, 0.0),
    atom(Element::O, 0.0, 0.0, 1.16),
    atom(Element::O, 0.0, 0.0, -1.16),
];

/// Supported molecules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MolecularSystem {
    Water,
    Methane,
    Ammonia,
    CarbonDioxide,
}

impl MolecularSystem {
    pub const ALL: [MolecularSystem; 4] = [
        MolecularSystem::Water,
        MolecularSystem::Methane,
        MolecularSystem::Ammonia,
        MolecularSystem::CarbonDioxide,
    ];

    /// Resolve a catalog id (case-insensitive)
    pub fn from_id(id: &str) -> Result<Self> {
        match id.trim().to_lowercase().as_str() {
            "h2o" => Ok(Self::Water),
            "ch4" => Ok(Self::Methane),
            "nh3" => Ok(Self::Ammonia),
            "co2" => Ok(Self::CarbonDioxide),
            _ => Err(LabError::UnknownSystem(id.to_string())),
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Water => "h2o",
            Self::Methane => "ch4",
            Self::Ammonia => "nh3",
            Self::CarbonDioxide => "co2",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Water => "Water",
            Self::Methane => "Methane",
            Self::Ammonia => "Ammonia",
            Self::CarbonDioxide => "Carbon Dioxide",
        }
    }

    pub fn formula(&self) -> &'static str {
        match self {
            Self::Water => "H2O",
            Self::Methane => "CH4",
            Self::Ammonia => "NH3",
            Self::CarbonDioxide => "CO2",
        }
    }

    pub fn atoms(&self) -> &'static [Atom] {
        match self {
            Self::Water => &WATER,
            Self::Methane => &METHANE,
            Self::Ammonia => &AMMONIA,
            Self::CarbonDioxide => &CARBON_DIOXIDE,
        }
    }

    pub fn charge(&self) -> i32 {
        0
    }

    pub fn multiplicity(&self) -> u32 {
        1
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, Self::CarbonDioxide)
    }

    /// 3N-5 normal modes for linear molecules, 3N-6 otherwise
    pub fn vibrational_modes(&self) -> usize {
        let degrees = 3 * self.atoms().len();
        if self.is_linear() {
            degrees.saturating_sub(5)
        } else {
            degrees.saturating_sub(6)
        }
    }

    pub fn electron_count(&self) -> u32 {
        let neutral: u32 = self.atoms().iter().map(|a| a.element.electrons()).sum();
        (neutral as i32 - self.charge()) as u32
    }

    /// Tabulated reference energy in hartree
    pub fn reference_energy(&self, basis_set: &str) -> Option<f64> {
        let table: [f64; 5] = match self {
            Self::Water => [-74.963, -75.585, -76.010, -76.241, -76.332],
            Self::Methane => [-39.726, -40.195, -40.462, -40.513, -40.535],
            Self::Ammonia => [-55.454, -55.987, -56.215, -56.298, -56.395],
            Self::CarbonDioxide => [-185.253, -186.565, -187.675, -187.723, -187.968],
        };
        let index = match basis_set.to_lowercase().as_str() {
            "sto-3g" => 0,
            "3-21g" => 1,
            "6-31g" => 2,
            "cc-pvdz" => 3,
            "cc-pvtz" => 4,
            _ => return None,
        };
        Some(table[index])
    }

    /// Rough resource requirements for running an experiment on this system
    pub fn estimate_resources(&self, basis_set: &str, experiment_type: &str) -> ResourceEstimate {
        let electrons = self.electron_count() as f64;
        let basis_factor = basis_set_complexity(basis_set);
        let experiment_factor = experiment_complexity(experiment_type);
        let scale = electrons * electrons * basis_factor * experiment_factor;

        let memory_mb = scale * 0.1;
        let cpu_hours = scale * 0.01;
        // 8 cores
        let runtime_secs = cpu_hours * 3600.0 / 8.0;

        ResourceEstimate {
            memory_mb: round2(memory_mb),
            disk_mb: round2(memory_mb * 5.0),
            cpu_hours: round2(cpu_hours),
            estimated_runtime_secs: round2(runtime_secs),
            estimated_runtime_human: format_duration(runtime_secs),
            basis_set_complexity: basis_factor,
            experiment_complexity: experiment_factor,
            atoms: self.atoms().len(),
            electrons: self.electron_count(),
        }
    }
}

impl std::fmt::Display for MolecularSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.formula())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEstimate {
    pub memory_mb: f64,
    pub disk_mb: f64,
    pub cpu_hours: f64,
    pub estimated_runtime_secs: f64,
    pub estimated_runtime_human: String,
    pub basis_set_complexity: f64,
    pub experiment_complexity: f64,
    pub atoms: usize,
    pub electrons: u32,
}

/// Relative cost of a basis set; unknown sets count as minimal
pub fn basis_set_complexity(basis_set: &str) -> f64 {
    match basis_set.to_lowercase().as_str() {
        "sto-3g" => 1.0,
        "3-21g" => 2.0,
        "6-31g" => 3.0,
        "cc-pvdz" => 4.0,
        "cc-pvtz" => 8.0,
        _ => 1.0,
    }
}

/// Factor used when synthesizing runtimes, steeper than the resource model
pub(crate) fn basis_set_runtime_factor(basis_set: &str) -> f64 {
    match basis_set.to_lowercase().as_str() {
        "3-21g" => 2.0,
        "6-31g" => 3.0,
        "cc-pvdz" => 5.0,
        "cc-pvtz" => 10.0,
        _ => 1.0,
    }
}

/// Kind of calculation behind an experiment type id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentKind {
    GroundState,
    ExcitedState,
    GeometryOptimization,
    VibrationalAnalysis,
    DipoleMoment,
}

impl ExperimentKind {
    pub const ALL: [ExperimentKind; 5] = [
        ExperimentKind::GroundState,
        ExperimentKind::ExcitedState,
        ExperimentKind::GeometryOptimization,
        ExperimentKind::VibrationalAnalysis,
        ExperimentKind::DipoleMoment,
    ];

    /// Accepts short (`ground`) and long (`ground_state`) ids
    pub fn parse(experiment_type: &str) -> Option<Self> {
        match experiment_type.trim().to_lowercase().as_str() {
            "ground" | "ground_state" => Some(Self::GroundState),
            "excited" | "excited_state" => Some(Self::ExcitedState),
            "geometry" | "geometry_optimization" => Some(Self::GeometryOptimization),
            "vibrational" | "vibrational_analysis" => Some(Self::VibrationalAnalysis),
            "dipole" | "dipole_moment" => Some(Self::DipoleMoment),
            _ => None,
        }
    }

    /// Unknown ids are treated as a ground-state calculation
    pub fn from_id_or_ground(experiment_type: &str) -> Self {
        Self::parse(experiment_type).unwrap_or(Self::GroundState)
    }

    pub fn complexity(&self) -> f64 {
        match self {
            Self::GroundState => 1.0,
            Self::ExcitedState => 2.5,
            Self::GeometryOptimization => 3.0,
            Self::VibrationalAnalysis => 5.0,
            Self::DipoleMoment => 1.2,
        }
    }

    /// Multiplier on synthesized runtimes
    pub(crate) fn runtime_factor(&self) -> f64 {
        match self {
            Self::GroundState => 1.0,
            Self::ExcitedState => 1.5,
            Self::GeometryOptimization => 2.0,
            Self::VibrationalAnalysis => 2.5,
            Self::DipoleMoment => 0.5,
        }
    }

    pub fn energy_label(&self) -> &'static str {
        match self {
            Self::GeometryOptimization | Self::VibrationalAnalysis => "Optimized energy",
            _ => "Ground state energy",
        }
    }
}

/// Relative cost of an experiment type; unknown types count as ground state
pub fn experiment_complexity(experiment_type: &str) -> f64 {
    ExperimentKind::parse(experiment_type)
        .map(|kind| kind.complexity())
        .unwrap_or(1.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Human readable duration, e.g. "4.5 minutes"
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{:.1} seconds", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1} minutes", seconds / 60.0)
    } else if seconds < 86400.0 {
        format!("{:.1} hours", seconds / 3600.0)
    } else {
        format!("{:.1} days", seconds / 86400.0)
    }
}
