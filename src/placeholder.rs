//! Placeholder results
//!
//! When the computation service cannot produce a run, the results step
//! still renders a complete layout from synthesized numbers. The payload
//! follows the selected experiment type. Every run made here is tagged
//! [`DataSource::Placeholder`] so views can label it.

use crate::error::Result;
use crate::gateway::{DataSource, DipoleMoment, ExperimentRun};
use crate::selection::ExperimentSelection;
use crate::systems::{basis_set_runtime_factor, ExperimentKind, MolecularSystem};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Map, Value};
use std::ops::RangeInclusive;

const SYMMETRIES: [&str; 4] = ["A1", "A2", "B1", "B2"];
const HARTREE_TO_EV: f64 = 27.2114;
const EXCITED_STATES: u32 = 3;

fn iteration_range(kind: ExperimentKind) -> RangeInclusive<u32> {
    match kind {
        ExperimentKind::GroundState | ExperimentKind::DipoleMoment => 10..=30,
        ExperimentKind::ExcitedState => 15..=45,
        ExperimentKind::GeometryOptimization => 20..=50,
        ExperimentKind::VibrationalAnalysis => 30..=70,
    }
}

/// Synthesize a run for `selection`.
///
/// Unknown experiment types get a ground-state payload. Fails with
/// `UnknownSystem` when the selected system is not one of the supported
/// molecules.
pub fn placeholder_run<R: Rng>(selection: &ExperimentSelection, rng: &mut R) -> Result<ExperimentRun> {
    let system = MolecularSystem::from_id(&selection.system_id)?;
    let kind = ExperimentKind::from_id_or_ground(&selection.experiment_type);
    let atoms = system.atoms().len();

    let reference_energy = system
        .reference_energy(&selection.basis_set)
        .unwrap_or_else(|| -50.0 - atoms as f64 * 10.0 + rng.gen_range(-0.5..=0.5));
    let energy = reference_energy + rng.gen_range(-0.001..=0.001);
    let iterations: u32 = rng.gen_range(iteration_range(kind));

    let runtime = (atoms * atoms) as f64
        * basis_set_runtime_factor(&selection.basis_set)
        * kind.runtime_factor()
        * rng.gen_range(0.8..=1.2);

    let mut data = Map::new();
    data.insert("experiment_type".into(), json!(selection.experiment_type));
    data.insert("orbitals".into(), orbitals(atoms, rng));
    data.insert(
        "convergence_history".into(),
        json!(convergence_history(energy, iterations, rng)),
    );

    match kind {
        ExperimentKind::GroundState => {
            let dipole: Vec<f64> = (0..3).map(|_| rng.gen_range(-0.5..=0.5)).collect();
            data.insert("dipole_moment".into(), json!(dipole));
            data.insert("method".into(), json!("RHF"));
        }
        ExperimentKind::ExcitedState => {
            data.insert("excited_states".into(), excited_states(energy, rng));
            data.insert("method".into(), json!("TD-RHF"));
        }
        ExperimentKind::GeometryOptimization => {
            data.insert("optimized_geometry".into(), optimized_geometry(system, rng));
            data.insert("optimization_steps".into(), optimization_steps(energy, rng));
            data.insert("method".into(), json!("RHF"));
        }
        ExperimentKind::VibrationalAnalysis => {
            data.insert("optimized_geometry".into(), optimized_geometry(system, rng));
            let (modes, zero_point) = vibrations(system, rng);
            data.insert("vibrations".into(), modes);
            data.insert("zero_point_energy".into(), json!(zero_point));
            data.insert("method".into(), json!("RHF"));
        }
        ExperimentKind::DipoleMoment => {
            let dipole = DipoleMoment::from_components(
                rng.gen_range(-2.0..=2.0),
                rng.gen_range(-2.0..=2.0),
                rng.gen_range(-2.0..=2.0),
            );
            data.insert("dipole_moment".into(), json!(dipole));
            data.insert("method".into(), json!("RHF"));
        }
    }

    Ok(ExperimentRun {
        id: 0,
        experiment_id: None,
        system_id: Some(system.id().to_string()),
        basis_set: Some(selection.basis_set.clone()),
        energy,
        reference_energy: Some(reference_energy),
        iterations,
        runtime,
        converged: Some(true),
        convergence: None,
        data: Value::Object(data),
        created_at: Some(chrono::Utc::now().to_rfc3339()),
        source: DataSource::Placeholder,
    })
}

fn orbitals<R: Rng>(atoms: usize, rng: &mut R) -> Value {
    let count = atoms * 2;
    let orbitals: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "index": i,
                "energy": -10.0 + i as f64 * 0.5 + rng.gen_range(-0.01..=0.01),
                "occupation": if i < count / 2 { 2.0 } else { 0.0 },
                "symmetry": SYMMETRIES.choose(&mut *rng).copied().unwrap_or("A1"),
            })
        })
        .collect();
    Value::Array(orbitals)
}

/// Cubic approach to the final energy
fn convergence_history<R: Rng>(energy: f64, iterations: u32, rng: &mut R) -> Vec<f64> {
    let start_gap = rng.gen_range(0.5..=1.5);
    (0..iterations)
        .map(|i| {
            let remaining = (iterations - 1 - i) as f64 / iterations as f64;
            energy + start_gap * remaining.powi(3)
        })
        .collect()
}

fn excited_states<R: Rng>(ground_energy: f64, rng: &mut R) -> Value {
    let states: Vec<Value> = (0..EXCITED_STATES)
        .map(|i| {
            let excitation = (i + 1) as f64 * 0.1 + rng.gen_range(-0.02..=0.02);
            json!({
                "state": i + 1,
                "excitation_energy": excitation,
                "excitation_energy_ev": excitation * HARTREE_TO_EV,
                "total_energy": ground_energy + excitation,
                "oscillator_strength": rng.gen_range(0.01..=1.0),
                "description": format!("HOMO->{} ({:.2})", i, rng.gen_range(0.7..=0.95)),
            })
        })
        .collect();
    Value::Array(states)
}

/// Input geometry nudged by up to 0.02 Angstrom per coordinate
fn optimized_geometry<R: Rng>(system: MolecularSystem, rng: &mut R) -> Value {
    let atoms: Vec<Value> = system
        .atoms()
        .iter()
        .map(|atom| {
            json!({
                "symbol": atom.element.symbol(),
                "x": atom.x + rng.gen_range(-0.02..=0.02),
                "y": atom.y + rng.gen_range(-0.02..=0.02),
                "z": atom.z + rng.gen_range(-0.02..=0.02),
            })
        })
        .collect();
    json!({
        "atoms": atoms,
        "charge": system.charge(),
        "multiplicity": system.multiplicity(),
    })
}

/// Steps descending from above `energy` onto it, gradients shrinking
fn optimization_steps<R: Rng>(energy: f64, rng: &mut R) -> Value {
    let count: u32 = rng.gen_range(5..=15);
    let mut current = energy + rng.gen_range(0.1..=0.3);
    let steps: Vec<Value> = (0..count)
        .map(|i| {
            let progress = (i + 1) as f64 / count as f64;
            current = current - (current - energy) * progress + rng.gen_range(-0.001..=0.001);
            let rms_gradient = 0.1 * (1.0 - i as f64 / count as f64) + rng.gen_range(-0.005..=0.005);
            json!({
                "step": i + 1,
                "energy": current,
                "rms_gradient": rms_gradient,
                "max_force": rms_gradient * 2.0 + rng.gen_range(-0.01..=0.01),
            })
        })
        .collect();
    Value::Array(steps)
}

/// Normal modes and the zero-point energy in kcal/mol
fn vibrations<R: Rng>(system: MolecularSystem, rng: &mut R) -> (Value, f64) {
    let atoms = system.atoms().len();
    let mut zero_point = 0.0;
    let modes: Vec<Value> = (0..system.vibrational_modes())
        .map(|i| {
            let frequency = (i + 1) as f64 * 100.0 + rng.gen_range(-50.0..=50.0);
            zero_point += frequency.max(0.0);
            let displacements: Vec<Value> = (0..atoms)
                .map(|atom| {
                    json!({
                        "atom": atom,
                        "dx": rng.gen_range(-0.1..=0.1),
                        "dy": rng.gen_range(-0.1..=0.1),
                        "dz": rng.gen_range(-0.1..=0.1),
                    })
                })
                .collect();
            json!({
                "mode": i + 1,
                "frequency": frequency,
                "intensity": rng.gen_range(0.0..=100.0),
                "reduced_mass": rng.gen_range(1.0..=5.0),
                "force_constant": rng.gen_range(0.1..=0.5),
                "displacements": displacements,
            })
        })
        .collect();
    (Value::Array(modes), zero_point * 0.5 / 4.184 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LabError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn selection(system: &str, basis: &str) -> ExperimentSelection {
        experiment(system, basis, "ground")
    }

    fn experiment(system: &str, basis: &str, experiment_type: &str) -> ExperimentSelection {
        ExperimentSelection {
            system_id: system.to_string(),
            basis_set: basis.to_string(),
            experiment_type: experiment_type.to_string(),
            ..Default::default()
        }
    }

    /// Top-level keys plus the dipole shape, which separates ground from dipole runs
    fn payload_layout(run: &ExperimentRun) -> (Vec<String>, bool) {
        let keys = run
            .data
            .as_object()
            .map(|data| data.keys().cloned().collect())
            .unwrap_or_default();
        (keys, run.data["dipole_moment"].is_object())
    }

    #[test]
    fn test_placeholder_is_flagged() {
        let mut rng = StdRng::seed_from_u64(7);
        let run = placeholder_run(&selection("h2o", "sto-3g"), &mut rng).unwrap();
        assert!(run.is_placeholder());
        assert_eq!(run.system_id.as_deref(), Some("h2o"));
    }

    #[test]
    fn test_energy_near_tabulated_reference() {
        let mut rng = StdRng::seed_from_u64(1);
        let run = placeholder_run(&selection("nh3", "6-31g"), &mut rng).unwrap();
        assert_eq!(run.reference_energy, Some(-56.215));
        assert!(run.energy_error().unwrap().abs() <= 0.001 + 1e-12);
        assert!((10..=30).contains(&run.iterations));
    }

    #[test]
    fn test_untabulated_basis_gets_plausible_reference() {
        let mut rng = StdRng::seed_from_u64(3);
        let run = placeholder_run(&selection("ch4", "def2-svp"), &mut rng).unwrap();
        let reference = run.reference_energy.unwrap();
        // 5 atoms: -100 +/- 0.5
        assert!((-100.5..=-99.5).contains(&reference));
    }

    #[test]
    fn test_payload_shapes() {
        let mut rng = StdRng::seed_from_u64(11);
        let run = placeholder_run(&selection("co2", "cc-pvdz"), &mut rng).unwrap();

        let orbitals = run.orbitals();
        assert_eq!(orbitals.len(), 6);
        assert_eq!(orbitals.iter().filter(|o| o.occupation == 2.0).count(), 3);

        let history = run.convergence_history();
        assert_eq!(history.len(), run.iterations as usize);
        assert!((history.last().unwrap() - run.energy).abs() < 1e-12);
        assert!(history.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_ground_state_payload() {
        let mut rng = StdRng::seed_from_u64(21);
        let run = placeholder_run(&experiment("h2o", "sto-3g", "ground_state"), &mut rng).unwrap();

        assert_eq!(run.method(), Some("RHF"));
        let dipole = run.dipole_moment().unwrap();
        assert!(dipole.x.abs() <= 0.5 && dipole.y.abs() <= 0.5 && dipole.z.abs() <= 0.5);
        assert!(run.excited_states().is_empty());
        assert!(run.optimized_geometry().is_none());
        assert!(run.vibrations().is_empty());
    }

    #[test]
    fn test_excited_state_payload() {
        let mut rng = StdRng::seed_from_u64(22);
        let run = placeholder_run(&experiment("h2o", "sto-3g", "excited"), &mut rng).unwrap();

        assert_eq!(run.method(), Some("TD-RHF"));
        assert!((15..=45).contains(&run.iterations));
        // 9 atom pairs, runtime factor 1.5
        assert!((9.0 * 1.5 * 0.8..=9.0 * 1.5 * 1.2).contains(&run.runtime));

        let states = run.excited_states();
        assert_eq!(states.len(), 3);
        for (i, state) in states.iter().enumerate() {
            assert_eq!(state.state, i as u32 + 1);
            assert!((state.excitation_energy - (i + 1) as f64 * 0.1).abs() <= 0.02 + 1e-12);
            assert!((state.excitation_energy_ev - state.excitation_energy * 27.2114).abs() < 1e-9);
            assert!((state.total_energy - run.energy - state.excitation_energy).abs() < 1e-9);
            assert!((0.01..=1.0).contains(&state.oscillator_strength));
        }
    }

    #[test]
    fn test_geometry_optimization_payload() {
        let mut rng = StdRng::seed_from_u64(23);
        let run = placeholder_run(&experiment("nh3", "sto-3g", "geometry"), &mut rng).unwrap();
        assert!((20..=50).contains(&run.iterations));

        let geometry = run.optimized_geometry().unwrap();
        let input = MolecularSystem::Ammonia.atoms();
        assert_eq!(geometry.atoms.len(), input.len());
        for (optimized, original) in geometry.atoms.iter().zip(input) {
            assert_eq!(optimized.symbol, original.element.symbol());
            assert!((optimized.x - original.x).abs() <= 0.02 + 1e-12);
            assert!((optimized.z - original.z).abs() <= 0.02 + 1e-12);
        }

        let steps = run.optimization_steps();
        assert!((5..=15).contains(&steps.len()));
        let last = steps.last().unwrap();
        assert!((last.energy - run.energy).abs() <= 0.001 + 1e-9);
        assert!(steps.first().unwrap().energy > run.energy);
    }

    #[test]
    fn test_vibrational_analysis_payload() {
        let mut rng = StdRng::seed_from_u64(24);
        let run = placeholder_run(&experiment("co2", "sto-3g", "vibrational_analysis"), &mut rng)
            .unwrap();
        assert!((30..=70).contains(&run.iterations));
        assert!(run.optimized_geometry().is_some());

        let modes = run.vibrations();
        assert_eq!(modes.len(), 4);
        assert!(modes.iter().all(|m| m.displacements.len() == 3));

        let expected: f64 =
            modes.iter().map(|m| m.frequency.max(0.0)).sum::<f64>() * 0.5 / 4.184 / 1000.0;
        assert!((run.zero_point_energy().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_dipole_moment_payload() {
        let mut rng = StdRng::seed_from_u64(25);
        let run = placeholder_run(&experiment("h2o", "sto-3g", "dipole"), &mut rng).unwrap();

        assert!((10..=30).contains(&run.iterations));
        assert!((9.0 * 0.5 * 0.8..=9.0 * 0.5 * 1.2).contains(&run.runtime));
        assert!(run.data["dipole_moment"].is_object());

        let dipole = run.dipole_moment().unwrap();
        assert!(dipole.x.abs() <= 2.0 && dipole.y.abs() <= 2.0 && dipole.z.abs() <= 2.0);
        let norm = (dipole.x.powi(2) + dipole.y.powi(2) + dipole.z.powi(2)).sqrt();
        assert!((dipole.total - norm).abs() < 1e-12);
    }

    #[test]
    fn test_each_experiment_type_has_its_own_layout() {
        let layouts: HashSet<(Vec<String>, bool)> = ["ground", "excited", "geometry", "vibrational", "dipole"]
            .into_iter()
            .map(|id| {
                let mut rng = StdRng::seed_from_u64(9);
                payload_layout(&placeholder_run(&experiment("ch4", "sto-3g", id), &mut rng).unwrap())
            })
            .collect();
        assert_eq!(layouts.len(), ExperimentKind::ALL.len());
    }

    #[test]
    fn test_unknown_experiment_type_falls_back_to_ground_state() {
        let mut rng = StdRng::seed_from_u64(4);
        let run = placeholder_run(&experiment("h2o", "sto-3g", "nmr"), &mut rng).unwrap();
        assert_eq!(run.method(), Some("RHF"));
        assert!(run.data["dipole_moment"].is_array());
        assert_eq!(run.data["experiment_type"], json!("nmr"));
    }

    #[test]
    fn test_unknown_system_is_not_substituted() {
        let mut rng = StdRng::seed_from_u64(5);
        let err = placeholder_run(&selection("unobtainium", "sto-3g"), &mut rng).unwrap_err();
        assert!(matches!(err, LabError::UnknownSystem(_)));
    }
}
