//! Estimate command - local resource estimate for a molecule

use crate::style::*;
use anyhow::Result;
use quantum_lab::MolecularSystem;

pub fn run(system: &str, basis: &str, experiment_type: &str) -> Result<()> {
    let molecule = MolecularSystem::from_id(system)?;
    let estimate = molecule.estimate_resources(basis, experiment_type);

    print_header(&format!("{} ({})", molecule.name(), molecule.formula()));
    print_key_value("Basis set", basis);
    print_key_value("Experiment", experiment_type);
    print_key_value("Atoms", &estimate.atoms.to_string());
    print_key_value("Electrons", &estimate.electrons.to_string());
    if let Some(reference) = molecule.reference_energy(basis) {
        print_key_value("Reference energy", &format_energy(reference));
    }
    println!();
    print_key_value("Memory", &format!("{} MB", estimate.memory_mb));
    print_key_value("Disk", &format!("{} MB", estimate.disk_mb));
    print_key_value("CPU", &format!("{} h", estimate.cpu_hours));
    print_key_value("Runtime", &estimate.estimated_runtime_human);
    Ok(())
}
