//! Wizard step screens

use super::{spinner, Session, StepAction};
use crate::commands::catalog::catalog_table;
use crate::style::*;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use quantum_lab::selection::keys;
use quantum_lab::{
    placeholder_run, BasisSetGroup, BasisSetInfo, CatalogKind, Configuration, ExperimentKind,
    ExperimentRun, ExperimentSelection, MolecularSystem, ReferenceCatalog, SelectionUpdate,
    WizardStep,
};
use serde_json::Value;

const ALGORITHMS: [&str; 3] = ["VQE", "QAOA", "QPE"];
const MAPPERS: [&str; 3] = ["JW", "Parity", "BK"];
const ANSATZES: [&str; 3] = ["TwoLocal", "UCCSD", "HWE"];
const HAMILTONIANS: [&str; 2] = ["Electronic Structure", "Vibrational Structure"];

fn theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

/// Pick from `items`, returning the index
fn choose<T: ToString>(prompt: &str, items: &[T], default: usize) -> Result<usize> {
    Ok(Select::with_theme(&theme())
        .with_prompt(format!("  {}", prompt))
        .items(items)
        .default(default.min(items.len().saturating_sub(1)))
        .interact()?)
}

/// Trailing navigation menu shared by most steps
fn navigate(options: &[(&str, StepAction)]) -> Result<StepAction> {
    let labels: Vec<&str> = options.iter().map(|(label, _)| *label).collect();
    let index = choose("What next?", &labels, 0)?;
    Ok(options[index].1)
}

/// Catalog the steps render from, with built-in entries standing in for
/// failed fetches when enabled
fn visible_catalog(session: &Session<'_>, kinds: &[CatalogKind]) -> ReferenceCatalog {
    if !session.config.wizard.fallback_catalog {
        return session.store.catalog();
    }
    let view = session.store.catalog_with_fallback();
    for kind in kinds {
        if view.uses_fallback(*kind) {
            let error = session.store.catalog_status(*kind).error.unwrap_or_default();
            print_box(
                &format!("Could not load {}", kind),
                &[error.as_str(), "Showing the built-in list instead"],
            );
        }
    }
    view.catalog
}

// ----------------------------------------------------------------------
// Intro
// ----------------------------------------------------------------------

pub fn intro() -> Result<StepAction> {
    println!();
    println!("  Build a quantum-chemistry experiment in a few steps:");
    println!();
    for step in &WizardStep::ALL[1..] {
        println!("    {} {}", style("·").cyan(), step.title());
    }
    println!();
    println!(
        "  {}",
        style("Calculations run on the computation service; nothing is computed locally.").dim()
    );
    println!();

    navigate(&[("Start", StepAction::Next), ("Quit", StepAction::Quit)])
}

// ----------------------------------------------------------------------
// System selection
// ----------------------------------------------------------------------

pub async fn system_selection(session: &Session<'_>) -> Result<StepAction> {
    if session.store.catalog_status(CatalogKind::Systems).error.is_some() {
        let loading = spinner("Loading systems...");
        // Outcome is recorded in the store
        let _ = session.store.ensure_catalog(CatalogKind::Systems).await;
        loading.finish_and_clear();
    }
    let catalog = visible_catalog(session, &[CatalogKind::Systems]);

    if catalog.systems.is_empty() {
        if let Some(error) = session.store.catalog_status(CatalogKind::Systems).error {
            print_error(&format!("Could not load systems: {}", error));
        } else {
            print_warning("The service returned no systems");
        }
        let action = navigate(&[
            ("Retry", StepAction::Stay),
            ("Back", StepAction::Back),
            ("Quit", StepAction::Quit),
        ])?;
        // A failed kind is refetched when the step renders again; an empty
        // but successful list has to be forced
        let failed = session.store.catalog_status(CatalogKind::Systems).error.is_some();
        if action == StepAction::Stay && !failed {
            let loading = spinner("Loading systems...");
            let _ = session.store.fetch_catalog(CatalogKind::Systems).await;
            loading.finish_and_clear();
        }
        return Ok(action);
    }

    println!();
    println!("{}", catalog_table(&catalog, CatalogKind::Systems));

    let selection = session.store.selection();
    let mut items: Vec<String> = catalog
        .systems
        .iter()
        .map(|s| match &s.description {
            Some(d) => format!("{}  {}", s.name, style(d).dim()),
            None => s.name.clone(),
        })
        .collect();
    items.push(style("← Back").dim().to_string());
    let current = catalog
        .systems
        .iter()
        .position(|s| s.id == selection.system_id)
        .unwrap_or(0);

    let index = choose("Molecular system", &items, current)?;
    let Some(system) = catalog.systems.get(index) else {
        return Ok(StepAction::Back);
    };

    session
        .store
        .update_selection(SelectionUpdate::new().system_id(system.id.clone()));
    print_success(&format!("System: {}", style(&system.name).cyan()));
    Ok(StepAction::Next)
}

// ----------------------------------------------------------------------
// System detail
// ----------------------------------------------------------------------

pub fn system_detail(session: &Session<'_>) -> Result<StepAction> {
    let catalog = visible_catalog(
        session,
        &[CatalogKind::BasisSets, CatalogKind::ExperimentTypes],
    );
    let selection = session.store.selection();

    match catalog.system(&selection.system_id) {
        Some(info) => {
            print_key_value("System", &info.name);
            if let Some(description) = &info.description {
                print_key_value("About", description);
            }
        }
        None => print_key_value("System", &selection.system_id),
    }
    match MolecularSystem::from_id(&selection.system_id) {
        Ok(molecule) => print_geometry(molecule),
        Err(e) => print_info(&format!("No local geometry: {}", e)),
    }

    if catalog.basis_sets.is_empty() || catalog.experiment_types.is_empty() {
        print_error("Basis sets or experiment types are unavailable");
        return navigate(&[("Back", StepAction::Back), ("Quit", StepAction::Quit)]);
    }

    // Basis sets, grouped by family
    let basis_sets = grouped(&catalog.basis_sets);
    let items: Vec<String> = basis_sets
        .iter()
        .map(|b| format!("{:<24} {}", b.name, style(b.group_label()).dim()))
        .collect();
    let current = basis_sets
        .iter()
        .position(|b| b.id == selection.basis_set)
        .unwrap_or(0);
    let basis = basis_sets[choose("Basis set", &items, current)?];

    let items: Vec<&str> = catalog
        .experiment_types
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    let current = catalog
        .experiment_types
        .iter()
        .position(|e| e.id == selection.experiment_type)
        .unwrap_or(0);
    let experiment = &catalog.experiment_types[choose("Experiment type", &items, current)?];

    session.store.update_selection(
        SelectionUpdate::new()
            .basis_set(basis.id.clone())
            .experiment_type(experiment.id.clone()),
    );
    print_success(&format!(
        "{} / {}",
        style(&basis.name).cyan(),
        style(&experiment.name).cyan()
    ));

    if let Ok(molecule) = MolecularSystem::from_id(&selection.system_id) {
        let estimate = molecule.estimate_resources(&basis.id, &experiment.id);
        println!();
        print_key_value("Estimated runtime", &estimate.estimated_runtime_human);
        print_key_value(
            "Memory / disk",
            &format!("{} MB / {} MB", estimate.memory_mb, estimate.disk_mb),
        );
    }
    println!();

    navigate(&[
        ("Continue", StepAction::Next),
        ("Change selection", StepAction::Stay),
        ("Back", StepAction::Back),
        ("Quit", StepAction::Quit),
    ])
}

fn group_rank(group: Option<BasisSetGroup>) -> u8 {
    match group {
        Some(BasisSetGroup::Minimal) => 0,
        Some(BasisSetGroup::SplitValence) => 1,
        Some(BasisSetGroup::CorrelationConsistent) => 2,
        Some(BasisSetGroup::Other) => 3,
        None => 4,
    }
}

fn grouped(basis_sets: &[BasisSetInfo]) -> Vec<&BasisSetInfo> {
    let mut sorted: Vec<&BasisSetInfo> = basis_sets.iter().collect();
    sorted.sort_by_key(|b| group_rank(b.group));
    sorted
}

fn print_geometry(molecule: MolecularSystem) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Atom", "x (Å)", "y (Å)", "z (Å)"]);
    for atom in molecule.atoms() {
        table.add_row(vec![
            atom.element.symbol().to_string(),
            format!("{:.4}", atom.x),
            format!("{:.4}", atom.y),
            format!("{:.4}", atom.z),
        ]);
    }
    println!();
    print_key_value("Formula", molecule.formula());
    print_key_value(
        "Electrons",
        &format!(
            "{} (charge {}, multiplicity {})",
            molecule.electron_count(),
            molecule.charge(),
            molecule.multiplicity()
        ),
    );
    println!("{}", table);
}

// ----------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------

pub fn configuration(session: &Session<'_>) -> Result<StepAction> {
    let selection = session.store.selection();
    // Edits stay local until confirmed, then replace the whole map
    let mut draft = selection.configuration_with_defaults(session.store.defaults());

    println!();
    pick_option(&mut draft, keys::ANSATZ, "Ansatz", &ANSATZES)?;
    pick_option(&mut draft, keys::MAPPER, "Qubit mapper", &MAPPERS)?;
    pick_option(&mut draft, keys::HAMILTONIAN, "Hamiltonian", &HAMILTONIANS)?;
    pick_option(&mut draft, keys::ALGORITHM, "Algorithm", &ALGORITHMS)?;

    let current_max = draft
        .get(keys::MAX_ITERATIONS)
        .and_then(Value::as_u64)
        .unwrap_or(u64::from(session.store.defaults().max_iterations));
    let max_iterations: u64 = Input::with_theme(&theme())
        .with_prompt("  Max iterations")
        .default(current_max)
        .validate_with(|n: &u64| -> Result<(), &str> {
            if *n == 0 || *n > 10_000 {
                return Err("Must be between 1 and 10000");
            }
            Ok(())
        })
        .interact_text()?;
    draft.insert(keys::MAX_ITERATIONS.to_string(), Value::from(max_iterations));

    println!();
    print_configuration(&selection, &draft);

    let apply = Confirm::with_theme(&theme())
        .with_prompt("  Apply this configuration?")
        .default(true)
        .interact()?;
    if !apply {
        print_info("Configuration unchanged");
        return navigate(&[
            ("Edit again", StepAction::Stay),
            ("Back", StepAction::Back),
            ("Quit", StepAction::Quit),
        ]);
    }

    session
        .store
        .update_selection(SelectionUpdate::new().configuration(draft));
    print_success("Configuration applied");

    navigate(&[
        ("Run experiment", StepAction::Next),
        ("Edit again", StepAction::Stay),
        ("Back", StepAction::Back),
        ("Quit", StepAction::Quit),
    ])
}

fn pick_option(draft: &mut Configuration, key: &str, prompt: &str, options: &[&str]) -> Result<()> {
    let current = draft.get(key).and_then(Value::as_str).unwrap_or_default();
    let mut items: Vec<&str> = options.to_vec();
    // Keep a value from the config file even when it is not a listed option
    if !current.is_empty() && !items.contains(&current) {
        items.push(current);
    }
    let default = items.iter().position(|o| *o == current).unwrap_or(0);
    let chosen = items[choose(prompt, &items, default)?].to_string();
    draft.insert(key.to_string(), Value::from(chosen));
    Ok(())
}

fn print_configuration(selection: &ExperimentSelection, configuration: &Configuration) {
    print_key_value("System", &selection.system_id);
    print_key_value("Basis set", &selection.basis_set);
    print_key_value("Experiment", &selection.experiment_type);
    for (key, value) in configuration {
        let shown = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        print_key_value(key, &shown);
    }
}

// ----------------------------------------------------------------------
// Results
// ----------------------------------------------------------------------

pub async fn results(session: &mut Session<'_>) -> Result<StepAction> {
    if !session.store.is_selection_complete() {
        let missing = session.store.selection().missing_fields();
        print_warning(&format!("Selection incomplete: {}", missing.join(", ")));
        return navigate(&[
            ("Back to configuration", StepAction::Goto(WizardStep::Configuration)),
            ("Quit", StepAction::Quit),
        ]);
    }

    if session.shown_run.is_none() {
        session.shown_run = submit(session).await;
    }

    match &session.shown_run {
        Some(run) => print_run(run, &session.store.selection().experiment_type),
        None => print_info("No result to show"),
    }

    let action = navigate(&[
        ("Continue to publishing", StepAction::Next),
        ("Run again", StepAction::Stay),
        ("Back to configuration", StepAction::Back),
        ("Quit", StepAction::Quit),
    ])?;
    if action == StepAction::Stay || action == StepAction::Back {
        session.shown_run = None;
    }
    Ok(action)
}

/// Run the current selection. Falls back to a labelled placeholder when the
/// service fails and placeholders are enabled.
async fn submit(session: &Session<'_>) -> Option<ExperimentRun> {
    let running = spinner("Running experiment on the computation service...");
    let outcome = session.store.create_and_run_experiment().await;
    running.finish_and_clear();

    match outcome {
        Ok(run) => {
            print_success(&format!("Experiment finished (run #{})", run.id));
            Some(run)
        }
        Err(e) => {
            print_error(&format!("Experiment failed: {}", e));
            if !session.config.wizard.placeholder_results {
                return None;
            }
            match placeholder_run(&session.store.selection(), &mut rand::thread_rng()) {
                Ok(run) => {
                    print_box(
                        "Showing placeholder data",
                        &[
                            "The service did not return a result.",
                            "These numbers are synthesized and cannot be published.",
                        ],
                    );
                    Some(run)
                }
                Err(e) => {
                    print_warning(&format!("No placeholder available: {}", e));
                    None
                }
            }
        }
    }
}

fn print_run(run: &ExperimentRun, experiment_type: &str) {
    let kind = ExperimentKind::from_id_or_ground(experiment_type);
    println!();
    println!("  {}", source_label(run));
    println!();
    if let Some(method) = run.method() {
        print_key_value("Method", method);
    }
    print_key_value(kind.energy_label(), &format_energy(run.energy));
    if let Some(reference) = run.reference_energy {
        print_key_value("Reference energy", &format_energy(reference));
    }
    if let Some(error) = run.energy_error() {
        print_key_value("Error", &format!("{:.2e} Ha", error));
    }
    let converged = match run.converged {
        Some(true) => style("converged").green().to_string(),
        Some(false) => style("not converged").red().to_string(),
        None => style("unknown").dim().to_string(),
    };
    print_key_value(
        "Iterations",
        &format!("{} ({})", run.iterations, converged),
    );
    print_key_value("Runtime", &format!("{:.2}s", run.runtime));

    let orbitals = run.orbitals();
    if !orbitals.is_empty() {
        let mut table = results_table(&["Orbital", "Energy (Ha)", "Occupation", "Symmetry"]);
        for orbital in &orbitals {
            table.add_row(vec![
                orbital.index.to_string(),
                format!("{:.4}", orbital.energy),
                format!("{:.1}", orbital.occupation),
                orbital.symmetry.clone().unwrap_or_else(|| "-".to_string()),
            ]);
        }
        println!();
        println!("{}", table);
    }

    let history = run.convergence_history();
    if !history.is_empty() {
        println!();
        print_key_value("Convergence", &sparkline(&history));
    }

    print_excited_states(run);
    print_optimized_geometry(run);
    print_vibrations(run);

    if let Some(dipole) = run.dipole_moment() {
        println!();
        print_key_value(
            "Dipole moment",
            &format!(
                "{:.4} D (x {:.4}, y {:.4}, z {:.4})",
                dipole.total, dipole.x, dipole.y, dipole.z
            ),
        );
    }
}

fn results_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn print_excited_states(run: &ExperimentRun) {
    let states = run.excited_states();
    if states.is_empty() {
        return;
    }
    let mut table = results_table(&[
        "State",
        "Excitation (Ha)",
        "Excitation (eV)",
        "Total (Ha)",
        "Osc. strength",
        "Transition",
    ]);
    for state in &states {
        table.add_row(vec![
            state.state.to_string(),
            format!("{:.4}", state.excitation_energy),
            format!("{:.3}", state.excitation_energy_ev),
            format!("{:.6}", state.total_energy),
            format!("{:.3}", state.oscillator_strength),
            state.description.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    print_header("Excited states");
    println!("{}", table);
}

fn print_optimized_geometry(run: &ExperimentRun) {
    if let Some(geometry) = run.optimized_geometry() {
        let mut table = results_table(&["Atom", "x (Å)", "y (Å)", "z (Å)"]);
        for atom in &geometry.atoms {
            table.add_row(vec![
                atom.symbol.clone(),
                format!("{:.4}", atom.x),
                format!("{:.4}", atom.y),
                format!("{:.4}", atom.z),
            ]);
        }
        print_header(&format!(
            "Optimized geometry (charge {}, multiplicity {})",
            geometry.charge, geometry.multiplicity
        ));
        println!("{}", table);
    }

    let steps = run.optimization_steps();
    if let (Some(first), Some(last)) = (steps.first(), steps.last()) {
        println!();
        print_key_value(
            "Optimization",
            &format!(
                "{} steps, {} -> {}",
                steps.len(),
                format_energy(first.energy),
                format_energy(last.energy)
            ),
        );
        print_key_value(
            "Final gradient",
            &format!("rms {:.4}, max force {:.4}", last.rms_gradient, last.max_force),
        );
    }
}

fn print_vibrations(run: &ExperimentRun) {
    let modes = run.vibrations();
    if modes.is_empty() {
        return;
    }
    let mut table = results_table(&["Mode", "Frequency (cm⁻¹)", "Intensity", "Reduced mass"]);
    for mode in &modes {
        table.add_row(vec![
            mode.mode.to_string(),
            format!("{:.1}", mode.frequency),
            format!("{:.2}", mode.intensity),
            mode.reduced_mass
                .map(|mass| format!("{:.3}", mass))
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    print_header("Vibrational modes");
    println!("{}", table);
    if let Some(zero_point) = run.zero_point_energy() {
        print_key_value("Zero-point energy", &format!("{:.4} kcal/mol", zero_point));
    }
}

fn sparkline(values: &[f64]) -> String {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                BARS[0]
            } else {
                let level = ((v - min) / span * (BARS.len() - 1) as f64).round() as usize;
                BARS[level.min(BARS.len() - 1)]
            }
        })
        .collect()
}

// ----------------------------------------------------------------------
// Publishing
// ----------------------------------------------------------------------

pub fn publishing(session: &mut Session<'_>) -> Result<StepAction> {
    let run = session.shown_run.clone().or_else(|| session.store.latest_run());

    match run {
        Some(run) if run.is_placeholder() => {
            print_box(
                "Nothing to publish",
                &["Placeholder results are never published."],
            );
        }
        Some(run) if session.ledger.receipts().iter().any(|r| r.run_id == run.id) => {
            print_info(&format!("Run #{} is already published", run.id));
        }
        Some(run) => {
            print_key_value("Run", &format!("#{} {}", run.id, source_label(&run)));
            print_key_value("Energy", &format_energy(run.energy));
            let publish = Confirm::with_theme(&theme())
                .with_prompt(format!("  Publish to {}?", session.ledger.network()))
                .default(true)
                .interact()?;
            if publish {
                match session.ledger.publish(&run) {
                    Ok(receipt) => {
                        session.published.push(run);
                        println!();
                        print_success("Published");
                        print_key_value("Network", &receipt.network);
                        print_key_value("Block", &receipt.block_number.to_string());
                        print_key_value("Transaction", &receipt.tx_hash);
                        print_key_value("Payload digest", &receipt.payload_digest);
                        if !session.ledger.verify(&session.published) {
                            print_warning("Ledger chain did not verify");
                        }
                    }
                    Err(e) => print_error(&format!("Publishing failed: {}", e)),
                }
            }
        }
        None => print_info("Run an experiment first"),
    }

    println!();
    let action = navigate(&[
        ("Start a new experiment", StepAction::Next),
        ("Back to results", StepAction::Back),
        ("Quit", StepAction::Quit),
    ])?;
    if action == StepAction::Next {
        session.store.reset_selection();
        session.shown_run = None;
    }
    Ok(action)
}
