//! Results command - browse runs stored by the computation service

use crate::style::*;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use quantum_lab::{ExperimentRun, HttpGateway, LabConfig};

pub async fn run(
    config: &LabConfig,
    id: Option<i64>,
    experiment: Option<i64>,
    details: bool,
    skip: u32,
    limit: u32,
) -> Result<()> {
    let gateway = HttpGateway::new(&config.api)?;

    if let Some(result_id) = id {
        if details {
            let details = gateway.result_details(result_id).await?;
            print_header(&format!("Result #{}", details.id));
            print_key_value("System", &details.system_name);
            print_key_value("Experiment", &details.experiment_id.to_string());
            print_key_value("Energy", &format_energy(details.energy));
            if let Some(reference) = details.reference_energy {
                print_key_value("Reference", &format_energy(reference));
            }
            print_key_value("Iterations", &details.iterations.to_string());
            print_key_value("Runtime", &format!("{:.2}s", details.runtime));
            if !details.configuration.is_empty() {
                println!();
                for (key, value) in &details.configuration {
                    print_key_value(key, &display_value(value));
                }
            }
        } else {
            let run = gateway.get_result(result_id).await?;
            print_run(&run);
        }
        return Ok(());
    }

    let runs = match experiment {
        Some(experiment_id) => {
            print_header(&format!("Results of experiment #{}", experiment_id));
            gateway.experiment_results(experiment_id).await?
        }
        None => {
            print_header("Results");
            gateway.list_results(skip, limit).await?
        }
    };

    if runs.is_empty() {
        print_info("No results stored yet");
        return Ok(());
    }
    println!("{}", runs_table(&runs));
    Ok(())
}

fn print_run(run: &ExperimentRun) {
    print_header(&format!("Result #{}", run.id));
    println!("  {}", source_label(run));
    println!();
    if let Some(experiment_id) = run.experiment_id {
        print_key_value("Experiment", &experiment_id.to_string());
    }
    if let Some(method) = run.method() {
        print_key_value("Method", method);
    }
    print_key_value("Energy", &format_energy(run.energy));
    if let Some(reference) = run.reference_energy {
        print_key_value("Reference", &format_energy(reference));
    }
    if let Some(error) = run.energy_error() {
        print_key_value("Error", &format!("{:.2e} Ha", error));
    }
    print_key_value("Iterations", &run.iterations.to_string());
    print_key_value("Runtime", &format!("{:.2}s", run.runtime));
    if let Some(dipole) = run.dipole_moment() {
        print_key_value("Dipole", &format!("{:.4} D", dipole.total));
    }
    let states = run.excited_states().len();
    if states > 0 {
        print_key_value("Excited states", &states.to_string());
    }
    if let Some(zero_point) = run.zero_point_energy() {
        print_key_value("Zero-point energy", &format!("{:.4} kcal/mol", zero_point));
    }
    if let Some(created_at) = &run.created_at {
        print_key_value("Created", created_at);
    }
}

fn runs_table(runs: &[ExperimentRun]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "ID",
            "Experiment",
            "Energy (Ha)",
            "Reference (Ha)",
            "Iterations",
            "Runtime (s)",
            "Converged",
        ]);

    for run in runs {
        let converged = match run.converged {
            Some(true) => Cell::new("yes").fg(Color::Green),
            Some(false) => Cell::new("no").fg(Color::Red),
            None => Cell::new("-"),
        };
        table.add_row(vec![
            Cell::new(run.id),
            Cell::new(
                run.experiment_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(format!("{:.6}", run.energy)),
            Cell::new(
                run.reference_energy
                    .map(|e| format!("{:.6}", e))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(run.iterations),
            Cell::new(format!("{:.2}", run.runtime)),
            converged,
        ]);
    }
    table
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
