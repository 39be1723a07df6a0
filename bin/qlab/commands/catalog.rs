//! Catalog command - list what the wizard can select

use crate::print_banner;
use crate::style::*;
use anyhow::{bail, Result};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use quantum_lab::{CatalogKind, ExperimentStore, HttpGateway, LabConfig, ReferenceCatalog};
use std::sync::Arc;

pub async fn run(config: &LabConfig, kind: Option<&str>) -> Result<()> {
    let kinds = match kind {
        Some(name) => match CatalogKind::parse(name) {
            Some(kind) => vec![kind],
            None => bail!(
                "Unknown catalog '{}'. Use systems, basis-sets or experiment-types",
                name
            ),
        },
        None => CatalogKind::ALL.to_vec(),
    };

    print_banner();

    let gateway = Arc::new(HttpGateway::new(&config.api)?);
    let store = ExperimentStore::new(gateway, config.defaults.clone());
    for kind in &kinds {
        // Failures are recorded in the store and reported below
        let _ = store.fetch_catalog(*kind).await;
    }
    let view = store.catalog_with_fallback();
    let catalog = if config.wizard.fallback_catalog {
        view.catalog.clone()
    } else {
        store.catalog()
    };

    for kind in kinds {
        print_header(&format!("Catalog: {}", kind));
        if let Some(error) = store.catalog_status(kind).error {
            print_warning(&format!("Could not load {}: {}", kind, error));
            if config.wizard.fallback_catalog && view.uses_fallback(kind) {
                print_info("Showing the built-in list instead");
            }
            println!();
        }
        println!("{}", catalog_table(&catalog, kind));
    }

    Ok(())
}

pub fn catalog_table(catalog: &ReferenceCatalog, kind: CatalogKind) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    match kind {
        CatalogKind::Systems => {
            table.set_header(vec!["ID", "Name", "Description"]);
            for system in &catalog.systems {
                table.add_row(vec![
                    system.id.clone(),
                    system.name.clone(),
                    system.description.clone().unwrap_or_default(),
                ]);
            }
        }
        CatalogKind::BasisSets => {
            table.set_header(vec!["ID", "Name", "Group", "Description"]);
            for basis in &catalog.basis_sets {
                table.add_row(vec![
                    basis.id.clone(),
                    basis.name.clone(),
                    basis.group_label().to_string(),
                    basis.description.clone().unwrap_or_default(),
                ]);
            }
        }
        CatalogKind::ExperimentTypes => {
            table.set_header(vec!["ID", "Name", "Description"]);
            for experiment in &catalog.experiment_types {
                table.add_row(vec![
                    experiment.id.clone(),
                    experiment.name.clone(),
                    experiment.description.clone().unwrap_or_default(),
                ]);
            }
        }
    }

    table
}
