//! Integration tests for the HTTP gateway
//!
//! Every test runs against a local mock of the computation service.

use httpmock::prelude::*;
use quantum_lab::{
    BasisSetGroup, CatalogKind, CatalogSlice, ExperimentGateway, ExperimentSelection,
    ExperimentStore, HttpGateway, LabError, SelectionUpdate,
};
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// TEST HELPERS
// ============================================================================

fn complete_selection() -> SelectionUpdate {
    let configuration = [
        ("ansatz", "UCCSD"),
        ("mapper", "JW"),
        ("hamiltonian", "Electronic Structure"),
        ("algorithm", "VQE"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), json!(v)))
    .collect();

    SelectionUpdate::new()
        .system_id("h2o")
        .basis_set("sto-3g")
        .experiment_type("ground")
        .configuration(configuration)
}

fn run_body(id: i64, experiment_id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "experiment_id": experiment_id,
        "energy": -74.9631,
        "reference_energy": -74.9629,
        "iterations": 18,
        "runtime": 42.5,
        "converged": true,
        "data": {
            "orbitals": [
                {"index": 0, "energy": -20.1, "occupation": 2.0, "symmetry": "A1"}
            ],
            "convergence_history": [-74.1, -74.8, -74.96]
        },
        "created_at": "2024-05-01T12:00:00"
    })
}

// ============================================================================
// CATALOG
// ============================================================================

#[tokio::test]
async fn test_list_systems() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/systems");
        then.status(200).json_body(json!({
            "systems": [
                {"id": "h2o", "name": "Water", "description": "H2O molecule"},
                {"id": "ch4", "name": "Methane", "description": null}
            ]
        }));
    });

    let gateway = HttpGateway::with_base_url(server.base_url()).unwrap();
    let systems = gateway.list_systems().await.unwrap();

    mock.assert();
    assert_eq!(systems.len(), 2);
    assert_eq!(systems[0].id, "h2o");
    assert_eq!(systems[1].description, None);
}

#[tokio::test]
async fn test_basis_set_groups_parsed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/basis-sets");
        then.status(200).json_body(json!({
            "basis_sets": [
                {"id": "sto-3g", "name": "STO-3G", "group": "minimal"},
                {"id": "cc-pvdz", "name": "cc-pVDZ", "group": "correlation_consistent"},
                {"id": "def2-svp", "name": "def2-SVP", "group": "karlsruhe"},
                {"id": "6-31g", "name": "6-31G"}
            ]
        }));
    });

    let gateway = HttpGateway::with_base_url(server.base_url()).unwrap();
    let basis_sets = gateway.list_basis_sets().await.unwrap();

    assert_eq!(basis_sets[0].group, Some(BasisSetGroup::Minimal));
    assert_eq!(basis_sets[1].group, Some(BasisSetGroup::CorrelationConsistent));
    assert_eq!(basis_sets[2].group, Some(BasisSetGroup::Other));
    assert_eq!(basis_sets[3].group, None);
    assert_eq!(basis_sets[3].group_label(), "Ungrouped");
}

#[tokio::test]
async fn test_fetch_catalog_by_kind() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/experiment-types");
        then.status(200).json_body(json!({
            "experiment_types": [
                {"id": "ground", "name": "Ground State Energy"},
                {"id": "excited", "name": "Excited States"}
            ]
        }));
    });

    let gateway = HttpGateway::with_base_url(server.base_url()).unwrap();
    let slice = gateway
        .fetch_catalog(CatalogKind::ExperimentTypes)
        .await
        .unwrap();

    assert_eq!(slice.kind(), CatalogKind::ExperimentTypes);
    assert_eq!(slice.len(), 2);
    assert!(matches!(slice, CatalogSlice::ExperimentTypes(_)));
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/systems");
        then.status(200)
            .header("content-type", "application/json")
            .body("not valid json");
    });

    let gateway = HttpGateway::with_base_url(server.base_url()).unwrap();
    let err = gateway.list_systems().await.unwrap_err();
    assert!(matches!(err, LabError::Parse(_)));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on port 1
    let gateway = HttpGateway::with_base_url("http://127.0.0.1:1").unwrap();
    let err = gateway.list_systems().await.unwrap_err();
    assert!(matches!(err, LabError::Network(_)));
}

// ============================================================================
// EXPERIMENTS
// ============================================================================

#[tokio::test]
async fn test_store_creates_then_runs() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/experiments")
            .json_body_partial(
                r#"{
                    "name": "Experiment h2o",
                    "system_id": "h2o",
                    "basis_set": "sto-3g",
                    "experiment_type": "ground",
                    "configuration": {"ansatz": "UCCSD", "max_iterations": 100}
                }"#,
            );
        then.status(200).json_body(json!({
            "id": 7,
            "name": "Experiment h2o",
            "system_id": "h2o",
            "basis_set": "sto-3g",
            "experiment_type": "ground",
            "configuration": {"ansatz": "UCCSD"}
        }));
    });
    let run = server.mock(|when, then| {
        when.method(POST).path("/api/v1/experiments/7/run");
        then.status(200).json_body(run_body(3, 7));
    });

    let gateway = Arc::new(HttpGateway::with_base_url(server.base_url()).unwrap());
    let store = ExperimentStore::new(gateway, Default::default());
    store.update_selection(complete_selection());

    let result = store.create_and_run_experiment().await.unwrap();

    create.assert();
    run.assert();
    assert_eq!(result.id, 3);
    assert!(!result.is_placeholder());
    assert_eq!(result.orbitals().len(), 1);
    assert_eq!(result.convergence_history().len(), 3);
    assert_eq!(store.history().len(), 1);
}

#[tokio::test]
async fn test_validation_error_is_structured() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/experiments");
        then.status(422).json_body(json!({
            "detail": [
                {"loc": ["body", "configuration", "ansatz"], "msg": "field required", "type": "missing"}
            ]
        }));
    });

    let gateway = HttpGateway::with_base_url(server.base_url()).unwrap();
    let request = quantum_lab::CreateExperimentRequest::from_selection(
        &ExperimentSelection::default(),
        &Default::default(),
    );
    let err = gateway.create_experiment(&request).await.unwrap_err();

    match err {
        LabError::Validation(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].path, "body.configuration.ansatz");
            assert_eq!(errors[0].message, "field required");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_detail_string_becomes_api_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/experiments/99/run");
        then.status(404)
            .json_body(json!({"detail": "Experiment 99 not found"}));
    });

    let gateway = HttpGateway::with_base_url(server.base_url()).unwrap();
    let err = gateway.run_experiment(99).await.unwrap_err();

    match err {
        LabError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Experiment 99 not found");
        }
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_run_failure_leaves_history_empty() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/experiments");
        then.status(200).json_body(json!({
            "id": 1,
            "system_id": "h2o",
            "basis_set": "sto-3g",
            "experiment_type": "ground"
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/experiments/1/run");
        then.status(500).body("Internal Server Error");
    });

    let gateway = Arc::new(HttpGateway::with_base_url(server.base_url()).unwrap());
    let store = ExperimentStore::new(gateway, Default::default());
    store.update_selection(complete_selection());

    let err = store.create_and_run_experiment().await.unwrap_err();

    assert!(matches!(err, LabError::Api { status: 500, .. }));
    assert!(store.history().is_empty());
    assert!(store.last_error().is_some());
    assert!(!store.submission_status().running);
}

#[tokio::test]
async fn test_create_failure_never_reaches_run() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST).path("/api/v1/experiments");
        then.status(503).body("");
    });
    let run = server.mock(|when, then| {
        when.method(POST).path_contains("/run");
        then.status(200).json_body(run_body(1, 1));
    });

    let gateway = Arc::new(HttpGateway::with_base_url(server.base_url()).unwrap());
    let store = ExperimentStore::new(gateway, Default::default());
    store.update_selection(complete_selection());

    let err = store.create_and_run_experiment().await.unwrap_err();

    create.assert();
    assert_eq!(run.hits(), 0);
    match &err {
        LabError::Api { status, message } => {
            assert_eq!(*status, 503);
            assert_eq!(message, "Service Unavailable");
        }
        other => panic!("expected api error, got {:?}", other),
    }
    assert_eq!(store.history().len(), 0);
    assert!(!store.submission_status().running);
    assert_eq!(store.last_error(), Some(err.to_string()));
}

// ============================================================================
// RESULTS AND HEALTH
// ============================================================================

#[tokio::test]
async fn test_list_results_paged() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/results")
            .query_param("skip", "10")
            .query_param("limit", "5");
        then.status(200)
            .json_body(json!([run_body(11, 2), run_body(12, 2)]));
    });

    let gateway = HttpGateway::with_base_url(server.base_url()).unwrap();
    let runs = gateway.list_results(10, 5).await.unwrap();

    mock.assert();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1].id, 12);
}

#[tokio::test]
async fn test_experiment_results_and_details() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/experiments/2/results");
        then.status(200).json_body(json!([run_body(11, 2)]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/results/11/details");
        then.status(200).json_body(json!({
            "id": 11,
            "experiment_id": 2,
            "energy": -74.9631,
            "reference_energy": -74.9629,
            "iterations": 18,
            "runtime": 42.5,
            "system_name": "Water",
            "configuration": {"ansatz": "UCCSD"}
        }));
    });

    let gateway = HttpGateway::with_base_url(server.base_url()).unwrap();
    let runs = gateway.experiment_results(2).await.unwrap();
    assert_eq!(runs.len(), 1);

    let details = gateway.result_details(11).await.unwrap();
    assert_eq!(details.system_name, "Water");
    assert_eq!(details.configuration.get("ansatz"), Some(&json!("UCCSD")));
}

#[tokio::test]
async fn test_health_at_server_root() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(200)
            .json_body(json!({"status": "healthy", "using_mock": true}));
    });

    let gateway = HttpGateway::with_base_url(server.base_url()).unwrap();
    let health = gateway.health().await.unwrap();

    mock.assert();
    assert_eq!(health.status, "healthy");
    assert!(health.using_mock);
}
