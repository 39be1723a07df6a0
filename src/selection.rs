//! Experiment selection
//!
//! The in-progress experiment the user builds up step by step: which
//! molecular system, basis set and experiment type, plus the free-form
//! algorithm configuration (ansatz, mapper, hamiltonian, algorithm, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Algorithm configuration, keyed by option name
pub type Configuration = BTreeMap<String, Value>;

/// Well-known configuration keys
pub mod keys {
    pub const ALGORITHM: &str = "algorithm";
    pub const MAPPER: &str = "mapper";
    pub const ANSATZ: &str = "ansatz";
    pub const HAMILTONIAN: &str = "hamiltonian";
    pub const MAX_ITERATIONS: &str = "max_iterations";
}

/// Configuration keys the configuration step must have before advancing
pub const REQUIRED_CONFIG_KEYS: [&str; 4] = [
    keys::ANSATZ,
    keys::MAPPER,
    keys::HAMILTONIAN,
    keys::ALGORITHM,
];

/// The selection the wizard is building
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSelection {
    pub system_id: String,
    pub basis_set: String,
    pub experiment_type: String,
    #[serde(default)]
    pub configuration: Configuration,
}

/// Partial update merged into an [`ExperimentSelection`].
///
/// Only fields that are `Some` change. `configuration` replaces the whole
/// map when present; the merge is shallow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionUpdate {
    pub system_id: Option<String>,
    pub basis_set: Option<String>,
    pub experiment_type: Option<String>,
    pub configuration: Option<Configuration>,
}

impl SelectionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system_id(mut self, id: impl Into<String>) -> Self {
        self.system_id = Some(id.into());
        self
    }

    pub fn basis_set(mut self, id: impl Into<String>) -> Self {
        self.basis_set = Some(id.into());
        self
    }

    pub fn experiment_type(mut self, id: impl Into<String>) -> Self {
        self.experiment_type = Some(id.into());
        self
    }

    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.system_id.is_none()
            && self.basis_set.is_none()
            && self.experiment_type.is_none()
            && self.configuration.is_none()
    }
}

/// Whether a configuration value counts as "set"
fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

impl ExperimentSelection {
    /// Shallow-merge an update into this selection
    pub fn apply(&mut self, update: SelectionUpdate) {
        if let Some(system_id) = update.system_id {
            self.system_id = system_id;
        }
        if let Some(basis_set) = update.basis_set {
            self.basis_set = basis_set;
        }
        if let Some(experiment_type) = update.experiment_type {
            self.experiment_type = experiment_type;
        }
        if let Some(configuration) = update.configuration {
            self.configuration = configuration;
        }
    }

    pub fn has_config(&self, key: &str) -> bool {
        is_set(self.configuration.get(key))
    }

    /// String view of a configuration value, if it is a string
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.configuration.get(key).and_then(Value::as_str)
    }

    /// Required configuration keys that are still unset
    pub fn missing_config(&self) -> Vec<&'static str> {
        REQUIRED_CONFIG_KEYS
            .iter()
            .copied()
            .filter(|key| !self.has_config(key))
            .collect()
    }

    /// All required fields that are still unset, top-level first
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.system_id.trim().is_empty() {
            missing.push("system_id");
        }
        if self.basis_set.trim().is_empty() {
            missing.push("basis_set");
        }
        if self.experiment_type.trim().is_empty() {
            missing.push("experiment_type");
        }
        missing.extend(self.missing_config());
        missing
    }

    /// True once system, basis set, experiment type and every required
    /// configuration key are set
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Configuration with defaults filled in for every key the user left unset
    pub fn configuration_with_defaults(&self, defaults: &AlgorithmDefaults) -> Configuration {
        let mut merged = self.configuration.clone();
        for (key, value) in defaults.entries() {
            if !is_set(merged.get(key)) {
                merged.insert(key.to_string(), value);
            }
        }
        merged
    }
}

/// Values applied for configuration keys the user did not set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmDefaults {
    pub algorithm: String,
    pub mapper: String,
    pub ansatz: String,
    pub hamiltonian: String,
    pub max_iterations: u32,
}

impl Default for AlgorithmDefaults {
    fn default() -> Self {
        Self {
            algorithm: "VQE".to_string(),
            mapper: "JW".to_string(),
            ansatz: "TwoLocal".to_string(),
            hamiltonian: "Electronic Structure".to_string(),
            max_iterations: 100,
        }
    }
}

impl AlgorithmDefaults {
    fn entries(&self) -> [(&'static str, Value); 5] {
        [
            (keys::ALGORITHM, Value::from(self.algorithm.clone())),
            (keys::MAPPER, Value::from(self.mapper.clone())),
            (keys::ANSATZ, Value::from(self.ansatz.clone())),
            (keys::HAMILTONIAN, Value::from(self.hamiltonian.clone())),
            (keys::MAX_ITERATIONS, Value::from(self.max_iterations)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_config() -> Configuration {
        let mut config = Configuration::new();
        config.insert(keys::ANSATZ.to_string(), json!("UCCSD"));
        config.insert(keys::MAPPER.to_string(), json!("Parity"));
        config.insert(keys::HAMILTONIAN.to_string(), json!("Electronic Structure"));
        config.insert(keys::ALGORITHM.to_string(), json!("VQE"));
        config
    }

    #[test]
    fn test_initial_selection_is_empty() {
        let selection = ExperimentSelection::default();
        assert_eq!(selection.system_id, "");
        assert_eq!(selection.basis_set, "");
        assert_eq!(selection.experiment_type, "");
        assert!(selection.configuration.is_empty());
        assert!(!selection.is_complete());
    }

    #[test]
    fn test_later_updates_override_earlier_keys() {
        let mut selection = ExperimentSelection::default();
        selection.apply(SelectionUpdate::new().system_id("h2o").basis_set("sto-3g"));
        selection.apply(SelectionUpdate::new().system_id("ch4"));

        assert_eq!(selection.system_id, "ch4");
        assert_eq!(selection.basis_set, "sto-3g");
        assert_eq!(selection.experiment_type, "");
        assert!(selection.configuration.is_empty());
    }

    #[test]
    fn test_configuration_replaced_wholesale() {
        let mut selection = ExperimentSelection::default();
        selection.apply(SelectionUpdate::new().configuration(full_config()));

        let mut smaller = Configuration::new();
        smaller.insert(keys::ANSATZ.to_string(), json!("TwoLocal"));
        selection.apply(SelectionUpdate::new().configuration(smaller));

        assert_eq!(selection.configuration.len(), 1);
        assert_eq!(selection.config_str(keys::ANSATZ), Some("TwoLocal"));
        assert!(!selection.has_config(keys::MAPPER));
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut selection = ExperimentSelection::default();
        selection.apply(SelectionUpdate::new().system_id("nh3"));
        let before = selection.clone();
        let update = SelectionUpdate::new();
        assert!(update.is_empty());
        selection.apply(update);
        assert_eq!(selection, before);
    }

    #[test]
    fn test_complete_requires_configuration() {
        let mut selection = ExperimentSelection::default();
        selection.apply(
            SelectionUpdate::new()
                .system_id("h2o")
                .basis_set("sto-3g")
                .experiment_type("ground"),
        );
        assert!(!selection.is_complete());
        assert_eq!(
            selection.missing_fields(),
            vec!["ansatz", "mapper", "hamiltonian", "algorithm"]
        );

        selection.apply(SelectionUpdate::new().configuration(full_config()));
        assert!(selection.is_complete());
    }

    #[test]
    fn test_blank_and_null_values_are_unset() {
        let mut config = full_config();
        config.insert(keys::MAPPER.to_string(), json!("   "));
        config.insert(keys::ANSATZ.to_string(), Value::Null);
        let selection = ExperimentSelection {
            configuration: config,
            ..Default::default()
        };
        assert_eq!(selection.missing_config(), vec!["ansatz", "mapper"]);
    }

    #[test]
    fn test_defaults_fill_only_unset_keys() {
        let mut config = Configuration::new();
        config.insert(keys::ANSATZ.to_string(), json!("UCCSD"));
        config.insert(keys::MAPPER.to_string(), json!(""));
        config.insert("shots".to_string(), json!(1024));
        let selection = ExperimentSelection {
            configuration: config,
            ..Default::default()
        };

        let merged = selection.configuration_with_defaults(&AlgorithmDefaults::default());
        assert_eq!(merged[keys::ANSATZ], json!("UCCSD"));
        assert_eq!(merged[keys::MAPPER], json!("JW"));
        assert_eq!(merged[keys::ALGORITHM], json!("VQE"));
        assert_eq!(merged[keys::HAMILTONIAN], json!("Electronic Structure"));
        assert_eq!(merged[keys::MAX_ITERATIONS], json!(100));
        assert_eq!(merged["shots"], json!(1024));
    }
}
