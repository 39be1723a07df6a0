//! Reference catalog
//!
//! Selectable molecular systems, basis sets and experiment types as
//! published by the computation service, plus the static lists used when
//! the service cannot be reached.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Basis set family, as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisSetGroup {
    Minimal,
    SplitValence,
    CorrelationConsistent,
    #[serde(other)]
    Other,
}

impl BasisSetGroup {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Minimal => "Minimal",
            Self::SplitValence => "Split valence",
            Self::CorrelationConsistent => "Correlation consistent",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisSetInfo {
    pub id: String,
    pub name: String,
    /// Absent when the service does not classify the basis set. Never
    /// derived from the description.
    #[serde(default)]
    pub group: Option<BasisSetGroup>,
    #[serde(default)]
    pub description: Option<String>,
}

impl BasisSetInfo {
    pub fn group_label(&self) -> &'static str {
        self.group.map(|g| g.label()).unwrap_or("Ungrouped")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentTypeInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The three independently fetched catalog slices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CatalogKind {
    Systems,
    BasisSets,
    ExperimentTypes,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 3] = [
        CatalogKind::Systems,
        CatalogKind::BasisSets,
        CatalogKind::ExperimentTypes,
    ];

    /// Path below the API prefix
    pub fn path(&self) -> &'static str {
        match self {
            Self::Systems => "/systems",
            Self::BasisSets => "/basis-sets",
            Self::ExperimentTypes => "/experiment-types",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Systems => "systems",
            Self::BasisSets => "basis-sets",
            Self::ExperimentTypes => "experiment-types",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('_', "-").as_str() {
            "systems" => Some(Self::Systems),
            "basis-sets" => Some(Self::BasisSets),
            "experiment-types" => Some(Self::ExperimentTypes),
            _ => None,
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the selection steps offer the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    pub systems: Vec<SystemInfo>,
    pub basis_sets: Vec<BasisSetInfo>,
    pub experiment_types: Vec<ExperimentTypeInfo>,
}

/// One freshly fetched slice, replacing the matching slice wholesale
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogSlice {
    Systems(Vec<SystemInfo>),
    BasisSets(Vec<BasisSetInfo>),
    ExperimentTypes(Vec<ExperimentTypeInfo>),
}

impl CatalogSlice {
    pub fn kind(&self) -> CatalogKind {
        match self {
            Self::Systems(_) => CatalogKind::Systems,
            Self::BasisSets(_) => CatalogKind::BasisSets,
            Self::ExperimentTypes(_) => CatalogKind::ExperimentTypes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Systems(v) => v.len(),
            Self::BasisSets(v) => v.len(),
            Self::ExperimentTypes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReferenceCatalog {
    /// Replace one slice; the other two are untouched
    pub fn replace(&mut self, slice: CatalogSlice) {
        match slice {
            CatalogSlice::Systems(v) => self.systems = v,
            CatalogSlice::BasisSets(v) => self.basis_sets = v,
            CatalogSlice::ExperimentTypes(v) => self.experiment_types = v,
        }
    }

    pub fn len(&self, kind: CatalogKind) -> usize {
        match kind {
            CatalogKind::Systems => self.systems.len(),
            CatalogKind::BasisSets => self.basis_sets.len(),
            CatalogKind::ExperimentTypes => self.experiment_types.len(),
        }
    }

    pub fn is_empty(&self, kind: CatalogKind) -> bool {
        self.len(kind) == 0
    }

    /// Copy the slice of `kind` from `other`
    pub fn take_slice_from(&mut self, other: &ReferenceCatalog, kind: CatalogKind) {
        match kind {
            CatalogKind::Systems => self.systems = other.systems.clone(),
            CatalogKind::BasisSets => self.basis_sets = other.basis_sets.clone(),
            CatalogKind::ExperimentTypes => {
                self.experiment_types = other.experiment_types.clone()
            }
        }
    }

    pub fn system(&self, id: &str) -> Option<&SystemInfo> {
        self.systems.iter().find(|s| s.id == id)
    }

    pub fn basis_set(&self, id: &str) -> Option<&BasisSetInfo> {
        self.basis_sets.iter().find(|b| b.id == id)
    }

    pub fn experiment_type(&self, id: &str) -> Option<&ExperimentTypeInfo> {
        self.experiment_types.iter().find(|t| t.id == id)
    }

    /// Static catalog offered when the service is unavailable
    pub fn fallback() -> Self {
        fn system(id: &str, name: &str, description: &str) -> SystemInfo {
            SystemInfo {
                id: id.to_string(),
                name: name.to_string(),
                description: Some(description.to_string()),
            }
        }
        fn basis(id: &str, name: &str, group: BasisSetGroup, description: &str) -> BasisSetInfo {
            BasisSetInfo {
                id: id.to_string(),
                name: name.to_string(),
                group: Some(group),
                description: Some(description.to_string()),
            }
        }
        fn experiment(id: &str, name: &str, description: &str) -> ExperimentTypeInfo {
            ExperimentTypeInfo {
                id: id.to_string(),
                name: name.to_string(),
                description: Some(description.to_string()),
            }
        }

        Self {
            systems: vec![
                system("h2o", "Water", "Water molecule (H2O)"),
                system("ch4", "Methane", "Methane molecule (CH4)"),
                system("nh3", "Ammonia", "Ammonia molecule (NH3)"),
                system("co2", "Carbon Dioxide", "Carbon dioxide molecule (CO2)"),
            ],
            basis_sets: vec![
                basis(
                    "sto-3g",
                    "STO-3G",
                    BasisSetGroup::Minimal,
                    "Minimal basis set, fast but less accurate",
                ),
                basis("3-21g", "3-21G", BasisSetGroup::SplitValence, "Split valence basis set"),
                basis("6-31g", "6-31G", BasisSetGroup::SplitValence, "Split valence basis set"),
                basis(
                    "cc-pvdz",
                    "cc-pVDZ",
                    BasisSetGroup::CorrelationConsistent,
                    "Correlation consistent polarized valence double zeta basis set",
                ),
                basis(
                    "cc-pvtz",
                    "cc-pVTZ",
                    BasisSetGroup::CorrelationConsistent,
                    "Correlation consistent polarized valence triple zeta basis set",
                ),
            ],
            experiment_types: vec![
                experiment("ground", "Ground State", "Calculate ground state energy"),
                experiment("excited", "Excited State", "Calculate excited state properties"),
                experiment("geometry", "Geometry Optimization", "Optimize molecular geometry"),
                experiment(
                    "vibrational",
                    "Vibrational Analysis",
                    "Calculate vibrational frequencies",
                ),
                experiment("dipole", "Dipole Moment", "Calculate molecular dipole moment"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_set_group_deserialization() {
        let json = r#"[
            {"id": "sto-3g", "name": "STO-3G", "group": "minimal"},
            {"id": "def2-svp", "name": "def2-SVP", "group": "karlsruhe"},
            {"id": "6-31g", "name": "6-31G", "description": "Split valence basis set"}
        ]"#;
        let sets: Vec<BasisSetInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(sets[0].group, Some(BasisSetGroup::Minimal));
        assert_eq!(sets[1].group, Some(BasisSetGroup::Other));
        // No inference from the description
        assert_eq!(sets[2].group, None);
        assert_eq!(sets[2].group_label(), "Ungrouped");
    }

    #[test]
    fn test_null_description_accepted() {
        let json = r#"{"id": "h2o", "name": "Water", "description": null}"#;
        let system: SystemInfo = serde_json::from_str(json).unwrap();
        assert!(system.description.is_none());
    }

    #[test]
    fn test_replace_touches_one_slice() {
        let mut catalog = ReferenceCatalog::fallback();
        catalog.replace(CatalogSlice::Systems(vec![]));
        assert!(catalog.is_empty(CatalogKind::Systems));
        assert_eq!(catalog.len(CatalogKind::BasisSets), 5);
        assert_eq!(catalog.len(CatalogKind::ExperimentTypes), 5);
    }

    #[test]
    fn test_catalog_kind_parse() {
        assert_eq!(CatalogKind::parse("systems"), Some(CatalogKind::Systems));
        assert_eq!(CatalogKind::parse("basis_sets"), Some(CatalogKind::BasisSets));
        assert_eq!(
            CatalogKind::parse("Experiment-Types"),
            Some(CatalogKind::ExperimentTypes)
        );
        assert_eq!(CatalogKind::parse("orbitals"), None);
    }

    #[test]
    fn test_fallback_lookup() {
        let catalog = ReferenceCatalog::fallback();
        assert_eq!(catalog.system("co2").map(|s| s.name.as_str()), Some("Carbon Dioxide"));
        assert_eq!(
            catalog.basis_set("cc-pvdz").and_then(|b| b.group),
            Some(BasisSetGroup::CorrelationConsistent)
        );
        assert!(catalog.experiment_type("ground").is_some());
        assert!(catalog.system("xe").is_none());
    }
}
