//! Training module catalog.
//!
//! Modules are static content keyed by id; a session runs through one module.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Exercise;

const BUILTIN_MODULES: &str = include_str!("../data/modules.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleCategory {
    Physical,
    Technical,
    Psychological,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSpec {
    pub exercise: Exercise,
    pub title: String,
    /// Suggested duration of the drill
    pub target_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingModule {
    pub id: String,
    pub title: String,
    pub category: ModuleCategory,
    #[serde(default)]
    pub description: String,
    pub exercises: Vec<ExerciseSpec>,
}

impl TrainingModule {
    pub fn total_exercises(&self) -> usize {
        self.exercises.len()
    }

    pub fn includes(&self, exercise: Exercise) -> bool {
        self.exercises.iter().any(|e| e.exercise == exercise)
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    modules: Vec<TrainingModule>,
}

/// Modules keyed by id
#[derive(Debug, Clone)]
pub struct TrainingCatalog {
    modules: BTreeMap<String, TrainingModule>,
}

impl TrainingCatalog {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_MODULES)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut modules = BTreeMap::new();
        for module in file.modules {
            if module.exercises.is_empty() {
                return Err(Error::InvalidDefinition(format!(
                    "training module '{}' has no exercises",
                    module.id
                )));
            }
            if let Some(dup) = modules.insert(module.id.clone(), module) {
                return Err(Error::InvalidDefinition(format!(
                    "duplicate training module '{}'",
                    dup.id
                )));
            }
        }
        Ok(Self { modules })
    }

    pub fn get(&self, id: &str) -> Option<&TrainingModule> {
        self.modules.get(id)
    }

    /// Like [`get`](Self::get) but as an error for callers that need the module
    pub fn require(&self, id: &str) -> Result<&TrainingModule> {
        self.get(id)
            .ok_or_else(|| Error::UnknownModule(id.to_string()))
    }

    pub fn modules(&self) -> impl Iterator<Item = &TrainingModule> {
        self.modules.values()
    }
}
