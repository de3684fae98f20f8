//! Built-in assessment definitions, one per assessment type.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::AssessmentType;

use super::definition::AssessmentDefinition;

const BUILTIN_ASSESSMENTS: &str = include_str!("../../data/assessments.json");

#[derive(Deserialize)]
struct BankFile {
    assessments: Vec<AssessmentDefinition>,
}

/// Assessment definitions keyed by type
#[derive(Debug, Clone)]
pub struct QuestionBank {
    definitions: BTreeMap<AssessmentType, AssessmentDefinition>,
}

impl QuestionBank {
    /// The definitions shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_ASSESSMENTS)
    }

    /// Load a bank from a JSON file with the same layout as the built-in one
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: BankFile = serde_json::from_str(json)?;
        let mut definitions = BTreeMap::new();

        for definition in file.assessments {
            definition.validate()?;
            let assessment_type = definition.assessment_type;
            if definitions.insert(assessment_type, definition).is_some() {
                return Err(Error::InvalidDefinition(format!(
                    "more than one {} assessment",
                    assessment_type
                )));
            }
        }

        tracing::debug!(count = definitions.len(), "Loaded assessment definitions");
        Ok(Self { definitions })
    }

    pub fn get(&self, assessment_type: AssessmentType) -> Option<&AssessmentDefinition> {
        self.definitions.get(&assessment_type)
    }

    pub fn types(&self) -> impl Iterator<Item = AssessmentType> + '_ {
        self.definitions.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_bank_has_every_type() {
        let bank = QuestionBank::builtin().unwrap();
        for t in AssessmentType::ALL {
            let def = bank.get(t).expect("missing definition");
            assert_eq!(def.assessment_type, t);
            assert!(def.total_questions() > 0);
        }
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let json = r#"{"assessments":[
            {"type":"initial","title":"A","sections":[{"title":"S","questions":[{"id":"a","prompt":"?","type":"numeric"}]}]},
            {"type":"initial","title":"B","sections":[{"title":"S","questions":[{"id":"b","prompt":"?","type":"numeric"}]}]}
        ]}"#;
        assert!(QuestionBank::from_json(json).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(
            &path,
            r#"{"assessments":[{"type":"mission-specific","title":"M","sections":[{"title":"S","questions":[{"id":"x","prompt":"?","type":"duration"}]}]}]}"#,
        )
        .unwrap();

        let bank = QuestionBank::load_from(&path).unwrap();
        assert!(bank.get(AssessmentType::Mission).is_some());
        assert!(bank.get(AssessmentType::Initial).is_none());
    }
}
