//! Assessment definitions: sections, questions and question kinds.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::AssessmentType;

use super::responses::AnswerValue;

/// A named, ordered sequence of sections.
///
/// Section order and question order are fixed once the definition is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentDefinition {
    #[serde(rename = "type")]
    pub assessment_type: AssessmentType,
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique within the owning definition
    pub id: String,
    pub prompt: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    /// Display metadata only; nothing scores with it
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// Input widget and constraints for a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionKind {
    Scale {
        min: i64,
        max: i64,
    },
    Options {
        options: Vec<String>,
    },
    Multiselect {
        options: Vec<String>,
    },
    Numeric {
        #[serde(default)]
        hint: Option<String>,
    },
    Duration {
        #[serde(default)]
        hint: Option<String>,
    },
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Scale { .. } => "scale",
            QuestionKind::Options { .. } => "options",
            QuestionKind::Multiselect { .. } => "multiselect",
            QuestionKind::Numeric { .. } => "numeric",
            QuestionKind::Duration { .. } => "duration",
        }
    }

    /// Check an answer against this kind, returning the reason on mismatch.
    pub fn check(&self, value: &AnswerValue) -> std::result::Result<(), String> {
        match (self, value) {
            (QuestionKind::Scale { min, max }, AnswerValue::Integer(v)) => {
                if (*min..=*max).contains(v) {
                    Ok(())
                } else {
                    Err(format!("{v} is outside the scale {min}..={max}"))
                }
            }
            (QuestionKind::Numeric { .. }, AnswerValue::Integer(_)) => Ok(()),
            (QuestionKind::Options { options }, AnswerValue::Text(choice)) => {
                if options.contains(choice) {
                    Ok(())
                } else {
                    Err(format!("'{choice}' is not one of the options"))
                }
            }
            (QuestionKind::Duration { .. }, AnswerValue::Text(text)) => {
                if text.trim().is_empty() {
                    Err("duration must not be empty".to_string())
                } else {
                    Ok(())
                }
            }
            (QuestionKind::Multiselect { options }, AnswerValue::List(choices)) => {
                match choices.iter().find(|c| !options.contains(c)) {
                    Some(bad) => Err(format!("'{bad}' is not one of the options")),
                    None => Ok(()),
                }
            }
            (kind, value) => Err(format!(
                "{} question cannot take a {} answer",
                kind.as_str(),
                value.kind_name()
            )),
        }
    }
}

impl AssessmentDefinition {
    /// Reject definitions with duplicate ids, empty sections or broken constraints.
    pub fn validate(&self) -> Result<()> {
        if self.total_questions() == 0 {
            return Err(Error::InvalidDefinition(format!(
                "{} has no questions",
                self.assessment_type
            )));
        }

        let mut seen = HashSet::new();
        for section in &self.sections {
            if section.questions.is_empty() {
                return Err(Error::InvalidDefinition(format!(
                    "section '{}' has no questions",
                    section.title
                )));
            }
            for question in &section.questions {
                if !seen.insert(question.id.as_str()) {
                    return Err(Error::InvalidDefinition(format!(
                        "duplicate question id '{}'",
                        question.id
                    )));
                }
                match &question.kind {
                    QuestionKind::Scale { min, max } if min > max => {
                        return Err(Error::InvalidDefinition(format!(
                            "question '{}' has min {} above max {}",
                            question.id, min, max
                        )));
                    }
                    QuestionKind::Options { options } | QuestionKind::Multiselect { options }
                        if options.is_empty() =>
                    {
                        return Err(Error::InvalidDefinition(format!(
                            "question '{}' has no options",
                            question.id
                        )));
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    /// Find a question anywhere in the definition
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.sections
            .iter()
            .flat_map(|s| s.questions.iter())
            .find(|q| q.id == id)
    }
}
