//! Answers recorded during one assessment attempt.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Answer shape depends on the question kind.
///
/// Untagged so submission payloads carry plain JSON numbers, strings and arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Scale and numeric questions
    Integer(i64),
    /// Options and duration questions
    Text(String),
    /// Multiselect questions
    List(Vec<String>),
}

impl AnswerValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AnswerValue::Integer(_) => "integer",
            AnswerValue::Text(_) => "text",
            AnswerValue::List(_) => "list",
        }
    }
}

impl std::fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerValue::Integer(v) => write!(f, "{v}"),
            AnswerValue::Text(v) => write!(f, "{v}"),
            AnswerValue::List(v) => write!(f, "{}", v.join(", ")),
        }
    }
}

/// Question id → answer. Only answered questions have entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseRecord {
    answers: BTreeMap<String, AnswerValue>,
}

impl ResponseRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the answer for `question_id`, returning the previous one.
    pub fn insert(&mut self, question_id: impl Into<String>, value: AnswerValue) -> Option<AnswerValue> {
        self.answers.insert(question_id.into(), value)
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers.get(question_id)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.answers.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites() {
        let mut record = ResponseRecord::new();
        assert!(record.insert("q1", AnswerValue::Integer(3)).is_none());
        assert_eq!(
            record.insert("q1", AnswerValue::Integer(7)),
            Some(AnswerValue::Integer(3))
        );
        assert_eq!(record.get("q1"), Some(&AnswerValue::Integer(7)));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut record = ResponseRecord::new();
        record.insert("cardio", AnswerValue::Integer(8));
        record.insert("sports", AnswerValue::List(vec!["diving".into()]));
        record.insert("sleep", AnswerValue::Text("7-8 hours".into()));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"cardio":8,"sleep":"7-8 hours","sports":["diving"]}"#
        );

        let back: ResponseRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
