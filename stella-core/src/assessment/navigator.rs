//! Cursor state machine over an assessment definition.
//!
//! The navigator walks `(section, question)` positions forward and backward,
//! keeps the answers recorded so far and hands the finished attempt to a
//! submission endpoint. It never draws anything: [`AssessmentNavigator::view`]
//! describes what should be on screen and the caller renders it.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::AssessmentType;

use super::definition::{AssessmentDefinition, Question, Section};
use super::responses::{AnswerValue, ResponseRecord};
use super::submission::{AssessmentSubmission, SubmissionEndpoint, SubmissionReceipt};

/// Zero-based position; `section_index == sections.len()` is the terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationCursor {
    pub section_index: usize,
    pub question_index: usize,
}

/// One-based numbering for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionPosition {
    pub section_number: usize,
    pub section_count: usize,
    pub question_number: usize,
    pub questions_in_section: usize,
}

/// What should be on screen for the current state
#[derive(Debug, PartialEq)]
pub enum View<'a> {
    Question {
        section: &'a Section,
        question: &'a Question,
        position: QuestionPosition,
        /// Previously recorded answer, so going back never loses input
        prefill: Option<&'a AnswerValue>,
    },
    /// Every section walked; waiting for submission
    Complete { answered: usize, total: usize },
    Submitted(&'a SubmissionReceipt),
}

pub struct AssessmentNavigator {
    definition: AssessmentDefinition,
    cursor: NavigationCursor,
    responses: ResponseRecord,
    /// Payload of the first submit attempt, resent unchanged on retry
    pending: Option<AssessmentSubmission>,
    receipt: Option<SubmissionReceipt>,
    last_error: Option<String>,
}

impl AssessmentNavigator {
    /// Start at the first question of `definition`.
    ///
    /// The definition is validated first, so every section the cursor can
    /// land on has at least one question.
    pub fn new(definition: AssessmentDefinition) -> Result<Self> {
        definition.validate()?;
        Ok(Self {
            definition,
            cursor: NavigationCursor::default(),
            responses: ResponseRecord::new(),
            pending: None,
            receipt: None,
            last_error: None,
        })
    }

    pub fn definition(&self) -> &AssessmentDefinition {
        &self.definition
    }

    pub fn assessment_type(&self) -> AssessmentType {
        self.definition.assessment_type
    }

    pub fn cursor(&self) -> NavigationCursor {
        self.cursor
    }

    pub fn responses(&self) -> &ResponseRecord {
        &self.responses
    }

    pub fn is_terminal(&self) -> bool {
        self.cursor.section_index >= self.definition.sections.len()
    }

    pub fn is_submitted(&self) -> bool {
        self.receipt.is_some()
    }

    /// Error message from the last failed submit, for a retry prompt
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.definition
            .sections
            .get(self.cursor.section_index)
            .and_then(|s| s.questions.get(self.cursor.question_index))
    }

    pub fn view(&self) -> View<'_> {
        if let Some(receipt) = &self.receipt {
            return View::Submitted(receipt);
        }

        let sections = &self.definition.sections;
        let current = sections.get(self.cursor.section_index).and_then(|section| {
            section
                .questions
                .get(self.cursor.question_index)
                .map(|question| (section, question))
        });
        match current {
            Some((section, question)) => View::Question {
                section,
                question,
                position: QuestionPosition {
                    section_number: self.cursor.section_index + 1,
                    section_count: sections.len(),
                    question_number: self.cursor.question_index + 1,
                    questions_in_section: section.questions.len(),
                },
                prefill: self.responses.get(&question.id),
            },
            None => View::Complete {
                answered: self.responses.len(),
                total: self.definition.total_questions(),
            },
        }
    }

    /// Record (or overwrite) an answer after checking it against the question kind.
    ///
    /// On error the existing record is left as it was.
    pub fn record_answer(&mut self, question_id: &str, value: AnswerValue) -> Result<()> {
        if self.is_submitted() {
            return Err(Error::InvalidAnswer {
                question_id: question_id.to_string(),
                reason: "assessment already submitted".to_string(),
            });
        }

        let question = self
            .definition
            .question(question_id)
            .ok_or_else(|| Error::UnknownQuestion(question_id.to_string()))?;

        question
            .kind
            .check(&value)
            .map_err(|reason| Error::InvalidAnswer {
                question_id: question_id.to_string(),
                reason,
            })?;

        tracing::trace!(question_id, answer = %value, "Answer recorded");
        self.responses.insert(question_id, value);
        // Answers changed, so the next submit builds a fresh payload
        self.pending = None;
        Ok(())
    }

    /// Record an answer for the question under the cursor
    pub fn answer_current(&mut self, value: AnswerValue) -> Result<()> {
        let id = self
            .current_question()
            .map(|q| q.id.clone())
            .ok_or(Error::NotComplete)?;
        self.record_answer(&id, value)
    }

    /// Presentation policy: advance only once the current question is answered.
    ///
    /// [`next`](Self::next) itself does not enforce this.
    pub fn can_advance(&self) -> bool {
        self.current_question()
            .is_some_and(|q| self.responses.contains(&q.id))
    }

    /// Move forward one question, crossing into the next section (or the
    /// terminal state) after the last question. Returns whether the cursor moved.
    pub fn next(&mut self) -> bool {
        if self.is_terminal() || self.is_submitted() {
            return false;
        }

        let section_len = self.definition.sections[self.cursor.section_index]
            .questions
            .len();

        if self.cursor.question_index + 1 < section_len {
            self.cursor.question_index += 1;
        } else {
            self.cursor.section_index += 1;
            self.cursor.question_index = 0;
        }
        true
    }

    /// Move back one question, landing on the last question of the previous
    /// section when at a section start. Returns whether the cursor moved.
    pub fn previous(&mut self) -> bool {
        if self.is_submitted() {
            return false;
        }

        if self.cursor.question_index > 0 {
            self.cursor.question_index -= 1;
        } else if self.cursor.section_index > 0 {
            self.cursor.section_index -= 1;
            self.cursor.question_index = self.definition.sections[self.cursor.section_index]
                .questions
                .len()
                .saturating_sub(1);
        } else {
            return false;
        }
        true
    }

    /// Questions strictly before the cursor
    pub fn completed_questions(&self) -> usize {
        let sections = &self.definition.sections;
        let before: usize = sections
            .iter()
            .take(self.cursor.section_index)
            .map(|s| s.questions.len())
            .sum();

        if self.is_terminal() {
            before
        } else {
            before + self.cursor.question_index
        }
    }

    /// Position-based progress in `[0, 1]`; does not look at answers.
    pub fn progress_fraction(&self) -> f64 {
        let total = self.definition.total_questions();
        if total == 0 {
            return 1.0;
        }
        self.completed_questions() as f64 / total as f64
    }

    /// Seed answers from a cached record, skipping ids that are unknown or
    /// values that no longer fit. Returns how many answers were restored.
    pub fn restore(&mut self, cached: &ResponseRecord) -> usize {
        let mut restored = 0;
        for (id, value) in cached.iter() {
            match self.record_answer(id, value.clone()) {
                Ok(()) => restored += 1,
                Err(e) => tracing::debug!(question_id = id, error = %e, "Dropping cached answer"),
            }
        }
        restored
    }

    /// Hand the finished attempt to `endpoint`.
    ///
    /// Failure keeps the answers and cursor and remembers the error; calling
    /// again resends the same payload. After success, further calls return the
    /// stored receipt without contacting the endpoint.
    pub async fn submit<E: SubmissionEndpoint>(&mut self, endpoint: &E) -> Result<&SubmissionReceipt> {
        if self.receipt.is_none() {
            if !self.is_terminal() {
                return Err(Error::NotComplete);
            }

            let submission = self
                .pending
                .get_or_insert_with(|| AssessmentSubmission {
                    assessment_type: self.definition.assessment_type,
                    responses: self.responses.clone(),
                    timestamp: Utc::now(),
                })
                .clone();

            match endpoint.submit(&submission).await {
                Ok(receipt) => {
                    self.last_error = None;
                    self.receipt = Some(receipt);
                }
                Err(e) => {
                    tracing::warn!(
                        assessment_type = %submission.assessment_type,
                        error = %e,
                        "Assessment submission failed"
                    );
                    self.last_error = Some(e.to_string());
                    return Err(e);
                }
            }
        }

        self.receipt.as_ref().ok_or(Error::NotComplete)
    }
}
