//! Readiness assessments.
//!
//! An assessment is an ordered list of sections, each an ordered list of
//! questions. [`AssessmentNavigator`] walks it one question at a time, keeps
//! the [`ResponseRecord`] and submits the finished attempt.
//!
//! ```rust,no_run
//! # async fn demo() -> stella_core::Result<()> {
//! use stella_core::assessment::{AnswerValue, AssessmentNavigator, QuestionBank};
//! use stella_core::AssessmentType;
//!
//! let bank = QuestionBank::builtin()?;
//! let definition = bank.get(AssessmentType::Initial).cloned().unwrap();
//! let mut nav = AssessmentNavigator::new(definition)?;
//! nav.answer_current(AnswerValue::Integer(7))?;
//! nav.next();
//! # Ok(())
//! # }
//! ```

pub mod bank;
pub mod definition;
pub mod navigator;
pub mod responses;
pub mod submission;

pub use bank::QuestionBank;
pub use definition::{AssessmentDefinition, Question, QuestionKind, Section};
pub use navigator::{AssessmentNavigator, NavigationCursor, QuestionPosition, View};
pub use responses::{AnswerValue, ResponseRecord};
pub use submission::{
    AssessmentSubmission, HttpSubmissionClient, LocalSubmissionEndpoint, SubmissionEndpoint,
    SubmissionReceipt,
};
