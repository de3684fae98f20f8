//! Interactive assessment on stdin/stdout.
//!
//! Answers are cached in the store after every change, so quitting and
//! coming back later resumes where the trainee left off.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use stella_core::assessment::{
    AnswerValue, AssessmentNavigator, AssessmentSubmission, HttpSubmissionClient,
    LocalSubmissionEndpoint, QuestionBank, QuestionKind, ResponseRecord, SubmissionEndpoint,
    SubmissionReceipt, View,
};
use stella_core::{AssessmentType, Config, Database};

/// Store scope for cached answers, keyed by assessment type
const RESPONSE_SCOPE: &str = "responses";

/// Remote endpoint when configured, the local store otherwise
enum Endpoint {
    Http(HttpSubmissionClient),
    Local(LocalSubmissionEndpoint),
}

impl SubmissionEndpoint for Endpoint {
    async fn submit(
        &self,
        submission: &AssessmentSubmission,
    ) -> stella_core::Result<SubmissionReceipt> {
        match self {
            Endpoint::Http(client) => client.submit(submission).await,
            Endpoint::Local(local) => local.submit(submission).await,
        }
    }
}

impl Endpoint {
    fn from_config(config: &Config, db: Arc<Database>) -> Result<Self> {
        if config.submission.server_url.is_some() {
            let client = HttpSubmissionClient::new(&config.submission)
                .context("failed to create submission client")?;
            Ok(Endpoint::Http(client))
        } else {
            Ok(Endpoint::Local(LocalSubmissionEndpoint::new(db)))
        }
    }
}

/// Turn typed input into an answer for `kind`.
///
/// Options accept the 1-based number or the exact text; multiselect takes a
/// comma-separated list of either.
fn parse_answer(kind: &QuestionKind, input: &str) -> std::result::Result<AnswerValue, String> {
    let input = input.trim();
    match kind {
        QuestionKind::Scale { .. } | QuestionKind::Numeric { .. } => input
            .parse::<i64>()
            .map(AnswerValue::Integer)
            .map_err(|_| format!("'{input}' is not a whole number")),
        QuestionKind::Duration { .. } => Ok(AnswerValue::Text(input.to_string())),
        QuestionKind::Options { options } => pick_option(options, input).map(AnswerValue::Text),
        QuestionKind::Multiselect { options } => input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|choice| pick_option(options, choice))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(AnswerValue::List),
    }
}

fn pick_option(options: &[String], input: &str) -> std::result::Result<String, String> {
    if let Ok(n) = input.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| options.get(i))
            .cloned()
            .ok_or_else(|| format!("choose a number between 1 and {}", options.len()));
    }
    options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(input))
        .cloned()
        .ok_or_else(|| format!("'{input}' is not one of the options"))
}

fn print_question(kind: &QuestionKind) {
    match kind {
        QuestionKind::Scale { min, max } => println!("  ({min}-{max})"),
        QuestionKind::Numeric { hint } | QuestionKind::Duration { hint } => {
            if let Some(hint) = hint {
                println!("  ({hint})");
            }
        }
        QuestionKind::Options { options } | QuestionKind::Multiselect { options } => {
            for (i, option) in options.iter().enumerate() {
                println!("  {}. {}", i + 1, option);
            }
            if matches!(kind, QuestionKind::Multiselect { .. }) {
                println!("  (comma-separated)");
            }
        }
    }
}

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<Option<String>> {
    print!("> ");
    io::stdout().flush()?;
    lines.next().transpose().context("failed to read input")
}

pub async fn run(config: &Config, db: Arc<Database>, assessment_type: AssessmentType) -> Result<()> {
    let bank = match &config.assessments.path {
        Some(path) => QuestionBank::load_from(path),
        None => QuestionBank::builtin(),
    }
    .context("failed to load assessments")?;

    let definition = bank
        .get(assessment_type)
        .cloned()
        .with_context(|| format!("no {assessment_type} assessment defined"))?;
    let endpoint = Endpoint::from_config(config, db.clone())?;

    let mut nav = AssessmentNavigator::new(definition)
        .with_context(|| format!("invalid {assessment_type} assessment"))?;
    if let Some(cached) = db
        .get_json::<ResponseRecord>(RESPONSE_SCOPE, assessment_type.as_str())
        .context("failed to read cached answers")?
    {
        let restored = nav.restore(&cached);
        if restored > 0 {
            println!("Restored {restored} saved answer(s).");
        }
    }

    println!("{}", nav.definition().title);
    println!("Type an answer and press enter. n = next, b = back, q = quit");
    println!();

    let total = nav.definition().total_questions() as u64;
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        pb.set_position(nav.completed_questions() as u64);

        match nav.view() {
            View::Question {
                section,
                question,
                position,
                prefill,
            } => {
                pb.suspend(|| {
                    println!(
                        "[{}/{}] {} - question {}/{}",
                        position.section_number,
                        position.section_count,
                        section.title,
                        position.question_number,
                        position.questions_in_section
                    );
                    println!("{}", question.prompt);
                    print_question(&question.kind);
                    if let Some(previous) = prefill {
                        println!("  current answer: {previous}");
                    }
                });
                let kind = question.kind.clone();

                let Some(line) = prompt(&mut lines)? else {
                    println!("Answers saved. Run `stella assess` again to continue.");
                    break;
                };

                match line.trim() {
                    "q" => {
                        println!("Answers saved. Run `stella assess` again to continue.");
                        break;
                    }
                    "b" => {
                        nav.previous();
                    }
                    "n" | "" => {
                        if nav.can_advance() {
                            nav.next();
                        } else {
                            println!("Please answer this question first.");
                        }
                    }
                    input => match parse_answer(&kind, input) {
                        Ok(value) => match nav.answer_current(value) {
                            Ok(()) => {
                                db.put_json(RESPONSE_SCOPE, assessment_type.as_str(), nav.responses())
                                    .context("failed to cache answers")?;
                                nav.next();
                            }
                            Err(e) => println!("{e}"),
                        },
                        Err(reason) => println!("{reason}"),
                    },
                }
                println!();
            }
            View::Complete { answered, total } => {
                pb.finish_and_clear();
                println!("All sections done ({answered}/{total} answered). Submitting...");

                match nav.submit(&endpoint).await {
                    Ok(_) => {
                        db.delete(RESPONSE_SCOPE, assessment_type.as_str())
                            .context("failed to clear cached answers")?;
                    }
                    Err(e) => {
                        println!("Submission failed: {e}");
                        println!("r = retry, b = back to the questions, q = quit (answers stay saved)");
                        match prompt(&mut lines)?.as_deref().map(str::trim) {
                            Some("r") => {}
                            Some("b") => {
                                nav.previous();
                            }
                            _ => break,
                        }
                    }
                }
            }
            View::Submitted(receipt) => {
                println!("Assessment submitted: {}", receipt.assessment_id);
                println!("{}", receipt.summary);
                if let Some(scores) = &receipt.scores {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(scores).context("failed to render scores")?
                    );
                }
                break;
            }
        }
    }

    Ok(())
}
