//! `ask`, `guidance` and `replay` commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use stella_core::guidance::{Activity, Answer, Coach, GuidanceContext};
use stella_core::metrics::{MetricKind, MetricsRecord};
use stella_core::{Config, Database, GuidanceRecord};

#[derive(Args)]
pub struct GuidanceArgs {
    /// Activity: balance, endurance, exercise[:<id>], session-start,
    /// session-end, progress-milestone, metrics-update
    activity: String,

    #[arg(long)]
    heart_rate: Option<f64>,

    #[arg(long)]
    form_quality: Option<f64>,

    #[arg(long)]
    balance: Option<f64>,

    #[arg(long)]
    endurance: Option<f64>,

    /// Mission progress percent
    #[arg(long)]
    progress: Option<f64>,

    /// Training module the guidance is for
    #[arg(long)]
    module: Option<String>,

    /// Print the guidance as JSON
    #[arg(long)]
    json: bool,
}

impl GuidanceArgs {
    fn metrics(&self) -> MetricsRecord {
        let overrides = [
            (MetricKind::HeartRate, self.heart_rate),
            (MetricKind::FormQuality, self.form_quality),
            (MetricKind::Balance, self.balance),
            (MetricKind::Endurance, self.endurance),
            (MetricKind::MissionProgress, self.progress),
        ];
        overrides
            .into_iter()
            .filter_map(|(kind, value)| Some((kind, value?)))
            .fold(MetricsRecord::baseline(), |record, (kind, value)| {
                record.with(kind, value)
            })
    }
}

pub fn print_guidance(record: &GuidanceRecord) {
    println!("STELLA [{}]: {}", record.priority, record.message);
    for item in &record.action_items {
        println!("  - {item}");
    }
}

pub async fn ask(config: &Config, db: Arc<Database>, question: &str) -> Result<()> {
    let mut coach =
        Coach::from_config(&config.guidance, db).context("failed to set up guidance")?;

    let answer = coach
        .ask(question, &serde_json::json!({ "source": "cli" }))
        .await
        .context("failed to ask STELLA")?;

    match answer {
        Answer::Answered { answer } => println!("STELLA: {answer}"),
        Answer::Queued { id } => {
            println!("STELLA is offline. Your question was queued (#{id}) and will be sent by `stella replay`.")
        }
    }
    Ok(())
}

pub async fn guidance(config: &Config, db: Arc<Database>, args: &GuidanceArgs) -> Result<()> {
    let mut coach =
        Coach::from_config(&config.guidance, db).context("failed to set up guidance")?;

    let activity = Activity::parse(&args.activity);
    let context = GuidanceContext {
        module: args.module.clone(),
        mission: None,
    };
    let record = coach.guidance(&activity, &args.metrics(), &context).await;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&record).context("failed to render guidance")?
        );
    } else {
        print_guidance(&record);
    }
    Ok(())
}

pub async fn replay(config: &Config, db: Arc<Database>) -> Result<()> {
    let mut coach =
        Coach::from_config(&config.guidance, db).context("failed to set up guidance")?;

    if !coach.is_remote() {
        println!("Guidance is in mock mode; nothing to replay.");
        return Ok(());
    }

    let report = coach
        .replay_pending()
        .await
        .context("failed to replay queued questions")?;

    for (question, answer) in &report.answered {
        println!("Q: {question}");
        println!("STELLA: {answer}");
        println!();
    }
    println!(
        "Replayed {} question(s), {} still queued.",
        report.answered.len(),
        report.remaining
    );
    Ok(())
}
