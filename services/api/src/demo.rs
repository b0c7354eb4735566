use crate::infra::{InMemoryScreeningRepository, InMemoryUserDirectory};
use chrono::{FixedOffset, Offset, Utc};
use clap::Args;
use mindcheck::auth::{Identity, Role, UserDirectory, UserId, UserProfile};
use mindcheck::config::{ReportingConfig, DEFAULT_RECENT_LIMIT};
use mindcheck::error::AppError;
use mindcheck::history::{
    aggregate_in, AdminOverview, FeedStatus, HistoryAggregate, LiveDashboard,
    ScreeningHistoryImporter, UserJourney,
};
use mindcheck::screening::{
    AnswerStore, Questionnaire, RiskTier, ScreeningPolicy, ScreeningScope,
    ScreeningService, SubjectProfile,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Offset used to group results into months (e.g. +05:30). Defaults to UTC.
    #[arg(long, value_parser = crate::infra::parse_offset)]
    pub(crate) utc_offset: Option<FixedOffset>,
    /// Skip the admin overview portion of the demo.
    #[arg(long)]
    pub(crate) skip_overview: bool,
}

#[derive(Args, Debug)]
pub(crate) struct HistoryReportArgs {
    /// CSV export with columns id, owner_id, owner_name, score, result, age, gender, created_at
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Offset used to group results into months (e.g. +05:30). Defaults to UTC.
    #[arg(long, value_parser = crate::infra::parse_offset)]
    pub(crate) utc_offset: Option<FixedOffset>,
    /// Emit the aggregate as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

struct Scenario {
    label: &'static str,
    user: Identity,
    subject: SubjectProfile,
    answers: &'static [(&'static str, &'static str)],
}

const STRESS_ONLY: &[(&str, &str)] = &[
    ("q1", "stressed"),
    ("q2", "rarely"),
    ("q3", "no_interest"),
    ("q4", "feel_okay"),
    ("q5", "feel_calm"),
    ("q6", "manage_worries"),
    ("q7", "can_focus"),
    ("q8", "feel_relaxed"),
];

const FOUR_CONCERNS: &[(&str, &str)] = &[
    ("q1", "stressed"),
    ("q2", "very often"),
    ("q3", "yes_lost_interest"),
    ("q4", "feel_hopeless"),
    ("q5", "feel_calm"),
    ("q6", "manage_worries"),
    ("q7", "can_focus"),
    ("q8", "feel_relaxed"),
];

const EVERY_CONCERN: &[(&str, &str)] = &[
    ("q1", "stressed"),
    ("q2", "very often"),
    ("q3", "yes_lost_interest"),
    ("q4", "feel_hopeless"),
    ("q5", "feel_nervous"),
    ("q6", "worry_a_lot"),
    ("q7", "cannot_focus"),
    ("q8", "feel_strain"),
];

fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            label: "A: one stress answer",
            user: Identity::new("demo-asha").with_display_name("Asha"),
            subject: SubjectProfile {
                age: Some(21),
                gender: Some("female".to_string()),
            },
            answers: STRESS_ONLY,
        },
        Scenario {
            label: "B: four concerns",
            user: Identity::new("demo-ravi").with_display_name("Ravi"),
            subject: SubjectProfile {
                age: Some(24),
                gender: Some("male".to_string()),
            },
            answers: FOUR_CONCERNS,
        },
        Scenario {
            label: "C: every concern",
            user: Identity::new("demo-asha").with_display_name("Asha"),
            subject: SubjectProfile {
                age: Some(21),
                gender: Some("female".to_string()),
            },
            answers: EVERY_CONCERN,
        },
    ]
}

pub(crate) fn run_questionnaire() {
    let questionnaire = Questionnaire::standard();
    println!(
        "Screening questionnaire ({} questions, max score {})",
        questionnaire.len(),
        questionnaire.max_score()
    );
    for (index, question) in questionnaire.questions.iter().enumerate() {
        println!("{}. [{}] {}", index + 1, question.id, question.prompt);
        for choice in question.choices {
            println!(
                "   - {:<20} weight {} ({})",
                choice.value, choice.weight, choice.label
            );
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        utc_offset,
        skip_overview,
    } = args;

    let reporting = ReportingConfig {
        utc_offset: utc_offset.unwrap_or_else(|| Utc.fix()),
        recent_limit: DEFAULT_RECENT_LIMIT,
    };
    let policy = ScreeningPolicy::default();

    let admin = UserId::new("demo-admin");
    let repository = Arc::new(InMemoryScreeningRepository::default());
    let directory = Arc::new(InMemoryUserDirectory::with_admins(std::slice::from_ref(
        &admin,
    )));
    let service = ScreeningService::new(repository.clone(), directory.clone(), policy, reporting);

    let dashboard = LiveDashboard::new(reporting.utc_offset);
    let subscription = dashboard.attach(repository.as_ref(), ScreeningScope::All);

    println!("MindCheck screening demo");
    for scenario in scenarios() {
        if let Err(err) = directory.upsert(UserProfile {
            identity: scenario.user.clone(),
            role: Role::Member,
        }) {
            println!("  Directory unavailable: {}", err);
            return Ok(());
        }

        let answers: AnswerStore = scenario.answers.iter().copied().collect();
        println!("\nScenario {}", scenario.label);

        match service.submit(&scenario.user, scenario.subject, &answers) {
            Ok(receipt) => {
                println!(
                    "- {} answered {} of {} -> score {} ({})",
                    receipt
                        .result
                        .owner_name
                        .as_deref()
                        .unwrap_or(receipt.result.owner_id.as_str()),
                    answers.len(),
                    service.questionnaire().len(),
                    receipt.result.score,
                    receipt.result.tier.label()
                );
                println!(
                    "  Next step: {} ({})",
                    receipt.routing.destination.label(),
                    receipt.routing.path
                );
                if let Some(context) = receipt.routing.context {
                    println!(
                        "  Coach opens with: score {} / {}",
                        context.score,
                        context.tier.label()
                    );
                }
            }
            Err(err) => println!("  Submission rejected: {}", err),
        }
    }

    println!(
        "\nLive dashboard: {} refreshes, status {}",
        dashboard.refreshes(),
        describe_status(&dashboard.status())
    );
    if let Some(aggregate) = dashboard.aggregate() {
        render_aggregate(&aggregate);
    }
    subscription.cancel();

    match service.journey(&UserId::new("demo-asha")) {
        Ok(journey) => render_journey(&journey),
        Err(err) => println!("  Journey unavailable: {}", err),
    }

    if skip_overview {
        return Ok(());
    }

    match service.overview(&admin) {
        Ok(overview) => render_overview(&overview),
        Err(err) => println!("  Overview unavailable: {}", err),
    }

    Ok(())
}

pub(crate) fn run_history_report(args: HistoryReportArgs) -> Result<(), AppError> {
    let HistoryReportArgs {
        csv,
        utc_offset,
        json,
    } = args;

    let offset = utc_offset.unwrap_or_else(|| Utc.fix());
    let results = ScreeningHistoryImporter::from_path(&csv)?;
    let aggregate = aggregate_in(&results, offset);

    if json {
        match serde_json::to_string_pretty(&aggregate) {
            Ok(payload) => println!("{}", payload),
            Err(err) => println!("Aggregate unavailable: {}", err),
        }
        return Ok(());
    }

    println!(
        "Screening history: {} ({} results, months in UTC{})",
        csv.display(),
        results.len(),
        offset
    );
    render_aggregate(&aggregate);
    Ok(())
}

fn describe_status(status: &FeedStatus) -> String {
    match status {
        FeedStatus::Waiting => "waiting".to_string(),
        FeedStatus::Live => "live".to_string(),
        FeedStatus::Stopped { reason } => format!("stopped ({reason})"),
    }
}

fn render_aggregate(aggregate: &HistoryAggregate) {
    println!("Monthly screenings:");
    if aggregate.monthly_buckets.is_empty() {
        println!("  (no dated results)");
    }
    for bucket in &aggregate.monthly_buckets {
        let counts: Vec<String> = RiskTier::ordered()
            .into_iter()
            .map(|tier| format!("{} {}", tier.label(), bucket.count(tier)))
            .collect();
        println!("  - {}: {}", bucket.label, counts.join(" | "));
    }
    println!(
        "Totals: High {} | Moderate {} | Mild {}",
        aggregate.tier_totals.high, aggregate.tier_totals.moderate, aggregate.tier_totals.mild
    );
    if aggregate.undated > 0 {
        println!("  {} result(s) without a date left out of the months", aggregate.undated);
    }
}

fn render_journey(journey: &UserJourney) {
    println!("\nJourney for {}", journey.owner_id);
    for point in &journey.trend {
        println!(
            "  - {}: score {} ({})",
            point.label,
            point.score,
            point.tier.label()
        );
    }
    if !journey.chart_ready {
        println!("  Complete another screening to see a trend line.");
    }
}

fn render_overview(overview: &AdminOverview) {
    println!("\nAdmin overview");
    println!(
        "- {} users | {} screenings | {} high risk",
        overview.total_users, overview.screenings_completed, overview.high_risk
    );
    println!("Recent screenings:");
    for result in &overview.recent {
        println!(
            "  - {} {}: score {} ({})",
            result.id.0,
            result.owner_name.as_deref().unwrap_or("Anonymous"),
            result.score,
            result.tier.label()
        );
    }
    println!("Risk breakdown:");
    for share in &overview.breakdown {
        println!("  - {}: {}", share.label, share.count);
    }
}
