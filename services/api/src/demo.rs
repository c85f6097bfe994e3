use crate::infra::{parse_date, parse_timestamp, InMemoryTicketRepository};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use clap::Args;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use taskproof::error::AppError;
use taskproof::rules::{
    compute_score, ActorRole, Period, ScoreBreakdown, Severity, TicketHistoryRecord, TicketStatus,
};
use taskproof::tickets::{
    Actor, Cadence, NewTicket, PhotoRecord, PhotoTag, RecurringTemplate, TicketService,
    TransitionRequest,
};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON array of ticket history records for one assignee
    #[arg(long)]
    pub(crate) history: PathBuf,
    /// Period start (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) start: DateTime<Utc>,
    /// Period end (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) end: DateTime<Utc>,
    /// Tickets this assignee completed in the period
    #[arg(long, default_value_t = 0)]
    pub(crate) completed: u32,
    /// Highest completion count of any assignee in the period
    #[arg(long, default_value_t = 0)]
    pub(crate) max_completed: u32,
    /// Emit a CSV row instead of the human readable breakdown
    #[arg(long)]
    pub(crate) csv: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Day the recurring schedule runs for (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct ScoreRow {
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    tickets: usize,
    quality: f64,
    consistency: f64,
    speed: f64,
    volume: f64,
    total: f64,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        history,
        start,
        end,
        completed,
        max_completed,
        csv,
    } = args;

    if end < start {
        return Err(AppError::Input(
            "period end must not precede its start".to_string(),
        ));
    }

    let reader = BufReader::new(File::open(&history)?);
    let tickets: Vec<TicketHistoryRecord> = serde_json::from_reader(reader).map_err(|err| {
        AppError::Input(format!("failed to read {}: {err}", history.display()))
    })?;

    let breakdown = compute_score(&tickets, Period::new(start, end), completed, max_completed);

    if csv {
        write_csv(io::stdout().lock(), &breakdown, tickets.len())
    } else {
        render_breakdown(&breakdown, tickets.len());
        Ok(())
    }
}

fn write_csv<W: Write>(out: W, breakdown: &ScoreBreakdown, tickets: usize) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .serialize(ScoreRow {
            period_start: breakdown.period.start,
            period_end: breakdown.period.end,
            tickets,
            quality: breakdown.quality,
            consistency: breakdown.consistency,
            speed: breakdown.speed,
            volume: breakdown.volume,
            total: breakdown.total,
        })
        .map_err(|err| AppError::Input(format!("failed to write csv: {err}")))?;
    writer.flush()?;
    Ok(())
}

fn render_breakdown(breakdown: &ScoreBreakdown, tickets: usize) {
    println!(
        "Score for {} -> {} ({} ticket{})",
        breakdown.period.start.format("%Y-%m-%d %H:%M"),
        breakdown.period.end.format("%Y-%m-%d %H:%M"),
        tickets,
        if tickets == 1 { "" } else { "s" }
    );
    println!("- quality:     {:>8.2}  (40%)", breakdown.quality);
    println!("- consistency: {:>8.2}  (30%)", breakdown.consistency);
    println!("- speed:       {:>8.2}  (20%)", breakdown.speed);
    println!("- volume:      {:>8.2}  (10%)", breakdown.volume);
    println!("= total:       {:>8.2}", breakdown.total);
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let start_of_day = today
        .and_hms_opt(8, 0, 0)
        .map(|at| at.and_utc())
        .ok_or_else(|| AppError::Input(format!("cannot schedule demo on {today}")))?;

    let service = TicketService::new(Arc::new(InMemoryTicketRepository::default()));
    let worker = Actor::new("jordan", ActorRole::Worker);
    let manager = Actor::new("priya", ActorRole::Manager);
    let step = |hours: i64| start_of_day + Duration::hours(hours);
    let request = |actor: &Actor, to: TicketStatus, note: Option<&str>| TransitionRequest {
        actor: actor.clone(),
        to,
        note: note.map(str::to_string),
    };

    println!("Ticket accountability demo ({today})");

    let templates = vec![RecurringTemplate {
        key: "kitchen-deep-clean".to_string(),
        title: "Deep clean kitchen".to_string(),
        area: "kitchen".to_string(),
        category: "cleaning".to_string(),
        severity: Severity::Elevated,
        inspection: true,
        assignee: worker.name.clone(),
        cadence: Cadence::Daily,
    }];
    let generated = service.generate_recurring(&templates, today, step(0))?;
    let ticket = generated
        .first()
        .ok_or_else(|| AppError::Input("schedule produced no tickets".to_string()))?;
    println!(
        "- generated {} ({}, {} severity, inspection required)",
        ticket.id, ticket.title, ticket.severity
    );

    service.transition(
        &ticket.id,
        request(&worker, TicketStatus::InProgress, None),
        step(1),
    )?;
    for tag in [PhotoTag::Before, PhotoTag::After] {
        service.attach_photo(
            &ticket.id,
            PhotoRecord {
                tag,
                storage_key: format!("demo/{}/{}.jpg", ticket.id, tag.label()),
                uploaded_at: step(2),
            },
        )?;
    }
    service.transition(
        &ticket.id,
        request(&worker, TicketStatus::NeedsReview, None),
        step(3),
    )?;

    let rejection = service.transition(
        &ticket.id,
        request(&manager, TicketStatus::InProgress, Some("Oven interior skipped")),
        step(4),
    )?;
    println!(
        "- {} sent {} back (rejection: {})",
        manager.name, ticket.id, rejection.result.is_rejection
    );

    service.transition(
        &ticket.id,
        request(&worker, TicketStatus::NeedsReview, None),
        step(5),
    )?;
    service.transition(
        &ticket.id,
        request(&manager, TicketStatus::Closed, Some("Looks good")),
        step(6),
    )?;

    let repeat = service.create(
        NewTicket {
            title: "Sticky floor by the sink".to_string(),
            area: "Kitchen".to_string(),
            category: "Cleaning".to_string(),
            severity: Severity::Low,
            recurring: false,
            inspection: false,
            assignee: worker.name.clone(),
            template_key: None,
        },
        step(9),
    )?;
    match &repeat.repeat_of {
        Some(previous) => println!("- {} flagged as a repeat of {}", repeat.id, previous),
        None => println!("- {} is a new issue", repeat.id),
    }

    println!("\nAudit trail for {}", ticket.id);
    for entry in service.audit_trail(&ticket.id)? {
        let note = entry
            .note
            .map(|note| format!(" ({note})"))
            .unwrap_or_default();
        println!(
            "- {} {} -> {} by {}{}",
            entry.at.format("%H:%M"),
            entry.from,
            entry.to,
            entry.actor.name,
            note
        );
    }

    let period = Period::new(step(-8), step(16));
    let record = service.score(&worker.name, period, step(16))?;
    let scored = service.history_for(&worker.name, period)?.len();
    println!();
    render_breakdown(&record.breakdown, scored);

    Ok(())
}
