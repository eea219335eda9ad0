//! `slots` CLI: compute bookable slots and check availability windows against
//! a calendar dump.
//!
//! ## Usage
//!
//! ```sh
//! # Free slots for 40-minute sessions (events read from stdin)
//! cat events.json | slots slots --date 2026-03-02 --duration 40
//!
//! # Full-day timeline including busy time and canceled bookings
//! slots slots --date 2026-03-02 --all -i events.json --bookings bookings.json
//!
//! # Declared availability windows of a day
//! slots windows --date 2026-03-02 -i events.json
//!
//! # Would a new emergency window fit? (nothing is written)
//! slots reconcile --date 2026-03-02 --start 10:00 --end 15:00 --kind emergency -i events.json
//!
//! # Non-default grid / timezone
//! slots --config engine.toml slots --date 2026-03-02 -i events.json
//! ```
//!
//! Events are a JSON array of calendar events, or a provider response object
//! carrying them under `items`. Output is pretty JSON on stdout; diagnostics go
//! to stderr and are controlled by `RUST_LOG` (default `warn`).

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use slot_engine::classifier::AvailabilityKind;
use slot_engine::reconcile::{reconcile_window, ProposedWindow};
use slot_engine::{BookingRecord, CalendarEvent, EngineConfig, MemoryBookings, MemoryCalendar, SlotEngine};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Buffer-aware appointment slots from calendar events"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML engine configuration (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override the business timezone (IANA name, e.g. Asia/Kolkata)
    #[arg(long, global = true)]
    timezone: Option<String>,
}

#[derive(Args)]
struct EventSource {
    /// Calendar events JSON file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the slots of a day
    Slots {
        /// Day to compute, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Session length in minutes (configured default if omitted)
        #[arg(long)]
        duration: Option<u32>,
        /// Only slots from `regular` or `emergency` windows
        #[arg(long)]
        kind: Option<AvailabilityKind>,
        /// Include busy time and canceled bookings (full-day view)
        #[arg(long)]
        all: bool,
        /// Booking records JSON file (used by --all for canceled bookings)
        #[arg(long, requires = "all")]
        bookings: Option<String>,
        #[command(flatten)]
        source: EventSource,
    },
    /// List the availability windows declared for a day
    Windows {
        /// Day to list, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[command(flatten)]
        source: EventSource,
    },
    /// Check a proposed availability window against the existing ones
    Reconcile {
        /// Day of the window, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Window start, HH:MM local time
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        /// Window end, HH:MM local time
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        /// `regular` or `emergency`
        #[arg(long, default_value = "regular")]
        kind: AvailabilityKind,
        #[command(flatten)]
        source: EventSource,
    },
}

/// Calendar dumps come either as a bare array or as a list response.
#[derive(Deserialize)]
#[serde(untagged)]
enum EventDump {
    Array(Vec<CalendarEvent>),
    Items { items: Vec<CalendarEvent> },
}

impl EventDump {
    fn into_events(self) -> Vec<CalendarEvent> {
        match self {
            EventDump::Array(events) => events,
            EventDump::Items { items } => items,
        }
    }
}

type Engine = SlotEngine<MemoryCalendar, MemoryBookings>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.timezone)?;

    let output = match cli.command {
        Commands::Slots {
            date,
            duration,
            kind,
            all,
            bookings,
            source,
        } => {
            let bookings = read_bookings(bookings.as_deref())?;
            let engine = build_engine(&source, bookings, config)?;
            let slots = engine
                .compute_slots(date, duration, kind, all)
                .await
                .with_context(|| format!("Failed to compute slots for {date}"))?;
            serde_json::to_string_pretty(&slots)?
        }
        Commands::Windows { date, source } => {
            let engine = build_engine(&source, Vec::new(), config)?;
            let windows = engine
                .list_windows(date)
                .await
                .with_context(|| format!("Failed to list windows for {date}"))?;
            serde_json::to_string_pretty(&windows)?
        }
        Commands::Reconcile {
            date,
            start,
            end,
            kind,
            source,
        } => {
            let engine = build_engine(&source, Vec::new(), config)?;
            let tz = engine.timezone();
            let proposed = ProposedWindow::from_local(date, start, end, kind, &tz)
                .context("Invalid proposed window")?;
            let schedule = engine.day_schedule(date).await?;
            let result = reconcile_window(&proposed, &schedule.availability, &tz);
            serde_json::to_string_pretty(&result)?
        }
    };

    println!("{output}");
    Ok(())
}

fn load_config(path: Option<&str>, timezone: Option<String>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {path}"))?,
        None => EngineConfig::default(),
    };
    if let Some(timezone) = timezone {
        config.timezone = timezone;
        config.validate().context("Invalid --timezone")?;
    }
    Ok(config)
}

fn build_engine(source: &EventSource, bookings: Vec<BookingRecord>, config: EngineConfig) -> Result<Engine> {
    let tz = config.tz()?;
    let raw = read_input(source.input.as_deref())?;
    let events = serde_json::from_str::<EventDump>(&raw)
        .context("Failed to parse calendar events JSON")?
        .into_events();
    tracing::debug!(events = events.len(), "loaded calendar dump");

    let calendar = MemoryCalendar::with_events(tz, events);
    Ok(SlotEngine::new(calendar, MemoryBookings::new(bookings), config)?)
}

fn read_bookings(path: Option<&str>) -> Result<Vec<BookingRecord>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse bookings JSON: {}", path))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    slot_engine::time::parse_hhmm(raw).ok_or_else(|| format!("expected HH:MM, got '{raw}'"))
}
