//! CLI argument definitions.

use chrono::{DateTime, Local, TimeZone};
use clap::{Args, Parser, Subcommand};
use dreamroad_core::{PeriodChoice, PeriodPreset};
use std::path::PathBuf;
use uuid::Uuid;

/// Top-level CLI parser for `dreamroad`.
#[derive(Debug, Parser)]
#[command(name = "dreamroad", version, about = "Break goals into day-by-day roadmaps")]
pub struct Cli {
    /// SQLite file holding goal maps.
    #[arg(long, global = true, env = "DREAMROAD_DB")]
    pub db: Option<PathBuf>,

    /// Base URL of the advice service.
    #[arg(long, global = true, env = "DREAMROAD_API_URL")]
    pub api_url: Option<String>,

    /// Directory for rolling log files; logging stays off when unset.
    #[arg(long, global = true, env = "DREAMROAD_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "DREAMROAD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Advice request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the default breakdown for a duration.
    Breakdown {
        #[command(flatten)]
        period: PeriodArgs,
        /// Print the all-nodes listing as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Create a goal map, optionally merging advice first.
    Plan(PlanArgs),
    /// List active goal maps.
    Maps,
    /// Show one map with its steps.
    Show { map_id: Uuid },
    /// Complete the current step of a map.
    Complete { map_id: Uuid },
    /// Set the task text of one step.
    Task {
        map_id: Uuid,
        day: u32,
        task: String,
    },
    /// Delete a map.
    Delete { map_id: Uuid },
    /// Print the core version.
    Version,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Goal title.
    pub goal: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[command(flatten)]
    pub period: PeriodArgs,

    /// Ask the advice service for per-period tasks.
    #[arg(long)]
    pub advice: bool,

    /// Apply advice even when the service flags the goal as not serious.
    #[arg(long, requires = "advice")]
    pub accept_unserious: bool,

    /// JSON file with period overrides (an array, or an object with `periods`).
    #[arg(long)]
    pub overrides: Option<PathBuf>,
}

/// Duration selection. A preset wins over a deadline, a deadline over
/// custom parts.
#[derive(Debug, Clone, Args)]
pub struct PeriodArgs {
    /// week|month|quarter|half-year|year
    #[arg(long, value_parser = parse_preset)]
    pub preset: Option<PeriodPreset>,

    /// Deadline as epoch milliseconds.
    #[arg(long, conflicts_with = "preset")]
    pub deadline_ms: Option<i64>,

    #[arg(long, default_value_t = 0)]
    pub years: u32,
    #[arg(long, default_value_t = 0)]
    pub months: u32,
    #[arg(long, default_value_t = 0)]
    pub weeks: u32,
    #[arg(long, default_value_t = 0)]
    pub days: u32,
}

impl PeriodArgs {
    pub fn choice(&self) -> PeriodChoice {
        if let Some(preset) = self.preset {
            return PeriodChoice::Preset { preset };
        }
        if let Some(deadline_ms) = self.deadline_ms {
            return PeriodChoice::Deadline {
                deadline_ms,
                today_ms: start_of_day_ms(&Local::now()),
            };
        }
        PeriodChoice::Custom {
            years: self.years,
            months: self.months,
            weeks: self.weeks,
            days: self.days,
        }
    }
}

fn parse_preset(value: &str) -> Result<PeriodPreset, String> {
    PeriodPreset::parse(value).ok_or_else(|| {
        format!("unknown preset `{value}`; expected week|month|quarter|half-year|year")
    })
}

/// Epoch milliseconds of the midnight that starts `now`'s day in its own zone.
fn start_of_day_ms<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(now.timezone()).earliest())
        .map_or_else(|| now.timestamp_millis(), |start| start.timestamp_millis())
}
