use crate::calendar::parse_month;
use crate::events::Layer;
use crate::goals::{GoalFilter, GoalSort};
use crate::taps::TapKind;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "friday",
    version,
    about = "Terminal paper notebook with a project calendar and a vision board"
)]
pub struct Cli {
    /// Directory for the snapshot, UI state and logs
    #[arg(long, global = true, env = "FRIDAY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, env = "FRIDAY_LOG")]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the notebook's TAP modules
    Taps,
    /// Print a month grid with event counts and what comes next
    Calendar {
        /// Month to show, YYYY-MM (defaults to the current month)
        #[arg(long, value_parser = parse_month_arg)]
        month: Option<NaiveDate>,
        /// Only show these layers (repeatable; defaults to the saved selection)
        #[arg(long = "layer", short = 'l')]
        layers: Vec<Layer>,
    },
    /// List the events on one day
    Events {
        /// Day to inspect, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Only show these layers (repeatable)
        #[arg(long = "layer", short = 'l')]
        layers: Vec<Layer>,
    },
    /// Manage vision board goals
    Goal {
        #[command(subcommand)]
        command: GoalCommand,
    },
    /// Show the display name, or set it
    Name {
        /// New display name
        value: Option<String>,
    },
    /// Read or write a per-tab preference
    Pref {
        #[command(subcommand)]
        command: PrefCommand,
    },
    /// Launch the interactive TUI
    Tui,
}

#[derive(Subcommand, Debug)]
pub enum GoalCommand {
    /// List goals
    List {
        /// all, ongoing or completed
        #[arg(long, default_value = "all")]
        filter: GoalFilter,
        /// deadline or progress
        #[arg(long, default_value = "deadline")]
        sort: GoalSort,
    },
    /// Add a goal
    Add {
        /// Goal title
        title: String,
        #[command(flatten)]
        fields: GoalFields,
        /// Mark the goal as already completed
        #[arg(long)]
        done: bool,
    },
    /// Edit an existing goal
    Edit {
        /// Goal id
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: GoalFields,
        /// Clear the start date
        #[arg(long)]
        clear_start: bool,
        /// Clear the end date
        #[arg(long)]
        clear_end: bool,
    },
    /// Mark a goal completed
    Done {
        /// Goal id
        id: String,
    },
    /// Mark a goal as not completed
    Reopen {
        /// Goal id
        id: String,
    },
    /// Set a goal's progress
    Progress {
        /// Goal id
        id: String,
        /// Percentage, 0-100
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        value: u8,
    },
    /// Delete a goal
    Delete {
        /// Goal id
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct GoalFields {
    /// Longer description
    #[arg(long)]
    pub content: Option<String>,
    /// Start date, YYYY-MM-DD
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// End date, YYYY-MM-DD
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Progress percentage, 0-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub progress: Option<u8>,
    /// Image as a data URL
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PrefCommand {
    /// Print one preference
    Get {
        /// Tab id (memo, project, ...)
        #[arg(value_parser = parse_tap_arg)]
        tab: TapKind,
        /// Preference key
        key: String,
    },
    /// Store one preference
    Set {
        /// Tab id (memo, project, ...)
        #[arg(value_parser = parse_tap_arg)]
        tab: TapKind,
        /// Preference key
        key: String,
        /// Value to store
        value: String,
    },
}

fn parse_month_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_month(raw).ok_or_else(|| format!("invalid month (use YYYY-MM): {}", raw))
}

fn parse_tap_arg(raw: &str) -> Result<TapKind, String> {
    TapKind::from_id(raw).ok_or_else(|| {
        let known: Vec<_> = TapKind::ALL.iter().map(|t| t.id()).collect();
        format!("unknown tab `{}` (expected one of {})", raw, known.join(", "))
    })
}
