use clap::{Parser, Subcommand, ValueEnum};

use crate::core::punch::PunchEvent;

/// Command-line interface for the rkintai attendance core
#[derive(Parser)]
#[command(
    name = "rkintai",
    version = env!("CARGO_PKG_VERSION"),
    about = "Attendance core for staffing back-offices: punches, timecards, overtime and approvals",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// Operator name recorded in the audit log
    #[arg(global = true, long = "operator", default_value = "cli")]
    pub operator: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PunchArg {
    Start,
    BreakStart,
    BreakEnd,
    End,
    Cancel,
}

impl From<PunchArg> for PunchEvent {
    fn from(arg: PunchArg) -> Self {
        match arg {
            PunchArg::Start => PunchEvent::Start,
            PunchArg::BreakStart => PunchEvent::BreakStart,
            PunchArg::BreakEnd => PunchEvent::BreakEnd,
            PunchArg::End => PunchEvent::End,
            PunchArg::Cancel => PunchEvent::Cancel,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Show the effective configuration
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,
    },

    /// Manage master data (staff, contracts, patterns)
    Master {
        #[command(subcommand)]
        action: MasterAction,
    },

    /// Record a time punch for a staff member
    Punch {
        #[arg(value_enum)]
        event: PunchArg,

        #[arg(long = "staff", help = "Staff id")]
        staff: i64,

        #[arg(long = "lat", requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long = "lon", requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        #[arg(long = "at", help = "Punch timestamp (RFC3339), defaults to now")]
        at: Option<String>,
    },

    /// Show the current punch state of a staff member
    Status {
        #[arg(long = "staff", help = "Staff id")]
        staff: i64,

        #[arg(long = "at", help = "Reference timestamp (RFC3339), defaults to now")]
        at: Option<String>,
    },

    /// Write, delete or list daily timecards
    Timecard {
        #[command(subcommand)]
        action: TimecardAction,
    },

    /// Recompute the monthly totals of a contract
    Recompute {
        #[arg(long = "contract")]
        contract: i64,

        #[arg(long = "month", help = "Target month (YYYY-MM)")]
        month: String,

        #[arg(long = "staff", help = "Staff id (required for client contracts)")]
        staff: Option<i64>,
    },

    /// Submit the month of a staff member for approval
    Submit {
        #[arg(long = "staff")]
        staff: i64,

        #[arg(long = "month", help = "Closing month (YYYY-MM)")]
        month: String,
    },

    /// Withdraw a submitted month
    Withdraw {
        #[arg(long = "staff")]
        staff: i64,

        #[arg(long = "month", help = "Closing month (YYYY-MM)")]
        month: String,
    },

    /// Approve a submitted approval and sync the timecards
    Approve {
        #[arg(long = "id")]
        id: i64,
    },

    /// Reject a submitted approval
    Reject {
        #[arg(long = "id")]
        id: i64,

        #[arg(long = "reason")]
        reason: String,
    },

    /// CSV timecard import
    Import {
        #[command(subcommand)]
        action: ImportAction,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },
}

#[derive(Subcommand)]
pub enum MasterAction {
    /// Load master data from a YAML file
    Load { file: String },
}

#[derive(Subcommand)]
pub enum TimecardAction {
    /// Create or replace the timecard of one day
    Set {
        #[arg(long = "contract")]
        contract: i64,

        #[arg(long = "staff", help = "Staff id (defaults to the contract owner)")]
        staff: Option<i64>,

        #[arg(long = "date", help = "Work date (YYYY-MM-DD)")]
        date: String,

        #[arg(long = "type", default_value_t = 10, help = "Work type code (10=work, 20=holiday, 30=absence, 40=paid leave, ...)")]
        work_type: i64,

        #[arg(long = "slot", help = "Work-time slot name used to prefill the day")]
        slot: Option<String>,

        #[arg(long = "in", help = "Start time (HH:MM)")]
        start: Option<String>,

        #[arg(long = "in-next-day")]
        start_next_day: bool,

        #[arg(long = "out", help = "End time (HH:MM)")]
        end: Option<String>,

        #[arg(long = "out-next-day")]
        end_next_day: bool,

        #[arg(long = "break", default_value_t = 0, help = "Break minutes")]
        break_minutes: i64,

        #[arg(long = "paid-leave", default_value = "0", help = "Paid leave days (0, 0.5, 1)")]
        paid_leave: String,

        #[arg(long = "memo")]
        memo: Option<String>,
    },

    /// Delete the timecard of one day
    Del {
        #[arg(long = "contract")]
        contract: i64,

        #[arg(long = "staff")]
        staff: Option<i64>,

        #[arg(long = "date", help = "Work date (YYYY-MM-DD)")]
        date: String,
    },

    /// List the timecards and totals of one month
    List {
        #[arg(long = "contract")]
        contract: i64,

        #[arg(long = "staff")]
        staff: Option<i64>,

        #[arg(long = "month", help = "Month (YYYY-MM)")]
        month: String,

        #[arg(long = "json", help = "Print JSON instead of a table")]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ImportAction {
    /// Register a CSV file and print the task id
    Upload { file: String },

    /// Process an uploaded task
    Run {
        id: String,

        #[arg(long = "encoding", help = "cp932 or utf-8 (defaults to config)")]
        encoding: Option<String>,
    },

    /// Show the progress of a task
    Progress { id: String },

    /// Request cancellation of a task
    Cancel { id: String },
}
