use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: taskboard add "Fix login" --priority high --tag auth
    Add {
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Delete a task
    ///
    /// Example: taskboard delete 1
    Delete {
        id: u64,
    },
    /// Change a task's status
    ///
    /// Example: taskboard status 1 in-progress
    Status {
        id: u64,
        status: String,
    },
    /// List tasks
    ///
    /// Example: taskboard list --search auth --status pending --sort priority
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show the task the queue would pop next
    ///
    /// Example: taskboard urgent
    Urgent,
    /// Show aggregate statistics
    ///
    /// Example: taskboard stats
    Stats,
    /// Show the rolling created/completed trend
    ///
    /// Example: taskboard trend --days 7
    Trend {
        #[arg(long)]
        days: Option<u32>,
    },
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    TickSeconds,
    ProgressPerTick,
    TrendWindowDays,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let canonical_field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "tick_seconds" | "tick" => ConfigOverrideTarget::TickSeconds,
        "progress_per_tick" | "progress" => ConfigOverrideTarget::ProgressPerTick,
        "trend_window_days" | "trend_window" => ConfigOverrideTarget::TrendWindowDays,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
