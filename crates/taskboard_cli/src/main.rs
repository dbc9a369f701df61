use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use tabled::{Table, Tabled};
use taskboard_cli::cli::{
    CONFIG_OVERRIDE_FLAG, Cli, Command, ConfigOverrideTarget, ParsedConfigOverride,
    parse_config_override,
};
use taskboard_core::board::TaskBoard;
use taskboard_core::config::{self, ConfigOverrides};
use taskboard_core::error::AppError;
use taskboard_core::model::{Priority, Task, TaskStatus};
use taskboard_core::stats::{Statistics, TrendPoint};
use taskboard_core::store::NewTask;
use taskboard_core::tick::TickEngine;
use taskboard_core::view::{SortKey, StatusFilter};

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::InProgress => "in-progress",
        TaskStatus::Completed => "completed",
    }
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

#[derive(Tabled)]
struct TaskRow {
    id: u64,
    title: String,
    priority: &'static str,
    status: &'static str,
    progress: String,
    duration: u64,
    assignee: String,
    tags: String,
}

impl TaskRow {
    fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            priority: priority_label(task.priority),
            status: status_label(task.status),
            progress: format!("{:.1}%", task.progress),
            duration: task.duration,
            assignee: task.assignee.clone(),
            tags: task.tags.join(", "),
        }
    }
}

fn print_tasks_plain(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }

    let rows: Vec<TaskRow> = tasks.iter().map(TaskRow::from_task).collect();
    println!("{}", Table::new(rows));
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "priority": task.priority,
        "status": task.status,
        "duration": task.duration,
        "created_at": task.created_at,
        "assignee": task.assignee,
        "tags": task.tags,
        "progress": task.progress,
    })
}

fn print_task_json(task: &Task) {
    println!("{}", task_json(task));
}

fn print_tasks_json(tasks: &[Task]) {
    let payload: Vec<serde_json::Value> = tasks.iter().map(task_json).collect();
    println!("{}", serde_json::Value::Array(payload));
}

fn print_statistics(stats: &Statistics, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "total": stats.total,
                "completed": stats.completed,
                "high_priority": stats.high_priority,
                "in_progress": stats.in_progress,
            })
        );
    } else {
        println!(
            "total: {} | completed: {} | high priority: {} | in progress: {}",
            stats.total, stats.completed, stats.high_priority, stats.in_progress
        );
    }
}

fn print_trend(points: &[TrendPoint], json: bool) {
    if json {
        let payload: Vec<serde_json::Value> = points
            .iter()
            .map(|point| {
                serde_json::json!({
                    "date": point.date,
                    "created": point.created,
                    "completed": point.completed,
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(payload));
    } else {
        for point in points {
            println!(
                "{} | created: {} | completed: {}",
                point.date, point.created, point.completed
            );
        }
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(cli: Cli, board: &TaskBoard) -> Result<(), AppError> {
    match cli.command {
        Command::Add {
            title,
            description,
            priority,
            assignee,
            tags,
        } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };

            let priority = match priority.as_deref() {
                Some(raw) => Priority::parse(raw).ok_or_else(|| {
                    AppError::invalid_input("priority must be high, medium or low")
                })?,
                None => Priority::default(),
            };

            let task = board.add_task(NewTask {
                title,
                description: description.unwrap_or_default(),
                priority,
                assignee,
                tags,
            })?;

            if cli.json {
                print_task_json(&task);
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        Command::Delete { id } => {
            let task = board.delete_task(id)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
        Command::Status { id, status } => {
            let status = TaskStatus::parse(&status).ok_or_else(|| {
                AppError::invalid_input("status must be pending, in-progress or completed")
            })?;

            let task = board.set_task_status(id, status)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!(
                    "Updated task: {} ({}) -> {}",
                    task.title,
                    task.id,
                    status_label(task.status)
                );
            }
        }
        Command::List {
            search,
            status,
            sort,
        } => {
            let filter = match status.as_deref() {
                Some(raw) => StatusFilter::parse(raw)
                    .ok_or_else(|| AppError::invalid_input("unknown status filter"))?,
                None => StatusFilter::All,
            };
            // Unknown sort keys leave the snapshot order untouched.
            let sort = sort.as_deref().and_then(SortKey::parse);
            let search = search.unwrap_or_default();

            let tasks = board.filtered_sorted(&search, filter, sort)?;
            if cli.json {
                print_tasks_json(&tasks);
            } else {
                print_tasks_plain(&tasks);
            }
        }
        Command::Urgent => match board.most_urgent() {
            Some(task) => {
                if cli.json {
                    print_task_json(&task);
                } else {
                    println!(
                        "Most urgent: {} ({}) [{}]",
                        task.title,
                        task.id,
                        priority_label(task.priority)
                    );
                }
            }
            None => {
                if cli.json {
                    println!("null");
                } else {
                    println!("no tasks queued");
                }
            }
        },
        Command::Stats => {
            let stats = board.statistics();
            print_statistics(&stats, cli.json);
        }
        Command::Trend { days } => {
            let days = days.unwrap_or(board.config().trend_window_days);
            let points = board.trend(days)?;
            print_trend(&points, cli.json);
        }
    }

    Ok(())
}

fn run_interactive(board: &TaskBoard) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("taskboard".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli, board) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn apply_parsed_override(
    overrides: &mut ConfigOverrides,
    parsed: &ParsedConfigOverride,
) -> Result<(), AppError> {
    match parsed.target {
        ConfigOverrideTarget::TickSeconds => {
            overrides.tick_seconds = Some(parsed.value.parse().map_err(|_| {
                AppError::invalid_input("tick_seconds must be a positive integer")
            })?);
        }
        ConfigOverrideTarget::ProgressPerTick => {
            overrides.progress_per_tick = Some(
                parsed
                    .value
                    .parse()
                    .map_err(|_| AppError::invalid_input("progress_per_tick must be a number"))?,
            );
        }
        ConfigOverrideTarget::TrendWindowDays => {
            overrides.trend_window_days = Some(parsed.value.parse().map_err(|_| {
                AppError::invalid_input("trend_window_days must be a positive integer")
            })?);
        }
    }

    Ok(())
}

/// Scan raw argv for override flags before clap runs, so the interactive
/// session (which never parses a top-level Cli) honors them too. Returns the
/// overrides plus the arguments that were not overrides.
fn split_override_args(args: &[String]) -> Result<(ConfigOverrides, Vec<String>), AppError> {
    let mut overrides = ConfigOverrides::default();
    let mut remaining = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let raw = if let Some(rest) = arg.strip_prefix("--config-override=") {
            rest.to_string()
        } else if arg == CONFIG_OVERRIDE_FLAG {
            match iter.next() {
                Some(value) => value.clone(),
                None => {
                    return Err(AppError::invalid_input("--config-override requires a value"));
                }
            }
        } else {
            remaining.push(arg.clone());
            continue;
        };

        let parsed = parse_config_override(&raw).map_err(AppError::invalid_input)?;
        apply_parsed_override(&mut overrides, &parsed)?;
    }

    Ok((overrides, remaining))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn run() -> Result<(), AppError> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let load = config::load_config_with_fallback();
    if let Some(err) = &load.error {
        tracing::warn!(error = %err, "config load failed, using defaults");
    }
    let (overrides, remaining) = split_override_args(&args)?;
    let config = config::merge_overrides(&load.config, &overrides)?;

    let runtime =
        tokio::runtime::Runtime::new().map_err(|err| AppError::io(err.to_string()))?;
    let _guard = runtime.enter();

    let board = TaskBoard::new(config);

    if remaining.is_empty() {
        // Live session: the tick engine advances in-progress tasks in the
        // background until the session ends.
        let engine = TickEngine::start(board.clone());
        let result = run_interactive(&board);
        runtime.block_on(engine.stop());
        return result;
    }

    let cli = Cli::try_parse().map_err(normalize_parse_error)?;
    run_command(cli, &board)
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
