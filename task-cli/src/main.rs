use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use std::path::PathBuf;
use std::process::ExitCode;
use task_cli::config::Config;
use task_cli::{
    Error, FileTaskRepository, NewTask, Priority, Status, SystemClock, Task, TaskService,
    TaskUpdate,
};

#[derive(Parser, Debug)]
#[command(name = "task-cli", version, about = "Keep track of a personal task list")]
struct Cli {
    /// Task store to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Add a new pending task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(long)]
        priority: Option<Priority>,
        /// Due date as YYYY-MM-DD, today or later
        #[arg(long, value_name = "YYYY-MM-DD")]
        due: Option<NaiveDate>,
    },
    /// Change some fields of a task, leaving the others as they are
    Update {
        id: u32,
        #[arg(long)]
        title: Option<String>,
        /// pending, inprogress or completed
        #[arg(long)]
        status: Option<Status>,
        #[arg(long, value_name = "YYYY-MM-DD", conflicts_with = "no_due")]
        due: Option<NaiveDate>,
        /// Remove the due date
        #[arg(long)]
        no_due: bool,
        #[arg(long, conflicts_with = "no_description")]
        description: Option<String>,
        /// Remove the description
        #[arg(long)]
        no_description: bool,
        #[arg(long, conflicts_with = "no_priority")]
        priority: Option<Priority>,
        /// Remove the priority
        #[arg(long)]
        no_priority: bool,
    },
    /// Delete a task
    Delete { id: u32 },
    /// List every task
    List,
    /// List tasks with the given status
    Filter { status: Status },
    /// Mark a task as completed
    Complete { id: u32 },
    /// Mark a task as pending
    Pending { id: u32 },
    /// Mark a task as in progress
    #[command(name = "inprogress", alias = "in-progress")]
    InProgress { id: u32 },
    /// Show the status of a task
    Status { id: u32 },
    /// Delete every task
    Clear,
    /// Mark every task as completed
    CompleteAll,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let store_path = args.file.unwrap_or(config.store_path);
    let clock = SystemClock;
    let repository = FileTaskRepository::new(store_path);
    let service = TaskService::new(&repository, &clock);

    match args.command {
        Commands::Add {
            title,
            description,
            priority,
            due,
        } => {
            let new_task = NewTask {
                title,
                description,
                priority,
                due_date: due,
            };
            let task = service.add_task(new_task)?;
            println!("Task added with ID {}", task.id());
        }
        Commands::Update {
            id,
            title,
            status,
            due,
            no_due,
            description,
            no_description,
            priority,
            no_priority,
        } => {
            let update = TaskUpdate {
                title,
                status,
                due_date: clearable(due, no_due),
                description: clearable(description, no_description),
                priority: clearable(priority, no_priority),
            };
            if update.is_empty() {
                anyhow::bail!("nothing to update, pass at least one field");
            }
            let task = service.update(id, update)?;
            println!("Task {} updated", task.id());
            println!("{}", render(&task));
        }
        Commands::Delete { id } => {
            let task = service.delete(id)?;
            println!("Task {} deleted", task.id());
        }
        Commands::List => print_tasks(&service.get_all()),
        Commands::Filter { status } => print_tasks(&service.get_by_status(status)),
        Commands::Complete { id } => set_status(&service, id, Status::Completed)?,
        Commands::Pending { id } => set_status(&service, id, Status::Pending)?,
        Commands::InProgress { id } => set_status(&service, id, Status::InProgress)?,
        Commands::Status { id } => {
            let task = service.get_by_id(id).ok_or(Error::NotFound(id))?;
            println!("Task {} is {}", task.id(), colorize_status(task.status()));
        }
        Commands::Clear => {
            service.clear_all()?;
            println!("All tasks cleared");
        }
        Commands::CompleteAll => {
            let count = service.mark_all_completed()?;
            println!("Marked {} task(s) as completed", count);
        }
    };

    Ok(())
}

fn set_status(
    service: &TaskService<'_, FileTaskRepository, SystemClock>,
    id: u32,
    status: Status,
) -> anyhow::Result<()> {
    let task = service.set_status(id, status)?;
    println!(
        "Task {} marked as {}",
        task.id(),
        colorize_status(task.status())
    );
    Ok(())
}

/// Maps a value flag and its `--no-*` counterpart onto a clearable update field.
fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear { Some(None) } else { value.map(Some) }
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for task in tasks {
        println!("{}", render(task));
        if let Some(description) = task.description() {
            println!("    {}", description.dimmed());
        }
    }
}

fn render(task: &Task) -> ColoredString {
    let line = task.to_string();
    match task.status() {
        Status::Pending => line.normal(),
        Status::InProgress => line.yellow(),
        Status::Completed => line.green(),
    }
}

fn colorize_status(status: Status) -> ColoredString {
    let name = status.to_string();
    match status {
        Status::Pending => name.normal(),
        Status::InProgress => name.yellow(),
        Status::Completed => name.green(),
    }
}
