use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timetrack::config::Config;
use timetrack::console::{validate, Console};
use timetrack::models::WorkSession;
use timetrack::tracker::Tracker;
use timetrack::{report, seed};

#[derive(Parser)]
#[command(name = "timetrack")]
#[command(about = "Track time spent on projects, one work session at a time")]
struct Cli {
    /// SQLite database file (overrides TIMETRACK_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Directory for CSV reports (overrides TIMETRACK_EXPORT_PATH)
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (the default)
    Console,
    /// List projects
    Projects {
        /// Include archived projects
        #[arg(short, long)]
        all: bool,
    },
    /// Create a project
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Rename a project
    Rename { id: i64, name: String },
    /// Replace a project's description
    Describe { id: i64, text: String },
    /// Archive a project
    Archive {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Start a work session
    Start {
        project_id: i64,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Stop the running work session
    Stop,
    /// Show the running work session
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List a project's work sessions
    Sessions { project_id: i64 },
    /// Export a project's work sessions to CSV
    Export { project_id: i64 },
    /// Fill an empty store with sample data
    Seed,
}

/// Initialize tracing on stderr so stdout stays clean for the console
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "timetrack=warn".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env()?.with_overrides(cli.db, cli.export_dir);
    tracing::debug!("Using database {}", config.db_path.display());

    let tracker = Tracker::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;

    match cli.command.unwrap_or(Commands::Console) {
        Commands::Console => {
            let stdin = io::stdin();
            let mut console = Console::new(
                &tracker,
                stdin.lock(),
                io::stdout(),
                config.export_dir.clone(),
            );
            console.run()?;
        }
        Commands::Projects { all } => {
            let projects = if all {
                tracker.list_all_projects()?
            } else {
                tracker.list_active_projects()?
            };
            for project in projects {
                let archived = if project.archived { " [archived]" } else { "" };
                println!("{}\t{}{}", project.id.unwrap_or_default(), project.name, archived);
            }
        }
        Commands::Create { name, description } => {
            let name = validate::project_name(&name)?;
            let description = validate::description(&description)?;
            let project = tracker.create_project(&name, &description)?;
            println!("Created project {} ({})", project.id.unwrap_or_default(), project.name);
        }
        Commands::Rename { id, name } => {
            let name = validate::project_name(&name)?;
            let project = tracker.rename_project(id, &name)?;
            println!("Project {} renamed to {}", id, project.name);
        }
        Commands::Describe { id, text } => {
            let text = validate::description(&text)?;
            tracker.set_description(id, &text)?;
            println!("Project {} updated", id);
        }
        Commands::Archive { id, yes } => {
            let project = tracker.load_project(id)?;
            if !yes && !confirm(&format!("Archive '{}'? (y/N): ", project.name))? {
                println!("Archiving cancelled");
                return Ok(());
            }
            tracker.archive_project(id)?;
            println!("Project {} archived", id);
        }
        Commands::Start {
            project_id,
            description,
        } => {
            let session = tracker.start_session(project_id, description.as_deref())?;
            println!(
                "Started work session {} at {}",
                session.id.unwrap_or_default(),
                session.start_time.format("%H:%M:%S")
            );
        }
        Commands::Stop => {
            let session = tracker.stop_session()?;
            println!("Stopped work session, duration {}", session.elapsed());
        }
        Commands::Status { json } => {
            let active = tracker.get_active_session()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&active)?);
            } else if let Some(active) = active {
                println!(
                    "Running: {} (id {}) since {}, {}",
                    active.project_name,
                    active.session.project_id,
                    active.session.start_time.format("%Y-%m-%d %H:%M:%S"),
                    active.session.elapsed()
                );
            } else {
                println!("No running work session");
            }
        }
        Commands::Sessions { project_id } => {
            let mut sessions = tracker.list_sessions_for_project(project_id)?;
            sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
            for session in &sessions {
                print_session(session);
            }
        }
        Commands::Export { project_id } => {
            let project = tracker.load_project(project_id)?;
            let path = report::export_project(&project, &config.export_dir)?;
            println!("Report written to {}", path.display());
        }
        Commands::Seed => {
            let summary = seed::seed_sample_data(&tracker)?;
            println!(
                "Seeded {} projects and {} work sessions",
                summary.projects, summary.sessions
            );
        }
    }

    Ok(())
}

fn print_session(session: &WorkSession) {
    let elapsed = session.elapsed();
    let end = session
        .end_time
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "running".to_string());
    println!(
        "{}\t{}\t{}\t{}{}\t{}",
        session.id.unwrap_or_default(),
        session.start_time.format("%Y-%m-%d %H:%M:%S"),
        end,
        elapsed,
        if elapsed.active { " (running)" } else { "" },
        session.description.as_deref().unwrap_or("")
    );
}

fn confirm(question: &str) -> io::Result<bool> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(validate::confirmation(&answer, false))
}
