//! Interactive text console.
//!
//! Generic over its input and output so it can be driven from tests. Storage
//! is re-read before every menu render; nothing about projects or the running
//! session is kept between prompts.

pub mod validate;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::error::Error;
use crate::models::{format_duration, Project, WorkSession};
use crate::report;
use crate::tracker::Tracker;

/// Invalid answers accepted before a prompt gives up.
const MAX_ATTEMPTS: usize = 3;
const RULE_WIDTH: usize = 60;

enum Flow {
    Continue,
    Quit,
}

pub struct Console<'a, R, W> {
    tracker: &'a Tracker,
    input: R,
    output: W,
    export_dir: PathBuf,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    pub fn new(tracker: &'a Tracker, input: R, output: W, export_dir: PathBuf) -> Self {
        Self {
            tracker,
            input,
            output,
            export_dir,
        }
    }

    /// Run the main menu until the user exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.print_main_menu()?;
            let Some(choice) = self.prompt("Select an option (1-7): ")? else {
                break;
            };

            let flow = match choice.as_str() {
                "1" => self.list_projects(false)?,
                "2" => self.list_projects(true)?,
                "3" => self.create_project()?,
                "4" => self.open_project()?,
                "5" => self.start_session()?,
                "6" => self.stop_session()?,
                "7" => Flow::Quit,
                _ => {
                    writeln!(self.output, "Invalid choice, try again.")?;
                    Flow::Continue
                }
            };

            if let Flow::Quit = flow {
                break;
            }
        }

        writeln!(self.output, "Goodbye.")?;
        self.output.flush()
    }

    // ============================================================
    // Main menu
    // ============================================================

    fn print_main_menu(&mut self) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "=== Project Time Tracker ===")?;
        self.print_active_session()?;
        for option in [
            "1. List active projects",
            "2. List all projects",
            "3. Create project",
            "4. Open project",
            "5. Start work session",
            "6. Stop work session",
            "7. Exit",
        ] {
            writeln!(self.output, "{}", option)?;
        }
        Ok(())
    }

    fn print_active_session(&mut self) -> io::Result<()> {
        match self.tracker.get_active_session() {
            Ok(Some(active)) => writeln!(
                self.output,
                "*** Running: {} (id {}) since {}, {} ***",
                active.project_name,
                active.session.project_id,
                active.session.start_time.format("%H:%M:%S"),
                active.session.elapsed()
            ),
            Ok(None) => writeln!(self.output, "*** No running work session ***"),
            Err(e) => self.report(&e),
        }
    }

    fn list_projects(&mut self, include_archived: bool) -> io::Result<Flow> {
        let projects = if include_archived {
            self.tracker.list_all_projects()
        } else {
            self.tracker.list_active_projects()
        };
        match projects {
            Ok(projects) => self.print_projects(&projects)?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn print_projects(&mut self, projects: &[Project]) -> io::Result<()> {
        if projects.is_empty() {
            return writeln!(self.output, "No projects yet.");
        }
        writeln!(self.output, "Projects:")?;
        for project in projects {
            let archived = if project.archived { " [archived]" } else { "" };
            writeln!(
                self.output,
                "[{}] {}{}",
                project.id.unwrap_or_default(),
                project.name,
                archived
            )?;
        }
        Ok(())
    }

    fn create_project(&mut self) -> io::Result<Flow> {
        let Some(name) = self.ask_project_name("Project name: ")? else {
            return Ok(Flow::Continue);
        };
        let Some(description) = self.ask_description("Description (optional): ")? else {
            return Ok(Flow::Continue);
        };

        match self.tracker.create_project(&name, &description) {
            Ok(project) => writeln!(
                self.output,
                "Project '{}' created with id {}.",
                project.name,
                project.id.unwrap_or_default()
            )?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn open_project(&mut self) -> io::Result<Flow> {
        self.list_projects(false)?;
        let Some(id) = self.ask_id("Project id: ")? else {
            return Ok(Flow::Continue);
        };
        self.project_menu(id)
    }

    fn start_session(&mut self) -> io::Result<Flow> {
        self.list_projects(false)?;
        let Some(id) = self.ask_id("Project id to start a session on: ")? else {
            return Ok(Flow::Continue);
        };
        let Some(description) = self.prompt("Session description (optional): ")? else {
            return Ok(Flow::Continue);
        };

        match self.tracker.start_session(id, Some(&description)) {
            Ok(session) => writeln!(
                self.output,
                "Work session started at {}.",
                session.start_time.format("%H:%M:%S")
            )?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn stop_session(&mut self) -> io::Result<Flow> {
        match self.tracker.stop_session() {
            Ok(session) => self.print_stopped(&session)?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    // ============================================================
    // Project menu
    // ============================================================

    fn project_menu(&mut self, id: i64) -> io::Result<Flow> {
        loop {
            let mut project = match self.tracker.load_project(id) {
                Ok(project) => project,
                Err(e) => {
                    self.report(&e)?;
                    return Ok(Flow::Continue);
                }
            };

            self.print_project_menu(&project)?;
            let Some(choice) = self.prompt("Select an option (1-7): ")? else {
                return Ok(Flow::Quit);
            };

            match choice.as_str() {
                "1" => self.start_in_project(&mut project)?,
                "2" => self.stop_in_project(&mut project)?,
                "3" => self.print_sessions(&project)?,
                "4" => self.edit_project(&mut project)?,
                "5" => self.export_project(&project)?,
                "6" => {
                    if self.archive_project(&mut project)? {
                        return Ok(Flow::Continue);
                    }
                }
                "7" => return Ok(Flow::Continue),
                _ => writeln!(self.output, "Invalid choice, try again.")?,
            }
        }
    }

    fn print_project_menu(&mut self, project: &Project) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        let archived = if project.archived { " [archived]" } else { "" };

        writeln!(self.output)?;
        writeln!(self.output, "{}", rule)?;
        writeln!(self.output, " PROJECT: {}{}", project.name, archived)?;
        writeln!(self.output, " Id: {}", project.id.unwrap_or_default())?;
        if !project.description.is_empty() {
            writeln!(self.output, " Description: {}", project.description)?;
        }
        writeln!(
            self.output,
            " Sessions: {}, total {}",
            project.sessions.len(),
            project.total_duration_label()
        )?;
        writeln!(self.output, "{}", rule)?;

        match project.active_session() {
            Some(active) => writeln!(
                self.output,
                " Running since {}, {}",
                active.start_time.format("%H:%M:%S"),
                active.elapsed()
            )?,
            None => writeln!(self.output, " No running work session")?,
        }
        writeln!(self.output, "{}", "-".repeat(RULE_WIDTH))?;

        for option in [
            "1. Start work session",
            "2. Stop work session",
            "3. Show work sessions",
            "4. Edit project",
            "5. Export report (CSV)",
            "6. Archive project",
            "7. Back to main menu",
        ] {
            writeln!(self.output, "{}", option)?;
        }
        Ok(())
    }

    fn start_in_project(&mut self, project: &mut Project) -> io::Result<()> {
        let Some(description) = self.prompt("Session description (optional): ")? else {
            return Ok(());
        };
        match self.tracker.sessions().start_in(project, Some(&description)) {
            Ok(session) => writeln!(
                self.output,
                "Work session started at {}.",
                session.start_time.format("%H:%M:%S")
            ),
            Err(e) => self.report(&e),
        }
    }

    fn stop_in_project(&mut self, project: &mut Project) -> io::Result<()> {
        match self.tracker.sessions().stop_in(project) {
            Ok(session) => self.print_stopped(&session),
            Err(e) => self.report(&e),
        }
    }

    fn print_sessions(&mut self, project: &Project) -> io::Result<()> {
        if project.sessions.is_empty() {
            return writeln!(self.output, "No work sessions recorded yet.");
        }

        let mut sessions: Vec<&WorkSession> = project.sessions.iter().collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        writeln!(self.output, "Work sessions for '{}':", project.name)?;
        writeln!(
            self.output,
            "{:<17} {:<17} {:<12} Description",
            "Start", "End", "Duration"
        )?;
        for session in sessions {
            let elapsed = session.elapsed();
            let end = session
                .end_time
                .map(|t| t.format("%d/%m/%Y %H:%M").to_string())
                .unwrap_or_else(|| "running".to_string());
            let duration = if elapsed.active {
                format!("{} (running)", elapsed)
            } else {
                elapsed.label()
            };
            writeln!(
                self.output,
                "{:<17} {:<17} {:<12} {}",
                session.start_time.format("%d/%m/%Y %H:%M"),
                end,
                duration,
                session.description.as_deref().unwrap_or("-")
            )?;
        }
        writeln!(
            self.output,
            "Total (ended sessions): {}",
            format_duration(project.total_duration())
        )
    }

    fn edit_project(&mut self, project: &mut Project) -> io::Result<()> {
        writeln!(self.output, "Current name: {}", project.name)?;
        let Some(name) = self.prompt("New name (empty keeps the current one): ")? else {
            return Ok(());
        };
        if !name.is_empty() {
            let result = validate::project_name(&name)
                .and_then(|name| self.tracker.projects().rename(project, &name));
            if let Err(e) = result {
                return self.report(&e);
            }
        }

        let current = if project.description.is_empty() {
            "(empty)".to_string()
        } else {
            project.description.clone()
        };
        writeln!(self.output, "Current description: {}", current)?;
        let Some(text) = self.prompt("New description (empty keeps the current one): ")? else {
            return Ok(());
        };
        if !text.is_empty() {
            let result = validate::description(&text)
                .and_then(|text| self.tracker.projects().set_description(project, &text));
            if let Err(e) = result {
                return self.report(&e);
            }
        }

        writeln!(self.output, "Project updated.")
    }

    fn export_project(&mut self, project: &Project) -> io::Result<()> {
        match report::export_project(project, &self.export_dir) {
            Ok(path) => writeln!(self.output, "Report written to {}", path.display()),
            Err(e) => self.report(&e),
        }
    }

    /// Returns whether the project ended up archived.
    fn archive_project(&mut self, project: &mut Project) -> io::Result<bool> {
        if project.archived {
            writeln!(self.output, "This project is already archived.")?;
            return Ok(true);
        }

        let question = format!("Archive '{}'? (y/N): ", project.name);
        let Some(answer) = self.prompt(&question)? else {
            return Ok(false);
        };
        if !validate::confirmation(&answer, false) {
            writeln!(self.output, "Archiving cancelled.")?;
            return Ok(false);
        }

        match self.tracker.projects().archive(project) {
            Ok(()) => {
                writeln!(self.output, "Project '{}' archived.", project.name)?;
                Ok(true)
            }
            Err(e) => {
                self.report(&e)?;
                Ok(false)
            }
        }
    }

    // ============================================================
    // Prompt helpers
    // ============================================================

    /// Read one trimmed line. `None` when input has ended.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask_project_name(&mut self, label: &str) -> io::Result<Option<String>> {
        self.ask_until_valid(label, validate::project_name)
    }

    fn ask_description(&mut self, label: &str) -> io::Result<Option<String>> {
        self.ask_until_valid(label, validate::description)
    }

    fn ask_id(&mut self, label: &str) -> io::Result<Option<i64>> {
        self.ask_until_valid(label, validate::id)
    }

    fn ask_until_valid<T>(
        &mut self,
        label: &str,
        check: impl Fn(&str) -> crate::Result<T>,
    ) -> io::Result<Option<T>> {
        for attempt in 1..=MAX_ATTEMPTS {
            let Some(input) = self.prompt(label)? else {
                return Ok(None);
            };
            match check(&input) {
                Ok(value) => return Ok(Some(value)),
                Err(e) if attempt < MAX_ATTEMPTS => {
                    writeln!(self.output, "{} ({} attempt(s) left)", e, MAX_ATTEMPTS - attempt)?
                }
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
        writeln!(self.output, "Too many invalid attempts.")?;
        Ok(None)
    }

    fn print_stopped(&mut self, session: &WorkSession) -> io::Result<()> {
        writeln!(
            self.output,
            "Work session stopped, duration {}.",
            session.elapsed()
        )
    }

    fn report(&mut self, err: &Error) -> io::Result<()> {
        if !err.is_recoverable() {
            tracing::error!("{}", err);
        }
        writeln!(self.output, "Error: {}", err)
    }
}
