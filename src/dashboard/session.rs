use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use std::str::FromStr;
use tracing::info;

use crate::dashboard::{Dashboard, FilterControls, Views};
use crate::models::SalesTable;

pub const HELP: &str = "\
Commands:
  start <YYYY-MM-DD>         set the start date
  end <YYYY-MM-DD>           set the end date
  category <name>            toggle a category
  categories all|none        select every category / clear the selection
  status <name>              toggle a courier status
  statuses all|none          select every status / clear the selection
  show                       redraw the dashboard
  export                     write the current views to the export directory
  reset                      restore the initial filters
  help                       show this message
  quit                       leave the session
An empty category or status selection shows every row.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bulk {
    All,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(NaiveDate),
    End(NaiveDate),
    Category(String),
    Categories(Bulk),
    Status(String),
    Statuses(Bulk),
    Show,
    Export,
    Reset,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (keyword, argument) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        let command = match keyword.to_lowercase().as_str() {
            "start" => Command::Start(parse_iso_date(argument)?),
            "end" => Command::End(parse_iso_date(argument)?),
            "category" => Command::Category(required(argument, "category")?),
            "categories" => Command::Categories(parse_bulk(argument)?),
            "status" => Command::Status(required(argument, "status")?),
            "statuses" => Command::Statuses(parse_bulk(argument)?),
            "show" => Command::Show,
            "export" => Command::Export,
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            "" => bail!("Empty command, type 'help' for the command list"),
            other => bail!("Unknown command '{}', type 'help' for the command list", other),
        };

        Ok(command)
    }
}

fn parse_iso_date(argument: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(argument, "%Y-%m-%d")
        .with_context(|| format!("Expected a date like 2022-04-30, got '{}'", argument))
}

fn parse_bulk(argument: &str) -> Result<Bulk> {
    match argument.to_lowercase().as_str() {
        "all" => Ok(Bulk::All),
        "none" | "clear" => Ok(Bulk::None),
        other => Err(anyhow!("Expected 'all' or 'none', got '{}'", other)),
    }
}

fn required(argument: &str, what: &str) -> Result<String> {
    if argument.is_empty() {
        bail!("Missing {} name", what);
    }
    Ok(argument.to_string())
}

/// What the caller should do after a command.
#[derive(Debug)]
pub enum SessionEvent {
    Rendered(Box<Views>),
    Message(String),
    Export(Box<Views>),
    Quit,
}

/// One viewer's sidebar state over the shared dashboard. Every filter change
/// re-renders synchronously before the next command is read.
pub struct DashboardSession {
    dashboard: Dashboard,
    controls: FilterControls,
    initial: FilterControls,
}

impl DashboardSession {
    pub fn new(dashboard: Dashboard, controls: FilterControls) -> Self {
        DashboardSession {
            dashboard,
            initial: controls.clone(),
            controls,
        }
    }

    pub fn controls(&self) -> &FilterControls {
        &self.controls
    }

    pub fn current(&self) -> Result<Views> {
        self.dashboard.render(&self.controls.selection()?)
    }

    pub fn filtered(&self) -> Result<SalesTable> {
        self.dashboard.filtered(&self.controls.selection()?)
    }

    pub fn handle(&mut self, line: &str) -> Result<SessionEvent> {
        let command: Command = line.parse()?;
        self.execute(command)
    }

    pub fn execute(&mut self, command: Command) -> Result<SessionEvent> {
        match command {
            Command::Start(date) => {
                let applied = self.controls.set_start(date);
                info!("Start date set to {}", applied);
            }
            Command::End(date) => {
                let applied = self.controls.set_end(date);
                info!("End date set to {}", applied);
            }
            Command::Category(name) => {
                let selected = self.controls.toggle_category(&name)?;
                info!("Category '{}' {}", name, if selected { "selected" } else { "deselected" });
            }
            Command::Categories(Bulk::All) => self.controls.select_all_categories(),
            Command::Categories(Bulk::None) => self.controls.clear_categories(),
            Command::Status(name) => {
                let selected = self.controls.toggle_status(&name)?;
                info!("Status '{}' {}", name, if selected { "selected" } else { "deselected" });
            }
            Command::Statuses(Bulk::All) => self.controls.select_all_statuses(),
            Command::Statuses(Bulk::None) => self.controls.clear_statuses(),
            Command::Reset => self.controls = self.initial.clone(),
            Command::Show => {}
            Command::Export => return Ok(SessionEvent::Export(Box::new(self.current()?))),
            Command::Help => return Ok(SessionEvent::Message(HELP.to_string())),
            Command::Quit => return Ok(SessionEvent::Quit),
        }

        Ok(SessionEvent::Rendered(Box::new(self.current()?)))
    }
}
