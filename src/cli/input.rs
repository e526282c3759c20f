use anyhow::{anyhow, Result};

use crate::dashboard::command::DashboardCommand;

/// A line typed into the interactive dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(DashboardCommand),
    Status,
    Projects,
    Help,
    Quit,
}

pub const HELP: &str = "Commands: start [project], pause, resume, stop, status, projects, help, quit";

/// Parses a line of user input. Blank lines give None.
pub fn parse_input(line: &str) -> Result<Option<Input>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match (word.to_lowercase().as_str(), rest) {
        ("start" | "s", project) => Input::Command(DashboardCommand::Start {
            project: (!project.is_empty()).then(|| project.into()),
        }),
        ("pause" | "p", "") => Input::Command(DashboardCommand::Pause),
        ("resume" | "r", "") => Input::Command(DashboardCommand::Resume),
        ("stop", "") => Input::Command(DashboardCommand::Stop),
        ("status", "") => Input::Status,
        ("projects", "") => Input::Projects,
        ("help" | "?", "") => Input::Help,
        ("quit" | "exit" | "q", "") => Input::Quit,
        (_, "") => return Err(anyhow!("Unknown command {word}. {HELP}")),
        (_, rest) => return Err(anyhow!("Unexpected arguments for {word}: {rest}")),
    };
    Ok(Some(input))
}
