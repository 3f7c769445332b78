use std::io::{self, BufRead, Write};

use crossterm::style::Stylize;
use serde::Serialize;

use crate::app::{
    BatchResult, ExportResult, ProgressEvent, ProgressSink, ProgressSinkKind, RunResult,
    SearchResult,
};
use crate::domain::{OutcomeStatus, Provider};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_search(result: &SearchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_export(result: &ExportResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Coloured progress lines on stderr, summaries on stdout.
pub struct ConsoleOutput {
    kind: ProgressSinkKind,
}

impl ConsoleOutput {
    pub fn new(kind: ProgressSinkKind) -> Self {
        Self { kind }
    }

    fn label(&self) -> &'static str {
        match self.kind {
            ProgressSinkKind::Search => "search",
            ProgressSinkKind::Export => "export",
            ProgressSinkKind::Download => "download",
        }
    }

    pub fn print_table(result: &SearchResult) {
        let table = &result.table;
        println!(
            "{}",
            format!("{} phytochemicals for {}", table.len(), result.plant).cyan()
        );
        println!("{}", table.columns.join(" | ").bold());
        for record in &table.records {
            let cells: Vec<&str> = record.fields.iter().map(|(_, v)| v.as_str()).collect();
            println!("{}", cells.join(" | "));
        }
    }

    pub fn print_export(result: &ExportResult) {
        println!(
            "{} {} compounds for {}",
            "saved".green(),
            result.compounds,
            result.plant
        );
        println!("   spreadsheet: {}", result.spreadsheet);
    }

    pub fn print_batch(result: &BatchResult) {
        println!("{}", format!("structures from {}", result.provider).cyan());
        for outcome in &result.outcomes {
            let line = match (&outcome.status, &outcome.reason) {
                (OutcomeStatus::Failed, Some(reason)) => format!("{}: {reason}", outcome.key),
                _ => outcome.key.clone(),
            };
            match outcome.status {
                OutcomeStatus::Succeeded => println!("{} {line}", "downloaded".green()),
                OutcomeStatus::Skipped => println!("{} {line}", "present   ".yellow()),
                OutcomeStatus::Failed => println!("{} {line}", "failed    ".red()),
            }
        }
        println!(
            "{} downloaded, {} already present, {} failed -> {}",
            result.succeeded.to_string().green(),
            result.skipped.to_string().yellow(),
            result.failed.to_string().red(),
            result.workspace
        );
    }

    /// Asks which database to pull structures from; an empty answer picks
    /// `default`.
    pub fn prompt_provider(default: Provider) -> io::Result<Provider> {
        let stdin = io::stdin();
        let mut stderr = io::stderr();
        loop {
            write!(
                stderr,
                "Choose database for 3D SDF [pubchem/imppat] ({default}): "
            )?;
            stderr.flush()?;
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Ok(default);
            }
            let answer = line.trim();
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<Provider>() {
                Ok(provider) => return Ok(provider),
                Err(err) => writeln!(stderr, "{}", err.to_string().red())?,
            }
        }
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        let message = event
            .message
            .split_once("; ")
            .filter(|(head, _)| head.starts_with("phase="))
            .map(|(_, rest)| rest.to_string())
            .unwrap_or(event.message);
        let elapsed = event
            .elapsed
            .map(|d| format!(" ({} ms)", d.as_millis()))
            .unwrap_or_default();
        eprintln!("{} {message}{}", format!("[{}]", self.label()).dark_grey(), elapsed.dark_grey());
    }
}
