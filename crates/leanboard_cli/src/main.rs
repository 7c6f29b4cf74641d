//! `leanboard` command-line entry point.
//!
//! # Responsibility
//! - Load a board fixture and optional monitor settings.
//! - Replay the fixture against the in-memory page and print list status.

mod args;
mod report;
mod scenario;

use args::{Cli, Format};
use clap::Parser;
use leanboard_core::{
    default_log_level, init_logging, LogLevel, LoggingError, MonitorSettings, SettingsError,
};
use log::error;
use report::StepReport;
use scenario::{ScenarioError, ScenarioFile, ScenarioRunner};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::process::ExitCode;

#[derive(Debug)]
enum CliError {
    Logging(LoggingError),
    Settings(SettingsError),
    Scenario(ScenarioError),
    Output(std::io::Error),
    Render(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "{err}"),
            Self::Settings(err) => write!(f, "{err}"),
            Self::Scenario(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to write report: {err}"),
            Self::Render(err) => write!(f, "failed to render report: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Settings(err) => Some(err),
            Self::Scenario(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::Render(err) => Some(err),
        }
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<SettingsError> for CliError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

impl From<ScenarioError> for CliError {
    fn from(value: ScenarioError) -> Self {
        Self::Scenario(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Output(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Render(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("leanboard: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    if let Some(log_dir) = &cli.log_dir {
        let level = match &cli.log_level {
            Some(value) => LogLevel::parse(value)?,
            None => default_log_level(),
        };
        let log_dir = std::path::absolute(log_dir)
            .map_err(|err| LoggingError::InvalidDirectory(err.to_string()))?;
        init_logging(level, &log_dir)?;
    }

    let settings = match &cli.settings {
        Some(path) => MonitorSettings::load(path)?,
        None => MonitorSettings::default(),
    };
    let fixture = ScenarioFile::load(&cli.fixture)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut runner = ScenarioRunner::start(&fixture.board, settings)?;
    emit(&mut out, cli.format, "load".to_string(), &runner)?;

    for step in &fixture.steps {
        runner.apply(step)?;
        emit(&mut out, cli.format, step.label(), &runner)?;
    }
    runner.finish();
    Ok(())
}

fn emit(
    out: &mut impl Write,
    format: Format,
    step: String,
    runner: &ScenarioRunner,
) -> Result<(), CliError> {
    let report = StepReport {
        step,
        switches: runner.switch_count(),
        lists: runner.snapshots(),
    };
    match format {
        Format::Text => write!(out, "{}", report.render_text())?,
        Format::Json => writeln!(out, "{}", report.render_json()?)?,
    }
    Ok(())
}
