use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "leanboard")]
#[command(about = "Replay a kanban board fixture and report overloaded lists", long_about = None)]
pub struct Cli {
    /// Fixture file: a `board` and optional scripted `steps`
    pub fixture: PathBuf,

    /// Monitor settings file (JSON)
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Write rotating logs under this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, requires = "log_dir")]
    pub log_level: Option<String>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    /// One JSON object per report line
    Json,
}
