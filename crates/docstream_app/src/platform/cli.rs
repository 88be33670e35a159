use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use docstream_core::ViewMode;
use engine_logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "docstream",
    version,
    about = "Upload PDF files for processing and follow the results as they stream back"
)]
pub struct Cli {
    /// PDF files to upload as one batch
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Upload endpoint (overrides the config file)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Custom prompt sent along with the files
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// How the selected result is displayed
    #[arg(long, value_enum, default_value_t = ViewArg::Json)]
    pub view: ViewArg,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogArg::File)]
    pub log: LogArg,

    /// Log at debug level regardless of the configured level
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file (defaults to ./docstream.ron when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    Json,
    Table,
}

impl From<ViewArg> for ViewMode {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Json => ViewMode::Json,
            ViewArg::Table => ViewMode::Table,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogArg {
    Terminal,
    File,
    Both,
}

impl From<LogArg> for LogDestination {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::File => LogDestination::File,
            LogArg::Both => LogDestination::Both,
        }
    }
}
