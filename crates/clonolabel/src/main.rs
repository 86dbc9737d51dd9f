use anyhow::Result;
use clap::{Parser, ValueEnum};
use clonolabel::args::AnnotateArgs;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum LoggingMode {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl From<LoggingMode> for logutil::LoggingMode {
    fn from(mode: LoggingMode) -> Self {
        match mode {
            LoggingMode::Pretty => logutil::LoggingMode::Pretty,
            LoggingMode::Json => logutil::LoggingMode::Json,
            LoggingMode::Compact => logutil::LoggingMode::Compact,
        }
    }
}

#[derive(Parser)]
#[clap(name = "clonolabel")]
#[clap(version)]
#[clap(about = "Label clonotypes using an annotation script", long_about = None)]
struct Cli {
    /// Log verbosity.
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format.
    #[clap(long, value_enum)]
    log_mode: Option<LoggingMode>,

    #[clap(flatten)]
    args: AnnotateArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logutil::init(cli.verbose, cli.log_mode.unwrap_or_default().into());

    info!(version = env!("CARGO_PKG_VERSION"), "starting...");

    cli.args.run()
}
