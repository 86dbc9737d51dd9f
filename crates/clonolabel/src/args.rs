use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use clonolabel_core::annotate::{AnnotateJob, Annotator};
use clonolabel_core::config::AnnotateConfig;
use tracing::info;

#[derive(Debug, Clone, Parser)]
pub struct AnnotateArgs {
    /// Clonotype properties table, one row per clonotype.
    #[clap(long)]
    pub clonotype_data: Option<PathBuf>,

    /// JSON schema for the clonotype properties table.
    #[clap(long)]
    pub clonotype_schema: Option<PathBuf>,

    /// Sample-clonotype properties table, one row per sample and clonotype.
    ///
    /// Required when the script's mode is 'bySampleAndClonotype'.
    #[clap(long)]
    pub sample_clonotype_data: Option<PathBuf>,

    /// JSON schema for the sample-clonotype properties table.
    #[clap(long)]
    pub sample_clonotype_schema: Option<PathBuf>,

    /// Annotation script.
    #[clap(long, required_unless_present = "list_settings")]
    pub script: Option<PathBuf>,

    /// Where to write the labeled table.
    #[clap(long, required_unless_present_any = ["explain", "list_settings"])]
    pub output: Option<PathBuf>,

    /// Print the plan instead of running it. No data files are read.
    #[clap(long)]
    pub explain: bool,

    /// Override a setting. May be repeated.
    #[clap(long = "set", value_name = "NAME=VALUE")]
    pub settings: Vec<String>,

    /// Print all settings with their values and exit.
    #[clap(long)]
    pub list_settings: bool,
}

impl AnnotateArgs {
    pub fn config(&self) -> Result<AnnotateConfig> {
        let mut config = AnnotateConfig::default();
        for pair in &self.settings {
            config.set_pair(pair)?;
        }
        Ok(config)
    }

    pub fn run(self) -> Result<()> {
        let config = self.config()?;
        let mut stdout = io::stdout().lock();

        if self.list_settings {
            for (name, value, description) in config.describe() {
                writeln!(stdout, "{name}\t{value}\t{description}")?;
            }
            return Ok(());
        }

        let script = self
            .script
            .ok_or_else(|| anyhow!("'--script' is required"))?;
        let job = AnnotateJob {
            clonotype_data: self.clonotype_data,
            clonotype_schema: self.clonotype_schema,
            sample_data: self.sample_clonotype_data,
            sample_schema: self.sample_clonotype_schema,
            script,
            output: self.output.unwrap_or_default(),
        };
        let annotator = Annotator::new(config);

        if self.explain {
            write!(stdout, "{}", job.explain(&annotator)?)?;
            return Ok(());
        }

        let rows = job.execute(&annotator)?;
        info!(rows, output = %job.output.display(), "done");

        Ok(())
    }
}
