mod ledger;
mod market;
mod signal;

use capewatch_core::{LedgerConfig, Pipeline, PipelineConfig};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Output of one command: the JSON document and its text rendering.
pub struct CommandResult {
    pub data: Value,
    pub lines: Vec<String>,
}

impl CommandResult {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn with_lines(mut self, lines: impl IntoIterator<Item = String>) -> Self {
        self.lines.extend(lines);
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let pipeline = Pipeline::from_config(&pipeline_config(cli));

    match &cli.command {
        Command::Market => market::run(&pipeline).await,
        Command::Signal => signal::run(&pipeline).await,
        Command::Ledger(command) => ledger::run(command, &pipeline, &ledger_config(cli)).await,
    }
}

fn pipeline_config(cli: &Cli) -> PipelineConfig {
    let mut config = PipelineConfig::from_env();
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config
}

fn ledger_config(cli: &Cli) -> LedgerConfig {
    let mut config = LedgerConfig::from_env();
    if let Some(dir) = &cli.ledger_dir {
        config.dir = dir.clone();
    }
    config
}
