//! Workflow glue for `mbatch run`.

use anyhow::{anyhow, Context, Result};

use crate::cli::RunArgs;
use crate::config;
use crate::engine::CommandEngine;
use crate::orchestrator::Orchestrator;

/// Build a configured orchestrator from CLI args and run the batch.
pub fn run_batch(args: &RunArgs) -> Result<()> {
    let config = config::resolve(args)?;
    let command = config.engine_command.as_deref().ok_or_else(|| {
        anyhow!("no engine configured; pass --engine or set engine_command in the config file")
    })?;
    let engine = CommandEngine::new(
        command,
        config.report_dir.clone(),
        config.report_suffix.clone(),
        config.primary_ext.clone(),
        config.engine_timeout_secs,
    )
    .context("configure analysis engine")?;

    let orchestrator = Orchestrator::new(config, Box::new(engine));
    orchestrator.run()?;
    println!("batch complete");
    Ok(())
}
