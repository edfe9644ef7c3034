#![warn(clippy::unwrap_used, clippy::expect_used)]

use fractal::config::{Config, FractalCommand, LogFormat};
use fractal::dao::{Dao, DaoConfig, Report};
use fractal::errors::{AppError, Result};
use fractal::scenario::Scenario;
use std::io::Write;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.directive())?;
    // stdout carries the report lines
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }

    Ok(())
}

/// `err` followed by its chain of sources
fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn run(config: &DaoConfig, scenario: &Path, keep_going: bool, salt: u64) -> Result<()> {
    let scenario = Scenario::load(scenario)?;
    let mut dao = Dao::new(config, salt)?;
    let mut out = std::io::stdout().lock();

    let mut failed = 0;
    for (index, step) in scenario.steps.into_iter().enumerate() {
        let outcome = dao.apply(step);

        for report in dao.drain_reports() {
            writeln!(out, "{}", serde_json::to_string(&report)?)?;
        }

        if let Err(err) = outcome {
            error!(step = index, error = ?err, "step failed");
            if !keep_going {
                return Err(AppError::Step { index, source: err });
            }

            failed += 1;
            let report = Report::Failed {
                step: index,
                error: describe(&err),
            };
            writeln!(out, "{}", serde_json::to_string(&report)?)?;
        }
    }

    info!(failed, block = dao.block_number(), "scenario finished");
    Ok(())
}

fn main() -> Result<()> {
    let config = Config::new()?;
    init_tracing(&config)?;

    let dao_config = DaoConfig::from(&config);
    match &config.command {
        Some(FractalCommand::Run {
            scenario,
            keep_going,
            salt,
        }) => run(&dao_config, scenario, *keep_going, *salt),
        Some(FractalCommand::Predict { salt }) => {
            println!("{}", Dao::predict_azorius(&dao_config, *salt)?);
            Ok(())
        }
        None => Err(AppError::MissingCommand),
    }
}
