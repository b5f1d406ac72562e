mod config;
mod driver;
mod shader;

use std::process::ExitCode;

use anyhow::Context;
use config::Config;
use shader::ExternalValidator;

#[macro_use]
extern crate tracing;

fn main() -> anyhow::Result<ExitCode> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let paths = driver::resolve_paths(&config.paths, &config.extensions)
        .context("could not collect files to check")?;

    if config.list {
        let count = driver::list(&paths, &mut std::io::stdout().lock())?;
        info!(count, "listed shaders");
        return Ok(ExitCode::SUCCESS);
    }

    let validator = config
        .validator_args
        .iter()
        .fold(ExternalValidator::new(&config.validator), |validator, arg| {
            validator.arg(arg)
        });
    debug!(program = %validator.program().display(), files = paths.len(), "checking shaders");

    let has_errors = driver::run(&paths, &validator, &mut std::io::stderr().lock())?;

    Ok(if has_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
