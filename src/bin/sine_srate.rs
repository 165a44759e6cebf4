use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use simple_logger::SimpleLogger;
use sine_srate::config::Config;
use sine_srate::playback::{self, PlaybackError};

fn main() -> ExitCode
{
    let config = Config::parse();

    match run(&config)
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) =>
        {
            report(&e);
            ExitCode::FAILURE
        },
    }
}

fn run(config: &Config) -> Result<()>
{
    SimpleLogger::new()
        .with_level(config.log_level())
        .init()
        .context("installing the logger")?;

    if config.list
    {
        playback::list_devices()?;
    }
    else
    {
        playback::run(config)?;
    }
    Ok(())
}

fn report(e: &anyhow::Error)
{
    match e.downcast_ref::<PlaybackError>()
    {
        Some(failure) => eprint!("{}", failure.report()),
        None => eprintln!("Error: {:?}", e),
    }
}
