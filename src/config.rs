//! Command line configuration

use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::time::Duration;

/// Sample rates played in turn when none are given
pub const DEFAULT_SAMPLE_RATES: [f64; 2] = [44100.0, 48000.0];

/// Play a stereo sine wave at several sample rates in a row
///
/// On macOS the CoreAudio device is asked to switch its hardware rate for every stream.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "sine_srate", version)]
pub struct Config
{
    /// Sample rates to play, in order
    #[arg(short = 'r', long = "rate", value_name = "HZ", value_delimiter = ',',
          value_parser = parse_sample_rate, default_values_t = DEFAULT_SAMPLE_RATES)]
    pub sample_rates: Vec<f64>,

    /// Seconds to play at each rate
    #[arg(short, long, value_name = "N", default_value_t = 5,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub seconds: u64,

    /// Frames per callback, 0 lets the host decide
    #[arg(short = 'b', long, value_name = "N", default_value_t = 64)]
    pub frames_per_buffer: u32,

    /// Output device index instead of the default output device
    #[arg(short, long, value_name = "INDEX")]
    pub device: Option<u32>,

    /// List host APIs and devices, then exit
    #[arg(short, long)]
    pub list: bool,

    /// More log output, repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config
{
    /// Time to play at each rate
    pub fn play_time(&self) -> Duration
    {
        Duration::from_secs(self.seconds)
    }

    /// Log level picked by the number of `-v` flags
    pub fn log_level(&self) -> LevelFilter
    {
        match self.verbose
        {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

impl Default for Config
{
    fn default() -> Config
    {
        Config
        {
            sample_rates: DEFAULT_SAMPLE_RATES.to_vec(),
            seconds: 5,
            frames_per_buffer: 64,
            device: None,
            list: false,
            verbose: 0,
        }
    }
}

fn parse_sample_rate(value: &str) -> Result<f64, String>
{
    let rate: f64 = value.trim().parse().map_err(|_| format!("`{}` is not a number", value))?;
    if rate.is_finite() && rate > 0.0
    {
        Ok(rate)
    }
    else
    {
        Err(format!("sample rate must be positive, got {}", value))
    }
}
