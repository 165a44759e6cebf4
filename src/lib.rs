#![warn(missing_docs)]

//! Stereo sine playback at several sample rates through PortAudio
//!
//! The crate wraps the parts of PortAudio needed to open callback streams on a chosen device,
//! including the CoreAudio settings that make the hardware switch its sample rate, and plays a
//! wavetable sine with a different pitch on each channel.
//!
//! # Example
//!
//! ```no_run
//! use sine_srate::config::Config;
//!
//! let config = Config { sample_rates: vec![44100.0, 48000.0], seconds: 1, ..Config::default() };
//! if let Err(e) = sine_srate::playback::run(&config)
//! {
//!     eprintln!("{}", e);
//! }
//! ```

#[macro_use] extern crate log;
#[macro_use] extern crate bitflags;
extern crate portaudio_sys as ll;

pub use crate::pa::{PaError, PaResult, initialize, terminate, version, version_text};

pub mod config;
pub mod device;
pub mod hostapi;
pub mod pa;
pub mod playback;
pub mod sine;
pub mod stream;

mod util;
