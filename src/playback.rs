//! Plays the stereo test tone once per configured sample rate

use crate::config::Config;
use crate::device::{self, DeviceIndex};
use crate::hostapi::{self, HostApiSpecificStreamInfo};
use crate::pa::{self, PaError, PaResult};
use crate::sine::StereoSine;
use crate::stream::{self, Stream, StreamCallback, StreamCallbackResult, StreamFlags, StreamParameters};
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Stereo output
pub const CHANNELS: u32 = 2;

/// Generator shared by the streams of one run
pub type SharedSine = Arc<Mutex<StereoSine>>;

/// Errors that end a playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError
{
    /// A PortAudio call failed
    PortAudio(PaError),

    /// No device was configured and PortAudio has no default output
    NoDefaultOutputDevice,

    /// PortAudio returned no info for the device
    DeviceInfoUnavailable(DeviceIndex),
}

impl PlaybackError
{
    /// PortAudio error number, `paNoError` when PortAudio itself did not fail
    pub fn code(&self) -> i32
    {
        match *self
        {
            PlaybackError::PortAudio(e) => e.code(),
            _ => 0,
        }
    }

    /// The failure report printed on stderr
    ///
    /// Failures outside PortAudio get their own line first, then every failure ends with the
    /// error number and PortAudio's text for it.
    pub fn report(&self) -> String
    {
        let mut report = String::new();
        if !matches!(*self, PlaybackError::PortAudio(_))
        {
            report.push_str(&format!("Error: {}\n", self));
        }
        report.push_str("An error occured while using the portaudio stream\n");
        report.push_str(&format!("Error number: {}\n", self.code()));
        report.push_str(&format!("Error message: {}\n", pa::error_text(self.code())));
        report
    }
}

impl fmt::Display for PlaybackError
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match *self
        {
            PlaybackError::PortAudio(e) => write!(f, "{}", e),
            PlaybackError::NoDefaultOutputDevice => write!(f, "No default output device."),
            PlaybackError::DeviceInfoUnavailable(i) => write!(f, "No info for device {}.", i),
        }
    }
}

impl Error for PlaybackError
{
    fn source(&self) -> Option<&(dyn Error + 'static)>
    {
        match *self
        {
            PlaybackError::PortAudio(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<PaError> for PlaybackError
{
    fn from(e: PaError) -> PlaybackError
    {
        if e == PaError::UnanticipatedHostError
        {
            if let Some(info) = hostapi::get_last_error()
            {
                warn!("host error {} from {:?}: {}", info.code, info.api_type, info.text);
            }
        }
        PlaybackError::PortAudio(e)
    }
}

/// Initialize PortAudio, play every configured rate in order, terminate.
///
/// PortAudio is terminated on the error path as well. One generator is shared by all rates, so
/// each stream continues the waveform where the previous one stopped.
pub fn run(config: &Config) -> Result<(), PlaybackError>
{
    let sine = Arc::new(Mutex::new(StereoSine::new()));

    with_portaudio(pa::initialize,
                   || play_all(&config.sample_rates, &sine, |rate, callback| play_at_rate(config, rate, callback)),
                   pa::terminate)?;
    println!("Test finished.");
    Ok(())
}

/// Print the PortAudio version, host APIs and devices.
pub fn list_devices() -> Result<(), PlaybackError>
{
    with_portaudio(pa::initialize, print_info, pa::terminate)
}

/// Run `body` between `initialize` and `terminate`
///
/// `terminate` runs whenever `initialize` succeeded. An error from `body` wins over one from
/// `terminate`.
fn with_portaudio<T, I, B, E>(initialize: I, body: B, terminate: E) -> Result<T, PlaybackError>
    where I: FnOnce() -> PaResult,
          B: FnOnce() -> Result<T, PlaybackError>,
          E: FnOnce() -> PaResult
{
    initialize()?;
    let result = body();
    let terminated = terminate();

    let value = result?;
    terminated?;
    Ok(value)
}

/// Audio callback writing the shared generator into each buffer
///
/// Only the audio thread locks the generator while a stream runs. Should the lock be taken
/// anyway the buffer is silenced rather than waited for.
pub fn tone_callback(sine: SharedSine) -> StreamCallback<f32>
{
    Box::new(move |_input: &[f32], output: &mut [f32], _time: stream::StreamTimeInfo, _flags: stream::StreamCallbackFlags| -> StreamCallbackResult
    {
        match sine.try_lock()
        {
            Ok(mut sine) => sine.fill(output),
            Err(_) => output.iter_mut().for_each(|s| *s = 0.0),
        }
        StreamCallbackResult::Continue
    })
}

fn print_info() -> Result<(), PlaybackError>
{
    println!("version: {} \"{}\"", pa::version(), pa::version_text());

    let default_api = hostapi::get_default_index().ok();
    for i in 0 .. hostapi::get_count()?
    {
        let marker = if Some(i) == default_api { "*" } else { " " };
        match hostapi::get_info(i)
        {
            None => println!("{}api {}: ???", marker, i),
            Some(ha) => println!("{}api {}: {} ({} devices)", marker, i, ha.name, ha.device_count),
        }
    }

    let default_out = device::get_default_output_index();
    for i in 0 .. device::get_count()?
    {
        let marker = if Some(i) == default_out { "*" } else { " " };
        match device::get_info(i)
        {
            None => println!("{}dev {}: ???", marker, i),
            Some(d) => println!("{}dev {}: {} [api {}, {} out, {} Hz]",
                                marker, i, d.name, d.host_api, d.max_output_channels, d.default_sample_rate),
        }
    }
    Ok(())
}

/// Play each rate in order, every stream continuing the shared generator
fn play_all<F>(rates: &[f64], sine: &SharedSine, mut play: F) -> Result<(), PlaybackError>
    where F: FnMut(f64, StreamCallback<f32>) -> Result<(), PlaybackError>
{
    for &rate in rates
    {
        play(rate, tone_callback(Arc::clone(sine)))?;
    }
    Ok(())
}

fn output_device(config: &Config) -> Result<DeviceIndex, PlaybackError>
{
    config.device
        .or_else(device::get_default_output_index)
        .ok_or(PlaybackError::NoDefaultOutputDevice)
}

fn play_at_rate(config: &Config, rate: f64, callback: StreamCallback<f32>) -> Result<(), PlaybackError>
{
    println!("PortAudio Test: output sine wave. SR = {}, BufSize = {}", rate, config.frames_per_buffer);

    let out = output_device(config)?;
    let info = device::get_info(out).ok_or(PlaybackError::DeviceInfoUnavailable(out))?;
    info!("output device {}: {} (default rate {} Hz)", out, info.name, info.default_sample_rate);

    let host_info = HostApiSpecificStreamInfo::for_platform();
    if host_info.is_none()
    {
        println!("Hardware SR changing not being tested on this platform.");
    }

    let params = StreamParameters::<f32>::new(out, CHANNELS, info.default_low_output_latency)
        .with_host_api_specific(host_info.as_ref());
    stream::is_format_supported(None, Some(&params), rate)?;

    let stream = Stream::open(None, Some(&params), rate, config.frames_per_buffer, StreamFlags::CLIP_OFF, callback)?;
    stream.start()?;

    match stream.info()
    {
        Some(actual) => info!("stream running at {} Hz, output latency {:?}", actual.sample_rate, actual.output_latency),
        None => debug!("no stream info available"),
    }

    println!("Play for {} seconds.", config.seconds);
    pa::sleep(config.play_time());

    stream.stop()?;
    debug!("stopped after {:?} on the stream clock, cpu load {:.3}", stream.time(), stream.cpu_load());
    stream.close()?;
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn configured_device_wins()
    {
        let config = Config { device: Some(4), ..Config::default() };
        assert_eq!(output_device(&config), Ok(4));
    }

    #[test]
    fn error_messages()
    {
        assert_eq!(PlaybackError::NoDefaultOutputDevice.to_string(), "No default output device.");
        assert_eq!(PlaybackError::DeviceInfoUnavailable(2).to_string(), "No info for device 2.");
        assert_eq!(PlaybackError::from(PaError::UnknownError(-9970)).code(), -9970);
        assert_eq!(PlaybackError::NoDefaultOutputDevice.code(), 0);
    }

    #[test]
    fn portaudio_errors_keep_their_source()
    {
        let error = PlaybackError::from(PaError::InvalidSampleRate);
        assert_eq!(error, PlaybackError::PortAudio(PaError::InvalidSampleRate));
        assert!(error.source().is_some());
        assert!(PlaybackError::NoDefaultOutputDevice.source().is_none());
    }

    #[test]
    fn report_for_portaudio_failures()
    {
        let report = PlaybackError::PortAudio(PaError::InvalidDevice).report();
        assert!(report.starts_with("An error occured while using the portaudio stream\n"));
        assert!(report.contains("Error number: -9996\n"));
        assert!(report.contains(&format!("Error message: {}\n", PaError::InvalidDevice)));
    }

    #[test]
    fn report_for_missing_device_keeps_the_error_block()
    {
        let report = PlaybackError::NoDefaultOutputDevice.report();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "Error: No default output device.");
        assert_eq!(lines[1], "An error occured while using the portaudio stream");
        assert_eq!(lines[2], "Error number: 0");
        assert!(lines[3].starts_with("Error message: "));
    }

    fn counting<'a>(calls: &'a std::cell::RefCell<Vec<&'static str>>, name: &'static str, result: PaResult) -> impl FnOnce() -> PaResult + 'a
    {
        move || { calls.borrow_mut().push(name); result }
    }

    #[test]
    fn terminate_runs_when_the_body_fails()
    {
        let calls = std::cell::RefCell::new(Vec::new());
        let result: Result<(), PlaybackError> = with_portaudio(
            counting(&calls, "init", Ok(())),
            || { calls.borrow_mut().push("body"); Err(PlaybackError::NoDefaultOutputDevice) },
            counting(&calls, "terminate", Err(PaError::InternalError)));

        assert_eq!(result, Err(PlaybackError::NoDefaultOutputDevice));
        assert_eq!(*calls.borrow(), vec!["init", "body", "terminate"]);
    }

    #[test]
    fn terminate_errors_surface_after_a_clean_body()
    {
        let calls = std::cell::RefCell::new(Vec::new());
        let result = with_portaudio(
            counting(&calls, "init", Ok(())),
            || Ok(7),
            counting(&calls, "terminate", Err(PaError::NotInitialized)));

        assert_eq!(result, Err(PlaybackError::PortAudio(PaError::NotInitialized)));
        assert_eq!(*calls.borrow(), vec!["init", "terminate"]);
    }

    #[test]
    fn nothing_runs_when_initialize_fails()
    {
        let calls = std::cell::RefCell::new(Vec::new());
        let result: Result<(), PlaybackError> = with_portaudio(
            counting(&calls, "init", Err(PaError::InsufficientMemory)),
            || { calls.borrow_mut().push("body"); Ok(()) },
            counting(&calls, "terminate", Ok(())));

        assert_eq!(result, Err(PlaybackError::PortAudio(PaError::InsufficientMemory)));
        assert_eq!(*calls.borrow(), vec!["init"]);
    }

    #[test]
    fn rates_play_in_order_through_one_generator()
    {
        let table = crate::sine::SineTable::new();
        let sine: SharedSine = Arc::new(Mutex::new(StereoSine::new()));
        let mut played = Vec::new();
        let mut first_frames = Vec::new();

        play_all(&[44100.0, 48000.0], &sine, |rate, mut callback|
        {
            let mut buffer = [0.0f32; 2 * 64];
            let status = callback(&[], &mut buffer, stream::StreamTimeInfo::default(), stream::StreamCallbackFlags::empty());
            assert_eq!(status, StreamCallbackResult::Continue);
            played.push(rate);
            first_frames.push((buffer[0], buffer[1]));
            Ok(())
        }).unwrap();

        assert_eq!(played, vec![44100.0, 48000.0]);
        // The second stream starts where the first stopped
        assert_eq!(first_frames, vec![(table.get(0), table.get(0)), (table.get(64), table.get(192))]);
        // 128 frames: right walks 384 steps, wrapped once
        assert_eq!(sine.lock().unwrap().phases(), (128, 184));
    }

    #[test]
    fn a_failing_rate_stops_the_run()
    {
        let sine: SharedSine = Arc::new(Mutex::new(StereoSine::new()));
        let mut played = Vec::new();

        let result = play_all(&[44100.0, 48000.0, 96000.0], &sine, |rate, _|
        {
            played.push(rate);
            if rate == 48000.0 { Err(PlaybackError::PortAudio(PaError::InvalidSampleRate)) } else { Ok(()) }
        });

        assert_eq!(result, Err(PlaybackError::PortAudio(PaError::InvalidSampleRate)));
        assert_eq!(played, vec![44100.0, 48000.0]);
    }

    #[test]
    fn busy_generator_gives_silence()
    {
        let sine: SharedSine = Arc::new(Mutex::new(StereoSine::new()));
        let mut callback = tone_callback(Arc::clone(&sine));
        let guard = sine.lock().unwrap();

        let mut buffer = [1.0f32; 8];
        callback(&[], &mut buffer, stream::StreamTimeInfo::default(), stream::StreamCallbackFlags::empty());
        assert_eq!(buffer, [0.0; 8]);
        assert_eq!(guard.phases(), (0, 0));
    }
}
