//! Opening and driving callback streams

use crate::device::DeviceIndex;
use crate::hostapi::HostApiSpecificStreamInfo;
use crate::ll;
use crate::pa::{PaError, PaResult};
use crate::util::{duration_to_pa_time, pa_time_to_duration, to_pa_result};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;
use std::time::Duration;

/// Let the host choose the buffer size, possibly varying between callbacks
pub const FRAMES_PER_BUFFER_UNSPECIFIED: u32 = ll::paFramesPerBufferUnspecified as u32;

/// What the callback asks PortAudio to do next
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCallbackResult
{
    /// Keep calling
    Continue = ll::paContinue,
    /// Play out what has been generated, then stop
    Complete = ll::paComplete,
    /// Stop as soon as possible
    Abort = ll::paAbort,
}

/// Callback run on the audio thread: input, output, timing and status flags.
///
/// Buffers are interleaved, one slot per channel per frame. The callback owns its state: a
/// stream that is leaked or fails to close keeps calling it after the caller has moved on.
pub type StreamCallback<T> =
    Box<dyn FnMut(&[T], &mut [T], StreamTimeInfo, StreamCallbackFlags) -> StreamCallbackResult + Send + 'static>;

struct StreamUserData<T>
{
    num_input: usize,
    num_output: usize,
    callback: StreamCallback<T>,
}

/// Timestamps on the stream clock passed to each callback
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StreamTimeInfo
{
    /// When the first input sample was captured
    pub input_adc_time: Duration,
    /// When the callback was invoked
    pub current_time: Duration,
    /// When the first output sample will reach the DAC
    pub output_dac_time: Duration,
}

impl StreamTimeInfo
{
    fn from_ll(input: &ll::PaStreamCallbackTimeInfo) -> StreamTimeInfo
    {
        StreamTimeInfo
        {
            input_adc_time: pa_time_to_duration(input.inputBufferAdcTime),
            current_time: pa_time_to_duration(input.currentTime),
            output_dac_time: pa_time_to_duration(input.outputBufferDacTime),
        }
    }
}

bitflags! {
    /// Status reported to the callback
    pub struct StreamCallbackFlags: libc::c_ulong {
        /// Input was missing, silence was inserted
        const INPUT_UNDERFLOW = ll::paInputUnderflow;
        /// Input was discarded
        const INPUT_OVERFLOW = ll::paInputOverflow;
        /// Output gap, the previous callback was too slow
        const OUTPUT_UNDERFLOW = ll::paOutputUnderflow;
        /// Output was discarded
        const OUTPUT_OVERFLOW = ll::paOutputOverflow;
        /// Output is being primed, input is not real
        const PRIMING_OUTPUT = ll::paPrimingOutput;
    }
}

bitflags! {
    /// Flags used when opening a stream
    pub struct StreamFlags: libc::c_ulong {
        /// Do not clip out of range samples
        const CLIP_OFF = ll::paClipOff;
        /// Do not dither samples
        const DITHER_OFF = ll::paDitherOff;
        /// Full duplex only: never discard input
        const NEVER_DROP_INPUT = ll::paNeverDropInput;
        /// Fill the initial output buffers from the callback instead of with silence
        const PRIME_OUTPUT_BUFFERS_USING_STREAM_CALLBACK = ll::paPrimeOutputBuffersUsingStreamCallback;
    }
}

/// Sample types PortAudio can stream
pub trait Sample: Copy + Send + 'static
{
    /// The matching `PaSampleFormat`
    fn sample_format() -> ll::PaSampleFormat;
}

impl Sample for f32 { fn sample_format() -> ll::PaSampleFormat { ll::paFloat32 } }
impl Sample for i32 { fn sample_format() -> ll::PaSampleFormat { ll::paInt32 } }
impl Sample for i16 { fn sample_format() -> ll::PaSampleFormat { ll::paInt16 } }
impl Sample for i8 { fn sample_format() -> ll::PaSampleFormat { ll::paInt8 } }
impl Sample for u8 { fn sample_format() -> ll::PaSampleFormat { ll::paUInt8 } }

/// Parameters for one direction of a stream
pub struct StreamParameters<'a, T>
{
    /// Device to use
    pub device: DeviceIndex,

    /// Number of interleaved channels
    pub channel_count: u32,

    /// Latency the stream should aim for
    pub suggested_latency: Duration,

    /// Optional host API specific settings
    pub host_api_specific: Option<&'a HostApiSpecificStreamInfo>,

    sample: PhantomData<T>,
}

impl<'a, T: Sample> StreamParameters<'a, T>
{
    /// Parameters without host specific settings
    pub fn new(device: DeviceIndex, channel_count: u32, suggested_latency: Duration) -> StreamParameters<'a, T>
    {
        StreamParameters
        {
            device,
            channel_count,
            suggested_latency,
            host_api_specific: None,
            sample: PhantomData,
        }
    }

    /// Attach host specific settings
    pub fn with_host_api_specific(mut self, info: Option<&'a HostApiSpecificStreamInfo>) -> StreamParameters<'a, T>
    {
        self.host_api_specific = info;
        self
    }

    fn to_ll(&self) -> ll::PaStreamParameters
    {
        ll::PaStreamParameters
        {
            device: self.device as ll::PaDeviceIndex,
            channelCount: self.channel_count as libc::c_int,
            sampleFormat: T::sample_format(),
            suggestedLatency: duration_to_pa_time(self.suggested_latency),
            hostApiSpecificStreamInfo: self.host_api_specific.map_or(ptr::null_mut(), |i| i.as_ptr()),
        }
    }
}

/// Stream properties as reported by the host once the stream is open
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo
{
    /// Actual input latency
    pub input_latency: Duration,
    /// Actual output latency
    pub output_latency: Duration,
    /// Actual sample rate, which may differ slightly from the requested one
    pub sample_rate: f64,
}

fn ll_params<T: Sample>(params: Option<&StreamParameters<T>>) -> Option<ll::PaStreamParameters>
{
    params.map(|p| p.to_ll())
}

fn as_ptr(params: &Option<ll::PaStreamParameters>) -> *const ll::PaStreamParameters
{
    params.as_ref().map_or(ptr::null(), |p| p as *const ll::PaStreamParameters)
}

/// Check whether a stream with these parameters could be opened
pub fn is_format_supported<T: Sample>(input: Option<&StreamParameters<T>>,
                                      output: Option<&StreamParameters<T>>,
                                      sample_rate: f64) -> PaResult
{
    let input_ll = ll_params(input);
    let output_ll = ll_params(output);
    to_pa_result(unsafe { ll::Pa_IsFormatSupported(as_ptr(&input_ll), as_ptr(&output_ll), sample_rate) })
}

unsafe extern "C" fn stream_callback<T: Sample>(input: *const libc::c_void,
                                                output: *mut libc::c_void,
                                                frame_count: libc::c_ulong,
                                                time_info: *const ll::PaStreamCallbackTimeInfo,
                                                status_flags: ll::PaStreamCallbackFlags,
                                                user_data: *mut libc::c_void) -> libc::c_int
{
    let stream_data = &mut *(user_data as *mut StreamUserData<T>);
    let frames = frame_count as usize;

    let input_buffer: &[T] = if input.is_null() { Default::default() }
        else { slice::from_raw_parts(input as *const T, frames * stream_data.num_input) };
    let output_buffer: &mut [T] = if output.is_null() { Default::default() }
        else { slice::from_raw_parts_mut(output as *mut T, frames * stream_data.num_output) };

    let flags = StreamCallbackFlags::from_bits_truncate(status_flags);
    let timeinfo = time_info.as_ref().map(StreamTimeInfo::from_ll).unwrap_or_default();

    // Unwinding into PortAudio is undefined behaviour
    match panic::catch_unwind(AssertUnwindSafe(|| (stream_data.callback)(input_buffer, output_buffer, timeinfo, flags)))
    {
        Ok(result) => result as libc::c_int,
        Err(_) => ll::paAbort,
    }
}

/// An open callback stream
///
/// The stream is closed when dropped.
pub struct Stream<T: Sample>
{
    pa_stream: *mut ll::PaStream,
    user_data: *mut StreamUserData<T>,
}

impl<T: Sample> Stream<T>
{
    /// Open a stream on explicit devices
    ///
    /// ```no_run
    /// use sine_srate::{device, stream};
    ///
    /// sine_srate::initialize().unwrap();
    /// let out = device::get_default_output_index().unwrap();
    /// let latency = device::get_info(out).unwrap().default_low_output_latency;
    /// let params = stream::StreamParameters::<f32>::new(out, 2, latency);
    /// let callback = Box::new(|_: &[f32], output: &mut [f32], _, _| {
    ///     for sample in output.iter_mut() { *sample = 0.0; }
    ///     stream::StreamCallbackResult::Continue
    /// });
    /// let s = stream::Stream::open(None, Some(&params), 44100.0, 64, stream::StreamFlags::CLIP_OFF, callback).unwrap();
    /// s.start().unwrap();
    /// s.stop().unwrap();
    /// s.close().unwrap();
    /// sine_srate::terminate().unwrap();
    /// ```
    pub fn open(input: Option<&StreamParameters<T>>,
                output: Option<&StreamParameters<T>>,
                sample_rate: f64,
                frames_per_buffer: u32,
                flags: StreamFlags,
                callback: StreamCallback<T>)
               -> Result<Stream<T>, PaError>
    {
        let user_data = Box::into_raw(Box::new(StreamUserData
        {
            num_input: input.map_or(0, |p| p.channel_count as usize),
            num_output: output.map_or(0, |p| p.channel_count as usize),
            callback,
        }));

        let input_ll = ll_params(input);
        let output_ll = ll_params(output);
        let mut pa_stream = ptr::null_mut();

        let code = unsafe
        {
            ll::Pa_OpenStream(&mut pa_stream,
                              as_ptr(&input_ll),
                              as_ptr(&output_ll),
                              sample_rate,
                              frames_per_buffer as libc::c_ulong,
                              flags.bits(),
                              Some(stream_callback::<T>),
                              user_data as *mut libc::c_void)
        };

        match to_pa_result(code)
        {
            Ok(()) =>
            {
                debug!("opened stream at {} Hz, {} frames per buffer", sample_rate, frames_per_buffer);
                Ok(Stream { pa_stream, user_data })
            },
            Err(v) =>
            {
                drop(unsafe { Box::from_raw(user_data) });
                Err(v)
            },
        }
    }

    /// Start calling the callback
    pub fn start(&self) -> PaResult
    {
        to_pa_result(unsafe { ll::Pa_StartStream(self.pa_stream) })
    }

    /// Stop after the pending buffers have been played
    pub fn stop(&self) -> PaResult
    {
        to_pa_result(unsafe { ll::Pa_StopStream(self.pa_stream) })
    }

    /// Stop immediately, discarding pending buffers
    pub fn abort(&self) -> PaResult
    {
        to_pa_result(unsafe { ll::Pa_AbortStream(self.pa_stream) })
    }

    /// Close the stream and report the result
    pub fn close(mut self) -> PaResult
    {
        self.close_inner()
    }

    fn close_inner(&mut self) -> PaResult
    {
        if self.pa_stream.is_null()
        {
            return Ok(());
        }
        let code = unsafe { ll::Pa_CloseStream(self.pa_stream) };
        self.finish_close(code)
    }

    /// The handle is given up whatever the outcome, PortAudio is never asked to close it twice.
    fn finish_close(&mut self, code: i32) -> PaResult
    {
        self.pa_stream = ptr::null_mut();
        let user_data = std::mem::replace(&mut self.user_data, ptr::null_mut());
        let result = to_pa_result(code);
        match result
        {
            // The callback can no longer run, its state can go
            Ok(()) => drop(unsafe { Box::from_raw(user_data) }),
            // PortAudio may still call into it, leak it
            Err(v) => error!("closing stream failed, leaking its callback: {}", v),
        }
        result
    }

    /// Whether the stream is stopped
    pub fn is_stopped(&self) -> Result<bool, PaError>
    {
        match unsafe { ll::Pa_IsStreamStopped(self.pa_stream) }
        {
            1 => Ok(true),
            n => to_pa_result(n).map(|_| false),
        }
    }

    /// Whether the callback is being called
    pub fn is_active(&self) -> Result<bool, PaError>
    {
        match unsafe { ll::Pa_IsStreamActive(self.pa_stream) }
        {
            1 => Ok(true),
            n => to_pa_result(n).map(|_| false),
        }
    }

    /// Latency and sample rate the host actually uses
    pub fn info(&self) -> Option<StreamInfo>
    {
        unsafe
        {
            ll::Pa_GetStreamInfo(self.pa_stream)
                .as_ref()
                .map(|i| StreamInfo
                {
                    input_latency: pa_time_to_duration(i.inputLatency),
                    output_latency: pa_time_to_duration(i.outputLatency),
                    sample_rate: i.sampleRate,
                })
        }
    }

    /// Current time on the stream clock
    pub fn time(&self) -> Duration
    {
        pa_time_to_duration(unsafe { ll::Pa_GetStreamTime(self.pa_stream) })
    }

    /// Fraction of the available time spent in the callback, between 0.0 and 1.0
    pub fn cpu_load(&self) -> f64
    {
        unsafe { ll::Pa_GetStreamCpuLoad(self.pa_stream) }
    }
}

impl<T: Sample> Drop for Stream<T>
{
    fn drop(&mut self)
    {
        // Failures are logged by finish_close
        let _ = self.close_inner();
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn callback_results_match_portaudio()
    {
        assert_eq!(StreamCallbackResult::Continue as i32, 0);
        assert_eq!(StreamCallbackResult::Complete as i32, 1);
        assert_eq!(StreamCallbackResult::Abort as i32, 2);
    }

    #[test]
    fn flag_bits()
    {
        assert_eq!(StreamFlags::CLIP_OFF.bits(), 0x01);
        assert_eq!((StreamFlags::CLIP_OFF | StreamFlags::DITHER_OFF).bits(), 0x03);
        let status = StreamCallbackFlags::from_bits_truncate(0x14 | 0x100);
        assert_eq!(status, StreamCallbackFlags::OUTPUT_UNDERFLOW | StreamCallbackFlags::PRIMING_OUTPUT);
    }

    #[test]
    fn sample_formats()
    {
        assert_eq!(f32::sample_format(), ll::paFloat32);
        assert_eq!(i16::sample_format(), ll::paInt16);
        assert_eq!(u8::sample_format(), ll::paUInt8);
    }

    #[test]
    fn parameters_to_ll()
    {
        let params = StreamParameters::<f32>::new(3, 2, Duration::from_millis(10));
        let raw = params.to_ll();
        assert_eq!(raw.device, 3);
        assert_eq!(raw.channelCount, 2);
        assert_eq!(raw.sampleFormat, ll::paFloat32);
        assert!((raw.suggestedLatency - 0.01).abs() < 1e-9);
        assert!(raw.hostApiSpecificStreamInfo.is_null());
    }

    fn call_trampoline(data: &mut StreamUserData<f32>, output: &mut [f32], frames: usize) -> libc::c_int
    {
        let time = ll::PaStreamCallbackTimeInfo { inputBufferAdcTime: 0.0, currentTime: 1.5, outputBufferDacTime: 1.75 };
        unsafe
        {
            stream_callback::<f32>(ptr::null(),
                                   output.as_mut_ptr() as *mut libc::c_void,
                                   frames as libc::c_ulong,
                                   &time,
                                   ll::paOutputUnderflow,
                                   data as *mut StreamUserData<f32> as *mut libc::c_void)
        }
    }

    #[test]
    fn trampoline_passes_buffers_and_status()
    {
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let record = Arc::clone(&seen);
            let mut data = StreamUserData
            {
                num_input: 0,
                num_output: 2,
                callback: Box::new(move |input: &[f32], output: &mut [f32], time: StreamTimeInfo, flags: StreamCallbackFlags| -> StreamCallbackResult
                {
                    record.lock().unwrap().push((input.len(), output.len(), time.current_time, flags));
                    for s in output.iter_mut() { *s = 0.5; }
                    StreamCallbackResult::Complete
                }),
            };
            let mut output = [0.0f32; 8];
            assert_eq!(call_trampoline(&mut data, &mut output, 4), ll::paComplete);
            assert_eq!(output, [0.5; 8]);
        }
        assert_eq!(*seen.lock().unwrap(), vec![(0, 8, Duration::from_millis(1500), StreamCallbackFlags::OUTPUT_UNDERFLOW)]);
    }

    #[test]
    fn trampoline_aborts_on_panic()
    {
        let mut data = StreamUserData::<f32>
        {
            num_input: 0,
            num_output: 2,
            callback: Box::new(|_: &[f32], _: &mut [f32], _, _| -> StreamCallbackResult { panic!("callback failure") }),
        };
        let mut output = [0.0f32; 4];
        assert_eq!(call_trampoline(&mut data, &mut output, 2), ll::paAbort);
    }

    /// A stream whose callback holds a clone of `token`, with a handle PortAudio never sees
    fn unopened_stream(token: &Arc<()>) -> Stream<f32>
    {
        let held = Arc::clone(token);
        let user_data = Box::into_raw(Box::new(StreamUserData
        {
            num_input: 0,
            num_output: 2,
            callback: Box::new(move |_: &[f32], _: &mut [f32], _, _| -> StreamCallbackResult
            {
                assert!(Arc::strong_count(&held) > 0);
                StreamCallbackResult::Continue
            }),
        }));
        Stream { pa_stream: ptr::NonNull::dangling().as_ptr(), user_data }
    }

    #[test]
    fn successful_close_frees_the_callback()
    {
        let token = Arc::new(());
        let mut stream = unopened_stream(&token);
        assert_eq!(Arc::strong_count(&token), 2);

        assert_eq!(stream.finish_close(ll::paNoError), Ok(()));
        assert!(stream.pa_stream.is_null());
        assert_eq!(Arc::strong_count(&token), 1);

        // Dropping afterwards does not touch PortAudio again
        drop(stream);
        assert_eq!(Arc::strong_count(&token), 1);
    }

    #[test]
    fn failed_close_gives_up_the_handle_and_leaks_the_callback()
    {
        let token = Arc::new(());
        let mut stream = unopened_stream(&token);

        assert_eq!(stream.finish_close(ll::paInternalError), Err(PaError::InternalError));
        assert!(stream.pa_stream.is_null());
        assert!(stream.user_data.is_null());

        // A second close, explicit or from Drop, is a no-op
        assert_eq!(stream.close_inner(), Ok(()));
        drop(stream);
        assert_eq!(Arc::strong_count(&token), 2);
    }
}
