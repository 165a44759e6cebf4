//! General utilities for PortAudio

use crate::ll;
use crate::util::{c_string, to_pa_result};
use std::error::Error;
use std::fmt;
use std::time::Duration;

/// PortAudio version
pub fn version() -> i32
{
    unsafe { ll::Pa_GetVersion() }
}

/// Human-readable PortAudio version
pub fn version_text() -> String
{
    unsafe { c_string(ll::Pa_GetVersionText()) }
}

/// Initialize the PortAudio API
///
/// Each successful call must be matched by a call to terminate
pub fn initialize() -> PaResult
{
    debug!("initializing PortAudio");
    to_pa_result(unsafe { ll::Pa_Initialize() })
}

/// Terminate the PortAudio API
///
/// Call this function exactly once for each successful call to initialize
pub fn terminate() -> PaResult
{
    debug!("terminating PortAudio");
    to_pa_result(unsafe { ll::Pa_Terminate() })
}

/// Put the calling thread to sleep for at least the given duration
///
/// Audio keeps running on PortAudio's own threads in the meantime.
pub fn sleep(duration: Duration)
{
    let msec = duration.as_millis().min(libc::c_long::MAX as u128) as libc::c_long;
    unsafe { ll::Pa_Sleep(msec) }
}

// PaError and PaResult

/// Enum for all possible errors given by PortAudio
///
/// The NoError value (0) is not present since the Result type can be used then.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PaError
{
    // paNoError is not present in this enum
    NotInitialized,
    UnanticipatedHostError,
    InvalidChannelCount,
    InvalidSampleRate,
    InvalidDevice,
    InvalidFlag,
    SampleFormatNotSupported,
    BadIODeviceCombination,
    InsufficientMemory,
    BufferTooBig,
    BufferTooSmall,
    NullCallback,
    BadStreamPtr,
    TimedOut,
    InternalError,
    DeviceUnavailable,
    IncompatibleHostApiSpecificStreamInfo,
    StreamIsStopped,
    StreamIsNotStopped,
    InputOverflowed,
    OutputUnderflowed,
    HostApiNotFound,
    InvalidHostApi,
    CanNotReadFromACallbackStream,
    CanNotWriteToACallbackStream,
    CanNotReadFromAnOutputOnlyStream,
    CanNotWriteToAnInputOnlyStream,
    IncompatibleStreamHostApi,
    BadBufferPtr,

    /// Added variant for codes this binding does not know about, keeping the raw code
    UnknownError(i32),
}

impl PaError
{
    /// Map a raw PortAudio error code onto the enum
    pub fn from_i32(code: i32) -> PaError
    {
        match code
        {
            ll::paNotInitialized => PaError::NotInitialized,
            ll::paUnanticipatedHostError => PaError::UnanticipatedHostError,
            ll::paInvalidChannelCount => PaError::InvalidChannelCount,
            ll::paInvalidSampleRate => PaError::InvalidSampleRate,
            ll::paInvalidDevice => PaError::InvalidDevice,
            ll::paInvalidFlag => PaError::InvalidFlag,
            ll::paSampleFormatNotSupported => PaError::SampleFormatNotSupported,
            ll::paBadIODeviceCombination => PaError::BadIODeviceCombination,
            ll::paInsufficientMemory => PaError::InsufficientMemory,
            ll::paBufferTooBig => PaError::BufferTooBig,
            ll::paBufferTooSmall => PaError::BufferTooSmall,
            ll::paNullCallback => PaError::NullCallback,
            ll::paBadStreamPtr => PaError::BadStreamPtr,
            ll::paTimedOut => PaError::TimedOut,
            ll::paInternalError => PaError::InternalError,
            ll::paDeviceUnavailable => PaError::DeviceUnavailable,
            ll::paIncompatibleHostApiSpecificStreamInfo => PaError::IncompatibleHostApiSpecificStreamInfo,
            ll::paStreamIsStopped => PaError::StreamIsStopped,
            ll::paStreamIsNotStopped => PaError::StreamIsNotStopped,
            ll::paInputOverflowed => PaError::InputOverflowed,
            ll::paOutputUnderflowed => PaError::OutputUnderflowed,
            ll::paHostApiNotFound => PaError::HostApiNotFound,
            ll::paInvalidHostApi => PaError::InvalidHostApi,
            ll::paCanNotReadFromACallbackStream => PaError::CanNotReadFromACallbackStream,
            ll::paCanNotWriteToACallbackStream => PaError::CanNotWriteToACallbackStream,
            ll::paCanNotReadFromAnOutputOnlyStream => PaError::CanNotReadFromAnOutputOnlyStream,
            ll::paCanNotWriteToAnInputOnlyStream => PaError::CanNotWriteToAnInputOnlyStream,
            ll::paIncompatibleStreamHostApi => PaError::IncompatibleStreamHostApi,
            ll::paBadBufferPtr => PaError::BadBufferPtr,
            other => PaError::UnknownError(other),
        }
    }

    /// The raw PortAudio error number
    pub fn code(self) -> i32
    {
        match self
        {
            PaError::NotInitialized => ll::paNotInitialized,
            PaError::UnanticipatedHostError => ll::paUnanticipatedHostError,
            PaError::InvalidChannelCount => ll::paInvalidChannelCount,
            PaError::InvalidSampleRate => ll::paInvalidSampleRate,
            PaError::InvalidDevice => ll::paInvalidDevice,
            PaError::InvalidFlag => ll::paInvalidFlag,
            PaError::SampleFormatNotSupported => ll::paSampleFormatNotSupported,
            PaError::BadIODeviceCombination => ll::paBadIODeviceCombination,
            PaError::InsufficientMemory => ll::paInsufficientMemory,
            PaError::BufferTooBig => ll::paBufferTooBig,
            PaError::BufferTooSmall => ll::paBufferTooSmall,
            PaError::NullCallback => ll::paNullCallback,
            PaError::BadStreamPtr => ll::paBadStreamPtr,
            PaError::TimedOut => ll::paTimedOut,
            PaError::InternalError => ll::paInternalError,
            PaError::DeviceUnavailable => ll::paDeviceUnavailable,
            PaError::IncompatibleHostApiSpecificStreamInfo => ll::paIncompatibleHostApiSpecificStreamInfo,
            PaError::StreamIsStopped => ll::paStreamIsStopped,
            PaError::StreamIsNotStopped => ll::paStreamIsNotStopped,
            PaError::InputOverflowed => ll::paInputOverflowed,
            PaError::OutputUnderflowed => ll::paOutputUnderflowed,
            PaError::HostApiNotFound => ll::paHostApiNotFound,
            PaError::InvalidHostApi => ll::paInvalidHostApi,
            PaError::CanNotReadFromACallbackStream => ll::paCanNotReadFromACallbackStream,
            PaError::CanNotWriteToACallbackStream => ll::paCanNotWriteToACallbackStream,
            PaError::CanNotReadFromAnOutputOnlyStream => ll::paCanNotReadFromAnOutputOnlyStream,
            PaError::CanNotWriteToAnInputOnlyStream => ll::paCanNotWriteToAnInputOnlyStream,
            PaError::IncompatibleStreamHostApi => ll::paIncompatibleStreamHostApi,
            PaError::BadBufferPtr => ll::paBadBufferPtr,
            PaError::UnknownError(code) => code,
        }
    }
}

impl fmt::Display for PaError
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.write_str(&error_text(self.code()))
    }
}

impl Error for PaError {}

/// Human-readable text PortAudio gives for a raw error code, `paNoError` included
pub fn error_text(code: i32) -> String
{
    unsafe { c_string(ll::Pa_GetErrorText(code)) }
}

/// A result type wrapping PaError.
///
/// PortAudio's paNoError is mapped to Ok(()) and other values mapped to Err(x)
pub type PaResult = Result<(), PaError>;
