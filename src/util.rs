use crate::ll;
use crate::pa::{PaError, PaResult};
use std::ffi::CStr;
use std::time::Duration;

pub fn to_pa_result(code: i32) -> PaResult
{
    if code == ll::paNoError
    {
        return Ok(());
    }
    Err(PaError::from_i32(code))
}

/// Negative values returned by counting and index functions are error codes.
pub fn to_index_result(code: i32) -> Result<u32, PaError>
{
    match code
    {
        n if n >= 0 => Ok(n as u32),
        m => to_pa_result(m).map(|_| 0),
    }
}

pub fn pa_time_to_duration(seconds: f64) -> Duration
{
    if seconds.is_finite() && seconds > 0.0
    {
        Duration::from_secs_f64(seconds)
    }
    else
    {
        Duration::from_secs(0)
    }
}

pub fn duration_to_pa_time(duration: Duration) -> f64
{
    duration.as_secs_f64()
}

/// Copies a C string owned by PortAudio. A null pointer gives an empty string.
pub unsafe fn c_string(ptr: *const libc::c_char) -> String
{
    if ptr.is_null()
    {
        return String::new();
    }
    String::from_utf8_lossy(CStr::from_ptr(ptr).to_bytes()).into_owned()
}
