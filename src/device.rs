//! Info about connected audio devices

use crate::hostapi::HostApiIndex;
use crate::ll;
use crate::pa::PaError;
use crate::util::{c_string, pa_time_to_duration, to_index_result};
use std::time::Duration;

/// Index of a Device
pub type DeviceIndex = u32;

/// Information for a specific device
#[derive(Debug, Clone)]
pub struct DeviceInfo
{
    /// Human readable name
    pub name: String,

    /// Index of the host API this device belongs to
    pub host_api: HostApiIndex,

    /// Maximal number of input channels that can be used
    pub max_input_channels: u32,

    /// Maximal number of ouput channels that can be used
    pub max_output_channels: u32,

    /// Default input latency for interactive performance
    pub default_low_input_latency: Duration,

    /// Default output latency for interactive performance
    pub default_low_output_latency: Duration,

    /// Default input latency for robust non-interactive applications
    pub default_high_input_latency: Duration,

    /// Default output latency for robust non-interactive applications
    pub default_high_output_latency: Duration,

    /// Default sample rate
    pub default_sample_rate: f64,
}

impl DeviceInfo
{
    fn from_ll(input: &ll::PaDeviceInfo) -> DeviceInfo
    {
        DeviceInfo
        {
            name: unsafe { c_string(input.name) },
            host_api: input.hostApi as HostApiIndex,
            max_input_channels: input.maxInputChannels.max(0) as u32,
            max_output_channels: input.maxOutputChannels.max(0) as u32,
            default_low_input_latency: pa_time_to_duration(input.defaultLowInputLatency),
            default_low_output_latency: pa_time_to_duration(input.defaultLowOutputLatency),
            default_high_input_latency: pa_time_to_duration(input.defaultHighInputLatency),
            default_high_output_latency: pa_time_to_duration(input.defaultHighOutputLatency),
            default_sample_rate: input.defaultSampleRate,
        }
    }
}

fn to_device_option(index: ll::PaDeviceIndex) -> Option<DeviceIndex>
{
    match index
    {
        n if n >= 0 => Some(n as DeviceIndex),
        _ => None,
    }
}

/// Retrieve the number of available devices.
pub fn get_count() -> Result<u32, PaError>
{
    to_index_result(unsafe { ll::Pa_GetDeviceCount() })
}

/// Retrieve the index of the default input device
///
/// Returns None when no input device is available.
pub fn get_default_input_index() -> Option<DeviceIndex>
{
    to_device_option(unsafe { ll::Pa_GetDefaultInputDevice() })
}

/// Retrieve the index of the default output device
///
/// Returns None when no output device is available.
pub fn get_default_output_index() -> Option<DeviceIndex>
{
    to_device_option(unsafe { ll::Pa_GetDefaultOutputDevice() })
}

/// Get info about a particular device
///
/// Returns None when the index is out of range.
pub fn get_info(index: DeviceIndex) -> Option<DeviceInfo>
{
    unsafe
    {
        ll::Pa_GetDeviceInfo(index as i32)
            .as_ref()
            .map(DeviceInfo::from_ll)
    }
}

/// Converts a device index from a specific host API to a global device index
///
/// Returns Err(InvalidHostApi) when the host_api is out of range, and Err(InvalidDevice) when
/// host_api_device_index is out of range.
///
/// ```no_run
/// // We retrieve the index of device 3 of api 1
/// let device_index = match sine_srate::device::get_from_host_api_device_index(1, 3)
/// {
///     Ok(n) => n,
///     Err(e) => { println!("Error: {:?}", e); return },
/// };
/// ```
pub fn get_from_host_api_device_index(host_api: HostApiIndex, host_api_device_index: u32) -> Result<DeviceIndex, PaError>
{
    to_index_result(unsafe { ll::Pa_HostApiDeviceIndexToDeviceIndex(host_api as i32, host_api_device_index as i32) })
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn no_device_is_none()
    {
        assert_eq!(to_device_option(ll::paNoDevice), None);
        assert_eq!(to_device_option(ll::paUseHostApiSpecificDeviceSpecification), None);
        assert_eq!(to_device_option(0), Some(0));
        assert_eq!(to_device_option(7), Some(7));
    }

    #[test]
    fn device_info_from_ll()
    {
        let name = b"Built-in Output\0";
        let raw = ll::PaDeviceInfo
        {
            structVersion: 2,
            name: name.as_ptr() as *const libc::c_char,
            hostApi: 1,
            maxInputChannels: 0,
            maxOutputChannels: 2,
            defaultLowInputLatency: 0.01,
            defaultLowOutputLatency: 0.005,
            defaultHighInputLatency: 0.1,
            defaultHighOutputLatency: 0.05,
            defaultSampleRate: 48000.0,
        };
        let info = DeviceInfo::from_ll(&raw);
        assert_eq!(info.name, "Built-in Output");
        assert_eq!(info.host_api, 1);
        assert_eq!(info.max_output_channels, 2);
        assert_eq!(info.default_low_output_latency, Duration::from_secs_f64(0.005));
        assert_eq!(info.default_sample_rate, 48000.0);
    }
}
