//! Info module for available audio host API's

use crate::ll;
use crate::pa::PaError;
use crate::util::{c_string, to_index_result};

/// Index number of a Host API
pub type HostApiIndex = u32;

/// Possible Host API types
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum HostApiType
{
    InDevelopment = ll::paInDevelopment,
    DirectSound = ll::paDirectSound,
    MME = ll::paMME,
    ASIO = ll::paASIO,
    SoundManager = ll::paSoundManager,
    CoreAudio = ll::paCoreAudio,
    OSS = ll::paOSS,
    ALSA = ll::paALSA,
    AL = ll::paAL,
    BeOS = ll::paBeOS,
    WDMKS = ll::paWDMKS,
    JACK = ll::paJACK,
    WASAPI = ll::paWASAPI,
    AudioScienceHPI = ll::paAudioScienceHPI,

    /// Added for type ids this binding does not know about
    Unknown,
}

impl HostApiType
{
    /// Map a raw host API type id onto the enum
    pub fn from_i32(id: i32) -> HostApiType
    {
        match id
        {
            ll::paInDevelopment => HostApiType::InDevelopment,
            ll::paDirectSound => HostApiType::DirectSound,
            ll::paMME => HostApiType::MME,
            ll::paASIO => HostApiType::ASIO,
            ll::paSoundManager => HostApiType::SoundManager,
            ll::paCoreAudio => HostApiType::CoreAudio,
            ll::paOSS => HostApiType::OSS,
            ll::paALSA => HostApiType::ALSA,
            ll::paAL => HostApiType::AL,
            ll::paBeOS => HostApiType::BeOS,
            ll::paWDMKS => HostApiType::WDMKS,
            ll::paJACK => HostApiType::JACK,
            ll::paWASAPI => HostApiType::WASAPI,
            ll::paAudioScienceHPI => HostApiType::AudioScienceHPI,
            _ => HostApiType::Unknown,
        }
    }

    /// Convert a static host API unique identifier, into a runtime host API index.
    pub fn to_api_index(self) -> Result<HostApiIndex, PaError>
    {
        to_index_result(unsafe { ll::Pa_HostApiTypeIdToHostApiIndex(self as i32) })
    }
}

/// Information about a specific host API
#[derive(Debug, Clone)]
pub struct HostApiInfo
{
    /// The type of the API
    pub api_type: HostApiType,

    /// Human-readable name of the API
    pub name: String,

    /// Number of devices this API has
    pub device_count: u32,

    /// Default input device of the API. Is None if there is no input device available.
    pub default_input: Option<u32>,

    /// Default output device of the API. Is None if there is no output device available.
    pub default_output: Option<u32>,
}

impl HostApiInfo
{
    fn from_ll(input: &ll::PaHostApiInfo) -> HostApiInfo
    {
        HostApiInfo
        {
            api_type: HostApiType::from_i32(input._type),
            name: unsafe { c_string(input.name) },
            device_count: input.deviceCount.max(0) as u32,
            default_input: match input.defaultInputDevice { n if n >= 0 => Some(n as u32), _ => None },
            default_output: match input.defaultOutputDevice { n if n >= 0 => Some(n as u32), _ => None },
        }
    }
}

/// Error info obtained by get_last_error
#[derive(Debug, Clone)]
pub struct HostErrorInfo
{
    /// The error code given
    pub code: i64,

    /// A human readable error message
    pub text: String,

    /// The type of the API that produced the error
    pub api_type: HostApiType,
}

impl HostErrorInfo
{
    fn from_ll(input: &ll::PaHostErrorInfo) -> HostErrorInfo
    {
        HostErrorInfo
        {
            code: input.errorCode as i64,
            text: unsafe { c_string(input.errorText) },
            api_type: HostApiType::from_i32(input.hostApiType),
        }
    }
}

/// Return information about the last host error encountered.
///
/// The values in this structure will only be valid if a PortAudio function has previously returned
/// the UnanticipatedHostError error code.
pub fn get_last_error() -> Option<HostErrorInfo>
{
    unsafe
    {
        ll::Pa_GetLastHostErrorInfo()
            .as_ref()
            .map(HostErrorInfo::from_ll)
    }
}

/// Get the number of host API's available
pub fn get_count() -> Result<u32, PaError>
{
    to_index_result(unsafe { ll::Pa_GetHostApiCount() })
}

/// Get the default Host API
pub fn get_default_index() -> Result<HostApiIndex, PaError>
{
    to_index_result(unsafe { ll::Pa_GetDefaultHostApi() })
}

/// Get information about a specific Host API
///
/// Returns None when an invalid index is given
pub fn get_info(index: HostApiIndex) -> Option<HostApiInfo>
{
    unsafe
    {
        ll::Pa_GetHostApiInfo(index as i32)
            .as_ref()
            .map(HostApiInfo::from_ll)
    }
}

/// Host specific configuration attached to stream parameters
///
/// PortAudio reads the block while opening the stream, so it only has to outlive the call to
/// `Stream::open`.
pub enum HostApiSpecificStreamInfo
{
    /// CoreAudio settings, see `mac_core`
    #[cfg(target_os = "macos")]
    MacCore(ll::PaMacCoreStreamInfo),
}

impl HostApiSpecificStreamInfo
{
    /// The block used for hardware sample rate switching on this platform, if there is one.
    ///
    /// On macOS this asks CoreAudio to change the device rate itself rather than convert.
    pub fn for_platform() -> Option<HostApiSpecificStreamInfo>
    {
        #[cfg(target_os = "macos")]
        {
            Some(mac_core::stream_info(mac_core::MacCoreFlags::PRO))
        }
        #[cfg(not(target_os = "macos"))]
        {
            None
        }
    }

    /// Pointer handed to PortAudio in `PaStreamParameters`
    pub(crate) fn as_ptr(&self) -> *mut libc::c_void
    {
        match *self
        {
            #[cfg(target_os = "macos")]
            HostApiSpecificStreamInfo::MacCore(ref info) => info as *const ll::PaMacCoreStreamInfo as *mut libc::c_void,
        }
    }
}

/// CoreAudio specific stream settings
#[cfg(target_os = "macos")]
pub mod mac_core
{
    use super::HostApiSpecificStreamInfo;
    use crate::ll;

    bitflags! {
        /// Flags for `PaMacCore_SetupStreamInfo`
        pub struct MacCoreFlags: libc::c_ulong {
            /// Allow changing the hardware sample rate and buffer size
            const CHANGE_DEVICE_PARAMETERS = ll::paMacCoreChangeDeviceParameters;
            /// Fail instead of converting when the hardware can not match the request
            const FAIL_IF_CONVERSION_REQUIRED = ll::paMacCoreFailIfConversionRequired;
            #[allow(missing_docs)]
            const CONVERSION_QUALITY_MIN = ll::paMacCoreConversionQualityMin;
            #[allow(missing_docs)]
            const CONVERSION_QUALITY_MEDIUM = ll::paMacCoreConversionQualityMedium;
            #[allow(missing_docs)]
            const CONVERSION_QUALITY_LOW = ll::paMacCoreConversionQualityLow;
            #[allow(missing_docs)]
            const CONVERSION_QUALITY_HIGH = ll::paMacCoreConversionQualityHigh;
            #[allow(missing_docs)]
            const CONVERSION_QUALITY_MAX = ll::paMacCoreConversionQualityMax;
            /// Leave device settings alone, let other applications keep working
            const PLAY_NICE = ll::paMacCorePlayNice;
            /// Change device settings and take the device over
            const PRO = ll::paMacCorePro;
            #[allow(missing_docs)]
            const MINIMIZE_CPU_BUT_PLAY_NICE = ll::paMacCoreMinimizeCPUButPlayNice;
            #[allow(missing_docs)]
            const MINIMIZE_CPU = ll::paMacCoreMinimizeCPU;
        }
    }

    /// Build a CoreAudio stream info block with the given flags
    pub fn stream_info(flags: MacCoreFlags) -> HostApiSpecificStreamInfo
    {
        let mut info = ll::PaMacCoreStreamInfo
        {
            size: 0,
            hostApiType: 0,
            version: 0,
            flags: 0,
            channelMap: std::ptr::null(),
            channelMapSize: 0,
        };
        unsafe { ll::PaMacCore_SetupStreamInfo(&mut info, flags.bits()) };
        HostApiSpecificStreamInfo::MacCore(info)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn host_api_type_ids()
    {
        assert_eq!(HostApiType::from_i32(ll::paCoreAudio), HostApiType::CoreAudio);
        assert_eq!(HostApiType::from_i32(ll::paALSA), HostApiType::ALSA);
        assert_eq!(HostApiType::from_i32(6), HostApiType::Unknown);
        assert_eq!(HostApiType::JACK as i32, 12);
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn no_platform_stream_info_off_mac()
    {
        assert!(HostApiSpecificStreamInfo::for_platform().is_none());
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn mac_core_pro_flags()
    {
        assert!(mac_core::MacCoreFlags::PRO.contains(mac_core::MacCoreFlags::CHANGE_DEVICE_PARAMETERS));
        match HostApiSpecificStreamInfo::for_platform()
        {
            Some(HostApiSpecificStreamInfo::MacCore(info)) =>
            {
                assert_eq!(info.flags, ll::paMacCorePro);
                assert_eq!(info.hostApiType, ll::paCoreAudio);
            },
            None => panic!("expected CoreAudio stream info"),
        }
    }
}
