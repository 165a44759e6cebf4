//! Raw declarations for `portaudio.h` (V19) and, on macOS, `pa_mac_core.h`.

#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]

use libc::{c_char, c_double, c_int, c_long, c_ulong, c_void};

pub type PaError = c_int;
pub type PaDeviceIndex = c_int;
pub type PaHostApiIndex = c_int;
pub type PaHostApiTypeId = c_int;
pub type PaTime = c_double;
pub type PaSampleFormat = c_ulong;
pub type PaStreamFlags = c_ulong;
pub type PaStreamCallbackFlags = c_ulong;
pub type PaStream = c_void;

// PaErrorCode
pub const paNoError: PaError = 0;
pub const paNotInitialized: PaError = -10000;
pub const paUnanticipatedHostError: PaError = -9999;
pub const paInvalidChannelCount: PaError = -9998;
pub const paInvalidSampleRate: PaError = -9997;
pub const paInvalidDevice: PaError = -9996;
pub const paInvalidFlag: PaError = -9995;
pub const paSampleFormatNotSupported: PaError = -9994;
pub const paBadIODeviceCombination: PaError = -9993;
pub const paInsufficientMemory: PaError = -9992;
pub const paBufferTooBig: PaError = -9991;
pub const paBufferTooSmall: PaError = -9990;
pub const paNullCallback: PaError = -9989;
pub const paBadStreamPtr: PaError = -9988;
pub const paTimedOut: PaError = -9987;
pub const paInternalError: PaError = -9986;
pub const paDeviceUnavailable: PaError = -9985;
pub const paIncompatibleHostApiSpecificStreamInfo: PaError = -9984;
pub const paStreamIsStopped: PaError = -9983;
pub const paStreamIsNotStopped: PaError = -9982;
pub const paInputOverflowed: PaError = -9981;
pub const paOutputUnderflowed: PaError = -9980;
pub const paHostApiNotFound: PaError = -9979;
pub const paInvalidHostApi: PaError = -9978;
pub const paCanNotReadFromACallbackStream: PaError = -9977;
pub const paCanNotWriteToACallbackStream: PaError = -9976;
pub const paCanNotReadFromAnOutputOnlyStream: PaError = -9975;
pub const paCanNotWriteToAnInputOnlyStream: PaError = -9974;
pub const paIncompatibleStreamHostApi: PaError = -9973;
pub const paBadBufferPtr: PaError = -9972;

pub const paNoDevice: PaDeviceIndex = -1;
pub const paUseHostApiSpecificDeviceSpecification: PaDeviceIndex = -2;

// PaHostApiTypeId
pub const paInDevelopment: PaHostApiTypeId = 0;
pub const paDirectSound: PaHostApiTypeId = 1;
pub const paMME: PaHostApiTypeId = 2;
pub const paASIO: PaHostApiTypeId = 3;
pub const paSoundManager: PaHostApiTypeId = 4;
pub const paCoreAudio: PaHostApiTypeId = 5;
pub const paOSS: PaHostApiTypeId = 7;
pub const paALSA: PaHostApiTypeId = 8;
pub const paAL: PaHostApiTypeId = 9;
pub const paBeOS: PaHostApiTypeId = 10;
pub const paWDMKS: PaHostApiTypeId = 11;
pub const paJACK: PaHostApiTypeId = 12;
pub const paWASAPI: PaHostApiTypeId = 13;
pub const paAudioScienceHPI: PaHostApiTypeId = 14;

pub const paFloat32: PaSampleFormat = 0x0000_0001;
pub const paInt32: PaSampleFormat = 0x0000_0002;
pub const paInt16: PaSampleFormat = 0x0000_0008;
pub const paInt8: PaSampleFormat = 0x0000_0010;
pub const paUInt8: PaSampleFormat = 0x0000_0020;

pub const paFramesPerBufferUnspecified: c_ulong = 0;

pub const paClipOff: PaStreamFlags = 0x0000_0001;
pub const paDitherOff: PaStreamFlags = 0x0000_0002;
pub const paNeverDropInput: PaStreamFlags = 0x0000_0004;
pub const paPrimeOutputBuffersUsingStreamCallback: PaStreamFlags = 0x0000_0008;

pub const paInputUnderflow: PaStreamCallbackFlags = 0x0000_0001;
pub const paInputOverflow: PaStreamCallbackFlags = 0x0000_0002;
pub const paOutputUnderflow: PaStreamCallbackFlags = 0x0000_0004;
pub const paOutputOverflow: PaStreamCallbackFlags = 0x0000_0008;
pub const paPrimingOutput: PaStreamCallbackFlags = 0x0000_0010;

// PaStreamCallbackResult
pub const paContinue: c_int = 0;
pub const paComplete: c_int = 1;
pub const paAbort: c_int = 2;

#[repr(C)]
pub struct PaHostApiInfo {
    pub structVersion: c_int,
    pub _type: PaHostApiTypeId,
    pub name: *const c_char,
    pub deviceCount: c_int,
    pub defaultInputDevice: PaDeviceIndex,
    pub defaultOutputDevice: PaDeviceIndex,
}

#[repr(C)]
pub struct PaHostErrorInfo {
    pub hostApiType: PaHostApiTypeId,
    pub errorCode: c_long,
    pub errorText: *const c_char,
}

#[repr(C)]
pub struct PaDeviceInfo {
    pub structVersion: c_int,
    pub name: *const c_char,
    pub hostApi: PaHostApiIndex,
    pub maxInputChannels: c_int,
    pub maxOutputChannels: c_int,
    pub defaultLowInputLatency: PaTime,
    pub defaultLowOutputLatency: PaTime,
    pub defaultHighInputLatency: PaTime,
    pub defaultHighOutputLatency: PaTime,
    pub defaultSampleRate: c_double,
}

#[repr(C)]
pub struct PaStreamParameters {
    pub device: PaDeviceIndex,
    pub channelCount: c_int,
    pub sampleFormat: PaSampleFormat,
    pub suggestedLatency: PaTime,
    pub hostApiSpecificStreamInfo: *mut c_void,
}

#[repr(C)]
pub struct PaStreamCallbackTimeInfo {
    pub inputBufferAdcTime: PaTime,
    pub currentTime: PaTime,
    pub outputBufferDacTime: PaTime,
}

#[repr(C)]
pub struct PaStreamInfo {
    pub structVersion: c_int,
    pub inputLatency: PaTime,
    pub outputLatency: PaTime,
    pub sampleRate: c_double,
}

pub type PaStreamCallback = unsafe extern "C" fn(
    input: *const c_void,
    output: *mut c_void,
    frameCount: c_ulong,
    timeInfo: *const PaStreamCallbackTimeInfo,
    statusFlags: PaStreamCallbackFlags,
    userData: *mut c_void,
) -> c_int;

extern "C" {
    pub fn Pa_GetVersion() -> c_int;
    pub fn Pa_GetVersionText() -> *const c_char;
    pub fn Pa_GetErrorText(errorCode: PaError) -> *const c_char;

    pub fn Pa_Initialize() -> PaError;
    pub fn Pa_Terminate() -> PaError;

    pub fn Pa_GetHostApiCount() -> PaHostApiIndex;
    pub fn Pa_GetDefaultHostApi() -> PaHostApiIndex;
    pub fn Pa_GetHostApiInfo(hostApi: PaHostApiIndex) -> *const PaHostApiInfo;
    pub fn Pa_HostApiTypeIdToHostApiIndex(_type: PaHostApiTypeId) -> PaHostApiIndex;
    pub fn Pa_HostApiDeviceIndexToDeviceIndex(hostApi: PaHostApiIndex, hostApiDeviceIndex: c_int) -> PaDeviceIndex;
    pub fn Pa_GetLastHostErrorInfo() -> *const PaHostErrorInfo;

    pub fn Pa_GetDeviceCount() -> PaDeviceIndex;
    pub fn Pa_GetDefaultInputDevice() -> PaDeviceIndex;
    pub fn Pa_GetDefaultOutputDevice() -> PaDeviceIndex;
    pub fn Pa_GetDeviceInfo(device: PaDeviceIndex) -> *const PaDeviceInfo;

    pub fn Pa_IsFormatSupported(
        inputParameters: *const PaStreamParameters,
        outputParameters: *const PaStreamParameters,
        sampleRate: c_double,
    ) -> PaError;

    pub fn Pa_OpenStream(
        stream: *mut *mut PaStream,
        inputParameters: *const PaStreamParameters,
        outputParameters: *const PaStreamParameters,
        sampleRate: c_double,
        framesPerBuffer: c_ulong,
        streamFlags: PaStreamFlags,
        streamCallback: Option<PaStreamCallback>,
        userData: *mut c_void,
    ) -> PaError;

    pub fn Pa_CloseStream(stream: *mut PaStream) -> PaError;
    pub fn Pa_StartStream(stream: *mut PaStream) -> PaError;
    pub fn Pa_StopStream(stream: *mut PaStream) -> PaError;
    pub fn Pa_AbortStream(stream: *mut PaStream) -> PaError;
    pub fn Pa_IsStreamStopped(stream: *mut PaStream) -> PaError;
    pub fn Pa_IsStreamActive(stream: *mut PaStream) -> PaError;
    pub fn Pa_GetStreamInfo(stream: *mut PaStream) -> *const PaStreamInfo;
    pub fn Pa_GetStreamTime(stream: *mut PaStream) -> PaTime;
    pub fn Pa_GetStreamCpuLoad(stream: *mut PaStream) -> c_double;

    pub fn Pa_Sleep(msec: c_long);
}

#[cfg(target_os = "macos")]
pub use self::mac_core::*;

#[cfg(target_os = "macos")]
mod mac_core {
    use libc::c_ulong;

    use super::PaHostApiTypeId;

    pub const paMacCoreChangeDeviceParameters: c_ulong = 0x01;
    pub const paMacCoreFailIfConversionRequired: c_ulong = 0x02;
    pub const paMacCoreConversionQualityMin: c_ulong = 0x0100;
    pub const paMacCoreConversionQualityMedium: c_ulong = 0x0200;
    pub const paMacCoreConversionQualityLow: c_ulong = 0x0300;
    pub const paMacCoreConversionQualityHigh: c_ulong = 0x0400;
    pub const paMacCoreConversionQualityMax: c_ulong = 0x0000;
    pub const paMacCorePlayNice: c_ulong = 0x00;
    pub const paMacCorePro: c_ulong = 0x01;
    pub const paMacCoreMinimizeCPUButPlayNice: c_ulong = 0x0100;
    pub const paMacCoreMinimizeCPU: c_ulong = 0x0101;

    #[repr(C)]
    pub struct PaMacCoreStreamInfo {
        pub size: c_ulong,
        pub hostApiType: PaHostApiTypeId,
        pub version: c_ulong,
        pub flags: c_ulong,
        pub channelMap: *const i32,
        pub channelMapSize: c_ulong,
    }

    extern "C" {
        pub fn PaMacCore_SetupStreamInfo(data: *mut PaMacCoreStreamInfo, flags: c_ulong);
    }
}
