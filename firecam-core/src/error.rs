use crate::feature::Feature;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Configuration rejected by driver: {0}")]
    ConfigurationRejected(String),

    #[error("Frame grab failed: {0}")]
    GrabFailed(String),

    #[error("Stereo capture requested but camera is not configured for stereo")]
    NotStereoConfigured,

    #[error("Camera is not ready: call setup() first")]
    NotReady,

    /// 结构性设置在当前状态下不被允许 (例如 Streaming 时修改 ROI)
    #[error("Operation `{operation}` is not permitted while camera is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("Feature {0} is not supported by this device")]
    FeatureUnsupported(Feature),

    #[error("Invalid GUID string: {0:?}")]
    InvalidGuid(String),

    /// 驱动库上下文无法初始化 (进程级致命错误)
    #[error("Failed to initialize bus driver context: {0}")]
    ContextInit(String),

    #[error("Device disconnected: {0}")]
    Disconnected(String),

    #[error("Device busy: Exclusive access required")]
    DeviceBusy,

    #[error("Format negotiation failed: No hardware support for requested constraints")]
    FormatNotSupported,

    #[error("Driver timed out")]
    Timeout,

    #[error("Driver error: {0}")]
    Driver(String),
}

pub type Result<T> = std::result::Result<T, CameraError>;
