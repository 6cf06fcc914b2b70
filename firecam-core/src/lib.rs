// 开启一些 Clippy 检查，保证代码质量
#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

// 模块定义
pub mod builder;
pub mod error;
pub mod feature;
pub mod frame;
pub mod guid;
pub mod pixel_format;
pub mod traits;

// 方便用户使用的 Prelude
pub mod prelude {
    pub use crate::builder::{
        CaptureConfig, CapturePolicy, Format7Info, FrameRate, IsoSpeed, OperationMode, VideoMode,
    };
    pub use crate::error::{CameraError, Result};
    pub use crate::feature::{Feature, FeatureCaps, FeatureInfo};
    pub use crate::frame::{FrameTicket, RawFrame};
    pub use crate::guid::Guid;
    pub use crate::pixel_format::{BayerMethod, ColorCoding, ColorFilter, ImageType, StereoMethod};
    pub use crate::traits::{BusContext, CameraDevice, DeviceInfo, Driver, FeatureControl};
}

// 版本与构建信息常量
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
