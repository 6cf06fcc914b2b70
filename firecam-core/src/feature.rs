use bitflags::bitflags;
use std::fmt;

/// IIDC 相机功能寄存器 (Feature)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum Feature {
    Brightness,
    Exposure,
    Sharpness,
    WhiteBalance,
    Hue,
    Saturation,
    Gamma,
    /// 快门，绝对单位为秒
    Shutter,
    /// 增益，绝对单位为 dB
    Gain,
    Iris,
    Focus,
    Temperature,
    Trigger,
    TriggerDelay,
    WhiteShading,
    FrameRate,
    Zoom,
    Pan,
    Tilt,
    OpticalFilter,
    CaptureSize,
    CaptureQuality,
}

impl Feature {
    pub const ALL: [Feature; 22] = [
        Feature::Brightness,
        Feature::Exposure,
        Feature::Sharpness,
        Feature::WhiteBalance,
        Feature::Hue,
        Feature::Saturation,
        Feature::Gamma,
        Feature::Shutter,
        Feature::Gain,
        Feature::Iris,
        Feature::Focus,
        Feature::Temperature,
        Feature::Trigger,
        Feature::TriggerDelay,
        Feature::WhiteShading,
        Feature::FrameRate,
        Feature::Zoom,
        Feature::Pan,
        Feature::Tilt,
        Feature::OpticalFilter,
        Feature::CaptureSize,
        Feature::CaptureQuality,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Brightness => "Brightness",
            Self::Exposure => "Exposure",
            Self::Sharpness => "Sharpness",
            Self::WhiteBalance => "White Balance",
            Self::Hue => "Hue",
            Self::Saturation => "Saturation",
            Self::Gamma => "Gamma",
            Self::Shutter => "Shutter",
            Self::Gain => "Gain",
            Self::Iris => "Iris",
            Self::Focus => "Focus",
            Self::Temperature => "Temperature",
            Self::Trigger => "Trigger",
            Self::TriggerDelay => "Trigger Delay",
            Self::WhiteShading => "White Shading",
            Self::FrameRate => "Frame Rate",
            Self::Zoom => "Zoom",
            Self::Pan => "Pan",
            Self::Tilt => "Tilt",
            Self::OpticalFilter => "Optical Filter",
            Self::CaptureSize => "Capture Size",
            Self::CaptureQuality => "Capture Quality",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

bitflags! {
    /// 单个 Feature 的硬件能力
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serialize", derive(serde::Serialize))]
    pub struct FeatureCaps: u32 {
        /// 支持以物理单位 (秒, dB, ...) 读写
        const ABSOLUTE = 1 << 0;
        /// 当前值可回读
        const READOUT = 1 << 1;
        /// 可开关
        const ON_OFF = 1 << 2;
        const AUTO = 1 << 3;
        const MANUAL = 1 << 4;
        const ONE_PUSH = 1 << 5;
    }
}

/// Feature 描述快照，仅用于诊断输出
///
/// 范围值反映查询那一刻的设备能力；模式协商之后可能变化，换算时必须重新查询。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct FeatureInfo {
    pub feature: Feature,
    pub caps: FeatureCaps,
    pub raw_range: (u32, u32),
    /// 仅当 caps 含 ABSOLUTE 时有意义
    pub abs_range: Option<(f32, f32)>,
    pub raw_value: u32,
    pub abs_value: Option<f32>,
    /// 当前是否处于绝对值控制模式
    pub absolute_control: bool,
}

impl fmt::Display for FeatureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<16} raw={:<6} [{}, {}]",
            self.feature.label(),
            self.raw_value,
            self.raw_range.0,
            self.raw_range.1
        )?;
        if let (Some((lo, hi)), Some(v)) = (self.abs_range, self.abs_value) {
            write!(f, "  abs={:<10.6} [{}, {}]", v, lo, hi)?;
        }
        if self.absolute_control {
            f.write_str("  (absolute)")?;
        }
        Ok(())
    }
}
