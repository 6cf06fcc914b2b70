//! 配置暂存区
//!
//! setup() 之前的所有设置只记录意图，不与驱动交互；
//! setup() 时一次性应用，并按设备步进量化。

use firecam_core::builder::{CaptureConfig, CapturePolicy, Format7Info, OperationMode};
use firecam_core::error::{CameraError, Result};
use firecam_core::pixel_format::{BayerMethod, ColorCoding, ColorFilter, ImageType, StereoMethod};

/// Bayer 去马赛克设置；滤镜排列必须显式给出
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct BayerSettings {
    pub filter: ColorFilter,
    pub method: BayerMethod,
}

/// 立体相机设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct StereoConfig {
    pub enabled: bool,
    pub method: StereoMethod,
}

/// 暂存的配置
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct PendingSettings {
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub top: u32,
    pub image_type: ImageType,
    /// Some(mode) 表示使用 Format7 自定义 ROI
    pub format7: Option<u8>,
    pub use_1394b: bool,
    pub blocking: bool,
    pub bayer: Option<BayerSettings>,
    /// 期望帧率；0 表示设备允许的最快帧率
    pub frame_rate: f32,
    pub buffer_count: u32,
}

impl Default for PendingSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            left: 0,
            top: 0,
            image_type: ImageType::Grayscale,
            format7: None,
            use_1394b: false,
            blocking: false,
            bayer: None,
            frame_rate: 0.0,
            buffer_count: CaptureConfig::new().buffer_count,
        }
    }
}

impl PendingSettings {
    pub fn capture_policy(&self) -> CapturePolicy {
        if self.blocking {
            CapturePolicy::Wait
        } else {
            CapturePolicy::Poll
        }
    }

    /// 下发给驱动的总线配置
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig::new()
            .bus_generation(self.use_1394b)
            .buffer_count(self.buffer_count)
    }

    pub fn operation_mode(&self) -> OperationMode {
        self.capture_config().operation_mode
    }

    /// 按优先级列出可以满足当前设置的驱动编码
    pub fn acceptable_codings(&self, stereo: &StereoConfig) -> Result<Vec<ColorCoding>> {
        // 1. 立体相机：左右两路打包在一个 16-bit 像素里
        if stereo.enabled {
            if self.bayer.is_some() {
                return Ok(vec![ColorCoding::Raw16, ColorCoding::Mono16]);
            }
            // 未开 Bayer 时两路都是 8-bit 灰度
            return match self.image_type {
                ImageType::Grayscale => Ok(vec![ColorCoding::Mono16, ColorCoding::Raw16]),
                other => Err(CameraError::ConfigurationRejected(format!(
                    "stereo streams deliver grayscale images, {:?} requested without Bayer decoding",
                    other
                ))),
            };
        }

        // 2. Bayer：传感器输出单通道马赛克，由主机侧解码
        if self.bayer.is_some() {
            return Ok(vec![ColorCoding::Raw8, ColorCoding::Mono8]);
        }

        // 3. 直接输出
        match self.image_type {
            ImageType::Grayscale => Ok(vec![ColorCoding::Mono8]),
            ImageType::Color => Ok(vec![ColorCoding::Rgb8]),
            ImageType::ColorAlpha => Err(CameraError::ConfigurationRejected(
                "no IIDC color coding delivers RGBA images".into(),
            )),
        }
    }

    /// 输出图像的类型：Bayer 解码后总是彩色
    pub fn output_image_type(&self) -> ImageType {
        if self.bayer.is_some() {
            ImageType::Color
        } else {
            self.image_type
        }
    }
}

/// 把尺寸量化到 Format7 步进：向下取整，至少一个步进，不超过最大值
pub fn quantize_size(width: u32, height: u32, info: &Format7Info) -> (u32, u32) {
    (
        quantize_axis(width, info.unit_width, info.max_width),
        quantize_axis(height, info.unit_height, info.max_height),
    )
}

/// 把偏移量化到 Format7 位置步进，并保证 ROI 不越界
pub fn quantize_position(
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    info: &Format7Info,
) -> (u32, u32) {
    (
        quantize_offset(left, width, info.unit_left, info.max_width),
        quantize_offset(top, height, info.unit_top, info.max_height),
    )
}

fn quantize_axis(value: u32, unit: u32, max: u32) -> u32 {
    let unit = unit.max(1);
    let max_aligned = (max / unit) * unit;
    let v = (value / unit) * unit;
    v.clamp(unit.min(max_aligned), max_aligned.max(unit))
}

fn quantize_offset(offset: u32, extent: u32, unit: u32, max: u32) -> u32 {
    let unit = unit.max(1);
    let limit = max.saturating_sub(extent);
    let o = offset.min(limit);
    (o / unit) * unit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> Format7Info {
        Format7Info {
            mode: 0,
            max_width: 1280,
            max_height: 960,
            unit_width: 8,
            unit_height: 2,
            unit_left: 4,
            unit_top: 2,
            color_codings: vec![ColorCoding::Mono8],
        }
    }

    #[test]
    fn size_is_floored_to_unit_and_bounded() {
        assert_eq!(quantize_size(643, 481, &info()), (640, 480));
        assert_eq!(quantize_size(3, 1, &info()), (8, 2));
        assert_eq!(quantize_size(5000, 5000, &info()), (1280, 960));
    }

    #[test]
    fn position_keeps_roi_inside_sensor() {
        assert_eq!(quantize_position(7, 3, 640, 480, &info()), (4, 2));
        // 1280 - 640 = 640 是 left 的上限
        assert_eq!(quantize_position(1000, 900, 640, 480, &info()), (640, 480));
    }

    #[test]
    fn codings_follow_stereo_bayer_and_type() {
        let mut s = PendingSettings::default();
        let mono = StereoConfig::default();
        assert_eq!(s.acceptable_codings(&mono).unwrap(), vec![ColorCoding::Mono8]);

        s.image_type = ImageType::Color;
        assert_eq!(s.acceptable_codings(&mono).unwrap(), vec![ColorCoding::Rgb8]);

        s.bayer = Some(BayerSettings {
            filter: ColorFilter::Rggb,
            method: BayerMethod::Simple,
        });
        assert_eq!(s.acceptable_codings(&mono).unwrap()[0], ColorCoding::Raw8);

        let stereo = StereoConfig {
            enabled: true,
            method: StereoMethod::Interlaced,
        };
        assert_eq!(s.acceptable_codings(&stereo).unwrap()[0], ColorCoding::Raw16);

        s.bayer = None;
        s.image_type = ImageType::ColorAlpha;
        assert!(matches!(
            s.acceptable_codings(&mono),
            Err(CameraError::ConfigurationRejected(_))
        ));
    }

    #[test]
    fn stereo_without_bayer_is_grayscale_only() {
        let mut s = PendingSettings::default();
        let stereo = StereoConfig {
            enabled: true,
            method: StereoMethod::Field,
        };
        assert_eq!(
            s.acceptable_codings(&stereo).unwrap(),
            vec![ColorCoding::Mono16, ColorCoding::Raw16]
        );

        for rejected in [ImageType::Color, ImageType::ColorAlpha] {
            s.image_type = rejected;
            assert!(matches!(
                s.acceptable_codings(&stereo),
                Err(CameraError::ConfigurationRejected(_))
            ));
        }

        // Bayer 解码后输出彩色，请求的类型不再约束编码
        s.bayer = Some(BayerSettings {
            filter: ColorFilter::Gbrg,
            method: BayerMethod::Nearest,
        });
        assert_eq!(s.acceptable_codings(&stereo).unwrap()[0], ColorCoding::Raw16);
        assert_eq!(s.output_image_type(), ImageType::Color);
    }

    #[test]
    fn bus_generation_picks_speed() {
        let mut s = PendingSettings::default();
        assert_eq!(s.operation_mode(), OperationMode::Legacy);
        s.use_1394b = true;
        let cfg = s.capture_config();
        assert_eq!(cfg.operation_mode, OperationMode::B1394);
        assert_eq!(cfg.buffer_count, 4);
    }
}
