use crate::pixel_format::ColorCoding;

/// DMA Ring Buffer 默认深度：驱动在用户取走之前最多缓存的帧数
pub const DEFAULT_BUFFER_COUNT: u32 = 4;

/// 相机视频模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum VideoMode {
    /// 预设模式：尺寸与编码固定，帧率从固定档位中选
    Fixed {
        width: u32,
        height: u32,
        coding: ColorCoding,
    },
    /// Format7 可伸缩模式 (0~7)：自定义 ROI 与编码
    Format7(u8),
}

impl VideoMode {
    pub fn is_scalable(&self) -> bool {
        matches!(self, Self::Format7(_))
    }
}

/// IIDC 固定帧率档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum FrameRate {
    F1_875,
    F3_75,
    F7_5,
    F15,
    F30,
    F60,
    F120,
    F240,
}

impl FrameRate {
    pub const ALL: [FrameRate; 8] = [
        FrameRate::F1_875,
        FrameRate::F3_75,
        FrameRate::F7_5,
        FrameRate::F15,
        FrameRate::F30,
        FrameRate::F60,
        FrameRate::F120,
        FrameRate::F240,
    ];

    pub fn fps(&self) -> f32 {
        match self {
            Self::F1_875 => 1.875,
            Self::F3_75 => 3.75,
            Self::F7_5 => 7.5,
            Self::F15 => 15.0,
            Self::F30 => 30.0,
            Self::F60 => 60.0,
            Self::F120 => 120.0,
            Self::F240 => 240.0,
        }
    }

    /// 在候选档位中选择与目标帧率最接近的一档
    ///
    /// `target <= 0` 表示"尽可能快"，返回最高档。
    pub fn nearest(target: f32, candidates: &[FrameRate]) -> Option<FrameRate> {
        if target <= 0.0 {
            return candidates.iter().copied().max();
        }
        candidates.iter().copied().min_by(|a, b| {
            let da = (a.fps() - target).abs();
            let db = (b.fps() - target).abs();
            da.total_cmp(&db)
        })
    }
}

/// Format7 模式能力描述
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Format7Info {
    pub mode: u8,
    pub max_width: u32,
    pub max_height: u32,
    /// 尺寸步进 (宽、高必须是它的整数倍)
    pub unit_width: u32,
    pub unit_height: u32,
    /// ROI 偏移步进
    pub unit_left: u32,
    pub unit_top: u32,
    pub color_codings: Vec<ColorCoding>,
}

/// 总线工作模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum OperationMode {
    /// IEEE-1394a
    #[default]
    Legacy,
    /// IEEE-1394b
    B1394,
}

/// 等时传输速率 (Mbps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum IsoSpeed {
    S100,
    S200,
    S400,
    S800,
    S1600,
    S3200,
}

impl IsoSpeed {
    pub fn mbps(&self) -> u32 {
        match self {
            Self::S100 => 100,
            Self::S200 => 200,
            Self::S400 => 400,
            Self::S800 => 800,
            Self::S1600 => 1600,
            Self::S3200 => 3200,
        }
    }
}

/// 取帧策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum CapturePolicy {
    /// 阻塞等待下一帧 (直到驱动超时)
    Wait,
    /// 立即返回，Ring 为空时报告"无帧"
    #[default]
    Poll,
}

/// 下发给驱动的传输配置
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct CaptureConfig {
    /// Ring Buffer 大小，默认 4
    pub buffer_count: u32,
    pub operation_mode: OperationMode,
    pub iso_speed: IsoSpeed,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureConfig {
    pub fn new() -> Self {
        Self {
            buffer_count: DEFAULT_BUFFER_COUNT,
            operation_mode: OperationMode::Legacy,
            iso_speed: IsoSpeed::S400,
        }
    }

    /// 按总线代际选择工作模式与速率：1394b 跑 S800，1394a 跑 S400
    pub fn bus_generation(mut self, use_1394b: bool) -> Self {
        if use_1394b {
            self.operation_mode = OperationMode::B1394;
            self.iso_speed = IsoSpeed::S800;
        } else {
            self.operation_mode = OperationMode::Legacy;
            self.iso_speed = IsoSpeed::S400;
        }
        self
    }

    /// 设置缓冲区数量 (默认 4)
    pub fn buffer_count(mut self, count: u32) -> Self {
        self.buffer_count = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_rate_prefers_closest_and_fastest_for_zero() {
        let rates = [FrameRate::F7_5, FrameRate::F15, FrameRate::F30];
        assert_eq!(FrameRate::nearest(0.0, &rates), Some(FrameRate::F30));
        assert_eq!(FrameRate::nearest(14.0, &rates), Some(FrameRate::F15));
        assert_eq!(FrameRate::nearest(100.0, &rates), Some(FrameRate::F30));
        assert_eq!(FrameRate::nearest(1.0, &rates), Some(FrameRate::F7_5));
        assert_eq!(FrameRate::nearest(30.0, &[]), None);
    }

    #[test]
    fn bus_generation_selects_speed() {
        let b = CaptureConfig::new().bus_generation(true);
        assert_eq!(b.operation_mode, OperationMode::B1394);
        assert_eq!(b.iso_speed, IsoSpeed::S800);
        let a = b.bus_generation(false);
        assert_eq!(a.iso_speed, IsoSpeed::S400);
        assert_eq!(a.buffer_count, DEFAULT_BUFFER_COUNT);
    }
}
