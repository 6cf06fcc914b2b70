use std::fmt::{self, Display};

/// IIDC 颜色编码 (Color Coding)，由驱动在每个视频模式上报告
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum ColorCoding {
    Mono8,
    Yuv411,
    Yuv422,
    Yuv444,
    Rgb8,
    Mono16,
    Rgb16,
    Mono16s,
    Rgb16s,
    /// 未经去马赛克的 Bayer 原始数据 (8-bit)
    Raw8,
    /// 未经去马赛克的 Bayer 原始数据 (16-bit)
    Raw16,
}

impl ColorCoding {
    /// 每像素比特数 (Bits Per Pixel)，用于计算 Frame 大小与带宽
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            Self::Mono8 | Self::Raw8 => 8,
            Self::Yuv411 => 12,
            Self::Yuv422 | Self::Mono16 | Self::Mono16s | Self::Raw16 => 16,
            Self::Yuv444 | Self::Rgb8 => 24,
            Self::Rgb16 | Self::Rgb16s => 48,
        }
    }

    /// 单通道 16-bit 编码：立体相机把左右两路 8-bit 像素打包在这里
    pub fn is_16bit_single_channel(&self) -> bool {
        matches!(self, Self::Mono16 | Self::Mono16s | Self::Raw16)
    }

    /// 是否为 Bayer 原始格式 (需要 Demosaic)
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw8 | Self::Raw16)
    }

    /// 单通道 8-bit 编码，可作为 Bayer 马赛克输入
    pub fn is_8bit_single_channel(&self) -> bool {
        matches!(self, Self::Mono8 | Self::Raw8)
    }

    /// 一帧所需字节数
    pub fn frame_bytes(&self, width: u32, height: u32) -> usize {
        (width as usize * height as usize * self.bits_per_pixel() as usize) / 8
    }
}

impl Display for ColorCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mono8 => "Mono 8-bit",
            Self::Yuv411 => "YUV411",
            Self::Yuv422 => "YUV422",
            Self::Yuv444 => "YUV444",
            Self::Rgb8 => "RGB 8-bit",
            Self::Mono16 => "Mono 16-bit",
            Self::Rgb16 => "RGB 16-bit",
            Self::Mono16s => "Mono 16-bit (signed)",
            Self::Rgb16s => "RGB 16-bit (signed)",
            Self::Raw8 => "RAW 8-bit",
            Self::Raw16 => "RAW 16-bit",
        };
        f.write_str(name)
    }
}

/// 马赛克中单个像素的颜色分量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
}

/// Bayer 滤镜排列，名称按左上角 2x2 块从左到右、从上到下读取
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum ColorFilter {
    Rggb,
    Gbrg,
    Grbg,
    Bggr,
}

impl ColorFilter {
    /// 返回 (x, y) 处像素对应的颜色分量
    pub fn color_at(&self, x: u32, y: u32) -> Channel {
        use Channel::*;
        // (0,0), (1,0), (0,1), (1,1)
        let cell = match self {
            Self::Rggb => [Red, Green, Green, Blue],
            Self::Gbrg => [Green, Blue, Red, Green],
            Self::Grbg => [Green, Red, Blue, Green],
            Self::Bggr => [Blue, Green, Green, Red],
        };
        cell[((y & 1) * 2 + (x & 1)) as usize]
    }
}

/// 去马赛克插值方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum BayerMethod {
    /// 取 2x2 块内最近的同色像素
    Nearest,
    /// 2x2 块内取 R/B，两个 G 求平均
    #[default]
    Simple,
    /// 3x3 邻域双线性插值
    Bilinear,
}

/// 立体相机的左右通道打包方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum StereoMethod {
    /// 每个 16-bit 像素的两个字节分别属于左、右两路
    #[default]
    Interlaced,
    /// 两路 8-bit 图像在一帧中先后存放
    Field,
}

/// 输出图像的像素布局 (Image 协作方使用)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum ImageType {
    #[default]
    Grayscale,
    Color,
    ColorAlpha,
}

impl ImageType {
    pub fn channels(&self) -> u8 {
        match self {
            Self::Grayscale => 1,
            Self::Color => 3,
            Self::ColorAlpha => 4,
        }
    }

    /// 输出该类型时可直接拷贝的驱动编码
    pub fn from_coding(coding: ColorCoding) -> Option<Self> {
        match coding {
            ColorCoding::Mono8 | ColorCoding::Raw8 => Some(Self::Grayscale),
            ColorCoding::Rgb8 => Some(Self::Color),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_pattern_reads_top_left_cell() {
        assert_eq!(ColorFilter::Rggb.color_at(0, 0), Channel::Red);
        assert_eq!(ColorFilter::Rggb.color_at(1, 1), Channel::Blue);
        assert_eq!(ColorFilter::Bggr.color_at(2, 0), Channel::Blue);
        assert_eq!(ColorFilter::Gbrg.color_at(1, 0), Channel::Blue);
        assert_eq!(ColorFilter::Grbg.color_at(0, 3), Channel::Blue);
        assert_eq!(ColorFilter::Grbg.color_at(3, 3), Channel::Green);
    }

    #[test]
    fn frame_bytes_follow_bpp() {
        assert_eq!(ColorCoding::Mono8.frame_bytes(640, 480), 640 * 480);
        assert_eq!(ColorCoding::Yuv411.frame_bytes(640, 480), 640 * 480 * 3 / 2);
        assert_eq!(ColorCoding::Mono16.frame_bytes(4, 2), 16);
        assert_eq!(ColorCoding::Rgb8.frame_bytes(2, 2), 12);
    }
}
