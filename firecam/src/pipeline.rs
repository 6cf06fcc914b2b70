//! 原始帧 -> 图像的后处理流水线
//!
//! 立体拆分与 Bayer 解码是两个独立的阶段，按顺序作用在一组平面 (Plane) 上。
//! 新的解码阶段只需要实现 [`FrameStage`]，不必改动取帧循环。

use std::borrow::Cow;
use std::fmt;

use firecam_core::error::{CameraError, Result};
use firecam_core::frame::RawFrame;
use firecam_core::pixel_format::{BayerMethod, ColorCoding, ColorFilter, ImageType, StereoMethod};

use crate::bayer;
use crate::image::Image;

/// 流水线中流转的一幅图像平面
///
/// 未经修改的数据直接借用 DMA 槽位。
#[derive(Debug, Clone)]
pub struct Plane<'a> {
    pub width: u32,
    pub height: u32,
    pub coding: ColorCoding,
    pub data: Cow<'a, [u8]>,
}

impl<'a> Plane<'a> {
    /// 从原始帧构造，去掉行尾 Padding
    pub fn from_frame(frame: &RawFrame<'a>) -> Result<Self> {
        let len = frame.payload_len();
        let row = frame.coding.frame_bytes(frame.width, 1);
        let needed = match frame.height as usize {
            0 => 0,
            h => frame.stride * (h - 1) + row,
        };
        if frame.stride < row || frame.data.len() < needed {
            return Err(CameraError::GrabFailed(format!(
                "short frame: {} bytes for {}x{} {}",
                frame.data.len(),
                frame.width,
                frame.height,
                frame.coding
            )));
        }

        let data = if frame.stride == row {
            Cow::Borrowed(&frame.data[..len.min(frame.data.len())])
        } else {
            Cow::Owned(frame.packed())
        };
        Ok(Self {
            width: frame.width,
            height: frame.height,
            coding: frame.coding,
            data,
        })
    }

    /// 写入输出图像
    pub fn write_to(&self, img: &mut Image) -> Result<()> {
        let image_type = ImageType::from_coding(self.coding).ok_or_else(|| {
            CameraError::GrabFailed(format!("{} cannot be written to an image", self.coding))
        })?;
        img.assign(self.width, self.height, image_type, &self.data);
        Ok(())
    }
}

/// 流水线阶段
pub trait FrameStage: Send + fmt::Debug {
    fn name(&self) -> &'static str;

    fn apply<'a>(&self, planes: Vec<Plane<'a>>) -> Result<Vec<Plane<'a>>>;
}

/// 把一个 16-bit 物理帧拆成左右两幅 8-bit 图像
#[derive(Debug, Clone, Copy)]
pub struct StereoDeinterleave {
    pub method: StereoMethod,
}

impl StereoDeinterleave {
    fn split<'a>(&self, plane: Plane<'a>) -> Result<[Plane<'a>; 2]> {
        if !plane.coding.is_16bit_single_channel() {
            return Err(CameraError::GrabFailed(format!(
                "stereo frames must be 16-bit single channel, got {}",
                plane.coding
            )));
        }
        // RAW16 拆出来仍是马赛克，交给后续 Bayer 阶段
        let coding = if plane.coding.is_raw() {
            ColorCoding::Raw8
        } else {
            ColorCoding::Mono8
        };
        let (width, height) = (plane.width, plane.height);
        let half = width as usize * height as usize;

        let (left, right): (Cow<'a, [u8]>, Cow<'a, [u8]>) = match self.method {
            StereoMethod::Interlaced => {
                // 每个 16-bit 像素 = (左, 右)
                let (l, r): (Vec<u8>, Vec<u8>) =
                    plane.data.chunks_exact(2).map(|p| (p[0], p[1])).unzip();
                (Cow::Owned(l), Cow::Owned(r))
            }
            StereoMethod::Field => match plane.data {
                // 前半帧为左图，后半帧为右图，可以继续借用
                Cow::Borrowed(data) => {
                    let (l, r) = data.split_at(half);
                    (Cow::Borrowed(l), Cow::Borrowed(&r[..half]))
                }
                Cow::Owned(data) => (
                    Cow::Owned(data[..half].to_vec()),
                    Cow::Owned(data[half..half * 2].to_vec()),
                ),
            },
        };

        Ok([
            Plane {
                width,
                height,
                coding,
                data: left,
            },
            Plane {
                width,
                height,
                coding,
                data: right,
            },
        ])
    }
}

impl FrameStage for StereoDeinterleave {
    fn name(&self) -> &'static str {
        "stereo-deinterleave"
    }

    fn apply<'a>(&self, planes: Vec<Plane<'a>>) -> Result<Vec<Plane<'a>>> {
        let mut out = Vec::with_capacity(planes.len() * 2);
        for plane in planes {
            out.extend(self.split(plane)?);
        }
        Ok(out)
    }
}

/// 对每个平面做 Bayer 解码
#[derive(Debug, Clone, Copy)]
pub struct BayerDemosaic {
    pub filter: ColorFilter,
    pub method: BayerMethod,
}

impl FrameStage for BayerDemosaic {
    fn name(&self) -> &'static str {
        "bayer-demosaic"
    }

    fn apply<'a>(&self, planes: Vec<Plane<'a>>) -> Result<Vec<Plane<'a>>> {
        planes
            .into_iter()
            .map(|plane| {
                if !plane.coding.is_8bit_single_channel() {
                    return Err(CameraError::GrabFailed(format!(
                        "Bayer decoding needs an 8-bit mosaic, got {}",
                        plane.coding
                    )));
                }
                let rgb = bayer::demosaic(
                    &plane.data,
                    plane.width,
                    plane.height,
                    self.filter,
                    self.method,
                );
                Ok(Plane {
                    width: plane.width,
                    height: plane.height,
                    coding: ColorCoding::Rgb8,
                    data: Cow::Owned(rgb),
                })
            })
            .collect()
    }
}

/// 阶段的有序组合
#[derive(Debug, Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn FrameStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage<S: FrameStage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn push(&mut self, stage: Box<dyn FrameStage>) {
        self.stages.push(stage);
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// 一帧进，若干平面出 (立体模式下为两个)
    pub fn run<'a>(&self, frame: &RawFrame<'a>) -> Result<Vec<Plane<'a>>> {
        let mut planes = vec![Plane::from_frame(frame)?];
        for stage in &self.stages {
            planes = stage.apply(planes)?;
        }
        Ok(planes)
    }
}
