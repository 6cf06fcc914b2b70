use crate::builder::{CaptureConfig, CapturePolicy, Format7Info, FrameRate, VideoMode};
use crate::error::Result;
use crate::feature::{Feature, FeatureInfo};
use crate::frame::{FrameTicket, RawFrame};
use crate::guid::Guid;
use crate::pixel_format::ColorCoding;

/// 设备基本信息
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct DeviceInfo {
    /// 64 位 GUID，Open 时使用
    pub guid: Guid,

    /// 同一 GUID 下的逻辑单元号
    pub unit: u16,

    /// 厂商名称 (e.g. "Point Grey Research")
    pub vendor: String,

    /// 型号名称 (e.g. "Bumblebee2")
    pub model: String,

    /// 所在总线编号
    pub bus: u32,
}

/// 1. 驱动入口：创建驱动库上下文
pub trait Driver: Send + Sync {
    /// 初始化驱动库 (对应 dc1394_new)，失败属于进程级致命错误
    fn new_context(&self) -> Result<Box<dyn BusContext>>;

    /// 后端类型标识 (e.g. "libdc1394", "simulation")
    fn name(&self) -> &str;
}

/// 2. 驱动库上下文：设备枚举、打开与总线复位
///
/// Drop 即释放驱动库上下文。
pub trait BusContext: Send + Sync {
    /// 扫描总线，返回设备列表 (枚举顺序即 index)
    fn list_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// 打开设备
    /// 返回分离的数据面 (CameraDevice) 与控制面 (FeatureControl)
    fn open(&self, guid: Guid) -> Result<(Box<dyn CameraDevice>, Box<dyn FeatureControl>)>;

    /// 对指定设备所在总线发出 Bus Reset
    fn reset_bus(&self, guid: Guid) -> Result<()>;
}

/// 3. 数据面：模式协商与 DMA 取帧
pub trait CameraDevice: Send {
    fn info(&self) -> &DeviceInfo;

    // --- 能力查询 ---

    /// 设备支持的所有视频模式
    fn video_modes(&self) -> Result<Vec<VideoMode>>;

    /// 预设模式支持的固定帧率
    fn frame_rates(&self, mode: VideoMode) -> Result<Vec<FrameRate>>;

    /// Format7 模式能力
    fn format7_info(&self, mode: u8) -> Result<Format7Info>;

    // --- 协商 ---

    fn set_video_mode(&mut self, mode: VideoMode) -> Result<()>;

    fn set_frame_rate(&mut self, rate: FrameRate) -> Result<()>;

    /// 设置 Format7 ROI，尺寸与偏移必须已按步进量化
    fn set_format7_roi(
        &mut self,
        mode: u8,
        coding: ColorCoding,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    ) -> Result<()>;

    /// 当前协商生效的图像尺寸与编码
    fn current_format(&self) -> Result<(u32, u32, ColorCoding)>;

    /// 应用总线工作模式与 ISO 速率
    fn set_bus_config(&mut self, config: &CaptureConfig) -> Result<()>;

    // --- 传输 ---

    /// 分配 DMA 缓冲区 (Alloc buffers)
    fn capture_setup(&mut self, buffer_count: u32) -> Result<()>;

    /// 释放 DMA 缓冲区
    fn capture_stop(&mut self) -> Result<()>;

    /// 开/关连续传输 (Start/Stop ISO)
    fn set_transmission(&mut self, on: bool) -> Result<()>;

    fn transmission(&self) -> Result<bool>;

    /// 触发单帧传输 (One-Shot)
    fn one_shot(&mut self) -> Result<()>;

    // --- Ring Buffer 借用语义 ---

    /// 出队一帧；Poll 策略下 Ring 为空返回 Ok(None)，Wait 策略下超时返回 `CameraError::Timeout`
    fn dequeue(&mut self, policy: CapturePolicy) -> Result<Option<FrameTicket>>;

    /// 查看已出队槽位的数据，生命周期绑定到 self
    fn frame(&self, slot: usize) -> Result<RawFrame<'_>>;

    /// 将槽位归还给驱动的空闲池
    fn enqueue(&mut self, slot: usize) -> Result<()>;
}

/// 4. 控制面：Feature 寄存器读写
pub trait FeatureControl: Send + Sync {
    /// 列出设备上可用的全部 Feature
    fn features(&self) -> Result<Vec<FeatureInfo>>;

    /// 原始寄存器值范围；不支持的 Feature 返回 FeatureUnsupported
    fn raw_range(&self, feature: Feature) -> Result<(u32, u32)>;

    /// 物理单位范围；不支持绝对值控制时返回 FeatureUnsupported
    fn absolute_range(&self, feature: Feature) -> Result<(f32, f32)>;

    fn raw_value(&self, feature: Feature) -> Result<u32>;

    fn set_raw_value(&self, feature: Feature, value: u32) -> Result<()>;

    fn absolute_value(&self, feature: Feature) -> Result<f32>;

    fn set_absolute_value(&self, feature: Feature, value: f32) -> Result<()>;

    /// 切换绝对值控制模式
    fn set_absolute_control(&self, feature: Feature, on: bool) -> Result<()>;
}
