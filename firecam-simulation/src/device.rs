use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use firecam_core::builder::{
    CaptureConfig, CapturePolicy, Format7Info, FrameRate, IsoSpeed, OperationMode, VideoMode,
};
use firecam_core::error::{CameraError, Result};
use firecam_core::feature::{Feature, FeatureCaps, FeatureInfo};
use firecam_core::frame::{FrameTicket, RawFrame};
use firecam_core::guid::Guid;
use firecam_core::pixel_format::ColorCoding;
use firecam_core::traits::{CameraDevice, DeviceInfo, FeatureControl};

use crate::pattern::{self, TestPattern};
use crate::ring::{DmaRing, FilledBuffer, FrameShape};

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// 模拟 Feature 寄存器的静态描述
#[derive(Debug, Clone, PartialEq)]
pub struct SimFeatureSpec {
    pub feature: Feature,
    pub caps: FeatureCaps,
    pub raw_range: (u32, u32),
    pub abs_range: Option<(f32, f32)>,
    pub raw_value: u32,
}

impl SimFeatureSpec {
    /// 仅支持原始寄存器值的 Feature
    pub fn raw(feature: Feature, lo: u32, hi: u32) -> Self {
        Self {
            feature,
            caps: FeatureCaps::READOUT | FeatureCaps::MANUAL | FeatureCaps::ON_OFF,
            raw_range: (lo, hi),
            abs_range: None,
            raw_value: lo,
        }
    }

    /// 追加绝对值控制能力
    pub fn with_absolute(mut self, lo: f32, hi: f32) -> Self {
        self.caps |= FeatureCaps::ABSOLUTE;
        self.abs_range = Some((lo, hi));
        self
    }

    pub fn with_value(mut self, raw: u32) -> Self {
        self.raw_value = raw;
        self
    }
}

/// 一台模拟相机的能力描述
#[derive(Debug, Clone)]
pub struct SimCameraSpec {
    pub guid: Guid,
    pub unit: u16,
    pub vendor: String,
    pub model: String,
    pub bus: u32,
    pub supports_1394b: bool,
    pub fixed_modes: Vec<(VideoMode, Vec<FrameRate>)>,
    pub format7: Vec<Format7Info>,
    pub features: Vec<SimFeatureSpec>,
    pub pattern: TestPattern,
}

impl SimCameraSpec {
    /// 常见的单目工业相机：VGA/XGA 预设模式 + 一个 Format7 模式
    pub fn new(guid: u64, model: &str) -> Self {
        Self {
            guid: Guid(guid),
            unit: 0,
            vendor: "FireCam Simulated".to_string(),
            model: model.to_string(),
            bus: 0,
            supports_1394b: true,
            fixed_modes: vec![
                (
                    fixed(640, 480, ColorCoding::Mono8),
                    vec![FrameRate::F7_5, FrameRate::F15, FrameRate::F30, FrameRate::F60],
                ),
                (
                    fixed(640, 480, ColorCoding::Rgb8),
                    vec![FrameRate::F7_5, FrameRate::F15],
                ),
                (
                    fixed(1024, 768, ColorCoding::Mono8),
                    vec![FrameRate::F7_5, FrameRate::F15],
                ),
            ],
            format7: vec![Format7Info {
                mode: 0,
                max_width: 1280,
                max_height: 960,
                unit_width: 8,
                unit_height: 2,
                unit_left: 4,
                unit_top: 2,
                color_codings: vec![
                    ColorCoding::Mono8,
                    ColorCoding::Raw8,
                    ColorCoding::Rgb8,
                    ColorCoding::Mono16,
                    ColorCoding::Raw16,
                ],
            }],
            features: default_features(),
            pattern: TestPattern::default(),
        }
    }

    /// 单路物理流的立体相机：每个 16-bit 像素打包左右两路
    pub fn stereo(guid: u64, model: &str) -> Self {
        let mut spec = Self::new(guid, model);
        spec.fixed_modes = vec![(
            fixed(640, 480, ColorCoding::Mono16),
            vec![FrameRate::F15, FrameRate::F30],
        )];
        spec.format7 = vec![Format7Info {
            mode: 3,
            max_width: 1024,
            max_height: 768,
            unit_width: 4,
            unit_height: 2,
            unit_left: 4,
            unit_top: 2,
            color_codings: vec![ColorCoding::Mono16, ColorCoding::Raw16],
        }];
        spec
    }

    pub fn with_fixed_mode(
        mut self,
        width: u32,
        height: u32,
        coding: ColorCoding,
        rates: Vec<FrameRate>,
    ) -> Self {
        self.fixed_modes.push((fixed(width, height, coding), rates));
        self
    }

    pub fn with_format7(mut self, info: Format7Info) -> Self {
        self.format7.retain(|f| f.mode != info.mode);
        self.format7.push(info);
        self
    }

    /// 添加或替换一个 Feature
    pub fn with_feature(mut self, feature: SimFeatureSpec) -> Self {
        self.features.retain(|f| f.feature != feature.feature);
        self.features.push(feature);
        self
    }

    pub fn without_feature(mut self, feature: Feature) -> Self {
        self.features.retain(|f| f.feature != feature);
        self
    }

    pub fn with_pattern(mut self, pattern: TestPattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_bus(mut self, bus: u32) -> Self {
        self.bus = bus;
        self
    }

    pub fn legacy_only(mut self) -> Self {
        self.supports_1394b = false;
        self
    }
}

fn fixed(width: u32, height: u32, coding: ColorCoding) -> VideoMode {
    VideoMode::Fixed {
        width,
        height,
        coding,
    }
}

fn default_features() -> Vec<SimFeatureSpec> {
    vec![
        SimFeatureSpec::raw(Feature::Brightness, 0, 255).with_value(128),
        SimFeatureSpec::raw(Feature::Gamma, 0, 1023)
            .with_absolute(0.5, 4.0)
            .with_value(300),
        SimFeatureSpec::raw(Feature::Gain, 0, 680)
            .with_absolute(0.0, 24.0)
            .with_value(0),
        SimFeatureSpec::raw(Feature::Exposure, 1, 1023)
            .with_absolute(-7.5, 2.5)
            .with_value(512),
        SimFeatureSpec::raw(Feature::Shutter, 1, 4095)
            .with_absolute(0.000_02, 0.066)
            .with_value(400),
        SimFeatureSpec::raw(Feature::FrameRate, 0, 4095)
            .with_absolute(1.0, 60.0)
            .with_value(4095),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Roi {
    pub(crate) mode: u8,
    pub(crate) coding: ColorCoding,
    pub(crate) left: u32,
    pub(crate) top: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

#[derive(Debug, Default)]
pub(crate) struct DeviceState {
    pub(crate) mode: Option<VideoMode>,
    pub(crate) rate: Option<FrameRate>,
    pub(crate) roi: Option<Roi>,
    pub(crate) bus: Option<CaptureConfig>,
    pub(crate) buffers: Option<u32>,
    pub(crate) transmitting: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct FeatureRegister {
    pub(crate) caps: FeatureCaps,
    pub(crate) feature: Feature,
    pub(crate) raw_range: (u32, u32),
    pub(crate) abs_range: Option<(f32, f32)>,
    pub(crate) raw_value: u32,
    pub(crate) abs_value: f32,
    pub(crate) absolute_control: bool,
}

impl FeatureRegister {
    fn from_spec(spec: &SimFeatureSpec) -> Self {
        let mut reg = Self {
            caps: spec.caps,
            feature: spec.feature,
            raw_range: spec.raw_range,
            abs_range: spec.abs_range,
            raw_value: spec.raw_value,
            abs_value: 0.0,
            absolute_control: false,
        };
        reg.sync_abs_from_raw();
        reg
    }

    fn sync_abs_from_raw(&mut self) {
        if let Some((alo, ahi)) = self.abs_range {
            let (lo, hi) = self.raw_range;
            let t = if hi > lo {
                (self.raw_value.saturating_sub(lo)) as f32 / (hi - lo) as f32
            } else {
                0.0
            };
            self.abs_value = alo + t * (ahi - alo);
        }
    }

    fn sync_raw_from_abs(&mut self) {
        if let Some((alo, ahi)) = self.abs_range {
            let (lo, hi) = self.raw_range;
            let t = if ahi > alo {
                ((self.abs_value - alo) / (ahi - alo)).clamp(0.0, 1.0)
            } else {
                0.0
            };
            self.raw_value = lo + (t * (hi - lo) as f32).round() as u32;
        }
    }

    fn info(&self) -> FeatureInfo {
        FeatureInfo {
            feature: self.feature,
            caps: self.caps,
            raw_range: self.raw_range,
            abs_range: self.abs_range,
            raw_value: self.raw_value,
            abs_value: self.abs_range.map(|_| self.abs_value),
            absolute_control: self.absolute_control,
        }
    }
}

/// 总线上的一台模拟相机 (设备端状态)
#[derive(Debug)]
pub(crate) struct SimCamera {
    pub(crate) spec: SimCameraSpec,
    pub(crate) state: Mutex<DeviceState>,
    pub(crate) ring: Mutex<Option<Arc<DmaRing>>>,
    pub(crate) registers: Mutex<Vec<FeatureRegister>>,
    pub(crate) pattern: Mutex<TestPattern>,
    pub(crate) opened: AtomicBool,
    pub(crate) unplugged: AtomicBool,
    pub(crate) bus_resets: AtomicUsize,
    pub(crate) fail_capture_setup: AtomicBool,
}

impl SimCamera {
    pub(crate) fn new(spec: SimCameraSpec) -> Self {
        let registers = spec.features.iter().map(FeatureRegister::from_spec).collect();
        let pattern = spec.pattern;
        Self {
            spec,
            state: Mutex::new(DeviceState::default()),
            ring: Mutex::new(None),
            registers: Mutex::new(registers),
            pattern: Mutex::new(pattern),
            opened: AtomicBool::new(false),
            unplugged: AtomicBool::new(false),
            bus_resets: AtomicUsize::new(0),
            fail_capture_setup: AtomicBool::new(false),
        }
    }

    pub(crate) fn info(&self) -> DeviceInfo {
        DeviceInfo {
            guid: self.spec.guid,
            unit: self.spec.unit,
            vendor: self.spec.vendor.clone(),
            model: self.spec.model.clone(),
            bus: self.spec.bus,
        }
    }

    pub(crate) fn check_alive(&self) -> Result<()> {
        if self.unplugged.load(Ordering::SeqCst) {
            return Err(CameraError::Disconnected(format!(
                "{} ({})",
                self.spec.model, self.spec.guid
            )));
        }
        Ok(())
    }

    fn format7(&self, mode: u8) -> Option<&Format7Info> {
        self.spec.format7.iter().find(|f| f.mode == mode)
    }

    /// 当前生效的帧形状
    pub(crate) fn current_shape(&self) -> Option<FrameShape> {
        let state = lock(&self.state);
        match state.mode? {
            VideoMode::Fixed {
                width,
                height,
                coding,
            } => Some(FrameShape {
                width,
                height,
                coding,
            }),
            VideoMode::Format7(mode) => match state.roi {
                Some(roi) if roi.mode == mode => Some(FrameShape {
                    width: roi.width,
                    height: roi.height,
                    coding: roi.coding,
                }),
                _ => {
                    let info = self.format7(mode)?;
                    Some(FrameShape {
                        width: info.max_width,
                        height: info.max_height,
                        coding: *info.color_codings.first()?,
                    })
                }
            },
        }
    }

    /// 向 DMA Ring 写入一帧；`data` 为 None 时按测试图案生成
    pub(crate) fn produce(&self, data: Option<&[u8]>) -> bool {
        let Some(shape) = self.current_shape() else {
            return false;
        };
        let Some(ring) = lock(&self.ring).clone() else {
            return false;
        };
        let current = *lock(&self.pattern);

        ring.push(|buf, sequence| {
            match data {
                Some(bytes) => buf.extend_from_slice(bytes),
                None => pattern::generate(
                    buf,
                    current,
                    shape.width,
                    shape.height,
                    shape.coding,
                    sequence,
                ),
            }
            shape
        })
    }

    fn with_register<R>(
        &self,
        feature: Feature,
        op: impl FnOnce(&mut FeatureRegister) -> Result<R>,
    ) -> Result<R> {
        self.check_alive()?;
        let mut regs = lock(&self.registers);
        let reg = regs
            .iter_mut()
            .find(|r| r.feature == feature)
            .ok_or(CameraError::FeatureUnsupported(feature))?;
        op(reg)
    }

    pub(crate) fn override_raw_range(&self, feature: Feature, lo: u32, hi: u32) -> bool {
        let mut regs = lock(&self.registers);
        match regs.iter_mut().find(|r| r.feature == feature) {
            Some(reg) => {
                reg.raw_range = (lo, hi);
                reg.raw_value = reg.raw_value.clamp(lo, hi);
                reg.sync_abs_from_raw();
                true
            }
            None => false,
        }
    }

    pub(crate) fn register(&self, feature: Feature) -> Option<FeatureRegister> {
        lock(&self.registers)
            .iter()
            .find(|r| r.feature == feature)
            .cloned()
    }

    fn release(&self) {
        {
            let mut state = lock(&self.state);
            state.transmitting = false;
            state.buffers = None;
        }
        *lock(&self.ring) = None;
        self.opened.store(false, Ordering::SeqCst);
    }
}

/// 模拟相机的数据面
#[derive(Debug)]
pub struct SimDevice {
    camera: Arc<SimCamera>,
    info: DeviceInfo,
    /// 已出队、尚未归还的槽位
    held: Vec<FilledBuffer>,
    timeout: Duration,
}

impl SimDevice {
    pub(crate) fn new(camera: Arc<SimCamera>, timeout: Duration) -> Self {
        let info = camera.info();
        Self {
            camera,
            info,
            held: Vec::new(),
            timeout,
        }
    }

    fn ring(&self) -> Result<Arc<DmaRing>> {
        lock(&self.camera.ring)
            .clone()
            .ok_or_else(|| CameraError::Driver("capture buffers are not allocated".into()))
    }
}

impl CameraDevice for SimDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn video_modes(&self) -> Result<Vec<VideoMode>> {
        self.camera.check_alive()?;
        let spec = &self.camera.spec;
        let mut modes: Vec<VideoMode> = spec.fixed_modes.iter().map(|(m, _)| *m).collect();
        modes.extend(spec.format7.iter().map(|f| VideoMode::Format7(f.mode)));
        Ok(modes)
    }

    fn frame_rates(&self, mode: VideoMode) -> Result<Vec<FrameRate>> {
        self.camera.check_alive()?;
        if mode.is_scalable() {
            return Ok(Vec::new());
        }
        self.camera
            .spec
            .fixed_modes
            .iter()
            .find(|(m, _)| *m == mode)
            .map(|(_, rates)| rates.clone())
            .ok_or(CameraError::FormatNotSupported)
    }

    fn format7_info(&self, mode: u8) -> Result<Format7Info> {
        self.camera.check_alive()?;
        self.camera
            .format7(mode)
            .cloned()
            .ok_or(CameraError::FormatNotSupported)
    }

    fn set_video_mode(&mut self, mode: VideoMode) -> Result<()> {
        if !self.video_modes()?.contains(&mode) {
            return Err(CameraError::FormatNotSupported);
        }
        let mut state = lock(&self.camera.state);
        if state.buffers.is_some() {
            return Err(CameraError::DeviceBusy);
        }
        if state.mode != Some(mode) {
            state.rate = None;
        }
        state.mode = Some(mode);
        Ok(())
    }

    fn set_frame_rate(&mut self, rate: FrameRate) -> Result<()> {
        self.camera.check_alive()?;
        let mode = lock(&self.camera.state)
            .mode
            .ok_or(CameraError::FormatNotSupported)?;
        if !self.frame_rates(mode)?.contains(&rate) {
            return Err(CameraError::FormatNotSupported);
        }
        lock(&self.camera.state).rate = Some(rate);
        Ok(())
    }

    fn set_format7_roi(
        &mut self,
        mode: u8,
        coding: ColorCoding,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    ) -> Result<()> {
        self.camera.check_alive()?;
        let info = self
            .camera
            .format7(mode)
            .ok_or(CameraError::FormatNotSupported)?;

        let aligned = width > 0
            && height > 0
            && width % info.unit_width == 0
            && height % info.unit_height == 0
            && left % info.unit_left == 0
            && top % info.unit_top == 0;
        let fits = left + width <= info.max_width && top + height <= info.max_height;

        if !aligned || !fits || !info.color_codings.contains(&coding) {
            tracing::debug!(
                target: "firecam::sim",
                "Rejecting Format7 ROI {}x{}+{}+{} {}",
                width,
                height,
                left,
                top,
                coding
            );
            return Err(CameraError::FormatNotSupported);
        }

        let mut state = lock(&self.camera.state);
        if state.buffers.is_some() {
            return Err(CameraError::DeviceBusy);
        }
        state.roi = Some(Roi {
            mode,
            coding,
            left,
            top,
            width,
            height,
        });
        Ok(())
    }

    fn current_format(&self) -> Result<(u32, u32, ColorCoding)> {
        self.camera.check_alive()?;
        self.camera
            .current_shape()
            .map(|s| (s.width, s.height, s.coding))
            .ok_or(CameraError::FormatNotSupported)
    }

    fn set_bus_config(&mut self, config: &CaptureConfig) -> Result<()> {
        self.camera.check_alive()?;
        let wants_b = config.operation_mode == OperationMode::B1394;
        if wants_b && !self.camera.spec.supports_1394b {
            return Err(CameraError::FormatNotSupported);
        }
        // 1394a 最高 S400
        if !wants_b && config.iso_speed > IsoSpeed::S400 {
            return Err(CameraError::FormatNotSupported);
        }
        lock(&self.camera.state).bus = Some(config.clone());
        Ok(())
    }

    fn capture_setup(&mut self, buffer_count: u32) -> Result<()> {
        self.camera.check_alive()?;
        if self.camera.fail_capture_setup.swap(false, Ordering::SeqCst) {
            return Err(CameraError::Driver("DMA buffer allocation failed".into()));
        }
        let mut state = lock(&self.camera.state);
        if state.buffers.is_some() {
            return Err(CameraError::DeviceBusy);
        }
        if state.mode.is_none() {
            return Err(CameraError::FormatNotSupported);
        }
        state.buffers = Some(buffer_count);
        *lock(&self.camera.ring) = Some(Arc::new(DmaRing::new(buffer_count as usize)));
        tracing::debug!(target: "firecam::sim", "Allocated {} DMA buffers", buffer_count);
        Ok(())
    }

    fn capture_stop(&mut self) -> Result<()> {
        self.held.clear();
        {
            let mut state = lock(&self.camera.state);
            state.transmitting = false;
            state.buffers = None;
        }
        *lock(&self.camera.ring) = None;
        Ok(())
    }

    fn set_transmission(&mut self, on: bool) -> Result<()> {
        self.camera.check_alive()?;
        lock(&self.camera.state).transmitting = on;
        Ok(())
    }

    fn transmission(&self) -> Result<bool> {
        self.camera.check_alive()?;
        Ok(lock(&self.camera.state).transmitting)
    }

    fn one_shot(&mut self) -> Result<()> {
        self.camera.check_alive()?;
        self.ring()?;
        // One-Shot 不依赖连续传输开关，直接写入一帧
        self.camera.produce(None);
        Ok(())
    }

    fn dequeue(&mut self, policy: CapturePolicy) -> Result<Option<FrameTicket>> {
        self.camera.check_alive()?;
        let ring = self.ring()?;
        let Some(buffer) = ring.pop(policy, self.timeout) else {
            return match policy {
                CapturePolicy::Poll => Ok(None),
                CapturePolicy::Wait => Err(CameraError::Timeout),
            };
        };
        // 拔出发生在等待期间
        if let Err(e) = self.camera.check_alive() {
            ring.recycle(buffer.slot, buffer.data);
            return Err(e);
        }

        let ticket = FrameTicket {
            slot: buffer.slot,
            frames_behind: ring.queued() as u32,
        };
        self.held.push(buffer);
        Ok(Some(ticket))
    }

    fn frame(&self, slot: usize) -> Result<RawFrame<'_>> {
        let buffer = self
            .held
            .iter()
            .find(|b| b.slot == slot)
            .ok_or_else(|| CameraError::Driver(format!("slot {slot} is not dequeued")))?;

        Ok(RawFrame {
            data: &buffer.data,
            width: buffer.width,
            height: buffer.height,
            stride: buffer.coding.frame_bytes(buffer.width, 1),
            coding: buffer.coding,
            sequence: buffer.sequence,
            timestamp: buffer.timestamp,
        })
    }

    fn enqueue(&mut self, slot: usize) -> Result<()> {
        let idx = self
            .held
            .iter()
            .position(|b| b.slot == slot)
            .ok_or_else(|| CameraError::Driver(format!("slot {slot} is not dequeued")))?;
        let buffer = self.held.swap_remove(idx);
        if let Some(ring) = lock(&self.camera.ring).clone() {
            ring.recycle(buffer.slot, buffer.data);
        }
        Ok(())
    }
}

impl Drop for SimDevice {
    fn drop(&mut self) {
        self.held.clear();
        self.camera.release();
        tracing::debug!(target: "firecam::sim", "Device {} released", self.info.guid);
    }
}

/// 模拟相机的控制面
#[derive(Debug)]
pub struct SimFeatures {
    camera: Arc<SimCamera>,
}

impl SimFeatures {
    pub(crate) fn new(camera: Arc<SimCamera>) -> Self {
        Self { camera }
    }
}

impl FeatureControl for SimFeatures {
    fn features(&self) -> Result<Vec<FeatureInfo>> {
        self.camera.check_alive()?;
        Ok(lock(&self.camera.registers)
            .iter()
            .map(FeatureRegister::info)
            .collect())
    }

    fn raw_range(&self, feature: Feature) -> Result<(u32, u32)> {
        self.camera.with_register(feature, |r| Ok(r.raw_range))
    }

    fn absolute_range(&self, feature: Feature) -> Result<(f32, f32)> {
        self.camera
            .with_register(feature, |r| r.abs_range.ok_or(CameraError::FeatureUnsupported(feature)))
    }

    fn raw_value(&self, feature: Feature) -> Result<u32> {
        self.camera.with_register(feature, |r| {
            if !r.caps.contains(FeatureCaps::READOUT) {
                return Err(CameraError::Driver(format!("{feature} is not readable")));
            }
            Ok(r.raw_value)
        })
    }

    fn set_raw_value(&self, feature: Feature, value: u32) -> Result<()> {
        self.camera.with_register(feature, |r| {
            let (lo, hi) = r.raw_range;
            if value < lo || value > hi {
                return Err(CameraError::Driver(format!(
                    "{feature} raw value {value} outside [{lo}, {hi}]"
                )));
            }
            r.raw_value = value;
            r.sync_abs_from_raw();
            Ok(())
        })
    }

    fn absolute_value(&self, feature: Feature) -> Result<f32> {
        self.camera.with_register(feature, |r| {
            r.abs_range
                .map(|_| r.abs_value)
                .ok_or(CameraError::FeatureUnsupported(feature))
        })
    }

    fn set_absolute_value(&self, feature: Feature, value: f32) -> Result<()> {
        self.camera.with_register(feature, |r| {
            let (lo, hi) = r.abs_range.ok_or(CameraError::FeatureUnsupported(feature))?;
            if !r.absolute_control {
                return Err(CameraError::Driver(format!(
                    "{feature} absolute control is off"
                )));
            }
            if value < lo || value > hi {
                return Err(CameraError::Driver(format!(
                    "{feature} absolute value {value} outside [{lo}, {hi}]"
                )));
            }
            r.abs_value = value;
            r.sync_raw_from_abs();
            Ok(())
        })
    }

    fn set_absolute_control(&self, feature: Feature, on: bool) -> Result<()> {
        self.camera.with_register(feature, |r| {
            if on && !r.caps.contains(FeatureCaps::ABSOLUTE) {
                return Err(CameraError::FeatureUnsupported(feature));
            }
            r.absolute_control = on;
            Ok(())
        })
    }
}

/// 测试侧句柄：向模拟相机注入帧、观察设备状态
#[derive(Debug, Clone)]
pub struct SimCameraHandle {
    pub(crate) camera: Arc<SimCamera>,
}

impl SimCameraHandle {
    pub fn guid(&self) -> Guid {
        self.camera.spec.guid
    }

    pub fn is_open(&self) -> bool {
        self.camera.opened.load(Ordering::SeqCst)
    }

    pub fn is_transmitting(&self) -> bool {
        lock(&self.camera.state).transmitting
    }

    /// 已分配的 DMA 缓冲区数量
    pub fn capture_buffers(&self) -> Option<u32> {
        lock(&self.camera.state).buffers
    }

    pub fn video_mode(&self) -> Option<VideoMode> {
        lock(&self.camera.state).mode
    }

    pub fn frame_rate(&self) -> Option<FrameRate> {
        lock(&self.camera.state).rate
    }

    /// 当前 Format7 ROI: (left, top, width, height)
    pub fn roi(&self) -> Option<(u32, u32, u32, u32)> {
        lock(&self.camera.state)
            .roi
            .map(|r| (r.left, r.top, r.width, r.height))
    }

    pub fn roi_coding(&self) -> Option<ColorCoding> {
        lock(&self.camera.state).roi.map(|r| r.coding)
    }

    pub fn bus_config(&self) -> Option<CaptureConfig> {
        lock(&self.camera.state).bus.clone()
    }

    /// 连续传输开启时按测试图案产生 n 帧，返回实际写入数
    pub fn emit_frames(&self, n: usize) -> usize {
        if !self.is_transmitting() || self.camera.unplugged.load(Ordering::SeqCst) {
            return 0;
        }
        (0..n).filter(|_| self.camera.produce(None)).count()
    }

    /// 注入一帧自定义数据 (尺寸与编码取当前协商结果)
    pub fn inject_frame(&self, data: &[u8]) -> bool {
        if !self.is_transmitting() || self.camera.unplugged.load(Ordering::SeqCst) {
            return false;
        }
        self.camera.produce(Some(data))
    }

    pub fn set_pattern(&self, pattern: TestPattern) {
        *lock(&self.camera.pattern) = pattern;
    }

    /// Ring 中等待消费的帧数
    pub fn queued_frames(&self) -> usize {
        lock(&self.camera.ring)
            .as_ref()
            .map(|r| r.queued())
            .unwrap_or(0)
    }

    pub fn free_slots(&self) -> usize {
        lock(&self.camera.ring)
            .as_ref()
            .map(|r| r.free_slots())
            .unwrap_or(0)
    }

    pub fn ring_depth(&self) -> Option<usize> {
        lock(&self.camera.ring).as_ref().map(|r| r.depth())
    }

    /// 被驱动覆盖或丢弃的帧数
    pub fn dropped_frames(&self) -> u64 {
        lock(&self.camera.ring)
            .as_ref()
            .map(|r| r.dropped())
            .unwrap_or(0)
    }

    pub fn bus_resets(&self) -> usize {
        self.camera.bus_resets.load(Ordering::SeqCst)
    }

    /// 模拟拔线
    pub fn unplug(&self) {
        self.camera.unplugged.store(true, Ordering::SeqCst);
    }

    pub fn replug(&self) {
        self.camera.unplugged.store(false, Ordering::SeqCst);
    }

    /// 让下一次 DMA 缓冲区分配失败
    pub fn fail_next_capture_setup(&self) {
        self.camera.fail_capture_setup.store(true, Ordering::SeqCst);
    }

    /// 修改某 Feature 的原始范围 (模拟模式协商后范围变化)
    pub fn set_raw_range(&self, feature: Feature, lo: u32, hi: u32) -> bool {
        self.camera.override_raw_range(feature, lo, hi)
    }

    /// 直接读取设备寄存器 (绕过 FeatureControl)
    pub fn raw_register(&self, feature: Feature) -> Option<u32> {
        self.camera.register(feature).map(|r| r.raw_value)
    }

    pub fn absolute_register(&self, feature: Feature) -> Option<f32> {
        self.camera
            .register(feature)
            .and_then(|r| r.abs_range.map(|_| r.abs_value))
    }

    pub fn absolute_control(&self, feature: Feature) -> Option<bool> {
        self.camera.register(feature).map(|r| r.absolute_control)
    }
}
