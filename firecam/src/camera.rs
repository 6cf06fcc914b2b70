use firecam_core::builder::{FrameRate, VideoMode};
use firecam_core::error::{CameraError, Result};
use firecam_core::feature::Feature;
use firecam_core::guid::Guid;
use firecam_core::pixel_format::{BayerMethod, ColorCoding, ColorFilter, ImageType, StereoMethod};
use firecam_core::traits::{CameraDevice, DeviceInfo, FeatureControl};

use crate::acquisition;
use crate::context::{ContextManager, DeviceContextRef};
use crate::image::Image;
use crate::pipeline::{BayerDemosaic, Pipeline, StereoDeinterleave};
use crate::settings::{quantize_position, quantize_size, BayerSettings, PendingSettings, StereoConfig};
use crate::state::{CameraState, StateMachine};
use crate::translate::{Unit, ValueTranslator};

/// 一台 IEEE-1394 相机 (或一台单流立体相机)
///
/// # 生命周期
/// 1. `Camera::new` 获取驱动库上下文引用
/// 2. 在 `setup` 之前调用各种 `set_*` 暂存配置
/// 3. `setup` 打开设备并一次性应用配置
/// 4. `grab_video` / `grab_still` 取帧
/// 5. `close` (或 Drop) 释放设备
pub struct Camera {
    context: DeviceContextRef,
    machine: StateMachine,
    pub(crate) settings: PendingSettings,
    pub(crate) stereo: StereoConfig,
    device: Option<Box<dyn CameraDevice>>,
    pub(crate) features: Option<Box<dyn FeatureControl>>,
    guid: Option<Guid>,
    video_mode: Option<VideoMode>,
    frame_rate_actual: Option<FrameRate>,
    coding: Option<ColorCoding>,
    pipeline: Pipeline,
}

impl Camera {
    pub fn new(contexts: &ContextManager) -> Result<Self> {
        Ok(Self {
            context: contexts.acquire()?,
            machine: StateMachine::default(),
            settings: PendingSettings::default(),
            stereo: StereoConfig::default(),
            device: None,
            features: None,
            guid: None,
            video_mode: None,
            frame_rate_actual: None,
            coding: None,
            pipeline: Pipeline::new(),
        })
    }

    /// 单流立体相机 (例如 Bumblebee 系列)
    pub fn new_stereo(contexts: &ContextManager) -> Result<Self> {
        let mut cam = Self::new(contexts)?;
        cam.stereo.enabled = true;
        Ok(cam)
    }

    /// 总线上可见的相机数量
    pub fn camera_count(contexts: &ContextManager) -> Result<usize> {
        Ok(contexts.acquire()?.list_devices()?.len())
    }

    // --- 暂存设置 ---

    pub fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.stage("set_size", |s, _| {
            s.width = width;
            s.height = height;
        })
    }

    /// ROI 偏移，仅 Format7 下生效
    pub fn set_position(&mut self, left: u32, top: u32) -> Result<()> {
        self.stage("set_position", |s, _| {
            s.left = left;
            s.top = top;
        })
    }

    pub fn set_image_type(&mut self, image_type: ImageType) -> Result<()> {
        self.stage("set_image_type", |s, _| s.image_type = image_type)
    }

    pub fn set_format7(&mut self, use_format7: bool, mode: u8) -> Result<()> {
        self.stage("set_format7", |s, _| {
            s.format7 = use_format7.then_some(mode);
        })
    }

    pub fn set_1394b(&mut self, use_1394b: bool) -> Result<()> {
        self.stage("set_1394b", |s, _| s.use_1394b = use_1394b)
    }

    pub fn set_bayer_mode(&mut self, filter: ColorFilter, method: BayerMethod) -> Result<()> {
        self.stage("set_bayer_mode", |s, _| {
            s.bayer = Some(BayerSettings { filter, method });
        })
    }

    pub fn disable_bayer(&mut self) -> Result<()> {
        self.stage("disable_bayer", |s, _| s.bayer = None)
    }

    /// 期望帧率；0 表示最快
    pub fn set_frame_rate(&mut self, frame_rate: f32) -> Result<()> {
        self.stage("set_frame_rate", |s, _| s.frame_rate = frame_rate.max(0.0))
    }

    /// DMA Ring 深度 (默认 4)
    pub fn set_buffer_count(&mut self, count: u32) -> Result<()> {
        self.stage("set_buffer_count", |s, _| s.buffer_count = count.max(1))
    }

    pub fn set_stereo_camera(&mut self, is_stereo: bool) -> Result<()> {
        self.stage("set_stereo_camera", |_, st| st.enabled = is_stereo)
    }

    pub fn set_stereo_method(&mut self, method: StereoMethod) -> Result<()> {
        self.stage("set_stereo_method", |_, st| st.method = method)
    }

    /// 阻塞策略可随时切换，下一次 grab_video 生效
    pub fn set_blocking(&mut self, blocking: bool) {
        self.settings.blocking = blocking;
    }

    // --- 查询 ---

    pub fn get_image_type(&self) -> ImageType {
        self.settings.output_image_type()
    }

    pub fn get_blocking(&self) -> bool {
        self.settings.blocking
    }

    /// setup 之后返回量化后的实际宽度
    pub fn get_width(&self) -> u32 {
        self.settings.width
    }

    pub fn get_height(&self) -> u32 {
        self.settings.height
    }

    pub fn get_frame_rate(&self) -> f32 {
        self.settings.frame_rate
    }

    /// 协商得到的 IIDC 固定帧率；Format7 模式下为 None
    pub fn get_frame_rate_actual(&self) -> Option<FrameRate> {
        self.frame_rate_actual
    }

    pub fn is_stereo_camera(&self) -> bool {
        self.stereo.enabled
    }

    /// 16 位十六进制 GUID
    pub fn get_guid(&self) -> Option<String> {
        self.guid.map(|g| g.to_string())
    }

    pub fn state(&self) -> CameraState {
        self.machine.current()
    }

    pub fn is_ready(&self) -> bool {
        self.machine.current().is_ready()
    }

    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.device.as_deref().map(|d| d.info())
    }

    pub fn video_mode(&self) -> Option<VideoMode> {
        self.video_mode
    }

    /// 驱动实际交付的颜色编码
    pub fn color_coding(&self) -> Option<ColorCoding> {
        self.coding
    }

    pub fn settings(&self) -> &PendingSettings {
        &self.settings
    }

    pub fn stereo_config(&self) -> StereoConfig {
        self.stereo
    }

    pub fn driver_name(&self) -> &str {
        self.context.driver_name()
    }

    pub(crate) fn require_ready(&self) -> Result<()> {
        self.machine.require_ready()
    }

    pub(crate) fn translator(&self) -> Result<ValueTranslator<'_>> {
        self.machine.require_ready()?;
        let features = self.features.as_deref().ok_or(CameraError::NotReady)?;
        Ok(ValueTranslator::new(features))
    }

    // --- 生命周期 ---

    /// 按枚举顺序打开第 `index` 台相机
    pub fn setup(&mut self, index: usize) -> Result<()> {
        self.release_device();
        let devices = self.context.list_devices()?;
        let guid = devices
            .get(index)
            .map(|d| d.guid)
            .ok_or_else(|| {
                CameraError::DeviceNotFound(format!(
                    "camera index {} out of range ({} found)",
                    index,
                    devices.len()
                ))
            })?;
        self.open_and_configure(guid)
    }

    /// 按 GUID 字符串打开相机 (例如 "00b09d0100a01a4e")
    pub fn setup_guid(&mut self, guid: &str) -> Result<()> {
        self.release_device();
        let guid = parse_guid(guid)?;
        if !self.context.list_devices()?.iter().any(|d| d.guid == guid) {
            return Err(CameraError::DeviceNotFound(guid.to_string()));
        }
        self.open_and_configure(guid)
    }

    /// 开始连续传输
    pub fn start(&mut self) -> Result<()> {
        self.machine.require_ready()?;
        if self.state() == CameraState::Streaming {
            return Ok(());
        }
        let device = self.device.as_deref_mut().ok_or(CameraError::NotReady)?;
        device.set_transmission(true)?;
        self.machine.transition(CameraState::Streaming, "start")?;
        tracing::info!(target: "firecam::camera", "Camera {} streaming", self.guid_label());
        Ok(())
    }

    /// 停止连续传输并清空积压的帧
    pub fn stop(&mut self) -> Result<()> {
        self.machine.require_ready()?;
        if self.state() != CameraState::Streaming {
            return Ok(());
        }
        let device = self.device.as_deref_mut().ok_or(CameraError::NotReady)?;
        device.set_transmission(false)?;
        acquisition::flush(device)?;
        self.machine.transition(CameraState::Stopped, "stop")?;
        tracing::info!(target: "firecam::camera", "Camera {} stopped", self.guid_label());
        Ok(())
    }

    /// 释放设备；可重复调用
    pub fn close(&mut self) {
        self.release_device();
        // Closed 可从任意状态到达
        let _ = self.machine.transition(CameraState::Closed, "close");
    }

    /// 对第 `index` 台相机所在总线发出 Bus Reset，不影响本对象的状态
    pub fn reset_bus(&self, index: usize) -> Result<()> {
        let devices = self.context.list_devices()?;
        let info = devices.get(index).ok_or_else(|| {
            CameraError::DeviceNotFound(format!("camera index {} out of range", index))
        })?;
        self.context.bus().reset_bus(info.guid)
    }

    pub fn reset_bus_guid(&self, guid: &str) -> Result<()> {
        let guid = parse_guid(guid)?;
        self.context.bus().reset_bus(guid)
    }

    // --- 取帧 ---

    /// One-Shot 单帧采集，无论阻塞策略如何都会等待
    pub fn grab_still(&mut self, img: &mut Image) -> Result<bool> {
        self.grab_still_into(&mut [img])
    }

    /// 立体相机的 One-Shot 采集
    pub fn grab_still_stereo(&mut self, left: &mut Image, right: &mut Image) -> Result<bool> {
        if !self.stereo.enabled {
            return Err(CameraError::NotStereoConfigured);
        }
        self.grab_still_into(&mut [left, right])
    }

    /// 连续采集；非阻塞模式下 Ring 为空时返回 Ok(false)
    ///
    /// `drop_frames` 为 true 时丢弃积压只保留最新一帧。
    pub fn grab_video(&mut self, img: &mut Image, drop_frames: bool) -> Result<bool> {
        self.grab_video_into(&mut [img], drop_frames)
    }

    pub fn grab_video_stereo(
        &mut self,
        left: &mut Image,
        right: &mut Image,
        drop_frames: bool,
    ) -> Result<bool> {
        if !self.stereo.enabled {
            return Err(CameraError::NotStereoConfigured);
        }
        self.grab_video_into(&mut [left, right], drop_frames)
    }

    /// 丢弃 Ring 中所有待处理的帧
    pub fn flush_buffer(&mut self) -> Result<usize> {
        self.machine.require_ready()?;
        let device = self.device.as_deref_mut().ok_or(CameraError::NotReady)?;
        match acquisition::flush(device) {
            Ok(n) => Ok(n),
            Err(e) => Err(self.grab_failed(e)),
        }
    }

    fn grab_still_into(&mut self, outputs: &mut [&mut Image]) -> Result<bool> {
        self.machine.require_ready()?;
        let device = self.device.as_deref_mut().ok_or(CameraError::NotReady)?;
        let result = acquisition::grab_still(device, &self.pipeline, outputs);

        // One-Shot 关闭了连续传输
        if self.state() == CameraState::Streaming {
            self.machine.transition(CameraState::Stopped, "grab_still")?;
        }
        result.map_err(|e| self.grab_failed(e))
    }

    fn grab_video_into(&mut self, outputs: &mut [&mut Image], drop_frames: bool) -> Result<bool> {
        self.machine.require_ready()?;
        if self.state() != CameraState::Streaming {
            self.start().map_err(|e| self.grab_failed(e))?;
        }
        let policy = self.settings.capture_policy();
        let device = self.device.as_deref_mut().ok_or(CameraError::NotReady)?;
        acquisition::grab(device, policy, drop_frames, &self.pipeline, outputs)
            .map_err(|e| self.grab_failed(e))
    }

    /// 取帧失败：释放 DMA 缓冲区并退回 Opened，调用方需要重新 setup
    fn grab_failed(&mut self, e: CameraError) -> CameraError {
        let err = match e {
            CameraError::GrabFailed(_) => e,
            other => CameraError::GrabFailed(other.to_string()),
        };
        tracing::error!(target: "firecam::camera", "Camera {}: {}", self.guid_label(), err);

        if let Some(device) = self.device.as_deref_mut() {
            let _ = device.set_transmission(false);
            let _ = device.capture_stop();
        }
        let _ = self.machine.transition(CameraState::Opened, "grab");
        err
    }

    // --- 内部：打开与协商 ---

    fn open_and_configure(&mut self, guid: Guid) -> Result<()> {
        let (device, features) = self.context.bus().open(guid)?;
        tracing::info!(
            target: "firecam::camera",
            "Opened {} {} ({})",
            device.info().vendor,
            device.info().model,
            guid
        );
        self.device = Some(device);
        self.features = Some(features);
        self.guid = Some(guid);
        self.machine.transition(CameraState::Opened, "setup")?;
        self.configure()
    }

    fn configure(&mut self) -> Result<()> {
        match self.negotiate() {
            Ok(()) => self.machine.transition(CameraState::Configured, "setup"),
            Err(e) => {
                if let Some(device) = self.device.as_deref_mut() {
                    let _ = device.capture_stop();
                }
                let err = match e {
                    CameraError::ConfigurationRejected(_) => e,
                    other => CameraError::ConfigurationRejected(other.to_string()),
                };
                tracing::warn!(target: "firecam::camera", "Camera {}: {}", self.guid_label(), err);
                Err(err)
            }
        }
    }

    /// 已配置状态下修改结构性设置：释放缓冲区后重新协商
    fn renegotiate(&mut self, operation: &'static str) -> Result<()> {
        if let Some(device) = self.device.as_deref_mut() {
            device.capture_stop()?;
        }
        self.machine.transition(CameraState::Opened, operation)?;
        self.configure()
    }

    fn stage(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&mut PendingSettings, &mut StereoConfig),
    ) -> Result<()> {
        self.machine.require_not_streaming(operation)?;
        if !self.is_ready() {
            apply(&mut self.settings, &mut self.stereo);
            return Ok(());
        }

        // 已配置：先保存当前可用的配置，新配置被拒绝时回滚
        let previous = (self.settings.clone(), self.stereo);
        apply(&mut self.settings, &mut self.stereo);
        tracing::debug!(target: "firecam::camera", "{} triggers renegotiation", operation);

        let err = match self.renegotiate(operation) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        (self.settings, self.stereo) = previous;
        match self.renegotiate(operation) {
            Ok(()) => tracing::warn!(
                target: "firecam::camera",
                "Camera {}: {} rejected, previous configuration restored",
                self.guid_label(),
                operation
            ),
            Err(e) => tracing::error!(
                target: "firecam::camera",
                "Camera {}: failed to restore previous configuration: {}",
                self.guid_label(),
                e
            ),
        }
        Err(match err {
            CameraError::ConfigurationRejected(_) => err,
            other => CameraError::ConfigurationRejected(other.to_string()),
        })
    }

    fn negotiate(&mut self) -> Result<()> {
        let device = self.device.as_deref_mut().ok_or(CameraError::NotReady)?;
        let features = self.features.as_deref();
        let settings = &mut self.settings;

        // 1. 总线代际与 ISO 速率
        let config = settings.capture_config();
        device.set_bus_config(&config)?;
        tracing::debug!(
            target: "firecam::camera",
            "Bus config: {:?} @ {} Mb/s, {} buffers",
            config.operation_mode,
            config.iso_speed.mbps(),
            config.buffer_count
        );

        // 2. 按图像类型 / Bayer / 立体模式确定可接受的编码
        let codings = settings.acceptable_codings(&self.stereo)?;

        // 3. 视频模式与帧率
        let (mode, rate) = match settings.format7 {
            Some(mode) => {
                negotiate_format7(device, features, settings, mode, &codings)?;
                (VideoMode::Format7(mode), None)
            }
            None => {
                let (mode, rate) = negotiate_fixed(device, settings, &codings)?;
                (mode, Some(rate))
            }
        };

        // 4. 分配 DMA 缓冲区
        device.capture_setup(settings.buffer_count)?;

        let (width, height, coding) = device.current_format()?;
        settings.width = width;
        settings.height = height;

        self.video_mode = Some(mode);
        self.frame_rate_actual = rate;
        self.coding = Some(coding);
        self.pipeline = build_pipeline(settings, &self.stereo);

        tracing::info!(
            target: "firecam::camera",
            "Configured {}x{} {} {:?} rate={:?} buffers={} pipeline={:?}",
            width,
            height,
            coding,
            mode,
            rate,
            settings.buffer_count,
            self.pipeline.stage_names()
        );
        Ok(())
    }

    /// 关闭传输、释放缓冲区与设备句柄；上下文引用保留到 Drop
    fn release_device(&mut self) {
        if let Some(mut device) = self.device.take() {
            if self.machine.current() == CameraState::Streaming {
                let _ = device.set_transmission(false);
            }
            if self.machine.current().is_ready() {
                let _ = device.capture_stop();
            }
            tracing::info!(target: "firecam::camera", "Closed camera {}", device.info().guid);
        }
        self.features = None;
        self.guid = None;
        self.video_mode = None;
        self.frame_rate_actual = None;
        self.coding = None;
        if self.machine.current().is_open() {
            let _ = self.machine.transition(CameraState::Closed, "close");
        }
    }

    fn guid_label(&self) -> String {
        self.guid.map(|g| g.to_string()).unwrap_or_else(|| "-".into())
    }
}

fn negotiate_format7(
    device: &mut dyn CameraDevice,
    features: Option<&dyn FeatureControl>,
    settings: &mut PendingSettings,
    mode: u8,
    codings: &[ColorCoding],
) -> Result<()> {
    let info = device.format7_info(mode).map_err(|_| {
        CameraError::ConfigurationRejected(format!("Format7 mode {} is not available", mode))
    })?;
    let coding = codings
        .iter()
        .copied()
        .find(|c| info.color_codings.contains(c))
        .ok_or_else(|| {
            CameraError::ConfigurationRejected(format!(
                "Format7 mode {} supports none of {:?}",
                mode, codings
            ))
        })?;

    device.set_video_mode(VideoMode::Format7(mode))?;

    // 1. 按设备步进量化
    let (width, height) = quantize_size(settings.width, settings.height, &info);
    let (left, top) = quantize_position(settings.left, settings.top, width, height, &info);
    if (width, height, left, top) != (settings.width, settings.height, settings.left, settings.top) {
        tracing::warn!(
            target: "firecam::camera",
            "ROI {}x{}+{}+{} quantized to {}x{}+{}+{}",
            settings.width,
            settings.height,
            settings.left,
            settings.top,
            width,
            height,
            left,
            top
        );
    }
    device.set_format7_roi(mode, coding, left, top, width, height)?;
    settings.width = width;
    settings.height = height;
    settings.left = left;
    settings.top = top;

    // 2. Format7 没有固定帧率，尝试写 FrameRate Feature
    if settings.frame_rate > 0.0 {
        if let Some(features) = features {
            match ValueTranslator::new(features).set(
                Feature::FrameRate,
                Unit::Absolute,
                f64::from(settings.frame_rate),
            ) {
                Ok(()) => {}
                Err(CameraError::FeatureUnsupported(_)) => tracing::debug!(
                    target: "firecam::camera",
                    "Frame rate request ignored: device has no absolute FrameRate feature"
                ),
                Err(e) => tracing::warn!(
                    target: "firecam::camera",
                    "Failed to apply Format7 frame rate: {}",
                    e
                ),
            }
        }
    }
    Ok(())
}

fn negotiate_fixed(
    device: &mut dyn CameraDevice,
    settings: &PendingSettings,
    codings: &[ColorCoding],
) -> Result<(VideoMode, FrameRate)> {
    let modes = device.video_modes()?;
    let mode = codings
        .iter()
        .find_map(|want| {
            modes.iter().copied().find(|m| {
                matches!(m, VideoMode::Fixed { width, height, coding }
                    if *width == settings.width && *height == settings.height && coding == want)
            })
        })
        .ok_or_else(|| {
            CameraError::ConfigurationRejected(format!(
                "no fixed video mode {}x{} with {:?}",
                settings.width, settings.height, codings
            ))
        })?;
    device.set_video_mode(mode)?;

    let rates = device.frame_rates(mode)?;
    let rate = FrameRate::nearest(settings.frame_rate, &rates).ok_or_else(|| {
        CameraError::ConfigurationRejected(format!("{:?} reports no frame rates", mode))
    })?;
    device.set_frame_rate(rate)?;
    if settings.frame_rate > 0.0 && (rate.fps() - settings.frame_rate).abs() > f32::EPSILON {
        tracing::debug!(
            target: "firecam::camera",
            "Requested {} fps, using {} fps",
            settings.frame_rate,
            rate.fps()
        );
    }
    Ok((mode, rate))
}

/// 无法解析的 GUID 字符串同样视为找不到设备
fn parse_guid(guid: &str) -> Result<Guid> {
    guid.parse()
        .map_err(|_| CameraError::DeviceNotFound(format!("invalid GUID {:?}", guid)))
}

fn build_pipeline(settings: &PendingSettings, stereo: &StereoConfig) -> Pipeline {
    let mut pipeline = Pipeline::new();
    if stereo.enabled {
        pipeline.push(Box::new(StereoDeinterleave {
            method: stereo.method,
        }));
    }
    if let Some(bayer) = settings.bayer {
        pipeline.push(Box::new(BayerDemosaic {
            filter: bayer.filter,
            method: bayer.method,
        }));
    }
    pipeline
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera")
            .field("state", &self.state())
            .field("guid", &self.get_guid())
            .field("settings", &self.settings)
            .field("stereo", &self.stereo)
            .field("video_mode", &self.video_mode)
            .finish()
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firecam_core::builder::CapturePolicy;
    use firecam_simulation::{SimCameraSpec, SimDriver};

    fn rig() -> (SimDriver, ContextManager) {
        let driver = SimDriver::new().with_camera(SimCameraSpec::new(0x00b0_9d01_00a0_1a4e, "Flea"));
        let contexts = ContextManager::new(driver.clone());
        (driver, contexts)
    }

    #[test]
    fn fixed_mode_negotiation_picks_nearest_rate() {
        let (driver, contexts) = rig();
        let mut cam = Camera::new(&contexts).unwrap();
        cam.set_frame_rate(20.0).unwrap();
        cam.setup(0).unwrap();

        assert_eq!(cam.state(), CameraState::Configured);
        assert_eq!(cam.get_frame_rate_actual(), Some(FrameRate::F15));
        assert_eq!(driver.camera(0).unwrap().frame_rate(), Some(FrameRate::F15));
        assert_eq!(cam.color_coding(), Some(ColorCoding::Mono8));
        assert_eq!(cam.get_guid().as_deref(), Some("00b09d0100a01a4e"));
    }

    #[test]
    fn unsupported_size_is_rejected_and_not_ready() {
        let (driver, contexts) = rig();
        let mut cam = Camera::new(&contexts).unwrap();
        cam.set_size(800, 600).unwrap();
        assert!(matches!(
            cam.setup(0),
            Err(CameraError::ConfigurationRejected(_))
        ));
        assert_eq!(cam.state(), CameraState::Opened);
        assert!(!cam.is_ready());
        assert_eq!(driver.camera(0).unwrap().capture_buffers(), None);
    }

    #[test]
    fn color_alpha_has_no_coding() {
        let (_driver, contexts) = rig();
        let mut cam = Camera::new(&contexts).unwrap();
        cam.set_image_type(ImageType::ColorAlpha).unwrap();
        assert!(cam.setup(0).is_err());
        assert!(!cam.is_ready());
    }

    #[test]
    fn structural_setters_renegotiate_while_stopped() {
        let (driver, contexts) = rig();
        let mut cam = Camera::new(&contexts).unwrap();
        cam.setup(0).unwrap();
        cam.start().unwrap();
        assert!(matches!(
            cam.set_size(1024, 768),
            Err(CameraError::InvalidState { .. })
        ));

        cam.stop().unwrap();
        cam.set_size(1024, 768).unwrap();
        assert_eq!(cam.state(), CameraState::Configured);
        assert_eq!(cam.get_width(), 1024);
        assert!(matches!(
            driver.camera(0).unwrap().video_mode(),
            Some(VideoMode::Fixed { width: 1024, .. })
        ));
    }

    #[test]
    fn rejected_setter_restores_previous_configuration() {
        let (driver, contexts) = rig();
        let handle = driver.camera(0).unwrap();
        let mut cam = Camera::new(&contexts).unwrap();
        cam.setup(0).unwrap();
        cam.start().unwrap();
        cam.stop().unwrap();

        assert!(matches!(
            cam.set_size(800, 600),
            Err(CameraError::ConfigurationRejected(_))
        ));
        assert_eq!(cam.state(), CameraState::Configured);
        assert!(cam.is_ready());
        assert_eq!((cam.get_width(), cam.get_height()), (640, 480));
        assert_eq!(handle.capture_buffers(), Some(4));

        // 回滚后的相机照常工作
        cam.start().unwrap();
        handle.emit_frames(1);
        let mut img = Image::empty();
        assert!(cam.grab_video(&mut img, true).unwrap());
        assert_eq!((img.width, img.height), (640, 480));
    }

    #[test]
    fn rejected_stereo_switch_is_rolled_back() {
        let (_driver, contexts) = rig();
        let mut cam = Camera::new(&contexts).unwrap();
        cam.setup(0).unwrap();

        // 单目相机没有 16-bit 立体模式
        assert!(cam.set_stereo_camera(true).is_err());
        assert!(!cam.is_stereo_camera());
        assert_eq!(cam.state(), CameraState::Configured);
        assert_eq!(cam.color_coding(), Some(ColorCoding::Mono8));
    }

    #[test]
    fn stereo_rejects_color_types_without_bayer() {
        let driver = SimDriver::new().with_camera(SimCameraSpec::stereo(2, "Bumblebee2"));
        let contexts = ContextManager::new(driver);
        let mut cam = Camera::new_stereo(&contexts).unwrap();
        cam.set_image_type(ImageType::ColorAlpha).unwrap();
        assert!(matches!(
            cam.setup(0),
            Err(CameraError::ConfigurationRejected(_))
        ));
        assert!(!cam.is_ready());

        cam.set_image_type(ImageType::Grayscale).unwrap();
        cam.setup(0).unwrap();
        assert_eq!(cam.get_image_type(), ImageType::Grayscale);
    }

    #[test]
    fn blocking_can_change_while_streaming() {
        let (_driver, contexts) = rig();
        let mut cam = Camera::new(&contexts).unwrap();
        cam.setup(0).unwrap();
        cam.start().unwrap();
        cam.set_blocking(true);
        assert!(cam.get_blocking());
        assert_eq!(cam.settings().capture_policy(), CapturePolicy::Wait);
    }
}
