//! 进程内模拟的 IIDC 总线
//!
//! 不依赖任何硬件即可驱动 `firecam` 的完整生命周期：
//! 设备枚举、模式协商、DMA Ring 取帧、Feature 寄存器读写以及拔线等故障注入。

#![warn(missing_debug_implementations, rust_2018_idioms)]

mod bus;
mod device;
mod pattern;
mod ring;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use firecam_core::error::Result;
use firecam_core::guid::Guid;
use firecam_core::traits::{BusContext, Driver};

use crate::bus::{SimBus, SimContext};
use crate::device::{lock, SimCamera};

pub use crate::device::{SimCameraHandle, SimCameraSpec, SimDevice, SimFeatureSpec, SimFeatures};
pub use crate::pattern::TestPattern;
pub use crate::bus::SimContext as SimBusContext;

/// 模拟驱动
///
/// 克隆后共享同一条总线，测试代码可以一边把它交给 `ContextManager`，
/// 一边通过 [`SimCameraHandle`] 观察设备状态。
#[derive(Debug, Clone)]
pub struct SimDriver {
    bus: Arc<SimBus>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// 空总线
    pub fn new() -> Self {
        Self {
            bus: Arc::new(SimBus::new()),
        }
    }

    /// 挂载一台相机 (Builder 风格)
    pub fn with_camera(self, spec: SimCameraSpec) -> Self {
        self.add_camera(spec);
        self
    }

    /// Wait 策略下取帧的最长等待时间
    pub fn with_timeout(self, timeout: Duration) -> Self {
        *lock(&self.bus.timeout) = timeout;
        self
    }

    pub fn add_camera(&self, spec: SimCameraSpec) -> SimCameraHandle {
        let camera = Arc::new(SimCamera::new(spec));
        lock(&self.bus.cameras).push(camera.clone());
        SimCameraHandle { camera }
    }

    /// 按挂载顺序取得相机句柄
    pub fn camera(&self, index: usize) -> Option<SimCameraHandle> {
        lock(&self.bus.cameras)
            .get(index)
            .cloned()
            .map(|camera| SimCameraHandle { camera })
    }

    pub fn camera_by_guid(&self, guid: Guid) -> Option<SimCameraHandle> {
        lock(&self.bus.cameras)
            .iter()
            .find(|c| c.spec.guid == guid)
            .cloned()
            .map(|camera| SimCameraHandle { camera })
    }

    /// 让之后的上下文初始化失败
    pub fn fail_context_init(&self, fail: bool) {
        self.bus.fail_init.store(fail, Ordering::SeqCst);
    }

    pub fn contexts_created(&self) -> usize {
        self.bus.contexts_created.load(Ordering::SeqCst)
    }

    pub fn contexts_released(&self) -> usize {
        self.bus.contexts_released.load(Ordering::SeqCst)
    }

    /// 当前存活的上下文数量
    pub fn live_contexts(&self) -> usize {
        self.contexts_created() - self.contexts_released()
    }
}

impl Driver for SimDriver {
    fn new_context(&self) -> Result<Box<dyn BusContext>> {
        Ok(Box::new(SimContext::new(self.bus.clone())?))
    }

    fn name(&self) -> &str {
        "simulation"
    }
}
