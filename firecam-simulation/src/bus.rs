use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use firecam_core::error::{CameraError, Result};
use firecam_core::guid::Guid;
use firecam_core::traits::{BusContext, CameraDevice, DeviceInfo, FeatureControl};

use crate::device::{lock, SimCamera, SimDevice, SimFeatures};

/// 模拟的 1394 总线：所有挂载的相机与上下文计数
#[derive(Debug)]
pub(crate) struct SimBus {
    pub(crate) cameras: Mutex<Vec<Arc<SimCamera>>>,
    pub(crate) contexts_created: AtomicUsize,
    pub(crate) contexts_released: AtomicUsize,
    pub(crate) fail_init: AtomicBool,
    pub(crate) timeout: Mutex<Duration>,
}

impl SimBus {
    pub(crate) fn new() -> Self {
        Self {
            cameras: Mutex::new(Vec::new()),
            contexts_created: AtomicUsize::new(0),
            contexts_released: AtomicUsize::new(0),
            fail_init: AtomicBool::new(false),
            timeout: Mutex::new(Duration::from_millis(200)),
        }
    }

    fn find(&self, guid: Guid) -> Option<Arc<SimCamera>> {
        lock(&self.cameras)
            .iter()
            .find(|c| c.spec.guid == guid && !c.unplugged.load(Ordering::SeqCst))
            .cloned()
    }
}

/// 驱动库上下文；Drop 时计入释放次数
#[derive(Debug)]
pub struct SimContext {
    bus: Arc<SimBus>,
    id: usize,
}

impl SimContext {
    pub(crate) fn new(bus: Arc<SimBus>) -> Result<Self> {
        if bus.fail_init.load(Ordering::SeqCst) {
            return Err(CameraError::ContextInit(
                "simulated bus refused initialization".into(),
            ));
        }
        let id = bus.contexts_created.fetch_add(1, Ordering::SeqCst);
        tracing::info!(target: "firecam::sim", "Bus context #{} created", id);
        Ok(Self { bus, id })
    }
}

impl BusContext for SimContext {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(lock(&self.bus.cameras)
            .iter()
            .filter(|c| !c.unplugged.load(Ordering::SeqCst))
            .map(|c| c.info())
            .collect())
    }

    fn open(&self, guid: Guid) -> Result<(Box<dyn CameraDevice>, Box<dyn FeatureControl>)> {
        let camera = self
            .bus
            .find(guid)
            .ok_or_else(|| CameraError::DeviceNotFound(guid.to_string()))?;

        // 独占访问
        if camera.opened.swap(true, Ordering::SeqCst) {
            return Err(CameraError::DeviceBusy);
        }

        let timeout = *lock(&self.bus.timeout);
        tracing::debug!(target: "firecam::sim", "Opened {} ({})", camera.spec.model, guid);
        Ok((
            Box::new(SimDevice::new(camera.clone(), timeout)),
            Box::new(SimFeatures::new(camera)),
        ))
    }

    fn reset_bus(&self, guid: Guid) -> Result<()> {
        let camera = self
            .bus
            .find(guid)
            .ok_or_else(|| CameraError::DeviceNotFound(guid.to_string()))?;
        camera.bus_resets.fetch_add(1, Ordering::SeqCst);
        tracing::info!(target: "firecam::sim", "Bus reset issued on bus {}", camera.spec.bus);
        Ok(())
    }
}

impl Drop for SimContext {
    fn drop(&mut self) {
        self.bus.contexts_released.fetch_add(1, Ordering::SeqCst);
        tracing::info!(target: "firecam::sim", "Bus context #{} released", self.id);
    }
}
