//! 驱动库上下文的引用计数管理
//!
//! 第一个 Camera 构造时创建上下文，最后一个 Camera 析构时释放。
//! 计数由 `Arc` 承担，管理器自身只保存一个 `Weak`，
//! 因此上下文的生命周期完全体现在类型上，没有全局可变状态。

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use firecam_core::error::{CameraError, Result};
use firecam_core::traits::{BusContext, DeviceInfo, Driver};

/// 驱动库上下文 (对应 dc1394_t)
pub struct SharedContext {
    bus: Box<dyn BusContext>,
    driver: String,
}

impl SharedContext {
    pub fn bus(&self) -> &dyn BusContext {
        self.bus.as_ref()
    }

    /// 后端名称
    pub fn driver_name(&self) -> &str {
        &self.driver
    }

    pub fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        self.bus.list_devices()
    }
}

impl fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContext")
            .field("driver", &self.driver)
            .finish()
    }
}

impl Drop for SharedContext {
    fn drop(&mut self) {
        tracing::info!(target: "firecam::context", "Releasing {} bus context", self.driver);
    }
}

/// 每个 Camera 持有的一份上下文引用
pub type DeviceContextRef = Arc<SharedContext>;

/// 进程内共享的上下文管理器
///
/// 可以放进 `Arc` 或 `static` 中供多个线程同时构造/析构 Camera。
pub struct ContextManager {
    driver: Arc<dyn Driver>,
    slot: Mutex<Weak<SharedContext>>,
}

impl ContextManager {
    pub fn new<D: Driver + 'static>(driver: D) -> Self {
        Self::with_driver(Arc::new(driver))
    }

    pub fn with_driver(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            slot: Mutex::new(Weak::new()),
        }
    }

    /// 获取上下文引用；不存在时初始化驱动库 (全局只发生一次，直到全部引用释放)
    pub fn acquire(&self) -> Result<DeviceContextRef> {
        let mut slot = match self.slot.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(ctx) = slot.upgrade() {
            return Ok(ctx);
        }

        // 驱动库无法初始化属于进程级致命错误，统一映射为 ContextInit
        let bus = self.driver.new_context().map_err(|e| match e {
            CameraError::ContextInit(msg) => CameraError::ContextInit(msg),
            other => CameraError::ContextInit(other.to_string()),
        })?;

        let ctx = Arc::new(SharedContext {
            bus,
            driver: self.driver.name().to_string(),
        });
        *slot = Arc::downgrade(&ctx);

        tracing::info!(target: "firecam::context", "Created {} bus context", self.driver.name());
        Ok(ctx)
    }

    /// 当前存活的引用数 (0 表示上下文已释放)
    pub fn ref_count(&self) -> usize {
        match self.slot.lock() {
            Ok(g) => g.strong_count(),
            Err(poisoned) => poisoned.into_inner().strong_count(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.ref_count() > 0
    }

    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }
}

impl fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextManager")
            .field("driver", &self.driver.name())
            .field("refs", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firecam_simulation::SimDriver;

    #[test]
    fn context_is_shared_and_released_with_last_ref() {
        let driver = SimDriver::new();
        let manager = ContextManager::new(driver.clone());

        let a = manager.acquire().unwrap();
        let b = manager.acquire().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.ref_count(), 2);
        assert_eq!(driver.contexts_created(), 1);

        drop(a);
        assert_eq!(driver.live_contexts(), 1);
        drop(b);
        assert_eq!(driver.live_contexts(), 0);
        assert!(!manager.is_active());

        // 释放后再次获取会重新初始化
        let _c = manager.acquire().unwrap();
        assert_eq!(driver.contexts_created(), 2);
    }

    #[test]
    fn init_failure_is_context_error() {
        let driver = SimDriver::new();
        driver.fail_context_init(true);
        let manager = ContextManager::new(driver);
        assert!(matches!(
            manager.acquire(),
            Err(CameraError::ContextInit(_))
        ));
    }
}
