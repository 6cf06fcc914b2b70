//! IEEE-1394 (IIDC) 相机的控制与采集层
//!
//! ```no_run
//! use firecam::prelude::*;
//! use firecam_simulation::{SimCameraSpec, SimDriver};
//!
//! # fn main() -> anyhow::Result<()> {
//! let contexts = ContextManager::new(SimDriver::new().with_camera(SimCameraSpec::new(1, "Flea")));
//! let mut cam = Camera::new(&contexts)?;
//! cam.set_blocking(true);
//! cam.setup(0)?;
//!
//! let mut img = Image::empty();
//! if cam.grab_video(&mut img, true)? {
//!     println!("{}x{}", img.width, img.height);
//! }
//! # Ok(())
//! # }
//! ```

pub(crate) mod acquisition;
pub mod bayer;
pub mod camera;
pub mod context;
mod features;
pub mod image;
pub mod imgcodecs;
pub mod pipeline;
pub mod settings;
pub mod state;
pub mod translate;

// Re-export 核心类型，方便 prelude 使用
pub use camera::Camera;
pub use firecam_core;
pub use image::Image;

/// 预置模块，用户可以通过 `use firecam::prelude::*;` 导入常用项
pub mod prelude {
    pub use crate::camera::Camera;
    pub use crate::context::{ContextManager, DeviceContextRef};
    pub use crate::image::Image;
    pub use crate::settings::{BayerSettings, PendingSettings, StereoConfig};
    pub use crate::state::CameraState;
    pub use crate::translate::Unit;
    pub use firecam_core::prelude::*;
}
