//! Feature 控制：通用接口 + 常用 Feature 的便捷包装

use firecam_core::error::{CameraError, Result};
use firecam_core::feature::{Feature, FeatureInfo};
use firecam_core::traits::FeatureControl;

use crate::camera::Camera;
use crate::translate::Unit;

impl Camera {
    /// 以指定单位写入 Feature；越界值钳位到设备范围
    pub fn set_feature(&mut self, feature: Feature, unit: Unit, value: f64) -> Result<()> {
        self.translator()?.set(feature, unit, value)
    }

    /// 以指定单位读取 Feature
    pub fn feature(&self, feature: Feature, unit: Unit) -> Result<f64> {
        self.translator()?.get(feature, unit)
    }

    /// 指定单位下的取值范围，每次调用都重新向设备查询
    pub fn feature_range(&self, feature: Feature, unit: Unit) -> Result<(f64, f64)> {
        self.translator()?.range(feature, unit)
    }

    pub fn feature_raw_range(&self, feature: Feature) -> Result<(u32, u32)> {
        self.require_ready()?;
        let (lo, hi) = self.control()?.raw_range(feature)?;
        Ok((lo.min(hi), lo.max(hi)))
    }

    pub fn feature_abs_range(&self, feature: Feature) -> Result<(f32, f32)> {
        self.require_ready()?;
        let (lo, hi) = self.control()?.absolute_range(feature)?;
        Ok((lo.min(hi), lo.max(hi)))
    }

    /// 设备上全部可用 Feature 的描述
    pub fn features(&self) -> Result<Vec<FeatureInfo>> {
        self.require_ready()?;
        self.control()?.features()
    }

    /// 打印 Feature 表 (诊断用)
    pub fn print_features(&self) -> Result<()> {
        let features = self.features()?;
        println!(
            "Features of camera {}",
            self.get_guid().unwrap_or_default()
        );
        for info in &features {
            println!("  {}", info);
        }
        Ok(())
    }

    fn control(&self) -> Result<&dyn FeatureControl> {
        self.features.as_deref().ok_or(CameraError::NotReady)
    }
}

macro_rules! feature_accessors {
    ($($feature:ident {
        $set:ident, $set_abs:ident, $set_raw:ident,
        $get:ident, $get_abs:ident, $get_raw:ident,
        $raw_range:ident, $abs_range:ident $(,)?
    })*) => {
        impl Camera {
            $(
                #[doc = concat!("Sets ", stringify!($feature), " from a normalized value in [0, 1].")]
                pub fn $set(&mut self, value: f32) -> Result<()> {
                    self.set_feature(Feature::$feature, Unit::Normalized, f64::from(value))
                }

                #[doc = concat!("Sets ", stringify!($feature), " in physical units.")]
                pub fn $set_abs(&mut self, value: f32) -> Result<()> {
                    self.set_feature(Feature::$feature, Unit::Absolute, f64::from(value))
                }

                #[doc = concat!("Writes the ", stringify!($feature), " register directly.")]
                pub fn $set_raw(&mut self, value: u32) -> Result<()> {
                    self.set_feature(Feature::$feature, Unit::Raw, f64::from(value))
                }

                #[doc = concat!("Reads ", stringify!($feature), " as a normalized value in [0, 1].")]
                pub fn $get(&self) -> Result<f32> {
                    self.feature(Feature::$feature, Unit::Normalized).map(|v| v as f32)
                }

                #[doc = concat!("Reads ", stringify!($feature), " in physical units.")]
                pub fn $get_abs(&self) -> Result<f32> {
                    self.feature(Feature::$feature, Unit::Absolute).map(|v| v as f32)
                }

                #[doc = concat!("Reads the ", stringify!($feature), " register.")]
                pub fn $get_raw(&self) -> Result<u32> {
                    self.feature(Feature::$feature, Unit::Raw).map(|v| v as u32)
                }

                #[doc = concat!("Current register range of ", stringify!($feature), ".")]
                pub fn $raw_range(&self) -> Result<(u32, u32)> {
                    self.feature_raw_range(Feature::$feature)
                }

                #[doc = concat!("Current physical-unit range of ", stringify!($feature), ".")]
                pub fn $abs_range(&self) -> Result<(f32, f32)> {
                    self.feature_abs_range(Feature::$feature)
                }
            )*
        }
    };
}

feature_accessors! {
    Brightness {
        set_brightness, set_brightness_abs, set_brightness_raw,
        get_brightness, get_brightness_abs, get_brightness_raw,
        get_brightness_raw_range, get_brightness_abs_range,
    }
    Gamma {
        set_gamma, set_gamma_abs, set_gamma_raw,
        get_gamma, get_gamma_abs, get_gamma_raw,
        get_gamma_raw_range, get_gamma_abs_range,
    }
    Gain {
        set_gain, set_gain_abs, set_gain_raw,
        get_gain, get_gain_abs, get_gain_raw,
        get_gain_raw_range, get_gain_abs_range,
    }
    Exposure {
        set_exposure, set_exposure_abs, set_exposure_raw,
        get_exposure, get_exposure_abs, get_exposure_raw,
        get_exposure_raw_range, get_exposure_abs_range,
    }
    // 快门的绝对值单位为秒
    Shutter {
        set_shutter, set_shutter_abs, set_shutter_raw,
        get_shutter, get_shutter_abs, get_shutter_raw,
        get_shutter_raw_range, get_shutter_abs_range,
    }
}

#[cfg(feature = "serialize")]
impl Camera {
    /// 诊断快照：状态、协商结果与 Feature 当前值
    pub fn export_state(&self) -> Result<serde_json::Value> {
        use serde_json::json;

        let to_json = |v: std::result::Result<serde_json::Value, serde_json::Error>| {
            v.map_err(|e| CameraError::Driver(format!("state export failed: {}", e)))
        };

        // 未就绪时不访问设备
        let features = if self.is_ready() {
            self.features()?
        } else {
            Vec::new()
        };

        Ok(json!({
            "driver": self.driver_name(),
            "state": self.state(),
            "guid": self.get_guid(),
            "device": to_json(serde_json::to_value(self.device_info()))?,
            "settings": to_json(serde_json::to_value(self.settings()))?,
            "stereo": self.stereo_config(),
            "video_mode": self.video_mode(),
            "color_coding": self.color_coding(),
            "frame_rate_actual": self.get_frame_rate_actual(),
            "features": to_json(serde_json::to_value(&features))?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::camera::Camera;
    use crate::context::ContextManager;
    use crate::translate::Unit;
    use firecam_core::error::CameraError;
    use firecam_core::feature::Feature;
    use firecam_simulation::{SimCameraSpec, SimDriver};

    fn ready_camera() -> (SimDriver, Camera) {
        let driver = SimDriver::new().with_camera(SimCameraSpec::new(1, "Flea"));
        let contexts = ContextManager::new(driver.clone());
        let mut cam = Camera::new(&contexts).unwrap();
        cam.setup(0).unwrap();
        (driver, cam)
    }

    #[test]
    fn features_need_a_ready_camera() {
        let driver = SimDriver::new().with_camera(SimCameraSpec::new(1, "Flea"));
        let contexts = ContextManager::new(driver);
        let mut cam = Camera::new(&contexts).unwrap();
        assert!(matches!(cam.set_gain(0.5), Err(CameraError::NotReady)));
        assert!(matches!(cam.get_gain_raw_range(), Err(CameraError::NotReady)));
    }

    #[test]
    fn named_wrappers_share_one_register() {
        let (driver, mut cam) = ready_camera();
        let handle = driver.camera(0).unwrap();

        cam.set_gain(0.5).unwrap();
        assert_eq!(cam.get_gain_raw().unwrap(), 340);
        assert_eq!(handle.raw_register(Feature::Gain), Some(340));

        cam.set_gain_abs(6.0).unwrap();
        assert_eq!(handle.absolute_control(Feature::Gain), Some(true));
        assert!((cam.get_gain_abs().unwrap() - 6.0).abs() < 1e-4);

        cam.set_gain_raw(680).unwrap();
        assert_eq!(handle.absolute_control(Feature::Gain), Some(false));
        assert_eq!(cam.get_gain().unwrap(), 1.0);
    }

    #[test]
    fn out_of_range_values_clamp() {
        let (_driver, mut cam) = ready_camera();
        cam.set_brightness_raw(9000).unwrap();
        assert_eq!(cam.get_brightness_raw().unwrap(), 255);

        cam.set_shutter_abs(5.0).unwrap();
        let (_, hi) = cam.get_shutter_abs_range().unwrap();
        assert_eq!(cam.get_shutter_abs().unwrap(), hi);

        cam.set_feature(Feature::Gamma, Unit::Normalized, -1.0).unwrap();
        assert_eq!(cam.get_gamma_raw().unwrap(), 0);
    }

    #[test]
    fn unsupported_ranges_are_reported() {
        let (_driver, cam) = ready_camera();
        assert!(matches!(
            cam.get_brightness_abs_range(),
            Err(CameraError::FeatureUnsupported(Feature::Brightness))
        ));
        assert!(matches!(
            cam.feature_range(Feature::Zoom, Unit::Raw),
            Err(CameraError::FeatureUnsupported(Feature::Zoom))
        ));
    }

    #[test]
    fn ranges_are_requeried() {
        let (driver, cam) = ready_camera();
        assert_eq!(cam.get_gain_raw_range().unwrap(), (0, 680));
        driver.camera(0).unwrap().set_raw_range(Feature::Gain, 16, 1023);
        assert_eq!(cam.get_gain_raw_range().unwrap(), (16, 1023));
    }

    #[test]
    fn print_features_works_while_ready() {
        let (_driver, cam) = ready_camera();
        cam.print_features().unwrap();
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn export_state_reports_negotiation() {
        let (_driver, cam) = ready_camera();
        let state = cam.export_state().unwrap();
        assert_eq!(state["state"], "Configured");
        assert_eq!(state["guid"], "0000000000000001");
        assert_eq!(state["settings"]["width"], 640);
        assert!(state["features"].as_array().unwrap().len() >= 5);
    }
}
