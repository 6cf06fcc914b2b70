//! 三种单位之间的 Feature 值转换
//!
//! 归一化 (0..1)、绝对物理单位、原始寄存器值最终都落到同一个寄存器上。
//! 每次调用都重新查询范围：某些设备在模式协商后会改变报告的范围。

use firecam_core::error::{CameraError, Result};
use firecam_core::feature::Feature;
use firecam_core::traits::FeatureControl;

/// 值的单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum Unit {
    /// 0..1，线性映射到原始寄存器范围
    Normalized,
    /// 物理单位 (秒、dB ...)
    Absolute,
    /// 寄存器原始值
    Raw,
}

/// 归一化值 -> 原始值：`lo + round(v * (hi - lo))`，v 先被钳位到 [0, 1]
pub fn normalized_to_raw(value: f64, (lo, hi): (u32, u32)) -> u32 {
    let (lo, hi) = ordered(lo, hi);
    let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    lo + (v * f64::from(hi - lo)).round() as u32
}

/// 原始值 -> 归一化值；退化范围返回 0
pub fn raw_to_normalized(raw: u32, (lo, hi): (u32, u32)) -> f64 {
    let (lo, hi) = ordered(lo, hi);
    if hi == lo {
        return 0.0;
    }
    f64::from(raw.clamp(lo, hi) - lo) / f64::from(hi - lo)
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    // 个别设备报告的 min/max 是反的
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// 绑定到某个设备控制面的转换器
#[derive(Clone, Copy)]
pub struct ValueTranslator<'a> {
    control: &'a dyn FeatureControl,
}

impl<'a> ValueTranslator<'a> {
    pub fn new(control: &'a dyn FeatureControl) -> Self {
        Self { control }
    }

    /// 当前范围 (以 f64 表示，Raw/Normalized 单位下为寄存器范围)
    pub fn range(&self, feature: Feature, unit: Unit) -> Result<(f64, f64)> {
        match unit {
            Unit::Normalized => {
                // 确认设备支持该 Feature
                self.control.raw_range(feature)?;
                Ok((0.0, 1.0))
            }
            Unit::Raw => {
                let (lo, hi) = ordered_raw(self.control.raw_range(feature)?);
                Ok((f64::from(lo), f64::from(hi)))
            }
            Unit::Absolute => {
                let (lo, hi) = self.control.absolute_range(feature)?;
                let (lo, hi) = ordered(lo, hi);
                Ok((f64::from(lo), f64::from(hi)))
            }
        }
    }

    pub fn get(&self, feature: Feature, unit: Unit) -> Result<f64> {
        match unit {
            Unit::Normalized => {
                let range = self.control.raw_range(feature)?;
                let raw = self.control.raw_value(feature)?;
                Ok(raw_to_normalized(raw, range))
            }
            Unit::Raw => Ok(f64::from(self.control.raw_value(feature)?)),
            Unit::Absolute => Ok(f64::from(self.control.absolute_value(feature)?)),
        }
    }

    /// 写入；越界的值钳位到边界而不是报错
    pub fn set(&self, feature: Feature, unit: Unit, value: f64) -> Result<()> {
        match unit {
            Unit::Normalized => {
                let range = self.control.raw_range(feature)?;
                self.write_raw(feature, normalized_to_raw(value, range))
            }
            Unit::Raw => {
                let (lo, hi) = ordered_raw(self.control.raw_range(feature)?);
                let clamped = if value.is_nan() {
                    lo
                } else {
                    value.round().clamp(f64::from(lo), f64::from(hi)) as u32
                };
                if f64::from(clamped) != value {
                    tracing::warn!(
                        target: "firecam::translate",
                        "{} raw value {} clamped to {}",
                        feature,
                        value,
                        clamped
                    );
                }
                self.write_raw(feature, clamped)
            }
            Unit::Absolute => {
                let (lo, hi) = self.control.absolute_range(feature)?;
                let (lo, hi) = ordered(lo, hi);
                let clamped = if value.is_nan() {
                    lo
                } else {
                    (value as f32).clamp(lo, hi)
                };
                if clamped != value as f32 {
                    tracing::warn!(
                        target: "firecam::translate",
                        "{} absolute value {} clamped to {}",
                        feature,
                        value,
                        clamped
                    );
                }
                // 1. 切到绝对值控制模式，再写值
                self.control.set_absolute_control(feature, true)?;
                self.control.set_absolute_value(feature, clamped)
            }
        }
    }

    fn write_raw(&self, feature: Feature, raw: u32) -> Result<()> {
        // 绝对值模式下寄存器写入不生效，先关掉；不支持绝对值控制的 Feature 忽略该错误
        match self.control.set_absolute_control(feature, false) {
            Ok(()) | Err(CameraError::FeatureUnsupported(_)) => {}
            Err(e) => return Err(e),
        }
        self.control.set_raw_value(feature, raw)
    }
}

fn ordered_raw((a, b): (u32, u32)) -> (u32, u32) {
    ordered(a, b)
}

impl std::fmt::Debug for ValueTranslator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueTranslator").finish_non_exhaustive()
    }
}
