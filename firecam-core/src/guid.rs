use std::fmt;
use std::str::FromStr;

use crate::error::CameraError;

/// IEEE-1394 设备的 64 位全局唯一标识 (EUI-64)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[repr(transparent)]
pub struct Guid(pub u64);

impl Guid {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self)
    }
}

impl FromStr for Guid {
    type Err = CameraError;

    /// 接受 1~16 位十六进制数字，可带 `0x` 前缀
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > 16 {
            return Err(CameraError::InvalidGuid(s.to_string()));
        }

        u64::from_str_radix(digits, 16)
            .map(Guid)
            .map_err(|_| CameraError::InvalidGuid(s.to_string()))
    }
}

impl From<u64> for Guid {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_zero_padded_hex() {
        assert_eq!(Guid(0xb09d01).to_string(), "0000000000b09d01");
    }

    #[test]
    fn parses_with_and_without_prefix() {
        let a: Guid = "00b09d0100a1b2c3".parse().unwrap();
        let b: Guid = "0xB09D0100A1B2C3".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_u64(), 0x00b0_9d01_00a1_b2c3);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            "".parse::<Guid>(),
            Err(CameraError::InvalidGuid(_))
        ));
        assert!("not-a-guid".parse::<Guid>().is_err());
        assert!("1234567890abcdef0".parse::<Guid>().is_err());
    }
}
