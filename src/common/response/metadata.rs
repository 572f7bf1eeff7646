// src/common/response/metadata.rs

use core::fmt;

use crate::common::error::DecodeError;

/// Firmware version as reported by get-firmware-version: `major.minor`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl FirmwareVersion {
    /// Builds the version from the two data bytes of the response word.
    pub fn from_word(word: [u8; 2]) -> Self {
        FirmwareVersion { major: word[0], minor: word[1] }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Product type string as sent by the SPS30 (8 ASCII characters).
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProductType {
    pub code: String,
}

impl ProductType {
    /// Code the SPS30 reports for itself.
    pub const SPS30_CODE: &'static str = "00080000";

    pub fn from_data(data: &[u8]) -> Self {
        ProductType { code: ascii_string(data) }
    }

    /// Marketing name for known codes, the raw code otherwise.
    pub fn name(&self) -> &str {
        if self.code == Self::SPS30_CODE {
            "SPS30"
        } else {
            &self.code
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interprets data bytes as ASCII, stopping at the first NUL.
pub fn ascii_string(data: &[u8]) -> String {
    data.iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}

/// Joins two data bytes into a big-endian `u16`.
pub fn be_u16(data: &[u8]) -> Result<u16, DecodeError> {
    let bytes: [u8; 2] = data
        .try_into()
        .map_err(|_| DecodeError::Length { expected: 2, got: data.len() })?;
    Ok(u16::from_be_bytes(bytes))
}

/// Joins four data bytes into a big-endian `u32`.
pub fn be_u32(data: &[u8]) -> Result<u32, DecodeError> {
    let bytes: [u8; 4] = data
        .try_into()
        .map_err(|_| DecodeError::Length { expected: 4, got: data.len() })?;
    Ok(u32::from_be_bytes(bytes))
}

/// SPS30 device status register.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StatusRegister(pub u32);

impl StatusRegister {
    pub const SPEED_BIT: u32 = 21;
    pub const LASER_BIT: u32 = 5;
    pub const FAN_BIT: u32 = 4;

    #[inline]
    fn bit(&self, n: u32) -> bool {
        self.0 & (1 << n) != 0
    }

    /// Fan speed is more than 10% off its target.
    pub fn speed_warning(&self) -> bool {
        self.bit(Self::SPEED_BIT)
    }

    /// Laser current is out of range.
    pub fn laser_error(&self) -> bool {
        self.bit(Self::LASER_BIT)
    }

    /// Fan is switched on but reads 0 rpm.
    pub fn fan_error(&self) -> bool {
        self.bit(Self::FAN_BIT)
    }

    pub fn speed_status(&self) -> &'static str {
        if self.speed_warning() { "too high/ too low" } else { "ok" }
    }

    pub fn laser_status(&self) -> &'static str {
        if self.laser_error() { "out of range" } else { "ok" }
    }

    pub fn fan_status(&self) -> &'static str {
        if self.fan_error() { "0 rpm" } else { "ok" }
    }
}

impl fmt::Display for StatusRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "speed: {}, laser: {}, fan: {}",
            self.speed_status(),
            self.laser_status(),
            self.fan_status()
        )
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for StatusRegister {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("StatusRegister", 3)?;
        s.serialize_field("speed_status", self.speed_status())?;
        s.serialize_field("laser_status", self.laser_status())?;
        s.serialize_field("fan_status", self.fan_status())?;
        s.end()
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firmware_display() {
        assert_eq!(FirmwareVersion::from_word([2, 3]).to_string(), "2.3");
        assert!(FirmwareVersion { major: 2, minor: 0 } > FirmwareVersion { major: 1, minor: 9 });
    }

    #[test]
    fn test_product_type() {
        let sps = ProductType::from_data(b"00080000");
        assert_eq!(sps.to_string(), "SPS30");
        assert_eq!(sps.code, "00080000");

        let other = ProductType::from_data(b"00090000");
        assert_eq!(other.to_string(), "00090000");
    }

    #[test]
    fn test_ascii_string_trims_at_nul() {
        let mut raw = [0u8; 32];
        raw[..16].copy_from_slice(b"E6D8B2C1A0F3D4E5");
        assert_eq!(ascii_string(&raw), "E6D8B2C1A0F3D4E5");
        assert_eq!(ascii_string(&[0, b'A']), "");
    }

    #[test]
    fn test_be_u16() {
        assert_eq!(be_u16(&[0x07, 0x08]), Ok(1800));
        assert!(be_u16(&[0x07, 0x08, 0x00]).is_err());
    }

    #[test]
    fn test_be_u32() {
        assert_eq!(be_u32(&[0x00, 0x09, 0x3A, 0x80]), Ok(604_800));
        assert_eq!(be_u32(&[0x00]), Err(DecodeError::Length { expected: 4, got: 1 }));
    }

    #[test]
    fn test_status_flags() {
        let clear = StatusRegister(0);
        assert_eq!(clear.to_string(), "speed: ok, laser: ok, fan: ok");

        let all = StatusRegister((1 << 21) | (1 << 5) | (1 << 4));
        assert!(all.speed_warning() && all.laser_error() && all.fan_error());
        assert_eq!(all.speed_status(), "too high/ too low");
        assert_eq!(all.laser_status(), "out of range");
        assert_eq!(all.fan_status(), "0 rpm");

        let fan_only = StatusRegister(1 << 4);
        assert!(!fan_only.speed_warning());
        assert!(!fan_only.laser_error());
        assert!(fan_only.fan_error());
    }
}
