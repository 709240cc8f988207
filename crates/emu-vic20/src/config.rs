//! VIC-20 configuration: RAM expansion, disk drive options and ROM images.

use serde::{Deserialize, Serialize};

use crate::error::{Result, Vic20Error};

/// RAM expansion cartridge fitted to the machine.
///
/// Each preset enables a set of the five expansion blocks: block 0 is 3K at
/// $0400, blocks 1-3 are 8K at $2000/$4000/$6000 and block 4 is 8K at
/// $A000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RamExpansion {
    #[default]
    Unexpanded,
    K3,
    K8,
    K16,
    K24,
    K27,
    K32,
    K35,
}

impl RamExpansion {
    /// Enabled state of expansion blocks 0-4.
    #[must_use]
    pub const fn blocks(self) -> [bool; 5] {
        match self {
            Self::Unexpanded => [false, false, false, false, false],
            Self::K3 => [true, false, false, false, false],
            Self::K8 => [false, true, false, false, false],
            Self::K16 => [false, true, true, false, false],
            Self::K24 => [false, true, true, true, false],
            Self::K27 => [true, true, true, true, false],
            Self::K32 => [false, true, true, true, true],
            Self::K35 => [true, true, true, true, true],
        }
    }
}

/// Configuration for constructing a VIC-20.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vic20Config {
    pub ram_expansion: RamExpansion,
    /// Serial bus device number of the disk drive.
    pub drive_device: u8,
    /// Directory listings with 16-character names and a "2A" header tag.
    pub long_directory: bool,
    /// Pace `run_frame` to wall-clock time.
    pub real_time: bool,
}

impl Default for Vic20Config {
    fn default() -> Self {
        Self {
            ram_expansion: RamExpansion::Unexpanded,
            drive_device: drive_iec::DEFAULT_DEVICE,
            long_directory: false,
            real_time: false,
        }
    }
}

impl Vic20Config {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub const KERNAL_SIZE: usize = 8192;
pub const BASIC_SIZE: usize = 8192;
pub const CHARACTER_SIZE: usize = 4096;

/// ROM images.
pub struct Roms {
    /// KERNAL ROM (8,192 bytes, mapped at $E000-$FFFF).
    pub kernal: Vec<u8>,
    /// BASIC ROM (8,192 bytes, mapped at $C000-$DFFF).
    pub basic: Vec<u8>,
    /// Character ROM (4,096 bytes, mapped at $8000-$8FFF).
    pub character: Vec<u8>,
}

impl Roms {
    /// Check every image has its exact size.
    pub fn validate(&self) -> Result<()> {
        for (name, rom, expected) in [
            ("KERNAL", &self.kernal, KERNAL_SIZE),
            ("BASIC", &self.basic, BASIC_SIZE),
            ("character", &self.character, CHARACTER_SIZE),
        ] {
            if rom.len() != expected {
                return Err(Vic20Error::RomSize {
                    name,
                    expected,
                    actual: rom.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_block_table() {
        assert_eq!(RamExpansion::Unexpanded.blocks(), [false; 5]);
        assert_eq!(RamExpansion::K27.blocks(), [true, true, true, true, false]);
        assert_eq!(RamExpansion::K35.blocks(), [true; 5]);
        let total: usize = RamExpansion::K32
            .blocks()
            .iter()
            .zip([3, 8, 8, 8, 8])
            .filter_map(|(&on, k)| on.then_some(k))
            .sum();
        assert_eq!(total, 32);
    }

    #[test]
    fn empty_json_gives_defaults() {
        let config = Vic20Config::from_json("{}").expect("parse");
        assert_eq!(config, Vic20Config::default());
        assert_eq!(config.drive_device, 8);
    }

    #[test]
    fn json_fields() {
        let config = Vic20Config::from_json(
            r#"{ "ram_expansion": "k16", "long_directory": true, "drive_device": 9 }"#,
        )
        .expect("parse");
        assert_eq!(config.ram_expansion, RamExpansion::K16);
        assert!(config.long_directory);
        assert_eq!(config.drive_device, 9);
        assert!(!config.real_time);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = Vic20Config::from_json(r#"{ "ram_expansion": "k64" }"#)
            .expect_err("unknown preset");
        assert!(matches!(err, Vic20Error::Config(_)));
    }

    #[test]
    fn round_trip_through_json() {
        let config = Vic20Config {
            ram_expansion: RamExpansion::K3,
            real_time: true,
            ..Vic20Config::default()
        };
        let text = config.to_json().expect("serialize");
        assert_eq!(Vic20Config::from_json(&text).expect("parse"), config);
    }

    #[test]
    fn rom_sizes_are_checked() {
        let roms = Roms {
            kernal: vec![0; KERNAL_SIZE],
            basic: vec![0; 100],
            character: vec![0; CHARACTER_SIZE],
        };
        match roms.validate() {
            Err(Vic20Error::RomSize {
                name,
                expected,
                actual,
            }) => {
                assert_eq!(name, "BASIC");
                assert_eq!(expected, BASIC_SIZE);
                assert_eq!(actual, 100);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
