use log::debug;
use thiserror::Error;

/// Quirk key carrying the number of microcontrollers behind one HID interface.
pub const NUM_MCU_QUIRK: &str = "AsusHidNumMcu";

/// Per-device settings that parameterize the protocol. Each option has exactly one validated
/// setter; a failed set leaves the previous value in place.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DeviceConfig {
    controller_count: u8,
}

impl DeviceConfig {
    pub fn new(controller_count: u8) -> Self {
        Self { controller_count }
    }

    pub fn controller_count(&self) -> u8 {
        self.controller_count
    }

    /// Set the controller count from text. Accepts decimal or `0x`-prefixed hexadecimal.
    pub fn set_controller_count(&mut self, value: &str) -> Result<(), ConfigError> {
        self.controller_count = parse_u8(value)?;
        debug!("Controller count set to {}", self.controller_count);
        Ok(())
    }

    /// Apply a key/value pair from a quirk database.
    pub fn apply_quirk(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            NUM_MCU_QUIRK => self.set_controller_count(value),
            _ => Err(ConfigError::UnsupportedQuirk(key.to_owned())),
        }
    }
}

fn parse_u8(value: &str) -> Result<u8, ConfigError> {
    let trimmed = value.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };

    parsed
        .ok()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| ConfigError::InvalidControllerCount(value.to_owned()))
}

/// Rejected configuration input.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("controller count {0:?} is not an integer between 0 and 255")]
    InvalidControllerCount(String),

    #[error("quirk key {0:?} not supported")]
    UnsupportedQuirk(String),
}
