/// Check if a device is compatible based on its USB IDs.
pub mod device_ids;

/// Encode command reports and decode the fixed-layout responses.
pub mod frame;

/// Perform single command exchanges with an ASUS HID device using feature reports.
pub mod protocol;

/// Typed, validated device configuration (the values a quirk database supplies).
pub mod config;

/// Query every microcontroller of a composite device for its identity.
pub mod enumerate;

/// A composite device session owning its transport and controller list.
pub mod device;

/// Load firmware images and gate them against a controller's identity.
pub mod firmware;

#[cfg(test)]
mod test_util;
