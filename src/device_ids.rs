use std::fmt::Display;

pub const ASUS_VID: u16 = 0x0b05;

/// HID interface carrying the info channel on every known device.
pub const HID_INTERFACE: i32 = 2;

const COMPATIBLE_DEVICES: &[KnownDevice] = &[
    asus_dev(0x1abe, "ROG Ally", 2),
    asus_dev(0x1b4c, "ROG Ally X", 2),
];

const fn asus_dev(pid: u16, name: &'static str, controllers: u8) -> KnownDevice {
    KnownDevice {
        id: UsbId { vid: ASUS_VID, pid },
        name,
        controllers,
    }
}

/// A USB vendor ID and product ID pair.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UsbId {
    pub vid: u16,
    pub pid: u16,
}

impl Display for UsbId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vid, self.pid)
    }
}

/// A device we have tested, with the number of microcontrollers it is built from.
#[derive(Copy, Clone, Debug)]
pub struct KnownDevice {
    pub id: UsbId,
    pub name: &'static str,
    pub controllers: u8,
}

/// Compatibility of a device.
pub enum DeviceCompat {
    /// Known to speak the ASUS HID protocol. Usable by default.
    Compatible(&'static KnownDevice),
    /// Has ASUS's VID but has not been tested. Usable with "force" flag, with an explicit
    /// controller count.
    Untested,
    /// Definitely does not speak the ASUS HID protocol. Treated as if it doesn't exist.
    Incompatible,
}

impl Display for DeviceCompat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DeviceCompat::Compatible(dev) => write!(f, "compatible device ({})", dev.name),
            DeviceCompat::Untested => write!(f, "UNTESTED device"),
            DeviceCompat::Incompatible => write!(f, "incompatible device"),
        }
    }
}

/// Find a device's compatibility based on its USB ID.
pub fn identify_device(id: UsbId) -> DeviceCompat {
    if let Some(dev) = COMPATIBLE_DEVICES.iter().find(|d| d.id == id) {
        return DeviceCompat::Compatible(dev);
    }

    if id.vid == ASUS_VID {
        DeviceCompat::Untested
    } else {
        DeviceCompat::Incompatible
    }
}
