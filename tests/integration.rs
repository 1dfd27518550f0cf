//! End-to-end checks through the public API: quirk configuration, controller enumeration over a
//! simulated device, and gating a firmware file against the result.

use asus_hid::config::{ConfigError, DeviceConfig, NUM_MCU_QUIRK};
use asus_hid::device::AsusHidDevice;
use asus_hid::firmware::{self, DESCRIPTION_OFFSET, GateError};
use asus_hid::frame::{
    Command, DESCRIPTION_LEN, FRAME_LEN, HEADER_LEN, ReportId, decode_command,
};
use asus_hid::protocol::{Error, ProtocolError, Transport};
use byteorder::{ByteOrder, LE};
use hidapi::HidError;
use std::cell::RefCell;
use std::io::Cursor;
use std::time::Duration;

/// Answers like a device with the given products, one per controller.
struct SimulatedDevice {
    products: Vec<&'static str>,
    /// Report ID the device answers on.
    answer_on: u8,
    sent: RefCell<Vec<Command>>,
}

impl SimulatedDevice {
    fn new(products: Vec<&'static str>) -> Self {
        Self {
            products,
            answer_on: ReportId::Info.into(),
            sent: RefCell::new(vec![]),
        }
    }

    fn write_text(buf: &mut [u8], text: &str) {
        buf.fill(0);
        buf[..text.len()].copy_from_slice(text.as_bytes());
    }
}

impl Transport for SimulatedDevice {
    fn send_and_receive(
        &self,
        _report_id: u8,
        request: &[u8],
        _timeout: Duration,
    ) -> Result<Vec<u8>, HidError> {
        let header = decode_command(request).map_err(|e| HidError::HidApiError {
            message: e.to_string(),
        })?;
        self.sent.borrow_mut().push(header.command);

        let mut response = vec![0xffu8; FRAME_LEN];
        response[..HEADER_LEN].copy_from_slice(&request[..HEADER_LEN]);
        response[0] = self.answer_on;

        match header.command {
            Command::Version | Command::Version2 => {
                let index: usize = if header.command == Command::Version { 0 } else { 1 };
                let product = self.products.get(index).ok_or(HidError::HidApiError {
                    message: "no such controller".to_owned(),
                })?;
                response[6] = 0;
                Self::write_text(&mut response[7..15], "FGA20000");
                Self::write_text(&mut response[16..22], product);
                Self::write_text(&mut response[23..31], &format!("1.{index}"));
            }
            Command::Manufacturer => {
                Self::write_text(&mut response[6..31], "ASUSTeK COMPUTER INC.");
            }
        }

        Ok(response)
    }
}

fn firmware_file(product: &str) -> Cursor<Vec<u8>> {
    let mut data = vec![0u8; DESCRIPTION_OFFSET as usize + DESCRIPTION_LEN + 64];
    let desc = &mut data[DESCRIPTION_OFFSET as usize..];
    desc[0..8].copy_from_slice(b"FGA20000");
    desc[9..9 + product.len()].copy_from_slice(product.as_bytes());
    desc[16..19].copy_from_slice(b"1.1");
    Cursor::new(data)
}

#[test]
fn quirk_setup_and_gate() {
    let mut config = DeviceConfig::default();
    config.apply_quirk(NUM_MCU_QUIRK, "2").unwrap();

    let mut device = AsusHidDevice::new(SimulatedDevice::new(vec!["RC71L", "RC71X"]), config);
    device.setup().unwrap();

    let names: Vec<_> = device.children().iter().map(|c| c.name().to_owned()).collect();
    assert_eq!(names, vec!["Microcontroller 0", "Microcontroller 1"]);
    assert_eq!(device.children()[1].version(), "1.1");
    assert_eq!(
        device.children()[0].manufacturer(),
        "ASUSTeK COMPUTER INC."
    );

    let image = firmware::parse(&mut firmware_file("RC71X")).unwrap();
    assert!(device.prepare_firmware(&image, 1, false).is_ok());

    match device.prepare_firmware(&image, 0, false) {
        Err(GateError::IdentityMismatch {
            firmware_product,
            controller_product,
        }) => {
            assert_eq!(firmware_product, "RC71X");
            assert_eq!(controller_product, "RC71L");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let forced = device.prepare_firmware(&image, 0, true).unwrap();
    assert!(forced.is_forced());
}

#[test]
fn rejected_quirk_leaves_count_alone() {
    let mut config = DeviceConfig::new(1);
    assert!(matches!(
        config.apply_quirk(NUM_MCU_QUIRK, "256"),
        Err(ConfigError::InvalidControllerCount(_))
    ));
    assert_eq!(config.controller_count(), 1);
}

#[test]
fn stale_report_aborts_setup() {
    let mut sim = SimulatedDevice::new(vec!["RC71L", "RC71X"]);
    sim.answer_on = 0x01;

    let mut device = AsusHidDevice::new(sim, DeviceConfig::new(2));
    let err = device.setup().unwrap_err();

    assert!(matches!(
        err,
        Error::ProtocolError(ProtocolError::EchoMismatch {
            expected: 0x5a,
            actual: 0x01
        })
    ));
    assert!(device.children().is_empty());
    assert_eq!(*device.transport().sent.borrow(), vec![Command::Version]);
}

#[test]
fn controller_count_beyond_protocol() {
    let mut device = AsusHidDevice::new(
        SimulatedDevice::new(vec!["RC71L", "RC71X"]),
        DeviceConfig::new(3),
    );

    assert!(matches!(
        device.setup(),
        Err(Error::ProtocolError(ProtocolError::UnsupportedController(2)))
    ));
    assert_eq!(device.children().len(), 2);
    // Two exchanges per built controller, none for the third.
    assert_eq!(device.transport().sent.borrow().len(), 4);
}

#[test]
fn request_header_layout() {
    let frame = asus_hid::frame::encode_command(0x5a, Command::Version2, 25).unwrap();
    let bytes = frame.as_bytes();
    assert_eq!(bytes[0], 0x5a);
    assert_eq!(LE::read_u32(&bytes[1..5]), 0x0031_0405);
    assert_eq!(bytes[5], 25);
}
