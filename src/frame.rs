use crate::protocol::ProtocolError;
use byteorder::{ByteOrder, LE};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::str::Utf8Error;

/// Every request and response on the info channel is exactly this many bytes, report ID included.
pub const FRAME_LEN: usize = 32;
/// 1 byte report ID + 4 byte command + 1 byte length
pub const HEADER_LEN: usize = 6;
pub const PAYLOAD_CAPACITY: usize = FRAME_LEN - HEADER_LEN;
/// Value of every unused payload byte in a request.
pub const FILL_BYTE: u8 = 0xff;

/// fga (8) + reserved (1) + product (6) + reserved (1) + version (8)
pub const DESCRIPTION_LEN: usize = 24;
const MANUFACTURER_FIELD_LEN: usize = 25;

// Firmware info responses put one reserved byte between the echoed header and the description.
const FW_INFO_DESCRIPTION_OFFSET: usize = HEADER_LEN + 1;
pub const FW_INFO_LEN: usize = FW_INFO_DESCRIPTION_OFFSET + DESCRIPTION_LEN;
pub const MANUFACTURER_LEN: usize = HEADER_LEN + MANUFACTURER_FIELD_LEN;

/// Feature report IDs used by the protocol. Only the info channel is needed before flashing.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
pub enum ReportId {
    Info = 0x5a,
}

/// Commands understood on the info channel.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
pub enum Command {
    /// Firmware version of the first microcontroller.
    Version = 0x0031_0305,
    /// Firmware version of the second microcontroller ("main" firmware).
    Version2 = 0x0031_0405,
    /// Spells "ASUS" on the wire.
    Manufacturer = 0x5355_5341,
}

impl Command {
    /// The version command addressing controller `index`, if the device defines one.
    pub fn version_for(index: u8) -> Option<Self> {
        match index {
            0 => Some(Command::Version),
            1 => Some(Command::Version2),
            _ => None,
        }
    }

    /// Number of response bytes after the header that carry this command's record. Sent as the
    /// request's length field.
    pub fn record_len(self) -> usize {
        match self {
            Command::Version | Command::Version2 => FW_INFO_LEN - HEADER_LEN,
            Command::Manufacturer => MANUFACTURER_LEN - HEADER_LEN,
        }
    }

    pub(crate) fn action(self) -> &'static str {
        match self {
            Command::Version | Command::Version2 => "querying firmware version",
            Command::Manufacturer => "querying manufacturer",
        }
    }
}

/// A fully encoded request, ready to be sent as a feature report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandFrame {
    bytes: [u8; FRAME_LEN],
}

impl CommandFrame {
    pub fn report_id(&self) -> u8 {
        self.bytes[0]
    }

    pub fn length(&self) -> usize {
        self.bytes[5] as usize
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// The header shared by requests and the echo at the start of every response.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CommandHeader {
    pub report_id: u8,
    pub command: Command,
    pub length: usize,
}

/// Build the request for `command`. `length` must fit in the payload.
pub fn encode_command(
    report_id: u8,
    command: Command,
    length: usize,
) -> Result<CommandFrame, ProtocolError> {
    if length > PAYLOAD_CAPACITY {
        return Err(ProtocolError::LengthTooLarge {
            length,
            capacity: PAYLOAD_CAPACITY,
        });
    }

    let mut bytes = [FILL_BYTE; FRAME_LEN];
    bytes[0] = report_id;
    LE::write_u32(&mut bytes[1..5], command.into());
    bytes[5] = length as u8;

    Ok(CommandFrame { bytes })
}

/// Parse the command header at the start of `buf`.
pub fn decode_command(buf: &[u8]) -> Result<CommandHeader, ProtocolError> {
    ensure_len(buf, HEADER_LEN)?;

    let command = Command::try_from(LE::read_u32(&buf[1..5]))
        .map_err(|e| ProtocolError::UnknownCommand(e.number))?;

    Ok(CommandHeader {
        report_id: buf[0],
        command,
        length: buf[5] as usize,
    })
}

/// Manufacturer string returned by [Command::Manufacturer].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManufacturerRecord {
    pub manufacturer: String,
}

/// Identity of one firmware build. Devices report it in response to the version commands and
/// firmware images embed the same record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FirmwareDescription {
    pub fga: String,
    pub product: String,
    pub version: String,
}

impl FirmwareDescription {
    pub fn parse(raw: &[u8; DESCRIPTION_LEN]) -> Result<Self, Utf8Error> {
        Ok(Self {
            fga: read_text(&raw[0..8])?,
            product: read_text(&raw[9..15])?,
            version: read_text(&raw[16..24])?,
        })
    }
}

pub fn decode_manufacturer(buf: &[u8]) -> Result<ManufacturerRecord, ProtocolError> {
    ensure_len(buf, MANUFACTURER_LEN)?;

    Ok(ManufacturerRecord {
        manufacturer: read_text(&buf[HEADER_LEN..MANUFACTURER_LEN])?,
    })
}

pub fn decode_firmware_description(buf: &[u8]) -> Result<FirmwareDescription, ProtocolError> {
    let raw: &[u8; DESCRIPTION_LEN] = buf
        .get(FW_INFO_DESCRIPTION_OFFSET..FW_INFO_LEN)
        .and_then(|field| field.try_into().ok())
        .ok_or(ProtocolError::ReportTooShort {
            expected: FW_INFO_LEN,
            actual: buf.len(),
        })?;

    FirmwareDescription::parse(raw).map_err(Into::into)
}

fn ensure_len(buf: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if buf.len() < expected {
        Err(ProtocolError::ReportTooShort {
            expected,
            actual: buf.len(),
        })
    } else {
        Ok(())
    }
}

/// Fixed-width character fields end at the first NUL, or at the fill byte if the device didn't
/// overwrite the whole field.
fn read_text(field: &[u8]) -> Result<String, Utf8Error> {
    let end = field
        .iter()
        .position(|&b| b == 0 || b == FILL_BYTE)
        .unwrap_or(field.len());

    Ok(std::str::from_utf8(&field[..end])?.trim().to_owned())
}
