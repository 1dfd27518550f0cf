use crate::frame::{self, Command, FRAME_LEN};
use hidapi::{HidDevice, HidError};
use log::{debug, trace};
use std::time::Duration;
use thiserror::Error;

/// Upper bound for one set-report/get-report cycle.
pub const TIMEOUT: Duration = Duration::from_millis(200);

/// A half-duplex, report-based channel to the device. Only one exchange may be in flight at a
/// time; callers serialize access.
pub trait Transport {
    /// Send `request` as a feature report, then read back the response on `report_id`.
    fn send_and_receive(
        &self,
        report_id: u8,
        request: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, HidError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send_and_receive(
        &self,
        report_id: u8,
        request: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, HidError> {
        (**self).send_and_receive(report_id, request, timeout)
    }
}

impl Transport for HidDevice {
    fn send_and_receive(
        &self,
        report_id: u8,
        request: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, HidError> {
        // hidapi's feature report calls block without a caller-supplied timeout; the OS bounds them.
        trace!("Sending feature report (timeout {timeout:?} left to the OS): {request:02x?}");
        self.send_feature_report(request)?;

        let mut response = vec![0u8; FRAME_LEN];
        response[0] = report_id;
        let size = self.get_feature_report(&mut response)?;
        response.truncate(size);

        Ok(response)
    }
}

/// Perform one command exchange: send the encoded request, read the response, and make sure the
/// device answered on the same report. The raw response is returned for the caller to decode.
/// No retries are attempted.
pub fn exchange<T: Transport + ?Sized>(
    transport: &T,
    report_id: u8,
    command: Command,
    length: usize,
    timeout: Duration,
) -> Result<Vec<u8>, Error> {
    let request = frame::encode_command(report_id, command, length)?;

    debug!("Sending {command:?} on report {report_id:#04x} ({length} byte record)");
    let response = transport
        .send_and_receive(report_id, request.as_bytes(), timeout)
        .map_err(|source| Error::DeviceIoError {
            source,
            action: command.action(),
        })?;

    trace!("Raw {command:?} response: {response:02x?}");

    match response.first() {
        None => Err(ProtocolError::ReportTooShort {
            expected: 1,
            actual: 0,
        }
        .into()),
        Some(&actual) if actual != report_id => Err(ProtocolError::EchoMismatch {
            expected: report_id,
            actual,
        }
        .into()),
        Some(_) => Ok(response),
    }
}

/// All errors (protocol and I/O) that can happen while talking to the device.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("ASUS HID protocol error")]
    ProtocolError(#[from] ProtocolError),

    #[error("USB transaction error while {action}")]
    DeviceIoError {
        source: HidError,
        action: &'static str,
    },
}

/// Failure modes that can happen even when all I/O succeeds.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProtocolError {
    #[error("device answered on report {actual:#04x}, expected {expected:#04x}")]
    EchoMismatch { expected: u8, actual: u8 },

    #[error("feature report from device was {actual} bytes, expected at least {expected}")]
    ReportTooShort { expected: usize, actual: usize },

    #[error("device returned invalid UTF-8 string")]
    InvalidString(#[from] std::str::Utf8Error),

    #[error("command {0:#010x} is not part of the protocol")]
    UnknownCommand(u32),

    #[error("request length {length} exceeds the {capacity} byte payload")]
    LengthTooLarge { length: usize, capacity: usize },

    #[error("no version command is defined for microcontroller {0}")]
    UnsupportedController(u8),

    #[error("enumeration already failed at microcontroller {index}")]
    EnumerationHalted { index: u8 },
}
