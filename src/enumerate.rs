use crate::config::DeviceConfig;
use crate::device_ids::UsbId;
use crate::frame::{self, Command, ReportId};
use crate::protocol::{Error, ProtocolError, TIMEOUT, Transport, exchange};
use log::info;

/// What one microcontroller reported about itself. Built once during enumeration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ControllerIdentity {
    index: u8,
    product: String,
    version: String,
    manufacturer: String,
    name: String,
}

impl ControllerIdentity {
    pub fn new(index: u8, product: String, version: String, manufacturer: String) -> Self {
        Self {
            index,
            product,
            version,
            manufacturer,
            name: format!("Microcontroller {index}"),
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    /// Plain version string; not interpreted numerically.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logical_id(&self) -> String {
        format!("mcu{}", self.index)
    }

    /// Instance ID used to match firmware metadata to this controller.
    pub fn instance_id(&self, id: UsbId) -> String {
        format!(
            "USB\\VID_{:04X}&PID_{:04X}&PART_{}",
            id.vid, id.pid, self.product
        )
    }
}

/// Query controller `index` for its version record, then its manufacturer.
pub fn query_controller<T: Transport + ?Sized>(
    transport: &T,
    index: u8,
) -> Result<ControllerIdentity, Error> {
    let report_id = ReportId::Info.into();
    let version_cmd =
        Command::version_for(index).ok_or(ProtocolError::UnsupportedController(index))?;

    let response = exchange(
        transport,
        report_id,
        version_cmd,
        version_cmd.record_len(),
        TIMEOUT,
    )?;
    let description = frame::decode_firmware_description(&response)?;

    let response = exchange(
        transport,
        report_id,
        Command::Manufacturer,
        Command::Manufacturer.record_len(),
        TIMEOUT,
    )?;
    let manufacturer = frame::decode_manufacturer(&response)?;

    Ok(ControllerIdentity::new(
        index,
        description.product,
        description.version,
        manufacturer.manufacturer,
    ))
}

/// Walks controllers `0..count` in order, one at a time. Stops for good at the first failure;
/// identities built before it stay available through [Enumerator::children].
pub struct Enumerator<'a, T: Transport + ?Sized> {
    transport: &'a T,
    count: u8,
    next_index: u8,
    failed_at: Option<u8>,
    children: Vec<ControllerIdentity>,
}

impl<'a, T: Transport + ?Sized> Enumerator<'a, T> {
    pub fn new(transport: &'a T, config: &DeviceConfig) -> Self {
        Self {
            transport,
            count: config.controller_count(),
            next_index: 0,
            failed_at: None,
            children: Vec::with_capacity(config.controller_count() as usize),
        }
    }

    /// Build the next controller's identity. Returns `Ok(None)` once every configured controller
    /// has been built.
    pub fn step(&mut self) -> Result<Option<&ControllerIdentity>, Error> {
        if let Some(index) = self.failed_at {
            return Err(ProtocolError::EnumerationHalted { index }.into());
        }
        if self.next_index >= self.count {
            return Ok(None);
        }

        let index = self.next_index;
        match query_controller(self.transport, index) {
            Ok(identity) => {
                info!(
                    "{}: {} {} version {}",
                    identity.name(),
                    identity.manufacturer(),
                    identity.product(),
                    identity.version()
                );
                self.children.push(identity);
                self.next_index += 1;
                Ok(self.children.last())
            }
            Err(e) => {
                self.failed_at = Some(index);
                Err(e)
            }
        }
    }

    /// Step until every controller is built or one fails.
    pub fn run(&mut self) -> Result<(), Error> {
        while self.step()?.is_some() {}
        Ok(())
    }

    pub fn next_index(&self) -> u8 {
        self.next_index
    }

    pub fn children(&self) -> &[ControllerIdentity] {
        &self.children
    }

    pub fn into_children(self) -> Vec<ControllerIdentity> {
        self.children
    }
}
