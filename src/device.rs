use crate::config::DeviceConfig;
use crate::enumerate::{ControllerIdentity, Enumerator};
use crate::firmware::{self, FirmwareImage, GateError, GateOutcome};
use crate::protocol::{Error, Transport};
use log::debug;

/// One composite device: the transport to it, its configuration and the controllers found
/// behind it.
pub struct AsusHidDevice<T: Transport> {
    transport: T,
    config: DeviceConfig,
    children: Vec<ControllerIdentity>,
}

impl<T: Transport> AsusHidDevice<T> {
    pub fn new(transport: T, config: DeviceConfig) -> Self {
        Self {
            transport,
            config,
            children: Vec::new(),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DeviceConfig {
        &mut self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn children(&self) -> &[ControllerIdentity] {
        &self.children
    }

    pub fn child(&self, index: u8) -> Option<&ControllerIdentity> {
        self.children.iter().find(|c| c.index() == index)
    }

    /// Enumerate every configured controller, replacing any previous results. On failure, the
    /// controllers built before the failing one are still kept.
    pub fn setup(&mut self) -> Result<(), Error> {
        let mut enumerator = Enumerator::new(&self.transport, &self.config);
        let result = enumerator.run();
        self.children = enumerator.into_children();

        debug!(
            "Setup found {} of {} controllers",
            self.children.len(),
            self.config.controller_count()
        );
        result
    }

    /// Check that `image` may be installed on controller `index`.
    pub fn prepare_firmware(
        &self,
        image: &impl FirmwareImage,
        index: u8,
        force: bool,
    ) -> Result<GateOutcome, GateError> {
        let child = self.child(index).ok_or(GateError::UnknownController(index))?;
        firmware::check(image.product(), child.product(), force)
    }
}
