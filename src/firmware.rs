use crate::frame::{DESCRIPTION_LEN, FirmwareDescription};
use log::warn;
use std::fmt::Display;
use std::io::{Read, Seek, SeekFrom};
use thiserror::Error;

/// Where ASUS firmware images keep their description record.
pub const DESCRIPTION_OFFSET: u64 = 0x2000;

/// The one thing the compatibility gate needs from a parsed firmware image.
pub trait FirmwareImage {
    /// Product identifier the image was built for.
    fn product(&self) -> &str;
}

/// Identity embedded in an ASUS firmware image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AsusFirmware {
    description: FirmwareDescription,
}

impl AsusFirmware {
    pub fn fga(&self) -> &str {
        &self.description.fga
    }

    pub fn version(&self) -> &str {
        &self.description.version
    }
}

impl FirmwareImage for AsusFirmware {
    fn product(&self) -> &str {
        &self.description.product
    }
}

/// Parse errors for a firmware image.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FileError {
    #[error("file is too short to hold a firmware description: expected at least {minimum} bytes")]
    FileTooShort { minimum: u64 },

    #[error("firmware description contains invalid UTF-8")]
    InvalidString(#[from] std::str::Utf8Error),
}

/// All errors (parse and I/O) that can happen while reading a firmware file.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid firmware file")]
    FileError(#[from] FileError),

    #[error("I/O error")]
    IoError(#[from] std::io::Error),
}

/// Read the description record from a firmware image. When this returns, `file`'s cursor is back
/// at the beginning of the image.
pub fn parse(file: &mut (impl Read + Seek)) -> Result<AsusFirmware, Error> {
    let minimum = DESCRIPTION_OFFSET + DESCRIPTION_LEN as u64;

    let file_len = file.seek(SeekFrom::End(0))?;
    if file_len < minimum {
        return Err(FileError::FileTooShort { minimum }.into());
    }

    let mut raw = [0u8; DESCRIPTION_LEN];
    file.seek(SeekFrom::Start(DESCRIPTION_OFFSET))?;
    file.read_exact(&mut raw)?;

    let description = FirmwareDescription::parse(&raw).map_err(FileError::from)?;

    // Reset cursor so caller can read the file's data.
    file.seek(SeekFrom::Start(0))?;

    Ok(AsusFirmware { description })
}

/// Both identities involved in a mismatch that was let through by force.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IdentityAdvisory {
    pub firmware_product: String,
    pub controller_product: String,
}

impl Display for IdentityAdvisory {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "firmware for {} does not match {} but is being force installed anyway",
            self.firmware_product, self.controller_product
        )
    }
}

/// Result of a successful compatibility check.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[must_use]
pub struct GateOutcome {
    /// Present only when a mismatch was accepted because of `force`.
    pub advisory: Option<IdentityAdvisory>,
}

impl GateOutcome {
    pub fn is_forced(&self) -> bool {
        self.advisory.is_some()
    }
}

/// Reasons firmware may not be installed.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GateError {
    #[error("firmware for {firmware_product} does not match {controller_product}")]
    IdentityMismatch {
        firmware_product: String,
        controller_product: String,
    },

    #[error("device has no microcontroller {0}")]
    UnknownController(u8),
}

/// Decide whether firmware built for `firmware_product` may go on a controller reporting
/// `controller_product`. Identifiers are compared byte for byte.
pub fn check(
    firmware_product: &str,
    controller_product: &str,
    force: bool,
) -> Result<GateOutcome, GateError> {
    if firmware_product == controller_product {
        return Ok(GateOutcome::default());
    }

    if !force {
        return Err(GateError::IdentityMismatch {
            firmware_product: firmware_product.to_owned(),
            controller_product: controller_product.to_owned(),
        });
    }

    let advisory = IdentityAdvisory {
        firmware_product: firmware_product.to_owned(),
        controller_product: controller_product.to_owned(),
    };
    warn!("{advisory}");

    Ok(GateOutcome {
        advisory: Some(advisory),
    })
}
