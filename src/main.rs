use anyhow::Result;
use asus_hid::config::DeviceConfig;
use asus_hid::device::AsusHidDevice;
use asus_hid::device_ids::{DeviceCompat, HID_INTERFACE, UsbId, identify_device};
use asus_hid::firmware::{self, FirmwareImage};
use clap::Parser;
use hidapi::{DeviceInfo, HidApi, HidDevice};
use log::warn;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "asus-hid", version, about)]
enum Opt {
    /// List all connected ASUS HID devices (vendor ID 0x0b05)
    List,

    /// Query the identity of every microcontroller in a device
    Info {
        #[command(flatten)]
        spec: DeviceSpec,
    },

    /// Check whether a firmware file may be installed on one of a device's microcontrollers
    Check {
        #[command(flatten)]
        spec: DeviceSpec,

        /// Microcontroller to check against
        #[arg(short, long, default_value_t = 0)]
        mcu: u8,

        /// Accept firmware built for a different product
        #[arg(long)]
        force_mismatch: bool,

        file: PathBuf,
    },
}

#[derive(Error, Debug)]
enum MatchError {
    #[error("no devices match specification")]
    NoDevices,

    #[error("multiple devices match specification")]
    MultipleDevices,

    #[error("device is untested; pass --force and --controllers to use it anyway")]
    Untested,
}

#[derive(clap::Args, Debug)]
struct DeviceSpec {
    /// Serial number
    #[arg(short)]
    serial: Option<String>,

    /// Product ID (vendor ID is always matched against ASUS's, 0x0b05)
    #[arg(short)]
    pid: Option<u16>,

    /// Number of microcontrollers (default: known value for the device)
    #[arg(long)]
    controllers: Option<String>,

    /// Use the device even if it is untested
    #[arg(short, long)]
    force: bool,
}

impl DeviceSpec {
    fn matches(&self, device: &DeviceInfo) -> bool {
        if device.vendor_id() != asus_hid::device_ids::ASUS_VID
            || device.interface_number() != HID_INTERFACE
        {
            return false;
        }

        if let Some(ref x) = self.serial {
            if device.serial_number() != Some(x.as_str()) {
                return false;
            }
        }

        if let Some(x) = self.pid {
            if device.product_id() != x {
                return false;
            }
        }

        true
    }

    fn get_device<'a>(&self, hidapi: &'a HidApi) -> Result<(HidDevice, &'a DeviceInfo)> {
        let mut candidates = hidapi.device_list().filter(|d| self.matches(d));

        match candidates.next() {
            None => Err(MatchError::NoDevices.into()),
            Some(dev) => {
                if candidates.next().is_some() {
                    Err(MatchError::MultipleDevices.into())
                } else {
                    dev.open_device(hidapi)
                        .map_err(Into::into)
                        .map(|open| (open, dev))
                }
            }
        }
    }

    /// Open the matching device and enumerate its controllers.
    fn setup(&self, hidapi: &HidApi) -> Result<(AsusHidDevice<HidDevice>, UsbId)> {
        let (dev, info) = self.get_device(hidapi)?;
        let id = usb_id(info);

        let mut config = match identify_device(id) {
            DeviceCompat::Compatible(known) => DeviceConfig::new(known.controllers),
            DeviceCompat::Untested if self.force => {
                warn!("Device {id} is untested, proceeding anyway");
                DeviceConfig::default()
            }
            DeviceCompat::Untested => return Err(MatchError::Untested.into()),
            DeviceCompat::Incompatible => return Err(MatchError::NoDevices.into()),
        };
        if let Some(ref count) = self.controllers {
            config.set_controller_count(count)?;
        }

        let mut device = AsusHidDevice::new(dev, config);
        device.setup()?;
        Ok((device, id))
    }
}

fn usb_id(info: &DeviceInfo) -> UsbId {
    UsbId {
        vid: info.vendor_id(),
        pid: info.product_id(),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or("ASUS_HID_LOG", "info")
            .write_style("ASUS_HID_LOG_STYLE"),
    )
    .init();

    let mode = Opt::parse();

    let api = HidApi::new()?;

    match mode {
        Opt::List => list(&api),
        Opt::Info { spec } => {
            let (device, id) = spec.setup(&api)?;

            for child in device.children() {
                println!("{} ({}):", child.name(), child.logical_id());
                println!("  Manufacturer: {}", child.manufacturer());
                println!("  Product: {}", child.product());
                println!("  Version: {}", child.version());
                println!("  Instance ID: {}", child.instance_id(id));
            }
        }
        Opt::Check {
            spec,
            mcu,
            force_mismatch,
            file: path,
        } => {
            let mut file = std::fs::File::open(path)?;
            let image = firmware::parse(&mut file)?;
            println!(
                "Firmware: {} version {} ({})",
                image.product(),
                image.version(),
                image.fga()
            );

            let (device, _) = spec.setup(&api)?;
            let outcome = device.prepare_firmware(&image, mcu, force_mismatch)?;
            match outcome.advisory {
                Some(advisory) => println!("Forced: {advisory}"),
                None => println!("Firmware matches microcontroller {mcu}"),
            }
        }
    };

    Ok(())
}

fn list(hidapi: &HidApi) {
    let all_spec = DeviceSpec {
        serial: None,
        pid: None,
        controllers: None,
        force: false,
    };
    for dev in hidapi.device_list().filter(|d| all_spec.matches(d)) {
        let compat = identify_device(usb_id(dev));
        if let DeviceCompat::Incompatible = compat {
            continue;
        }

        println!(
            "{} {} {} [{}]",
            usb_id(dev),
            dev.serial_number().unwrap_or("INVALID"),
            dev.product_string().unwrap_or("INVALID"),
            compat,
        );
    }
}
