use crate::config::Paths;
use crate::device::{Device, RawDevice};
use crate::error::{Error, Result};
use crate::prober::{EntryName, PRODUCT_ID, Prober, VENDOR_ID};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A user supplied device identifier, as accepted by `--device`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// An entry of the HID listing, to be probed
    Entry(EntryName),
    /// A hidraw node used as is, without any probing
    Node(PathBuf),
}

impl Identifier {
    /// Parse one of:
    /// - a sysfs path ending in `<bus>:17EF:6009.<instance>`
    /// - `tpkbd:<bus>:<instance>` (hex, as printed by `--list`)
    /// - `hidraw:<N>` or `hidraw:<node path>`
    /// - `/dev/hidraw<N>`
    pub fn parse(input: &str, dev_root: &Path) -> Result<Self> {
        let unknown = || Error::UnknownIdentifier(input.to_string());

        if let Some(rest) = input.strip_prefix("tpkbd:") {
            let (bus, instance) = rest.split_once(':').ok_or_else(unknown)?;
            let entry = EntryName::new(
                parse_hex(bus).ok_or_else(unknown)?,
                parse_hex(instance).ok_or_else(unknown)?,
            );
            return Ok(Identifier::Entry(entry));
        }

        if let Some(suffix) = input.strip_prefix("hidraw:") {
            if suffix.starts_with('/') {
                return Ok(Identifier::Node(PathBuf::from(suffix)));
            }
            return Ok(Identifier::Node(
                dev_root.join(format!("hidraw{}", suffix)),
            ));
        }

        if let Some(number) = input.strip_prefix("/dev/hidraw") {
            if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
                return Ok(Identifier::Node(
                    dev_root.join(format!("hidraw{}", number)),
                ));
            }
            return Err(unknown());
        }

        if input.starts_with("/devices/") || input.starts_with("/sys/devices/") {
            let name = input.rsplit('/').next().ok_or_else(unknown)?;
            return Self::parse_sysfs_name(name)
                .map(Identifier::Entry)
                .ok_or_else(unknown);
        }

        Err(unknown())
    }

    // Like EntryName::parse, but the hex groups may have any width
    fn parse_sysfs_name(name: &str) -> Option<EntryName> {
        let (bus, rest) = name.split_once(':')?;
        let (vendor, rest) = rest.split_once(':')?;
        let (product, instance) = rest.split_once('.')?;
        if !vendor.eq_ignore_ascii_case(VENDOR_ID) || !product.eq_ignore_ascii_case(PRODUCT_ID) {
            return None;
        }
        Some(EntryName::new(parse_hex(bus)?, parse_hex(instance)?))
    }
}

fn parse_hex(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(s, 16).ok()
}

/// The set of devices a command operates on
pub struct Selection {
    prober: Prober,
    devices: Vec<Box<dyn Device>>,
}

impl Selection {
    pub fn new(paths: Paths) -> Self {
        Self {
            prober: Prober::new(paths),
            devices: Vec::new(),
        }
    }

    /// Replace the selection with every device found in sysfs
    pub fn enumerate(&mut self) -> Result<usize> {
        self.devices = self
            .prober
            .enumerate()?
            .into_iter()
            .map(|backend| backend.into_device())
            .collect();
        Ok(self.devices.len())
    }

    /// Resolve `identifier` and add it to the selection.
    ///
    /// Returns false, leaving the selection untouched, when the identifier
    /// names no usable device.
    pub fn select(&mut self, identifier: &str) -> Result<bool> {
        match Identifier::parse(identifier, &self.prober.paths().dev_root)? {
            Identifier::Node(node) => {
                debug!("Using {} without validation", node.display());
                self.push_raw(node);
                Ok(true)
            }
            Identifier::Entry(entry) => match self.prober.probe(&entry.to_string())? {
                Some(backend) => {
                    self.devices.push(backend.into_device());
                    Ok(true)
                }
                None => {
                    warn!("Device {} not found", identifier);
                    Ok(false)
                }
            },
        }
    }

    /// Add a raw device at an arbitrary node, without any checks
    pub fn push_raw(&mut self, node: impl Into<PathBuf>) {
        self.devices.push(Box::new(RawDevice::new(node)));
    }

    pub fn devices(&self) -> &[Box<dyn Device>] {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut [Box<dyn Device>] {
        &mut self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
