//! Discovery of ThinkPad USB keyboards in sysfs.
//!
//! Each entry of the HID device listing is checked in turn: its name must
//! carry the keyboard's vendor and product, it must own exactly one hidraw
//! node, and the USB interface above it must be the HID interface number 1
//! (the one carrying the TrackPoint). The backend is then picked by looking
//! for the attributes published by hid-lenovo.

use crate::config::Paths;
use crate::device::Backend;
use crate::error::{Error, Result};
use std::fmt;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace};

pub const VENDOR_ID: &str = "17EF";
pub const PRODUCT_ID: &str = "6009";

const INTERFACE_CLASS: &str = "bInterfaceClass";
const INTERFACE_NUMBER: &str = "bInterfaceNumber";
const HID_CLASS: &str = "03";
const TRACKPOINT_INTERFACE: &str = "01";

/// A HID listing entry name, `BBBB:17EF:6009.IIII`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryName {
    pub bus: u16,
    pub instance: u16,
}

impl EntryName {
    pub fn new(bus: u16, instance: u16) -> Self {
        Self { bus, instance }
    }

    /// Parse an entry name; anything but the keyboard's vendor/product is rejected
    pub fn parse(name: &str) -> Option<Self> {
        let (bus, rest) = name.split_once(':')?;
        let (vendor, rest) = rest.split_once(':')?;
        let (product, instance) = rest.split_once('.')?;

        if !vendor.eq_ignore_ascii_case(VENDOR_ID) || !product.eq_ignore_ascii_case(PRODUCT_ID) {
            return None;
        }

        Some(Self {
            bus: parse_hex4(bus)?,
            instance: parse_hex4(instance)?,
        })
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04X}:{}:{}.{:04X}",
            self.bus, VENDOR_ID, PRODUCT_ID, self.instance
        )
    }
}

fn parse_hex4(s: &str) -> Option<u16> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(s, 16).ok()
}

/// Walk up from `start` to the directory holding the USB interface descriptors.
///
/// Fails once `boundary` or the filesystem root has been checked without
/// finding them.
pub fn find_interface(start: &Path, boundary: &Path) -> Result<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join(INTERFACE_CLASS).is_file() {
            return Ok(dir.to_path_buf());
        }
        if dir == boundary {
            break;
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => break,
        }
    }
    Err(Error::InterfaceNotFound {
        path: start.to_path_buf(),
    })
}

/// First line of a sysfs attribute, without its line terminator
pub fn read_first_line(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path).map_err(|e| Error::from_io(path, e))?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(|e| Error::from_io(path, e))?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

pub struct Prober {
    paths: Paths,
}

impl Prober {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Probe every entry of the HID listing
    pub fn enumerate(&self) -> Result<Vec<Backend>> {
        let root = &self.paths.hid_root;
        let entries = std::fs::read_dir(root).map_err(|e| Error::from_io(root, e))?;

        let mut names: Vec<String> = entries
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();

        let mut found = Vec::new();
        for name in names {
            match self.probe(&name) {
                Ok(Some(backend)) => found.push(backend),
                Ok(None) => {}
                Err(e) => error!("Skipping {}: {}", name, e),
            }
        }

        debug!("Found {} device(s) under {}", found.len(), root.display());
        Ok(found)
    }

    /// Probe a single entry of the HID listing.
    ///
    /// `Ok(None)` means the entry is absent or is not a configurable
    /// TrackPoint.
    pub fn probe(&self, name: &str) -> Result<Option<Backend>> {
        if EntryName::parse(name).is_none() {
            trace!("Ignoring {}: not a ThinkPad USB keyboard", name);
            return Ok(None);
        }

        let link = self.paths.hid_root.join(name);
        let hid_path = match link.canonicalize() {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist", link.display());
                return Ok(None);
            }
            Err(e) => return Err(Error::from_io(&link, e)),
        };

        let Some(hidraw_name) = Self::hidraw_name(&hid_path) else {
            debug!("Ignoring {}: no usable hidraw node", name);
            return Ok(None);
        };

        if !self.is_trackpoint_interface(&hid_path)? {
            debug!("Ignoring {}: not the TrackPoint interface", name);
            return Ok(None);
        }

        let backend = if hid_path.join("sensitivity").is_file() {
            Backend::Native(hid_path)
        } else {
            Backend::Raw(self.paths.hidraw_node(&hidraw_name))
        };

        info!("Found {} at {}", name, backend.path().display());
        Ok(Some(backend))
    }

    /// Name of the single directory below `<hid_path>/hidraw`
    fn hidraw_name(hid_path: &Path) -> Option<String> {
        let hidraw_dir = hid_path.join("hidraw");
        let entries: Vec<_> = std::fs::read_dir(&hidraw_dir).ok()?.flatten().collect();

        match entries.as_slice() {
            [entry] if entry.path().is_dir() => entry.file_name().into_string().ok(),
            _ => None,
        }
    }

    fn is_trackpoint_interface(&self, hid_path: &Path) -> Result<bool> {
        let boundary = self
            .paths
            .devices_root
            .canonicalize()
            .unwrap_or_else(|_| self.paths.devices_root.clone());

        let interface = find_interface(hid_path, &boundary)?;
        if read_first_line(&interface.join(INTERFACE_CLASS))? != HID_CLASS {
            return Ok(false);
        }
        Ok(read_first_line(&interface.join(INTERFACE_NUMBER))? == TRACKPOINT_INTERFACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn entry_names() {
        assert_eq!(
            EntryName::parse("0003:17EF:6009.0001"),
            Some(EntryName::new(3, 1))
        );
        assert_eq!(
            EntryName::parse("0003:17ef:6009.00aB"),
            Some(EntryName::new(3, 0xab))
        );

        for bad in [
            "",
            "0003:046D:C52B.0001",
            "0003:17EF:6047.0001",
            "003:17EF:6009.0001",
            "0003:17EF:6009.00001",
            "000g:17EF:6009.0001",
            "0003:17EF:6009:0001",
            "hidraw0",
        ] {
            assert_eq!(EntryName::parse(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn canonical_entry_name() {
        assert_eq!(EntryName::new(0x17, 1).to_string(), "0017:17EF:6009.0001");
        assert_eq!(EntryName::new(3, 0xab).to_string(), "0003:17EF:6009.00AB");
    }

    #[test]
    fn interface_walk_stops_at_boundary() {
        let dir = TempDir::new().unwrap();
        let devices = dir.path().join("devices");
        let iface = devices.join("usb1/1-1/1-1:1.1");
        let hid = iface.join("0003:17EF:6009.0001");
        std::fs::create_dir_all(&hid).unwrap();

        assert!(matches!(
            find_interface(&hid, &devices),
            Err(Error::InterfaceNotFound { .. })
        ));

        std::fs::write(iface.join(INTERFACE_CLASS), "03\n").unwrap();
        assert_eq!(find_interface(&hid, &devices).unwrap(), iface);
    }

    #[test]
    fn first_line_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bInterfaceNumber");
        std::fs::write(&path, "01\nextra\n").unwrap();
        assert_eq!(read_first_line(&path).unwrap(), "01");
    }
}
