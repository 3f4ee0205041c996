use crate::error::{Error, Result};
use crate::settings::{Setting, Settings, Value};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

mod native;
mod raw;

pub use native::NativeDevice;
pub use raw::{RawDevice, encode_report};

/// Backend chosen for a device at discovery time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// sysfs directory carrying hid-lenovo attributes
    Native(PathBuf),
    /// hidraw node taking raw feature reports
    Raw(PathBuf),
}

impl Backend {
    pub fn path(&self) -> &Path {
        match self {
            Backend::Native(path) | Backend::Raw(path) => path,
        }
    }

    pub fn into_device(self) -> Box<dyn Device> {
        match self {
            Backend::Native(path) => Box::new(NativeDevice::new(path)),
            Backend::Raw(path) => Box::new(RawDevice::new(path)),
        }
    }
}

/// What a configurable TrackPoint can do, whatever the backend
pub trait Device: fmt::Display + fmt::Debug {
    /// sysfs directory or hidraw node this device is bound to
    fn address(&self) -> &Path;

    /// Short backend name, "native" or "raw"
    fn backend(&self) -> &'static str;

    fn can_get(&self) -> bool;

    fn get(&self, setting: Setting) -> Result<Value>;

    fn set(&mut self, setting: Setting, value: Value) -> Result<()>;

    /// Apply several changes in order.
    ///
    /// Every change is attempted; the first failure is returned after the
    /// rest have been tried. Nothing is rolled back.
    fn apply(&mut self, changes: &[(Setting, Value)]) -> Result<()> {
        let mut first_error = None;
        for &(setting, value) in changes {
            if let Err(e) = self.set(setting, value) {
                tracing::warn!("Failed to set {} on {}: {}", setting, self, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Read every setting back from the device
    fn read_all(&self) -> Result<Settings> {
        let level = |setting: Setting| match self.get(setting)? {
            Value::Level(v) => Ok(v),
            Value::Flag(_) => Err(Error::KindMismatch { setting }),
        };
        let flag = |setting: Setting| match self.get(setting)? {
            Value::Flag(v) => Ok(v),
            Value::Level(_) => Err(Error::KindMismatch { setting }),
        };

        Ok(Settings {
            sensitivity: level(Setting::Sensitivity)?,
            press_speed: level(Setting::PressSpeed)?,
            press_to_select: flag(Setting::PressToSelect)?,
            press_right: flag(Setting::PressRight)?,
            dragging: flag(Setting::Dragging)?,
            release_to_select: flag(Setting::ReleaseToSelect)?,
        })
    }

    fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            id: self.to_string(),
            address: self.address().to_path_buf(),
            backend: self.backend(),
            write_only: !self.can_get(),
        }
    }
}

/// Listing record for a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub id: String,
    pub address: PathBuf,
    pub backend: &'static str,
    pub write_only: bool,
}
