use super::Device;
use crate::error::{Error, Result};
use crate::prober::EntryName;
use crate::settings::{Setting, Value};
use std::fmt;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Keyboard driven by hid-lenovo, configured through sysfs attributes
#[derive(Debug, Clone)]
pub struct NativeDevice {
    hid_path: PathBuf,
}

impl NativeDevice {
    pub fn new(hid_path: impl Into<PathBuf>) -> Self {
        Self {
            hid_path: hid_path.into(),
        }
    }

    fn attribute_path(&self, setting: Setting) -> PathBuf {
        self.hid_path.join(setting.attribute())
    }

    fn read_attribute(&self, setting: Setting) -> Result<u8> {
        let path = self.attribute_path(setting);
        let file = std::fs::File::open(&path).map_err(|e| Error::from_io(&path, e))?;

        let mut line = String::new();
        BufReader::new(file)
            .read_line(&mut line)
            .map_err(|e| Error::from_io(&path, e))?;

        line.trim().parse::<u8>().map_err(|_| Error::Parse {
            path: path.clone(),
            content: line.trim_end().to_string(),
        })
    }

    fn write_attribute(&self, setting: Setting, content: &str) -> Result<()> {
        let path = self.attribute_path(setting);
        std::fs::write(&path, content).map_err(|e| Error::from_io(&path, e))?;
        tracing::debug!("Wrote {} to {}", content, path.display());
        Ok(())
    }
}

impl Device for NativeDevice {
    fn address(&self) -> &Path {
        &self.hid_path
    }

    fn backend(&self) -> &'static str {
        "native"
    }

    fn can_get(&self) -> bool {
        true
    }

    fn get(&self, setting: Setting) -> Result<Value> {
        let raw = self.read_attribute(setting)?;
        Ok(if setting.is_level() {
            Value::Level(raw)
        } else {
            Value::Flag(raw == 1)
        })
    }

    fn set(&mut self, setting: Setting, value: Value) -> Result<()> {
        match setting.validate(value)? {
            Value::Level(v) => self.write_attribute(setting, &v.to_string()),
            Value::Flag(v) => self.write_attribute(setting, if v { "1" } else { "0" }),
        }
    }
}

impl fmt::Display for NativeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .hid_path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(EntryName::parse);
        match name {
            Some(name) => write!(f, "tpkbd:{:x}:{:x}", name.bus, name.instance),
            None => write!(f, "tpkbd:{}", self.hid_path.display()),
        }
    }
}
