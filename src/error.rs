use crate::settings::Setting;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Walked up from a HID device without finding its USB interface
    #[error("USB interface descriptor not found in sysfs above {}", path.display())]
    InterfaceNotFound { path: PathBuf },

    #[error("permission denied on {} (maybe run as root?)", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("no such device: {}", path.display())]
    DeviceGone { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unexpected content {content:?} in {}", path.display())]
    Parse { path: PathBuf, content: String },

    #[error("{setting} cannot be read back from a write-only device")]
    Unsupported { setting: Setting },

    #[error("wrong value kind for {setting}")]
    KindMismatch { setting: Setting },

    #[error("{setting} value {value} out of range 1-255")]
    OutOfRange { setting: Setting, value: i64 },

    #[error("unrecognized device identifier {0:?}")]
    UnknownIdentifier(String),
}

impl Error {
    /// Classify an I/O failure against `path`
    pub fn from_io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == io::ErrorKind::PermissionDenied {
            return Error::PermissionDenied { path };
        }
        match source.raw_os_error() {
            Some(libc::ENOENT) | Some(libc::ENODEV) | Some(libc::ENXIO) => {
                Error::DeviceGone { path }
            }
            _ => Error::Io { path, source },
        }
    }
}
