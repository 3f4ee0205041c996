//! tpkbdctl - ThinkPad USB keyboard TrackPoint configuration
//!
//! This library finds ThinkPad USB keyboards in sysfs and changes their
//! TrackPoint settings, either through the attributes of the hid-lenovo
//! driver or by sending feature reports to the hidraw node.

pub mod config;
pub mod device;
pub mod error;
pub mod hidraw;
pub mod prober;
pub mod selection;
pub mod settings;

// Re-export commonly used types
pub use config::Paths;
pub use device::{Backend, Device, DeviceSummary, NativeDevice, RawDevice};
pub use error::{Error, Result};
pub use prober::{EntryName, Prober};
pub use selection::{Identifier, Selection};
pub use settings::{Setting, Settings, Value, parse_choice};
