use std::path::PathBuf;

pub const HID_ROOT_ENV: &str = "TPKBDCTL_HID_ROOT";
pub const DEVICES_ROOT_ENV: &str = "TPKBDCTL_DEVICES_ROOT";
pub const DEV_ROOT_ENV: &str = "TPKBDCTL_DEV_ROOT";

/// Filesystem locations used for discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Listing of HID devices, one (symlinked) entry per device
    pub hid_root: PathBuf,
    /// Top of the sysfs device hierarchy; the interface walk stops here
    pub devices_root: PathBuf,
    /// Where hidraw nodes live
    pub dev_root: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            hid_root: PathBuf::from("/sys/bus/hid/devices"),
            devices_root: PathBuf::from("/sys/devices"),
            dev_root: PathBuf::from("/dev"),
        }
    }
}

impl Paths {
    /// Defaults, with any `TPKBDCTL_*` environment overrides applied
    pub fn from_env() -> Self {
        let mut paths = Self::default();
        if let Some(root) = std::env::var_os(HID_ROOT_ENV) {
            paths.hid_root = root.into();
        }
        if let Some(root) = std::env::var_os(DEVICES_ROOT_ENV) {
            paths.devices_root = root.into();
        }
        if let Some(root) = std::env::var_os(DEV_ROOT_ENV) {
            paths.dev_root = root.into();
        }
        paths
    }

    /// Paths for a sysfs tree mounted somewhere other than `/sys`
    pub fn with_sysfs_root(sysfs: impl Into<PathBuf>) -> Self {
        let sysfs = sysfs.into();
        Self {
            hid_root: sysfs.join("bus/hid/devices"),
            devices_root: sysfs.join("devices"),
            ..Self::default()
        }
    }

    /// Node path for a hidraw entry such as `hidraw3`
    pub fn hidraw_node(&self, name: &str) -> PathBuf {
        self.dev_root.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn sysfs_root_relocates_both_trees() {
        let paths = Paths::with_sysfs_root("/tmp/fake-sys");
        assert_eq!(paths.hid_root, Path::new("/tmp/fake-sys/bus/hid/devices"));
        assert_eq!(paths.devices_root, Path::new("/tmp/fake-sys/devices"));
        assert_eq!(paths.hidraw_node("hidraw3"), Path::new("/dev/hidraw3"));
    }

    #[test]
    fn environment_overrides_defaults() {
        // No other test in this crate touches the TPKBDCTL_* variables
        unsafe {
            std::env::set_var(HID_ROOT_ENV, "/tmp/env-sys/bus/hid/devices");
            std::env::set_var(DEV_ROOT_ENV, "/tmp/env-dev");
            std::env::remove_var(DEVICES_ROOT_ENV);
        }
        let paths = Paths::from_env();
        unsafe {
            std::env::remove_var(HID_ROOT_ENV);
            std::env::remove_var(DEV_ROOT_ENV);
        }

        assert_eq!(paths.hid_root, Path::new("/tmp/env-sys/bus/hid/devices"));
        assert_eq!(paths.dev_root, Path::new("/tmp/env-dev"));
        assert_eq!(paths.devices_root, Paths::default().devices_root);
    }
}
