use super::Device;
use crate::error::{Error, Result};
use crate::hidraw::{FeatureTransport, HidrawTransport, REPORT_LEN};
use crate::settings::{Setting, Settings, Value};
use std::fmt;
use std::path::{Path, PathBuf};

const REPORT_ID: u8 = 4;
const SUB_REPORT: u8 = 3;

/// Build the feature report carrying every setting
pub fn encode_report(settings: &Settings) -> [u8; REPORT_LEN] {
    let mut props = 0u8;
    props |= if settings.press_to_select { 0x01 } else { 0x02 };
    props |= if settings.dragging { 0x04 } else { 0x08 };
    props |= if settings.release_to_select { 0x10 } else { 0x20 };
    props |= if settings.press_right { 0x80 } else { 0x40 };

    [
        REPORT_ID,
        props,
        SUB_REPORT,
        settings.sensitivity,
        settings.press_speed,
    ]
}

/// Keyboard reached through its hidraw node.
///
/// The device cannot report its settings, so the last values sent are kept
/// here and every change resends all of them.
pub struct RawDevice {
    node: PathBuf,
    shadow: Settings,
    transport: Box<dyn FeatureTransport>,
}

impl RawDevice {
    pub fn new(node: impl Into<PathBuf>) -> Self {
        Self::with_transport(node, Box::new(HidrawTransport))
    }

    pub fn with_transport(node: impl Into<PathBuf>, transport: Box<dyn FeatureTransport>) -> Self {
        Self {
            node: node.into(),
            shadow: Settings::default(),
            transport,
        }
    }

    /// Values last pushed (or attempted) to the device
    pub fn shadow(&self) -> &Settings {
        &self.shadow
    }

    pub fn report(&self) -> [u8; REPORT_LEN] {
        encode_report(&self.shadow)
    }

    fn flush(&self) -> Result<()> {
        let report = self.report();
        tracing::debug!("Sending {:02x?} to {}", report, self.node.display());
        self.transport
            .send_feature(&self.node, &report)
            .map_err(|e| Error::from_io(&self.node, e))
    }

    pub fn set_sensitivity(&mut self, value: u8) -> Result<()> {
        self.set(Setting::Sensitivity, Value::Level(value))
    }

    pub fn set_press_speed(&mut self, value: u8) -> Result<()> {
        self.set(Setting::PressSpeed, Value::Level(value))
    }

    pub fn set_press_to_select(&mut self, value: bool) -> Result<()> {
        self.set(Setting::PressToSelect, Value::Flag(value))
    }

    pub fn set_press_right(&mut self, value: bool) -> Result<()> {
        self.set(Setting::PressRight, Value::Flag(value))
    }

    pub fn set_dragging(&mut self, value: bool) -> Result<()> {
        self.set(Setting::Dragging, Value::Flag(value))
    }

    pub fn set_release_to_select(&mut self, value: bool) -> Result<()> {
        self.set(Setting::ReleaseToSelect, Value::Flag(value))
    }
}

impl Device for RawDevice {
    fn address(&self) -> &Path {
        &self.node
    }

    fn backend(&self) -> &'static str {
        "raw"
    }

    fn can_get(&self) -> bool {
        false
    }

    fn get(&self, setting: Setting) -> Result<Value> {
        Err(Error::Unsupported { setting })
    }

    fn set(&mut self, setting: Setting, value: Value) -> Result<()> {
        self.shadow.set(setting, value)?;
        self.flush()
    }

    /// Update the shadow for every valid change, then send one report
    fn apply(&mut self, changes: &[(Setting, Value)]) -> Result<()> {
        let mut first_error = None;
        let mut accepted = false;
        for &(setting, value) in changes {
            match self.shadow.set(setting, value) {
                Ok(()) => accepted = true,
                Err(e) => {
                    tracing::warn!("Ignoring {} for {}: {}", setting, self, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        // Nothing new to send if every change was rejected
        if accepted {
            self.flush()?;
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Display for RawDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hidraw:{} (write-only)", self.node.display())
    }
}

impl fmt::Debug for RawDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDevice")
            .field("node", &self.node)
            .field("shadow", &self.shadow)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Recorder {
        sent: Rc<RefCell<Vec<[u8; REPORT_LEN]>>>,
        fail_with: Option<i32>,
    }

    impl FeatureTransport for Recorder {
        fn send_feature(&self, _node: &Path, report: &[u8; REPORT_LEN]) -> io::Result<()> {
            if let Some(errno) = self.fail_with {
                return Err(io::Error::from_raw_os_error(errno));
            }
            self.sent.borrow_mut().push(*report);
            Ok(())
        }
    }

    fn recorded() -> (RawDevice, Rc<RefCell<Vec<[u8; REPORT_LEN]>>>) {
        let recorder = Recorder::default();
        let sent = recorder.sent.clone();
        (
            RawDevice::with_transport("/dev/hidraw3", Box::new(recorder)),
            sent,
        )
    }

    #[test]
    fn fresh_device_reports_defaults() {
        let (device, sent) = recorded();
        assert_eq!(device.report(), [4, 0x02 | 0x08 | 0x20 | 0x40, 3, 180, 180]);
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn each_setter_flushes_everything() {
        let (mut device, sent) = recorded();
        device.set_sensitivity(100).unwrap();
        device.set_press_to_select(true).unwrap();
        device.set_press_right(true).unwrap();
        device.set_dragging(true).unwrap();
        device.set_release_to_select(true).unwrap();
        device.set_press_speed(7).unwrap();

        let sent = sent.borrow();
        assert_eq!(sent.len(), 6);
        assert_eq!(sent[0], [4, 0x6a, 3, 100, 180]);
        assert_eq!(sent[1], [4, 0x69, 3, 100, 180]);
        assert_eq!(sent[5], [4, 0x01 | 0x04 | 0x10 | 0x80, 3, 100, 7]);
    }

    #[test]
    fn one_bit_per_flag_pair() {
        let (mut device, sent) = recorded();
        device.set_press_right(true).unwrap();
        let flags = sent.borrow()[0][1];
        for pair in [0x03u8, 0x0c, 0x30, 0xc0] {
            assert_eq!((flags & pair).count_ones(), 1);
        }
        assert_eq!(flags & 0xc0, 0x80);
    }

    #[test]
    fn out_of_range_is_not_sent() {
        let (mut device, sent) = recorded();
        assert!(matches!(
            device.set(Setting::Sensitivity, Value::Level(0)),
            Err(Error::OutOfRange { .. })
        ));
        assert_eq!(device.shadow().sensitivity, 180);
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn reading_is_unsupported() {
        let (device, _sent) = recorded();
        assert!(matches!(
            device.get(Setting::Dragging),
            Err(Error::Unsupported {
                setting: Setting::Dragging
            })
        ));
        assert!(device.read_all().is_err());
        assert!(!device.can_get());
    }

    #[test]
    fn failed_flush_keeps_attempted_value() {
        let recorder = Recorder {
            fail_with: Some(libc::EACCES),
            ..Recorder::default()
        };
        let mut device = RawDevice::with_transport("/dev/hidraw3", Box::new(recorder));
        assert!(matches!(
            device.set_sensitivity(42),
            Err(Error::PermissionDenied { .. })
        ));
        assert_eq!(device.shadow().sensitivity, 42);
    }

    #[test]
    fn apply_sends_a_single_report() {
        let (mut device, sent) = recorded();
        device
            .apply(&[
                (Setting::Sensitivity, Value::Level(200)),
                (Setting::Dragging, Value::Flag(true)),
                (Setting::Sensitivity, Value::Level(210)),
            ])
            .unwrap();
        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], [4, 0x02 | 0x04 | 0x20 | 0x40, 3, 210, 180]);
    }

    #[test]
    fn apply_with_only_rejected_changes_sends_nothing() {
        let (mut device, sent) = recorded();
        assert!(matches!(
            device.apply(&[
                (Setting::Sensitivity, Value::Level(0)),
                (Setting::Dragging, Value::Level(1)),
            ]),
            Err(Error::OutOfRange { value: 0, .. })
        ));
        assert!(sent.borrow().is_empty());
        assert_eq!(*device.shadow(), Settings::default());
    }

    #[test]
    fn apply_sends_accepted_changes_despite_rejections() {
        let (mut device, sent) = recorded();
        assert!(
            device
                .apply(&[
                    (Setting::PressSpeed, Value::Level(0)),
                    (Setting::PressRight, Value::Flag(true)),
                ])
                .is_err()
        );
        assert_eq!(
            sent.borrow().as_slice(),
            &[[4, 0x02 | 0x08 | 0x20 | 0x80, 3, 180, 180]]
        );
    }

    #[test]
    fn display_names_the_node() {
        let (device, _sent) = recorded();
        assert_eq!(device.to_string(), "hidraw:/dev/hidraw3 (write-only)");
    }
}
