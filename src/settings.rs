//! The six TrackPoint settings and their values.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A tunable TrackPoint property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting {
    Sensitivity,
    PressSpeed,
    PressToSelect,
    PressRight,
    Dragging,
    ReleaseToSelect,
}

impl Setting {
    pub const ALL: [Setting; 6] = [
        Setting::Sensitivity,
        Setting::PressSpeed,
        Setting::PressToSelect,
        Setting::PressRight,
        Setting::Dragging,
        Setting::ReleaseToSelect,
    ];

    /// Name of the sysfs attribute exposed by hid-lenovo
    pub fn attribute(self) -> &'static str {
        match self {
            Setting::Sensitivity => "sensitivity",
            Setting::PressSpeed => "press_speed",
            Setting::PressToSelect => "press_to_select",
            Setting::PressRight => "press_right",
            Setting::Dragging => "dragging",
            Setting::ReleaseToSelect => "release_to_select",
        }
    }

    /// Whether the setting holds a 1-255 level rather than a flag
    pub fn is_level(self) -> bool {
        matches!(self, Setting::Sensitivity | Setting::PressSpeed)
    }

    /// Build a level value for this setting, rejecting anything outside 1-255
    pub fn level(self, value: i64) -> Result<Value> {
        if !self.is_level() {
            return Err(Error::KindMismatch { setting: self });
        }
        match u8::try_from(value) {
            Ok(v) if v >= 1 => Ok(Value::Level(v)),
            _ => Err(Error::OutOfRange {
                setting: self,
                value,
            }),
        }
    }

    /// Check that `value` has the right kind (and range) for this setting
    pub fn validate(self, value: Value) -> Result<Value> {
        match value {
            Value::Level(v) => self.level(v as i64),
            Value::Flag(_) if self.is_level() => Err(Error::KindMismatch { setting: self }),
            Value::Flag(_) => Ok(value),
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Level(u8),
    Flag(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Level(v) => write!(f, "{}", v),
            Value::Flag(v) => write!(f, "{}", v),
        }
    }
}

/// Interpret a yes/no style answer by its first character only
pub fn parse_choice(input: &str) -> bool {
    matches!(
        input.chars().next().map(|c| c.to_ascii_lowercase()),
        Some('y' | 't' | '1')
    )
}

/// A full set of values, as pushed in one feature report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub sensitivity: u8,
    pub press_speed: u8,
    pub press_to_select: bool,
    pub press_right: bool,
    pub dragging: bool,
    pub release_to_select: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensitivity: 180,
            press_speed: 180,
            press_to_select: false,
            press_right: false,
            dragging: false,
            release_to_select: false,
        }
    }
}

impl Settings {
    pub fn get(&self, setting: Setting) -> Value {
        match setting {
            Setting::Sensitivity => Value::Level(self.sensitivity),
            Setting::PressSpeed => Value::Level(self.press_speed),
            Setting::PressToSelect => Value::Flag(self.press_to_select),
            Setting::PressRight => Value::Flag(self.press_right),
            Setting::Dragging => Value::Flag(self.dragging),
            Setting::ReleaseToSelect => Value::Flag(self.release_to_select),
        }
    }

    /// Store `value`, leaving everything untouched if it is invalid
    pub fn set(&mut self, setting: Setting, value: Value) -> Result<()> {
        match (setting, setting.validate(value)?) {
            (Setting::Sensitivity, Value::Level(v)) => self.sensitivity = v,
            (Setting::PressSpeed, Value::Level(v)) => self.press_speed = v,
            (Setting::PressToSelect, Value::Flag(v)) => self.press_to_select = v,
            (Setting::PressRight, Value::Flag(v)) => self.press_right = v,
            (Setting::Dragging, Value::Flag(v)) => self.dragging = v,
            (Setting::ReleaseToSelect, Value::Flag(v)) => self.release_to_select = v,
            _ => return Err(Error::KindMismatch { setting }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_uses_first_character() {
        for yes in ["y", "Y", "yes", "true", "1", "TRUE", "t"] {
            assert!(parse_choice(yes), "{yes:?} should be true");
        }
        for no in ["n", "no", "0", "", "xyz", "false", " yes"] {
            assert!(!parse_choice(no), "{no:?} should be false");
        }
    }

    #[test]
    fn level_range() {
        assert_eq!(Setting::Sensitivity.level(1).unwrap(), Value::Level(1));
        assert_eq!(Setting::PressSpeed.level(255).unwrap(), Value::Level(255));
        assert!(matches!(
            Setting::Sensitivity.level(300),
            Err(Error::OutOfRange { value: 300, .. })
        ));
        assert!(matches!(
            Setting::PressSpeed.level(0),
            Err(Error::OutOfRange { value: 0, .. })
        ));
        assert!(matches!(
            Setting::PressSpeed.level(-4),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(
            Setting::Dragging.level(3),
            Err(Error::KindMismatch { .. })
        ));
    }

    #[test]
    fn rejected_values_leave_settings_alone() {
        let mut settings = Settings::default();
        assert!(settings.set(Setting::Sensitivity, Value::Level(0)).is_err());
        assert!(settings.set(Setting::PressSpeed, Value::Flag(true)).is_err());
        assert!(settings.set(Setting::Dragging, Value::Level(1)).is_err());
        assert_eq!(settings, Settings::default());

        settings.set(Setting::PressRight, Value::Flag(true)).unwrap();
        settings.set(Setting::Sensitivity, Value::Level(90)).unwrap();
        assert_eq!(settings.get(Setting::PressRight), Value::Flag(true));
        assert_eq!(settings.get(Setting::Sensitivity), Value::Level(90));
    }

    #[test]
    fn settings_serialize_by_attribute_name() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["sensitivity"], 180);
        assert_eq!(json["release_to_select"], false);
        assert_eq!(
            serde_json::to_value(Setting::PressToSelect).unwrap(),
            "press_to_select"
        );
    }
}
