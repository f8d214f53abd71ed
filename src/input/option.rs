//! Configurable options woven into the input graph
//!
//! An option is a named, persisted tunable. Nodes hold an `OptionId` and read
//! the live value every frame, so a change made in a menu takes effect on the
//! very next update.

use serde::{Deserialize, Serialize};

/// Handle to an option in the `InputArena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionId(pub(crate) usize);

/// Value range of an option
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OptionKind {
    Boolean,
    AnalogRange { min: f64, max: f64 },
    DiscreteRange { min: i64, max: i64 },
}

/// A value as written to the option store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Bool(bool),
    Number(f64),
}

#[derive(Debug, Clone)]
pub struct ConfigurableOption {
    /// Persistence id, e.g. `controls.rotation.mouse.sensitivity`
    pub key: String,
    pub label: String,
    pub description: String,
    pub kind: OptionKind,
    default: f64,
    value: f64,
}

impl ConfigurableOption {
    pub fn boolean(key: impl Into<String>, label: impl Into<String>, description: impl Into<String>, default: bool) -> Self {
        let default = if default { 1.0 } else { 0.0 };
        Self {
            key: key.into(),
            label: label.into(),
            description: description.into(),
            kind: OptionKind::Boolean,
            default,
            value: default,
        }
    }

    pub fn analog(
        key: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        let (min, max) = ordered_bounds(min, max);
        let kind = OptionKind::AnalogRange { min, max };
        let default = clamp_to(kind, default);
        Self {
            key: key.into(),
            label: label.into(),
            description: description.into(),
            kind,
            default,
            value: default,
        }
    }

    pub fn discrete(
        key: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        min: i64,
        max: i64,
        default: i64,
    ) -> Self {
        let kind = OptionKind::DiscreteRange {
            min: min.min(max),
            max: min.max(max),
        };
        let default = clamp_to(kind, default as f64);
        Self {
            key: key.into(),
            label: label.into(),
            description: description.into(),
            kind,
            default,
            value: default,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn bool_value(&self) -> bool {
        self.value != 0.0
    }

    pub fn default_value(&self) -> f64 {
        self.default
    }

    /// Set the value, clamped (and rounded for discrete ranges) to the option's kind.
    /// Returns true if the stored value changed.
    pub fn set_value(&mut self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        let value = clamp_to(self.kind, value);
        let changed = value != self.value;
        self.value = value;
        changed
    }

    pub fn set_bool(&mut self, value: bool) -> bool {
        self.set_value(if value { 1.0 } else { 0.0 })
    }

    pub fn reset(&mut self) {
        self.value = self.default;
    }

    pub fn stored(&self) -> StoredValue {
        match self.kind {
            OptionKind::Boolean => StoredValue::Bool(self.bool_value()),
            _ => StoredValue::Number(self.value),
        }
    }

    pub fn apply_stored(&mut self, stored: StoredValue) -> bool {
        match stored {
            StoredValue::Bool(b) => self.set_bool(b),
            StoredValue::Number(n) => self.set_value(n),
        }
    }
}

fn clamp_to(kind: OptionKind, value: f64) -> f64 {
    match kind {
        OptionKind::Boolean => {
            if value != 0.0 {
                1.0
            } else {
                0.0
            }
        }
        OptionKind::AnalogRange { min, max } => {
            let (min, max) = ordered_bounds(min, max);
            value.max(min).min(max)
        }
        OptionKind::DiscreteRange { min, max } => {
            let (min, max) = (min.min(max) as f64, min.max(max) as f64);
            value.round().max(min).min(max)
        }
    }
}

/// Lower bound first. A NaN bound collapses onto the other one.
fn ordered_bounds(a: f64, b: f64) -> (f64, f64) {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => (0.0, 0.0),
        (true, false) => (b, b),
        (false, true) => (a, a),
        (false, false) => (a.min(b), a.max(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analog_clamps() {
        let mut opt = ConfigurableOption::analog("k", "K", "", 0.2, 2.0, 5.0);
        assert_eq!(opt.value(), 2.0);
        opt.set_value(0.0);
        assert_eq!(opt.value(), 0.2);
        opt.set_value(f64::NAN);
        assert_eq!(opt.value(), 0.2);
        opt.reset();
        assert_eq!(opt.value(), 2.0);
    }

    #[test]
    fn test_discrete_rounds() {
        let mut opt = ConfigurableOption::discrete("shake", "Shake", "", 3, 16, 9);
        opt.set_value(7.6);
        assert_eq!(opt.value(), 8.0);
        opt.set_value(100.0);
        assert_eq!(opt.value(), 16.0);
    }

    #[test]
    fn test_reversed_or_nan_bounds_do_not_panic() {
        let mut opt = ConfigurableOption::analog("k", "K", "", 2.0, 0.2, 5.0);
        assert_eq!(opt.kind, OptionKind::AnalogRange { min: 0.2, max: 2.0 });
        assert_eq!(opt.value(), 2.0);
        opt.set_value(0.0);
        assert_eq!(opt.value(), 0.2);

        let mut opt = ConfigurableOption::analog("k", "K", "", f64::NAN, 3.0, 1.0);
        assert_eq!(opt.value(), 3.0);
        opt.set_value(-4.0);
        assert_eq!(opt.value(), 3.0);
        let opt = ConfigurableOption::analog("k", "K", "", f64::NAN, f64::NAN, 1.0);
        assert_eq!(opt.value(), 0.0);

        let mut opt = ConfigurableOption::discrete("shake", "Shake", "", 16, 3, 1);
        assert_eq!(opt.kind, OptionKind::DiscreteRange { min: 3, max: 16 });
        assert_eq!(opt.value(), 3.0);
        opt.set_value(20.4);
        assert_eq!(opt.value(), 16.0);
    }

    #[test]
    fn test_set_value_reports_changes() {
        let mut opt = ConfigurableOption::analog("k", "K", "", 0.2, 2.0, 1.0);
        assert!(opt.set_value(1.5));
        assert!(!opt.set_value(1.5));
        // Clamps onto the current value
        assert!(opt.set_value(9.0));
        assert!(!opt.set_value(3.0));
        assert!(!opt.set_value(f64::NAN));

        let mut opt = ConfigurableOption::boolean("invert", "Invert", "", false);
        assert!(!opt.set_bool(false));
        assert!(opt.apply_stored(StoredValue::Bool(true)));
    }

    #[test]
    fn test_stored_values() {
        let mut opt = ConfigurableOption::boolean("invert", "Invert", "", false);
        assert_eq!(opt.stored(), StoredValue::Bool(false));
        opt.apply_stored(StoredValue::Bool(true));
        assert!(opt.bool_value());
        opt.apply_stored(StoredValue::Number(0.0));
        assert!(!opt.bool_value());
    }
}
