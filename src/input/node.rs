//! Input nodes: the signal primitives of the input graph
//!
//! Every node is either a leaf reading raw device state or a composite that
//! derives its value from other nodes' cached values. The set of variants is
//! closed; new behavior is added here, not through trait objects.

use super::joystick::JoystickId;
use super::option::OptionId;
use super::raw::{Key, MouseButton, ScreenArea};
use super::rumble::RumbleId;

/// Handle to a node in the `InputArena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// A touch region that can be mirrored by a boolean option (left-handed play)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchRegion {
    pub area: ScreenArea,
    pub mirrored: Option<(ScreenArea, OptionId)>,
}

impl TouchRegion {
    pub fn fixed(area: ScreenArea) -> Self {
        Self {
            area,
            mirrored: None,
        }
    }

    /// Use `mirror` instead of `area` while `when` is set
    pub fn mirrored(area: ScreenArea, mirror: ScreenArea, when: OptionId) -> Self {
        Self {
            area,
            mirrored: Some((mirror, when)),
        }
    }
}

/// Leaf sources
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawSource {
    Key(Key),
    Mouse(MouseButton),
    GamepadButton {
        pad: usize,
        button: usize,
    },
    /// Full-range axis. Values inside the deadzone read as 0.
    GamepadAxis {
        pad: usize,
        axis: usize,
        invert: bool,
    },
    /// Down while any pointer is inside the region
    Touch {
        region: TouchRegion,
        needs_touchscreen: bool,
    },
    /// Device tilt mapped to [-1, 1] over `max_degrees`
    Tilt {
        roll: bool,
        max_degrees: OptionId,
    },
    /// Down while acceleration is at or above the threshold (m/s²)
    Shake {
        threshold: OptionId,
    },
    /// Pointer movement this frame. With `within`, only counts while a pointer is in that region.
    PointerDelta {
        y_axis: bool,
        within: Option<TouchRegion>,
    },
    /// Dummy source for controls a scheme does not have
    Constant {
        value: f32,
        analog: bool,
    },
}

/// Rules for a gate node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateRule {
    /// Down on the frame the child is released, unless `disabled_by` is set
    OnRelease { disabled_by: Option<OptionId> },
    /// Down while the child is down and for `grace_ms` after, only while `enabled_by` is set
    HeldWithGrace {
        grace_ms: u64,
        enabled_by: Option<OptionId>,
        last_down_ms: Option<u64>,
    },
}

impl GateRule {
    pub fn on_release(disabled_by: Option<OptionId>) -> Self {
        GateRule::OnRelease { disabled_by }
    }

    pub fn held_with_grace(grace_ms: u64, enabled_by: Option<OptionId>) -> Self {
        GateRule::HeldWithGrace {
            grace_ms,
            enabled_by,
            last_down_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Source(RawSource),
    /// Child with the largest magnitude among connected children; earlier children win ties
    Highest(Vec<NodeId>),
    /// Child with the smallest magnitude among connected children
    Lowest(Vec<NodeId>),
    /// `child * factor * sensitivity`, negated while `invert` is set
    Scaled {
        child: NodeId,
        factor: f32,
        sensitivity: Option<OptionId>,
        invert: Option<OptionId>,
    },
    /// `if_true` while the option is set, otherwise `if_false`
    Choose {
        option: OptionId,
        if_true: NodeId,
        if_false: NodeId,
    },
    Gate {
        child: NodeId,
        rule: GateRule,
    },
    /// Repeating on/off pattern on the platform clock
    Pattern {
        on_ms: u64,
        off_ms: u64,
    },
    /// One axis of a joystick, zeroed inside the joystick's deadzone
    Follow {
        joystick: JoystickId,
        y_axis: bool,
    },
    /// `positive - negative`, used for key pairs
    Difference {
        positive: NodeId,
        negative: NodeId,
    },
    /// Boolean option read as a digital value
    OptionFlag {
        option: OptionId,
        connected_with: Option<RumbleId>,
    },
}

impl NodeKind {
    /// `i`-th child node, in update order
    pub(crate) fn child(&self, i: usize) -> Option<NodeId> {
        match self {
            NodeKind::Highest(children) | NodeKind::Lowest(children) => children.get(i).copied(),
            NodeKind::Scaled { child, .. } | NodeKind::Gate { child, .. } => (i == 0).then_some(*child),
            NodeKind::Choose {
                if_true, if_false, ..
            } => match i {
                0 => Some(*if_true),
                1 => Some(*if_false),
                _ => None,
            },
            NodeKind::Difference { positive, negative } => match i {
                0 => Some(*positive),
                1 => Some(*negative),
                _ => None,
            },
            NodeKind::Source(_) | NodeKind::Pattern { .. } | NodeKind::Follow { .. } | NodeKind::OptionFlag { .. } => None,
        }
    }
}

/// Edge-aware digital reading of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub down: bool,
    /// false -> true this frame
    pub pressed: bool,
    /// true -> false this frame
    pub released: bool,
}

/// A node and its per-frame cache
#[derive(Debug, Clone)]
pub struct InputNode {
    pub(crate) kind: NodeKind,
    pub(crate) analog: bool,
    pub(crate) value: f32,
    pub(crate) down: bool,
    pub(crate) prev_down: bool,
    /// Frame the cache was last filled for
    pub(crate) frame: u64,
}

impl InputNode {
    pub(crate) fn new(kind: NodeKind, analog: bool) -> Self {
        Self {
            kind,
            analog,
            value: 0.0,
            down: false,
            prev_down: false,
            frame: 0,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_analog(&self) -> bool {
        self.analog
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn button(&self) -> ButtonState {
        ButtonState {
            down: self.down,
            pressed: self.down && !self.prev_down,
            released: !self.down && self.prev_down,
        }
    }
}
