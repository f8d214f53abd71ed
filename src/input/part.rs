//! Controller parts: connectivity aggregation over a subtree of the graph
//!
//! A part owns its children exclusively and may "rely on" another part. The
//! relies-on link is a plain handle used only to ask whether that part is
//! connected; it never implies ownership.

use super::joystick::JoystickId;
use super::node::NodeId;
use super::rumble::RumbleId;

/// Handle to a part in the `InputArena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartChild {
    Node(NodeId),
    Joystick(JoystickId),
    Rumble(RumbleId),
    Part(PartId),
}

/// How children combine into the part's connection state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionPolicy {
    /// Connected if at least one child is
    #[default]
    AnyChild,
    /// Connected only if every child is. For a single physical device whose
    /// components share one connection.
    AllChildren,
}

#[derive(Debug, Clone)]
pub struct ControllerPart {
    pub name: String,
    pub policy: ConnectionPolicy,
    pub(crate) children: Vec<PartChild>,
    pub(crate) relies_on: Option<PartId>,
    pub(crate) parent: Option<PartId>,
}

impl ControllerPart {
    pub(crate) fn new(name: impl Into<String>, policy: ConnectionPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            children: Vec::new(),
            relies_on: None,
            parent: None,
        }
    }

    pub fn children(&self) -> &[PartChild] {
        &self.children
    }

    pub fn relies_on(&self) -> Option<PartId> {
        self.relies_on
    }

    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }
}
