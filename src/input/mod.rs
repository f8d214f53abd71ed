//! Composable input-signal graph
//!
//! Physical controls (keys, gamepads, touch regions, tilt) are normalized into
//! abstract game controls through an arena of signal nodes:
//! - `raw`: the per-frame device snapshot written by the platform
//! - `node` / `arena`: signal primitives, caching and connectivity
//! - `part`: connectivity aggregation over subtrees
//! - `game_input` / `switchable` / `manager`: bundles of controls and hot-swapping
//! - `builders` / `registry`: wiring for each supported source

pub mod arena;
pub mod builders;
pub mod game_input;
pub mod joystick;
pub mod manager;
pub mod node;
pub mod option;
pub mod part;
pub mod raw;
pub mod registry;
pub mod rumble;
pub mod switchable;

pub use arena::InputArena;
pub use game_input::{ControlSnapshot, GameControls, UsableGameInput};
pub use joystick::{JoystickId, JoystickShape, JoystickValue};
pub use manager::{ControllerManager, SwitchId};
pub use node::{ButtonState, GateRule, NodeId, NodeKind, RawSource, TouchRegion};
pub use option::{ConfigurableOption, OptionId, OptionKind, StoredValue};
pub use part::{ConnectionPolicy, PartChild, PartId};
pub use raw::{GamepadState, Key, MouseButton, RawInputState, ScreenArea};
pub use registry::DeviceRegistry;
pub use rumble::{RumbleId, RumbleRequest, RumbleTarget};
pub use switchable::{InputId, SwitchableGameInput};
