//! Rumble outputs
//!
//! Rumble is the one output of a game input. Requests are held until the
//! platform drains them, so switching inputs never drops a pending request.

use super::raw::RawInputState;

/// Handle to a rumble output in the `InputArena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RumbleId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RumbleTarget {
    /// Scheme without force feedback
    Disconnected,
    Gamepad(usize),
    /// Phone vibrator
    Vibrator,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RumbleRequest {
    pub duration_ms: u64,
    /// In [0, 1]
    pub intensity: f32,
}

#[derive(Debug, Clone)]
pub struct Rumble {
    pub target: RumbleTarget,
    pending: Option<RumbleRequest>,
    active_until_ms: u64,
}

impl Rumble {
    pub fn new(target: RumbleTarget) -> Self {
        Self {
            target,
            pending: None,
            active_until_ms: 0,
        }
    }

    pub fn is_connected(&self, raw: &RawInputState) -> bool {
        match self.target {
            RumbleTarget::Disconnected => false,
            RumbleTarget::Gamepad(pad) => raw.gamepad(pad).is_some_and(|g| g.connected && g.rumble_capable),
            RumbleTarget::Vibrator => raw.peripherals.vibrator,
        }
    }

    /// Queue a request. A stronger or longer request replaces a weaker pending one.
    pub fn request(&mut self, request: RumbleRequest, now_ms: u64) {
        let intensity = request.intensity.clamp(0.0, 1.0);
        let request = RumbleRequest {
            duration_ms: request.duration_ms,
            intensity,
        };
        let replace = match self.pending {
            None => true,
            Some(p) => intensity > p.intensity || (intensity == p.intensity && request.duration_ms > p.duration_ms),
        };
        if replace {
            self.pending = Some(request);
        }
        self.active_until_ms = self.active_until_ms.max(now_ms + request.duration_ms);
    }

    pub fn pending(&self) -> Option<RumbleRequest> {
        self.pending
    }

    /// Hand the pending request to the platform
    pub fn take_pending(&mut self) -> Option<RumbleRequest> {
        self.pending.take()
    }

    pub fn is_active(&self, now_ms: u64) -> bool {
        now_ms < self.active_until_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::raw::GamepadState;

    #[test]
    fn test_connectivity() {
        let mut raw = RawInputState::desktop();
        assert!(!Rumble::new(RumbleTarget::Disconnected).is_connected(&raw));
        assert!(!Rumble::new(RumbleTarget::Vibrator).is_connected(&raw));

        let mut pad = GamepadState::new("pad", 6, 14);
        pad.rumble_capable = true;
        raw.gamepads.push(pad);
        assert!(Rumble::new(RumbleTarget::Gamepad(0)).is_connected(&raw));
        raw.gamepads[0].connected = false;
        assert!(!Rumble::new(RumbleTarget::Gamepad(0)).is_connected(&raw));
    }

    #[test]
    fn test_stronger_request_wins() {
        let mut rumble = Rumble::new(RumbleTarget::Vibrator);
        rumble.request(RumbleRequest { duration_ms: 100, intensity: 0.3 }, 0);
        rumble.request(RumbleRequest { duration_ms: 50, intensity: 0.2 }, 0);
        assert_eq!(rumble.pending().unwrap().intensity, 0.3);
        rumble.request(RumbleRequest { duration_ms: 50, intensity: 2.0 }, 0);
        assert_eq!(rumble.pending().unwrap().intensity, 1.0);
        assert!(rumble.is_active(99));
        assert!(!rumble.is_active(100));
        assert!(rumble.take_pending().is_some());
        assert!(rumble.take_pending().is_none());
    }
}
