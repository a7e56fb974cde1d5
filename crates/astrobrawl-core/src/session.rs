//! Remote guest surface: identities, session events, and the wire format
//! for guest input payloads. Transport is a host concern; the core only
//! drains events and decodes payloads.

use serde::{Deserialize, Serialize};

/// Opaque identity assigned to a remote guest by the transport.
pub type GuestId = u64;

/// Keys a guest (or the local player) can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCode {
    W,
    Up,
    S,
    Down,
    A,
    Left,
    D,
    Right,
    Space,
    Q,
    /// Local-player spawn toggle; ignored from remote guests.
    O,
    /// Local-player despawn toggle; ignored from remote guests.
    U,
}

/// Gamepad buttons a guest can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PadButton {
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    A,
    B,
    X,
    LeftTrigger,
    RightTrigger,
}

/// One guest input message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuestInput {
    Key { code: KeyCode, pressed: bool },
    Pad { button: PadButton, pressed: bool },
}

impl GuestInput {
    pub fn encode(&self) -> Vec<u8> {
        rmp_serde::to_vec(self).expect("guest input serialization must succeed")
    }

    /// Decode a wire payload. Malformed bytes are dropped with a debug
    /// log; the frame goes on without them.
    pub fn decode(payload: &[u8]) -> Option<GuestInput> {
        match rmp_serde::from_slice(payload) {
            Ok(input) => Some(input),
            Err(e) => {
                tracing::debug!(error = %e, "dropped malformed guest input");
                None
            },
        }
    }
}

/// Events drained from the remote transport, in arrival order.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Connected(GuestId),
    Disconnected(GuestId),
    Input { guest: GuestId, payload: Vec<u8> },
}

/// The remote transport as the simulation sees it: a queue of pending
/// events, drained fully at one fixed point per frame.
pub trait RemoteSession {
    fn poll_event(&mut self) -> Option<SessionEvent>;
}

/// A session with no guests and no traffic.
#[derive(Debug, Default)]
pub struct IdleSession;

impl RemoteSession for IdleSession {
    fn poll_event(&mut self) -> Option<SessionEvent> {
        None
    }
}
