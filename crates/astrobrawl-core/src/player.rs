use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::session::GuestId;

/// An RGB color tag shared by players and the entities they own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PlayerColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unowned entities (asteroids) and UI text.
    pub const WHITE: PlayerColor = PlayerColor::rgb(255, 255, 255);
    /// Destruction flash.
    pub const RED: PlayerColor = PlayerColor::rgb(230, 41, 55);

    /// Fixed palette players draw from, without replacement.
    pub const PALETTE: &[PlayerColor] = &[
        PlayerColor::rgb(255, 203, 0),   // gold
        PlayerColor::rgb(255, 161, 0),   // orange
        PlayerColor::rgb(255, 109, 194), // pink
        PlayerColor::rgb(0, 158, 47),    // lime
        PlayerColor::rgb(0, 228, 48),    // green
        PlayerColor::rgb(102, 191, 255), // sky blue
        PlayerColor::rgb(135, 60, 190),  // violet
        PlayerColor::rgb(211, 176, 131), // beige
    ];
}

/// Keyboard button states for one player. Remote guests mirror their key
/// events into this; the local player is polled into it each frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardState {
    pub w: bool,
    pub up: bool,
    pub s: bool,
    pub down: bool,
    pub a: bool,
    pub left: bool,
    pub d: bool,
    pub right: bool,
    pub space: bool,
    pub q: bool,
}

/// Gamepad button states for one player.
#[derive(Debug, Clone, Copy, Default)]
pub struct GamepadState {
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub left_trigger: bool,
    pub right_trigger: bool,
}

/// The one discrete action a ship takes per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipAction {
    None,
    TurnLeft,
    TurnRight,
    SpeedUp,
    SpeedDown,
    Shoot,
}

/// A roster slot: remote guest or local pilot, their ship, and their score.
#[derive(Debug, Clone, Default)]
pub struct Player {
    /// Remote guest identity; `None` for the local player.
    pub guest: Option<GuestId>,
    /// Back-reference to the owned ship. Non-owning: goes stale once the
    /// ship slot is released, and every dereference is validated.
    pub ship: Option<EntityId>,
    pub color: PlayerColor,
    pub score: i32,
    pub active: bool,
    pub keys: KeyboardState,
    pub pad: GamepadState,
}

impl Player {
    /// Zero the slot before reuse.
    pub fn clear(&mut self) {
        *self = Player::default();
    }

    /// Reset combo: Q, or both gamepad triggers held together.
    pub fn wants_reset(&self) -> bool {
        self.keys.q || (self.pad.left_trigger && self.pad.right_trigger)
    }

    /// Merge held buttons into a single action. Checks run in a fixed
    /// order and the last match wins, so shoot overrides turning which
    /// overrides speed changes.
    pub fn resolve_action(&self) -> ShipAction {
        let mut action = ShipAction::None;
        if self.keys.w || self.keys.up || self.pad.dpad_up || self.pad.a {
            action = ShipAction::SpeedUp;
        }
        if self.keys.s || self.keys.down || self.pad.dpad_down || self.pad.b {
            action = ShipAction::SpeedDown;
        }
        if self.keys.a || self.keys.left || self.pad.dpad_left {
            action = ShipAction::TurnLeft;
        }
        if self.keys.d || self.keys.right || self.pad.dpad_right {
            action = ShipAction::TurnRight;
        }
        if self.keys.space || self.pad.x {
            action = ShipAction::Shoot;
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colors_are_distinct() {
        for (i, a) in PlayerColor::PALETTE.iter().enumerate() {
            for b in &PlayerColor::PALETTE[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn idle_player_takes_no_action() {
        assert_eq!(Player::default().resolve_action(), ShipAction::None);
    }

    #[test]
    fn shoot_overrides_everything_else() {
        let mut p = Player::default();
        p.keys.w = true;
        p.keys.a = true;
        p.keys.space = true;
        assert_eq!(p.resolve_action(), ShipAction::Shoot);
    }

    #[test]
    fn turn_overrides_speed() {
        let mut p = Player::default();
        p.keys.up = true;
        p.keys.d = true;
        assert_eq!(p.resolve_action(), ShipAction::TurnRight);
    }

    #[test]
    fn gamepad_mirrors_keyboard_actions() {
        let mut p = Player::default();
        p.pad.dpad_left = true;
        assert_eq!(p.resolve_action(), ShipAction::TurnLeft);
        p.pad.x = true;
        assert_eq!(p.resolve_action(), ShipAction::Shoot);
    }

    #[test]
    fn reset_requires_both_triggers() {
        let mut p = Player::default();
        p.pad.left_trigger = true;
        assert!(!p.wants_reset());
        p.pad.right_trigger = true;
        assert!(p.wants_reset());

        let mut q = Player::default();
        q.keys.q = true;
        assert!(q.wants_reset());
    }

    #[test]
    fn clear_zeroes_the_slot() {
        let mut p = Player::default();
        p.score = 7;
        p.active = true;
        p.keys.space = true;
        p.clear();
        assert_eq!(p.score, 0);
        assert!(!p.active);
        assert!(!p.keys.space);
        assert!(p.ship.is_none());
    }
}
