//! The arena state and the fixed per-frame operation order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::FrameClock;
use crate::collision;
use crate::config::ArenaConfig;
use crate::entity::{EntityId, EntityKind, EntityPool};
use crate::placement;
use crate::player::{Player, PlayerColor, ShipAction};
use crate::render::{self, FrameSink, InputSource, Renderer};
use crate::session::{GuestId, GuestInput, KeyCode, PadButton, RemoteSession, SessionEvent};

/// Color draws before a player add gives up on finding an unused one.
const COLOR_RETRY_BUDGET: u32 = 100;

/// Why a player could not be added. All recoverable: the caller skips the
/// add and the session moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPlayerError {
    /// Roster is at capacity.
    SlotsFull,
    /// Every palette color is in concurrent use.
    ColorsExhausted,
    /// No free entity slot for the player's ship.
    PoolExhausted,
}

impl std::fmt::Display for AddPlayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SlotsFull => write!(f, "no free player slot"),
            Self::ColorsExhausted => write!(f, "no unused palette color"),
            Self::PoolExhausted => write!(f, "no free entity slot for a ship"),
        }
    }
}

/// Everything the simulation owns. Threaded explicitly through every
/// operation; host code owns exactly one of these per session.
#[derive(Debug)]
pub struct GameState {
    pub config: ArenaConfig,
    pub pool: EntityPool,
    pub players: Vec<Player>,
    pub clock: FrameClock,
    /// Frames of welcome banner left to draw.
    pub welcome_cooldown: u32,
    /// Roster slot of the local player, if spawned.
    pub local_player: Option<usize>,
    pub(crate) rng: StdRng,
}

impl GameState {
    pub fn new(config: ArenaConfig, seed: u64) -> Self {
        Self {
            pool: EntityPool::with_capacity(config.max_entities),
            players: vec![Player::default(); config.max_players],
            clock: FrameClock::default(),
            welcome_cooldown: 0,
            local_player: None,
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    pub fn active_player_count(&self) -> usize {
        self.players.iter().filter(|p| p.active).count()
    }

    pub fn has_remote_guests(&self) -> bool {
        self.players.iter().any(|p| p.active && p.guest.is_some())
    }

    pub fn player_by_guest(&self, guest: GuestId) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.active && p.guest == Some(guest))
    }

    pub fn local_player_active(&self) -> bool {
        self.local_player
            .is_some_and(|index| self.players.get(index).is_some_and(|p| p.active))
    }

    pub fn trigger_welcome(&mut self) {
        self.welcome_cooldown = self.config.welcome_cooldown;
    }

    // ------------------------------------------------------------------
    // Player registry
    // ------------------------------------------------------------------

    /// Add a player and their ship atomically. If anything fails the
    /// roster slot stays inactive and nothing else is committed.
    pub fn add_player(&mut self, guest: Option<GuestId>) -> Result<usize, AddPlayerError> {
        let Some(index) = self.players.iter().position(|p| !p.active) else {
            return Err(AddPlayerError::SlotsFull);
        };
        let color = self.draw_unused_color(index)?;
        let now = self.clock.now();
        let Some(ship) = placement::place(
            &mut self.pool,
            EntityKind::Ship,
            color,
            &self.config,
            &mut self.rng,
            now,
        ) else {
            return Err(AddPlayerError::PoolExhausted);
        };

        let player = &mut self.players[index];
        player.clear();
        player.guest = guest;
        player.color = color;
        player.ship = Some(ship);
        player.active = true;
        tracing::info!(slot = index, guest = ?guest, "player added");
        Ok(index)
    }

    /// Draw a palette color no other active player holds.
    fn draw_unused_color(&mut self, for_slot: usize) -> Result<PlayerColor, AddPlayerError> {
        if self.active_player_count() >= PlayerColor::PALETTE.len() {
            return Err(AddPlayerError::ColorsExhausted);
        }
        for _ in 0..COLOR_RETRY_BUDGET {
            let color = PlayerColor::PALETTE[self.rng.random_range(0..PlayerColor::PALETTE.len())];
            let taken = self
                .players
                .iter()
                .enumerate()
                .any(|(i, p)| i != for_slot && p.active && p.color == color);
            if !taken {
                return Ok(color);
            }
        }
        Err(AddPlayerError::ColorsExhausted)
    }

    /// Deactivate a player and release their ship. Score is preserved
    /// until the next reset.
    pub fn remove_player(&mut self, index: usize) {
        let Some(player) = self.players.get_mut(index) else {
            return;
        };
        if !player.active {
            return;
        }
        player.active = false;
        let ship = player.ship.take();
        if let Some(id) = ship {
            self.pool.release(id);
        }
        tracing::info!(slot = index, "player removed");
    }

    /// Resolve the player owning the entity in `slot`. Ships resolve via
    /// the roster back-references; missiles resolve by color against
    /// active players, which stays ambiguous if colors ever collide.
    pub fn owner_of(&self, slot: usize) -> Option<usize> {
        let entity = self.pool.slot(slot);
        match entity.kind {
            EntityKind::Ship => self.players.iter().position(|p| {
                p.ship
                    .is_some_and(|id| id.index() == slot && self.pool.get(id).is_some())
            }),
            EntityKind::Missile => self
                .players
                .iter()
                .position(|p| p.active && p.color == entity.color),
            EntityKind::Asteroid => None,
        }
    }

    pub fn adjust_score(&mut self, index: usize, delta: i32) {
        if let Some(player) = self.players.get_mut(index) {
            player.score += delta;
        }
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// Run one frame in the fixed order: reset check, render + frame
    /// submission, per-entity step, destruction aging, procedural spawn,
    /// input resolution, counter advance.
    pub fn frame(
        &mut self,
        session: &mut dyn RemoteSession,
        renderer: &mut dyn Renderer,
        sink: &mut dyn FrameSink,
        local_input: &dyn InputSource,
    ) {
        self.handle_reset();

        render::render_frame(self, renderer);
        if self.has_remote_guests() {
            sink.submit_frame();
        }

        self.step_entities();
        self.age_destructions();
        self.handle_asteroid_spawn();

        self.drain_session(session);
        self.handle_local_input(local_input);
        self.apply_player_actions();

        self.clock.advance();
    }

    /// Wipe and restock the arena on the first frame, or when every
    /// active player holds the reset combo past the cooldown.
    fn handle_reset(&mut self) {
        let mut all_want_reset = self.active_player_count() > 0; // never on an empty roster
        for player in self.players.iter().filter(|p| p.active) {
            all_want_reset = all_want_reset && player.wants_reset();
        }

        let now = self.clock.now();
        if !(now == 0 || (all_want_reset && now > self.config.reset_cooldown)) {
            return;
        }
        tracing::info!("resetting arena");

        // Active players keep their ship slot, flagged destroyed-but-active
        // so the entity step respawns it; everything else goes back to the
        // pool, handles invalidated.
        let kept: Vec<usize> = self
            .players
            .iter()
            .filter(|p| p.active)
            .filter_map(|p| p.ship)
            .filter(|id| self.pool.get(*id).is_some())
            .map(|id| id.index())
            .collect();
        for index in 0..self.pool.capacity() {
            if !kept.contains(&index) {
                let id = self.pool.handle(index);
                self.pool.release(id);
            }
        }
        for player in &self.players {
            if player.active
                && let Some(id) = player.ship
                && let Some(ship) = self.pool.get_mut(id)
            {
                ship.destroyed = 1;
                ship.active = true;
            }
        }

        for _ in 0..self.config.start_asteroids {
            placement::place(
                &mut self.pool,
                EntityKind::Asteroid,
                PlayerColor::WHITE,
                &self.config,
                &mut self.rng,
                now,
            );
        }

        for player in &mut self.players {
            player.score = 0;
        }

        self.clock.reset_to(1);
        self.trigger_welcome();
    }

    /// One pass over all entity slots: resolve the first collision,
    /// advance, wrap or cull at the edges, respawn destroyed ships.
    fn step_entities(&mut self) {
        let now = self.clock.now();
        for index in 0..self.pool.capacity() {
            if !self.pool.slot(index).active {
                continue;
            }

            if let Some(collider) = collision::first_collider(&self.pool, index, now) {
                let other = collider.index();
                self.destroy_entity(index, other);
                self.destroy_entity(other, index);
            }

            let (width, height, buffer) = (
                self.config.arena_width,
                self.config.arena_height,
                self.config.edge_buffer,
            );
            let entity = self.pool.slot_mut(index);
            entity.advance();
            match entity.kind {
                EntityKind::Missile => {
                    // Projectiles do not wrap; they die at the edge.
                    if entity.outside_arena(width, height) && entity.mark_destroyed() {
                        tracing::debug!(slot = index, "missile left the arena");
                    }
                },
                EntityKind::Asteroid | EntityKind::Ship => {
                    entity.wrap_at_edges(width, height, buffer);
                },
            }

            let entity = self.pool.slot(index);
            if entity.active && entity.kind == EntityKind::Ship && entity.is_destroyed() {
                let color = entity.color;
                let id = self.pool.handle(index);
                placement::place_into(
                    &mut self.pool,
                    id,
                    EntityKind::Ship,
                    color,
                    &self.config,
                    &mut self.rng,
                    now,
                );
                tracing::debug!(slot = index, "ship respawned");
            }
        }
    }

    /// Put the target into the destroyed state and settle the score with
    /// its collider. Only the transition scores; re-destroying is a no-op.
    fn destroy_entity(&mut self, target: usize, collider: usize) {
        let owner = self.owner_of(target);
        let target_kind = self.pool.slot(target).kind;
        if !self.pool.slot_mut(target).mark_destroyed() {
            return;
        }
        tracing::debug!(slot = target, kind = ?target_kind, "destroyed");

        let Some(owner) = owner else {
            return;
        };
        match target_kind {
            EntityKind::Ship => self.adjust_score(owner, -1),
            EntityKind::Missile => {
                if self.pool.slot(collider).kind == EntityKind::Ship {
                    let victim = self.owner_of(collider);
                    if victim != Some(owner) {
                        self.adjust_score(owner, 1);
                    }
                }
            },
            EntityKind::Asteroid => {},
        }
    }

    /// Destroyed entities linger for a kind-specific number of frames,
    /// then their slot is released.
    fn age_destructions(&mut self) {
        for index in 0..self.pool.capacity() {
            let entity = self.pool.slot(index);
            if !(entity.active && entity.is_destroyed()) {
                continue;
            }
            if entity.destroyed > entity.kind.destruction_threshold() {
                let id = self.pool.handle(index);
                self.pool.release(id);
            } else {
                self.pool.slot_mut(index).destroyed += 1;
            }
        }
    }

    /// Probability for one asteroid spawn this frame: the baseline leaned
    /// toward the population midpoint.
    pub fn spawn_probability(count: usize, midpoint: f32, base: f32, driver: f32) -> f32 {
        base * (1.0 + driver * (midpoint - count as f32) / midpoint)
    }

    fn handle_asteroid_spawn(&mut self) {
        let count = self.pool.count_active(EntityKind::Asteroid);
        if count >= self.config.max_asteroids {
            return;
        }
        let probability = Self::spawn_probability(
            count,
            self.config.spawn_midpoint(),
            self.config.base_spawn_probability(),
            self.config.spawn_driver,
        );
        if self.rng.random::<f32>() < probability {
            tracing::debug!(count, "spawning asteroid");
            let now = self.clock.now();
            placement::place(
                &mut self.pool,
                EntityKind::Asteroid,
                PlayerColor::WHITE,
                &self.config,
                &mut self.rng,
                now,
            );
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Drain every pending session event before any input is applied, so
    /// a disconnect cannot interleave with input mutation mid-frame.
    fn drain_session(&mut self, session: &mut dyn RemoteSession) {
        while let Some(event) = session.poll_event() {
            match event {
                SessionEvent::Connected(guest) => match self.add_player(Some(guest)) {
                    Ok(index) => {
                        tracing::info!(guest, slot = index, "guest connected");
                        self.trigger_welcome();
                    },
                    Err(e) => tracing::info!(guest, error = %e, "failed to add guest"),
                },
                SessionEvent::Disconnected(guest) => {
                    if let Some(index) = self.player_by_guest(guest) {
                        self.remove_player(index);
                        tracing::info!(guest, "guest disconnected");
                    } else {
                        tracing::info!(guest, "disconnect for unknown guest");
                    }
                },
                SessionEvent::Input { guest, payload } => {
                    self.apply_guest_input(guest, &payload);
                },
            }
        }
    }

    /// Mirror one guest input message into that player's button states.
    pub fn apply_guest_input(&mut self, guest: GuestId, payload: &[u8]) {
        let Some(input) = GuestInput::decode(payload) else {
            return;
        };
        let Some(index) = self.player_by_guest(guest) else {
            tracing::debug!(guest, "input for unknown guest");
            return;
        };
        let player = &mut self.players[index];
        match input {
            GuestInput::Key { code, pressed } => match code {
                KeyCode::W => player.keys.w = pressed,
                KeyCode::Up => player.keys.up = pressed,
                KeyCode::S => player.keys.s = pressed,
                KeyCode::Down => player.keys.down = pressed,
                KeyCode::A => player.keys.a = pressed,
                KeyCode::Left => player.keys.left = pressed,
                KeyCode::D => player.keys.d = pressed,
                KeyCode::Right => player.keys.right = pressed,
                KeyCode::Space => player.keys.space = pressed,
                KeyCode::Q => player.keys.q = pressed,
                // Local-only toggles mean nothing from a guest.
                KeyCode::O | KeyCode::U => {},
            },
            GuestInput::Pad { button, pressed } => match button {
                PadButton::DpadUp => player.pad.dpad_up = pressed,
                PadButton::DpadDown => player.pad.dpad_down = pressed,
                PadButton::DpadLeft => player.pad.dpad_left = pressed,
                PadButton::DpadRight => player.pad.dpad_right = pressed,
                PadButton::A => player.pad.a = pressed,
                PadButton::B => player.pad.b = pressed,
                PadButton::X => player.pad.x = pressed,
                PadButton::LeftTrigger => player.pad.left_trigger = pressed,
                PadButton::RightTrigger => player.pad.right_trigger = pressed,
            },
        }
    }

    /// Poll the local controller: spawn/despawn toggles first, then the
    /// local player's key states.
    fn handle_local_input(&mut self, input: &dyn InputSource) {
        if input.is_down(KeyCode::O) && !self.local_player_active() {
            match self.add_player(None) {
                Ok(index) => {
                    tracing::info!(slot = index, "local player spawned");
                    self.local_player = Some(index);
                },
                Err(e) => tracing::info!(error = %e, "failed to spawn local player"),
            }
        }
        if input.is_down(KeyCode::U) && self.local_player_active() {
            if let Some(index) = self.local_player.take() {
                self.remove_player(index);
                tracing::info!(slot = index, "local player despawned");
            }
        }

        let Some(index) = self.local_player else {
            return;
        };
        let keys = &mut self.players[index].keys;
        keys.w = input.is_down(KeyCode::W);
        keys.up = input.is_down(KeyCode::Up);
        keys.s = input.is_down(KeyCode::S);
        keys.down = input.is_down(KeyCode::Down);
        keys.a = input.is_down(KeyCode::A);
        keys.left = input.is_down(KeyCode::Left);
        keys.d = input.is_down(KeyCode::D);
        keys.right = input.is_down(KeyCode::Right);
        keys.space = input.is_down(KeyCode::Space);
        keys.q = input.is_down(KeyCode::Q);
    }

    /// Collapse each active player's held buttons into one action and
    /// apply it to their ship.
    fn apply_player_actions(&mut self) {
        for index in 0..self.players.len() {
            if !self.players[index].active {
                continue;
            }
            let action = self.players[index].resolve_action();
            self.apply_action(index, action);
        }
    }

    fn apply_action(&mut self, index: usize, action: ShipAction) {
        let Some(ship_id) = self.players[index].ship else {
            tracing::debug!(slot = index, "player has no ship");
            return;
        };
        match action {
            ShipAction::None => {},
            ShipAction::TurnLeft => {
                if let Some(ship) = self.pool.get_mut(ship_id) {
                    ship.turn(-self.config.ship_turn_step);
                }
            },
            ShipAction::TurnRight => {
                if let Some(ship) = self.pool.get_mut(ship_id) {
                    ship.turn(self.config.ship_turn_step);
                }
            },
            ShipAction::SpeedUp => {
                if let Some(ship) = self.pool.get_mut(ship_id) {
                    ship.throttle(self.config.ship_speed_step);
                }
            },
            ShipAction::SpeedDown => {
                if let Some(ship) = self.pool.get_mut(ship_id) {
                    ship.throttle(-self.config.ship_speed_step);
                }
            },
            ShipAction::Shoot => self.fire_missile(index, ship_id),
        }
    }

    /// Fire unless the ship's last-shot stamp is still inside the missile
    /// cooldown window. The stamp updates even if the pool had no slot for
    /// the missile.
    fn fire_missile(&mut self, index: usize, ship_id: EntityId) {
        let now = self.clock.now();
        let Some(ship) = self.pool.get(ship_id) else {
            return;
        };
        if self.clock.in_cooldown(ship.stamp, self.config.missile_cooldown) {
            tracing::debug!(slot = index, "shot suppressed by cooldown");
            return;
        }
        let color = self.players[index].color;
        if placement::spawn_missile(&mut self.pool, ship_id, color, &self.config, now).is_none() {
            tracing::debug!(slot = index, "no free slot for a missile");
        }
        if let Some(ship) = self.pool.get_mut(ship_id) {
            ship.stamp = now;
        }
    }
}
