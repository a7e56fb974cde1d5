//! Host-provided drawing capabilities and the per-frame drawing pass.
//! The core decides what to draw; how pixels appear is the host's problem.

use crate::entity::EntityKind;
use crate::game::GameState;
use crate::geometry::Vec2;
use crate::player::PlayerColor;
use crate::session::KeyCode;

pub const WELCOME_TEXT: &str = "Welcome to Astro Brawl! Move: WASD/Arrows/Space | DPAD/A/B/X. \
     Reset Game: Q | L+R Trigger. (Un)Spawn Local Player: O+U";

/// Drawing primitives, bracketed once per frame.
pub trait Renderer {
    fn begin_frame(&mut self);
    fn draw_polygon(&mut self, vertices: &[Vec2], color: PlayerColor);
    fn draw_circle(&mut self, center: Vec2, radius: f32, color: PlayerColor);
    fn draw_text(&mut self, text: &str, pos: Vec2, size: f32, color: PlayerColor);
    fn end_frame(&mut self);
}

/// Sink for finished frames bound for remote guests. Invoked once per
/// frame, and only while at least one remote guest is connected.
pub trait FrameSink {
    fn submit_frame(&mut self);
}

/// Polled local controller state.
pub trait InputSource {
    fn is_down(&self, key: KeyCode) -> bool;
}

/// Draw the whole frame: banner, scoreboard, then every active entity.
pub fn render_frame(state: &mut GameState, renderer: &mut dyn Renderer) {
    renderer.begin_frame();
    draw_welcome(state, renderer);
    draw_scoreboard(state, renderer);
    draw_entities(state, renderer);
    renderer.end_frame();
}

/// The welcome banner counts itself down by being drawn.
fn draw_welcome(state: &mut GameState, renderer: &mut dyn Renderer) {
    if state.welcome_cooldown > 0 {
        renderer.draw_text(WELCOME_TEXT, Vec2::ZERO, state.config.font_size, PlayerColor::WHITE);
        state.welcome_cooldown -= 1;
    }
}

/// One score cell per active player, evenly spread across the top edge.
/// Players currently holding the reset combo show a marker instead.
fn draw_scoreboard(state: &GameState, renderer: &mut dyn Renderer) {
    let n_players = state.active_player_count();
    if n_players == 0 {
        return;
    }
    let chunk = state.config.arena_width / n_players as f32;
    for (i, player) in state.players.iter().enumerate() {
        if !player.active {
            continue;
        }
        let text = if player.wants_reset() {
            format!("**wants[{}]reset**", player.score)
        } else {
            player.score.to_string()
        };
        let pos = Vec2::new(i as f32 * chunk + chunk / 2.0, state.config.scoreboard_y_offset);
        renderer.draw_text(&text, pos, state.config.font_size, player.color);
    }
}

fn draw_entities(state: &GameState, renderer: &mut dyn Renderer) {
    for (_, entity) in state.pool.iter() {
        if !entity.active {
            continue;
        }
        let color = if entity.is_destroyed() {
            PlayerColor::RED
        } else {
            entity.color
        };
        match entity.kind {
            EntityKind::Asteroid | EntityKind::Ship => {
                renderer.draw_polygon(&entity.vertices(), color);
            },
            EntityKind::Missile => {
                renderer.draw_circle(entity.pos, entity.size.x, color);
            },
        }
    }
}

/// A renderer that draws nothing. Headless hosts and tests run on this.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn begin_frame(&mut self) {}
    fn draw_polygon(&mut self, _vertices: &[Vec2], _color: PlayerColor) {}
    fn draw_circle(&mut self, _center: Vec2, _radius: f32, _color: PlayerColor) {}
    fn draw_text(&mut self, _text: &str, _pos: Vec2, _size: f32, _color: PlayerColor) {}
    fn end_frame(&mut self) {}
}

/// A sink that only counts submissions.
#[derive(Debug, Default)]
pub struct NullSink {
    pub submitted: u64,
}

impl FrameSink for NullSink {
    fn submit_frame(&mut self) {
        self.submitted += 1;
    }
}

/// An input source with nothing held down.
#[derive(Debug, Default)]
pub struct IdleInput;

impl InputSource for IdleInput {
    fn is_down(&self, _key: KeyCode) -> bool {
        false
    }
}
