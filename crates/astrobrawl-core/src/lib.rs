//! Simulation core for Astro Brawl: a bounded arena of asteroids, ships,
//! and missiles stepped once per frame, with remote guests joining and
//! leaving mid-session. Rendering, windowing, transport, and argument
//! parsing live host-side behind the traits in [`render`] and [`session`].

pub mod clock;
pub mod collision;
pub mod config;
pub mod entity;
pub mod game;
pub mod geometry;
pub mod placement;
pub mod player;
pub mod render;
pub mod session;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::VecDeque;

    use crate::config::ArenaConfig;
    use crate::game::GameState;
    use crate::geometry::Vec2;
    use crate::player::PlayerColor;
    use crate::render::{IdleInput, InputSource, NullRenderer, NullSink, Renderer};
    use crate::session::{GuestId, IdleSession, KeyCode, RemoteSession, SessionEvent};

    /// A state with default tuning and a fixed seed.
    pub fn make_state(seed: u64) -> GameState {
        GameState::new(ArenaConfig::default(), seed)
    }

    /// Add a guest player directly, panicking if the roster is full.
    pub fn add_guest(state: &mut GameState, guest: GuestId) -> usize {
        state
            .add_player(Some(guest))
            .expect("roster slot for test guest")
    }

    /// Run `n` frames against idle collaborators.
    pub fn run_frames(state: &mut GameState, n: usize) {
        let mut session = IdleSession;
        let mut renderer = NullRenderer;
        let mut sink = NullSink::default();
        for _ in 0..n {
            state.frame(&mut session, &mut renderer, &mut sink, &IdleInput);
        }
    }

    /// A session that replays a scripted queue of events.
    #[derive(Debug, Default)]
    pub struct ScriptedSession {
        pub events: VecDeque<SessionEvent>,
    }

    impl ScriptedSession {
        pub fn new(events: impl IntoIterator<Item = SessionEvent>) -> Self {
            Self {
                events: events.into_iter().collect(),
            }
        }

        pub fn push(&mut self, event: SessionEvent) {
            self.events.push_back(event);
        }
    }

    impl RemoteSession for ScriptedSession {
        fn poll_event(&mut self) -> Option<SessionEvent> {
            self.events.pop_front()
        }
    }

    /// An input source holding a fixed set of keys down.
    #[derive(Debug, Default)]
    pub struct HeldKeys {
        pub down: Vec<KeyCode>,
    }

    impl HeldKeys {
        pub fn holding(keys: &[KeyCode]) -> Self {
            Self {
                down: keys.to_vec(),
            }
        }
    }

    impl InputSource for HeldKeys {
        fn is_down(&self, key: KeyCode) -> bool {
            self.down.contains(&key)
        }
    }

    /// A renderer that records what was asked of it.
    #[derive(Debug, Default)]
    pub struct RecordingRenderer {
        pub frames: u32,
        pub texts: Vec<String>,
        pub polygons: Vec<PlayerColor>,
        pub circles: Vec<PlayerColor>,
    }

    impl Renderer for RecordingRenderer {
        fn begin_frame(&mut self) {
            self.frames += 1;
        }

        fn draw_polygon(&mut self, _vertices: &[Vec2], color: PlayerColor) {
            self.polygons.push(color);
        }

        fn draw_circle(&mut self, _center: Vec2, _radius: f32, color: PlayerColor) {
            self.circles.push(color);
        }

        fn draw_text(&mut self, text: &str, _pos: Vec2, _size: f32, _color: PlayerColor) {
            self.texts.push(text.to_string());
        }

        fn end_frame(&mut self) {}
    }
}
