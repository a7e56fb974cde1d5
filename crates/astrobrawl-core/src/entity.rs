use crate::geometry::Vec2;
use crate::player::PlayerColor;

/// The three things that fly around the arena. Closed set: every geometry,
/// collision, and placement rule switches exhaustively on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntityKind {
    #[default]
    Asteroid,
    Ship,
    Missile,
}

impl EntityKind {
    /// Frames an entity lingers in the destroyed state before its slot is
    /// released. Missiles go on the very next aging pass.
    pub fn destruction_threshold(self) -> u32 {
        match self {
            EntityKind::Asteroid => 5,
            EntityKind::Ship => 3,
            EntityKind::Missile => 0,
        }
    }
}

/// One arena object. An inactive entity is fully zeroed; its polygon is a
/// pure function of (kind, position, size, angle).
#[derive(Debug, Clone, Copy, Default)]
pub struct Entity {
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Unit direction of travel.
    pub dir: Vec2,
    pub speed: f32,
    /// Bounding-box width and height.
    pub size: Vec2,
    /// Heading in degrees, kept in [0, 360].
    pub angle: f32,
    /// 0 = intact; counts aging frames once destroyed.
    pub destroyed: u32,
    pub active: bool,
    /// Frame of the last relevant event: last shot for ships, launch frame
    /// for missiles.
    pub stamp: u64,
    pub color: PlayerColor,
}

impl Entity {
    pub fn is_destroyed(&self) -> bool {
        self.destroyed > 0
    }

    /// Enter the destroyed state. Returns true only on the transition, so
    /// callers can apply one-shot effects (scoring) exactly once.
    pub fn mark_destroyed(&mut self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        self.destroyed = 1;
        true
    }

    pub fn midpoint(&self) -> Vec2 {
        self.pos.add(self.size.scale(0.5))
    }

    /// Position after one step of travel; `inverted` gives the previous
    /// position instead (used by the swept missile test).
    pub fn step_position(&self, inverted: bool) -> Vec2 {
        let travel = self.dir.scale(if inverted { -self.speed } else { self.speed });
        self.pos.add(travel)
    }

    pub fn advance(&mut self) {
        self.pos = self.step_position(false);
    }

    /// Collision polygon for this entity's kind:
    /// asteroids are unrotated rectangles, ships are triangles rotated
    /// about the bounding-box midpoint by the current heading, missiles
    /// are a single point.
    pub fn vertices(&self) -> Vec<Vec2> {
        let Vec2 { x, y } = self.pos;
        let (w, h) = (self.size.x, self.size.y);
        match self.kind {
            EntityKind::Asteroid => vec![
                Vec2::new(x, y),
                Vec2::new(x + w, y),
                Vec2::new(x + w, y + h),
                Vec2::new(x, y + h),
            ],
            EntityKind::Ship => {
                let mid = self.midpoint();
                [
                    Vec2::new(x + w / 2.0, y),
                    Vec2::new(x, y + h / 2.0),
                    Vec2::new(x + w, y + h),
                ]
                .iter()
                .map(|p| p.rotate_around(mid, self.angle))
                .collect()
            },
            EntityKind::Missile => vec![self.pos],
        }
    }

    /// Rotate heading and travel direction together by `amount` degrees.
    pub fn turn(&mut self, amount: f32) {
        self.angle += amount;
        if self.angle > 360.0 {
            self.angle -= 360.0;
        }
        if self.angle < 0.0 {
            self.angle += 360.0;
        }
        self.dir = self.dir.rotate(amount);
    }

    /// Adjust speed by `amount`, clamped at a floor of zero.
    pub fn throttle(&mut self, amount: f32) {
        self.speed += amount;
        if self.speed < 0.0 {
            self.speed = 0.0;
        }
    }

    /// Warp across whichever arena edge a vertex has crossed, one axis per
    /// frame; the next frame catches the other axis if needed. `buffer`
    /// keeps the re-entry point slightly inside the bounds.
    pub fn wrap_at_edges(&mut self, width: f32, height: f32, buffer: f32) {
        for point in self.vertices() {
            if point.x < 0.0 {
                self.pos.x = width - self.size.x - buffer;
                return;
            } else if point.x > width {
                self.pos.x = buffer;
                return;
            } else if point.y < 0.0 {
                self.pos.y = height - self.size.y - buffer;
                return;
            } else if point.y > height {
                self.pos.y = buffer;
                return;
            }
        }
    }

    /// Whether any vertex lies outside the arena bounds.
    pub fn outside_arena(&self, width: f32, height: f32) -> bool {
        self.vertices()
            .iter()
            .any(|p| p.x < 0.0 || p.x > width || p.y < 0.0 || p.y > height)
    }
}

/// Generation-tagged handle into the pool. A handle held across a
/// release/reallocate cycle stops resolving instead of aliasing the new
/// occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId {
    index: usize,
    generation: u32,
}

impl EntityId {
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entity: Entity,
}

/// Fixed-capacity entity storage with active-bit recycling.
#[derive(Debug, Clone)]
pub struct EntityPool {
    slots: Vec<Slot>,
}

impl EntityPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![
                Slot {
                    generation: 0,
                    entity: Entity::default(),
                };
                capacity
            ],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Linear scan for the first inactive slot. The slot is fully zeroed
    /// before being handed out; `None` means the pool is exhausted.
    pub fn allocate(&mut self) -> Option<EntityId> {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.entity.active {
                slot.entity = Entity::default();
                return Some(EntityId {
                    index,
                    generation: slot.generation,
                });
            }
        }
        None
    }

    /// Idempotently clear the active bit and destruction counter. An
    /// active slot's generation is bumped so outstanding handles die with
    /// the occupant.
    pub fn release(&mut self, id: EntityId) {
        if let Some(slot) = self.slots.get_mut(id.index)
            && slot.generation == id.generation
        {
            if slot.entity.active {
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.entity.active = false;
            slot.entity.destroyed = 0;
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .map(|slot| &slot.entity)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .map(|slot| &mut slot.entity)
    }

    /// Current-generation handle for a slot index.
    pub fn handle(&self, index: usize) -> EntityId {
        EntityId {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// Direct slot access for the per-frame index sweep.
    pub fn slot(&self, index: usize) -> &Entity {
        &self.slots[index].entity
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut Entity {
        &mut self.slots[index].entity
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Entity)> {
        self.slots.iter().enumerate().map(|(i, s)| (i, &s.entity))
    }

    pub fn count_active(&self, kind: EntityKind) -> usize {
        self.slots
            .iter()
            .filter(|s| s.entity.active && s.entity.kind == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_asteroid() -> Entity {
        Entity {
            kind: EntityKind::Asteroid,
            pos: Vec2::new(100.0, 100.0),
            dir: Vec2::new(1.0, 0.0),
            speed: 2.0,
            size: Vec2::new(35.0, 35.0),
            active: true,
            ..Entity::default()
        }
    }

    #[test]
    fn allocate_hands_out_zeroed_slot() {
        let mut pool = EntityPool::with_capacity(4);
        let id = pool.allocate().unwrap();
        {
            let e = pool.get_mut(id).unwrap();
            *e = live_asteroid();
            e.destroyed = 3;
        }
        pool.release(id);

        let id2 = pool.allocate().unwrap();
        assert_eq!(id2.index(), id.index(), "first free slot is reused");
        let e = pool.get(id2).unwrap();
        assert!(!e.active);
        assert_eq!(e.destroyed, 0);
        assert_eq!(e.speed, 0.0);
        assert_eq!(e.pos, Vec2::ZERO);
    }

    #[test]
    fn allocate_exhausts_at_capacity() {
        let mut pool = EntityPool::with_capacity(2);
        for _ in 0..2 {
            let id = pool.allocate().unwrap();
            pool.get_mut(id).unwrap().active = true;
        }
        assert!(pool.allocate().is_none());
    }

    #[test]
    fn release_clears_destruction_counter() {
        let mut pool = EntityPool::with_capacity(2);
        let id = pool.allocate().unwrap();
        {
            let e = pool.get_mut(id).unwrap();
            *e = live_asteroid();
            e.destroyed = 6;
        }
        pool.release(id);
        // Inactive implies counter == 0.
        let e = pool.slot(id.index());
        assert!(!e.active);
        assert_eq!(e.destroyed, 0);
    }

    #[test]
    fn release_is_idempotent() {
        let mut pool = EntityPool::with_capacity(2);
        let id = pool.allocate().unwrap();
        pool.get_mut(id).unwrap().active = true;
        pool.release(id);
        pool.release(id);
        pool.release(id);
        assert!(!pool.slot(id.index()).active);
    }

    #[test]
    fn stale_handle_stops_resolving() {
        let mut pool = EntityPool::with_capacity(2);
        let id = pool.allocate().unwrap();
        pool.get_mut(id).unwrap().active = true;
        pool.release(id);

        let id2 = pool.allocate().unwrap();
        pool.get_mut(id2).unwrap().active = true;

        assert_eq!(id.index(), id2.index());
        assert!(pool.get(id).is_none(), "stale handle must not alias");
        assert!(pool.get(id2).is_some());
    }

    #[test]
    fn asteroid_vertices_are_unrotated_corners() {
        let mut e = live_asteroid();
        e.angle = 90.0; // must not affect the rectangle
        let verts = e.vertices();
        assert_eq!(verts.len(), 4);
        assert_eq!(verts[0], Vec2::new(100.0, 100.0));
        assert_eq!(verts[2], Vec2::new(135.0, 135.0));
    }

    #[test]
    fn ship_vertices_rotate_about_midpoint() {
        let ship = Entity {
            kind: EntityKind::Ship,
            pos: Vec2::new(0.0, 0.0),
            size: Vec2::new(20.0, 20.0),
            angle: 0.0,
            active: true,
            ..Entity::default()
        };
        let flat = ship.vertices();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[0], Vec2::new(10.0, 0.0));

        let mut turned = ship;
        turned.angle = 180.0;
        let verts = turned.vertices();
        // Nose swings to the opposite side of the midpoint (10, 10).
        assert!((verts[0].x - 10.0).abs() < 1e-4);
        assert!((verts[0].y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn missile_vertices_are_a_single_point() {
        let e = Entity {
            kind: EntityKind::Missile,
            pos: Vec2::new(5.0, 6.0),
            active: true,
            ..Entity::default()
        };
        assert_eq!(e.vertices(), vec![Vec2::new(5.0, 6.0)]);
    }

    #[test]
    fn turn_rotates_direction_with_heading() {
        let mut e = Entity {
            dir: Vec2::new(1.0, 0.0),
            ..Entity::default()
        };
        e.turn(90.0);
        assert_eq!(e.angle, 90.0);
        assert!(e.dir.x.abs() < 1e-6);
        assert!((e.dir.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn throttle_floors_at_zero() {
        let mut e = live_asteroid();
        e.speed = 0.3;
        e.throttle(-0.4);
        assert_eq!(e.speed, 0.0);
        e.throttle(0.4);
        assert!((e.speed - 0.4).abs() < 1e-6);
    }

    #[test]
    fn wrap_warps_one_axis_per_frame() {
        let mut e = live_asteroid();
        e.pos = Vec2::new(-40.0, -40.0);
        e.wrap_at_edges(1600.0, 1066.0, 5.0);
        // x corrected first; y untouched until the next frame.
        assert_eq!(e.pos.x, 1600.0 - 35.0 - 5.0);
        assert_eq!(e.pos.y, -40.0);
        e.wrap_at_edges(1600.0, 1066.0, 5.0);
        assert_eq!(e.pos.y, 1066.0 - 35.0 - 5.0);
    }

    #[test]
    fn wrap_leaves_interior_entities_alone() {
        let mut e = live_asteroid();
        let before = e.pos;
        e.wrap_at_edges(1600.0, 1066.0, 5.0);
        assert_eq!(e.pos, before);
    }

    #[test]
    fn outside_arena_detects_edge_cross() {
        let mut e = Entity {
            kind: EntityKind::Missile,
            pos: Vec2::new(1601.0, 500.0),
            active: true,
            ..Entity::default()
        };
        assert!(e.outside_arena(1600.0, 1066.0));
        e.pos = Vec2::new(800.0, 500.0);
        assert!(!e.outside_arena(1600.0, 1066.0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn speed_never_goes_negative(
                start in 0.0f32..50.0,
                steps in proptest::collection::vec(-5.0f32..5.0, 0..32),
            ) {
                let mut e = Entity { speed: start, ..Entity::default() };
                for s in steps {
                    e.throttle(s);
                    prop_assert!(e.speed >= 0.0);
                }
            }

            #[test]
            fn heading_stays_wrapped(
                start in 0.0f32..360.0,
                turns in proptest::collection::vec(-360.0f32..360.0, 0..32),
            ) {
                let mut e = Entity { angle: start, dir: Vec2::new(1.0, 0.0), ..Entity::default() };
                for t in turns {
                    e.turn(t);
                    prop_assert!(e.angle >= 0.0 && e.angle <= 360.0, "angle {} out of range", e.angle);
                }
            }

            #[test]
            fn direction_stays_unit_length(
                turns in proptest::collection::vec(-180.0f32..180.0, 0..64),
            ) {
                let mut e = Entity { dir: Vec2::new(1.0, 0.0), ..Entity::default() };
                for t in turns {
                    e.turn(t);
                }
                prop_assert!((e.dir.length() - 1.0).abs() < 1e-3);
            }
        }
    }
}
