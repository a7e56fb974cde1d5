//! Spawn positioning: kind-specific motion setup plus retry-bounded random
//! placement that avoids everything already active in the arena.

use rand::Rng;
use rand::rngs::StdRng;

use crate::collision;
use crate::config::ArenaConfig;
use crate::entity::{Entity, EntityId, EntityKind, EntityPool};
use crate::geometry::Vec2;
use crate::player::PlayerColor;

/// Position redraws before a colliding placement is kept as-is.
pub const PLACEMENT_RETRY_BUDGET: u32 = 100;

/// Ships spawn facing this heading before the random rotation.
const SHIP_BASE_HEADING: f32 = 45.0;

/// Set kind-specific motion on a slot and activate it. The position is
/// left at the origin; `place_into` draws it afterwards.
fn activate(entity: &mut Entity, kind: EntityKind, color: PlayerColor, config: &ArenaConfig, rng: &mut StdRng) {
    *entity = Entity::default();
    entity.kind = kind;
    entity.color = color;
    entity.active = true;

    match kind {
        EntityKind::Asteroid => {
            entity.size = config.asteroid_size;
            entity.speed = config.asteroid_max_speed * rng.random::<f32>();
            entity.dir = Vec2::unit_from_angle(rng.random_range(0.0..360.0));
        },
        EntityKind::Ship => {
            entity.size = config.ship_size;
            entity.angle = rng.random_range(0.0..360.0);
            entity.dir = Vec2::unit_from_angle(SHIP_BASE_HEADING).rotate(entity.angle);
        },
        EntityKind::Missile => {
            // Missiles inherit launcher motion; see spawn_missile.
            entity.size = Vec2::new(config.missile_radius, config.missile_radius);
        },
    }
}

/// Re-initialize an existing slot and draw it a collision-free position,
/// retrying up to the budget. Exceeding the budget keeps the last-tried
/// position anyway: placement is best-effort, not a hard invariant.
pub fn place_into(
    pool: &mut EntityPool,
    id: EntityId,
    kind: EntityKind,
    color: PlayerColor,
    config: &ArenaConfig,
    rng: &mut StdRng,
    now: u64,
) {
    let Some(entity) = pool.get_mut(id) else {
        tracing::debug!(slot = id.index(), "placement into stale handle skipped");
        return;
    };
    activate(entity, kind, color, config, rng);

    for _ in 0..PLACEMENT_RETRY_BUDGET {
        let pos = Vec2::new(
            config.arena_width * rng.random::<f32>(),
            config.arena_height * rng.random::<f32>(),
        );
        if let Some(entity) = pool.get_mut(id) {
            entity.pos = pos;
        }
        if collision::first_collider(pool, id.index(), now).is_none() {
            return;
        }
    }
    tracing::debug!(?kind, "placement retries exhausted, keeping last position");
}

/// Allocate a slot and place a new entity of `kind` into it. `None` means
/// the pool is exhausted and the spawn is skipped.
pub fn place(
    pool: &mut EntityPool,
    kind: EntityKind,
    color: PlayerColor,
    config: &ArenaConfig,
    rng: &mut StdRng,
    now: u64,
) -> Option<EntityId> {
    let id = pool.allocate()?;
    place_into(pool, id, kind, color, config, rng, now);
    Some(id)
}

/// Launch a missile from a ship's nose: the ship midpoint displaced by the
/// ship's diagonal length along the (offset-rotated) launcher heading, so
/// the projectile clears the launcher geometry. Speed stacks on top of the
/// launcher's. The launch frame is stamped for the collision grace window.
pub fn spawn_missile(
    pool: &mut EntityPool,
    ship_id: EntityId,
    owner_color: PlayerColor,
    config: &ArenaConfig,
    now: u64,
) -> Option<EntityId> {
    let ship = pool.get(ship_id)?;
    let mid = ship.midpoint();
    let ship_dir = ship.dir;
    let ship_speed = ship.speed;
    let nose_reach = (config.ship_size.x.powi(2) + config.ship_size.y.powi(2)).sqrt();

    let id = pool.allocate()?;
    let dir = ship_dir.rotate(config.missile_angle_offset);
    let entity = pool.get_mut(id)?;
    *entity = Entity {
        kind: EntityKind::Missile,
        pos: mid.add(dir.scale(nose_reach)),
        dir,
        speed: ship_speed + config.missile_speed,
        size: Vec2::new(config.missile_radius, config.missile_radius),
        angle: 0.0,
        destroyed: 0,
        active: true,
        stamp: now,
        color: owner_color,
    };
    Some(id)
}
