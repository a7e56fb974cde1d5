use crate::clock;
use crate::entity::{Entity, EntityId, EntityKind, EntityPool};
use crate::geometry;

/// Frames after launch during which a missile collides with nothing.
/// Covers the one-frame case where a fresh missile overlaps its own
/// trailing segment or its launcher.
const MISSILE_GRACE_FRAMES: u64 = 1;

/// Whether `a` collides with `b`. False if either is inactive or both are
/// the same entity.
///
/// Every vertex of `a`'s polygon is tested against `b`'s shape. When `b`
/// is a missile the test is swept: besides exact point equality, each edge
/// of `a` is intersected with the segment from `b`'s previous position to
/// its current one, so fast projectiles cannot tunnel through thin
/// geometry. This makes the predicate asymmetric when exactly one side is
/// a missile.
pub fn collides(a: &Entity, b: &Entity) -> bool {
    if !a.active || !b.active {
        return false;
    }
    if std::ptr::eq(a, b) {
        return false;
    }

    let verts = a.vertices();
    let Some(&last) = verts.last() else {
        return false;
    };

    let mut prev = last;
    for &point in &verts {
        match b.kind {
            EntityKind::Asteroid => {
                if geometry::point_in_rect(point, b.pos, b.size.x, b.size.y) {
                    return true;
                }
            },
            EntityKind::Ship => {
                let tri = b.vertices();
                if geometry::point_in_triangle(point, tri[0], tri[1], tri[2]) {
                    return true;
                }
            },
            EntityKind::Missile => {
                if point == b.pos {
                    return true;
                }
                let trail_start = b.step_position(true);
                if geometry::segments_intersect(prev, point, b.pos, trail_start) {
                    return true;
                }
            },
        }
        prev = point;
    }
    false
}

/// Whether the entity is a missile still inside its launch grace window.
pub fn is_fresh_missile(entity: &Entity, now: u64) -> bool {
    entity.kind == EntityKind::Missile
        && clock::in_cooldown(now, entity.stamp, MISSILE_GRACE_FRAMES)
}

/// Scan all other active entities in index order and return the first one
/// colliding with the entity at `index`. Contacts involving a
/// freshly-launched missile are skipped and the scan continues.
pub fn first_collider(pool: &EntityPool, index: usize, now: u64) -> Option<EntityId> {
    let subject = pool.slot(index);
    for (j, other) in pool.iter() {
        if j == index || !other.active {
            continue;
        }
        if collides(subject, other) {
            if is_fresh_missile(subject, now) || is_fresh_missile(other, now) {
                tracing::debug!(slot = j, "skipping fresh missile contact");
                continue;
            }
            return Some(pool.handle(j));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    fn asteroid_at(x: f32, y: f32) -> Entity {
        Entity {
            kind: EntityKind::Asteroid,
            pos: Vec2::new(x, y),
            size: Vec2::new(35.0, 35.0),
            active: true,
            ..Entity::default()
        }
    }

    fn ship_at(x: f32, y: f32) -> Entity {
        Entity {
            kind: EntityKind::Ship,
            pos: Vec2::new(x, y),
            size: Vec2::new(20.0, 20.0),
            active: true,
            ..Entity::default()
        }
    }

    fn missile_at(x: f32, y: f32, dir: Vec2, speed: f32) -> Entity {
        Entity {
            kind: EntityKind::Missile,
            pos: Vec2::new(x, y),
            dir,
            speed,
            size: Vec2::new(1.0, 1.0),
            active: true,
            ..Entity::default()
        }
    }

    #[test]
    fn overlapping_asteroids_collide() {
        let a = asteroid_at(100.0, 100.0);
        let b = asteroid_at(120.0, 120.0);
        assert!(collides(&a, &b));
        assert!(collides(&b, &a));
    }

    #[test]
    fn distant_asteroids_do_not_collide() {
        let a = asteroid_at(100.0, 100.0);
        let b = asteroid_at(400.0, 400.0);
        assert!(!collides(&a, &b));
    }

    #[test]
    fn inactive_entities_never_collide() {
        let a = asteroid_at(100.0, 100.0);
        let mut b = asteroid_at(100.0, 100.0);
        b.active = false;
        assert!(!collides(&a, &b));
        assert!(!collides(&b, &a));
    }

    #[test]
    fn entity_does_not_collide_with_itself() {
        let a = asteroid_at(100.0, 100.0);
        assert!(!collides(&a, &a));
    }

    #[test]
    fn ship_inside_asteroid_collides() {
        let ship = ship_at(110.0, 110.0);
        let rock = asteroid_at(100.0, 100.0);
        assert!(collides(&ship, &rock));
    }

    #[test]
    fn swept_missile_hits_thin_target_between_frames() {
        // The missile has already moved past the asteroid this frame; only
        // the trailing segment from its previous position crosses it.
        let rock = asteroid_at(100.0, 100.0);
        let missile = missile_at(200.0, 117.0, Vec2::new(1.0, 0.0), 150.0);
        assert!(
            collides(&rock, &missile),
            "trail from (50, 117) to (200, 117) must cross the rectangle"
        );
    }

    #[test]
    fn swept_test_is_asymmetric_for_missiles() {
        let rock = asteroid_at(100.0, 100.0);
        let missile = missile_at(200.0, 117.0, Vec2::new(1.0, 0.0), 150.0);
        // Missile as target: swept trail hits. Missile as subject: its
        // single point sits outside the rectangle, so no hit.
        assert!(collides(&rock, &missile));
        assert!(!collides(&missile, &rock));
    }

    #[test]
    fn symmetric_for_non_missile_pairs() {
        let pairs = [
            (asteroid_at(100.0, 100.0), asteroid_at(110.0, 110.0)),
            (asteroid_at(100.0, 100.0), ship_at(105.0, 105.0)),
            (ship_at(100.0, 100.0), ship_at(108.0, 108.0)),
            (asteroid_at(100.0, 100.0), ship_at(500.0, 500.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(collides(&a, &b), collides(&b, &a));
        }
    }

    #[test]
    fn point_equality_counts_as_missile_hit() {
        let a = missile_at(50.0, 50.0, Vec2::new(1.0, 0.0), 1.0);
        let b = missile_at(50.0, 50.0, Vec2::new(0.0, 1.0), 1.0);
        assert!(collides(&a, &b));
    }

    #[test]
    fn first_collider_returns_lowest_index() {
        let mut pool = EntityPool::with_capacity(8);
        for slot in [asteroid_at(100.0, 100.0), asteroid_at(110.0, 110.0), asteroid_at(120.0, 120.0)] {
            let id = pool.allocate().unwrap();
            *pool.get_mut(id).unwrap() = slot;
        }
        let hit = first_collider(&pool, 2, 0).unwrap();
        assert_eq!(hit.index(), 0);
    }

    #[test]
    fn first_collider_skips_fresh_missiles() {
        let mut pool = EntityPool::with_capacity(8);
        let rock = pool.allocate().unwrap();
        *pool.get_mut(rock).unwrap() = asteroid_at(100.0, 100.0);

        let m = pool.allocate().unwrap();
        let mut missile = missile_at(110.0, 110.0, Vec2::new(1.0, 0.0), 5.0);
        missile.stamp = 10;
        *pool.get_mut(m).unwrap() = missile;

        // Within the grace window the contact is ignored...
        assert!(first_collider(&pool, m.index(), 10).is_none());
        assert!(first_collider(&pool, m.index(), 11).is_none());
        // ...and counts again once the window has passed.
        assert!(first_collider(&pool, m.index(), 12).is_some());
    }

    #[test]
    fn grace_applies_when_missile_is_the_target() {
        let mut pool = EntityPool::with_capacity(8);
        let rock = pool.allocate().unwrap();
        *pool.get_mut(rock).unwrap() = asteroid_at(100.0, 100.0);

        // Trail from (90, 117) to (150, 117) crosses the rock's edges.
        let m = pool.allocate().unwrap();
        let mut missile = missile_at(150.0, 117.0, Vec2::new(1.0, 0.0), 60.0);
        missile.stamp = 10;
        *pool.get_mut(m).unwrap() = missile;

        assert!(first_collider(&pool, rock.index(), 10).is_none());
        assert!(first_collider(&pool, rock.index(), 12).is_some());
    }
}
