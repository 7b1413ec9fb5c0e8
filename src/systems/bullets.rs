//! Bullet lifecycle and cross-zone trajectory protocol.

use crate::config::{
    BULLET_LIFESPAN_SECS, BULLET_PENDING_SAMPLE_STEP_SECS, BULLET_SPAWN_OFFSET,
    BULLET_TRAJECTORY_SAMPLES, BULLET_ZONE_MARGIN, ENEMY_BULLET_SPEED, PLAYER_BULLET_SPEED,
};
use crate::effects::OutboundEffect;
use crate::entity::{Entity, EntityId};
use crate::id_gen::IdGen;
use crate::types::{EntityState, EntityType, GridSquare, Vec2};
use crate::world::entity_store::EntityStore;
use crate::world::handoff_blocklist::HandoffBlocklist;
use crate::world::pending_bullets::{PendingBullet, PendingBulletTable};

/// Clamp `pos` to stay strictly inside `zone`, `margin` units from each
/// edge.
fn clamp_into_zone(pos: Vec2, zone: GridSquare, margin: f64) -> Vec2 {
    let min = zone.min();
    let max = zone.max();
    Vec2::new(
        pos.x.clamp(min.x, max.x - margin),
        pos.y.clamp(min.y, max.y - margin),
    )
}

/// Spawns a bullet locally fired by `shooter_id`. Returns the new entity
/// plus the trajectory-broadcast effects for every zone other than
/// `assigned_zone` that its sampled path visits.
#[allow(clippy::too_many_arguments)]
pub fn spawn_bullet(
    entities: &mut EntityStore,
    ids: &mut IdGen,
    assigned_zone: GridSquare,
    now: f64,
    shooter_pos: Vec2,
    direction: Vec2,
    is_enemy_bullet: bool,
    owner_id: Option<EntityId>,
    team: i32,
) -> (EntityId, Vec<OutboundEffect>) {
    let direction = if direction.length_squared() > 0.0 {
        direction.normalize()
    } else {
        Vec2::new(1.0, 0.0)
    };
    let speed = if is_enemy_bullet {
        ENEMY_BULLET_SPEED
    } else {
        PLAYER_BULLET_SPEED
    };
    let velocity = direction * speed;
    let origin = clamp_into_zone(
        shooter_pos + direction * BULLET_SPAWN_OFFSET,
        assigned_zone,
        BULLET_ZONE_MARGIN,
    );

    let id = ids.next("bullet");
    let mut bullet = Entity::new(
        id.clone(),
        EntityType::Bullet,
        if is_enemy_bullet { 1 } else { 0 },
        origin,
    );
    bullet.velocity = velocity;
    bullet.health = BULLET_LIFESPAN_SECS;
    bullet.team = team;
    bullet.owner_id = owner_id.clone();
    bullet.rotation = velocity.y.atan2(velocity.x) as f32;
    entities.insert(bullet);

    let effects = broadcast_trajectory_samples(
        &id,
        if is_enemy_bullet { 1 } else { 0 },
        origin,
        velocity,
        now,
        BULLET_LIFESPAN_SECS,
        owner_id,
        team,
        assigned_zone,
    );

    (id, effects)
}

/// Samples the trajectory at `BULLET_TRAJECTORY_SAMPLES` equally spaced
/// times across `[0, lifespan]`, and emits one broadcast effect per zone
/// visited other than `assigned_zone`.
#[allow(clippy::too_many_arguments)]
fn broadcast_trajectory_samples(
    id: &str,
    sub_type: i32,
    origin: Vec2,
    velocity: Vec2,
    spawn_game_time: f64,
    lifespan: f64,
    owner_id: Option<EntityId>,
    team: i32,
    assigned_zone: GridSquare,
) -> Vec<OutboundEffect> {
    let mut visited = Vec::new();
    for i in 0..BULLET_TRAJECTORY_SAMPLES {
        let t = lifespan * i as f64 / (BULLET_TRAJECTORY_SAMPLES - 1) as f64;
        let zone = GridSquare::of(origin + velocity * t);
        if zone != assigned_zone && !visited.contains(&zone) {
            visited.push(zone);
        }
    }

    visited
        .into_iter()
        .map(|zone| OutboundEffect::BroadcastBulletTrajectory {
            zone,
            id: id.to_string(),
            sub_type,
            origin,
            velocity,
            spawn_game_time,
            lifespan,
            owner_id: owner_id.clone(),
            team,
        })
        .collect()
}

/// Handles an inbound `ReceiveBulletTrajectory`.
#[allow(clippy::too_many_arguments)]
pub fn receive_trajectory(
    entities: &mut EntityStore,
    pending: &mut PendingBulletTable,
    blocklist: &HandoffBlocklist,
    assigned_zone: GridSquare,
    id: EntityId,
    sub_type: i32,
    origin: Vec2,
    velocity: Vec2,
    spawn_game_time: f64,
    lifespan: f64,
    owner_id: Option<EntityId>,
    team: i32,
    game_time: f64,
) {
    if blocklist.contains(&id) {
        return;
    }

    let elapsed = game_time - spawn_game_time;
    if elapsed >= lifespan {
        return;
    }

    let pos_now = origin + velocity * elapsed;
    if GridSquare::of(pos_now) == assigned_zone {
        if !entities.contains(&id) {
            materialize(entities, &id, sub_type, pos_now, velocity, lifespan - elapsed, owner_id, team);
        }
        pending.remove(&id);
        return;
    }

    // Does any future sample land in our zone before expiry?
    let mut t = elapsed;
    let mut will_arrive = false;
    while t < lifespan {
        let sample_pos = origin + velocity * t;
        if GridSquare::of(sample_pos) == assigned_zone {
            will_arrive = true;
            break;
        }
        t += BULLET_PENDING_SAMPLE_STEP_SECS;
    }

    if will_arrive {
        pending.insert(PendingBullet {
            id,
            sub_type,
            origin,
            velocity,
            spawn_game_time,
            lifespan,
            owner_id,
            team,
        });
    }
}

fn materialize(
    entities: &mut EntityStore,
    id: &str,
    sub_type: i32,
    position: Vec2,
    velocity: Vec2,
    remaining_lifespan: f64,
    owner_id: Option<EntityId>,
    team: i32,
) {
    let mut bullet = Entity::new(id.to_string(), EntityType::Bullet, sub_type, position);
    bullet.velocity = velocity;
    bullet.health = remaining_lifespan;
    bullet.team = team;
    bullet.owner_id = owner_id;
    bullet.state = EntityState::Active;
    bullet.rotation = velocity.y.atan2(velocity.x) as f32;
    entities.insert(bullet);
}

/// Activates any pending bullet that is now inside the assigned zone and
/// not already present locally. Run before AI, every tick, after sweeping
/// the blocklist.
pub fn activate_pending(
    entities: &mut EntityStore,
    pending: &mut PendingBulletTable,
    blocklist: &HandoffBlocklist,
    assigned_zone: GridSquare,
    game_time: f64,
) {
    let ready: Vec<String> = pending
        .values()
        .filter(|b| !blocklist.contains(&b.id))
        .filter(|b| !b.is_expired_at(game_time))
        .filter(|b| GridSquare::of(b.position_at(game_time)) == assigned_zone)
        .filter(|b| !entities.contains(&b.id))
        .map(|b| b.id.clone())
        .collect();

    let stale: Vec<String> = pending
        .values()
        .filter(|b| blocklist.contains(&b.id) || b.is_expired_at(game_time))
        .map(|b| b.id.clone())
        .collect();

    for id in ready {
        if let Some(bullet) = pending.remove(&id) {
            let remaining = bullet.lifespan - bullet.elapsed_at(game_time);
            materialize(
                entities,
                &bullet.id,
                bullet.sub_type,
                bullet.position_at(game_time),
                bullet.velocity,
                remaining,
                bullet.owner_id,
                bullet.team,
            );
        }
    }
    for id in stale {
        pending.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityType;

    #[test]
    fn spawn_bullet_uses_player_speed_and_three_second_lifespan() {
        let mut entities = EntityStore::new();
        let mut ids = IdGen::new(GridSquare::new(0, 0));
        let (id, _effects) = spawn_bullet(
            &mut entities,
            &mut ids,
            GridSquare::new(0, 0),
            0.0,
            Vec2::new(100.0, 100.0),
            Vec2::new(1.0, 0.0),
            false,
            Some("player_1".into()),
            1,
        );
        let bullet = entities.get(&id).unwrap();
        assert_eq!(bullet.velocity, Vec2::new(PLAYER_BULLET_SPEED, 0.0));
        assert_eq!(bullet.health, BULLET_LIFESPAN_SECS);
        assert_eq!(bullet.kind, EntityType::Bullet);
    }

    #[test]
    fn bullet_handoff_across_a_boundary_does_not_oscillate() {
        // Spawn bullet at (499,250) with velocity (500,0) in zone (0,0).
        let mut entities = EntityStore::new();
        let mut ids = IdGen::new(GridSquare::new(0, 0));
        let (id, effects) = spawn_bullet(
            &mut entities,
            &mut ids,
            GridSquare::new(0, 0),
            0.0,
            Vec2::new(469.0, 250.0),
            Vec2::new(1.0, 0.0),
            false,
            Some("player_1".into()),
            1,
        );
        // Spawn offset pushes origin to ~499, so the trajectory should visit (1,0).
        assert!(effects.iter().any(|e| matches!(
            e,
            OutboundEffect::BroadcastBulletTrajectory { zone, .. } if *zone == GridSquare::new(1, 0)
        )));

        // Next tick (~0.02s): bullet crosses into zone (1,0); receiving the
        // same trajectory back within 5s must be a no-op once blocklisted.
        let mut blocklist = HandoffBlocklist::new();
        blocklist.insert(id.clone(), 0.02);
        let mut pending = PendingBulletTable::new();
        receive_trajectory(
            &mut entities,
            &mut pending,
            &blocklist,
            GridSquare::new(0, 0),
            id.clone(),
            0,
            Vec2::new(499.0, 250.0),
            Vec2::new(500.0, 0.0),
            0.0,
            3.0,
            Some("player_1".into()),
            1,
            0.5,
        );
        assert!(!pending.contains(&id));
    }

    #[test]
    fn pending_bullet_arriving_early_activates_once_inside_the_zone() {
        let mut entities = EntityStore::new();
        let mut pending = PendingBulletTable::new();
        let blocklist = HandoffBlocklist::new();

        receive_trajectory(
            &mut entities,
            &mut pending,
            &blocklist,
            GridSquare::new(0, 0),
            "bullet_x".into(),
            0,
            Vec2::new(-10.0, 250.0),
            Vec2::new(500.0, 0.0),
            0.0,
            3.0,
            None,
            0,
            0.0,
        );
        // pos_now = (-10,250) is in zone (-1,0), not ours: should be pending.
        assert!(pending.contains("bullet_x"));
        assert!(!entities.contains("bullet_x"));

        // By t=0.05 the bullet is at (15,250), inside zone (0,0).
        activate_pending(&mut entities, &mut pending, &blocklist, GridSquare::new(0, 0), 0.05);
        assert!(entities.contains("bullet_x"));
        assert!(!pending.contains("bullet_x"));
    }

    #[test]
    fn receive_trajectory_twice_is_idempotent() {
        let mut entities = EntityStore::new();
        let mut pending = PendingBulletTable::new();
        let blocklist = HandoffBlocklist::new();

        for _ in 0..2 {
            receive_trajectory(
                &mut entities,
                &mut pending,
                &blocklist,
                GridSquare::new(0, 0),
                "bullet_y".into(),
                0,
                Vec2::new(100.0, 100.0),
                Vec2::new(0.0, 0.0),
                0.0,
                3.0,
                None,
                0,
                0.0,
            );
        }
        assert_eq!(entities.len(), 1);
    }
}
