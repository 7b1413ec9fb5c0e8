//! Per-tick movement: players, bullets, and non-player entities confined
//! to their owning zone.

use crate::config::{
    ENEMY_ZONE_MARGIN, PLAYER_FIRE_COOLDOWN_MS, PLAYER_REJECTED_MOVE_MARGIN, PLAYER_SPEED,
};
use crate::effects::OutboundEffect;
use crate::entity::EntityId;
use crate::types::{AsteroidSubType, BulletDespawnReason, EntityType, GridSquare, Vec2};
use crate::world::entity_store::EntityStore;
use crate::world::handoff_blocklist::HandoffBlocklist;
use crate::world::input_buffer::InputBuffer;
use crate::world::zone_directory::ZoneDirectoryCache;
use super::bullets;
use super::collisions::DespawnedBullet;

/// Bullets despawned this step, for the caller to fold into its own
/// despawn bookkeeping: `ZoneExit` never raises `NotifyBulletDestroyed`
/// (the neighbour already knows the trajectory), `Expired` does.
pub struct PhysicsOutcome {
    pub effects: Vec<OutboundEffect>,
    pub despawned_bullets: Vec<DespawnedBullet>,
}

#[allow(clippy::too_many_arguments)]
pub fn step(
    entities: &mut EntityStore,
    inputs: &mut InputBuffer,
    blocklist: &mut HandoffBlocklist,
    zone_directory: &ZoneDirectoryCache,
    assigned_zone: GridSquare,
    now: f64,
    dt: f64,
    ids: &mut crate::id_gen::IdGen,
) -> PhysicsOutcome {
    let mut effects = Vec::new();
    let mut despawned_bullets = Vec::new();

    for entity in entities.values_mut() {
        match entity.kind {
            EntityType::Player => {
                let Some(input) = inputs.get(&entity.id) else {
                    continue;
                };
                let move_dir = if input.move_dir.length_squared() > 0.0 {
                    input.move_dir.normalize()
                } else {
                    Vec2::ZERO
                };
                entity.velocity = move_dir * PLAYER_SPEED;
                let candidate = entity.position + entity.velocity * dt;
                let candidate_zone = GridSquare::of(candidate);

                if candidate_zone == assigned_zone {
                    entity.position = candidate;
                } else if zone_directory.available(candidate_zone) {
                    entity.position = candidate;
                    effects.push(OutboundEffect::InitiatePlayerTransfer {
                        player_id: entity.id.clone(),
                        position: entity.position,
                    });
                } else {
                    entity.velocity = Vec2::ZERO;
                    entity.position = clamp_rejected_move(candidate, assigned_zone);
                }

                if move_dir.length_squared() > 0.0 {
                    entity.rotation = move_dir.y.atan2(move_dir.x) as f32;
                }

                effects.push(OutboundEffect::MirrorPlayerPositionToGrain {
                    player_id: entity.id.clone(),
                    position: entity.position,
                });
                effects.push(OutboundEffect::UpdatePlayerPositionAndVelocity {
                    player_id: entity.id.clone(),
                    position: entity.position,
                    velocity: entity.velocity,
                });
            }
            EntityType::Bullet => {
                entity.position += entity.velocity * dt;
                entity.health -= dt;
            }
            EntityType::Enemy => {
                entity.position += entity.velocity * dt;
                clamp_and_reflect(entity, assigned_zone);
            }
            EntityType::Asteroid => {
                if entity.sub_type == AsteroidSubType::Moving as i32 {
                    entity.position += entity.velocity * dt;
                }
            }
            EntityType::Factory | EntityType::Explosion => {}
        }
    }

    // Shooting spawns bullets outside the main loop above because
    // `spawn_bullet` needs `&mut EntityStore` while we're iterating it.
    let shooters: Vec<(EntityId, Vec2, Vec2, i32)> = entities
        .values()
        .filter(|e| e.is_player())
        .filter_map(|e| {
            let input = inputs.get(&e.id)?;
            if !input.is_shooting || GridSquare::of(e.position) != assigned_zone {
                return None;
            }
            let cooldown = PLAYER_FIRE_COOLDOWN_MS as f64 / 1000.0;
            if now - input.last_shot < cooldown {
                return None;
            }
            let shoot_dir = input
                .shoot_dir
                .unwrap_or(if input.move_dir.length_squared() > 0.0 {
                    input.move_dir.normalize()
                } else {
                    Vec2::new(1.0, 0.0)
                });
            Some((e.id.clone(), e.position, shoot_dir, e.team))
        })
        .collect();

    for (shooter_id, pos, dir, team) in shooters {
        let (_id, spawn_effects) = bullets::spawn_bullet(
            entities, ids, assigned_zone, now, pos, dir, false, Some(shooter_id.clone()), team,
        );
        effects.extend(spawn_effects);
        if let Some(input) = inputs.get_mut(&shooter_id) {
            input.last_shot = now;
        }
    }

    // Bullet lifespan / zone exit, evaluated after movement.
    let expired: Vec<EntityId> = entities
        .values()
        .filter(|e| e.is_bullet() && e.health <= 0.0)
        .map(|e| e.id.clone())
        .collect();
    for id in expired {
        entities.remove(&id);
        despawned_bullets.push(DespawnedBullet {
            id,
            reason: BulletDespawnReason::Expired,
        });
    }

    let exiting: Vec<EntityId> = entities
        .values()
        .filter(|e| e.is_bullet())
        .filter(|e| GridSquare::of(e.position) != assigned_zone)
        .map(|e| e.id.clone())
        .collect();
    for id in exiting {
        entities.remove(&id);
        blocklist.insert(id.clone(), now);
        despawned_bullets.push(DespawnedBullet {
            id,
            reason: BulletDespawnReason::ZoneExit,
        });
    }

    PhysicsOutcome {
        effects,
        despawned_bullets,
    }
}

/// Rejects a move into a zone with no owning server: the attempted
/// position is clamped back to just inside the assigned zone's bounds
/// instead of letting the entity sit in a zone nobody owns.
fn clamp_rejected_move(candidate: Vec2, zone: GridSquare) -> Vec2 {
    let min = zone.min();
    let max = zone.max() - Vec2::splat(PLAYER_REJECTED_MOVE_MARGIN);
    Vec2::new(candidate.x.clamp(min.x, max.x), candidate.y.clamp(min.y, max.y))
}

/// Enemies never leave their zone: velocity reflects off whichever axis
/// would otherwise carry them past the `ENEMY_ZONE_MARGIN` boundary.
fn clamp_and_reflect(entity: &mut crate::entity::Entity, zone: GridSquare) {
    let min = zone.min() + Vec2::splat(ENEMY_ZONE_MARGIN);
    let max = zone.max() - Vec2::splat(ENEMY_ZONE_MARGIN);

    if entity.position.x < min.x {
        entity.position.x = min.x;
        entity.velocity.x = entity.velocity.x.abs();
    } else if entity.position.x > max.x {
        entity.position.x = max.x;
        entity.velocity.x = -entity.velocity.x.abs();
    }

    if entity.position.y < min.y {
        entity.position.y = min.y;
        entity.velocity.y = entity.velocity.y.abs();
    } else if entity.position.y > max.y {
        entity.position.y = max.y;
        entity.velocity.y = -entity.velocity.y.abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::id_gen::IdGen;

    fn new_world() -> (EntityStore, InputBuffer, HandoffBlocklist, IdGen) {
        (
            EntityStore::new(),
            InputBuffer::new(),
            HandoffBlocklist::new(),
            IdGen::new(GridSquare::new(0, 0)),
        )
    }

    #[test]
    fn player_moves_according_to_input_at_configured_speed() {
        let (mut entities, mut inputs, mut blocklist, mut ids) = new_world();
        entities.insert(Entity::new("p1".into(), EntityType::Player, 0, Vec2::new(100.0, 100.0)));
        inputs.set("p1", Some(Vec2::new(1.0, 0.0)), None, false, 0.0);
        let directory = ZoneDirectoryCache::new();

        step(&mut entities, &mut inputs, &mut blocklist, &directory, GridSquare::new(0, 0), 0.0, 1.0, &mut ids);

        let p = entities.get("p1").unwrap();
        assert!((p.position.x - (100.0 + PLAYER_SPEED)).abs() < 1e-9);
    }

    #[test]
    fn player_crossing_into_available_zone_is_moved_and_transfer_requested() {
        let (mut entities, mut inputs, mut blocklist, mut ids) = new_world();
        entities.insert(Entity::new("p1".into(), EntityType::Player, 0, Vec2::new(495.0, 250.0)));
        inputs.set("p1", Some(Vec2::new(1.0, 0.0)), None, false, 0.0);
        let mut directory = ZoneDirectoryCache::new();
        directory.insert(GridSquare::new(0, 0));
        directory.insert(GridSquare::new(1, 0));

        let outcome = step(&mut entities, &mut inputs, &mut blocklist, &directory, GridSquare::new(0, 0), 0.0, 1.0, &mut ids);

        let p = entities.get("p1").unwrap();
        assert!(p.position.x > 500.0);
        assert!(outcome
            .effects
            .iter()
            .any(|e| matches!(e, OutboundEffect::InitiatePlayerTransfer { .. })));
    }

    #[test]
    fn player_crossing_into_unavailable_zone_is_rejected_and_clamped() {
        let (mut entities, mut inputs, mut blocklist, mut ids) = new_world();
        entities.insert(Entity::new("p1".into(), EntityType::Player, 0, Vec2::new(495.0, 250.0)));
        inputs.set("p1", Some(Vec2::new(1.0, 0.0)), None, false, 0.0);
        let mut directory = ZoneDirectoryCache::new();
        directory.insert(GridSquare::new(0, 0));

        let outcome = step(&mut entities, &mut inputs, &mut blocklist, &directory, GridSquare::new(0, 0), 0.0, 1.0, &mut ids);

        let p = entities.get("p1").unwrap();
        assert!((p.position.x - 499.9).abs() < 1e-9);
        assert_eq!(p.position.y, 250.0);
        assert_eq!(p.velocity, Vec2::ZERO);
        assert!(!outcome
            .effects
            .iter()
            .any(|e| matches!(e, OutboundEffect::InitiatePlayerTransfer { .. })));
    }

    #[test]
    fn shooting_spawns_a_bullet_respecting_cooldown() {
        let (mut entities, mut inputs, mut blocklist, mut ids) = new_world();
        entities.insert(Entity::new("p1".into(), EntityType::Player, 0, Vec2::new(100.0, 100.0)));
        inputs.set("p1", Some(Vec2::ZERO), Some(Vec2::new(1.0, 0.0)), true, 0.0);
        let directory = ZoneDirectoryCache::new();

        step(&mut entities, &mut inputs, &mut blocklist, &directory, GridSquare::new(0, 0), 0.0, 0.016, &mut ids);
        let bullets_after_first = entities.ids_of_kind(EntityType::Bullet).len();
        assert_eq!(bullets_after_first, 1);

        step(&mut entities, &mut inputs, &mut blocklist, &directory, GridSquare::new(0, 0), 0.05, 0.016, &mut ids);
        assert_eq!(entities.ids_of_kind(EntityType::Bullet).len(), 1);
    }

    #[test]
    fn enemy_reflects_off_zone_boundary_instead_of_crossing() {
        let (mut entities, mut inputs, mut blocklist, mut ids) = new_world();
        let mut enemy = Entity::new("e1".into(), EntityType::Enemy, 1, Vec2::new(498.0, 250.0));
        enemy.velocity = Vec2::new(40.0, 0.0);
        entities.insert(enemy);
        let directory = ZoneDirectoryCache::new();

        step(&mut entities, &mut inputs, &mut blocklist, &directory, GridSquare::new(0, 0), 0.0, 1.0, &mut ids);

        let e = entities.get("e1").unwrap();
        assert!(e.position.x <= 500.0 - ENEMY_ZONE_MARGIN + 1e-9);
        assert!(e.velocity.x < 0.0);
    }

    #[test]
    fn bullet_exiting_zone_is_blocklisted_and_removed_without_notify() {
        let (mut entities, mut inputs, mut blocklist, mut ids) = new_world();
        let mut bullet = Entity::new("b1".into(), EntityType::Bullet, 0, Vec2::new(495.0, 250.0));
        bullet.velocity = Vec2::new(500.0, 0.0);
        bullet.health = 3.0;
        entities.insert(bullet);
        let directory = ZoneDirectoryCache::new();

        let outcome = step(&mut entities, &mut inputs, &mut blocklist, &directory, GridSquare::new(0, 0), 0.0, 0.02, &mut ids);

        assert!(!entities.contains("b1"));
        assert!(blocklist.contains("b1"));
        assert_eq!(outcome.despawned_bullets.len(), 1);
        assert_eq!(outcome.despawned_bullets[0].reason, BulletDespawnReason::ZoneExit);
    }

    #[test]
    fn bullet_expiring_raises_a_despawn_with_expired_reason() {
        let (mut entities, mut inputs, mut blocklist, mut ids) = new_world();
        let mut bullet = Entity::new("b1".into(), EntityType::Bullet, 0, Vec2::new(250.0, 250.0));
        bullet.health = 0.01;
        entities.insert(bullet);
        let directory = ZoneDirectoryCache::new();

        let outcome = step(&mut entities, &mut inputs, &mut blocklist, &directory, GridSquare::new(0, 0), 0.0, 0.02, &mut ids);

        assert!(!entities.contains("b1"));
        assert!(!blocklist.contains("b1"));
        assert_eq!(outcome.despawned_bullets.len(), 1);
        assert_eq!(outcome.despawned_bullets[0].reason, BulletDespawnReason::Expired);
    }
}
