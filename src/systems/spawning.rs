//! Entity state-machine advancement (dying/respawning/explosions), cleanup
//! of long-dead entities, opportunistic spawning, and initial world
//! population.

use rand::Rng;

use crate::config::{
    ASTEROID_EDGE_MARGIN, ASTEROID_HEALTH, ASTEROID_MOVING_FRACTION, ASTEROID_MOVING_SPEED_MAX,
    ASTEROID_MOVING_SPEED_MIN, ENEMY_SPAWN_RADIUS_MAX, ENEMY_SPAWN_RADIUS_MIN,
    EXPLOSION_DURATION_SECS, FACTORY_EDGE_MARGIN, FACTORY_HEALTH, INITIAL_ASTEROIDS,
    INITIAL_ENEMY_KAMIKAZE, INITIAL_ENEMY_SCOUT, INITIAL_ENEMY_SNIPER, INITIAL_ENEMY_STRAFING,
    INITIAL_FACTORIES_MAX, INITIAL_FACTORIES_MIN, KAMIKAZE_HEALTH, OPPORTUNISTIC_SPAWN_PROB,
    PLAYER_DEAD_CLEANUP_SECS, PLAYER_DEAD_DURATION_SECS, PLAYER_DYING_DURATION_SECS,
    PLAYER_MAX_HEALTH, PLAYER_RESPAWN_DURATION_SECS, SCOUT_HEALTH, SNIPER_HEALTH,
    STRAFING_HEALTH,
};
use crate::effects::OutboundEffect;
use crate::entity::{Entity, EntityId};
use crate::id_gen::IdGen;
use crate::types::{AsteroidSubType, EnemySubType, EntityState, EntityType, GridSquare, Vec2};
use crate::world::entity_store::EntityStore;

pub struct SpawningOutcome {
    pub effects: Vec<OutboundEffect>,
}

/// Advances every entity's local state-timer machine, then runs the
/// cleanup pass and opportunistic spawn roll.
pub fn step(
    entities: &mut EntityStore,
    assigned_zone: GridSquare,
    now: f64,
    ids: &mut IdGen,
    rng: &mut impl Rng,
) -> SpawningOutcome {
    let outcome = advance_and_cleanup(entities, now);

    if rng.gen_bool(OPPORTUNISTIC_SPAWN_PROB) {
        spawn_opportunistic(entities, assigned_zone, ids, rng);
    }

    outcome
}

/// State-timer advancement and cleanup only, without the opportunistic
/// spawn roll. Used by the VictoryPause/GameOver phases, which keep
/// entities' state machines moving but never spawn new content.
pub fn advance_and_cleanup(entities: &mut EntityStore, now: f64) -> SpawningOutcome {
    let mut effects = Vec::new();
    advance_state_machines(entities, now, &mut effects);
    cleanup(entities, now);
    SpawningOutcome { effects }
}

fn advance_state_machines(entities: &mut EntityStore, now: f64, effects: &mut Vec<OutboundEffect>) {
    let mut to_remove = Vec::new();
    let mut health_mirrors = Vec::new();

    for entity in entities.values_mut() {
        match entity.state {
            EntityState::Dying => {
                if now - entity.state_timer >= PLAYER_DYING_DURATION_SECS {
                    entity.state = EntityState::Dead;
                    entity.state_timer = now;
                    if entity.is_player() {
                        health_mirrors.push((entity.id.clone(), entity.health));
                    }
                }
            }
            EntityState::Dead => {
                if entity.is_player() {
                    if now - entity.state_timer >= PLAYER_DEAD_DURATION_SECS {
                        entity.state = EntityState::Respawning;
                        entity.state_timer = now;
                    }
                } else if now - entity.state_timer >= EXPLOSION_DURATION_SECS {
                    to_remove.push(entity.id.clone());
                }
            }
            EntityState::Respawning => {
                if now - entity.state_timer >= PLAYER_RESPAWN_DURATION_SECS {
                    entity.state = EntityState::Active;
                    entity.state_timer = now;
                    entity.health = PLAYER_MAX_HEALTH;
                    entity.respawn_count += 1;
                    health_mirrors.push((entity.id.clone(), entity.health));
                }
            }
            EntityState::Active | EntityState::Alerting => {}
        }
    }

    for (player_id, health) in health_mirrors {
        effects.push(OutboundEffect::MirrorPlayerHealthToGrain { player_id, health });
    }
    for id in to_remove {
        entities.remove(&id);
    }
}

/// Transitions newly-dead (health <= 0, still Active) entities into Dying,
/// then drops entities that have overstayed the dead-cleanup window. Run
/// right after collisions, every tick.
pub fn transition_newly_dead(entities: &mut EntityStore, now: f64) {
    for entity in entities.values_mut() {
        if entity.health <= 0.0 && matches!(entity.state, EntityState::Active | EntityState::Alerting) {
            entity.state = EntityState::Dying;
            entity.state_timer = now;
            entity.velocity = Vec2::ZERO;
        }
    }
}

fn cleanup(entities: &mut EntityStore, now: f64) {
    entities.retain(|e| {
        if e.is_player() && matches!(e.state, EntityState::Dead) {
            return now - e.state_timer < PLAYER_DEAD_CLEANUP_SECS;
        }
        true
    });
}

fn spawn_opportunistic(
    entities: &mut EntityStore,
    zone: GridSquare,
    ids: &mut IdGen,
    rng: &mut impl Rng,
) {
    let enemy_count = entities.ids_of_kind(EntityType::Enemy).len();
    let asteroid_count = entities.ids_of_kind(EntityType::Asteroid).len();

    if enemy_count < INITIAL_ENEMY_KAMIKAZE + INITIAL_ENEMY_SNIPER + INITIAL_ENEMY_STRAFING + INITIAL_ENEMY_SCOUT {
        let sub = [
            EnemySubType::Kamikaze,
            EnemySubType::Sniper,
            EnemySubType::Strafing,
            EnemySubType::Scout,
        ][rng.gen_range(0..4)];
        spawn_enemy(entities, zone, sub, ids, rng);
    } else if asteroid_count < INITIAL_ASTEROIDS {
        spawn_asteroid(entities, zone, ids, rng);
    }
}

fn random_point_in_zone(zone: GridSquare, margin: f64, rng: &mut impl Rng) -> Vec2 {
    let min = zone.min() + Vec2::splat(margin);
    let max = zone.max() - Vec2::splat(margin);
    Vec2::new(rng.gen_range(min.x..max.x), rng.gen_range(min.y..max.y))
}

/// Spawns within `[ENEMY_SPAWN_RADIUS_MIN, ENEMY_SPAWN_RADIUS_MAX]` of a
/// random factory, or the zone centre if none stands.
fn spawn_enemy(
    entities: &mut EntityStore,
    zone: GridSquare,
    sub: EnemySubType,
    ids: &mut IdGen,
    rng: &mut impl Rng,
) {
    let origin = random_factory_position(entities, rng).unwrap_or_else(|| zone.centre());
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    let radius = rng.gen_range(ENEMY_SPAWN_RADIUS_MIN..ENEMY_SPAWN_RADIUS_MAX);
    let position = clamp_to_zone(origin + Vec2::new(angle.cos(), angle.sin()) * radius, zone);

    let health = match sub {
        EnemySubType::Kamikaze => KAMIKAZE_HEALTH,
        EnemySubType::Sniper => SNIPER_HEALTH,
        EnemySubType::Strafing => STRAFING_HEALTH,
        EnemySubType::Scout => SCOUT_HEALTH,
    };
    let id = ids.next("enemy");
    let mut enemy = Entity::new(id, EntityType::Enemy, sub as i32, position);
    enemy.health = health;
    entities.insert(enemy);
}

fn random_factory_position(entities: &EntityStore, rng: &mut impl Rng) -> Option<Vec2> {
    let factories: Vec<Vec2> = entities
        .values()
        .filter(|e| e.kind == EntityType::Factory)
        .map(|e| e.position)
        .collect();
    if factories.is_empty() {
        return None;
    }
    Some(factories[rng.gen_range(0..factories.len())])
}

fn clamp_to_zone(pos: Vec2, zone: GridSquare) -> Vec2 {
    let min = zone.min();
    let max = zone.max();
    Vec2::new(pos.x.clamp(min.x, max.x), pos.y.clamp(min.y, max.y))
}

fn spawn_asteroid(entities: &mut EntityStore, zone: GridSquare, ids: &mut IdGen, rng: &mut impl Rng) {
    let position = random_point_in_zone(zone, ASTEROID_EDGE_MARGIN, rng);
    let moving = rng.gen_bool(ASTEROID_MOVING_FRACTION);
    let id = ids.next("asteroid");
    let mut asteroid = Entity::new(
        id,
        EntityType::Asteroid,
        if moving { AsteroidSubType::Moving } else { AsteroidSubType::Stationary } as i32,
        position,
    );
    asteroid.health = ASTEROID_HEALTH;
    if moving {
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        let speed = rng.gen_range(ASTEROID_MOVING_SPEED_MIN..ASTEROID_MOVING_SPEED_MAX);
        asteroid.velocity = Vec2::new(angle.cos(), angle.sin()) * speed;
    }
    entities.insert(asteroid);
}

fn spawn_factory(entities: &mut EntityStore, zone: GridSquare, ids: &mut IdGen, rng: &mut impl Rng) {
    let position = random_point_in_zone(zone, FACTORY_EDGE_MARGIN, rng);
    let id = ids.next("factory");
    let mut factory = Entity::new(id, EntityType::Factory, 0, position);
    factory.health = FACTORY_HEALTH;
    entities.insert(factory);
}

/// Populates a freshly assigned (or restarted) zone from scratch.
pub fn spawn_initial_world(entities: &mut EntityStore, zone: GridSquare, ids: &mut IdGen, rng: &mut impl Rng) {
    let factory_count = rng.gen_range(INITIAL_FACTORIES_MIN..=INITIAL_FACTORIES_MAX);
    for _ in 0..factory_count {
        spawn_factory(entities, zone, ids, rng);
    }
    for _ in 0..INITIAL_ASTEROIDS {
        spawn_asteroid(entities, zone, ids, rng);
    }
    for _ in 0..INITIAL_ENEMY_KAMIKAZE {
        spawn_enemy(entities, zone, EnemySubType::Kamikaze, ids, rng);
    }
    for _ in 0..INITIAL_ENEMY_SNIPER {
        spawn_enemy(entities, zone, EnemySubType::Sniper, ids, rng);
    }
    for _ in 0..INITIAL_ENEMY_STRAFING {
        spawn_enemy(entities, zone, EnemySubType::Strafing, ids, rng);
    }
    for _ in 0..INITIAL_ENEMY_SCOUT {
        spawn_enemy(entities, zone, EnemySubType::Scout, ids, rng);
    }
}

/// Adds a player entity on join or respawn-from-scratch.
pub fn add_player(
    entities: &mut EntityStore,
    player_id: EntityId,
    player_name: String,
    position: Vec2,
    team: i32,
) {
    let mut player = Entity::new(player_id, EntityType::Player, 0, position);
    player.player_name = Some(player_name);
    player.team = team;
    player.health = PLAYER_MAX_HEALTH;
    entities.insert(player);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn dying_player_progresses_through_dead_then_respawning() {
        let mut entities = EntityStore::new();
        let mut player = Entity::new("p1".into(), EntityType::Player, 0, Vec2::ZERO);
        player.state = EntityState::Dying;
        player.state_timer = 0.0;
        entities.insert(player);

        advance_state_machines(&mut entities, 0.6, &mut Vec::new());
        assert!(matches!(entities.get("p1").unwrap().state, EntityState::Dead));

        advance_state_machines(&mut entities, 6.0, &mut Vec::new());
        assert!(matches!(entities.get("p1").unwrap().state, EntityState::Respawning));

        advance_state_machines(&mut entities, 7.0, &mut Vec::new());
        let p = entities.get("p1").unwrap();
        assert!(matches!(p.state, EntityState::Active));
        assert_eq!(p.health, PLAYER_MAX_HEALTH);
        assert_eq!(p.respawn_count, 1);
    }

    #[test]
    fn dead_non_player_is_removed_after_explosion_duration() {
        let mut entities = EntityStore::new();
        let mut enemy = Entity::new("e1".into(), EntityType::Enemy, 1, Vec2::ZERO);
        enemy.state = EntityState::Dead;
        enemy.state_timer = 0.0;
        entities.insert(enemy);

        advance_state_machines(&mut entities, 0.6, &mut Vec::new());
        assert!(!entities.contains("e1"));
    }

    #[test]
    fn transition_newly_dead_sets_dying_and_zeros_velocity() {
        let mut entities = EntityStore::new();
        let mut enemy = Entity::new("e1".into(), EntityType::Enemy, 1, Vec2::ZERO);
        enemy.health = -5.0;
        enemy.velocity = Vec2::new(10.0, 10.0);
        entities.insert(enemy);

        transition_newly_dead(&mut entities, 3.0);

        let e = entities.get("e1").unwrap();
        assert!(matches!(e.state, EntityState::Dying));
        assert_eq!(e.velocity, Vec2::ZERO);
    }

    #[test]
    fn spawn_initial_world_respects_configured_counts() {
        let mut entities = EntityStore::new();
        let mut ids = IdGen::new(GridSquare::new(0, 0));
        let mut rng = StepRng::new(7, 13);

        spawn_initial_world(&mut entities, GridSquare::new(0, 0), &mut ids, &mut rng);

        assert_eq!(entities.ids_of_kind(EntityType::Asteroid).len(), INITIAL_ASTEROIDS);
        assert_eq!(
            entities.ids_of_kind(EntityType::Enemy).len(),
            INITIAL_ENEMY_KAMIKAZE + INITIAL_ENEMY_SNIPER + INITIAL_ENEMY_STRAFING + INITIAL_ENEMY_SCOUT
        );
        assert!(!entities.ids_of_kind(EntityType::Factory).is_empty());
    }

    #[test]
    fn add_player_inserts_an_active_full_health_entity() {
        let mut entities = EntityStore::new();
        add_player(&mut entities, "p1".into(), "Nova".into(), Vec2::new(10.0, 10.0), 1);
        let p = entities.get("p1").unwrap();
        assert!(matches!(p.state, EntityState::Active));
        assert_eq!(p.health, PLAYER_MAX_HEALTH);
        assert_eq!(p.player_name.as_deref(), Some("Nova"));
    }
}
