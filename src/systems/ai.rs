//! Enemy behaviour: per-subtype movement/fire decisions and scout
//! detection, alerting, and alert propagation to neighbouring zones.

use rand::Rng;

use crate::config::{
    ALERTED_APPROACH_SPEED, ALERTED_CLEAR_DISTANCE, ENEMY_ZONE_MARGIN, KAMIKAZE_SPEED,
    SCOUT_ALERTING_MAX_SECS, SCOUT_ALERT_DELAY_SECS, SCOUT_ALERT_RECEIVED_VALIDITY_SECS,
    SCOUT_DETECTION_RANGE, SCOUT_ROAM_MARGIN, SCOUT_ROAM_TURN_PROB, SNIPER_ENGAGE_RANGE,
    SNIPER_FIRE_PROB, SNIPER_SPEED, STRAFING_ENGAGE_RANGE, STRAFING_FIRE_PROB, STRAFING_FLIP_PROB,
    STRAFING_SPEED, STRAFING_STRAFE_SPEED,
};
use crate::effects::OutboundEffect;
use crate::entity::EntityId;
use crate::types::{EnemySubType, EntityState, EntityType, GridSquare, Vec2};
use crate::world::entity_store::EntityStore;
use crate::world::input_buffer::InputBuffer;

use super::bullets;

pub struct AiOutcome {
    pub effects: Vec<OutboundEffect>,
}

/// One AI pass over every live, active enemy. Players are read-only
/// inputs here; only enemies are mutated.
pub fn step(
    entities: &mut EntityStore,
    inputs: &InputBuffer,
    assigned_zone: GridSquare,
    now: f64,
    ids: &mut crate::id_gen::IdGen,
    rng: &mut impl Rng,
) -> AiOutcome {
    let players: Vec<(EntityId, Vec2)> = entities
        .values()
        .filter(|e| e.is_player() && matches!(e.state, EntityState::Active))
        .map(|e| (e.id.clone(), e.position))
        .collect();

    let enemy_ids: Vec<EntityId> = entities.ids_of_kind(EntityType::Enemy);
    let mut effects = Vec::new();
    let mut new_bullet_spawns = Vec::new();

    for id in enemy_ids {
        let Some(enemy) = entities.get(&id) else { continue };
        if !matches!(enemy.state, EntityState::Active) {
            continue;
        }
        let Some(sub) = EnemySubType::from_i32(enemy.sub_type) else { continue };
        let position = enemy.position;
        let is_alerted = enemy.is_alerted && now < enemy.alerted_until;

        let nearest_player = players
            .iter()
            .map(|(pid, pos)| (pid, pos, position.distance(*pos)))
            .min_by(|a, b| a.2.total_cmp(&b.2));

        match sub {
            EnemySubType::Kamikaze => {
                if let Some((_, pos, dist)) = nearest_player {
                    if dist > 1.0 {
                        let dir = (*pos - position).normalize();
                        if let Some(e) = entities.get_mut(&id) {
                            e.velocity = dir * KAMIKAZE_SPEED;
                            e.rotation = dir.y.atan2(dir.x) as f32;
                        }
                    }
                } else if let Some(e) = entities.get_mut(&id) {
                    e.velocity = Vec2::ZERO;
                }
            }
            EnemySubType::Sniper => {
                if let Some((pid, pos, dist)) = nearest_player {
                    if dist <= SNIPER_ENGAGE_RANGE {
                        if let Some(e) = entities.get_mut(&id) {
                            e.velocity = Vec2::ZERO;
                        }
                        if rng.gen_bool(SNIPER_FIRE_PROB) {
                            let dir = (*pos - position).normalize();
                            new_bullet_spawns.push((position, dir, Some(pid.clone())));
                        }
                    } else {
                        let dir = (*pos - position).normalize();
                        if let Some(e) = entities.get_mut(&id) {
                            e.velocity = dir * SNIPER_SPEED;
                            e.rotation = dir.y.atan2(dir.x) as f32;
                        }
                    }
                }
            }
            EnemySubType::Strafing => {
                if let Some((pid, pos, dist)) = nearest_player {
                    let to_player = (*pos - position).normalize();
                    if dist <= STRAFING_ENGAGE_RANGE {
                        let perp = Vec2::new(-to_player.y, to_player.x);
                        if let Some(e) = entities.get_mut(&id) {
                            if rng.gen_bool(STRAFING_FLIP_PROB) {
                                e.strafe_sign = -e.strafe_sign;
                            }
                            e.velocity = perp * STRAFING_STRAFE_SPEED * e.strafe_sign;
                            e.rotation = to_player.y.atan2(to_player.x) as f32;
                        }
                        if rng.gen_bool(STRAFING_FIRE_PROB) {
                            new_bullet_spawns.push((position, to_player, Some(pid.clone())));
                        }
                    } else if let Some(e) = entities.get_mut(&id) {
                        e.velocity = to_player * STRAFING_SPEED;
                        e.rotation = to_player.y.atan2(to_player.x) as f32;
                    }
                }
            }
            EnemySubType::Scout => {
                step_scout(
                    entities,
                    &id,
                    &players,
                    is_alerted,
                    position,
                    assigned_zone,
                    now,
                    rng,
                    &mut effects,
                );
            }
        }
    }

    for (pos, dir, owner) in new_bullet_spawns {
        let (_id, spawn_effects) = bullets::spawn_bullet(
            entities, ids, assigned_zone, now, pos, dir, true, owner, 0,
        );
        effects.extend(spawn_effects);
    }

    AiOutcome { effects }
}

#[allow(clippy::too_many_arguments)]
fn step_scout(
    entities: &mut EntityStore,
    id: &str,
    players: &[(EntityId, Vec2)],
    is_alerted: bool,
    position: Vec2,
    assigned_zone: GridSquare,
    now: f64,
    rng: &mut impl Rng,
    effects: &mut Vec<OutboundEffect>,
) {
    if is_alerted {
        // Approaching enemies don't chase, but scouts themselves move off
        // toward the last sighting then clear their alert once close.
        let Some(enemy) = entities.get_mut(id) else { return };
        let target = enemy.last_known_player_pos;
        let to_target = target - position;
        if to_target.length() > ALERTED_CLEAR_DISTANCE {
            let dir = to_target.normalize();
            enemy.velocity = dir * ALERTED_APPROACH_SPEED;
            enemy.rotation = dir.y.atan2(dir.x) as f32;
        } else {
            enemy.velocity = Vec2::ZERO;
        }
        return;
    }

    let nearest = players
        .iter()
        .map(|(pid, pos)| (pid, pos, position.distance(*pos)))
        .min_by(|a, b| a.2.total_cmp(&b.2));

    if let Some((_, pos, dist)) = nearest {
        if dist <= SCOUT_DETECTION_RANGE {
            let enemy = entities.get_mut(id).unwrap();
            if !enemy.has_spotted {
                enemy.has_spotted = true;
                enemy.state = EntityState::Alerting;
                enemy.state_timer = now;
            } else if now - enemy.state_timer >= SCOUT_ALERT_DELAY_SECS && !enemy.has_alerted {
                enemy.has_alerted = true;
                enemy.is_alerted = true;
                enemy.alerted_until = now + SCOUT_ALERTING_MAX_SECS;
                enemy.last_known_player_pos = *pos;
                enemy.state = EntityState::Active;
                effects.extend(propagate_scout_alert(*pos, assigned_zone));
            }
            enemy.velocity = Vec2::ZERO;
            return;
        }
    }

    // No player in range: reset detection progress and roam.
    let enemy = entities.get_mut(id).unwrap();
    if enemy.has_spotted && !enemy.has_alerted {
        enemy.has_spotted = false;
        enemy.state = EntityState::Active;
    }

    if enemy.roam_direction.length_squared() == 0.0 || rng.gen_bool(SCOUT_ROAM_TURN_PROB) {
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        enemy.roam_direction = Vec2::new(angle.cos(), angle.sin());
    }
    enemy.velocity = enemy.roam_direction * KAMIKAZE_SPEED * 0.5;
    enemy.rotation = enemy.roam_direction.y.atan2(enemy.roam_direction.x) as f32;

    roam_clamp(enemy, assigned_zone);
}

fn roam_clamp(enemy: &mut crate::entity::Entity, zone: GridSquare) {
    let min = zone.min() + Vec2::splat(SCOUT_ROAM_MARGIN);
    let max = zone.max() - Vec2::splat(SCOUT_ROAM_MARGIN);
    if enemy.position.x <= min.x || enemy.position.x >= max.x {
        enemy.roam_direction.x = -enemy.roam_direction.x;
    }
    if enemy.position.y <= min.y || enemy.position.y >= max.y {
        enemy.roam_direction.y = -enemy.roam_direction.y;
    }
}

/// Determines which of the 8 neighbouring zones a scout's alert should be
/// forwarded to. A player spotted near a boundary can be relevant to more
/// than one neighbour; a spotting deep inside the zone propagates nowhere.
fn propagate_scout_alert(player_pos: Vec2, zone: GridSquare) -> Vec<OutboundEffect> {
    resolve_alert_candidates(player_pos, zone)
        .into_iter()
        .map(|target| OutboundEffect::SendScoutAlert {
            zone: target,
            player_zone: zone,
            player_pos,
        })
        .collect()
}

fn resolve_alert_candidates(player_pos: Vec2, zone: GridSquare) -> Vec<GridSquare> {
    let min = zone.min();
    let max = zone.max();
    let margin = ENEMY_ZONE_MARGIN * 4.0;

    let near_left = player_pos.x - min.x < margin;
    let near_right = max.x - player_pos.x < margin;
    let near_top = player_pos.y - min.y < margin;
    let near_bottom = max.y - player_pos.y < margin;

    let mut candidates = Vec::new();
    let dx = if near_left {
        -1
    } else if near_right {
        1
    } else {
        0
    };
    let dy = if near_top {
        -1
    } else if near_bottom {
        1
    } else {
        0
    };

    if dx != 0 {
        candidates.push(GridSquare::new(zone.x + dx, zone.y));
    }
    if dy != 0 {
        candidates.push(GridSquare::new(zone.x, zone.y + dy));
    }
    if dx != 0 && dy != 0 {
        candidates.push(GridSquare::new(zone.x + dx, zone.y + dy));
    }
    candidates
}

/// Handles an alert relayed from a neighbouring zone's scout. If a local
/// scout is within range of the reported position and not already
/// alerted, it starts approaching.
pub fn receive_scout_alert(
    entities: &mut EntityStore,
    player_pos: Vec2,
    now: f64,
) {
    for enemy in entities.values_mut() {
        if enemy.kind != EntityType::Enemy || enemy.sub_type != EnemySubType::Scout as i32 {
            continue;
        }
        if enemy.is_alerted {
            continue;
        }
        enemy.is_alerted = true;
        enemy.has_alerted = true;
        enemy.alerted_until = now + SCOUT_ALERT_RECEIVED_VALIDITY_SECS;
        enemy.last_known_player_pos = player_pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::id_gen::IdGen;
    use rand::rngs::mock::StepRng;

    fn enemy(sub: EnemySubType, pos: Vec2) -> Entity {
        Entity::new("e1".into(), EntityType::Enemy, sub as i32, pos)
    }

    #[test]
    fn kamikaze_accelerates_straight_toward_nearest_player() {
        let mut entities = EntityStore::new();
        entities.insert(enemy(EnemySubType::Kamikaze, Vec2::new(0.0, 0.0)));
        entities.insert(Entity::new("p1".into(), EntityType::Player, 0, Vec2::new(100.0, 0.0)));
        let inputs = InputBuffer::new();
        let mut ids = IdGen::new(GridSquare::new(0, 0));
        let mut rng = StepRng::new(0, 1);

        step(&mut entities, &inputs, GridSquare::new(0, 0), 0.0, &mut ids, &mut rng);

        let e = entities.get("e1").unwrap();
        assert!(e.velocity.x > 0.0);
        assert!((e.velocity.y).abs() < 1e-9);
    }

    #[test]
    fn sniper_holds_position_inside_engage_range() {
        let mut entities = EntityStore::new();
        entities.insert(enemy(EnemySubType::Sniper, Vec2::new(0.0, 0.0)));
        entities.insert(Entity::new("p1".into(), EntityType::Player, 0, Vec2::new(100.0, 0.0)));
        let inputs = InputBuffer::new();
        let mut ids = IdGen::new(GridSquare::new(0, 0));
        let mut rng = StepRng::new(u64::MAX, 1); // never fires, gen_bool(low prob) false

        step(&mut entities, &inputs, GridSquare::new(0, 0), 0.0, &mut ids, &mut rng);

        let e = entities.get("e1").unwrap();
        assert_eq!(e.velocity, Vec2::ZERO);
    }

    #[test]
    fn scout_spots_then_alerts_after_delay() {
        let mut entities = EntityStore::new();
        entities.insert(enemy(EnemySubType::Scout, Vec2::new(0.0, 0.0)));
        entities.insert(Entity::new("p1".into(), EntityType::Player, 0, Vec2::new(100.0, 0.0)));
        let inputs = InputBuffer::new();
        let mut ids = IdGen::new(GridSquare::new(0, 0));
        let mut rng = StepRng::new(0, 1);

        step(&mut entities, &inputs, GridSquare::new(0, 0), 0.0, &mut ids, &mut rng);
        assert!(entities.get("e1").unwrap().has_spotted);
        assert!(!entities.get("e1").unwrap().has_alerted);

        let outcome = step(&mut entities, &inputs, GridSquare::new(0, 0), 5.1, &mut ids, &mut rng);
        let e = entities.get("e1").unwrap();
        assert!(e.has_alerted);
        assert!(e.is_alerted);
        let _ = outcome;
    }

    #[test]
    fn scout_alert_deep_inside_zone_propagates_nowhere() {
        let candidates = resolve_alert_candidates(Vec2::new(250.0, 250.0), GridSquare::new(0, 0));
        assert!(candidates.is_empty());
    }

    #[test]
    fn scout_alert_near_corner_propagates_to_three_neighbours() {
        let candidates = resolve_alert_candidates(Vec2::new(1.0, 1.0), GridSquare::new(0, 0));
        assert_eq!(candidates.len(), 3);
        assert!(candidates.contains(&GridSquare::new(-1, -1)));
        assert!(candidates.contains(&GridSquare::new(-1, 0)));
        assert!(candidates.contains(&GridSquare::new(0, -1)));
    }

    #[test]
    fn receive_scout_alert_arms_local_unalerted_scouts() {
        let mut entities = EntityStore::new();
        entities.insert(enemy(EnemySubType::Scout, Vec2::new(10.0, 10.0)));

        receive_scout_alert(&mut entities, Vec2::new(450.0, 450.0), 100.0);

        let e = entities.get("e1").unwrap();
        assert!(e.is_alerted);
        assert_eq!(e.last_known_player_pos, Vec2::new(450.0, 450.0));
    }
}
