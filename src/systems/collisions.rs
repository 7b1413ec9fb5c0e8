//! Pairwise circular collision detection and damage application.

use crate::config::{
    ASTEROID_COLLISION_DAMAGE_TO_PLAYER, BULLET_DAMAGE, COLLISION_RADIUS,
    ENEMY_COLLISION_DAMAGE_TO_PLAYER, KAMIKAZE_COLLISION_DAMAGE_TO_PLAYER, KILL_CREDIT_ASTEROID_HP,
    KILL_CREDIT_ENEMY_HP, PLAYER_COLLISION_DAMAGE_TO_ASTEROID, PLAYER_COLLISION_DAMAGE_TO_ENEMY,
};
use crate::entity::EntityId;
use crate::types::{BulletDespawnReason, EntityState, EntityType, EnemySubType};
use crate::world::damage_ledger::{DamageEvent, DamageLedger, Weapon};
use crate::world::entity_store::EntityStore;

pub struct DespawnedBullet {
    pub id: EntityId,
    pub reason: BulletDespawnReason,
}

/// Runs one collision pass over every entity pair. Returns bullets that
/// were consumed by a hit, for the caller to fold into its despawn
/// bookkeeping (they DO need `NotifyBulletDestroyed`, unlike a plain zone
/// exit).
pub fn step(entities: &mut EntityStore, ledger: &mut DamageLedger, now: f64) -> Vec<DespawnedBullet> {
    let ids: Vec<EntityId> = entities.values().map(|e| e.id.clone()).collect();
    let mut consumed_bullets = Vec::new();
    let mut dead: Vec<EntityId> = Vec::new();

    for i in 0..ids.len() {
        if dead.contains(&ids[i]) {
            continue;
        }
        for j in (i + 1)..ids.len() {
            if dead.contains(&ids[j]) {
                continue;
            }
            let (a_id, b_id) = (ids[i].clone(), ids[j].clone());
            if !entities.contains(&a_id) || !entities.contains(&b_id) {
                continue;
            }

            let (a_pos, a_kind, a_team) = {
                let a = entities.get(&a_id).unwrap();
                (a.position, a.kind, a.team)
            };
            let (b_pos, b_kind, b_team) = {
                let b = entities.get(&b_id).unwrap();
                (b.position, b.kind, b.team)
            };

            if a_pos.distance(b_pos) > 2.0 * COLLISION_RADIUS {
                continue;
            }

            if a_kind == EntityType::Bullet || b_kind == EntityType::Bullet {
                let (bullet_id, other_id) = if a_kind == EntityType::Bullet {
                    (a_id.clone(), b_id.clone())
                } else {
                    (b_id.clone(), a_id.clone())
                };
                let other_kind = if bullet_id == a_id { b_kind } else { a_kind };
                if other_kind == EntityType::Bullet || other_kind == EntityType::Explosion {
                    continue;
                }

                let (bullet_team, owner_id) = {
                    let bullet = entities.get(&bullet_id).unwrap();
                    (bullet.team, bullet.owner_id.clone())
                };
                let other_team = if bullet_id == a_id { b_team } else { a_team };
                if bullet_team > 0 && bullet_team == other_team {
                    continue; // friendly fire disabled
                }

                if handle_bullet_hit(entities, ledger, &bullet_id, &other_id, owner_id, now, &mut dead) {
                    consumed_bullets.push(DespawnedBullet {
                        id: bullet_id,
                        reason: BulletDespawnReason::Collision,
                    });
                }
                continue;
            }

            if a_kind == EntityType::Player && b_kind == EntityType::Player {
                continue;
            }
            if a_kind == EntityType::Explosion || b_kind == EntityType::Explosion {
                continue;
            }

            if a_kind == EntityType::Player || b_kind == EntityType::Player {
                let (player_id, other_id, other_kind) = if a_kind == EntityType::Player {
                    (a_id.clone(), b_id.clone(), b_kind)
                } else {
                    (b_id.clone(), a_id.clone(), a_kind)
                };
                handle_player_body_collision(entities, ledger, &player_id, &other_id, other_kind, now, &mut dead);
            }
        }
    }

    for id in &dead {
        entities.remove(id);
    }

    consumed_bullets
}

/// Returns `true` if the bullet was consumed (it always is, on any hit).
fn handle_bullet_hit(
    entities: &mut EntityStore,
    ledger: &mut DamageLedger,
    bullet_id: &str,
    target_id: &str,
    owner_id: Option<EntityId>,
    now: f64,
    dead: &mut Vec<EntityId>,
) -> bool {
    let (target_kind, target_sub) = {
        let target = entities.get(target_id).unwrap();
        (target.kind, target.sub_type)
    };

    // Credit the shooter, falling back to the bullet's own transient id if
    // the owner has since left the world.
    let attacker_id = owner_id.unwrap_or_else(|| bullet_id.to_string());

    ledger.record(DamageEvent {
        attacker_id: attacker_id.clone(),
        target_id: target_id.to_string(),
        attacker_kind: EntityType::Bullet,
        target_kind,
        attacker_sub: 0,
        target_sub,
        amount: BULLET_DAMAGE,
        weapon: Weapon::Gun,
        when: now,
    });

    let mut target_died = false;
    if let Some(target) = entities.get_mut(target_id) {
        target.health -= BULLET_DAMAGE;
        if target.health <= 0.0 && !matches!(target.state, EntityState::Dying | EntityState::Dead) {
            target_died = true;
        }
    }

    if target_died {
        dead.push(target_id.to_string());
        let grant = kill_credit_grant(target_kind, target_sub);
        if grant > 0.0 {
            if let Some(killer) = entities.get_mut(&attacker_id) {
                if killer.is_player() {
                    killer.health = (killer.health + grant).min(crate::config::PLAYER_MAX_HEALTH);
                }
            }
        }
    }

    entities.remove(bullet_id);
    true
}

fn kill_credit_grant(kind: EntityType, sub_type: i32) -> f64 {
    match kind {
        EntityType::Enemy => {
            if EnemySubType::from_i32(sub_type).is_some() {
                KILL_CREDIT_ENEMY_HP
            } else {
                0.0
            }
        }
        EntityType::Asteroid => KILL_CREDIT_ASTEROID_HP,
        _ => 0.0,
    }
}

fn handle_player_body_collision(
    entities: &mut EntityStore,
    ledger: &mut DamageLedger,
    player_id: &str,
    other_id: &str,
    other_kind: EntityType,
    now: f64,
    dead: &mut Vec<EntityId>,
) {
    let other_sub = entities.get(other_id).map(|e| e.sub_type).unwrap_or(0);

    let (damage_to_player, damage_to_other) = match other_kind {
        EntityType::Enemy => {
            let kamikaze = EnemySubType::from_i32(other_sub) == Some(EnemySubType::Kamikaze);
            let to_player = if kamikaze {
                KAMIKAZE_COLLISION_DAMAGE_TO_PLAYER
            } else {
                ENEMY_COLLISION_DAMAGE_TO_PLAYER
            };
            (to_player, PLAYER_COLLISION_DAMAGE_TO_ENEMY)
        }
        EntityType::Asteroid => (
            ASTEROID_COLLISION_DAMAGE_TO_PLAYER,
            PLAYER_COLLISION_DAMAGE_TO_ASTEROID,
        ),
        _ => return,
    };

    ledger.record(DamageEvent {
        attacker_id: other_id.to_string(),
        target_id: player_id.to_string(),
        attacker_kind: other_kind,
        target_kind: EntityType::Player,
        attacker_sub: other_sub,
        target_sub: 0,
        amount: damage_to_player,
        weapon: Weapon::Collision,
        when: now,
    });
    ledger.record(DamageEvent {
        attacker_id: player_id.to_string(),
        target_id: other_id.to_string(),
        attacker_kind: EntityType::Player,
        target_kind: other_kind,
        attacker_sub: 0,
        target_sub: other_sub,
        amount: damage_to_other,
        weapon: Weapon::Collision,
        when: now,
    });

    let mut other_died = false;
    if let Some(player) = entities.get_mut(player_id) {
        player.health -= damage_to_player;
        if player.health <= 0.0 && !matches!(player.state, EntityState::Dying | EntityState::Dead) {
            dead.push(player_id.to_string());
        }
    }
    if let Some(other) = entities.get_mut(other_id) {
        other.health -= damage_to_other;
        if other.health <= 0.0 {
            other_died = true;
        }
    }
    if other_died {
        dead.push(other_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::types::Vec2;

    fn bullet_at(id: &str, pos: Vec2, owner: &str, team: i32) -> Entity {
        let mut b = Entity::new(id.into(), EntityType::Bullet, 0, pos);
        b.owner_id = Some(owner.into());
        b.team = team;
        b
    }

    #[test]
    fn bullet_hitting_enemy_deals_damage_and_is_removed() {
        let mut entities = EntityStore::new();
        entities.insert(bullet_at("b1", Vec2::new(100.0, 100.0), "p1", 1));
        let mut enemy = Entity::new("e1".into(), EntityType::Enemy, EnemySubType::Sniper as i32, Vec2::new(105.0, 100.0));
        enemy.health = 50.0;
        entities.insert(enemy);

        let mut ledger = DamageLedger::new(0.0);
        let consumed = step(&mut entities, &mut ledger, 0.0);

        assert!(!entities.contains("b1"));
        assert_eq!(consumed.len(), 1);
        assert_eq!(entities.get("e1").unwrap().health, 50.0 - BULLET_DAMAGE);
        assert_eq!(ledger.damage_dealt_by_owner("p1"), BULLET_DAMAGE);
    }

    #[test]
    fn friendly_fire_is_ignored_between_same_team_bullet_and_player() {
        let mut entities = EntityStore::new();
        entities.insert(bullet_at("b1", Vec2::new(100.0, 100.0), "p1", 1));
        let mut ally = Entity::new("p2".into(), EntityType::Player, 0, Vec2::new(105.0, 100.0));
        ally.team = 1;
        ally.health = 1000.0;
        entities.insert(ally);

        let mut ledger = DamageLedger::new(0.0);
        step(&mut entities, &mut ledger, 0.0);

        assert!(entities.contains("b1"));
        assert_eq!(entities.get("p2").unwrap().health, 1000.0);
    }

    #[test]
    fn kamikaze_deals_more_body_damage_than_other_enemies() {
        let mut entities = EntityStore::new();
        let mut player = Entity::new("p1".into(), EntityType::Player, 0, Vec2::new(100.0, 100.0));
        player.health = 1000.0;
        entities.insert(player);
        let mut enemy = Entity::new("e1".into(), EntityType::Enemy, EnemySubType::Kamikaze as i32, Vec2::new(105.0, 100.0));
        enemy.health = 30.0;
        entities.insert(enemy);

        let mut ledger = DamageLedger::new(0.0);
        step(&mut entities, &mut ledger, 0.0);

        assert_eq!(entities.get("p1").unwrap().health, 1000.0 - KAMIKAZE_COLLISION_DAMAGE_TO_PLAYER);
    }

    #[test]
    fn bullet_owner_missing_falls_back_to_bullet_id_for_credit() {
        let mut entities = EntityStore::new();
        let mut b = Entity::new("b1".into(), EntityType::Bullet, 0, Vec2::new(100.0, 100.0));
        b.owner_id = None;
        entities.insert(b);
        let mut enemy = Entity::new("e1".into(), EntityType::Enemy, EnemySubType::Sniper as i32, Vec2::new(105.0, 100.0));
        enemy.health = 50.0;
        entities.insert(enemy);

        let mut ledger = DamageLedger::new(0.0);
        step(&mut entities, &mut ledger, 0.0);
        assert_eq!(ledger.damage_dealt_by_owner("b1"), BULLET_DAMAGE);
    }
}
