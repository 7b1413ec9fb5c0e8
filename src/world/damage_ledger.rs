//! Append-only list of damage events for the current round, plus
//! per-player aggregated stats.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::types::{EntityType, GridSquare};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weapon {
    Gun,
    Collision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageEvent {
    pub attacker_id: EntityId,
    pub target_id: EntityId,
    pub attacker_kind: EntityType,
    pub target_kind: EntityType,
    pub attacker_sub: i32,
    pub target_sub: i32,
    pub amount: f64,
    pub weapon: Weapon,
    pub when: f64,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PlayerDamageStats {
    /// Damage dealt, keyed by weapon ("gun"/"collision").
    pub dealt_by_weapon: HashMap<String, f64>,
    /// Damage received, keyed by weapon.
    pub received_by_weapon: HashMap<String, f64>,
    /// Damage received, keyed by attacking enemy subtype name.
    pub received_by_enemy_type: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDamageReport {
    pub zone: GridSquare,
    pub round_start: f64,
    pub round_end: f64,
    pub events: Vec<DamageEvent>,
    pub per_player_stats: HashMap<EntityId, PlayerDamageStats>,
}

#[derive(Debug, Default)]
pub struct DamageLedger {
    events: Vec<DamageEvent>,
    round_start: f64,
}

impl DamageLedger {
    pub fn new(round_start: f64) -> Self {
        Self {
            events: Vec::new(),
            round_start,
        }
    }

    pub fn record(&mut self, event: DamageEvent) {
        self.events.push(event);
    }

    pub fn reset(&mut self, round_start: f64) {
        self.events.clear();
        self.round_start = round_start;
    }

    pub fn events(&self) -> &[DamageEvent] {
        &self.events
    }

    /// Build an aggregated report. Locks are implicit: this takes `&self`,
    /// so callers serialize it with the tick the way every other read does.
    pub fn report(&self, zone: GridSquare, now: f64) -> ZoneDamageReport {
        let mut per_player: HashMap<EntityId, PlayerDamageStats> = HashMap::new();

        for event in &self.events {
            let weapon_key = match event.weapon {
                Weapon::Gun => "gun",
                Weapon::Collision => "collision",
            };

            // `attacker_id` for a gun event is already the shooter's id:
            // the collision system records bullets under their owner,
            // falling back to the bullet's own id if the owner has since
            // been removed, since `owner_id` is only ever a lookup key.
            {
                let entry = per_player.entry(event.attacker_id.clone()).or_default();
                *entry
                    .dealt_by_weapon
                    .entry(weapon_key.to_string())
                    .or_insert(0.0) += event.amount;
            }

            if event.target_kind == EntityType::Player {
                let entry = per_player.entry(event.target_id.clone()).or_default();
                *entry
                    .received_by_weapon
                    .entry(weapon_key.to_string())
                    .or_insert(0.0) += event.amount;

                if event.attacker_kind == EntityType::Enemy {
                    if let Some(sub) = crate::types::EnemySubType::from_i32(event.attacker_sub) {
                        *entry
                            .received_by_enemy_type
                            .entry(sub.name().to_string())
                            .or_insert(0.0) += event.amount;
                    }
                }
            }
        }

        ZoneDamageReport {
            zone,
            round_start: self.round_start,
            round_end: now,
            events: self.events.clone(),
            per_player_stats: per_player,
        }
    }

    /// Total damage dealt by bullets owned by `owner_id`. Scoring is
    /// derived from the ledger rather than tracked separately.
    pub fn damage_dealt_by_owner(&self, owner_id: &str) -> f64 {
        self.events
            .iter()
            .filter(|e| e.attacker_kind == EntityType::Bullet)
            .filter(|e| e.attacker_id == owner_id)
            .map(|e| e.amount)
            .sum()
    }

}
