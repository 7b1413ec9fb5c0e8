//! The `Entity` type, owned exclusively by `EntityStore`.

use serde::{Deserialize, Serialize};

use crate::types::{EntityState, EntityType, Vec2};

pub type EntityId = String;

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityType,
    pub sub_type: i32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    /// For bullets, this carries remaining lifespan in seconds instead of HP.
    pub health: f64,
    pub state: EntityState,
    pub state_timer: f64,
    /// 0 = hostile; >=1 = player team. Friendly fire is disabled when a
    /// bullet's team matches the victim's and both are > 0.
    pub team: i32,
    /// Bullets only: the shooter's entity id. Never treated as ownership,
    /// only as a lookup key; the owner may have been removed since.
    pub owner_id: Option<EntityId>,

    // Player extras
    pub player_name: Option<String>,
    pub respawn_count: u32,

    // Scout extras
    pub has_spotted: bool,
    pub has_alerted: bool,
    pub roam_direction: Vec2,

    // AI extras
    pub strafe_sign: f64,
    pub alerted_until: f64,
    pub last_known_player_pos: Vec2,
    pub is_alerted: bool,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityType, sub_type: i32, position: Vec2) -> Self {
        Self {
            id,
            kind,
            sub_type,
            position,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            health: 0.0,
            state: EntityState::Active,
            state_timer: 0.0,
            team: 0,
            owner_id: None,
            player_name: None,
            respawn_count: 0,
            has_spotted: false,
            has_alerted: false,
            roam_direction: Vec2::ZERO,
            strafe_sign: 1.0,
            alerted_until: 0.0,
            last_known_player_pos: Vec2::ZERO,
            is_alerted: false,
        }
    }

    pub fn is_bullet(&self) -> bool {
        matches!(self.kind, EntityType::Bullet)
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityType::Player)
    }

    /// `true` for the bot-account naming scheme the client classifies as a
    /// bot: `^(LiteNetLib|Ruffles)(Test)?\d+$`, case-insensitive.
    pub fn is_bot_player(&self) -> bool {
        match &self.player_name {
            Some(name) => is_bot_name(name),
            None => false,
        }
    }
}

pub fn is_bot_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    for prefix in ["litenetlib", "ruffles"] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            let rest = rest.strip_prefix("test").unwrap_or(rest);
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                return true;
            }
        }
    }
    false
}

/// Wire-facing immutable projection of an entity, as returned by
/// `GetCurrentState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityType,
    pub position: Vec2,
    pub velocity: Vec2,
    pub health: f64,
    pub rotation: f32,
    pub sub_type: i32,
    pub state: EntityState,
    pub state_timer: f64,
    pub player_name: Option<String>,
    pub team: i32,
}

impl From<&Entity> for EntitySnapshot {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id.clone(),
            kind: e.kind,
            position: e.position,
            velocity: e.velocity,
            health: e.health,
            rotation: e.rotation,
            sub_type: e.sub_type,
            state: e.state,
            state_timer: e.state_timer,
            player_name: e.player_name.clone(),
            team: e.team,
        }
    }
}
