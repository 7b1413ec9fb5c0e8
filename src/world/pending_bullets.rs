//! Trajectories received from neighbours for bullets not yet inside this
//! zone.

use std::collections::HashMap;

use crate::entity::EntityId;
use crate::types::Vec2;

/// Immutable trajectory record, as broadcast by the owning zone at spawn
/// time or received via `ReceiveBulletTrajectory`.
#[derive(Debug, Clone)]
pub struct PendingBullet {
    pub id: EntityId,
    pub sub_type: i32,
    pub origin: Vec2,
    pub velocity: Vec2,
    pub spawn_game_time: f64,
    pub lifespan: f64,
    pub owner_id: Option<EntityId>,
    pub team: i32,
}

impl PendingBullet {
    /// Position at `game_time`, per its straight-line trajectory.
    pub fn position_at(&self, game_time: f64) -> Vec2 {
        let elapsed = game_time - self.spawn_game_time;
        self.origin + self.velocity * elapsed
    }

    pub fn elapsed_at(&self, game_time: f64) -> f64 {
        game_time - self.spawn_game_time
    }

    pub fn is_expired_at(&self, game_time: f64) -> bool {
        self.elapsed_at(game_time) >= self.lifespan
    }
}

#[derive(Debug, Default)]
pub struct PendingBulletTable {
    pending: HashMap<EntityId, PendingBullet>,
}

impl PendingBulletTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bullet: PendingBullet) {
        self.pending.insert(bullet.id.clone(), bullet);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<PendingBullet> {
        self.pending.remove(id)
    }

    pub fn values(&self) -> impl Iterator<Item = &PendingBullet> {
        self.pending.values()
    }

    pub fn drop_expired(&mut self, game_time: f64) {
        self.pending.retain(|_, b| !b.is_expired_at(game_time));
    }
}
