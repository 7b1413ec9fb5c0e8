//! Shared geometry and enum types used across the simulation.

use serde::{Deserialize, Serialize};

use crate::config::ZONE_SIZE;

pub type Vec2 = glam::DVec2;

/// A square cell of world space, `ZONE_SIZE` units on a side, owned by
/// exactly one server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSquare {
    pub x: i32,
    pub y: i32,
}

impl GridSquare {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Maps a world position to the grid square that contains it.
    pub fn of(pos: Vec2) -> Self {
        Self {
            x: (pos.x / ZONE_SIZE).floor() as i32,
            y: (pos.y / ZONE_SIZE).floor() as i32,
        }
    }

    pub fn centre(self) -> Vec2 {
        Vec2::new(
            self.x as f64 * ZONE_SIZE + ZONE_SIZE / 2.0,
            self.y as f64 * ZONE_SIZE + ZONE_SIZE / 2.0,
        )
    }

    pub fn min(self) -> Vec2 {
        Vec2::new(self.x as f64 * ZONE_SIZE, self.y as f64 * ZONE_SIZE)
    }

    pub fn max(self) -> Vec2 {
        Vec2::new(
            (self.x + 1) as f64 * ZONE_SIZE,
            (self.y + 1) as f64 * ZONE_SIZE,
        )
    }

    /// The 8 orthogonally/diagonally adjacent squares.
    pub fn neighbours(self) -> [GridSquare; 8] {
        [
            GridSquare::new(self.x - 1, self.y - 1),
            GridSquare::new(self.x, self.y - 1),
            GridSquare::new(self.x + 1, self.y - 1),
            GridSquare::new(self.x - 1, self.y),
            GridSquare::new(self.x + 1, self.y),
            GridSquare::new(self.x - 1, self.y + 1),
            GridSquare::new(self.x, self.y + 1),
            GridSquare::new(self.x + 1, self.y + 1),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Player,
    Enemy,
    Bullet,
    Explosion,
    Factory,
    Asteroid,
}

/// Discriminants match the `weapon`/`enemy type` encoding used in
/// `ZoneDamageReport`; the two encodings are reconciled by sharing this
/// enum everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum EnemySubType {
    Kamikaze = 1,
    Sniper = 2,
    Strafing = 3,
    Scout = 4,
}

impl EnemySubType {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            1 => Some(Self::Kamikaze),
            2 => Some(Self::Sniper),
            3 => Some(Self::Strafing),
            4 => Some(Self::Scout),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Kamikaze => "kamikaze",
            Self::Sniper => "sniper",
            Self::Strafing => "strafing",
            Self::Scout => "scout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum AsteroidSubType {
    Stationary = 0,
    Moving = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    Active,
    Alerting,
    Dying,
    Dead,
    Respawning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Playing,
    VictoryPause,
    GameOver,
    Restarting,
}

/// Why a bullet left the simulation. Used to decide whether to broadcast
/// `NotifyBulletDestroyed`: suppressed for a plain zone exit, since the
/// trajectory broadcast at spawn already told neighbours everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletDespawnReason {
    Expired,
    Collision,
    ZoneExit,
}
