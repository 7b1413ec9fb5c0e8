//! Outbound work the tick wants performed, without ever awaiting it itself:
//! outbound RPCs must be fire-and-forget from the tick's perspective.
//! Systems return these; `WorldSimulation::dispatch` spawns one detached
//! task per effect after the synchronous tick phase returns.

use crate::entity::EntityId;
use crate::types::{GridSquare, Vec2};
use crate::world::phase::PlayerScore;

#[derive(Debug, Clone)]
pub enum OutboundEffect {
    UpdatePlayerPositionAndVelocity {
        player_id: EntityId,
        position: Vec2,
        velocity: Vec2,
    },
    InitiatePlayerTransfer {
        player_id: EntityId,
        position: Vec2,
    },
    MirrorPlayerPositionToGrain {
        player_id: EntityId,
        position: Vec2,
    },
    MirrorPlayerHealthToGrain {
        player_id: EntityId,
        health: f64,
    },
    /// `zone` is resolved to a `ServerInfo` inside the detached task via
    /// `WorldManager::get_action_server_for_position`, immediately before
    /// the trajectory is sent — never resolved inline on the tick.
    BroadcastBulletTrajectory {
        zone: GridSquare,
        id: EntityId,
        sub_type: i32,
        origin: Vec2,
        velocity: Vec2,
        spawn_game_time: f64,
        lifespan: f64,
        owner_id: Option<EntityId>,
        team: i32,
    },
    NotifyBulletDestroyed {
        zone: GridSquare,
        id: EntityId,
    },
    SendScoutAlert {
        zone: GridSquare,
        player_zone: GridSquare,
        player_pos: Vec2,
    },
    ChatMessage {
        message: String,
    },
    VictoryPause {
        scores: Vec<PlayerScore>,
        duration_secs: f64,
    },
    GameOver,
    GameRestart,
    NotifyWorldManagerGameOver,
    NotifyPlayerGrainGameOver {
        player_id: EntityId,
    },
    NotifyPlayerGrainGameRestarted {
        player_id: EntityId,
    },
    PlayerTimedOut {
        player_id: EntityId,
    },
}
