//! Async trait contracts for the external collaborators this crate treats
//! as out of scope: `WorldManager`, `PlayerGrain`, `CrossZoneClient`, and
//! `GameEventBroker`. The WorldSimulation core only ever calls through
//! these traits, fire-and-forget, from a detached task; it never blocks
//! the tick on a collaborator response.
//!
//! Null implementations are provided for the demo binary and for tests.
//! A real deployment wires these to gRPC/HTTP clients and the Orleans-
//! style grains of the wider cluster; that wiring lives outside this crate.

use async_trait::async_trait;
use tracing::warn;

use crate::entity::EntityId;
use crate::types::{GridSquare, Vec2};
use crate::world::phase::PlayerScore;

/// Opaque identifier for a sibling server, as resolved by
/// `GetActionServerForPosition`/`GetAllActionServers`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerInfo {
    pub endpoint: String,
}

#[async_trait]
pub trait WorldManager: Send + Sync {
    async fn register_action_server(&self, zone: GridSquare, info: ServerInfo);
    async fn unregister_action_server(&self, zone: GridSquare);
    async fn get_all_action_servers(&self) -> Vec<GridSquare>;
    async fn get_action_server_for_position(&self, zone: GridSquare) -> Option<ServerInfo>;
    async fn update_player_position_and_velocity(
        &self,
        player_id: EntityId,
        position: Vec2,
        velocity: Vec2,
    );
    async fn initiate_player_transfer(&self, player_id: EntityId, position: Vec2);
    async fn notify_game_over(&self, zone: GridSquare);
}

#[async_trait]
pub trait PlayerGrain: Send + Sync {
    async fn get_info(&self, player_id: EntityId) -> Option<(String, i32, Vec2)>;
    async fn update_position(&self, player_id: EntityId, position: Vec2);
    async fn update_health(&self, player_id: EntityId, health: f64);
    async fn notify_game_over(&self, player_id: EntityId);
    async fn notify_game_restarted(&self, player_id: EntityId);
}

#[async_trait]
pub trait CrossZoneClient: Send + Sync {
    async fn transfer_bullet_trajectory(
        &self,
        target: ServerInfo,
        id: EntityId,
        sub_type: i32,
        origin: Vec2,
        velocity: Vec2,
        spawn_game_time: f64,
        lifespan: f64,
        owner_id: Option<EntityId>,
        team: i32,
    );
    async fn notify_bullet_destroyed(&self, target: ServerInfo, id: EntityId);
    async fn receive_scout_alert(&self, target: ServerInfo, player_zone: GridSquare, player_pos: Vec2);
}

#[async_trait]
pub trait GameEventBroker: Send + Sync {
    async fn raise_chat_message(&self, zone: GridSquare, message: String);
    async fn raise_victory_pause(&self, zone: GridSquare, scores: Vec<PlayerScore>, duration_secs: f64);
    async fn raise_game_over(&self, zone: GridSquare);
    async fn raise_game_restart(&self, zone: GridSquare);
}

// ─── Null implementations ─────────────────────────────────────────────

/// Logs and otherwise does nothing. Used by the demo binary and by tests
/// that don't care about collaborator side effects.
#[derive(Debug, Default)]
pub struct NullWorldManager;

#[async_trait]
impl WorldManager for NullWorldManager {
    async fn register_action_server(&self, zone: GridSquare, _info: ServerInfo) {
        warn!(?zone, "NullWorldManager: register_action_server is a no-op");
    }
    async fn unregister_action_server(&self, _zone: GridSquare) {}
    async fn get_all_action_servers(&self) -> Vec<GridSquare> {
        Vec::new()
    }
    async fn get_action_server_for_position(&self, _zone: GridSquare) -> Option<ServerInfo> {
        None
    }
    async fn update_player_position_and_velocity(
        &self,
        _player_id: EntityId,
        _position: Vec2,
        _velocity: Vec2,
    ) {
    }
    async fn initiate_player_transfer(&self, _player_id: EntityId, _position: Vec2) {}
    async fn notify_game_over(&self, _zone: GridSquare) {}
}

#[derive(Debug, Default)]
pub struct NullPlayerGrain;

#[async_trait]
impl PlayerGrain for NullPlayerGrain {
    async fn get_info(&self, _player_id: EntityId) -> Option<(String, i32, Vec2)> {
        None
    }
    async fn update_position(&self, _player_id: EntityId, _position: Vec2) {}
    async fn update_health(&self, _player_id: EntityId, _health: f64) {}
    async fn notify_game_over(&self, _player_id: EntityId) {}
    async fn notify_game_restarted(&self, _player_id: EntityId) {}
}

#[derive(Debug, Default)]
pub struct NullCrossZoneClient;

#[async_trait]
impl CrossZoneClient for NullCrossZoneClient {
    async fn transfer_bullet_trajectory(
        &self,
        _target: ServerInfo,
        _id: EntityId,
        _sub_type: i32,
        _origin: Vec2,
        _velocity: Vec2,
        _spawn_game_time: f64,
        _lifespan: f64,
        _owner_id: Option<EntityId>,
        _team: i32,
    ) {
    }
    async fn notify_bullet_destroyed(&self, _target: ServerInfo, _id: EntityId) {}
    async fn receive_scout_alert(&self, _target: ServerInfo, _player_zone: GridSquare, _player_pos: Vec2) {
    }
}

#[derive(Debug, Default)]
pub struct NullGameEventBroker;

#[async_trait]
impl GameEventBroker for NullGameEventBroker {
    async fn raise_chat_message(&self, zone: GridSquare, message: String) {
        tracing::info!(?zone, %message, "chat");
    }
    async fn raise_victory_pause(
        &self,
        zone: GridSquare,
        scores: Vec<PlayerScore>,
        duration_secs: f64,
    ) {
        tracing::info!(?zone, count = scores.len(), duration_secs, "victory pause");
    }
    async fn raise_game_over(&self, zone: GridSquare) {
        tracing::info!(?zone, "game over");
    }
    async fn raise_game_restart(&self, zone: GridSquare) {
        tracing::info!(?zone, "game restart");
    }
}
