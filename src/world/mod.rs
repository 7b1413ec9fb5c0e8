//! `WorldSimulation`: the single-owner actor holding everything a zone
//! server needs. Inbound calls and the tick both run as `&mut self`
//! methods on whatever task owns this struct; nothing here ever awaits
//! during the tick itself (see `crate::effects`).

pub mod damage_ledger;
pub mod entity_store;
pub mod fps_monitor;
pub mod handoff_blocklist;
pub mod input_buffer;
pub mod pending_bullets;
pub mod phase;
pub mod zone_directory;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::collaborators::{CrossZoneClient, GameEventBroker, PlayerGrain, WorldManager};
use crate::config::{PLAYER_STALE_INPUT_REJOIN_SECS, ZONE_DIRECTORY_CACHE_TTL_SECS};
use crate::effects::OutboundEffect;
use crate::entity::{Entity, EntityId, EntitySnapshot};
use crate::id_gen::IdGen;
use crate::systems::collisions::DespawnedBullet;
use crate::systems::{ai, bullets, collisions, physics, spawning};
use crate::types::{BulletDespawnReason, EntityState, EntityType, GamePhase, GridSquare, Vec2};

use damage_ledger::{DamageLedger, ZoneDamageReport};
use entity_store::EntityStore;
use fps_monitor::FpsMonitor;
use handoff_blocklist::HandoffBlocklist;
use input_buffer::InputBuffer;
use pending_bullets::PendingBulletTable;
use phase::{PhaseController, PhaseEffect, PlayerScore};
use zone_directory::ZoneDirectoryCache;

/// Collaborator handles the simulation dispatches detached work through.
/// Cloned cheaply (`Arc`) into every spawned task.
#[derive(Clone)]
pub struct Collaborators {
    pub world_manager: Arc<dyn WorldManager>,
    pub player_grain: Arc<dyn PlayerGrain>,
    pub cross_zone: Arc<dyn CrossZoneClient>,
    pub event_broker: Arc<dyn GameEventBroker>,
}

/// Response shape for `GetCurrentState`: the entity snapshot plus the
/// wall-clock timestamp it was taken at and a per-zone monotonic sequence
/// number, so a caller can detect a stale or reordered read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub entities: Vec<EntitySnapshot>,
    pub timestamp: f64,
    pub sequence_number: u64,
}

/// Response shape for `GetPlayerInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: EntityId,
    pub player_name: String,
    pub team: i32,
    pub position: Vec2,
    pub health: f64,
}

pub struct WorldSimulation {
    pub assigned_zone: GridSquare,
    pub entities: EntityStore,
    pub inputs: InputBuffer,
    pub pending_bullets: PendingBulletTable,
    pub handoff_blocklist: HandoffBlocklist,
    pub zone_directory: ZoneDirectoryCache,
    pub damage_ledger: DamageLedger,
    pub phase: PhaseController,
    pub fps: FpsMonitor,
    pub ids: IdGen,
    pub game_time: f64,
    rng: StdRng,
    collaborators: Collaborators,
    sequence: AtomicU64,
    timeout_callback: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

impl WorldSimulation {
    pub fn new(assigned_zone: GridSquare, collaborators: Collaborators) -> Self {
        Self {
            assigned_zone,
            entities: EntityStore::new(),
            inputs: InputBuffer::new(),
            pending_bullets: PendingBulletTable::new(),
            handoff_blocklist: HandoffBlocklist::new(),
            zone_directory: ZoneDirectoryCache::new(),
            damage_ledger: DamageLedger::new(0.0),
            phase: PhaseController::new(),
            fps: FpsMonitor::new(),
            ids: IdGen::new(assigned_zone),
            game_time: 0.0,
            rng: StdRng::from_entropy(),
            collaborators,
            sequence: AtomicU64::new(0),
            timeout_callback: None,
        }
    }

    /// Registers a callback invoked with a player id whenever that player's
    /// input goes stale past `PLAYER_IDLE_TIMEOUT_SECS` during a tick.
    pub fn set_player_timeout_callback(&mut self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.timeout_callback = Some(Box::new(callback));
    }

    /// Populates the zone for the first time.
    pub fn bootstrap(&mut self) {
        spawning::spawn_initial_world(&mut self.entities, self.assigned_zone, &mut self.ids, &mut self.rng);
        info!(zone = ?self.assigned_zone, entity_count = self.entities.len(), "zone bootstrapped");
    }

    // --- Inbound RPCs -----------------------------------------------------

    /// Admits a player into this zone. Rejects (`false`) if a live entity
    /// with the same id is already present and its input isn't stale;
    /// otherwise evicts the stale/dead entity and admits the newcomer,
    /// pulling its name/team/position from the `PlayerGrain` collaborator.
    pub async fn add_player(&mut self, player_id: EntityId) -> bool {
        if let Some(existing) = self.entities.get(&player_id) {
            let existing_dead = matches!(existing.state, EntityState::Dead);
            let input_stale = self
                .inputs
                .get(&player_id)
                .map_or(true, |input| self.game_time - input.last_updated > PLAYER_STALE_INPUT_REJOIN_SECS);
            if !existing_dead && !input_stale {
                return false;
            }
            self.entities.remove(&player_id);
            self.inputs.remove(&player_id);
        }

        let (player_name, team, position) = self
            .collaborators
            .player_grain
            .get_info(player_id.clone())
            .await
            .unwrap_or_else(|| (player_id.clone(), 0, self.assigned_zone.centre()));

        spawning::add_player(&mut self.entities, player_id, player_name, position, team);
        true
    }

    /// `false` if the player is unknown locally. Uses a plain `bool`
    /// rejection signal rather than an error type, matching the rest of
    /// this module's RPC-style handlers.
    pub fn remove_player(&mut self, player_id: &str) -> bool {
        self.inputs.remove(player_id);
        self.entities.remove(player_id).is_some()
    }

    /// No-op for a player not present in `EntityStore` — input for an
    /// unknown player is dropped rather than buffered.
    pub fn set_player_input(
        &mut self,
        player_id: &str,
        move_dir: Option<Vec2>,
        shoot_dir: Option<Vec2>,
        is_shooting: bool,
    ) {
        if !self.entities.contains(player_id) {
            return;
        }
        self.inputs.set(player_id, move_dir, shoot_dir, is_shooting, self.game_time);
    }

    /// Accepts a player entity being handed over from a neighbouring zone.
    /// Rejected (returns `false`) if a player with that id is already
    /// present, to guard against duplicate transfer races.
    pub fn transfer_entity_in(&mut self, entity: Entity) -> bool {
        if self.entities.contains(&entity.id) {
            return false;
        }
        self.entities.insert(entity);
        true
    }

    pub fn receive_bullet_trajectory(
        &mut self,
        id: EntityId,
        sub_type: i32,
        origin: Vec2,
        velocity: Vec2,
        spawn_game_time: f64,
        lifespan: f64,
        owner_id: Option<EntityId>,
        team: i32,
    ) {
        bullets::receive_trajectory(
            &mut self.entities,
            &mut self.pending_bullets,
            &self.handoff_blocklist,
            self.assigned_zone,
            id,
            sub_type,
            origin,
            velocity,
            spawn_game_time,
            lifespan,
            owner_id,
            team,
            self.game_time,
        );
    }

    pub fn receive_bullet_destroyed(&mut self, id: &str) {
        self.entities.remove(id);
        self.pending_bullets.remove(id);
    }

    pub fn receive_scout_alert(&mut self, player_pos: Vec2) {
        ai::receive_scout_alert(&mut self.entities, player_pos, self.game_time);
    }

    pub fn get_current_state(&self) -> WorldState {
        let sequence_number = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        WorldState {
            entities: self.entities.snapshot(),
            timestamp: self.game_time,
            sequence_number,
        }
    }

    /// Player ids currently held by this zone but physically positioned
    /// outside it — present until an external `RemovePlayer` call lands,
    /// per the handoff contract `InitiatePlayerTransfer` kicks off.
    pub fn get_players_outside_zone(&self) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.is_player() && GridSquare::of(e.position) != self.assigned_zone)
            .map(|e| e.id.clone())
            .collect()
    }

    /// Same idea as `get_players_outside_zone` but for every entity kind.
    pub fn get_entities_outside_zone(&self) -> Vec<(EntityId, Vec2, EntityType, i32)> {
        self.entities
            .values()
            .filter(|e| GridSquare::of(e.position) != self.assigned_zone)
            .map(|e| (e.id.clone(), e.position, e.kind, e.sub_type))
            .collect()
    }

    pub fn get_player_info(&self, player_id: &str) -> Option<PlayerInfo> {
        self.entities
            .get(player_id)
            .filter(|e| e.is_player())
            .map(|e| PlayerInfo {
                player_id: e.id.clone(),
                player_name: e.player_name.clone().unwrap_or_default(),
                team: e.team,
                position: e.position,
                health: e.health,
            })
    }

    pub fn get_damage_report(&self) -> ZoneDamageReport {
        self.damage_ledger.report(self.assigned_zone, self.game_time)
    }

    pub fn get_phase(&self) -> GamePhase {
        self.phase.phase()
    }

    pub fn observed_fps(&self) -> f64 {
        self.fps.fps()
    }

    /// Called by the `WorldManager` collaborator when it resolves a fresh
    /// set of zones currently backed by some server.
    pub fn refresh_zone_directory(&mut self, zones: impl IntoIterator<Item = GridSquare>) {
        self.zone_directory.replace(zones, self.game_time);
    }

    pub fn zone_directory_is_stale(&self) -> bool {
        self.zone_directory.is_stale(self.game_time)
    }

    // ─── Tick ───────────────────────────────────────────────────────────

    /// Runs one fixed-step tick. Returns the outbound effects the caller
    /// must `dispatch`; this method itself never awaits.
    #[instrument(level = "debug", skip(self), fields(zone = ?self.assigned_zone))]
    pub fn tick(&mut self, dt: f64) -> Vec<OutboundEffect> {
        self.game_time += dt;
        self.fps.record(self.game_time, dt);
        self.handoff_blocklist.sweep(self.game_time);
        self.pending_bullets.drop_expired(self.game_time);

        let mut effects = Vec::new();

        match self.phase.phase() {
            GamePhase::Playing => {
                bullets::activate_pending(
                    &mut self.entities,
                    &mut self.pending_bullets,
                    &self.handoff_blocklist,
                    self.assigned_zone,
                    self.game_time,
                );

                let ai_outcome = ai::step(
                    &mut self.entities,
                    &self.inputs,
                    self.assigned_zone,
                    self.game_time,
                    &mut self.ids,
                    &mut self.rng,
                );
                effects.extend(ai_outcome.effects);

                let physics_outcome = physics::step(
                    &mut self.entities,
                    &mut self.inputs,
                    &mut self.handoff_blocklist,
                    &self.zone_directory,
                    self.assigned_zone,
                    self.game_time,
                    dt,
                    &mut self.ids,
                );
                effects.extend(physics_outcome.effects);
                effects.extend(despawn_effects(self.assigned_zone, physics_outcome.despawned_bullets));

                let consumed_bullets = collisions::step(&mut self.entities, &mut self.damage_ledger, self.game_time);
                for despawned in consumed_bullets {
                    effects.push(OutboundEffect::NotifyBulletDestroyed {
                        zone: self.assigned_zone,
                        id: despawned.id,
                    });
                }

                spawning::transition_newly_dead(&mut self.entities, self.game_time);

                let spawning_outcome = spawning::step(
                    &mut self.entities,
                    self.assigned_zone,
                    self.game_time,
                    &mut self.ids,
                    &mut self.rng,
                );
                effects.extend(spawning_outcome.effects);

                let stale_players: Vec<String> = self
                    .inputs
                    .stale_players(self.game_time, crate::config::PLAYER_IDLE_TIMEOUT_SECS);
                for player_id in stale_players {
                    self.inputs.remove(&player_id);
                    if let Some(cb) = &self.timeout_callback {
                        cb(&player_id);
                    }
                    effects.push(OutboundEffect::PlayerTimedOut { player_id });
                }

                let hostile_count = self.entities.ids_of_kind(EntityType::Enemy).len()
                    + self.entities.ids_of_kind(EntityType::Asteroid).len();
                let ledger = &self.damage_ledger;
                let snapshot_entities = &self.entities;
                let phase_effect = self.phase.observe_hostiles(hostile_count, self.game_time, || {
                    snapshot_entities
                        .values()
                        .filter(|e| e.is_player())
                        .map(|e| (e.id.clone(), ledger.damage_dealt_by_owner(&e.id)))
                        .collect()
                });
                effects.extend(self.apply_phase_effect(phase_effect));
            }
            GamePhase::VictoryPause | GamePhase::GameOver => {
                let physics_outcome = physics::step(
                    &mut self.entities,
                    &mut self.inputs,
                    &mut self.handoff_blocklist,
                    &self.zone_directory,
                    self.assigned_zone,
                    self.game_time,
                    dt,
                    &mut self.ids,
                );
                effects.extend(physics_outcome.effects);
                effects.extend(despawn_effects(self.assigned_zone, physics_outcome.despawned_bullets));

                let cleanup_outcome = spawning::advance_and_cleanup(&mut self.entities, self.game_time);
                effects.extend(cleanup_outcome.effects);

                let phase_effect = self.phase.tick_timers(self.game_time);
                effects.extend(self.apply_phase_effect(phase_effect));
            }
            GamePhase::Restarting => {
                effects.extend(self.restart_round());
                effects.push(OutboundEffect::GameRestart);
            }
        }

        effects
    }

    fn apply_phase_effect(&mut self, effect: PhaseEffect) -> Vec<OutboundEffect> {
        match effect {
            PhaseEffect::None => Vec::new(),
            PhaseEffect::EnterVictoryPause { scores } => {
                let scores = scores
                    .into_iter()
                    .map(|(player_id, damage_dealt)| {
                        let (player_name, deaths) = self
                            .entities
                            .get(&player_id)
                            .map(|e| (e.player_name.clone().unwrap_or_default(), e.respawn_count))
                            .unwrap_or_default();
                        PlayerScore {
                            player_id,
                            player_name,
                            damage_dealt,
                            deaths,
                        }
                    })
                    .collect::<Vec<_>>();
                vec![OutboundEffect::VictoryPause {
                    scores,
                    duration_secs: crate::config::VICTORY_PAUSE_DURATION_SECS,
                }]
            }
            PhaseEffect::ChatCountdown { seconds_remaining } => {
                vec![OutboundEffect::ChatMessage {
                    message: format!("Restarting in {seconds_remaining}..."),
                }]
            }
            PhaseEffect::EnterGameOver => {
                let mut effects = vec![OutboundEffect::GameOver, OutboundEffect::NotifyWorldManagerGameOver];
                effects.extend(self.entities.values().filter(|e| e.is_player()).map(|e| {
                    OutboundEffect::NotifyPlayerGrainGameOver {
                        player_id: e.id.clone(),
                    }
                }));
                effects
            }
            PhaseEffect::EnterRestarting => {
                self.phase.enter_restarting();
                Vec::new()
            }
        }
    }

    fn restart_round(&mut self) -> Vec<OutboundEffect> {
        self.entities.retain(|e| e.is_player());
        let mut effects = Vec::new();
        for player in self.entities.values_mut() {
            player.position = self.assigned_zone.centre();
            player.health = crate::config::PLAYER_MAX_HEALTH;
            player.respawn_count = 0;
            effects.push(OutboundEffect::NotifyPlayerGrainGameRestarted {
                player_id: player.id.clone(),
            });
        }
        self.damage_ledger.reset(self.game_time);
        self.ids.bump_restart_epoch();
        spawning::spawn_initial_world(&mut self.entities, self.assigned_zone, &mut self.ids, &mut self.rng);
        self.phase.finish_restart();
        info!(zone = ?self.assigned_zone, "round restarted");
        effects
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Dispatches this tick's effects through `dispatch`, using this
    /// simulation's own zone for effects that aren't already zone-tagged.
    pub fn dispatch(&self, effects: Vec<OutboundEffect>) {
        dispatch(effects, self.assigned_zone, self.collaborators.clone());
    }
}

/// Translates bullet despawns into outbound effects: `ZoneExit` is
/// suppressed (the trajectory broadcast already told the neighbour),
/// `Collision` and `Expired` both raise `NotifyBulletDestroyed`.
fn despawn_effects(zone: GridSquare, despawned: Vec<DespawnedBullet>) -> Vec<OutboundEffect> {
    despawned
        .into_iter()
        .filter(|d| d.reason != BulletDespawnReason::ZoneExit)
        .map(|d| OutboundEffect::NotifyBulletDestroyed { zone, id: d.id })
        .collect()
}

/// Spawns one detached task per effect. Collaborator resolution (e.g.
/// `WorldManager::get_action_server_for_position`) happens inside each
/// task, never synchronously on the tick. `own_zone` is used for events
/// that originate from this simulation rather than carrying a target zone.
pub fn dispatch(effects: Vec<OutboundEffect>, own_zone: GridSquare, collaborators: Collaborators) {
    for effect in effects {
        let c = collaborators.clone();
        tokio::spawn(async move {
            run_effect(effect, own_zone, c).await;
        });
    }
}

async fn run_effect(effect: OutboundEffect, own_zone: GridSquare, c: Collaborators) {
    match effect {
        OutboundEffect::UpdatePlayerPositionAndVelocity { player_id, position, velocity } => {
            c.world_manager.update_player_position_and_velocity(player_id, position, velocity).await;
        }
        OutboundEffect::InitiatePlayerTransfer { player_id, position } => {
            c.world_manager.initiate_player_transfer(player_id, position).await;
        }
        OutboundEffect::MirrorPlayerPositionToGrain { player_id, position } => {
            c.player_grain.update_position(player_id, position).await;
        }
        OutboundEffect::MirrorPlayerHealthToGrain { player_id, health } => {
            c.player_grain.update_health(player_id, health).await;
        }
        OutboundEffect::BroadcastBulletTrajectory {
            zone, id, sub_type, origin, velocity, spawn_game_time, lifespan, owner_id, team,
        } => {
            if let Some(target) = c.world_manager.get_action_server_for_position(zone).await {
                c.cross_zone
                    .transfer_bullet_trajectory(target, id, sub_type, origin, velocity, spawn_game_time, lifespan, owner_id, team)
                    .await;
            }
        }
        OutboundEffect::NotifyBulletDestroyed { zone, id } => {
            if let Some(target) = c.world_manager.get_action_server_for_position(zone).await {
                c.cross_zone.notify_bullet_destroyed(target, id).await;
            }
        }
        OutboundEffect::SendScoutAlert { zone, player_zone, player_pos } => {
            if let Some(target) = c.world_manager.get_action_server_for_position(zone).await {
                c.cross_zone.receive_scout_alert(target, player_zone, player_pos).await;
            }
        }
        OutboundEffect::ChatMessage { message } => {
            c.event_broker.raise_chat_message(own_zone, message).await;
        }
        OutboundEffect::VictoryPause { scores, duration_secs } => {
            c.event_broker.raise_victory_pause(own_zone, scores, duration_secs).await;
        }
        OutboundEffect::GameOver => {
            c.event_broker.raise_game_over(own_zone).await;
        }
        OutboundEffect::GameRestart => {
            c.event_broker.raise_game_restart(own_zone).await;
        }
        OutboundEffect::NotifyWorldManagerGameOver => {
            c.world_manager.notify_game_over(own_zone).await;
        }
        OutboundEffect::NotifyPlayerGrainGameOver { player_id } => {
            c.player_grain.notify_game_over(player_id).await;
        }
        OutboundEffect::NotifyPlayerGrainGameRestarted { player_id } => {
            c.player_grain.notify_game_restarted(player_id).await;
        }
        OutboundEffect::PlayerTimedOut { player_id } => {
            info!(%player_id, "player timed out and was dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{NullCrossZoneClient, NullGameEventBroker, NullPlayerGrain, NullWorldManager};

    fn simulation() -> WorldSimulation {
        let collaborators = Collaborators {
            world_manager: Arc::new(NullWorldManager),
            player_grain: Arc::new(NullPlayerGrain),
            cross_zone: Arc::new(NullCrossZoneClient),
            event_broker: Arc::new(NullGameEventBroker),
        };
        let mut sim = WorldSimulation::new(GridSquare::new(0, 0), collaborators);
        sim.bootstrap();
        sim
    }

    #[tokio::test]
    async fn add_and_remove_player_round_trips() {
        let mut sim = simulation();
        assert!(sim.add_player("p1".into()).await);
        assert!(sim.entities.contains("p1"));
        assert!(sim.remove_player("p1"));
        assert!(!sim.remove_player("p1"));
    }

    #[tokio::test]
    async fn duplicate_add_player_is_rejected_when_live_and_fresh() {
        let mut sim = simulation();
        assert!(sim.add_player("p1".into()).await);
        sim.set_player_input("p1", Some(Vec2::ZERO), None, false);

        assert!(!sim.add_player("p1".into()).await);
    }

    #[tokio::test]
    async fn duplicate_add_player_is_accepted_when_existing_is_dead() {
        let mut sim = simulation();
        assert!(sim.add_player("p1".into()).await);
        sim.entities.get_mut("p1").unwrap().state = EntityState::Dead;

        assert!(sim.add_player("p1".into()).await);
    }

    #[tokio::test]
    async fn duplicate_add_player_is_accepted_when_input_is_stale() {
        let mut sim = simulation();
        assert!(sim.add_player("p1".into()).await);
        sim.set_player_input("p1", Some(Vec2::ZERO), None, false);
        sim.game_time += PLAYER_STALE_INPUT_REJOIN_SECS + 1.0;

        assert!(sim.add_player("p1".into()).await);
    }

    #[test]
    fn set_player_input_for_unknown_player_is_a_no_op() {
        let mut sim = simulation();
        sim.set_player_input("ghost", Some(Vec2::new(1.0, 0.0)), None, false);
        assert!(sim.inputs.get("ghost").is_none());
    }

    #[test]
    fn get_current_state_sequence_number_strictly_increases() {
        let sim = simulation();
        let first = sim.get_current_state().sequence_number;
        let second = sim.get_current_state().sequence_number;
        assert!(second > first);
    }

    #[test]
    fn tick_advances_game_time_by_dt() {
        let mut sim = simulation();
        sim.tick(1.0 / 60.0);
        assert!((sim.game_time - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_transfer_in_is_rejected() {
        let mut sim = simulation();
        let entity = Entity::new("p1".into(), EntityType::Player, 0, Vec2::ZERO);
        assert!(sim.transfer_entity_in(entity.clone()));
        assert!(!sim.transfer_entity_in(entity));
    }

    #[test]
    fn restart_epoch_changes_ids_issued_after_restart() {
        let mut sim = simulation();
        let before = sim.ids.next("bullet");
        sim.restart_round();
        let after = sim.ids.next("bullet");
        assert_ne!(before, after);
    }
}
