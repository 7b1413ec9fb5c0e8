#![allow(dead_code)]
//! Constants that are part of the observable contract: clients and
//! sibling servers depend on these being identical on every server.

/// Grid side length in world units. Must be identical across the cluster.
pub const ZONE_SIZE: f64 = 500.0;

pub const TICK_RATE_HZ: u32 = 60;
pub const TICK_INTERVAL_MS: u64 = 1000 / TICK_RATE_HZ as u64;

pub const PLAYER_SPEED: f64 = 80.0;
pub const PLAYER_FIRE_COOLDOWN_MS: u64 = 250;
pub const PLAYER_STARTING_HEALTH: f64 = 1000.0;
pub const PLAYER_MAX_HEALTH: f64 = 1000.0;
pub const PLAYER_IDLE_TIMEOUT_SECS: f64 = 30.0;
pub const PLAYER_DEAD_CLEANUP_SECS: f64 = 30.0;
pub const PLAYER_STALE_INPUT_REJOIN_SECS: f64 = 10.0;
pub const PLAYER_REJECTED_MOVE_MARGIN: f64 = 0.1;

pub const PLAYER_DYING_DURATION_SECS: f64 = 0.5;
pub const PLAYER_DEAD_DURATION_SECS: f64 = 5.0;
pub const PLAYER_RESPAWN_DURATION_SECS: f64 = 0.5;

// Bullets
pub const PLAYER_BULLET_SPEED: f64 = 500.0;
pub const ENEMY_BULLET_SPEED: f64 = 200.0;
pub const BULLET_LIFESPAN_SECS: f64 = 3.0;
pub const BULLET_SPAWN_OFFSET: f64 = 30.0;
pub const BULLET_ZONE_MARGIN: f64 = 1.0;
pub const BULLET_TRAJECTORY_SAMPLES: usize = 11;
pub const BULLET_PENDING_SAMPLE_STEP_SECS: f64 = 0.05;
pub const HANDOFF_BLOCKLIST_TTL_SECS: f64 = 5.0;

// Damage / combat
pub const COLLISION_RADIUS: f64 = 20.0;
pub const BULLET_DAMAGE: f64 = 25.0;
pub const KAMIKAZE_COLLISION_DAMAGE_TO_PLAYER: f64 = 30.0;
pub const ENEMY_COLLISION_DAMAGE_TO_PLAYER: f64 = 10.0;
pub const PLAYER_COLLISION_DAMAGE_TO_ENEMY: f64 = 10.0;
pub const PLAYER_COLLISION_DAMAGE_TO_ASTEROID: f64 = 25.0;
pub const ASTEROID_COLLISION_DAMAGE_TO_PLAYER: f64 = 20.0;
pub const KILL_CREDIT_ENEMY_HP: f64 = 2.0;
pub const KILL_CREDIT_ASTEROID_HP: f64 = 5.0;

// Enemy AI
pub const ENEMY_ZONE_MARGIN: f64 = 5.0;
pub const KAMIKAZE_SPEED: f64 = 36.0;
pub const SNIPER_SPEED: f64 = 19.2;
pub const SNIPER_ENGAGE_RANGE: f64 = 250.0;
pub const SNIPER_FIRE_PROB: f64 = 0.04;
pub const STRAFING_SPEED: f64 = 24.0;
pub const STRAFING_STRAFE_SPEED: f64 = 28.8;
pub const STRAFING_ENGAGE_RANGE: f64 = 200.0;
pub const STRAFING_FLIP_PROB: f64 = 0.02;
pub const STRAFING_FIRE_PROB: f64 = 0.03;
pub const SCOUT_DETECTION_RANGE: f64 = 300.0;
pub const SCOUT_ALERT_DELAY_SECS: f64 = 5.0;
pub const SCOUT_ALERTING_MAX_SECS: f64 = 120.0;
pub const SCOUT_ROAM_TURN_PROB: f64 = 0.01;
pub const SCOUT_ROAM_MARGIN: f64 = 50.0;
pub const ALERTED_APPROACH_SPEED: f64 = 19.2;
pub const ALERTED_CLEAR_DISTANCE: f64 = 50.0;
pub const SCOUT_ALERT_RECEIVED_VALIDITY_SECS: f64 = 30.0;

// Explosions
pub const EXPLOSION_DURATION_SECS: f64 = 0.5;

// Spawning
pub const OPPORTUNISTIC_SPAWN_PROB: f64 = 0.0005;
pub const FACTORY_EDGE_MARGIN: f64 = 50.0;
pub const ENEMY_SPAWN_RADIUS_MIN: f64 = 20.0;
pub const ENEMY_SPAWN_RADIUS_MAX: f64 = 60.0;
pub const ASTEROID_EDGE_MARGIN: f64 = 100.0;
pub const ASTEROID_MOVING_FRACTION: f64 = 0.5;
pub const ASTEROID_MOVING_SPEED_MIN: f64 = 10.0;
pub const ASTEROID_MOVING_SPEED_MAX: f64 = 40.0;

pub const KAMIKAZE_HEALTH: f64 = 30.0;
pub const SCOUT_HEALTH: f64 = 200.0;
pub const SNIPER_HEALTH: f64 = 50.0;
pub const STRAFING_HEALTH: f64 = 50.0;
pub const ASTEROID_HEALTH: f64 = 50.0;
pub const FACTORY_HEALTH: f64 = 200.0;

pub const INITIAL_FACTORIES_MIN: usize = 1;
pub const INITIAL_FACTORIES_MAX: usize = 2;
pub const INITIAL_ASTEROIDS: usize = 4;
pub const INITIAL_ENEMY_KAMIKAZE: usize = 2;
pub const INITIAL_ENEMY_SNIPER: usize = 2;
pub const INITIAL_ENEMY_STRAFING: usize = 1;
pub const INITIAL_ENEMY_SCOUT: usize = 1;

// Zone directory cache
pub const ZONE_DIRECTORY_CACHE_TTL_SECS: f64 = 10.0;

// Phase controller
pub const ENEMY_DEFEATED_COOLDOWN_SECS: f64 = 10.0;
pub const VICTORY_PAUSE_DURATION_SECS: f64 = 10.0;
pub const GAME_OVER_DURATION_SECS: f64 = 15.0;
pub const VICTORY_PAUSE_CHAT_MARKS: [u64; 4] = [8, 6, 4, 2];

/// Sentinel returned from scout-alert direction computation when no
/// neighbouring zone survives candidate resolution.
pub const SCOUT_ALERT_NO_TARGET_SENTINEL: f64 = -999.0;
