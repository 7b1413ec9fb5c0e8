//! Per-player latest input state.

use std::collections::HashMap;

use crate::types::Vec2;

#[derive(Debug, Clone)]
pub struct PlayerInput {
    pub move_dir: Vec2,
    pub shoot_dir: Option<Vec2>,
    pub is_shooting: bool,
    /// Game-time seconds this input was last refreshed.
    pub last_updated: f64,
    /// Game-time seconds of the last bullet this player fired.
    pub last_shot: f64,
}

impl PlayerInput {
    pub fn idle(now: f64) -> Self {
        Self {
            move_dir: Vec2::ZERO,
            shoot_dir: None,
            is_shooting: false,
            last_updated: now,
            last_shot: f64::NEG_INFINITY,
        }
    }
}

/// Per-player latest input. This is a bare key-value store with no notion
/// of `EntityStore` — `set` always writes regardless of whether the
/// player exists there. The "unknown player is a no-op" contract is
/// enforced by the caller (`WorldSimulation::set_player_input`), not here.
#[derive(Debug, Default)]
pub struct InputBuffer {
    inputs: HashMap<String, PlayerInput>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        player_id: &str,
        move_dir: Option<Vec2>,
        shoot_dir: Option<Vec2>,
        is_shooting: bool,
        now: f64,
    ) {
        let entry = self
            .inputs
            .entry(player_id.to_string())
            .or_insert_with(|| PlayerInput::idle(now));
        if let Some(m) = move_dir {
            entry.move_dir = m;
        }
        entry.shoot_dir = shoot_dir;
        entry.is_shooting = is_shooting;
        entry.last_updated = now;
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerInput> {
        self.inputs.get(player_id)
    }

    pub fn get_mut(&mut self, player_id: &str) -> Option<&mut PlayerInput> {
        self.inputs.get_mut(player_id)
    }

    pub fn remove(&mut self, player_id: &str) {
        self.inputs.remove(player_id);
    }

    /// Players whose last input is older than `PLAYER_IDLE_TIMEOUT_SECS`.
    pub fn stale_players(&self, now: f64, timeout_secs: f64) -> Vec<String> {
        self.inputs
            .iter()
            .filter(|(_, input)| now - input.last_updated > timeout_secs)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
