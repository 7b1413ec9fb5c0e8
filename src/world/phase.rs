//! The round state machine: Playing -> VictoryPause -> GameOver ->
//! Restarting.

use crate::config::{ENEMY_DEFEATED_COOLDOWN_SECS, GAME_OVER_DURATION_SECS, VICTORY_PAUSE_DURATION_SECS};
use crate::types::GamePhase;

#[derive(Debug, Clone)]
pub struct PlayerScore {
    pub player_id: String,
    pub player_name: String,
    pub damage_dealt: f64,
    pub deaths: u32,
}

#[derive(Debug)]
pub struct PhaseController {
    phase: GamePhase,
    /// Set the first tick `hostile_count` is observed at zero; cleared the
    /// first tick a hostile exists again.
    all_enemies_defeated: bool,
    last_enemy_death_time: f64,
    victory_pause_time: f64,
    game_over_time: f64,
    /// Chat marks already emitted this VictoryPause, to avoid repeats.
    emitted_marks: Vec<u64>,
}

impl Default for PhaseController {
    fn default() -> Self {
        Self {
            phase: GamePhase::Playing,
            all_enemies_defeated: false,
            last_enemy_death_time: 0.0,
            victory_pause_time: 0.0,
            game_over_time: 0.0,
            emitted_marks: Vec::new(),
        }
    }
}

/// What the phase controller wants the caller to do this tick, besides
/// the plain state transition: chat messages, notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseEffect {
    None,
    EnterVictoryPause { scores: Vec<(String, f64)> },
    ChatCountdown { seconds_remaining: u64 },
    EnterGameOver,
    EnterRestarting,
}

impl PhaseController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Called once per tick with the current hostile count. `score_fn`
    /// derives each player's `(id, damage_dealt)` tuple lazily, only
    /// invoked when entering VictoryPause.
    pub fn observe_hostiles(
        &mut self,
        hostile_count: usize,
        now: f64,
        score_fn: impl FnOnce() -> Vec<(String, f64)>,
    ) -> PhaseEffect {
        if !matches!(self.phase, GamePhase::Playing) {
            return PhaseEffect::None;
        }

        if hostile_count == 0 {
            if !self.all_enemies_defeated {
                self.all_enemies_defeated = true;
                self.last_enemy_death_time = now;
            }
        } else {
            self.all_enemies_defeated = false;
        }

        if self.all_enemies_defeated
            && now - self.last_enemy_death_time >= ENEMY_DEFEATED_COOLDOWN_SECS
        {
            self.phase = GamePhase::VictoryPause;
            self.victory_pause_time = now;
            self.emitted_marks.clear();
            return PhaseEffect::EnterVictoryPause {
                scores: score_fn(),
            };
        }

        PhaseEffect::None
    }

    /// Advances VictoryPause/GameOver timers. Call once per tick regardless
    /// of phase; returns an effect the caller should act on.
    pub fn tick_timers(&mut self, now: f64) -> PhaseEffect {
        match self.phase {
            GamePhase::VictoryPause => {
                let elapsed = now - self.victory_pause_time;
                let remaining = (VICTORY_PAUSE_DURATION_SECS - elapsed).ceil().max(0.0) as u64;
                for &mark in crate::config::VICTORY_PAUSE_CHAT_MARKS.iter() {
                    if remaining == mark && !self.emitted_marks.contains(&mark) {
                        self.emitted_marks.push(mark);
                        return PhaseEffect::ChatCountdown {
                            seconds_remaining: mark,
                        };
                    }
                }
                if elapsed >= VICTORY_PAUSE_DURATION_SECS {
                    self.phase = GamePhase::GameOver;
                    self.game_over_time = now;
                    return PhaseEffect::EnterGameOver;
                }
                PhaseEffect::None
            }
            GamePhase::GameOver => {
                if now - self.game_over_time >= GAME_OVER_DURATION_SECS {
                    return PhaseEffect::EnterRestarting;
                }
                PhaseEffect::None
            }
            _ => PhaseEffect::None,
        }
    }

    /// Called by the restart routine once it has repopulated the world.
    pub fn finish_restart(&mut self) {
        self.phase = GamePhase::Playing;
        self.all_enemies_defeated = false;
    }

    pub fn enter_restarting(&mut self) {
        self.phase = GamePhase::Restarting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn victory_pause_triggers_ten_seconds_after_last_kill() {
        let mut controller = PhaseController::new();
        assert_eq!(
            controller.observe_hostiles(1, 0.0, Vec::new),
            PhaseEffect::None
        );
        assert_eq!(
            controller.observe_hostiles(0, 1.0, Vec::new),
            PhaseEffect::None
        );
        assert_eq!(
            controller.observe_hostiles(0, 10.9, Vec::new),
            PhaseEffect::None
        );
        let effect = controller.observe_hostiles(0, 11.0, Vec::new);
        assert!(matches!(effect, PhaseEffect::EnterVictoryPause { .. }));
        assert!(matches!(controller.phase(), GamePhase::VictoryPause));
    }

    #[test]
    fn full_round_trip_advances_through_every_phase_on_schedule() {
        let mut controller = PhaseController::new();
        controller.observe_hostiles(0, 0.0, Vec::new);
        // t+10s: VictoryPause
        let effect = controller.observe_hostiles(0, 10.0, Vec::new);
        assert!(matches!(effect, PhaseEffect::EnterVictoryPause { .. }));

        // t+20s (10s into VictoryPause): GameOver
        let effect = controller.tick_timers(20.0);
        assert_eq!(effect, PhaseEffect::EnterGameOver);
        assert!(matches!(controller.phase(), GamePhase::GameOver));

        // t+35s (15s into GameOver): ready to restart
        let effect = controller.tick_timers(35.0);
        assert_eq!(effect, PhaseEffect::EnterRestarting);
    }

    #[test]
    fn hostile_reappearing_resets_the_defeated_flag() {
        let mut controller = PhaseController::new();
        controller.observe_hostiles(0, 0.0, Vec::new);
        controller.observe_hostiles(1, 1.0, Vec::new);
        let effect = controller.observe_hostiles(0, 5.0, Vec::new);
        // Cooldown timer should have restarted at t=5, not t=0.
        assert_eq!(effect, PhaseEffect::None);
        let effect = controller.observe_hostiles(0, 14.9, Vec::new);
        assert_eq!(effect, PhaseEffect::None);
    }
}
