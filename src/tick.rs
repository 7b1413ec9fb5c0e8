//! Fixed-step driver loop around a `WorldSimulation`.

use std::time::{Duration, Instant};

use tracing::info;

use crate::config::TICK_INTERVAL_MS;
use crate::world::WorldSimulation;

pub struct TickLoop {
    sim: WorldSimulation,
}

impl TickLoop {
    pub fn new(sim: WorldSimulation) -> Self {
        Self { sim }
    }

    /// Runs ticks at roughly `TICK_RATE_HZ` until ctrl-c, measuring the
    /// actual wall-clock gap between ticks rather than assuming the
    /// configured interval was hit exactly — `observed_fps` only means
    /// anything if `dt` reflects real scheduler behaviour. Each tick's
    /// effects are dispatched as detached tasks immediately after the
    /// synchronous tick returns, never awaited inline.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        let mut last_fps_log = 0.0;
        let mut last_tick_at = Instant::now();

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut shutdown => {
                    info!("shutdown signal received, stopping tick loop");
                    break;
                }
            }

            let now_instant = Instant::now();
            let dt = (now_instant - last_tick_at).as_secs_f64();
            last_tick_at = now_instant;

            let effects = self.sim.tick(dt);
            self.sim.dispatch(effects);

            let now = self.sim.game_time;
            if now - last_fps_log >= 10.0 {
                last_fps_log = now;
                info!(zone = ?self.sim.assigned_zone, fps = self.sim.observed_fps(), "tick rate");
            }
        }
    }
}
