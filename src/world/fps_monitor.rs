//! Rolling 10-second frame-time window producing an observed tick rate.

use std::collections::VecDeque;

const WINDOW_SECS: f64 = 10.0;

#[derive(Debug, Default)]
pub struct FpsMonitor {
    /// (game_time, dt) samples within the last `WINDOW_SECS`.
    samples: VecDeque<(f64, f64)>,
}

impl FpsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, now: f64, dt: f64) {
        self.samples.push_back((now, dt));
        while let Some(&(t, _)) = self.samples.front() {
            if now - t > WINDOW_SECS {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Observed ticks-per-second averaged over the window.
    pub fn fps(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let span = self.samples.back().unwrap().0 - self.samples.front().unwrap().0;
        if span <= 0.0 {
            return 0.0;
        }
        (self.samples.len() - 1) as f64 / span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_reflects_evenly_spaced_samples() {
        let mut monitor = FpsMonitor::new();
        for i in 0..61 {
            monitor.record(i as f64 * (1.0 / 60.0), 1.0 / 60.0);
        }
        assert!((monitor.fps() - 60.0).abs() < 0.5);
    }

    #[test]
    fn old_samples_fall_out_of_the_window() {
        let mut monitor = FpsMonitor::new();
        monitor.record(0.0, 0.1);
        monitor.record(20.0, 0.1);
        assert_eq!(monitor.samples.len(), 1);
    }
}
