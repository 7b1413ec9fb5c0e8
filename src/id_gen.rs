//! Server-spawned entity id allocation: `<kind>_<zx>_<zy>_<epoch>_<counter>`.
//!
//! The `restart_epoch` component guards against id collisions across round
//! restarts recycling the same counter range.

use crate::types::GridSquare;

#[derive(Debug, Default)]
pub struct IdGen {
    zone: Option<GridSquare>,
    restart_epoch: u32,
    counter: u64,
}

impl IdGen {
    pub fn new(zone: GridSquare) -> Self {
        Self {
            zone: Some(zone),
            restart_epoch: 0,
            counter: 0,
        }
    }

    pub fn bump_restart_epoch(&mut self) {
        self.restart_epoch += 1;
    }

    pub fn next(&mut self, kind: &str) -> String {
        let zone = self.zone.unwrap_or(GridSquare::new(0, 0));
        self.counter += 1;
        format!(
            "{kind}_{}_{}_{}_{}",
            zone.x, zone.y, self.restart_epoch, self.counter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_embed_the_zone() {
        let mut gen = IdGen::new(GridSquare::new(2, -1));
        let a = gen.next("bullet");
        let b = gen.next("bullet");
        assert_ne!(a, b);
        assert!(a.starts_with("bullet_2_-1_0_"));
    }

    #[test]
    fn bumping_epoch_changes_subsequent_ids() {
        let mut gen = IdGen::new(GridSquare::new(0, 0));
        let before = gen.next("enemy");
        gen.bump_restart_epoch();
        let after = gen.next("enemy");
        assert_ne!(before, after);
        assert!(after.contains("_1_"));
    }
}
