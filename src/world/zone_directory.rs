//! Locally cached set of grid squares currently backed by some server.
//! Refreshed every `ZONE_DIRECTORY_CACHE_TTL_SECS`.

use std::collections::HashSet;

use crate::config::ZONE_DIRECTORY_CACHE_TTL_SECS;
use crate::types::GridSquare;

#[derive(Debug, Default)]
pub struct ZoneDirectoryCache {
    available: HashSet<GridSquare>,
    last_refreshed: f64,
}

impl ZoneDirectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(squares: impl IntoIterator<Item = GridSquare>) -> Self {
        Self {
            available: squares.into_iter().collect(),
            last_refreshed: 0.0,
        }
    }

    pub fn available(&self, zone: GridSquare) -> bool {
        self.available.contains(&zone)
    }

    pub fn is_stale(&self, now: f64) -> bool {
        now - self.last_refreshed >= ZONE_DIRECTORY_CACHE_TTL_SECS
    }

    pub fn replace(&mut self, squares: impl IntoIterator<Item = GridSquare>, now: f64) {
        self.available = squares.into_iter().collect();
        self.last_refreshed = now;
    }

    pub fn insert(&mut self, square: GridSquare) {
        self.available.insert(square);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cache_is_stale_until_first_replace() {
        let cache = ZoneDirectoryCache::new();
        assert!(cache.is_stale(0.0));
    }

    #[test]
    fn replace_updates_membership_and_freshness() {
        let mut cache = ZoneDirectoryCache::new();
        cache.replace([GridSquare::new(0, 0), GridSquare::new(1, 0)], 5.0);
        assert!(cache.available(GridSquare::new(1, 0)));
        assert!(!cache.available(GridSquare::new(2, 0)));
        assert!(!cache.is_stale(6.0));
        assert!(cache.is_stale(15.1));
    }
}
