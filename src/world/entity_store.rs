//! Indexed collection of live entities, keyed by `EntityId`.
//!
//! The tick loop is the sole mutator; RPC handlers that need to mutate
//! (`AddPlayer`, `TransferEntityIn`, ...) run on the same owning task
//! between ticks, so a plain `HashMap` is sufficient.

use std::collections::HashMap;

use crate::entity::{Entity, EntityId, EntitySnapshot};
use crate::types::EntityType;

#[derive(Debug, Default)]
pub struct EntityStore {
    entities: HashMap<EntityId, Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    pub fn remove(&mut self, id: &str) -> Option<Entity> {
        self.entities.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn ids_of_kind(&self, kind: EntityType) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.kind == kind)
            .map(|e| e.id.clone())
            .collect()
    }

    /// Retains only entities for which `keep` returns `true`; used by
    /// cleanup passes.
    pub fn retain(&mut self, mut keep: impl FnMut(&Entity) -> bool) {
        self.entities.retain(|_, e| keep(e));
    }

    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.entities.values().map(EntitySnapshot::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec2;

    fn make(id: &str, kind: EntityType) -> Entity {
        Entity::new(id.to_string(), kind, 0, Vec2::ZERO)
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut store = EntityStore::new();
        store.insert(make("p1", EntityType::Player));
        assert!(store.contains("p1"));
        assert_eq!(store.get("p1").unwrap().kind, EntityType::Player);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = EntityStore::new();
        store.insert(make("b1", EntityType::Bullet));
        assert!(store.remove("b1").is_some());
        assert!(store.remove("b1").is_none());
    }

    #[test]
    fn retain_drops_entities_failing_predicate() {
        let mut store = EntityStore::new();
        store.insert(make("a", EntityType::Enemy));
        store.insert(make("b", EntityType::Enemy));
        store.retain(|e| e.id != "a");
        assert!(!store.contains("a"));
        assert!(store.contains("b"));
    }
}
