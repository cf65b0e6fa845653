//! Enemy roster owned by the world.

use glam::Vec2;
use tower_defence_core::{EnemyId, EnemyKind, EnemySnapshot};

#[derive(Clone, Debug)]
pub(crate) struct EnemyState {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) position: Vec2,
    pub(crate) speed: f32,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) slow_timer: f32,
}

impl EnemyState {
    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            speed: self.speed,
            health: self.health,
            max_health: self.max_health,
            slow_timer: self.slow_timer,
        }
    }
}

/// Live enemies kept in spawn order.
#[derive(Debug)]
pub(crate) struct EnemyRoster {
    entries: Vec<EnemyState>,
    next_enemy_id: EnemyId,
}

impl EnemyRoster {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    /// Adds an enemy at the position and returns its identifier.
    pub(crate) fn spawn(
        &mut self,
        kind: EnemyKind,
        position: Vec2,
        health: f32,
        speed: f32,
    ) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        self.entries.push(EnemyState {
            id,
            kind,
            position,
            speed,
            health,
            max_health: health,
            slow_timer: 0.0,
        });
        id
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&EnemyState> {
        self.index_of(id).map(|index| &self.entries[index])
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut EnemyState> {
        self.index_of(id).map(move |index| &mut self.entries[index])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &EnemyState> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut EnemyState> {
        self.entries.iter_mut()
    }

    /// Removes every enemy for which the predicate returns `false`.
    pub(crate) fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&EnemyState) -> bool,
    {
        self.entries.retain(keep);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Identifiers increase in spawn order, so the roster stays sorted.
    fn index_of(&self, id: EnemyId) -> Option<usize> {
        self.entries.binary_search_by_key(&id, |enemy| enemy.id).ok()
    }
}
