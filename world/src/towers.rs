//! Authoritative tower state management utilities.

use std::collections::BTreeMap;

use tower_defence_core::{CellCoord, EnemyId, TowerId, TowerKind, TowerSnapshot};

/// State of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) cell: CellCoord,
    /// Seconds until the next shot; may go negative while idle.
    pub(crate) cooldown: f32,
    pub(crate) aim: f32,
    pub(crate) target: Option<EnemyId>,
}

impl TowerState {
    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            cell: self.cell,
            aim: self.aim,
            target: self.target,
            cooldown: self.cooldown,
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    by_cell: BTreeMap<CellCoord, TowerId>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            by_cell: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores a new tower on the cell and returns its identifier.
    pub(crate) fn insert(&mut self, kind: TowerKind, cell: CellCoord) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));

        let _ = self.by_cell.insert(cell, id);
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                kind,
                cell,
                cooldown: 0.0,
                aim: 0.0,
                target: None,
            },
        );
        id
    }

    /// Removes the tower occupying the cell, if any.
    pub(crate) fn remove_at(&mut self, cell: CellCoord) -> Option<TowerState> {
        let id = self.by_cell.remove(&cell)?;
        self.entries.remove(&id)
    }

    pub(crate) fn is_occupied(&self, cell: CellCoord) -> bool {
        self.by_cell.contains_key(&cell)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    /// Towers in placement order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }
}
