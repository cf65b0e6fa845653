#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that keeps or reacquires tower targets from world snapshots.

use glam::Vec2;
use tower_defence_core::{
    EnemyId, EnemyKind, EnemySnapshot, EnemyView, TowerId, TowerTable, TowerTarget, TowerView,
};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    tower_workspace: Vec<TowerWorkspace>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes one targeting decision per tower.
    ///
    /// A held target survives while it exists and stays within range.
    /// Otherwise every enemy is scanned in spawn order and the one needing the
    /// least rotation from the current aim wins; earlier enemies win ties.
    /// The output buffer is cleared before populating it.
    pub fn handle(
        &mut self,
        towers: &TowerView,
        enemies: &EnemyView,
        stats: &TowerTable,
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();
        self.prepare_tower_workspace(towers, stats);

        for tower in &self.tower_workspace {
            let held = tower
                .held
                .and_then(|id| enemies.get(id))
                .filter(|enemy| tower.in_range(enemy));

            if let Some(enemy) = held {
                out.push(TowerTarget {
                    tower: tower.id,
                    enemy: Some(enemy.id),
                    aim: tower.aim,
                    changed: false,
                });
                continue;
            }

            let mut best: Option<BestCandidate> = None;
            for enemy in enemies.iter() {
                if enemy.kind == EnemyKind::Air && !tower.targets_air {
                    continue;
                }
                if !tower.in_range(enemy) {
                    continue;
                }

                let bearing = bearing(tower.center, enemy.position);
                let current = BestCandidate {
                    enemy: enemy.id,
                    bearing,
                    rotation: rotation_between(tower.aim, bearing),
                };

                match &mut best {
                    Some(existing) => {
                        if current.precedes(existing) {
                            *existing = current;
                        }
                    }
                    None => best = Some(current),
                }
            }

            out.push(match best {
                Some(candidate) => TowerTarget {
                    tower: tower.id,
                    enemy: Some(candidate.enemy),
                    aim: candidate.bearing,
                    changed: true,
                },
                None => TowerTarget {
                    tower: tower.id,
                    enemy: None,
                    aim: tower.aim,
                    changed: tower.held.is_some(),
                },
            });
        }
    }

    fn prepare_tower_workspace(&mut self, towers: &TowerView, stats: &TowerTable) {
        self.tower_workspace.clear();
        for snapshot in towers.iter() {
            let tower_stats = stats.get(snapshot.kind);
            self.tower_workspace.push(TowerWorkspace {
                id: snapshot.id,
                center: snapshot.cell.center(),
                range: tower_stats.range,
                targets_air: tower_stats.targets_air,
                aim: snapshot.aim,
                held: snapshot.target,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TowerWorkspace {
    id: TowerId,
    center: Vec2,
    range: f32,
    targets_air: bool,
    aim: f32,
    held: Option<EnemyId>,
}

impl TowerWorkspace {
    fn in_range(&self, enemy: &EnemySnapshot) -> bool {
        enemy.position.distance(self.center) <= self.range
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    enemy: EnemyId,
    bearing: f32,
    rotation: f32,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        self.rotation < other.rotation
    }
}

fn bearing(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

/// Absolute rotation between two headings, wrapped into `[0, π]`.
fn rotation_between(aim: f32, bearing: f32) -> f32 {
    let difference = bearing - aim;
    difference.sin().atan2(difference.cos()).abs()
}
