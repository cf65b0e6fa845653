#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement system that integrates enemy positions along the distance field.

use std::time::Duration;

use glam::Vec2;
use tower_defence_core::{
    CellCoord, Command, EnemyKind, EnemySnapshot, EnemyView, Event, NavigationFieldView, Rules,
};

/// Configuration parameters required to construct the movement system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    slowed_speed_multiplier: f32,
}

impl Config {
    /// Creates a configuration with the provided slowed speed multiplier.
    #[must_use]
    pub const fn new(slowed_speed_multiplier: f32) -> Self {
        Self {
            slowed_speed_multiplier,
        }
    }

    /// Extracts the movement parameters from the simulation rules.
    #[must_use]
    pub const fn from_rules(rules: &Rules) -> Self {
        Self::new(rules.slowed_speed_multiplier)
    }
}

/// Pure system that reacts to elapsed time and proposes new enemy positions.
#[derive(Debug)]
pub struct Movement {
    config: Config,
}

impl Movement {
    /// Creates a new movement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Consumes tick events and immutable views to emit one
    /// `Command::AdvanceEnemy` per enemy.
    ///
    /// Enemies without an improving neighbour keep their position but still
    /// receive a command so their slow timer runs down.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        navigation: NavigationFieldView<'_>,
        out: &mut Vec<Command>,
    ) {
        let elapsed = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);

        if elapsed.is_zero() {
            return;
        }

        let dt = elapsed.as_secs_f32();
        for enemy in enemies.iter() {
            let multiplier = if enemy.slow_timer > 0.0 {
                self.config.slowed_speed_multiplier
            } else {
                1.0
            };

            let position = match steering_goal(enemy, navigation) {
                Some(goal) => steer(enemy.position, goal, enemy.speed * multiplier * dt),
                None => enemy.position,
            };

            out.push(Command::AdvanceEnemy {
                enemy: enemy.id,
                position,
                elapsed,
            });
        }
    }
}

/// Point the enemy heads for during this tick.
fn steering_goal(enemy: &EnemySnapshot, navigation: NavigationFieldView<'_>) -> Option<Vec2> {
    let exit = navigation.exit();
    match enemy.kind {
        EnemyKind::Air => Some(exit.center()),
        EnemyKind::Ground => {
            let cell = navigation.grid().cell_at(enemy.position)?;
            if cell == exit {
                return Some(exit.center());
            }
            next_cell(cell, navigation).map(|next| next.center())
        }
    }
}

/// Neighbour with the strictly smallest distance below the current cell's.
///
/// Neighbours are inspected north, east, south, west; the first one wins a tie.
fn next_cell(cell: CellCoord, navigation: NavigationFieldView<'_>) -> Option<CellCoord> {
    let mut best = None;
    let mut best_distance = navigation.distance(cell);

    for neighbor in navigation.grid().neighbors(cell) {
        let distance = navigation.distance(neighbor);
        if distance < best_distance {
            best_distance = distance;
            best = Some(neighbor);
        }
    }

    best
}

fn steer(position: Vec2, goal: Vec2, step: f32) -> Vec2 {
    let direction = (goal - position).normalize_or_zero();
    position + direction * step
}

#[cfg(test)]
mod tests {
    use tower_defence_core::{EnemyId, GridSize, UNREACHABLE};

    use super::*;

    fn enemy(kind: EnemyKind, position: Vec2, slow_timer: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(0),
            kind,
            position,
            speed: 1.0,
            health: 10.0,
            max_health: 10.0,
            slow_timer,
        }
    }

    fn tick(millis: u64) -> Vec<Event> {
        vec![Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }]
    }

    fn advanced_position(command: &Command) -> Vec2 {
        match command {
            Command::AdvanceEnemy { position, .. } => *position,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn ties_resolve_to_the_first_neighbour_in_north_east_south_west_order() {
        // 3x3 with the exit in the bottom-right corner; from (1, 1) both east
        // and south are one hop away, so east wins.
        let grid = GridSize::new(3, 3);
        let distances = [4, 3, 2, 3, 2, 1, 2, 1, 0];
        let navigation = NavigationFieldView::new(grid, CellCoord::new(2, 2), &distances);

        assert_eq!(
            next_cell(CellCoord::new(1, 1), navigation),
            Some(CellCoord::new(2, 1))
        );
    }

    #[test]
    fn cells_without_an_improving_neighbour_stay_put() {
        let grid = GridSize::new(3, 1);
        let distances = [UNREACHABLE, UNREACHABLE, 0];
        let navigation = NavigationFieldView::new(grid, CellCoord::new(2, 0), &distances);
        let mut system = Movement::new(Config::new(0.55));
        let stuck = enemy(EnemyKind::Ground, Vec2::new(0.5, 0.5), 0.0);
        let mut out = Vec::new();

        system.handle(
            &tick(40),
            &EnemyView::from_snapshots(vec![stuck]),
            navigation,
            &mut out,
        );

        assert_eq!(out.len(), 1, "stuck enemies still receive a command");
        assert_eq!(advanced_position(&out[0]), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn slowed_enemies_move_at_reduced_speed() {
        let grid = GridSize::new(3, 1);
        let distances = [2, 1, 0];
        let navigation = NavigationFieldView::new(grid, CellCoord::new(2, 0), &distances);
        let mut system = Movement::new(Config::new(0.5));
        let mut out = Vec::new();

        system.handle(
            &tick(500),
            &EnemyView::from_snapshots(vec![enemy(EnemyKind::Ground, Vec2::new(0.5, 0.5), 1.0)]),
            navigation,
            &mut out,
        );

        assert_eq!(advanced_position(&out[0]), Vec2::new(0.75, 0.5));
    }

    #[test]
    fn air_enemies_fly_straight_over_blocked_cells() {
        let grid = GridSize::new(3, 3);
        let distances = [UNREACHABLE; 9];
        let navigation = NavigationFieldView::new(grid, CellCoord::new(2, 2), &distances);
        let mut system = Movement::new(Config::new(0.55));
        let mut out = Vec::new();

        system.handle(
            &tick(1000),
            &EnemyView::from_snapshots(vec![enemy(EnemyKind::Air, Vec2::new(0.5, 0.5), 0.0)]),
            navigation,
            &mut out,
        );

        let position = advanced_position(&out[0]);
        let expected = Vec2::new(0.5, 0.5) + Vec2::ONE.normalize();
        assert!((position - expected).length() < 1e-5);
    }

    #[test]
    fn nothing_moves_without_elapsed_time() {
        let grid = GridSize::new(2, 1);
        let distances = [1, 0];
        let navigation = NavigationFieldView::new(grid, CellCoord::new(1, 0), &distances);
        let mut system = Movement::new(Config::new(0.55));
        let mut out = Vec::new();

        system.handle(
            &[],
            &EnemyView::from_snapshots(vec![enemy(EnemyKind::Ground, Vec2::new(0.5, 0.5), 0.0)]),
            navigation,
            &mut out,
        );

        assert!(out.is_empty());
    }
}
