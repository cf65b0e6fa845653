#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the tower defence engine.
//!
//! The world is the only place state changes. Callers feed it [`Command`]
//! values through [`apply`] and observe the outcome through the emitted
//! [`Event`] values and the read-only [`query`] module.

mod enemies;
mod navigation;
mod towers;
mod waves;

use tower_defence_core::{
    Catalog, CellCoord, Command, DifficultyLevel, DifficultyProfile, EnemyId, EnemyKind, EnemyTable,
    Event, GridSize, MapDefinition, PlacementError, RemovalError, Rules, TowerId, TowerKind,
    TowerTable, WaveStartError,
};
use tracing::{debug, info, trace};

use self::{enemies::EnemyRoster, navigation::PathField, towers::TowerRegistry, waves::WaveState};

/// Represents the authoritative tower defence world state.
#[derive(Debug)]
pub struct World {
    grid: GridSize,
    map: MapDefinition,
    walls: Vec<bool>,
    towers: TowerRegistry,
    enemies: EnemyRoster,
    field: PathField,
    waves: WaveState,
    tower_stats: TowerTable,
    enemy_stats: EnemyTable,
    difficulty: DifficultyProfile,
    rules: Rules,
    cash: f64,
    lives: u32,
    defeated: bool,
}

impl World {
    /// Creates a world for the map using the catalog tables and the
    /// starting resources of the difficulty level.
    #[must_use]
    pub fn new(catalog: &Catalog, map: MapDefinition, level: DifficultyLevel) -> Self {
        let grid = catalog.grid;
        let difficulty = *catalog.difficulty(level);

        let mut walls = vec![false; grid.cell_count()];
        for index in map.walls.iter().filter_map(|wall| grid.index(*wall)) {
            walls[index] = true;
        }

        let mut world = Self {
            grid,
            field: PathField::new(grid, map.exit),
            map,
            walls,
            towers: TowerRegistry::new(),
            enemies: EnemyRoster::new(),
            waves: WaveState::new(),
            tower_stats: catalog.towers.clone(),
            enemy_stats: catalog.enemies.clone(),
            difficulty,
            rules: catalog.rules,
            cash: f64::from(difficulty.starting_cash),
            lives: difficulty.starting_lives,
            defeated: false,
        };
        world.rebuild_field(None);
        world
    }

    fn is_wall(&self, cell: CellCoord) -> bool {
        self.grid
            .index(cell)
            .is_some_and(|index| self.walls[index])
    }

    fn path_invalid(&self) -> bool {
        !self.field.is_reachable(self.map.start)
    }

    /// Recomputes the path field, optionally treating one extra cell as blocked.
    fn rebuild_field(&mut self, tentative: Option<CellCoord>) {
        let Self {
            grid,
            walls,
            towers,
            field,
            ..
        } = self;

        field.recompute(|cell| {
            tentative == Some(cell)
                || towers.is_occupied(cell)
                || grid.index(cell).is_some_and(|index| walls[index])
        });
    }

    fn structural_error(&self, cell: CellCoord) -> Option<PlacementError> {
        if !self.grid.contains(cell) {
            Some(PlacementError::OutOfBounds)
        } else if self.is_wall(cell) {
            Some(PlacementError::Wall)
        } else if self.towers.is_occupied(cell) {
            Some(PlacementError::Occupied)
        } else if cell == self.map.start || cell == self.map.exit {
            Some(PlacementError::Reserved)
        } else {
            None
        }
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
    ) -> Result<(TowerId, u32), PlacementError> {
        if let Some(error) = self.structural_error(cell) {
            return Err(error);
        }

        let cost = self.tower_stats.get(kind).cost;
        if self.cash < f64::from(cost) {
            return Err(PlacementError::InsufficientCash);
        }

        self.rebuild_field(Some(cell));
        if self.path_invalid() {
            self.rebuild_field(None);
            return Err(PlacementError::SealsPath);
        }

        self.cash -= f64::from(cost);
        Ok((self.towers.insert(kind, cell), cost))
    }

    fn remove_tower(
        &mut self,
        cell: CellCoord,
    ) -> Result<(TowerId, TowerKind, f64), RemovalError> {
        let Some(tower) = self.towers.remove_at(cell) else {
            return Err(RemovalError::MissingTower);
        };

        let refund = f64::from(self.tower_stats.get(tower.kind).cost) * self.rules.refund_ratio;
        self.cash += refund;
        self.rebuild_field(None);
        Ok((tower.id, tower.kind, refund))
    }

    fn queue_wave(&mut self, entries: Vec<EnemyKind>) -> Result<(u32, u32), WaveStartError> {
        if self.lives == 0 || self.defeated {
            return Err(WaveStartError::Defeated);
        }
        if self.waves.is_spawning() {
            return Err(WaveStartError::WaveInProgress);
        }

        let air = entries.iter().filter(|kind| **kind == EnemyKind::Air).count();
        let ground = entries.len() - air;
        self.waves.begin(entries, self.rules.initial_spawn_delay);
        Ok((
            u32::try_from(ground).unwrap_or(u32::MAX),
            u32::try_from(air).unwrap_or(u32::MAX),
        ))
    }

    fn spawn_enemy(&mut self, out_events: &mut Vec<Event>) {
        if !self.waves.is_spawning() || self.waves.spawn_timer > 0.0 {
            return;
        }
        let Some(kind) = self.waves.queue.pop_front() else {
            return;
        };

        let stats = *self.enemy_stats.get(kind);
        let growth = 1.0 + self.rules.health_growth_per_wave * self.waves.wave as f32;
        let health = stats.base_health * growth * self.difficulty.health_multiplier;
        let speed = stats.base_speed * self.difficulty.speed_multiplier;
        let position = self.map.start.center();

        let enemy = self.enemies.spawn(kind, position, health, speed);
        self.waves.spawn_timer = self.rules.spawn_interval;
        trace!(enemy = enemy.get(), ?kind, health, "enemy spawned");
        out_events.push(Event::EnemySpawned {
            enemy,
            kind,
            position,
        });
    }

    fn resolve_enemies(&mut self, out_events: &mut Vec<Event>) {
        let exit_center = self.map.exit.center();
        let proximity = self.rules.exit_proximity;
        let reward = self.rules.kill_reward * self.difficulty.reward_multiplier;

        let Self {
            enemies,
            cash,
            lives,
            ..
        } = self;

        enemies.retain(|enemy| {
            if enemy.health <= 0.0 {
                *cash += reward;
                out_events.push(Event::EnemyKilled {
                    enemy: enemy.id,
                    reward,
                });
                false
            } else if enemy.position.distance(exit_center) < proximity {
                *lives = lives.saturating_sub(1);
                out_events.push(Event::EnemyEscaped {
                    enemy: enemy.id,
                    lives: *lives,
                });
                false
            } else {
                true
            }
        });

        if self.lives == 0 && !self.defeated {
            self.defeated = true;
            self.waves.abort();
            self.enemies.clear();
            info!(wave = self.waves.wave, "defeated");
            out_events.push(Event::Defeated {
                wave: self.waves.wave,
            });
        }
    }

    fn fire_tower(
        &mut self,
        tower: TowerId,
        target: EnemyId,
        pitch_hint: f32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.towers.get(tower) else {
            return;
        };
        if state.cooldown > 0.0 {
            return;
        }
        let kind = state.kind;
        let stats = *self.tower_stats.get(kind);

        let Some(impact) = self.enemies.get(target).map(|enemy| enemy.position) else {
            return;
        };

        if let Some(state) = self.towers.get_mut(tower) {
            state.cooldown = stats.fire_interval;
        }

        let slow_duration = self.rules.slow_duration;
        let mut struck = 0;
        for enemy in self.enemies.iter_mut() {
            let hit = if stats.splash_radius > 0.0 {
                enemy.position.distance(impact) <= stats.splash_radius
            } else {
                enemy.id == target
            };
            if !hit {
                continue;
            }

            enemy.health -= stats.damage;
            if stats.slow_factor > 0.0 {
                enemy.slow_timer = slow_duration;
            }
            struck += 1;
        }

        out_events.push(Event::ShotFired {
            tower,
            kind,
            target,
            struck,
            pitch_hint,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            let seconds = dt.as_secs_f32();
            if world.waves.is_spawning() {
                world.waves.spawn_timer -= seconds;
            }
            for tower in world.towers.iter_mut() {
                tower.cooldown -= seconds;
            }
            trace!(dt = seconds, "tick");
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::PlaceTower { kind, cell } => match world.place_tower(kind, cell) {
            Ok((tower, cost)) => {
                debug!(tower = tower.get(), ?kind, %cell, "tower placed");
                out_events.push(Event::TowerPlaced {
                    tower,
                    kind,
                    cell,
                    cost,
                });
            }
            Err(reason) => {
                debug!(?kind, %cell, ?reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected { kind, cell, reason });
            }
        },
        Command::RemoveTower { cell } => match world.remove_tower(cell) {
            Ok((tower, kind, refund)) => {
                debug!(tower = tower.get(), %cell, refund, "tower removed");
                out_events.push(Event::TowerRemoved {
                    tower,
                    kind,
                    cell,
                    refund,
                });
            }
            Err(reason) => {
                debug!(%cell, ?reason, "tower removal rejected");
                out_events.push(Event::TowerRemovalRejected { cell, reason });
            }
        },
        Command::QueueWave { entries } => match world.queue_wave(entries) {
            Ok((ground, air)) => {
                info!(wave = world.waves.wave, ground, air, "wave started");
                out_events.push(Event::WaveQueued {
                    wave: world.waves.wave,
                    ground,
                    air,
                });
            }
            Err(reason) => {
                debug!(?reason, "wave start rejected");
                out_events.push(Event::WaveStartRejected { reason });
            }
        },
        Command::SpawnEnemy => world.spawn_enemy(out_events),
        Command::CompleteWave => {
            if world.waves.is_spawning()
                && world.waves.queue.is_empty()
                && world.enemies.is_empty()
            {
                let wave = world.waves.complete();
                info!(wave, "wave completed");
                out_events.push(Event::WaveCompleted { wave });
            }
        }
        Command::AdvanceEnemy {
            enemy,
            position,
            elapsed,
        } => {
            if !position.is_finite() {
                return;
            }
            if let Some(state) = world.enemies.get_mut(enemy) {
                state.position = position;
                state.slow_timer = (state.slow_timer - elapsed.as_secs_f32()).max(0.0);
            }
        }
        Command::ResolveEnemies => world.resolve_enemies(out_events),
        Command::AssignTarget { tower, target, aim } => {
            if let Some(state) = world.towers.get_mut(tower) {
                let acquired = target.is_some() && state.target != target;
                state.target = target;
                state.aim = aim;
                if let (true, Some(enemy)) = (acquired, target) {
                    out_events.push(Event::TargetAcquired { tower, enemy, aim });
                }
            }
        }
        Command::FireTower {
            tower,
            target,
            pitch_hint,
        } => world.fire_tower(tower, target, pitch_hint, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tower_defence_core::{
        CellCoord, EnemyView, GridSize, MapDefinition, NavigationFieldView, Rules, TowerTable,
        TowerView, WaveView,
    };

    use super::World;

    /// Grid the world is laid out on.
    #[must_use]
    pub fn grid(world: &World) -> GridSize {
        world.grid
    }

    /// Map the world was created from.
    #[must_use]
    pub fn map(world: &World) -> &MapDefinition {
        &world.map
    }

    /// Simulation constants in effect.
    #[must_use]
    pub fn rules(world: &World) -> &Rules {
        &world.rules
    }

    /// Tower stat table in effect.
    #[must_use]
    pub fn tower_stats(world: &World) -> &TowerTable {
        &world.tower_stats
    }

    /// Currency available, including fractional refunds and rewards.
    #[must_use]
    pub fn cash(world: &World) -> f64 {
        world.cash
    }

    /// Lives remaining.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Reports whether the player ran out of lives.
    #[must_use]
    pub fn is_defeated(world: &World) -> bool {
        world.defeated
    }

    /// Reports whether the start cell has no route to the exit.
    #[must_use]
    pub fn is_path_invalid(world: &World) -> bool {
        world.path_invalid()
    }

    /// Reports whether a tower could structurally occupy the cell, ignoring
    /// cash and path connectivity.
    #[must_use]
    pub fn can_build_at(world: &World, cell: CellCoord) -> bool {
        world.structural_error(cell).is_none()
    }

    /// Captures the wave controller state.
    #[must_use]
    pub fn wave_view(world: &World) -> WaveView {
        WaveView {
            phase: world.waves.phase,
            wave: world.waves.wave,
            queued: world.waves.queue.len(),
            spawn_timer: world.waves.spawn_timer,
            live_enemies: world.enemies.len(),
            lives: world.lives,
        }
    }

    /// Captures a read-only view of the enemies on the map.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Captures a read-only view of the towers on the map.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Exposes the distance-to-exit field.
    #[must_use]
    pub fn navigation_view(world: &World) -> NavigationFieldView<'_> {
        world.field.view()
    }
}
