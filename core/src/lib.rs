#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tower defence engine.
//!
//! This crate defines the message surface that connects the engine, the
//! authoritative world, and pure systems. The engine submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values. Systems
//! query immutable views and respond exclusively with new command batches.

use std::{fmt, str::FromStr, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod catalog;

pub use catalog::{
    Catalog, CatalogError, DifficultyProfile, DifficultyTable, EnemyStats, EnemyTable,
    MapDefinition, Rules, TowerStats, TowerTable, MAX_WAVE_BASE_SIZE, MAX_WAVE_GROWTH,
};

/// Distance recorded for cells that cannot reach the exit.
pub const UNREACHABLE: u32 = u32::MAX;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests placement of a tower on the provided cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Cell the tower should occupy.
        cell: CellCoord,
    },
    /// Requests removal of the tower occupying the provided cell.
    RemoveTower {
        /// Cell holding the tower to remove.
        cell: CellCoord,
    },
    /// Requests that the world begin spawning a wave made of the given entries.
    QueueWave {
        /// Enemy kinds to spawn, in spawn order.
        entries: Vec<EnemyKind>,
    },
    /// Requests that the head of the spawn queue enter the map.
    SpawnEnemy,
    /// Requests that the active wave be closed and the wave counter advanced.
    CompleteWave,
    /// Moves an enemy to a new position after integrating one tick.
    AdvanceEnemy {
        /// Identifier of the enemy being moved.
        enemy: EnemyId,
        /// Position the enemy occupies after the tick.
        position: Vec2,
        /// Time integrated by the step, consumed from the enemy's slow timer.
        elapsed: Duration,
    },
    /// Removes dead and escaped enemies and applies their outcomes.
    ResolveEnemies,
    /// Updates the target held by a tower.
    AssignTarget {
        /// Tower whose target changes.
        tower: TowerId,
        /// Enemy the tower should track, or `None` to clear it.
        target: Option<EnemyId>,
        /// Aim direction in radians after the update.
        aim: f32,
    },
    /// Requests that a tower fire at its target.
    FireTower {
        /// Tower that fires.
        tower: TowerId,
        /// Enemy struck by the shot.
        target: EnemyId,
        /// Pitch suggestion forwarded to audio collaborators, in hertz.
        pitch_hint: f32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a wave started spawning.
    WaveQueued {
        /// Wave number that started.
        wave: u32,
        /// Number of ground enemies queued.
        ground: u32,
        /// Number of air enemies queued.
        air: u32,
    },
    /// Reports that a wave start request was ignored.
    WaveStartRejected {
        /// Specific reason the request was ignored.
        reason: WaveStartError,
    },
    /// Confirms that an enemy entered the map.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Movement class of the enemy.
        kind: EnemyKind,
        /// Position the enemy spawned at.
        position: Vec2,
    },
    /// Announces that every enemy of a wave was resolved.
    WaveCompleted {
        /// Wave number that completed.
        wave: u32,
    },
    /// Confirms that an enemy died and paid out its reward.
    EnemyKilled {
        /// Identifier of the enemy that died.
        enemy: EnemyId,
        /// Currency credited for the kill.
        reward: f64,
    },
    /// Reports that an enemy reached the exit.
    EnemyEscaped {
        /// Identifier of the enemy that escaped.
        enemy: EnemyId,
        /// Lives remaining after the escape.
        lives: u32,
    },
    /// Announces that the player ran out of lives.
    Defeated {
        /// Wave that was running when the defeat happened.
        wave: u32,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Cell occupied by the tower.
        cell: CellCoord,
        /// Currency deducted for the tower.
        cost: u32,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was removed from the world.
    TowerRemoved {
        /// Identifier of the tower that was removed.
        tower: TowerId,
        /// Type of the removed tower.
        kind: TowerKind,
        /// Cell previously occupied by the tower.
        cell: CellCoord,
        /// Currency refunded for the removal.
        refund: f64,
    },
    /// Reports that a tower removal request was rejected.
    TowerRemovalRejected {
        /// Cell provided in the removal request.
        cell: CellCoord,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Reports that a tower locked onto a new enemy.
    TargetAcquired {
        /// Tower that acquired the target.
        tower: TowerId,
        /// Enemy that is now tracked.
        enemy: EnemyId,
        /// Aim direction in radians pointing at the enemy.
        aim: f32,
    },
    /// Reports that a tower fired.
    ShotFired {
        /// Tower that fired.
        tower: TowerId,
        /// Type of the tower that fired.
        kind: TowerKind,
        /// Enemy the shot was aimed at.
        target: EnemyId,
        /// Number of enemies damaged by the shot.
        struck: u32,
        /// Pitch suggestion forwarded to audio collaborators, in hertz.
        pitch_hint: f32,
    },
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Centre of the cell in continuous cell-fractional coordinates.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Dimensions of the rectangular cell grid every map is laid out on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    columns: u32,
    rows: u32,
}

impl GridSize {
    /// Creates a new grid description.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.columns) * u64::from(self.rows);
        usize::try_from(count).unwrap_or(0)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Row-major storage index of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }

        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Cell containing the continuous point, if it lies inside the grid.
    #[must_use]
    pub fn cell_at(&self, point: Vec2) -> Option<CellCoord> {
        if !point.x.is_finite() || !point.y.is_finite() || point.x < 0.0 || point.y < 0.0 {
            return None;
        }

        let cell = CellCoord::new(point.x.floor() as u32, point.y.floor() as u32);
        self.contains(cell).then_some(cell)
    }

    /// Axis-aligned neighbours of the cell in north, east, south, west order.
    ///
    /// Cells outside the grid are skipped, so edge cells yield fewer than four
    /// neighbours. The order is part of the contract: ground movement breaks
    /// distance ties by taking the first neighbour produced here.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> {
        let mut candidates = [None; 4];
        let mut count = 0;

        if let Some(row) = cell.row().checked_sub(1) {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }

        if let Some(column) = cell.column().checked_add(1) {
            if column < self.columns {
                candidates[count] = Some(CellCoord::new(column, cell.row()));
                count += 1;
            }
        }

        if let Some(row) = cell.row().checked_add(1) {
            if row < self.rows {
                candidates[count] = Some(CellCoord::new(cell.column(), row));
                count += 1;
            }
        }

        if let Some(column) = cell.column().checked_sub(1) {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }

        candidates.into_iter().take(count).flatten()
    }
}

/// Unique identifier assigned to an enemy, increasing in spawn order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Movement class of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    /// Walks along the distance field and is blocked by walls and towers.
    Ground,
    /// Flies straight at the exit, ignoring walls and towers.
    Air,
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TowerKind {
    /// Rapid-fire single-target tower.
    Gatling,
    /// Weak tower that slows what it hits.
    Glue,
    /// Slow splash-damage tower able to hit air.
    Missile,
    /// Heavy single-target tower able to hit air.
    Tesla,
}

impl TowerKind {
    /// Every tower kind in build-menu order.
    pub const ALL: [TowerKind; 4] = [Self::Gatling, Self::Glue, Self::Missile, Self::Tesla];

    /// Lowercase identifier used in configuration files and the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gatling => "gatling",
            Self::Glue => "glue",
            Self::Missile => "missile",
            Self::Tesla => "tesla",
        }
    }
}

impl FromStr for TowerKind {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseKindError::Tower(value.to_owned()))
    }
}

/// Selectable difficulty presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    /// Generous cash and lives with weaker enemies.
    Fun,
    /// Slightly softened enemies.
    Easy,
    /// Baseline tuning.
    #[default]
    Normal,
    /// Tougher, faster enemies and smaller rewards.
    Hard,
}

impl DifficultyLevel {
    /// Every difficulty level in menu order.
    pub const ALL: [DifficultyLevel; 4] = [Self::Fun, Self::Easy, Self::Normal, Self::Hard];

    /// Lowercase identifier used in configuration files and the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fun => "fun",
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseKindError::Difficulty(value.to_owned()))
    }
}

/// Failure to parse a tower kind or difficulty identifier.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseKindError {
    /// The string does not name a tower kind.
    #[error("unknown tower kind '{0}' (expected gatling, glue, missile or tesla)")]
    Tower(String),
    /// The string does not name a difficulty level.
    #[error("unknown difficulty '{0}' (expected fun, easy, normal or hard)")]
    Difficulty(String),
}

/// Lifecycle phase of the wave controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// No wave is running; a new one may be started.
    #[default]
    Idle,
    /// Enemies are queued or still alive.
    Spawning,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell is a map wall.
    Wall,
    /// The requested cell already holds a tower.
    Occupied,
    /// The requested cell is the start or the exit.
    Reserved,
    /// The player cannot afford the tower.
    InsufficientCash,
    /// The tower would cut the start off from the exit.
    SealsPath,
}

/// Reasons a tower removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// No tower occupies the requested cell.
    MissingTower,
}

/// Reasons a wave start request may be ignored by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveStartError {
    /// A wave is already spawning or has enemies alive.
    WaveInProgress,
    /// The player has no lives left.
    Defeated,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Movement class of the enemy.
    pub kind: EnemyKind,
    /// Continuous position in cell-fractional coordinates.
    pub position: Vec2,
    /// Movement speed in cells per second before slow effects.
    pub speed: f32,
    /// Remaining health.
    pub health: f32,
    /// Health the enemy spawned with.
    pub max_health: f32,
    /// Seconds of slow effect remaining.
    pub slow_timer: f32,
}

impl EnemySnapshot {
    /// Fraction of health remaining, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }
}

/// Read-only snapshot describing all enemies on the map.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up an enemy by identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// Aim direction in radians.
    pub aim: f32,
    /// Enemy currently tracked by the tower, which may no longer exist.
    pub target: Option<EnemyId>,
    /// Seconds until the tower may fire again; zero or negative means ready.
    pub cooldown: f32,
}

/// Targeting decision computed for a single tower during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower the decision applies to.
    pub tower: TowerId,
    /// Enemy the tower tracks after the decision, if any.
    pub enemy: Option<EnemyId>,
    /// Aim direction in radians after the decision.
    pub aim: f32,
    /// Whether the decision differs from the state the tower held.
    pub changed: bool,
}

impl TowerTarget {
    /// Command that records the decision in the world, if it changed anything.
    #[must_use]
    pub fn assignment(&self) -> Option<Command> {
        self.changed.then_some(Command::AssignTarget {
            tower: self.tower,
            target: self.enemy,
            aim: self.aim,
        })
    }
}

/// Read-only snapshot describing all towers placed on the map.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a tower by identifier.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Read-only summary of the wave controller state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveView {
    /// Current lifecycle phase.
    pub phase: WavePhase,
    /// Wave number that is running, or that will run next when idle.
    pub wave: u32,
    /// Entries still waiting in the spawn queue.
    pub queued: usize,
    /// Seconds until the next spawn; zero or negative means due.
    pub spawn_timer: f32,
    /// Enemies currently alive on the map.
    pub live_enemies: usize,
    /// Lives remaining.
    pub lives: u32,
}

/// Read-only view into the distance-to-exit field.
#[derive(Clone, Copy, Debug)]
pub struct NavigationFieldView<'a> {
    grid: GridSize,
    exit: CellCoord,
    distances: &'a [u32],
}

impl<'a> NavigationFieldView<'a> {
    /// Captures a new navigation view backed by the provided distance slice.
    #[must_use]
    pub fn new(grid: GridSize, exit: CellCoord, distances: &'a [u32]) -> Self {
        Self {
            grid,
            exit,
            distances,
        }
    }

    /// Grid the field was computed for.
    #[must_use]
    pub const fn grid(&self) -> GridSize {
        self.grid
    }

    /// Exit cell the field is seeded from.
    #[must_use]
    pub const fn exit(&self) -> CellCoord {
        self.exit
    }

    /// Hop count from the cell to the exit; [`UNREACHABLE`] for blocked or
    /// cut-off cells and for cells outside the grid.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> u32 {
        self.grid
            .index(cell)
            .and_then(|index| self.distances.get(index).copied())
            .unwrap_or(UNREACHABLE)
    }

    /// Dense distances stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &'a [u32] {
        self.distances
    }
}
