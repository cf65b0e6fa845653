//! Data tables consumed by the simulation: maps, tower stats, enemy stats,
//! difficulty presets and tunable rules.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCoord, DifficultyLevel, EnemyKind, GridSize, TowerKind};

/// Combat statistics for a tower kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Purchase price.
    pub cost: u32,
    /// Targeting radius in cells, measured from the tower cell centre.
    pub range: f32,
    /// Damage applied per shot.
    pub damage: f32,
    /// Seconds between shots.
    pub fire_interval: f32,
    /// Slow strength; zero disables slowing.
    #[serde(default)]
    pub slow_factor: f32,
    /// Splash radius in cells; zero means single target.
    #[serde(default)]
    pub splash_radius: f32,
    /// Whether the tower may target air enemies.
    #[serde(default)]
    pub targets_air: bool,
}

/// Stat table covering every tower kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerTable {
    /// Gatling stats.
    pub gatling: TowerStats,
    /// Glue stats.
    pub glue: TowerStats,
    /// Missile stats.
    pub missile: TowerStats,
    /// Tesla stats.
    pub tesla: TowerStats,
}

impl TowerTable {
    /// Stats for the provided tower kind.
    #[must_use]
    pub fn get(&self, kind: TowerKind) -> &TowerStats {
        match kind {
            TowerKind::Gatling => &self.gatling,
            TowerKind::Glue => &self.glue,
            TowerKind::Missile => &self.missile,
            TowerKind::Tesla => &self.tesla,
        }
    }
}

impl Default for TowerTable {
    fn default() -> Self {
        Self {
            gatling: TowerStats {
                cost: 40,
                range: 2.8,
                damage: 8.0,
                fire_interval: 0.18,
                slow_factor: 0.0,
                splash_radius: 0.0,
                targets_air: false,
            },
            glue: TowerStats {
                cost: 35,
                range: 2.5,
                damage: 2.0,
                fire_interval: 0.9,
                slow_factor: 0.45,
                splash_radius: 0.0,
                targets_air: false,
            },
            missile: TowerStats {
                cost: 60,
                range: 3.6,
                damage: 16.0,
                fire_interval: 1.3,
                slow_factor: 0.0,
                splash_radius: 1.3,
                targets_air: true,
            },
            tesla: TowerStats {
                cost: 90,
                range: 2.3,
                damage: 45.0,
                fire_interval: 1.7,
                slow_factor: 0.0,
                splash_radius: 0.0,
                targets_air: true,
            },
        }
    }
}

/// Base statistics for an enemy kind before wave and difficulty scaling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Health at wave zero on baseline difficulty.
    pub base_health: f32,
    /// Speed in cells per second on baseline difficulty.
    pub base_speed: f32,
}

/// Stat table covering both enemy kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    /// Ground enemy stats.
    pub ground: EnemyStats,
    /// Air enemy stats.
    pub air: EnemyStats,
}

impl EnemyTable {
    /// Stats for the provided enemy kind.
    #[must_use]
    pub fn get(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Ground => &self.ground,
            EnemyKind::Air => &self.air,
        }
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            ground: EnemyStats {
                base_health: 70.0,
                base_speed: 1.15,
            },
            air: EnemyStats {
                base_health: 50.0,
                base_speed: 1.5,
            },
        }
    }
}

/// Starting resources and enemy scaling for a difficulty level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Cash available when the session starts.
    pub starting_cash: u32,
    /// Lives available when the session starts.
    pub starting_lives: u32,
    /// Multiplier applied to enemy health.
    pub health_multiplier: f32,
    /// Multiplier applied to enemy speed.
    pub speed_multiplier: f32,
    /// Multiplier applied to kill rewards.
    pub reward_multiplier: f64,
}

/// Difficulty presets keyed by level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTable {
    /// Fun preset.
    pub fun: DifficultyProfile,
    /// Easy preset.
    pub easy: DifficultyProfile,
    /// Normal preset.
    pub normal: DifficultyProfile,
    /// Hard preset.
    pub hard: DifficultyProfile,
}

impl DifficultyTable {
    /// Profile for the provided level.
    #[must_use]
    pub fn get(&self, level: DifficultyLevel) -> &DifficultyProfile {
        match level {
            DifficultyLevel::Fun => &self.fun,
            DifficultyLevel::Easy => &self.easy,
            DifficultyLevel::Normal => &self.normal,
            DifficultyLevel::Hard => &self.hard,
        }
    }
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            fun: DifficultyProfile {
                starting_cash: 260,
                starting_lives: 30,
                health_multiplier: 0.75,
                speed_multiplier: 0.9,
                reward_multiplier: 1.2,
            },
            easy: DifficultyProfile {
                starting_cash: 220,
                starting_lives: 25,
                health_multiplier: 0.9,
                speed_multiplier: 0.95,
                reward_multiplier: 1.05,
            },
            normal: DifficultyProfile {
                starting_cash: 200,
                starting_lives: 20,
                health_multiplier: 1.0,
                speed_multiplier: 1.0,
                reward_multiplier: 1.0,
            },
            hard: DifficultyProfile {
                starting_cash: 170,
                starting_lives: 16,
                health_multiplier: 1.2,
                speed_multiplier: 1.1,
                reward_multiplier: 0.9,
            },
        }
    }
}

/// Playable map layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    /// Display name.
    pub name: String,
    /// One-line flavour text.
    #[serde(default)]
    pub description: String,
    /// Cell enemies spawn on.
    pub start: CellCoord,
    /// Cell enemies try to reach.
    pub exit: CellCoord,
    /// Permanently blocked cells.
    #[serde(default)]
    pub walls: Vec<CellCoord>,
}

impl MapDefinition {
    fn from_pairs(
        name: &str,
        description: &str,
        start: (u32, u32),
        exit: (u32, u32),
        walls: &[(u32, u32)],
    ) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            start: CellCoord::new(start.0, start.1),
            exit: CellCoord::new(exit.0, exit.1),
            walls: walls
                .iter()
                .map(|&(column, row)| CellCoord::new(column, row))
                .collect(),
        }
    }

    /// Reports whether the cell is a wall of this map.
    #[must_use]
    pub fn is_wall(&self, cell: CellCoord) -> bool {
        self.walls.contains(&cell)
    }
}

/// Largest accepted `Rules::wave_base_size`.
pub const MAX_WAVE_BASE_SIZE: u32 = 10_000;
/// Largest accepted `Rules::wave_growth`.
pub const MAX_WAVE_GROWTH: u32 = 1_000;

/// Tunable simulation constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Seconds between consecutive spawns.
    pub spawn_interval: f32,
    /// Seconds before the first spawn of a wave.
    pub initial_spawn_delay: f32,
    /// Seconds a slow effect lasts after a hit.
    pub slow_duration: f32,
    /// Speed multiplier applied while slowed.
    pub slowed_speed_multiplier: f32,
    /// Distance from the exit centre at which an enemy escapes.
    pub exit_proximity: f32,
    /// Fraction of the cost refunded when a tower is removed.
    pub refund_ratio: f64,
    /// Base reward for a kill before the difficulty multiplier.
    pub kill_reward: f64,
    /// Ground enemies in wave zero.
    pub wave_base_size: u32,
    /// Extra ground enemies per wave.
    pub wave_growth: u32,
    /// Waves that pass before air enemies join.
    pub air_wave_delay: u32,
    /// Waves per additional air enemy.
    pub air_wave_period: u32,
    /// Fractional health increase per wave.
    pub health_growth_per_wave: f32,
    /// Largest frame delta integrated in one tick, in seconds.
    pub frame_delta_cap: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            spawn_interval: 0.6,
            initial_spawn_delay: 0.6,
            slow_duration: 1.5,
            slowed_speed_multiplier: 0.55,
            exit_proximity: 0.4,
            refund_ratio: 0.7,
            kill_reward: 8.0,
            wave_base_size: 8,
            wave_growth: 3,
            air_wave_delay: 2,
            air_wave_period: 3,
            health_growth_per_wave: 0.2,
            frame_delta_cap: 0.04,
        }
    }
}

/// Errors raised while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document is not valid TOML or does not match the catalog schema.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    /// The grid has no cells.
    #[error("grid must have at least one column and one row")]
    EmptyGrid,
    /// The catalog lists no maps.
    #[error("catalog must define at least one map")]
    NoMaps,
    /// A map references a cell outside the grid.
    #[error("map '{map}' references cell {cell} outside the grid")]
    OutOfBounds {
        /// Name of the offending map.
        map: String,
        /// Cell that lies outside the grid.
        cell: CellCoord,
    },
    /// A map places its start or exit on a wall.
    #[error("map '{map}' places its start or exit on a wall")]
    EndpointOnWall {
        /// Name of the offending map.
        map: String,
    },
    /// A map uses the same cell for start and exit.
    #[error("map '{map}' uses the same cell for start and exit")]
    StartIsExit {
        /// Name of the offending map.
        map: String,
    },
    /// The start of a map cannot reach its exit even without towers.
    #[error("map '{map}' has no route from start to exit")]
    Unreachable {
        /// Name of the offending map.
        map: String,
    },
    /// A tower stat is out of range.
    #[error("tower '{}' has invalid stats: {reason}", kind.name())]
    InvalidTower {
        /// Kind with the offending stats.
        kind: TowerKind,
        /// Description of the problem.
        reason: &'static str,
    },
    /// A simulation constant is out of range.
    #[error("invalid rules: {reason}")]
    InvalidRules {
        /// Description of the problem.
        reason: &'static str,
    },
    /// A difficulty profile is out of range.
    #[error("difficulty '{}' has invalid multipliers", level.name())]
    InvalidDifficulty {
        /// Level with the offending profile.
        level: DifficultyLevel,
    },
}

/// Complete set of data tables a session is created from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Grid every map is laid out on.
    pub grid: GridSize,
    /// Tower stats.
    pub towers: TowerTable,
    /// Enemy stats.
    pub enemies: EnemyTable,
    /// Difficulty presets.
    pub difficulties: DifficultyTable,
    /// Simulation constants.
    pub rules: Rules,
    /// Selectable maps in menu order.
    pub maps: Vec<MapDefinition>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// Built-in tables shipped with the game.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            grid: GridSize::new(15, 10),
            towers: TowerTable::default(),
            enemies: EnemyTable::default(),
            difficulties: DifficultyTable::default(),
            rules: Rules::default(),
            maps: builtin_maps(),
        }
    }

    /// Parses and validates a TOML catalog. Omitted sections keep their
    /// built-in values; a `maps` array replaces the built-in maps entirely.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(contents)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Map at the provided menu index.
    #[must_use]
    pub fn map(&self, index: usize) -> Option<&MapDefinition> {
        self.maps.get(index)
    }

    /// Stats for the provided tower kind.
    #[must_use]
    pub fn tower(&self, kind: TowerKind) -> &TowerStats {
        self.towers.get(kind)
    }

    /// Profile for the provided difficulty level.
    #[must_use]
    pub fn difficulty(&self, level: DifficultyLevel) -> &DifficultyProfile {
        self.difficulties.get(level)
    }

    /// Checks every table for values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.grid.cell_count() == 0 {
            return Err(CatalogError::EmptyGrid);
        }

        if self.maps.is_empty() {
            return Err(CatalogError::NoMaps);
        }

        for map in &self.maps {
            self.validate_map(map)?;
        }

        for kind in TowerKind::ALL {
            let stats = self.tower(kind);
            let reason = if !(stats.range > 0.0) {
                Some("range must be positive")
            } else if !(stats.fire_interval > 0.0) {
                Some("fire interval must be positive")
            } else if !(stats.damage >= 0.0) {
                Some("damage must not be negative")
            } else if !(stats.splash_radius >= 0.0) {
                Some("splash radius must not be negative")
            } else if !(0.0..1.0).contains(&stats.slow_factor) {
                Some("slow factor must lie in [0, 1)")
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(CatalogError::InvalidTower { kind, reason });
            }
        }

        for level in DifficultyLevel::ALL {
            let profile = self.difficulty(level);
            if !(profile.health_multiplier > 0.0)
                || !(profile.speed_multiplier > 0.0)
                || !(profile.reward_multiplier >= 0.0)
            {
                return Err(CatalogError::InvalidDifficulty { level });
            }
        }

        let rules = &self.rules;
        let non_negative = |value: f32| value >= 0.0 && value.is_finite();
        let reason = if !(rules.frame_delta_cap > 0.0 && rules.frame_delta_cap.is_finite()) {
            Some("frame delta cap must be positive")
        } else if !(non_negative(rules.spawn_interval) && non_negative(rules.initial_spawn_delay))
        {
            Some("spawn timings must not be negative")
        } else if !(rules.exit_proximity > 0.0 && rules.exit_proximity.is_finite()) {
            Some("exit proximity must be positive")
        } else if !(0.0..=1.0).contains(&rules.refund_ratio) {
            Some("refund ratio must lie in [0, 1]")
        } else if !non_negative(rules.slow_duration) {
            Some("slow duration must not be negative")
        } else if !(rules.slowed_speed_multiplier > 0.0 && rules.slowed_speed_multiplier <= 1.0) {
            Some("slowed speed multiplier must lie in (0, 1]")
        } else if !(rules.kill_reward >= 0.0 && rules.kill_reward.is_finite()) {
            Some("kill reward must not be negative")
        } else if !non_negative(rules.health_growth_per_wave) {
            Some("health growth must not be negative")
        } else if rules.wave_base_size > MAX_WAVE_BASE_SIZE {
            Some("wave base size is too large")
        } else if rules.wave_growth > MAX_WAVE_GROWTH {
            Some("wave growth is too large")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(CatalogError::InvalidRules { reason });
        }

        Ok(())
    }

    fn validate_map(&self, map: &MapDefinition) -> Result<(), CatalogError> {
        let out_of_bounds = [map.start, map.exit]
            .into_iter()
            .chain(map.walls.iter().copied())
            .find(|cell| !self.grid.contains(*cell));
        if let Some(cell) = out_of_bounds {
            return Err(CatalogError::OutOfBounds {
                map: map.name.clone(),
                cell,
            });
        }

        if map.start == map.exit {
            return Err(CatalogError::StartIsExit {
                map: map.name.clone(),
            });
        }

        let walls: BTreeSet<CellCoord> = map.walls.iter().copied().collect();
        if walls.contains(&map.start) || walls.contains(&map.exit) {
            return Err(CatalogError::EndpointOnWall {
                map: map.name.clone(),
            });
        }

        if !connected(self.grid, map.start, map.exit, &walls) {
            return Err(CatalogError::Unreachable {
                map: map.name.clone(),
            });
        }

        Ok(())
    }
}

fn connected(grid: GridSize, from: CellCoord, to: CellCoord, walls: &BTreeSet<CellCoord>) -> bool {
    let mut visited = vec![false; grid.cell_count()];
    let mut queue = VecDeque::from([from]);
    if let Some(index) = grid.index(from) {
        visited[index] = true;
    }

    while let Some(cell) = queue.pop_front() {
        if cell == to {
            return true;
        }

        for neighbor in grid.neighbors(cell) {
            if walls.contains(&neighbor) {
                continue;
            }
            let Some(index) = grid.index(neighbor) else {
                continue;
            };
            if visited[index] {
                continue;
            }
            visited[index] = true;
            queue.push_back(neighbor);
        }
    }

    false
}

fn builtin_maps() -> Vec<MapDefinition> {
    vec![
        MapDefinition::from_pairs(
            "Circuit Yard",
            "Long corridors with tight corners.",
            (0, 4),
            (14, 5),
            &[
                (3, 1),
                (3, 2),
                (3, 3),
                (3, 4),
                (3, 6),
                (3, 7),
                (3, 8),
                (6, 0),
                (6, 1),
                (6, 2),
                (6, 7),
                (6, 8),
                (6, 9),
                (9, 1),
                (9, 2),
                (9, 3),
                (9, 5),
                (9, 6),
                (9, 7),
                (12, 2),
                (12, 3),
                (12, 6),
                (12, 7),
            ],
        ),
        MapDefinition::from_pairs(
            "Split Lanes",
            "Wide open middle with narrow exits.",
            (0, 2),
            (14, 7),
            &[
                (4, 0),
                (4, 1),
                (4, 2),
                (4, 7),
                (4, 8),
                (4, 9),
                (10, 0),
                (10, 1),
                (10, 2),
                (10, 7),
                (10, 8),
                (10, 9),
                (7, 4),
                (7, 5),
                (7, 6),
            ],
        ),
        MapDefinition::from_pairs(
            "Forge Grid",
            "Chunky walls make creative mazes.",
            (2, 0),
            (12, 9),
            &[
                (1, 3),
                (2, 3),
                (3, 3),
                (11, 6),
                (12, 6),
                (13, 6),
                (5, 1),
                (5, 2),
                (5, 3),
                (5, 7),
                (5, 8),
                (9, 1),
                (9, 2),
                (9, 7),
                (9, 8),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.maps.len(), 3);
        assert_eq!(catalog.maps[0].name, "Circuit Yard");
        assert_eq!(catalog.maps[0].walls.len(), 23);
        assert_eq!(catalog.tower(TowerKind::Tesla).cost, 90);
        assert!(catalog.tower(TowerKind::Missile).targets_air);
        assert!(!catalog.tower(TowerKind::Glue).targets_air);
    }

    #[test]
    fn empty_document_yields_builtin_catalog() {
        let catalog = Catalog::from_toml_str("").expect("empty document parses");
        assert_eq!(catalog, Catalog::builtin());
    }

    #[test]
    fn partial_rules_override_keeps_other_defaults() {
        let catalog = Catalog::from_toml_str("[rules]\nspawn_interval = 0.25\n")
            .expect("rules override parses");
        assert!((catalog.rules.spawn_interval - 0.25).abs() < f32::EPSILON);
        assert!((catalog.rules.refund_ratio - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn unreachable_map_is_rejected() {
        let document = r#"
            grid = { columns = 3, rows = 3 }

            [[maps]]
            name = "Sealed"
            start = { column = 0, row = 0 }
            exit = { column = 2, row = 2 }
            walls = [
                { column = 1, row = 0 },
                { column = 1, row = 1 },
                { column = 1, row = 2 },
            ]
        "#;

        let error = Catalog::from_toml_str(document).expect_err("sealed map must fail");
        assert!(matches!(error, CatalogError::Unreachable { .. }), "{error}");
    }

    #[test]
    fn start_on_wall_is_rejected() {
        let mut catalog = Catalog::builtin();
        let start = catalog.maps[1].start;
        catalog.maps[1].walls.push(start);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::EndpointOnWall { .. })
        ));
    }

    #[test]
    fn non_positive_fire_interval_is_rejected() {
        let mut catalog = Catalog::builtin();
        catalog.towers.glue.fire_interval = 0.0;
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InvalidTower {
                kind: TowerKind::Glue,
                ..
            })
        ));
    }

    #[test]
    fn out_of_range_rules_are_rejected() {
        let documents = [
            "frame_delta_cap = 0.0",
            "spawn_interval = -0.5",
            "exit_proximity = inf",
            "refund_ratio = 1.5",
            "slow_duration = -1.0",
            "slow_duration = nan",
            "slowed_speed_multiplier = -0.2",
            "slowed_speed_multiplier = nan",
            "kill_reward = -8.0",
            "kill_reward = nan",
            "health_growth_per_wave = -0.1",
            "health_growth_per_wave = nan",
            "wave_base_size = 4294967295\nair_wave_delay = 0\nair_wave_period = 1",
            "wave_growth = 1001",
        ];

        for rules in documents {
            let error = Catalog::from_toml_str(&format!("[rules]\n{rules}\n"))
                .expect_err("out-of-range rule must fail");
            assert!(
                matches!(error, CatalogError::InvalidRules { .. }),
                "{rules}: {error}"
            );
        }
    }

    #[test]
    fn large_but_bounded_waves_are_accepted() {
        let document = "[rules]\nwave_base_size = 200\nwave_growth = 1000\n";
        let catalog = Catalog::from_toml_str(document).expect("bounded wave sizing parses");
        assert_eq!(catalog.rules.wave_base_size, 200);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let error = Catalog::from_toml_str("grid = [").expect_err("malformed toml");
        assert!(matches!(error, CatalogError::Parse(_)));
    }
}
