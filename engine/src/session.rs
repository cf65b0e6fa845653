//! Lobby selections, the running session and its per-frame pipeline.

use std::time::Duration;

use glam::Vec2;
use serde::Serialize;
use tower_defence_core::{
    Catalog, CatalogError, CellCoord, Command, DifficultyLevel, EnemyId, EnemyKind, Event,
    MapDefinition, TowerKind, TowerSnapshot, TowerTarget, WavePhase,
};
use tower_defence_system_movement::{self as movement, Movement};
use tower_defence_system_spawning::{self as spawning, Spawning};
use tower_defence_system_tower_combat::TowerCombat;
use tower_defence_system_tower_targeting::TowerTargeting;
use tower_defence_world::{self as world, query, World};
use tracing::{debug, trace};

use crate::FrameClock;

/// Pitch, in hertz, of the cue played when a tower is placed.
pub const PLACEMENT_TONE_HZ: f32 = 640.0;

const DEFAULT_SEED: u64 = 0x7d_5eed;

/// Discrete sound the host may play.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum AudioCue {
    /// A tower was placed successfully.
    TowerPlaced,
    /// A tower fired.
    ShotFired {
        /// Suggested tone in hertz.
        pitch: f32,
    },
}

impl AudioCue {
    /// Tone in hertz the cue should be played at.
    #[must_use]
    pub fn pitch(&self) -> f32 {
        match self {
            Self::TowerPlaced => PLACEMENT_TONE_HZ,
            Self::ShotFired { pitch } => *pitch,
        }
    }
}

/// Values shown on the heads-up display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HudState {
    /// Whole currency units available.
    pub cash: u64,
    /// Lives remaining.
    pub lives: u32,
    /// Wave number that is running, or that will run next.
    pub wave: u32,
    /// Whether the start cell has no route to the exit.
    pub path_invalid: bool,
    /// Whether the pipeline is suspended.
    pub paused: bool,
    /// Whether the player ran out of lives.
    pub defeated: bool,
    /// Whether a wave is currently running.
    pub wave_active: bool,
}

/// Enemy state prepared for drawing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnemyFrame {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Movement class.
    pub kind: EnemyKind,
    /// Continuous position in cell-fractional coordinates.
    pub position: Vec2,
    /// Fraction of health remaining.
    pub health_ratio: f32,
    /// Whether a slow effect is active.
    pub slowed: bool,
}

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameSnapshot {
    /// Heads-up display values.
    pub hud: HudState,
    /// Tower kind new placements use.
    pub selected_tower: TowerKind,
    /// Enemies in spawn order.
    pub enemies: Vec<EnemyFrame>,
    /// Towers in placement order.
    pub towers: Vec<TowerSnapshot>,
}

/// Pre-session selections made from the menu.
#[derive(Clone, Debug)]
pub struct Lobby {
    catalog: Catalog,
    difficulty: DifficultyLevel,
    map_index: usize,
    seed: u64,
}

impl Lobby {
    /// Creates a lobby over a validated catalog with the first map and the
    /// default difficulty selected.
    pub fn new(catalog: Catalog) -> Result<Self, CatalogError> {
        catalog.validate()?;
        Ok(Self {
            catalog,
            difficulty: DifficultyLevel::default(),
            map_index: 0,
            seed: DEFAULT_SEED,
        })
    }

    /// Replaces the seed that shot pitch hints derive from.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Catalog sessions are started from.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Selects the difficulty for the next session.
    pub fn select_difficulty(&mut self, level: DifficultyLevel) {
        self.difficulty = level;
    }

    /// Difficulty the next session uses.
    #[must_use]
    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    /// Selects the map at the menu index; indices past the end are ignored.
    pub fn select_map(&mut self, index: usize) {
        if index < self.catalog.maps.len() {
            self.map_index = index;
        } else {
            debug!(index, maps = self.catalog.maps.len(), "map selection ignored");
        }
    }

    /// Map the next session uses.
    #[must_use]
    pub fn map(&self) -> &MapDefinition {
        &self.catalog.maps[self.map_index]
    }

    /// Starts a fresh session from the current selections.
    #[must_use]
    pub fn start(&self) -> Session {
        let map = self.map().clone();
        debug!(map = %map.name, difficulty = self.difficulty.name(), "session started");
        Session::new(&self.catalog, map, self.difficulty, self.seed)
    }
}

/// Running game: the world, its systems and the host-facing outputs.
#[derive(Debug)]
pub struct Session {
    world: World,
    spawning: Spawning,
    movement: Movement,
    targeting: TowerTargeting,
    combat: TowerCombat,
    clock: FrameClock,
    selected: TowerKind,
    paused: bool,
    targets: Vec<TowerTarget>,
    events: Vec<Event>,
    audio: Vec<AudioCue>,
}

impl Session {
    fn new(catalog: &Catalog, map: MapDefinition, level: DifficultyLevel, seed: u64) -> Self {
        let rules = catalog.rules;
        let cap = Duration::try_from_secs_f32(rules.frame_delta_cap).unwrap_or(Duration::ZERO);

        Self {
            world: World::new(catalog, map, level),
            spawning: Spawning::new(spawning::Config::from_rules(&rules)),
            movement: Movement::new(movement::Config::from_rules(&rules)),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(seed),
            clock: FrameClock::new(cap),
            selected: TowerKind::Gatling,
            paused: false,
            targets: Vec::new(),
            events: Vec::new(),
            audio: Vec::new(),
        }
    }

    /// Read-only access to the world for richer queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Chooses the tower kind later placements use.
    pub fn select_tower_type(&mut self, kind: TowerKind) {
        self.selected = kind;
    }

    /// Tower kind placements currently use.
    #[must_use]
    pub fn selected_tower(&self) -> TowerKind {
        self.selected
    }

    /// Attempts to build the selected tower kind on the cell.
    pub fn place_tower(&mut self, cell: CellCoord) {
        self.execute(vec![Command::PlaceTower {
            kind: self.selected,
            cell,
        }]);
    }

    /// Attempts to sell the tower on the cell.
    pub fn remove_tower(&mut self, cell: CellCoord) {
        self.execute(vec![Command::RemoveTower { cell }]);
    }

    /// Requests the next wave; ignored while one runs or after defeat.
    pub fn start_wave(&mut self) {
        let mut commands = Vec::new();
        self.spawning
            .start_wave(&query::wave_view(&self.world), &mut commands);
        self.execute(commands);
    }

    /// Flips the pause flag and returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        debug!(paused = self.paused, "pause toggled");
        self.paused
    }

    /// Whether the pipeline is suspended.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Feeds a host timestamp in milliseconds and runs one pipeline pass with
    /// the resulting delta unless paused.
    pub fn frame(&mut self, now_ms: f64) {
        let dt = self.clock.advance(now_ms);
        self.tick(dt);
    }

    /// Runs one pipeline pass with an explicit delta unless paused.
    pub fn tick(&mut self, dt: Duration) {
        if self.paused {
            return;
        }
        trace!(dt = dt.as_secs_f32(), "pipeline pass");

        let mut tick_events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut tick_events);
        self.record(tick_events.clone());

        let mut commands = Vec::new();
        self.spawning.handle(
            &tick_events,
            &query::wave_view(&self.world),
            &mut commands,
        );
        self.execute(std::mem::take(&mut commands));

        self.movement.handle(
            &tick_events,
            &query::enemy_view(&self.world),
            query::navigation_view(&self.world),
            &mut commands,
        );
        commands.push(Command::ResolveEnemies);
        self.execute(std::mem::take(&mut commands));

        let towers = query::tower_view(&self.world);
        self.targets.clear();
        self.targeting.handle(
            &towers,
            &query::enemy_view(&self.world),
            query::tower_stats(&self.world),
            &mut self.targets,
        );
        commands.extend(self.targets.iter().filter_map(TowerTarget::assignment));
        self.execute(std::mem::take(&mut commands));

        self.combat.handle(&towers, &self.targets, &mut commands);
        self.execute(commands);
    }

    /// Current heads-up display values.
    #[must_use]
    pub fn hud(&self) -> HudState {
        let wave = query::wave_view(&self.world);
        HudState {
            cash: query::cash(&self.world).floor().max(0.0) as u64,
            lives: query::lives(&self.world),
            wave: wave.wave,
            path_invalid: query::is_path_invalid(&self.world),
            paused: self.paused,
            defeated: query::is_defeated(&self.world),
            wave_active: wave.phase == WavePhase::Spawning,
        }
    }

    /// Captures the state a renderer draws.
    #[must_use]
    pub fn snapshot(&self) -> FrameSnapshot {
        let enemies = query::enemy_view(&self.world)
            .iter()
            .map(|enemy| EnemyFrame {
                id: enemy.id,
                kind: enemy.kind,
                position: enemy.position,
                health_ratio: enemy.health_ratio(),
                slowed: enemy.slow_timer > 0.0,
            })
            .collect();

        FrameSnapshot {
            hud: self.hud(),
            selected_tower: self.selected,
            enemies,
            towers: query::tower_view(&self.world).into_vec(),
        }
    }

    /// Reports whether a tower could stand on the cell, ignoring cash and
    /// path connectivity.
    #[must_use]
    pub fn can_build_at(&self, cell: CellCoord) -> bool {
        query::can_build_at(&self.world, cell)
    }

    /// Takes every event produced since the previous drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Takes every audio cue produced since the previous drain.
    pub fn drain_audio_cues(&mut self) -> Vec<AudioCue> {
        std::mem::take(&mut self.audio)
    }

    fn execute(&mut self, commands: Vec<Command>) {
        if commands.is_empty() {
            return;
        }

        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.record(events);
    }

    fn record(&mut self, events: Vec<Event>) {
        self.audio.extend(events.iter().filter_map(|event| match event {
            Event::TowerPlaced { .. } => Some(AudioCue::TowerPlaced),
            Event::ShotFired { pitch_hint, .. } => Some(AudioCue::ShotFired {
                pitch: *pitch_hint,
            }),
            _ => None,
        }));
        self.events.extend(events);
    }
}
