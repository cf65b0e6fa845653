use std::time::Duration;

use glam::Vec2;
use tower_defence_core::{
    Catalog, CellCoord, Command, DifficultyLevel, EnemyId, EnemyKind, Event, GridSize,
    MapDefinition, PlacementError, RemovalError, TowerId, TowerKind, WavePhase, WaveStartError,
};
use tower_defence_world::{apply, query, World};

fn open_catalog(columns: u32, rows: u32, start: CellCoord, exit: CellCoord) -> Catalog {
    let mut catalog = Catalog::builtin();
    catalog.grid = GridSize::new(columns, rows);
    catalog.maps = vec![MapDefinition {
        name: "Open".to_owned(),
        description: String::new(),
        start,
        exit,
        walls: Vec::new(),
    }];
    catalog
}

fn new_world(catalog: &Catalog) -> World {
    World::new(catalog, catalog.maps[0].clone(), DifficultyLevel::Normal)
}

fn place(world: &mut World, kind: TowerKind, cell: CellCoord) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, Command::PlaceTower { kind, cell }, &mut events);
    events
}

/// Queues a wave and spawns every entry, then moves each enemy to the
/// provided position.
fn spawn_at(world: &mut World, enemies: &[(EnemyKind, Vec2)]) -> Vec<EnemyId> {
    let mut events = Vec::new();
    apply(
        world,
        Command::QueueWave {
            entries: enemies.iter().map(|(kind, _)| *kind).collect(),
        },
        &mut events,
    );

    for _ in enemies {
        apply(
            world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        apply(world, Command::SpawnEnemy, &mut events);
    }

    let ids: Vec<EnemyId> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .collect();

    for (id, (_, position)) in ids.iter().zip(enemies) {
        apply(
            world,
            Command::AdvanceEnemy {
                enemy: *id,
                position: *position,
                elapsed: Duration::ZERO,
            },
            &mut events,
        );
    }

    ids
}

#[test]
fn placement_deducts_cost_and_blocks_the_cell() {
    let catalog = open_catalog(5, 3, CellCoord::new(0, 1), CellCoord::new(4, 1));
    let mut world = new_world(&catalog);

    let events = place(&mut world, TowerKind::Gatling, CellCoord::new(2, 1));

    assert_eq!(
        events,
        vec![Event::TowerPlaced {
            tower: TowerId::new(0),
            kind: TowerKind::Gatling,
            cell: CellCoord::new(2, 1),
            cost: 40,
        }]
    );
    assert_eq!(query::cash(&world), 160.0);
    assert!(!query::can_build_at(&world, CellCoord::new(2, 1)));
    assert_eq!(
        query::navigation_view(&world).distance(CellCoord::new(0, 1)),
        6,
        "route detours around the tower"
    );
}

#[test]
fn placement_that_seals_the_route_is_rolled_back() {
    let catalog = open_catalog(3, 3, CellCoord::new(0, 0), CellCoord::new(2, 2));
    let mut world = new_world(&catalog);

    assert!(place(&mut world, TowerKind::Glue, CellCoord::new(1, 0))
        .iter()
        .any(|event| matches!(event, Event::TowerPlaced { .. })));
    let before: Vec<u32> = query::navigation_view(&world).cells().to_vec();

    let events = place(&mut world, TowerKind::Glue, CellCoord::new(0, 1));

    assert_eq!(
        events,
        vec![Event::TowerPlacementRejected {
            kind: TowerKind::Glue,
            cell: CellCoord::new(0, 1),
            reason: PlacementError::SealsPath,
        }]
    );
    assert_eq!(query::cash(&world), 165.0);
    assert_eq!(query::tower_view(&world).into_vec().len(), 1);
    assert_eq!(query::navigation_view(&world).cells(), before.as_slice());
    assert!(!query::is_path_invalid(&world));
}

#[test]
fn encircling_the_exit_is_rejected() {
    let catalog = open_catalog(5, 5, CellCoord::new(0, 0), CellCoord::new(2, 2));
    let mut world = new_world(&catalog);

    for cell in [
        CellCoord::new(2, 1),
        CellCoord::new(3, 2),
        CellCoord::new(2, 3),
    ] {
        let events = place(&mut world, TowerKind::Gatling, cell);
        assert!(matches!(events[0], Event::TowerPlaced { .. }), "{cell}");
    }

    let events = place(&mut world, TowerKind::Gatling, CellCoord::new(1, 2));
    assert!(matches!(
        events[0],
        Event::TowerPlacementRejected {
            reason: PlacementError::SealsPath,
            ..
        }
    ));
    assert!(query::can_build_at(&world, CellCoord::new(1, 2)));
}

#[test]
fn structural_rejections_leave_state_untouched() {
    let catalog = Catalog::builtin();
    let mut world = new_world(&catalog);
    let map = query::map(&world).clone();

    let cases = [
        (CellCoord::new(15, 0), PlacementError::OutOfBounds),
        (CellCoord::new(3, 1), PlacementError::Wall),
        (map.start, PlacementError::Reserved),
        (map.exit, PlacementError::Reserved),
    ];

    for (cell, expected) in cases {
        let events = place(&mut world, TowerKind::Tesla, cell);
        assert_eq!(
            events,
            vec![Event::TowerPlacementRejected {
                kind: TowerKind::Tesla,
                cell,
                reason: expected,
            }]
        );
    }

    let _ = place(&mut world, TowerKind::Tesla, CellCoord::new(1, 1));
    let occupied = place(&mut world, TowerKind::Gatling, CellCoord::new(1, 1));
    assert!(matches!(
        occupied[0],
        Event::TowerPlacementRejected {
            reason: PlacementError::Occupied,
            ..
        }
    ));
    assert_eq!(query::cash(&world), 110.0);
}

#[test]
fn placement_requires_enough_cash() {
    let catalog = Catalog::builtin();
    let mut world = new_world(&catalog);

    let _ = place(&mut world, TowerKind::Tesla, CellCoord::new(1, 1));
    let _ = place(&mut world, TowerKind::Tesla, CellCoord::new(1, 2));
    let events = place(&mut world, TowerKind::Gatling, CellCoord::new(1, 3));

    assert_eq!(query::cash(&world), 20.0);
    assert!(matches!(
        events[0],
        Event::TowerPlacementRejected {
            reason: PlacementError::InsufficientCash,
            ..
        }
    ));
}

#[test]
fn removal_refunds_seventy_percent_exactly() {
    let catalog = Catalog::builtin();
    let mut world = new_world(&catalog);
    let cell = CellCoord::new(1, 1);
    let _ = place(&mut world, TowerKind::Glue, cell);

    let mut events = Vec::new();
    apply(&mut world, Command::RemoveTower { cell }, &mut events);

    assert_eq!(
        events,
        vec![Event::TowerRemoved {
            tower: TowerId::new(0),
            kind: TowerKind::Glue,
            cell,
            refund: 35.0 * 0.7,
        }]
    );
    assert!((query::cash(&world) - (200.0 - 35.0 + 24.5)).abs() < 1e-9);
    assert!(query::can_build_at(&world, cell));

    events.clear();
    apply(&mut world, Command::RemoveTower { cell }, &mut events);
    assert_eq!(
        events,
        vec![Event::TowerRemovalRejected {
            cell,
            reason: RemovalError::MissingTower,
        }]
    );
}

#[test]
fn splash_hits_every_enemy_within_radius_including_target() {
    let catalog = open_catalog(15, 10, CellCoord::new(0, 0), CellCoord::new(14, 9));
    let mut world = new_world(&catalog);
    let _ = place(&mut world, TowerKind::Missile, CellCoord::new(5, 5));

    let ids = spawn_at(
        &mut world,
        &[
            (EnemyKind::Ground, Vec2::new(6.0, 5.5)),
            (EnemyKind::Ground, Vec2::new(7.25, 5.5)),
            (EnemyKind::Air, Vec2::new(7.5, 5.5)),
        ],
    );
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::FireTower {
            tower: TowerId::new(0),
            target: ids[0],
            pitch_hint: 400.0,
        },
        &mut events,
    );

    let enemies = query::enemy_view(&world).into_vec();
    assert!(enemies[0].health < enemies[0].max_health, "target is struck");
    assert!(enemies[1].health < enemies[1].max_health, "neighbour inside the radius");
    assert_eq!(enemies[2].health, enemies[2].max_health, "outside the radius");
    assert!(matches!(
        events.last(),
        Some(Event::ShotFired { struck: 2, .. })
    ));
}

#[test]
fn glue_slows_only_its_target_and_respects_cooldown() {
    let catalog = open_catalog(15, 10, CellCoord::new(0, 0), CellCoord::new(14, 9));
    let mut world = new_world(&catalog);
    let _ = place(&mut world, TowerKind::Glue, CellCoord::new(5, 5));

    let ids = spawn_at(
        &mut world,
        &[
            (EnemyKind::Ground, Vec2::new(6.5, 5.5)),
            (EnemyKind::Ground, Vec2::new(6.6, 5.5)),
        ],
    );
    let fire = Command::FireTower {
        tower: TowerId::new(0),
        target: ids[0],
        pitch_hint: 320.0,
    };
    let mut events = Vec::new();
    apply(&mut world, fire.clone(), &mut events);
    apply(&mut world, fire, &mut events);

    let enemies = query::enemy_view(&world).into_vec();
    assert_eq!(enemies[0].slow_timer, 1.5);
    assert!(
        (enemies[0].max_health - enemies[0].health - 2.0).abs() < 1e-4,
        "second shot gated"
    );
    assert_eq!(enemies[1].slow_timer, 0.0);
    assert_eq!(enemies[1].health, enemies[1].max_health);
    let tower = query::tower_view(&world).into_vec()[0];
    assert!((tower.cooldown - 0.9).abs() < 1e-6);
}

#[test]
fn death_is_checked_before_escape() {
    let catalog = open_catalog(5, 2, CellCoord::new(0, 0), CellCoord::new(4, 0));
    let mut world = new_world(&catalog);
    let _ = place(&mut world, TowerKind::Tesla, CellCoord::new(2, 1));
    let ids = spawn_at(&mut world, &[(EnemyKind::Air, Vec2::new(4.5, 0.5))]);

    let mut events = Vec::new();
    for _ in 0..2 {
        apply(
            &mut world,
            Command::FireTower {
                tower: TowerId::new(0),
                target: ids[0],
                pitch_hint: 400.0,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(2),
            },
            &mut events,
        );
    }
    apply(&mut world, Command::ResolveEnemies, &mut events);

    assert!(events.contains(&Event::EnemyKilled {
        enemy: ids[0],
        reward: 8.0,
    }));
    assert_eq!(query::lives(&world), 20);
    assert_eq!(query::cash(&world), 200.0 - 90.0 + 8.0);
}

#[test]
fn escapes_cost_lives_and_defeat_clears_the_wave() {
    let mut catalog = open_catalog(5, 1, CellCoord::new(0, 0), CellCoord::new(4, 0));
    catalog.difficulties.normal.starting_lives = 2;
    let mut world = new_world(&catalog);

    let exit = CellCoord::new(4, 0).center();
    let _ = spawn_at(
        &mut world,
        &[
            (EnemyKind::Ground, exit),
            (EnemyKind::Ground, Vec2::new(4.2, 0.5)),
            (EnemyKind::Ground, Vec2::new(1.5, 0.5)),
        ],
    );
    let mut events = Vec::new();
    apply(&mut world, Command::ResolveEnemies, &mut events);
    apply(&mut world, Command::ResolveEnemies, &mut events);

    let defeats = events
        .iter()
        .filter(|event| matches!(event, Event::Defeated { .. }))
        .count();
    assert_eq!(defeats, 1);
    assert!(query::is_defeated(&world));
    assert!(query::enemy_view(&world).is_empty());
    let wave = query::wave_view(&world);
    assert_eq!(wave.phase, WavePhase::Idle);
    assert_eq!(wave.queued, 0);
    assert_eq!(wave.wave, 1, "defeat does not advance the wave");

    events.clear();
    apply(
        &mut world,
        Command::QueueWave {
            entries: vec![EnemyKind::Ground],
        },
        &mut events,
    );
    assert_eq!(
        events,
        vec![Event::WaveStartRejected {
            reason: WaveStartError::Defeated
        }]
    );
}

#[test]
fn defeat_mid_wave_drops_the_pending_queue() {
    let mut catalog = open_catalog(5, 1, CellCoord::new(0, 0), CellCoord::new(4, 0));
    catalog.difficulties.normal.starting_lives = 1;
    let mut world = new_world(&catalog);
    let mut events = Vec::new();

    apply(
        &mut world,
        Command::QueueWave {
            entries: vec![EnemyKind::Ground; 5],
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut events,
    );
    apply(&mut world, Command::SpawnEnemy, &mut events);
    apply(
        &mut world,
        Command::AdvanceEnemy {
            enemy: EnemyId::new(0),
            position: CellCoord::new(4, 0).center(),
            elapsed: Duration::ZERO,
        },
        &mut events,
    );

    assert_eq!(query::enemy_view(&world).len(), 1);
    let before = query::wave_view(&world);
    assert_eq!(before.queued, 4);
    assert_eq!(before.phase, WavePhase::Spawning);

    events.clear();
    apply(&mut world, Command::ResolveEnemies, &mut events);

    let after = query::wave_view(&world);
    assert_eq!(after.queued, 0);
    assert_eq!(after.live_enemies, 0);
    assert_eq!(after.phase, WavePhase::Idle);
    assert_eq!(
        events,
        vec![
            Event::EnemyEscaped {
                enemy: EnemyId::new(0),
                lives: 0,
            },
            Event::Defeated { wave: 1 },
        ]
    );

    events.clear();
    apply(&mut world, Command::SpawnEnemy, &mut events);
    assert!(events.is_empty(), "nothing is left to spawn after defeat");
}
