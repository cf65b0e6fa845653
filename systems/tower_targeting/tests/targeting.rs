use std::time::Duration;

use tower_defence_core::{
    Catalog, CellCoord, Command, DifficultyLevel, EnemyKind, Event, GridSize, MapDefinition,
    TowerKind, TowerTarget,
};
use tower_defence_system_tower_targeting::TowerTargeting;
use tower_defence_world::{self as world, query, World};

fn open_world() -> World {
    let mut catalog = Catalog::builtin();
    catalog.grid = GridSize::new(9, 3);
    catalog.maps = vec![MapDefinition {
        name: "Open".to_owned(),
        description: String::new(),
        start: CellCoord::new(0, 1),
        exit: CellCoord::new(8, 1),
        walls: Vec::new(),
    }];
    World::new(&catalog, catalog.maps[0].clone(), DifficultyLevel::Normal)
}

fn target_pass(world: &mut World, targeting: &mut TowerTargeting) -> (Vec<TowerTarget>, Vec<Event>) {
    let mut targets = Vec::new();
    targeting.handle(
        &query::tower_view(world),
        &query::enemy_view(world),
        query::tower_stats(world),
        &mut targets,
    );

    let mut events = Vec::new();
    for command in targets.iter().filter_map(TowerTarget::assignment) {
        world::apply(world, command, &mut events);
    }
    (targets, events)
}

#[test]
fn acquired_targets_are_recorded_and_then_held() {
    let mut world = open_world();
    let mut targeting = TowerTargeting::new();
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::PlaceTower {
            kind: TowerKind::Gatling,
            cell: CellCoord::new(2, 0),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::QueueWave {
            entries: vec![EnemyKind::Ground],
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut events,
    );
    world::apply(&mut world, Command::SpawnEnemy, &mut events);

    let (targets, events) = target_pass(&mut world, &mut targeting);
    assert_eq!(targets.len(), 1);
    let enemy = targets[0].enemy.expect("enemy at the start is in range");
    assert!(matches!(
        events.as_slice(),
        [Event::TargetAcquired { enemy: acquired, .. }] if *acquired == enemy
    ));

    let tower = query::tower_view(&world).into_vec()[0];
    assert_eq!(tower.target, Some(enemy));
    assert!((tower.aim - targets[0].aim).abs() < f32::EPSILON);

    let (targets, events) = target_pass(&mut world, &mut targeting);
    assert!(!targets[0].changed);
    assert!(events.is_empty(), "held targets are not reassigned");
}

#[test]
fn target_is_dropped_once_the_enemy_leaves_range() {
    let mut world = open_world();
    let mut targeting = TowerTargeting::new();
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::PlaceTower {
            kind: TowerKind::Tesla,
            cell: CellCoord::new(1, 0),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::QueueWave {
            entries: vec![EnemyKind::Ground],
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut events,
    );
    world::apply(&mut world, Command::SpawnEnemy, &mut events);
    let _ = target_pass(&mut world, &mut targeting);

    let enemy = query::enemy_view(&world).into_vec()[0].id;
    world::apply(
        &mut world,
        Command::AdvanceEnemy {
            enemy,
            position: CellCoord::new(7, 1).center(),
            elapsed: Duration::ZERO,
        },
        &mut events,
    );

    let (targets, _) = target_pass(&mut world, &mut targeting);
    assert_eq!(targets[0].enemy, None);
    assert!(targets[0].changed);
    assert_eq!(query::tower_view(&world).into_vec()[0].target, None);
}
