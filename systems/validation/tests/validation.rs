use brawl_arena_core::{
    BlockCatalog, BlockRecord, BlockType, BuildArea, Command, GridCell, GridGeometry,
    MapDescriptor, WorldPoint,
};
use brawl_arena_system_validation::{
    validate_descriptor, validate_view, ValidationFailure, MIN_SPAWNS,
};
use brawl_arena_world::{self as world, query, Config, World};

fn geometry() -> GridGeometry {
    GridGeometry::new(1.0, BuildArea::new(-8.0, 8.0, -4.0, 5.0))
}

fn world_with(blocks: &[(BlockType, f32, f32)]) -> World {
    let mut world = World::with_config(Config::new(geometry(), BlockCatalog::standard()));
    let mut events = Vec::new();
    for (kind, x, y) in blocks {
        world::apply(
            &mut world,
            Command::PlaceBlock {
                kind: *kind,
                position: WorldPoint::new(*x, *y),
            },
            &mut events,
        );
    }
    world
}

fn four_supported_spawns() -> Vec<(BlockType, f32, f32)> {
    let mut blocks = Vec::new();
    for x in [-6.0, -2.0, 2.0, 6.0] {
        blocks.push((BlockType::Spawn, x, 2.0));
        blocks.push((BlockType::Platform, x, -1.0));
    }
    blocks
}

#[test]
fn accepts_spawns_with_a_clear_drop_to_a_platform() {
    let world = world_with(&four_supported_spawns());
    let report = validate_view(&query::map_view(&world), query::geometry(&world));

    assert!(report.valid, "expected valid map, got: {}", report.reason);
}

#[test]
fn rejects_three_spawns_regardless_of_platforms() {
    let mut blocks = four_supported_spawns();
    blocks.retain(|(kind, x, _)| !(*kind == BlockType::Spawn && *x > 5.0));
    for x in -8..=8 {
        blocks.push((BlockType::Platform, x as f32, -3.0));
    }
    let world = world_with(&blocks);
    let report = validate_view(&query::map_view(&world), query::geometry(&world));

    assert!(!report.valid, "three spawns must not validate");
    assert_eq!(
        report.failures,
        vec![ValidationFailure::TooFewSpawns {
            found: MIN_SPAWNS - 1
        }]
    );
}

#[test]
fn rejects_spike_directly_beneath_a_spawn() {
    let mut blocks = four_supported_spawns();
    blocks.push((BlockType::Spike, 2.0, 1.0));
    let world = world_with(&blocks);
    let report = validate_view(&query::map_view(&world), query::geometry(&world));

    assert!(!report.valid);
    assert_eq!(
        report.failures,
        vec![ValidationFailure::SpawnBlocked {
            spawn: GridCell::new(2, 2),
            blocker: BlockType::Spike,
            at: GridCell::new(2, 1),
        }]
    );
}

#[test]
fn rejects_spawn_hanging_over_the_void() {
    let mut blocks = four_supported_spawns();
    blocks.push((BlockType::Spawn, 0.0, 4.0));
    let world = world_with(&blocks);
    let report = validate_view(&query::map_view(&world), query::geometry(&world));

    assert!(!report.valid);
    assert_eq!(
        report.failures,
        vec![ValidationFailure::SpawnUnsupported {
            spawn: GridCell::new(0, 4)
        }]
    );
}

#[test]
fn descriptor_validation_matches_world_validation() {
    let world = world_with(&four_supported_spawns());
    let descriptor: MapDescriptor = query::map_view(&world).to_descriptor();

    let from_world = validate_view(&query::map_view(&world), &geometry());
    let from_descriptor = validate_descriptor(&descriptor, &geometry());
    assert_eq!(from_world, from_descriptor);

    let mut broken = descriptor;
    broken.blocks.push(BlockRecord::new(
        BlockType::Spring,
        WorldPoint::new(-6.0, 0.0),
    ));
    assert!(!validate_descriptor(&broken, &geometry()).valid);
}
