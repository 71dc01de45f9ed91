#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Brawl Arena.
//!
//! The world owns the active map grid, the player roster and the current
//! match phase. Every mutation arrives as a [`Command`] through [`apply`], and
//! every observable consequence leaves as an [`Event`] so the scene, physics
//! and audio collaborators never need to inspect world internals.

mod grid;

use brawl_arena_core::{
    BlockCatalog, BlockType, Command, Event, GridGeometry, JoinError, MatchPhase, PlayerId,
    PlayerSnapshot, WorldPoint,
};
use log::{debug, info, warn};

use self::grid::MapGrid;

/// Configuration parameters required to construct the world.
#[derive(Clone, Debug, Default)]
pub struct Config {
    geometry: GridGeometry,
    catalog: BlockCatalog,
}

impl Config {
    /// Creates a new configuration from the grid geometry and block catalog.
    #[must_use]
    pub const fn new(geometry: GridGeometry, catalog: BlockCatalog) -> Self {
        Self { geometry, catalog }
    }
}

#[derive(Clone, Debug)]
struct Player {
    id: PlayerId,
    position: WorldPoint,
    dead: bool,
    wins: u32,
    movement_enabled: bool,
}

impl Player {
    fn joined(id: PlayerId) -> Self {
        Self {
            id,
            position: WorldPoint::default(),
            dead: false,
            wins: 0,
            movement_enabled: true,
        }
    }
}

/// Represents the authoritative Brawl Arena world state.
#[derive(Debug)]
pub struct World {
    geometry: GridGeometry,
    catalog: BlockCatalog,
    grid: MapGrid,
    map_name: Option<String>,
    validated: bool,
    crate_physics: bool,
    players: Vec<Player>,
    phase: MatchPhase,
    tick_index: u64,
}

impl World {
    /// Creates a new world using the default geometry and stock catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a new world from explicit configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            geometry: config.geometry,
            catalog: config.catalog,
            grid: MapGrid::new(),
            map_name: None,
            validated: false,
            crate_physics: false,
            players: Vec::new(),
            phase: MatchPhase::WaitingForPlayers,
            tick_index: 0,
        }
    }

    fn player_mut(&mut self, player: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|candidate| candidate.id == player)
    }

    fn set_validated(&mut self, validated: bool, out_events: &mut Vec<Event>) {
        if self.validated != validated {
            self.validated = validated;
            out_events.push(Event::MapValidityChanged { validated });
        }
    }

    fn announce_crate_physics(&self, out_events: &mut Vec<Event>) {
        for handle in self.grid.handles_of(BlockType::Crate) {
            out_events.push(Event::BlockPhysicsChanged {
                handle,
                enabled: self.crate_physics,
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::PlaceBlock { kind, position } => {
            let cell = world.geometry.cell_of(position);
            if let Some(reason) = world
                .grid
                .placement_rejection(&world.geometry, kind, cell)
            {
                out_events.push(Event::BlockPlacementRejected {
                    kind,
                    position,
                    reason,
                });
                return;
            }

            let handle =
                world
                    .grid
                    .instantiate(&world.catalog, &world.geometry, kind, cell, out_events);
            if kind.is_dynamic() {
                out_events.push(Event::BlockPhysicsChanged {
                    handle,
                    enabled: world.crate_physics,
                });
            }
            world.set_validated(false, out_events);
            world.grid.retile(out_events);
        }
        Command::RemoveBlock { position } => {
            let cell = world.geometry.cell_of(position);
            if world.grid.remove_at(cell, out_events) {
                world.set_validated(false, out_events);
                world.grid.retile(out_events);
            }
        }
        Command::SwapBlockType { from, to } => {
            let swapped = world.grid.swap_kind(&world.catalog, from, to, out_events);
            if swapped == 0 {
                return;
            }
            if from != to {
                world.set_validated(false, out_events);
            }
            if to.is_dynamic() {
                world.announce_crate_physics(out_events);
            }
            world.grid.retile(out_events);
        }
        Command::SetCratePhysics { enabled } => {
            world.crate_physics = enabled;
            world.announce_crate_physics(out_events);
        }
        Command::LoadMap { name, descriptor } => {
            world.grid.clear(out_events);
            let mut loaded = 0;
            for record in &descriptor.blocks {
                let cell = world.geometry.cell_of(record.position);
                if world.grid.is_occupied(cell) {
                    warn!(
                        "map `{name}` stacks a second block on cell {},{}; skipping it",
                        cell.column(),
                        cell.row()
                    );
                    continue;
                }
                let _ = world.grid.instantiate(
                    &world.catalog,
                    &world.geometry,
                    record.kind,
                    cell,
                    out_events,
                );
                loaded += 1;
            }
            world.announce_crate_physics(out_events);
            world.grid.retile(out_events);
            world.set_validated(false, out_events);
            info!("loaded map `{name}` with {loaded} blocks");
            out_events.push(Event::MapLoaded {
                name: name.clone(),
                block_count: loaded,
            });
            world.map_name = Some(name);
        }
        Command::ClearMap => {
            world.grid.clear(out_events);
            world.map_name = None;
            world.set_validated(false, out_events);
            out_events.push(Event::MapCleared);
        }
        Command::MarkMapValidated { valid } => {
            world.set_validated(valid, out_events);
        }
        Command::SetMatchPhase { phase } => {
            if world.phase != phase {
                info!("match phase {:?} -> {:?}", world.phase, phase);
                world.phase = phase;
                out_events.push(Event::MatchPhaseChanged { phase });
            }
        }
        Command::RequestMatchStart => {
            out_events.push(Event::MatchStartRequested);
        }
        Command::Present { cue } => {
            out_events.push(Event::Cue { cue });
        }
        Command::JoinPlayer { player } => {
            let reason = if world.players.iter().any(|candidate| candidate.id == player) {
                Some(JoinError::AlreadyJoined)
            } else if world.phase != MatchPhase::WaitingForPlayers {
                Some(JoinError::MatchInProgress)
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    debug!("join of player {} rejected: {reason:?}", player.get());
                    out_events.push(Event::PlayerJoinRejected { player, reason });
                }
                None => {
                    world.players.push(Player::joined(player));
                    out_events.push(Event::PlayerJoined { player });
                }
            }
        }
        Command::RemovePlayer { player } => {
            let before = world.players.len();
            world.players.retain(|candidate| candidate.id != player);
            if world.players.len() != before {
                out_events.push(Event::PlayerRemoved { player });
            }
        }
        Command::PlacePlayer { player, position } => {
            if let Some(target) = world.player_mut(player) {
                target.position = position;
                out_events.push(Event::PlayerPlaced { player, position });
            }
        }
        Command::RespawnPlayer { player } => {
            if let Some(target) = world.player_mut(player) {
                target.dead = false;
                out_events.push(Event::PlayerRespawned { player });
            }
        }
        Command::KillPlayer { player } => {
            if let Some(target) = world.player_mut(player) {
                if !target.dead {
                    target.dead = true;
                    out_events.push(Event::PlayerDied { player });
                }
            }
        }
        Command::SetPlayerMovement { player, enabled } => {
            if let Some(target) = world.player_mut(player) {
                target.movement_enabled = enabled;
                out_events.push(Event::PlayerMovementChanged { player, enabled });
            }
        }
        Command::SetPlayerWins { player, wins } => {
            if let Some(target) = world.player_mut(player) {
                target.wins = wins;
                out_events.push(Event::PlayerWinsChanged { player, wins });
            }
        }
        Command::ReportPlayerPosition { player, position } => {
            if let Some(target) = world.player_mut(player) {
                target.position = position;
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use brawl_arena_core::{
        BlockCatalog, BlockType, GridCell, GridGeometry, MapView, MatchPhase, PlacementError,
        PlayerView, WorldPoint,
    };

    use super::World;

    /// Provides read-only access to the grid geometry and build area.
    #[must_use]
    pub fn geometry(world: &World) -> &GridGeometry {
        &world.geometry
    }

    /// Provides read-only access to the block catalog.
    #[must_use]
    pub fn catalog(world: &World) -> &BlockCatalog {
        &world.catalog
    }

    /// Captures a read-only view of every block on the active map.
    #[must_use]
    pub fn map_view(world: &World) -> MapView {
        MapView::from_snapshots(
            world
                .grid
                .blocks()
                .iter()
                .map(|block| block.snapshot())
                .collect(),
        )
    }

    /// Type of the block occupying the snapped position, if any.
    #[must_use]
    pub fn block_at(world: &World, position: WorldPoint) -> Option<BlockType> {
        world
            .grid
            .block_at(world.geometry.cell_of(position))
            .map(|block| block.kind)
    }

    /// Spawn positions of the active map in placement order.
    #[must_use]
    pub fn spawn_points(world: &World) -> Vec<WorldPoint> {
        world
            .grid
            .blocks()
            .iter()
            .filter(|block| block.kind == BlockType::Spawn)
            .map(|block| block.position)
            .collect()
    }

    /// Evaluates the placement rules without mutating the world.
    pub fn placement_check(
        world: &World,
        kind: BlockType,
        position: WorldPoint,
    ) -> Result<GridCell, PlacementError> {
        let cell = world.geometry.cell_of(position);
        match world.grid.placement_rejection(&world.geometry, kind, cell) {
            Some(reason) => Err(reason),
            None => Ok(cell),
        }
    }

    /// Captures a read-only view of the player roster.
    #[must_use]
    pub fn player_view(world: &World) -> PlayerView {
        PlayerView::from_snapshots(world.players.iter().map(super::Player::snapshot).collect())
    }

    /// Current match phase.
    #[must_use]
    pub fn match_phase(world: &World) -> MatchPhase {
        world.phase
    }

    /// Name of the map that was last loaded, if any.
    #[must_use]
    pub fn map_name(world: &World) -> Option<&str> {
        world.map_name.as_deref()
    }

    /// Whether the active map passed validation since its last edit.
    #[must_use]
    pub fn is_map_validated(world: &World) -> bool {
        world.validated
    }

    /// Whether crate dynamics are currently enabled.
    #[must_use]
    pub fn crate_physics_enabled(world: &World) -> bool {
        world.crate_physics
    }

    /// Number of simulation ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

impl Player {
    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            position: self.position,
            dead: self.dead,
            wins: self.wins,
            movement_enabled: self.movement_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brawl_arena_core::{
        BlockRecord, BuildArea, GridCell, MapDescriptor, PlacementError, TileVariant,
    };

    fn test_world() -> World {
        World::with_config(Config::new(
            GridGeometry::new(1.0, BuildArea::new(-5.0, 5.0, -3.0, 3.0)),
            BlockCatalog::standard(),
        ))
    }

    fn place(world: &mut World, kind: BlockType, x: f32, y: f32) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::PlaceBlock {
                kind,
                position: WorldPoint::new(x, y),
            },
            &mut events,
        );
        events
    }

    #[test]
    fn placement_snaps_to_grid() {
        let mut world = test_world();
        let events = place(&mut world, BlockType::Platform, 1.3, -0.6);

        assert!(matches!(
            events.first(),
            Some(Event::BlockPlaced {
                kind: BlockType::Platform,
                cell,
                asset: "blocks/platform",
                ..
            }) if *cell == GridCell::new(1, -1)
        ));
        assert_eq!(
            query::block_at(&world, WorldPoint::new(1.0, -1.0)),
            Some(BlockType::Platform)
        );
    }

    #[test]
    fn occupied_cell_rejects_second_block() {
        let mut world = test_world();
        let _ = place(&mut world, BlockType::Platform, 0.0, 0.0);
        let events = place(&mut world, BlockType::Spike, 0.2, 0.1);

        assert_eq!(
            events,
            vec![Event::BlockPlacementRejected {
                kind: BlockType::Spike,
                position: WorldPoint::new(0.2, 0.1),
                reason: PlacementError::Occupied,
            }]
        );
        assert_eq!(query::map_view(&world).len(), 1);
    }

    #[test]
    fn placement_outside_build_area_is_ignored() {
        let mut world = test_world();
        let events = place(&mut world, BlockType::Platform, 9.0, 0.0);

        assert!(matches!(
            events.as_slice(),
            [Event::BlockPlacementRejected {
                reason: PlacementError::OutOfBounds,
                ..
            }]
        ));
        assert!(query::map_view(&world).is_empty());
    }

    #[test]
    fn crates_keep_clear_of_spawns() {
        let mut world = test_world();
        let _ = place(&mut world, BlockType::Spawn, 0.0, 0.0);

        assert_eq!(
            query::placement_check(&world, BlockType::Crate, WorldPoint::new(1.0, 1.0)),
            Err(PlacementError::CrateNearSpawn)
        );
        assert_eq!(
            query::placement_check(&world, BlockType::Crate, WorldPoint::new(0.0, 3.0)),
            Err(PlacementError::CrateAboveSpawn)
        );
        assert_eq!(
            query::placement_check(&world, BlockType::Crate, WorldPoint::new(2.0, 0.0)),
            Ok(GridCell::new(2, 0))
        );
        assert_eq!(
            query::placement_check(&world, BlockType::Platform, WorldPoint::new(1.0, 1.0)),
            Ok(GridCell::new(1, 1))
        );
    }

    #[test]
    fn placement_retiles_neighbors() {
        let mut world = test_world();
        let _ = place(&mut world, BlockType::Platform, 0.0, 0.0);
        let events = place(&mut world, BlockType::Platform, 1.0, 0.0);

        let retiled: Vec<TileVariant> = events
            .iter()
            .filter_map(|event| match event {
                Event::BlockRetiled { variant, .. } => Some(*variant),
                _ => None,
            })
            .collect();
        assert_eq!(
            retiled,
            vec![TileVariant::SingleLeft, TileVariant::SingleRight]
        );
    }

    #[test]
    fn spawns_are_not_tiled() {
        let mut world = test_world();
        let _ = place(&mut world, BlockType::Platform, 0.0, 0.0);
        let _ = place(&mut world, BlockType::Spawn, 0.0, 1.0);

        let view = query::map_view(&world);
        let platform = view.block_at(GridCell::new(0, 0)).expect("platform present");
        let spawn = view.block_at(GridCell::new(0, 1)).expect("spawn present");
        assert_eq!(platform.variant, Some(TileVariant::Single));
        assert_eq!(spawn.variant, None);
    }

    #[test]
    fn placement_invalidates_tested_flag() {
        let mut world = test_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MarkMapValidated { valid: true },
            &mut events,
        );
        assert!(query::is_map_validated(&world));

        let events = place(&mut world, BlockType::Platform, 0.0, 0.0);
        assert!(!query::is_map_validated(&world));
        assert!(events.contains(&Event::MapValidityChanged { validated: false }));
    }

    #[test]
    fn removal_destroys_instance() {
        let mut world = test_world();
        let placed = place(&mut world, BlockType::Spring, 0.0, 0.0);
        let Some(Event::BlockPlaced { handle, .. }) = placed.first() else {
            panic!("expected placement event");
        };

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RemoveBlock {
                position: WorldPoint::new(0.4, -0.4),
            },
            &mut events,
        );

        assert_eq!(
            events.first(),
            Some(&Event::BlockRemoved {
                handle: *handle,
                kind: BlockType::Spring,
                cell: GridCell::new(0, 0),
            })
        );
        assert!(query::map_view(&world).is_empty());
    }

    #[test]
    fn swap_reinstantiates_in_place() {
        let mut world = test_world();
        let _ = place(&mut world, BlockType::Spike, 2.0, 0.0);
        let _ = place(&mut world, BlockType::Platform, 1.0, 0.0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SwapBlockType {
                from: BlockType::Spike,
                to: BlockType::Platform,
            },
            &mut events,
        );

        let view = query::map_view(&world);
        assert_eq!(view.len(), 2);
        let swapped = view.block_at(GridCell::new(2, 0)).expect("swapped block");
        assert_eq!(swapped.kind, BlockType::Platform);
        assert_eq!(swapped.variant, Some(TileVariant::SingleRight));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::BlockRemoved { kind: BlockType::Spike, .. })));
    }

    #[test]
    fn crate_physics_only_touches_crates() {
        let mut world = test_world();
        let _ = place(&mut world, BlockType::Crate, 3.0, 0.0);
        let _ = place(&mut world, BlockType::Platform, 3.0, -1.0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetCratePhysics { enabled: true },
            &mut events,
        );

        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::BlockPhysicsChanged { enabled: true, .. }
        ));
        assert!(query::crate_physics_enabled(&world));
    }

    #[test]
    fn load_map_replaces_blocks() {
        let mut world = test_world();
        let _ = place(&mut world, BlockType::Platform, 0.0, 0.0);

        let descriptor = MapDescriptor::new(vec![
            BlockRecord::new(BlockType::Spawn, WorldPoint::new(-1.0, 1.0)),
            BlockRecord::new(BlockType::Platform, WorldPoint::new(-1.0, 0.0)),
            BlockRecord::new(BlockType::Platform, WorldPoint::new(-1.0, 0.0)),
        ]);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::LoadMap {
                name: "duel".to_owned(),
                descriptor,
            },
            &mut events,
        );

        assert!(events.contains(&Event::MapLoaded {
            name: "duel".to_owned(),
            block_count: 2,
        }));
        assert_eq!(query::map_name(&world), Some("duel"));
        assert_eq!(query::spawn_points(&world), vec![WorldPoint::new(-1.0, 1.0)]);
        assert_eq!(query::map_view(&world).len(), 2);
    }

    #[test]
    fn joins_only_while_lobby_is_open() {
        let mut world = test_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::JoinPlayer {
                player: PlayerId::new(1),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::JoinPlayer {
                player: PlayerId::new(1),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SetMatchPhase {
                phase: MatchPhase::Playing,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::JoinPlayer {
                player: PlayerId::new(2),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::PlayerJoined {
                    player: PlayerId::new(1)
                },
                Event::PlayerJoinRejected {
                    player: PlayerId::new(1),
                    reason: JoinError::AlreadyJoined,
                },
                Event::MatchPhaseChanged {
                    phase: MatchPhase::Playing
                },
                Event::PlayerJoinRejected {
                    player: PlayerId::new(2),
                    reason: JoinError::MatchInProgress,
                },
            ]
        );
        assert_eq!(query::player_view(&world).len(), 1);
    }

    #[test]
    fn killing_a_dead_player_is_silent() {
        let mut world = test_world();
        let player = PlayerId::new(3);
        let mut events = Vec::new();
        apply(&mut world, Command::JoinPlayer { player }, &mut events);
        apply(&mut world, Command::KillPlayer { player }, &mut events);
        apply(&mut world, Command::KillPlayer { player }, &mut events);

        let deaths = events
            .iter()
            .filter(|event| matches!(event, Event::PlayerDied { .. }))
            .count();
        assert_eq!(deaths, 1);
        assert_eq!(query::player_view(&world).alive_count(), 0);
    }
}
