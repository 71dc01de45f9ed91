#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Brawl Arena engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that rendering, physics and audio collaborators react to. Systems consume
//! event streams, query immutable views such as [`MapView`] and
//! [`PlayerView`], and respond exclusively with new command batches.

use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, Serialize};

/// Grid size used when no configuration overrides it.
pub const DEFAULT_GRID_SIZE: f32 = 1.0;

const AREA_EPSILON: f32 = 1e-4;

/// Closed set of block types available to map authors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockType {
    /// Invisible marker where a player may be placed at round start.
    Spawn,
    /// Solid static ground; the only block that participates in autotiling.
    Platform,
    /// Hazard that kills players on contact.
    Spike,
    /// Launches players upward on contact.
    Spring,
    /// Dynamic physics-driven box.
    Crate,
}

impl BlockType {
    /// Every block type in catalog order.
    pub const ALL: [BlockType; 5] = [
        BlockType::Spawn,
        BlockType::Platform,
        BlockType::Spike,
        BlockType::Spring,
        BlockType::Crate,
    ];

    /// Reports whether blocks of this type take part in adjacency tiling.
    #[must_use]
    pub const fn is_tiled(self) -> bool {
        matches!(self, Self::Platform)
    }

    /// Reports whether blocks of this type are drawn during play.
    #[must_use]
    pub const fn is_visible_at_runtime(self) -> bool {
        !matches!(self, Self::Spawn)
    }

    /// Reports whether blocks of this type are simulated by the physics collaborator.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Crate)
    }
}

/// Continuous two-dimensional position expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate; grows to the right.
    pub x: f32,
    /// Vertical coordinate; grows upward.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new point from its coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Quantised grid coordinate obtained by rounding a position by the grid size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    column: i32,
    row: i32,
}

impl GridCell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Quantises a continuous position to the nearest cell.
    #[must_use]
    pub fn from_point(point: WorldPoint, grid_size: f32) -> Self {
        Self {
            column: (point.x / grid_size).round() as i32,
            row: (point.y / grid_size).round() as i32,
        }
    }

    /// Horizontal cell index.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Vertical cell index; grows upward.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Centre of the cell expressed in world units.
    #[must_use]
    pub fn to_point(self, grid_size: f32) -> WorldPoint {
        WorldPoint::new(self.column as f32 * grid_size, self.row as f32 * grid_size)
    }

    /// Returns the adjacent cell in the provided direction.
    #[must_use]
    pub const fn neighbor(self, direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::new(self.column, self.row + 1),
            Direction::Down => Self::new(self.column, self.row - 1),
            Direction::Left => Self::new(self.column - 1, self.row),
            Direction::Right => Self::new(self.column + 1, self.row),
        }
    }

    /// Chebyshev distance measured in whole cells.
    #[must_use]
    pub fn chebyshev_distance(self, other: GridCell) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }
}

/// Cardinal directions used by adjacency lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward increasing rows.
    Up,
    /// Toward decreasing rows.
    Down,
    /// Toward decreasing columns.
    Left,
    /// Toward increasing columns.
    Right,
}

impl Direction {
    /// Every direction in the fixed priority order used by tiling.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

/// Axis-aligned rectangle bounding every placement and validation walk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildArea {
    /// Left edge in world units.
    pub min_x: f32,
    /// Right edge in world units.
    pub max_x: f32,
    /// Bottom edge in world units.
    pub min_y: f32,
    /// Top edge in world units.
    pub max_y: f32,
}

impl BuildArea {
    /// Creates a build area from its edges, normalising swapped bounds.
    #[must_use]
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x: min_x.min(max_x),
            max_x: min_x.max(max_x),
            min_y: min_y.min(max_y),
            max_y: min_y.max(max_y),
        }
    }

    /// Reports whether the point lies inside the area, edges included.
    #[must_use]
    pub fn contains(&self, point: WorldPoint) -> bool {
        point.x >= self.min_x - AREA_EPSILON
            && point.x <= self.max_x + AREA_EPSILON
            && point.y >= self.min_y - AREA_EPSILON
            && point.y <= self.max_y + AREA_EPSILON
    }

    /// Horizontal midpoint used as the mirror axis.
    #[must_use]
    pub fn center_x(&self) -> f32 {
        (self.min_x + self.max_x) / 2.0
    }

    /// Reflects the point across the vertical centre line.
    #[must_use]
    pub fn mirror(&self, point: WorldPoint) -> WorldPoint {
        WorldPoint::new(2.0 * self.center_x() - point.x, point.y)
    }

    /// Enumerates every grid cell whose centre lies inside the area, row by row.
    #[must_use]
    pub fn cells(&self, grid_size: f32) -> Vec<GridCell> {
        let first_column = (self.min_x / grid_size - AREA_EPSILON).ceil() as i32;
        let last_column = (self.max_x / grid_size + AREA_EPSILON).floor() as i32;
        let first_row = (self.min_y / grid_size - AREA_EPSILON).ceil() as i32;
        let last_row = (self.max_y / grid_size + AREA_EPSILON).floor() as i32;

        let mut cells = Vec::new();
        for row in first_row..=last_row {
            for column in first_column..=last_column {
                cells.push(GridCell::new(column, row));
            }
        }
        cells
    }
}

impl Default for BuildArea {
    fn default() -> Self {
        Self::new(-12.0, 12.0, -6.0, 7.0)
    }
}

/// Grid quantisation paired with the build area it applies to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    grid_size: f32,
    build_area: BuildArea,
}

impl GridGeometry {
    /// Creates a geometry; non-positive grid sizes fall back to the default.
    #[must_use]
    pub fn new(grid_size: f32, build_area: BuildArea) -> Self {
        let grid_size = if grid_size > 0.0 {
            grid_size
        } else {
            DEFAULT_GRID_SIZE
        };
        Self {
            grid_size,
            build_area,
        }
    }

    /// Edge length of a single grid cell.
    #[must_use]
    pub const fn grid_size(&self) -> f32 {
        self.grid_size
    }

    /// Rectangle that bounds placement and validation.
    #[must_use]
    pub const fn build_area(&self) -> &BuildArea {
        &self.build_area
    }

    /// Quantises a position to its grid cell.
    #[must_use]
    pub fn cell_of(&self, point: WorldPoint) -> GridCell {
        GridCell::from_point(point, self.grid_size)
    }

    /// Snaps a position to the centre of its grid cell.
    #[must_use]
    pub fn snap(&self, point: WorldPoint) -> WorldPoint {
        self.cell_of(point).to_point(self.grid_size)
    }

    /// Reports whether the centre of the cell lies inside the build area.
    #[must_use]
    pub fn contains_cell(&self, cell: GridCell) -> bool {
        self.build_area.contains(cell.to_point(self.grid_size))
    }

    /// Snapped reflection of the point across the build area's centre line.
    #[must_use]
    pub fn mirror(&self, point: WorldPoint) -> WorldPoint {
        self.snap(self.build_area.mirror(self.snap(point)))
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE, BuildArea::default())
    }
}

/// Opaque reference to the external instance spawned for a placed block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceHandle(u32);

impl InstanceHandle {
    /// Creates a new handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a local player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
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

/// Occupancy flags for the four cardinal neighbors of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Neighbors {
    /// Whether the cell above is occupied.
    pub up: bool,
    /// Whether the cell below is occupied.
    pub down: bool,
    /// Whether the cell to the left is occupied.
    pub left: bool,
    /// Whether the cell to the right is occupied.
    pub right: bool,
}

impl Neighbors {
    /// Creates a flag set in up, down, left, right order.
    #[must_use]
    pub const fn new(up: bool, down: bool, left: bool, right: bool) -> Self {
        Self {
            up,
            down,
            left,
            right,
        }
    }

    /// Flag for a single direction.
    #[must_use]
    pub const fn has(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Number of occupied neighbors, between zero and four.
    #[must_use]
    pub const fn connection_count(&self) -> u8 {
        self.up as u8 + self.down as u8 + self.left as u8 + self.right as u8
    }
}

/// Visual variant selector emitted by the tiling system.
///
/// Names describe the face that is drawn, not the neighbor that exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileVariant {
    /// No neighbors; every edge exposed.
    Single,
    /// Fully enclosed.
    Center,
    /// Only the cell below is occupied.
    SingleTop,
    /// Only the cell above is occupied.
    SingleBottom,
    /// Only the cell to the right is occupied.
    SingleLeft,
    /// Only the cell to the left is occupied.
    SingleRight,
    /// Up and right occupied.
    BottomLeftCorner,
    /// Up and left occupied.
    BottomRightCorner,
    /// Down and right occupied.
    TopLeftCorner,
    /// Down and left occupied.
    TopRightCorner,
    /// Up and down occupied.
    VerticalOpen,
    /// Left and right occupied.
    HorizontalOpen,
    /// Every neighbor except the one above.
    Top,
    /// Every neighbor except the one below.
    Bottom,
    /// Every neighbor except the one to the left.
    Left,
    /// Every neighbor except the one to the right.
    Right,
}

impl TileVariant {
    /// Every variant in declaration order.
    pub const ALL: [TileVariant; 16] = [
        TileVariant::Single,
        TileVariant::Center,
        TileVariant::SingleTop,
        TileVariant::SingleBottom,
        TileVariant::SingleLeft,
        TileVariant::SingleRight,
        TileVariant::BottomLeftCorner,
        TileVariant::BottomRightCorner,
        TileVariant::TopLeftCorner,
        TileVariant::TopRightCorner,
        TileVariant::VerticalOpen,
        TileVariant::HorizontalOpen,
        TileVariant::Top,
        TileVariant::Bottom,
        TileVariant::Left,
        TileVariant::Right,
    ];
}

/// Spawnable prototype registered for a block type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prototype {
    /// Block type the prototype instantiates.
    pub kind: BlockType,
    /// Asset key the scene collaborator resolves into a concrete object.
    pub asset: &'static str,
    /// Whether instances take part in collisions.
    pub collides: bool,
    /// Whether instances are simulated by the physics collaborator.
    pub dynamic: bool,
    /// Whether instances are drawn during play.
    pub visible: bool,
}

/// Static registry mapping each block type to its prototype.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockCatalog {
    prototypes: [Prototype; 5],
}

impl BlockCatalog {
    /// Catalog holding the stock prototypes shipped with the game.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            prototypes: [
                Prototype {
                    kind: BlockType::Spawn,
                    asset: "blocks/spawn",
                    collides: false,
                    dynamic: false,
                    visible: false,
                },
                Prototype {
                    kind: BlockType::Platform,
                    asset: "blocks/platform",
                    collides: true,
                    dynamic: false,
                    visible: true,
                },
                Prototype {
                    kind: BlockType::Spike,
                    asset: "blocks/spike",
                    collides: true,
                    dynamic: false,
                    visible: true,
                },
                Prototype {
                    kind: BlockType::Spring,
                    asset: "blocks/spring",
                    collides: true,
                    dynamic: false,
                    visible: true,
                },
                Prototype {
                    kind: BlockType::Crate,
                    asset: "blocks/crate",
                    collides: true,
                    dynamic: true,
                    visible: true,
                },
            ],
        }
    }

    /// Looks up the prototype registered for the block type.
    #[must_use]
    pub fn prototype(&self, kind: BlockType) -> Prototype {
        self.prototypes
            .iter()
            .copied()
            .find(|prototype| prototype.kind == kind)
            .unwrap_or(Prototype {
                kind,
                asset: "blocks/missing",
                collides: true,
                dynamic: kind.is_dynamic(),
                visible: kind.is_visible_at_runtime(),
            })
    }
}

impl Default for BlockCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Single block entry of the persisted map form.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Type of the block.
    #[serde(rename = "type")]
    pub kind: BlockType,
    /// Snapped world position of the block.
    pub position: WorldPoint,
}

impl BlockRecord {
    /// Creates a new record.
    #[must_use]
    pub const fn new(kind: BlockType, position: WorldPoint) -> Self {
        Self { kind, position }
    }
}

/// Persisted, handle-free description of a map.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct MapDescriptor {
    /// Blocks in placement order.
    pub blocks: Vec<BlockRecord>,
}

impl MapDescriptor {
    /// Creates a descriptor from its records.
    #[must_use]
    pub fn new(blocks: Vec<BlockRecord>) -> Self {
        Self { blocks }
    }

    /// Reports whether the descriptor holds no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of blocks of the provided type.
    #[must_use]
    pub fn count_of(&self, kind: BlockType) -> usize {
        self.blocks.iter().filter(|block| block.kind == kind).count()
    }
}

/// Source of named maps the match orchestrator draws arenas from.
pub trait MapLibrary {
    /// Names of every map the library can load.
    fn map_names(&self) -> Vec<String>;

    /// Loads the named map, returning `None` if it is missing or unreadable.
    fn load_map(&self, name: &str) -> Option<MapDescriptor>;
}

/// Top-level phase of the match lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Lobby; players join and warm up.
    #[default]
    WaitingForPlayers,
    /// Round loop is running.
    Playing,
    /// Post-match ceremony.
    Trophy,
}

/// Final or intermediate score line for a single player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Standing {
    /// Player the line belongs to.
    pub player: PlayerId,
    /// Rounds won by the player.
    pub wins: u32,
}

/// Presentation cue forwarded to camera, UI and audio collaborators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresentationCue {
    /// Camera and UI transition between rounds.
    RoundTransition,
    /// Countdown step before movement unlocks.
    Countdown {
        /// Seconds remaining; zero means go.
        remaining: u32,
    },
    /// Movement unlocked, the round is live.
    RoundStarted,
    /// Round resolved with a sole survivor or a draw.
    RoundResolved {
        /// Winner of the round, `None` on a draw.
        winner: Option<PlayerId>,
    },
    /// Transition into the trophy ceremony.
    TrophyTransition,
    /// Ranking board shown during the ceremony.
    Ranking {
        /// Players ordered from most to fewest wins.
        standings: Vec<Standing>,
    },
    /// Ceremony finished, back to the lobby.
    MatchFinished,
}

/// Reasons a block placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The snapped position lies outside the build area.
    OutOfBounds,
    /// Another block already occupies the snapped cell.
    Occupied,
    /// A crate would sit within one cell of a spawn.
    CrateNearSpawn,
    /// A crate would sit above a spawn in the same column.
    CrateAboveSpawn,
}

/// Reasons a join request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinError {
    /// A player with the same identifier already joined.
    AlreadyJoined,
    /// Players may only join while the lobby is open.
    MatchInProgress,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests placement of a block at the snapped position.
    PlaceBlock {
        /// Type of block to place.
        kind: BlockType,
        /// Unsnapped target position.
        position: WorldPoint,
    },
    /// Requests removal of the block occupying the snapped position.
    RemoveBlock {
        /// Unsnapped target position.
        position: WorldPoint,
    },
    /// Re-instantiates every block of one type in place as another type.
    SwapBlockType {
        /// Type whose blocks are replaced.
        from: BlockType,
        /// Type of the replacement blocks.
        to: BlockType,
    },
    /// Enables or disables dynamics on crate instances.
    SetCratePhysics {
        /// Whether crates should be simulated.
        enabled: bool,
    },
    /// Replaces the active map with the provided descriptor.
    LoadMap {
        /// Name the map was loaded under.
        name: String,
        /// Blocks to instantiate.
        descriptor: MapDescriptor,
    },
    /// Removes every block from the active map.
    ClearMap,
    /// Records the outcome of a validation pass over the active map.
    MarkMapValidated {
        /// Whether the pass succeeded.
        valid: bool,
    },
    /// Requests that the world transition to the provided match phase.
    SetMatchPhase {
        /// Phase the world should activate.
        phase: MatchPhase,
    },
    /// Explicit start signal for lobbies gated on it.
    RequestMatchStart,
    /// Forwards a presentation cue to external collaborators.
    Present {
        /// Cue to broadcast.
        cue: PresentationCue,
    },
    /// Adds a player to the roster.
    JoinPlayer {
        /// Identifier of the joining player.
        player: PlayerId,
    },
    /// Removes a player from the roster.
    RemovePlayer {
        /// Identifier of the leaving player.
        player: PlayerId,
    },
    /// Teleports a player to the provided position.
    PlacePlayer {
        /// Identifier of the player to move.
        player: PlayerId,
        /// Destination in world units.
        position: WorldPoint,
    },
    /// Heals a player and clears its dead flag.
    RespawnPlayer {
        /// Identifier of the player to respawn.
        player: PlayerId,
    },
    /// Marks a player as dead.
    KillPlayer {
        /// Identifier of the player to kill.
        player: PlayerId,
    },
    /// Locks or unlocks a player's movement.
    SetPlayerMovement {
        /// Identifier of the player.
        player: PlayerId,
        /// Whether the player may move.
        enabled: bool,
    },
    /// Overwrites a player's win counter.
    SetPlayerWins {
        /// Identifier of the player.
        player: PlayerId,
        /// New win count.
        wins: u32,
    },
    /// Records a position reported by the physics collaborator.
    ReportPlayerPosition {
        /// Identifier of the player.
        player: PlayerId,
        /// Observed position in world units.
        position: WorldPoint,
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
    /// Confirms that a block instance was created.
    BlockPlaced {
        /// Handle assigned to the new instance.
        handle: InstanceHandle,
        /// Type of the placed block.
        kind: BlockType,
        /// Cell occupied by the block.
        cell: GridCell,
        /// Snapped position of the block.
        position: WorldPoint,
        /// Asset key of the prototype to instantiate.
        asset: &'static str,
    },
    /// Confirms that a block instance was destroyed.
    BlockRemoved {
        /// Handle of the destroyed instance.
        handle: InstanceHandle,
        /// Type of the removed block.
        kind: BlockType,
        /// Cell the block occupied.
        cell: GridCell,
    },
    /// Reports that a block placement request was rejected.
    BlockPlacementRejected {
        /// Type of block requested for placement.
        kind: BlockType,
        /// Position provided in the placement request.
        position: WorldPoint,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Announces a new visual variant for a tiled block.
    BlockRetiled {
        /// Handle of the affected instance.
        handle: InstanceHandle,
        /// Variant the renderer should display.
        variant: TileVariant,
    },
    /// Announces that dynamics were toggled on a block instance.
    BlockPhysicsChanged {
        /// Handle of the affected instance.
        handle: InstanceHandle,
        /// Whether the instance is now simulated.
        enabled: bool,
    },
    /// Confirms that a map finished loading.
    MapLoaded {
        /// Name the map was loaded under.
        name: String,
        /// Number of blocks instantiated.
        block_count: usize,
    },
    /// Confirms that the active map was emptied.
    MapCleared,
    /// Reports a change of the map's tested-and-valid flag.
    MapValidityChanged {
        /// Whether the map is currently considered validated.
        validated: bool,
    },
    /// Announces that the world entered a new match phase.
    MatchPhaseChanged {
        /// Phase that became active.
        phase: MatchPhase,
    },
    /// Relays an explicit start request.
    MatchStartRequested,
    /// Presentation cue for camera, UI and audio collaborators.
    Cue {
        /// Cue to present.
        cue: PresentationCue,
    },
    /// Confirms that a player joined the roster.
    PlayerJoined {
        /// Identifier of the player.
        player: PlayerId,
    },
    /// Reports that a join request was rejected.
    PlayerJoinRejected {
        /// Identifier of the player.
        player: PlayerId,
        /// Specific reason the join failed.
        reason: JoinError,
    },
    /// Confirms that a player left the roster.
    PlayerRemoved {
        /// Identifier of the player.
        player: PlayerId,
    },
    /// Confirms that a player was teleported.
    PlayerPlaced {
        /// Identifier of the player.
        player: PlayerId,
        /// Destination in world units.
        position: WorldPoint,
    },
    /// Confirms that a player was healed and revived.
    PlayerRespawned {
        /// Identifier of the player.
        player: PlayerId,
    },
    /// Confirms that a player died.
    PlayerDied {
        /// Identifier of the player.
        player: PlayerId,
    },
    /// Confirms a change of a player's movement lock.
    PlayerMovementChanged {
        /// Identifier of the player.
        player: PlayerId,
        /// Whether the player may move.
        enabled: bool,
    },
    /// Confirms a change of a player's win counter.
    PlayerWinsChanged {
        /// Identifier of the player.
        player: PlayerId,
        /// New win count.
        wins: u32,
    },
}

/// Immutable representation of a single placed block used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockSnapshot {
    /// Handle of the block's external instance.
    pub handle: InstanceHandle,
    /// Type of the block.
    pub kind: BlockType,
    /// Cell occupied by the block.
    pub cell: GridCell,
    /// Snapped position of the block.
    pub position: WorldPoint,
    /// Current visual variant, present only for tiled blocks.
    pub variant: Option<TileVariant>,
}

/// Read-only snapshot of every block on the active map.
#[derive(Clone, Debug, Default)]
pub struct MapView {
    snapshots: Vec<BlockSnapshot>,
    by_cell: HashMap<GridCell, usize>,
}

impl MapView {
    /// Creates a new map view from snapshots in placement order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<BlockSnapshot>) -> Self {
        let by_cell = snapshots
            .iter()
            .enumerate()
            .map(|(index, snapshot)| (snapshot.cell, index))
            .collect();
        Self { snapshots, by_cell }
    }

    /// Iterator over the captured block snapshots in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockSnapshot> {
        self.snapshots.iter()
    }

    /// Number of blocks on the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the map holds no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Returns the block occupying the provided cell, if any.
    #[must_use]
    pub fn block_at(&self, cell: GridCell) -> Option<&BlockSnapshot> {
        self.by_cell
            .get(&cell)
            .and_then(|index| self.snapshots.get(*index))
    }

    /// Positions of every spawn block in placement order.
    #[must_use]
    pub fn spawn_points(&self) -> Vec<WorldPoint> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.kind == BlockType::Spawn)
            .map(|snapshot| snapshot.position)
            .collect()
    }

    /// Converts the view into its persisted, handle-free form.
    #[must_use]
    pub fn to_descriptor(&self) -> MapDescriptor {
        MapDescriptor::new(
            self.snapshots
                .iter()
                .map(|snapshot| BlockRecord::new(snapshot.kind, snapshot.position))
                .collect(),
        )
    }
}

/// Immutable representation of a single player's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Identifier of the player.
    pub id: PlayerId,
    /// Last known position in world units.
    pub position: WorldPoint,
    /// Whether the player is currently dead.
    pub dead: bool,
    /// Rounds won during the current match.
    pub wins: u32,
    /// Whether the player may move.
    pub movement_enabled: bool,
}

/// Read-only snapshot describing every joined player.
#[derive(Clone, Debug, Default)]
pub struct PlayerView {
    snapshots: Vec<PlayerSnapshot>,
}

impl PlayerView {
    /// Creates a new player view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PlayerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured player snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of a single player.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> Option<&PlayerSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == player)
    }

    /// Number of joined players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether nobody has joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Number of players that are currently alive.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.snapshots.iter().filter(|snapshot| !snapshot.dead).count()
    }
}
