#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure map-editor system responsible for emitting block placement and removal commands.
//!
//! The editor never mutates the map itself. It translates authoring input
//! into [`Command`] batches, mirroring them across the build area's vertical
//! centre line when mirroring is enabled, and keeps the presentation-only
//! state (ghost previews, grid overlay markers, selected block type) that the
//! rendering adapter reads back.

use brawl_arena_core::{BlockType, Command, GridCell, GridGeometry, PlacementError, WorldPoint};
use brawl_arena_system_validation::ValidationReport;
use log::{debug, info};

/// Configuration parameters required to construct the editor system.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    geometry: GridGeometry,
    initial_selection: Option<BlockType>,
}

impl Config {
    /// Creates a new configuration for the provided grid geometry.
    #[must_use]
    pub const fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            initial_selection: None,
        }
    }

    /// Overrides the block type selected when the editor opens.
    #[must_use]
    pub const fn with_selection(mut self, kind: BlockType) -> Self {
        self.initial_selection = Some(kind);
        self
    }
}

/// Non-colliding preview of where a placement would land.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostBlock {
    /// Type of block the preview shows.
    pub kind: BlockType,
    /// Snapped position of the preview.
    pub position: WorldPoint,
    /// Reason the world would reject the placement, if any.
    pub rejection: Option<PlacementError>,
}

impl GhostBlock {
    /// Indicates whether the preview represents a valid placement location.
    #[must_use]
    pub const fn placeable(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Primary and mirrored ghost previews.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Ghosts {
    /// Preview under the cursor.
    pub primary: Option<GhostBlock>,
    /// Preview at the reflected position while mirroring is enabled.
    pub mirrored: Option<GhostBlock>,
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct EditorInput {
    /// Cursor position in world units, if the cursor is over the arena.
    pub cursor: Option<WorldPoint>,
    /// Indicates whether the author confirmed a placement on this frame.
    pub place_action: bool,
    /// Indicates whether the author requested removal on this frame.
    pub remove_action: bool,
    /// Indicates whether the mirror toggle was pressed on this frame.
    pub toggle_mirror: bool,
    /// Indicates whether the grid overlay toggle was pressed on this frame.
    pub toggle_grid: bool,
    /// Block type picked from the palette on this frame.
    pub select: Option<BlockType>,
}

/// Map-editor system that translates authoring input into world commands.
#[derive(Debug, Clone)]
pub struct Editor {
    geometry: GridGeometry,
    mirror_enabled: bool,
    grid_visible: bool,
    overlay: Vec<WorldPoint>,
    selected: BlockType,
    ghosts: Ghosts,
    test_running: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Editor {
    /// Creates a new editor system instance.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            geometry: config.geometry,
            mirror_enabled: false,
            grid_visible: false,
            overlay: Vec::new(),
            selected: config.initial_selection.unwrap_or(BlockType::Platform),
            ghosts: Ghosts::default(),
            test_running: false,
        }
    }

    /// Consumes adapter-derived input to emit editor commands.
    ///
    /// The `placement_check` closure should mirror the semantics of the
    /// world's `query::placement_check` helper so ghosts reflect the rules the
    /// world will enforce.
    pub fn handle<F>(&mut self, input: EditorInput, placement_check: F, out: &mut Vec<Command>)
    where
        F: FnMut(BlockType, WorldPoint) -> Result<GridCell, PlacementError>,
    {
        if input.toggle_mirror {
            let _ = self.toggle_mirror();
        }
        if input.toggle_grid {
            let _ = self.toggle_grid();
        }
        if let Some(kind) = input.select {
            self.select(kind);
        }

        self.update_ghosts(input.cursor, placement_check);

        if self.test_running {
            return;
        }

        if let Some(cursor) = input.cursor {
            if input.place_action {
                self.place_at(cursor, out);
            }
            if input.remove_action {
                self.remove_at(cursor, out);
            }
        }
    }

    /// Emits placement of the selected block type, plus its mirror when enabled.
    ///
    /// The world checks each placement independently, so the mirrored block
    /// may be rejected while the primary succeeds.
    pub fn place_at(&self, position: WorldPoint, out: &mut Vec<Command>) {
        let primary = self.geometry.snap(position);
        out.push(Command::PlaceBlock {
            kind: self.selected,
            position: primary,
        });

        if let Some(mirrored) = self.mirrored(primary) {
            out.push(Command::PlaceBlock {
                kind: self.selected,
                position: mirrored,
            });
        }
    }

    /// Emits removal at the snapped position, plus its mirror when enabled.
    pub fn remove_at(&self, position: WorldPoint, out: &mut Vec<Command>) {
        let primary = self.geometry.snap(position);
        out.push(Command::RemoveBlock { position: primary });

        if let Some(mirrored) = self.mirrored(primary) {
            out.push(Command::RemoveBlock { position: mirrored });
        }
    }

    /// Flips mirrored authoring, returning the new state.
    pub fn toggle_mirror(&mut self) -> bool {
        self.mirror_enabled = !self.mirror_enabled;
        debug!("mirror placement {}", on_off(self.mirror_enabled));
        self.mirror_enabled
    }

    /// Flips the grid overlay, generating its markers the first time it is shown.
    pub fn toggle_grid(&mut self) -> bool {
        self.grid_visible = !self.grid_visible;
        if self.grid_visible && self.overlay.is_empty() {
            let grid_size = self.geometry.grid_size();
            self.overlay = self
                .geometry
                .build_area()
                .cells(grid_size)
                .into_iter()
                .map(|cell| cell.to_point(grid_size))
                .collect();
        }
        debug!("grid overlay {}", on_off(self.grid_visible));
        self.grid_visible
    }

    /// Emits a dynamics toggle that only affects crate instances.
    pub fn set_physics_active(&self, enabled: bool, out: &mut Vec<Command>) {
        out.push(Command::SetCratePhysics { enabled });
    }

    /// Emits an in-place re-instantiation of every `from` block as `to`.
    pub fn swap_block_type(&self, from: BlockType, to: BlockType, out: &mut Vec<Command>) {
        out.push(Command::SwapBlockType { from, to });
    }

    /// Starts a test run: crates become dynamic and authoring input is ignored.
    pub fn begin_test_run(&mut self, out: &mut Vec<Command>) {
        if self.test_running {
            return;
        }
        self.test_running = true;
        info!("editor test run started");
        self.set_physics_active(true, out);
    }

    /// Ends a test run, freezing crates and restoring them to their authored cells.
    pub fn end_test_run(&mut self, out: &mut Vec<Command>) {
        if !self.test_running {
            return;
        }
        self.test_running = false;
        info!("editor test run finished");
        self.set_physics_active(false, out);
        self.swap_block_type(BlockType::Crate, BlockType::Crate, out);
    }

    /// Records a validation pass so the world can gate saving on it.
    pub fn record_validation(&self, report: &ValidationReport, out: &mut Vec<Command>) {
        if report.valid {
            info!("map passed validation");
        } else {
            info!("map failed validation: {}", report.reason);
        }
        out.push(Command::MarkMapValidated {
            valid: report.valid,
        });
    }

    /// Changes the block type used by subsequent placements.
    pub fn select(&mut self, kind: BlockType) {
        self.selected = kind;
    }

    /// Block type used by subsequent placements.
    #[must_use]
    pub const fn selected(&self) -> BlockType {
        self.selected
    }

    /// Whether mirrored authoring is enabled.
    #[must_use]
    pub const fn mirror_enabled(&self) -> bool {
        self.mirror_enabled
    }

    /// Whether the grid overlay is shown.
    #[must_use]
    pub const fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    /// Whether a test run is in progress.
    #[must_use]
    pub const fn test_running(&self) -> bool {
        self.test_running
    }

    /// Overlay marker positions; empty while the overlay is hidden.
    #[must_use]
    pub fn overlay_markers(&self) -> &[WorldPoint] {
        if self.grid_visible {
            &self.overlay
        } else {
            &[]
        }
    }

    /// Current ghost previews.
    #[must_use]
    pub const fn ghosts(&self) -> Ghosts {
        self.ghosts
    }

    /// Recomputes ghost previews for the cursor position.
    pub fn update_ghosts<F>(&mut self, cursor: Option<WorldPoint>, mut placement_check: F)
    where
        F: FnMut(BlockType, WorldPoint) -> Result<GridCell, PlacementError>,
    {
        let Some(cursor) = cursor else {
            self.ghosts = Ghosts::default();
            return;
        };

        let kind = self.selected;
        let mut ghost_at = |position: WorldPoint| GhostBlock {
            kind,
            position,
            rejection: placement_check(kind, position).err(),
        };

        let primary = self.geometry.snap(cursor);
        let mirrored = self.mirrored(primary).map(&mut ghost_at);
        self.ghosts = Ghosts {
            primary: Some(ghost_at(primary)),
            mirrored,
        };
    }

    fn mirrored(&self, snapped: WorldPoint) -> Option<WorldPoint> {
        if !self.mirror_enabled {
            return None;
        }
        let mirrored = self.geometry.mirror(snapped);
        if self.geometry.cell_of(mirrored) == self.geometry.cell_of(snapped) {
            return None;
        }
        Some(mirrored)
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
