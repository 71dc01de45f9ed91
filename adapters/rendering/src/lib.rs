#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Brawl Arena adapters.

mod sprites;

use std::{collections::HashMap, io::Write};

use anyhow::{Context, Result as AnyResult};
use brawl_arena_core::{
    BlockSnapshot, BlockType, GridCell, GridGeometry, InstanceHandle, MapView, TileVariant,
    WorldPoint,
};

pub use sprites::SpriteTable;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with a replaced alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

/// Base tint used for blocks of the provided type.
#[must_use]
pub const fn block_color(kind: BlockType) -> Color {
    match kind {
        BlockType::Spawn => Color::from_rgb_u8(90, 200, 250),
        BlockType::Platform => Color::from_rgb_u8(120, 110, 100),
        BlockType::Spike => Color::from_rgb_u8(210, 60, 60),
        BlockType::Spring => Color::from_rgb_u8(240, 200, 40),
        BlockType::Crate => Color::from_rgb_u8(170, 120, 60),
    }
}

const REJECTED_GHOST: Color = Color::new(1.0, 0.2, 0.2, 0.5);
const GHOST_ALPHA: f32 = 0.5;

/// Identifies the sprite drawn for a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKey {
    /// Untiled block drawn with its type's sprite.
    Block(BlockType),
    /// Platform drawn with the sprite of its tile variant.
    Platform(TileVariant),
}

impl SpriteKey {
    /// Sprite for the block captured in the snapshot.
    #[must_use]
    pub fn for_block(block: &BlockSnapshot) -> Self {
        match (block.kind, block.variant) {
            (BlockType::Platform, Some(variant)) => Self::Platform(variant),
            (kind, _) => Self::Block(kind),
        }
    }

    /// Single character used by text backends.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Block(BlockType::Spawn) => 'P',
            Self::Block(BlockType::Platform) => 'o',
            Self::Block(BlockType::Spike) => '^',
            Self::Block(BlockType::Spring) => 'z',
            Self::Block(BlockType::Crate) => 'X',
            Self::Platform(variant) => match variant {
                TileVariant::Single => 'o',
                TileVariant::Center => '#',
                TileVariant::SingleTop => 'n',
                TileVariant::SingleBottom => 'u',
                TileVariant::SingleLeft => '<',
                TileVariant::SingleRight => '>',
                TileVariant::TopLeftCorner | TileVariant::BottomRightCorner => '/',
                TileVariant::TopRightCorner | TileVariant::BottomLeftCorner => '\\',
                TileVariant::VerticalOpen => '|',
                TileVariant::HorizontalOpen => '=',
                TileVariant::Top => '-',
                TileVariant::Bottom => '_',
                TileVariant::Left => '[',
                TileVariant::Right => ']',
            },
        }
    }
}

/// Whether the scene is shown to a map author or to players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SceneMode {
    /// Every block is drawn, spawn markers included.
    #[default]
    Editor,
    /// Only blocks visible at runtime are drawn.
    Play,
}

/// Block drawn within a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneBlock {
    /// Handle of the block's instance.
    pub handle: InstanceHandle,
    /// Cell the block occupies.
    pub cell: GridCell,
    /// Sprite drawn for the block.
    pub sprite: SpriteKey,
    /// Tint applied to the sprite.
    pub tint: Color,
}

/// Placement preview drawn under the editor cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostPresentation {
    /// Type of the previewed block.
    pub kind: BlockType,
    /// Snapped position of the preview.
    pub position: WorldPoint,
    /// Whether the world would accept the placement.
    pub placeable: bool,
}

impl GhostPresentation {
    /// Creates a new ghost descriptor.
    #[must_use]
    pub const fn new(kind: BlockType, position: WorldPoint, placeable: bool) -> Self {
        Self {
            kind,
            position,
            placeable,
        }
    }

    /// Tint communicating whether the placement would succeed.
    #[must_use]
    pub const fn tint(&self) -> Color {
        if self.placeable {
            block_color(self.kind).with_alpha(GHOST_ALPHA)
        } else {
            REJECTED_GHOST
        }
    }
}

/// Scene description consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Audience the scene is drawn for.
    pub mode: SceneMode,
    /// Grid and build area the scene is laid out on.
    pub geometry: GridGeometry,
    /// Blocks in placement order.
    pub blocks: Vec<SceneBlock>,
    /// Editor placement previews.
    pub ghosts: Vec<GhostPresentation>,
    /// Grid overlay markers, empty when the overlay is hidden.
    pub grid_markers: Vec<WorldPoint>,
}

impl Scene {
    /// Builds a scene from the active map.
    #[must_use]
    pub fn from_map(view: &MapView, geometry: GridGeometry, mode: SceneMode) -> Self {
        let blocks = view
            .iter()
            .filter(|block| mode == SceneMode::Editor || block.kind.is_visible_at_runtime())
            .map(|block| SceneBlock {
                handle: block.handle,
                cell: block.cell,
                sprite: SpriteKey::for_block(block),
                tint: block_color(block.kind),
            })
            .collect();
        Self {
            mode,
            geometry,
            blocks,
            ghosts: Vec::new(),
            grid_markers: Vec::new(),
        }
    }

    /// Attaches editor placement previews.
    #[must_use]
    pub fn with_ghosts(mut self, ghosts: Vec<GhostPresentation>) -> Self {
        self.ghosts = ghosts;
        self
    }

    /// Attaches grid overlay markers.
    #[must_use]
    pub fn with_grid_markers(mut self, markers: Vec<WorldPoint>) -> Self {
        self.grid_markers = markers;
        self
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Caption shown above the scene.
    pub title: String,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(title: T, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            title: title.into(),
            scene,
        }
    }
}

/// Rendering backend capable of presenting Brawl Arena scenes.
pub trait RenderingBackend {
    /// Draws a single frame of the presentation.
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()>;
}

/// Backend that prints scenes as text, one character per grid cell.
#[derive(Debug)]
pub struct AsciiBackend<W> {
    writer: W,
}

impl<W: Write> AsciiBackend<W> {
    /// Creates a backend writing into the provided sink.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the backend and returns its sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderingBackend for AsciiBackend<W> {
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()> {
        writeln!(self.writer, "{}", presentation.title).context("failed to write title")?;
        self.writer
            .write_all(render_ascii(&presentation.scene).as_bytes())
            .context("failed to write scene")?;
        self.writer.flush().context("failed to flush scene")
    }
}

/// Renders the scene's build area, top row first.
#[must_use]
pub fn render_ascii(scene: &Scene) -> String {
    let grid_size = scene.geometry.grid_size();
    let cells = scene.geometry.build_area().cells(grid_size);
    let (Some(first), Some(last)) = (cells.first(), cells.last()) else {
        return String::new();
    };

    let mut glyphs: HashMap<GridCell, char> = HashMap::new();
    for marker in &scene.grid_markers {
        let _ = glyphs.insert(scene.geometry.cell_of(*marker), '.');
    }
    for block in &scene.blocks {
        let _ = glyphs.insert(block.cell, block.sprite.glyph());
    }
    for ghost in &scene.ghosts {
        let glyph = if ghost.placeable { '+' } else { '!' };
        let _ = glyphs.insert(scene.geometry.cell_of(ghost.position), glyph);
    }

    let mut output = String::new();
    for row in (first.row()..=last.row()).rev() {
        for column in first.column()..=last.column() {
            output.push(
                glyphs
                    .get(&GridCell::new(column, row))
                    .copied()
                    .unwrap_or(' '),
            );
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use brawl_arena_core::BuildArea;

    fn geometry() -> GridGeometry {
        GridGeometry::new(1.0, BuildArea::new(-2.0, 2.0, 0.0, 1.0))
    }

    fn snapshot(
        handle: u32,
        kind: BlockType,
        column: i32,
        row: i32,
        variant: Option<TileVariant>,
    ) -> BlockSnapshot {
        BlockSnapshot {
            handle: InstanceHandle::new(handle),
            kind,
            cell: GridCell::new(column, row),
            position: WorldPoint::new(column as f32, row as f32),
            variant,
        }
    }

    fn sample_view() -> MapView {
        MapView::from_snapshots(vec![
            snapshot(1, BlockType::Platform, -1, 0, Some(TileVariant::SingleLeft)),
            snapshot(2, BlockType::Platform, 0, 0, Some(TileVariant::SingleRight)),
            snapshot(3, BlockType::Spawn, 0, 1, None),
            snapshot(4, BlockType::Spike, 2, 0, None),
        ])
    }

    #[test]
    fn ascii_output_draws_top_row_first() {
        let scene = Scene::from_map(&sample_view(), geometry(), SceneMode::Editor);
        assert_eq!(render_ascii(&scene), "  P  \n <> ^\n");
    }

    #[test]
    fn play_mode_hides_spawn_markers() {
        let scene = Scene::from_map(&sample_view(), geometry(), SceneMode::Play);
        assert_eq!(scene.blocks.len(), 3);
        assert_eq!(render_ascii(&scene), "     \n <> ^\n");
    }

    #[test]
    fn ghosts_and_markers_overlay_the_map() {
        let scene = Scene::from_map(&sample_view(), geometry(), SceneMode::Editor)
            .with_grid_markers(vec![WorldPoint::new(-2.0, 1.0), WorldPoint::new(2.0, 1.0)])
            .with_ghosts(vec![
                GhostPresentation::new(BlockType::Crate, WorldPoint::new(1.0, 1.0), true),
                GhostPresentation::new(BlockType::Crate, WorldPoint::new(-1.0, 1.0), false),
            ]);
        assert_eq!(render_ascii(&scene), ".!P+.\n <> ^\n");
    }

    #[test]
    fn rejected_ghosts_use_warning_tint() {
        let ghost = GhostPresentation::new(BlockType::Spring, WorldPoint::default(), false);
        assert_eq!(ghost.tint(), REJECTED_GHOST);
        let ghost = GhostPresentation::new(BlockType::Spring, WorldPoint::default(), true);
        assert_eq!(ghost.tint().alpha, GHOST_ALPHA);
    }

    #[test]
    fn every_platform_variant_has_a_glyph() {
        for variant in TileVariant::ALL {
            assert_ne!(SpriteKey::Platform(variant).glyph(), ' ');
        }
    }

    #[test]
    fn ascii_backend_writes_title_and_scene() {
        let scene = Scene::from_map(&sample_view(), geometry(), SceneMode::Play);
        let mut backend = AsciiBackend::new(Vec::new());
        backend
            .present(&Presentation::new("canyon", scene))
            .expect("present");
        let text = String::from_utf8(backend.into_inner()).expect("utf8");
        assert!(text.starts_with("canyon\n"));
        assert!(text.ends_with(" <> ^\n"));
    }
}
