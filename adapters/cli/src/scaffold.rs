use std::io;

use anyhow::{bail, Context, Result};
use brawl_arena_core::{BlockCatalog, BlockType, Command, Event, GridGeometry, WorldPoint};
use brawl_arena_rendering::{
    AsciiBackend, GhostPresentation, Presentation, RenderingBackend, Scene, SceneMode,
};
use brawl_arena_system_editor::{self as editor, Editor, EditorInput};
use brawl_arena_system_validation::{validate_view, ValidationReport};
use brawl_arena_world::{self as world, query, World};
use clap::Args;
use log::warn;

use crate::settings::Settings;

#[derive(Debug, Args)]
pub(crate) struct ScaffoldArgs {
    /// Print each map with the grid overlay after authoring it
    #[arg(long)]
    pub(crate) preview: bool,
    /// Only author the named demo map
    #[arg(long)]
    pub(crate) only: Option<String>,
}

/// Demo map expressed as editor strokes on the right half of the arena.
///
/// Every stroke is placed with mirroring enabled, so the left half follows.
struct Blueprint {
    name: &'static str,
    strokes: Vec<(BlockType, f32, f32)>,
}

fn row(
    kind: BlockType,
    y: f32,
    columns: std::ops::RangeInclusive<i32>,
) -> Vec<(BlockType, f32, f32)> {
    columns.map(|x| (kind, x as f32, y)).collect()
}

fn blueprints() -> Vec<Blueprint> {
    let lobby = [
        row(BlockType::Platform, -4.0, 0..=10),
        vec![
            (BlockType::Spawn, 3.0, -2.0),
            (BlockType::Spawn, 8.0, -2.0),
            (BlockType::Spring, 10.0, -3.0),
        ],
    ];
    let trophy = [
        row(BlockType::Platform, -2.0, 0..=4),
        vec![
            (BlockType::Platform, 0.0, -1.0),
            (BlockType::Spawn, 1.0, 0.0),
            (BlockType::Spawn, 3.0, 0.0),
        ],
    ];
    let canyon = [
        row(BlockType::Platform, -5.0, 0..=11),
        row(BlockType::Platform, 0.0, 5..=8),
        vec![
            (BlockType::Spawn, 6.0, 2.0),
            (BlockType::Spawn, 10.0, -3.0),
            (BlockType::Spike, 2.0, -4.0),
            (BlockType::Spike, 3.0, -4.0),
            (BlockType::Spring, 11.0, -4.0),
            (BlockType::Crate, 0.0, 3.0),
        ],
    ];
    let rooftops = [
        row(BlockType::Spike, -6.0, 5..=8),
        row(BlockType::Platform, -1.0, 9..=11),
        vec![
            (BlockType::Platform, 4.0, -5.0),
            (BlockType::Platform, 4.0, -4.0),
            (BlockType::Platform, 4.0, -3.0),
            (BlockType::Spawn, 4.0, -1.0),
            (BlockType::Spawn, 10.0, 1.0),
            (BlockType::Crate, 7.0, 4.0),
        ],
    ];

    [
        ("lobby", lobby.concat()),
        ("trophy", trophy.concat()),
        ("canyon", canyon.concat()),
        ("rooftops", rooftops.concat()),
    ]
    .into_iter()
    .map(|(name, strokes)| Blueprint { name, strokes })
    .collect()
}

struct Session {
    world: World,
    editor: Editor,
    report: ValidationReport,
}

pub(crate) fn run(settings: &Settings, args: &ScaffoldArgs) -> Result<()> {
    let store = settings.store();
    let geometry = settings.geometry();

    let mut authored = 0;
    for blueprint in blueprints()
        .into_iter()
        .filter(|blueprint| args.only.as_deref().map_or(true, |only| only == blueprint.name))
    {
        let mut session = author(geometry, &blueprint);
        let view = query::map_view(&session.world);
        println!(
            "{}: {} blocks, {}",
            blueprint.name,
            view.len(),
            session.report.reason
        );

        if args.preview {
            preview(&mut session, &blueprint)?;
        }

        let path = store
            .save_authored(
                blueprint.name,
                &view.to_descriptor(),
                query::is_map_validated(&session.world),
            )
            .with_context(|| format!("failed to save demo map `{}`", blueprint.name))?;
        println!("  saved {}", path.display());
        authored += 1;
    }

    if authored == 0 {
        bail!(
            "no demo map is named `{}`",
            args.only.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

fn author(geometry: GridGeometry, blueprint: &Blueprint) -> Session {
    let mut world = World::with_config(world::Config::new(geometry, BlockCatalog::standard()));
    let mut editor = Editor::new(editor::Config::new(geometry));

    let _ = send(
        &mut world,
        &mut editor,
        EditorInput {
            toggle_mirror: true,
            ..EditorInput::default()
        },
    );

    let mut rejected = 0;
    for &(kind, x, y) in &blueprint.strokes {
        let events = send(
            &mut world,
            &mut editor,
            EditorInput {
                cursor: Some(WorldPoint::new(x, y)),
                place_action: true,
                select: Some(kind),
                ..EditorInput::default()
            },
        );
        rejected += events
            .iter()
            .filter(|event| matches!(event, Event::BlockPlacementRejected { .. }))
            .count();
    }
    if rejected > 0 {
        warn!(
            "{rejected} placements in `{}` fell outside the rules",
            blueprint.name
        );
    }

    let mut commands = Vec::new();
    editor.begin_test_run(&mut commands);
    editor.end_test_run(&mut commands);
    let _ = run_commands(&mut world, commands);

    let report = validate_view(&query::map_view(&world), query::geometry(&world));
    let mut commands = Vec::new();
    editor.record_validation(&report, &mut commands);
    let _ = run_commands(&mut world, commands);

    Session {
        world,
        editor,
        report,
    }
}

fn preview(session: &mut Session, blueprint: &Blueprint) -> Result<()> {
    let _ = session.editor.toggle_grid();
    let cursor = blueprint
        .strokes
        .last()
        .map(|&(_, x, y)| WorldPoint::new(x, y));
    let world = &session.world;
    session
        .editor
        .update_ghosts(cursor, |kind, position| {
            query::placement_check(world, kind, position)
        });

    let ghosts = session.editor.ghosts();
    let ghosts = [ghosts.primary, ghosts.mirrored]
        .into_iter()
        .flatten()
        .map(|ghost| GhostPresentation::new(ghost.kind, ghost.position, ghost.placeable()))
        .collect();
    let scene = Scene::from_map(
        &query::map_view(world),
        *query::geometry(world),
        SceneMode::Editor,
    )
    .with_grid_markers(session.editor.overlay_markers().to_vec())
    .with_ghosts(ghosts);

    let mut backend = AsciiBackend::new(io::stdout().lock());
    backend.present(&Presentation::new(blueprint.name, scene))
}

fn send(world: &mut World, editor: &mut Editor, input: EditorInput) -> Vec<Event> {
    let mut commands = Vec::new();
    editor.handle(
        input,
        |kind, position| query::placement_check(world, kind, position),
        &mut commands,
    );
    run_commands(world, commands)
}

fn run_commands(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_demo_map_validates_on_the_default_grid() {
        for blueprint in blueprints() {
            let session = author(GridGeometry::default(), &blueprint);
            assert!(
                session.report.valid,
                "{} failed: {}",
                blueprint.name,
                session.report.reason
            );
            assert!(query::is_map_validated(&session.world));
        }
    }

    #[test]
    fn demo_maps_are_symmetric() {
        let geometry = GridGeometry::default();
        for blueprint in blueprints() {
            let session = author(geometry, &blueprint);
            let view = query::map_view(&session.world);
            for block in view.iter() {
                let mirrored = geometry.cell_of(geometry.mirror(block.position));
                let twin = view.block_at(mirrored).map(|twin| twin.kind);
                assert_eq!(twin, Some(block.kind), "{} is lopsided", blueprint.name);
            }
        }
    }

    #[test]
    fn crates_survive_the_test_run() {
        let blueprint = blueprints()
            .into_iter()
            .find(|blueprint| blueprint.name == "rooftops")
            .expect("rooftops blueprint");
        let session = author(GridGeometry::default(), &blueprint);
        let view = query::map_view(&session.world);
        let crates: Vec<WorldPoint> = view
            .iter()
            .filter(|block| block.kind == BlockType::Crate)
            .map(|block| block.position)
            .collect();
        assert_eq!(
            crates,
            vec![WorldPoint::new(7.0, 4.0), WorldPoint::new(-7.0, 4.0)]
        );
        assert!(!query::crate_physics_enabled(&session.world));
    }
}
