use std::io;

use anyhow::{bail, Context, Result};
use brawl_arena_core::{BlockCatalog, Command, MapDescriptor};
use brawl_arena_persistence::{decode_share_string, encode_share_string, MapStore};
use brawl_arena_rendering::{AsciiBackend, Presentation, RenderingBackend, Scene, SceneMode};
use brawl_arena_system_validation::validate_descriptor;
use brawl_arena_world::{self as world, query, World};
use clap::Args;

use crate::settings::Settings;

#[derive(Debug, Args)]
pub(crate) struct NameArgs {
    /// Name of the map
    pub(crate) name: String,
}

#[derive(Debug, Args)]
pub(crate) struct ShowArgs {
    /// Name of the map
    pub(crate) name: String,
    /// Hide blocks that are invisible during play
    #[arg(long)]
    pub(crate) play: bool,
    /// List the sprite resolved for every block
    #[arg(long)]
    pub(crate) sprites: bool,
}

#[derive(Debug, Args)]
pub(crate) struct ImportArgs {
    /// Share string produced by `export`
    pub(crate) share: String,
    /// Name to store the map under
    pub(crate) name: String,
}

pub(crate) fn list(settings: &Settings) -> Result<()> {
    let store = settings.store();
    let user = store.list_maps().context("failed to list user maps")?;
    let builtin = store
        .list_builtin_maps()
        .context("failed to list shipped maps")?;

    println!("maps in {}:", store.user_dir().display());
    if user.is_empty() {
        println!("  (none)");
    }
    for name in &user {
        println!("  {name}");
    }
    if !builtin.is_empty() {
        println!("shipped maps:");
        for name in &builtin {
            println!("  {name}");
        }
    }
    Ok(())
}

pub(crate) fn show(settings: &Settings, args: &ShowArgs) -> Result<()> {
    let descriptor = load(&settings.store(), &args.name)?;
    let world = instantiate(settings, &args.name, descriptor);
    let view = query::map_view(&world);
    let mode = if args.play {
        SceneMode::Play
    } else {
        SceneMode::Editor
    };
    let scene = Scene::from_map(&view, *query::geometry(&world), mode);

    let title = format!("{} ({} blocks)", args.name, view.len());
    let mut backend = AsciiBackend::new(io::stdout().lock());
    backend.present(&Presentation::new(title, scene.clone()))?;

    if args.sprites {
        let Some(table) = settings.sprites()? else {
            bail!("no sprite manifest configured; set `manifest` under [sprites]");
        };
        for block in &scene.blocks {
            println!(
                "{:>4},{:<4} {}",
                block.cell.column(),
                block.cell.row(),
                table.resolve(block.sprite).display()
            );
        }
    }
    Ok(())
}

pub(crate) fn validate(settings: &Settings, args: &NameArgs) -> Result<()> {
    let descriptor = load(&settings.store(), &args.name)?;
    let report = validate_descriptor(&descriptor, &settings.geometry());
    if !report.valid {
        bail!("`{}` is not playable: {}", args.name, report.reason);
    }
    println!("{}: {}", args.name, report.reason);
    Ok(())
}

pub(crate) fn export(settings: &Settings, args: &NameArgs) -> Result<()> {
    let descriptor = load(&settings.store(), &args.name)?;
    let share = encode_share_string(&descriptor).context("failed to encode share string")?;
    println!("{share}");
    Ok(())
}

pub(crate) fn import(settings: &Settings, args: &ImportArgs) -> Result<()> {
    let descriptor = decode_share_string(&args.share).context("failed to decode share string")?;
    let report = validate_descriptor(&descriptor, &settings.geometry());
    if !report.valid {
        log::warn!("imported map `{}` is not playable: {}", args.name, report.reason);
    }

    let path = settings
        .store()
        .save_authored(&args.name, &descriptor, report.valid)
        .with_context(|| format!("failed to store imported map `{}`", args.name))?;
    println!("saved {}", path.display());
    Ok(())
}

pub(crate) fn delete(settings: &Settings, args: &NameArgs) -> Result<()> {
    settings
        .store()
        .delete(&args.name)
        .with_context(|| format!("failed to delete map `{}`", args.name))?;
    println!("deleted {}", args.name);
    Ok(())
}

fn load(store: &MapStore, name: &str) -> Result<MapDescriptor> {
    store
        .load(name)
        .with_context(|| format!("map `{name}` could not be loaded"))
}

fn instantiate(settings: &Settings, name: &str, descriptor: MapDescriptor) -> World {
    let mut world = World::with_config(world::Config::new(
        settings.geometry(),
        BlockCatalog::standard(),
    ));
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadMap {
            name: name.to_owned(),
            descriptor,
        },
        &mut events,
    );
    world
}
