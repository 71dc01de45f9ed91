use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use brawl_arena_core::{BuildArea, GridGeometry, DEFAULT_GRID_SIZE};
use brawl_arena_persistence::{MapStore, SavePolicy};
use brawl_arena_rendering::SpriteTable;
use brawl_arena_system_match::{Config as MatchConfig, LobbyGate};
use serde::Deserialize;

/// Settings loaded from the optional `arena.toml` file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) grid: GridSettings,
    #[serde(rename = "match")]
    pub(crate) match_rules: MatchSettings,
    pub(crate) storage: StorageSettings,
    pub(crate) sprites: SpriteSettings,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GridSettings {
    pub(crate) size: f32,
    pub(crate) min_x: f32,
    pub(crate) max_x: f32,
    pub(crate) min_y: f32,
    pub(crate) max_y: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        let area = BuildArea::default();
        Self {
            size: DEFAULT_GRID_SIZE,
            min_x: area.min_x,
            max_x: area.max_x,
            min_y: area.min_y,
            max_y: area.max_y,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum GateSetting {
    #[default]
    LastStanding,
    StartSignal,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MatchSettings {
    pub(crate) min_players: usize,
    pub(crate) wins_needed: u32,
    pub(crate) countdown_ticks: u32,
    pub(crate) countdown_step_ms: u64,
    pub(crate) round_pause_ms: u64,
    pub(crate) trophy_pause_ms: u64,
    pub(crate) elimination_interval_ms: u64,
    pub(crate) spawn_tolerance: f32,
    pub(crate) trophy_map: String,
    pub(crate) lobby_map: Option<String>,
    pub(crate) lobby_gate: GateSetting,
    pub(crate) seed: u64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        let config = MatchConfig::default();
        Self {
            min_players: config.min_players,
            wins_needed: config.wins_needed,
            countdown_ticks: config.countdown_ticks,
            countdown_step_ms: millis(config.countdown_step),
            round_pause_ms: millis(config.round_pause),
            trophy_pause_ms: millis(config.trophy_pause),
            elimination_interval_ms: millis(config.elimination_interval),
            spawn_tolerance: config.spawn_tolerance,
            trophy_map: config.trophy_map,
            lobby_map: config.lobby_map,
            lobby_gate: GateSetting::LastStanding,
            seed: config.rng_seed,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct StorageSettings {
    pub(crate) user_dir: PathBuf,
    pub(crate) builtin_dir: Option<PathBuf>,
    pub(crate) allow_untested: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            user_dir: PathBuf::from("maps"),
            builtin_dir: None,
            allow_untested: false,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SpriteSettings {
    pub(crate) manifest: Option<PathBuf>,
}

impl Settings {
    /// Loads settings from the file, or returns defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse settings at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid settings toml")
    }

    pub(crate) fn geometry(&self) -> GridGeometry {
        let grid = &self.grid;
        GridGeometry::new(
            grid.size,
            BuildArea::new(grid.min_x, grid.max_x, grid.min_y, grid.max_y),
        )
    }

    pub(crate) fn match_config(&self) -> MatchConfig {
        let rules = &self.match_rules;
        MatchConfig {
            geometry: self.geometry(),
            min_players: rules.min_players,
            wins_needed: rules.wins_needed.max(1),
            countdown_ticks: rules.countdown_ticks,
            countdown_step: Duration::from_millis(rules.countdown_step_ms),
            round_pause: Duration::from_millis(rules.round_pause_ms),
            trophy_pause: Duration::from_millis(rules.trophy_pause_ms),
            elimination_interval: Duration::from_millis(rules.elimination_interval_ms),
            spawn_tolerance: rules.spawn_tolerance,
            trophy_map: rules.trophy_map.clone(),
            lobby_map: rules.lobby_map.clone(),
            lobby_gate: match rules.lobby_gate {
                GateSetting::LastStanding => LobbyGate::LastStanding,
                GateSetting::StartSignal => LobbyGate::StartSignal,
            },
            rng_seed: rules.seed,
        }
    }

    pub(crate) fn store(&self) -> MapStore {
        let storage = &self.storage;
        let policy = if storage.allow_untested {
            SavePolicy::AllowUntested
        } else {
            SavePolicy::RequireValidation
        };
        let store = MapStore::new(&storage.user_dir).with_policy(policy);
        match &storage.builtin_dir {
            Some(dir) => store.with_builtin_dir(dir),
            None => store,
        }
    }

    pub(crate) fn sprites(&self) -> Result<Option<SpriteTable>> {
        self.sprites
            .manifest
            .as_ref()
            .map(SpriteTable::from_manifest_path)
            .transpose()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
