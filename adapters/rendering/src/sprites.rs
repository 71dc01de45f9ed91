use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use brawl_arena_core::{BlockType, TileVariant};
use log::debug;

use crate::SpriteKey;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Sprite paths resolved from a manifest, with a fallback for missing entries.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteTable {
    default: PathBuf,
    blocks: HashMap<BlockType, PathBuf>,
    platform: HashMap<TileVariant, PathBuf>,
}

impl SpriteTable {
    /// Creates a table that resolves every key to the provided sprite.
    #[must_use]
    pub fn new(default: impl Into<PathBuf>) -> Self {
        Self {
            default: default.into(),
            blocks: HashMap::new(),
            platform: HashMap::new(),
        }
    }

    /// Loads the manifest located at the provided path.
    ///
    /// Sprite paths are resolved relative to the manifest's directory.
    pub fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read sprite manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_manifest_str(&contents, &base)
    }

    /// Parses manifest contents, resolving sprite paths against `base_path`.
    pub fn from_manifest_str(contents: &str, base_path: &Path) -> Result<Self> {
        let manifest: Manifest =
            toml::from_str(contents).context("failed to parse sprite manifest toml contents")?;
        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            bail!(
                "unsupported sprite manifest version {}; expected {}",
                manifest.version,
                SUPPORTED_MANIFEST_VERSION
            );
        }

        let mut table = Self::new(base_path.join(manifest.default));
        for (name, relative_path) in manifest.blocks {
            let Some(kind) = BlockType::ALL
                .into_iter()
                .find(|kind| format!("{kind:?}") == name)
            else {
                bail!("unknown block type `{name}` in sprite manifest");
            };
            let _ = table.blocks.insert(kind, base_path.join(relative_path));
        }
        for (name, relative_path) in manifest.platform {
            let Some(variant) = TileVariant::ALL
                .into_iter()
                .find(|variant| format!("{variant:?}") == name)
            else {
                bail!("unknown tile variant `{name}` in sprite manifest");
            };
            let _ = table.platform.insert(variant, base_path.join(relative_path));
        }

        let missing = TileVariant::ALL.len() - table.platform.len();
        if missing > 0 {
            debug!("{missing} platform variants fall back to the default sprite");
        }
        Ok(table)
    }

    /// Sprite drawn for the key.
    ///
    /// Platform variants without an entry use the platform sprite, and any
    /// other missing entry uses the default sprite.
    #[must_use]
    pub fn resolve(&self, key: SpriteKey) -> &Path {
        let path = match key {
            SpriteKey::Block(kind) => self.blocks.get(&kind),
            SpriteKey::Platform(variant) => self
                .platform
                .get(&variant)
                .or_else(|| self.blocks.get(&BlockType::Platform)),
        };
        path.unwrap_or(&self.default)
    }

    /// Sprite used when no entry matches.
    #[must_use]
    pub fn default_sprite(&self) -> &Path {
        &self.default
    }
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    default: String,
    #[serde(default)]
    blocks: HashMap<String, String>,
    #[serde(default)]
    platform: HashMap<String, String>,
}
