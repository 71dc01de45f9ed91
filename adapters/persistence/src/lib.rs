#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! File-backed storage for authored arena maps.
//!
//! Maps are stored as field-named JSON with every byte XOR-ed against a fixed
//! key, one `<name>.map` file per map. A store reads from a writable user
//! directory and, optionally, a read-only directory of maps shipped with the
//! game.

mod transfer;

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use brawl_arena_core::{MapDescriptor, MapLibrary};
use log::{debug, info, warn};
use thiserror::Error;

pub use transfer::{decode_share_string, encode_share_string, ShareStringError, SHARE_HEADER};

/// File extension used for stored maps.
pub const MAP_EXTENSION: &str = "map";

const OBFUSCATION_KEY: u8 = 0x5A;

/// Errors raised while writing, listing or deleting maps.
#[derive(Debug, Error)]
pub enum MapStoreError {
    /// The name cannot be used as a file stem.
    #[error("map name `{0}` is not a valid file name")]
    InvalidName(String),
    /// The save policy requires a passing validation first.
    #[error("map `{0}` has not passed validation")]
    NotValidated(String),
    /// No stored map carries the name.
    #[error("map `{0}` does not exist")]
    NotFound(String),
    /// The file system rejected the operation.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The descriptor could not be encoded.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Gate applied to maps saved from the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SavePolicy {
    /// Only maps that passed validation since their last edit may be saved.
    #[default]
    RequireValidation,
    /// Any map may be saved.
    AllowUntested,
}

/// Directory-backed map storage.
#[derive(Clone, Debug)]
pub struct MapStore {
    user_dir: PathBuf,
    builtin_dir: Option<PathBuf>,
    policy: SavePolicy,
}

impl MapStore {
    /// Creates a store writing into the provided user directory.
    #[must_use]
    pub fn new(user_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_dir: user_dir.into(),
            builtin_dir: None,
            policy: SavePolicy::default(),
        }
    }

    /// Adds a read-only directory of shipped maps consulted after the user directory.
    #[must_use]
    pub fn with_builtin_dir(mut self, builtin_dir: impl Into<PathBuf>) -> Self {
        self.builtin_dir = Some(builtin_dir.into());
        self
    }

    /// Replaces the policy applied by [`MapStore::save_authored`].
    #[must_use]
    pub fn with_policy(mut self, policy: SavePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Directory user maps are written to.
    #[must_use]
    pub fn user_dir(&self) -> &Path {
        &self.user_dir
    }

    /// Policy applied to editor saves.
    #[must_use]
    pub fn policy(&self) -> SavePolicy {
        self.policy
    }

    /// Writes the descriptor to `<user_dir>/<name>.map`, replacing any previous file.
    pub fn save(&self, name: &str, descriptor: &MapDescriptor) -> Result<PathBuf, MapStoreError> {
        check_name(name)?;
        let data = encode_map(descriptor)?;
        fs::create_dir_all(&self.user_dir)?;

        let path = map_path(&self.user_dir, name);
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &path)?;

        info!("saved map `{name}` with {} blocks", descriptor.blocks.len());
        debug!("wrote {} bytes to {}", data.len(), path.display());
        Ok(path)
    }

    /// Saves a map authored in the editor, honouring the store's [`SavePolicy`].
    pub fn save_authored(
        &self,
        name: &str,
        descriptor: &MapDescriptor,
        validated: bool,
    ) -> Result<PathBuf, MapStoreError> {
        if self.policy == SavePolicy::RequireValidation && !validated {
            return Err(MapStoreError::NotValidated(name.to_owned()));
        }
        self.save(name, descriptor)
    }

    /// Loads a map from the user directory, falling back to the shipped maps.
    ///
    /// Missing, empty and corrupt files yield `None` and are logged.
    #[must_use]
    pub fn load(&self, name: &str) -> Option<MapDescriptor> {
        if check_name(name).is_err() {
            warn!("refusing to load map with invalid name `{name}`");
            return None;
        }

        let Some(path) = self
            .directories()
            .map(|dir| map_path(dir, name))
            .find(|path| path.is_file())
        else {
            warn!("map `{name}` not found");
            return None;
        };

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(error) => {
                warn!("could not read map `{name}` from {}: {error}", path.display());
                return None;
            }
        };
        if data.is_empty() {
            warn!("map file {} is empty", path.display());
            return None;
        }

        match decode_map(&data) {
            Ok(descriptor) => {
                info!("loaded map `{name}` from {}", path.display());
                Some(descriptor)
            }
            Err(error) => {
                warn!("map file {} is corrupt: {error}", path.display());
                None
            }
        }
    }

    /// Sorted names of the maps in the user directory.
    pub fn list_maps(&self) -> Result<Vec<String>, MapStoreError> {
        list_dir(&self.user_dir)
    }

    /// Sorted names of the shipped maps.
    pub fn list_builtin_maps(&self) -> Result<Vec<String>, MapStoreError> {
        match &self.builtin_dir {
            Some(dir) => list_dir(dir),
            None => Ok(Vec::new()),
        }
    }

    /// Deletes a map from the user directory.
    pub fn delete(&self, name: &str) -> Result<(), MapStoreError> {
        check_name(name)?;
        let path = map_path(&self.user_dir, name);
        if !path.is_file() {
            return Err(MapStoreError::NotFound(name.to_owned()));
        }
        fs::remove_file(&path)?;
        info!("deleted map `{name}`");
        Ok(())
    }

    fn directories(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.user_dir.as_path()).chain(self.builtin_dir.as_deref())
    }
}

impl MapLibrary for MapStore {
    fn map_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for listing in [self.list_maps(), self.list_builtin_maps()] {
            match listing {
                Ok(found) => names.extend(found),
                Err(error) => warn!("could not list maps: {error}"),
            }
        }
        names.sort();
        names.dedup();
        names
    }

    fn load_map(&self, name: &str) -> Option<MapDescriptor> {
        self.load(name)
    }
}

/// XORs every byte with the storage key; applying it twice restores the input.
pub fn obfuscate(bytes: &mut [u8]) {
    for byte in bytes {
        *byte ^= OBFUSCATION_KEY;
    }
}

/// Encodes a descriptor into its stored byte form.
pub fn encode_map(descriptor: &MapDescriptor) -> Result<Vec<u8>, serde_json::Error> {
    let mut data = serde_json::to_vec(descriptor)?;
    obfuscate(&mut data);
    Ok(data)
}

/// Decodes a descriptor from its stored byte form.
pub fn decode_map(data: &[u8]) -> Result<MapDescriptor, serde_json::Error> {
    let mut json = data.to_vec();
    obfuscate(&mut json);
    serde_json::from_slice(&json)
}

fn check_name(name: &str) -> Result<(), MapStoreError> {
    let valid = !name.trim().is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.'));
    if valid {
        Ok(())
    } else {
        Err(MapStoreError::InvalidName(name.to_owned()))
    }
}

fn map_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{MAP_EXTENSION}"))
}

fn list_dir(dir: &Path) -> Result<Vec<String>, MapStoreError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(MAP_EXTENSION)
        {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            names.push(stem.to_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brawl_arena_core::{BlockRecord, BlockType, WorldPoint};

    #[test]
    fn obfuscation_is_an_involution() {
        let mut bytes = b"{\"blocks\":[]}".to_vec();
        obfuscate(&mut bytes);
        assert_ne!(bytes.first(), Some(&b'{'));
        obfuscate(&mut bytes);
        assert_eq!(bytes, b"{\"blocks\":[]}");
    }

    #[test]
    fn stored_bytes_decode_to_field_named_json() {
        let descriptor = MapDescriptor::new(vec![BlockRecord::new(
            BlockType::Platform,
            WorldPoint::new(0.0, -3.0),
        )]);
        let mut data = encode_map(&descriptor).expect("encode");
        obfuscate(&mut data);
        assert_eq!(
            String::from_utf8(data).expect("utf8"),
            r#"{"blocks":[{"type":"Platform","position":{"x":0.0,"y":-3.0}}]}"#
        );
    }

    #[test]
    fn names_must_be_plain_file_stems() {
        assert!(check_name("sky temple").is_ok());
        assert!(check_name("arena_02").is_ok());
        assert!(check_name("").is_err());
        assert!(check_name("..").is_err());
        assert!(check_name("../escape").is_err());
        assert!(check_name("nested/map").is_err());
    }
}
