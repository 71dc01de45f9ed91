#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Structural map validation ensuring every spawn rests above a platform.

use std::{collections::HashMap, fmt};

use brawl_arena_core::{BlockType, Direction, GridCell, GridGeometry, MapDescriptor, MapView};

/// Minimum number of spawn blocks a playable map must provide.
pub const MIN_SPAWNS: usize = 4;

/// Specific structural defect found in a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The map does not provide enough spawn blocks.
    TooFewSpawns {
        /// Number of spawns found.
        found: usize,
    },
    /// A non-platform block sits between a spawn and the ground beneath it.
    SpawnBlocked {
        /// Cell of the affected spawn.
        spawn: GridCell,
        /// Type of the obstructing block.
        blocker: BlockType,
        /// Cell of the obstructing block.
        at: GridCell,
    },
    /// Nothing but empty cells lie beneath the spawn until the build area ends.
    SpawnUnsupported {
        /// Cell of the affected spawn.
        spawn: GridCell,
    },
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewSpawns { found } => write!(
                f,
                "map needs at least {MIN_SPAWNS} spawn points but has {found}"
            ),
            Self::SpawnBlocked { spawn, blocker, at } => write!(
                f,
                "spawn at ({}, {}) is blocked by a {blocker:?} at ({}, {}) before reaching a platform",
                spawn.column(),
                spawn.row(),
                at.column(),
                at.row()
            ),
            Self::SpawnUnsupported { spawn } => write!(
                f,
                "spawn at ({}, {}) has no platform beneath it",
                spawn.column(),
                spawn.row()
            ),
        }
    }
}

/// Outcome of a validation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    /// Whether every check passed.
    pub valid: bool,
    /// Human-readable summary of the outcome.
    pub reason: String,
    /// Every defect found, in spawn order.
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    fn from_failures(failures: Vec<ValidationFailure>) -> Self {
        if failures.is_empty() {
            return Self {
                valid: true,
                reason: "map is valid".to_owned(),
                failures,
            };
        }
        let reason = failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            valid: false,
            reason,
            failures,
        }
    }
}

/// Validates a set of blocks given as `(type, cell)` pairs in placement order.
#[must_use]
pub fn validate<I>(blocks: I, geometry: &GridGeometry) -> ValidationReport
where
    I: IntoIterator<Item = (BlockType, GridCell)>,
{
    let mut spawns = Vec::new();
    let mut by_cell: HashMap<GridCell, BlockType> = HashMap::new();
    for (kind, cell) in blocks {
        if kind == BlockType::Spawn {
            spawns.push(cell);
        }
        let _ = by_cell.entry(cell).or_insert(kind);
    }

    if spawns.len() < MIN_SPAWNS {
        return ValidationReport::from_failures(vec![ValidationFailure::TooFewSpawns {
            found: spawns.len(),
        }]);
    }

    let failures = spawns
        .into_iter()
        .filter_map(|spawn| check_spawn(spawn, &by_cell, geometry))
        .collect();
    ValidationReport::from_failures(failures)
}

/// Validates the active map captured in a world view.
#[must_use]
pub fn validate_view(view: &MapView, geometry: &GridGeometry) -> ValidationReport {
    validate(view.iter().map(|block| (block.kind, block.cell)), geometry)
}

/// Validates a persisted map without instantiating it.
#[must_use]
pub fn validate_descriptor(
    descriptor: &MapDescriptor,
    geometry: &GridGeometry,
) -> ValidationReport {
    validate(
        descriptor
            .blocks
            .iter()
            .map(|record| (record.kind, geometry.cell_of(record.position))),
        geometry,
    )
}

fn check_spawn(
    spawn: GridCell,
    blocks: &HashMap<GridCell, BlockType>,
    geometry: &GridGeometry,
) -> Option<ValidationFailure> {
    let mut cell = spawn.neighbor(Direction::Down);
    while geometry.contains_cell(cell) {
        match blocks.get(&cell) {
            Some(BlockType::Platform) => return None,
            Some(blocker) => {
                return Some(ValidationFailure::SpawnBlocked {
                    spawn,
                    blocker: *blocker,
                    at: cell,
                })
            }
            None => cell = cell.neighbor(Direction::Down),
        }
    }
    Some(ValidationFailure::SpawnUnsupported { spawn })
}

#[cfg(test)]
mod tests {
    use super::*;
    use brawl_arena_core::BuildArea;

    fn geometry() -> GridGeometry {
        GridGeometry::new(1.0, BuildArea::new(-6.0, 6.0, -4.0, 4.0))
    }

    #[test]
    fn reason_lists_every_failure() {
        let blocks = vec![
            (BlockType::Spawn, GridCell::new(-3, 2)),
            (BlockType::Spawn, GridCell::new(-1, 2)),
            (BlockType::Spawn, GridCell::new(1, 2)),
            (BlockType::Spawn, GridCell::new(3, 2)),
            (BlockType::Platform, GridCell::new(-3, 0)),
            (BlockType::Platform, GridCell::new(-1, 0)),
            (BlockType::Spike, GridCell::new(1, 1)),
        ];
        let report = validate(blocks, &geometry());

        assert!(!report.valid);
        assert_eq!(report.failures.len(), 2);
        assert!(report.reason.contains("blocked by a Spike"));
        assert!(report.reason.contains("spawn at (3, 2) has no platform"));
    }

    #[test]
    fn valid_report_has_no_failures() {
        let blocks = (0..4).flat_map(|column| {
            [
                (BlockType::Spawn, GridCell::new(column, 1)),
                (BlockType::Platform, GridCell::new(column, -3)),
            ]
        });
        let report = validate(blocks, &geometry());
        assert!(report.valid, "{}", report.reason);
        assert!(report.failures.is_empty());
    }
}
