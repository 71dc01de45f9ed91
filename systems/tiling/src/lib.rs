#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure adjacency tiling system that selects a visual variant for every tiled block.
//!
//! The resolver only looks at which of the four cardinal neighbors are
//! occupied, so it can be exercised without any rendering context. Variant
//! names describe the face that is drawn, which is the side opposite the
//! neighbors that exist.

use std::collections::{BTreeMap, HashSet};

use brawl_arena_core::{Direction, GridCell, Neighbors, TileVariant};

/// Selects the visual variant for a cell from its neighbor flags.
#[must_use]
pub fn resolve(neighbors: Neighbors) -> TileVariant {
    let Neighbors {
        up,
        down,
        left,
        right,
    } = neighbors;

    match neighbors.connection_count() {
        0 => TileVariant::Single,
        1 => {
            if down {
                TileVariant::SingleTop
            } else if up {
                TileVariant::SingleBottom
            } else if right {
                TileVariant::SingleLeft
            } else {
                TileVariant::SingleRight
            }
        }
        2 => match (up, down, left, right) {
            (true, false, false, true) => TileVariant::BottomLeftCorner,
            (true, false, true, false) => TileVariant::BottomRightCorner,
            (false, true, false, true) => TileVariant::TopLeftCorner,
            (false, true, true, false) => TileVariant::TopRightCorner,
            (true, true, false, false) => TileVariant::VerticalOpen,
            _ => TileVariant::HorizontalOpen,
        },
        3 => {
            if !up {
                TileVariant::Top
            } else if !down {
                TileVariant::Bottom
            } else if !left {
                TileVariant::Left
            } else {
                TileVariant::Right
            }
        }
        _ => TileVariant::Center,
    }
}

/// Resolves the variant of `cell` using an occupancy lookup for its neighbors.
pub fn resolve_cell<F>(cell: GridCell, mut has_neighbor: F) -> TileVariant
where
    F: FnMut(GridCell) -> bool,
{
    let mut flags = [false; 4];
    for (flag, direction) in flags.iter_mut().zip(Direction::ALL) {
        *flag = has_neighbor(cell.neighbor(direction));
    }
    resolve(Neighbors::new(flags[0], flags[1], flags[2], flags[3]))
}

/// Runs a full tiling pass over a set of tiled cells.
///
/// Only cells in the provided set count as neighbors. The result is keyed by
/// cell so repeated passes over the same set are identical.
#[must_use]
pub fn resolve_grid<I>(cells: I) -> BTreeMap<GridCell, TileVariant>
where
    I: IntoIterator<Item = GridCell>,
{
    let occupied: HashSet<GridCell> = cells.into_iter().collect();
    occupied
        .iter()
        .map(|cell| {
            let variant = resolve_cell(*cell, |neighbor| occupied.contains(&neighbor));
            (*cell, variant)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(up: bool, down: bool, left: bool, right: bool) -> Neighbors {
        Neighbors::new(up, down, left, right)
    }

    #[test]
    fn isolated_and_enclosed_cells() {
        assert_eq!(resolve(flags(false, false, false, false)), TileVariant::Single);
        assert_eq!(resolve(flags(true, true, true, true)), TileVariant::Center);
    }

    #[test]
    fn single_connection_draws_opposite_face() {
        assert_eq!(resolve(flags(false, true, false, false)), TileVariant::SingleTop);
        assert_eq!(resolve(flags(true, false, false, false)), TileVariant::SingleBottom);
        assert_eq!(resolve(flags(false, false, false, true)), TileVariant::SingleLeft);
        assert_eq!(resolve(flags(false, false, true, false)), TileVariant::SingleRight);
    }

    #[test]
    fn diagonal_pairs_name_the_opposite_corner() {
        assert_eq!(resolve(flags(true, false, false, true)), TileVariant::BottomLeftCorner);
        assert_eq!(resolve(flags(true, false, true, false)), TileVariant::BottomRightCorner);
        assert_eq!(resolve(flags(false, true, false, true)), TileVariant::TopLeftCorner);
        assert_eq!(resolve(flags(false, true, true, false)), TileVariant::TopRightCorner);
    }

    #[test]
    fn opposite_pairs_open_a_channel() {
        assert_eq!(resolve(flags(true, true, false, false)), TileVariant::VerticalOpen);
        assert_eq!(resolve(flags(false, false, true, true)), TileVariant::HorizontalOpen);
    }

    #[test]
    fn three_connections_draw_missing_face() {
        assert_eq!(resolve(flags(false, true, true, true)), TileVariant::Top);
        assert_eq!(resolve(flags(true, false, true, true)), TileVariant::Bottom);
        assert_eq!(resolve(flags(true, true, false, true)), TileVariant::Left);
        assert_eq!(resolve(flags(true, true, true, false)), TileVariant::Right);
    }

    #[test]
    fn connection_count_determines_variant_category() {
        let categories: [&[TileVariant]; 5] = [
            &[TileVariant::Single],
            &[
                TileVariant::SingleTop,
                TileVariant::SingleBottom,
                TileVariant::SingleLeft,
                TileVariant::SingleRight,
            ],
            &[
                TileVariant::BottomLeftCorner,
                TileVariant::BottomRightCorner,
                TileVariant::TopLeftCorner,
                TileVariant::TopRightCorner,
                TileVariant::VerticalOpen,
                TileVariant::HorizontalOpen,
            ],
            &[
                TileVariant::Top,
                TileVariant::Bottom,
                TileVariant::Left,
                TileVariant::Right,
            ],
            &[TileVariant::Center],
        ];

        let mut two_count_variants = HashSet::new();
        for mask in 0u8..16 {
            let neighbors = flags(mask & 1 != 0, mask & 2 != 0, mask & 4 != 0, mask & 8 != 0);
            let count = usize::from(neighbors.connection_count());
            let variant = resolve(neighbors);
            assert!(
                categories[count].contains(&variant),
                "{neighbors:?} resolved to {variant:?} outside its category",
            );
            assert_eq!(resolve(neighbors), variant, "resolution must be deterministic");
            if count == 2 {
                assert!(two_count_variants.insert(variant), "two-count variants must be distinct");
            }
        }
        assert_eq!(two_count_variants.len(), 6, "all six pairs are classified");
    }

    #[test]
    fn grid_pass_tiles_a_platform_row() {
        let cells = [GridCell::new(0, 0), GridCell::new(1, 0), GridCell::new(2, 0)];
        let variants = resolve_grid(cells);

        assert_eq!(variants.get(&GridCell::new(0, 0)), Some(&TileVariant::SingleLeft));
        assert_eq!(variants.get(&GridCell::new(1, 0)), Some(&TileVariant::HorizontalOpen));
        assert_eq!(variants.get(&GridCell::new(2, 0)), Some(&TileVariant::SingleRight));
    }

    #[test]
    fn grid_pass_ignores_call_order() {
        let forward = resolve_grid([GridCell::new(0, 0), GridCell::new(0, 1), GridCell::new(1, 1)]);
        let backward = resolve_grid([
            GridCell::new(1, 1),
            GridCell::new(0, 1),
            GridCell::new(0, 0),
        ]);
        assert_eq!(forward, backward);
        assert_eq!(forward.get(&GridCell::new(0, 1)), Some(&TileVariant::TopLeftCorner));
    }
}
