use std::collections::HashMap;

use brawl_arena_core::{
    BlockCatalog, BlockSnapshot, BlockType, Event, GridCell, GridGeometry, InstanceHandle,
    PlacementError, TileVariant, WorldPoint,
};
use brawl_arena_system_tiling::resolve_grid;

/// Block instantiated on the active map.
#[derive(Clone, Debug)]
pub(crate) struct PlacedBlock {
    pub(crate) handle: InstanceHandle,
    pub(crate) kind: BlockType,
    pub(crate) cell: GridCell,
    pub(crate) position: WorldPoint,
    pub(crate) variant: Option<TileVariant>,
}

impl PlacedBlock {
    pub(crate) fn snapshot(&self) -> BlockSnapshot {
        BlockSnapshot {
            handle: self.handle,
            kind: self.kind,
            cell: self.cell,
            position: self.position,
            variant: self.variant,
        }
    }
}

/// Ordered set of placed blocks with at most one block per cell.
#[derive(Debug)]
pub(crate) struct MapGrid {
    blocks: Vec<PlacedBlock>,
    next_handle: u32,
}

impl MapGrid {
    pub(crate) fn new() -> Self {
        Self {
            blocks: Vec::new(),
            next_handle: 0,
        }
    }

    pub(crate) fn blocks(&self) -> &[PlacedBlock] {
        &self.blocks
    }

    pub(crate) fn block_at(&self, cell: GridCell) -> Option<&PlacedBlock> {
        self.blocks.iter().find(|block| block.cell == cell)
    }

    pub(crate) fn is_occupied(&self, cell: GridCell) -> bool {
        self.block_at(cell).is_some()
    }

    pub(crate) fn handles_of(&self, kind: BlockType) -> Vec<InstanceHandle> {
        self.blocks
            .iter()
            .filter(|block| block.kind == kind)
            .map(|block| block.handle)
            .collect()
    }

    /// Checks the editor placement rules for a block landing in `cell`.
    pub(crate) fn placement_rejection(
        &self,
        geometry: &GridGeometry,
        kind: BlockType,
        cell: GridCell,
    ) -> Option<PlacementError> {
        if !geometry.contains_cell(cell) {
            return Some(PlacementError::OutOfBounds);
        }
        if self.is_occupied(cell) {
            return Some(PlacementError::Occupied);
        }
        if kind == BlockType::Crate {
            let spawns = self
                .blocks
                .iter()
                .filter(|block| block.kind == BlockType::Spawn);
            for spawn in spawns {
                if spawn.cell.chebyshev_distance(cell) <= 1 {
                    return Some(PlacementError::CrateNearSpawn);
                }
                if spawn.cell.column() == cell.column() && cell.row() > spawn.cell.row() {
                    return Some(PlacementError::CrateAboveSpawn);
                }
            }
        }
        None
    }

    /// Instantiates a block through the catalog. The caller checks occupancy.
    pub(crate) fn instantiate(
        &mut self,
        catalog: &BlockCatalog,
        geometry: &GridGeometry,
        kind: BlockType,
        cell: GridCell,
        out_events: &mut Vec<Event>,
    ) -> InstanceHandle {
        let handle = self.allocate_handle();
        let position = cell.to_point(geometry.grid_size());
        let prototype = catalog.prototype(kind);
        self.blocks.push(PlacedBlock {
            handle,
            kind,
            cell,
            position,
            variant: None,
        });
        out_events.push(Event::BlockPlaced {
            handle,
            kind,
            cell,
            position,
            asset: prototype.asset,
        });
        handle
    }

    /// Removes the block in `cell`, destroying its instance.
    pub(crate) fn remove_at(&mut self, cell: GridCell, out_events: &mut Vec<Event>) -> bool {
        let Some(index) = self.blocks.iter().position(|block| block.cell == cell) else {
            return false;
        };
        let block = self.blocks.remove(index);
        out_events.push(Event::BlockRemoved {
            handle: block.handle,
            kind: block.kind,
            cell: block.cell,
        });
        true
    }

    /// Destroys and re-instantiates every `from` block as `to`, keeping order.
    pub(crate) fn swap_kind(
        &mut self,
        catalog: &BlockCatalog,
        from: BlockType,
        to: BlockType,
        out_events: &mut Vec<Event>,
    ) -> usize {
        let prototype = catalog.prototype(to);
        let mut swapped = 0;
        for index in 0..self.blocks.len() {
            if self.blocks[index].kind != from {
                continue;
            }
            let handle = self.allocate_handle();
            let block = &mut self.blocks[index];
            out_events.push(Event::BlockRemoved {
                handle: block.handle,
                kind: block.kind,
                cell: block.cell,
            });
            block.handle = handle;
            block.kind = to;
            block.variant = None;
            out_events.push(Event::BlockPlaced {
                handle,
                kind: to,
                cell: block.cell,
                position: block.position,
                asset: prototype.asset,
            });
            swapped += 1;
        }
        swapped
    }

    /// Destroys every block.
    pub(crate) fn clear(&mut self, out_events: &mut Vec<Event>) {
        for block in self.blocks.drain(..) {
            out_events.push(Event::BlockRemoved {
                handle: block.handle,
                kind: block.kind,
                cell: block.cell,
            });
        }
    }

    /// Full adjacency pass over every tiled block; announces changed variants.
    pub(crate) fn retile(&mut self, out_events: &mut Vec<Event>) {
        let variants: HashMap<GridCell, TileVariant> = resolve_grid(
            self.blocks
                .iter()
                .filter(|block| block.kind.is_tiled())
                .map(|block| block.cell),
        )
        .into_iter()
        .collect();

        for block in self.blocks.iter_mut() {
            let variant = variants.get(&block.cell).copied();
            if block.variant != variant {
                block.variant = variant;
                if let Some(variant) = variant {
                    out_events.push(Event::BlockRetiled {
                        handle: block.handle,
                        variant,
                    });
                }
            }
        }
    }

    fn allocate_handle(&mut self) -> InstanceHandle {
        let handle = InstanceHandle::new(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        handle
    }
}
