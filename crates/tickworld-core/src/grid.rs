//! Occlusion grid: per-cell exclusive ownership of world cells.
//!
//! Each cell is either free, permanently blocked by terrain, or occluded by
//! exactly one object. Terrain and object occlusion are tracked separately so
//! an object can stand on a terrain cell without either overwriting the other.

use crate::geometry::{Footprint, Position};
use crate::ids::ObjectId;

/// The occupancy layer the navigator searches over.
#[derive(Debug, Clone)]
pub struct OcclusionGrid {
    width: u32,
    height: u32,
    terrain: Vec<bool>,
    owners: Vec<Option<ObjectId>>,
}

impl OcclusionGrid {
    /// Create an empty grid of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let cells = u64::from(width)
            .checked_mul(u64::from(height))
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        Self {
            width,
            height,
            terrain: vec![false; cells],
            owners: vec![None; cells],
        }
    }

    /// Grid width in cells.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the cell lies inside the grid.
    pub fn contains(&self, cell: Position) -> bool {
        self.index(cell).is_some()
    }

    /// The object occluding `cell`, if any.
    pub fn owner(&self, cell: Position) -> Option<&ObjectId> {
        self.index(cell)
            .and_then(|i| self.owners.get(i))
            .and_then(Option::as_ref)
    }

    /// Whether `cell` is permanent terrain. Cells outside the grid count as terrain.
    pub fn is_terrain(&self, cell: Position) -> bool {
        self.index(cell)
            .and_then(|i| self.terrain.get(i).copied())
            .unwrap_or(true)
    }

    /// Mark a rectangle as impassable terrain. Cells outside the grid are ignored.
    pub fn block_terrain(&mut self, origin: Position, size: Footprint) {
        for cell in size.cells(origin) {
            if let Some(slot) = self.index(cell).and_then(|i| self.terrain.get_mut(i)) {
                *slot = true;
            }
        }
    }

    /// Mark the footprint of `id` as occluded by it.
    ///
    /// # Panics
    ///
    /// Panics if any cell is already owned by a different object. Two
    /// occluding footprints overlapping is a programming error: the world
    /// rejects such objects on insertion.
    pub fn occlude(&mut self, id: &ObjectId, origin: Position, size: Footprint) {
        for cell in size.cells(origin) {
            let Some(slot) = self.index(cell).and_then(|i| self.owners.get_mut(i)) else {
                continue;
            };
            if let Some(existing) = slot.as_ref() {
                assert!(
                    existing == id,
                    "cell {cell} is already occluded by '{existing}', cannot occlude it by '{id}'"
                );
            }
            *slot = Some(id.clone());
        }
    }

    /// Release every cell of the footprint that is owned by `id`.
    pub fn clear(&mut self, id: &ObjectId, origin: Position, size: Footprint) {
        for cell in size.cells(origin) {
            if let Some(slot) = self.index(cell).and_then(|i| self.owners.get_mut(i))
                && slot.as_ref() == Some(id)
            {
                *slot = None;
            }
        }
    }

    /// Flat index of a cell, or `None` when it lies outside the grid.
    fn index(&self, cell: Position) -> Option<usize> {
        let x = u32::try_from(cell.x).ok()?;
        let y = u32::try_from(cell.y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let flat = u64::from(y)
            .checked_mul(u64::from(self.width))?
            .checked_add(u64::from(x))?;
        usize::try_from(flat).ok()
    }
}
