//! Occlusion-aware grid pathfinding.
//!
//! The [`Navigator`] owns the [`OcclusionGrid`] and keeps it in step with the
//! world's objects lazily: occlusion is re-synchronised at the start of every
//! path query rather than on every object insertion or removal. Paths are
//! found with A* over 4-connected cells at uniform cost.
//!
//! A query runs up to two passes. The strict pass treats every cell occluded
//! by an object other than the target as a wall. When that fails, a relaxed
//! pass lets the caller name which occluders could be cleared out of the way
//! (objects with a removable interaction); a relaxed success becomes a
//! [`PathError::Blocked`] diagnostic naming the object in the way, so the
//! agent learns what to deal with first.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use tracing::debug;

use crate::error::PathError;
use crate::geometry::{Footprint, Position};
use crate::grid::OcclusionGrid;
use crate::ids::ObjectId;

/// The cells a path query is headed for.
#[derive(Debug, Clone, Copy)]
pub struct Destination<'a> {
    /// Id of the target entity, as requested.
    pub id: &'a str,
    /// Top-left cell of the target.
    pub origin: Position,
    /// Target footprint (a single cell for characters).
    pub size: Footprint,
}

impl Destination<'_> {
    fn contains(&self, cell: Position) -> bool {
        self.size.covers(self.origin, cell)
    }

    fn heuristic(&self, cell: Position) -> u32 {
        self.size.distance(self.origin, cell)
    }
}

/// Pathfinder over the occlusion grid.
#[derive(Debug, Clone)]
pub struct Navigator {
    grid: OcclusionGrid,
    recorded: BTreeMap<ObjectId, (Position, Footprint)>,
}

impl Navigator {
    /// Create a navigator for a grid of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            grid: OcclusionGrid::new(width, height),
            recorded: BTreeMap::new(),
        }
    }

    /// Read access to the occlusion grid.
    pub const fn grid(&self) -> &OcclusionGrid {
        &self.grid
    }

    /// Mark a rectangle as permanent terrain.
    pub fn block_terrain(&mut self, origin: Position, size: Footprint) {
        self.grid.block_terrain(origin, size);
    }

    /// Bring the grid in line with the current set of occluding objects.
    ///
    /// Footprints of recorded ids that are no longer present (or moved) are
    /// cleared first, then every occluder not yet recorded is marked.
    pub fn sync<'a, I>(&mut self, occluders: I)
    where
        I: IntoIterator<Item = (&'a ObjectId, Position, Footprint)>,
    {
        let current: BTreeMap<&ObjectId, (Position, Footprint)> = occluders
            .into_iter()
            .map(|(id, origin, size)| (id, (origin, size)))
            .collect();

        let stale: Vec<ObjectId> = self
            .recorded
            .iter()
            .filter(|(id, placed)| current.get(id) != Some(*placed))
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            if let Some((origin, size)) = self.recorded.remove(&id) {
                self.grid.clear(&id, origin, size);
            }
        }

        for (id, (origin, size)) in current {
            if !self.recorded.contains_key(id) {
                self.grid.occlude(id, origin, size);
                self.recorded.insert(id.clone(), (origin, size));
            }
        }
    }

    /// Find a path from `origin` to the destination on the current grid.
    ///
    /// `removable` decides which occluding objects the relaxed pass may walk
    /// through. The returned cells exclude `origin` and every cell of the
    /// destination, so following them ends adjacent to the target.
    pub fn find_path(
        &self,
        origin: Position,
        destination: &Destination<'_>,
        removable: impl Fn(&ObjectId) -> bool,
    ) -> Result<Vec<Position>, PathError> {
        if let Some(path) = self.search(origin, destination, |_| false) {
            debug!(
                target = destination.id,
                %origin,
                steps = path.len(),
                "path found"
            );
            return Ok(path);
        }

        let Some(relaxed) = self.search(origin, destination, &removable) else {
            debug!(target = destination.id, %origin, "target unreachable");
            return Err(PathError::Unreachable(destination.id.to_owned()));
        };

        let blocker = relaxed
            .iter()
            .find_map(|cell| self.grid.owner(*cell).filter(|owner| owner.as_str() != destination.id));
        match blocker {
            Some(blocker) => {
                debug!(target = destination.id, %blocker, "path blocked");
                Err(PathError::Blocked {
                    target: destination.id.to_owned(),
                    blocker: blocker.clone(),
                })
            }
            None => Err(PathError::Unreachable(destination.id.to_owned())),
        }
    }

    /// A* from `origin` to the first destination cell reached.
    ///
    /// Open-set ties on `f` are broken by insertion order.
    fn search(
        &self,
        origin: Position,
        destination: &Destination<'_>,
        passable_owner: impl Fn(&ObjectId) -> bool,
    ) -> Option<Vec<Position>> {
        if destination.contains(origin) {
            return Some(Vec::new());
        }

        let mut open: BinaryHeap<Reverse<(u32, u64, Position)>> = BinaryHeap::new();
        let mut best: BTreeMap<Position, u32> = BTreeMap::new();
        let mut prev: BTreeMap<Position, Position> = BTreeMap::new();
        let mut seq: u64 = 0;

        best.insert(origin, 0);
        open.push(Reverse((destination.heuristic(origin), seq, origin)));

        while let Some(Reverse((f, _, cell))) = open.pop() {
            let Some(&g) = best.get(&cell) else {
                continue;
            };
            // Skip entries superseded by a cheaper route.
            if f > g.saturating_add(destination.heuristic(cell)) {
                continue;
            }
            if destination.contains(cell) {
                return Some(Self::reconstruct(&prev, origin, cell));
            }

            for next in cell.neighbors() {
                if !self.grid.contains(next) {
                    continue;
                }
                let enterable = destination.contains(next)
                    || (!self.grid.is_terrain(next)
                        && self.grid.owner(next).is_none_or(&passable_owner));
                if !enterable {
                    continue;
                }
                let cost = g.saturating_add(1);
                if best.get(&next).is_none_or(|&known| cost < known) {
                    best.insert(next, cost);
                    prev.insert(next, cell);
                    seq = seq.saturating_add(1);
                    open.push(Reverse((
                        cost.saturating_add(destination.heuristic(next)),
                        seq,
                        next,
                    )));
                }
            }
        }
        None
    }

    /// Walk predecessors back from `reached`, dropping both endpoints.
    fn reconstruct(
        prev: &BTreeMap<Position, Position>,
        origin: Position,
        reached: Position,
    ) -> Vec<Position> {
        let mut path = Vec::new();
        let mut current = reached;
        while let Some(&step) = prev.get(&current) {
            if step == origin {
                break;
            }
            path.push(step);
            current = step;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn goal(origin: Position) -> Destination<'static> {
        Destination {
            id: "goal",
            origin,
            size: Footprint::UNIT,
        }
    }

    fn is_adjacent_chain(origin: Position, path: &[Position]) -> bool {
        let mut last = origin;
        path.iter().all(|&cell| {
            let ok = last.manhattan(cell) == 1;
            last = cell;
            ok
        })
    }

    #[test]
    fn open_field_path_is_manhattan_minus_one() {
        let nav = Navigator::new(10, 10);
        let origin = Position::new(1, 1);
        let target = Position::new(6, 4);
        let path = nav.find_path(origin, &goal(target), |_| false).unwrap();
        assert_eq!(path.len(), 7);
        assert!(is_adjacent_chain(origin, &path));
        assert_eq!(path.last().map(|c| c.manhattan(target)), Some(1));
    }

    #[test]
    fn adjacent_target_needs_no_steps() {
        let nav = Navigator::new(4, 4);
        let path = nav
            .find_path(Position::new(0, 0), &goal(Position::new(1, 0)), |_| false)
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn wall_forces_a_detour() {
        let mut nav = Navigator::new(10, 10);
        let wall = ObjectId::new("wall");
        nav.sync([(&wall, Position::new(5, 0), Footprint::new(1, 9))]);
        let origin = Position::new(2, 2);
        let path = nav
            .find_path(origin, &goal(Position::new(8, 2)), |_| false)
            .unwrap();
        assert!(path.len() > 5);
        assert!(path.contains(&Position::new(5, 9)));
        assert!(is_adjacent_chain(origin, &path));
    }

    #[test]
    fn removable_occluder_is_reported_as_blocker() {
        let mut nav = Navigator::new(7, 3);
        let wall = ObjectId::new("wall");
        let door = ObjectId::new("door");
        nav.sync([
            (&wall, Position::new(3, 0), Footprint::new(1, 1)),
            (&door, Position::new(3, 1), Footprint::UNIT),
        ]);
        nav.block_terrain(Position::new(3, 2), Footprint::UNIT);

        let err = nav
            .find_path(Position::new(0, 1), &goal(Position::new(6, 1)), |id| {
                id.as_str() == "door"
            })
            .unwrap_err();
        assert_eq!(
            err,
            PathError::Blocked {
                target: "goal".to_owned(),
                blocker: door,
            }
        );
    }

    #[test]
    fn sealed_target_is_unreachable() {
        let mut nav = Navigator::new(5, 5);
        nav.block_terrain(Position::new(0, 2), Footprint::new(5, 1));
        let err = nav
            .find_path(Position::new(0, 0), &goal(Position::new(4, 4)), |_| true)
            .unwrap_err();
        assert_eq!(err, PathError::Unreachable("goal".to_owned()));
    }

    #[test]
    fn sync_clears_removed_objects() {
        let mut nav = Navigator::new(5, 5);
        let rock = ObjectId::new("rock");
        nav.sync([(&rock, Position::new(2, 2), Footprint::UNIT)]);
        assert_eq!(nav.grid().owner(Position::new(2, 2)), Some(&rock));
        nav.sync(std::iter::empty());
        assert_eq!(nav.grid().owner(Position::new(2, 2)), None);
    }

    #[test]
    fn large_target_stops_at_nearest_edge() {
        let nav = Navigator::new(12, 12);
        let house = Destination {
            id: "house",
            origin: Position::new(6, 6),
            size: Footprint::new(3, 3),
        };
        let path = nav.find_path(Position::new(0, 7), &house, |_| false).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.last(), Some(&Position::new(5, 7)));
    }
}
