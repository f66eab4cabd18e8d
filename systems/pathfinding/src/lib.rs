#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic grid pathfinding for footprint-aware actors.
//!
//! [`Pathfinder`] runs A* over a collision grid view with 8-directional
//! steps, fixed-point step costs and corner-cut prevention, reusing its
//! open list and score buffers across queries. [`GateRouter`] layers a
//! precomputed gate-to-gate path table on top for repeated long routes.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use warren_core::{
    has_clearance, CellCoord, ClearanceRadius, Footprint, GridView, PassableSet, Path,
    DIAGONAL_STEP_COST, ORTHOGONAL_STEP_COST,
};
use warren_world::NavCache;

mod gates;

pub use gates::{GateRouter, RouteStats};

/// Expansion order shared by the A* search and the bounded breadth-first
/// fallback. Orthogonal steps come before diagonal ones so equal-cost
/// frontiers grow in a fixed order.
const NEIGHBOR_STEPS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

/// A* search engine owning reusable scratch buffers.
///
/// Open-list ties resolve by `(f, cell, insertion sequence)`, so
/// identical grids and endpoints always produce identical paths.
#[derive(Debug)]
pub struct Pathfinder {
    open: BinaryHeap<OpenNode>,
    g_score: Vec<u32>,
    came_from: Vec<usize>,
    visited: Vec<bool>,
    frontier: VecDeque<(CellCoord, u32)>,
    expanded: u32,
    node_budget: u32,
    seq: u32,
}

impl Pathfinder {
    /// Creates a pathfinder with an unbounded expansion budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_node_budget(u32::MAX)
    }

    /// Creates a pathfinder that abandons a query after expanding
    /// `node_budget` cells and returns an empty path instead, keeping a
    /// degenerate query from stalling the simulation tick.
    #[must_use]
    pub fn with_node_budget(node_budget: u32) -> Self {
        Self {
            open: BinaryHeap::new(),
            g_score: Vec::new(),
            came_from: Vec::new(),
            visited: Vec::new(),
            frontier: VecDeque::new(),
            expanded: 0,
            node_budget,
            seq: 0,
        }
    }

    /// Number of cells expanded by the most recent search.
    ///
    /// Stays at zero when a query is answered by a guard alone, such as
    /// the cross-region rejection.
    #[must_use]
    pub const fn nodes_expanded(&self) -> u32 {
        self.expanded
    }

    /// Finds the cheapest path from `start` to `goal` for the footprint.
    ///
    /// Steps cost [`ORTHOGONAL_STEP_COST`] straight and
    /// [`DIAGONAL_STEP_COST`] diagonally; a diagonal step additionally
    /// requires both adjacent orthogonal cells to hold passable states,
    /// so actors cannot cut through a gap between two touching solid
    /// cells. A cache built for a different `(cell_size, footprint)` key
    /// is ignored. A matching cache answers walkability lookups and
    /// rejects endpoints in different regions before any cell is
    /// expanded.
    ///
    /// Returns an empty path when either endpoint cannot hold the
    /// footprint, no route exists, or the expansion budget runs out.
    ///
    /// # Panics
    ///
    /// Panics when `start` or `goal` lies outside the grid.
    pub fn astar(
        &mut self,
        view: GridView<'_>,
        passable: &PassableSet,
        footprint: Footprint,
        cache: Option<&NavCache>,
        start: CellCoord,
        goal: CellCoord,
    ) -> Path {
        self.expanded = 0;
        assert!(
            view.in_bounds(start),
            "path start ({}, {}) lies outside the grid",
            start.x(),
            start.y()
        );
        assert!(
            view.in_bounds(goal),
            "path goal ({}, {}) lies outside the grid",
            goal.x(),
            goal.y()
        );

        let cache = cache.filter(|cache| cache.matches(view.cell_size(), footprint));
        let radius = footprint.clearance_radius(view.cell_size());

        match cache {
            Some(cache) => {
                if !cache.is_walkable(start) || !cache.is_walkable(goal) {
                    return Path::empty();
                }
                if cache.region(start) != cache.region(goal) {
                    return Path::empty();
                }
            }
            None => {
                if !has_clearance(view, passable, start, radius)
                    || !has_clearance(view, passable, goal, radius)
                {
                    return Path::empty();
                }
            }
        }

        if start == goal {
            return Path::new(vec![start], 0);
        }

        self.reset_workspace(view.cell_count());
        let Some(start_index) = view.index_of(start) else {
            return Path::empty();
        };
        self.g_score[start_index] = 0;
        self.open.push(OpenNode {
            f: octile_heuristic(start, goal),
            g: 0,
            cell: start,
            seq: self.seq,
        });

        while let Some(node) = self.open.pop() {
            let Some(index) = view.index_of(node.cell) else {
                continue;
            };
            if node.g != self.g_score[index] {
                continue;
            }
            if node.cell == goal {
                return self
                    .reconstruct(view, start_index, index, node.g)
                    .unwrap_or_else(Path::empty);
            }
            if self.expanded == self.node_budget {
                break;
            }
            self.expanded += 1;

            for (dx, dy) in NEIGHBOR_STEPS {
                let Some(next) = permitted_step(view, passable, cache, radius, node.cell, dx, dy)
                else {
                    continue;
                };
                let Some(next_index) = view.index_of(next) else {
                    continue;
                };
                let step_cost = if dx != 0 && dy != 0 {
                    DIAGONAL_STEP_COST
                } else {
                    ORTHOGONAL_STEP_COST
                };
                let tentative = node.g.saturating_add(step_cost);
                if tentative < self.g_score[next_index] {
                    self.g_score[next_index] = tentative;
                    self.came_from[next_index] = index;
                    self.seq = self.seq.wrapping_add(1);
                    self.open.push(OpenNode {
                        f: tentative.saturating_add(octile_heuristic(next, goal)),
                        g: tentative,
                        cell: next,
                        seq: self.seq,
                    });
                }
            }
        }

        Path::empty()
    }

    /// Walks breadth-first from `start` over walkable cells and returns
    /// the visited cell with the smallest Manhattan distance to
    /// `desired`, earliest visit winning ties.
    ///
    /// The walk is bounded to `max_distance_px / cell_size` steps and
    /// obeys the same step rules as [`Pathfinder::astar`], so the
    /// returned cell is always reachable from `start`; callers re-run
    /// the full search toward it. Returns `None` when `start` cannot
    /// hold the footprint, including when it lies outside the grid.
    pub fn nearest_reachable(
        &mut self,
        view: GridView<'_>,
        passable: &PassableSet,
        footprint: Footprint,
        cache: Option<&NavCache>,
        start: CellCoord,
        desired: CellCoord,
        max_distance_px: i32,
    ) -> Option<CellCoord> {
        let cache = cache.filter(|cache| cache.matches(view.cell_size(), footprint));
        let radius = footprint.clearance_radius(view.cell_size());
        let start_clear = match cache {
            Some(cache) => cache.is_walkable(start),
            None => has_clearance(view, passable, start, radius),
        };
        if !start_clear {
            return None;
        }

        let max_steps =
            u32::try_from(max_distance_px.div_euclid(view.cell_size()).max(0)).unwrap_or(0);

        self.visited.clear();
        self.visited.resize(view.cell_count(), false);
        self.frontier.clear();

        let start_index = view.index_of(start)?;
        self.visited[start_index] = true;
        self.frontier.push_back((start, 0));

        let mut best: Option<(u32, CellCoord)> = None;
        while let Some((cell, depth)) = self.frontier.pop_front() {
            let distance = cell.manhattan_distance(desired);
            let improved = best.map_or(true, |(best_distance, _)| distance < best_distance);
            if improved {
                best = Some((distance, cell));
            }
            if depth == max_steps {
                continue;
            }
            for (dx, dy) in NEIGHBOR_STEPS {
                let Some(next) = permitted_step(view, passable, cache, radius, cell, dx, dy)
                else {
                    continue;
                };
                let Some(next_index) = view.index_of(next) else {
                    continue;
                };
                if self.visited[next_index] {
                    continue;
                }
                self.visited[next_index] = true;
                self.frontier.push_back((next, depth + 1));
            }
        }

        best.map(|(_, cell)| cell)
    }

    fn reset_workspace(&mut self, cell_count: usize) {
        self.open.clear();
        self.g_score.clear();
        self.g_score.resize(cell_count, u32::MAX);
        self.came_from.clear();
        self.came_from.resize(cell_count, usize::MAX);
        self.seq = 0;
    }

    fn reconstruct(
        &self,
        view: GridView<'_>,
        start_index: usize,
        goal_index: usize,
        cost: u32,
    ) -> Option<Path> {
        let mut cells = vec![view.cell_at(goal_index)?];
        let mut index = goal_index;
        while index != start_index {
            index = *self.came_from.get(index)?;
            cells.push(view.cell_at(index)?);
        }
        cells.reverse();
        Some(Path::new(cells, cost))
    }
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenNode {
    f: u32,
    g: u32,
    cell: CellCoord,
    seq: u32,
}

impl OpenNode {
    fn key(self) -> (u32, CellCoord, u32) {
        (self.f, self.cell, self.seq)
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    // reversed so the standard max-heap pops the smallest key first
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn octile_heuristic(a: CellCoord, b: CellCoord) -> u32 {
    let dx = a.x().abs_diff(b.x());
    let dy = a.y().abs_diff(b.y());
    DIAGONAL_STEP_COST * dx.min(dy) + ORTHOGONAL_STEP_COST * (dx.max(dy) - dx.min(dy))
}

/// Resolves one candidate step, returning the destination cell when the
/// move is legal for the footprint.
///
/// The destination must be in bounds, hold a passable state, and offer
/// clearance. Diagonal steps also require both adjacent orthogonal cells
/// to hold passable states on the raw grid.
fn permitted_step(
    view: GridView<'_>,
    passable: &PassableSet,
    cache: Option<&NavCache>,
    radius: ClearanceRadius,
    from: CellCoord,
    dx: i32,
    dy: i32,
) -> Option<CellCoord> {
    let next = from.offset(dx, dy);
    if !view.in_bounds(next) {
        return None;
    }
    if !view.is_passable_at(next, passable) {
        return None;
    }
    let clear = match cache {
        Some(cache) => cache.is_walkable(next),
        None => has_clearance(view, passable, next, radius),
    };
    if !clear {
        return None;
    }
    if dx != 0 && dy != 0 {
        if !view.is_passable_at(from.offset(dx, 0), passable) {
            return None;
        }
        if !view.is_passable_at(from.offset(0, dy), passable) {
            return None;
        }
    }
    Some(next)
}
