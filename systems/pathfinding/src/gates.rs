//! Precomputed gate-to-gate routing table.

use std::collections::BTreeMap;

use warren_core::{
    has_clearance, CacheKey, CellCoord, ClearanceRadius, Footprint, Gate, GridView, PassableSet,
    Path,
};
use warren_world::NavCache;

use crate::Pathfinder;

/// Counters separating table hits from direct fallback searches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteStats {
    /// Queries answered by splicing a stored gate path.
    pub gate_hits: u64,
    /// Queries answered by a full direct search.
    pub direct_fallbacks: u64,
}

/// Path table between every pair of gate cells on a floor.
///
/// Gates are snapped onto walkable cells at build time and one full
/// search runs per unordered pair; queries then splice a stored middle
/// section between two short local legs instead of searching the whole
/// floor. Each leg is individually optimal, so a spliced route can cost
/// more than a direct search when an endpoint sits far from its gate;
/// any splice failure falls back to the direct search, so a route is
/// empty only when no path exists at all.
#[derive(Debug)]
pub struct GateRouter {
    key: CacheKey,
    gate_cells: Vec<CellCoord>,
    paths: BTreeMap<(CellCoord, CellCoord), Path>,
    stats: RouteStats,
    search: Pathfinder,
}

impl GateRouter {
    /// Builds the table for the floor's gates.
    ///
    /// Each gate snaps to the walkable cell nearest to it by Manhattan
    /// distance; gates with no walkable cell on the floor are dropped.
    /// Pairs that no path connects store nothing and fall back to a
    /// direct search at query time.
    #[must_use]
    pub fn build(
        view: GridView<'_>,
        passable: &PassableSet,
        footprint: Footprint,
        cache: Option<&NavCache>,
        gates: &[Gate],
    ) -> Self {
        let mut search = Pathfinder::new();
        let cache = cache.filter(|cache| cache.matches(view.cell_size(), footprint));
        let radius = footprint.clearance_radius(view.cell_size());

        let mut gate_cells: Vec<CellCoord> = gates
            .iter()
            .filter_map(|gate| snap_to_walkable(view, passable, cache, radius, gate.cell()))
            .collect();
        gate_cells.sort_unstable();
        gate_cells.dedup();

        let mut paths = BTreeMap::new();
        for (offset, &from) in gate_cells.iter().enumerate() {
            for &to in &gate_cells[offset + 1..] {
                let path = search.astar(view, passable, footprint, cache, from, to);
                if path.is_empty() {
                    continue;
                }
                let _ = paths.insert((to, from), path.reversed());
                let _ = paths.insert((from, to), path);
            }
        }

        Self {
            key: CacheKey::new(view.cell_size(), footprint),
            gate_cells,
            paths,
            stats: RouteStats::default(),
            search,
        }
    }

    /// Key identifying the grid geometry and footprint the table serves.
    #[must_use]
    pub const fn key(&self) -> CacheKey {
        self.key
    }

    /// Gate cells after snapping, in ascending cell order.
    #[must_use]
    pub fn gate_cells(&self) -> &[CellCoord] {
        &self.gate_cells
    }

    /// Number of stored gate-to-gate paths, counting both directions.
    #[must_use]
    pub fn stored_paths(&self) -> usize {
        self.paths.len()
    }

    /// Counters accumulated across [`GateRouter::route`] calls.
    #[must_use]
    pub const fn stats(&self) -> RouteStats {
        self.stats
    }

    /// Routes from `start` to `goal`, splicing a stored gate path with
    /// two local legs when possible.
    ///
    /// Falls back to a direct search when the view's cell size no longer
    /// matches the table key, both endpoints snap to the same gate, the
    /// gate pair stores no path, or either local leg fails.
    ///
    /// # Panics
    ///
    /// Panics when `start` or `goal` lies outside the grid.
    pub fn route(
        &mut self,
        view: GridView<'_>,
        passable: &PassableSet,
        cache: Option<&NavCache>,
        start: CellCoord,
        goal: CellCoord,
    ) -> Path {
        if self.key.cell_size() != view.cell_size() {
            return self.direct(view, passable, cache, start, goal);
        }
        let (Some(start_gate), Some(goal_gate)) =
            (self.nearest_gate(start), self.nearest_gate(goal))
        else {
            return self.direct(view, passable, cache, start, goal);
        };
        if start_gate == goal_gate {
            return self.direct(view, passable, cache, start, goal);
        }
        let Some(middle) = self.paths.get(&(start_gate, goal_gate)).cloned() else {
            return self.direct(view, passable, cache, start, goal);
        };

        let footprint = self.key.footprint();
        let entry = self
            .search
            .astar(view, passable, footprint, cache, start, start_gate);
        if entry.is_empty() {
            return self.direct(view, passable, cache, start, goal);
        }
        let exit = self
            .search
            .astar(view, passable, footprint, cache, goal_gate, goal);
        if exit.is_empty() {
            return self.direct(view, passable, cache, start, goal);
        }

        self.stats.gate_hits += 1;
        let mut cells = entry.cells().to_vec();
        cells.extend_from_slice(&middle.cells()[1..]);
        cells.extend_from_slice(&exit.cells()[1..]);
        let cost = entry.cost() + middle.cost() + exit.cost();
        Path::new(cells, cost)
    }

    fn direct(
        &mut self,
        view: GridView<'_>,
        passable: &PassableSet,
        cache: Option<&NavCache>,
        start: CellCoord,
        goal: CellCoord,
    ) -> Path {
        self.stats.direct_fallbacks += 1;
        let footprint = self.key.footprint();
        self.search
            .astar(view, passable, footprint, cache, start, goal)
    }

    fn nearest_gate(&self, from: CellCoord) -> Option<CellCoord> {
        self.gate_cells
            .iter()
            .copied()
            .min_by_key(|gate| (gate.manhattan_distance(from), *gate))
    }
}

/// Snaps a seed cell onto the nearest walkable cell in row-major scan
/// order, ties resolved by the earliest scanned cell.
fn snap_to_walkable(
    view: GridView<'_>,
    passable: &PassableSet,
    cache: Option<&NavCache>,
    radius: ClearanceRadius,
    seed: CellCoord,
) -> Option<CellCoord> {
    let walkable = |cell: CellCoord| match cache {
        Some(cache) => cache.is_walkable(cell),
        None => has_clearance(view, passable, cell, radius),
    };
    if walkable(seed) {
        return Some(seed);
    }

    let mut best: Option<(u32, CellCoord)> = None;
    for index in 0..view.cell_count() {
        let cell = view.cell_at(index)?;
        if !walkable(cell) {
            continue;
        }
        let distance = seed.manhattan_distance(cell);
        let improved = best.map_or(true, |(best_distance, _)| distance < best_distance);
        if improved {
            best = Some((distance, cell));
        }
    }
    best.map(|(_, cell)| cell)
}
