#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative floor session state for the Warren engine.
//!
//! The world owns the mutable collision grid together with its immutable
//! base snapshot, the floor's passable set and gates, and one navigation
//! cache per registered footprint. All mutations arrive as [`Command`]
//! values through [`apply`]; every topology change bumps the grid
//! generation and rebuilds all caches before control returns to the
//! caller, so readers can never observe a cache that disagrees with the
//! grid.

use std::collections::BTreeMap;

use warren_core::{
    CacheKey, CellCoord, Command, Event, FloorLayout, Footprint, Gate, GridGeneration, GridView,
    PassableSet,
};

mod navigation;

pub use navigation::NavCache;

/// Represents the authoritative floor session.
#[derive(Debug)]
pub struct World {
    grid: CollisionGrid,
    passable: PassableSet,
    gates: Vec<Gate>,
    spawn_px: (i32, i32),
    caches: BTreeMap<CacheKey, NavCache>,
    generation: GridGeneration,
}

impl World {
    /// Creates a world with no floor loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: CollisionGrid::empty(),
            passable: PassableSet::default(),
            gates: Vec::new(),
            spawn_px: (0, 0),
            caches: BTreeMap::new(),
            generation: GridGeneration::default(),
        }
    }

    fn rebuild_caches(&mut self, out_events: &mut Vec<Event>) {
        let mut footprints: Vec<Footprint> =
            self.caches.keys().map(|key| key.footprint()).collect();
        footprints.sort_unstable();
        footprints.dedup();
        self.caches.clear();

        let view = self.grid.view();
        for footprint in footprints {
            let cache = NavCache::build(view, &self.passable, footprint, self.generation);
            let key = cache.key();
            out_events.push(Event::NavRebuilt {
                key,
                generation: self.generation,
                region_count: cache.region_count(),
            });
            let _ = self.caches.insert(key, cache);
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// # Panics
///
/// Panics when a mutation names a cell outside the floor grid or seals cells
/// with a state the floor treats as passable. Both indicate gameplay-layer
/// bugs; surfacing them beats returning a silently unchanged world.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadFloor { layout } => {
            world.passable = layout.passable().clone();
            world.gates = layout.gates().to_vec();
            world.spawn_px = layout.spawn_px();
            world.grid = CollisionGrid::from_layout(&layout);
            world.generation = world.generation.next();
            out_events.push(Event::FloorLoaded {
                columns: world.grid.columns(),
                rows: world.grid.rows(),
                cell_size: world.grid.cell_size(),
            });
            world.rebuild_caches(out_events);
        }
        Command::SealCells { cells, state } => {
            assert!(
                !world.passable.contains(state),
                "sealed cells must receive a non-passable state"
            );
            for cell in &cells {
                world.grid.set_state(*cell, state);
            }
            world.generation = world.generation.next();
            out_events.push(Event::CellsSealed { cells, state });
            world.rebuild_caches(out_events);
        }
        Command::RestoreCells { cells } => {
            for cell in &cells {
                world.grid.restore_from_base(*cell);
            }
            world.generation = world.generation.next();
            out_events.push(Event::CellsRestored { cells });
            world.rebuild_caches(out_events);
        }
        Command::RegisterFootprint { footprint } => {
            let key = CacheKey::new(world.grid.cell_size(), footprint);
            if world.caches.contains_key(&key) {
                return;
            }
            let cache = NavCache::build(
                world.grid.view(),
                &world.passable,
                footprint,
                world.generation,
            );
            out_events.push(Event::NavRebuilt {
                key,
                generation: world.generation,
                region_count: cache.region_count(),
            });
            let _ = world.caches.insert(key, cache);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{NavCache, World};
    use warren_core::{CacheKey, Footprint, Gate, GridGeneration, GridView, PassableSet};

    /// Borrows the live collision grid as a read-only view.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Terrain states actors may stand on for the active floor.
    #[must_use]
    pub fn passable(world: &World) -> &PassableSet {
        &world.passable
    }

    /// Edge length of a single cell on the active floor, in pixels.
    #[must_use]
    pub fn cell_size(world: &World) -> i32 {
        world.grid.cell_size()
    }

    /// Generation counter tracking topology changes of the active floor.
    #[must_use]
    pub fn generation(world: &World) -> GridGeneration {
        world.generation
    }

    /// Gates declared by the active floor's level data.
    #[must_use]
    pub fn gates(world: &World) -> &[Gate] {
        &world.gates
    }

    /// Pixel position actors spawn at on the active floor.
    #[must_use]
    pub fn spawn_px(world: &World) -> (i32, i32) {
        world.spawn_px
    }

    /// Navigation cache registered for the footprint, if one exists.
    ///
    /// The cache handed out is always current: the world rebuilds caches
    /// inside `apply` before any mutation returns.
    #[must_use]
    pub fn nav_cache(world: &World, footprint: Footprint) -> Option<&NavCache> {
        let key = CacheKey::new(world.grid.cell_size(), footprint);
        world.caches.get(&key)
    }

    /// Footprints with registered navigation caches, in key order.
    #[must_use]
    pub fn registered_footprints(world: &World) -> Vec<Footprint> {
        world.caches.keys().map(|key| key.footprint()).collect()
    }
}

#[derive(Clone, Debug)]
struct CollisionGrid {
    columns: u32,
    rows: u32,
    cell_size: i32,
    cells: Vec<i32>,
    base: Vec<i32>,
}

impl CollisionGrid {
    fn empty() -> Self {
        Self {
            columns: 0,
            rows: 0,
            cell_size: 1,
            cells: Vec::new(),
            base: Vec::new(),
        }
    }

    fn from_layout(layout: &FloorLayout) -> Self {
        let cells = layout.cells().to_vec();
        Self {
            columns: layout.columns(),
            rows: layout.rows(),
            cell_size: layout.cell_size(),
            base: cells.clone(),
            cells,
        }
    }

    fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.columns, self.rows, self.cell_size)
    }

    fn columns(&self) -> u32 {
        self.columns
    }

    fn rows(&self) -> u32 {
        self.rows
    }

    fn cell_size(&self) -> i32 {
        self.cell_size
    }

    fn set_state(&mut self, cell: CellCoord, state: i32) {
        let index = self.index_or_panic(cell);
        self.cells[index] = state;
    }

    fn restore_from_base(&mut self, cell: CellCoord) {
        let index = self.index_or_panic(cell);
        self.cells[index] = self.base[index];
    }

    fn index_or_panic(&self, cell: CellCoord) -> usize {
        self.index(cell).unwrap_or_else(|| {
            panic!(
                "cell ({}, {}) lies outside the floor grid",
                cell.x(),
                cell.y()
            )
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = usize::try_from(cell.x()).ok()?;
        let row = usize::try_from(cell.y()).ok()?;
        let columns = usize::try_from(self.columns).ok()?;
        let rows = usize::try_from(self.rows).ok()?;
        if column < columns && row < rows {
            Some(row * columns + column)
        } else {
            None
        }
    }
}
