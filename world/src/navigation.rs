//! Navigation cache builder used by the world crate.

use std::collections::VecDeque;

use warren_core::{
    has_clearance, CacheKey, CellCoord, Footprint, GridGeneration, GridView, PassableSet,
};

const ORTHOGONAL_STEPS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Precomputed walkability and region labeling for a single footprint.
///
/// A cell is walkable when it is passable and the footprint's full clearance
/// block fits around it. Walkable cells are labeled with connected-component
/// ids under 4-directional adjacency; non-walkable cells carry `-1`. The
/// cache is a pure function of the grid contents and the footprint, so the
/// world rebuilds it wholesale after every topology change instead of
/// patching it in place.
#[derive(Clone, Debug)]
pub struct NavCache {
    key: CacheKey,
    columns: u32,
    rows: u32,
    walkable: Vec<bool>,
    regions: Vec<i32>,
    region_count: u32,
    generation: GridGeneration,
}

impl NavCache {
    /// Builds a cache by scanning the grid with the footprint's clearance.
    #[must_use]
    pub fn build(
        view: GridView<'_>,
        passable: &PassableSet,
        footprint: Footprint,
        generation: GridGeneration,
    ) -> Self {
        let key = CacheKey::new(view.cell_size(), footprint);
        let radius = footprint.clearance_radius(view.cell_size());
        let cell_count = view.cell_count();

        let mut walkable = vec![false; cell_count];
        for (index, slot) in walkable.iter_mut().enumerate() {
            if let Some(cell) = view.cell_at(index) {
                *slot = has_clearance(view, passable, cell, radius);
            }
        }

        let mut regions = vec![-1_i32; cell_count];
        let mut region_count = 0_u32;
        let mut queue = VecDeque::new();
        for index in 0..cell_count {
            if !walkable[index] || regions[index] >= 0 {
                continue;
            }
            let Some(seed) = view.cell_at(index) else {
                continue;
            };
            let region = i32::try_from(region_count).unwrap_or(i32::MAX);
            regions[index] = region;
            queue.push_back(seed);
            while let Some(cell) = queue.pop_front() {
                for (dx, dy) in ORTHOGONAL_STEPS {
                    let neighbor = cell.offset(dx, dy);
                    let Some(neighbor_index) = view.index_of(neighbor) else {
                        continue;
                    };
                    if !walkable[neighbor_index] || regions[neighbor_index] >= 0 {
                        continue;
                    }
                    regions[neighbor_index] = region;
                    queue.push_back(neighbor);
                }
            }
            region_count = region_count.saturating_add(1);
        }

        Self {
            key,
            columns: view.columns(),
            rows: view.rows(),
            walkable,
            regions,
            region_count,
            generation,
        }
    }

    /// Key identifying the cell size and footprint the cache was built for.
    #[must_use]
    pub const fn key(&self) -> CacheKey {
        self.key
    }

    /// Grid generation the cache contents reflect.
    #[must_use]
    pub const fn generation(&self) -> GridGeneration {
        self.generation
    }

    /// Number of connected regions labeled during the build.
    #[must_use]
    pub const fn region_count(&self) -> u32 {
        self.region_count
    }

    /// Reports whether the cache matches a request's grid resolution and
    /// footprint.
    #[must_use]
    pub fn matches(&self, cell_size: i32, footprint: Footprint) -> bool {
        self.key == CacheKey::new(cell_size, footprint)
    }

    /// Reports whether the footprint can stand at the cell. Out-of-bounds
    /// cells are never walkable.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.index(cell).map_or(false, |index| self.walkable[index])
    }

    /// Region id labeled at the cell, if it lies within bounds. Non-walkable
    /// cells carry `-1`.
    #[must_use]
    pub fn region(&self, cell: CellCoord) -> Option<i32> {
        self.index(cell).map(|index| self.regions[index])
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

#[cfg(test)]
mod tests {
    use super::*;
    use warren_core::FloorLayout;

    fn layout_from(rows: Vec<Vec<i32>>, cell_size: i32) -> FloorLayout {
        FloorLayout::from_rows(rows, cell_size, PassableSet::default(), (0, 0), Vec::new())
    }

    #[test]
    fn build_labels_disconnected_regions() {
        let layout = layout_from(vec![vec![0, 1, 0], vec![0, 1, 0], vec![0, 1, 0]], 10);
        let cache = NavCache::build(
            layout.view(),
            layout.passable(),
            Footprint::new(8, 8),
            GridGeneration::default(),
        );

        assert_eq!(cache.region_count(), 2);
        assert_eq!(cache.region(CellCoord::new(0, 0)), Some(0));
        assert_eq!(cache.region(CellCoord::new(0, 2)), Some(0));
        assert_eq!(cache.region(CellCoord::new(2, 1)), Some(1));
        assert_eq!(cache.region(CellCoord::new(1, 1)), Some(-1));
        assert!(!cache.is_walkable(CellCoord::new(1, 0)));
        assert!(cache.is_walkable(CellCoord::new(2, 2)));
    }

    #[test]
    fn clearance_shrinks_the_walkable_area() {
        let layout = layout_from(vec![vec![0; 5], vec![0; 5], vec![0; 5]], 10);
        let cache = NavCache::build(
            layout.view(),
            layout.passable(),
            Footprint::new(25, 25),
            GridGeneration::default(),
        );

        assert!(cache.is_walkable(CellCoord::new(1, 1)));
        assert!(cache.is_walkable(CellCoord::new(3, 1)));
        assert!(!cache.is_walkable(CellCoord::new(0, 1)));
        assert!(!cache.is_walkable(CellCoord::new(2, 0)));
        assert_eq!(cache.region(CellCoord::new(0, 0)), Some(-1));
        assert_eq!(cache.region_count(), 1);
    }

    #[test]
    fn out_of_bounds_cells_are_never_walkable() {
        let layout = layout_from(vec![vec![0]], 10);
        let cache = NavCache::build(
            layout.view(),
            layout.passable(),
            Footprint::new(8, 8),
            GridGeneration::default(),
        );

        assert!(!cache.is_walkable(CellCoord::new(-1, 0)));
        assert!(!cache.is_walkable(CellCoord::new(0, 1)));
        assert_eq!(cache.region(CellCoord::new(1, 1)), None);
    }

    #[test]
    fn matches_rejects_other_keys() {
        let layout = layout_from(vec![vec![0, 0]], 10);
        let cache = NavCache::build(
            layout.view(),
            layout.passable(),
            Footprint::new(8, 8),
            GridGeneration::default(),
        );

        assert!(cache.matches(10, Footprint::new(8, 8)));
        assert!(!cache.matches(10, Footprint::new(18, 18)));
        assert!(!cache.matches(5, Footprint::new(8, 8)));
    }
}
