#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Warren spatial engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative floor session, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems
//! to react to deterministically. Systems consume borrowed grid views, query
//! immutable snapshots, and never mutate the floor themselves.

use serde::{Deserialize, Serialize};

/// Cost of a single orthogonal step expressed in fixed-point path units.
pub const ORTHOGONAL_STEP_COST: u32 = 10;

/// Cost of a single diagonal step expressed in fixed-point path units.
///
/// The 14/10 ratio approximates the diagonal length of a cell without
/// introducing floating-point accumulation into search costs.
pub const DIAGONAL_STEP_COST: u32 = 14;

/// Commands that express all permissible floor mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Swaps in a new floor, replacing the grid, its base snapshot and gates.
    LoadFloor {
        /// Complete description of the floor to activate.
        layout: FloorLayout,
    },
    /// Writes a solid state into the listed cells, sealing them off.
    SealCells {
        /// Cells whose state should become solid.
        cells: Vec<CellCoord>,
        /// Terrain state to write. Must not be a member of the floor's
        /// passable set.
        state: i32,
    },
    /// Copies the listed cells back from the immutable base snapshot.
    RestoreCells {
        /// Cells whose base state should be restored.
        cells: Vec<CellCoord>,
    },
    /// Ensures a navigation cache exists for the provided actor footprint.
    RegisterFootprint {
        /// Pixel dimensions of the actor that will request paths.
        footprint: Footprint,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a new floor became active.
    FloorLoaded {
        /// Number of cell columns in the activated grid.
        columns: u32,
        /// Number of cell rows in the activated grid.
        rows: u32,
        /// Edge length of a single cell measured in pixels.
        cell_size: i32,
    },
    /// Confirms that cells were sealed with a solid state.
    CellsSealed {
        /// Cells that were written.
        cells: Vec<CellCoord>,
        /// Terrain state that was written into the cells.
        state: i32,
    },
    /// Confirms that cells were restored from the base snapshot.
    CellsRestored {
        /// Cells that were restored.
        cells: Vec<CellCoord>,
    },
    /// Announces that a navigation cache was rebuilt from the live grid.
    ///
    /// Consumers holding state derived from the previous cache contents,
    /// such as precomputed gate routes, must discard it when this arrives.
    NavRebuilt {
        /// Cache key identifying the rebuilt cache.
        key: CacheKey,
        /// Grid generation the rebuilt cache reflects.
        generation: GridGeneration,
        /// Number of connected regions labeled during the rebuild.
        region_count: u32,
    },
}

/// Location of a single grid cell expressed as x and y indices.
///
/// Coordinates are signed so that pixel conversions of positions left of or
/// above the grid remain representable; bounds checks reject them later.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the cell displaced by the provided deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Pixel-space bounding box of an actor used to derive clearance.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Footprint {
    width_px: u32,
    height_px: u32,
}

impl Footprint {
    /// Creates a new footprint from pixel dimensions.
    #[must_use]
    pub const fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }

    /// Width of the footprint in pixels.
    #[must_use]
    pub const fn width_px(&self) -> u32 {
        self.width_px
    }

    /// Height of the footprint in pixels.
    #[must_use]
    pub const fn height_px(&self) -> u32 {
        self.height_px
    }

    /// Derives the clearance radius the footprint requires on a grid with
    /// the provided cell size.
    ///
    /// The footprint spans `max(1, ceil(dimension / cell_size))` cells per
    /// axis; the radius is half of that span rounded down.
    ///
    /// # Panics
    ///
    /// Panics when `cell_size` is not positive.
    #[must_use]
    pub fn clearance_radius(&self, cell_size: i32) -> ClearanceRadius {
        assert!(cell_size > 0, "cell size must be positive");
        let cell = cell_size.unsigned_abs();
        let cells_x = self.width_px.div_ceil(cell).max(1);
        let cells_y = self.height_px.div_ceil(cell).max(1);
        let radius_x = i32::try_from((cells_x - 1) / 2).unwrap_or(i32::MAX);
        let radius_y = i32::try_from((cells_y - 1) / 2).unwrap_or(i32::MAX);
        ClearanceRadius::new(radius_x, radius_y)
    }
}

/// Number of additional cells around a center cell an actor must fit into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClearanceRadius {
    x: i32,
    y: i32,
}

impl ClearanceRadius {
    /// Creates a clearance radius from per-axis cell counts.
    ///
    /// # Panics
    ///
    /// Panics when either radius is negative.
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        assert!(x >= 0 && y >= 0, "clearance radius must not be negative");
        Self { x, y }
    }

    /// Horizontal radius in cells.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical radius in cells.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// Key identifying the grid resolution and footprint a cache was built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    cell_size: i32,
    footprint: Footprint,
}

impl CacheKey {
    /// Creates a new cache key.
    #[must_use]
    pub const fn new(cell_size: i32, footprint: Footprint) -> Self {
        Self {
            cell_size,
            footprint,
        }
    }

    /// Cell size the cache was derived from.
    #[must_use]
    pub const fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Footprint the cache was derived for.
    #[must_use]
    pub const fn footprint(&self) -> Footprint {
        self.footprint
    }
}

/// Monotonic counter tracking topology changes of a floor's grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridGeneration(u64);

impl GridGeneration {
    /// Creates a generation wrapper with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the underlying counter value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the generation that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Set of terrain states an actor may stand on.
///
/// Values are normalized to sorted, deduplicated order at construction so
/// that serialized layouts compare deterministically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassableSet {
    values: Vec<i32>,
}

impl PassableSet {
    /// Creates a passable set from the provided terrain states.
    #[must_use]
    pub fn from_values(mut values: Vec<i32>) -> Self {
        values.sort_unstable();
        values.dedup();
        Self { values }
    }

    /// Reports whether the provided terrain state is passable.
    #[must_use]
    pub fn contains(&self, state: i32) -> bool {
        self.values.iter().any(|value| *value == state)
    }

    /// Terrain states contained in the set, in ascending order.
    #[must_use]
    pub fn values(&self) -> &[i32] {
        &self.values
    }
}

impl Default for PassableSet {
    /// The conventional passable set containing only the zero state.
    fn default() -> Self {
        Self::from_values(vec![0])
    }
}

/// Named cell of interest used as a waypoint for path caching.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    name: String,
    cell: CellCoord,
}

impl Gate {
    /// Creates a gate anchored at the provided cell.
    #[must_use]
    pub fn new(name: String, cell: CellCoord) -> Self {
        Self { name, cell }
    }

    /// Name assigned to the gate by level data.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cell the gate is anchored at.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }
}

/// Complete description of a floor handed over by the map-loading layer.
///
/// The cell buffer is row-major and strictly rectangular; constructors
/// reject ragged input so downstream code never revalidates row lengths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorLayout {
    columns: u32,
    rows: u32,
    cell_size: i32,
    cells: Vec<i32>,
    passable: PassableSet,
    spawn_px: (i32, i32),
    gates: Vec<Gate>,
}

impl FloorLayout {
    /// Creates a layout from an already-flat cell buffer.
    ///
    /// # Panics
    ///
    /// Panics when the buffer length does not equal `columns * rows` or when
    /// `cell_size` is not positive.
    #[must_use]
    pub fn new(
        columns: u32,
        rows: u32,
        cell_size: i32,
        cells: Vec<i32>,
        passable: PassableSet,
        spawn_px: (i32, i32),
        gates: Vec<Gate>,
    ) -> Self {
        assert!(cell_size > 0, "cell size must be positive");
        let expected = u64::from(columns) * u64::from(rows);
        let actual = u64::try_from(cells.len()).unwrap_or(u64::MAX);
        assert!(
            actual == expected,
            "cell buffer must cover columns * rows cells exactly"
        );
        Self {
            columns,
            rows,
            cell_size,
            cells,
            passable,
            spawn_px,
            gates,
        }
    }

    /// Creates a layout from nested row data.
    ///
    /// # Panics
    ///
    /// Panics when rows differ in length or `cell_size` is not positive.
    #[must_use]
    pub fn from_rows(
        row_data: Vec<Vec<i32>>,
        cell_size: i32,
        passable: PassableSet,
        spawn_px: (i32, i32),
        gates: Vec<Gate>,
    ) -> Self {
        let rows = u32::try_from(row_data.len()).unwrap_or(u32::MAX);
        let width = row_data.first().map_or(0, Vec::len);
        let columns = u32::try_from(width).unwrap_or(u32::MAX);
        let mut cells = Vec::with_capacity(width * row_data.len());
        for row in &row_data {
            assert!(
                row.len() == width,
                "collision grid rows must share a single length"
            );
            cells.extend_from_slice(row);
        }
        Self::new(columns, rows, cell_size, cells, passable, spawn_px, gates)
    }

    /// Number of cell columns in the layout.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of cell rows in the layout.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Edge length of a single cell measured in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Row-major cell states backing the layout.
    #[must_use]
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    /// Terrain states actors may stand on.
    #[must_use]
    pub const fn passable(&self) -> &PassableSet {
        &self.passable
    }

    /// Pixel position actors spawn at when the floor loads.
    #[must_use]
    pub const fn spawn_px(&self) -> (i32, i32) {
        self.spawn_px
    }

    /// Gates declared by the floor's level data.
    #[must_use]
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Borrows the layout's cells as a read-only grid view.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.columns, self.rows, self.cell_size)
    }
}

/// Read-only view into a dense row-major collision grid.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a [i32],
    columns: u32,
    rows: u32,
    cell_size: i32,
}

impl<'a> GridView<'a> {
    /// Captures a new view backed by the provided cell slice.
    ///
    /// # Panics
    ///
    /// Panics when the slice length does not equal `columns * rows` or when
    /// `cell_size` is not positive.
    #[must_use]
    pub fn new(cells: &'a [i32], columns: u32, rows: u32, cell_size: i32) -> Self {
        assert!(cell_size > 0, "cell size must be positive");
        let expected = u64::from(columns) * u64::from(rows);
        let actual = u64::try_from(cells.len()).unwrap_or(u64::MAX);
        assert!(
            actual == expected,
            "cell buffer must cover columns * rows cells exactly"
        );
        Self {
            cells,
            columns,
            rows,
            cell_size,
        }
    }

    /// Number of cell columns covered by the view.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of cell rows covered by the view.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Edge length of a single cell measured in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Total number of cells covered by the view.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the cell lies within the grid bounds.
    #[must_use]
    pub fn in_bounds(&self, cell: CellCoord) -> bool {
        self.index_of(cell).is_some()
    }

    /// Terrain state stored at the cell, if it lies within bounds.
    #[must_use]
    pub fn state_at(&self, cell: CellCoord) -> Option<i32> {
        self.index_of(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether the cell is in bounds and holds a passable state.
    #[must_use]
    pub fn is_passable_at(&self, cell: CellCoord, passable: &PassableSet) -> bool {
        self.state_at(cell)
            .map_or(false, |state| passable.contains(state))
    }

    /// Flat row-major index of the cell, if it lies within bounds.
    #[must_use]
    pub fn index_of(&self, cell: CellCoord) -> Option<usize> {
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

    /// Cell coordinate backing the provided flat index, if it is in range.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cells.len() {
            return None;
        }
        let columns = usize::try_from(self.columns).ok()?;
        if columns == 0 {
            return None;
        }
        let x = i32::try_from(index % columns).ok()?;
        let y = i32::try_from(index / columns).ok()?;
        Some(CellCoord::new(x, y))
    }
}

/// Ordered sequence of cells from start to goal, inclusive, plus its cost.
///
/// An empty path signals that no route exists. A single-cell path signals
/// the start already satisfies the goal; callers distinguish the two by
/// checking [`Path::is_trivial`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    cells: Vec<CellCoord>,
    cost: u32,
}

impl Path {
    /// Creates a path from cells and the accumulated step cost.
    #[must_use]
    pub fn new(cells: Vec<CellCoord>, cost: u32) -> Self {
        Self { cells, cost }
    }

    /// Creates the empty path that signals "no route".
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Cells composing the path in travel order.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Total step cost in fixed-point path units.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Number of cells in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the path contains no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether the path is too short to move along.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.cells.len() <= 1
    }

    /// First cell of the path, if any.
    #[must_use]
    pub fn first(&self) -> Option<CellCoord> {
        self.cells.first().copied()
    }

    /// Final cell of the path, if any.
    #[must_use]
    pub fn last(&self) -> Option<CellCoord> {
        self.cells.last().copied()
    }

    /// Returns the same route traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut cells = self.cells.clone();
        cells.reverse();
        Self {
            cells,
            cost: self.cost,
        }
    }

    /// Consumes the path, yielding the underlying cells.
    #[must_use]
    pub fn into_cells(self) -> Vec<CellCoord> {
        self.cells
    }
}

/// Axis-aligned pixel-space rectangle backing an actor's collider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl PixelRect {
    /// Creates a rectangle from its top-left corner and dimensions.
    ///
    /// # Panics
    ///
    /// Panics when either dimension is not positive.
    #[must_use]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        assert!(
            width > 0 && height > 0,
            "rectangle dimensions must be positive"
        );
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge of the rectangle.
    #[must_use]
    pub const fn left(&self) -> i32 {
        self.x
    }

    /// Top edge of the rectangle.
    #[must_use]
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Exclusive right edge of the rectangle.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge of the rectangle.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Width of the rectangle in pixels.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height of the rectangle in pixels.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Center of the rectangle, truncated to whole pixels.
    #[must_use]
    pub const fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Returns the rectangle displaced by the provided deltas.
    #[must_use]
    pub const fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width,
            height: self.height,
        }
    }

    /// Returns an equally sized rectangle centered on the provided point.
    #[must_use]
    pub const fn centered_at(&self, center_x: i32, center_y: i32) -> Self {
        Self {
            x: center_x - self.width / 2,
            y: center_y - self.height / 2,
            width: self.width,
            height: self.height,
        }
    }
}

/// Pixel displacement an actor intends to cover within a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelVelocity {
    dx: i32,
    dy: i32,
}

impl PixelVelocity {
    /// Creates a velocity from per-axis pixel deltas.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Horizontal displacement in pixels.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Vertical displacement in pixels.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }

    /// Reports whether the velocity requests no movement at all.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Converts a pixel coordinate into the index of the cell containing it.
///
/// Uses floor division so that pixels left of or above the grid map onto
/// negative cell indices rather than wrapping toward zero.
///
/// # Panics
///
/// Panics when `cell_size` is not positive.
#[must_use]
pub fn pixel_to_cell(px: i32, cell_size: i32) -> i32 {
    assert!(cell_size > 0, "cell size must be positive");
    px.div_euclid(cell_size)
}

/// Converts a cell index into the pixel coordinate of the cell's center.
///
/// # Panics
///
/// Panics when `cell_size` is not positive.
#[must_use]
pub fn cell_to_pixel_center(index: i32, cell_size: i32) -> f32 {
    assert!(cell_size > 0, "cell size must be positive");
    (index as f32 + 0.5) * cell_size as f32
}

/// Reports whether an actor with the provided clearance radius can stand at
/// the cell.
///
/// The full `(2 * radius.x + 1) x (2 * radius.y + 1)` block centered on the
/// cell must lie within the grid and hold only passable states. This is the
/// single source of truth for footprint fit, used both to build navigation
/// caches and as the live fallback when no cache is supplied.
#[must_use]
pub fn has_clearance(
    view: GridView<'_>,
    passable: &PassableSet,
    cell: CellCoord,
    radius: ClearanceRadius,
) -> bool {
    for yy in (cell.y() - radius.y())..=(cell.y() + radius.y()) {
        for xx in (cell.x() - radius.x())..=(cell.x() + radius.x()) {
            if !view.is_passable_at(CellCoord::new(xx, yy), passable) {
                return false;
            }
        }
    }
    true
}
