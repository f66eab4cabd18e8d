#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Swept pixel-space collision against the collision grid.
//!
//! Movement resolves in small substeps with the X and Y axes tested
//! independently, which produces wall sliding: an actor pushed
//! diagonally into a wall keeps the velocity component the wall does
//! not block. The substep bounds per-iteration displacement so a fast
//! actor cannot jump across a solid cell in a single update.

use warren_core::{CellCoord, GridView, PassableSet, PixelRect, PixelVelocity};

/// Reports whether any grid cell under the rect holds a non-passable
/// state.
///
/// The rect's pixel span converts to an inclusive cell span with floor
/// division; the right and bottom edges are exclusive, so a rect
/// touching a cell boundary does not probe the next cell. Cells beyond
/// the grid edge are treated as open.
#[must_use]
pub fn rect_overlaps_solid(rect: PixelRect, view: GridView<'_>, passable: &PassableSet) -> bool {
    let cell = view.cell_size();
    let columns = i32::try_from(view.columns()).unwrap_or(i32::MAX);
    let rows = i32::try_from(view.rows()).unwrap_or(i32::MAX);
    let left = rect.left().div_euclid(cell).max(0);
    let right = (rect.right() - 1).div_euclid(cell).min(columns - 1);
    let top = rect.top().div_euclid(cell).max(0);
    let bottom = (rect.bottom() - 1).div_euclid(cell).min(rows - 1);

    for y in top..=bottom {
        for x in left..=right {
            if !view.is_passable_at(CellCoord::new(x, y), passable) {
                return true;
            }
        }
    }
    false
}

/// Moves the rect by the velocity, resolving grid collisions per axis.
///
/// The displacement splits into `max(1, max(|vx|, |vy|) / max(1, substep))`
/// equal steps. Each step first attempts the X delta and then the Y
/// delta; a blocked axis reverts its move and stops contributing for
/// the rest of the call while the other axis continues. Returns the
/// resolved rect; callers compare centers to learn whether any ground
/// was covered.
///
/// `substep` must not exceed the thickness in pixels of the thinnest
/// obstacle, or a step could clear it in one jump.
#[must_use]
pub fn move_with_collision(
    rect: PixelRect,
    velocity: PixelVelocity,
    view: GridView<'_>,
    passable: &PassableSet,
    substep: i32,
) -> PixelRect {
    let span = velocity.dx().unsigned_abs().max(velocity.dy().unsigned_abs());
    let substep = u32::try_from(substep.max(1)).unwrap_or(1);
    let steps = i32::try_from((span / substep).max(1)).unwrap_or(i32::MAX);

    let mut step_dx = velocity.dx() / steps;
    let mut step_dy = velocity.dy() / steps;
    let mut resolved = rect;

    for _ in 0..steps {
        if step_dx != 0 {
            let tested = resolved.translated(step_dx, 0);
            if rect_overlaps_solid(tested, view, passable) {
                step_dx = 0;
            } else {
                resolved = tested;
            }
        }
        if step_dy != 0 {
            let tested = resolved.translated(0, step_dy);
            if rect_overlaps_solid(tested, view, passable) {
                step_dy = 0;
            } else {
                resolved = tested;
            }
        }
        if step_dx == 0 && step_dy == 0 {
            break;
        }
    }

    resolved
}
