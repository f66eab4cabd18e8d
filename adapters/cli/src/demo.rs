//! Hand-authored floor shared by the demo subcommands.

use warren_core::{CellCoord, FloorLayout, Gate, PassableSet};

/// Edge length in pixels of one demo floor cell.
const CELL_SIZE: i32 = 32;

/// Terrain state written into solid demo cells.
const SOLID_STATE: i32 = 1;

/// Two rooms above a hallway, linked by single-cell doorways. `#` cells
/// are solid, `.` cells are open, a lowercase letter is an open cell that
/// doubles as a gate named after it and `S` marks the spawn cell.
const FLOOR_PLAN: &[&str] = &[
    "#######################",
    "#..........#..........#",
    "#..........#..........#",
    "#....S.....a..........#",
    "#..........#..........#",
    "#..........#..........#",
    "######b#########c######",
    "#.....................#",
    "#.....................#",
    "#.....................#",
    "#.....................#",
    "#.....................#",
    "#######################",
];

/// Builds the demo floor from the embedded plan.
///
/// # Panics
///
/// Panics when the plan contains an unsupported glyph or marks no spawn
/// cell; the plan is compiled in, so either is a bug in this module.
pub(crate) fn floor() -> FloorLayout {
    let mut rows = Vec::with_capacity(FLOOR_PLAN.len());
    let mut gates = Vec::new();
    let mut spawn_px = None;

    for (y, line) in FLOOR_PLAN.iter().enumerate() {
        let y = i32::try_from(y).expect("demo floor height fits in i32");
        let mut row = Vec::with_capacity(line.len());
        for (x, glyph) in line.chars().enumerate() {
            let x = i32::try_from(x).expect("demo floor width fits in i32");
            let state = match glyph {
                '#' => SOLID_STATE,
                '.' => 0,
                'S' => {
                    spawn_px = Some(cell_center(x, y));
                    0
                }
                glyph if glyph.is_ascii_lowercase() => {
                    gates.push(Gate::new(glyph.to_string(), CellCoord::new(x, y)));
                    0
                }
                glyph => panic!("demo floor plan contains unsupported glyph '{glyph}'"),
            };
            row.push(state);
        }
        rows.push(row);
    }

    let spawn_px = spawn_px.expect("demo floor plan marks a spawn cell");
    FloorLayout::from_rows(rows, CELL_SIZE, PassableSet::default(), spawn_px, gates)
}

fn cell_center(x: i32, y: i32) -> (i32, i32) {
    (
        x * CELL_SIZE + CELL_SIZE / 2,
        y * CELL_SIZE + CELL_SIZE / 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_parses_into_a_rectangular_grid() {
        let layout = floor();
        assert_eq!(layout.columns(), 23);
        assert_eq!(layout.rows(), 13);
        assert_eq!(layout.cell_size(), CELL_SIZE);
    }

    #[test]
    fn spawn_sits_at_the_marked_cell_center() {
        assert_eq!(floor().spawn_px(), (176, 112));
    }

    #[test]
    fn doorway_gates_are_open_and_named_after_their_glyphs() {
        let layout = floor();
        let gates: Vec<(&str, CellCoord)> = layout
            .gates()
            .iter()
            .map(|gate| (gate.name(), gate.cell()))
            .collect();
        assert_eq!(
            gates,
            vec![
                ("a", CellCoord::new(11, 3)),
                ("b", CellCoord::new(6, 6)),
                ("c", CellCoord::new(16, 6)),
            ]
        );

        let view = layout.view();
        for gate in layout.gates() {
            assert_eq!(view.state_at(gate.cell()), Some(0));
        }
    }

    #[test]
    fn border_cells_are_solid() {
        let layout = floor();
        let view = layout.view();
        for x in 0..23 {
            assert_eq!(view.state_at(CellCoord::new(x, 0)), Some(SOLID_STATE));
            assert_eq!(view.state_at(CellCoord::new(x, 12)), Some(SOLID_STATE));
        }
        for y in 0..13 {
            assert_eq!(view.state_at(CellCoord::new(0, y)), Some(SOLID_STATE));
            assert_eq!(view.state_at(CellCoord::new(22, y)), Some(SOLID_STATE));
        }
    }
}
