use warren_core::{CellCoord, Command, FloorLayout, PassableSet, PixelRect, PixelVelocity};
use warren_system_collision::{move_with_collision, rect_overlaps_solid};
use warren_world::{self as world, query, World};

fn walled_floor() -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadFloor {
            layout: FloorLayout::from_rows(
                vec![vec![0; 7]; 3],
                10,
                PassableSet::default(),
                (0, 0),
                Vec::new(),
            ),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::SealCells {
            cells: (0..3).map(|y| CellCoord::new(3, y)).collect(),
            state: 1,
        },
        &mut events,
    );
    world
}

#[test]
fn fast_movement_cannot_tunnel_through_a_wall() {
    let world = walled_floor();
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let rect = PixelRect::new(11, 5, 8, 8);

    let resolved = move_with_collision(rect, PixelVelocity::new(40, 0), view, passable, 2);

    assert_eq!(resolved, PixelRect::new(21, 5, 8, 8));
    assert!(
        resolved.right() <= 30,
        "rect crossed the wall: right edge at {}",
        resolved.right()
    );
}

#[test]
fn diagonal_push_into_a_wall_slides_along_it() {
    let world = walled_floor();
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let rect = PixelRect::new(21, 5, 8, 8);

    let resolved = move_with_collision(rect, PixelVelocity::new(4, 8), view, passable, 2);

    assert_eq!(resolved, PixelRect::new(22, 13, 8, 8));
}

#[test]
fn rect_embedded_in_the_wall_stays_put() {
    let world = walled_floor();
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let rect = PixelRect::new(28, 5, 8, 8);
    assert!(rect_overlaps_solid(rect, view, passable));

    let resolved = move_with_collision(rect, PixelVelocity::new(4, 4), view, passable, 2);

    assert_eq!(resolved, rect);
}

#[test]
fn movement_beyond_the_grid_edge_is_free() {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadFloor {
            layout: FloorLayout::from_rows(
                vec![vec![0; 3]; 3],
                10,
                PassableSet::default(),
                (0, 0),
                Vec::new(),
            ),
        },
        &mut events,
    );
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let rect = PixelRect::new(22, 5, 8, 8);

    let resolved = move_with_collision(rect, PixelVelocity::new(20, 0), view, passable, 2);

    assert_eq!(resolved, PixelRect::new(42, 5, 8, 8));
}

#[test]
fn sealed_cells_block_movement_that_was_previously_open() {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadFloor {
            layout: FloorLayout::from_rows(
                vec![vec![0; 5]; 1],
                10,
                PassableSet::default(),
                (0, 0),
                Vec::new(),
            ),
        },
        &mut events,
    );
    let rect = PixelRect::new(1, 1, 8, 8);
    let velocity = PixelVelocity::new(30, 0);

    let open = move_with_collision(
        rect,
        velocity,
        query::grid_view(&world),
        query::passable(&world),
        2,
    );
    assert_eq!(open, PixelRect::new(31, 1, 8, 8));

    world::apply(
        &mut world,
        Command::SealCells {
            cells: vec![CellCoord::new(2, 0)],
            state: 1,
        },
        &mut events,
    );
    let blocked = move_with_collision(
        rect,
        velocity,
        query::grid_view(&world),
        query::passable(&world),
        2,
    );

    assert_eq!(blocked, PixelRect::new(11, 1, 8, 8));
}
