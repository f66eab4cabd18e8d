use warren_core::{CellCoord, Command, FloorLayout, Footprint, PassableSet};
use warren_system_pathfinding::Pathfinder;
use warren_world::{self as world, query, World};

const SMALL: Footprint = Footprint::new(8, 8);
const WIDE: Footprint = Footprint::new(30, 30);

fn load_floor(rows: Vec<Vec<i32>>, cell_size: i32) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadFloor {
            layout: FloorLayout::from_rows(
                rows,
                cell_size,
                PassableSet::default(),
                (0, 0),
                Vec::new(),
            ),
        },
        &mut events,
    );
    world
}

fn register(world: &mut World, footprint: Footprint) {
    let mut events = Vec::new();
    world::apply(world, Command::RegisterFootprint { footprint }, &mut events);
}

fn seal(world: &mut World, cells: Vec<CellCoord>, state: i32) {
    let mut events = Vec::new();
    world::apply(world, Command::SealCells { cells, state }, &mut events);
}

fn open_floor(size: usize, cell_size: i32) -> World {
    load_floor(vec![vec![0; size]; size], cell_size)
}

#[test]
fn crossing_an_open_floor_takes_the_diagonal() {
    let mut world = open_floor(5, 10);
    register(&mut world, SMALL);
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let cache = query::nav_cache(&world, SMALL);
    let mut finder = Pathfinder::new();

    let direct = finder.astar(
        view,
        passable,
        SMALL,
        None,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    );
    let cached = finder.astar(
        view,
        passable,
        SMALL,
        cache,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    );

    let expected = vec![
        CellCoord::new(0, 0),
        CellCoord::new(1, 1),
        CellCoord::new(2, 2),
        CellCoord::new(3, 3),
        CellCoord::new(4, 4),
    ];
    assert_eq!(direct.cells(), expected.as_slice());
    assert_eq!(direct.cost(), 56);
    assert_eq!(cached, direct, "cache changed the result");
}

#[test]
fn repeated_queries_return_identical_paths() {
    let world = load_floor(
        vec![
            vec![0, 0, 0, 0, 0],
            vec![0, 1, 1, 1, 0],
            vec![0, 0, 0, 1, 0],
            vec![0, 1, 0, 0, 0],
            vec![0, 0, 0, 1, 0],
        ],
        10,
    );
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let start = CellCoord::new(0, 0);
    let goal = CellCoord::new(4, 4);

    let mut finder = Pathfinder::new();
    let first = finder.astar(view, passable, SMALL, None, start, goal);
    let second = finder.astar(view, passable, SMALL, None, start, goal);
    let fresh = Pathfinder::new().astar(view, passable, SMALL, None, start, goal);

    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(first, fresh);
}

#[test]
fn separated_regions_reject_without_expanding() {
    let mut world = load_floor(
        vec![
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0],
        ],
        10,
    );
    register(&mut world, SMALL);
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let cache = query::nav_cache(&world, SMALL);
    assert!(cache.is_some());

    let mut finder = Pathfinder::new();
    let path = finder.astar(
        view,
        passable,
        SMALL,
        cache,
        CellCoord::new(0, 2),
        CellCoord::new(4, 2),
    );

    assert!(path.is_empty());
    assert_eq!(finder.nodes_expanded(), 0);
}

#[test]
fn blocked_column_forces_a_detour() {
    let world = load_floor(
        vec![
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 0, 0, 0],
        ],
        10,
    );
    let view = query::grid_view(&world);
    let passable = query::passable(&world);

    let mut finder = Pathfinder::new();
    let path = finder.astar(
        view,
        passable,
        SMALL,
        None,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
    );

    assert!(!path.is_empty());
    assert!(path.len() > 5, "detour was too short: {}", path.len());
    assert_eq!(path.first(), Some(CellCoord::new(0, 0)));
    assert_eq!(path.last(), Some(CellCoord::new(4, 4)));
    for cell in path.cells() {
        assert!(
            view.is_passable_at(*cell, passable),
            "path crosses solid cell ({}, {})",
            cell.x(),
            cell.y()
        );
    }
}

#[test]
fn touching_corners_cannot_be_cut() {
    let world = load_floor(vec![vec![0, 1], vec![1, 0]], 10);
    let view = query::grid_view(&world);
    let passable = query::passable(&world);

    let mut finder = Pathfinder::new();
    let path = finder.astar(
        view,
        passable,
        SMALL,
        None,
        CellCoord::new(0, 0),
        CellCoord::new(1, 1),
    );

    assert!(path.is_empty());
}

fn room_corridor_rows() -> Vec<Vec<i32>> {
    vec![
        vec![1, 1, 1, 1, 1, 1, 1, 1, 1],
        vec![0, 0, 0, 1, 1, 1, 0, 0, 0],
        vec![0, 0, 0, 0, 0, 0, 0, 0, 0],
        vec![0, 0, 0, 1, 1, 1, 0, 0, 0],
        vec![1, 1, 1, 1, 1, 1, 1, 1, 1],
    ]
}

#[test]
fn narrow_corridor_rejects_a_wide_footprint() {
    let world = load_floor(room_corridor_rows(), 10);
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let start = CellCoord::new(1, 2);
    let goal = CellCoord::new(7, 2);

    let mut finder = Pathfinder::new();
    let wide = finder.astar(view, passable, WIDE, None, start, goal);
    let small = finder.astar(view, passable, SMALL, None, start, goal);

    assert!(wide.is_empty(), "3x3 clearance fit through a 1-wide gap");
    assert!(!small.is_empty());
}

#[test]
fn mismatched_cache_is_ignored() {
    let mut world = load_floor(room_corridor_rows(), 10);
    register(&mut world, SMALL);
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let small_cache = query::nav_cache(&world, SMALL);
    assert!(small_cache.is_some());

    let mut finder = Pathfinder::new();
    let path = finder.astar(
        view,
        passable,
        WIDE,
        small_cache,
        CellCoord::new(1, 2),
        CellCoord::new(7, 2),
    );

    assert!(
        path.is_empty(),
        "walkability of the wrong footprint was trusted"
    );
}

#[test]
fn sealing_cells_reroutes_later_queries() {
    let mut world = open_floor(5, 10);
    register(&mut world, SMALL);
    let start = CellCoord::new(0, 2);
    let goal = CellCoord::new(4, 2);

    let mut finder = Pathfinder::new();
    let before = finder.astar(
        query::grid_view(&world),
        query::passable(&world),
        SMALL,
        query::nav_cache(&world, SMALL),
        start,
        goal,
    );
    assert_eq!(before.cost(), 40);

    let wall: Vec<CellCoord> = (0..5).map(|y| CellCoord::new(2, y)).collect();
    seal(&mut world, wall, 1);

    let after = finder.astar(
        query::grid_view(&world),
        query::passable(&world),
        SMALL,
        query::nav_cache(&world, SMALL),
        start,
        goal,
    );

    assert!(after.is_empty());
    assert_eq!(finder.nodes_expanded(), 0, "rebuilt cache was not consulted");
}

#[test]
fn exhausted_node_budget_returns_empty() {
    let world = open_floor(7, 10);
    let view = query::grid_view(&world);
    let passable = query::passable(&world);

    let mut finder = Pathfinder::with_node_budget(2);
    let path = finder.astar(
        view,
        passable,
        SMALL,
        None,
        CellCoord::new(0, 0),
        CellCoord::new(6, 6),
    );

    assert!(path.is_empty());
    assert_eq!(finder.nodes_expanded(), 2);
}

#[test]
fn start_equals_goal_yields_a_trivial_path() {
    let world = open_floor(3, 10);
    let mut finder = Pathfinder::new();

    let path = finder.astar(
        query::grid_view(&world),
        query::passable(&world),
        SMALL,
        None,
        CellCoord::new(1, 1),
        CellCoord::new(1, 1),
    );

    assert_eq!(path.cells(), &[CellCoord::new(1, 1)]);
    assert_eq!(path.cost(), 0);
    assert!(path.is_trivial());
}

#[test]
#[should_panic(expected = "outside the grid")]
fn out_of_bounds_start_panics() {
    let world = open_floor(3, 10);
    let mut finder = Pathfinder::new();
    let _ = finder.astar(
        query::grid_view(&world),
        query::passable(&world),
        SMALL,
        None,
        CellCoord::new(-1, 0),
        CellCoord::new(2, 2),
    );
}

#[test]
#[should_panic(expected = "outside the grid")]
fn out_of_bounds_goal_panics() {
    let world = open_floor(3, 10);
    let mut finder = Pathfinder::new();
    let _ = finder.astar(
        query::grid_view(&world),
        query::passable(&world),
        SMALL,
        None,
        CellCoord::new(0, 0),
        CellCoord::new(3, 3),
    );
}

#[test]
fn nearest_reachable_walks_toward_a_blocked_goal() {
    let world = load_floor(
        vec![
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0],
        ],
        10,
    );
    let view = query::grid_view(&world);
    let passable = query::passable(&world);

    let mut finder = Pathfinder::new();
    let substitute = finder.nearest_reachable(
        view,
        passable,
        SMALL,
        None,
        CellCoord::new(0, 2),
        CellCoord::new(4, 2),
        50,
    );

    assert_eq!(substitute, Some(CellCoord::new(1, 2)));
}

#[test]
fn nearest_reachable_stops_beside_a_solid_target() {
    let world = load_floor(
        vec![
            vec![0, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0],
        ],
        10,
    );
    let view = query::grid_view(&world);
    let passable = query::passable(&world);

    let mut finder = Pathfinder::new();
    let substitute = finder.nearest_reachable(
        view,
        passable,
        SMALL,
        None,
        CellCoord::new(0, 2),
        CellCoord::new(2, 2),
        50,
    );

    assert_eq!(substitute, Some(CellCoord::new(1, 2)));
}

#[test]
fn nearest_reachable_without_standing_room_returns_none() {
    let world = load_floor(vec![vec![1, 0], vec![0, 0]], 10);
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let mut finder = Pathfinder::new();

    let from_solid = finder.nearest_reachable(
        view,
        passable,
        SMALL,
        None,
        CellCoord::new(0, 0),
        CellCoord::new(1, 1),
        50,
    );
    let from_outside = finder.nearest_reachable(
        view,
        passable,
        SMALL,
        None,
        CellCoord::new(-1, 0),
        CellCoord::new(1, 1),
        50,
    );

    assert_eq!(from_solid, None);
    assert_eq!(from_outside, None);
}

#[test]
fn nearest_reachable_respects_the_step_budget() {
    let world = open_floor(7, 10);
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let start = CellCoord::new(0, 3);
    let desired = CellCoord::new(6, 3);

    let mut finder = Pathfinder::new();
    let zero_budget = finder.nearest_reachable(view, passable, SMALL, None, start, desired, 0);
    let one_step = finder.nearest_reachable(view, passable, SMALL, None, start, desired, 10);

    assert_eq!(zero_budget, Some(start));
    assert_eq!(one_step, Some(CellCoord::new(1, 3)));
}
