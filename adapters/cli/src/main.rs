#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that exercises the Warren navigation engine.

use std::collections::VecDeque;

use anyhow::{anyhow, bail, Context as _};
use clap::{Args, Parser, Subcommand};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use warren_core::{
    cell_to_pixel_center, pixel_to_cell, CellCoord, Command, FloorLayout, Footprint, Gate,
    GridView, PassableSet, Path, PixelRect, PixelVelocity, DIAGONAL_STEP_COST,
    ORTHOGONAL_STEP_COST,
};
use warren_system_collision::move_with_collision;
use warren_system_pathfinding::{GateRouter, Pathfinder};
use warren_world::{self as world, query, World};

mod demo;
mod floor_transfer;

/// Pixel footprint of the demo actor.
const ACTOR_FOOTPRINT: Footprint = Footprint::new(18, 18);
/// Pixel edge length of the demo actor's square body.
const ACTOR_SIZE_PX: i32 = 18;
/// Walking speed of the demo actor in pixels per second.
const ACTOR_SPEED: f32 = 180.0;
/// Pixel offset lowering the collider toward the actor's feet.
const COLLIDER_OFFSET_Y: i32 = 6;
/// Substep length in pixels used by the swept collision resolver.
const COLLISION_SUBSTEP: i32 = 2;
/// Search budget in pixels for snapping a blocked destination.
const DESTINATION_ASSIST_PX: i32 = 10;
/// Simulation timestep, fixed at sixty frames per second.
const FRAME_SECONDS: f32 = 1.0 / 60.0;

/// Plans paths, walks actors and stress-tests floors from the terminal.
#[derive(Parser)]
#[command(name = "warren", version, about)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Searches for a path between two cells on the demo floor.
    Route(RouteArgs),
    /// Walks an actor along a planned path, resolving collisions per frame.
    Walk(WalkArgs),
    /// Hammers randomly generated floors and verifies search invariants.
    Soak(SoakArgs),
    /// Prints the demo floor as a transfer string.
    Export,
    /// Decodes a transfer string and summarises the floor it carries.
    Import(ImportArgs),
}

#[derive(Args)]
struct RouteArgs {
    /// Start cell written as "x,y".
    #[arg(long, value_parser = parse_cell)]
    from: CellCoord,
    /// Goal cell written as "x,y".
    #[arg(long, value_parser = parse_cell)]
    to: CellCoord,
    /// Actor width in pixels.
    #[arg(long, default_value_t = 18)]
    width: u32,
    /// Actor height in pixels.
    #[arg(long, default_value_t = 18)]
    height: u32,
    /// Serve the query through the precomputed gate table.
    #[arg(long)]
    via_gates: bool,
}

#[derive(Args)]
struct WalkArgs {
    /// Destination cell written as "x,y".
    #[arg(long, value_parser = parse_cell)]
    to: CellCoord,
    /// Simulation frame budget before the walk is abandoned.
    #[arg(long, default_value_t = 600)]
    frames: u32,
}

#[derive(Args)]
struct SoakArgs {
    /// Scenario name hashed into the random seed.
    #[arg(long, default_value = "warren-soak")]
    scenario: String,
    /// Number of random floors to generate.
    #[arg(long, default_value_t = 25)]
    floors: u32,
    /// Number of start and goal pairs queried per floor.
    #[arg(long, default_value_t = 40)]
    queries: u32,
}

#[derive(Args)]
struct ImportArgs {
    /// Transfer string produced by the export subcommand.
    transfer: String,
}

/// Aggregate counters reported at the end of a soak run.
#[derive(Debug, Default)]
struct SoakTotals {
    floors: u32,
    skipped_floors: u32,
    queries: u64,
    unreachable: u64,
    cost_matches: u64,
    cost_exceeds: u64,
    nodes_expanded: u64,
    gate_hits: u64,
    direct_fallbacks: u64,
}

/// Entry point for the Warren command-line interface.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        CliCommand::Route(args) => run_route(&args),
        CliCommand::Walk(args) => run_walk(&args),
        CliCommand::Soak(args) => run_soak(&args),
        CliCommand::Export => run_export(),
        CliCommand::Import(args) => run_import(&args),
    }
}

fn run_route(args: &RouteArgs) -> anyhow::Result<()> {
    if args.width == 0 || args.height == 0 {
        bail!(
            "actor dimensions must be positive, got {}x{} px",
            args.width,
            args.height
        );
    }
    let footprint = Footprint::new(args.width, args.height);
    let world = demo_world(footprint);
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let cache = query::nav_cache(&world, footprint);

    for (label, cell) in [("start", args.from), ("goal", args.to)] {
        if !view.in_bounds(cell) {
            bail!(
                "{label} cell ({}, {}) lies outside the {}x{} demo floor",
                cell.x(),
                cell.y(),
                view.columns(),
                view.rows()
            );
        }
    }

    let mut finder = Pathfinder::new();
    let path;
    if args.via_gates {
        let mut router =
            GateRouter::build(view, passable, footprint, cache, query::gates(&world));
        path = router.route(view, passable, cache, args.from, args.to);
        let stats = router.stats();
        println!(
            "gate table: {} gate cell(s), {} stored leg(s), {} hit(s), {} fallback(s)",
            router.gate_cells().len(),
            router.stored_paths(),
            stats.gate_hits,
            stats.direct_fallbacks
        );
    } else {
        path = finder.astar(view, passable, footprint, cache, args.from, args.to);
        println!("direct search expanded {} node(s)", finder.nodes_expanded());
    }

    if path.is_empty() {
        println!(
            "no route from ({}, {}) to ({}, {}) for a {}x{} px actor",
            args.from.x(),
            args.from.y(),
            args.to.x(),
            args.to.y(),
            args.width,
            args.height
        );
        let near = finder.nearest_reachable(
            view,
            passable,
            footprint,
            cache,
            args.from,
            args.to,
            DESTINATION_ASSIST_PX,
        );
        if let Some(cell) = near {
            if cell != args.from {
                println!(
                    "nearest reachable stand-in within {DESTINATION_ASSIST_PX} px: ({}, {})",
                    cell.x(),
                    cell.y()
                );
            }
        }
        return Ok(());
    }

    println!("route: {} cell(s), cost {}", path.len(), path.cost());
    print!("{}", render_overlay(view, passable, &path));
    Ok(())
}

fn run_walk(args: &WalkArgs) -> anyhow::Result<()> {
    let world = demo_world(ACTOR_FOOTPRINT);
    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let cache = query::nav_cache(&world, ACTOR_FOOTPRINT);
    let cell_size = view.cell_size();

    if !view.in_bounds(args.to) {
        bail!(
            "destination cell ({}, {}) lies outside the {}x{} demo floor",
            args.to.x(),
            args.to.y(),
            view.columns(),
            view.rows()
        );
    }

    let spawn = query::spawn_px(&world);
    let mut actor = PixelRect::new(0, 0, ACTOR_SIZE_PX, ACTOR_SIZE_PX).centered_at(spawn.0, spawn.1);
    let start = cell_of(actor.center(), cell_size);
    if start == args.to {
        println!(
            "actor already stands in cell ({}, {})",
            start.x(),
            start.y()
        );
        return Ok(());
    }

    let mut finder = Pathfinder::new();
    let mut goal = args.to;
    let mut path = finder.astar(view, passable, ACTOR_FOOTPRINT, cache, start, goal);
    if path.is_trivial() {
        let near = finder.nearest_reachable(
            view,
            passable,
            ACTOR_FOOTPRINT,
            cache,
            start,
            goal,
            DESTINATION_ASSIST_PX,
        );
        if let Some(cell) = near {
            if cell != start {
                println!(
                    "destination blocked, walking to nearest reachable cell ({}, {})",
                    cell.x(),
                    cell.y()
                );
                goal = cell;
                path = finder.astar(view, passable, ACTOR_FOOTPRINT, cache, start, goal);
            }
        }
    }
    if path.is_trivial() {
        bail!(
            "no route from the spawn cell ({}, {}) to ({}, {})",
            start.x(),
            start.y(),
            args.to.x(),
            args.to.y()
        );
    }

    let mut nodes: VecDeque<CellCoord> = path.cells()[1..].iter().copied().collect();
    println!(
        "walking {} node(s) from ({}, {}) to ({}, {}) at {} px/s",
        nodes.len(),
        start.x(),
        start.y(),
        goal.x(),
        goal.y(),
        ACTOR_SPEED
    );
    print!("{}", render_overlay(view, passable, &path));

    let arrival = cell_size / 3;
    let mut frame: u32 = 0;
    while let Some(&next) = nodes.front() {
        if frame == args.frames {
            bail!(
                "actor still {} node(s) short of the goal after {} frame(s)",
                nodes.len(),
                args.frames
            );
        }
        frame += 1;

        let mut target = cell_center_px(next, cell_size);
        let center = actor.center();
        let to_target = Vec2::new((target.0 - center.0) as f32, (target.1 - center.1) as f32);
        let distance = to_target.length().max(1.0);
        let paced = to_target / distance * (ACTOR_SPEED * FRAME_SECONDS);
        let velocity = PixelVelocity::new(paced.x.round() as i32, paced.y.round() as i32);

        let before = actor.center();
        actor = step_actor(actor, velocity, view, passable);
        let after = actor.center();

        let prev_gap = (before.0 - target.0).abs() + (before.1 - target.1).abs();
        let next_gap = (after.0 - target.0).abs() + (after.1 - target.1).abs();
        if after == before && next_gap >= prev_gap {
            // Wedged against geometry: skip the node, or replan when none remain.
            let _ = nodes.pop_front();
            match nodes.front() {
                Some(&skipped_to) => target = cell_center_px(skipped_to, cell_size),
                None => {
                    let here = cell_of(after, cell_size);
                    let replanned =
                        finder.astar(view, passable, ACTOR_FOOTPRINT, cache, here, goal);
                    if replanned.is_trivial() {
                        bail!(
                            "actor wedged at ({}, {}) px with no route onward",
                            after.0,
                            after.1
                        );
                    }
                    nodes = replanned.cells()[1..].iter().copied().collect();
                    println!("frame {frame}: stalled, replanned {} node(s)", nodes.len());
                    continue;
                }
            }
        }

        if (after.0 - target.0).abs() <= arrival && (after.1 - target.1).abs() <= arrival {
            let _ = nodes.pop_front();
        }

        if frame % 60 == 0 {
            println!(
                "frame {frame}: actor at ({}, {}) px, {} node(s) left",
                after.0,
                after.1,
                nodes.len()
            );
        }
    }

    let center = actor.center();
    println!("arrived at ({}, {}) px after {frame} frame(s)", center.0, center.1);
    Ok(())
}

fn run_soak(args: &SoakArgs) -> anyhow::Result<()> {
    let seed = scenario_seed(&args.scenario);
    println!("scenario '{}' runs under seed {seed:#018x}", args.scenario);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut totals = SoakTotals::default();
    for floor_index in 0..args.floors {
        let layout = random_floor(&mut rng);
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(&mut world, Command::LoadFloor { layout }, &mut events);
        world::apply(
            &mut world,
            Command::RegisterFootprint {
                footprint: ACTOR_FOOTPRINT,
            },
            &mut events,
        );

        let view = query::grid_view(&world);
        let passable = query::passable(&world);
        let cache = query::nav_cache(&world, ACTOR_FOOTPRINT);

        let open = open_cells(view, passable);
        if open.len() < 2 {
            totals.skipped_floors += 1;
            continue;
        }

        let mut router =
            GateRouter::build(view, passable, ACTOR_FOOTPRINT, cache, query::gates(&world));
        let mut first = Pathfinder::new();
        let mut second = Pathfinder::new();

        for query_index in 0..args.queries {
            let from = open[rng.gen_range(0..open.len())];
            let to = open[rng.gen_range(0..open.len())];

            let direct = first.astar(view, passable, ACTOR_FOOTPRINT, cache, from, to);
            let replayed = second.astar(view, passable, ACTOR_FOOTPRINT, cache, from, to);
            if direct != replayed {
                bail!("floor {floor_index} query {query_index}: identical searches diverged");
            }
            totals.nodes_expanded += u64::from(first.nodes_expanded());
            verify_path(&direct, view, passable, from, to)
                .map_err(|issue| anyhow!("floor {floor_index} query {query_index}: {issue}"))?;

            let routed = router.route(view, passable, cache, from, to);
            if routed.is_empty() != direct.is_empty() {
                bail!(
                    "floor {floor_index} query {query_index}: gate routing and direct search \
                     disagree on reachability"
                );
            }
            verify_path(&routed, view, passable, from, to)
                .map_err(|issue| anyhow!("floor {floor_index} query {query_index}: {issue}"))?;
            if routed.cost() < direct.cost() {
                bail!(
                    "floor {floor_index} query {query_index}: gate route cost {} undercuts the \
                     direct cost {}",
                    routed.cost(),
                    direct.cost()
                );
            }

            totals.queries += 1;
            if direct.is_empty() {
                totals.unreachable += 1;
            } else if routed.cost() == direct.cost() {
                totals.cost_matches += 1;
            } else {
                totals.cost_exceeds += 1;
            }
        }

        let stats = router.stats();
        totals.gate_hits += stats.gate_hits;
        totals.direct_fallbacks += stats.direct_fallbacks;
        totals.floors += 1;
    }

    println!(
        "{} floor(s) ({} skipped), {} queries: {} unreachable, {} gate-cost matches, {} gate-cost detours",
        totals.floors,
        totals.skipped_floors,
        totals.queries,
        totals.unreachable,
        totals.cost_matches,
        totals.cost_exceeds
    );
    println!(
        "{} node(s) expanded, gate table {} hit(s) / {} fallback(s)",
        totals.nodes_expanded, totals.gate_hits, totals.direct_fallbacks
    );
    Ok(())
}

fn run_export() -> anyhow::Result<()> {
    let layout = demo::floor();
    println!("{}", floor_transfer::FloorSnapshot::of(&layout).encode());
    Ok(())
}

fn run_import(args: &ImportArgs) -> anyhow::Result<()> {
    let snapshot = floor_transfer::FloorSnapshot::decode(&args.transfer).with_context(|| {
        format!(
            "expected a transfer string starting with '{}'",
            floor_transfer::TRANSFER_HEADER
        )
    })?;
    let layout = snapshot.into_layout();

    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::LoadFloor { layout }, &mut events);
    world::apply(
        &mut world,
        Command::RegisterFootprint {
            footprint: ACTOR_FOOTPRINT,
        },
        &mut events,
    );

    let view = query::grid_view(&world);
    let passable = query::passable(&world);
    let spawn = query::spawn_px(&world);
    println!(
        "floor {}x{} at {} px/cell, spawn ({}, {}) px, passable states {:?}",
        view.columns(),
        view.rows(),
        view.cell_size(),
        spawn.0,
        spawn.1,
        passable.values()
    );
    for gate in query::gates(&world) {
        println!(
            "gate '{}' at ({}, {})",
            gate.name(),
            gate.cell().x(),
            gate.cell().y()
        );
    }
    if let Some(cache) = query::nav_cache(&world, ACTOR_FOOTPRINT) {
        println!(
            "{} region(s) for an {}x{} px actor",
            cache.region_count(),
            ACTOR_FOOTPRINT.width_px(),
            ACTOR_FOOTPRINT.height_px()
        );
    }
    print!("{}", render_overlay(view, passable, &Path::empty()));
    Ok(())
}

/// Stands up a world with the demo floor loaded and a footprint registered.
fn demo_world(footprint: Footprint) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadFloor {
            layout: demo::floor(),
        },
        &mut events,
    );
    world::apply(&mut world, Command::RegisterFootprint { footprint }, &mut events);
    world
}

/// Advances the actor's box one frame, keeping the collider at its feet.
fn step_actor(
    actor: PixelRect,
    velocity: PixelVelocity,
    view: GridView<'_>,
    passable: &PassableSet,
) -> PixelRect {
    let collider = actor.translated(0, COLLIDER_OFFSET_Y);
    let moved = move_with_collision(collider, velocity, view, passable, COLLISION_SUBSTEP);
    moved.translated(0, -COLLIDER_OFFSET_Y)
}

/// Renders the floor as text, overlaying a path when one is given.
fn render_overlay(view: GridView<'_>, passable: &PassableSet, path: &Path) -> String {
    let mut out = String::new();
    for y in 0..view.rows() {
        for x in 0..view.columns() {
            let cell = CellCoord::new(
                i32::try_from(x).unwrap_or(i32::MAX),
                i32::try_from(y).unwrap_or(i32::MAX),
            );
            let glyph = if path.first() == Some(cell) {
                'S'
            } else if path.last() == Some(cell) {
                'G'
            } else if path.cells().contains(&cell) {
                '*'
            } else if view.is_passable_at(cell, passable) {
                '.'
            } else {
                '#'
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

/// Checks a returned path's structural invariants.
fn verify_path(
    path: &Path,
    view: GridView<'_>,
    passable: &PassableSet,
    from: CellCoord,
    to: CellCoord,
) -> Result<(), String> {
    if path.is_empty() {
        return Ok(());
    }
    if path.first() != Some(from) || path.last() != Some(to) {
        return Err(String::from("path endpoints do not match the query"));
    }
    let mut expected_cost = 0u32;
    for pair in path.cells().windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dx = a.x().abs_diff(b.x());
        let dy = a.y().abs_diff(b.y());
        if dx > 1 || dy > 1 || (dx == 0 && dy == 0) {
            return Err(format!(
                "cells ({}, {}) and ({}, {}) are not adjacent",
                a.x(),
                a.y(),
                b.x(),
                b.y()
            ));
        }
        expected_cost += if dx == 1 && dy == 1 {
            DIAGONAL_STEP_COST
        } else {
            ORTHOGONAL_STEP_COST
        };
    }
    for &cell in path.cells() {
        if !view.is_passable_at(cell, passable) {
            return Err(format!(
                "cell ({}, {}) on the path is not passable",
                cell.x(),
                cell.y()
            ));
        }
    }
    if expected_cost != path.cost() {
        return Err(format!(
            "path cost {} does not match its {} step(s)",
            path.cost(),
            path.len() - 1
        ));
    }
    Ok(())
}

/// Generates a bordered random floor with a handful of gates.
fn random_floor(rng: &mut ChaCha8Rng) -> FloorLayout {
    let columns = rng.gen_range(8i32..=24);
    let rows = rng.gen_range(6i32..=18);
    let cell_size = [16, 24, 32][rng.gen_range(0..3)];

    let mut cells = Vec::new();
    let mut spawn = None;
    for y in 0..rows {
        for x in 0..columns {
            let border = x == 0 || y == 0 || x == columns - 1 || y == rows - 1;
            let solid = border || rng.gen_bool(0.22);
            if !solid && spawn.is_none() {
                spawn = Some(CellCoord::new(x, y));
            }
            cells.push(i32::from(solid));
        }
    }
    let spawn_px = spawn.map_or((cell_size / 2, cell_size / 2), |cell| {
        cell_center_px(cell, cell_size)
    });

    let gate_count = rng.gen_range(2..=4);
    let mut gates = Vec::new();
    for index in 0..gate_count {
        let cell = CellCoord::new(rng.gen_range(1..columns - 1), rng.gen_range(1..rows - 1));
        gates.push(Gate::new(format!("g{index}"), cell));
    }

    FloorLayout::new(
        u32::try_from(columns).unwrap_or(0),
        u32::try_from(rows).unwrap_or(0),
        cell_size,
        cells,
        PassableSet::default(),
        spawn_px,
        gates,
    )
}

/// Collects every raw-passable cell on the floor.
fn open_cells(view: GridView<'_>, passable: &PassableSet) -> Vec<CellCoord> {
    let mut open = Vec::new();
    for index in 0..view.cell_count() {
        if let Some(cell) = view.cell_at(index) {
            if view.is_passable_at(cell, passable) {
                open.push(cell);
            }
        }
    }
    open
}

/// Hashes a scenario name into a reproducible seed.
fn scenario_seed(scenario: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(scenario.as_bytes());
    let digest = hasher.finalize();
    u64::from_le_bytes(
        digest[0..8]
            .try_into()
            .expect("sha256 digest is at least eight bytes"),
    )
}

/// Cell containing a pixel position.
fn cell_of(px: (i32, i32), cell_size: i32) -> CellCoord {
    CellCoord::new(pixel_to_cell(px.0, cell_size), pixel_to_cell(px.1, cell_size))
}

/// Pixel center of a cell, rounded to whole pixels.
fn cell_center_px(cell: CellCoord, cell_size: i32) -> (i32, i32) {
    (
        cell_to_pixel_center(cell.x(), cell_size).round() as i32,
        cell_to_pixel_center(cell.y(), cell_size).round() as i32,
    )
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let invalid = || format!("'{value}' is not a cell of the form x,y");
    let (x, y) = value.split_once(',').ok_or_else(|| invalid())?;
    let x = x.trim().parse::<i32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<i32>().map_err(|_| invalid())?;
    Ok(CellCoord::new(x, y))
}
