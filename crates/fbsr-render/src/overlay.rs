//! Overlays derived from the propagated world model: item flow along the
//! logistics grid, station traffic on the rail graph, and the debug views
//! of both.

use fbsr_core::blueprint::{BlueprintEntity, BlueprintTile};
use fbsr_core::geometry::{Bounds, Direction, Position};
use fbsr_core::world::WorldMap;
use fbsr_data::GameData;
use image::Rgba;

use crate::canvas::{rgb, with_alpha};
use crate::options::RenderOptions;
use crate::renderer::{Layer, Renderer, draw_fn, line_renderer};

const CYAN: Rgba<u8> = Rgba([0, 255, 255, 255]);
const MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);

const DEBUG_STROKE: f64 = 2.0 / 32.0;
const WIRE_STROKE: f64 = 1.5 / 32.0;
const RAIL_IO_STROKE: f64 = 1.0;
const RAIL_IO_ALPHA: u8 = 32;
const RAIL_CONTROL: f64 = 1.7;

// ---------------------------------------------------------------------------
// Logistics
// ---------------------------------------------------------------------------

/// Lane offset across the movement for the `i`th of `n` items in a cell.
pub fn lane_shift(i: usize, n: usize) -> f64 {
    ((i + 1) as f64 / (n + 1) as f64 - 0.5) / 3.0
}

/// One stroke per transiting item along each cell's move, plus the
/// predecessor links when `debug-logistic` is set.
pub fn logistic_overlay(out: &mut Vec<Box<dyn Renderer>>, map: &WorldMap, data: &GameData, options: &RenderOptions) {
    for (pos, cell) in map.logistic_cells() {
        let transits = cell.transits();
        let n = transits.len();
        if n > 0 {
            let width = 0.3 / n as f64;
            let alpha = (255 - 127 / n) as u8;
            let target_accepts = |d: Direction| map.logistic_cell(d.offset(pos, 0.5)).is_some_and(|c| c.is_accepting());
            if let Some(d) = cell.movement().filter(|&d| target_accepts(d)) {
                for (i, item) in transits.iter().enumerate() {
                    let shift = lane_shift(i, n);
                    let a = d.right().offset(pos, shift);
                    let b = d.right().offset(d.offset(pos, 0.5), shift);
                    let color = with_alpha(rgb(data.item_color(item)), alpha);
                    out.push(line_renderer(Layer::LogisticsMove, a, b, width, color));
                }
            }
        }

        if !options.debug_logistic {
            continue;
        }
        for d in cell.moved_from().iter() {
            out.push(line_renderer(Layer::DebugLogistic, pos, d.offset(pos, 0.5), DEBUG_STROKE, CYAN));
        }
        for &from in cell.warped_from() {
            let color = if cell.is_block_warp_to_if_move() {
                RED
            } else if map.logistic_cell(from).is_some_and(|c| c.is_block_warp_from_if_move()) {
                MAGENTA
            } else {
                GREEN
            };
            out.push(line_renderer(Layer::Wire, from, pos, WIRE_STROKE, color));
        }
    }
}

// ---------------------------------------------------------------------------
// Rails
// ---------------------------------------------------------------------------

/// Color for an edge pair carrying station traffic.
pub fn rail_io_color(input: bool, output: bool) -> Option<Rgba<u8>> {
    match (input, output) {
        (true, true) => Some(YELLOW),
        (true, false) => Some(GREEN),
        (false, true) => Some(RED),
        (false, false) => None,
    }
}

/// Wide translucent paths over track leading into and out of stations.
/// `debug-rail` adds every unblocked edge and per-node edge counts.
pub fn rail_overlay(out: &mut Vec<Box<dyn Renderer>>, map: &WorldMap, options: &RenderOptions) {
    for (first, second) in map.rail_edge_pairs() {
        let input = first.is_input() || second.is_input();
        let output = first.is_output() || second.is_output();
        if let Some(color) = rail_io_color(input, output) {
            let (p1, d1, p2, d2) = (first.start_pos, first.start_dir, first.end_pos, first.end_dir);
            let color = with_alpha(color, RAIL_IO_ALPHA);
            let bounds = Bounds::from_diagonal(p1.x, p1.y, p2.x, p2.y);
            if first.curved {
                let (c1, c2) = (d1.offset(p1, RAIL_CONTROL), d2.offset(p2, RAIL_CONTROL));
                out.push(draw_fn(Layer::LogisticsRailIo, bounds, move |canvas| {
                    canvas.cubic(p1, c1, c2, p2, RAIL_IO_STROKE, color);
                    Ok(())
                }));
            } else {
                out.push(line_renderer(Layer::LogisticsRailIo, p1, p2, RAIL_IO_STROKE, color));
            }
        }

        if options.debug_rail {
            for edge in [first, second] {
                if edge.is_blocked() {
                    continue;
                }
                let a = edge.start_dir.right().offset(edge.start_pos, 1.0);
                let b = edge.end_dir.left().offset(edge.end_pos, 1.0);
                out.push(line_renderer(Layer::LogisticsRailIo, a, b, DEBUG_STROKE, with_alpha(GREEN, 92)));
            }
        }
    }

    if !options.debug_rail {
        return;
    }
    for (pos, node) in map.rail_nodes() {
        let incoming: Vec<(Direction, usize)> = Direction::all()
            .into_iter()
            .map(|d| (d, node.incoming(d).len()))
            .filter(|&(_, n)| n > 0)
            .collect();
        let outgoing: Vec<(Direction, usize)> = Direction::all()
            .into_iter()
            .map(|d| (d, node.outgoing(d).len()))
            .filter(|&(_, n)| n > 0)
            .collect();
        out.push(edge_counts(Layer::DebugRailIncoming, pos, incoming, CYAN, Direction::right));
        out.push(edge_counts(Layer::DebugRailOutgoing, pos, outgoing, MAGENTA, Direction::left));
    }
}

/// A short tick per direction with edges, labelled with the edge count.
fn edge_counts(
    layer: Layer,
    pos: Position,
    counts: Vec<(Direction, usize)>,
    color: Rgba<u8>,
    side: fn(Direction) -> Direction,
) -> Box<dyn Renderer> {
    draw_fn(layer, Bounds::centered(pos, 1.5, 1.5), move |canvas| {
        for &(dir, count) in &counts {
            let p1 = side(dir).offset(pos, 0.25);
            let p2 = dir.offset(p1, 0.5);
            canvas.line(p1, p2, 1.0 / 32.0, color);
            canvas.text(Position::new(p2.x - 0.1, p2.y - 0.2), 0.5, &count.to_string(), color);
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

fn placement_dot(pos: Position) -> Box<dyn Renderer> {
    draw_fn(Layer::DebugPlacement, Bounds::centered(pos, 0.2, 0.2), move |canvas| {
        canvas.fill_circle(pos, 0.1, CYAN);
        Ok(())
    })
}

/// A dot at every entity and tile position and a facing tick per entity.
pub fn placement_overlay(out: &mut Vec<Box<dyn Renderer>>, entities: &[BlueprintEntity], tiles: &[BlueprintTile]) {
    for entity in entities {
        let pos = entity.position;
        out.push(placement_dot(pos));
        out.push(line_renderer(
            Layer::DebugPlacement,
            pos,
            entity.direction.offset(pos, 0.3),
            3.0 / 32.0,
            GREEN,
        ));
    }
    for tile in tiles {
        out.push(placement_dot(tile.position));
    }
}
