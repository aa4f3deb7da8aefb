//! Logistics flow propagation over the half-tile grid.
//!
//! Two passes: reverse links first, so sinks can be walked backward, then a
//! per-item flood fill from every transit start. Each (cell, item) pair is
//! recorded at most once, which bounds the work even when moves and warps
//! form cycles.

use std::collections::VecDeque;

use crate::geometry::{GridKey, Position};
use crate::world::WorldMap;

/// Register every cell as a predecessor on the cells its move and warps
/// lead to.
pub fn populate_reverse_logistics(map: &mut WorldMap) {
    let grid = map.logistic_grid_mut();

    let links: Vec<(Position, _, Vec<Position>)> = grid
        .iter()
        .map(|(key, cell)| (key.cell_center(), cell.movement(), cell.warps().to_vec()))
        .collect();

    for (pos, movement, warps) in links {
        if let Some(dir) = movement {
            let target = GridKey::half_tile(dir.offset(pos, 0.5));
            if let Some(next) = grid.get_mut(&target) {
                if next.accept_move_from(dir) {
                    next.add_moved_from(dir.opposite());
                }
            }
        }
        for warp in warps {
            if let Some(next) = grid.get_mut(&GridKey::half_tile(warp)) {
                next.add_warped_from(pos);
            }
        }
    }
}

/// Flood every output item of every transit start across moves and warps.
///
/// With `debug_inputs`, additionally flood every input item backward from
/// each transit end through the recorded predecessors.
pub fn populate_transit_logistics(map: &mut WorldMap, debug_inputs: bool) {
    let grid = map.logistic_grid_mut();

    let starts: Vec<(GridKey, Vec<String>)> = grid
        .iter()
        .filter(|(_, cell)| cell.is_transit_start())
        .map(|(key, cell)| (*key, cell.outputs().into_iter().flatten().cloned().collect()))
        .collect();

    let mut work: VecDeque<GridKey> = VecDeque::new();
    for (start, items) in starts {
        for item in items {
            work.push_back(start);
            while let Some(key) = work.pop_front() {
                let pos = key.cell_center();
                let Some(cell) = grid.get_mut(&key) else {
                    continue;
                };
                if !cell.add_transit(&item) || cell.is_banned_output(&item) {
                    continue;
                }
                let movement = cell.movement();
                let warp_from_blocked = cell.is_block_warp_from_if_move();
                let warps = cell.warps().to_vec();

                if let Some(dir) = movement {
                    let target = GridKey::half_tile(dir.offset(pos, 0.5));
                    if grid
                        .get(&target)
                        .is_some_and(|next| !next.is_block_transit() && next.accept_move_from(dir))
                    {
                        work.push_back(target);
                    }
                }
                for warp in warps {
                    let target = GridKey::half_tile(warp);
                    let Some(next) = grid.get(&target) else {
                        continue;
                    };
                    if next.is_block_transit()
                        || (next.movement().is_some() && warp_from_blocked)
                        || (movement.is_some() && next.is_block_warp_to_if_move())
                    {
                        continue;
                    }
                    work.push_back(target);
                }
            }
        }
    }

    if !debug_inputs {
        return;
    }

    let ends: Vec<(GridKey, Vec<String>)> = grid
        .iter()
        .filter(|(_, cell)| cell.is_transit_end())
        .map(|(key, cell)| (*key, cell.inputs().into_iter().flatten().cloned().collect()))
        .collect();

    for (end, items) in ends {
        for item in items {
            work.push_back(end);
            while let Some(key) = work.pop_front() {
                let pos = key.cell_center();
                let Some(cell) = grid.get_mut(&key) else {
                    continue;
                };
                if !cell.add_transit(&item) {
                    continue;
                }
                let predecessors: Vec<Position> = cell
                    .moved_from()
                    .iter()
                    .map(|dir| dir.offset(pos, 0.5))
                    .chain(cell.warped_from().iter().copied())
                    .collect();
                for prev in predecessors {
                    let target = GridKey::half_tile(prev);
                    if grid.get(&target).is_some_and(|c| !c.is_block_transit()) {
                        work.push_back(target);
                    }
                }
            }
        }
    }
}
