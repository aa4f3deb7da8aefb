//! Property-based tests for the rail and logistics propagators.
//!
//! Builds random straight tracks and move loops, then checks block
//! locality, idempotence, and termination under cycles.

use fbsr_core::flow::{populate_reverse_logistics, populate_transit_logistics};
use fbsr_core::geometry::{Direction, Position};
use fbsr_core::rail::{propagate_signal_blocks, propagate_station_io};
use fbsr_core::test_utils::*;
use fbsr_core::world::WorldMap;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// A vertical track of `pieces` rails with signals at random nodes.
fn arb_signalled_track() -> impl Strategy<Value = (usize, Vec<(usize, bool)>, Option<(usize, bool)>)> {
    (3..16usize).prop_flat_map(|pieces| {
        (
            Just(pieces),
            proptest::collection::vec((0..=pieces, any::<bool>()), 0..5),
            proptest::option::of((0..=pieces, any::<bool>())),
        )
    })
}

fn build_track(pieces: usize, signals: &[(usize, bool)], station: Option<(usize, bool)>) -> WorldMap {
    let mut map = WorldMap::new();
    vertical_track(&mut map, pieces);
    for &(node, north) in signals {
        let dir = if north { Direction::North } else { Direction::South };
        map.get_or_create_rail_node(track_node(node)).add_signal(dir);
    }
    if let Some((node, north)) = station {
        let dir = if north { Direction::North } else { Direction::South };
        map.get_or_create_rail_node(track_node(node)).set_station(dir);
    }
    map
}

fn item_names() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("[a-z]{1,8}", 1..4).prop_map(|s| s.into_iter().collect())
}

// ===========================================================================
// Rail properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A signal blocks its direction of travel up to the next signalled node
    /// and never past it.
    #[test]
    fn signal_block_stops_at_next_signal(
        (pieces, signal, stopper) in (3..16usize).prop_flat_map(|pieces| {
            (Just(pieces), 0..pieces).prop_flat_map(move |(pieces, signal)| {
                (Just(pieces), Just(signal), (signal + 1)..=pieces)
            })
        })
    ) {
        let mut map = WorldMap::new();
        vertical_track(&mut map, pieces);
        map.get_or_create_rail_node(track_node(signal)).add_signal(Direction::North);
        let boundary = map.get_or_create_rail_node(track_node(stopper));
        boundary.add_signal(Direction::North);
        boundary.add_signal(Direction::South);

        propagate_signal_blocks(&mut map);

        for (_, edge) in all_edges(&map) {
            let southbound = edge.end_pos.y > edge.start_pos.y;
            let end_index = (edge.end_pos.y / 2.0) as usize;
            if southbound {
                prop_assert_eq!(edge.is_blocked(), end_index <= stopper,
                    "edge {:?} -> {:?}", edge.start_pos, edge.end_pos);
            } else {
                prop_assert!(!edge.is_blocked());
            }
        }
    }

    /// Running the propagators again changes no flag.
    #[test]
    fn rail_propagation_is_idempotent((pieces, signals, station) in arb_signalled_track()) {
        let mut map = build_track(pieces, &signals, station);
        propagate_signal_blocks(&mut map);
        propagate_station_io(&mut map);
        let first = edge_flags(&map);

        propagate_signal_blocks(&mut map);
        propagate_station_io(&mut map);
        prop_assert_eq!(first, edge_flags(&map));
    }

    /// Blocked edges are never tagged as station input or output.
    #[test]
    fn station_io_excludes_blocked_edges((pieces, signals, station) in arb_signalled_track()) {
        let mut map = build_track(pieces, &signals, station);
        propagate_signal_blocks(&mut map);
        propagate_station_io(&mut map);

        for (_, edge) in all_edges(&map) {
            if edge.is_blocked() {
                prop_assert!(!edge.is_input() && !edge.is_output());
            }
        }
    }

    /// Without signals nothing is ever blocked.
    #[test]
    fn unsignalled_track_is_open(pieces in 1..20usize) {
        let mut map = WorldMap::new();
        vertical_track(&mut map, pieces);
        propagate_signal_blocks(&mut map);
        prop_assert!(all_edges(&map).iter().all(|(_, e)| !e.is_blocked()));
    }
}

// ===========================================================================
// Logistics properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A flood around a closed loop terminates and records every item
    /// exactly once on every cell of the loop.
    #[test]
    fn move_loop_terminates(
        ox in -20..20i32,
        oy in -20..20i32,
        start in 0..4usize,
        items in item_names(),
    ) {
        let mut map = WorldMap::new();
        let origin = Position::new(ox as f64 * 0.5 + 0.25, oy as f64 * 0.5 + 0.25);
        let cells = move_loop(&mut map, origin);
        for item in &items {
            map.get_or_create_logistic_cell(cells[start]).add_output(item);
        }

        populate_reverse_logistics(&mut map);
        populate_transit_logistics(&mut map, false);

        for pos in cells {
            let cell = map.logistic_cell(pos).unwrap();
            let transits: Vec<&String> = cell.transits().iter().collect();
            let expected: Vec<&String> = {
                let mut sorted: Vec<&String> = items.iter().collect();
                sorted.sort();
                sorted
            };
            prop_assert_eq!(transits, expected);
            prop_assert_eq!(cell.moved_from().len(), 1);
        }
        prop_assert_eq!(map.logistic_cells().count(), 4);
    }

    /// A second flood over an already flooded grid records nothing new.
    #[test]
    fn transit_is_recorded_once_per_item(items in item_names(), start in 0..4usize) {
        let mut map = WorldMap::new();
        let cells = move_loop(&mut map, Position::new(0.25, 0.25));
        for item in &items {
            map.get_or_create_logistic_cell(cells[start]).add_output(item);
        }
        populate_transit_logistics(&mut map, false);
        for pos in cells {
            let cell = map.logistic_cell_mut(pos).unwrap();
            for item in &items {
                prop_assert!(!cell.add_transit(item));
            }
        }
    }
}

// ===========================================================================
// Warp blocking
// ===========================================================================

/// Source at (0.25, 0.25) warping to a target at (2.25, 0.25).
fn warp_pair(source_moves: bool, target_moves: bool) -> (WorldMap, Position, Position) {
    let mut map = WorldMap::new();
    let a = Position::new(0.25, 0.25);
    let b = Position::new(2.25, 0.25);
    let source = map.get_or_create_logistic_cell(a);
    source.add_output("iron-plate");
    source.add_warp(b);
    if source_moves {
        source.set_movement(Direction::North);
    }
    let target = map.get_or_create_logistic_cell(b);
    if target_moves {
        target.set_movement(Direction::East);
    }
    (map, a, b)
}

#[test]
fn warp_propagates_by_default() {
    let (mut map, _, b) = warp_pair(true, true);
    populate_transit_logistics(&mut map, false);
    assert!(map.logistic_cell(b).unwrap().transits().contains("iron-plate"));
}

#[test]
fn source_block_warp_from_if_move_stops_warp_into_moving_target() {
    let (mut map, a, b) = warp_pair(false, true);
    map.logistic_cell_mut(a).unwrap().set_block_warp_from_if_move(true);
    populate_transit_logistics(&mut map, false);
    assert!(map.logistic_cell(b).unwrap().transits().is_empty());
}

#[test]
fn target_block_warp_to_if_move_stops_warp_from_moving_source() {
    let (mut map, a, b) = warp_pair(true, false);
    map.logistic_cell_mut(b).unwrap().set_block_warp_to_if_move(true);
    populate_transit_logistics(&mut map, false);
    assert!(map.logistic_cell(a).unwrap().transits().contains("iron-plate"));
    assert!(map.logistic_cell(b).unwrap().transits().is_empty());
}

#[test]
fn warp_block_flags_need_a_move_on_the_other_side() {
    let (mut map, a, b) = warp_pair(false, false);
    map.logistic_cell_mut(a).unwrap().set_block_warp_from_if_move(true);
    map.logistic_cell_mut(b).unwrap().set_block_warp_to_if_move(true);
    populate_transit_logistics(&mut map, false);
    assert!(map.logistic_cell(b).unwrap().transits().contains("iron-plate"));
}
