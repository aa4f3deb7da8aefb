//! Rail networks built from placed entities: straight pieces become edge
//! pairs, signals split blocks and train stops tag approach and departure.

mod common;

use common::{plain, scene, vanilla};
use fbsr_core::blueprint::Blueprint;
use fbsr_core::diagnostics::{Level, Reporting};
use fbsr_core::geometry::{Direction, Position};
use fbsr_core::rail::RailEdge;
use fbsr_core::test_utils::{all_edges, blueprint, entity, track_node};
use fbsr_core::world::WorldMap;
use fbsr_render::{FactoryRegistry, RenderOptions, render_blueprint};

fn edge_between(map: &WorldMap, from: f64, to: f64) -> &RailEdge {
    all_edges(map)
        .into_iter()
        .map(|(_, e)| e)
        .find(|e| e.start_pos == Position::new(1.0, from) && e.end_pos == Position::new(1.0, to))
        .unwrap()
}

/// Four north-south pieces with nodes at y = 0, 2, 4, 6, 8 and a train
/// stop whose node is y = 4.
fn station_line() -> Blueprint {
    let mut entities: Vec<_> = (0..4)
        .map(|i| entity(i + 1, "straight-rail", 1.0, 1.0 + 2.0 * i as f64, Direction::North))
        .collect();
    entities.push(entity(10, "train-stop", 3.0, 4.0, Direction::North));
    blueprint("station", entities, Vec::new())
}

#[test]
fn straight_pieces_share_nodes() {
    let data = vanilla();
    let (scene, reporting) = scene(&station_line(), &data, &plain());
    assert_eq!(reporting.level(), Level::Info);

    let map = &scene.map;
    assert_eq!(map.rail_edge_pairs().count(), 4);
    for i in 0..5 {
        assert!(map.rail_node(track_node(i)).is_some(), "node {i}");
    }
    assert_eq!(map.rail_node(track_node(2)).unwrap().station(), Some(Direction::North));
}

#[test]
fn train_stop_tags_departure_and_approach() {
    let data = vanilla();
    let (scene, _) = scene(&station_line(), &data, &plain());
    let map = &scene.map;

    assert!(edge_between(map, 4.0, 2.0).is_output());
    assert!(edge_between(map, 2.0, 0.0).is_output());
    assert!(edge_between(map, 4.0, 6.0).is_output());
    assert!(edge_between(map, 6.0, 4.0).is_input());
    assert!(edge_between(map, 8.0, 6.0).is_input());
    assert!(!edge_between(map, 2.0, 4.0).is_input());
    assert!(map.rail_edge_pairs().all(|(a, b)| !a.is_blocked() && !b.is_blocked()));
}

#[test]
fn signal_blocks_the_departure_track() {
    let data = vanilla();
    let mut bp = station_line();
    // signal on the node at y = 2, guarding southbound traffic
    bp.entities.push(entity(11, "rail-signal", 2.5, 2.5, Direction::South));
    let (scene, reporting) = scene(&bp, &data, &plain());
    assert_eq!(reporting.level(), Level::Info);

    let map = &scene.map;
    assert!(map.rail_node(track_node(1)).unwrap().has_signals());
    let departing = edge_between(map, 4.0, 2.0);
    assert!(departing.is_blocked());
    assert!(!departing.is_output());
    // the southbound side of the station is untouched
    assert!(edge_between(map, 4.0, 6.0).is_output());
}

#[test]
fn rail_debug_render_succeeds() {
    let data = vanilla();
    let mut bp = station_line();
    bp.entities.push(entity(11, "rail-signal", 2.5, 2.5, Direction::South));
    let options = RenderOptions {
        debug_rail: true,
        ..plain()
    };
    let mut reporting = Reporting::new();
    let out = render_blueprint(&bp, &data, &FactoryRegistry::standard(), &options, &mut reporting).unwrap();
    assert_eq!(reporting.level(), Level::Info);
    let (w, h) = out.image.dimensions();
    assert!(w >= 5 * 32 && h >= 9 * 32, "{w}x{h}");
}

#[test]
fn rails_disable_the_legacy_shift() {
    let data = vanilla();
    let mut bp = station_line();
    bp.version = fbsr_core::blueprint::MapVersion::new(0, 17, 0, 0);
    let (scene, _) = scene(&bp, &data, &plain());
    assert_eq!(scene.entities[0].position, Position::new(1.0, 1.0));
    assert_eq!(scene.map.rail_edge_pairs().count(), 4);
}
