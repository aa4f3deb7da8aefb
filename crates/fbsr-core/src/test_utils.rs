//! Shared test helpers for integration tests and downstream crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use serde_json::{Value, json};

use crate::blueprint::{Blueprint, BlueprintEntity, BlueprintTile, MapVersion, VERSION_NEW_FORMAT};
use crate::geometry::{Direction, Position};
use crate::id::RailEdgeId;
use crate::rail::{self, RailEdge};
use crate::world::WorldMap;

// ===========================================================================
// Blueprint fixtures
// ===========================================================================

/// An entity with no type-specific fields.
pub fn entity(id: u32, name: &str, x: f64, y: f64, dir: Direction) -> BlueprintEntity {
    BlueprintEntity::new(id, name, Position::new(x, y), dir, json!({}))
}

/// An entity carrying raw type-specific JSON (`recipe`, `type`, `items`...).
pub fn entity_with(id: u32, name: &str, x: f64, y: f64, dir: Direction, raw: Value) -> BlueprintEntity {
    BlueprintEntity::new(id, name, Position::new(x, y), dir, raw)
}

pub fn tile(name: &str, x: f64, y: f64) -> BlueprintTile {
    BlueprintTile::new(name, Position::new(x, y))
}

/// A new-format blueprint holding the given entities and tiles.
pub fn blueprint(label: &str, entities: Vec<BlueprintEntity>, tiles: Vec<BlueprintTile>) -> Blueprint {
    Blueprint {
        label: Some(label.to_string()),
        version: VERSION_NEW_FORMAT,
        entities,
        tiles,
        wires: Vec::new(),
    }
}

/// A legacy blueprint at the given version.
pub fn legacy_blueprint(version: MapVersion, entities: Vec<BlueprintEntity>) -> Blueprint {
    Blueprint {
        label: None,
        version,
        entities,
        tiles: Vec::new(),
        wires: Vec::new(),
    }
}

// ===========================================================================
// Rail fixtures
// ===========================================================================

/// Lay `pieces` straight north-south rails on x = 1, centred at y = 1, 3,
/// 5, ..., so nodes sit at y = 0, 2, 4, ....
pub fn vertical_track(map: &mut WorldMap, pieces: usize) {
    for i in 0..pieces {
        rail::add_straight_rail(map, Position::new(1.0, 1.0 + 2.0 * i as f64), Direction::North);
    }
}

/// Position of the node at track index `i` of [`vertical_track`].
pub fn track_node(i: usize) -> Position {
    Position::new(1.0, 2.0 * i as f64)
}

/// Every directed edge in the map.
pub fn all_edges(map: &WorldMap) -> Vec<(RailEdgeId, &RailEdge)> {
    map.rail_pair_ids()
        .iter()
        .flat_map(|&(a, b)| [a, b])
        .filter_map(|id| map.rail_edge(id).map(|e| (id, e)))
        .collect()
}

/// Snapshot of (blocked, input, output) per edge, in insertion order.
pub fn edge_flags(map: &WorldMap) -> Vec<(bool, bool, bool)> {
    all_edges(map)
        .into_iter()
        .map(|(_, e)| (e.is_blocked(), e.is_input(), e.is_output()))
        .collect()
}

// ===========================================================================
// Logistics fixtures
// ===========================================================================

/// Four cells moving clockwise in a 2x2 loop anchored at the half-tile
/// cell containing `origin`. Returns the cell centres.
pub fn move_loop(map: &mut WorldMap, origin: Position) -> [Position; 4] {
    let cells = [
        (Position::new(origin.x, origin.y), Direction::East),
        (Position::new(origin.x + 0.5, origin.y), Direction::South),
        (Position::new(origin.x + 0.5, origin.y + 0.5), Direction::West),
        (Position::new(origin.x, origin.y + 0.5), Direction::North),
    ];
    for (pos, dir) in cells {
        map.get_or_create_logistic_cell(pos).set_movement(dir);
    }
    cells.map(|(pos, _)| pos)
}
