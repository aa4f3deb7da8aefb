//! Rail graph: nodes, directed edges, the topology builder, and the two
//! rail propagators (signal blocks and station approach/departure).
//!
//! Edge convention: `start_dir` is the direction of travel leaving the start
//! node. `end_dir` is the side of the end node the edge arrives on, i.e. it
//! points back along the track. A train continuing through the end node
//! leaves it in `end_dir.opposite()`.

use std::collections::VecDeque;

use crate::geometry::{Direction, DirectionSet, GridKey, Position};
use crate::id::RailEdgeId;
use crate::world::WorldMap;

// ---------------------------------------------------------------------------
// Nodes and edges
// ---------------------------------------------------------------------------

/// A joint in the rail graph, addressed on the half-tile lattice.
#[derive(Debug, Clone, Default)]
pub struct RailNode {
    signals: DirectionSet,
    station: Option<Direction>,
    /// Keyed by the direction of travel leaving this node.
    outgoing: [Vec<RailEdgeId>; 8],
    /// Keyed by the side of this node the edge arrives on.
    incoming: [Vec<RailEdgeId>; 8],
}

impl RailNode {
    pub fn signals(&self) -> DirectionSet {
        self.signals
    }

    pub fn has_signals(&self) -> bool {
        !self.signals.is_empty()
    }

    pub fn add_signal(&mut self, dir: Direction) {
        self.signals.insert(dir);
    }

    pub fn station(&self) -> Option<Direction> {
        self.station
    }

    pub fn set_station(&mut self, dir: Direction) {
        self.station = Some(dir);
    }

    pub fn outgoing(&self, dir: Direction) -> &[RailEdgeId] {
        &self.outgoing[dir.index()]
    }

    pub fn incoming(&self, dir: Direction) -> &[RailEdgeId] {
        &self.incoming[dir.index()]
    }

    pub(crate) fn add_outgoing(&mut self, dir: Direction, edge: RailEdgeId) {
        self.outgoing[dir.index()].push(edge);
    }

    pub(crate) fn add_incoming(&mut self, dir: Direction, edge: RailEdgeId) {
        self.incoming[dir.index()].push(edge);
    }

    pub fn outgoing_count(&self) -> usize {
        self.outgoing.iter().map(Vec::len).sum()
    }

    pub fn incoming_count(&self) -> usize {
        self.incoming.iter().map(Vec::len).sum()
    }
}

/// One direction of travel along a track segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RailEdge {
    pub start_pos: Position,
    pub start_dir: Direction,
    pub end_pos: Position,
    pub end_dir: Direction,
    pub curved: bool,
    blocked: bool,
    input: bool,
    output: bool,
}

impl RailEdge {
    pub fn new(
        start_pos: Position,
        start_dir: Direction,
        end_pos: Position,
        end_dir: Direction,
        curved: bool,
    ) -> Self {
        Self {
            start_pos,
            start_dir,
            end_pos,
            end_dir,
            curved,
            blocked: false,
            input: false,
            output: false,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn is_input(&self) -> bool {
        self.input
    }

    pub fn is_output(&self) -> bool {
        self.output
    }
}

// ---------------------------------------------------------------------------
// Topology builder
// ---------------------------------------------------------------------------

/// Register a straight rail piece.
///
/// Cardinal pieces span two tiles along their axis. Diagonal pieces are the
/// half-length corner segments, joining the two cardinal neighbours either
/// side of the facing.
pub fn add_straight_rail(map: &mut WorldMap, pos: Position, dir: Direction) {
    let (a, b, travel) = if dir.is_cardinal() {
        if matches!(dir, Direction::North | Direction::South) {
            (pos.shifted(0.0, -1.0), pos.shifted(0.0, 1.0), Direction::South)
        } else {
            (pos.shifted(-1.0, 0.0), pos.shifted(1.0, 0.0), Direction::East)
        }
    } else {
        (dir.turn(-1).offset(pos, 1.0), dir.turn(1).offset(pos, 1.0), dir.right())
    };
    map.add_rail_edge_pair(a, travel, b, travel.opposite(), false);
}

/// Register a curved rail piece.
///
/// The north curve runs from its cardinal end at `(+1, +4)` heading north to
/// its diagonal end at `(-2, -3)`, arriving heading north-west. The
/// north-east curve is its mirror image. Other facings are quarter turns of
/// those two.
pub fn add_curved_rail(map: &mut WorldMap, pos: Position, dir: Direction) {
    let mirrored = !dir.is_cardinal();
    let sign = if mirrored { -1.0 } else { 1.0 };
    let arrival = if mirrored {
        Direction::NorthEast
    } else {
        Direction::NorthWest
    };
    let rotation = Direction::from_index(dir.cardinal() * 2);

    let start_offset = rotation.rotate_vector(Position::new(sign, 4.0));
    let end_offset = rotation.rotate_vector(Position::new(-2.0 * sign, -3.0));
    let start_travel = Direction::North.turn(rotation.index() as i32);
    let end_travel = arrival.turn(rotation.index() as i32);

    map.add_rail_edge_pair(
        pos.shifted(start_offset.x, start_offset.y),
        start_travel,
        pos.shifted(end_offset.x, end_offset.y),
        end_travel.opposite(),
        true,
    );
}

/// Node a signal facing `dir` attaches to. Signals stand beside the track,
/// half a tile back and a tile and a half to the right.
pub fn signal_node_position(pos: Position, dir: Direction) -> Position {
    dir.right().offset(dir.opposite().offset(pos, 0.5), 1.5)
}

pub fn add_rail_signal(map: &mut WorldMap, pos: Position, dir: Direction) {
    map.get_or_create_rail_node(signal_node_position(pos, dir))
        .add_signal(dir);
}

/// Node a train stop facing `dir` attaches to: two tiles to its left.
pub fn station_node_position(pos: Position, dir: Direction) -> Position {
    dir.left().offset(pos, 2.0)
}

pub fn add_train_stop(map: &mut WorldMap, pos: Position, dir: Direction) {
    map.get_or_create_rail_node(station_node_position(pos, dir))
        .set_station(dir);
}

// ---------------------------------------------------------------------------
// Signal block propagation
// ---------------------------------------------------------------------------

/// Flag every edge that lies in the block behind a signal.
///
/// A node holding both a signal and its opposite is a boundary on both sides
/// and seeds nothing. Traversal stops at the next node with any signal, and
/// only continues through a junction once every parallel edge into it is
/// blocked.
pub fn propagate_signal_blocks(map: &mut WorldMap) {
    let (nodes, edges) = map.rail_parts_mut();

    for node in nodes.values() {
        for signal in node.signals().iter() {
            let blocking = signal.opposite();
            if node.signals().contains(blocking) {
                continue;
            }

            let mut work: VecDeque<RailEdgeId> = node.outgoing(blocking).iter().copied().collect();
            while let Some(id) = work.pop_front() {
                let Some(edge) = edges.get_mut(id) else {
                    continue;
                };
                if edge.blocked {
                    continue;
                }
                edge.blocked = true;
                let (end_pos, end_dir) = (edge.end_pos, edge.end_dir);
                let Some(next) = nodes.get(&GridKey::rail(end_pos)) else {
                    continue;
                };
                if next.has_signals() {
                    continue;
                }
                let converged = next
                    .incoming(end_dir)
                    .iter()
                    .all(|e| edges.get(*e).is_some_and(|e| e.blocked));
                if converged {
                    work.extend(next.outgoing(end_dir.opposite()).iter().copied());
                }
            }

            let mut work: VecDeque<RailEdgeId> =
                node.incoming(blocking.opposite()).iter().copied().collect();
            while let Some(id) = work.pop_front() {
                let Some(edge) = edges.get_mut(id) else {
                    continue;
                };
                if edge.blocked {
                    continue;
                }
                edge.blocked = true;
                let (start_pos, start_dir) = (edge.start_pos, edge.start_dir);
                let Some(prev) = nodes.get(&GridKey::rail(start_pos)) else {
                    continue;
                };
                if prev.has_signals() {
                    continue;
                }
                let converged = prev
                    .outgoing(start_dir)
                    .iter()
                    .all(|e| edges.get(*e).is_some_and(|e| e.blocked));
                if converged {
                    work.extend(prev.incoming(start_dir.opposite()).iter().copied());
                }
            }
        }
    }

    log::debug!(
        "signal blocks: {} of {} edges blocked",
        edges.values().filter(|e| e.blocked).count(),
        edges.len()
    );
}

// ---------------------------------------------------------------------------
// Station approach / departure propagation
// ---------------------------------------------------------------------------

/// Tag edges leaving stations as outputs and edges approaching them as
/// inputs. Blocked edges are never tagged; other stations do not stop the
/// walk.
pub fn propagate_station_io(map: &mut WorldMap) {
    let (nodes, edges) = map.rail_parts_mut();

    for node in nodes.values() {
        let Some(station) = node.station() else {
            continue;
        };

        let mut work: VecDeque<RailEdgeId> = node
            .outgoing(station)
            .iter()
            .chain(node.outgoing(station.opposite()))
            .copied()
            .collect();
        while let Some(id) = work.pop_front() {
            let Some(edge) = edges.get_mut(id) else {
                continue;
            };
            if edge.blocked || edge.output {
                continue;
            }
            edge.output = true;
            let (end_pos, end_dir) = (edge.end_pos, edge.end_dir);
            let Some(next) = nodes.get(&GridKey::rail(end_pos)) else {
                continue;
            };
            let converged = next
                .incoming(end_dir)
                .iter()
                .all(|e| edges.get(*e).is_some_and(|e| e.output));
            if converged {
                work.extend(next.outgoing(end_dir.opposite()).iter().copied());
            }
        }

        let mut work: VecDeque<RailEdgeId> =
            node.incoming(station.opposite()).iter().copied().collect();
        while let Some(id) = work.pop_front() {
            let Some(edge) = edges.get_mut(id) else {
                continue;
            };
            if edge.blocked || edge.input {
                continue;
            }
            edge.input = true;
            let (start_pos, start_dir) = (edge.start_pos, edge.start_dir);
            let Some(prev) = nodes.get(&GridKey::rail(start_pos)) else {
                continue;
            };
            let converged = prev
                .outgoing(start_dir)
                .iter()
                .all(|e| edges.get(*e).is_some_and(|e| e.input));
            if converged {
                work.extend(prev.incoming(start_dir.opposite()).iter().copied());
            }
        }
    }
}
