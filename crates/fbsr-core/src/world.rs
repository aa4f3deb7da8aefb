//! The world map: sparse, coordinate-addressed spatial model of a blueprint.
//!
//! Owns four tables:
//! - rail nodes keyed on the half-tile lattice, plus an arena of directed
//!   rail edges and the list of opposing edge pairs
//! - the half-tile logistics grid
//! - whole-tile pipe occupancy with the sides each pipe connects on
//! - belt facings used to pair underground belts
//!
//! The map is populated by a single pass over placed objects, then only the
//! flag fields of rail edges and logistics cells change (during
//! propagation). Node and edge structure is never mutated afterwards.

use std::collections::BTreeMap;

use slotmap::SlotMap;

use crate::geometry::{Direction, DirectionSet, GridKey, Position};
use crate::id::{EntityNumber, RailEdgeId};
use crate::logistics::LogisticGridCell;
use crate::rail::{RailEdge, RailNode};

/// What kind of belt piece occupies a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeltKind {
    Belt,
    UndergroundInput,
    UndergroundOutput,
}

/// A belt piece registered on the world map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeltFacing {
    pub name: String,
    pub facing: Direction,
    pub kind: BeltKind,
}

/// Sparse spatial model for one render.
#[derive(Debug, Default)]
pub struct WorldMap {
    rail_nodes: BTreeMap<GridKey, RailNode>,
    rail_edges: SlotMap<RailEdgeId, RailEdge>,
    rail_pairs: Vec<(RailEdgeId, RailEdgeId)>,
    logistic_grid: BTreeMap<GridKey, LogisticGridCell>,
    pipes: BTreeMap<GridKey, DirectionSet>,
    belts: BTreeMap<GridKey, BeltFacing>,
    wire_anchors: BTreeMap<EntityNumber, Position>,
    new_format: bool,
}

impl WorldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_new_format(&self) -> bool {
        self.new_format
    }

    pub fn set_new_format(&mut self, new_format: bool) {
        self.new_format = new_format;
    }

    // -- Rail graph --

    pub fn rail_node(&self, pos: Position) -> Option<&RailNode> {
        self.rail_nodes.get(&GridKey::rail(pos))
    }

    pub fn get_or_create_rail_node(&mut self, pos: Position) -> &mut RailNode {
        self.rail_nodes.entry(GridKey::rail(pos)).or_default()
    }

    /// All rail nodes with their world positions, in key order.
    pub fn rail_nodes(&self) -> impl Iterator<Item = (Position, &RailNode)> {
        self.rail_nodes.iter().map(|(k, n)| (k.rail_position(), n))
    }

    pub fn rail_edge(&self, id: RailEdgeId) -> Option<&RailEdge> {
        self.rail_edges.get(id)
    }

    /// Opposing directed edge pairs, one entry per track segment.
    pub fn rail_edge_pairs(&self) -> impl Iterator<Item = (&RailEdge, &RailEdge)> {
        self.rail_pairs
            .iter()
            .filter_map(|(a, b)| Some((self.rail_edges.get(*a)?, self.rail_edges.get(*b)?)))
    }

    pub fn rail_pair_ids(&self) -> &[(RailEdgeId, RailEdgeId)] {
        &self.rail_pairs
    }

    /// Add a track segment as two opposing directed edges and join both to
    /// the nodes at their ends, creating nodes as needed.
    ///
    /// `start_dir` is the direction of travel leaving `start`; `end_dir` is
    /// the side of `end` the segment arrives on (pointing back along it).
    pub fn add_rail_edge_pair(
        &mut self,
        start: Position,
        start_dir: Direction,
        end: Position,
        end_dir: Direction,
        curved: bool,
    ) -> (RailEdgeId, RailEdgeId) {
        let forward = self
            .rail_edges
            .insert(RailEdge::new(start, start_dir, end, end_dir, curved));
        let backward = self
            .rail_edges
            .insert(RailEdge::new(end, end_dir, start, start_dir, curved));
        self.link_edge(forward);
        self.link_edge(backward);
        self.rail_pairs.push((forward, backward));
        (forward, backward)
    }

    fn link_edge(&mut self, id: RailEdgeId) {
        let Some(edge) = self.rail_edges.get(id) else {
            return;
        };
        let (start, start_dir, end, end_dir) = (edge.start_pos, edge.start_dir, edge.end_pos, edge.end_dir);
        self.get_or_create_rail_node(start).add_outgoing(start_dir, id);
        self.get_or_create_rail_node(end).add_incoming(end_dir, id);
    }

    /// Split borrow used by the propagators: node table read-only, edge
    /// arena mutable.
    pub(crate) fn rail_parts_mut(
        &mut self,
    ) -> (&BTreeMap<GridKey, RailNode>, &mut SlotMap<RailEdgeId, RailEdge>) {
        (&self.rail_nodes, &mut self.rail_edges)
    }

    // -- Logistics grid --

    pub fn logistic_cell(&self, pos: Position) -> Option<&LogisticGridCell> {
        self.logistic_grid.get(&GridKey::half_tile(pos))
    }

    pub fn logistic_cell_mut(&mut self, pos: Position) -> Option<&mut LogisticGridCell> {
        self.logistic_grid.get_mut(&GridKey::half_tile(pos))
    }

    pub fn get_or_create_logistic_cell(&mut self, pos: Position) -> &mut LogisticGridCell {
        self.logistic_grid.entry(GridKey::half_tile(pos)).or_default()
    }

    /// All cells with their center positions, in key order.
    pub fn logistic_cells(&self) -> impl Iterator<Item = (Position, &LogisticGridCell)> {
        self.logistic_grid.iter().map(|(k, c)| (k.cell_center(), c))
    }

    pub(crate) fn logistic_grid_mut(&mut self) -> &mut BTreeMap<GridKey, LogisticGridCell> {
        &mut self.logistic_grid
    }

    // -- Pipes --

    /// Mark a pipe connecting on all four sides.
    pub fn set_pipe(&mut self, pos: Position) {
        self.pipes.insert(GridKey::tile(pos), DirectionSet::all_cardinals());
    }

    /// Mark a pipe connection point that only connects on the given sides.
    pub fn set_pipe_facing(&mut self, pos: Position, sides: DirectionSet) {
        let entry = self.pipes.entry(GridKey::tile(pos)).or_default();
        for side in sides.iter() {
            entry.insert(side);
        }
    }

    /// Whether a pipe at `pos` connects toward `facing`.
    pub fn is_pipe(&self, pos: Position, facing: Direction) -> bool {
        self.pipes
            .get(&GridKey::tile(pos))
            .is_some_and(|sides| sides.contains(facing))
    }

    // -- Belts --

    pub fn set_belt(&mut self, pos: Position, belt: BeltFacing) {
        self.belts.insert(GridKey::tile(pos), belt);
    }

    pub fn belt(&self, pos: Position) -> Option<&BeltFacing> {
        self.belts.get(&GridKey::tile(pos))
    }

    // -- Wire anchors --

    pub fn set_wire_anchor(&mut self, entity: EntityNumber, pos: Position) {
        self.wire_anchors.insert(entity, pos);
    }

    pub fn wire_anchor(&self, entity: EntityNumber) -> Option<Position> {
        self.wire_anchors.get(&entity).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_pair_is_linked_both_ways() {
        let mut map = WorldMap::new();
        let a = Position::new(1.0, 0.0);
        let b = Position::new(1.0, 2.0);
        let (fwd, back) = map.add_rail_edge_pair(a, Direction::South, b, Direction::North, false);

        let node_a = map.rail_node(a).unwrap();
        let node_b = map.rail_node(b).unwrap();
        assert_eq!(node_a.outgoing(Direction::South), &[fwd]);
        assert_eq!(node_b.incoming(Direction::North), &[fwd]);
        assert_eq!(node_b.outgoing(Direction::North), &[back]);
        assert_eq!(node_a.incoming(Direction::South), &[back]);
        assert_eq!(map.rail_edge_pairs().count(), 1);
    }

    #[test]
    fn every_edge_is_listed_at_its_end_node() {
        let mut map = WorldMap::new();
        map.add_rail_edge_pair(
            Position::new(0.0, 0.0),
            Direction::East,
            Position::new(2.0, 0.0),
            Direction::West,
            false,
        );
        map.add_rail_edge_pair(
            Position::new(2.0, 0.0),
            Direction::East,
            Position::new(4.0, 0.0),
            Direction::West,
            false,
        );
        for &(a, b) in map.rail_pair_ids() {
            for id in [a, b] {
                let edge = map.rail_edge(id).unwrap();
                let end = map.rail_node(edge.end_pos).unwrap();
                assert!(end.incoming(edge.end_dir).contains(&id));
                let start = map.rail_node(edge.start_pos).unwrap();
                assert!(start.outgoing(edge.start_dir).contains(&id));
            }
        }
        assert_eq!(map.rail_nodes().count(), 3);
    }

    #[test]
    fn pipe_sides() {
        let mut map = WorldMap::new();
        map.set_pipe(Position::new(0.5, 0.5));
        map.set_pipe_facing(Position::new(3.5, 0.5), [Direction::West].into_iter().collect());
        assert!(map.is_pipe(Position::new(0.5, 0.5), Direction::East));
        assert!(map.is_pipe(Position::new(3.5, 0.5), Direction::West));
        assert!(!map.is_pipe(Position::new(3.5, 0.5), Direction::East));
        assert!(!map.is_pipe(Position::new(1.5, 0.5), Direction::West));
    }

    #[test]
    fn logistic_cells_are_half_tile() {
        let mut map = WorldMap::new();
        map.get_or_create_logistic_cell(Position::new(0.25, 0.75));
        assert!(map.logistic_cell(Position::new(0.4, 0.6)).is_some());
        assert!(map.logistic_cell(Position::new(0.6, 0.6)).is_none());
        let (center, _) = map.logistic_cells().next().unwrap();
        assert_eq!(center, Position::new(0.25, 0.75));
    }
}
