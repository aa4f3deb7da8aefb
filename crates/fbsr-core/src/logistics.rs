//! Half-tile logistics cells.
//!
//! Factories declare movement, warps, sources and sinks on cells; the flow
//! propagator in [`crate::flow`] fills in transits and the reverse links.

use std::collections::BTreeSet;

use crate::geometry::{Direction, DirectionSet, Position};

/// State of one half-tile logistics cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogisticGridCell {
    movement: Option<Direction>,
    /// When present, the movement directions this cell accepts entry from.
    accept_filter: Option<DirectionSet>,
    warps: Vec<Position>,
    transits: BTreeSet<String>,
    outputs: Option<BTreeSet<String>>,
    inputs: Option<BTreeSet<String>>,
    banned_outputs: BTreeSet<String>,
    block_transit: bool,
    block_warp_from_if_move: bool,
    block_warp_to_if_move: bool,
    moved_from: DirectionSet,
    warped_from: Vec<Position>,
}

impl LogisticGridCell {
    pub fn movement(&self) -> Option<Direction> {
        self.movement
    }

    pub fn set_movement(&mut self, dir: Direction) {
        self.movement = Some(dir);
    }

    pub fn set_accept_filter(&mut self, filter: DirectionSet) {
        self.accept_filter = Some(filter);
    }

    /// Whether an item moving in direction `travel` may enter this cell.
    ///
    /// Without a filter, a moving cell accepts anything except traffic
    /// heading straight against its own movement.
    pub fn accept_move_from(&self, travel: Direction) -> bool {
        match (self.accept_filter, self.movement) {
            (Some(filter), _) => filter.contains(travel),
            (None, Some(movement)) => movement != travel.opposite(),
            (None, None) => false,
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.movement.is_some() || self.accept_filter.is_some()
    }

    pub fn warps(&self) -> &[Position] {
        &self.warps
    }

    pub fn add_warp(&mut self, target: Position) {
        self.warps.push(target);
    }

    pub fn transits(&self) -> &BTreeSet<String> {
        &self.transits
    }

    /// Record `item` as having passed through. Returns false if it already had.
    pub fn add_transit(&mut self, item: &str) -> bool {
        if self.transits.contains(item) {
            return false;
        }
        self.transits.insert(item.to_string());
        true
    }

    pub fn outputs(&self) -> Option<&BTreeSet<String>> {
        self.outputs.as_ref()
    }

    pub fn add_output(&mut self, item: &str) {
        self.outputs.get_or_insert_with(BTreeSet::new).insert(item.to_string());
    }

    pub fn inputs(&self) -> Option<&BTreeSet<String>> {
        self.inputs.as_ref()
    }

    pub fn add_input(&mut self, item: &str) {
        self.inputs.get_or_insert_with(BTreeSet::new).insert(item.to_string());
    }

    pub fn is_transit_start(&self) -> bool {
        self.outputs.as_ref().is_some_and(|o| !o.is_empty())
    }

    pub fn is_transit_end(&self) -> bool {
        self.inputs.as_ref().is_some_and(|i| !i.is_empty())
    }

    pub fn add_banned_output(&mut self, item: &str) {
        self.banned_outputs.insert(item.to_string());
    }

    pub fn is_banned_output(&self, item: &str) -> bool {
        self.banned_outputs.contains(item)
    }

    pub fn is_block_transit(&self) -> bool {
        self.block_transit
    }

    pub fn set_block_transit(&mut self, block: bool) {
        self.block_transit = block;
    }

    pub fn is_block_warp_from_if_move(&self) -> bool {
        self.block_warp_from_if_move
    }

    pub fn set_block_warp_from_if_move(&mut self, block: bool) {
        self.block_warp_from_if_move = block;
    }

    pub fn is_block_warp_to_if_move(&self) -> bool {
        self.block_warp_to_if_move
    }

    pub fn set_block_warp_to_if_move(&mut self, block: bool) {
        self.block_warp_to_if_move = block;
    }

    /// Directions (pointing back at the predecessor) of cells moving into this one.
    pub fn moved_from(&self) -> DirectionSet {
        self.moved_from
    }

    pub fn add_moved_from(&mut self, dir: Direction) {
        self.moved_from.insert(dir);
    }

    pub fn warped_from(&self) -> &[Position] {
        &self.warped_from
    }

    pub fn add_warped_from(&mut self, source: Position) {
        self.warped_from.push(source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_cell_rejects_head_on_traffic() {
        let mut cell = LogisticGridCell::default();
        assert!(!cell.accept_move_from(Direction::East));
        cell.set_movement(Direction::East);
        assert!(cell.accept_move_from(Direction::East));
        assert!(cell.accept_move_from(Direction::South));
        assert!(!cell.accept_move_from(Direction::West));
    }

    #[test]
    fn filter_overrides_movement() {
        let mut cell = LogisticGridCell::default();
        cell.set_movement(Direction::East);
        cell.set_accept_filter([Direction::East].into_iter().collect());
        assert!(cell.accept_move_from(Direction::East));
        assert!(!cell.accept_move_from(Direction::South));
    }

    #[test]
    fn transit_is_recorded_once() {
        let mut cell = LogisticGridCell::default();
        assert!(cell.add_transit("iron-plate"));
        assert!(!cell.add_transit("iron-plate"));
        assert!(cell.add_transit("copper-plate"));
        assert_eq!(cell.transits().len(), 2);
    }

    #[test]
    fn start_and_end_need_items() {
        let mut cell = LogisticGridCell::default();
        assert!(!cell.is_transit_start());
        cell.add_output("gear");
        cell.add_input("iron-plate");
        assert!(cell.is_transit_start());
        assert!(cell.is_transit_end());
    }
}
