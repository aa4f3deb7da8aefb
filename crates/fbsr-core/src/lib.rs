//! FBSR Core -- the spatial model behind blueprint rendering.
//!
//! This crate turns a decoded blueprint into a sparse world model and derives
//! static connectivity from it. Nothing here draws; the renderer crate reads
//! the finished model.
//!
//! # Population and propagation
//!
//! A render runs these steps over one [`world::WorldMap`]:
//!
//! 1. **Populate** -- every placed entity contributes rail nodes and edges,
//!    logistics cells, pipe connections and belt facings.
//! 2. **Signal blocks** -- [`rail::propagate_signal_blocks`] flags the edges
//!    behind each signal up to the next signal.
//! 3. **Station I/O** -- [`rail::propagate_station_io`] tags edges leaving
//!    and approaching train stops.
//! 4. **Logistics** -- [`flow::populate_reverse_logistics`] links cells to
//!    their predecessors, then [`flow::populate_transit_logistics`] floods
//!    items from sources.
//!
//! After step 1 only edge and cell flags change; structure is fixed.
//!
//! # Key Types
//!
//! - [`blueprint::BlueprintCollection`] -- parsed blueprint or flattened book.
//! - [`world::WorldMap`] -- rail graph arena, logistics grid, pipe occupancy.
//! - [`rail::RailEdge`] -- one direction of a track segment, with flags.
//! - [`logistics::LogisticGridCell`] -- half-tile flow cell.
//! - [`diagnostics::Reporting`] -- severity-tagged diagnostics sink.

pub mod blueprint;
pub mod diagnostics;
pub mod flow;
pub mod geometry;
pub mod id;
pub mod logistics;
pub mod rail;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
