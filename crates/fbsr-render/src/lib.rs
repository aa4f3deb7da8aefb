//! FBSR Render -- turns a blueprint into an image.
//!
//! This crate drives the spatial model in `fbsr-core` with per-type
//! factories, collects layer-tagged draw operations and composites them,
//! together with informational border panels, into one scaled raster.
//!
//! # Render Pipeline
//!
//! [`pipeline::render_blueprint`] runs these steps:
//!
//! 1. **Resolve** -- map every entity and tile to a factory through the
//!    [`factory::FactoryRegistry`]; unknown names become notes.
//! 2. **Align** -- [`align::align_to_grid`] fixes legacy half-tile offsets.
//! 3. **Populate** -- factories fill the world map, then its logistics grid.
//! 4. **Propagate** -- logistics flow, signal blocks, station I/O.
//! 5. **Draw** -- factories, module icons, wires and overlays emit
//!    [`renderer::Renderer`] operations.
//! 6. **Compose** -- [`compositor::compose`] lays out, scales and paints.
//!
//! A failing factory phase or draw operation is recorded in the caller's
//! [`fbsr_core::diagnostics::Reporting`]; the render carries on.
//!
//! # Key Types
//!
//! - [`options::RenderOptions`] -- render options as sent by callers.
//! - [`factory::EntityRendererFactory`] -- per-type population and drawing.
//! - [`renderer::Layer`] -- paint layer; declaration order is paint order.
//! - [`panel::BorderPanel`] -- header, footer and item-list panels.
//! - [`canvas::Canvas`] -- RGBA raster with a world-to-pixel transform.

pub mod align;
pub mod canvas;
pub mod compositor;
pub mod entity;
pub mod error;
pub mod factory;
pub mod font;
pub mod options;
pub mod overlay;
pub mod panel;
pub mod pipeline;
pub mod renderer;
pub mod totals;

pub use error::RenderError;
pub use factory::FactoryRegistry;
pub use options::RenderOptions;
pub use pipeline::{RenderOutput, Scene, build_scene, render_blueprint};
