//! Chests: whatever enters one cell can leave from any other.

use fbsr_core::world::WorldMap;

use super::footprint_cells;
use crate::error::RenderError;
use crate::factory::{EntityContext, EntityRendererFactory};
use crate::renderer::{Layer, Renderer};

#[derive(Debug, Default)]
pub struct ContainerFactory;

impl EntityRendererFactory for ContainerFactory {
    fn populate_logistics(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        let cells = footprint_cells(ctx.bounds());
        for (i, &from) in cells.iter().enumerate() {
            let cell = map.get_or_create_logistic_cell(from);
            for (j, &to) in cells.iter().enumerate() {
                if i != j {
                    cell.add_warp(to);
                }
            }
        }
        Ok(())
    }

    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        _map: &WorldMap,
        ctx: &EntityContext<'_>,
    ) -> Result<(), RenderError> {
        out.push(ctx.sprite_or_box(Layer::Entity, &["base"]));
        Ok(())
    }
}
