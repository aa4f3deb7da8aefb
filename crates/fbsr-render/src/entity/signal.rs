//! Rail and chain signals mark the node beside them.

use fbsr_core::rail::add_rail_signal;
use fbsr_core::world::WorldMap;

use super::direction_key;
use crate::error::RenderError;
use crate::factory::{EntityContext, EntityRendererFactory};
use crate::renderer::{Layer, Renderer};

#[derive(Debug, Default)]
pub struct RailSignalFactory;

impl EntityRendererFactory for RailSignalFactory {
    fn populate_world_map(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        add_rail_signal(map, ctx.position(), ctx.entity.direction);
        Ok(())
    }

    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        _map: &WorldMap,
        ctx: &EntityContext<'_>,
    ) -> Result<(), RenderError> {
        out.push(ctx.sprite_or_box(Layer::Entity, &[direction_key(ctx.entity.direction), "base"]));
        Ok(())
    }
}
