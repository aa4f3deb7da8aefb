//! Straight and curved rail pieces.

use fbsr_core::rail::{add_curved_rail, add_straight_rail};
use fbsr_core::world::WorldMap;

use super::direction_key;
use crate::error::RenderError;
use crate::factory::{EntityContext, EntityRendererFactory};
use crate::renderer::{Layer, Renderer};

#[derive(Debug, Default)]
pub struct StraightRailFactory;

impl EntityRendererFactory for StraightRailFactory {
    fn populate_world_map(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        add_straight_rail(map, ctx.position(), ctx.entity.direction);
        Ok(())
    }

    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        _map: &WorldMap,
        ctx: &EntityContext<'_>,
    ) -> Result<(), RenderError> {
        out.push(ctx.sprite_or_box(Layer::Rail, &[direction_key(ctx.entity.direction)]));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CurvedRailFactory;

impl EntityRendererFactory for CurvedRailFactory {
    fn populate_world_map(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        add_curved_rail(map, ctx.position(), ctx.entity.direction);
        Ok(())
    }

    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        _map: &WorldMap,
        ctx: &EntityContext<'_>,
    ) -> Result<(), RenderError> {
        out.push(ctx.sprite_or_box(Layer::Rail, &[direction_key(ctx.entity.direction)]));
        Ok(())
    }
}
