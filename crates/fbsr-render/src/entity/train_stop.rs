//! Train stops tag the rail node to their left as a station.

use fbsr_core::geometry::{Bounds, Position};
use fbsr_core::rail::add_train_stop;
use fbsr_core::world::WorldMap;
use image::Rgba;

use super::direction_key;
use crate::error::RenderError;
use crate::factory::{EntityContext, EntityRendererFactory};
use crate::renderer::{Layer, Renderer, draw_fn};

const LABEL_COLOR: Rgba<u8> = Rgba([230, 230, 230, 255]);

#[derive(Debug, Default)]
pub struct TrainStopFactory;

impl EntityRendererFactory for TrainStopFactory {
    fn populate_world_map(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        add_train_stop(map, ctx.position(), ctx.entity.direction);
        Ok(())
    }

    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        _map: &WorldMap,
        ctx: &EntityContext<'_>,
    ) -> Result<(), RenderError> {
        out.push(ctx.sprite_or_box(Layer::Entity, &[direction_key(ctx.entity.direction), "base"]));

        // Station name above the stop.
        if let Some(name) = ctx.entity.str_field("station") {
            let pos = ctx.position();
            let label = name.to_string();
            let bounds = Bounds::new(pos.x - 1.0, pos.y - 1.6, 2.0, 0.5);
            out.push(draw_fn(Layer::EntityInfoIcon, bounds, move |canvas| {
                canvas.text(Position::new(bounds.min_x(), bounds.max_y()), 0.5, &label, LABEL_COLOR);
                Ok(())
            }));
        }
        Ok(())
    }
}
