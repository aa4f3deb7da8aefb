//! Storage tanks: fixed pipe connection tiles and a two-frame picture.

use fbsr_core::geometry::Position;
use fbsr_core::world::WorldMap;

use crate::error::RenderError;
use crate::factory::{EntityContext, EntityRendererFactory};
use crate::renderer::{Layer, Renderer, SpriteRenderer};

/// Tank tiles that connect to pipes, for north/south and east/west facings.
const PIPE_POINTS: [[(f64, f64); 2]; 2] = [[(1.0, 1.0), (-1.0, -1.0)], [(1.0, -1.0), (-1.0, 1.0)]];

#[derive(Debug, Default)]
pub struct StorageTankFactory;

impl StorageTankFactory {
    pub fn pipe_points(pos: Position, parity: usize) -> [Position; 2] {
        PIPE_POINTS[parity % 2].map(|(dx, dy)| pos.shifted(dx, dy))
    }
}

impl EntityRendererFactory for StorageTankFactory {
    fn populate_world_map(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        for point in Self::pipe_points(ctx.position(), ctx.entity.direction.cardinal()) {
            map.set_pipe(point);
        }
        Ok(())
    }

    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        _map: &WorldMap,
        ctx: &EntityContext<'_>,
    ) -> Result<(), RenderError> {
        let parity = (ctx.entity.direction.cardinal() % 2) as u32;
        let mut sprites = ctx.sprites("picture");
        if sprites.is_empty() {
            out.push(ctx.sprite_or_box(Layer::Entity, &[]));
            return Ok(());
        }
        // Frames sit side by side; the second is the east/west picture.
        for sprite in &mut sprites {
            let [x, y, w, h] = sprite.source_rect();
            sprite.region = Some([x + w * parity, y, w, h]);
        }
        out.push(Box::new(SpriteRenderer::new(
            Layer::Entity,
            &ctx.entity.name,
            ctx.position(),
            sprites,
        )));
        Ok(())
    }
}
