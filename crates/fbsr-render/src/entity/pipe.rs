//! Pipes pick one of sixteen pictures from which neighbours connect back.

use fbsr_core::geometry::{Direction, Position};
use fbsr_core::world::WorldMap;

use crate::error::RenderError;
use crate::factory::{EntityContext, EntityRendererFactory};
use crate::renderer::{Layer, Renderer};

/// Picture names indexed by the adjacency bits `WSEN`.
pub const PIPE_PICTURES: [&str; 16] = [
    "straight_horizontal",
    "ending_up",
    "ending_right",
    "corner_up_right",
    "ending_down",
    "straight_vertical",
    "corner_down_right",
    "t_right",
    "ending_left",
    "corner_up_left",
    "straight_horizontal",
    "t_up",
    "corner_down_left",
    "t_left",
    "t_down",
    "cross",
];

/// Adjacency bits for a pipe at `pos`: bit 0 north, 1 east, 2 south, 3 west.
pub fn adjacency(map: &WorldMap, pos: Position) -> usize {
    Direction::cardinals()
        .into_iter()
        .enumerate()
        .filter(|(_, dir)| map.is_pipe(dir.offset(pos, 1.0), dir.opposite()))
        .fold(0, |code, (bit, _)| code | (1 << bit))
}

#[derive(Debug, Default)]
pub struct PipeFactory;

impl EntityRendererFactory for PipeFactory {
    fn populate_world_map(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        map.set_pipe(ctx.position());
        Ok(())
    }

    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        map: &WorldMap,
        ctx: &EntityContext<'_>,
    ) -> Result<(), RenderError> {
        let picture = PIPE_PICTURES[adjacency(map, ctx.position())];
        out.push(ctx.sprite_or_box(Layer::Entity, &[picture]));
        Ok(())
    }
}
