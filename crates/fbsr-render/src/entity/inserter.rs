//! Inserters carry items from the cell behind them to the cell in front.

use fbsr_core::geometry::Position;
use fbsr_core::world::WorldMap;

use super::direction_key;
use crate::error::RenderError;
use crate::factory::{EntityContext, EntityRendererFactory};
use crate::renderer::{Layer, Renderer};

/// Pickup offset for a north-facing inserter without prototype data.
pub const DEFAULT_PICKUP: Position = Position { x: 0.0, y: -1.0 };
/// Drop offset for a north-facing inserter without prototype data.
pub const DEFAULT_INSERT: Position = Position { x: 0.0, y: 1.2 };

fn add(a: Position, b: Position) -> Position {
    Position::new(a.x + b.x, a.y + b.y)
}

/// World positions an inserter picks up from and drops into.
pub fn hand_positions(ctx: &EntityContext<'_>) -> (Position, Position) {
    let dir = ctx.entity.direction;
    let pickup = ctx.prototype.pickup_position.unwrap_or(DEFAULT_PICKUP);
    let insert = ctx.prototype.insert_position.unwrap_or(DEFAULT_INSERT);
    (
        add(ctx.position(), dir.rotate_vector(pickup)),
        add(ctx.position(), dir.rotate_vector(insert)),
    )
}

#[derive(Debug, Default)]
pub struct InserterFactory;

impl EntityRendererFactory for InserterFactory {
    fn populate_logistics(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        let (pickup, insert) = hand_positions(ctx);
        map.get_or_create_logistic_cell(insert);
        map.get_or_create_logistic_cell(pickup).add_warp(insert);
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
