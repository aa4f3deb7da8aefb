//! Transport belts: four cells moving with the belt, bending into a curve
//! when fed from exactly one side and not from behind.

use fbsr_core::geometry::{Direction, Position};
use fbsr_core::world::{BeltFacing, BeltKind, WorldMap};

use super::{TileCells, direction_key};
use crate::error::RenderError;
use crate::factory::{EntityContext, EntityRendererFactory};
use crate::renderer::{Layer, Renderer};

/// Whether the belt piece one tile from `pos` toward `side` pushes items
/// into `pos`.
fn feeds_from(map: &WorldMap, pos: Position, side: Direction) -> bool {
    map.belt(side.offset(pos, 1.0))
        .is_some_and(|b| b.facing == side.opposite() && b.kind != BeltKind::UndergroundInput)
}

/// The side a belt at `pos` facing `dir` curves in from, if it curves.
pub fn belt_curve(map: &WorldMap, pos: Position, dir: Direction) -> Option<Direction> {
    if feeds_from(map, pos, dir.opposite()) {
        return None;
    }
    match (feeds_from(map, pos, dir.left()), feeds_from(map, pos, dir.right())) {
        (true, false) => Some(dir.left()),
        (false, true) => Some(dir.right()),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct TransportBeltFactory;

impl EntityRendererFactory for TransportBeltFactory {
    fn populate_world_map(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        map.set_belt(
            ctx.position(),
            BeltFacing {
                name: ctx.entity.name.clone(),
                facing: ctx.entity.direction,
                kind: BeltKind::Belt,
            },
        );
        Ok(())
    }

    fn populate_logistics(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        let pos = ctx.position();
        let dir = ctx.entity.direction;
        let cells = TileCells::new(pos, dir);
        let curve = belt_curve(map, pos, dir);
        for cell in cells.all() {
            map.get_or_create_logistic_cell(cell).set_movement(dir);
        }
        // On a curve the outer lane's back cell first crosses over.
        if let Some(side) = curve {
            let (outer, travel) = if side == dir.left() {
                (cells.back_left, dir.right())
            } else {
                (cells.back_right, dir.left())
            };
            map.get_or_create_logistic_cell(outer).set_movement(travel);
        }
        Ok(())
    }

    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        map: &WorldMap,
        ctx: &EntityContext<'_>,
    ) -> Result<(), RenderError> {
        let dir = ctx.entity.direction;
        let straight = direction_key(dir);
        let layer = Layer::Entity;
        match belt_curve(map, ctx.position(), dir) {
            Some(side) => {
                let bend = if side == dir.left() { "left" } else { "right" };
                let curved = format!("{straight}-{bend}");
                out.push(ctx.sprite_or_box(layer, &[&curved, straight]));
            }
            None => out.push(ctx.sprite_or_box(layer, &[straight])),
        }
        Ok(())
    }
}
