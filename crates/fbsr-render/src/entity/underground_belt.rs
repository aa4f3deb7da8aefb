//! Underground belts: an entrance pairs with the nearest matching exit
//! ahead of it and its lanes warp across.

use fbsr_core::geometry::{Direction, DirectionSet, Position};
use fbsr_core::world::{BeltFacing, BeltKind, WorldMap};

use super::{TileCells, direction_key};
use crate::error::RenderError;
use crate::factory::{EntityContext, EntityRendererFactory};
use crate::renderer::{Layer, Renderer};

/// Reach used when the prototype does not say.
pub const DEFAULT_MAX_DISTANCE: u32 = 5;

fn belt_kind(ctx: &EntityContext<'_>) -> Result<BeltKind, RenderError> {
    match ctx.entity.str_field("type") {
        Some("input") => Ok(BeltKind::UndergroundInput),
        Some("output") => Ok(BeltKind::UndergroundOutput),
        other => Err(RenderError::InvalidField {
            entity: ctx.entity.name.clone(),
            field: "type",
            detail: format!("expected input or output, got {other:?}"),
        }),
    }
}

/// Exit paired with the entrance at `pos`. Nested pairs of the same belt
/// are skipped over.
pub fn find_exit(map: &WorldMap, name: &str, pos: Position, dir: Direction, max_distance: u32) -> Option<Position> {
    let mut depth = 0u32;
    for step in 1..=max_distance {
        let p = dir.offset(pos, step as f64);
        let Some(belt) = map.belt(p) else {
            continue;
        };
        if belt.name != name || belt.facing != dir {
            continue;
        }
        match belt.kind {
            BeltKind::UndergroundInput => depth += 1,
            BeltKind::UndergroundOutput if depth == 0 => return Some(p),
            BeltKind::UndergroundOutput => depth -= 1,
            BeltKind::Belt => {}
        }
    }
    None
}

#[derive(Debug, Default)]
pub struct UndergroundBeltFactory;

impl EntityRendererFactory for UndergroundBeltFactory {
    fn populate_world_map(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        map.set_belt(
            ctx.position(),
            BeltFacing {
                name: ctx.entity.name.clone(),
                facing: ctx.entity.direction,
                kind: belt_kind(ctx)?,
            },
        );
        Ok(())
    }

    fn populate_logistics(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        let pos = ctx.position();
        let dir = ctx.entity.direction;
        let cells = TileCells::new(pos, dir);

        match belt_kind(ctx)? {
            BeltKind::UndergroundInput => {
                for cell in cells.back() {
                    map.get_or_create_logistic_cell(cell).set_movement(dir);
                }
                let only_from_behind: DirectionSet = [dir].into_iter().collect();
                for cell in cells.front() {
                    let cell = map.get_or_create_logistic_cell(cell);
                    cell.set_accept_filter(only_from_behind);
                    cell.set_block_warp_to_if_move(true);
                }
                let reach = ctx.prototype.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE);
                if let Some(exit) = find_exit(map, &ctx.entity.name, pos, dir, reach) {
                    let exit_cells = TileCells::new(exit, dir);
                    map.get_or_create_logistic_cell(cells.front_left).add_warp(exit_cells.back_left);
                    map.get_or_create_logistic_cell(cells.front_right).add_warp(exit_cells.back_right);
                }
            }
            _ => {
                for cell in cells.all() {
                    map.get_or_create_logistic_cell(cell).set_movement(dir);
                }
                // Nothing enters an exit from behind; side-loading is fine.
                let sides: DirectionSet = [dir.left(), dir.right()].into_iter().collect();
                for cell in cells.back() {
                    map.get_or_create_logistic_cell(cell).set_accept_filter(sides);
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
        let end = match belt_kind(ctx)? {
            BeltKind::UndergroundInput => "input",
            _ => "output",
        };
        let key = format!("{}-{end}", direction_key(ctx.entity.direction));
        out.push(ctx.sprite_or_box(Layer::Entity, &[&key, end]));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn underground(map: &mut WorldMap, y: f64, kind: BeltKind) {
        map.set_belt(
            Position::new(0.5, y),
            BeltFacing {
                name: "underground-belt".into(),
                facing: Direction::North,
                kind,
            },
        );
    }

    #[test]
    fn nearest_exit_wins() {
        let mut map = WorldMap::new();
        underground(&mut map, 0.5, BeltKind::UndergroundInput);
        underground(&mut map, -2.5, BeltKind::UndergroundOutput);
        underground(&mut map, -3.5, BeltKind::UndergroundOutput);
        let exit = find_exit(&map, "underground-belt", Position::new(0.5, 0.5), Direction::North, 5);
        assert_eq!(exit, Some(Position::new(0.5, -2.5)));
    }

    #[test]
    fn nested_pairs_are_skipped() {
        let mut map = WorldMap::new();
        underground(&mut map, -0.5, BeltKind::UndergroundInput);
        underground(&mut map, -1.5, BeltKind::UndergroundOutput);
        underground(&mut map, -2.5, BeltKind::UndergroundOutput);
        let exit = find_exit(&map, "underground-belt", Position::new(0.5, 0.5), Direction::North, 5);
        assert_eq!(exit, Some(Position::new(0.5, -2.5)));
    }

    #[test]
    fn exits_beyond_reach_do_not_pair() {
        let mut map = WorldMap::new();
        underground(&mut map, -6.5, BeltKind::UndergroundOutput);
        assert_eq!(find_exit(&map, "underground-belt", Position::new(0.5, 0.5), Direction::North, 5), None);
        assert_eq!(find_exit(&map, "fast-underground-belt", Position::new(0.5, 0.5), Direction::North, 9), None);
    }
}
