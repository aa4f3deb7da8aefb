//! Assemblers and furnaces: every footprint cell produces the recipe's
//! results and consumes its ingredients.

use fbsr_core::geometry::Bounds;
use fbsr_core::world::WorldMap;
use fbsr_data::RecipePrototype;
use image::Rgba;

use super::footprint_cells;
use crate::canvas::rgb;
use crate::error::RenderError;
use crate::factory::{EntityContext, EntityRendererFactory};
use crate::renderer::{Layer, Renderer, draw_fn};

const RECIPE_ICON_SIZE: f64 = 1.4;
const ICON_BACKDROP: Rgba<u8> = Rgba([0, 0, 0, 180]);

fn recipe<'a>(ctx: &EntityContext<'a>) -> Result<Option<&'a RecipePrototype>, RenderError> {
    let Some(name) = ctx.entity.str_field("recipe") else {
        return Ok(None);
    };
    ctx.data
        .recipe(name)
        .map(Some)
        .ok_or_else(|| RenderError::UnknownRecipe {
            entity: ctx.entity.name.clone(),
            recipe: name.to_string(),
        })
}

#[derive(Debug, Default)]
pub struct CraftingMachineFactory;

impl EntityRendererFactory for CraftingMachineFactory {
    fn populate_logistics(&self, map: &mut WorldMap, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        let Some(recipe) = recipe(ctx)? else {
            return Ok(());
        };
        for pos in footprint_cells(ctx.bounds()) {
            let cell = map.get_or_create_logistic_cell(pos);
            for (item, _) in &recipe.results {
                cell.add_output(item);
            }
            for (item, _) in &recipe.ingredients {
                cell.add_input(item);
                cell.add_banned_output(item);
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

        // An unknown recipe was already reported while populating logistics.
        let Some((product, _)) = recipe(ctx).ok().flatten().and_then(|r| r.results.first()) else {
            return Ok(());
        };
        let slot = Bounds::centered(ctx.bounds().center(), RECIPE_ICON_SIZE, RECIPE_ICON_SIZE);
        let icon = ctx.data.item(product).and_then(|i| i.icon.clone());
        let color = rgb(ctx.data.item_color(product));
        out.push(draw_fn(Layer::EntityInfoIcon, slot, move |canvas| {
            canvas.fill_circle(slot.center(), RECIPE_ICON_SIZE / 2.0, ICON_BACKDROP);
            match &icon {
                Some(icon) => {
                    let (w, h) = icon.dimensions();
                    canvas.draw_image(icon, [0, 0, w, h], slot, 1.0);
                }
                None => canvas.fill_rect(
                    Bounds::centered(slot.center(), RECIPE_ICON_SIZE * 0.5, RECIPE_ICON_SIZE * 0.5),
                    color,
                ),
            }
            Ok(())
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fbsr_core::geometry::{Direction, Position};
    use fbsr_core::test_utils::{entity, entity_with};
    use fbsr_data::{EntityPrototype, GameData, GameDataBuilder, ItemPrototype};
    use serde_json::json;

    use super::*;
    use crate::options::RenderOptions;

    fn data() -> GameData {
        let mut builder = GameDataBuilder::new();
        builder
            .register_item(ItemPrototype::new("iron-plate", "item"))
            .register_item(ItemPrototype::new("iron-gear-wheel", "item"))
            .register_recipe(RecipePrototype {
                name: "iron-gear-wheel".into(),
                ingredients: vec![("iron-plate".into(), 2.0)],
                results: vec![("iron-gear-wheel".into(), 1.0)],
                energy: 0.5,
            })
            .register_entity(EntityPrototype::new(
                "assembling-machine-1",
                "assembling-machine",
                Bounds::new(-1.4, -1.4, 2.8, 2.8),
            ));
        builder.build().unwrap()
    }

    fn populate(data: &GameData, raw: serde_json::Value) -> Result<WorldMap, RenderError> {
        let e = entity_with(1, "assembling-machine-1", 1.5, 1.5, Direction::North, raw);
        let options = RenderOptions::default();
        let ctx = EntityContext {
            entity: &e,
            prototype: data.entity("assembling-machine-1").unwrap(),
            data,
            options: &options,
        };
        let mut map = WorldMap::new();
        CraftingMachineFactory.populate_logistics(&mut map, &ctx)?;
        Ok(map)
    }

    #[test]
    fn footprint_produces_and_consumes() {
        let data = data();
        let map = populate(&data, json!({"recipe": "iron-gear-wheel"})).unwrap();
        assert_eq!(map.logistic_cells().count(), 36);
        let cell = map.logistic_cell(Position::new(0.25, 2.75)).unwrap();
        assert!(cell.outputs().unwrap().contains("iron-gear-wheel"));
        assert!(cell.inputs().unwrap().contains("iron-plate"));
        assert!(cell.is_banned_output("iron-plate"));
    }

    #[test]
    fn idle_machine_has_no_logistics() {
        let data = data();
        assert_eq!(populate(&data, json!({})).unwrap().logistic_cells().count(), 0);
    }

    #[test]
    fn unknown_recipe_is_reported() {
        let data = data();
        let err = populate(&data, json!({"recipe": "warp-drive"})).unwrap_err();
        assert!(matches!(err, RenderError::UnknownRecipe { ref recipe, .. } if recipe == "warp-drive"));
    }

    #[test]
    fn recipe_icon_sits_on_top() {
        let data = data();
        let e = entity_with(1, "assembling-machine-1", 1.5, 1.5, Direction::North, json!({"recipe": "iron-gear-wheel"}));
        let options = RenderOptions::default();
        let ctx = EntityContext {
            entity: &e,
            prototype: data.entity("assembling-machine-1").unwrap(),
            data: &data,
            options: &options,
        };
        let mut out = Vec::new();
        CraftingMachineFactory.create_renderers(&mut out, &WorldMap::new(), &ctx).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].layer(), Layer::EntityInfoIcon);

        let idle = entity(2, "assembling-machine-1", 1.5, 1.5, Direction::North);
        let ctx = EntityContext { entity: &idle, ..ctx };
        out.clear();
        CraftingMachineFactory.create_renderers(&mut out, &WorldMap::new(), &ctx).unwrap();
        assert_eq!(out.len(), 1);
    }
}
