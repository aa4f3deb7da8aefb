//! Per-type rendering factories and the registry that maps prototype types
//! to them.
//!
//! A factory contributes to a render in phases: world-map population,
//! logistics population, draw operations, module icons and wires. Every
//! phase is called once per placed object and every phase may fail on its
//! own without affecting the others.

use std::borrow::Cow;
use std::collections::HashMap;

use fbsr_core::blueprint::{BlueprintEntity, BlueprintTile, Wire, WireColor};
use fbsr_core::geometry::{Bounds, Position};
use fbsr_core::world::WorldMap;
use fbsr_data::{EntityPrototype, GameData, Sprite, TilePrototype};
use image::Rgba;

use crate::canvas::{rgb, rgba};
use crate::entity;
use crate::error::RenderError;
use crate::options::RenderOptions;
use crate::renderer::{BoxRenderer, Layer, Renderer, SpriteRenderer, draw_fn, line_renderer};

const MODULE_ICON_SIZE: f64 = 0.5;
const WIRE_WIDTH: f64 = 1.5 / 32.0;
const FALLBACK_FILL: Rgba<u8> = Rgba([90, 90, 110, 255]);
const FALLBACK_OUTLINE: Rgba<u8> = Rgba([140, 140, 160, 255]);
const UNKNOWN_MARKER: Rgba<u8> = Rgba([255, 0, 255, 255]);

/// Everything a factory may look at for one placed entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityContext<'a> {
    pub entity: &'a BlueprintEntity,
    pub prototype: &'a EntityPrototype,
    pub data: &'a GameData,
    pub options: &'a RenderOptions,
}

impl EntityContext<'_> {
    pub fn position(&self) -> Position {
        self.entity.position
    }

    /// Selection box rotated to the entity's facing and placed in the world.
    pub fn bounds(&self) -> Bounds {
        self.entity
            .direction
            .rotate_bounds(self.prototype.selection_box)
            .translated(self.entity.position)
    }

    /// Sprites under `key`, plus its `-shadow` companion if present.
    pub fn sprites(&self, key: &str) -> Vec<Sprite> {
        let mut sprites: Vec<Sprite> = self.prototype.sprite(key).cloned().into_iter().collect();
        if let Some(shadow) = self.prototype.sprite(&format!("{key}-shadow")) {
            let mut shadow = shadow.clone();
            shadow.shadow = true;
            sprites.push(shadow);
        }
        sprites
    }

    /// Draw the first of `keys` the prototype has a sprite for, or a plain
    /// box over the selection area when it has none.
    pub fn sprite_or_box(&self, layer: Layer, keys: &[&str]) -> Box<dyn Renderer> {
        for key in keys {
            let sprites = self.sprites(key);
            if !sprites.is_empty() {
                return Box::new(SpriteRenderer::new(layer, &self.entity.name, self.position(), sprites));
            }
        }
        Box::new(BoxRenderer {
            layer,
            bounds: self.bounds(),
            fill: FALLBACK_FILL,
            outline: Some(FALLBACK_OUTLINE),
        })
    }
}

pub trait EntityRendererFactory: Send + Sync {
    fn populate_world_map(&self, _map: &mut WorldMap, _ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        Ok(())
    }

    fn populate_logistics(&self, _map: &mut WorldMap, _ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        Ok(())
    }

    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        map: &WorldMap,
        ctx: &EntityContext<'_>,
    ) -> Result<(), RenderError>;

    /// Icons for the modules requested into the entity, in a row along its
    /// lower edge.
    fn create_module_icons(&self, out: &mut Vec<Box<dyn Renderer>>, ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        let mut modules = Vec::new();
        for (name, count) in ctx.entity.item_requests() {
            if ctx.data.item(&name).is_some_and(|i| i.is_module()) {
                modules.extend(std::iter::repeat_n(name, count as usize));
            }
        }
        if modules.is_empty() {
            return Ok(());
        }

        let bounds = ctx.bounds();
        let row = modules.len() as f64 * MODULE_ICON_SIZE;
        let mut x = bounds.center().x - row / 2.0;
        let y = bounds.max_y() - MODULE_ICON_SIZE - 0.1;
        for name in modules {
            let slot = Bounds::new(x, y, MODULE_ICON_SIZE, MODULE_ICON_SIZE);
            let icon = ctx.data.item(&name).and_then(|i| i.icon.clone());
            let color = rgb(ctx.data.item_color(&name));
            out.push(draw_fn(Layer::EntityInfoIcon, slot, move |canvas| {
                canvas.fill_rect(slot, rgba(0, 0, 0, 180));
                match &icon {
                    Some(icon) => {
                        let (w, h) = icon.dimensions();
                        canvas.draw_image(icon, [0, 0, w, h], slot, 1.0);
                    }
                    None => canvas.fill_rect(
                        Bounds::centered(slot.center(), MODULE_ICON_SIZE * 0.6, MODULE_ICON_SIZE * 0.6),
                        color,
                    ),
                }
                Ok(())
            }));
            x += MODULE_ICON_SIZE;
        }
        Ok(())
    }

    /// Lines for the circuit wires that start at this entity.
    fn create_wire_connections(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        map: &WorldMap,
        ctx: &EntityContext<'_>,
        wires: &[Wire],
    ) -> Result<(), RenderError> {
        for wire in wires.iter().filter(|w| w.a == ctx.entity.id) {
            let (Some(a), Some(b)) = (map.wire_anchor(wire.a), map.wire_anchor(wire.b)) else {
                continue;
            };
            let color = match wire.color {
                WireColor::Red => rgba(200, 40, 40, 255),
                WireColor::Green => rgba(40, 200, 40, 255),
            };
            out.push(line_renderer(Layer::Wire, a, b, WIRE_WIDTH, color));
        }
        Ok(())
    }
}

pub trait TileRendererFactory: Send + Sync {
    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        tile: &BlueprintTile,
        prototype: &TilePrototype,
        options: &RenderOptions,
    ) -> Result<(), RenderError>;
}

/// A magenta cross over an object nothing knows how to draw.
fn unknown_marker(pos: Position) -> Box<dyn Renderer> {
    let bounds = Bounds::centered(pos, 0.5, 0.5);
    draw_fn(Layer::Debug, bounds, move |canvas| {
        let (a, b) = (Position::new(bounds.min_x(), bounds.min_y()), Position::new(bounds.max_x(), bounds.max_y()));
        let (c, d) = (Position::new(bounds.max_x(), bounds.min_y()), Position::new(bounds.min_x(), bounds.max_y()));
        canvas.line(a, b, 2.0 / 32.0, UNKNOWN_MARKER);
        canvas.line(c, d, 2.0 / 32.0, UNKNOWN_MARKER);
        Ok(())
    })
}

/// Stand-in for entities with no prototype or no registered type. Draws
/// nothing unless type-mapping debugging is on.
#[derive(Debug, Default)]
pub struct UnknownEntityFactory;

impl EntityRendererFactory for UnknownEntityFactory {
    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        _map: &WorldMap,
        ctx: &EntityContext<'_>,
    ) -> Result<(), RenderError> {
        if ctx.options.debug_type_mapping {
            out.push(unknown_marker(ctx.position()));
        }
        Ok(())
    }

    fn create_module_icons(&self, _out: &mut Vec<Box<dyn Renderer>>, _ctx: &EntityContext<'_>) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Solid tile square in the prototype's color.
#[derive(Debug, Default)]
pub struct GroundTileFactory;

impl TileRendererFactory for GroundTileFactory {
    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        tile: &BlueprintTile,
        prototype: &TilePrototype,
        _options: &RenderOptions,
    ) -> Result<(), RenderError> {
        out.push(Box::new(BoxRenderer {
            layer: Layer::Tile,
            bounds: Bounds::centered(tile.position, 1.0, 1.0),
            fill: rgb(prototype.color),
            outline: None,
        }));
        Ok(())
    }
}

/// Tiles without data.
#[derive(Debug, Default)]
pub struct UnknownTileFactory;

impl TileRendererFactory for UnknownTileFactory {
    fn create_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        tile: &BlueprintTile,
        _prototype: &TilePrototype,
        options: &RenderOptions,
    ) -> Result<(), RenderError> {
        if options.debug_type_mapping {
            out.push(unknown_marker(tile.position));
        }
        Ok(())
    }
}

/// A resolved entity factory together with the prototype it renders.
pub struct ResolvedEntity<'a> {
    pub factory: &'a dyn EntityRendererFactory,
    pub prototype: Cow<'a, EntityPrototype>,
    pub known: bool,
}

/// Maps prototype `type` names to factories. Shared read-only across
/// concurrent renders.
pub struct FactoryRegistry {
    entities: HashMap<String, Box<dyn EntityRendererFactory>>,
    unknown_entity: UnknownEntityFactory,
    tile: Box<dyn TileRendererFactory>,
    unknown_tile: UnknownTileFactory,
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FactoryRegistry {
    /// An empty registry: every entity type is unknown.
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            unknown_entity: UnknownEntityFactory,
            tile: Box::new(GroundTileFactory),
            unknown_tile: UnknownTileFactory,
        }
    }

    /// Registry with every built-in factory.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register("pipe", entity::pipe::PipeFactory)
            .register("storage-tank", entity::storage_tank::StorageTankFactory)
            .register("straight-rail", entity::rail::StraightRailFactory)
            .register("curved-rail", entity::rail::CurvedRailFactory)
            .register("rail-signal", entity::signal::RailSignalFactory)
            .register("rail-chain-signal", entity::signal::RailSignalFactory)
            .register("train-stop", entity::train_stop::TrainStopFactory)
            .register("transport-belt", entity::belt::TransportBeltFactory)
            .register("underground-belt", entity::underground_belt::UndergroundBeltFactory)
            .register("inserter", entity::inserter::InserterFactory)
            .register("assembling-machine", entity::crafting::CraftingMachineFactory)
            .register("furnace", entity::crafting::CraftingMachineFactory)
            .register("container", entity::container::ContainerFactory)
            .register("logistic-container", entity::container::ContainerFactory);
        registry
    }

    pub fn register(&mut self, entity_type: &str, factory: impl EntityRendererFactory + 'static) -> &mut Self {
        self.entities.insert(entity_type.to_string(), Box::new(factory));
        self
    }

    pub fn entity_factory(&self, entity_type: &str) -> Option<&dyn EntityRendererFactory> {
        self.entities.get(entity_type).map(|f| f.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Factory and prototype for an entity name. Names without data, and
    /// data whose type has no factory, resolve to the unknown factory with
    /// a one-tile placeholder prototype.
    pub fn resolve_entity<'a>(&'a self, data: &'a GameData, name: &str) -> ResolvedEntity<'a> {
        match data.entity(name) {
            Some(prototype) => match self.entity_factory(&prototype.entity_type) {
                Some(factory) => ResolvedEntity {
                    factory,
                    prototype: Cow::Borrowed(prototype),
                    known: true,
                },
                None => ResolvedEntity {
                    factory: &self.unknown_entity,
                    prototype: Cow::Borrowed(prototype),
                    known: false,
                },
            },
            None => ResolvedEntity {
                factory: &self.unknown_entity,
                prototype: Cow::Owned(EntityPrototype::new(
                    name,
                    "unknown",
                    Bounds::centered(Position::default(), 1.0, 1.0),
                )),
                known: false,
            },
        }
    }

    /// Factory and prototype for a tile name.
    pub fn resolve_tile<'a>(
        &'a self,
        data: &'a GameData,
        name: &str,
    ) -> (&'a dyn TileRendererFactory, Cow<'a, TilePrototype>, bool) {
        match data.tile(name) {
            Some(prototype) => (self.tile.as_ref(), Cow::Borrowed(prototype), true),
            None => (
                &self.unknown_tile,
                Cow::Owned(TilePrototype {
                    name: name.to_string(),
                    color: [255, 0, 255],
                }),
                false,
            ),
        }
    }
}
