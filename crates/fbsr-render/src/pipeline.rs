//! The render pipeline: blueprint in, image out.
//!
//! One call owns its world map and draw operations outright. Game data and
//! the factory registry are only read, so independent renders can run on
//! separate threads against the same instances.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use fbsr_core::blueprint::{Blueprint, BlueprintEntity, BlueprintTile};
use fbsr_core::diagnostics::Reporting;
use fbsr_core::flow::{populate_reverse_logistics, populate_transit_logistics};
use fbsr_core::rail::{propagate_signal_blocks, propagate_station_io};
use fbsr_core::world::WorldMap;
use fbsr_data::GameData;
use image::{DynamicImage, RgbImage};

use crate::align::align_to_grid;
use crate::compositor::compose;
use crate::error::RenderError;
use crate::factory::{EntityContext, EntityRendererFactory, FactoryRegistry, ResolvedEntity};
use crate::options::RenderOptions;
use crate::overlay::{logistic_overlay, placement_overlay, rail_overlay};
use crate::panel::{BorderPanels, FooterPanel, HeaderPanel, ItemListPanel, PanelSide};
use crate::renderer::Renderer;
use crate::totals::{generate_total_items, generate_total_raw_items};

/// A finished render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub image: RgbImage,
    pub render_time: Duration,
}

/// Aligned objects of one blueprint and the world model built from them,
/// with every propagation already run.
#[derive(Debug)]
pub struct Scene {
    pub entities: Vec<BlueprintEntity>,
    pub tiles: Vec<BlueprintTile>,
    pub map: WorldMap,
}

fn contexts<'a>(
    entities: &'a [BlueprintEntity],
    resolved: &'a [ResolvedEntity<'a>],
    data: &'a GameData,
    options: &'a RenderOptions,
) -> Vec<(&'a dyn EntityRendererFactory, EntityContext<'a>)> {
    entities
        .iter()
        .zip(resolved)
        .map(|(entity, r)| {
            let ctx = EntityContext {
                entity,
                prototype: &r.prototype,
                data,
                options,
            };
            (r.factory, ctx)
        })
        .collect()
}

/// Align, populate and propagate. Unknown names are noted once each and
/// failing factories are recorded in `reporting`.
pub fn build_scene(
    blueprint: &Blueprint,
    data: &GameData,
    registry: &FactoryRegistry,
    options: &RenderOptions,
    reporting: &mut Reporting,
) -> Scene {
    let new_format = blueprint.is_new_format();
    let mut map = WorldMap::new();
    map.set_new_format(new_format);
    reporting.set_new_format_detected(new_format);

    let mut unknown = BTreeSet::new();
    for name in blueprint.entities.iter().map(|e| &e.name) {
        if !registry.resolve_entity(data, name).known && unknown.insert(name.clone()) {
            log::debug!("no factory for entity {name}");
            reporting.add_info(format!("unknown entity: {name}"));
        }
    }
    for name in blueprint.tiles.iter().map(|t| &t.name) {
        if !registry.resolve_tile(data, name).2 && unknown.insert(name.clone()) {
            log::debug!("no data for tile {name}");
            reporting.add_info(format!("unknown tile: {name}"));
        }
    }

    let mut entities = blueprint.entities.clone();
    let mut tiles = blueprint.tiles.clone();
    align_to_grid(&mut entities, &mut tiles, blueprint.version, data);

    let resolved: Vec<_> = entities.iter().map(|e| registry.resolve_entity(data, &e.name)).collect();
    let contexts = contexts(&entities, &resolved, data, options);
    for (factory, ctx) in &contexts {
        map.set_wire_anchor(ctx.entity.id, ctx.position());
        if let Err(e) = factory.populate_world_map(&mut map, ctx) {
            reporting.add_exception(&e);
        }
    }
    for (factory, ctx) in &contexts {
        if let Err(e) = factory.populate_logistics(&mut map, ctx) {
            reporting.add_exception(&e);
        }
    }

    populate_reverse_logistics(&mut map);
    populate_transit_logistics(&mut map, options.debug_inputs);
    propagate_signal_blocks(&mut map);
    propagate_station_io(&mut map);

    Scene { entities, tiles, map }
}

/// Render one blueprint.
///
/// Per-object failures are recorded in `reporting` and the render carries
/// on; only a render that cannot produce any canvas fails outright.
pub fn render_blueprint(
    blueprint: &Blueprint,
    data: &GameData,
    registry: &FactoryRegistry,
    options: &RenderOptions,
    reporting: &mut Reporting,
) -> Result<RenderOutput, RenderError> {
    let label = blueprint.label.as_deref().unwrap_or("(no name)");
    log::info!(
        "rendering {label}: {} entities, {} tiles",
        blueprint.entities.len(),
        blueprint.tiles.len()
    );
    let start = Instant::now();

    let Scene { entities, tiles, map } = build_scene(blueprint, data, registry, options, reporting);
    let resolved: Vec<_> = entities.iter().map(|e| registry.resolve_entity(data, &e.name)).collect();
    let contexts = contexts(&entities, &resolved, data, options);

    let mut renderers: Vec<Box<dyn Renderer>> = Vec::new();
    for (factory, ctx) in &contexts {
        if let Err(e) = factory.create_renderers(&mut renderers, &map, ctx) {
            reporting.add_exception(&e);
        }
    }
    for tile in &tiles {
        let (factory, prototype, _) = registry.resolve_tile(data, &tile.name);
        if let Err(e) = factory.create_renderers(&mut renderers, tile, &prototype, options) {
            reporting.add_exception(&e);
        }
    }
    for (factory, ctx) in &contexts {
        if let Err(e) = factory.create_module_icons(&mut renderers, ctx) {
            reporting.add_exception(&e);
        }
    }
    for (factory, ctx) in &contexts {
        if let Err(e) = factory.create_wire_connections(&mut renderers, &map, ctx, &blueprint.wires) {
            reporting.add_exception(&e);
        }
    }

    logistic_overlay(&mut renderers, &map, data, options);
    rail_overlay(&mut renderers, &map, options);

    let mut panels = BorderPanels::new();
    if options.show_info_panels {
        if let Some(label) = &blueprint.label {
            panels.add(PanelSide::North, Box::new(HeaderPanel::new(label)));
        }
        panels.add(PanelSide::South, Box::new(FooterPanel::new(data.version())));

        let total_items = generate_total_items(data, blueprint);
        let total_raw = generate_total_raw_items(data, &total_items);
        panels.add(PanelSide::East, Box::new(ItemListPanel::new("TOTAL", &total_items, data)));
        panels.add(PanelSide::East, Box::new(ItemListPanel::new("RAW", &total_raw, data)));
    }

    if options.debug_placement {
        placement_overlay(&mut renderers, &entities, &tiles);
    }

    let image = compose(renderers, &panels, options, reporting)?;
    let image = DynamicImage::ImageRgba8(image).to_rgb8();

    let render_time = start.elapsed();
    log::info!("render time {} ms", render_time.as_millis());
    Ok(RenderOutput { image, render_time })
}
