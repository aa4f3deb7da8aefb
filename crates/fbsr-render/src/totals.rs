//! Bill of materials for a blueprint: items to build it, a coarse summary,
//! and the raw materials behind those items.

use std::collections::BTreeMap;

use fbsr_core::blueprint::{Blueprint, BlueprintEntity};
use fbsr_data::GameData;
use fbsr_data::raw::TotalRawCalculator;

pub type ItemTotals = BTreeMap<String, f64>;

fn add(totals: &mut ItemTotals, name: &str, amount: f64) {
    *totals.entry(name.to_string()).or_insert(0.0) += amount;
}

/// Module items requested into an entity, with counts.
fn modules(entity: &BlueprintEntity, data: &GameData) -> Vec<(String, u32)> {
    entity
        .item_requests()
        .into_iter()
        .filter(|(name, _)| data.item(name).is_some_and(|i| i.is_module()))
        .collect()
}

/// The item a placed tile is built from. Decorative variants collapse onto
/// the item that places them.
pub fn tile_item(tile: &str) -> &str {
    if tile.starts_with("refined-hazard-concrete") {
        "refined-hazard-concrete"
    } else if tile.starts_with("hazard-concrete") {
        "hazard-concrete"
    } else if tile == "stone-path" {
        "stone-brick"
    } else if tile == "grass-1" {
        "landfill"
    } else {
        tile
    }
}

/// Tile items that exist in the game data, one per placed tile.
fn tile_items<'a>(blueprint: &'a Blueprint, data: &'a GameData) -> impl Iterator<Item = &'a str> {
    blueprint.tiles.iter().filter_map(move |tile| {
        let item = tile_item(&tile.name);
        if data.item(item).is_none() {
            log::warn!("missing item for tile {}: {item}", tile.name);
            return None;
        }
        Some(item)
    })
}

/// Items needed to build every entity (with its modules) and tile.
/// Entities without a placing item are skipped.
pub fn generate_total_items(data: &GameData, blueprint: &Blueprint) -> ItemTotals {
    let mut totals = ItemTotals::new();
    for entity in &blueprint.entities {
        let items = data.items_for_entity(&entity.name);
        if items.is_empty() {
            continue;
        }
        for item in items {
            add(&mut totals, &item.name, 1.0);
        }
        for (name, count) in modules(entity, data) {
            add(&mut totals, &name, count as f64);
        }
    }
    for item in tile_items(blueprint, data) {
        add(&mut totals, item, 1.0);
    }
    totals
}

/// Entity, module and tile counts.
pub fn generate_summed_total_items(data: &GameData, blueprint: &Blueprint) -> ItemTotals {
    let mut totals = ItemTotals::new();
    if !blueprint.entities.is_empty() {
        totals.insert("Entities".to_string(), blueprint.entities.len() as f64);
    }
    for entity in &blueprint.entities {
        for (_, count) in modules(entity, data) {
            add(&mut totals, "Modules", count as f64);
        }
    }
    for _ in tile_items(blueprint, data) {
        add(&mut totals, "Tiles", 1.0);
    }
    totals
}

/// Raw materials and crafting time behind `total_items`. Items without a
/// recipe of the same name contribute nothing.
pub fn generate_total_raw_items(data: &GameData, total_items: &ItemTotals) -> ItemTotals {
    let calculator = TotalRawCalculator::new(data.recipes());
    let mut totals = ItemTotals::new();
    for (name, amount) in total_items {
        let Some(recipe) = data.recipe(name) else {
            continue;
        };
        let Some(yields) = recipe.result_amount(name).filter(|y| *y > 0.0) else {
            continue;
        };
        let multiplier = amount / yields;
        for (raw, raw_amount) in calculator.compute(recipe) {
            add(&mut totals, &raw, raw_amount * multiplier);
        }
    }
    totals
}
