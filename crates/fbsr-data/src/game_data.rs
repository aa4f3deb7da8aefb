//! Resolved prototypes and the read-only lookup service built from them.

use std::collections::HashMap;
use std::sync::Arc;

use fbsr_core::geometry::{Bounds, Position};
use image::RgbaImage;

use crate::color::ItemColorCache;
use crate::loader::DataLoadError;

/// Version string used when the data set has no `info` file.
pub const UNKNOWN_VERSION: &str = "unknown";

// ===========================================================================
// Prototypes
// ===========================================================================

/// A decoded image with an optional source region and target bounds
/// relative to the entity position.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub image: Arc<RgbaImage>,
    /// `[x, y, width, height]` in source pixels.
    pub region: Option<[u32; 4]>,
    pub bounds: Bounds,
    pub shadow: bool,
}

impl Sprite {
    /// Source region clamped to the image.
    pub fn source_rect(&self) -> [u32; 4] {
        let (w, h) = self.image.dimensions();
        match self.region {
            Some([x, y, rw, rh]) => {
                let x = x.min(w);
                let y = y.min(h);
                [x, y, rw.min(w - x), rh.min(h - y)]
            }
            None => [0, 0, w, h],
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityPrototype {
    pub name: String,
    pub entity_type: String,
    pub selection_box: Bounds,
    /// Items that place this entity. Resolved at build time.
    pub items_to_place: Vec<String>,
    pub sprites: HashMap<String, Sprite>,
    pub pickup_position: Option<Position>,
    pub insert_position: Option<Position>,
    pub max_distance: Option<u32>,
}

impl EntityPrototype {
    pub fn new(name: &str, entity_type: &str, selection_box: Bounds) -> Self {
        Self {
            name: name.to_string(),
            entity_type: entity_type.to_string(),
            selection_box,
            items_to_place: Vec::new(),
            sprites: HashMap::new(),
            pickup_position: None,
            insert_position: None,
            max_distance: None,
        }
    }

    pub fn sprite(&self, key: &str) -> Option<&Sprite> {
        self.sprites.get(key)
    }
}

#[derive(Debug, Clone)]
pub struct ItemPrototype {
    pub name: String,
    pub item_type: String,
    pub icon: Option<Arc<RgbaImage>>,
}

impl ItemPrototype {
    pub fn new(name: &str, item_type: &str) -> Self {
        Self {
            name: name.to_string(),
            item_type: item_type.to_string(),
            icon: None,
        }
    }

    pub fn is_module(&self) -> bool {
        self.item_type == "module"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipePrototype {
    pub name: String,
    pub ingredients: Vec<(String, f64)>,
    pub results: Vec<(String, f64)>,
    /// Crafting time in seconds.
    pub energy: f64,
}

impl RecipePrototype {
    /// Amount of `item` one craft yields.
    pub fn result_amount(&self, item: &str) -> Option<f64> {
        self.results
            .iter()
            .find(|(name, _)| name == item)
            .map(|(_, amount)| *amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePrototype {
    pub name: String,
    pub color: [u8; 3],
}

// ===========================================================================
// Builder
// ===========================================================================

/// Builder for an immutable [`GameData`].
/// Two-phase lifecycle: registration, then validation in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct GameDataBuilder {
    entities: Vec<EntityPrototype>,
    items: Vec<ItemPrototype>,
    recipes: Vec<RecipePrototype>,
    tiles: Vec<TilePrototype>,
    version: Option<String>,
}

impl GameDataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_entity(&mut self, prototype: EntityPrototype) -> &mut Self {
        self.entities.push(prototype);
        self
    }

    pub fn register_item(&mut self, prototype: ItemPrototype) -> &mut Self {
        self.items.push(prototype);
        self
    }

    pub fn register_recipe(&mut self, prototype: RecipePrototype) -> &mut Self {
        self.recipes.push(prototype);
        self
    }

    pub fn register_tile(&mut self, prototype: TilePrototype) -> &mut Self {
        self.tiles.push(prototype);
        self
    }

    pub fn set_version(&mut self, version: &str) -> &mut Self {
        self.version = Some(version.to_string());
        self
    }

    /// Check names and references, and freeze.
    ///
    /// Entities with no explicit placing items are placed by the item of the
    /// same name, if there is one.
    pub fn build(self) -> Result<GameData, DataLoadError> {
        let items = index_unique(self.items, "item", |i| &i.name)?;
        let recipes = index_unique(self.recipes, "recipe", |r| &r.name)?;
        let tiles = index_unique(self.tiles, "tile", |t| &t.name)?;
        let mut entities = index_unique(self.entities, "entity", |e| &e.name)?;

        for recipe in recipes.values() {
            for (name, _) in recipe.ingredients.iter().chain(&recipe.results) {
                if !items.contains_key(name) {
                    return Err(DataLoadError::UnresolvedRef {
                        referenced_by: format!("recipe '{}'", recipe.name),
                        name: name.clone(),
                        expected_kind: "item",
                    });
                }
            }
        }

        for entity in entities.values_mut() {
            if entity.items_to_place.is_empty() && items.contains_key(&entity.name) {
                entity.items_to_place.push(entity.name.clone());
            }
            for name in &entity.items_to_place {
                if !items.contains_key(name) {
                    return Err(DataLoadError::UnresolvedRef {
                        referenced_by: format!("entity '{}'", entity.name),
                        name: name.clone(),
                        expected_kind: "item",
                    });
                }
            }
        }

        Ok(GameData {
            entities,
            items,
            recipes,
            tiles,
            version: self.version.unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
            colors: ItemColorCache::new(),
        })
    }
}

fn index_unique<T>(
    list: Vec<T>,
    kind: &'static str,
    name: impl Fn(&T) -> &String,
) -> Result<HashMap<String, T>, DataLoadError> {
    let mut map = HashMap::with_capacity(list.len());
    for value in list {
        let key = name(&value).clone();
        if map.contains_key(&key) {
            return Err(DataLoadError::DuplicateName { kind, name: key });
        }
        map.insert(key, value);
    }
    Ok(map)
}

// ===========================================================================
// GameData
// ===========================================================================

/// Read-only game data shared by every render. Safe to share across
/// threads; the only interior mutability is the item color cache.
#[derive(Debug)]
pub struct GameData {
    entities: HashMap<String, EntityPrototype>,
    items: HashMap<String, ItemPrototype>,
    recipes: HashMap<String, RecipePrototype>,
    tiles: HashMap<String, TilePrototype>,
    version: String,
    colors: ItemColorCache,
}

impl GameData {
    pub fn entity(&self, name: &str) -> Option<&EntityPrototype> {
        self.entities.get(name)
    }

    pub fn item(&self, name: &str) -> Option<&ItemPrototype> {
        self.items.get(name)
    }

    pub fn recipe(&self, name: &str) -> Option<&RecipePrototype> {
        self.recipes.get(name)
    }

    pub fn tile(&self, name: &str) -> Option<&TilePrototype> {
        self.tiles.get(name)
    }

    pub fn recipes(&self) -> &HashMap<String, RecipePrototype> {
        &self.recipes
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Items that place the named entity; empty for unknown entities.
    pub fn items_for_entity(&self, name: &str) -> Vec<&ItemPrototype> {
        self.entities
            .get(name)
            .map(|e| {
                e.items_to_place
                    .iter()
                    .filter_map(|i| self.items.get(i))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Game version string shown in the footer.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Display color for an item, sampled from its icon and memoized.
    pub fn item_color(&self, name: &str) -> [u8; 3] {
        let icon = self.items.get(name).and_then(|i| i.icon.as_deref());
        self.colors.get_or_compute(name, icon)
    }
}
