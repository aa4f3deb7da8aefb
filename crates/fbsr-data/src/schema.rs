//! Serde data file structs for game prototypes.
//!
//! These define the on-disk format of the data directory. The loader
//! resolves them into [`crate::game_data`] prototypes, decoding any image
//! files they name.

use std::collections::BTreeMap;

use serde::Deserialize;

// ===========================================================================
// Entities
// ===========================================================================

/// An entity prototype in `entities.*`.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityData {
    pub name: String,
    /// Prototype type; selects the rendering factory.
    #[serde(rename = "type")]
    pub entity_type: String,
    /// `[[left, top], [right, bottom]]` relative to the entity position.
    #[serde(default = "default_selection_box")]
    pub selection_box: [[f64; 2]; 2],
    /// Items that place this entity. Defaults to an item of the same name
    /// when that item exists.
    #[serde(default)]
    pub items_to_place: Option<Vec<String>>,
    #[serde(default)]
    pub sprites: BTreeMap<String, SpriteData>,
    /// Inserter pickup vector for a north-facing inserter.
    #[serde(default)]
    pub pickup_position: Option<[f64; 2]>,
    /// Inserter drop vector for a north-facing inserter.
    #[serde(default)]
    pub insert_position: Option<[f64; 2]>,
    /// Underground belt reach in tiles.
    #[serde(default)]
    pub max_distance: Option<u32>,
}

fn default_selection_box() -> [[f64; 2]; 2] {
    [[-0.5, -0.5], [0.5, 0.5]]
}

/// A sprite: an image file, an optional source region, and where it lands
/// relative to the entity position.
#[derive(Debug, Clone, Deserialize)]
pub struct SpriteData {
    pub file: String,
    /// `[x, y, width, height]` in source pixels. Whole image when absent.
    #[serde(default)]
    pub region: Option<[u32; 4]>,
    /// `[[left, top], [right, bottom]]` in tiles. The selection box when absent.
    #[serde(default)]
    pub bounds: Option<[[f64; 2]; 2]>,
    #[serde(default)]
    pub shadow: bool,
}

// ===========================================================================
// Items, recipes, tiles
// ===========================================================================

/// An item (or fluid) in `items.*`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    #[serde(rename = "type", default = "default_item_type")]
    pub item_type: String,
    #[serde(default)]
    pub icon: Option<String>,
}

fn default_item_type() -> String {
    "item".to_string()
}

/// A recipe in `recipes.*`. Amounts are `(item, amount)` pairs.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    pub ingredients: Vec<(String, f64)>,
    pub results: Vec<(String, f64)>,
    /// Crafting time in seconds.
    #[serde(default = "default_energy")]
    pub energy: f64,
}

fn default_energy() -> f64 {
    0.5
}

/// A ground tile in `tiles.*`.
#[derive(Debug, Clone, Deserialize)]
pub struct TileData {
    pub name: String,
    pub color: [u8; 3],
}

/// `info.*`: metadata about the game data set.
#[derive(Debug, Clone, Deserialize)]
pub struct InfoData {
    pub version: String,
}
