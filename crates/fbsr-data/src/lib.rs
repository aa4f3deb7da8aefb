//! Game data consumed by the renderer: entity, item, recipe and tile
//! prototypes loaded from RON, TOML or JSON files, plus the derived item
//! colors and raw-material totals.

pub mod color;
pub mod game_data;
pub mod loader;
pub mod raw;
pub mod schema;

pub use game_data::{
    EntityPrototype, GameData, GameDataBuilder, ItemPrototype, RecipePrototype, Sprite,
    TilePrototype,
};
pub use loader::{DataLoadError, load_game_data};
