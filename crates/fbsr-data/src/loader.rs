//! Loading pipeline: discovers data files, deserializes them, decodes the
//! images they reference, and builds a [`GameData`].
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fbsr_core::geometry::{Bounds, Position};
use image::RgbaImage;
use serde::de::DeserializeOwned;

use crate::game_data::{
    EntityPrototype, GameData, GameDataBuilder, ItemPrototype, RecipePrototype, Sprite,
    TilePrototype,
};
use crate::schema::{EntityData, InfoData, ItemData, RecipeData, TileData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {referenced_by}")]
    UnresolvedRef {
        referenced_by: String,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// An image file could not be decoded.
    #[error("image error in {file}: {detail}")]
    Image { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. TOML has no top-level arrays, so for
/// TOML files the array is read from `toml_key` of the top-level table.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Images
// ===========================================================================

/// Decodes image files relative to the data directory, once per path.
struct ImageStore<'a> {
    dir: &'a Path,
    loaded: HashMap<String, Arc<RgbaImage>>,
}

impl<'a> ImageStore<'a> {
    fn new(dir: &'a Path) -> Self {
        Self {
            dir,
            loaded: HashMap::new(),
        }
    }

    fn load(&mut self, relative: &str) -> Result<Arc<RgbaImage>, DataLoadError> {
        if let Some(image) = self.loaded.get(relative) {
            return Ok(Arc::clone(image));
        }
        let path = self.dir.join(relative);
        let image = image::open(&path)
            .map_err(|e| DataLoadError::Image {
                file: path.clone(),
                detail: e.to_string(),
            })?
            .to_rgba8();
        let image = Arc::new(image);
        self.loaded.insert(relative.to_string(), Arc::clone(&image));
        Ok(image)
    }
}

fn bounds_from_corners(corners: [[f64; 2]; 2]) -> Bounds {
    let [[x1, y1], [x2, y2]] = corners;
    Bounds::from_diagonal(x1, y1, x2, y2)
}

fn resolve_entity(data: EntityData, images: &mut ImageStore) -> Result<EntityPrototype, DataLoadError> {
    let selection_box = bounds_from_corners(data.selection_box);
    let mut prototype = EntityPrototype::new(&data.name, &data.entity_type, selection_box);
    prototype.items_to_place = data.items_to_place.unwrap_or_default();
    prototype.pickup_position = data.pickup_position.map(|[x, y]| Position::new(x, y));
    prototype.insert_position = data.insert_position.map(|[x, y]| Position::new(x, y));
    prototype.max_distance = data.max_distance;
    for (key, sprite) in data.sprites {
        prototype.sprites.insert(
            key,
            Sprite {
                image: images.load(&sprite.file)?,
                region: sprite.region,
                bounds: sprite.bounds.map_or(selection_box, bounds_from_corners),
                shadow: sprite.shadow,
            },
        );
    }
    Ok(prototype)
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Load the data directory: `entities`, `items` and `recipes` are required,
/// `tiles` and `info` optional. Each may be `.ron`, `.toml` or `.json`.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let mut images = ImageStore::new(dir);
    let mut builder = GameDataBuilder::new();

    let path = require_data_file(dir, "items")?;
    for item in deserialize_list::<ItemData>(&path, "items")? {
        let icon = item.icon.as_deref().map(|f| images.load(f)).transpose()?;
        builder.register_item(ItemPrototype {
            name: item.name,
            item_type: item.item_type,
            icon,
        });
    }

    let path = require_data_file(dir, "recipes")?;
    for recipe in deserialize_list::<RecipeData>(&path, "recipes")? {
        builder.register_recipe(RecipePrototype {
            name: recipe.name,
            ingredients: recipe.ingredients,
            results: recipe.results,
            energy: recipe.energy,
        });
    }

    let path = require_data_file(dir, "entities")?;
    for entity in deserialize_list::<EntityData>(&path, "entities")? {
        builder.register_entity(resolve_entity(entity, &mut images)?);
    }

    if let Some(path) = find_data_file(dir, "tiles")? {
        for tile in deserialize_list::<TileData>(&path, "tiles")? {
            builder.register_tile(TilePrototype {
                name: tile.name,
                color: tile.color,
            });
        }
    }

    if let Some(path) = find_data_file(dir, "info")? {
        let info: InfoData = deserialize_file(&path)?;
        builder.set_version(&info.version);
    }

    let data = builder.build()?;
    log::info!(
        "loaded game data {} from {}: {} entities, {} items, {} recipes",
        data.version(),
        dir.display(),
        data.entity_count(),
        data.item_count(),
        data.recipes().len()
    );
    Ok(data)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "fbsr_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    fn write_minimal(dir: &Path) {
        fs::write(
            dir.join("items.json"),
            r#"[{"name": "iron-chest"}, {"name": "iron-plate"}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("recipes.ron"),
            r#"[(name: "iron-chest", ingredients: [("iron-plate", 8.0)], results: [("iron-chest", 1.0)])]"#,
        )
        .unwrap();
        fs::write(
            dir.join("entities.toml"),
            "[[entities]]\nname = \"iron-chest\"\ntype = \"container\"\n",
        )
        .unwrap();
    }

    #[test]
    fn detect_formats() {
        assert_eq!(detect_format(Path::new("items.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("items.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("items.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("items.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(detect_format(Path::new("items")).is_err());
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("conflict");
        fs::write(dir.join("items.ron"), "[]").unwrap();
        fs::write(dir.join("items.json"), "[]").unwrap();
        let result = find_data_file(&dir, "items");
        assert!(matches!(result, Err(DataLoadError::ConflictingFormats { .. })));
        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("missing");
        let err = require_data_file(&dir, "entities").unwrap_err();
        assert!(matches!(err, DataLoadError::MissingRequired { ref file, .. } if file == "entities"));
        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_toml_missing_key() {
        let dir = make_test_dir("toml_key");
        let path = dir.join("items.toml");
        fs::write(&path, "[[things]]\nname = \"a\"\n").unwrap();
        let result = deserialize_list::<ItemData>(&path, "items");
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));
        cleanup(&dir);
    }

    #[test]
    fn deserialize_file_parse_error() {
        let dir = make_test_dir("parse");
        let path = dir.join("info.json");
        fs::write(&path, "{ not json").unwrap();
        let result = deserialize_file::<InfoData>(&path);
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));
        cleanup(&dir);
    }

    #[test]
    fn load_mixed_formats() {
        let dir = make_test_dir("mixed");
        write_minimal(&dir);
        fs::write(dir.join("info.json"), r#"{"version": "1.1.110"}"#).unwrap();

        let data = load_game_data(&dir).unwrap();
        assert_eq!(data.version(), "1.1.110");
        let chest = data.entity("iron-chest").unwrap();
        assert_eq!(chest.entity_type, "container");
        let items: Vec<&str> = data
            .items_for_entity("iron-chest")
            .into_iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(items, vec!["iron-chest"]);
        assert_eq!(data.recipe("iron-chest").unwrap().ingredients.len(), 1);
        cleanup(&dir);
    }

    #[test]
    fn load_reports_missing_required() {
        let dir = make_test_dir("required");
        fs::write(dir.join("items.json"), "[]").unwrap();
        let err = load_game_data(&dir).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingRequired { ref file, .. } if file == "recipes"));
        cleanup(&dir);
    }

    #[test]
    fn load_decodes_icons() {
        let dir = make_test_dir("icons");
        write_minimal(&dir);
        let icon = RgbaImage::from_pixel(2, 2, image::Rgba([0, 200, 0, 255]));
        icon.save(dir.join("plate.png")).unwrap();
        fs::write(
            dir.join("items.json"),
            r#"[{"name": "iron-chest"}, {"name": "iron-plate", "icon": "plate.png"}]"#,
        )
        .unwrap();

        let data = load_game_data(&dir).unwrap();
        assert!(data.item("iron-plate").unwrap().icon.is_some());
        let [r, g, b] = data.item_color("iron-plate");
        assert!(g > r && g > b);
        cleanup(&dir);
    }

    #[test]
    fn load_reports_bad_image() {
        let dir = make_test_dir("bad_image");
        write_minimal(&dir);
        fs::write(
            dir.join("items.json"),
            r#"[{"name": "iron-chest", "icon": "nope.png"}, {"name": "iron-plate"}]"#,
        )
        .unwrap();
        assert!(matches!(
            load_game_data(&dir),
            Err(DataLoadError::Image { .. })
        ));
        cleanup(&dir);
    }
}
