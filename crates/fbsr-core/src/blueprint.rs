//! Decoded blueprint input: placed entities and tiles, with the version
//! information that selects coordinate conventions.
//!
//! The compressed string container is decoded elsewhere; this module starts
//! from the JSON document it contains.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::{Direction, Position};
use crate::id::EntityNumber;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while reading a decoded blueprint document.
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    #[error("missing field '{field}' in {context}")]
    MissingField {
        field: &'static str,
        context: &'static str,
    },
    #[error("invalid field '{field}' in {context}: {detail}")]
    InvalidField {
        field: &'static str,
        context: &'static str,
        detail: String,
    },
    #[error("no blueprints found in document")]
    NoBlueprints,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// MapVersion
// ---------------------------------------------------------------------------

/// Game version a blueprint was saved with, packed as four 16-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct MapVersion(pub u64);

impl MapVersion {
    pub const fn new(major: u16, minor: u16, patch: u16, developer: u16) -> Self {
        Self(((major as u64) << 48) | ((minor as u64) << 32) | ((patch as u64) << 16) | developer as u64)
    }

    pub fn major(&self) -> u16 {
        (self.0 >> 48) as u16
    }

    pub fn minor(&self) -> u16 {
        (self.0 >> 32) as u16
    }

    pub fn patch(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub fn developer(&self) -> u16 {
        self.0 as u16
    }
}

impl fmt::Display for MapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major(),
            self.minor(),
            self.patch(),
            self.developer()
        )
    }
}

/// First version using sixteen-way directions and the renamed prototypes.
pub const VERSION_NEW_FORMAT: MapVersion = MapVersion::new(2, 0, 0, 0);

/// First version whose entity coordinates are already grid aligned.
pub const VERSION_ALIGNED_ENTITIES: MapVersion = MapVersion::new(0, 18, 37, 3);

// ---------------------------------------------------------------------------
// Entities and tiles
// ---------------------------------------------------------------------------

/// New-format prototype names mapped back to the names the renderer knows.
const LEGACY_NAMES: &[(&str, &str)] = &[
    ("legacy-curved-rail", "curved-rail"),
    ("legacy-straight-rail", "straight-rail"),
    ("active-provider-chest", "logistic-chest-active-provider"),
    ("passive-provider-chest", "logistic-chest-passive-provider"),
    ("storage-chest", "logistic-chest-storage"),
    ("buffer-chest", "logistic-chest-buffer"),
    ("requester-chest", "logistic-chest-requester"),
    ("bulk-inserter", "stack-inserter"),
];

fn legacy_name(name: &str) -> String {
    LEGACY_NAMES
        .iter()
        .find(|(new, _)| *new == name)
        .map(|(_, old)| old.to_string())
        .unwrap_or_else(|| name.to_string())
}

fn parse_position(value: &Value, context: &'static str) -> Result<Position, BlueprintError> {
    let pos = value.get("position").ok_or(BlueprintError::MissingField {
        field: "position",
        context,
    })?;
    let coord = |axis: &'static str| {
        pos.get(axis)
            .and_then(Value::as_f64)
            .ok_or(BlueprintError::InvalidField {
                field: "position",
                context,
                detail: format!("missing numeric '{axis}'"),
            })
    };
    Ok(Position::new(coord("x")?, coord("y")?))
}

fn parse_name(value: &Value, context: &'static str) -> Result<String, BlueprintError> {
    value
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(BlueprintError::MissingField {
            field: "name",
            context,
        })
}

/// A placed entity.
#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintEntity {
    pub id: EntityNumber,
    pub name: String,
    pub position: Position,
    pub direction: Direction,
    pub new_format: bool,
    raw: Value,
}

impl BlueprintEntity {
    /// Build an entity directly, e.g. for fixtures. `raw` holds the
    /// type-specific fields.
    pub fn new(id: u32, name: &str, position: Position, direction: Direction, raw: Value) -> Self {
        Self {
            id: EntityNumber(id),
            name: name.to_string(),
            position,
            direction,
            new_format: false,
            raw,
        }
    }

    pub fn from_json(value: &Value, version: MapVersion) -> Result<Self, BlueprintError> {
        let id = value
            .get("entity_number")
            .and_then(Value::as_u64)
            .ok_or(BlueprintError::MissingField {
                field: "entity_number",
                context: "entity",
            })?;
        let new_format = version >= VERSION_NEW_FORMAT;
        let direction = value.get("direction").and_then(Value::as_i64).unwrap_or(0);
        Ok(Self {
            id: EntityNumber(id as u32),
            name: legacy_name(&parse_name(value, "entity")?),
            position: parse_position(value, "entity")?,
            direction: Direction::from_entity_value(direction, new_format),
            new_format,
            raw: value.clone(),
        })
    }

    /// The entity's full JSON object.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }

    /// Items requested into the entity (modules, fuel), summed by name.
    /// Accepts both the legacy `{name: count}` object and the new list of
    /// `{id: {name}, items: {in_inventory: [...]}}` records.
    pub fn item_requests(&self) -> BTreeMap<String, u32> {
        let mut ret = BTreeMap::new();
        match self.raw.get("items") {
            Some(Value::Object(map)) => {
                for (name, count) in map {
                    let count = count.as_u64().unwrap_or(0) as u32;
                    *ret.entry(name.clone()).or_insert(0) += count;
                }
            }
            Some(Value::Array(list)) => {
                for entry in list {
                    let Some(name) = entry.pointer("/id/name").and_then(Value::as_str) else {
                        continue;
                    };
                    let count = entry
                        .pointer("/items/in_inventory")
                        .and_then(Value::as_array)
                        .map_or(1, |slots| slots.len()) as u32;
                    *ret.entry(name.to_string()).or_insert(0) += count;
                }
            }
            _ => {}
        }
        ret
    }
}

/// A placed ground tile.
#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintTile {
    pub name: String,
    pub position: Position,
}

impl BlueprintTile {
    pub fn new(name: &str, position: Position) -> Self {
        Self {
            name: name.to_string(),
            position,
        }
    }

    pub fn from_json(value: &Value) -> Result<Self, BlueprintError> {
        Ok(Self {
            name: parse_name(value, "tile")?,
            position: parse_position(value, "tile")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Wires
// ---------------------------------------------------------------------------

/// Circuit wire color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WireColor {
    Red,
    Green,
}

/// A circuit wire between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Wire {
    pub a: EntityNumber,
    pub b: EntityNumber,
    pub color: WireColor,
}

fn legacy_wires(entities: &[Value]) -> Vec<Wire> {
    let mut wires = Vec::new();
    for entity in entities {
        let Some(id) = entity.get("entity_number").and_then(Value::as_u64) else {
            continue;
        };
        let Some(Value::Object(points)) = entity.get("connections") else {
            continue;
        };
        for point in points.values() {
            for (key, color) in [("red", WireColor::Red), ("green", WireColor::Green)] {
                let Some(list) = point.get(key).and_then(Value::as_array) else {
                    continue;
                };
                for target in list {
                    if let Some(other) = target.get("entity_id").and_then(Value::as_u64) {
                        wires.push(Wire {
                            a: EntityNumber(id as u32),
                            b: EntityNumber(other as u32),
                            color,
                        });
                    }
                }
            }
        }
    }
    wires
}

fn new_format_wires(list: &[Value]) -> Vec<Wire> {
    list.iter()
        .filter_map(|wire| {
            let parts = wire.as_array()?;
            let a = parts.first()?.as_u64()?;
            let connector = parts.get(1)?.as_u64()?;
            let b = parts.get(2)?.as_u64()?;
            let color = match connector {
                1 | 3 => WireColor::Red,
                2 | 4 => WireColor::Green,
                _ => return None,
            };
            Some(Wire {
                a: EntityNumber(a as u32),
                b: EntityNumber(b as u32),
                color,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Blueprint
// ---------------------------------------------------------------------------

/// A single blueprint: the unit that is rendered into one image.
#[derive(Debug, Clone, Default)]
pub struct Blueprint {
    pub label: Option<String>,
    pub version: MapVersion,
    pub entities: Vec<BlueprintEntity>,
    pub tiles: Vec<BlueprintTile>,
    pub wires: Vec<Wire>,
}

impl Blueprint {
    /// Parse the object found under a `blueprint` key.
    pub fn from_json(value: &Value) -> Result<Self, BlueprintError> {
        let label = value.get("label").and_then(Value::as_str).map(str::to_string);
        let version = MapVersion(value.get("version").and_then(Value::as_u64).unwrap_or(0));
        let empty = Vec::new();
        let entity_values = value
            .get("entities")
            .and_then(Value::as_array)
            .unwrap_or(&empty);
        let entities = entity_values
            .iter()
            .map(|e| BlueprintEntity::from_json(e, version))
            .collect::<Result<Vec<_>, _>>()?;
        let tiles = value
            .get("tiles")
            .and_then(Value::as_array)
            .unwrap_or(&empty)
            .iter()
            .map(BlueprintTile::from_json)
            .collect::<Result<Vec<_>, _>>()?;
        let mut wires: Vec<Wire> = match value.get("wires").and_then(Value::as_array) {
            Some(list) => new_format_wires(list),
            None => legacy_wires(entity_values),
        }
        .into_iter()
        .map(|w| Wire {
            a: w.a.min(w.b),
            b: w.a.max(w.b),
            color: w.color,
        })
        .collect();
        // Legacy documents list each wire on both ends.
        wires.sort();
        wires.dedup();
        Ok(Self {
            label,
            version,
            entities,
            tiles,
            wires,
        })
    }

    pub fn is_new_format(&self) -> bool {
        self.version >= VERSION_NEW_FORMAT
    }
}

/// Every blueprint in a decoded document, with the label and version of
/// the outermost blueprint or book.
#[derive(Debug, Clone)]
pub struct BlueprintCollection {
    pub label: Option<String>,
    pub version: MapVersion,
    pub blueprints: Vec<Blueprint>,
}

impl BlueprintCollection {
    /// Walk a document breadth-first, flattening nested books.
    pub fn from_json(document: &Value) -> Result<Self, BlueprintError> {
        let mut blueprints = Vec::new();
        let mut first: Option<(Option<String>, MapVersion)> = None;

        let mut work = VecDeque::new();
        work.push_back(document);
        while let Some(json) = work.pop_front() {
            if let Some(bp) = json.get("blueprint") {
                let blueprint = Blueprint::from_json(bp)?;
                first.get_or_insert_with(|| (blueprint.label.clone(), blueprint.version));
                blueprints.push(blueprint);
            } else if let Some(book) = json.get("blueprint_book") {
                if let Some(children) = book.get("blueprints").and_then(Value::as_array) {
                    work.extend(children.iter());
                }
                first.get_or_insert_with(|| {
                    (
                        book.get("label").and_then(Value::as_str).map(str::to_string),
                        MapVersion(book.get("version").and_then(Value::as_u64).unwrap_or(0)),
                    )
                });
            }
        }

        if blueprints.is_empty() {
            return Err(BlueprintError::NoBlueprints);
        }
        let (label, version) = first.unwrap_or_default();
        Ok(Self {
            label,
            version,
            blueprints,
        })
    }

    pub fn parse(json: &str) -> Result<Self, BlueprintError> {
        let document: Value = serde_json::from_str(json)?;
        Self::from_json(&document)
    }

    pub fn is_book(&self) -> bool {
        self.blueprints.len() > 1
    }
}
