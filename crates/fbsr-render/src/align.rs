//! Grid alignment of placed objects before population.
//!
//! Blueprints older than 0.18.37.3 stored entity positions with an
//! inconsistent half-tile offset. A majority vote over entity footprints
//! decides whether every entity shifts by half a tile on each axis. Tile
//! positions are corner-based in every version and always move to their
//! centres.

use fbsr_core::blueprint::{BlueprintEntity, BlueprintTile, MapVersion, VERSION_ALIGNED_ENTITIES};
use fbsr_core::geometry::Bounds;
use fbsr_data::GameData;

/// Axes the legacy vote decided to shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shift {
    pub x: bool,
    pub y: bool,
}

/// Nearest integer, halves rounding up.
fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Whether a footprint centred at doubled coordinate `center` with doubled
/// extent `size` sits on the grid: odd tile counts centre on odd half-tiles.
fn on_grid(center: i64, size: i64) -> bool {
    ((size / 2) % 2 == 0) == (center % 2 == 0)
}

/// Majority vote over entity footprints. Any rail in the blueprint
/// disables the shift.
pub fn legacy_entity_shift(entities: &[BlueprintEntity], data: &GameData) -> Shift {
    let (mut x_aligned, mut x_misaligned) = (0usize, 0usize);
    let (mut y_aligned, mut y_misaligned) = (0usize, 0usize);
    for entity in entities {
        if entity.name == "straight-rail" || entity.name == "curved-rail" {
            return Shift::default();
        }
        let selection = data.entity(&entity.name).map(|p| p.selection_box).unwrap_or_default();
        let bounds: Bounds = entity.direction.rotate_bounds(selection).translated(entity.position);
        let center = bounds.center();
        let (cx, cy) = (round_half_up(center.x * 2.0), round_half_up(center.y * 2.0));
        let (w, h) = (round_half_up(bounds.width * 2.0), round_half_up(bounds.height * 2.0));

        if on_grid(cx, w) {
            x_aligned += 1;
        } else {
            x_misaligned += 1;
        }
        if on_grid(cy, h) {
            y_aligned += 1;
        } else {
            y_misaligned += 1;
        }
    }
    Shift {
        x: x_aligned < x_misaligned,
        y: y_aligned < y_misaligned,
    }
}

/// Align entities and tiles in place for a blueprint saved at `version`.
/// Returns the entity shift applied.
pub fn align_to_grid(
    entities: &mut [BlueprintEntity],
    tiles: &mut [BlueprintTile],
    version: MapVersion,
    data: &GameData,
) -> Shift {
    let shift = if version >= VERSION_ALIGNED_ENTITIES {
        Shift::default()
    } else {
        legacy_entity_shift(entities, data)
    };
    if shift.x || shift.y {
        log::debug!("shifting entities by half a tile: {shift:?}");
        for entity in entities.iter_mut() {
            if shift.x {
                entity.position.x += 0.5;
            }
            if shift.y {
                entity.position.y += 0.5;
            }
        }
    }
    for tile in tiles.iter_mut() {
        tile.position.x += 0.5;
        tile.position.y += 0.5;
    }
    shift
}

#[cfg(test)]
mod tests {
    use fbsr_core::geometry::{Direction, Position};
    use fbsr_core::test_utils::{entity, tile};
    use fbsr_data::{EntityPrototype, GameDataBuilder};

    use super::*;

    const LEGACY: MapVersion = MapVersion::new(0, 17, 0, 0);

    fn data() -> GameData {
        let mut builder = GameDataBuilder::new();
        builder
            .register_entity(EntityPrototype::new("iron-chest", "container", Bounds::new(-0.35, -0.35, 0.7, 0.7)))
            .register_entity(EntityPrototype::new(
                "assembling-machine-1",
                "assembling-machine",
                Bounds::new(-1.4, -1.4, 2.8, 2.8),
            ))
            .register_entity(EntityPrototype::new("straight-rail", "straight-rail", Bounds::new(-1.7, -0.8, 3.4, 1.6)));
        builder.build().unwrap()
    }

    #[test]
    fn misaligned_majority_shifts() {
        let mut entities = vec![
            entity(1, "iron-chest", 0.5, 0.5, Direction::North),
            entity(2, "iron-chest", 1.5, 0.5, Direction::North),
            entity(3, "iron-chest", 2.0, 0.0, Direction::North),
        ];
        let mut tiles = vec![tile("concrete", 0.0, 0.0)];
        let shift = align_to_grid(&mut entities, &mut tiles, LEGACY, &data());
        assert_eq!(shift, Shift { x: true, y: true });
        assert_eq!(entities[0].position, Position::new(1.0, 1.0));
        assert_eq!(entities[2].position, Position::new(2.5, 0.5));
        assert_eq!(tiles[0].position, Position::new(0.5, 0.5));
    }

    #[test]
    fn ties_do_not_shift() {
        let entities = vec![
            entity(1, "iron-chest", 0.0, 0.5, Direction::North),
            entity(2, "iron-chest", 1.5, 0.0, Direction::North),
        ];
        assert_eq!(legacy_entity_shift(&entities, &data()), Shift::default());
    }

    #[test]
    fn odd_footprints_centre_on_tiles() {
        let entities = vec![entity(1, "assembling-machine-1", 1.5, 1.5, Direction::East)];
        assert_eq!(legacy_entity_shift(&entities, &data()), Shift::default());
        let entities = vec![entity(1, "assembling-machine-1", 1.0, 1.5, Direction::North)];
        assert_eq!(legacy_entity_shift(&entities, &data()), Shift { x: true, y: false });
    }

    #[test]
    fn rails_disable_entity_shift() {
        let mut entities = vec![
            entity(1, "iron-chest", 0.0, 0.0, Direction::North),
            entity(2, "straight-rail", 1.0, 1.0, Direction::North),
        ];
        let mut tiles = Vec::new();
        assert_eq!(align_to_grid(&mut entities, &mut tiles, LEGACY, &data()), Shift::default());
        assert_eq!(entities[0].position, Position::new(0.0, 0.0));
    }

    #[test]
    fn aligned_versions_only_move_tiles() {
        let mut entities = vec![entity(1, "iron-chest", 0.0, 0.0, Direction::North)];
        let mut tiles = vec![tile("concrete", 2.0, 3.0)];
        let shift = align_to_grid(&mut entities, &mut tiles, VERSION_ALIGNED_ENTITIES, &data());
        assert_eq!(shift, Shift::default());
        assert_eq!(entities[0].position, Position::new(0.0, 0.0));
        assert_eq!(tiles[0].position, Position::new(2.5, 3.5));
    }
}
