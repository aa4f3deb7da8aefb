use slotmap::new_key_type;

new_key_type! {
    /// Identifies one directed member of a rail edge pair in the world map arena.
    pub struct RailEdgeId;
}

/// Identifies a placed entity by its blueprint `entity_number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct EntityNumber(pub u32);
