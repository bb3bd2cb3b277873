//! Stable names of cache slots.
//!
//! Other subsystems rely on these to invalidate precisely, so the formats
//! must not change. The [crate::TtlCache] adds its namespace prefix on top.

use std::fmt::Display;

pub const ENTITY_COUNT: &str = "entity_count";

/// Slot holding one fully assembled entity.
pub fn entity(id: impl Display) -> String {
    format!("entity_{id}")
}

/// Slot holding a single sub-record (round) of an entity.
pub fn round_subset(id: impl Display, round: impl Display) -> String {
    format!("roundsubset_{id}_{round}")
}

pub fn entity_count() -> String {
    ENTITY_COUNT.to_string()
}
