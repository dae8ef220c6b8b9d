//! Record kinds and their relationships.
//!
//! DESIGN
//! ======
//! Three records: `Game`, `Location`, and the join record `GameLocation`
//! that links them many-to-many. Relationship metadata lives here so the
//! selection-set projector can walk `game.locations[].location` without
//! knowing anything about the concrete types.
//!
//! Serialized field names are camelCase to match the data API wire shape
//! (`gameId`, `createdAt`, ...).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// RECORDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Join record. Nothing guarantees `game_id` or `location_id` still point at
/// a live record; deletes do not cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GameLocation {
    pub id: Uuid,
    pub game_id: Uuid,
    pub location_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

// =============================================================================
// CREATE INPUTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGame {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLocation {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGameLocation {
    pub game_id: Uuid,
    pub location_id: Uuid,
}

// =============================================================================
// KINDS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    Game,
    Location,
    GameLocation,
}

/// How a relationship field resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Array of join records whose foreign key equals this record's id.
    HasMany { target: ModelKind, foreign_key: &'static str },
    /// Single record (or `null`) whose id equals this record's foreign key.
    BelongsTo { target: ModelKind, foreign_key: &'static str },
}

impl Relation {
    #[must_use]
    pub fn target(self) -> ModelKind {
        match self {
            Self::HasMany { target, .. } | Self::BelongsTo { target, .. } => target,
        }
    }
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Game, ModelKind::Location, ModelKind::GameLocation];

    /// Model name as used on the wire (`"Game"`, `"GameLocation"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Game => "Game",
            Self::Location => "Location",
            Self::GameLocation => "GameLocation",
        }
    }

    #[must_use]
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw {
            "Game" => Some(Self::Game),
            "Location" => Some(Self::Location),
            "GameLocation" => Some(Self::GameLocation),
            _ => None,
        }
    }

    /// Frame syscall prefix for mutations of this kind (`game:create`).
    #[must_use]
    pub fn syscall_prefix(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Location => "location",
            Self::GameLocation => "gamelocation",
        }
    }

    #[must_use]
    pub fn from_syscall_prefix(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.syscall_prefix() == raw)
    }

    /// Scalar fields in declaration order. `*` in a selection set expands to these.
    #[must_use]
    pub fn scalar_fields(self) -> &'static [&'static str] {
        match self {
            Self::Game => &["id", "name", "description", "createdAt", "updatedAt"],
            Self::Location => &["id", "name", "createdAt", "updatedAt"],
            Self::GameLocation => &["id", "gameId", "locationId", "createdAt", "updatedAt"],
        }
    }

    #[must_use]
    pub fn relation(self, field: &str) -> Option<Relation> {
        match (self, field) {
            (Self::Game, "locations") => {
                Some(Relation::HasMany { target: Self::GameLocation, foreign_key: "gameId" })
            }
            (Self::Location, "games") => {
                Some(Relation::HasMany { target: Self::GameLocation, foreign_key: "locationId" })
            }
            (Self::GameLocation, "game") => Some(Relation::BelongsTo { target: Self::Game, foreign_key: "gameId" }),
            (Self::GameLocation, "location") => {
                Some(Relation::BelongsTo { target: Self::Location, foreign_key: "locationId" })
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn has_scalar(self, field: &str) -> bool {
        self.scalar_fields().contains(&field)
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(ModelKind::from_name(kind.as_str()), Some(kind));
            assert_eq!(ModelKind::from_syscall_prefix(kind.syscall_prefix()), Some(kind));
        }
        assert_eq!(ModelKind::from_name("Event"), None);
        assert_eq!(ModelKind::from_syscall_prefix("event"), None);
    }

    #[test]
    fn relations_point_through_join_record() {
        assert_eq!(ModelKind::Game.relation("locations").map(Relation::target), Some(ModelKind::GameLocation));
        assert_eq!(ModelKind::Location.relation("games").map(Relation::target), Some(ModelKind::GameLocation));
        assert_eq!(ModelKind::GameLocation.relation("game").map(Relation::target), Some(ModelKind::Game));
        assert_eq!(ModelKind::GameLocation.relation("location").map(Relation::target), Some(ModelKind::Location));
        assert_eq!(ModelKind::Game.relation("name"), None);
    }

    #[test]
    fn game_serializes_camel_case() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let gl = GameLocation { id: Uuid::nil(), game_id: Uuid::nil(), location_id: Uuid::nil(), created_at: now, updated_at: now };
        let value = serde_json::to_value(&gl).unwrap();
        assert!(value.get("gameId").is_some());
        assert!(value.get("locationId").is_some());
        assert_eq!(value.get("createdAt").and_then(|v| v.as_str()), Some("1970-01-01T00:00:00Z"));
    }
}
