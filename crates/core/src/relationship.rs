//! Relationship records - the unit of an import payload

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::serde_ext::{date_format, empty_as_none};

/// Which kind of entity one end of a relationship points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    TrackedEntityInstance,
    Enrollment,
    Event,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::TrackedEntityInstance => write!(f, "trackedEntityInstance"),
            ItemKind::Enrollment => write!(f, "enrollment"),
            ItemKind::Event => write!(f, "event"),
        }
    }
}

/// One end of a relationship
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelationshipItem {
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub tracked_entity_instance: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub enrollment: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl RelationshipItem {
    pub fn tracked_entity_instance(uid: impl Into<String>) -> Self {
        Self {
            tracked_entity_instance: Some(uid.into()),
            ..Self::default()
        }
    }

    pub fn enrollment(uid: impl Into<String>) -> Self {
        Self {
            enrollment: Some(uid.into()),
            ..Self::default()
        }
    }

    pub fn event(uid: impl Into<String>) -> Self {
        Self {
            event: Some(uid.into()),
            ..Self::default()
        }
    }

    /// All references this item carries, in a fixed order
    pub fn references(&self) -> Vec<(ItemKind, &str)> {
        [
            (ItemKind::TrackedEntityInstance, self.tracked_entity_instance.as_deref()),
            (ItemKind::Enrollment, self.enrollment.as_deref()),
            (ItemKind::Event, self.event.as_deref()),
        ]
        .into_iter()
        .filter_map(|(kind, uid)| uid.map(|uid| (kind, uid)))
        .collect()
    }

    /// The single entity this item points at, if it points at exactly one
    pub fn reference(&self) -> Option<(ItemKind, &str)> {
        match self.references().as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

/// A relationship record as submitted for import
///
/// Field names follow the wire contract (`relationshipType`, `lastUpdated`, ...)
/// in both JSON and XML. Fields outside this list are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Relationship {
    /// Identifier; absent for records the server should assign one to
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub relationship_name: Option<String>,

    /// Missing decodes to `false`; an explicit null is rejected
    #[serde(default)]
    pub bidirectional: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<RelationshipItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<RelationshipItem>,

    #[serde(default, with = "date_format", skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDateTime>,

    #[serde(default, with = "date_format", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDateTime>,
}

impl Relationship {
    /// Create a new relationship of the given type
    pub fn new(relationship_type: impl Into<String>) -> Self {
        Self {
            relationship_type: Some(relationship_type.into()),
            ..Self::default()
        }
    }

    /// Builder: set identifier
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.set_uid(uid);
        self
    }

    /// Builder: set both ends
    pub fn between(mut self, from: RelationshipItem, to: RelationshipItem) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Builder: mark as bidirectional
    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }

    /// Identifier, treating an empty string as absent
    pub fn uid(&self) -> Option<&str> {
        self.relationship.as_deref().filter(|s| !s.is_empty())
    }

    pub fn has_uid(&self) -> bool {
        self.uid().is_some()
    }

    /// Overwrite the identifier; an empty string clears it
    pub fn set_uid(&mut self, uid: impl Into<String>) {
        let uid = uid.into();
        self.relationship = if uid.is_empty() { None } else { Some(uid) };
    }
}
