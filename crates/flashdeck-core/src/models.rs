//! Core data models for flashdeck.
//!
//! These are plain values: persistence lives in the repositories that
//! produce and consume them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage-assigned card identity.
pub type CardId = i64;

/// Storage-assigned tag identity.
pub type TagId = i64;

/// Storage-assigned category identity.
pub type CategoryId = i64;

// =============================================================================
// CARD TYPES
// =============================================================================

/// A tag as it appears on a card or category: the label only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagLabel {
    pub tag: String,
}

impl TagLabel {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl From<String> for TagLabel {
    fn from(tag: String) -> Self {
        Self { tag }
    }
}

/// A persisted flashcard.
///
/// `tags` is semantically a set; repositories return it sorted by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub card_id: CardId,
    pub front: String,
    pub back: String,
    pub hint: Option<String>,
    pub tags: Vec<TagLabel>,
}

impl Card {
    /// Whether the card carries the given label.
    pub fn has_tag(&self, label: &str) -> bool {
        self.tags.iter().any(|t| t.tag == label)
    }

    /// Labels in the card's tag order.
    pub fn labels(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.tag.as_str()).collect()
    }
}

/// Editable text fields of a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardContent {
    pub front: String,
    pub back: String,
    pub hint: Option<String>,
}

// =============================================================================
// TAG TYPES
// =============================================================================

/// A tag row with usage count, as returned by tag listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub tag_id: TagId,
    pub tag: String,
    pub created_at_utc: DateTime<Utc>,
    /// Number of cards with this tag (computed)
    #[serde(default)]
    pub card_count: i64,
}

/// What one reconciliation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSyncSummary {
    /// Tag rows that did not exist before.
    pub tags_created: u64,
    /// Associations inserted.
    pub links_added: u64,
    /// Associations removed because their tag left the target set.
    pub links_removed: u64,
}

// =============================================================================
// CATEGORY TYPES
// =============================================================================

/// A named tag set. Its cards are the cards carrying all of its tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
    pub tags: Vec<TagLabel>,
}

impl Category {
    pub fn labels(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.tag.clone()).collect()
    }
}
