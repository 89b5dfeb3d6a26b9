//! Core traits for flashdeck abstractions.
//!
//! These traits define the interfaces that concrete storage implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::{Error, FieldError, Result};
use crate::filter::{CardFilter, CardFindOptions};
use crate::models::*;
use crate::tags::normalize_labels;

// =============================================================================
// CARD REPOSITORY TRAITS
// =============================================================================

/// Request for creating a new card.
#[derive(Debug, Clone, Default)]
pub struct CreateCardRequest {
    pub front: String,
    pub back: String,
    pub hint: Option<String>,
    /// Tag labels; duplicates collapse.
    pub tags: Vec<String>,
}

impl CreateCardRequest {
    /// Check required fields and return the normalized label set.
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut errors = Vec::new();
        require_text("front", &self.front, &mut errors);
        require_text("back", &self.back, &mut errors);
        if !errors.is_empty() {
            return Err(Error::Validation {
                message: "Unable to validate card".to_string(),
                errors,
            });
        }
        normalize_labels("tags", &self.tags)
    }

    /// Text fields as they will be stored.
    pub fn content(&self) -> CardContent {
        CardContent {
            front: self.front.clone(),
            back: self.back.clone(),
            hint: normalize_hint(self.hint.clone()),
        }
    }
}

/// Partial card update. `None` leaves the stored value in place.
#[derive(Debug, Clone, Default)]
pub struct UpdateCardRequest {
    pub front: Option<String>,
    pub back: Option<String>,
    /// `Some(None)` clears the hint.
    pub hint: Option<Option<String>>,
    /// Replacement tag set; `None` leaves tags untouched.
    pub tags: Option<Vec<String>>,
}

impl UpdateCardRequest {
    /// Check supplied fields and return the normalized replacement labels.
    pub fn validate(&self) -> Result<Option<Vec<String>>> {
        let mut errors = Vec::new();
        if let Some(front) = &self.front {
            require_text("front", front, &mut errors);
        }
        if let Some(back) = &self.back {
            require_text("back", back, &mut errors);
        }
        if !errors.is_empty() {
            return Err(Error::Validation {
                message: "Unable to validate card update".to_string(),
                errors,
            });
        }
        self.tags
            .as_ref()
            .map(|tags| normalize_labels("tags", tags))
            .transpose()
    }

    /// Overlay the supplied fields on `current`.
    pub fn merge(&self, current: CardContent) -> CardContent {
        CardContent {
            front: self.front.clone().unwrap_or(current.front),
            back: self.back.clone().unwrap_or(current.back),
            hint: match &self.hint {
                Some(hint) => normalize_hint(hint.clone()),
                None => current.hint,
            },
        }
    }
}

fn require_text(field: &str, value: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "is required"));
    }
}

fn normalize_hint(hint: Option<String>) -> Option<String> {
    hint.filter(|h| !h.trim().is_empty())
}

/// Repository for card CRUD and lookup.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Insert a card and its tags in one transaction.
    async fn insert(&self, req: CreateCardRequest) -> Result<Card>;

    /// Fetch one card with its tags.
    async fn fetch(&self, id: CardId) -> Result<Card>;

    /// Find cards matching `filter` and `options`, ordered by id.
    async fn find(&self, filter: &CardFilter, options: &CardFindOptions) -> Result<Vec<Card>>;

    /// Apply a partial update (fields and optionally tags) in one transaction.
    async fn update(&self, id: CardId, req: UpdateCardRequest) -> Result<Card>;

    /// Delete a card. Returns the number of rows removed.
    async fn delete(&self, id: CardId) -> Result<u64>;
}

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Repository for tags and card-tag associations.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// List all tags with usage counts, ordered by label.
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Look up one tag by exact label.
    async fn get_by_label(&self, label: &str) -> Result<Option<Tag>>;

    /// Labels on a card, sorted.
    async fn get_for_card(&self, card_id: CardId) -> Result<Vec<String>>;

    /// Replace a card's tag set (reconcile), leaving its fields untouched.
    async fn set_for_card(&self, card_id: CardId, tags: Vec<String>) -> Result<TagSyncSummary>;
}

// =============================================================================
// CATEGORY REPOSITORY TRAITS
// =============================================================================

/// Request for creating a category.
#[derive(Debug, Clone, Default)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub tags: Vec<String>,
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut errors = Vec::new();
        require_text("name", &self.name, &mut errors);
        if !errors.is_empty() {
            return Err(Error::Validation {
                message: "Unable to validate category".to_string(),
                errors,
            });
        }
        normalize_labels("tags", &self.tags)
    }
}

/// Partial category update.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateCategoryRequest {
    pub fn validate(&self) -> Result<Option<Vec<String>>> {
        if let Some(name) = &self.name {
            let mut errors = Vec::new();
            require_text("name", name, &mut errors);
            if !errors.is_empty() {
                return Err(Error::Validation {
                    message: "Unable to validate category update".to_string(),
                    errors,
                });
            }
        }
        self.tags
            .as_ref()
            .map(|tags| normalize_labels("tags", tags))
            .transpose()
    }
}

/// Repository for flat categories (named tag sets).
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, req: CreateCategoryRequest) -> Result<Category>;

    async fn get(&self, id: CategoryId) -> Result<Category>;

    /// All categories ordered by name.
    async fn list(&self) -> Result<Vec<Category>>;

    async fn update(&self, id: CategoryId, req: UpdateCategoryRequest) -> Result<Category>;

    /// Delete a category. Returns the number of rows removed.
    async fn delete(&self, id: CategoryId) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> CardContent {
        CardContent {
            front: "Q".to_string(),
            back: "A".to_string(),
            hint: Some("think".to_string()),
        }
    }

    #[test]
    fn test_create_card_validate_normalizes_tags() {
        let req = CreateCardRequest {
            front: "Q".to_string(),
            back: "A".to_string(),
            hint: None,
            tags: vec!["math".to_string(), " math ".to_string(), "algebra".to_string()],
        };
        assert_eq!(req.validate().unwrap(), vec!["algebra", "math"]);
    }

    #[test]
    fn test_create_card_requires_front_and_back() {
        let req = CreateCardRequest {
            front: "  ".to_string(),
            back: String::new(),
            ..Default::default()
        };
        match req.validate().unwrap_err() {
            Error::Validation { errors, .. } => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["front", "back"]);
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_create_card_blank_hint_stored_as_none() {
        let req = CreateCardRequest {
            front: "Q".to_string(),
            back: "A".to_string(),
            hint: Some("   ".to_string()),
            tags: vec![],
        };
        assert_eq!(req.content().hint, None);
    }

    #[test]
    fn test_update_merge_keeps_unset_fields() {
        let req = UpdateCardRequest {
            back: Some("B".to_string()),
            ..Default::default()
        };
        let merged = req.merge(content());
        assert_eq!(merged.front, "Q");
        assert_eq!(merged.back, "B");
        assert_eq!(merged.hint.as_deref(), Some("think"));
    }

    #[test]
    fn test_update_merge_clears_hint() {
        let req = UpdateCardRequest {
            hint: Some(None),
            ..Default::default()
        };
        assert_eq!(req.merge(content()).hint, None);
    }

    #[test]
    fn test_update_validate_rejects_blank_front() {
        let req = UpdateCardRequest {
            front: Some(String::new()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_validate_without_tags() {
        let req = UpdateCardRequest::default();
        assert_eq!(req.validate().unwrap(), None);
    }

    #[test]
    fn test_update_validate_empty_tags_means_clear() {
        let req = UpdateCardRequest {
            tags: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(req.validate().unwrap(), Some(vec![]));
    }

    #[test]
    fn test_category_requires_name() {
        let req = CreateCategoryRequest {
            name: " ".to_string(),
            tags: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_category_update_validates_tags() {
        let req = UpdateCategoryRequest {
            name: None,
            tags: Some(vec!["".to_string()]),
        };
        assert!(req.validate().is_err());
    }
}
