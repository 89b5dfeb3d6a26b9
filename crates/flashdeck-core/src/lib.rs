//! # flashdeck-core
//!
//! Core types, traits, and abstractions for the flashdeck flashcard service.
//!
//! This crate provides the data structures, the error taxonomy, input
//! validation, and repository trait definitions that the storage and API
//! crates depend on. It performs no I/O.

pub mod error;
pub mod filter;
pub mod models;
pub mod schema;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, FieldError, Result};
pub use filter::{
    split_find_input, CardField, CardFilter, CardFindOptions, FilterValue, CARD_FIND_FILTER,
    CARD_FIND_OPTIONS, MAX_PAGE_SIZE,
};
pub use models::*;
pub use schema::{FieldKind, FieldSpec, FieldValue, Schema, Validated};
pub use tags::{normalize_labels, validate_tag_label, MAX_TAG_LENGTH};
pub use traits::*;
