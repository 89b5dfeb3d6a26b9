//! Tag label rules.
//!
//! Labels are compared exactly (case preserved) after trimming surrounding
//! whitespace. A label set is always handled deduplicated and sorted so that
//! every writer touches tag rows in the same order.

use std::collections::BTreeSet;

use crate::error::{Error, FieldError, Result};

/// Longest accepted tag label, in characters.
pub const MAX_TAG_LENGTH: usize = 100;

/// Validate a single tag label and return its trimmed form.
///
/// Rules:
/// - Not empty after trimming
/// - At most [`MAX_TAG_LENGTH`] characters
/// - No control characters
/// - No commas, since query strings use them to separate labels
pub fn validate_tag_label(label: &str) -> std::result::Result<String, String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err("Tag cannot be empty".to_string());
    }
    if trimmed.chars().count() > MAX_TAG_LENGTH {
        return Err(format!(
            "Tag must be {} characters or less",
            MAX_TAG_LENGTH
        ));
    }
    if trimmed.chars().any(char::is_control) {
        return Err("Tag cannot contain control characters".to_string());
    }
    if trimmed.contains(',') {
        return Err("Tag cannot contain commas".to_string());
    }
    Ok(trimmed.to_string())
}

/// Validate, trim and deduplicate a list of labels.
///
/// Failures are reported per element as `<field>[<index>]`, all at once.
/// The returned labels are sorted.
pub fn normalize_labels<I, S>(field: &str, labels: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut unique = BTreeSet::new();
    let mut errors = Vec::new();

    for (idx, label) in labels.into_iter().enumerate() {
        match validate_tag_label(label.as_ref()) {
            Ok(valid) => {
                unique.insert(valid);
            }
            Err(msg) => errors.push(FieldError::new(format!("{}[{}]", field, idx), msg)),
        }
    }

    if !errors.is_empty() {
        return Err(Error::Validation {
            message: format!("Unable to validate {}", field),
            errors,
        });
    }

    Ok(unique.into_iter().collect())
}
