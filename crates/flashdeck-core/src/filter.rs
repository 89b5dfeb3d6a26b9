//! Card find filter and options.
//!
//! `CardFilter` holds exact-match conditions on allow-listed card fields;
//! `CardFindOptions` holds the tag-set constraints and pagination. Both are
//! built either programmatically or by validating untrusted input against
//! [`CARD_FIND_FILTER`] / [`CARD_FIND_OPTIONS`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::models::CardId;
use crate::schema::{FieldKind, FieldSpec, FieldValue, Schema};
use crate::tags::normalize_labels;

/// Largest page a single find may request.
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Card fields that may appear in an equality filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CardField {
    CardId,
    Front,
    Back,
    Hint,
}

impl CardField {
    pub const ALL: [CardField; 4] = [
        CardField::CardId,
        CardField::Front,
        CardField::Back,
        CardField::Hint,
    ];

    /// Caller-facing field name.
    pub fn name(self) -> &'static str {
        match self {
            CardField::CardId => "cardId",
            CardField::Front => "front",
            CardField::Back => "back",
            CardField::Hint => "hint",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

const CARD_FILTER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("cardId", FieldKind::Integer),
    FieldSpec::new("front", FieldKind::Text),
    FieldSpec::new("back", FieldKind::Text),
    FieldSpec::new("hint", FieldKind::Text),
];

/// Allowed equality-filter fields for card finds.
pub const CARD_FIND_FILTER: Schema = Schema::new("find filter", CARD_FILTER_FIELDS);

const CARD_FIND_OPTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("tagsAll", FieldKind::TextList),
    FieldSpec::new("tagsNone", FieldKind::TextList),
    FieldSpec::new("limit", FieldKind::PositiveInteger),
    FieldSpec::new("offset", FieldKind::NonNegativeInteger),
];

/// Allowed option fields for card finds.
pub const CARD_FIND_OPTIONS: Schema = Schema::new("find options", CARD_FIND_OPTION_FIELDS);

/// Value compared against a card column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Integer(i64),
    Text(String),
}

/// Exact-match conditions, ANDed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFilter {
    conditions: BTreeMap<CardField, FilterValue>,
}

impl CardFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn card_id(mut self, id: CardId) -> Self {
        self.conditions
            .insert(CardField::CardId, FilterValue::Integer(id));
        self
    }

    pub fn front(mut self, front: impl Into<String>) -> Self {
        self.conditions
            .insert(CardField::Front, FilterValue::Text(front.into()));
        self
    }

    pub fn back(mut self, back: impl Into<String>) -> Self {
        self.conditions
            .insert(CardField::Back, FilterValue::Text(back.into()));
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.conditions
            .insert(CardField::Hint, FilterValue::Text(hint.into()));
        self
    }

    /// Validate untrusted input against [`CARD_FIND_FILTER`].
    pub fn parse(input: &Map<String, Value>) -> Result<Self> {
        let validated = CARD_FIND_FILTER.validate(input)?;
        let mut filter = Self::new();
        for (name, value) in validated {
            // Schema and enum share names, so a miss here is a programming error.
            let field = CardField::from_name(name)
                .ok_or_else(|| Error::Server(format!("unmapped filter field '{}'", name)))?;
            let value = match value {
                FieldValue::Integer(n) => FilterValue::Integer(n),
                FieldValue::Text(s) => FilterValue::Text(s),
                FieldValue::TextList(_) => {
                    return Err(Error::invalid_field(name, "must be a single value"))
                }
            };
            filter.conditions.insert(field, value);
        }
        Ok(filter)
    }

    /// Conditions in a stable (field) order.
    pub fn conditions(&self) -> impl Iterator<Item = (CardField, &FilterValue)> {
        self.conditions.iter().map(|(f, v)| (*f, v))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Tag-set constraints and pagination for a card find.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFindOptions {
    /// Card must carry every one of these labels.
    pub tags_all: Vec<String>,
    /// Card must carry none of these labels.
    pub tags_none: Vec<String>,
    /// Maximum rows; `None` returns every match.
    pub limit: Option<i64>,
    /// Rows to skip after filtering and ordering.
    pub offset: i64,
}

impl CardFindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags_all<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags_all = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags_none<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags_none = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Validate untrusted input against [`CARD_FIND_OPTIONS`].
    pub fn parse(input: &Map<String, Value>) -> Result<Self> {
        let validated = CARD_FIND_OPTIONS.validate(input)?;
        let mut options = Self::new();
        for (name, value) in validated {
            match (name, value) {
                ("tagsAll", FieldValue::TextList(labels)) => options.tags_all = labels,
                ("tagsNone", FieldValue::TextList(labels)) => options.tags_none = labels,
                ("limit", FieldValue::Integer(n)) => options.limit = Some(n),
                ("offset", FieldValue::Integer(n)) => options.offset = n,
                (name, _) => {
                    return Err(Error::Server(format!("unmapped option field '{}'", name)))
                }
            }
        }
        options.validated()
    }

    /// Normalize label sets and check pagination bounds.
    pub fn validated(self) -> Result<Self> {
        if let Some(limit) = self.limit {
            if limit < 1 {
                return Err(Error::invalid_field("limit", "must be a positive integer"));
            }
            if limit > MAX_PAGE_SIZE {
                return Err(Error::invalid_field(
                    "limit",
                    format!("must be at most {}", MAX_PAGE_SIZE),
                ));
            }
        }
        if self.offset < 0 {
            return Err(Error::invalid_field(
                "offset",
                "must be a non-negative integer",
            ));
        }
        Ok(Self {
            tags_all: normalize_labels("tagsAll", &self.tags_all)?,
            tags_none: normalize_labels("tagsNone", &self.tags_none)?,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// Split flat input (e.g. a query string) into (filter, options) maps.
///
/// Keys named by [`CARD_FIND_OPTIONS`] go to options; everything else is
/// treated as a filter field and left for [`CardFilter::parse`] to accept or
/// reject.
pub fn split_find_input(input: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut filter = Map::new();
    let mut options = Map::new();
    for (key, value) in input {
        if CARD_FIND_OPTIONS.accepts(&key) {
            options.insert(key, value);
        } else {
            filter.insert(key, value);
        }
    }
    (filter, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_card_field_names_round_trip() {
        for field in CardField::ALL {
            assert_eq!(CardField::from_name(field.name()), Some(field));
            assert!(CARD_FIND_FILTER.accepts(field.name()));
        }
        assert_eq!(CardField::from_name("card_id"), None);
    }

    #[test]
    fn test_filter_parse_typed_values() {
        let filter = CardFilter::parse(&map(json!({ "cardId": "4", "front": "Q" }))).unwrap();
        let conditions: Vec<_> = filter.conditions().collect();
        assert_eq!(
            conditions,
            vec![
                (CardField::CardId, &FilterValue::Integer(4)),
                (CardField::Front, &FilterValue::Text("Q".to_string())),
            ]
        );
    }

    #[test]
    fn test_filter_parse_rejects_unknown_field() {
        let err = CardFilter::parse(&map(json!({ "card_id": 1 }))).unwrap_err();
        match err {
            Error::Validation { message, errors } => {
                assert_eq!(message, "Unable to validate find filter");
                assert_eq!(errors[0].field, "card_id");
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_builder_matches_parse() {
        let built = CardFilter::new().back("A").card_id(9);
        let parsed = CardFilter::parse(&map(json!({ "back": "A", "cardId": 9 }))).unwrap();
        assert_eq!(built, parsed);
        assert!(!built.is_empty());
        assert!(CardFilter::new().is_empty());
    }

    #[test]
    fn test_options_parse_full() {
        let options = CardFindOptions::parse(&map(json!({
            "tagsAll": "b,a,b",
            "tagsNone": ["x"],
            "limit": "5",
            "offset": "10"
        })))
        .unwrap();
        assert_eq!(options.tags_all, vec!["a", "b"]);
        assert_eq!(options.tags_none, vec!["x"]);
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.offset, 10);
    }

    #[test]
    fn test_options_defaults() {
        let options = CardFindOptions::parse(&Map::new()).unwrap();
        assert_eq!(options, CardFindOptions::default());
        assert_eq!(options.limit, None);
        assert_eq!(options.offset, 0);
    }

    #[test]
    fn test_options_reject_zero_limit() {
        assert!(CardFindOptions::parse(&map(json!({ "limit": 0 }))).is_err());
    }

    #[test]
    fn test_options_reject_oversized_limit() {
        let err = CardFindOptions::new()
            .with_limit(MAX_PAGE_SIZE + 1)
            .validated()
            .unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn test_options_reject_negative_offset() {
        assert!(CardFindOptions::new().with_offset(-1).validated().is_err());
    }

    #[test]
    fn test_options_reject_blank_label() {
        let err = CardFindOptions::new()
            .with_tags_none(["ok", " "])
            .validated()
            .unwrap_err();
        match err {
            Error::Validation { errors, .. } => assert_eq!(errors[0].field, "tagsNone[1]"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_split_find_input() {
        let (filter, options) = split_find_input(map(json!({
            "front": "Q",
            "bogus": 1,
            "tagsAll": "a",
            "limit": "2"
        })));
        assert_eq!(filter.len(), 2);
        assert!(filter.contains_key("front"));
        assert!(filter.contains_key("bogus"));
        assert_eq!(options.len(), 2);
        assert!(options.contains_key("tagsAll"));
        assert!(options.contains_key("limit"));
    }
}
