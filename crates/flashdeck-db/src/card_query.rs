//! SQL generation for card finds.
//!
//! Equality conditions map through a static column table, so caller input
//! never reaches the SQL text: values are always bound parameters.
//!
//! Parameter layout is fixed:
//!
//! | param | meaning                          |
//! |-------|----------------------------------|
//! | `$1`  | required labels (`text[]`)       |
//! | `$2`  | excluded labels (`text[]`)       |
//! | `$3`  | limit (`bigint`, NULL = no limit)|
//! | `$4`  | offset (`bigint`)                |
//! | `$5+` | equality filter values           |

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};

use flashdeck_core::{Card, CardField, CardFilter, CardFindOptions, FilterValue, TagLabel};

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// Integer parameter.
    Int(i64),
    /// Nullable integer parameter.
    OptInt(Option<i64>),
    /// String parameter.
    String(String),
    /// Array of strings (for label sets).
    StringArray(Vec<String>),
}

impl QueryParam {
    /// Bind this parameter as the next positional argument.
    pub fn bind_to<'q>(
        self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            QueryParam::Int(v) => query.bind(v),
            QueryParam::OptInt(v) => query.bind(v),
            QueryParam::String(v) => query.bind(v),
            QueryParam::StringArray(v) => query.bind(v),
        }
    }
}

/// Qualified column for a filterable card field.
fn column(field: CardField) -> &'static str {
    match field {
        CardField::CardId => "c.card_id",
        CardField::Front => "c.front",
        CardField::Back => "c.back",
        CardField::Hint => "c.hint",
    }
}

/// Number of fixed parameters ahead of the filter values.
const FIXED_PARAMS: usize = 4;

/// Builds the card find statement and its parameters.
pub struct CardQueryBuilder<'a> {
    filter: &'a CardFilter,
    options: &'a CardFindOptions,
}

impl<'a> CardQueryBuilder<'a> {
    /// `options` are expected to be validated already.
    pub fn new(filter: &'a CardFilter, options: &'a CardFindOptions) -> Self {
        Self { filter, options }
    }

    /// Generate the SQL text and the parameters in binding order.
    ///
    /// Untagged cards survive the LEFT JOINs and match whenever no
    /// required labels are given.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut params = vec![
            QueryParam::StringArray(self.options.tags_all.clone()),
            QueryParam::StringArray(self.options.tags_none.clone()),
            QueryParam::OptInt(self.options.limit),
            QueryParam::Int(self.options.offset),
        ];

        let mut clauses = Vec::new();
        for (field, value) in self.filter.conditions() {
            params.push(match value {
                FilterValue::Integer(n) => QueryParam::Int(*n),
                FilterValue::Text(s) => QueryParam::String(s.clone()),
            });
            clauses.push(format!("{} = ${}", column(field), params.len()));
        }
        debug_assert_eq!(params.len(), FIXED_PARAMS + clauses.len());

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            r#"
SELECT
    c.card_id,
    c.front,
    c.back,
    c.hint,
    COALESCE(
        array_agg(t.tag ORDER BY t.tag) FILTER (WHERE t.tag_id IS NOT NULL),
        ARRAY[]::text[]
    ) AS tags
FROM cards c
LEFT JOIN card_tags ct ON ct.card_id = c.card_id
LEFT JOIN tags t ON t.tag_id = ct.tag_id
{where_clause}
GROUP BY c.card_id
HAVING COUNT(t.tag_id) FILTER (WHERE t.tag = ANY($1::text[])) = cardinality($1::text[])
   AND COUNT(t.tag_id) FILTER (WHERE t.tag = ANY($2::text[])) = 0
ORDER BY c.card_id
LIMIT $3
OFFSET $4
"#
        );

        (sql, params)
    }
}

/// Map a row produced by [`CardQueryBuilder`] to a card.
pub(crate) fn map_row_to_card(row: PgRow) -> Card {
    let tags: Vec<String> = row.get("tags");
    Card {
        card_id: row.get("card_id"),
        front: row.get("front"),
        back: row.get("back"),
        hint: row.get("hint"),
        tags: tags.into_iter().map(TagLabel::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter_has_no_where() {
        let filter = CardFilter::new();
        let options = CardFindOptions::default();
        let (sql, params) = CardQueryBuilder::new(&filter, &options).build();

        assert!(!sql.contains("WHERE c."));
        assert_eq!(params.len(), FIXED_PARAMS);
        assert_eq!(params[2], QueryParam::OptInt(None));
        assert_eq!(params[3], QueryParam::Int(0));
    }

    #[test]
    fn test_filters_numbered_after_fixed_params() {
        let filter = CardFilter::new().front("Q").card_id(7);
        let options = CardFindOptions::default();
        let (sql, params) = CardQueryBuilder::new(&filter, &options).build();

        assert!(sql.contains("WHERE c.card_id = $5 AND c.front = $6"));
        assert_eq!(params[4], QueryParam::Int(7));
        assert_eq!(params[5], QueryParam::String("Q".to_string()));
    }

    #[test]
    fn test_values_never_inlined() {
        let filter = CardFilter::new().back("x'; DROP TABLE cards; --");
        let options = CardFindOptions::default();
        let (sql, params) = CardQueryBuilder::new(&filter, &options).build();

        assert!(!sql.contains("DROP TABLE"));
        assert!(sql.contains("c.back = $5"));
        assert_eq!(
            params[4],
            QueryParam::String("x'; DROP TABLE cards; --".to_string())
        );
    }

    #[test]
    fn test_tag_sets_and_paging_bound() {
        let filter = CardFilter::new();
        let options = CardFindOptions::new()
            .with_tags_all(["a", "b"])
            .with_tags_none(["c"])
            .with_limit(10)
            .with_offset(20);
        let (_, params) = CardQueryBuilder::new(&filter, &options).build();

        assert_eq!(
            params[0],
            QueryParam::StringArray(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(params[1], QueryParam::StringArray(vec!["c".to_string()]));
        assert_eq!(params[2], QueryParam::OptInt(Some(10)));
        assert_eq!(params[3], QueryParam::Int(20));
    }

    #[test]
    fn test_ordered_by_card_id() {
        let (sql, _) = CardQueryBuilder::new(&CardFilter::new(), &CardFindOptions::default()).build();
        assert!(sql.contains("ORDER BY c.card_id"));
        assert!(sql.contains("GROUP BY c.card_id"));
    }

    #[test]
    fn test_every_field_has_a_column() {
        for field in CardField::ALL {
            assert!(column(field).starts_with("c."));
        }
    }
}
