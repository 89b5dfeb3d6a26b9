//! Card repository integration tests.
//!
//! Require a PostgreSQL database at DATABASE_URL (or the default test URL).

use flashdeck_db::test_fixtures::{unique_label, TestDataBuilder, TestDatabase};
use flashdeck_db::{
    CardFilter, CardFindOptions, CardRepository, CreateCardRequest, Error, TagRepository,
    UpdateCardRequest,
};

fn create_request(front: &str, tags: &[&str]) -> CreateCardRequest {
    CreateCardRequest {
        front: front.to_string(),
        back: "back".to_string(),
        hint: Some("hint".to_string()),
        tags: tags.iter().map(|s| s.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_insert_returns_card_with_sorted_unique_tags() {
    let test_db = TestDatabase::new().await;
    let a = unique_label("a");
    let b = unique_label("b");

    let card = test_db
        .db
        .cards
        .insert(create_request("Q", &[&b, &a, &b]))
        .await
        .expect("insert should succeed");

    assert!(card.card_id > 0);
    assert_eq!(card.front, "Q");
    assert_eq!(card.hint.as_deref(), Some("hint"));
    let mut expected = vec![a.as_str(), b.as_str()];
    expected.sort();
    assert_eq!(card.labels(), expected);

    let fetched = test_db.db.cards.fetch(card.card_id).await.unwrap();
    assert_eq!(fetched, card);

    test_db.cleanup(&[card]).await;
}

#[tokio::test]
async fn test_insert_rejects_blank_front_without_writing() {
    let test_db = TestDatabase::new().await;
    let label = unique_label("never");

    let err = test_db
        .db
        .cards
        .insert(create_request("   ", &[&label]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation { .. }));
    assert!(test_db.db.tags.get_by_label(&label).await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_missing_card_is_not_found() {
    let test_db = TestDatabase::new().await;
    let err = test_db.db.cards.fetch(i64::MAX).await.unwrap_err();
    assert!(matches!(err, Error::CardNotFound(id) if id == i64::MAX));
}

#[tokio::test]
async fn test_update_fields_only_keeps_tags() {
    let test_db = TestDatabase::new().await;
    let topic = unique_label("topic");
    let cards = TestDataBuilder::new(&test_db.db)
        .with_tagged_card("Q", &[&topic])
        .await
        .build();
    let id = cards[0].card_id;

    let updated = test_db
        .db
        .cards
        .update(
            id,
            UpdateCardRequest {
                back: Some("new back".to_string()),
                hint: Some(Some("new hint".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.front, "Q");
    assert_eq!(updated.back, "new back");
    assert_eq!(updated.hint.as_deref(), Some("new hint"));
    assert_eq!(updated.labels(), vec![topic.as_str()]);

    test_db.cleanup(&cards).await;
}

#[tokio::test]
async fn test_update_can_clear_hint() {
    let test_db = TestDatabase::new().await;
    let card = test_db
        .db
        .cards
        .insert(create_request("Q", &[]))
        .await
        .unwrap();

    let updated = test_db
        .db
        .cards
        .update(
            card.card_id,
            UpdateCardRequest {
                hint: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.hint, None);
    test_db.cleanup(&[card]).await;
}

#[tokio::test]
async fn test_update_replaces_tag_set() {
    let test_db = TestDatabase::new().await;
    let old = unique_label("old");
    let kept = unique_label("kept");
    let new = unique_label("new");
    let cards = TestDataBuilder::new(&test_db.db)
        .with_tagged_card("Q", &[&old, &kept])
        .await
        .build();

    let updated = test_db
        .db
        .cards
        .update(
            cards[0].card_id,
            UpdateCardRequest {
                tags: Some(vec![kept.clone(), new.clone()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(updated.has_tag(&kept));
    assert!(updated.has_tag(&new));
    assert!(!updated.has_tag(&old));

    // Dropping the link never drops the tag itself.
    let old_tag = test_db.db.tags.get_by_label(&old).await.unwrap();
    assert_eq!(old_tag.map(|t| t.card_count), Some(0));

    test_db.cleanup(&cards).await;
}

#[tokio::test]
async fn test_update_missing_card_is_not_found_and_writes_nothing() {
    let test_db = TestDatabase::new().await;
    let label = unique_label("orphan");

    let err = test_db
        .db
        .cards
        .update(
            i64::MAX,
            UpdateCardRequest {
                front: Some("x".to_string()),
                tags: Some(vec![label.clone()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::CardNotFound(_)));
    assert!(test_db.db.tags.get_by_label(&label).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_card_removes_links_but_keeps_tags() {
    let test_db = TestDatabase::new().await;
    let label = unique_label("gone");
    let cards = TestDataBuilder::new(&test_db.db)
        .with_tagged_card("Q", &[&label])
        .await
        .build();
    let id = cards[0].card_id;

    let deleted = test_db.db.cards.delete(id).await.unwrap();
    assert_eq!(deleted, 1);

    assert!(matches!(
        test_db.db.cards.fetch(id).await,
        Err(Error::CardNotFound(_))
    ));
    assert!(matches!(
        test_db.db.cards.delete(id).await,
        Err(Error::CardNotFound(_))
    ));

    let tag = test_db
        .db
        .tags
        .get_by_label(&label)
        .await
        .unwrap()
        .expect("tag should survive card deletion");
    assert_eq!(tag.card_count, 0);
}

#[tokio::test]
async fn test_labels_are_trimmed_and_case_sensitive() {
    let test_db = TestDatabase::new().await;
    let base = unique_label("case");
    let upper = base.to_uppercase();

    let card = test_db
        .db
        .cards
        .insert(create_request("Q", &[&format!("  {}  ", base), &upper]))
        .await
        .unwrap();

    assert_eq!(card.tags.len(), 2);
    assert!(card.has_tag(&base));
    assert!(card.has_tag(&upper));

    test_db.cleanup(&[card]).await;
}

/// A failing association insert must undo the card row and the tags
/// created for it.
#[tokio::test]
async fn test_insert_rolls_back_on_storage_fault() {
    let test_db = TestDatabase::new().await;
    let front = unique_label("front");
    let good = unique_label("good");
    let bad = unique_label("bad");

    let trigger = test_db
        .add_card_tags_trigger(
            "true",
            &format!(
                "IF EXISTS (SELECT 1 FROM tags WHERE tag_id = NEW.tag_id AND tag = '{}') THEN
                     RAISE EXCEPTION 'simulated storage fault';
                 END IF;
                 RETURN NEW;",
                bad
            ),
        )
        .await;

    let result = test_db
        .db
        .cards
        .insert(create_request(&front, &[&good, &bad]))
        .await;

    test_db.drop_card_tags_trigger(&trigger).await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Database(_)), "got {:?}", err);

    let found = test_db
        .db
        .cards
        .find(&CardFilter::new().front(front.as_str()), &CardFindOptions::new())
        .await
        .unwrap();
    assert!(found.is_empty());
    assert!(test_db.db.tags.get_by_label(&good).await.unwrap().is_none());
    assert!(test_db.db.tags.get_by_label(&bad).await.unwrap().is_none());
}
