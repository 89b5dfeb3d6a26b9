//! Category repository integration tests.

use flashdeck_db::test_fixtures::{unique_label, TestDataBuilder, TestDatabase};
use flashdeck_db::{
    CardFindOptions, CategoryRepository, CreateCategoryRequest, Error, UpdateCategoryRequest,
};

#[tokio::test]
async fn test_category_crud() {
    let test_db = TestDatabase::new().await;
    let name = unique_label("deck");
    let a = unique_label("a");
    let b = unique_label("b");

    let created = test_db
        .db
        .categories
        .create(CreateCategoryRequest {
            name: format!(" {} ", name),
            tags: vec![a.clone()],
        })
        .await
        .unwrap();
    assert_eq!(created.name, name);
    assert_eq!(created.labels(), vec![a.clone()]);

    let fetched = test_db.db.categories.get(created.category_id).await.unwrap();
    assert_eq!(fetched, created);

    let listed = test_db.db.categories.list().await.unwrap();
    assert!(listed.iter().any(|c| c.category_id == created.category_id));

    let renamed = format!("{}-renamed", name);
    let updated = test_db
        .db
        .categories
        .update(
            created.category_id,
            UpdateCategoryRequest {
                name: Some(renamed.clone()),
                tags: Some(vec![b.clone()]),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, renamed);
    assert_eq!(updated.labels(), vec![b]);

    let deleted = test_db
        .db
        .categories
        .delete(created.category_id)
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(matches!(
        test_db.db.categories.get(created.category_id).await,
        Err(Error::CategoryNotFound(_))
    ));
}

#[tokio::test]
async fn test_duplicate_category_name_conflicts() {
    let test_db = TestDatabase::new().await;
    let name = unique_label("dup");

    let first = test_db
        .db
        .categories
        .create(CreateCategoryRequest {
            name: name.clone(),
            tags: vec![],
        })
        .await
        .unwrap();

    let err = test_db
        .db
        .categories
        .create(CreateCategoryRequest {
            name: name.clone(),
            tags: vec![],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    test_db
        .db
        .categories
        .delete(first.category_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_category_cards_require_every_category_tag() {
    let test_db = TestDatabase::new().await;
    let subject = unique_label("subject");
    let level = unique_label("level");
    let cards = TestDataBuilder::new(&test_db.db)
        .with_tagged_card("match", &[&subject, &level])
        .await
        .with_tagged_card("partial", &[&subject])
        .await
        .build();

    let category = test_db
        .db
        .categories
        .create(CreateCategoryRequest {
            name: unique_label("deck"),
            tags: vec![subject.clone(), level.clone()],
        })
        .await
        .unwrap();

    let found = test_db
        .db
        .categories
        .cards(category.category_id, &CardFindOptions::default())
        .await
        .unwrap();
    let fronts: Vec<_> = found.iter().map(|c| c.front.as_str()).collect();
    assert_eq!(fronts, vec!["match"]);

    test_db
        .db
        .categories
        .delete(category.category_id)
        .await
        .unwrap();
    test_db.cleanup(&cards).await;
}

#[tokio::test]
async fn test_missing_category_is_not_found() {
    let test_db = TestDatabase::new().await;

    assert!(matches!(
        test_db
            .db
            .categories
            .update(i64::MAX, UpdateCategoryRequest::default())
            .await,
        Err(Error::CategoryNotFound(_))
    ));
    assert!(matches!(
        test_db.db.categories.delete(i64::MAX).await,
        Err(Error::CategoryNotFound(_))
    ));
    assert!(matches!(
        test_db
            .db
            .categories
            .cards(i64::MAX, &CardFindOptions::default())
            .await,
        Err(Error::CategoryNotFound(_))
    ));
}
