use super::*;
use crate::models::{Edit, EditType};
use crate::repo::{create_edit, create_user, list_edits_for_image};
use crate::test_utils::{sample_image, setup_test_db};

#[tokio::test]
async fn test_create_and_get_image() {
    let pool = setup_test_db();
    let user = create_user(&pool, "ada@example.com".to_string(), "hash".to_string()).await.unwrap();

    let image = create_image(&pool, sample_image(&user.get_id(), "cat.png", 100)).await.unwrap();

    let fetched = get_image(&pool, &image.get_id()).unwrap().unwrap();
    assert_eq!(fetched, image);
}

#[tokio::test]
async fn test_create_image_requires_existing_user() {
    let pool = setup_test_db();

    let result = create_image(&pool, sample_image("ghost", "cat.png", 100)).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_get_image_for_user_checks_owner() {
    let pool = setup_test_db();
    let owner = create_user(&pool, "owner@example.com".to_string(), "hash".to_string()).await.unwrap();
    let other = create_user(&pool, "other@example.com".to_string(), "hash".to_string()).await.unwrap();
    let image = create_image(&pool, sample_image(&owner.get_id(), "cat.png", 100)).await.unwrap();

    assert!(get_image_for_user(&pool, &image.get_id(), &owner.get_id()).unwrap().is_some());
    assert!(get_image_for_user(&pool, &image.get_id(), &other.get_id()).unwrap().is_none());
    assert!(get_image_for_user(&pool, "missing", &owner.get_id()).unwrap().is_none());
}

#[tokio::test]
async fn test_list_images_for_user_only_returns_own_images() {
    let pool = setup_test_db();
    let ada = create_user(&pool, "ada@example.com".to_string(), "hash".to_string()).await.unwrap();
    let bob = create_user(&pool, "bob@example.com".to_string(), "hash".to_string()).await.unwrap();

    let first = create_image(&pool, sample_image(&ada.get_id(), "one.png", 10)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = create_image(&pool, sample_image(&ada.get_id(), "two.png", 20)).await.unwrap();
    create_image(&pool, sample_image(&bob.get_id(), "bob.png", 30)).await.unwrap();

    let images = list_images_for_user(&pool, &ada.get_id()).unwrap();

    assert_eq!(images.len(), 2);
    // newest first
    assert_eq!(images[0].get_id(), second.get_id());
    assert_eq!(images[1].get_id(), first.get_id());
}

#[tokio::test]
async fn test_delete_image_removes_edits() {
    let pool = setup_test_db();
    let user = create_user(&pool, "ada@example.com".to_string(), "hash".to_string()).await.unwrap();
    let image = create_image(&pool, sample_image(&user.get_id(), "cat.png", 100)).await.unwrap();
    create_edit(
        &pool,
        Edit::new(image.get_id(), user.get_id(), "/static/processed/a.jpg".to_string(), EditType::Enhance, 50),
    )
    .await
    .unwrap();

    assert!(delete_image(&pool, &image.get_id()).await.unwrap());

    assert!(get_image(&pool, &image.get_id()).unwrap().is_none());
    assert!(list_edits_for_image(&pool, &image.get_id()).unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_missing_image_returns_false() {
    let pool = setup_test_db();

    assert!(!delete_image(&pool, "missing").await.unwrap());
}

#[tokio::test]
async fn test_user_stats() {
    let pool = setup_test_db();
    let user = create_user(&pool, "ada@example.com".to_string(), "hash".to_string()).await.unwrap();

    assert_eq!(user_stats(&pool, &user.get_id()).unwrap(), UserStats::default());

    let edited = create_image(&pool, sample_image(&user.get_id(), "one.png", 1_000)).await.unwrap();
    create_image(&pool, sample_image(&user.get_id(), "two.png", 2_500)).await.unwrap();

    for edit_type in [EditType::Enhance, EditType::Style] {
        create_edit(
            &pool,
            Edit::new(edited.get_id(), user.get_id(), "/static/processed/x.jpg".to_string(), edit_type, 40),
        )
        .await
        .unwrap();
    }

    let stats = user_stats(&pool, &user.get_id()).unwrap();

    assert_eq!(stats.total_images, 2);
    assert_eq!(stats.processed_images, 1);
    assert_eq!(stats.total_edits, 2);
    assert_eq!(stats.storage_bytes, 3_500);
}
