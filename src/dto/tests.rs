use super::*;
use crate::models::EditType;
use crate::test_utils::sample_image;
use serde_json::json;

#[test]
fn test_absolute_url() {
    assert_eq!(absolute_url("http://localhost:8000", "/static/a.png"), "http://localhost:8000/static/a.png");
    assert_eq!(absolute_url("https://pix.example/", "/static/a.png"), "https://pix.example/static/a.png");
    assert_eq!(absolute_url("https://pix.example", "static/a.png"), "https://pix.example/static/a.png");
}

#[test]
fn test_image_summary_without_edit() {
    let image = sample_image("user-1", "cat.png", 10);

    let summary = ImageSummary::new(&image, None, "http://localhost:8000");
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["id"], image.get_id());
    assert_eq!(json["name"], "cat.png");
    assert_eq!(json["originalImageUrl"], "http://localhost:8000/static/uploads/stored_cat.png");
    assert!(json["editedImageUrl"].is_null());
    assert!(json["editType"].is_null());
    assert!(json["createdAt"].is_string());
}

#[test]
fn test_image_summary_with_edit() {
    let image = sample_image("user-1", "cat.png", 10);
    let edit = Edit::new(
        image.get_id(),
        "user-1".to_string(),
        "/static/processed/e.jpg".to_string(),
        EditType::Colorize,
        30,
    );

    let summary = ImageSummary::new(&image, Some(&edit), "http://api.test");

    assert_eq!(summary.edited_image_url.as_deref(), Some("http://api.test/static/processed/e.jpg"));
    assert_eq!(summary.edit_type.as_deref(), Some("colorize"));
}

#[test]
fn test_stats_rounds_megabytes() {
    let stats = UserStats {
        total_images: 3,
        processed_images: 2,
        total_edits: 5,
        storage_bytes: 1_572_864, // 1.5 MiB
    };

    let json = serde_json::to_value(StatsResponse::from(stats)).unwrap();

    assert_eq!(
        json,
        json!({"totalImages": 3, "processedImages": 2, "totalEdits": 5, "storageUsed": 1.5})
    );

    let small = StatsResponse::from(UserStats {
        storage_bytes: 120_000,
        ..Default::default()
    });
    assert_eq!(small.storage_used, 0.1);
}

#[test]
fn test_process_dto_uses_camel_case_and_optional_intensity() {
    let dto: ProcessImageDto = serde_json::from_value(json!({"editType": "enhance"})).unwrap();
    assert_eq!(dto.edit_type, "enhance");
    assert_eq!(dto.intensity, None);

    let dto: ProcessImageDto = serde_json::from_value(json!({"editType": "style", "intensity": 75})).unwrap();
    assert_eq!(dto.intensity, Some(75));
}

#[test]
fn test_edit_form_from_urlencoded() {
    let form: EditForm = serde_html_form::from_str("image_id=abc&edit_type=restore&intensity=40").unwrap();
    assert_eq!(form.image_id, "abc");
    assert_eq!(form.edit_type, "restore");
    assert_eq!(form.intensity, Some(40));

    let form: EditForm = serde_html_form::from_str("image_id=abc&edit_type=restore").unwrap();
    assert_eq!(form.intensity, None);
}

#[test]
fn test_edit_response_from_edit() {
    let edit = Edit::new(
        "img".to_string(),
        "user".to_string(),
        "/static/processed/x.jpg".to_string(),
        EditType::Retouch,
        20,
    );

    let response = EditResponse::from(&edit);

    assert_eq!(response.edited_url, "/static/processed/x.jpg");
    assert_eq!(response.edit_id, edit.get_id());
    assert_eq!(response.edit_type, "retouch");
    assert_eq!(response.intensity, 20);
}
