//! HTTP-level integration tests for the `/media` endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete, file_part, get, patch, post_multipart, put_json, upload_image, Part,
    TestApp,
};
use serde_json::json;
use sqlx::PgPool;

fn stored_file_count(test: &TestApp) -> usize {
    std::fs::read_dir(test.upload_dir.path())
        .map(|entries| entries.count())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_creates_active_record_and_file(pool: PgPool) {
    let test = TestApp::new(pool);
    let asset = upload_image(&test, "Menu.PNG", &[("duration", "12"), ("priority", "3")]).await;

    assert!(asset["id"].is_number());
    assert_eq!(asset["kind"], "image");
    assert_eq!(asset["original_name"], "Menu.PNG");
    assert_eq!(asset["duration_secs"], 12);
    assert_eq!(asset["priority"], 3);
    assert_eq!(asset["status"], "active");
    assert_eq!(asset["effective_status"], "active");
    assert!(asset["active_from"].is_null());
    assert!(asset.get("storage_ref").is_none());

    let url = asset["public_url"].as_str().unwrap();
    assert!(url.starts_with("http://localhost:5000/uploads/files-"));
    assert!(url.ends_with(".png"));
    assert_eq!(stored_file_count(&test), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_defaults_duration_and_priority(pool: PgPool) {
    let test = TestApp::new(pool);
    let asset = upload_image(&test, "plain.jpg", &[]).await;

    assert_eq!(asset["duration_secs"], 30);
    assert_eq!(asset["priority"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_accepts_settings_json_and_multiple_files(pool: PgPool) {
    let test = TestApp::new(pool);
    let settings = json!({
        "duration": 8,
        "startDate": "2000-01-01",
        "endDate": "2000-12-31"
    })
    .to_string();

    let response = post_multipart(
        test.app(),
        "/api/v1/media/upload",
        &[
            file_part("a.png", "image/png", b"a"),
            file_part("b.pdf", "application/pdf", b"%PDF-1.4"),
            Part::Text {
                name: "settings",
                value: &settings,
            },
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[1]["kind"], "pdf");
    for asset in data {
        assert_eq!(asset["duration_secs"], 8);
        assert_eq!(asset["status"], "active");
        // The window closed long ago.
        assert_eq!(asset["effective_status"], "inactive");
    }
    assert_eq!(stored_file_count(&test), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_rejects_extension_of_another_kind(pool: PgPool) {
    let test = TestApp::new(pool);
    let response = post_multipart(
        test.app(),
        "/api/v1/media/upload",
        &[file_part("clip.mp4", "image/png", b"x")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert_eq!(stored_file_count(&test), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_rejects_unsupported_content_type(pool: PgPool) {
    let test = TestApp::new(pool);
    let response = post_multipart(
        test.app(),
        "/api/v1/media/upload",
        &[file_part("notes.txt", "text/plain", b"hello")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_without_files_is_bad_request(pool: PgPool) {
    let test = TestApp::new(pool);
    let response = post_multipart(
        test.app(),
        "/api/v1/media/upload",
        &[Part::Text {
            name: "duration",
            value: "10",
        }],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_rejects_inverted_window(pool: PgPool) {
    let test = TestApp::new(pool);
    let response = post_multipart(
        test.app(),
        "/api/v1/media/upload",
        &[
            file_part("a.png", "image/png", b"a"),
            Part::Text {
                name: "start_date",
                value: "2025-02-01",
            },
            Part::Text {
                name: "end_date",
                value: "2025-01-01",
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stored_file_count(&test), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_over_size_limit_is_rejected(pool: PgPool) {
    let test = TestApp::new(pool);
    let big = vec![0u8; 2 * 1024 * 1024];
    let response = post_multipart(
        test.app(),
        "/api/v1/media/upload",
        &[file_part("huge.png", "image/png", &big)],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "File too large");
    assert_eq!(stored_file_count(&test), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn size_limit_applies_per_file(pool: PgPool) {
    let test = TestApp::new(pool);
    // Each file is under the 1 MiB limit; together they are over it.
    let data = vec![0u8; 700 * 1024];
    let response = post_multipart(
        test.app(),
        "/api/v1/media/upload",
        &[
            file_part("a.png", "image/png", &data),
            file_part("b.png", "image/png", &data),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"][0]["size_bytes"], 700 * 1024);
    assert_eq!(stored_file_count(&test), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn one_oversize_file_rejects_the_whole_batch(pool: PgPool) {
    let test = TestApp::new(pool);
    let big = vec![0u8; 2 * 1024 * 1024];
    let response = post_multipart(
        test.app(),
        "/api/v1/media/upload",
        &[
            file_part("small.png", "image/png", b"ok"),
            file_part("huge.png", "image/png", &big),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stored_file_count(&test), 0);

    let listed = body_json(get(test.app(), "/api/v1/media").await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn get_missing_media_returns_404(pool: PgPool) {
    let test = TestApp::new(pool);
    let response = get(test.app(), "/api/v1/media/999999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_is_newest_first_and_filterable(pool: PgPool) {
    let test = TestApp::new(pool);
    let first = upload_image(&test, "breakfast-menu.png", &[]).await;
    let second = upload_image(&test, "lunch-special.png", &[]).await;

    let json = body_json(get(test.app(), "/api/v1/media").await).await;
    let ids: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].clone())
        .collect();
    assert_eq!(ids, vec![second["id"].clone(), first["id"].clone()]);

    let json = body_json(get(test.app(), "/api/v1/media?search=MENU").await).await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], first["id"]);

    let json = body_json(get(test.app(), "/api/v1/media?kind=video").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let json = body_json(get(test.app(), "/api/v1/media?status=active").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn partial_update_keeps_unspecified_fields(pool: PgPool) {
    let test = TestApp::new(pool);
    let asset = upload_image(&test, "a.png", &[("duration", "15"), ("end_date", "2999-01-01")]).await;
    let id = asset["id"].as_i64().unwrap();

    let response = put_json(test.app(), &format!("/api/v1/media/{id}"), json!({"priority": 7})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["priority"], 7);
    assert_eq!(updated["duration_secs"], 15);
    assert!(updated["active_until"].is_string());

    // `null` clears a bound.
    let response = put_json(
        test.app(),
        &format!("/api/v1/media/{id}"),
        json!({"end_date": null}),
    )
    .await;
    let updated = body_json(response).await["data"].clone();
    assert!(updated["active_until"].is_null());
    assert_eq!(updated["priority"], 7);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_validates_fields(pool: PgPool) {
    let test = TestApp::new(pool);
    let asset = upload_image(&test, "a.png", &[]).await;
    let uri = format!("/api/v1/media/{}", asset["id"]);

    for body in [
        json!({"duration": 0}),
        json!({"status": "paused"}),
        json!({"start_date": "not a date"}),
        json!({"start_date": "2025-03-01", "end_date": "2025-02-01"}),
    ] {
        let response = put_json(test.app(), &uri, body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_missing_media_returns_404(pool: PgPool) {
    let test = TestApp::new(pool);
    let response = put_json(test.app(), "/api/v1/media/999999", json!({"priority": 1})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Toggle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn toggle_flips_manual_status(pool: PgPool) {
    let test = TestApp::new(pool);
    let asset = upload_image(&test, "a.png", &[]).await;
    let uri = format!("/api/v1/media/{}/toggle-status", asset["id"]);

    let json = body_json(patch(test.app(), &uri).await).await;
    assert_eq!(json["data"]["id"], asset["id"]);
    assert_eq!(json["data"]["status"], "inactive");

    let json = body_json(patch(test.app(), &uri).await).await;
    assert_eq!(json["data"]["status"], "active");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn toggle_on_outside_window_is_conflict(pool: PgPool) {
    let test = TestApp::new(pool);
    let asset = upload_image(&test, "a.png", &[("end_date", "2001-01-01")]).await;
    let uri = format!("/api/v1/media/{}/toggle-status", asset["id"]);

    // Turning off is always allowed.
    let response = patch(test.app(), &uri).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = patch(test.app(), &uri).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "OUT_OF_WINDOW");

    // The manual status and the window are unchanged.
    let json = body_json(get(test.app(), &format!("/api/v1/media/{}", asset["id"])).await).await;
    assert_eq!(json["data"]["status"], "inactive");
    assert!(json["data"]["active_until"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn toggle_missing_media_returns_404(pool: PgPool) {
    let test = TestApp::new(pool);
    let response = patch(test.app(), "/api/v1/media/999999/toggle-status").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_removes_record_and_file(pool: PgPool) {
    let test = TestApp::new(pool);
    let asset = upload_image(&test, "a.png", &[]).await;
    let uri = format!("/api/v1/media/{}", asset["id"]);
    assert_eq!(stored_file_count(&test), 1);

    let response = delete(test.app(), &uri).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(stored_file_count(&test), 0);

    assert_eq!(get(test.app(), &uri).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(delete(test.app(), &uri).await.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn uploaded_file_is_served(pool: PgPool) {
    let test = TestApp::new(pool);
    let asset = upload_image(&test, "a.png", &[]).await;
    let url = asset["public_url"].as_str().unwrap();
    let path = url.trim_start_matches("http://localhost:5000");

    let response = get(test.app(), path).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_bytes(response).await, b"\x89PNG fake image");
}
