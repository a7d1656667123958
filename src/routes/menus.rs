//! Menu API routes
//!
//! Endpoints:
//! - POST /api/process-menu - Upload a menu photo (multipart field `image`)
//! - GET /api/menu - Items of the most recent menu
//! - GET /api/menu/:menu_id - A stored menu
//! - GET /api/menu/:menu_id/share - Public link for a stored menu

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::menu::{Menu, MenuItem};
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the image itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Upload response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMenuResponse {
    pub menu_id: String,
    pub menu_items: Vec<MenuItem>,
    pub created_at: DateTime<Utc>,
}

/// Latest menu response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestMenuResponse {
    pub menu_items: Vec<MenuItem>,
}

/// Share link response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkResponse {
    pub menu_id: String,
    pub url: String,
}

/// Create the menus router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/process-menu", post(process_menu))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
        .route("/api/menu", get(latest_menu))
        .route("/api/menu/:menu_id", get(get_menu))
        .route("/api/menu/:menu_id/share", get(share_menu))
}

/// POST /api/process-menu
///
/// Read the uploaded photo with the vision model and store the result.
async fn process_menu(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessMenuResponse>> {
    let max_upload_bytes = state.config().server.max_upload_bytes;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge {
                max: max_upload_bytes,
            }
        } else {
            AppError::BadRequest(format!("Failed to read upload: {}", e))
        }
    })? {
        if field.name() != Some("image") {
            continue;
        }

        let media_type = media_type_for(field.content_type(), field.file_name());
        let file_name = field.file_name().map(|s| s.to_string());

        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge {
                    max: max_upload_bytes,
                }
            } else {
                AppError::BadRequest(format!("Failed to read image data: {}", e))
            }
        })?;

        tracing::debug!(
            file_name = ?file_name,
            media_type = %media_type,
            size = data.len(),
            "Received menu image"
        );

        if data.is_empty() {
            return Err(AppError::BadRequest("No image provided".to_string()));
        }
        if !media_type.starts_with("image/") {
            return Err(AppError::BadRequest(format!(
                "Please upload a valid image file (got {})",
                media_type
            )));
        }
        if data.len() > max_upload_bytes {
            return Err(AppError::PayloadTooLarge {
                max: max_upload_bytes,
            });
        }

        let menu = state.menus().process_upload(&data, &media_type).await?;

        return Ok(Json(ProcessMenuResponse {
            menu_id: menu.id,
            menu_items: menu.items,
            created_at: menu.created_at,
        }));
    }

    tracing::warn!("No image field found in multipart upload");
    Err(AppError::BadRequest("No image provided".to_string()))
}

/// GET /api/menu
async fn latest_menu(State(state): State<AppState>) -> Result<Json<LatestMenuResponse>> {
    let menu_items = state.menus().latest_items().await?;
    Ok(Json(LatestMenuResponse { menu_items }))
}

/// GET /api/menu/:menu_id
async fn get_menu(
    State(state): State<AppState>,
    Path(menu_id): Path<String>,
) -> Result<Json<Menu>> {
    tracing::debug!(menu_id = %menu_id, "Fetching menu");
    let menu = state.menus().menu(&menu_id).await?;
    Ok(Json(menu))
}

/// GET /api/menu/:menu_id/share
async fn share_menu(
    State(state): State<AppState>,
    Path(menu_id): Path<String>,
) -> Result<Json<ShareLinkResponse>> {
    let url = state.menus().share_link(&menu_id).await?;
    Ok(Json(ShareLinkResponse { menu_id, url }))
}

/// Media type of an uploaded part: the declared type, or a guess from the
/// file name when the client sent none (or only the generic binary type).
fn media_type_for(content_type: Option<&str>, file_name: Option<&str>) -> String {
    match content_type {
        Some(declared) if !declared.is_empty() && declared != "application/octet-stream" => {
            declared.to_string()
        }
        _ => file_name
            .and_then(|name| mime_guess::from_path(name).first())
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::extraction::MockProvider;
    use crate::menu::{MenuService, SubstringParser};
    use crate::store::{JsonFileMenuStore, MemoryMenuStore, MenuStore};
    use axum_test::TestServer;
    use serde_json::Value;
    use std::sync::Arc;
    use tempfile::TempDir;

    const BOUNDARY: &str = "menu-share-test-boundary";
    const REPLY: &str =
        r#"Here is the menu: {"menuItems":[{"name":"Tea","price":"$2","description":"Hot"}]}"#;

    fn test_server_with(provider: MockProvider, store: Arc<dyn MenuStore>) -> TestServer {
        let config = Config::default();
        let service = MenuService::new(
            Arc::new(provider),
            Arc::new(SubstringParser),
            store,
            "https://menus.test",
        );
        let state = AppState::with_service(config, service);
        TestServer::new(crate::routes::app(state)).unwrap()
    }

    fn test_server(reply: &str) -> TestServer {
        test_server_with(MockProvider::replying(reply), Arc::new(MemoryMenuStore::new()))
    }

    fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn upload(server: &TestServer, body: Vec<u8>) -> axum_test::TestResponse {
        server
            .post("/api/process-menu")
            .content_type(&format!("multipart/form-data; boundary={BOUNDARY}"))
            .bytes(body.into())
            .await
    }

    #[tokio::test]
    async fn test_upload_then_fetch() {
        let server = test_server(REPLY);

        let response = upload(
            &server,
            multipart_body("image", "menu.jpg", "image/jpeg", b"fake jpeg"),
        )
        .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let created: Value = response.json();
        let menu_id = created["menuId"].as_str().unwrap().to_string();
        assert_eq!(
            created["menuItems"],
            serde_json::json!([{ "name": "Tea", "price": "$2", "description": "Hot" }])
        );
        assert!(created["createdAt"].is_string());

        let response = server.get(&format!("/api/menu/{}", menu_id)).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let menu: Value = response.json();
        assert_eq!(menu["id"], menu_id.as_str());
        assert_eq!(menu["items"], created["menuItems"]);
        assert_eq!(menu["createdAt"], created["createdAt"]);

        let response = server.get("/api/menu").await;
        let latest: Value = response.json();
        assert_eq!(latest["menuItems"], created["menuItems"]);

        let response = server.get(&format!("/api/menu/{}/share", menu_id)).await;
        let share: Value = response.json();
        assert_eq!(share["url"], format!("https://menus.test/menu/{}", menu_id));
    }

    #[tokio::test]
    async fn test_upload_without_image_field() {
        let server = test_server(REPLY);

        let response = upload(
            &server,
            multipart_body("photo", "menu.jpg", "image/jpeg", b"fake jpeg"),
        )
        .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "No image provided");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images() {
        let server = test_server(REPLY);

        let response = upload(
            &server,
            multipart_body("image", "menu.pdf", "application/pdf", b"%PDF-1.7"),
        )
        .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let server = test_server(REPLY);
        let image = vec![0u8; Config::default().server.max_upload_bytes + 1];

        let response = upload(
            &server,
            multipart_body("image", "menu.png", "image/png", &image),
        )
        .await;

        assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unparseable_reply_returns_raw_response() {
        let server = test_server("The photo is too blurry to read.");

        let response = upload(
            &server,
            multipart_body("image", "menu.png", "image/png", b"png"),
        )
        .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["error"], "Failed to parse menu items");
        assert_eq!(body["kind"], "parse_error");
        assert_eq!(body["rawResponse"], "The photo is too blurry to read.");
    }

    #[tokio::test]
    async fn test_items_are_returned_as_the_model_wrote_them() {
        let reply = r#"{"menuItems": [
            "Tea - $2",
            {"name": "Pizza", "price": {"small": "$9"}, "vegan": false}
        ]}"#;
        let server = test_server(reply);

        let response = upload(
            &server,
            multipart_body("image", "menu.png", "image/png", b"png"),
        )
        .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let expected = serde_json::json!([
            "Tea - $2",
            { "name": "Pizza", "price": { "small": "$9" }, "vegan": false }
        ]);
        let created: Value = response.json();
        assert_eq!(created["menuItems"], expected);

        let menu_id = created["menuId"].as_str().unwrap();
        let menu: Value = server.get(&format!("/api/menu/{}", menu_id)).await.json();
        assert_eq!(menu["items"], expected);
    }

    #[tokio::test]
    async fn test_unknown_menu_is_not_found() {
        let server = test_server(REPLY);

        let response = server.get("/api/menu/never-created").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["requestedId"], "never-created");

        let response = server.get("/api/menu/never-created/share").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_latest_defaults_to_empty() {
        let server = test_server(REPLY);

        let response = server.get("/api/menu").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body, serde_json::json!({ "menuItems": [] }));
    }

    #[tokio::test]
    async fn test_corrupt_store_is_a_server_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("menu.json");
        std::fs::write(&path, "not json").unwrap();

        let server = test_server_with(
            MockProvider::replying(REPLY),
            Arc::new(JsonFileMenuStore::new(path)),
        );

        let response = server.get("/api/menu/anything").await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["kind"], "storage_error");

        let response = server.get("/api/menu").await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_media_type_fallback() {
        assert_eq!(media_type_for(Some("image/webp"), Some("menu.png")), "image/webp");
        assert_eq!(media_type_for(None, Some("menu.png")), "image/png");
        assert_eq!(
            media_type_for(Some("application/octet-stream"), Some("menu.jpg")),
            "image/jpeg"
        );
        assert_eq!(media_type_for(None, None), "application/octet-stream");
    }
}
