use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::server::AppState;
use crate::storage::{ItemRecord, ItemStore};

#[derive(Deserialize)]
pub struct SearchParams {
    pub keyword: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct ItemsResponse {
    pub items: Vec<ItemRecord>,
}

pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello, world!".to_string(),
    })
}

pub async fn get_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ItemsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let store = ItemStore::open(&state.database_path)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))?;

    let items = store
        .list_items()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))?;

    Ok(Json(ItemsResponse { items }))
}

pub async fn add_item(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut name = None;
    let mut category = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() })))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => {
                name = Some(field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() }))
                })?);
            }
            Some("category") => {
                category = Some(field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() }))
                })?);
            }
            Some("image") => {
                image = Some(field.bytes().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() }))
                })?);
            }
            _ => {}
        }
    }

    let name = name.filter(|n| !n.is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: "name and category is required".to_string() }),
    ))?;
    let category = category.filter(|c| !c.is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: "name and category is required".to_string() }),
    ))?;
    let image = image.ok_or((
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: "image file is required".to_string() }),
    ))?;

    let image_name = state
        .images
        .save(&image)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))?;

    let store = ItemStore::open(&state.database_path)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))?;

    let category_id = store
        .resolve_or_create_category(&category)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))?;

    store
        .insert_item(&name, category_id, &image_name)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))?;

    tracing::info!("Item added: {} ({})", name, category);

    Ok(Json(MessageResponse {
        message: format!("item received: {}, {}, {}", name, category, image_name),
    }))
}

pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(image_name): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let path = state
        .images
        .resolve(&image_name)
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() })))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}

pub async fn search_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ItemsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let store = ItemStore::open(&state.database_path)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))?;

    let items = store
        .search_items(&params.keyword)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))?;

    if items.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse { error: "No items found".to_string() }),
        ));
    }

    Ok(Json(ItemsResponse { items }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageStore;
    use crate::server::build_router;
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "marketd-test-boundary";

    fn test_router(tmp: &TempDir) -> Router {
        let database_path = tmp.path().join("marketd.sqlite3");
        let images = ImageStore::new(tmp.path().join("images"));
        images.ensure_dir().unwrap();
        ItemStore::open(&database_path).unwrap();

        let state = Arc::new(AppState {
            database_path,
            images,
        });
        build_router(state, "http://localhost:3000").unwrap()
    }

    fn multipart_body(name: Option<&str>, category: Option<&str>, image: Option<&[u8]>) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(name) = name {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(category) = category {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\n{category}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(image) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"photo.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(image);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post_item_request(name: Option<&str>, category: Option<&str>, image: Option<&[u8]>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/items")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(name, category, image)))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_hello() {
        let tmp = TempDir::new().unwrap();
        let app = test_router(&tmp);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Hello, world!");
    }

    #[tokio::test]
    async fn test_submit_then_list_then_fetch_image() {
        let tmp = TempDir::new().unwrap();
        let app = test_router(&tmp);
        let image_bytes: &[u8] = b"not really a jpeg";

        let response = app
            .clone()
            .oneshot(post_item_request(Some("Good Bike"), Some("bikes"), Some(image_bytes)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let message = json["message"].as_str().unwrap();
        assert!(message.starts_with("item received: Good Bike, bikes,"));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/items").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let items = json["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Good Bike");
        assert_eq!(items[0]["category"], "bikes");

        let image_name = items[0]["image_name"].as_str().unwrap().to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/image/{image_name}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "image/jpeg"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], image_bytes);
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_name() {
        let tmp = TempDir::new().unwrap();
        let app = test_router(&tmp);

        let response = app
            .clone()
            .oneshot(post_item_request(Some(""), Some("bikes"), Some(b"img")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_item_request(Some("Good Bike"), None, Some(b"img")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_submit_rejects_missing_image() {
        let tmp = TempDir::new().unwrap();
        let app = test_router(&tmp);

        let response = app
            .oneshot(post_item_request(Some("Good Bike"), Some("bikes"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_by_keyword() {
        let tmp = TempDir::new().unwrap();
        let app = test_router(&tmp);

        let response = app
            .clone()
            .oneshot(post_item_request(Some("Good Bike"), Some("bikes"), Some(b"img")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/search?keyword=bike")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["items"][0]["name"], "Good Bike");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search?keyword=car")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "No items found");
    }

    #[tokio::test]
    async fn test_image_rejects_non_jpg_names() {
        let tmp = TempDir::new().unwrap();
        let app = test_router(&tmp);

        for name in ["photo.png", "photo.jpeg", "photo.txt"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(format!("/image/{name}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "name: {name}");
        }
    }

    #[tokio::test]
    async fn test_image_missing_file_serves_default() {
        let tmp = TempDir::new().unwrap();
        let app = test_router(&tmp);

        let default_bytes: &[u8] = b"default image bytes";
        std::fs::write(tmp.path().join("images").join("default.jpg"), default_bytes).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/image/{}.jpg", "0".repeat(64)))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], default_bytes);
    }
}
