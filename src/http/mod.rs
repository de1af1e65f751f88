//! HTTP API for orders.
//!
//! Routes:
//!
//! - `GET /` - liveness
//! - `GET /health` - store readiness
//! - `POST /orders`, `GET /orders?cursor=N`
//! - `GET|PUT|DELETE /orders/{id}`

mod error;
mod handlers;
pub mod metrics;
pub mod types;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

pub use error::AppError;

use crate::repository::OrderRepository;
use crate::store::KvStore;

/// Orders returned per page by `GET /orders` unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orders: OrderRepository,
    pub store: KvStore,
    pub page_size: usize,
}

impl AppState {
    pub fn new(store: KvStore, page_size: usize) -> Self {
        Self {
            orders: OrderRepository::new(store.clone()),
            store,
            page_size,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/orders",
            get(handlers::list_orders).post(handlers::create_order),
        )
        .route(
            "/orders/{id}",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use crate::order::Order;

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_fetch_through_router() {
        let app = router(AppState::new(KvStore::memory(), DEFAULT_PAGE_SIZE));

        let (status, created) = send(
            &app,
            json_request(
                "POST",
                "/orders",
                serde_json::json!({
                    "customer_id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                    "line_items": []
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let order: Order = serde_json::from_value(created).unwrap();

        let uri = format!("/orders/{}", order.order_id);
        let (status, fetched) = send(
            &app,
            Request::builder().uri(&uri).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_value::<Order>(fetched).unwrap(), order);
    }

    #[tokio::test]
    async fn test_duplicate_insert_maps_to_conflict() {
        let state = AppState::new(KvStore::memory(), DEFAULT_PAGE_SIZE);
        let order = Order::new(uuid::Uuid::nil(), Vec::new(), chrono::Utc::now());
        state.orders.insert(&order).await.unwrap();

        let err = AppError::from(state.orders.insert(&order).await.unwrap_err());
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let app = router(AppState::new(KvStore::memory(), DEFAULT_PAGE_SIZE));
        let (status, body) = send(
            &app,
            Request::builder()
                .method("DELETE")
                .uri("/orders/77")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "order not found: order:77");
    }
}
