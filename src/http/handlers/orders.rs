//! Order resource handlers.
//!
//! Each public handler counts the request, delegates to a private function
//! holding the logic, and counts the failure if there was one.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::Utc;
use tracing::info;

use super::super::types::{
    CreateOrderRequest, ListQuery, ListResponse, StatusResponse, UpdateOrderRequest,
};
use super::super::{AppError, AppState, metrics};
use crate::order::{Order, StatusTransition};
use crate::repository::{FindAllPage, parse_order_id};

type JsonBody<T> = Result<Json<T>, JsonRejection>;

/// POST /orders - Create an order.
pub(crate) async fn create_order(
    State(state): State<AppState>,
    body: JsonBody<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    metrics::record_operation("create");
    create(&state, body)
        .await
        .inspect_err(|_| metrics::record_error("create"))
}

/// GET /orders?cursor=N - List one page of orders.
pub(crate) async fn list_orders(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, AppError> {
    metrics::record_operation("list");
    list(&state, query)
        .await
        .inspect_err(|_| metrics::record_error("list"))
}

/// GET /orders/{id} - Fetch one order.
pub(crate) async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    metrics::record_operation("get");
    get(&state, &id)
        .await
        .inspect_err(|_| metrics::record_error("get"))
}

/// PUT /orders/{id} - Apply a status transition.
pub(crate) async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody<UpdateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    metrics::record_operation("update");
    update(&state, &id, body)
        .await
        .inspect_err(|_| metrics::record_error("update"))
}

/// DELETE /orders/{id} - Delete an order.
pub(crate) async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    metrics::record_operation("delete");
    delete(&state, &id)
        .await
        .inspect_err(|_| metrics::record_error("delete"))
}

async fn create(
    state: &AppState,
    body: JsonBody<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let Json(req) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let order = Order::new(req.customer_id, req.line_items, Utc::now());
    state.orders.insert(&order).await?;

    info!(order_id = order.order_id, customer_id = %order.customer_id, "order created");
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list(
    state: &AppState,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let page = state
        .orders
        .find_all(FindAllPage {
            offset: query.cursor,
            size: state.page_size,
        })
        .await?;

    Ok(Json(ListResponse {
        items: page.orders,
        next: page.cursor,
    }))
}

async fn get(state: &AppState, id: &str) -> Result<Json<Order>, AppError> {
    let id = parse_id(id)?;
    Ok(Json(state.orders.find_by_id(id).await?))
}

async fn update(
    state: &AppState,
    id: &str,
    body: JsonBody<UpdateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(id)?;
    let Json(req) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let transition: StatusTransition = req.status.parse()?;

    let mut order = state.orders.find_by_id(id).await?;
    order.apply(transition, Utc::now())?;
    state.orders.update(&order).await?;

    info!(order_id = id, status = %transition, "order updated");
    Ok(Json(order))
}

async fn delete(state: &AppState, id: &str) -> Result<Json<StatusResponse>, AppError> {
    let id = parse_id(id)?;
    state.orders.delete_by_id(id).await?;

    info!(order_id = id, "order deleted");
    Ok(Json(StatusResponse::new("success")))
}

fn parse_id(raw: &str) -> Result<u64, AppError> {
    parse_order_id(raw).ok_or_else(|| AppError::BadRequest(format!("invalid order id '{raw}'")))
}
