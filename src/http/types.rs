//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order::{LineItem, Order};

/// Body of `POST /orders`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// Body of `PUT /orders/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: String,
}

/// Query of `GET /orders`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub cursor: u64,
}

/// Response of `GET /orders`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub items: Vec<Order>,
    /// Cursor for the next page; omitted on the last page.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub next: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &u64) -> bool {
    *value == 0
}
