//! Order domain model.
//!
//! An [`Order`] is created once, may be marked shipped, and may then be
//! marked completed. Both timestamps are write-once; the transition methods
//! enforce that before the repository ever sees the updated value.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: Uuid,
    pub quantity: u32,
    /// Unit price in minor currency units.
    pub price: u64,
}

/// The persisted order record.
///
/// Serialized as a JSON object. Unset timestamps are omitted rather than
/// written as `null`, and unknown fields are ignored when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: u64,
    pub customer_id: Uuid,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates a new order with a random id, stamped at `created_at`.
    pub fn new(customer_id: Uuid, line_items: Vec<LineItem>, created_at: DateTime<Utc>) -> Self {
        Self {
            order_id: rand::random(),
            customer_id,
            line_items,
            created_at,
            shipped_at: None,
            completed_at: None,
        }
    }

    /// Records the shipping time.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::AlreadyShipped`] if the order was shipped before.
    pub fn mark_shipped(&mut self, at: DateTime<Utc>) -> Result<(), StatusError> {
        if self.shipped_at.is_some() {
            return Err(StatusError::AlreadyShipped {
                order_id: self.order_id,
            });
        }
        self.shipped_at = Some(at);
        Ok(())
    }

    /// Records the completion time.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::NotShipped`] if the order has not shipped yet, or
    /// [`StatusError::AlreadyCompleted`] if it was completed before.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) -> Result<(), StatusError> {
        if self.completed_at.is_some() {
            return Err(StatusError::AlreadyCompleted {
                order_id: self.order_id,
            });
        }
        if self.shipped_at.is_none() {
            return Err(StatusError::NotShipped {
                order_id: self.order_id,
            });
        }
        self.completed_at = Some(at);
        Ok(())
    }

    /// Applies a status transition at time `at`.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] if the transition is not allowed from the
    /// current state. The order is left unchanged in that case.
    pub fn apply(&mut self, transition: StatusTransition, at: DateTime<Utc>) -> Result<(), StatusError> {
        match transition {
            StatusTransition::Shipped => self.mark_shipped(at),
            StatusTransition::Completed => self.mark_completed(at),
        }
    }
}

/// A requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    Shipped,
    Completed,
}

impl FromStr for StatusTransition {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            other => Err(StatusError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for StatusTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shipped => f.write_str("shipped"),
            Self::Completed => f.write_str("completed"),
        }
    }
}

/// Rejected status transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("order {order_id} has already shipped")]
    AlreadyShipped { order_id: u64 },

    #[error("order {order_id} has already completed")]
    AlreadyCompleted { order_id: u64 },

    #[error("order {order_id} cannot complete before it ships")]
    NotShipped { order_id: u64 },

    #[error("unknown status '{0}'")]
    UnknownStatus(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_order() -> Order {
        Order {
            order_id: 42,
            customer_id: Uuid::nil(),
            line_items: vec![LineItem {
                item_id: Uuid::nil(),
                quantity: 2,
                price: 1999,
            }],
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            shipped_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_complete_before_ship_is_rejected() {
        let mut order = sample_order();
        let err = order.mark_completed(Utc::now()).unwrap_err();
        assert_eq!(err, StatusError::NotShipped { order_id: 42 });
        assert!(order.completed_at.is_none());
    }

    #[test]
    fn test_ship_then_complete() {
        let mut order = sample_order();
        let shipped = order.created_at + Duration::hours(1);
        let completed = shipped + Duration::hours(1);

        order.mark_shipped(shipped).unwrap();
        order.mark_completed(completed).unwrap();

        assert_eq!(order.shipped_at, Some(shipped));
        assert_eq!(order.completed_at, Some(completed));
    }

    #[test]
    fn test_timestamps_are_write_once() {
        let mut order = sample_order();
        let first = order.created_at + Duration::hours(1);
        order.mark_shipped(first).unwrap();

        assert_eq!(
            order.mark_shipped(first + Duration::hours(1)),
            Err(StatusError::AlreadyShipped { order_id: 42 })
        );
        assert_eq!(order.shipped_at, Some(first));

        order.mark_completed(first).unwrap();
        assert_eq!(
            order.mark_completed(first + Duration::hours(2)),
            Err(StatusError::AlreadyCompleted { order_id: 42 })
        );
        assert_eq!(order.completed_at, Some(first));
    }

    #[test]
    fn test_parse_transition() {
        assert_eq!("shipped".parse(), Ok(StatusTransition::Shipped));
        assert_eq!("completed".parse(), Ok(StatusTransition::Completed));
        assert_eq!(
            "cancelled".parse::<StatusTransition>(),
            Err(StatusError::UnknownStatus("cancelled".to_string()))
        );
    }

    #[test]
    fn test_unset_timestamps_are_omitted() {
        let json = serde_json::to_value(sample_order()).unwrap();
        assert!(json.get("shipped_at").is_none());
        assert!(json.get("completed_at").is_none());
        assert_eq!(json["created_at"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let json = r#"{
            "order_id": 7,
            "customer_id": "00000000-0000-0000-0000-000000000000",
            "line_items": [],
            "created_at": "2024-05-01T12:00:00+02:00",
            "loyalty_tier": "gold"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_id, 7);
        assert_eq!(
            order.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
    }
}
