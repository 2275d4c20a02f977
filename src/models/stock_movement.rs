use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MovementKind {
    Initial,
    Sale,
    SaleCancelled,
    Adjustment,
    Loss,
}

/// One entry of the append-only stock ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub kind: MovementKind,
    pub quantity_change: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub sale_id: Option<Uuid>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A relative quantity change applied by a store together with its ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    pub delta: i32,
    pub kind: MovementKind,
    pub sale_id: Option<Uuid>,
    pub reason: Option<String>,
}

impl StockChange {
    pub fn adjustment(delta: i32, reason: Option<String>) -> Self {
        Self {
            delta,
            kind: MovementKind::Adjustment,
            sale_id: None,
            reason,
        }
    }

    pub fn loss(quantity: i32, reason: String) -> Self {
        Self {
            delta: -quantity,
            kind: MovementKind::Loss,
            sale_id: None,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStock {
    #[validate(range(min = -100000, max = 100000, message = "adjustment is out of range"))]
    pub delta: i32,
    #[validate(length(max = 500, message = "reason cannot exceed 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterLoss {
    #[validate(range(min = 1, message = "quantity must be greater than zero"))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 500, message = "reason is required"))]
    pub reason: String,
}
