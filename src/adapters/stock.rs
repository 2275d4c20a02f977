use std::str::FromStr;

use super::PersistenceAdapter;
use crate::entities::stock_movement;
use crate::models::{MovementKind, StockMovement};

pub struct StockMovementAdapter;

impl PersistenceAdapter for StockMovementAdapter {
    type Row = stock_movement::Model;
    type Record = StockMovement;

    fn to_internal(row: stock_movement::Model) -> StockMovement {
        StockMovement {
            id: row.id,
            product_id: row.product_id,
            kind: MovementKind::from_str(&row.kind).unwrap_or(MovementKind::Adjustment),
            quantity_change: row.quantity_change,
            previous_quantity: row.previous_quantity,
            new_quantity: row.new_quantity,
            sale_id: row.sale_id,
            reason: row.reason,
            created_at: row.created_at,
        }
    }

    fn to_remote(record: &StockMovement) -> stock_movement::Model {
        stock_movement::Model {
            id: record.id,
            product_id: record.product_id,
            kind: record.kind.to_string(),
            quantity_change: record.quantity_change,
            previous_quantity: record.previous_quantity,
            new_quantity: record.new_quantity,
            sale_id: record.sale_id,
            reason: record.reason.clone(),
            created_at: record.created_at,
        }
    }
}
