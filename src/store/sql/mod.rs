//! sea-orm backed store. Multi-step writes run inside one transaction.

mod catalog;
mod products;
mod sales;

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionError,
};
use tracing::warn;
use uuid::Uuid;

use crate::adapters::{PersistenceAdapter, ProductAdapter, StockMovementAdapter};
use crate::db::DbPool;
use crate::entities::{product, stock_movement};
use crate::errors::ServiceError;
use crate::models::{Product, StockChange, StockMovement};

#[derive(Clone)]
pub struct SqlStore {
    db_pool: Arc<DbPool>,
}

impl SqlStore {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.db_pool
    }
}

pub(crate) fn flatten_txn_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// Applies `change` to one product row and appends the ledger entry.
///
/// The quantity update is a single guarded `UPDATE ... SET quantity = quantity + delta
/// WHERE quantity + delta >= 0`, so concurrent sales cannot drive stock negative.
pub(crate) async fn apply_stock_change<C>(
    conn: &C,
    product_id: Uuid,
    change: &StockChange,
) -> Result<(Product, StockMovement), ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let result = product::Entity::update_many()
        .col_expr(
            product::Column::Quantity,
            Expr::col(product::Column::Quantity).add(change.delta),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(now))
        .filter(product::Column::Id.eq(product_id))
        .filter(Expr::expr(Expr::col(product::Column::Quantity).add(change.delta)).gte(0))
        .exec(conn)
        .await?;

    let row = product::Entity::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

    if result.rows_affected == 0 {
        warn!(
            product_id = %product_id,
            available = row.quantity,
            delta = change.delta,
            "Stock change rejected"
        );
        return Err(ServiceError::InsufficientStock(format!(
            "{} has {} in stock, cannot apply {}",
            row.name, row.quantity, change.delta
        )));
    }

    let movement = StockMovement {
        id: Uuid::new_v4(),
        product_id,
        kind: change.kind,
        quantity_change: change.delta,
        previous_quantity: row.quantity - change.delta,
        new_quantity: row.quantity,
        sale_id: change.sale_id,
        reason: change.reason.clone(),
        created_at: now,
    };
    insert_movement(conn, &movement).await?;

    Ok((ProductAdapter::to_internal(row), movement))
}

pub(crate) async fn insert_movement<C>(conn: &C, movement: &StockMovement) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    stock_movement::ActiveModel::from(StockMovementAdapter::to_remote(movement))
        .reset_all()
        .insert(conn)
        .await?;
    Ok(())
}
