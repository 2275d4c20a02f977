use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::{error, instrument};
use uuid::Uuid;

use super::{flatten_txn_error, insert_movement, apply_stock_change, SqlStore};
use crate::adapters::{PersistenceAdapter, ProductAdapter, StockMovementAdapter};
use crate::entities::{product, stock_movement};
use crate::errors::ServiceError;
use crate::models::{
    MovementKind, NewProduct, Product, ProductChanges, ProductFilter, StockChange, StockMovement,
};
use crate::store::ProductStore;

/// Product codes are unique across active and inactive products.
async fn ensure_code_free<C>(
    conn: &C,
    code: &str,
    except: Option<Uuid>,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let mut query = product::Entity::find().filter(product::Column::Code.eq(code));
    if let Some(id) = except {
        query = query.filter(product::Column::Id.ne(id));
    }
    if query.one(conn).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "Product code {} is already in use",
            code
        )));
    }
    Ok(())
}

#[async_trait]
impl ProductStore for SqlStore {
    #[instrument(skip(self))]
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ServiceError> {
        let mut query = product::Entity::find();
        if !filter.include_inactive {
            query = query.filter(product::Column::Active.eq(true));
        }
        if let Some(category) = &filter.category {
            query = query.filter(product::Column::Category.eq(category.as_str()));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(product::Column::Name.contains(term))
                    .add(product::Column::Code.contains(term)),
            );
        }

        let rows = query
            .order_by_asc(product::Column::Name)
            .all(self.pool())
            .await
            .map_err(|e| {
                error!("Failed to list products: {}", e);
                ServiceError::DatabaseError(e)
            })?;

        Ok(rows.into_iter().map(ProductAdapter::to_internal).collect())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, ServiceError> {
        let row = product::Entity::find_by_id(id).one(self.pool()).await?;
        Ok(row.map(ProductAdapter::to_internal))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_product(&self, input: NewProduct) -> Result<Product, ServiceError> {
        let product = input.into_product(Utc::now())?;

        self.pool()
            .transaction::<_, Product, ServiceError>(move |txn| {
                Box::pin(async move {
                    ensure_code_free(txn, &product.code, None).await?;
                    let row = product::ActiveModel::from(ProductAdapter::to_remote(&product))
                        .reset_all()
                        .insert(txn)
                        .await?;

                    let opening = StockMovement {
                        id: Uuid::new_v4(),
                        product_id: row.id,
                        kind: MovementKind::Initial,
                        quantity_change: row.quantity,
                        previous_quantity: 0,
                        new_quantity: row.quantity,
                        sale_id: None,
                        reason: None,
                        created_at: row.created_at,
                    };
                    insert_movement(txn, &opening).await?;

                    Ok(ProductAdapter::to_internal(row))
                })
            })
            .await
            .map_err(flatten_txn_error)
    }

    #[instrument(skip(self, changes))]
    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Product, ServiceError> {
        self.pool()
            .transaction::<_, Product, ServiceError>(move |txn| {
                Box::pin(async move {
                    let row = product::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::not_found("Product", id))?;

                    let mut record = ProductAdapter::to_internal(row);
                    changes.apply(&mut record, Utc::now())?;
                    ensure_code_free(txn, &record.code, Some(id)).await?;

                    // quantity is owned by the ledger path and never written here
                    let mut active = product::ActiveModel::from(ProductAdapter::to_remote(&record))
                        .reset_all();
                    active.quantity = sea_orm::ActiveValue::NotSet;
                    let updated = active.update(txn).await?;

                    Ok(ProductAdapter::to_internal(updated))
                })
            })
            .await
            .map_err(flatten_txn_error)
    }

    #[instrument(skip(self))]
    async fn adjust_quantity(
        &self,
        id: Uuid,
        change: StockChange,
    ) -> Result<(Product, StockMovement), ServiceError> {
        self.pool()
            .transaction::<_, (Product, StockMovement), ServiceError>(move |txn| {
                Box::pin(async move { apply_stock_change(txn, id, &change).await })
            })
            .await
            .map_err(flatten_txn_error)
    }

    #[instrument(skip(self))]
    async fn soft_delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let row = product::Entity::find_by_id(id)
            .one(self.pool())
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;

        let mut active: product::ActiveModel = row.into();
        active.active = sea_orm::ActiveValue::Set(false);
        active.updated_at = sea_orm::ActiveValue::Set(Utc::now());
        active.update(self.pool()).await?;
        Ok(())
    }

    async fn list_movements(&self, product_id: Uuid) -> Result<Vec<StockMovement>, ServiceError> {
        let rows = stock_movement::Entity::find()
            .filter(stock_movement::Column::ProductId.eq(product_id))
            .order_by_asc(stock_movement::Column::CreatedAt)
            .all(self.pool())
            .await?;
        Ok(rows.into_iter().map(StockMovementAdapter::to_internal).collect())
    }
}
