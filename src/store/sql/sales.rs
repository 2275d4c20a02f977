use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, LoaderTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{apply_stock_change, flatten_txn_error, SqlStore};
use crate::adapters::{PersistenceAdapter, ProductAdapter, SaleAdapter};
use crate::entities::{product, sale, sale_item};
use crate::errors::ServiceError;
use crate::models::{
    MovementKind, NewSale, RecordedSale, Sale, SaleFilter, SaleItem, SaleStatus, StockChange,
};
use crate::store::SaleStore;

#[async_trait]
impl SaleStore for SqlStore {
    #[instrument(skip(self))]
    async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<Sale>, ServiceError> {
        let mut query = sale::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(sale::Column::Status.eq(status.to_string()));
        }
        if let Some(seller_id) = filter.seller_id {
            query = query.filter(sale::Column::SellerId.eq(seller_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(sale::Column::SoldAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(sale::Column::SoldAt.lt(to));
        }

        let headers = query
            .order_by_desc(sale::Column::SoldAt)
            .all(self.pool())
            .await?;
        let items = headers.load_many(sale_item::Entity, self.pool()).await?;

        Ok(headers
            .into_iter()
            .zip(items)
            .map(SaleAdapter::to_internal)
            .collect())
    }

    async fn get_sale(&self, id: Uuid) -> Result<Option<Sale>, ServiceError> {
        let Some(header) = sale::Entity::find_by_id(id).one(self.pool()).await? else {
            return Ok(None);
        };
        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(id))
            .all(self.pool())
            .await?;
        Ok(Some(SaleAdapter::to_internal((header, items))))
    }

    #[instrument(skip(self, input), fields(items = input.items.len()))]
    async fn record_sale(&self, input: NewSale) -> Result<RecordedSale, ServiceError> {
        let recorded = self
            .pool()
            .transaction::<_, RecordedSale, ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let sale_id = Uuid::new_v4();

                    let mut items = Vec::with_capacity(input.items.len());
                    for line in &input.items {
                        let row = product::Entity::find_by_id(line.product_id)
                            .one(txn)
                            .await?
                            .filter(|row| row.active)
                            .ok_or_else(|| ServiceError::not_found("Product", line.product_id))?;
                        let product = ProductAdapter::to_internal(row);
                        items.push(SaleItem::new(&product, line.quantity, line.unit_price)?);
                    }

                    let sale = Sale {
                        id: sale_id,
                        seller_id: input.seller_id,
                        customer_name: input.customer_name,
                        payment_method: input.payment_method,
                        discount: input.discount,
                        notes: input.notes,
                        status: SaleStatus::Completed,
                        sold_at: input.sold_at.unwrap_or(now),
                        updated_at: now,
                        items,
                    };

                    let (header, item_rows) = SaleAdapter::to_remote(&sale);
                    sale::ActiveModel::from(header).reset_all().insert(txn).await?;
                    for row in item_rows {
                        sale_item::ActiveModel::from(row).reset_all().insert(txn).await?;
                    }

                    let mut products = Vec::with_capacity(sale.items.len());
                    for item in &sale.items {
                        let change = StockChange {
                            delta: -item.quantity,
                            kind: MovementKind::Sale,
                            sale_id: Some(sale.id),
                            reason: None,
                        };
                        let (product, _) = apply_stock_change(txn, item.product_id, &change).await?;
                        upsert_product(&mut products, product);
                    }

                    Ok(RecordedSale { sale, products })
                })
            })
            .await
            .map_err(flatten_txn_error)?;

        info!(sale_id = %recorded.sale.id, total = %recorded.sale.total(), "Sale recorded");
        Ok(recorded)
    }

    #[instrument(skip(self))]
    async fn cancel_sale(&self, id: Uuid) -> Result<RecordedSale, ServiceError> {
        self.pool()
            .transaction::<_, RecordedSale, ServiceError>(move |txn| {
                Box::pin(async move {
                    let header = sale::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::not_found("Sale", id))?;
                    let items = sale_item::Entity::find()
                        .filter(sale_item::Column::SaleId.eq(id))
                        .all(txn)
                        .await?;
                    let mut sale = SaleAdapter::to_internal((header.clone(), items));
                    if sale.is_cancelled() {
                        return Err(ServiceError::InvalidOperation(format!(
                            "Sale {} is already cancelled",
                            id
                        )));
                    }

                    let now = Utc::now();
                    let mut active: sale::ActiveModel = header.into();
                    active.status = Set(SaleStatus::Cancelled.to_string());
                    active.updated_at = Set(now);
                    active.update(txn).await?;
                    sale.status = SaleStatus::Cancelled;
                    sale.updated_at = now;

                    let mut products = Vec::with_capacity(sale.items.len());
                    for item in &sale.items {
                        let change = StockChange {
                            delta: item.quantity,
                            kind: MovementKind::SaleCancelled,
                            sale_id: Some(sale.id),
                            reason: None,
                        };
                        let (product, _) = apply_stock_change(txn, item.product_id, &change).await?;
                        upsert_product(&mut products, product);
                    }

                    Ok(RecordedSale { sale, products })
                })
            })
            .await
            .map_err(flatten_txn_error)
    }
}

/// Keeps the latest state of each touched product once.
fn upsert_product(products: &mut Vec<crate::models::Product>, product: crate::models::Product) {
    match products.iter_mut().find(|p| p.id == product.id) {
        Some(existing) => *existing = product,
        None => products.push(product),
    }
}
