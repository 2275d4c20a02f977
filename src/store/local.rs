//! Single-file JSON store used when no database is configured.
//!
//! The whole dataset is held in memory behind one lock. A mutation works on a
//! copy, writes the copy to disk (temp file then rename) and only then
//! replaces the in-memory state, so a failed write leaves both unchanged.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{
    same_name, Category, Goal, ListFilter, MovementKind, NewGoal, NewProduct, NewSale, NewSeller,
    Product, ProductChanges, ProductFilter, RecordedSale, Sale, SaleFilter, SaleItem, SaleStatus,
    Seller, StockChange, StockMovement,
};
use crate::store::{CategoryStore, GoalStore, ProductStore, SaleStore, SellerStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Dataset {
    products: Vec<Product>,
    sales: Vec<Sale>,
    categories: Vec<Category>,
    sellers: Vec<Seller>,
    goals: Vec<Goal>,
    movements: Vec<StockMovement>,
}

impl Dataset {
    fn product_mut(&mut self, id: Uuid) -> Result<&mut Product, ServiceError> {
        self.products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    fn apply_stock_change(
        &mut self,
        id: Uuid,
        change: &StockChange,
    ) -> Result<(Product, StockMovement), ServiceError> {
        let now = Utc::now();
        let product = self.product_mut(id)?;
        let previous = product.quantity;
        let next = previous + change.delta;
        if next < 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "{} has {} in stock, cannot apply {}",
                product.name, previous, change.delta
            )));
        }
        product.quantity = next;
        product.updated_at = now;
        let product = product.clone();

        let movement = StockMovement {
            id: Uuid::new_v4(),
            product_id: id,
            kind: change.kind,
            quantity_change: change.delta,
            previous_quantity: previous,
            new_quantity: next,
            sale_id: change.sale_id,
            reason: change.reason.clone(),
            created_at: now,
        };
        self.movements.push(movement.clone());
        Ok((product, movement))
    }
}

pub struct LocalStore {
    path: PathBuf,
    data: Mutex<Dataset>,
}

impl LocalStore {
    /// Loads the snapshot at `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref().to_path_buf();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Starting with an empty local store");
                Dataset::default()
            }
            Err(e) => {
                error!(path = %path.display(), "Failed to read local store: {}", e);
                return Err(e.into());
            }
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    async fn read<T>(&self, f: impl FnOnce(&Dataset) -> T) -> T {
        let guard = self.data.lock().await;
        f(&guard)
    }

    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Dataset) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut guard = self.data.lock().await;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }

    async fn persist(&self, data: &Dataset) -> Result<(), ServiceError> {
        let bytes = serde_json::to_vec_pretty(data)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Local store written");
        Ok(())
    }
}

fn by_name<T>(items: &mut [T], name: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| name(a).to_lowercase().cmp(&name(b).to_lowercase()));
}

#[async_trait]
impl ProductStore for LocalStore {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ServiceError> {
        let mut products: Vec<Product> = self
            .read(|data| {
                data.products
                    .iter()
                    .filter(|p| filter.matches(p))
                    .cloned()
                    .collect()
            })
            .await;
        by_name(&mut products, |p| &p.name);
        Ok(products)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, ServiceError> {
        Ok(self
            .read(|data| data.products.iter().find(|p| p.id == id).cloned())
            .await)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_product(&self, input: NewProduct) -> Result<Product, ServiceError> {
        let product = input.into_product(Utc::now())?;
        self.mutate(move |data| {
            if data.products.iter().any(|p| p.code == product.code) {
                return Err(ServiceError::Conflict(format!(
                    "Product code {} is already in use",
                    product.code
                )));
            }
            data.movements.push(StockMovement {
                id: Uuid::new_v4(),
                product_id: product.id,
                kind: MovementKind::Initial,
                quantity_change: product.quantity,
                previous_quantity: 0,
                new_quantity: product.quantity,
                sale_id: None,
                reason: None,
                created_at: product.created_at,
            });
            data.products.push(product.clone());
            Ok(product)
        })
        .await
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Product, ServiceError> {
        self.mutate(move |data| {
            let product = data.product_mut(id)?;
            changes.apply(product, Utc::now())?;
            let updated = product.clone();
            if data.products.iter().any(|p| p.id != id && p.code == updated.code) {
                return Err(ServiceError::Conflict(format!(
                    "Product code {} is already in use",
                    updated.code
                )));
            }
            Ok(updated)
        })
        .await
    }

    async fn adjust_quantity(
        &self,
        id: Uuid,
        change: StockChange,
    ) -> Result<(Product, StockMovement), ServiceError> {
        self.mutate(move |data| data.apply_stock_change(id, &change))
            .await
    }

    async fn soft_delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        self.mutate(move |data| {
            let product = data.product_mut(id)?;
            product.active = false;
            product.updated_at = Utc::now();
            Ok(())
        })
        .await
    }

    async fn list_movements(&self, product_id: Uuid) -> Result<Vec<StockMovement>, ServiceError> {
        Ok(self
            .read(|data| {
                data.movements
                    .iter()
                    .filter(|m| m.product_id == product_id)
                    .cloned()
                    .collect()
            })
            .await)
    }
}

#[async_trait]
impl SaleStore for LocalStore {
    async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<Sale>, ServiceError> {
        let mut sales: Vec<Sale> = self
            .read(|data| {
                data.sales
                    .iter()
                    .filter(|s| filter.matches(s))
                    .cloned()
                    .collect()
            })
            .await;
        sales.sort_by(|a, b| b.sold_at.cmp(&a.sold_at));
        Ok(sales)
    }

    async fn get_sale(&self, id: Uuid) -> Result<Option<Sale>, ServiceError> {
        Ok(self
            .read(|data| data.sales.iter().find(|s| s.id == id).cloned())
            .await)
    }

    #[instrument(skip(self, input), fields(items = input.items.len()))]
    async fn record_sale(&self, input: NewSale) -> Result<RecordedSale, ServiceError> {
        self.mutate(move |data| {
            let now = Utc::now();
            let mut items = Vec::with_capacity(input.items.len());
            for line in &input.items {
                let product = data
                    .products
                    .iter()
                    .find(|p| p.id == line.product_id && p.active)
                    .ok_or_else(|| ServiceError::not_found("Product", line.product_id))?;
                items.push(SaleItem::new(product, line.quantity, line.unit_price)?);
            }

            let sale = Sale {
                id: Uuid::new_v4(),
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

            let mut products: Vec<Product> = Vec::new();
            for item in &sale.items {
                let change = StockChange {
                    delta: -item.quantity,
                    kind: MovementKind::Sale,
                    sale_id: Some(sale.id),
                    reason: None,
                };
                let (product, _) = data.apply_stock_change(item.product_id, &change)?;
                products.retain(|p| p.id != product.id);
                products.push(product);
            }

            data.sales.push(sale.clone());
            Ok(RecordedSale { sale, products })
        })
        .await
    }

    async fn cancel_sale(&self, id: Uuid) -> Result<RecordedSale, ServiceError> {
        self.mutate(move |data| {
            let sale = data
                .sales
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| ServiceError::not_found("Sale", id))?;
            if sale.is_cancelled() {
                return Err(ServiceError::InvalidOperation(format!(
                    "Sale {} is already cancelled",
                    id
                )));
            }
            sale.status = SaleStatus::Cancelled;
            sale.updated_at = Utc::now();
            let sale = sale.clone();

            let mut products: Vec<Product> = Vec::new();
            for item in &sale.items {
                let change = StockChange {
                    delta: item.quantity,
                    kind: MovementKind::SaleCancelled,
                    sale_id: Some(sale.id),
                    reason: None,
                };
                let (product, _) = data.apply_stock_change(item.product_id, &change)?;
                products.retain(|p| p.id != product.id);
                products.push(product);
            }
            Ok(RecordedSale { sale, products })
        })
        .await
    }
}

#[async_trait]
impl CategoryStore for LocalStore {
    async fn list_categories(&self, filter: &ListFilter) -> Result<Vec<Category>, ServiceError> {
        let mut categories: Vec<Category> = self
            .read(|data| {
                data.categories
                    .iter()
                    .filter(|c| filter.admits(c.active))
                    .cloned()
                    .collect()
            })
            .await;
        by_name(&mut categories, |c| &c.name);
        Ok(categories)
    }

    async fn create_category(&self, name: String) -> Result<Category, ServiceError> {
        self.mutate(move |data| {
            if let Some(existing) = data
                .categories
                .iter_mut()
                .find(|c| same_name(&c.name, &name))
            {
                existing.active = true;
                return Ok(existing.clone());
            }
            let category = Category {
                id: Uuid::new_v4(),
                name: name.trim().to_string(),
                active: true,
                created_at: Utc::now(),
            };
            data.categories.push(category.clone());
            Ok(category)
        })
        .await
    }

    async fn soft_delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        self.mutate(move |data| {
            let category = data
                .categories
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| ServiceError::not_found("Category", id))?;
            category.active = false;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl SellerStore for LocalStore {
    async fn list_sellers(&self, filter: &ListFilter) -> Result<Vec<Seller>, ServiceError> {
        let mut sellers: Vec<Seller> = self
            .read(|data| {
                data.sellers
                    .iter()
                    .filter(|s| filter.admits(s.active))
                    .cloned()
                    .collect()
            })
            .await;
        by_name(&mut sellers, |s| &s.name);
        Ok(sellers)
    }

    async fn create_seller(&self, input: NewSeller) -> Result<Seller, ServiceError> {
        self.mutate(move |data| {
            if let Some(existing) = data
                .sellers
                .iter_mut()
                .find(|s| same_name(&s.name, &input.name))
            {
                existing.active = true;
                if input.email.is_some() {
                    existing.email = input.email;
                }
                if input.phone.is_some() {
                    existing.phone = input.phone;
                }
                return Ok(existing.clone());
            }
            let seller = Seller {
                id: Uuid::new_v4(),
                name: input.name.trim().to_string(),
                email: input.email,
                phone: input.phone,
                active: true,
                created_at: Utc::now(),
            };
            data.sellers.push(seller.clone());
            Ok(seller)
        })
        .await
    }

    async fn soft_delete_seller(&self, id: Uuid) -> Result<(), ServiceError> {
        self.mutate(move |data| {
            let seller = data
                .sellers
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| ServiceError::not_found("Seller", id))?;
            seller.active = false;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl GoalStore for LocalStore {
    async fn list_goals(&self, filter: &ListFilter) -> Result<Vec<Goal>, ServiceError> {
        let mut goals: Vec<Goal> = self
            .read(|data| {
                data.goals
                    .iter()
                    .filter(|g| filter.admits(g.active))
                    .cloned()
                    .collect()
            })
            .await;
        goals.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
        Ok(goals)
    }

    async fn save_goal(&self, input: NewGoal) -> Result<Goal, ServiceError> {
        self.mutate(move |data| {
            let now = Utc::now();
            if let Some(existing) = data
                .goals
                .iter_mut()
                .find(|g| g.active && g.covers(input.seller_id, input.month, input.year))
            {
                existing.target = input.target;
                existing.updated_at = now;
                return Ok(existing.clone());
            }
            let goal = Goal {
                id: Uuid::new_v4(),
                seller_id: input.seller_id,
                month: input.month,
                year: input.year,
                target: input.target,
                active: true,
                updated_at: now,
            };
            data.goals.push(goal.clone());
            Ok(goal)
        })
        .await
    }

    async fn soft_delete_goal(&self, id: Uuid) -> Result<(), ServiceError> {
        self.mutate(move |data| {
            let goal = data
                .goals
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or_else(|| ServiceError::not_found("Goal", id))?;
            goal.active = false;
            goal.updated_at = Utc::now();
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewSaleItem, PaymentMethod};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn dress(quantity: i32) -> NewProduct {
        NewProduct {
            name: "Vestido xadrez".into(),
            category: Some("Vestidos".into()),
            price: dec!(69.90),
            cost_price: dec!(28),
            quantity,
            min_quantity: 1,
            ..Default::default()
        }
    }

    fn sale_of(product_id: Uuid, quantity: i32) -> NewSale {
        NewSale {
            seller_id: None,
            customer_name: None,
            payment_method: PaymentMethod::Cash,
            discount: dec!(0),
            notes: None,
            sold_at: None,
            items: vec![NewSaleItem {
                product_id,
                quantity,
                unit_price: None,
            }],
        }
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let store = LocalStore::open(&path).await.unwrap();
        let product = store.create_product(dress(3)).await.unwrap();
        store.create_category("Vestidos".into()).await.unwrap();
        drop(store);

        let reopened = LocalStore::open(&path).await.unwrap();
        let found = reopened.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(found, product);
        assert_eq!(
            reopened
                .list_categories(&ListFilter::active())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn failed_sale_leaves_stock_and_sales_untouched() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path().join("store.json")).await.unwrap();
        let product = store.create_product(dress(2)).await.unwrap();

        let err = store.record_sale(sale_of(product.id, 5)).await.unwrap_err();
        assert_matches!(err, ServiceError::InsufficientStock(_));

        let unchanged = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(unchanged.quantity, 2);
        assert!(store
            .list_sales(&SaleFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn cancelling_restocks_once() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path().join("store.json")).await.unwrap();
        let product = store.create_product(dress(4)).await.unwrap();

        let recorded = store.record_sale(sale_of(product.id, 3)).await.unwrap();
        assert_eq!(recorded.products[0].quantity, 1);

        let cancelled = store.cancel_sale(recorded.sale.id).await.unwrap();
        assert_eq!(cancelled.products[0].quantity, 4);
        assert_matches!(
            store.cancel_sale(recorded.sale.id).await,
            Err(ServiceError::InvalidOperation(_))
        );

        let kinds: Vec<MovementKind> = store
            .list_movements(product.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                MovementKind::Initial,
                MovementKind::Sale,
                MovementKind::SaleCancelled
            ]
        );
    }

    #[tokio::test]
    async fn editing_onto_a_taken_code_is_a_conflict() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path().join("store.json")).await.unwrap();
        let mut first = dress(1);
        first.code = Some("BODY-01".into());
        let first = store.create_product(first).await.unwrap();
        let second = store.create_product(dress(1)).await.unwrap();

        let err = store
            .update_product(
                second.id,
                ProductChanges {
                    code: Some(first.code.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));

        let unchanged = store.get_product(second.id).await.unwrap().unwrap();
        assert_eq!(unchanged.code, second.code);
    }
}
