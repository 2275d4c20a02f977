//! Remote store clients.
//!
//! Each entity family has its own trait so services can be tested against
//! mocks. Failures are returned as-is (`DatabaseError` / `StorageError`) and
//! nothing is retried. Listing is active-only unless the filter says otherwise.

mod local;
mod sql;

pub use local::LocalStore;
pub use sql::SqlStore;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::{
    Category, Goal, ListFilter, NewGoal, NewProduct, NewSale, NewSeller, Product, ProductChanges,
    ProductFilter, RecordedSale, Sale, SaleFilter, Seller, StockChange, StockMovement,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products ordered by name.
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ServiceError>;

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, ServiceError>;

    /// Inserts the product and its opening ledger entry.
    async fn create_product(&self, input: NewProduct) -> Result<Product, ServiceError>;

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Product, ServiceError>;

    /// Applies a relative quantity change and records it. Rejects changes
    /// that would leave the quantity below zero.
    async fn adjust_quantity(
        &self,
        id: Uuid,
        change: StockChange,
    ) -> Result<(Product, StockMovement), ServiceError>;

    async fn soft_delete_product(&self, id: Uuid) -> Result<(), ServiceError>;

    /// Ledger entries for one product, oldest first.
    async fn list_movements(&self, product_id: Uuid) -> Result<Vec<StockMovement>, ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Sales ordered newest first.
    async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<Sale>, ServiceError>;

    async fn get_sale(&self, id: Uuid) -> Result<Option<Sale>, ServiceError>;

    /// Writes the sale, its items, the stock decrements and their ledger
    /// entries as one unit. Nothing is written when any step fails.
    async fn record_sale(&self, input: NewSale) -> Result<RecordedSale, ServiceError>;

    /// Marks the sale cancelled and puts its items back into stock.
    async fn cancel_sale(&self, id: Uuid) -> Result<RecordedSale, ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_categories(&self, filter: &ListFilter) -> Result<Vec<Category>, ServiceError>;

    /// Returns the category with this name, reactivating it if it was
    /// removed, or inserts a new one.
    async fn create_category(&self, name: String) -> Result<Category, ServiceError>;

    async fn soft_delete_category(&self, id: Uuid) -> Result<(), ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SellerStore: Send + Sync {
    async fn list_sellers(&self, filter: &ListFilter) -> Result<Vec<Seller>, ServiceError>;

    async fn create_seller(&self, input: NewSeller) -> Result<Seller, ServiceError>;

    async fn soft_delete_seller(&self, id: Uuid) -> Result<(), ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GoalStore: Send + Sync {
    async fn list_goals(&self, filter: &ListFilter) -> Result<Vec<Goal>, ServiceError>;

    /// Creates the goal or replaces the target of the active goal for the
    /// same seller and month.
    async fn save_goal(&self, input: NewGoal) -> Result<Goal, ServiceError>;

    async fn soft_delete_goal(&self, id: Uuid) -> Result<(), ServiceError>;
}

/// The store clients the services talk to.
#[derive(Clone)]
pub struct Backend {
    pub products: Arc<dyn ProductStore>,
    pub sales: Arc<dyn SaleStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub sellers: Arc<dyn SellerStore>,
    pub goals: Arc<dyn GoalStore>,
    /// Set when the relational store is in use
    pub database: Option<Arc<DbPool>>,
}

impl Backend {
    /// Uses one store for every entity family.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ProductStore + SaleStore + CategoryStore + SellerStore + GoalStore + 'static,
    {
        Self {
            products: store.clone(),
            sales: store.clone(),
            categories: store.clone(),
            sellers: store.clone(),
            goals: store,
            database: None,
        }
    }

    /// Relational store when a database URL is configured, local snapshot file otherwise.
    pub async fn open(config: &AppConfig) -> Result<Self, ServiceError> {
        if config.database_url.trim().is_empty() {
            info!(path = %config.data_file, "No database configured, using local snapshot store");
            let store = LocalStore::open(&config.data_file).await?;
            return Ok(Self::from_store(Arc::new(store)));
        }

        let pool = crate::db::establish_connection_from_app_config(config).await?;
        if config.auto_migrate {
            crate::db::run_migrations(&pool).await?;
        }
        let pool = Arc::new(pool);
        let mut backend = Self::from_store(Arc::new(SqlStore::new(pool.clone())));
        backend.database = Some(pool);
        Ok(backend)
    }
}
