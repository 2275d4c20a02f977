//! Application state container.
//!
//! One writer (the services) and any number of readers. Readers take cheap
//! snapshots or subscribe to change notifications through a `watch` channel.
//! Every transition goes through [`reduce`].

mod reducer;

pub use reducer::reduce;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::watch;
use uuid::Uuid;

use crate::models::{Category, Goal, Product, Sale, Seller};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    Products,
    Sales,
    Categories,
    Sellers,
    Goals,
}

/// Loading and error state of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatus {
    /// Operations started and not yet finished
    pub in_flight: u32,
    /// Last failure message shown to the operator
    pub error: Option<String>,
}

impl CollectionStatus {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    pub products: Vec<Product>,
    pub sales: Vec<Sale>,
    pub categories: Vec<Category>,
    pub sellers: Vec<Seller>,
    pub goals: Vec<Goal>,
    pub status: BTreeMap<Collection, CollectionStatus>,
}

impl AppSnapshot {
    pub fn status_of(&self, collection: Collection) -> CollectionStatus {
        self.status.get(&collection).cloned().unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.status.values().any(CollectionStatus::is_loading)
    }

    pub fn product(&self, id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn sale(&self, id: Uuid) -> Option<&Sale> {
        self.sales.iter().find(|s| s.id == id)
    }

    pub fn seller(&self, id: Uuid) -> Option<&Seller> {
        self.sellers.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateAction {
    ProductsLoaded(Vec<Product>),
    ProductAdded(Product),
    /// Replaces products by id; used for edits and stock changes
    ProductsUpdated(Vec<Product>),
    ProductRemoved(Uuid),

    SalesLoaded(Vec<Sale>),
    SaleRecorded(Sale),
    SaleUpdated(Sale),

    CategoriesLoaded(Vec<Category>),
    CategoryAdded(Category),
    CategoryRemoved(Uuid),

    SellersLoaded(Vec<Seller>),
    SellerAdded(Seller),
    SellerRemoved(Uuid),

    GoalsLoaded(Vec<Goal>),
    GoalSaved(Goal),
    GoalRemoved(Uuid),

    OperationStarted(Collection),
    OperationSucceeded(Collection),
    OperationFailed {
        collection: Collection,
        message: String,
    },
    ErrorCleared(Collection),
}

/// Shared handle to the application state.
#[derive(Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<AppSnapshot>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(AppSnapshot::default())
    }
}

impl StateStore {
    pub fn new(initial: AppSnapshot) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn dispatch(&self, action: StateAction) {
        self.tx.send_modify(|snapshot| {
            let current = std::mem::take(snapshot);
            *snapshot = reduce(current, action);
        });
    }

    pub fn snapshot(&self) -> AppSnapshot {
        self.tx.borrow().clone()
    }

    /// Reads a value out of the current snapshot without cloning all of it.
    pub fn select<T>(&self, f: impl FnOnce(&AppSnapshot) -> T) -> T {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<AppSnapshot> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_dispatched_changes() {
        let store = StateStore::default();
        let mut rx = store.subscribe();

        store.dispatch(StateAction::OperationStarted(Collection::Sales));
        rx.changed().await.unwrap();
        assert!(rx.borrow().status_of(Collection::Sales).is_loading());
        assert!(!store.select(|s| s.status_of(Collection::Products).is_loading()));
    }
}
