//! Action layer.
//!
//! Every mutating action follows the same shape: validate the form, mark the
//! collection busy, call the store, then either apply the success
//! transitions or record a fixed operator-facing message. Validation
//! failures return before anything is dispatched.

pub mod category_service;
pub mod goal_service;
pub mod product_service;
pub mod reports;
pub mod sale_service;
pub mod seller_service;

pub use category_service::CategoryService;
pub use goal_service::GoalService;
pub use product_service::{ProductService, StockUpdate};
pub use reports::{DashboardSummary, LowStockItem, ReportService};
pub use sale_service::SaleService;
pub use seller_service::SellerService;

use std::future::Future;
use std::sync::Arc;

use chrono::FixedOffset;
use metrics::counter;
use tracing::{error, warn};

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::state::{Collection, StateAction, StateStore};
use crate::store::Backend;

/// Runs a store call as a tracked operation on `collection`.
///
/// On success the actions built by `on_success` are applied before the
/// operation is marked finished. On failure the detail is logged and only
/// `failure_message` reaches the state.
pub(crate) async fn run_action<T, Fut, S>(
    state: &StateStore,
    collection: Collection,
    failure_message: &'static str,
    operation: Fut,
    on_success: S,
) -> Result<T, ServiceError>
where
    Fut: Future<Output = Result<T, ServiceError>>,
    S: FnOnce(&T) -> Vec<StateAction>,
{
    state.dispatch(StateAction::OperationStarted(collection));
    match operation.await {
        Ok(value) => {
            for action in on_success(&value) {
                state.dispatch(action);
            }
            state.dispatch(StateAction::OperationSucceeded(collection));
            Ok(value)
        }
        Err(e) => {
            error!(collection = %collection, "{}: {}", failure_message, e);
            counter!("meu_bentin.actions.failed", 1, "collection" => collection.to_string());
            state.dispatch(StateAction::OperationFailed {
                collection,
                message: failure_message.to_string(),
            });
            Err(e)
        }
    }
}

/// Like [`run_action`] for a full reload; the loaded action itself completes
/// the operation.
pub(crate) async fn run_load<T, Fut>(
    state: &StateStore,
    collection: Collection,
    failure_message: &'static str,
    operation: Fut,
    loaded: fn(Vec<T>) -> StateAction,
) -> Result<Vec<T>, ServiceError>
where
    T: Clone,
    Fut: Future<Output = Result<Vec<T>, ServiceError>>,
{
    state.dispatch(StateAction::OperationStarted(collection));
    match operation.await {
        Ok(items) => {
            state.dispatch(loaded(items.clone()));
            Ok(items)
        }
        Err(e) => {
            error!(collection = %collection, "{}: {}", failure_message, e);
            state.dispatch(StateAction::OperationFailed {
                collection,
                message: failure_message.to_string(),
            });
            Err(e)
        }
    }
}

/// Publishes after commit; a closed channel is logged, never surfaced.
pub(crate) async fn publish(events: &EventSender, event: Event) {
    if let Err(e) = events.send(event).await {
        warn!("Failed to publish event: {}", e);
    }
}

/// All services wired to one backend, state and event channel.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub sales: Arc<SaleService>,
    pub categories: Arc<CategoryService>,
    pub sellers: Arc<SellerService>,
    pub goals: Arc<GoalService>,
    pub reports: Arc<ReportService>,
    pub state: StateStore,
}

impl AppServices {
    /// `offset` is the store's UTC offset, used wherever sales are grouped by month.
    pub fn new(
        backend: Backend,
        state: StateStore,
        events: Arc<EventSender>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            products: Arc::new(ProductService::new(
                backend.products.clone(),
                state.clone(),
                events.clone(),
            )),
            sales: Arc::new(SaleService::new(
                backend.sales.clone(),
                state.clone(),
                events.clone(),
            )),
            categories: Arc::new(CategoryService::new(
                backend.categories.clone(),
                state.clone(),
                events.clone(),
            )),
            sellers: Arc::new(SellerService::new(
                backend.sellers.clone(),
                state.clone(),
                events.clone(),
            )),
            goals: Arc::new(GoalService::new(
                backend.goals.clone(),
                state.clone(),
                events,
                offset,
            )),
            reports: Arc::new(ReportService::new(state.clone(), offset)),
            state,
        }
    }

    /// Loads every collection; stops at the first failure.
    pub async fn load_all(&self) -> Result<(), ServiceError> {
        self.categories.load().await?;
        self.sellers.load().await?;
        self.products.load().await?;
        self.sales.load().await?;
        self.goals.load().await?;
        Ok(())
    }
}
