use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{publish, run_action, run_load};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{
    AdjustStock, NewProduct, Product, ProductChanges, ProductFilter, RegisterLoss, StockChange,
    StockMovement,
};
use crate::state::{Collection, StateAction, StateStore};
use crate::store::ProductStore;
use crate::validation::validate_form;

const LOAD_FAILED: &str = "Erro ao carregar produtos";
const ADD_FAILED: &str = "Erro ao adicionar produto";
const EDIT_FAILED: &str = "Erro ao atualizar produto";
const STOCK_FAILED: &str = "Erro ao ajustar estoque";
const LOSS_FAILED: &str = "Erro ao registrar perda";
const REMOVE_FAILED: &str = "Erro ao remover produto";

/// Result of a stock change: the product as stored and its ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub product: Product,
    pub movement: StockMovement,
}

/// Catalogue and stock actions
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    state: StateStore,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(
        store: Arc<dyn ProductStore>,
        state: StateStore,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            store,
            state,
            event_sender,
        }
    }

    /// Reloads the active catalogue into the state.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<Product>, ServiceError> {
        let filter = ProductFilter::default();
        run_load(
            &self.state,
            Collection::Products,
            LOAD_FAILED,
            self.store.list_products(&filter),
            StateAction::ProductsLoaded,
        )
        .await
    }

    /// Queries the store directly, so removed products can be listed too.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, ServiceError> {
        self.store.list_products(filter).await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn add(&self, input: NewProduct) -> Result<Product, ServiceError> {
        validate_form(&input)?;

        let product = run_action(
            &self.state,
            Collection::Products,
            ADD_FAILED,
            self.store.create_product(input),
            |product: &Product| vec![StateAction::ProductAdded(product.clone())],
        )
        .await?;

        publish(&self.event_sender, Event::ProductCreated(product.id)).await;
        self.warn_if_low(&product).await;
        info!(product_id = %product.id, code = %product.code, "Product created");
        Ok(product)
    }

    #[instrument(skip(self, changes))]
    pub async fn edit(&self, id: Uuid, changes: ProductChanges) -> Result<Product, ServiceError> {
        validate_form(&changes)?;

        let product = run_action(
            &self.state,
            Collection::Products,
            EDIT_FAILED,
            self.store.update_product(id, changes),
            |product: &Product| vec![StateAction::ProductsUpdated(vec![product.clone()])],
        )
        .await?;

        publish(&self.event_sender, Event::ProductUpdated(product.id)).await;
        info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Relative quantity change (restock or correction).
    #[instrument(skip(self, input))]
    pub async fn adjust_stock(
        &self,
        id: Uuid,
        input: AdjustStock,
    ) -> Result<StockUpdate, ServiceError> {
        validate_form(&input)?;
        if input.delta == 0 {
            return Err(ServiceError::invalid_field(
                "delta",
                "adjustment must not be zero",
            ));
        }

        self.change_stock(id, StockChange::adjustment(input.delta, input.reason), STOCK_FAILED)
            .await
    }

    /// Removes damaged or lost units from stock.
    #[instrument(skip(self, input))]
    pub async fn register_loss(
        &self,
        id: Uuid,
        input: RegisterLoss,
    ) -> Result<StockUpdate, ServiceError> {
        validate_form(&input)?;
        if input.reason.trim().is_empty() {
            return Err(ServiceError::invalid_field("reason", "reason is required"));
        }

        self.change_stock(id, StockChange::loss(input.quantity, input.reason), LOSS_FAILED)
            .await
    }

    async fn change_stock(
        &self,
        id: Uuid,
        change: StockChange,
        failure_message: &'static str,
    ) -> Result<StockUpdate, ServiceError> {
        let (product, movement) = run_action(
            &self.state,
            Collection::Products,
            failure_message,
            self.store.adjust_quantity(id, change),
            |(product, _): &(Product, StockMovement)| {
                vec![StateAction::ProductsUpdated(vec![product.clone()])]
            },
        )
        .await?;

        publish(
            &self.event_sender,
            Event::StockChanged {
                product_id: product.id,
                kind: movement.kind,
                previous_quantity: movement.previous_quantity,
                new_quantity: movement.new_quantity,
            },
        )
        .await;
        self.warn_if_low(&product).await;
        counter!("meu_bentin.stock.changes", 1, "kind" => movement.kind.to_string());
        info!(
            product_id = %product.id,
            change = movement.quantity_change,
            quantity = product.quantity,
            "Stock changed"
        );
        Ok(StockUpdate { product, movement })
    }

    /// Soft delete; the product leaves the state but stays in the store.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: Uuid) -> Result<(), ServiceError> {
        run_action(
            &self.state,
            Collection::Products,
            REMOVE_FAILED,
            self.store.soft_delete_product(id),
            |_| vec![StateAction::ProductRemoved(id)],
        )
        .await?;

        publish(&self.event_sender, Event::ProductDeactivated(id)).await;
        info!(product_id = %id, "Product deactivated");
        Ok(())
    }

    /// Stock ledger of one product, oldest first.
    #[instrument(skip(self))]
    pub async fn movements(&self, id: Uuid) -> Result<Vec<StockMovement>, ServiceError> {
        self.store.list_movements(id).await
    }

    /// Looks a product up in the loaded catalogue.
    pub fn cached(&self, id: Uuid) -> Option<Product> {
        self.state.select(|snapshot| snapshot.product(id).cloned())
    }

    async fn warn_if_low(&self, product: &Product) {
        if product.is_low_stock() {
            publish(
                &self.event_sender,
                Event::LowStock {
                    product_id: product.id,
                    name: product.name.clone(),
                    quantity: product.quantity,
                    min_quantity: product.min_quantity,
                },
            )
            .await;
        }
    }
}
