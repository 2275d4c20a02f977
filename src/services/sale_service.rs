use std::sync::Arc;

use metrics::counter;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{publish, run_action, run_load};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{NewSale, RecordedSale, Sale, SaleFilter, SaleLine};
use crate::state::{Collection, StateAction, StateStore};
use crate::store::SaleStore;

const LOAD_FAILED: &str = "Erro ao carregar vendas";
const ADD_FAILED: &str = "Erro ao registrar venda";
const CANCEL_FAILED: &str = "Erro ao cancelar venda";

fn recorded_transitions(recorded: &RecordedSale, action: StateAction) -> Vec<StateAction> {
    vec![action, StateAction::ProductsUpdated(recorded.products.clone())]
}

/// Sales actions. Stock follows the sale inside the store call.
pub struct SaleService {
    store: Arc<dyn SaleStore>,
    state: StateStore,
    event_sender: Arc<EventSender>,
}

impl SaleService {
    pub fn new(store: Arc<dyn SaleStore>, state: StateStore, event_sender: Arc<EventSender>) -> Self {
        Self {
            store,
            state,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<Sale>, ServiceError> {
        let filter = SaleFilter::default();
        run_load(
            &self.state,
            Collection::Sales,
            LOAD_FAILED,
            self.store.list_sales(&filter),
            StateAction::SalesLoaded,
        )
        .await
    }

    /// Records the sale and decrements stock for each item.
    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn add_sale(&self, input: NewSale) -> Result<Sale, ServiceError> {
        input.check()?;

        let recorded = run_action(
            &self.state,
            Collection::Sales,
            ADD_FAILED,
            self.store.record_sale(input),
            |recorded: &RecordedSale| {
                recorded_transitions(recorded, StateAction::SaleRecorded(recorded.sale.clone()))
            },
        )
        .await?;

        let sale = recorded.sale;
        publish(
            &self.event_sender,
            Event::SaleRecorded {
                sale_id: sale.id,
                total: sale.total(),
            },
        )
        .await;
        for product in recorded.products.iter().filter(|p| p.is_low_stock()) {
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
        counter!("meu_bentin.sales.recorded", 1);
        info!(sale_id = %sale.id, total = %sale.total(), units = sale.units(), "Sale recorded");
        Ok(sale)
    }

    /// Cancels a completed sale and returns its items to stock.
    #[instrument(skip(self))]
    pub async fn cancel_sale(&self, id: Uuid) -> Result<Sale, ServiceError> {
        let recorded = run_action(
            &self.state,
            Collection::Sales,
            CANCEL_FAILED,
            self.store.cancel_sale(id),
            |recorded: &RecordedSale| {
                recorded_transitions(recorded, StateAction::SaleUpdated(recorded.sale.clone()))
            },
        )
        .await?;

        publish(&self.event_sender, Event::SaleCancelled(id)).await;
        counter!("meu_bentin.sales.cancelled", 1);
        info!(sale_id = %id, "Sale cancelled");
        Ok(recorded.sale)
    }

    /// One row per sold item, newest sale first, filtered over the loaded sales.
    pub fn sale_lines(&self, filter: &SaleFilter) -> Vec<SaleLine> {
        self.state.select(|snapshot| {
            snapshot
                .sales
                .iter()
                .filter(|sale| filter.matches(sale))
                .flat_map(Sale::lines)
                .collect()
        })
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: &SaleFilter) -> Result<Vec<Sale>, ServiceError> {
        self.store.list_sales(filter).await
    }

    /// Fetches a single sale from the store.
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Sale, ServiceError> {
        self.store
            .get_sale(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProduct, NewSaleItem, PaymentMethod, SaleItem, SaleStatus};
    use crate::store::MockSaleStore;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn service(store: MockSaleStore) -> (SaleService, StateStore) {
        let state = StateStore::default();
        let (events, _rx) = EventSender::channel(16);
        (
            SaleService::new(Arc::new(store), state.clone(), Arc::new(events)),
            state,
        )
    }

    fn new_sale(product_id: Uuid, quantity: i32) -> NewSale {
        NewSale {
            seller_id: None,
            customer_name: Some("Ana".into()),
            payment_method: PaymentMethod::Pix,
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
    async fn empty_sale_never_reaches_the_store() {
        let mut store = MockSaleStore::new();
        store.expect_record_sale().never();
        let (service, state) = service(store);

        let mut input = new_sale(Uuid::new_v4(), 1);
        input.items.clear();
        let err = service.add_sale(input).await.unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("items"));
        assert!(state.snapshot().sales.is_empty());
    }

    #[tokio::test]
    async fn recorded_sale_updates_sales_and_stock() {
        let product = NewProduct {
            name: "Macacão".into(),
            price: dec!(59.90),
            quantity: 10,
            ..Default::default()
        }
        .into_product(Utc::now())
        .unwrap();
        let product_id = product.id;

        let (service, state) = {
            let mut store = MockSaleStore::new();
            let stored = product.clone();
            store.expect_record_sale().times(1).returning(move |input| {
                let mut after = stored.clone();
                after.quantity -= input.items[0].quantity;
                let sale = Sale {
                    id: Uuid::new_v4(),
                    seller_id: input.seller_id,
                    customer_name: input.customer_name,
                    payment_method: input.payment_method,
                    discount: input.discount,
                    notes: input.notes,
                    status: SaleStatus::Completed,
                    sold_at: Utc::now(),
                    updated_at: Utc::now(),
                    items: vec![SaleItem::new(&stored, input.items[0].quantity, None).unwrap()],
                };
                Ok(RecordedSale {
                    sale,
                    products: vec![after],
                })
            });
            service(store)
        };
        state.dispatch(StateAction::ProductAdded(product.clone()));

        let sale = service.add_sale(new_sale(product_id, 3)).await.unwrap();
        assert_eq!(sale.total(), dec!(179.70));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.sales.len(), 1);
        assert_eq!(snapshot.product(product_id).map(|p| p.quantity), Some(7));

        let lines = service.sale_lines(&SaleFilter::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, product_id);
    }

    #[tokio::test]
    async fn failed_sale_leaves_the_state_alone() {
        let mut store = MockSaleStore::new();
        store.expect_record_sale().returning(|_| {
            Err(ServiceError::InsufficientStock(
                "Macacão has 1 in stock, cannot apply -3".into(),
            ))
        });
        let (service, state) = service(store);

        assert!(service.add_sale(new_sale(Uuid::new_v4(), 3)).await.is_err());
        let snapshot = state.snapshot();
        assert!(snapshot.sales.is_empty());
        assert_eq!(
            snapshot.status_of(Collection::Sales).error.as_deref(),
            Some("Erro ao registrar venda")
        );
    }
}
