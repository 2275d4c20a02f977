use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{publish, run_action, run_load};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{same_name, ListFilter, NewSeller, Seller};
use crate::state::{Collection, StateAction, StateStore};
use crate::store::SellerStore;
use crate::validation::validate_form;

const LOAD_FAILED: &str = "Erro ao carregar vendedores";
const ADD_FAILED: &str = "Erro ao adicionar vendedor";
const REMOVE_FAILED: &str = "Erro ao remover vendedor";

pub struct SellerService {
    store: Arc<dyn SellerStore>,
    state: StateStore,
    event_sender: Arc<EventSender>,
}

impl SellerService {
    pub fn new(
        store: Arc<dyn SellerStore>,
        state: StateStore,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            store,
            state,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<Seller>, ServiceError> {
        let filter = ListFilter::active();
        run_load(
            &self.state,
            Collection::Sellers,
            LOAD_FAILED,
            self.store.list_sellers(&filter),
            StateAction::SellersLoaded,
        )
        .await
    }

    /// Same dedupe rule as categories: an active seller with the same name wins.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn add_seller(&self, mut input: NewSeller) -> Result<Seller, ServiceError> {
        validate_form(&input)?;
        input.name = input.name.trim().to_string();

        let existing = self.state.select(|snapshot| {
            snapshot
                .sellers
                .iter()
                .find(|s| s.active && same_name(&s.name, &input.name))
                .cloned()
        });
        if let Some(seller) = existing {
            debug!(seller_id = %seller.id, "Seller already exists");
            return Ok(seller);
        }

        let seller = run_action(
            &self.state,
            Collection::Sellers,
            ADD_FAILED,
            self.store.create_seller(input),
            |seller: &Seller| vec![StateAction::SellerAdded(seller.clone())],
        )
        .await?;

        publish(&self.event_sender, Event::SellerCreated(seller.id)).await;
        info!(seller_id = %seller.id, "Seller created");
        Ok(seller)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: Uuid) -> Result<(), ServiceError> {
        run_action(
            &self.state,
            Collection::Sellers,
            REMOVE_FAILED,
            self.store.soft_delete_seller(id),
            |_| vec![StateAction::SellerRemoved(id)],
        )
        .await?;

        publish(&self.event_sender, Event::SellerDeactivated(id)).await;
        info!(seller_id = %id, "Seller deactivated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<Seller>, ServiceError> {
        self.store.list_sellers(filter).await
    }

    #[instrument(skip(self))]
    pub async fn list_including_inactive(&self) -> Result<Vec<Seller>, ServiceError> {
        self.list(&ListFilter::all()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockSellerStore;
    use chrono::Utc;

    #[tokio::test]
    async fn failed_removal_keeps_the_seller() {
        let seller = Seller {
            id: Uuid::new_v4(),
            name: "Joana".into(),
            email: None,
            phone: None,
            active: true,
            created_at: Utc::now(),
        };
        let mut store = MockSellerStore::new();
        store
            .expect_soft_delete_seller()
            .returning(|_| Err(ServiceError::StorageError("offline".into())));
        let state = StateStore::default();
        state.dispatch(StateAction::SellerAdded(seller.clone()));
        let (events, _rx) = EventSender::channel(4);
        let service = SellerService::new(Arc::new(store), state.clone(), Arc::new(events));

        assert!(service.remove(seller.id).await.is_err());
        let snapshot = state.snapshot();
        assert_eq!(snapshot.sellers.len(), 1);
        assert_eq!(
            snapshot.status_of(Collection::Sellers).error.as_deref(),
            Some("Erro ao remover vendedor")
        );
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let mut store = MockSellerStore::new();
        store.expect_create_seller().never();
        let (events, _rx) = EventSender::channel(4);
        let service = SellerService::new(Arc::new(store), StateStore::default(), Arc::new(events));

        let err = service
            .add_seller(NewSeller {
                name: "Joana".into(),
                email: Some("joana-at-loja".into()),
                phone: None,
            })
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("email"));
    }
}
