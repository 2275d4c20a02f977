use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{publish, run_action, run_load};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{same_name, Category, ListFilter, NewCategory};
use crate::state::{Collection, StateAction, StateStore};
use crate::store::CategoryStore;
use crate::validation::validate_form;

const LOAD_FAILED: &str = "Erro ao carregar categorias";
const ADD_FAILED: &str = "Erro ao adicionar categoria";
const REMOVE_FAILED: &str = "Erro ao remover categoria";

pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
    state: StateStore,
    event_sender: Arc<EventSender>,
}

impl CategoryService {
    pub fn new(
        store: Arc<dyn CategoryStore>,
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
    pub async fn load(&self) -> Result<Vec<Category>, ServiceError> {
        let filter = ListFilter::active();
        run_load(
            &self.state,
            Collection::Categories,
            LOAD_FAILED,
            self.store.list_categories(&filter),
            StateAction::CategoriesLoaded,
        )
        .await
    }

    /// Adds a category unless an active one with the same name is already
    /// loaded, in which case that one is returned untouched.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn add_category(&self, input: NewCategory) -> Result<Category, ServiceError> {
        validate_form(&input)?;
        let name = input.name.trim().to_string();

        let existing = self.state.select(|snapshot| {
            snapshot
                .categories
                .iter()
                .find(|c| c.active && same_name(&c.name, &name))
                .cloned()
        });
        if let Some(category) = existing {
            debug!(category_id = %category.id, "Category already exists");
            return Ok(category);
        }

        let category = run_action(
            &self.state,
            Collection::Categories,
            ADD_FAILED,
            self.store.create_category(name),
            |category: &Category| vec![StateAction::CategoryAdded(category.clone())],
        )
        .await?;

        publish(&self.event_sender, Event::CategoryCreated(category.id)).await;
        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: Uuid) -> Result<(), ServiceError> {
        run_action(
            &self.state,
            Collection::Categories,
            REMOVE_FAILED,
            self.store.soft_delete_category(id),
            |_| vec![StateAction::CategoryRemoved(id)],
        )
        .await?;

        publish(&self.event_sender, Event::CategoryDeactivated(id)).await;
        info!(category_id = %id, "Category deactivated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<Category>, ServiceError> {
        self.store.list_categories(filter).await
    }

    /// Every category, removed ones included.
    #[instrument(skip(self))]
    pub async fn list_including_inactive(&self) -> Result<Vec<Category>, ServiceError> {
        self.list(&ListFilter::all()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockCategoryStore;
    use chrono::Utc;

    fn service(store: MockCategoryStore) -> (CategoryService, StateStore) {
        let state = StateStore::default();
        let (events, _rx) = EventSender::channel(16);
        (
            CategoryService::new(Arc::new(store), state.clone(), Arc::new(events)),
            state,
        )
    }

    #[tokio::test]
    async fn adding_the_same_name_twice_inserts_once() {
        let mut store = MockCategoryStore::new();
        store.expect_create_category().times(1).returning(|name| {
            Ok(Category {
                id: Uuid::new_v4(),
                name,
                active: true,
                created_at: Utc::now(),
            })
        });
        let (service, state) = service(store);

        let first = service
            .add_category(NewCategory {
                name: "Roupas".into(),
            })
            .await
            .unwrap();
        let second = service
            .add_category(NewCategory {
                name: " roupas ".into(),
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(state.snapshot().categories.len(), 1);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let mut store = MockCategoryStore::new();
        store.expect_create_category().never();
        let (service, _) = service(store);

        let err = service
            .add_category(NewCategory { name: "   ".into() })
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("name"));
    }
}
