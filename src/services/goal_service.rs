use std::sync::Arc;

use chrono::FixedOffset;
use tracing::{info, instrument};
use uuid::Uuid;

use super::reports::goal_progress;
use super::{publish, run_action, run_load};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{Goal, GoalProgress, ListFilter, NewGoal};
use crate::state::{Collection, StateAction, StateStore};
use crate::store::GoalStore;
use crate::validation::validate_form;

const LOAD_FAILED: &str = "Erro ao carregar metas";
const SAVE_FAILED: &str = "Erro ao salvar meta";
const REMOVE_FAILED: &str = "Erro ao remover meta";

/// Monthly sales targets, per seller or for the whole store.
pub struct GoalService {
    store: Arc<dyn GoalStore>,
    state: StateStore,
    event_sender: Arc<EventSender>,
    /// Store wall clock used for month boundaries
    offset: FixedOffset,
}

impl GoalService {
    pub fn new(
        store: Arc<dyn GoalStore>,
        state: StateStore,
        event_sender: Arc<EventSender>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            state,
            event_sender,
            offset,
        }
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<Goal>, ServiceError> {
        let filter = ListFilter::active();
        run_load(
            &self.state,
            Collection::Goals,
            LOAD_FAILED,
            self.store.list_goals(&filter),
            StateAction::GoalsLoaded,
        )
        .await
    }

    /// Creates the goal or replaces the target of the existing one for the
    /// same seller and month.
    #[instrument(skip(self))]
    pub async fn set_goal(&self, input: NewGoal) -> Result<Goal, ServiceError> {
        validate_form(&input)?;
        if let Some(seller_id) = input.seller_id {
            let known = self
                .state
                .select(|snapshot| snapshot.seller(seller_id).is_some());
            if !known {
                return Err(ServiceError::invalid_field("sellerId", "unknown seller"));
            }
        }

        let goal = run_action(
            &self.state,
            Collection::Goals,
            SAVE_FAILED,
            self.store.save_goal(input),
            |goal: &Goal| vec![StateAction::GoalSaved(goal.clone())],
        )
        .await?;

        publish(&self.event_sender, Event::GoalSaved(goal.id)).await;
        info!(goal_id = %goal.id, month = goal.month, year = goal.year, target = %goal.target, "Goal saved");
        Ok(goal)
    }

    #[instrument(skip(self))]
    pub async fn remove_goal(&self, id: Uuid) -> Result<(), ServiceError> {
        run_action(
            &self.state,
            Collection::Goals,
            REMOVE_FAILED,
            self.store.soft_delete_goal(id),
            |_| vec![StateAction::GoalRemoved(id)],
        )
        .await?;

        publish(&self.event_sender, Event::GoalDeactivated(id)).await;
        info!(goal_id = %id, "Goal deactivated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<Goal>, ServiceError> {
        self.store.list_goals(filter).await
    }

    /// Progress of every loaded goal against the loaded sales.
    pub fn progress(&self) -> Vec<GoalProgress> {
        self.state.select(|snapshot| {
            snapshot
                .goals
                .iter()
                .map(|goal| goal_progress(goal, &snapshot.sales, self.offset))
                .collect()
        })
    }
}
