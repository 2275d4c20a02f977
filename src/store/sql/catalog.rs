use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{flatten_txn_error, SqlStore};
use crate::adapters::{CategoryAdapter, GoalAdapter, PersistenceAdapter, SellerAdapter};
use crate::entities::{category, goal, seller};
use crate::errors::ServiceError;
use crate::models::{same_name, Category, Goal, ListFilter, NewGoal, NewSeller, Seller};
use crate::store::{CategoryStore, GoalStore, SellerStore};

#[async_trait]
impl CategoryStore for SqlStore {
    async fn list_categories(&self, filter: &ListFilter) -> Result<Vec<Category>, ServiceError> {
        let mut query = category::Entity::find();
        if !filter.include_inactive {
            query = query.filter(category::Column::Active.eq(true));
        }
        let rows = query
            .order_by_asc(category::Column::Name)
            .all(self.pool())
            .await?;
        Ok(rows.into_iter().map(CategoryAdapter::to_internal).collect())
    }

    #[instrument(skip(self))]
    async fn create_category(&self, name: String) -> Result<Category, ServiceError> {
        self.pool()
            .transaction::<_, Category, ServiceError>(move |txn| {
                Box::pin(async move {
                    let name = name.trim().to_string();
                    let existing = category::Entity::find()
                        .all(txn)
                        .await?
                        .into_iter()
                        .find(|row| same_name(&row.name, &name));

                    let row = match existing {
                        Some(row) if row.active => row,
                        Some(row) => {
                            info!(category = %row.name, "Reactivating category");
                            let mut active: category::ActiveModel = row.into();
                            active.active = Set(true);
                            active.update(txn).await?
                        }
                        None => {
                            category::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                name: Set(name),
                                active: Set(true),
                                created_at: Set(Utc::now()),
                            }
                            .insert(txn)
                            .await?
                        }
                    };
                    Ok(CategoryAdapter::to_internal(row))
                })
            })
            .await
            .map_err(flatten_txn_error)
    }

    async fn soft_delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let row = category::Entity::find_by_id(id)
            .one(self.pool())
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))?;
        let mut active: category::ActiveModel = row.into();
        active.active = Set(false);
        active.update(self.pool()).await?;
        Ok(())
    }
}

#[async_trait]
impl SellerStore for SqlStore {
    async fn list_sellers(&self, filter: &ListFilter) -> Result<Vec<Seller>, ServiceError> {
        let mut query = seller::Entity::find();
        if !filter.include_inactive {
            query = query.filter(seller::Column::Active.eq(true));
        }
        let rows = query
            .order_by_asc(seller::Column::Name)
            .all(self.pool())
            .await?;
        Ok(rows.into_iter().map(SellerAdapter::to_internal).collect())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_seller(&self, input: NewSeller) -> Result<Seller, ServiceError> {
        self.pool()
            .transaction::<_, Seller, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = seller::Entity::find()
                        .all(txn)
                        .await?
                        .into_iter()
                        .find(|row| same_name(&row.name, &input.name));

                    let row = match existing {
                        Some(row) if row.active => row,
                        Some(row) => {
                            let mut active: seller::ActiveModel = row.into();
                            active.active = Set(true);
                            if input.email.is_some() {
                                active.email = Set(input.email);
                            }
                            if input.phone.is_some() {
                                active.phone = Set(input.phone);
                            }
                            active.update(txn).await?
                        }
                        None => {
                            seller::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                name: Set(input.name.trim().to_string()),
                                email: Set(input.email),
                                phone: Set(input.phone),
                                active: Set(true),
                                created_at: Set(Utc::now()),
                            }
                            .insert(txn)
                            .await?
                        }
                    };
                    Ok(SellerAdapter::to_internal(row))
                })
            })
            .await
            .map_err(flatten_txn_error)
    }

    async fn soft_delete_seller(&self, id: Uuid) -> Result<(), ServiceError> {
        let row = seller::Entity::find_by_id(id)
            .one(self.pool())
            .await?
            .ok_or_else(|| ServiceError::not_found("Seller", id))?;
        let mut active: seller::ActiveModel = row.into();
        active.active = Set(false);
        active.update(self.pool()).await?;
        Ok(())
    }
}

#[async_trait]
impl GoalStore for SqlStore {
    async fn list_goals(&self, filter: &ListFilter) -> Result<Vec<Goal>, ServiceError> {
        let mut query = goal::Entity::find();
        if !filter.include_inactive {
            query = query.filter(goal::Column::Active.eq(true));
        }
        let rows = query
            .order_by_desc(goal::Column::Year)
            .order_by_desc(goal::Column::Month)
            .all(self.pool())
            .await?;
        Ok(rows.into_iter().map(GoalAdapter::to_internal).collect())
    }

    #[instrument(skip(self))]
    async fn save_goal(&self, input: NewGoal) -> Result<Goal, ServiceError> {
        self.pool()
            .transaction::<_, Goal, ServiceError>(move |txn| {
                Box::pin(async move {
                    let seller_filter = match input.seller_id {
                        Some(id) => goal::Column::SellerId.eq(id),
                        None => goal::Column::SellerId.is_null(),
                    };
                    let existing = goal::Entity::find()
                        .filter(goal::Column::Active.eq(true))
                        .filter(goal::Column::Month.eq(input.month))
                        .filter(goal::Column::Year.eq(input.year))
                        .filter(seller_filter)
                        .one(txn)
                        .await?;

                    let now = Utc::now();
                    let row = match existing {
                        Some(row) => {
                            let mut active: goal::ActiveModel = row.into();
                            active.target = Set(input.target);
                            active.updated_at = Set(now);
                            active.update(txn).await?
                        }
                        None => {
                            goal::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                seller_id: Set(input.seller_id),
                                month: Set(input.month),
                                year: Set(input.year),
                                target: Set(input.target),
                                active: Set(true),
                                updated_at: Set(now),
                            }
                            .insert(txn)
                            .await?
                        }
                    };
                    Ok(GoalAdapter::to_internal(row))
                })
            })
            .await
            .map_err(flatten_txn_error)
    }

    async fn soft_delete_goal(&self, id: Uuid) -> Result<(), ServiceError> {
        let row = goal::Entity::find_by_id(id)
            .one(self.pool())
            .await?
            .ok_or_else(|| ServiceError::not_found("Goal", id))?;
        let mut active: goal::ActiveModel = row.into();
        active.active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(self.pool()).await?;
        Ok(())
    }
}
