use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    /// Label code, unique per store
    #[sea_orm(unique)]
    pub code: String,

    /// Category name; products keep the name, not a foreign key
    pub category: Option<String>,

    pub brand: Option<String>,

    pub description: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub cost_price: Decimal,

    /// Stored copy of the computed markup
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub margin: Option<Decimal>,

    pub quantity: i32,

    pub min_quantity: i32,

    /// JSON array of sizes (e.g. `["P","M","G"]`); older rows are comma-separated
    pub sizes: Option<String>,

    /// JSON array of colors, same format as `sizes`
    pub colors: Option<String>,

    pub fabric: Option<String>,

    pub gender: Option<String>,

    pub image_url: Option<String>,

    pub active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_movement::Entity")]
    StockMovements,
}

impl Related<super::stock_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
