//! Dashboard figures computed over the loaded state.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::format::{format_brl, format_percent};
use crate::models::{Goal, GoalProgress, Product, Sale};
use crate::state::{AppSnapshot, StateStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockItem {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub quantity: i32,
    pub min_quantity: i32,
}

impl From<&Product> for LowStockItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            code: product.code.clone(),
            quantity: product.quantity,
            min_quantity: product.min_quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalLine {
    #[serde(flatten)]
    pub progress: GoalProgress,
    pub percentage_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub product_count: usize,
    pub low_stock: Vec<LowStockItem>,
    pub inventory_cost: Decimal,
    pub inventory_retail_value: Decimal,
    pub month_sales_total: Decimal,
    pub month_sales_count: usize,
    pub goals: Vec<GoalLine>,
    /// `R$` renderings of the money fields above
    pub labels: DashboardLabels,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardLabels {
    pub inventory_cost: String,
    pub inventory_retail_value: String,
    pub month_sales_total: String,
}

/// Month boundaries follow the store's wall clock, not UTC.
fn in_month(sale: &Sale, month: i32, year: i32, offset: FixedOffset) -> bool {
    let local = sale.sold_at.with_timezone(&offset);
    local.year() == year && local.month() as i32 == month
}

/// Completed sales of the goal's seller (or of the whole store) in its month
/// against the target.
pub fn goal_progress(goal: &Goal, sales: &[Sale], offset: FixedOffset) -> GoalProgress {
    let achieved: Decimal = sales
        .iter()
        .filter(|sale| !sale.is_cancelled())
        .filter(|sale| in_month(sale, goal.month, goal.year, offset))
        .filter(|sale| goal.seller_id.is_none() || sale.seller_id == goal.seller_id)
        .map(Sale::total)
        .sum();

    let percentage = if goal.target > Decimal::ZERO {
        (achieved / goal.target * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    };

    GoalProgress {
        goal: goal.clone(),
        achieved,
        remaining: (goal.target - achieved).max(Decimal::ZERO),
        percentage,
    }
}

/// Builds the dashboard for the store-local month containing `now`.
pub fn summarize(
    snapshot: &AppSnapshot,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> DashboardSummary {
    let local = now.with_timezone(&offset);
    let (month, year) = (local.month() as i32, local.year());
    let products: Vec<&Product> = snapshot.products.iter().filter(|p| p.active).collect();

    let inventory_cost: Decimal = products.iter().map(|p| p.stock_cost_value()).sum();
    let inventory_retail_value: Decimal = products.iter().map(|p| p.stock_retail_value()).sum();

    let month_sales: Vec<&Sale> = snapshot
        .sales
        .iter()
        .filter(|sale| !sale.is_cancelled() && in_month(sale, month, year, offset))
        .collect();
    let month_sales_total: Decimal = month_sales.iter().map(|sale| sale.total()).sum();

    let goals = snapshot
        .goals
        .iter()
        .filter(|goal| goal.active && goal.month == month && goal.year == year)
        .map(|goal| {
            let progress = goal_progress(goal, &snapshot.sales, offset);
            GoalLine {
                percentage_label: format_percent(progress.percentage),
                progress,
            }
        })
        .collect();

    DashboardSummary {
        product_count: products.len(),
        low_stock: products
            .iter()
            .filter(|p| p.is_low_stock())
            .map(|p| LowStockItem::from(*p))
            .collect(),
        inventory_cost,
        inventory_retail_value,
        month_sales_total,
        month_sales_count: month_sales.len(),
        goals,
        labels: DashboardLabels {
            inventory_cost: format_brl(inventory_cost),
            inventory_retail_value: format_brl(inventory_retail_value),
            month_sales_total: format_brl(month_sales_total),
        },
    }
}

pub struct ReportService {
    state: StateStore,
    offset: FixedOffset,
}

impl ReportService {
    pub fn new(state: StateStore, offset: FixedOffset) -> Self {
        Self { state, offset }
    }

    #[instrument(skip(self))]
    pub fn dashboard(&self) -> DashboardSummary {
        let now = Utc::now();
        self.state.select(|snapshot| summarize(snapshot, now, self.offset))
    }
}
