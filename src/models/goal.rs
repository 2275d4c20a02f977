use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::positive_target;

/// Monthly sales target for one seller, or for the whole store when `seller_id` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub seller_id: Option<Uuid>,
    pub month: i32,
    pub year: i32,
    pub target: Decimal,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn covers(&self, seller_id: Option<Uuid>, month: i32, year: i32) -> bool {
        self.seller_id == seller_id && self.month == month && self.year == year
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub seller_id: Option<Uuid>,
    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12"))]
    pub month: i32,
    #[validate(range(min = 2000, max = 2100, message = "year must be between 2000 and 2100"))]
    pub year: i32,
    #[validate(custom = "positive_target")]
    pub target: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub goal: Goal,
    pub achieved: Decimal,
    pub remaining: Decimal,
    /// achieved / target in percent, two places
    pub percentage: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_form;
    use rust_decimal_macros::dec;

    #[test]
    fn target_must_fit_the_money_columns() {
        let mut goal = NewGoal {
            seller_id: None,
            month: 3,
            year: 2025,
            target: dec!(15000),
        };
        assert!(validate_form(&goal).is_ok());

        goal.target = dec!(100000000);
        let err = validate_form(&goal).unwrap_err();
        assert_eq!(
            err.field_errors().unwrap().get("target").map(String::as_str),
            Some("target must be less than 100000000")
        );
    }
}
