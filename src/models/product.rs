use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::validation::{known_gender, non_negative_cost, not_blank, positive_price, MAX_AMOUNT};

/// Label shown for products without a category.
pub const UNCATEGORIZED: &str = "Sem categoria";

/// Application-side product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Stock keeping code printed on labels
    pub code: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost_price: Decimal,
    /// Markup over cost in percent; unset when cost is zero
    pub margin: Option<Decimal>,
    pub quantity: i32,
    pub min_quantity: i32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub fabric: Option<String>,
    pub gender: Option<String>,
    pub image_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Column text `sizes` and `colors` were loaded from, if any.
    #[serde(skip)]
    pub stored_lists: StoredLists,
}

/// Raw list column text carried alongside a loaded product.
///
/// Never part of product equality.
#[derive(Debug, Clone, Default)]
pub struct StoredLists {
    pub sizes: Option<String>,
    pub colors: Option<String>,
}

impl PartialEq for StoredLists {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Product {
    pub fn category_label(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORIZED)
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_quantity
    }

    pub fn stock_cost_value(&self) -> Decimal {
        self.cost_price.saturating_mul(Decimal::from(self.quantity))
    }

    pub fn stock_retail_value(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// `(price - cost) / cost * 100`, rounded to two places. `None` when cost is zero.
///
/// Fails with a `price` field error when the result does not fit the margin column.
pub fn compute_margin(price: Decimal, cost: Decimal) -> Result<Option<Decimal>, ServiceError> {
    if cost <= Decimal::ZERO {
        return Ok(None);
    }
    let margin = price
        .checked_sub(cost)
        .and_then(|gain| gain.checked_div(cost))
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .map(|m| m.round_dp(2))
        .filter(|m| m.abs() < MAX_AMOUNT)
        .ok_or_else(|| ServiceError::invalid_field("price", "margin is out of range"))?;
    Ok(Some(margin))
}

/// Builds a label code such as `VES-4K9Q` from the category (or name) prefix.
pub fn generate_product_code(category: Option<&str>, name: &str) -> String {
    let source = category.filter(|c| !c.trim().is_empty()).unwrap_or(name);
    let mut prefix: String = source
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();
    while prefix.len() < 3 {
        prefix.push('X');
    }

    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();

    format!("{}-{}", prefix, suffix)
}

/// Product creation form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(
        length(min = 1, max = 255, message = "name is required"),
        custom = "not_blank"
    )]
    pub name: String,
    #[validate(length(min = 4, max = 32, message = "code must have at least 4 characters"))]
    pub code: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    #[validate(length(max = 2000, message = "description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[validate(custom = "positive_price")]
    pub price: Decimal,
    #[serde(default)]
    #[validate(custom = "non_negative_cost")]
    pub cost_price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0, message = "quantity must not be negative"))]
    pub quantity: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "minimum quantity must not be negative"))]
    pub min_quantity: i32,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub fabric: Option<String>,
    #[validate(custom = "known_gender")]
    pub gender: Option<String>,
    #[validate(url(message = "image URL must be a valid URL"))]
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Materializes the record a store persists for this form.
    pub fn into_product(self, now: DateTime<Utc>) -> Result<Product, ServiceError> {
        let code = self
            .code
            .clone()
            .unwrap_or_else(|| generate_product_code(self.category.as_deref(), &self.name));

        Ok(Product {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            code,
            category: self.category,
            brand: self.brand,
            description: self.description,
            margin: compute_margin(self.price, self.cost_price)?,
            price: self.price,
            cost_price: self.cost_price,
            quantity: self.quantity,
            min_quantity: self.min_quantity,
            sizes: self.sizes,
            colors: self.colors,
            fabric: self.fabric,
            gender: self.gender.map(|g| g.trim().to_lowercase()),
            image_url: self.image_url,
            active: true,
            created_at: now,
            updated_at: now,
            stored_lists: StoredLists::default(),
        })
    }
}

/// Edit form. Absent fields are left untouched; quantity changes go through stock adjustments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    #[validate(
        length(min = 1, max = 255, message = "name is required"),
        custom = "not_blank"
    )]
    pub name: Option<String>,
    #[validate(length(min = 4, max = 32, message = "code must have at least 4 characters"))]
    pub code: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    #[validate(length(max = 2000, message = "description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[validate(custom = "positive_price")]
    pub price: Option<Decimal>,
    #[validate(custom = "non_negative_cost")]
    pub cost_price: Option<Decimal>,
    #[validate(range(min = 0, message = "minimum quantity must not be negative"))]
    pub min_quantity: Option<i32>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub fabric: Option<String>,
    #[validate(custom = "known_gender")]
    pub gender: Option<String>,
    #[validate(url(message = "image URL must be a valid URL"))]
    pub image_url: Option<String>,
}

impl ProductChanges {
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) -> Result<(), ServiceError> {
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(code) = self.code {
            product.code = code;
        }
        if let Some(category) = self.category {
            product.category = Some(category);
        }
        if let Some(brand) = self.brand {
            product.brand = Some(brand);
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(cost_price) = self.cost_price {
            product.cost_price = cost_price;
        }
        if let Some(min_quantity) = self.min_quantity {
            product.min_quantity = min_quantity;
        }
        if let Some(sizes) = self.sizes {
            product.sizes = sizes;
        }
        if let Some(colors) = self.colors {
            product.colors = colors;
        }
        if let Some(fabric) = self.fabric {
            product.fabric = Some(fabric);
        }
        if let Some(gender) = self.gender {
            product.gender = Some(gender.trim().to_lowercase());
        }
        if let Some(image_url) = self.image_url {
            product.image_url = Some(image_url);
        }
        product.margin = compute_margin(product.price, product.cost_price)?;
        product.updated_at = now;
        Ok(())
    }
}

/// Listing filter; active products only unless `include_inactive` is set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    #[serde(default)]
    pub include_inactive: bool,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn including_inactive() -> Self {
        Self {
            include_inactive: true,
            ..Default::default()
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if !self.include_inactive && !product.active {
            return false;
        }
        if let Some(category) = &self.category {
            if product.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => {
                let term = term.to_lowercase();
                product.name.to_lowercase().contains(&term)
                    || product.code.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}
