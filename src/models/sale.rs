use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

use super::product::Product;
use crate::errors::ServiceError;
use crate::validation::{field_errors, non_negative_discount, positive_price, MAX_AMOUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Debit,
    Credit,
    /// Instant bank transfer
    Pix,
    Installment,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SaleStatus {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Copied from the product at sale time so the sale still renders if the product changes
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

impl SaleItem {
    /// Prices the line. Fails when the line total does not fit the money columns.
    pub fn new(
        product: &Product,
        quantity: i32,
        unit_price: Option<Decimal>,
    ) -> Result<Self, ServiceError> {
        let unit_price = unit_price.unwrap_or(product.price);
        let line_total = unit_price
            .checked_mul(Decimal::from(quantity))
            .filter(|total| total.abs() < MAX_AMOUNT)
            .ok_or_else(|| {
                ServiceError::invalid_field(
                    "items",
                    format!("line total must be less than {}", MAX_AMOUNT),
                )
            })?;
        Ok(Self {
            id: Uuid::new_v4(),
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price,
            quantity,
            line_total,
        })
    }
}

/// Sale header with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub seller_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub discount: Decimal,
    pub notes: Option<String>,
    pub status: SaleStatus,
    pub sold_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<SaleItem>,
}

impl Sale {
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(|item| item.line_total).sum()
    }

    /// Subtotal minus discount, never below zero.
    pub fn total(&self) -> Decimal {
        (self.subtotal() - self.discount).max(Decimal::ZERO)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == SaleStatus::Cancelled
    }

    pub fn units(&self) -> i32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Flat one-row-per-item projection used by sales tables and exports.
    pub fn lines(&self) -> Vec<SaleLine> {
        self.items
            .iter()
            .map(|item| SaleLine {
                id: format!("{}-{}", self.id, item.id),
                sale_id: self.id,
                item_id: item.id,
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
                line_total: item.line_total,
                payment_method: self.payment_method,
                discount: self.discount,
                seller_id: self.seller_id,
                customer_name: self.customer_name.clone(),
                notes: self.notes.clone(),
                status: self.status,
                sold_at: self.sold_at,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    /// `{sale_id}-{item_id}`
    pub id: String,
    pub sale_id: Uuid,
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
    pub payment_method: PaymentMethod,
    pub discount: Decimal,
    pub seller_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub status: SaleStatus,
    pub sold_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSaleItem {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Overrides the catalogue price for this sale only
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub seller_id: Option<Uuid>,
    #[validate(length(max = 255, message = "customer name cannot exceed 255 characters"))]
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    #[validate(custom = "non_negative_discount")]
    pub discount: Decimal,
    #[validate(length(max = 1000, message = "notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
    /// Defaults to the time the sale is recorded
    pub sold_at: Option<DateTime<Utc>>,
    pub items: Vec<NewSaleItem>,
}

impl NewSale {
    /// Header validation plus per-item rules the derive cannot reach.
    pub fn check(&self) -> Result<(), ServiceError> {
        let mut fields = match self.validate() {
            Ok(()) => Default::default(),
            Err(errors) => field_errors(&errors),
        };

        if self.items.is_empty() {
            fields.insert(
                "items".to_string(),
                "a sale needs at least one item".to_string(),
            );
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.quantity <= 0 {
                fields.insert(
                    format!("items[{}].quantity", index),
                    "quantity must be greater than zero".to_string(),
                );
            }
            if let Some(Err(err)) = item.unit_price.as_ref().map(positive_price) {
                fields.insert(
                    format!("items[{}].unitPrice", index),
                    err.message
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string()),
                );
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(fields))
        }
    }
}

/// A committed sale (or cancellation) and the products whose stock it changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedSale {
    pub sale: Sale,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleFilter {
    pub status: Option<SaleStatus>,
    pub seller_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl SaleFilter {
    pub fn matches(&self, sale: &Sale) -> bool {
        self.status.map_or(true, |status| sale.status == status)
            && self.seller_id.map_or(true, |id| sale.seller_id == Some(id))
            && self.from.map_or(true, |from| sale.sold_at >= from)
            && self.to.map_or(true, |to| sale.sold_at < to)
    }
}
