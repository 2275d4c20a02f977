use std::str::FromStr;

use super::PersistenceAdapter;
use crate::entities::{sale, sale_item};
use crate::models::{PaymentMethod, Sale, SaleItem, SaleStatus};

/// Joins a sale header row with its item rows.
pub struct SaleAdapter;

impl SaleAdapter {
    fn item_to_internal(row: sale_item::Model) -> SaleItem {
        SaleItem {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            line_total: row.line_total,
        }
    }

    pub fn item_to_remote(sale_id: uuid::Uuid, item: &SaleItem) -> sale_item::Model {
        sale_item::Model {
            id: item.id,
            sale_id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            line_total: item.line_total,
        }
    }
}

impl PersistenceAdapter for SaleAdapter {
    type Row = (sale::Model, Vec<sale_item::Model>);
    type Record = Sale;

    fn to_internal((header, items): Self::Row) -> Sale {
        Sale {
            id: header.id,
            seller_id: header.seller_id,
            customer_name: header.customer_name,
            payment_method: PaymentMethod::from_str(&header.payment_method)
                .unwrap_or(PaymentMethod::Other),
            discount: header.discount,
            notes: header.notes,
            status: SaleStatus::from_str(&header.status).unwrap_or(SaleStatus::Completed),
            sold_at: header.sold_at,
            updated_at: header.updated_at,
            items: items.into_iter().map(Self::item_to_internal).collect(),
        }
    }

    fn to_remote(record: &Sale) -> Self::Row {
        let header = sale::Model {
            id: record.id,
            seller_id: record.seller_id,
            customer_name: record.customer_name.clone(),
            payment_method: record.payment_method.to_string(),
            discount: record.discount,
            notes: record.notes.clone(),
            status: record.status.to_string(),
            sold_at: record.sold_at,
            updated_at: record.updated_at,
        };
        let items = record
            .items
            .iter()
            .map(|item| Self::item_to_remote(record.id, item))
            .collect();
        (header, items)
    }
}
