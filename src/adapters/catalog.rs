use super::{decode_list, list_column, PersistenceAdapter};
use crate::entities::{category, goal, product, seller};
use crate::models::{Category, Goal, Product, Seller, StoredLists};

pub struct ProductAdapter;

impl PersistenceAdapter for ProductAdapter {
    type Row = product::Model;
    type Record = Product;

    fn to_internal(row: product::Model) -> Product {
        Product {
            id: row.id,
            name: row.name,
            code: row.code,
            category: row.category,
            brand: row.brand,
            description: row.description,
            price: row.price,
            cost_price: row.cost_price,
            margin: row.margin,
            quantity: row.quantity,
            min_quantity: row.min_quantity,
            sizes: decode_list(row.sizes.as_deref()),
            colors: decode_list(row.colors.as_deref()),
            fabric: row.fabric,
            gender: row.gender,
            image_url: row.image_url,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            stored_lists: StoredLists {
                sizes: row.sizes,
                colors: row.colors,
            },
        }
    }

    fn to_remote(record: &Product) -> product::Model {
        product::Model {
            id: record.id,
            name: record.name.clone(),
            code: record.code.clone(),
            category: record.category.clone(),
            brand: record.brand.clone(),
            description: record.description.clone(),
            price: record.price,
            cost_price: record.cost_price,
            margin: record.margin,
            quantity: record.quantity,
            min_quantity: record.min_quantity,
            sizes: list_column(&record.stored_lists.sizes, &record.sizes),
            colors: list_column(&record.stored_lists.colors, &record.colors),
            fabric: record.fabric.clone(),
            gender: record.gender.clone(),
            image_url: record.image_url.clone(),
            active: record.active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

pub struct CategoryAdapter;

impl PersistenceAdapter for CategoryAdapter {
    type Row = category::Model;
    type Record = Category;

    fn to_internal(row: category::Model) -> Category {
        Category {
            id: row.id,
            name: row.name,
            active: row.active,
            created_at: row.created_at,
        }
    }

    fn to_remote(record: &Category) -> category::Model {
        category::Model {
            id: record.id,
            name: record.name.clone(),
            active: record.active,
            created_at: record.created_at,
        }
    }
}

pub struct SellerAdapter;

impl PersistenceAdapter for SellerAdapter {
    type Row = seller::Model;
    type Record = Seller;

    fn to_internal(row: seller::Model) -> Seller {
        Seller {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            active: row.active,
            created_at: row.created_at,
        }
    }

    fn to_remote(record: &Seller) -> seller::Model {
        seller::Model {
            id: record.id,
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            active: record.active,
            created_at: record.created_at,
        }
    }
}

pub struct GoalAdapter;

impl PersistenceAdapter for GoalAdapter {
    type Row = goal::Model;
    type Record = Goal;

    fn to_internal(row: goal::Model) -> Goal {
        Goal {
            id: row.id,
            seller_id: row.seller_id,
            month: row.month,
            year: row.year,
            target: row.target,
            active: row.active,
            updated_at: row.updated_at,
        }
    }

    fn to_remote(record: &Goal) -> goal::Model {
        goal::Model {
            id: record.id,
            seller_id: record.seller_id,
            month: record.month,
            year: record.year,
            target: record.target,
            active: record.active,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn product_row() -> product::Model {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        product::Model {
            id: Uuid::new_v4(),
            name: "Macacão plush".into(),
            code: "MAC-7QZ2".into(),
            category: None,
            brand: Some("Bentin".into()),
            description: None,
            price: dec!(89.90),
            cost_price: dec!(35.00),
            margin: Some(dec!(156.86)),
            quantity: 7,
            min_quantity: 2,
            sizes: Some("RN,P,M".into()),
            colors: None,
            fabric: Some("plush".into()),
            gender: Some("unissex".into()),
            image_url: None,
            active: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn product_row_round_trips() {
        let row = product_row();
        let record = ProductAdapter::to_internal(row.clone());
        assert_eq!(record.sizes, vec!["RN", "P", "M"]);
        assert!(record.colors.is_empty());
        assert_eq!(record.category_label(), crate::models::UNCATEGORIZED);
        assert_eq!(ProductAdapter::to_remote(&record), row);
    }

    #[test]
    fn irregular_list_columns_survive_the_round_trip() {
        let mut row = product_row();
        row.sizes = Some("P, M".into());
        row.colors = Some(String::new());
        let record = ProductAdapter::to_internal(row.clone());
        assert_eq!(record.sizes, vec!["P", "M"]);
        assert_eq!(ProductAdapter::to_remote(&record), row);

        let mut edited = record;
        edited.sizes = vec!["10,12".into()];
        let written = ProductAdapter::to_remote(&edited);
        assert_eq!(written.sizes.as_deref(), Some(r#"["10,12"]"#));
        assert_eq!(ProductAdapter::to_internal(written).sizes, vec!["10,12"]);
    }

    #[test]
    fn goal_row_round_trips() {
        let row = goal::Model {
            id: Uuid::new_v4(),
            seller_id: None,
            month: 12,
            year: 2024,
            target: dec!(15000),
            active: true,
            updated_at: Utc::now(),
        };
        assert_eq!(GoalAdapter::to_remote(&GoalAdapter::to_internal(row.clone())), row);
    }
}
