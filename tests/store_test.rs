mod common;

use assert_matches::assert_matches;
use common::{product_form, sql_store};
use meu_bentin::{
    errors::ServiceError,
    models::{
        ListFilter, MovementKind, NewGoal, NewSale, NewSaleItem, NewSeller, PaymentMethod,
        ProductChanges, ProductFilter, SaleFilter, SaleStatus, StockChange,
    },
    store::{CategoryStore, GoalStore, ProductStore, SaleStore, SellerStore},
};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn sale_of(items: Vec<(Uuid, i32)>) -> NewSale {
    NewSale {
        seller_id: None,
        customer_name: Some("Mariana".into()),
        payment_method: PaymentMethod::Credit,
        discount: dec!(5),
        notes: None,
        sold_at: None,
        items: items
            .into_iter()
            .map(|(product_id, quantity)| NewSaleItem {
                product_id,
                quantity,
                unit_price: None,
            })
            .collect(),
    }
}

#[tokio::test]
async fn product_round_trips_through_the_database() {
    let store = sql_store().await;
    let created = store
        .create_product(product_form("Vestido Floral", dec!(90), 5))
        .await
        .unwrap();

    let fetched = store.get_product(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.sizes, vec!["P", "M"]);
    assert_eq!(fetched.colors, vec!["Rosa"]);
    assert_eq!(fetched.price, dec!(90));
    assert_eq!(fetched.margin, Some(dec!(100)));
    assert_eq!(fetched.code, created.code);

    let movements = store.list_movements(created.id).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].kind, MovementKind::Initial);
    assert_eq!(movements[0].new_quantity, 5);
}

#[tokio::test]
async fn edit_keeps_quantity_and_recomputes_margin() {
    let store = sql_store().await;
    let created = store
        .create_product(product_form("Body Liso", dec!(40), 8))
        .await
        .unwrap();

    let updated = store
        .update_product(
            created.id,
            ProductChanges {
                price: Some(dec!(50)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.quantity, 8);
    assert_eq!(updated.price, dec!(50));
    assert_eq!(updated.margin, Some(dec!(150)));
}

#[tokio::test]
async fn duplicate_product_code_is_a_conflict() {
    let store = sql_store().await;
    let mut body = product_form("Body Liso", dec!(40), 2);
    body.code = Some("BODY-01".into());
    store.create_product(body.clone()).await.unwrap();

    body.name = "Body Canelado".into();
    assert_matches!(
        store.create_product(body).await,
        Err(ServiceError::Conflict(_))
    );

    let other = store
        .create_product(product_form("Body Estampado", dec!(45), 1))
        .await
        .unwrap();
    assert_matches!(
        store
            .update_product(
                other.id,
                ProductChanges {
                    code: Some("BODY-01".into()),
                    ..Default::default()
                },
            )
            .await,
        Err(ServiceError::Conflict(_))
    );

    // keeping its own code is not a conflict
    let renamed = store
        .update_product(
            other.id,
            ProductChanges {
                code: Some(other.code.clone()),
                name: Some("Body Estampado Rosa".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.code, other.code);
}

#[tokio::test]
async fn oversized_sale_price_is_rejected_before_any_write() {
    let store = sql_store().await;
    let product = store
        .create_product(product_form("Vestido", dec!(90), 5))
        .await
        .unwrap();

    let mut input = sale_of(vec![(product.id, 2)]);
    input.items[0].unit_price = Some(dec!(99999999));
    let err = store.record_sale(input).await.unwrap_err();
    assert!(err.field_errors().unwrap().contains_key("items"));

    assert_eq!(store.get_product(product.id).await.unwrap().unwrap().quantity, 5);
    assert!(store
        .list_sales(&SaleFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn soft_deleted_product_is_only_listed_with_inactive() {
    let store = sql_store().await;
    let keep = store
        .create_product(product_form("Macacão", dec!(59.90), 3))
        .await
        .unwrap();
    let gone = store
        .create_product(product_form("Jardineira", dec!(79.90), 2))
        .await
        .unwrap();

    store.soft_delete_product(gone.id).await.unwrap();

    let active = store.list_products(&ProductFilter::default()).await.unwrap();
    assert_eq!(active.iter().map(|p| p.id).collect::<Vec<_>>(), vec![keep.id]);

    let all = store
        .list_products(&ProductFilter::including_inactive())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|p| p.id == gone.id && !p.active));
}

#[tokio::test]
async fn sale_decrements_stock_and_writes_the_ledger() {
    let store = sql_store().await;
    let body = store
        .create_product(product_form("Body", dec!(30), 10))
        .await
        .unwrap();
    let dress = store
        .create_product(product_form("Vestido", dec!(100), 4))
        .await
        .unwrap();

    let recorded = store
        .record_sale(sale_of(vec![(body.id, 3), (dress.id, 1)]))
        .await
        .unwrap();

    assert_eq!(recorded.sale.total(), dec!(185));
    assert_eq!(recorded.sale.items.len(), 2);
    let quantities: Vec<_> = recorded.products.iter().map(|p| (p.id, p.quantity)).collect();
    assert!(quantities.contains(&(body.id, 7)));
    assert!(quantities.contains(&(dress.id, 3)));

    let stored = store.get_product(body.id).await.unwrap().unwrap();
    assert_eq!(stored.quantity, 7);

    let ledger = store.list_movements(body.id).await.unwrap();
    let sale_entry = ledger
        .iter()
        .find(|m| m.kind == MovementKind::Sale)
        .expect("sale movement");
    assert_eq!(sale_entry.quantity_change, -3);
    assert_eq!(sale_entry.sale_id, Some(recorded.sale.id));

    let fetched = store.get_sale(recorded.sale.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, recorded.sale.id);
    assert_eq!(fetched.items.len(), 2);
    assert_eq!(fetched.total(), dec!(185));
    assert_eq!(fetched.status, SaleStatus::Completed);
}

#[tokio::test]
async fn failed_stock_step_rolls_back_the_whole_sale() {
    let store = sql_store().await;
    let plenty = store
        .create_product(product_form("Meia", dec!(12), 20))
        .await
        .unwrap();
    let scarce = store
        .create_product(product_form("Casaco", dec!(150), 1))
        .await
        .unwrap();

    let err = store
        .record_sale(sale_of(vec![(plenty.id, 2), (scarce.id, 3)]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    assert!(store
        .list_sales(&SaleFilter::default())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        store.get_product(plenty.id).await.unwrap().unwrap().quantity,
        20
    );
    assert_eq!(
        store.get_product(scarce.id).await.unwrap().unwrap().quantity,
        1
    );
    assert_eq!(store.list_movements(plenty.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_product_rejects_the_sale() {
    let store = sql_store().await;
    let err = store
        .record_sale(sale_of(vec![(Uuid::new_v4(), 1)]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn cancelling_restocks_once() {
    let store = sql_store().await;
    let product = store
        .create_product(product_form("Short", dec!(35), 6))
        .await
        .unwrap();
    let recorded = store
        .record_sale(sale_of(vec![(product.id, 2)]))
        .await
        .unwrap();

    let cancelled = store.cancel_sale(recorded.sale.id).await.unwrap();
    assert_eq!(cancelled.sale.status, SaleStatus::Cancelled);
    assert_eq!(cancelled.products[0].quantity, 6);

    assert_matches!(
        store.cancel_sale(recorded.sale.id).await,
        Err(ServiceError::InvalidOperation(_))
    );
    assert_eq!(
        store.get_product(product.id).await.unwrap().unwrap().quantity,
        6
    );

    let kinds: Vec<_> = store
        .list_movements(product.id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            MovementKind::Initial,
            MovementKind::Sale,
            MovementKind::SaleCancelled
        ]
    );

    let completed = store
        .list_sales(&SaleFilter {
            status: Some(SaleStatus::Completed),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(completed.is_empty());
}

#[tokio::test]
async fn adjustment_below_zero_is_rejected() {
    let store = sql_store().await;
    let product = store
        .create_product(product_form("Boné", dec!(25), 2))
        .await
        .unwrap();

    assert_matches!(
        store
            .adjust_quantity(product.id, StockChange::loss(3, "Molhado".into()))
            .await,
        Err(ServiceError::InsufficientStock(_))
    );

    let (after, movement) = store
        .adjust_quantity(product.id, StockChange::adjustment(5, None))
        .await
        .unwrap();
    assert_eq!(after.quantity, 7);
    assert_eq!(movement.previous_quantity, 2);
    assert_eq!(movement.kind, MovementKind::Adjustment);
}

#[tokio::test]
async fn category_names_are_unique_ignoring_case() {
    let store = sql_store().await;
    let roupas = store.create_category("Roupas".into()).await.unwrap();
    let again = store.create_category("ROUPAS".into()).await.unwrap();
    assert_eq!(roupas.id, again.id);

    store.soft_delete_category(roupas.id).await.unwrap();
    assert!(store
        .list_categories(&ListFilter::active())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        store.list_categories(&ListFilter::all()).await.unwrap().len(),
        1
    );

    let revived = store.create_category("roupas".into()).await.unwrap();
    assert_eq!(revived.id, roupas.id);
    assert!(revived.active);
}

#[tokio::test]
async fn removed_seller_stays_listable_with_inactive() {
    let store = sql_store().await;
    let seller = store
        .create_seller(NewSeller {
            name: "Joana".into(),
            email: Some("joana@meubentin.com.br".into()),
            phone: None,
        })
        .await
        .unwrap();

    store.soft_delete_seller(seller.id).await.unwrap();
    assert!(store
        .list_sellers(&ListFilter::active())
        .await
        .unwrap()
        .is_empty());
    let all = store.list_sellers(&ListFilter::all()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(!all[0].active);

    assert_matches!(
        store.soft_delete_seller(Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn goal_for_the_same_month_is_replaced() {
    let store = sql_store().await;
    let first = store
        .save_goal(NewGoal {
            seller_id: None,
            month: 6,
            year: 2024,
            target: dec!(5000),
        })
        .await
        .unwrap();
    let second = store
        .save_goal(NewGoal {
            seller_id: None,
            month: 6,
            year: 2024,
            target: dec!(6500),
        })
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let goals = store.list_goals(&ListFilter::active()).await.unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].target, dec!(6500));
}
