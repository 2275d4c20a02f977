use super::{AppSnapshot, Collection, StateAction};

fn upsert<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) {
    let id = key(&item);
    match items.iter_mut().find(|existing| key(existing) == id) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

/// Pure transition function.
///
/// A removal drops the record from the snapshot (the snapshot only holds
/// active records). Status counters never go below zero.
pub fn reduce(mut state: AppSnapshot, action: StateAction) -> AppSnapshot {
    match action {
        StateAction::ProductsLoaded(products) => {
            state.products = products;
            finish(&mut state, Collection::Products);
        }
        StateAction::ProductAdded(product) => upsert(&mut state.products, product, |p| p.id),
        StateAction::ProductsUpdated(products) => {
            for product in products {
                if product.active {
                    upsert(&mut state.products, product, |p| p.id);
                } else {
                    state.products.retain(|p| p.id != product.id);
                }
            }
        }
        StateAction::ProductRemoved(id) => state.products.retain(|p| p.id != id),

        StateAction::SalesLoaded(sales) => {
            state.sales = sales;
            finish(&mut state, Collection::Sales);
        }
        StateAction::SaleRecorded(sale) => {
            state.sales.retain(|s| s.id != sale.id);
            state.sales.insert(0, sale);
        }
        StateAction::SaleUpdated(sale) => upsert(&mut state.sales, sale, |s| s.id),

        StateAction::CategoriesLoaded(categories) => {
            state.categories = categories;
            finish(&mut state, Collection::Categories);
        }
        StateAction::CategoryAdded(category) => {
            upsert(&mut state.categories, category, |c| c.id);
            state.categories.sort_by_key(|c| c.name.to_lowercase());
        }
        StateAction::CategoryRemoved(id) => state.categories.retain(|c| c.id != id),

        StateAction::SellersLoaded(sellers) => {
            state.sellers = sellers;
            finish(&mut state, Collection::Sellers);
        }
        StateAction::SellerAdded(seller) => {
            upsert(&mut state.sellers, seller, |s| s.id);
            state.sellers.sort_by_key(|s| s.name.to_lowercase());
        }
        StateAction::SellerRemoved(id) => state.sellers.retain(|s| s.id != id),

        StateAction::GoalsLoaded(goals) => {
            state.goals = goals;
            finish(&mut state, Collection::Goals);
        }
        StateAction::GoalSaved(goal) => upsert(&mut state.goals, goal, |g| g.id),
        StateAction::GoalRemoved(id) => state.goals.retain(|g| g.id != id),

        StateAction::OperationStarted(collection) => {
            let status = state.status.entry(collection).or_default();
            status.in_flight += 1;
            status.error = None;
        }
        StateAction::OperationSucceeded(collection) => {
            let status = state.status.entry(collection).or_default();
            status.in_flight = status.in_flight.saturating_sub(1);
        }
        StateAction::OperationFailed {
            collection,
            message,
        } => {
            let status = state.status.entry(collection).or_default();
            status.in_flight = status.in_flight.saturating_sub(1);
            status.error = Some(message);
        }
        StateAction::ErrorCleared(collection) => {
            state.status.entry(collection).or_default().error = None;
        }
    }
    state
}

/// A load replaces the collection and completes its pending operation.
fn finish(state: &mut AppSnapshot, collection: Collection) {
    let status = state.status.entry(collection).or_default();
    status.in_flight = status.in_flight.saturating_sub(1);
    status.error = None;
}
