//! Application-side records (camelCase on the wire) and the forms that create them.

pub mod category;
pub mod goal;
pub mod product;
pub mod sale;
pub mod seller;
pub mod stock_movement;

pub use category::{same_name, Category, ListFilter, NewCategory};
pub use goal::{Goal, GoalProgress, NewGoal};
pub use product::{
    compute_margin, generate_product_code, NewProduct, Product, ProductChanges, ProductFilter,
    StoredLists, UNCATEGORIZED,
};
pub use sale::{
    NewSale, NewSaleItem, PaymentMethod, RecordedSale, Sale, SaleFilter, SaleItem, SaleLine,
    SaleStatus,
};
pub use seller::{NewSeller, Seller};
pub use stock_movement::{AdjustStock, MovementKind, RegisterLoss, StockChange, StockMovement};
