//! sea-orm entities for the relational store.

pub mod category;
pub mod goal;
pub mod product;
pub mod sale;
pub mod sale_item;
pub mod seller;
pub mod stock_movement;
