pub mod auth;
pub mod common;
pub mod drafts;
pub mod goals;
pub mod health;
pub mod lookups;
pub mod products;
pub mod reports;
pub mod sales;
pub mod state;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
