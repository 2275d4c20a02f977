use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::MovementKind;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender and the receiver to hand to [`process_events`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Things that happened in the store, published after they are committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeactivated(Uuid),
    StockChanged {
        product_id: Uuid,
        kind: MovementKind,
        previous_quantity: i32,
        new_quantity: i32,
    },
    LowStock {
        product_id: Uuid,
        name: String,
        quantity: i32,
        min_quantity: i32,
    },

    SaleRecorded {
        sale_id: Uuid,
        total: Decimal,
    },
    SaleCancelled(Uuid),

    CategoryCreated(Uuid),
    CategoryDeactivated(Uuid),
    SellerCreated(Uuid),
    SellerDeactivated(Uuid),
    GoalSaved(Uuid),
    GoalDeactivated(Uuid),
}

pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::LowStock {
                product_id,
                name,
                quantity,
                min_quantity,
            } => {
                warn!(
                    product_id = %product_id,
                    quantity,
                    min_quantity,
                    "Low stock: {}",
                    name
                );
            }
            Event::SaleRecorded { sale_id, total } => {
                info!(sale_id = %sale_id, total = %total, "Sale recorded");
            }
            other => info!("Received event: {:?}", other),
        }
    }

    info!("Event processing loop stopped");
}
