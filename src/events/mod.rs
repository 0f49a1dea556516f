use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::notifications::TelegramNotifier;

/// Events emitted by the service layer after successful operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A new order was durably committed.
    OrderPlaced {
        order_id: Uuid,
        customer_name: String,
        phone_number: String,
        address: String,
        total_price: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderDeleted(Uuid),

    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    DiscountUpdated,
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Event delivery must never affect the outcome of the operation that
    /// produced the event.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event delivery failed: {}", e);
        }
    }
}

/// Event processing loop. Order notifications are best-effort: a notifier
/// failure is logged and never propagated.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, notifier: Option<Arc<TelegramNotifier>>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::OrderPlaced {
                order_id,
                ref customer_name,
                ref phone_number,
                ref address,
                total_price,
            } => {
                info!(order_id = %order_id, total = %total_price, "Order placed");
                if let Some(notifier) = &notifier {
                    if let Err(e) = notifier
                        .notify_order_placed(
                            order_id,
                            customer_name,
                            phone_number,
                            address,
                            total_price,
                        )
                        .await
                    {
                        error!(order_id = %order_id, error = %e, "Failed to send order notification");
                    }
                }
            }
            Event::OrderStatusChanged {
                order_id,
                ref old_status,
                ref new_status,
            } => {
                info!(order_id = %order_id, old_status, new_status, "Order status changed");
            }
            Event::OrderDeleted(order_id) => {
                info!(order_id = %order_id, "Order deleted");
            }
            Event::ProductCreated(product_id) => {
                info!(product_id = %product_id, "Product created");
            }
            Event::ProductUpdated(product_id) => {
                info!(product_id = %product_id, "Product updated");
            }
            Event::ProductDeleted(product_id) => {
                info!(product_id = %product_id, "Product deleted");
            }
            Event::DiscountUpdated => {
                info!("Storewide discount updated");
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}
