use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Domain events emitted by the services layer. Consumers are advisory;
/// failure to deliver never fails the originating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Account events
    UserRegistered(Uuid),

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ReviewAdded {
        product_id: Uuid,
        rating: i32,
    },
    CatalogSeeded {
        count: usize,
    },

    // Commerce events
    OrderPlaced {
        order_id: Uuid,
        order_number: String,
        total_amount: Decimal,
    },
    PurchaseCreated(Uuid),
    StockDepleted(Uuid),

    // Messaging events
    MessageSent {
        product_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
    },

    // Demo workflow events
    DemoRequestCreated(Uuid),
    DemoRequestStatusChanged {
        request_id: Uuid,
        new_status: String,
    },
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

    /// Sends an event, logging instead of propagating delivery failure
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event delivery failed: {}", e);
        }
    }
}

/// Background consumer that drains the event channel. Events are logged for
/// operational visibility; there are no outbound integrations behind them.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderPlaced {
                order_id,
                order_number,
                total_amount,
            } => {
                info!(
                    order_id = %order_id,
                    order_number = %order_number,
                    total_amount = %total_amount,
                    "Order placed"
                );
            }
            Event::StockDepleted(product_id) => {
                warn!(product_id = %product_id, "Product stock depleted");
            }
            Event::CatalogSeeded { count } => {
                info!(count = count, "Catalog reseeded");
            }
            other => {
                debug!("Received event: {:?}", other);
            }
        }

        if let Err(e) = serde_json::to_string(&event) {
            // Serialization problems would break any future outbound delivery
            error!("Failed to serialize event for audit logging: {}", e);
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel_errors() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let sender = EventSender::new(tx);
        // Must not panic or error out even though the receiver is gone
        sender.send_or_log(Event::ProductCreated(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_round_trip_through_the_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        let order_id = Uuid::new_v4();
        sender
            .send(Event::OrderPlaced {
                order_id,
                order_number: "ORD-1-TEST".to_string(),
                total_amount: dec!(250),
            })
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::OrderPlaced {
                order_id: got_id, ..
            }) => assert_eq!(got_id, order_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
