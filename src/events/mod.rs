use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
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
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Product catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductTemplateCreated(Uuid),
    ProductTemplateUpdated(Uuid),

    // Production recipe events
    ProductionTemplateCreated(Uuid),
    ProductionTemplateUpdated(Uuid),
    ProductionTemplateDeleted(Uuid),

    // Packaging association events
    PackagingCreated {
        packaging_id: Uuid,
        product_id: Uuid,
        production_template_id: Uuid,
    },
    PackagingUpdated(Uuid),
    PackagingDeleted(Uuid),
    PackagedProductGenerated {
        source_product_id: Uuid,
        packaged_product_id: Uuid,
        bom_id: Uuid,
    },

    // Stock events
    StockLocationCreated(Uuid),
    StockMoveRecorded {
        move_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    },
    StockMoveDone(Uuid),
    StockMoveCancelled(Uuid),

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

// Define a trait for handling events. Handlers implementing this trait will process events asynchronously.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: Event) -> Result<(), String>;
}

// Function to process incoming events and distribute them to registered event handlers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);

        match event {
            Event::PackagedProductGenerated {
                source_product_id,
                packaged_product_id,
                bom_id,
            } => {
                if let Err(e) =
                    handle_packaged_product_generated(source_product_id, packaged_product_id, bom_id)
                        .await
                {
                    error!(
                        "Failed to handle packaged product generation: source={}, error={}",
                        source_product_id, e
                    );
                }
            }
            Event::StockMoveRecorded {
                move_id,
                product_id,
                quantity,
            } => {
                if let Err(e) = handle_stock_move_recorded(move_id, product_id, quantity).await {
                    error!(
                        "Failed to handle stock move event: move_id={}, error={}",
                        move_id, e
                    );
                }
            }
            Event::PackagingDeleted(packaging_id) => {
                info!("Packaging association deleted: {}", packaging_id);
            }
            Event::StockMoveCancelled(move_id) => {
                warn!("Stock move cancelled: {}", move_id);
            }
            _ => {
                info!("No specific handler for event: {:?}", event);
            }
        }
    }

    warn!("Event processing loop has ended");
}

// Handler functions for specific events
async fn handle_packaged_product_generated(
    source_product_id: Uuid,
    packaged_product_id: Uuid,
    bom_id: Uuid,
) -> Result<(), String> {
    // Downstream systems (labeling, planning) key off this event
    info!(
        "Packaged product {} generated from bulk source {} with BOM {}",
        packaged_product_id, source_product_id, bom_id
    );
    Ok(())
}

async fn handle_stock_move_recorded(
    move_id: Uuid,
    product_id: Uuid,
    quantity: Decimal,
) -> Result<(), String> {
    info!(
        "Processing stock move {} for product {}: quantity={}",
        move_id, product_id, quantity
    );

    if quantity.is_sign_negative() {
        warn!(
            "Stock move {} recorded with negative quantity {} for product {}",
            move_id, quantity, product_id
        );
    }

    Ok(())
}
