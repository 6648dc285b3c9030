use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::{ProductField, ProductId, SupplierId};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Queues an event without waiting. Fails when the channel is full or closed.
    pub fn try_send(&self, event: Event) -> Result<(), String> {
        self.sender
            .try_send(event)
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Things that happened to the mirror after the store confirmed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Hydrated {
        suppliers: usize,
        loaded: usize,
        failed: usize,
    },
    ProductCreated {
        supplier_id: SupplierId,
        product_id: ProductId,
    },
    ProductUpdated {
        product_id: ProductId,
        field: ProductField,
    },
    ProductDeleted {
        supplier_id: SupplierId,
        product_id: ProductId,
    },
    BatchDeleteHalted {
        product_id: ProductId,
        deleted: usize,
        skipped: usize,
        error: String,
    },
}

/// Drains the event channel, logging every event.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::BatchDeleteHalted { product_id, error, .. } => {
                warn!(%product_id, %error, "batch delete halted");
            }
            Event::Hydrated {
                suppliers,
                loaded,
                failed,
            } => {
                info!(suppliers, loaded, failed, "mirror hydrated");
            }
            other => info!("Received event: {:?}", other),
        }
    }

    info!("Event channel closed");
}
