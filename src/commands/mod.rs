use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::{
    edit_session::EditSession,
    errors::ServiceError,
    events::{Event, EventSender},
    mirror::Mirror,
    store::EntityStore,
};

pub mod products;
pub mod suppliers;

/// Everything a command needs to talk to the store and patch the mirror.
#[derive(Clone)]
pub struct SyncContext {
    pub store: Arc<dyn EntityStore>,
    pub mirror: Arc<RwLock<Mirror>>,
    pub edit_session: EditSession,
    pub event_sender: Option<EventSender>,
}

impl SyncContext {
    pub fn new(store: Arc<dyn EntityStore>, event_sender: Option<EventSender>) -> Self {
        Self {
            store,
            mirror: Arc::new(RwLock::new(Mirror::new())),
            edit_session: EditSession::new(),
            event_sender,
        }
    }

    /// Publishes an event without waiting on the receiver. A full or closed
    /// channel is logged, never surfaced.
    pub fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.try_send(event) {
                warn!("Dropping event: {}", e);
            }
        }
    }
}

/// Command trait for implementing the Command Pattern
///
/// A command validates its input, issues the store request(s) and reconciles
/// the mirror from what the store returned.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command against the shared sync context
    async fn execute(&self, ctx: &SyncContext) -> Result<Self::Result, ServiceError>;
}
