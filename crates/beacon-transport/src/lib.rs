//! In-memory message channel between agent roles.
//!
//! The bus stands in for a networked transport and pins down the contract
//! one would have to honor: every message reaches at most its intended
//! recipient, concurrent senders serialize through the recipient's mailbox,
//! and delivery failures surface to the sender; retry policy belongs to
//! the transport's caller, not here.

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use beacon_types::{AgentId, Envelope};

/// Per-recipient mailbox depth. A full mailbox is a delivery failure, not
/// silent backpressure.
const MAILBOX_CAPACITY: usize = 64;

/// Transport faults, surfaced to the sender and never retried at this layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no mailbox registered for recipient '{0}'")]
    UnknownRecipient(AgentId),

    #[error("mailbox full for recipient '{0}'")]
    MailboxFull(AgentId),

    #[error("mailbox closed for recipient '{0}'")]
    MailboxClosed(AgentId),
}

/// Receiving end of one agent's mailbox.
pub struct Mailbox {
    owner: AgentId,
    rx: mpsc::Receiver<Envelope>,
}

impl Mailbox {
    /// Bounded wait for the next message. Expiry yields `None`, the
    /// expected idle case, not an error. Cancel-safe: aborting the wait
    /// loses no queued message.
    pub async fn recv_deadline(&mut self, wait: Duration) -> Option<Envelope> {
        match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(Some(envelope)) => Some(envelope),
            Ok(None) => {
                debug!(owner = %self.owner, "mailbox senders dropped");
                None
            }
            Err(_) => None,
        }
    }

    pub fn owner(&self) -> &AgentId {
        &self.owner
    }
}

/// Routes envelopes to registered mailboxes.
///
/// Cheap to clone; clones share the routing table.
#[derive(Clone, Default)]
pub struct MessageBus {
    routes: Arc<RwLock<HashMap<AgentId, mpsc::Sender<Envelope>>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipient and hand back its mailbox. Re-registering an
    /// identity replaces the previous route.
    pub async fn register(&self, owner: AgentId) -> Mailbox {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        self.routes.write().await.insert(owner.clone(), tx);
        debug!(owner = %owner, "mailbox registered");
        Mailbox { owner, rx }
    }

    /// Deliver an envelope to exactly its recipient's mailbox.
    pub async fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        let recipient = envelope.recipient.clone();
        let routes = self.routes.read().await;
        let Some(tx) = routes.get(&recipient) else {
            return Err(TransportError::UnknownRecipient(recipient));
        };

        match tx.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(recipient = %recipient, "mailbox full, message not delivered");
                Err(TransportError::MailboxFull(recipient))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                drop(routes);
                self.routes.write().await.remove(&recipient);
                debug!(recipient = %recipient, "closed mailbox removed from routes");
                Err(TransportError::MailboxClosed(recipient))
            }
        }
    }

    pub async fn route_count(&self) -> usize {
        self.routes.read().await.len()
    }
}
