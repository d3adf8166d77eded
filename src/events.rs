use crate::dto::ledger::LedgerPosting;
use crate::errors::ServiceError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Notification emitted after a ledger posting has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Received {
        order_id: i32,
        lot_id: i32,
        item_id: i32,
        loc_id: i32,
        quantity: i32,
        unit_cost: Decimal,
        timestamp: DateTime<Utc>,
    },
    Used {
        order_id: i32,
        lot_id: i32,
        item_id: i32,
        loc_id: i32,
        quantity: i32,
        remaining: i32,
        timestamp: DateTime<Utc>,
    },
    Returned {
        order_id: i32,
        lot_id: i32,
        item_id: i32,
        loc_id: i32,
        quantity: i32,
        remaining_returnable: i32,
        timestamp: DateTime<Utc>,
    },
    Transferred {
        order_id: i32,
        item_id: i32,
        from_loc_id: i32,
        to_loc_id: i32,
        quantity: i32,
        legs: usize,
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Describes a committed posting. Returns `None` for a transfer with no legs.
    pub fn from_posting(order_id: i32, posting: &LedgerPosting) -> Option<Self> {
        let timestamp = Utc::now();
        let event = match posting {
            LedgerPosting::Receipt(p) => LedgerEvent::Received {
                order_id,
                lot_id: p.lot.id,
                item_id: p.lot.item_id,
                loc_id: p.lot.loc_id,
                quantity: p.transaction.qty,
                unit_cost: p.lot.unit_cost,
                timestamp,
            },
            LedgerPosting::Usage(p) => LedgerEvent::Used {
                order_id,
                lot_id: p.lot.id,
                item_id: p.lot.item_id,
                loc_id: p.lot.loc_id,
                quantity: -p.transaction.qty,
                remaining: p.lot.quantity,
                timestamp,
            },
            LedgerPosting::Return(p) => LedgerEvent::Returned {
                order_id,
                lot_id: p.lot.id,
                item_id: p.lot.item_id,
                loc_id: p.lot.loc_id,
                quantity: p.transaction.qty,
                remaining_returnable: p.remaining_returnable,
                timestamp,
            },
            LedgerPosting::Transfer(p) => {
                let first = p.legs.first()?;
                LedgerEvent::Transferred {
                    order_id,
                    item_id: first.source.item_id,
                    from_loc_id: p.from_loc_id,
                    to_loc_id: p.to_loc_id,
                    quantity: p.quantity(),
                    legs: p.legs.len(),
                    timestamp,
                }
            }
        };
        Some(event)
    }

    pub fn order_id(&self) -> i32 {
        match self {
            LedgerEvent::Received { order_id, .. }
            | LedgerEvent::Used { order_id, .. }
            | LedgerEvent::Returned { order_id, .. }
            | LedgerEvent::Transferred { order_id, .. } => *order_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<LedgerEvent>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<LedgerEvent>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: LedgerEvent) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))
    }
}

/// Creates a bounded ledger event channel.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<LedgerEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the channel, logging each event, until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<LedgerEvent>) {
    info!("Starting ledger event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            LedgerEvent::Received {
                order_id,
                lot_id,
                quantity,
                unit_cost,
                ..
            } => info!(order_id, lot_id, quantity, %unit_cost, "Receipt posted"),
            LedgerEvent::Used {
                order_id,
                lot_id,
                quantity,
                remaining,
                ..
            } => {
                info!(order_id, lot_id, quantity, remaining, "Usage posted");
                if *remaining == 0 {
                    warn!(lot_id, "Lot is now empty");
                }
            }
            LedgerEvent::Returned {
                order_id,
                lot_id,
                quantity,
                remaining_returnable,
                ..
            } => info!(order_id, lot_id, quantity, remaining_returnable, "Return posted"),
            LedgerEvent::Transferred {
                order_id,
                from_loc_id,
                to_loc_id,
                quantity,
                legs,
                ..
            } => info!(
                order_id,
                from_loc_id, to_loc_id, quantity, legs, "Transfer posted"
            ),
        }
    }

    info!("Ledger event processing loop stopped");
}
