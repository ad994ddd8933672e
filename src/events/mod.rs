use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
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

    /// Sends an event after a commit. Delivery failures are logged, never surfaced.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "dropping domain event");
        }
    }
}

/// Domain events emitted by the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockAdded {
        bin_id: Uuid,
        agency_id: Uuid,
        sales_rep_id: Uuid,
        quantity: i64,
        stock_after: i64,
        at: DateTime<Utc>,
    },
    StockWithdrawn {
        bin_id: Uuid,
        agency_id: Uuid,
        sales_rep_id: Uuid,
        quantity: i64,
        stock_after: i64,
        at: DateTime<Utc>,
    },
    StockTransferred {
        source_bin_id: Uuid,
        target_bin_id: Uuid,
        agency_id: Uuid,
        sales_rep_id: Uuid,
        quantity: i64,
        at: DateTime<Utc>,
    },
    MutationRejected {
        bin_id: Uuid,
        agency_id: Uuid,
        quantity: i64,
        reason: String,
    },
    AgencyCreated(Uuid),
    AgencyUpdated(Uuid),
    AgencyDeleted(Uuid),
    SalesRepCreated(Uuid),
    SalesRepUpdated(Uuid),
    SalesRepDeleted(Uuid),
    ContractCreated(Uuid),
    ContractUpdated(Uuid),
    ContractDeleted(Uuid),
    DashboardRefreshed {
        snapshot_id: i32,
        total_capacity: i64,
        current_usage: i64,
    },
}

/// Drains the event channel and records each event in the log.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockAdded {
                bin_id,
                quantity,
                stock_after,
                ..
            } => info!(%bin_id, quantity, stock_after, "stock added"),
            Event::StockWithdrawn {
                bin_id,
                quantity,
                stock_after,
                ..
            } => info!(%bin_id, quantity, stock_after, "stock withdrawn"),
            Event::StockTransferred {
                source_bin_id,
                target_bin_id,
                quantity,
                ..
            } => info!(%source_bin_id, %target_bin_id, quantity, "stock transferred"),
            Event::MutationRejected {
                bin_id,
                agency_id,
                quantity,
                reason,
            } => warn!(%bin_id, %agency_id, quantity, reason = %reason, "bin mutation rejected"),
            Event::DashboardRefreshed {
                snapshot_id,
                total_capacity,
                current_usage,
            } => info!(snapshot_id, total_capacity, current_usage, "dashboard refreshed"),
            other => info!(event = ?other, "domain event"),
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);
        drop(rx);
        assert!(sender.send(Event::AgencyCreated(Uuid::new_v4())).await.is_err());
        // Must not panic or error.
        sender.send_or_log(Event::AgencyDeleted(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn processor_drains_until_channel_closes() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let task = tokio::spawn(process_events(rx));
        sender
            .send(Event::ContractCreated(Uuid::new_v4()))
            .await
            .unwrap();
        drop(sender);
        task.await.unwrap();
    }
}
