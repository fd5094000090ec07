use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};

use crate::entities::{inventory_batch, GoodsReceiptStatus, PurchaseOrderStatus};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with the receiving end of a bounded channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Publishes an event for an operation that has already committed.
    ///
    /// Never waits on the consumer: a full or closed channel drops the
    /// event with a warning.
    pub fn send_or_log(&self, event: Event) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(event = event.name(), "Event channel full; dropping workflow event");
            }
            Err(TrySendError::Closed(event)) => {
                warn!(event = event.name(), "Event channel closed; dropping workflow event");
            }
        }
    }
}

/// A batch created by a goods receipt closure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: i64,
    pub goods_receipt_line_id: Option<i64>,
    pub product_id: i64,
    pub quantity: Decimal,
    pub expiry_date: NaiveDate,
    pub lot_number: String,
}

impl From<&inventory_batch::Model> for BatchSummary {
    fn from(batch: &inventory_batch::Model) -> Self {
        Self {
            batch_id: batch.id,
            goods_receipt_line_id: batch.goods_receipt_line_id,
            product_id: batch.product_id,
            quantity: batch.quantity,
            expiry_date: batch.expiry_date,
            lot_number: batch.lot_number.clone(),
        }
    }
}

/// Committed changes to procurement documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    PurchaseOrderCreated {
        purchase_order_id: i64,
    },
    PurchaseOrderUpdated {
        purchase_order_id: i64,
    },
    PurchaseOrderStatusChanged {
        purchase_order_id: i64,
        old_status: PurchaseOrderStatus,
        new_status: PurchaseOrderStatus,
    },
    PurchaseOrderDeleted {
        purchase_order_id: i64,
    },
    PurchaseOrderLineAdded {
        purchase_order_id: i64,
        line_id: i64,
    },
    PurchaseOrderLineUpdated {
        purchase_order_id: i64,
        line_id: i64,
    },
    PurchaseOrderLineRemoved {
        purchase_order_id: i64,
        line_id: i64,
    },
    GoodsReceiptCreated {
        goods_receipt_id: i64,
        purchase_order_id: Option<i64>,
        line_count: usize,
    },
    GoodsReceiptUpdated {
        goods_receipt_id: i64,
    },
    GoodsReceiptStatusChanged {
        goods_receipt_id: i64,
        old_status: GoodsReceiptStatus,
        new_status: GoodsReceiptStatus,
    },
    GoodsReceiptClosed {
        goods_receipt_id: i64,
        batches: usize,
        purchase_order_received: Option<i64>,
    },
    GoodsReceiptDeleted {
        goods_receipt_id: i64,
    },
    GoodsReceiptLineAdded {
        goods_receipt_id: i64,
        line_id: i64,
    },
    GoodsReceiptLineUpdated {
        goods_receipt_id: i64,
        line_id: i64,
    },
    GoodsReceiptLineRemoved {
        goods_receipt_id: i64,
        line_id: i64,
    },
    InventoryBatchesCreated {
        goods_receipt_id: i64,
        warehouse_id: i64,
        batches: Vec<BatchSummary>,
    },
}

impl Event {
    /// Stable name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Event::PurchaseOrderCreated { .. } => "purchase_order_created",
            Event::PurchaseOrderUpdated { .. } => "purchase_order_updated",
            Event::PurchaseOrderStatusChanged { .. } => "purchase_order_status_changed",
            Event::PurchaseOrderDeleted { .. } => "purchase_order_deleted",
            Event::PurchaseOrderLineAdded { .. } => "purchase_order_line_added",
            Event::PurchaseOrderLineUpdated { .. } => "purchase_order_line_updated",
            Event::PurchaseOrderLineRemoved { .. } => "purchase_order_line_removed",
            Event::GoodsReceiptCreated { .. } => "goods_receipt_created",
            Event::GoodsReceiptUpdated { .. } => "goods_receipt_updated",
            Event::GoodsReceiptStatusChanged { .. } => "goods_receipt_status_changed",
            Event::GoodsReceiptClosed { .. } => "goods_receipt_closed",
            Event::GoodsReceiptDeleted { .. } => "goods_receipt_deleted",
            Event::GoodsReceiptLineAdded { .. } => "goods_receipt_line_added",
            Event::GoodsReceiptLineUpdated { .. } => "goods_receipt_line_updated",
            Event::GoodsReceiptLineRemoved { .. } => "goods_receipt_line_removed",
            Event::InventoryBatchesCreated { .. } => "inventory_batches_created",
        }
    }
}

/// Drains the channel until every sender is gone.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::GoodsReceiptClosed {
                goods_receipt_id,
                batches,
                purchase_order_received,
            } => {
                info!(
                    goods_receipt_id,
                    batches,
                    purchase_order_received = ?purchase_order_received,
                    "Goods receipt closed"
                );
            }
            Event::InventoryBatchesCreated {
                goods_receipt_id,
                warehouse_id,
                batches,
            } => {
                for batch in batches {
                    info!(
                        goods_receipt_id,
                        warehouse_id,
                        batch_id = batch.batch_id,
                        product_id = batch.product_id,
                        quantity = %batch.quantity,
                        lot_number = %batch.lot_number,
                        "Inventory batch available"
                    );
                }
            }
            Event::PurchaseOrderStatusChanged {
                purchase_order_id,
                old_status,
                new_status,
            } => {
                info!(
                    purchase_order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Purchase order status changed"
                );
            }
            other => match serde_json::to_string(other) {
                Ok(payload) => info!(event = other.name(), %payload, "Received event"),
                Err(e) => warn!(event = other.name(), "Failed to serialize event: {}", e),
            },
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_in_order() {
        let (sender, mut rx) = EventSender::channel(4);
        sender
            .send(Event::PurchaseOrderCreated { purchase_order_id: 1 })
            .await
            .unwrap();
        sender
            .send(Event::PurchaseOrderDeleted { purchase_order_id: 1 })
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(Event::PurchaseOrderCreated { purchase_order_id: 1 })
        );
        assert_eq!(
            rx.recv().await.map(|e| e.name()),
            Some("purchase_order_deleted")
        );
    }

    #[tokio::test]
    async fn send_or_log_drops_when_channel_is_full() {
        let (sender, mut rx) = EventSender::channel(1);
        sender.send_or_log(Event::PurchaseOrderCreated { purchase_order_id: 1 });
        sender.send_or_log(Event::PurchaseOrderCreated { purchase_order_id: 2 });

        assert_eq!(
            rx.try_recv().ok(),
            Some(Event::PurchaseOrderCreated { purchase_order_id: 1 })
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_or_log_tolerates_closed_channel() {
        let (sender, rx) = EventSender::channel(1);
        drop(rx);
        assert!(sender
            .send(Event::GoodsReceiptDeleted { goods_receipt_id: 3 })
            .await
            .is_err());
        sender.send_or_log(Event::GoodsReceiptDeleted { goods_receipt_id: 3 });
    }

    #[test]
    fn statuses_serialize_lowercase() {
        let json = serde_json::to_value(Event::PurchaseOrderStatusChanged {
            purchase_order_id: 2,
            old_status: PurchaseOrderStatus::Submitted,
            new_status: PurchaseOrderStatus::Received,
        })
        .unwrap();
        assert_eq!(json["PurchaseOrderStatusChanged"]["new_status"], "received");
    }

    #[tokio::test]
    async fn process_events_stops_when_senders_drop() {
        let (sender, rx) = EventSender::channel(2);
        let worker = tokio::spawn(process_events(rx));
        sender.send_or_log(Event::GoodsReceiptClosed {
            goods_receipt_id: 1,
            batches: 2,
            purchase_order_received: Some(4),
        });
        drop(sender);
        worker.await.unwrap();
    }
}
