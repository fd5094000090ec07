//! Prometheus counters for workflow outcomes.
//!
//! Everything is registered on [`REGISTRY`]; [`gather`] renders it in the
//! text exposition format for whatever scrapes the host process.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::errors::ServiceError;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref WORKFLOW_OPERATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "procurement_workflow_operations_total",
            "Workflow operations committed, by operation"
        ),
        &["operation"]
    )
    .expect("metric can be created");
    pub static ref WORKFLOW_REJECTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "procurement_workflow_rejections_total",
            "Workflow operations rejected, by operation and error kind"
        ),
        &["operation", "kind"]
    )
    .expect("metric can be created");
    pub static ref GRV_CLOSURES: IntCounter = IntCounter::new(
        "procurement_grv_closures_total",
        "Goods receipts closed"
    )
    .expect("metric can be created");
    pub static ref INVENTORY_BATCHES_CREATED: IntCounter = IntCounter::new(
        "procurement_inventory_batches_created_total",
        "Inventory batches materialised from closed goods receipts"
    )
    .expect("metric can be created");
    pub static ref PO_AUTO_RECEIVED: IntCounter = IntCounter::new(
        "procurement_po_auto_received_total",
        "Purchase orders moved to received by a goods receipt closure"
    )
    .expect("metric can be created");
}

/// Registers the workflow collectors on [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(WORKFLOW_OPERATIONS.clone()),
        Box::new(WORKFLOW_REJECTIONS.clone()),
        Box::new(GRV_CLOSURES.clone()),
        Box::new(INVENTORY_BATCHES_CREATED.clone()),
        Box::new(PO_AUTO_RECEIVED.clone()),
    ];
    for collector in collectors {
        // AlreadyReg on repeated calls
        let _ = REGISTRY.register(collector);
    }
}

pub fn record_success(operation: &str) {
    WORKFLOW_OPERATIONS.with_label_values(&[operation]).inc();
}

pub fn record_rejection(operation: &str, err: &ServiceError) {
    WORKFLOW_REJECTIONS
        .with_label_values(&[operation, err.kind()])
        .inc();
}

/// Current values in Prometheus text format.
pub fn gather() -> String {
    register_metrics();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_labelled_by_kind() {
        let err = ServiceError::NotDraft {
            document: "PO000001".into(),
            status: "submitted".into(),
        };
        let before = WORKFLOW_REJECTIONS
            .with_label_values(&["metrics_test_delete", "not_draft"])
            .get();
        record_rejection("metrics_test_delete", &err);
        let after = WORKFLOW_REJECTIONS
            .with_label_values(&["metrics_test_delete", "not_draft"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn gather_exposes_registered_counters() {
        record_success("metrics_test_create");
        let text = gather();
        assert!(text.contains("procurement_workflow_operations_total"));
        assert!(text.contains("metrics_test_create"));
    }
}
