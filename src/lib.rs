//! Procurement workflow engine
//!
//! Purchase orders and goods receipt vouchers (GRVs) with status workflows,
//! an outstanding-quantity ledger per purchase order line, and the closure
//! cascade that turns closed receipts into inventory batches.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod queries;
pub mod services;
pub mod workflow;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::ProcurementService;

/// A connected engine: database pool, event channel and the service facade.
pub struct ProcurementEngine {
    pub config: AppConfig,
    pub db: Arc<DbPool>,
    pub service: ProcurementService,
    events: Option<mpsc::Receiver<Event>>,
}

impl ProcurementEngine {
    /// Connects to the configured database, applies migrations when
    /// `auto_migrate` is set, and wires the service to a fresh event channel.
    pub async fn start(config: AppConfig) -> Result<Self, ServiceError> {
        config.validate_all()?;
        metrics::register_metrics();

        let db = db::establish_connection_from_app_config(&config).await?;
        if config.auto_migrate {
            db::run_migrations(&db).await?;
        }

        Ok(Self::with_connection(config, db))
    }

    /// Wraps an existing connection. Migrations are the caller's concern.
    pub fn with_connection(config: AppConfig, db: DbPool) -> Self {
        let (sender, rx) = EventSender::channel(config.event_channel_capacity);
        let db = Arc::new(db);
        let service = ProcurementService::new(db.clone(), Arc::new(sender));

        info!(environment = %config.environment, "Procurement engine ready");
        Self {
            config,
            db,
            service,
            events: Some(rx),
        }
    }

    /// Hands out the receiving end of the event channel. Only the first
    /// call gets it.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<Event>> {
        self.events.take()
    }

    /// Spawns the default event consumer, which logs every event.
    pub fn spawn_event_logger(&mut self) -> Option<tokio::task::JoinHandle<()>> {
        self.take_events()
            .map(|rx| tokio::spawn(events::process_events(rx)))
    }
}
