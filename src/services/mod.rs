// Workflow building blocks shared by the commands
pub mod closure;
pub mod inventory_batches;
pub mod ledger;
pub mod lookup;

// Facade over commands and queries
pub mod procurement;

pub use procurement::ProcurementService;
