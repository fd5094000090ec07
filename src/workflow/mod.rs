//! Document workflow primitives shared by purchase orders and goods receipts.

pub mod numbering;
pub mod state_machine;
pub mod transitions;

pub use state_machine::{validate_transition, DocumentStatus, TransitionTable};
