//! Ledger module containing account transitions, the journal and the orchestrator

pub mod account;
pub mod core;
pub mod journal;
pub mod view;

pub use core::*;
pub use journal::*;
pub use view::*;
