//! # Prosumer Ledger
//!
//! Account ledger for a peer energy-trading scheme. Prosumers register
//! themselves and deposit value into custody; a single recorder identity,
//! fixed when the ledger is created, reports each prosumer's net energy
//! position.
//!
//! ## Features
//!
//! - **Membership**: one-way self-registration per address
//! - **Balance custody**: exact, overflow-checked deposits and withdrawals
//! - **Energy status**: signed accumulator only the recorder may change
//! - **Journal**: every committed operation is recorded and replayable
//! - **Storage abstraction**: backend-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use prosumer_ledger::{units::parse_ether, utils::MemoryStorage, Address, Ledger};
//!
//! # async fn demo() -> Result<(), prosumer_ledger::LedgerError> {
//! let recorder = Address::parse("0x00000000000000000000000000000000000000aa")?;
//! let prosumer = Address::parse("0x0000000000000000000000000000000000000001")?;
//!
//! let mut ledger = Ledger::new(MemoryStorage::new(), recorder.clone());
//! ledger.register_prosumer(&prosumer).await?;
//! ledger.deposit(&prosumer, parse_ether("1")?).await?;
//! ledger.update_energy_status(&recorder, &prosumer, -1).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod units;
pub mod utils;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use ledger::*;
pub use traits::*;
pub use types::*;
