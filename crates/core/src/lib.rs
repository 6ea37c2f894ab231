//! # Stakeledger Core
//!
//! Domain types cho token ledger: account, transaction, token units,
//! config và clock. Crate này không có I/O.

pub mod account;
pub mod clock;
pub mod config;
pub mod error;
pub mod money;
pub mod transaction;

pub use account::{StakeState, TokenAccount, UserId};
pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use config::LedgerConfig;
pub use error::{CoreError, CoreResult};
pub use money::{from_units, to_units, TOKEN_DECIMALS, UNITS_PER_TOKEN};
pub use transaction::{Transaction, TransactionType};
