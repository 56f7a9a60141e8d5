//! Entity graph and settlement engine for cross-border payments.
//!
//! Banks, customers, accounts and payments are stored as records in a flat
//! key-value store ([`stores::RecordStore`]). Relationships are kept as
//! back-reference lists plus one composite-key index, and every public
//! operation on [`Engine`] commits all of its writes or none of them.

mod codec;
mod csv_utils;
mod dto;
mod engine;
mod entities;
mod error;
mod index;
mod queries;
mod references;
mod repository;
mod runner;
mod settlement;
pub mod stores;

pub use codec::{Entity, Kind};
pub use dto::{Command, JournalEntry, LedgerRow, OperationType};
pub use engine::{Engine, NewBank};
pub use entities::{Account, Bank, Customer, Payment};
pub use error::{Error, Result};
pub use index::AccountIndexEntry;
pub use references::Violation;
pub use repository::{BankProfile, EntityStore};
pub use runner::{run, run_async};
pub use settlement::{PaymentOrder, RateTable};
