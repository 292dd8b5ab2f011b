//! In-process implementations of the ledger traits.
//!
//! Token rows live in a `DashMap`; holding an entry's write guard is the
//! atomic boundary for the conditional consume, the same role the row lock
//! plays in Postgres.

pub mod store;
pub mod directory;

pub use store::MemoryLedgerStore;
pub use directory::MemoryTeamDirectory;
