//! SQLite persistence for the chain store.

pub mod chain;
pub mod pool;

pub use chain::SqliteChainRepository;
pub use pool::DatabasePool;
