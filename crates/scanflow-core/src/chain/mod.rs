//! Chain store accessor: entry-edge resolution and first-match
//! next-step lookup.

pub mod store;

pub use store::{ChainStore, condition_matches};
