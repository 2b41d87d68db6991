//! Model provider abstraction and fallback execution.

pub mod box_provider;
pub mod executor;
pub mod provider;

pub use box_provider::BoxModelProvider;
pub use executor::FallbackExecutor;
pub use provider::ModelProvider;
