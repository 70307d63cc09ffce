//! Provider fallback engine shared by the execution and question proxies.

pub mod chain;
pub mod events;
pub mod http;
pub mod provider;
pub mod sink;

pub use chain::run_chain;
pub use provider::{BoxedProvider, Provider};
