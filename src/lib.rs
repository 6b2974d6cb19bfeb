pub mod api;
pub mod config;
pub mod election;
pub mod error;
pub mod ledger;
pub mod liveness;
pub mod node;
pub mod registry;
pub mod scheduler;
pub mod shutdown;
