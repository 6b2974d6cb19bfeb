//! Shared directory of live peers.
//!
//! The registry is an ordered list of [`Peer`] entries persisted as one
//! snapshot that every peer process opens. Order is insertion order and is
//! the candidate order used by elections.
//!
//! Every mutation reads the whole snapshot, changes it in memory and writes
//! the whole snapshot back. Writers in the same process are serialized;
//! writers in different processes are not, so one of two concurrent updates
//! can be lost.

pub mod peer;
pub mod store;

pub use peer::{Peer, Role};
pub use store::Registry;
