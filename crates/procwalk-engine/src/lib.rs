//! procwalk engine - relationship walker and state convergence
//!
//! Every call owns its own visited set, chain and edges; nothing is cached
//! across calls and nothing fans out. The only suspension points are client
//! requests and the poller's inter-attempt sleep.

pub mod error;
pub mod lifecycle;
pub mod orphans;
pub mod poller;
pub mod walker;

pub use error::{AncestryError, Error, Result};
pub use lifecycle::{cancel_and_wait, delete_with_cancel};
pub use orphans::filter_orphan_parents;
pub use poller::wait_for_state;
pub use walker::{Ancestry, Subtree, Walker};
