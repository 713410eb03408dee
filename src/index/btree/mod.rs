//! B-tree index implementation.
//!
//! # Components
//! - [`BTree`] - The arena-backed ordered index
//! - [`Node`] / [`NodeHeader`] - Node view and layout
//! - [`Iter`] - In-order iteration
//! - [`SharedBTree`] - Caller-side locking for multi-threaded use
//! - [`TreeStats`] - Operation counters

mod iter;
pub mod node;
mod shared;
mod stats;
mod tree;

pub use iter::Iter;
pub use node::{find_position, Node, NodeHeader};
pub use shared::SharedBTree;
pub use stats::{StatsSnapshot, TreeStats};
pub use tree::BTree;
