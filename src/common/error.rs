//! Error types for ArenaDB.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in ArenaDB.
///
/// A search miss is *not* an error: lookups return `Option` instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The arena cannot supply the nodes an insertion needs.
    ///
    /// The arena never grows or compacts, so this is terminal for the
    /// operation that hit it. The tree is left exactly as it was before
    /// the failed call.
    #[error("arena exhausted: {requested} node(s) requested, capacity is {capacity_nodes} node(s)")]
    ArenaExhausted {
        /// Total node slots the arena was sized for.
        capacity_nodes: usize,
        /// Node slots the refused operation needed.
        requested: usize,
    },

    /// The configured capacity cannot hold even a single node.
    #[error("arena of {capacity_bytes} bytes cannot hold one node of {node_footprint} bytes")]
    ArenaTooSmall {
        capacity_bytes: usize,
        node_footprint: usize,
    },

    /// The up-front reservation of arena memory failed.
    #[error("arena allocation of {bytes} bytes failed")]
    ArenaAllocation {
        /// Size of the refused column allocation.
        bytes: usize,
    },

    /// Tree order is below `MIN_ORDER` or too large for the node key counter.
    #[error("invalid tree order: {0}")]
    InvalidOrder(usize),

    /// A structural invariant of the tree does not hold.
    ///
    /// This indicates a bug - only `check_invariants` reports it.
    #[error("tree corrupted: {0}")]
    Corrupted(String),
}
