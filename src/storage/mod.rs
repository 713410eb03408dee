//! Storage layer - node memory.
//!
//! - [`NodeArena`] - Fixed-capacity, never-reclaimed node slab
//! - `AlignedColumn` - Cache-line aligned buffer backing each arena column

mod aligned;
mod arena;

pub use arena::NodeArena;
