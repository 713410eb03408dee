//! ArenaDB - a latency-optimized, in-memory ordered index.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            ArenaDB                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Caller-side locking (SharedBTree, optional)       │   │
//! │  │          RwLock: one writer OR many readers              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Index Layer (index/)                     │   │
//! │  │   BTree: search / insert / split-before-descend          │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Storage Layer (storage/)                  │   │
//! │  │   NodeArena: fixed capacity, 64-byte aligned node rows,  │   │
//! │  │              nodes addressed by NodeId, never freed      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (NodeId, Error, config)
//! - [`storage`] - The node arena
//! - [`index`] - The B-tree
//!
//! # Quick Start
//! ```
//! use arenadb::{BTree, TreeConfig};
//!
//! let config = TreeConfig::default()
//!     .with_arena_capacity(4 * 1024 * 1024)
//!     .with_order(16);
//! let mut book: BTree<u64, i64> = BTree::with_config(config)?;
//!
//! book.insert(10_050, 300)?;
//! book.insert(10_025, -120)?;
//!
//! assert_eq!(book.search(&10_025), Some(&-120));
//! assert_eq!(book.first_key_value(), Some((&10_025, &-120)));
//! # Ok::<(), arenadb::Error>(())
//! ```

pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{CACHE_LINE_SIZE, DEFAULT_ARENA_CAPACITY, DEFAULT_ORDER, MIN_ORDER};
pub use common::{Error, NodeId, Result, TreeConfig};

pub use index::btree::{BTree, Iter, SharedBTree, StatsSnapshot, TreeStats};
pub use storage::NodeArena;
