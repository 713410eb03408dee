//! Node identifier type.

use std::fmt;

/// Identifies a node slot in the arena.
///
/// Using `u32` keeps child arrays compact (four bytes per child) while still
/// addressing far more nodes than any realistic arena holds.
///
/// # Example
/// ```
/// use arenadb::NodeId;
///
/// let node_id = NodeId::new(7);
/// assert!(node_id.is_valid());
/// assert_eq!(node_id.index(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel for "no child".
    ///
    /// Unused child slots hold this value.
    pub const INVALID: NodeId = NodeId(u32::MAX);

    /// Create a new NodeId.
    #[inline]
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Check if this node ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Slot index, for addressing the arena columns.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Node(INVALID)")
        } else {
            write!(f, "Node({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_new() {
        let nid = NodeId::new(42);
        assert_eq!(nid.0, 42);
        assert_eq!(nid.index(), 42);
        assert!(nid.is_valid());
    }

    #[test]
    fn test_node_id_invalid() {
        assert!(!NodeId::INVALID.is_valid());
        assert_eq!(NodeId::default(), NodeId::INVALID);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId::new(42)), "Node(42)");
        assert_eq!(format!("{}", NodeId::INVALID), "Node(INVALID)");
    }
}
