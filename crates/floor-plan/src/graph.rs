//! Capture-order connectivity between plan positions
//!
//! Adjacency follows capture order, not spatial proximity: every position links back to
//! its predecessor and forward to its successor, so the graph is always a simple path.
//! Edges hold indices only.

use crate::layout::LayoutPath;
use serde::{Deserialize, Serialize};

/// Direction of an edge relative to its source position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Back,
}

/// Directed link between two capture indices (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub direction: Direction,
}

/// Forward/back links derived from a path
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectivityGraph {
    node_count: usize,
    /// Grouped by source index; within a source, `back` precedes `forward`
    edges: Vec<Edge>,
}

impl ConnectivityGraph {
    /// Link `node_count` positions in sequence
    #[must_use]
    pub fn sequential(node_count: usize) -> Self {
        let mut edges = Vec::with_capacity(2 * node_count.saturating_sub(1));
        for i in 0..node_count {
            if i > 0 {
                edges.push(Edge {
                    from: i,
                    to: i - 1,
                    direction: Direction::Back,
                });
            }
            if i + 1 < node_count {
                edges.push(Edge {
                    from: i,
                    to: i + 1,
                    direction: Direction::Forward,
                });
            }
        }
        Self { node_count, edges }
    }

    #[must_use]
    pub fn from_path(path: &LayoutPath) -> Self {
        Self::sequential(path.len())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Outgoing edges of one position, `back` before `forward`
    ///
    /// Edges are stored grouped by source, so position `i` starts at `2i - 1` (0 for the
    /// first position) and owns one edge per existing neighbour.
    #[must_use]
    pub fn edges_from(&self, index: usize) -> &[Edge] {
        if index >= self.node_count {
            return &[];
        }
        let start = if index == 0 { 0 } else { 2 * index - 1 };
        let len = usize::from(index > 0) + usize::from(index + 1 < self.node_count);
        self.edges.get(start..start + len).unwrap_or(&[])
    }

    #[must_use]
    pub fn count(&self, direction: Direction) -> usize {
        self.edges.iter().filter(|e| e.direction == direction).count()
    }
}
