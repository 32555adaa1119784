//! Grid coordinate system for the rectangular tile board.
//!
//! This module provides the coordinate types pieces are placed on:
//! - `Vertex`: a tile-grid intersection where settlements and cities go
//! - `Edge`: an unordered pair of adjacent vertices where roads go
//!
//! A board of `rows x cols` tiles has a vertex grid of `(rows + 1) x (cols + 1)`.
//! Vertex `(r, c)` is the top-left corner of tile `(r, c)`. These types carry
//! only coordinates; everything that needs the board (clipping, tiles, pieces)
//! lives on [`crate::board::Board`] and takes the coordinate as an argument.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tile-grid intersection point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vertex {
    pub row: i32,
    pub col: i32,
}

impl Vertex {
    /// Create a new vertex coordinate
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Distance vector to another vertex as `(col delta, row delta)`.
    pub fn distance_to(&self, other: &Vertex) -> (i32, i32) {
        (other.col - self.col, other.row - self.row)
    }

    /// Manhattan distance to another vertex
    pub fn manhattan(&self, other: &Vertex) -> i32 {
        (other.col - self.col).abs() + (other.row - self.row).abs()
    }

    /// Two vertices are adjacent iff they are exactly one grid step apart
    pub fn is_adjacent(&self, other: &Vertex) -> bool {
        self.manhattan(other) == 1
    }

    /// The four orthogonal neighbours, unclipped (up, down, left, right)
    pub fn neighbors(&self) -> [Vertex; 4] {
        [
            Vertex::new(self.row - 1, self.col),
            Vertex::new(self.row + 1, self.col),
            Vertex::new(self.row, self.col - 1),
            Vertex::new(self.row, self.col + 1),
        ]
    }

    /// The four tile positions sharing this corner, unclipped
    pub fn touching_tiles(&self) -> [(i32, i32); 4] {
        [
            (self.row, self.col),
            (self.row - 1, self.col),
            (self.row, self.col - 1),
            (self.row - 1, self.col - 1),
        ]
    }

    /// The vertex one step away in `(row, col)` direction
    pub fn offset(&self, d_row: i32, d_col: i32) -> Vertex {
        Vertex::new(self.row + d_row, self.col + d_col)
    }

    /// Edges from this vertex to each of its unclipped neighbours
    pub fn touching_edges(&self) -> [Edge; 4] {
        self.neighbors().map(|n| Edge::canonical(*self, n))
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// An unordered pair of adjacent vertices.
///
/// Endpoints are stored in sorted order so `Edge::new(a, b) == Edge::new(b, a)`
/// and both hash the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    a: Vertex,
    b: Vertex,
}

impl Edge {
    /// Create an edge between two vertices, or `None` if they are not adjacent
    pub fn new(a: Vertex, b: Vertex) -> Option<Self> {
        if a.is_adjacent(&b) {
            Some(Self::canonical(a, b))
        } else {
            None
        }
    }

    fn canonical(a: Vertex, b: Vertex) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }

    /// Both endpoints, lower coordinate first
    pub fn endpoints(&self) -> [Vertex; 2] {
        [self.a, self.b]
    }

    /// Whether `vertex` is one of this edge's endpoints
    pub fn has_endpoint(&self, vertex: &Vertex) -> bool {
        self.a == *vertex || self.b == *vertex
    }

    /// The endpoint that is not `vertex`, if `vertex` is on this edge
    pub fn other_endpoint(&self, vertex: &Vertex) -> Option<Vertex> {
        if self.a == *vertex {
            Some(self.b)
        } else if self.b == *vertex {
            Some(self.a)
        } else {
            None
        }
    }

    /// Whether the two edges share exactly one endpoint
    pub fn shares_endpoint(&self, other: &Edge) -> bool {
        self != other && (other.has_endpoint(&self.a) || other.has_endpoint(&self.b))
    }

    /// Coordinate delta between the endpoints as `(col delta, row delta)`
    pub fn delta(&self) -> (i32, i32) {
        self.a.distance_to(&self.b)
    }

    /// An edge is vertical iff its column delta is zero
    pub fn is_vertical(&self) -> bool {
        self.delta().0 == 0
    }

    /// Edges sharing exactly one endpoint with this one, unclipped
    pub fn touching_edges(&self) -> Vec<Edge> {
        self.endpoints()
            .iter()
            .flat_map(|v| v.touching_edges())
            .filter(|e| e != self)
            .collect()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency_is_symmetric() {
        let samples = [
            Vertex::new(0, 0),
            Vertex::new(0, 1),
            Vertex::new(1, 0),
            Vertex::new(1, 1),
            Vertex::new(2, 3),
        ];
        for a in &samples {
            for b in &samples {
                assert_eq!(a.is_adjacent(b), b.is_adjacent(a), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_distance_is_antisymmetric() {
        let a = Vertex::new(1, 4);
        let b = Vertex::new(3, 2);
        let (dx, dy) = a.distance_to(&b);
        assert_eq!((dx, dy), (-2, 2));
        assert_eq!(b.distance_to(&a), (-dx, -dy));
    }

    #[test]
    fn test_diagonal_is_not_adjacent() {
        assert!(!Vertex::new(1, 1).is_adjacent(&Vertex::new(2, 2)));
        assert!(!Vertex::new(1, 1).is_adjacent(&Vertex::new(1, 1)));
        assert!(Edge::new(Vertex::new(1, 1), Vertex::new(2, 2)).is_none());
    }

    #[test]
    fn test_edge_equality_ignores_endpoint_order() {
        let a = Vertex::new(2, 2);
        let b = Vertex::new(2, 3);
        assert_eq!(Edge::new(a, b), Edge::new(b, a));

        let mut set = std::collections::HashSet::new();
        set.insert(Edge::new(a, b).unwrap());
        assert!(set.contains(&Edge::new(b, a).unwrap()));
    }

    #[test]
    fn test_vertical_classification() {
        let vertical = Edge::new(Vertex::new(0, 1), Vertex::new(1, 1)).unwrap();
        let horizontal = Edge::new(Vertex::new(0, 1), Vertex::new(0, 2)).unwrap();
        assert!(vertical.is_vertical());
        assert!(!horizontal.is_vertical());
    }

    #[test]
    fn test_touching_edges_share_one_endpoint() {
        let edge = Edge::new(Vertex::new(2, 2), Vertex::new(2, 3)).unwrap();
        let touching = edge.touching_edges();
        assert_eq!(touching.len(), 6);
        for other in &touching {
            assert!(edge.shares_endpoint(other));
        }
    }

    #[test]
    fn test_other_endpoint() {
        let a = Vertex::new(0, 0);
        let b = Vertex::new(1, 0);
        let edge = Edge::new(a, b).unwrap();
        assert_eq!(edge.other_endpoint(&a), Some(b));
        assert_eq!(edge.other_endpoint(&b), Some(a));
        assert_eq!(edge.other_endpoint(&Vertex::new(5, 5)), None);
    }
}
