pub mod fmmm;
mod multilevel;
mod packing;
mod quadtree;
mod rng;

use petgraph::graph::Graph;
use std::ops::{Add, AddAssign, Mul, Sub};
use thiserror::Error;

pub use fmmm::{
    AllowedPositions, FmmmLayout, FmmmOptions, InitialPlacementForces, QualityVersusSpeed,
};

/// Per-node attribute store the engine reads sizes from and writes positions to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeAttributes {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeAttributes {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Radius of the circle enclosing the node's box
    pub fn radius(&self) -> f64 {
        0.5 * self.width.hypot(self.height)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Graph shape the layout engines operate on; edge lengths are passed alongside
pub type AttributedGraph = Graph<NodeAttributes, ()>;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("expected {expected} edge lengths, got {actual}")]
    EdgeLengthMismatch { expected: usize, actual: usize },
    #[error("invalid layout option {name}: {value}")]
    InvalidOption { name: &'static str, value: f64 },
    #[error("layout diverged: node {0} has a non-finite position")]
    Diverged(usize),
}

/// A force-directed layout engine
pub trait LayoutEngine {
    /// Move every node of `graph` to its final position. `edge_lengths` is
    /// indexed by edge index and holds the desired length of each edge.
    fn run(&self, graph: &mut AttributedGraph, edge_lengths: &[f64]) -> Result<(), LayoutError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn rotated(&self, angle: f64) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}
