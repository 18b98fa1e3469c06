use crate::bridge::{BridgeError, compute_layout};
use crate::core::defs::{
    DEFAULT_NODE_SIZE, EdgeSpec, GraphDescription, LayoutParams, LayoutQuality, NodeSize,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Aspect ratio used by [`LayoutGraph::layout_default`] and [`LayoutGraph::layout_linear`]
pub const DEFAULT_ASPECT_RATIO: f64 = 1.0;
/// Component separation used by [`LayoutGraph::layout_default`] and [`LayoutGraph::layout_linear`]
pub const DEFAULT_COMPONENT_SEPARATION: f64 = 100.0;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Can't layout graph: {0}")]
    Layout(#[from] BridgeError),
}

fn default_size() -> f64 {
    DEFAULT_NODE_SIZE
}

fn default_weight() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default = "default_size")]
    width: f64,
    #[serde(default = "default_size")]
    height: f64,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_geometry(id, 0.0, 0.0, DEFAULT_NODE_SIZE, DEFAULT_NODE_SIZE)
    }

    pub fn with_geometry(id: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Node {
            id: id.into(),
            x,
            y,
            width,
            height,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Directed edge between two nodes, referenced by their index in the graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    source: usize,
    target: usize,
    #[serde(default = "default_weight")]
    weight: f32,
}

impl Edge {
    pub fn new(source: usize, target: usize, weight: f32) -> Self {
        Edge {
            source,
            target,
            weight,
        }
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutGraph {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

impl LayoutGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index other calls refer to this node by
    pub fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_edge(&mut self, source: usize, target: usize) {
        self.add_weighted_edge(source, target, 1.0);
    }

    pub fn add_weighted_edge(&mut self, source: usize, target: usize, weight: f32) {
        self.edges.push(Edge::new(source, target, weight));
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    /// Bridge input for this graph. Indices beyond `i32` become `-1` and are
    /// dropped like any other out-of-range endpoint.
    pub fn description(&self) -> GraphDescription {
        let index = |i: usize| i32::try_from(i).unwrap_or(-1);
        GraphDescription {
            node_count: self.nodes.len(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeSpec::new(index(e.source), index(e.target), e.weight))
                .collect(),
            node_sizes: Some(
                self.nodes
                    .iter()
                    .map(|n| NodeSize::new(n.width as f32, n.height as f32))
                    .collect(),
            ),
        }
    }

    /// Lay out the graph and store the new positions on its nodes
    pub fn layout_with_params(&mut self, params: &LayoutParams) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Ok(());
        }

        let result = compute_layout(&self.description(), params)?;
        for (node, (x, y)) in self.nodes.iter_mut().zip(result.positions()) {
            node.set_position(f64::from(x), f64::from(y));
        }
        Ok(())
    }

    pub fn layout(
        &mut self,
        quality: LayoutQuality,
        linear_layout: bool,
        aspect_ratio: f64,
        component_separation: f64,
    ) -> Result<(), ModelError> {
        self.layout_with_params(&LayoutParams {
            quality_level: quality.value(),
            preserve_initial_positions: linear_layout,
            aspect_ratio,
            component_separation,
            seed: None,
        })
    }

    pub fn layout_default(&mut self, quality: LayoutQuality) -> Result<(), ModelError> {
        self.layout(
            quality,
            false,
            DEFAULT_ASPECT_RATIO,
            DEFAULT_COMPONENT_SEPARATION,
        )
    }

    /// Layout for linear graphs: every node starts at the origin and keeps
    /// that placement instead of a random scatter. Positions already stored
    /// on the nodes are not used.
    pub fn layout_linear(&mut self, quality: LayoutQuality) -> Result<(), ModelError> {
        self.layout(
            quality,
            true,
            DEFAULT_ASPECT_RATIO,
            DEFAULT_COMPONENT_SEPARATION,
        )
    }
}
