//! Stateless translation of a caller graph plus layout parameters into one
//! engine run, and of the engine's node attributes back into a flat
//! `[x0, y0, x1, y1, ...]` coordinate sequence.

use crate::analysis::GraphStats;
use crate::core::defs::{GraphDescription, LayoutParams, NodeSize};
use crate::layout::{
    AllowedPositions, AttributedGraph, FmmmLayout, FmmmOptions, InitialPlacementForces,
    LayoutEngine, LayoutError, NodeAttributes,
};
use petgraph::graph::NodeIndex;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Unit edge length handed to the engine; caller weights are used as-is
pub const UNIT_EDGE_LENGTH: f64 = 1.0;
pub const ROTATION_STEPS: u32 = 50;

/// The single failure kind reported to callers. The message is what
/// crosses the boundary.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Failed to get array elements: {0}")]
    InputAcquisition(String),
    #[error("Invalid layout parameter: {0}")]
    InvalidParameter(String),
    #[error("Layout failed: {0}")]
    Engine(#[from] LayoutError),
    #[error("Failed to create result array")]
    OutputAllocation,
}

/// Coordinates of one layout call, in input node order
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub coordinates: Vec<f32>,
    pub stats: GraphStats,
}

impl LayoutResult {
    pub fn node_count(&self) -> usize {
        self.coordinates.len() / 2
    }

    pub fn position(&self, node: usize) -> Option<(f32, f32)> {
        let x = *self.coordinates.get(node * 2)?;
        let y = *self.coordinates.get(node * 2 + 1)?;
        Some((x, y))
    }

    pub fn positions(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.coordinates.chunks_exact(2).map(|xy| (xy[0], xy[1]))
    }
}

/// Seed derived from the wall clock at call start
pub fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()).rotate_left(32))
        .unwrap_or_default()
}

/// Engine configuration for one call
pub fn engine_options(params: &LayoutParams, seed: u64) -> FmmmOptions {
    let profile = params.quality().profile();
    FmmmOptions {
        rand_seed: seed,
        use_high_level_options: false,
        unit_edge_length: UNIT_EDGE_LENGTH,
        allowed_positions: AllowedPositions::All,
        page_ratio: params.aspect_ratio,
        min_dist_cc: params.component_separation,
        steps_for_rotating_components: ROTATION_STEPS,
        initial_placement_forces: if params.preserve_initial_positions {
            InitialPlacementForces::KeepPositions
        } else {
            InitialPlacementForces::Random
        },
        fixed_iterations: profile.fixed_iterations,
        fine_tuning_iterations: profile.fine_tuning_iterations,
        nm_precision: profile.precision,
        ..Default::default()
    }
}

fn validate_params(params: &LayoutParams) -> Result<(), BridgeError> {
    if !(params.aspect_ratio.is_finite() && params.aspect_ratio > 0.0) {
        return Err(BridgeError::InvalidParameter(format!(
            "aspect ratio must be positive, got {}",
            params.aspect_ratio
        )));
    }
    if !(params.component_separation.is_finite() && params.component_separation >= 0.0) {
        return Err(BridgeError::InvalidParameter(format!(
            "component separation must be non-negative, got {}",
            params.component_separation
        )));
    }
    Ok(())
}

/// Build the engine graph: sized nodes at the origin, in-range edges only.
/// Returns the graph, the edge lengths indexed by edge, and the stats.
pub fn build_graph(
    description: &GraphDescription,
) -> Result<(AttributedGraph, Vec<f64>, GraphStats), BridgeError> {
    let n = description.node_count;
    if let Some(sizes) = &description.node_sizes
        && sizes.len() < n
    {
        return Err(BridgeError::InputAcquisition(format!(
            "{} node sizes supplied for {} nodes",
            sizes.len(),
            n
        )));
    }

    let mut graph = AttributedGraph::with_capacity(n, description.edges.len());
    let nodes: Vec<NodeIndex> = (0..n)
        .map(|i| {
            let (width, height) = description
                .node_sizes
                .as_ref()
                .map(|sizes| sizes[i])
                .unwrap_or(NodeSize::new(0.0, 0.0))
                .effective();
            graph.add_node(NodeAttributes::new(width, height))
        })
        .collect();

    let mut edge_lengths = Vec::with_capacity(description.edges.len());
    let mut dropped = 0;
    for edge in &description.edges {
        if !edge.is_within(n) {
            dropped += 1;
            continue;
        }
        graph.add_edge(
            nodes[edge.source as usize],
            nodes[edge.target as usize],
            (),
        );
        edge_lengths.push(f64::from(edge.weight));
    }
    if dropped > 0 {
        tracing::warn!(dropped, nodes = n, "skipped edges with out-of-range endpoints");
    }

    let stats = GraphStats::from_graph(&graph, dropped);
    Ok((graph, edge_lengths, stats))
}

/// Lay out `description` with the FMMM engine
pub fn compute_layout(
    description: &GraphDescription,
    params: &LayoutParams,
) -> Result<LayoutResult, BridgeError> {
    validate_params(params)?;
    let seed = params.seed.unwrap_or_else(time_seed);
    let engine = FmmmLayout::new(engine_options(params, seed));
    tracing::debug!(
        quality = params.quality().name(),
        seed,
        preserve = params.preserve_initial_positions,
        "configured fmmm engine"
    );
    compute_layout_with(&engine, description, params)
}

/// Lay out `description` with any engine. All-or-nothing: no coordinates
/// are returned unless the engine and the output allocation both succeed.
pub fn compute_layout_with<E: LayoutEngine + ?Sized>(
    engine: &E,
    description: &GraphDescription,
    params: &LayoutParams,
) -> Result<LayoutResult, BridgeError> {
    validate_params(params)?;
    let (mut graph, edge_lengths, stats) = build_graph(description)?;
    tracing::debug!(
        nodes = stats.nodes,
        edges = stats.edges,
        components = stats.components,
        "built layout graph"
    );

    engine.run(&mut graph, &edge_lengths)?;

    let len = stats
        .nodes
        .checked_mul(2)
        .ok_or(BridgeError::OutputAllocation)?;
    let mut coordinates = Vec::new();
    coordinates
        .try_reserve_exact(len)
        .map_err(|_| BridgeError::OutputAllocation)?;
    for (index, attrs) in graph.node_weights().enumerate() {
        let (x, y) = (attrs.x as f32, attrs.y as f32);
        // positions beyond the f32 range would come back as infinities
        if !x.is_finite() || !y.is_finite() {
            return Err(LayoutError::Diverged(index).into());
        }
        coordinates.push(x);
        coordinates.push(y);
    }

    Ok(LayoutResult { coordinates, stats })
}
