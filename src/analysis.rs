use petgraph::{
    graph::{Graph, NodeIndex},
    unionfind::UnionFind,
    visit::EdgeRef,
};
use serde::Serialize;
use std::collections::HashMap;

/// Statistics of the graph a layout call actually built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    /// Edges that made it into the graph
    pub edges: usize,
    /// Edges skipped because an endpoint was out of range
    pub dropped_edges: usize,
    /// Connected components, edge direction ignored
    pub components: usize,
    pub self_loops: usize,
}

impl GraphStats {
    pub fn from_graph<N, E>(graph: &Graph<N, E>, dropped_edges: usize) -> Self {
        Self {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            dropped_edges,
            components: connected_components(graph).len(),
            self_loops: graph
                .edge_references()
                .filter(|e| e.source() == e.target())
                .count(),
        }
    }
}

/// Weakly connected components. Each component lists its nodes in index
/// order, and components are ordered by their smallest node index.
pub fn connected_components<N, E>(graph: &Graph<N, E>) -> Vec<Vec<NodeIndex>> {
    let mut sets = UnionFind::<usize>::new(graph.node_count());
    for edge in graph.edge_references() {
        sets.union(edge.source().index(), edge.target().index());
    }

    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Vec<NodeIndex>> = Vec::new();
    for node in graph.node_indices() {
        let root = sets.find(node.index());
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(node);
    }
    components
}
