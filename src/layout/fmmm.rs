use crate::analysis::connected_components;
use crate::layout::multilevel::{Level, build_hierarchy};
use crate::layout::packing::{pack_components, rotate_for_compactness};
use crate::layout::quadtree::QuadTree;
use crate::layout::rng::SeededRng;
use crate::layout::{AttributedGraph, LayoutEngine, LayoutError, Vec2};
use petgraph::visit::EdgeRef;

/// Desired edge lengths are never shorter than this
const MIN_EDGE_LENGTH: f64 = 1e-3;

/// Profiles picked when `use_high_level_options` is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityVersusSpeed {
    NiceAndIncredibleSpeed,
    #[default]
    BeautifulAndFast,
    GorgeousAndEfficient,
}

impl QualityVersusSpeed {
    /// `(fixed_iterations, fine_tuning_iterations, nm_precision)`
    pub fn iterations(&self) -> (u32, u32, u32) {
        match self {
            QualityVersusSpeed::NiceAndIncredibleSpeed => (15, 10, 2),
            QualityVersusSpeed::BeautifulAndFast => (30, 20, 4),
            QualityVersusSpeed::GorgeousAndEfficient => (60, 40, 6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllowedPositions {
    /// No restriction
    #[default]
    All,
    /// Rounded to integers inside the `i32` range
    Integer,
    /// Clamped to `±2^max_int_pos_exponent`
    Exponent,
}

impl AllowedPositions {
    fn apply(&self, p: Vec2, max_int_pos_exponent: i32) -> Vec2 {
        match self {
            AllowedPositions::All => p,
            AllowedPositions::Integer => {
                let clamp = |v: f64| v.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX));
                Vec2::new(clamp(p.x), clamp(p.y))
            }
            AllowedPositions::Exponent => {
                let limit = 2f64.powi(max_int_pos_exponent);
                Vec2::new(p.x.clamp(-limit, limit), p.y.clamp(-limit, limit))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialPlacementForces {
    /// Start from the positions already stored on the nodes
    KeepPositions,
    /// Scatter nodes using `rand_seed`
    #[default]
    Random,
}

/// Configuration options for the FMMM layout
#[derive(Debug, Clone, PartialEq)]
pub struct FmmmOptions {
    pub rand_seed: u64,
    /// Derive iteration counts from `quality_versus_speed` instead of the
    /// low-level fields
    pub use_high_level_options: bool,
    pub quality_versus_speed: QualityVersusSpeed,
    /// Scale applied to every caller edge length
    pub unit_edge_length: f64,
    pub allowed_positions: AllowedPositions,
    pub max_int_pos_exponent: i32,
    /// Target width / height of the whole drawing
    pub page_ratio: f64,
    /// Minimum gap between connected components
    pub min_dist_cc: f64,
    pub steps_for_rotating_components: u32,
    pub initial_placement_forces: InitialPlacementForces,
    pub fixed_iterations: u32,
    pub fine_tuning_iterations: u32,
    /// Higher values approximate far-away repulsion more accurately
    pub nm_precision: u32,
}

impl Default for FmmmOptions {
    fn default() -> Self {
        let (fixed_iterations, fine_tuning_iterations, nm_precision) =
            QualityVersusSpeed::default().iterations();
        Self {
            rand_seed: 100,
            use_high_level_options: false,
            quality_versus_speed: QualityVersusSpeed::default(),
            unit_edge_length: 20.0,
            allowed_positions: AllowedPositions::default(),
            max_int_pos_exponent: 40,
            page_ratio: 1.0,
            min_dist_cc: 20.0,
            steps_for_rotating_components: 10,
            initial_placement_forces: InitialPlacementForces::default(),
            fixed_iterations,
            fine_tuning_iterations,
            nm_precision,
        }
    }
}

impl FmmmOptions {
    /// `(fixed_iterations, fine_tuning_iterations, nm_precision)` in effect
    pub fn iteration_profile(&self) -> (u32, u32, u32) {
        if self.use_high_level_options {
            self.quality_versus_speed.iterations()
        } else {
            (
                self.fixed_iterations,
                self.fine_tuning_iterations,
                self.nm_precision,
            )
        }
    }

    fn validate(&self) -> Result<(), LayoutError> {
        let checks = [
            ("unit_edge_length", self.unit_edge_length, self.unit_edge_length > 0.0),
            ("page_ratio", self.page_ratio, self.page_ratio > 0.0),
            ("min_dist_cc", self.min_dist_cc, self.min_dist_cc >= 0.0),
        ];
        for (name, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(LayoutError::InvalidOption { name, value });
            }
        }
        Ok(())
    }
}

/// Multilevel force-directed layout with Barnes-Hut repulsion
#[derive(Debug, Clone, Default)]
pub struct FmmmLayout {
    options: FmmmOptions,
}

impl FmmmLayout {
    pub fn new(options: FmmmOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FmmmOptions {
        &self.options
    }

    fn keeps_positions(&self) -> bool {
        self.options.initial_placement_forces == InitialPlacementForces::KeepPositions
    }

    /// Lay out one connected component in local coordinates
    fn layout_component(&self, base: Level, initial: Vec<Vec2>, rng: &mut SeededRng) -> Vec<Vec2> {
        if base.node_count() == 1 {
            return initial;
        }

        let (fixed, fine, precision) = self.options.iteration_profile();
        let theta = (2.0 / f64::from(precision.max(1))).min(1.0);

        let levels = build_hierarchy(base);

        // Kept positions are projected up so each coarser node starts at the
        // centre of the nodes it stands for
        let kept: Vec<Vec<Vec2>> = if self.keeps_positions() {
            let mut kept = vec![initial];
            for depth in 1..levels.len() {
                let coarser = levels[depth].restrict(&levels[depth - 1], &kept[depth - 1]);
                kept.push(coarser);
            }
            kept
        } else {
            Vec::new()
        };

        let mut positions = match kept.last() {
            Some(coarsest) => coarsest.clone(),
            None => {
                let coarsest = levels.len() - 1;
                let finest_nodes = levels[0].node_count() as f64;
                let half = ideal_length(&levels[coarsest], self.options.unit_edge_length)
                    * finest_nodes.sqrt()
                    * 0.5;
                (0..levels[coarsest].node_count())
                    .map(|_| rng.point_in_square(half))
                    .collect()
            }
        };

        for depth in (0..levels.len()).rev() {
            let level = &levels[depth];
            let k = ideal_length(level, self.options.unit_edge_length);
            separate_coincident(&mut positions, k * 0.05, rng);
            relax(level, &mut positions, k, fixed, fine, theta);
            tracing::trace!(
                depth,
                nodes = level.node_count(),
                edges = level.edges.len(),
                "relaxed level"
            );

            if depth > 0 {
                let finer = &levels[depth - 1];
                let spread = ideal_length(finer, self.options.unit_edge_length) * 0.25;
                positions = if kept.is_empty() {
                    level
                        .parent_of_finer
                        .iter()
                        .map(|&parent| positions[parent] + rng.direction() * spread)
                        .collect()
                } else {
                    // keep each finer node's offset from its kept centre
                    let (finer_kept, centres) = (&kept[depth - 1], &kept[depth]);
                    level
                        .parent_of_finer
                        .iter()
                        .enumerate()
                        .map(|(i, &parent)| positions[parent] + (finer_kept[i] - centres[parent]))
                        .collect()
                };
            }
        }

        positions
    }
}

impl LayoutEngine for FmmmLayout {
    fn run(&self, graph: &mut AttributedGraph, edge_lengths: &[f64]) -> Result<(), LayoutError> {
        self.options.validate()?;
        if edge_lengths.len() != graph.edge_count() {
            return Err(LayoutError::EdgeLengthMismatch {
                expected: graph.edge_count(),
                actual: edge_lengths.len(),
            });
        }
        if graph.node_count() == 0 {
            return Ok(());
        }

        let mut rng = SeededRng::new(self.options.rand_seed);
        let components = connected_components(&*graph);

        // (component, local index) for every node
        let mut location = vec![(0usize, 0usize); graph.node_count()];
        let mut levels: Vec<Level> = Vec::with_capacity(components.len());
        for (c, component) in components.iter().enumerate() {
            for (local, node) in component.iter().enumerate() {
                location[node.index()] = (c, local);
            }
            levels.push(Level {
                masses: vec![1.0; component.len()],
                radii: component.iter().map(|&n| graph[n].radius()).collect(),
                edges: Vec::new(),
                parent_of_finer: Vec::new(),
            });
        }

        for edge in graph.edge_references() {
            let (c, a) = location[edge.source().index()];
            let (_, b) = location[edge.target().index()];
            if a == b {
                continue;
            }
            let requested = edge_lengths[edge.id().index()];
            let requested = if requested.is_finite() && requested > 0.0 {
                requested
            } else {
                0.0
            };
            let level = &mut levels[c];
            let desired = requested * self.options.unit_edge_length + level.radii[a] + level.radii[b];
            level.edges.push((a, b, desired.max(MIN_EDGE_LENGTH)));
        }

        let mut placed = Vec::with_capacity(components.len());
        let mut radii = Vec::with_capacity(components.len());
        for (component, level) in components.iter().zip(levels) {
            let initial = if self.keeps_positions() {
                component.iter().map(|&n| graph[n].position()).collect()
            } else {
                vec![Vec2::ZERO; component.len()]
            };
            let component_radii = level.radii.clone();
            let mut positions = self.layout_component(level, initial, &mut rng);
            rotate_for_compactness(
                &mut positions,
                &component_radii,
                self.options.steps_for_rotating_components,
            );
            placed.push(positions);
            radii.push(component_radii);
        }

        pack_components(
            &mut placed,
            &radii,
            self.options.page_ratio,
            self.options.min_dist_cc,
        );

        for (component, positions) in components.iter().zip(&placed) {
            for (&node, &p) in component.iter().zip(positions) {
                let p = self
                    .options
                    .allowed_positions
                    .apply(p, self.options.max_int_pos_exponent);
                if !p.is_finite() {
                    return Err(LayoutError::Diverged(node.index()));
                }
                graph[node].x = p.x;
                graph[node].y = p.y;
            }
        }

        tracing::trace!(
            nodes = graph.node_count(),
            components = components.len(),
            "fmmm layout finished"
        );
        Ok(())
    }
}

/// Natural spring length of a level: mean desired edge length, or a
/// node-size based guess when the level has no edges
fn ideal_length(level: &Level, unit_edge_length: f64) -> f64 {
    if level.edges.is_empty() {
        let mean_radius = level.radii.iter().sum::<f64>() / level.node_count().max(1) as f64;
        return (unit_edge_length + 2.0 * mean_radius).max(MIN_EDGE_LENGTH);
    }
    let total: f64 = level.edges.iter().map(|e| e.2).sum();
    (total / level.edges.len() as f64).max(MIN_EDGE_LENGTH)
}

/// Nudge nodes sharing an exact position apart so forces have a direction
fn separate_coincident(positions: &mut [Vec2], jitter: f64, rng: &mut SeededRng) {
    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_by(|&a, &b| {
        positions[a]
            .x
            .total_cmp(&positions[b].x)
            .then(positions[a].y.total_cmp(&positions[b].y))
    });
    let original = positions.to_vec();
    for pair in order.windows(2) {
        if original[pair[0]] == original[pair[1]] {
            positions[pair[1]] += rng.direction() * jitter;
        }
    }
}

fn relax(level: &Level, positions: &mut [Vec2], k: f64, fixed: u32, fine: u32, theta: f64) {
    let n = level.node_count();
    let k2 = k * k;
    let hot = k * (0.5 + 0.1 * (n as f64).sqrt());
    let cool = k * 0.05;

    for it in 0..fixed {
        let t = f64::from(it) / f64::from(fixed);
        force_step(level, positions, k2, theta, hot + (cool - hot) * t);
    }
    for it in 0..fine {
        let t = f64::from(it) / f64::from(fine);
        force_step(level, positions, k2, theta, cool * (1.0 - 0.9 * t));
    }
}

fn force_step(level: &Level, positions: &mut [Vec2], k2: f64, theta: f64, temperature: f64) {
    let tree = QuadTree::build(positions, &level.masses);
    let mut displacement: Vec<Vec2> = (0..positions.len())
        .map(|i| tree.repulsion(i, positions, &level.masses, theta, k2))
        .collect();

    for &(a, b, desired) in &level.edges {
        let delta = positions[b] - positions[a];
        let distance = delta.length();
        if distance < MIN_EDGE_LENGTH {
            continue;
        }
        let pull = delta * (distance / desired);
        displacement[a] += pull * (1.0 / level.masses[a]);
        displacement[b] += pull * (-1.0 / level.masses[b]);
    }

    for (p, d) in positions.iter_mut().zip(displacement) {
        let length = d.length();
        if length > 0.0 && length.is_finite() {
            *p += d * (length.min(temperature) / length);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::NodeAttributes;
    use petgraph::graph::NodeIndex;

    fn graph_with(nodes: usize, edges: &[(usize, usize)]) -> (AttributedGraph, Vec<f64>) {
        let mut graph = AttributedGraph::new();
        let ids: Vec<NodeIndex> = (0..nodes)
            .map(|_| graph.add_node(NodeAttributes::new(10.0, 10.0)))
            .collect();
        for &(a, b) in edges {
            graph.add_edge(ids[a], ids[b], ());
        }
        let lengths = vec![1.0; edges.len()];
        (graph, lengths)
    }

    fn seeded(seed: u64) -> FmmmLayout {
        FmmmLayout::new(FmmmOptions {
            rand_seed: seed,
            ..Default::default()
        })
    }

    fn positions(graph: &AttributedGraph) -> Vec<(f64, f64)> {
        graph.node_weights().map(|n| (n.x, n.y)).collect()
    }

    #[test]
    fn test_empty_graph() {
        let (mut graph, lengths) = graph_with(0, &[]);
        assert!(seeded(1).run(&mut graph, &lengths).is_ok());
    }

    #[test]
    fn test_edge_length_mismatch() {
        let (mut graph, _) = graph_with(2, &[(0, 1)]);
        let result = seeded(1).run(&mut graph, &[]);
        assert!(matches!(
            result,
            Err(LayoutError::EdgeLengthMismatch {
                expected: 1,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_invalid_page_ratio() {
        let (mut graph, lengths) = graph_with(2, &[(0, 1)]);
        let layout = FmmmLayout::new(FmmmOptions {
            page_ratio: 0.0,
            ..Default::default()
        });
        assert!(matches!(
            layout.run(&mut graph, &lengths),
            Err(LayoutError::InvalidOption {
                name: "page_ratio",
                ..
            })
        ));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (0, 2)];
        let (mut a, lengths) = graph_with(5, &edges);
        let (mut b, _) = graph_with(5, &edges);
        seeded(7).run(&mut a, &lengths).unwrap();
        seeded(7).run(&mut b, &lengths).unwrap();
        assert_eq!(positions(&a), positions(&b));
    }

    #[test]
    fn test_nodes_are_spread_out() {
        let edges: Vec<(usize, usize)> = (0..29).map(|i| (i, i + 1)).collect();
        let (mut graph, lengths) = graph_with(30, &edges);
        seeded(3).run(&mut graph, &lengths).unwrap();

        let placed = positions(&graph);
        assert!(placed.iter().all(|(x, y)| x.is_finite() && y.is_finite()));
        for i in 0..placed.len() {
            for j in (i + 1)..placed.len() {
                let d = (placed[i].0 - placed[j].0).hypot(placed[i].1 - placed[j].1);
                assert!(d > 1e-6, "nodes {i} and {j} coincide");
            }
        }
    }

    #[test]
    fn test_single_edge_settles_near_desired_length() {
        let (mut graph, lengths) = graph_with(2, &[(0, 1)]);
        let layout = FmmmLayout::new(FmmmOptions {
            rand_seed: 11,
            unit_edge_length: 1.0,
            fixed_iterations: 120,
            fine_tuning_iterations: 20,
            nm_precision: 8,
            ..Default::default()
        });
        layout.run(&mut graph, &lengths).unwrap();

        let placed = positions(&graph);
        let distance = (placed[0].0 - placed[1].0).hypot(placed[0].1 - placed[1].1);
        let desired = 1.0 + 2.0 * 50f64.sqrt();
        assert!(
            distance > 0.5 * desired && distance < 2.0 * desired,
            "distance {distance}"
        );
    }

    #[test]
    fn test_components_keep_separation() {
        let (mut graph, lengths) = graph_with(4, &[(0, 1), (2, 3)]);
        let layout = FmmmLayout::new(FmmmOptions {
            rand_seed: 5,
            min_dist_cc: 100.0,
            ..Default::default()
        });
        layout.run(&mut graph, &lengths).unwrap();

        let placed = positions(&graph);
        let radius = NodeAttributes::new(10.0, 10.0).radius();
        for a in [0, 1] {
            for b in [2, 3] {
                let dx = (placed[a].0 - placed[b].0).abs();
                let dy = (placed[a].1 - placed[b].1).abs();
                assert!(dx.max(dy) >= 100.0 + 2.0 * radius - 1e-6);
            }
        }
    }

    #[test]
    fn test_integer_positions() {
        let (mut graph, lengths) = graph_with(6, &[(0, 1), (1, 2), (3, 4)]);
        let layout = FmmmLayout::new(FmmmOptions {
            allowed_positions: AllowedPositions::Integer,
            ..Default::default()
        });
        layout.run(&mut graph, &lengths).unwrap();
        for (x, y) in positions(&graph) {
            assert_eq!(x, x.round());
            assert_eq!(y, y.round());
        }
    }

    #[test]
    fn test_keep_positions_single_node_unchanged() {
        let (mut graph, lengths) = graph_with(1, &[]);
        graph[NodeIndex::new(0)].x = 0.0;
        graph[NodeIndex::new(0)].y = 0.0;
        let layout = FmmmLayout::new(FmmmOptions {
            initial_placement_forces: InitialPlacementForces::KeepPositions,
            ..Default::default()
        });
        layout.run(&mut graph, &lengths).unwrap();
        let radius = NodeAttributes::new(10.0, 10.0).radius();
        // packing moves the component's box corner to the origin
        assert_eq!(positions(&graph), vec![(radius, radius)]);
    }

    #[test]
    fn test_keep_positions_on_long_path() {
        let edges: Vec<(usize, usize)> = (0..63).map(|i| (i, i + 1)).collect();
        let (mut graph, lengths) = graph_with(64, &edges);
        let layout = FmmmLayout::new(FmmmOptions {
            rand_seed: 9,
            initial_placement_forces: InitialPlacementForces::KeepPositions,
            ..Default::default()
        });
        layout.run(&mut graph, &lengths).unwrap();

        let placed = positions(&graph);
        assert!(placed.iter().all(|(x, y)| x.is_finite() && y.is_finite()));
        for i in 0..placed.len() {
            for j in (i + 1)..placed.len() {
                let d = (placed[i].0 - placed[j].0).hypot(placed[i].1 - placed[j].1);
                assert!(d > 1e-6, "nodes {i} and {j} coincide");
            }
        }

        let (mut again, _) = graph_with(64, &edges);
        layout.run(&mut again, &lengths).unwrap();
        assert_eq!(placed, positions(&again));
    }

    #[test]
    fn test_coincident_nodes_are_separated() {
        let mut placed = vec![Vec2::ZERO; 4];
        let mut rng = SeededRng::new(3);
        separate_coincident(&mut placed, 1.0, &mut rng);
        for i in 0..placed.len() {
            for j in (i + 1)..placed.len() {
                assert_ne!(placed[i], placed[j]);
            }
        }
    }

    #[test]
    fn test_high_level_options_override_low_level() {
        let options = FmmmOptions {
            use_high_level_options: true,
            quality_versus_speed: QualityVersusSpeed::GorgeousAndEfficient,
            fixed_iterations: 1,
            ..Default::default()
        };
        assert_eq!(options.iteration_profile(), (60, 40, 6));

        let low = FmmmOptions {
            fixed_iterations: 3,
            fine_tuning_iterations: 1,
            nm_precision: 2,
            ..Default::default()
        };
        assert_eq!(low.iteration_profile(), (3, 1, 2));
    }
}
