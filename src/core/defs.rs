use serde::{Deserialize, Serialize};

/// Footprint used for nodes without an explicit positive width/height
pub const DEFAULT_NODE_SIZE: f64 = 10.0;

/// Iteration and precision settings a quality level resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityProfile {
    pub fixed_iterations: u32,
    pub fine_tuning_iterations: u32,
    pub precision: u32,
}

/// Ordinal trade-off between layout time and refinement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LayoutQuality {
    Fast,
    Low,
    #[default]
    Medium,
    High,
    Maximum,
}

impl LayoutQuality {
    pub const ALL: [LayoutQuality; 5] = [
        LayoutQuality::Fast,
        LayoutQuality::Low,
        LayoutQuality::Medium,
        LayoutQuality::High,
        LayoutQuality::Maximum,
    ];

    /// Resolve a caller-supplied level. Anything outside 0..=4 is `Medium`.
    pub fn from_level(level: i32) -> Self {
        match level {
            0 => LayoutQuality::Fast,
            1 => LayoutQuality::Low,
            3 => LayoutQuality::High,
            4 => LayoutQuality::Maximum,
            _ => LayoutQuality::Medium,
        }
    }

    pub fn value(&self) -> i32 {
        match self {
            LayoutQuality::Fast => 0,
            LayoutQuality::Low => 1,
            LayoutQuality::Medium => 2,
            LayoutQuality::High => 3,
            LayoutQuality::Maximum => 4,
        }
    }

    pub fn profile(&self) -> QualityProfile {
        let (fixed_iterations, fine_tuning_iterations, precision) = match self {
            LayoutQuality::Fast => (3, 1, 2),
            LayoutQuality::Low => (12, 8, 2),
            LayoutQuality::Medium => (30, 20, 4),
            LayoutQuality::High => (60, 20, 6),
            LayoutQuality::Maximum => (120, 20, 8),
        };
        QualityProfile {
            fixed_iterations,
            fine_tuning_iterations,
            precision,
        }
    }

    pub fn fixed_iterations(&self) -> u32 {
        self.profile().fixed_iterations
    }

    pub fn fine_tuning_iterations(&self) -> u32 {
        self.profile().fine_tuning_iterations
    }

    pub fn precision(&self) -> u32 {
        self.profile().precision
    }

    pub fn name(&self) -> &'static str {
        match self {
            LayoutQuality::Fast => "FAST",
            LayoutQuality::Low => "LOW",
            LayoutQuality::Medium => "MEDIUM",
            LayoutQuality::High => "HIGH",
            LayoutQuality::Maximum => "MAXIMUM",
        }
    }
}

/// A directed edge as handed over by the caller. Endpoints are unchecked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: i32,
    pub target: i32,
    pub weight: f32,
}

impl EdgeSpec {
    pub fn new(source: i32, target: i32, weight: f32) -> Self {
        EdgeSpec {
            source,
            target,
            weight,
        }
    }

    /// Both endpoints lie in `[0, node_count)`
    pub fn is_within(&self, node_count: usize) -> bool {
        let in_range = |i: i32| usize::try_from(i).is_ok_and(|i| i < node_count);
        in_range(self.source) && in_range(self.target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSize {
    pub width: f32,
    pub height: f32,
}

impl NodeSize {
    pub fn new(width: f32, height: f32) -> Self {
        NodeSize { width, height }
    }

    /// Width/height actually used for layout, falling back to the default square
    pub fn effective(&self) -> (f64, f64) {
        let pick = |v: f32| {
            if v > 0.0 && v.is_finite() {
                f64::from(v)
            } else {
                DEFAULT_NODE_SIZE
            }
        };
        (pick(self.width), pick(self.height))
    }
}

/// Graph handed to a single layout call. Nodes are implicit `0..node_count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub node_count: usize,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    #[serde(default)]
    pub node_sizes: Option<Vec<NodeSize>>,
}

impl GraphDescription {
    pub fn new(node_count: usize) -> Self {
        GraphDescription {
            node_count,
            ..Default::default()
        }
    }

    pub fn with_edges(mut self, edges: Vec<EdgeSpec>) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_node_sizes(mut self, sizes: Vec<NodeSize>) -> Self {
        self.node_sizes = Some(sizes);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    /// Raw quality level; see [`LayoutQuality::from_level`]
    pub quality_level: i32,
    /// Keep existing positions as the initial placement instead of randomizing
    pub preserve_initial_positions: bool,
    pub aspect_ratio: f64,
    pub component_separation: f64,
    /// Pins the random placement; a wall-clock seed is used when absent
    pub seed: Option<u64>,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            quality_level: LayoutQuality::Medium.value(),
            preserve_initial_positions: false,
            aspect_ratio: 1.0,
            component_separation: 100.0,
            seed: None,
        }
    }
}

impl LayoutParams {
    pub fn quality(&self) -> LayoutQuality {
        LayoutQuality::from_level(self.quality_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_table() {
        let expected = [(3, 1, 2), (12, 8, 2), (30, 20, 4), (60, 20, 6), (120, 20, 8)];
        for (quality, (fixed, fine, precision)) in LayoutQuality::ALL.iter().zip(expected) {
            assert_eq!(quality.fixed_iterations(), fixed);
            assert_eq!(quality.fine_tuning_iterations(), fine);
            assert_eq!(quality.precision(), precision);
        }
    }

    #[test]
    fn test_quality_values_round_trip() {
        for quality in LayoutQuality::ALL {
            assert_eq!(LayoutQuality::from_level(quality.value()), quality);
        }
        assert_eq!(LayoutQuality::Fast.value(), 0);
        assert_eq!(LayoutQuality::Maximum.value(), 4);
    }

    #[test]
    fn test_out_of_range_quality_is_medium() {
        let medium = LayoutQuality::Medium.profile();
        for level in [-1, 5, 17, i32::MIN, i32::MAX] {
            assert_eq!(LayoutQuality::from_level(level).profile(), medium);
        }
    }

    #[test]
    fn test_edge_range_check() {
        assert!(EdgeSpec::new(0, 2, 1.0).is_within(3));
        assert!(!EdgeSpec::new(0, 3, 1.0).is_within(3));
        assert!(!EdgeSpec::new(-1, 0, 1.0).is_within(3));
        assert!(!EdgeSpec::new(0, 0, 1.0).is_within(0));
    }

    #[test]
    fn test_node_size_fallback() {
        assert_eq!(NodeSize::new(30.0, 40.0).effective(), (30.0, 40.0));
        assert_eq!(NodeSize::new(0.0, -2.0).effective(), (10.0, 10.0));
        assert_eq!(NodeSize::new(f32::NAN, 5.0).effective(), (10.0, 5.0));
    }

    #[test]
    fn test_default_params() {
        let params = LayoutParams::default();
        assert_eq!(params.quality(), LayoutQuality::Medium);
        assert!(!params.preserve_initial_positions);
        assert_eq!(params.aspect_ratio, 1.0);
        assert_eq!(params.component_separation, 100.0);
        assert_eq!(params.seed, None);
    }
}
