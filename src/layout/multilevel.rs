use crate::layout::Vec2;
use std::collections::HashMap;

/// Levels stop being added once a coarsening pass keeps more than this share
const MIN_SHRINK: f64 = 0.8;
const MAX_LEVELS: usize = 30;

/// One level of the multilevel hierarchy. Level 0 is the component itself.
#[derive(Debug, Clone)]
pub(crate) struct Level {
    /// Number of finest-level nodes each node stands for
    pub masses: Vec<f64>,
    pub radii: Vec<f64>,
    /// `(a, b, desired_length)` with `a != b`
    pub edges: Vec<(usize, usize, f64)>,
    /// For every node of the next finer level, the node it was merged into.
    /// Empty on level 0.
    pub parent_of_finer: Vec<usize>,
}

impl Level {
    pub(crate) fn node_count(&self) -> usize {
        self.masses.len()
    }

    fn neighbours(&self) -> Vec<Vec<(usize, f64)>> {
        let mut adjacency = vec![Vec::new(); self.node_count()];
        for &(a, b, length) in &self.edges {
            adjacency[a].push((b, length));
            adjacency[b].push((a, length));
        }
        adjacency
    }

    /// Positions of this level's nodes from those of the next finer level:
    /// the mass-weighted centre of the nodes merged into each one
    pub(crate) fn restrict(&self, finer: &Level, positions: &[Vec2]) -> Vec<Vec2> {
        let mut sums = vec![Vec2::ZERO; self.node_count()];
        for (i, &parent) in self.parent_of_finer.iter().enumerate() {
            sums[parent] += positions[i] * finer.masses[i];
        }
        sums.iter()
            .zip(&self.masses)
            .map(|(&sum, &mass)| sum * (1.0 / mass))
            .collect()
    }

    /// Collapse a greedy matching of light neighbours into single nodes
    fn coarsen(&self) -> Level {
        let n = self.node_count();
        let adjacency = self.neighbours();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            self.masses[a]
                .total_cmp(&self.masses[b])
                .then(adjacency[a].len().cmp(&adjacency[b].len()))
                .then(a.cmp(&b))
        });

        let mut parent = vec![usize::MAX; n];
        let mut masses = Vec::new();
        let mut radii = Vec::new();

        for &u in &order {
            if parent[u] != usize::MAX {
                continue;
            }
            let partner = adjacency[u]
                .iter()
                .filter(|(v, _)| parent[*v] == usize::MAX && *v != u)
                .min_by(|(a, la), (b, lb)| {
                    self.masses[*a]
                        .total_cmp(&self.masses[*b])
                        .then(la.total_cmp(lb))
                        .then(a.cmp(b))
                })
                .map(|(v, _)| *v);

            let id = masses.len();
            parent[u] = id;
            match partner {
                Some(v) => {
                    parent[v] = id;
                    masses.push(self.masses[u] + self.masses[v]);
                    radii.push(self.radii[u].hypot(self.radii[v]));
                }
                None => {
                    masses.push(self.masses[u]);
                    radii.push(self.radii[u]);
                }
            }
        }

        let mut merged: HashMap<(usize, usize), (f64, usize)> = HashMap::new();
        for &(a, b, length) in &self.edges {
            let (pa, pb) = (parent[a], parent[b]);
            if pa == pb {
                continue;
            }
            let key = (pa.min(pb), pa.max(pb));
            let entry = merged.entry(key).or_insert((0.0, 0));
            entry.0 += length;
            entry.1 += 1;
        }
        let mut edges: Vec<(usize, usize, f64)> = merged
            .into_iter()
            .map(|((a, b), (sum, count))| (a, b, sum / count as f64))
            .collect();
        edges.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));

        Level {
            masses,
            radii,
            edges,
            parent_of_finer: parent,
        }
    }
}

/// Build the hierarchy finest-first. The last entry is the coarsest level.
pub(crate) fn build_hierarchy(base: Level) -> Vec<Level> {
    let mut levels = vec![base];
    while levels.len() < MAX_LEVELS {
        let Some(current) = levels.last() else { break };
        let n = current.node_count();
        if n <= 2 || current.edges.is_empty() {
            break;
        }
        let coarser = current.coarsen();
        if coarser.node_count() as f64 > MIN_SHRINK * n as f64 {
            break;
        }
        levels.push(coarser);
    }
    levels
}
