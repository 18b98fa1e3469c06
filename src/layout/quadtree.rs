use crate::layout::Vec2;

const MAX_DEPTH: usize = 24;
/// Pairwise distances are never taken below this
const MIN_DISTANCE: f64 = 1e-3;

#[derive(Debug, Clone)]
struct Cell {
    mass: f64,
    center_of_mass: Vec2,
    size: f64,
    children: Vec<usize>,
    /// Only filled for leaves
    bodies: Vec<usize>,
}

/// Barnes-Hut tree used to approximate the all-pairs repulsive forces
pub(crate) struct QuadTree {
    cells: Vec<Cell>,
}

impl QuadTree {
    pub(crate) fn build(positions: &[Vec2], masses: &[f64]) -> Self {
        let mut tree = Self { cells: Vec::new() };
        if positions.is_empty() {
            return tree;
        }

        let (mut min, mut max) = (positions[0], positions[0]);
        for p in positions {
            min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
            max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
        }
        let size = (max.x - min.x).max(max.y - min.y).max(MIN_DISTANCE);

        let bodies: Vec<usize> = (0..positions.len()).collect();
        tree.insert(bodies, min, size, 0, positions, masses);
        tree
    }

    fn insert(
        &mut self,
        bodies: Vec<usize>,
        origin: Vec2,
        size: f64,
        depth: usize,
        positions: &[Vec2],
        masses: &[f64],
    ) -> usize {
        let mass: f64 = bodies.iter().map(|&b| masses[b]).sum();
        let weighted = bodies
            .iter()
            .fold(Vec2::ZERO, |acc, &b| acc + positions[b] * masses[b]);
        let center_of_mass = if mass > 0.0 {
            weighted * (1.0 / mass)
        } else {
            origin
        };

        let index = self.cells.len();
        self.cells.push(Cell {
            mass,
            center_of_mass,
            size,
            children: Vec::new(),
            bodies: Vec::new(),
        });

        if bodies.len() <= 1 || depth >= MAX_DEPTH {
            self.cells[index].bodies = bodies;
            return index;
        }

        let half = size / 2.0;
        let mid = origin + Vec2::new(half, half);
        let mut quadrants: [Vec<usize>; 4] = Default::default();
        for b in bodies {
            let p = positions[b];
            let q = usize::from(p.x >= mid.x) + 2 * usize::from(p.y >= mid.y);
            quadrants[q].push(b);
        }

        let mut children = Vec::with_capacity(4);
        for (q, quadrant) in quadrants.into_iter().enumerate() {
            if quadrant.is_empty() {
                continue;
            }
            let child_origin = Vec2::new(
                if q % 2 == 1 { mid.x } else { origin.x },
                if q >= 2 { mid.y } else { origin.y },
            );
            children.push(self.insert(quadrant, child_origin, half, depth + 1, positions, masses));
        }
        self.cells[index].children = children;
        index
    }

    /// Repulsive force on `body`, magnitude `k2 * m / d` per interacting mass.
    /// Cells are aggregated when `size / distance < theta`.
    pub(crate) fn repulsion(
        &self,
        body: usize,
        positions: &[Vec2],
        masses: &[f64],
        theta: f64,
        k2: f64,
    ) -> Vec2 {
        let mut force = Vec2::ZERO;
        if self.cells.is_empty() {
            return force;
        }

        let p = positions[body];
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let cell = &self.cells[index];
            if cell.children.is_empty() {
                for &other in &cell.bodies {
                    if other != body {
                        force += pairwise(p, positions[other], masses[other], k2);
                    }
                }
                continue;
            }

            let distance = (p - cell.center_of_mass).length();
            if distance > MIN_DISTANCE && cell.size / distance < theta {
                force += pairwise(p, cell.center_of_mass, cell.mass, k2);
            } else {
                stack.extend(cell.children.iter().copied());
            }
        }
        force
    }
}

fn pairwise(p: Vec2, q: Vec2, mass: f64, k2: f64) -> Vec2 {
    let delta = p - q;
    let distance = delta.length();
    if distance < MIN_DISTANCE {
        // coincident bodies are separated by jitter before forces run
        return Vec2::ZERO;
    }
    delta * (k2 * mass / (distance * distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(body: usize, positions: &[Vec2], masses: &[f64], k2: f64) -> Vec2 {
        positions
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != body)
            .fold(Vec2::ZERO, |acc, (i, q)| {
                acc + pairwise(positions[body], *q, masses[i], k2)
            })
    }

    #[test]
    fn test_empty_tree() {
        let tree = QuadTree::build(&[], &[]);
        assert!(tree.cells.is_empty());
    }

    #[test]
    fn test_two_bodies_push_apart() {
        let positions = [Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0)];
        let masses = [1.0, 1.0];
        let tree = QuadTree::build(&positions, &masses);
        let f0 = tree.repulsion(0, &positions, &masses, 0.5, 4.0);
        let f1 = tree.repulsion(1, &positions, &masses, 0.5, 4.0);
        assert!(f0.x < 0.0 && f1.x > 0.0);
        assert!((f0.x + f1.x).abs() < 1e-12);
        assert!((f0.x + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_theta_matches_exact_sum() {
        let positions: Vec<Vec2> = (0..20)
            .map(|i| Vec2::new((i * 7 % 11) as f64, (i * 5 % 13) as f64))
            .collect();
        let masses = vec![1.0; positions.len()];
        let tree = QuadTree::build(&positions, &masses);
        for body in 0..positions.len() {
            let approx = tree.repulsion(body, &positions, &masses, 0.0, 1.0);
            let reference = exact(body, &positions, &masses, 1.0);
            assert!((approx - reference).length() < 1e-9);
        }
    }

    #[test]
    fn test_coincident_bodies_stay_finite() {
        let positions = vec![Vec2::ZERO; 5];
        let masses = vec![1.0; 5];
        let tree = QuadTree::build(&positions, &masses);
        let force = tree.repulsion(0, &positions, &masses, 0.5, 1.0);
        assert!(force.is_finite());
    }
}
