use crate::layout::Vec2;
use std::f64::consts::FRAC_PI_2;

/// Axis-aligned box around a set of nodes, node radii included
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub(crate) fn of(positions: &[Vec2], radii: &[f64]) -> Self {
        let mut min = Vec2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (p, r) in positions.iter().zip(radii) {
            min = Vec2::new(min.x.min(p.x - r), min.y.min(p.y - r));
            max = Vec2::new(max.x.max(p.x + r), max.y.max(p.y + r));
        }
        if positions.is_empty() {
            return Self {
                min: Vec2::ZERO,
                max: Vec2::ZERO,
            };
        }
        Self { min, max }
    }

    pub(crate) fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub(crate) fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub(crate) fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

/// Try `steps` orientations over a quarter turn and keep the one whose
/// bounding box has the smallest area
pub(crate) fn rotate_for_compactness(positions: &mut [Vec2], radii: &[f64], steps: u32) {
    if steps == 0 || positions.len() < 2 {
        return;
    }

    let inv = 1.0 / positions.len() as f64;
    let centroid = positions.iter().fold(Vec2::ZERO, |acc, p| acc + *p) * inv;
    let centered: Vec<Vec2> = positions.iter().map(|p| *p - centroid).collect();

    let mut best_angle = 0.0;
    let mut best_area = Bounds::of(&centered, radii).area();
    let mut rotated = centered.clone();
    for step in 1..steps {
        let angle = FRAC_PI_2 * f64::from(step) / f64::from(steps);
        for (r, c) in rotated.iter_mut().zip(&centered) {
            *r = c.rotated(angle);
        }
        let area = Bounds::of(&rotated, radii).area();
        if area < best_area {
            best_area = area;
            best_angle = angle;
        }
    }

    for (p, c) in positions.iter_mut().zip(&centered) {
        *p = c.rotated(best_angle) + centroid;
    }
}

/// Arrange components in shelves so the overall box approaches
/// `page_ratio` (width / height), keeping `separation` between neighbours
pub(crate) fn pack_components(
    components: &mut [Vec<Vec2>],
    radii: &[Vec<f64>],
    page_ratio: f64,
    separation: f64,
) {
    if components.is_empty() {
        return;
    }

    let bounds: Vec<Bounds> = components
        .iter()
        .zip(radii)
        .map(|(positions, r)| Bounds::of(positions, r))
        .collect();

    let total_area: f64 = bounds
        .iter()
        .map(|b| (b.width() + separation) * (b.height() + separation))
        .sum();
    let widest = bounds.iter().map(Bounds::width).fold(0.0, f64::max);
    let target_width = (total_area * page_ratio).sqrt().max(widest);

    let mut order: Vec<usize> = (0..components.len()).collect();
    order.sort_by(|&a, &b| {
        bounds[b]
            .height()
            .total_cmp(&bounds[a].height())
            .then(a.cmp(&b))
    });

    let (mut cursor_x, mut cursor_y, mut shelf_height) = (0.0, 0.0, 0.0f64);
    for index in order {
        let b = bounds[index];
        if cursor_x > 0.0 && cursor_x + b.width() > target_width {
            cursor_y += shelf_height + separation;
            cursor_x = 0.0;
            shelf_height = 0.0;
        }

        let offset = Vec2::new(cursor_x, cursor_y) - b.min;
        for p in components[index].iter_mut() {
            *p += offset;
        }

        cursor_x += b.width() + separation;
        shelf_height = shelf_height.max(b.height());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap(a: &Bounds, b: &Bounds, gap: f64) -> bool {
        a.min.x < b.max.x + gap - 1e-9
            && b.min.x < a.max.x + gap - 1e-9
            && a.min.y < b.max.y + gap - 1e-9
            && b.min.y < a.max.y + gap - 1e-9
    }

    #[test]
    fn test_bounds_include_radii() {
        let b = Bounds::of(&[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)], &[1.0, 2.0]);
        assert_eq!(b.min, Vec2::new(-1.0, -2.0));
        assert_eq!(b.max, Vec2::new(12.0, 2.0));
    }

    #[test]
    fn test_rotation_never_grows_area() {
        let mut positions = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)];
        let radii = vec![1.0, 1.0];
        let before = Bounds::of(&positions, &radii).area();
        rotate_for_compactness(&mut positions, &radii, 50);
        let after = Bounds::of(&positions, &radii).area();
        assert!(after <= before);
        let length = (positions[1] - positions[0]).length();
        assert!((length - 200f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_packed_components_keep_separation() {
        let mut components: Vec<Vec<Vec2>> = (0..6)
            .map(|i| vec![Vec2::ZERO, Vec2::new(5.0 + i as f64, 3.0)])
            .collect();
        let radii = vec![vec![1.0, 1.0]; 6];
        pack_components(&mut components, &radii, 1.0, 4.0);

        let bounds: Vec<Bounds> = components
            .iter()
            .zip(&radii)
            .map(|(p, r)| Bounds::of(p, r))
            .collect();
        for i in 0..bounds.len() {
            for j in (i + 1)..bounds.len() {
                assert!(!overlap(&bounds[i], &bounds[j], 4.0), "{i} and {j} too close");
            }
        }
    }

    #[test]
    fn test_wide_page_ratio_uses_one_shelf() {
        let mut components = vec![vec![Vec2::ZERO]; 4];
        let radii = vec![vec![5.0]; 4];
        pack_components(&mut components, &radii, 100.0, 1.0);
        assert!(components.iter().all(|c| c[0].y == components[0][0].y));
    }
}
