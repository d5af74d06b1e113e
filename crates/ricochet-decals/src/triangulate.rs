//! Polygon triangulation for clipped fragments.

use glam::Vec2;

/// Turns a simple polygon into a flat triangle index list referring back to
/// the polygon's own points.
pub trait Triangulator {
    fn triangulate(&self, polygon: &[Vec2]) -> Vec<u32>;
}

/// Ear clipping that keeps the winding of the input polygon.
///
/// Fragments are convex or very nearly so, so an ear is almost always found on
/// the first sweep. When rounding leaves no valid ear the remainder is fanned.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarClipTriangulator;

const AREA_EPSILON: f32 = 1e-12;

impl Triangulator for EarClipTriangulator {
    fn triangulate(&self, polygon: &[Vec2]) -> Vec<u32> {
        let count = polygon.len();
        if count < 3 {
            return Vec::new();
        }

        let mut indices = Vec::with_capacity((count - 2) * 3);
        let area = signed_area(polygon);
        let mut remaining: Vec<usize> = (0..count).collect();

        if area.abs() <= AREA_EPSILON {
            fan(&remaining, &mut indices);
            return indices;
        }
        let orientation = area.signum();

        while remaining.len() > 3 {
            let len = remaining.len();
            let ear = (0..len).find(|&i| {
                let prev = remaining[(i + len - 1) % len];
                let next = remaining[(i + 1) % len];
                is_ear(polygon, &remaining, prev, remaining[i], next, orientation)
            });

            let Some(i) = ear else {
                fan(&remaining, &mut indices);
                return indices;
            };

            let prev = remaining[(i + len - 1) % len];
            let next = remaining[(i + 1) % len];
            indices.extend([prev as u32, remaining[i] as u32, next as u32]);
            remaining.remove(i);
        }

        indices.extend(remaining.iter().map(|&i| i as u32));
        indices
    }
}

fn fan(remaining: &[usize], indices: &mut Vec<u32>) {
    for pair in remaining[1..].windows(2) {
        indices.extend([remaining[0] as u32, pair[0] as u32, pair[1] as u32]);
    }
}

/// Twice the signed area; positive for counter-clockwise polygons.
fn signed_area(polygon: &[Vec2]) -> f32 {
    let mut area = 0.0;
    let mut prev = polygon[polygon.len() - 1];
    for &point in polygon {
        area += prev.perp_dot(point);
        prev = point;
    }
    area
}

fn is_ear(
    polygon: &[Vec2],
    remaining: &[usize],
    prev: usize,
    cur: usize,
    next: usize,
    orientation: f32,
) -> bool {
    let (a, b, c) = (polygon[prev], polygon[cur], polygon[next]);
    if (b - a).perp_dot(c - b) * orientation <= AREA_EPSILON {
        return false;
    }

    remaining
        .iter()
        .filter(|&&i| i != prev && i != cur && i != next)
        .all(|&i| !strictly_inside(polygon[i], a, b, c, orientation))
}

fn strictly_inside(p: Vec2, a: Vec2, b: Vec2, c: Vec2, orientation: f32) -> bool {
    let ab = (b - a).perp_dot(p - a) * orientation;
    let bc = (c - b).perp_dot(p - b) * orientation;
    let ca = (a - c).perp_dot(p - c) * orientation;
    ab > 0.0 && bc > 0.0 && ca > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_of(polygon: &[Vec2], indices: &[u32]) -> f32 {
        indices
            .chunks_exact(3)
            .map(|t| {
                let (a, b, c) = (
                    polygon[t[0] as usize],
                    polygon[t[1] as usize],
                    polygon[t[2] as usize],
                );
                (b - a).perp_dot(c - a)
            })
            .sum()
    }

    #[test]
    fn too_few_points_yield_nothing() {
        let tri = EarClipTriangulator;
        assert!(tri.triangulate(&[]).is_empty());
        assert!(tri.triangulate(&[Vec2::ZERO, Vec2::X]).is_empty());
    }

    #[test]
    fn triangle_is_returned_as_is() {
        let polygon = [Vec2::ZERO, Vec2::X, Vec2::Y];
        assert_eq!(EarClipTriangulator.triangulate(&polygon), vec![0, 1, 2]);
    }

    #[test]
    fn winding_is_preserved_both_ways() {
        let ccw = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.5, 0.8),
            Vec2::new(0.5, 1.4),
            Vec2::new(-0.4, 0.7),
        ];
        let indices = EarClipTriangulator.triangulate(&ccw);
        assert_eq!(indices.len(), 9);
        for t in indices.chunks_exact(3) {
            let (a, b, c) = (ccw[t[0] as usize], ccw[t[1] as usize], ccw[t[2] as usize]);
            assert!((b - a).perp_dot(c - a) > 0.0);
        }
        assert!((area_of(&ccw, &indices) - signed_area(&ccw)).abs() < 1e-5);

        let mut cw = ccw;
        cw.reverse();
        let indices = EarClipTriangulator.triangulate(&cw);
        for t in indices.chunks_exact(3) {
            let (a, b, c) = (cw[t[0] as usize], cw[t[1] as usize], cw[t[2] as usize]);
            assert!((b - a).perp_dot(c - a) < 0.0);
        }
    }

    #[test]
    fn concave_polygon_covers_its_area() {
        // Arrow head with a reflex vertex at index 3.
        let polygon = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(1.0, 0.8),
            Vec2::new(0.0, 2.0),
        ];
        let indices = EarClipTriangulator.triangulate(&polygon);
        assert_eq!(indices.len(), 9);
        assert!((area_of(&polygon, &indices) - signed_area(&polygon)).abs() < 1e-5);
    }

    #[test]
    fn collinear_input_terminates() {
        let polygon = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(3.0, 0.0),
        ];
        let indices = EarClipTriangulator.triangulate(&polygon);
        assert_eq!(indices.len(), 6);
    }
}
