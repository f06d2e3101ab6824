use crate::math::{Vector3, MACHINE_EPSILON};

/// Maximum number of iterations of the GJK loop
const MAX_ITERATIONS: usize = 64;

/// Relative convergence tolerance (squared) on the distance
const REL_ERROR_SQUARE: f32 = 1.0e-6;

/// A vertex of the Minkowski difference `A - B` with the two support points it comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportVertex {
    /// Support point on shape A, world space
    pub a: Vector3,
    /// Support point on shape B, world space
    pub b: Vector3,
    /// `a - b`
    pub w: Vector3,
}

impl SupportVertex {
    #[inline]
    pub fn new(a: Vector3, b: Vector3) -> Self {
        Self { a, b, w: a - b }
    }
}

/// Simplex of up to four support vertices, with the barycentric weights of
/// the point closest to the origin.
#[derive(Debug, Clone, Default)]
pub struct Simplex {
    vertices: Vec<SupportVertex>,
    weights: Vec<f32>,
}

impl Simplex {
    pub fn new() -> Self {
        Self {
            vertices: Vec::with_capacity(4),
            weights: Vec::with_capacity(4),
        }
    }

    pub fn vertices(&self) -> &[SupportVertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn push(&mut self, vertex: SupportVertex) {
        debug_assert!(self.vertices.len() < 4);
        self.vertices.push(vertex);
    }

    /// Returns true if `w` is already a vertex (up to rounding)
    fn contains_point(&self, w: Vector3) -> bool {
        self.vertices
            .iter()
            .any(|v| (v.w - w).length_squared() <= MACHINE_EPSILON * v.w.length_squared().max(1.0))
    }

    fn max_length_squared(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| v.w.length_squared())
            .fold(0.0, f32::max)
    }

    /// Closest points on A and B for the current weights
    pub fn closest_points(&self) -> (Vector3, Vector3) {
        self.vertices.iter().zip(&self.weights).fold(
            (Vector3::zero(), Vector3::zero()),
            |(pa, pb), (vertex, weight)| (pa + vertex.a * *weight, pb + vertex.b * *weight),
        )
    }

    /// Moves the simplex to the smallest sub-simplex that holds the point
    /// closest to the origin and returns that point.
    ///
    /// Returns None when the simplex is a tetrahedron enclosing the origin.
    fn reduce(&mut self) -> Option<Vector3> {
        let points: Vec<Vector3> = self.vertices.iter().map(|v| v.w).collect();
        let (keep, weights) = match points.len() {
            1 => (vec![0], vec![1.0]),
            2 => closest_on_segment(points[0], points[1], [0, 1]),
            3 => closest_on_triangle(points[0], points[1], points[2], [0, 1, 2]),
            _ => closest_on_tetrahedron(&points)?,
        };

        let vertices: Vec<SupportVertex> = keep.iter().map(|&i| self.vertices[i]).collect();
        let closest = vertices
            .iter()
            .zip(&weights)
            .fold(Vector3::zero(), |sum, (v, weight)| sum + v.w * *weight);
        self.vertices = vertices;
        self.weights = weights;
        Some(closest)
    }
}

type SubSimplex = (Vec<usize>, Vec<f32>);

fn closest_on_segment(a: Vector3, b: Vector3, ids: [usize; 2]) -> SubSimplex {
    let ab = b - a;
    let length_squared = ab.length_squared();
    if length_squared <= MACHINE_EPSILON * MACHINE_EPSILON {
        return (vec![ids[0]], vec![1.0]);
    }
    let t = -a.dot(&ab) / length_squared;
    if t <= 0.0 {
        (vec![ids[0]], vec![1.0])
    } else if t >= 1.0 {
        (vec![ids[1]], vec![1.0])
    } else {
        (vec![ids[0], ids[1]], vec![1.0 - t, t])
    }
}

/// Voronoi-region walk of the closest point to the origin on triangle abc
fn closest_on_triangle(a: Vector3, b: Vector3, c: Vector3, ids: [usize; 3]) -> SubSimplex {
    let ab = b - a;
    let ac = c - a;

    let d1 = ab.dot(&-a);
    let d2 = ac.dot(&-a);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (vec![ids[0]], vec![1.0]);
    }

    let d3 = ab.dot(&-b);
    let d4 = ac.dot(&-b);
    if d3 >= 0.0 && d4 <= d3 {
        return (vec![ids[1]], vec![1.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (vec![ids[0], ids[1]], vec![1.0 - v, v]);
    }

    let d5 = ab.dot(&-c);
    let d6 = ac.dot(&-c);
    if d6 >= 0.0 && d5 <= d6 {
        return (vec![ids[2]], vec![1.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (vec![ids[0], ids[2]], vec![1.0 - w, w]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (vec![ids[1], ids[2]], vec![1.0 - w, w]);
    }

    let sum = va + vb + vc;
    if sum.abs() <= MACHINE_EPSILON {
        // Degenerate triangle: best of its edges
        return [
            closest_on_segment(a, b, [ids[0], ids[1]]),
            closest_on_segment(a, c, [ids[0], ids[2]]),
            closest_on_segment(b, c, [ids[1], ids[2]]),
        ]
        .into_iter()
        .min_by(|x, y| {
            let px = weighted_point(&[a, b, c], &ids, x);
            let py = weighted_point(&[a, b, c], &ids, y);
            px.length_squared().total_cmp(&py.length_squared())
        })
        .unwrap_or_else(|| (vec![ids[0]], vec![1.0]));
    }

    let v = vb / sum;
    let w = vc / sum;
    (vec![ids[0], ids[1], ids[2]], vec![1.0 - v - w, v, w])
}

/// Evaluates a sub-simplex result against the local points it was computed from
fn weighted_point(points: &[Vector3], ids: &[usize], sub: &SubSimplex) -> Vector3 {
    sub.0.iter().zip(&sub.1).fold(Vector3::zero(), |sum, (id, weight)| {
        let local = ids.iter().position(|i| i == id).unwrap_or(0);
        sum + points[local] * *weight
    })
}

/// Closest point on a tetrahedron, or None if it encloses the origin
fn closest_on_tetrahedron(points: &[Vector3]) -> Option<SubSimplex> {
    const FACES: [([usize; 3], usize); 4] = [
        ([0, 1, 2], 3),
        ([0, 2, 3], 1),
        ([0, 3, 1], 2),
        ([1, 3, 2], 0),
    ];

    let mut best: Option<(f32, SubSimplex)> = None;
    for (face, opposite) in FACES {
        let [i, j, k] = face;
        let (a, b, c) = (points[i], points[j], points[k]);
        let normal = (b - a).cross(&(c - a));
        let sign_origin = (-a).dot(&normal);
        let sign_opposite = (points[opposite] - a).dot(&normal);

        // Flat tetrahedra test every face
        let degenerate = sign_opposite.abs() <= MACHINE_EPSILON * normal.length().max(1.0);
        if !degenerate && sign_origin * sign_opposite >= 0.0 {
            continue;
        }

        let sub = closest_on_triangle(a, b, c, face);
        let distance = weighted_point(&[a, b, c], &face, &sub).length_squared();
        if best.as_ref().map_or(true, |(d, _)| distance < *d) {
            best = Some((distance, sub));
        }
    }
    best.map(|(_, sub)| sub)
}

/// Outcome of a GJK distance query
#[derive(Debug, Clone)]
pub enum GjkResult {
    /// The shapes are further apart than the margin; `axis` separates them
    Separated { axis: Vector3 },

    /// The shapes do not overlap; closest points on each of them
    Closest {
        point_a: Vector3,
        point_b: Vector3,
        distance: f32,
    },

    /// The shapes overlap; the final simplex encloses (or touches) the origin
    Overlapping { simplex: Simplex },
}

/// Gilbert-Johnson-Keerthi distance algorithm over a support mapping of `A - B`
pub struct Gjk;

impl Gjk {
    /// Runs GJK on the Minkowski difference described by `support`.
    ///
    /// `support(d)` must return the vertex of `A - B` furthest along `d`.
    /// The query stops early with [`GjkResult::Separated`] as soon as the
    /// shapes are proven to be more than `margin` apart. `initial_axis` seeds
    /// the search direction, typically the axis cached from the previous step.
    pub fn compute<F>(support: F, margin: f32, initial_axis: Vector3) -> GjkResult
    where
        F: Fn(Vector3) -> SupportVertex,
    {
        let margin_squared = margin * margin;
        let mut v = if initial_axis.is_zero() { Vector3::unit_y() } else { initial_axis };
        let mut simplex = Simplex::new();
        let mut distance_squared = f32::MAX;

        for _ in 0..MAX_ITERATIONS {
            let vertex = support(-v);
            let v_dot_w = v.dot(&vertex.w);

            if v_dot_w > 0.0 && v_dot_w * v_dot_w > v.length_squared() * margin_squared {
                return GjkResult::Separated { axis: v };
            }

            if !simplex.is_empty()
                && (simplex.contains_point(vertex.w)
                    || distance_squared - v_dot_w <= distance_squared * REL_ERROR_SQUARE)
            {
                break;
            }

            simplex.push(vertex);
            let closest = match simplex.reduce() {
                Some(point) => point,
                None => return GjkResult::Overlapping { simplex },
            };

            let new_distance_squared = closest.length_squared();
            if new_distance_squared <= MACHINE_EPSILON * simplex.max_length_squared() {
                return GjkResult::Overlapping { simplex };
            }

            let progress = distance_squared - new_distance_squared;
            v = closest;
            distance_squared = new_distance_squared;
            if progress <= MACHINE_EPSILON * distance_squared {
                break;
            }
        }

        if simplex.is_empty() {
            // Only possible if the loop never ran a full iteration
            return GjkResult::Separated { axis: v };
        }

        let (point_a, point_b) = simplex.closest_points();
        GjkResult::Closest {
            point_a,
            point_b,
            distance: distance_squared.sqrt(),
        }
    }
}
