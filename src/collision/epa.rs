use crate::math::{Vector3, Quaternion, MACHINE_EPSILON};
use crate::collision::gjk::{Simplex, SupportVertex};

/// Maximum number of polytope expansions
const MAX_ITERATIONS: usize = 64;

/// Absolute tolerance on the depth improvement that ends the expansion
const TOLERANCE: f32 = 1.0e-4;

/// Penetration found by EPA. The normal points from A to B.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    pub normal: Vector3,
    pub depth: f32,
    /// Deepest point of A inside B, world space
    pub point_a: Vector3,
    /// Deepest point of B inside A, world space
    pub point_b: Vector3,
}

#[derive(Debug, Clone, Copy)]
struct Face {
    indices: [usize; 3],
    normal: Vector3,
    distance: f32,
}

/// Expanding Polytope Algorithm on the Minkowski difference `A - B`
pub struct Epa;

impl Epa {
    /// Computes the penetration of two overlapping shapes.
    ///
    /// `simplex` must enclose or touch the origin (the overlapping output of
    /// GJK run on the same support mapping). Lower-dimensional simplices are
    /// first blown up to a tetrahedron. Returns None when no valid polytope
    /// can be built around the origin.
    pub fn compute<F>(simplex: &Simplex, support: F) -> Option<Penetration>
    where
        F: Fn(Vector3) -> SupportVertex,
    {
        let mut vertices: Vec<SupportVertex> = simplex.vertices().to_vec();
        Self::blow_up(&mut vertices, &support)?;
        if !Self::tetrahedron_contains_origin(&vertices) {
            return None;
        }

        let centroid = vertices.iter().fold(Vector3::zero(), |sum, v| sum + v.w) * 0.25;
        let mut faces = Vec::with_capacity(32);
        for indices in [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]] {
            faces.push(Self::make_face(&vertices, indices, centroid)?);
        }

        let mut closest = Self::closest_face(&faces)?;
        for _ in 0..MAX_ITERATIONS {
            let face = faces[closest];
            let vertex = support(face.normal);
            let support_distance = vertex.w.dot(&face.normal);
            if support_distance - face.distance <= TOLERANCE {
                break;
            }

            let new_index = vertices.len();
            vertices.push(vertex);

            // Remove faces visible from the new vertex and collect the horizon
            let mut horizon: Vec<(usize, usize)> = Vec::new();
            let mut i = 0;
            while i < faces.len() {
                let f = faces[i];
                if f.normal.dot(&(vertex.w - vertices[f.indices[0]].w)) > MACHINE_EPSILON {
                    for (a, b) in [
                        (f.indices[0], f.indices[1]),
                        (f.indices[1], f.indices[2]),
                        (f.indices[2], f.indices[0]),
                    ] {
                        // An edge seen from both sides is interior to the hole
                        if let Some(position) = horizon.iter().position(|&e| e == (b, a)) {
                            horizon.remove(position);
                        } else {
                            horizon.push((a, b));
                        }
                    }
                    faces.remove(i);
                } else {
                    i += 1;
                }
            }

            if horizon.is_empty() {
                vertices.pop();
                break;
            }

            for (a, b) in horizon {
                if let Some(new_face) = Self::make_face(&vertices, [a, b, new_index], centroid) {
                    faces.push(new_face);
                }
            }

            closest = match Self::closest_face(&faces) {
                Some(index) => index,
                None => return None,
            };
        }

        let face = faces[closest];
        let [i, j, k] = face.indices;
        let projection = face.normal * face.distance;
        let weights = barycentric(projection, vertices[i].w, vertices[j].w, vertices[k].w);
        let point_a = vertices[i].a * weights[0] + vertices[j].a * weights[1] + vertices[k].a * weights[2];
        let point_b = vertices[i].b * weights[0] + vertices[j].b * weights[1] + vertices[k].b * weights[2];

        Some(Penetration {
            normal: face.normal,
            depth: face.distance.max(0.0),
            point_a,
            point_b,
        })
    }

    /// Grows a point, segment or triangle into a tetrahedron
    fn blow_up<F>(vertices: &mut Vec<SupportVertex>, support: &F) -> Option<()>
    where
        F: Fn(Vector3) -> SupportVertex,
    {
        let axes = [
            Vector3::unit_x(),
            -Vector3::unit_x(),
            Vector3::unit_y(),
            -Vector3::unit_y(),
            Vector3::unit_z(),
            -Vector3::unit_z(),
        ];

        if vertices.len() == 1 {
            let first = vertices[0].w;
            let next = axes
                .iter()
                .map(|axis| support(*axis))
                .find(|v| (v.w - first).length_squared() > MACHINE_EPSILON)?;
            vertices.push(next);
        }

        if vertices.len() == 2 {
            let (a, b) = (vertices[0].w, vertices[1].w);
            let line = (b - a).normalize();
            let start = line.one_unit_orthogonal_vector();
            let step = Quaternion::from_axis_angle(line, std::f32::consts::FRAC_PI_3);
            let mut direction = start;
            let mut found = None;
            for _ in 0..6 {
                let candidate = support(direction);
                let offset = candidate.w - a;
                let off_line = offset - line * offset.dot(&line);
                if off_line.length_squared() > MACHINE_EPSILON {
                    found = Some(candidate);
                    break;
                }
                direction = step.rotate(direction);
            }
            vertices.push(found?);
        }

        if vertices.len() == 3 {
            let (a, b, c) = (vertices[0].w, vertices[1].w, vertices[2].w);
            let normal = (b - a).cross(&(c - a));
            if normal.is_zero() {
                return None;
            }
            let above = support(normal);
            let below = support(-normal);

            let mut with_above = vertices.clone();
            with_above.push(above);
            if Self::tetrahedron_contains_origin(&with_above) && !Self::is_flat(&with_above) {
                *vertices = with_above;
            } else {
                vertices.push(below);
            }
        }

        if vertices.len() == 4 && !Self::is_flat(vertices) {
            Some(())
        } else {
            None
        }
    }

    fn is_flat(vertices: &[SupportVertex]) -> bool {
        let (a, b, c, d) = (vertices[0].w, vertices[1].w, vertices[2].w, vertices[3].w);
        let volume = (b - a).cross(&(c - a)).dot(&(d - a));
        volume.abs() <= MACHINE_EPSILON
    }

    /// True if the origin is inside the tetrahedron or on its boundary
    fn tetrahedron_contains_origin(vertices: &[SupportVertex]) -> bool {
        const FACES: [([usize; 3], usize); 4] = [
            ([0, 1, 2], 3),
            ([0, 2, 3], 1),
            ([0, 3, 1], 2),
            ([1, 3, 2], 0),
        ];
        FACES.iter().all(|&([i, j, k], opposite)| {
            let a = vertices[i].w;
            let normal = (vertices[j].w - a).cross(&(vertices[k].w - a));
            let sign_origin = (-a).dot(&normal);
            let sign_opposite = (vertices[opposite].w - a).dot(&normal);
            sign_origin * sign_opposite >= -MACHINE_EPSILON
        })
    }

    /// Builds a face whose normal points away from the interior point `centroid`
    fn make_face(vertices: &[SupportVertex], indices: [usize; 3], centroid: Vector3) -> Option<Face> {
        let [i, j, k] = indices;
        let (a, b, c) = (vertices[i].w, vertices[j].w, vertices[k].w);
        let mut normal = (b - a).cross(&(c - a));
        let length = normal.length();
        if length <= MACHINE_EPSILON {
            return None;
        }
        normal /= length;
        let mut indices = indices;
        if normal.dot(&(a - centroid)) < 0.0 {
            normal = -normal;
            indices.swap(1, 2);
        }
        Some(Face {
            indices,
            normal,
            distance: normal.dot(&a),
        })
    }

    /// Index of the face nearest to the origin; the first one wins ties
    fn closest_face(faces: &[Face]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (index, face) in faces.iter().enumerate() {
            if best.map_or(true, |b| face.distance < faces[b].distance) {
                best = Some(index);
            }
        }
        best
    }
}

/// Barycentric coordinates of `p` in triangle `abc`
fn barycentric(p: Vector3, a: Vector3, b: Vector3, c: Vector3) -> [f32; 3] {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);
    let denominator = d00 * d11 - d01 * d01;
    if denominator.abs() <= MACHINE_EPSILON {
        return [1.0, 0.0, 0.0];
    }
    let v = (d11 * d20 - d01 * d21) / denominator;
    let w = (d00 * d21 - d01 * d20) / denominator;
    [1.0 - v - w, v, w]
}
