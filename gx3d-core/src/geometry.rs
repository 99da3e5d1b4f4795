/// Geometry primitives and shape tessellation
use nalgebra::{Point3, Vector3};
use std::f32::consts::{PI, TAU};

/// Triangles with less area than this are dropped during tessellation
const DEGENERATE_AREA: f32 = 1e-9;

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }

    pub fn from_parts(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    fn edge_cross(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;
        (v1 - v0).cross(&(v2 - v0))
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        self.edge_cross().normalize()
    }

    pub fn area(&self) -> f32 {
        self.edge_cross().norm() * 0.5
    }

    /// Average of the vertex normals, used for smooth shading
    pub fn shading_normal(&self) -> Vector3<f32> {
        let sum = self.vertices[0].normal + self.vertices[1].normal + self.vertices[2].normal;
        sum.try_normalize(1e-6)
            .unwrap_or_else(|| self.calculate_normal())
    }
}

/// Parametric description of a catalog shape.
///
/// Dimensions follow the usual scene-graph conventions: Y is up, planar
/// shapes lie in the XY plane facing +Z, solids are centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Plane {
        width: f32,
        height: f32,
    },
    Cone {
        radius: f32,
        height: f32,
        radial_segments: u32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
    },
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    TorusKnot {
        radius: f32,
        tube: f32,
        tubular_segments: u32,
        radial_segments: u32,
        p: u32,
        q: u32,
    },
    Circle {
        radius: f32,
        segments: u32,
    },
}

impl ShapeKind {
    /// Short lowercase name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Box { .. } => "box",
            ShapeKind::Sphere { .. } => "sphere",
            ShapeKind::Plane { .. } => "plane",
            ShapeKind::Cone { .. } => "cone",
            ShapeKind::Cylinder { .. } => "cylinder",
            ShapeKind::Torus { .. } => "torus",
            ShapeKind::TorusKnot { .. } => "torus-knot",
            ShapeKind::Circle { .. } => "circle",
        }
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Build a triangle list from an indexed vertex buffer, skipping
    /// degenerate faces (cone apexes, sphere poles).
    pub fn from_indexed(vertices: &[Vertex], faces: &[[usize; 3]]) -> Self {
        let mut mesh = Self::with_capacity(faces.len());
        for &[a, b, c] in faces {
            let triangle = Triangle::new(vertices[a], vertices[b], vertices[c]);
            if triangle.area() > DEGENERATE_AREA {
                mesh.add_triangle(triangle);
            }
        }
        mesh
    }

    /// Tessellate a parametric shape
    pub fn from_shape(kind: &ShapeKind) -> Self {
        match *kind {
            ShapeKind::Box {
                width,
                height,
                depth,
            } => Self::cuboid(width, height, depth),
            ShapeKind::Sphere {
                radius,
                width_segments,
                height_segments,
            } => Self::sphere(radius, width_segments, height_segments),
            ShapeKind::Plane { width, height } => Self::plane(width, height),
            ShapeKind::Cone {
                radius,
                height,
                radial_segments,
            } => Self::cylinder(0.0, radius, height, radial_segments),
            ShapeKind::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => Self::cylinder(radius_top, radius_bottom, height, radial_segments),
            ShapeKind::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => Self::torus(radius, tube, radial_segments, tubular_segments),
            ShapeKind::TorusKnot {
                radius,
                tube,
                tubular_segments,
                radial_segments,
                p,
                q,
            } => Self::torus_knot(radius, tube, tubular_segments, radial_segments, p, q),
            ShapeKind::Circle { radius, segments } => Self::circle(radius, segments),
        }
    }

    /// Create a simple cube mesh
    pub fn cube(size: f32) -> Self {
        Self::cuboid(size, size, size)
    }

    /// Axis-aligned box centred on the origin, two triangles per face
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
        // (normal, u, v) with u x v == normal so corners wind counter-clockwise
        let faces = [
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), -Vector3::x(), Vector3::y()),
            (Vector3::x(), -Vector3::z(), Vector3::y()),
            (-Vector3::x(), Vector3::z(), Vector3::y()),
            (Vector3::y(), Vector3::x(), -Vector3::z()),
            (-Vector3::y(), Vector3::x(), Vector3::z()),
        ];

        let mut mesh = Self::with_capacity(12);
        for (normal, u, v) in faces {
            let center = normal.component_mul(&half);
            let u = u.component_mul(&half);
            let v = v.component_mul(&half);
            let corner = |su: f32, sv: f32| {
                Vertex::from_parts(Point3::from(center + u * su + v * sv), normal)
            };
            let (c0, c1, c2, c3) = (
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
                corner(1.0, 1.0),
                corner(-1.0, 1.0),
            );
            mesh.add_triangle(Triangle::new(c0, c1, c2));
            mesh.add_triangle(Triangle::new(c0, c2, c3));
        }
        mesh
    }

    /// Flat rectangle in the XY plane facing +Z
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        let v0 = Vertex::new(-hw, -hh, 0.0, 0.0, 0.0, 1.0);
        let v1 = Vertex::new(hw, -hh, 0.0, 0.0, 0.0, 1.0);
        let v2 = Vertex::new(hw, hh, 0.0, 0.0, 0.0, 1.0);
        let v3 = Vertex::new(-hw, hh, 0.0, 0.0, 0.0, 1.0);

        let mut mesh = Self::with_capacity(2);
        mesh.add_triangle(Triangle::new(v0, v1, v2));
        mesh.add_triangle(Triangle::new(v0, v2, v3));
        mesh
    }

    /// Flat disc in the XY plane facing +Z
    pub fn circle(radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let center = Vertex::new(0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let rim = |s: u32| {
            let theta = s as f32 / segments as f32 * TAU;
            Vertex::new(radius * theta.cos(), radius * theta.sin(), 0.0, 0.0, 0.0, 1.0)
        };

        let mut mesh = Self::with_capacity(segments as usize);
        for s in 0..segments {
            mesh.add_triangle(Triangle::new(center, rim(s), rim(s + 1)));
        }
        mesh
    }

    /// UV sphere with poles on the Y axis
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let ws = width_segments.max(3) as usize;
        let hs = height_segments.max(2) as usize;

        let mut vertices = Vec::with_capacity((ws + 1) * (hs + 1));
        for iy in 0..=hs {
            let v = iy as f32 / hs as f32;
            for ix in 0..=ws {
                let u = ix as f32 / ws as f32;
                let normal = Vector3::new(
                    -(u * TAU).cos() * (v * PI).sin(),
                    (v * PI).cos(),
                    (u * TAU).sin() * (v * PI).sin(),
                );
                vertices.push(Vertex::from_parts(Point3::from(normal * radius), normal));
            }
        }

        let index = |ix: usize, iy: usize| iy * (ws + 1) + ix;
        let mut faces = Vec::with_capacity(ws * hs * 2);
        for iy in 0..hs {
            for ix in 0..ws {
                let a = index(ix + 1, iy);
                let b = index(ix, iy);
                let c = index(ix, iy + 1);
                let d = index(ix + 1, iy + 1);
                if iy != 0 {
                    faces.push([a, b, d]);
                }
                if iy != hs - 1 {
                    faces.push([b, c, d]);
                }
            }
        }
        Self::from_indexed(&vertices, &faces)
    }

    /// Capped cylinder along the Y axis; a zero top radius gives a cone
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Self {
        let segments = radial_segments.max(3) as usize;
        let half = height / 2.0;
        let slope = if height.abs() > f32::EPSILON {
            (radius_bottom - radius_top) / height
        } else {
            0.0
        };

        let mut vertices = Vec::with_capacity((segments + 1) * 2);
        for (row, radius) in [radius_top, radius_bottom].into_iter().enumerate() {
            let y = if row == 0 { half } else { -half };
            for x in 0..=segments {
                let theta = x as f32 / segments as f32 * TAU;
                let (sin, cos) = theta.sin_cos();
                let normal = Vector3::new(sin, slope, cos).normalize();
                vertices.push(Vertex::new(radius * sin, y, radius * cos, normal.x, normal.y, normal.z));
            }
        }

        let mut faces = Vec::with_capacity(segments * 2);
        for x in 0..segments {
            let a = x;
            let b = segments + 1 + x;
            let c = segments + 1 + x + 1;
            let d = x + 1;
            faces.push([a, b, d]);
            faces.push([b, c, d]);
        }
        let mut mesh = Self::from_indexed(&vertices, &faces);

        for (radius, y, up) in [(radius_top, half, 1.0), (radius_bottom, -half, -1.0)] {
            if radius <= 0.0 {
                continue;
            }
            let center = Vertex::new(0.0, y, 0.0, 0.0, up, 0.0);
            let rim = |x: usize| {
                let theta = x as f32 / segments as f32 * TAU;
                Vertex::new(radius * theta.sin(), y, radius * theta.cos(), 0.0, up, 0.0)
            };
            for x in 0..segments {
                let triangle = if up > 0.0 {
                    Triangle::new(center, rim(x), rim(x + 1))
                } else {
                    Triangle::new(center, rim(x + 1), rim(x))
                };
                mesh.add_triangle(triangle);
            }
        }
        mesh
    }

    /// Torus around the Z axis
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial = radial_segments.max(3) as usize;
        let tubular = tubular_segments.max(3) as usize;

        let mut vertices = Vec::with_capacity((radial + 1) * (tubular + 1));
        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * TAU;
                let position = Point3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let center = Point3::new(radius * u.cos(), radius * u.sin(), 0.0);
                let normal = (position - center).normalize();
                vertices.push(Vertex::from_parts(position, normal));
            }
        }

        let mut faces = Vec::with_capacity(radial * tubular * 2);
        for j in 1..=radial {
            for i in 1..=tubular {
                let a = (tubular + 1) * j + i - 1;
                let b = (tubular + 1) * (j - 1) + i - 1;
                let c = (tubular + 1) * (j - 1) + i;
                let d = (tubular + 1) * j + i;
                faces.push([a, b, d]);
                faces.push([b, c, d]);
            }
        }
        Self::from_indexed(&vertices, &faces)
    }

    /// (p, q) torus knot swept with a circular tube
    pub fn torus_knot(
        radius: f32,
        tube: f32,
        tubular_segments: u32,
        radial_segments: u32,
        p: u32,
        q: u32,
    ) -> Self {
        let tubular = tubular_segments.max(3) as usize;
        let radial = radial_segments.max(3) as usize;
        let (p, q) = (p.max(1) as f32, q as f32);

        let curve = |u: f32| {
            let q_over_p = q / p * u;
            let cs = q_over_p.cos();
            Vector3::new(
                radius * (2.0 + cs) * 0.5 * u.cos(),
                radius * (2.0 + cs) * 0.5 * u.sin(),
                radius * q_over_p.sin() * 0.5,
            )
        };

        let mut vertices = Vec::with_capacity((tubular + 1) * (radial + 1));
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * p * TAU;
            let p1 = curve(u);
            let p2 = curve(u + 0.01);
            let tangent = p2 - p1;
            let binormal = tangent.cross(&(p2 + p1));
            let normal = binormal.cross(&tangent).normalize();
            let binormal = binormal.normalize();

            for j in 0..=radial {
                let v = j as f32 / radial as f32 * TAU;
                let offset = normal * (-tube * v.cos()) + binormal * (tube * v.sin());
                let position = p1 + offset;
                vertices.push(Vertex::from_parts(
                    Point3::from(position),
                    offset.try_normalize(1e-6).unwrap_or(normal),
                ));
            }
        }

        let mut faces = Vec::with_capacity(tubular * radial * 2);
        for j in 1..=tubular {
            for i in 1..=radial {
                let a = (radial + 1) * (j - 1) + (i - 1);
                let b = (radial + 1) * j + (i - 1);
                let c = (radial + 1) * j + i;
                let d = (radial + 1) * (j - 1) + i;
                faces.push([a, b, d]);
                faces.push([b, c, d]);
            }
        }
        Self::from_indexed(&vertices, &faces)
    }

    /// Every triangle edge, for wireframe display
    pub fn edges(&self) -> impl Iterator<Item = (Point3<f32>, Point3<f32>)> + '_ {
        self.triangles.iter().flat_map(|t| {
            let [a, b, c] = t.vertices;
            [
                (a.position, b.position),
                (b.position, c.position),
                (c.position, a.position),
            ]
        })
    }

    /// Axis-aligned bounds as (min, max), or `None` for an empty mesh
    pub fn bounding_box(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let mut points = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| v.position));
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        }))
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_outward(mesh: &Mesh) {
        for triangle in &mesh.triangles {
            let centroid = (triangle.vertices[0].position.coords
                + triangle.vertices[1].position.coords
                + triangle.vertices[2].position.coords)
                / 3.0;
            assert!(triangle.calculate_normal().dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn test_cube_faces() {
        let mesh = Mesh::cube(2.0);
        assert_eq!(mesh.triangles.len(), 12);
        assert_outward(&mesh);

        let (min, max) = mesh.bounding_box().unwrap();
        assert_relative_eq!(min, Point3::new(-1.0, -1.0, -1.0));
        assert_relative_eq!(max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_cuboid_extents() {
        let mesh = Mesh::cuboid(1.0, 2.0, 3.0);
        let (min, max) = mesh.bounding_box().unwrap();
        assert_relative_eq!(max - min, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_sphere_drops_pole_triangles() {
        let mesh = Mesh::sphere(1.0, 8, 4);
        // Two rows of quads plus one cap row at each pole
        assert_eq!(mesh.triangles.len(), 8 * 2 * 2 + 8 * 2);
        for triangle in &mesh.triangles {
            for vertex in &triangle.vertices {
                assert_relative_eq!(vertex.position.coords.norm(), 1.0, epsilon = 1e-5);
            }
        }
        assert_outward(&mesh);
    }

    #[test]
    fn test_cone_has_single_cap() {
        let cone = Mesh::from_shape(&ShapeKind::Cone {
            radius: 1.0,
            height: 2.0,
            radial_segments: 16,
        });
        // Side collapses to one triangle per segment, plus the bottom cap
        assert_eq!(cone.triangles.len(), 16 + 16);

        let cylinder = Mesh::cylinder(1.0, 1.0, 2.0, 16);
        assert_eq!(cylinder.triangles.len(), 16 * 2 + 16 * 2);
        assert_outward(&cylinder);
    }

    #[test]
    fn test_flat_shapes_face_forward() {
        for mesh in [Mesh::plane(2.0, 2.0), Mesh::circle(1.0, 32)] {
            for triangle in &mesh.triangles {
                assert_relative_eq!(triangle.calculate_normal(), Vector3::z(), epsilon = 1e-6);
            }
        }
        assert_eq!(Mesh::circle(1.0, 32).triangles.len(), 32);
    }

    #[test]
    fn test_torus_surface_distance() {
        let mesh = Mesh::torus(1.0, 0.3, 8, 24);
        assert_eq!(mesh.triangles.len(), 8 * 24 * 2);
        for triangle in &mesh.triangles {
            let p = triangle.vertices[0].position;
            let ring = (p.x * p.x + p.y * p.y).sqrt() - 1.0;
            assert_relative_eq!((ring * ring + p.z * p.z).sqrt(), 0.3, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_torus_knot_is_closed_tube() {
        let mesh = Mesh::torus_knot(1.0, 0.3, 64, 8, 2, 3);
        assert_eq!(mesh.triangles.len(), 64 * 8 * 2);
        assert!(mesh
            .triangles
            .iter()
            .all(|t| t.vertices.iter().all(|v| v.normal.norm().is_finite())));
    }

    #[test]
    fn test_edges_cover_every_triangle() {
        let mesh = Mesh::plane(1.0, 1.0);
        assert_eq!(mesh.edges().count(), 6);
        assert!(Mesh::new().bounding_box().is_none());
    }
}
