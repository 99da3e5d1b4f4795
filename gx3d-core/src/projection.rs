/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

/// Size of a render surface in backend units (pixels or terminal cells)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Replace any zero dimension with the one from `last_good`
    pub fn or_last_good(self, last_good: Viewport) -> Viewport {
        Viewport {
            width: if self.width == 0 { last_good.width } else { self.width },
            height: if self.height == 0 { last_good.height } else { self.height },
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: Viewport::new(width, height).aspect(),
            near: 0.1,
            far: 100.0,
        }
    }

    /// Perspective camera with a vertical field of view in degrees
    pub fn perspective(fov_degrees: f32, viewport: Viewport, near: f32, far: f32) -> Self {
        Self {
            fov: fov_degrees.to_radians(),
            aspect: viewport.aspect(),
            near,
            far,
            ..Self::new(viewport.width, viewport.height)
        }
    }

    /// Move the camera and point it at `target`
    pub fn look_at(mut self, position: Point3<f32>, target: Point3<f32>) -> Self {
        self.position = position;
        self.target = target;
        self
    }

    /// Recompute the aspect ratio for a new surface size; empty sizes are ignored
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if !viewport.is_empty() {
            self.aspect = viewport.aspect();
        }
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the perspective projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Combined projection * view matrix
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert_relative_eq!(camera.aspect, 800.0 / 600.0);
    }

    #[test]
    fn test_empty_viewport_keeps_aspect() {
        let mut camera = Camera::perspective(75.0, Viewport::new(400, 200), 0.1, 1000.0);
        camera.set_viewport(Viewport::new(0, 0));
        assert_relative_eq!(camera.aspect, 2.0);
        camera.set_viewport(Viewport::new(800, 600));
        assert_relative_eq!(camera.aspect, 800.0 / 600.0);
    }

    #[test]
    fn test_or_last_good() {
        let last = Viewport::new(640, 480);
        assert_eq!(Viewport::new(0, 0).or_last_good(last), last);
        assert_eq!(Viewport::new(100, 0).or_last_good(last), Viewport::new(100, 480));
        assert!(Viewport::new(0, 5).is_empty());
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = Camera::perspective(75.0, Viewport::new(800, 600), 0.1, 1000.0)
            .look_at(Point3::new(3.0, 2.0, 4.0), Point3::origin());
        let clip = camera.view_projection() * Point3::origin().to_homogeneous();
        assert!(clip.w > 0.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
        let depth = clip.z / clip.w;
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_point_behind_camera_has_negative_w() {
        let camera = Camera::default();
        let behind = Point3::new(0.0, 0.0, 10.0);
        let clip = camera.view_projection() * behind.to_homogeneous();
        assert!(clip.w < 0.0);
    }
}
