/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use gx3d_core::{Mesh, Rgb, Triangle};
use nalgebra::{Matrix4, Point3, Vector3, Vector4};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Smallest clip-space w treated as in front of the camera
const NEAR_W: f32 = 1e-3;

/// Lines win depth ties against the faces they lie on
const LINE_DEPTH_BIAS: f32 = 1e-4;

/// Light contributions gathered from the scene
#[derive(Debug, Clone, Default)]
pub struct Shading {
    pub ambient: f32,
    /// Unit vectors towards each light, with their intensity
    pub directional: Vec<(Vector3<f32>, f32)>,
}

impl Shading {
    /// Brightness of a surface with the given world-space normal
    pub fn brightness(&self, normal: &Vector3<f32>) -> f32 {
        self.directional
            .iter()
            .fold(self.ambient, |acc, (dir, intensity)| {
                acc + intensity * normal.dot(dir).max(0.0)
            })
    }
}

/// How a mesh surface is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceStyle {
    pub color: Rgb,
    pub wireframe: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    color: Rgb,
}

const EMPTY: Cell = Cell {
    ch: ' ',
    color: Rgb::BLACK,
};

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    background: Rgb,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            background: Rgb::BLACK,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![EMPTY; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; width * height];
        self.cells = vec![EMPTY; width * height];
    }

    pub fn clear(&mut self, background: Rgb) {
        self.background = background;
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(EMPTY);
    }

    /// Character and color at a cell, `None` if blank or out of range
    pub fn cell(&self, x: usize, y: usize) -> Option<(char, Rgb)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let cell = self.cells[y * self.width + x];
        (cell.ch != ' ').then_some((cell.ch, cell.color))
    }

    /// Number of cells something was drawn into
    pub fn coverage(&self) -> usize {
        self.cells.iter().filter(|c| c.ch != ' ').count()
    }

    pub fn render_mesh(
        &mut self,
        mesh: &Mesh,
        model: &Matrix4<f32>,
        view_projection: &Matrix4<f32>,
        shading: &Shading,
        style: SurfaceStyle,
    ) {
        let mvp = view_projection * model;
        if style.wireframe {
            for (a, b) in mesh.edges() {
                self.draw_segment(&mvp, &a, &b, style.color);
            }
            return;
        }
        for triangle in &mesh.triangles {
            self.render_triangle(triangle, model, &mvp, shading, style.color);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model: &Matrix4<f32>,
        mvp: &Matrix4<f32>,
        shading: &Shading,
        color: Rgb,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match self.project(mvp * vertex.position.to_homogeneous()) {
                Some(coords) => *slot = coords,
                None => return, // Triangle crosses the near plane
            }
        }

        let normal = model
            .transform_vector(&triangle.shading_normal())
            .try_normalize(1e-6)
            .unwrap_or_else(Vector3::z);
        let brightness = shading.brightness(&normal).clamp(0.0, 1.0);

        // Map brightness to character, never fully blank so faces stay visible
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
        let cell = Cell {
            ch: LUMINOSITY_RAMP[char_index],
            color: color.scaled(0.25 + 0.75 * brightness),
        };

        self.rasterize_triangle(&screen_coords, cell);
    }

    fn project(&self, clip: Vector4<f32>) -> Option<(f32, f32, f32)> {
        if clip.w < NEAR_W {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some((
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
            ndc.z,
        ))
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], cell: Cell) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box clipped to screen bounds
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i64).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i64).min(self.width as i64 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i64).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i64).min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                        self.plot(x as usize, y as usize, depth, cell);
                    }
                }
            }
        }
    }

    /// Draw a world-space line segment
    pub fn draw_segment(
        &mut self,
        mvp: &Matrix4<f32>,
        a: &Point3<f32>,
        b: &Point3<f32>,
        color: Rgb,
    ) {
        let (mut ca, mut cb) = (mvp * a.to_homogeneous(), mvp * b.to_homogeneous());

        // Clip against the near plane in homogeneous space
        match (ca.w >= NEAR_W, cb.w >= NEAR_W) {
            (false, false) => return,
            (true, false) => cb = ca + (cb - ca) * ((ca.w - NEAR_W) / (ca.w - cb.w)),
            (false, true) => ca = cb + (ca - cb) * ((cb.w - NEAR_W) / (cb.w - ca.w)),
            (true, true) => {}
        }

        let (Some(p0), Some(p1)) = (self.project(ca), self.project(cb)) else {
            return;
        };

        let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
        let cell = Cell {
            ch: slope_char(dx, dy),
            color,
        };

        let Some((t0, t1)) = clip_to_rect((p0.0, p0.1), (dx, dy), self.width as f32, self.height as f32)
        else {
            return;
        };

        let span = (t1 - t0) * dx.abs().max(dy.abs());
        let steps = span.ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = t0 + (t1 - t0) * i as f32 / steps as f32;
            let x = (p0.0 + dx * t).max(0.0) as usize;
            let y = (p0.1 + dy * t).max(0.0) as usize;
            if x < self.width && y < self.height {
                let depth = p0.2 + (p1.2 - p0.2) * t - LINE_DEPTH_BIAS;
                self.plot(x, y, depth, cell);
            }
        }
    }

    fn plot(&mut self, x: usize, y: usize, depth: f32, cell: Cell) {
        let idx = y * self.width + x;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.cells[idx] = cell;
        }
    }

    /// Write the frame with its top-left corner at terminal cell (`column`, `row`)
    pub fn draw<W: Write>(&self, writer: &mut W, column: u16, row: u16) -> std::io::Result<()> {
        writer.queue(SetBackgroundColor(to_color(self.background)))?;
        for y in 0..self.height {
            writer.queue(MoveTo(column, row + y as u16))?;
            let mut current = None;
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                if current != Some(cell.color) {
                    writer.queue(SetForegroundColor(to_color(cell.color)))?;
                    current = Some(cell.color);
                }
                writer.queue(Print(cell.ch))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

pub(crate) fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

/// Liang-Barsky clip of `origin + t * delta` (t in 0..=1) against the
/// rectangle `[0, width] x [0, height]`; returns the visible t range.
fn clip_to_rect(origin: (f32, f32), delta: (f32, f32), width: f32, height: f32) -> Option<(f32, f32)> {
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    let edges = [
        (-delta.0, origin.0),
        (delta.0, width - origin.0),
        (-delta.1, origin.1),
        (delta.1, height - origin.1),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Pick a line glyph matching the on-screen direction
fn slope_char(dx: f32, dy: f32) -> char {
    let (ax, ay) = (dx.abs(), dy.abs());
    if ay * 2.0 < ax {
        '-'
    } else if ax * 2.0 < ay {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '\\'
    } else {
        '/'
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gx3d_core::{Camera, Viewport};

    fn front_camera() -> Matrix4<f32> {
        Camera::perspective(60.0, Viewport::new(40, 20), 0.1, 100.0).view_projection()
    }

    fn lit() -> Shading {
        Shading {
            ambient: 0.3,
            directional: vec![(Vector3::z(), 0.7)],
        }
    }

    #[test]
    fn test_solid_plane_fills_center() {
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.clear(Rgb::BLACK);
        let style = SurfaceStyle {
            color: Rgb::from_hex(0x6bcb77),
            wireframe: false,
        };
        renderer.render_mesh(&Mesh::plane(2.0, 2.0), &Matrix4::identity(), &front_camera(), &lit(), style);

        let (ch, color) = renderer.cell(20, 10).unwrap();
        assert_eq!(ch, '@');
        assert_eq!(color, Rgb::from_hex(0x6bcb77));
        assert!(renderer.cell(0, 0).is_none());
    }

    #[test]
    fn test_wireframe_leaves_interior_empty() {
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.clear(Rgb::BLACK);
        let style = SurfaceStyle {
            color: Rgb::WHITE,
            wireframe: true,
        };
        renderer.render_mesh(&Mesh::cube(2.0), &Matrix4::identity(), &front_camera(), &lit(), style);
        let edges = renderer.coverage();

        renderer.clear(Rgb::BLACK);
        let solid = SurfaceStyle {
            wireframe: false,
            ..style
        };
        renderer.render_mesh(&Mesh::cube(2.0), &Matrix4::identity(), &front_camera(), &lit(), solid);

        assert!(edges > 0);
        assert!(edges < renderer.coverage());
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.clear(Rgb::BLACK);
        let near = SurfaceStyle {
            color: Rgb::from_hex(0xff0000),
            wireframe: false,
        };
        let far = SurfaceStyle {
            color: Rgb::from_hex(0x0000ff),
            wireframe: false,
        };
        let vp = front_camera();
        let plane = Mesh::plane(2.0, 2.0);
        renderer.render_mesh(&plane, &Matrix4::identity(), &vp, &lit(), near);
        let behind = Matrix4::new_translation(&Vector3::new(0.0, 0.0, -1.0));
        renderer.render_mesh(&plane, &behind, &vp, &lit(), far);

        assert_eq!(renderer.cell(20, 10).unwrap().1, Rgb::from_hex(0xff0000));
    }

    #[test]
    fn test_segment_crossing_near_plane_is_clipped() {
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.clear(Rgb::BLACK);
        let vp = front_camera();
        // Runs from in front of the camera to behind it
        renderer.draw_segment(&vp, &Point3::new(0.0, -1.0, 0.0), &Point3::new(0.0, -1.0, 20.0), Rgb::WHITE);
        assert!(renderer.coverage() > 0);
    }

    #[test]
    fn test_draw_writes_every_row() {
        let mut renderer = AsciiRenderer::new(4, 3);
        renderer.clear(Rgb::BLACK);
        let mut out = Vec::new();
        renderer.draw(&mut out, 2, 1).unwrap();
        assert!(!out.is_empty());

        renderer.resize(8, 2);
        assert_eq!((renderer.width(), renderer.height()), (8, 2));
        assert_eq!(renderer.coverage(), 0);
    }

    #[test]
    fn test_clip_to_rect() {
        assert_eq!(clip_to_rect((5.0, 5.0), (2.0, 0.0), 10.0, 10.0), Some((0.0, 1.0)));
        let (t0, t1) = clip_to_rect((-10.0, 5.0), (40.0, 0.0), 10.0, 10.0).unwrap();
        assert!((t0 - 0.25).abs() < 1e-6 && (t1 - 0.5).abs() < 1e-6);
        assert_eq!(clip_to_rect((-5.0, -5.0), (0.0, 2.0), 10.0, 10.0), None);
    }

    #[test]
    fn test_slope_chars() {
        assert_eq!(slope_char(10.0, 1.0), '-');
        assert_eq!(slope_char(0.0, 5.0), '|');
        assert_eq!(slope_char(3.0, 3.0), '\\');
        assert_eq!(slope_char(3.0, -3.0), '/');
    }
}
