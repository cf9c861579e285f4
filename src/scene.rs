use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context as _, Result};
use glam::Vec3;
use glow::HasContext;
use log::debug;

use crate::camera::Camera;
use crate::drawable::{DrawStyle, Drawable};
use crate::geometry::{AttributeBuffer, GeometryBuffer, Topology};
use crate::shader::{RenderError, ShaderProgram};
use crate::text::{self, TextGeometry};
use crate::texture::Texture;

/// Glyph size used by [`Scene::add_text`], in world units.
pub const DEFAULT_TEXT_SCALE: f32 = 0.25;

/// Corner colors of [`cube_outline`], one RGBA per corner: black, red,
/// yellow, green, blue, magenta, white, cyan.
#[rustfmt::skip]
pub const CUBE_CORNER_COLORS: [u8; 32] = [
      0,   0,   0, 255,
    255,   0,   0, 255,
    255, 255,   0, 255,
      0, 255,   0, 255,
      0,   0, 255, 255,
    255,   0, 255, 255,
    255, 255, 255, 255,
      0, 255, 255, 255,
];

/// Edge list of [`cube_outline`]: the z = -depth/2 ring, the z = +depth/2
/// ring, then the four connecting edges.
#[rustfmt::skip]
pub const CUBE_EDGE_INDICES: [u16; 24] = [
    0, 1, 1, 2, 2, 3, 3, 0,
    4, 5, 5, 6, 6, 7, 7, 4,
    0, 4, 1, 5, 2, 6, 3, 7,
];

/// Vertex data for an axis-aligned wireframe box centered at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeOutline {
    pub positions: [f32; 24],
    pub colors: [u8; 32],
    pub indices: [u16; 24],
}

/// Builds the canonical wireframe box: eight corners at (+-width/2,
/// +-height/2, +-depth/2) with the fixed corner palette and edge list.
pub fn cube_outline(width: f32, height: f32, depth: f32) -> CubeOutline {
    let x = width / 2.0;
    let y = height / 2.0;
    let z = depth / 2.0;
    #[rustfmt::skip]
    let positions = [
        -x, -y, -z,
         x, -y, -z,
         x,  y, -z,
        -x,  y, -z,
        -x, -y,  z,
         x, -y,  z,
         x,  y,  z,
        -x,  y,  z,
    ];
    CubeOutline {
        positions,
        colors: CUBE_CORNER_COLORS,
        indices: CUBE_EDGE_INDICES,
    }
}

/// Accumulates drawables and renders them all with one call per frame.
///
/// The scene owns the resources its drawables share: the built-in shader
/// program and the font atlas texture, each created once per scene and
/// handed to drawables by reference. Drawables persist for the scene's
/// lifetime and render in insertion order.
///
/// Every method must run on the thread where the GL context passed to
/// [`Scene::new`] is current.
pub struct Scene {
    gl: Rc<glow::Context>,
    background: [f32; 4],
    camera: Camera,
    drawables: Vec<Drawable>,
    surface_size: (u32, u32),
    program: Rc<RefCell<ShaderProgram>>,
    font_texture: Rc<RefCell<Texture>>,
}

impl Scene {
    /// Creates an empty scene over an existing GL context. Starts the font
    /// atlas decode; no other GL work happens until drawables are added.
    pub fn new(gl: Rc<glow::Context>) -> Self {
        Self {
            gl,
            background: [0.0, 0.0, 0.0, 1.0],
            camera: Camera::new(),
            drawables: Vec::new(),
            surface_size: (0, 0),
            program: Rc::new(RefCell::new(ShaderProgram::built_in())),
            font_texture: Rc::new(RefCell::new(Texture::from_encoded_bytes(
                "font atlas",
                text::FONT_ATLAS_PNG.to_vec(),
            ))),
        }
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Sets the clear color (RGBA, 0..1). Defaults to opaque black.
    pub fn set_background(&mut self, rgba: [f32; 4]) {
        self.background = rgba;
    }

    pub fn drawables_mut(&mut self) -> &mut [Drawable] {
        &mut self.drawables
    }

    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    /// Adds independent line segments: three floats per point, four color
    /// bytes per point, consecutive point pairs forming the segments.
    pub fn add_lines(&mut self, points: &[f32], colors: &[u8], line_width: f32) -> Result<()> {
        let attributes = [
            AttributeBuffer::from_f32(&self.gl, points, 3)
                .context("failed to upload line positions")?,
            AttributeBuffer::from_u8_normalized(&self.gl, colors, 4)
                .context("failed to upload line colors")?,
        ];
        let geometry = GeometryBuffer::new(&self.gl, &attributes, None, Topology::Lines)?;
        self.drawables.push(Drawable::new(
            geometry,
            Rc::clone(&self.program),
            DrawStyle::Lines { width: line_width },
        ));
        Ok(())
    }

    /// Adds a wireframe box centered at the origin (see [`cube_outline`]).
    pub fn add_line_cube(&mut self, width: f32, height: f32, depth: f32) -> Result<()> {
        let cube = cube_outline(width, height, depth);
        let attributes = [
            AttributeBuffer::from_f32(&self.gl, &cube.positions, 3)
                .context("failed to upload cube positions")?,
            AttributeBuffer::from_u8_normalized(&self.gl, &cube.colors, 4)
                .context("failed to upload cube colors")?,
        ];
        let geometry =
            GeometryBuffer::new(&self.gl, &attributes, Some(&cube.indices), Topology::Lines)?;
        self.drawables.push(Drawable::new(
            geometry,
            Rc::clone(&self.program),
            DrawStyle::Lines { width: 1.0 },
        ));
        Ok(())
    }

    /// Adds a run of text at the default glyph size.
    pub fn add_text(&mut self, anchor: Vec3, label: &str) -> Result<()> {
        self.add_text_scaled(anchor, label, DEFAULT_TEXT_SCALE)
    }

    /// Adds a run of text; each glyph covers a `scale` x `scale` quad in
    /// the z = anchor.z plane, textured from the font atlas.
    pub fn add_text_scaled(&mut self, anchor: Vec3, label: &str, scale: f32) -> Result<()> {
        let TextGeometry {
            positions,
            colors,
            uvs,
        } = text::layout_text(anchor, label, scale);
        let attributes = [
            AttributeBuffer::from_f32(&self.gl, &positions, 3)
                .context("failed to upload text positions")?,
            AttributeBuffer::from_u8_normalized(&self.gl, &colors, 4)
                .context("failed to upload text colors")?,
            AttributeBuffer::from_f32(&self.gl, &uvs, 2).context("failed to upload text uvs")?,
        ];
        let geometry = GeometryBuffer::new(&self.gl, &attributes, None, Topology::Triangles)?;
        self.drawables.push(Drawable::new(
            geometry,
            Rc::clone(&self.program),
            DrawStyle::TexturedTriangles {
                texture: Rc::clone(&self.font_texture),
            },
        ));
        Ok(())
    }

    /// Renders every drawable in insertion order.
    ///
    /// `width` and `height` are the surface's current pixel size; when they
    /// differ from the previous frame the projection is re-derived for the
    /// new aspect ratio. The only fatal error is a drawable whose shader
    /// program already failed to compile in an earlier frame.
    pub fn render(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if (width, height) != self.surface_size {
            debug!("surface resized to {width}x{height}");
            self.surface_size = (width, height);
            if height > 0 {
                self.camera.set_aspect(width as f32 / height as f32);
            }
        }
        let view = self.camera.view();
        let projection = self.camera.projection();
        let gl = &self.gl;
        unsafe {
            gl.viewport(0, 0, width as i32, height as i32);
            gl.clear_color(
                self.background[0],
                self.background[1],
                self.background[2],
                self.background[3],
            );
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LEQUAL);
        }
        for drawable in &self.drawables {
            drawable.draw(gl, &view, &projection)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_corners_sit_at_half_extents() {
        let cube = cube_outline(2.0, 4.0, 6.0);
        assert_eq!(cube.positions.len(), 24);
        for corner in cube.positions.chunks(3) {
            assert_eq!(corner[0].abs(), 1.0);
            assert_eq!(corner[1].abs(), 2.0);
            assert_eq!(corner[2].abs(), 3.0);
        }
    }

    #[test]
    fn cube_has_twelve_edges_within_bounds() {
        let cube = cube_outline(1.0, 1.0, 1.0);
        assert_eq!(cube.indices.len(), 24);
        assert!(cube.indices.iter().all(|&index| index < 8));
    }

    #[test]
    fn cube_edges_connect_adjacent_corners() {
        let cube = cube_outline(2.0, 4.0, 6.0);
        for pair in cube.indices.chunks(2) {
            let a = &cube.positions[pair[0] as usize * 3..][..3];
            let b = &cube.positions[pair[1] as usize * 3..][..3];
            let differing = a.iter().zip(b).filter(|(m, n)| m != n).count();
            assert_eq!(differing, 1, "edge {pair:?} should span exactly one axis");
        }
    }

    #[test]
    fn every_cube_corner_joins_three_edges() {
        let cube = cube_outline(1.0, 1.0, 1.0);
        let mut degree = [0usize; 8];
        for index in cube.indices {
            degree[index as usize] += 1;
        }
        assert!(degree.iter().all(|&d| d == 3));
    }

    #[test]
    fn cube_palette_is_opaque() {
        assert_eq!(CUBE_CORNER_COLORS.len(), 32);
        for color in CUBE_CORNER_COLORS.chunks(4) {
            assert_eq!(color[3], 255);
        }
    }
}
