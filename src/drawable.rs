use std::cell::RefCell;
use std::rc::Rc;

use glam::Mat4;
use glow::HasContext;

use crate::geometry::GeometryBuffer;
use crate::shader::{RenderError, ShaderProgram};
use crate::texture::Texture;

/// How a drawable's geometry reaches the screen.
pub enum DrawStyle {
    /// Line-list geometry stroked `width` pixels wide.
    Lines { width: f32 },
    /// Triangle-list geometry colored by sampling `texture` on unit 0.
    TexturedTriangles { texture: Rc<RefCell<Texture>> },
}

impl DrawStyle {
    /// Value bound to the `u_use_texture` uniform for this style.
    fn texture_flag(&self) -> i32 {
        match self {
            DrawStyle::Lines { .. } => 0,
            DrawStyle::TexturedTriangles { .. } => 1,
        }
    }

    /// Updates the stroke width; a no-op for triangle styles.
    pub fn set_line_width(&mut self, width: f32) {
        if let DrawStyle::Lines { width: current } = self {
            *current = width;
        }
    }
}

/// One renderable unit: geometry plus a shared shader program and a style.
/// The geometry is immutable once built; the stroke width is the only
/// mutable draw parameter.
pub struct Drawable {
    geometry: GeometryBuffer,
    program: Rc<RefCell<ShaderProgram>>,
    style: DrawStyle,
}

impl Drawable {
    pub fn new(
        geometry: GeometryBuffer,
        program: Rc<RefCell<ShaderProgram>>,
        style: DrawStyle,
    ) -> Self {
        Self {
            geometry,
            program,
            style,
        }
    }

    pub fn geometry(&self) -> &GeometryBuffer {
        &self.geometry
    }

    pub fn style_mut(&mut self) -> &mut DrawStyle {
        &mut self.style
    }

    /// Draws the geometry with the full state protocol. Every uniform and
    /// every piece of pipeline state is set on every call; nothing is
    /// assumed to survive from the previous drawable.
    pub fn draw(
        &self,
        gl: &glow::Context,
        view: &Mat4,
        projection: &Mat4,
    ) -> Result<(), RenderError> {
        let mut program = self.program.borrow_mut();
        if !program.bind(gl)? {
            // Compilation failed just now; the failure is already logged.
            return Ok(());
        }
        program.set_mat4(gl, "u_view", view);
        program.set_mat4(gl, "u_proj", projection);
        program.set_i32(gl, "u_use_texture", self.style.texture_flag());
        match &self.style {
            DrawStyle::Lines { width } => unsafe { gl.line_width(*width) },
            DrawStyle::TexturedTriangles { texture } => {
                program.set_i32(gl, "u_texture", 0);
                texture.borrow_mut().bind(gl, 0);
            }
        }
        self.geometry.draw(gl);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::FONT_ATLAS_PNG;

    #[test]
    fn styles_pick_the_texture_flag() {
        let lines = DrawStyle::Lines { width: 2.0 };
        assert_eq!(lines.texture_flag(), 0);
        let texture = Rc::new(RefCell::new(Texture::from_encoded_bytes(
            "font atlas",
            FONT_ATLAS_PNG.to_vec(),
        )));
        let triangles = DrawStyle::TexturedTriangles { texture };
        assert_eq!(triangles.texture_flag(), 1);
    }

    #[test]
    fn line_width_only_applies_to_lines() {
        let mut lines = DrawStyle::Lines { width: 1.0 };
        lines.set_line_width(4.0);
        assert!(matches!(lines, DrawStyle::Lines { width } if width == 4.0));

        let texture = Rc::new(RefCell::new(Texture::from_encoded_bytes(
            "font atlas",
            FONT_ATLAS_PNG.to_vec(),
        )));
        let mut triangles = DrawStyle::TexturedTriangles { texture };
        triangles.set_line_width(4.0);
        assert!(matches!(triangles, DrawStyle::TexturedTriangles { .. }));
    }
}
