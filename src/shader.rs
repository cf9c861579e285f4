use std::collections::HashMap;

use glam::Mat4;
use glow::HasContext;
use log::{error, warn};
use thiserror::Error;

const VERTEX_SOURCE: &str = r#"#version 330 core
layout(location = 0) in vec3 a_pos;
layout(location = 1) in vec4 a_col;
layout(location = 2) in vec2 a_uv;

uniform mat4 u_view;
uniform mat4 u_proj;

out vec4 v_col;
out vec2 v_uv;

void main() {
    v_col = a_col;
    v_uv = a_uv;
    gl_Position = u_proj * u_view * vec4(a_pos, 1.0);
}
"#;

const FRAGMENT_SOURCE: &str = r#"#version 330 core
uniform sampler2D u_texture;
uniform int u_use_texture;

in vec4 v_col;
in vec2 v_uv;

out vec4 out_col;

void main() {
    out_col = v_col;
    if (u_use_texture == 1) {
        out_col = texture(u_texture, v_uv);
    }
}
"#;

/// Fatal rendering failures; anything else is logged and drawn around.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("shader program is invalid (compilation failed in an earlier frame)")]
    InvalidShader,
}

/// Compilation state of a [`ShaderProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShaderState {
    /// No GL work has happened yet; the first bind compiles.
    Uncompiled,
    /// Compiled and linked; binds are cheap.
    Valid(glow::Program),
    /// A stage failed to compile or the program failed to link.
    Invalid,
}

/// A lazily compiled GLSL program with memoized uniform locations.
///
/// Construction stores source text only. The first bind compiles both
/// stages and links; a failure is reported once as a recoverable error and
/// any later bind of the same program aborts the frame.
pub struct ShaderProgram {
    vertex_source: String,
    fragment_source: String,
    state: ShaderState,
    uniforms: HashMap<String, Option<glow::UniformLocation>>,
}

impl ShaderProgram {
    pub fn from_sources(
        vertex_source: impl Into<String>,
        fragment_source: impl Into<String>,
    ) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            state: ShaderState::Uncompiled,
            uniforms: HashMap::new(),
        }
    }

    /// The built-in program shared by every drawable: view/projection
    /// transform, per-vertex colors, optional texture lookup.
    pub fn built_in() -> Self {
        Self::from_sources(VERTEX_SOURCE, FRAGMENT_SOURCE)
    }

    /// Binds the program, compiling it on first use.
    ///
    /// Returns `Ok(true)` when the program is bound, `Ok(false)` when
    /// compilation failed just now (the failure is logged and the caller
    /// should skip its draw), and an error when the program was already
    /// invalid from an earlier frame.
    pub fn bind(&mut self, gl: &glow::Context) -> Result<bool, RenderError> {
        match self.state {
            ShaderState::Uncompiled => {
                match compile_program(gl, &self.vertex_source, &self.fragment_source) {
                    Ok(program) => {
                        self.state = ShaderState::Valid(program);
                        unsafe { gl.use_program(Some(program)) };
                        Ok(true)
                    }
                    Err(message) => {
                        error!("{message}");
                        self.state = ShaderState::Invalid;
                        Ok(false)
                    }
                }
            }
            ShaderState::Valid(program) => {
                unsafe { gl.use_program(Some(program)) };
                Ok(true)
            }
            ShaderState::Invalid => Err(RenderError::InvalidShader),
        }
    }

    /// Looks up a uniform location, memoizing the result per name. Missing
    /// uniforms are memoized as `None` so repeated lookups stay cheap.
    fn uniform_location(
        &mut self,
        gl: &glow::Context,
        name: &str,
    ) -> Option<glow::UniformLocation> {
        let ShaderState::Valid(program) = self.state else {
            return None;
        };
        if let Some(cached) = self.uniforms.get(name) {
            return cached.clone();
        }
        let location = unsafe { gl.get_uniform_location(program, name) };
        self.uniforms.insert(name.to_owned(), location.clone());
        location
    }

    /// Sets a mat4 uniform; a missing uniform logs a warning and the draw
    /// proceeds without it.
    pub fn set_mat4(&mut self, gl: &glow::Context, name: &str, value: &Mat4) {
        match self.uniform_location(gl, name) {
            Some(location) => unsafe {
                gl.uniform_matrix_4_f32_slice(Some(&location), false, &value.to_cols_array());
            },
            None => warn!("uniform {name} not found in shader program"),
        }
    }

    /// Sets an i32 uniform; a missing uniform logs a warning and the draw
    /// proceeds without it.
    pub fn set_i32(&mut self, gl: &glow::Context, name: &str, value: i32) {
        match self.uniform_location(gl, name) {
            Some(location) => unsafe {
                gl.uniform_1_i32(Some(&location), value);
            },
            None => warn!("uniform {name} not found in shader program"),
        }
    }
}

fn compile_program(
    gl: &glow::Context,
    vertex: &str,
    fragment: &str,
) -> Result<glow::Program, String> {
    unsafe {
        let vertex_shader = compile_stage(gl, glow::VERTEX_SHADER, vertex, "vertex")?;
        let fragment_shader = match compile_stage(gl, glow::FRAGMENT_SHADER, fragment, "fragment") {
            Ok(shader) => shader,
            Err(message) => {
                gl.delete_shader(vertex_shader);
                return Err(message);
            }
        };

        let program = match gl.create_program() {
            Ok(program) => program,
            Err(message) => {
                gl.delete_shader(vertex_shader);
                gl.delete_shader(fragment_shader);
                return Err(format!("failed to create program object: {message}"));
            }
        };
        gl.attach_shader(program, vertex_shader);
        gl.attach_shader(program, fragment_shader);
        gl.link_program(program);
        gl.detach_shader(program, vertex_shader);
        gl.detach_shader(program, fragment_shader);
        gl.delete_shader(vertex_shader);
        gl.delete_shader(fragment_shader);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(format!("failed to link shader program: {log}"));
        }
        Ok(program)
    }
}

fn compile_stage(
    gl: &glow::Context,
    stage: u32,
    source: &str,
    label: &str,
) -> Result<glow::Shader, String> {
    unsafe {
        let shader = gl
            .create_shader(stage)
            .map_err(|message| format!("failed to create {label} shader object: {message}"))?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(format!("failed to compile {label} shader: {log}"));
        }
        Ok(shader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_sources_declare_the_attribute_contract() {
        let program = ShaderProgram::built_in();
        assert!(program.vertex_source.contains("layout(location = 0) in vec3 a_pos"));
        assert!(program.vertex_source.contains("layout(location = 1) in vec4 a_col"));
        assert!(program.vertex_source.contains("layout(location = 2) in vec2 a_uv"));
        assert!(program.fragment_source.contains("u_use_texture"));
    }

    #[test]
    fn new_program_is_uncompiled() {
        let program = ShaderProgram::built_in();
        assert_eq!(program.state, ShaderState::Uncompiled);
        assert!(program.uniforms.is_empty());
    }
}
