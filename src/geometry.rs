use anyhow::{anyhow, Result};
use bytemuck::cast_slice;
use glow::HasContext;
use log::{debug, warn};

/// Primitive topology of a geometry buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Independent line segments, two vertices each.
    Lines,
    /// Independent triangles, three vertices each.
    Triangles,
}

impl Topology {
    fn gl_mode(self) -> u32 {
        match self {
            Topology::Lines => glow::LINES,
            Topology::Triangles => glow::TRIANGLES,
        }
    }
}

/// One vertex attribute array, uploaded once at construction and never
/// mutated afterwards.
pub struct AttributeBuffer {
    buffer: glow::Buffer,
    components: i32,
    data_type: u32,
    normalized: bool,
    element_count: usize,
}

impl AttributeBuffer {
    /// Uploads float data, `components` floats per vertex.
    pub fn from_f32(gl: &glow::Context, data: &[f32], components: i32) -> Result<Self> {
        Self::upload(gl, cast_slice(data), components, glow::FLOAT, false, data.len())
    }

    /// Uploads byte data, `components` bytes per vertex, normalized to 0..1
    /// when read by the shader.
    pub fn from_u8_normalized(gl: &glow::Context, data: &[u8], components: i32) -> Result<Self> {
        Self::upload(gl, data, components, glow::UNSIGNED_BYTE, true, data.len())
    }

    fn upload(
        gl: &glow::Context,
        bytes: &[u8],
        components: i32,
        data_type: u32,
        normalized: bool,
        element_count: usize,
    ) -> Result<Self> {
        let buffer = unsafe {
            let buffer = gl
                .create_buffer()
                .map_err(|message| anyhow!("failed to create attribute buffer: {message}"))?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STATIC_DRAW);
            buffer
        };
        Ok(Self {
            buffer,
            components,
            data_type,
            normalized,
            element_count,
        })
    }

    /// Number of vertices this attribute describes.
    pub fn vertex_count(&self) -> usize {
        self.element_count / self.components.max(1) as usize
    }
}

/// Vertex attributes, an optional 16-bit index list and a topology, tied
/// together under one vertex array object.
///
/// Attribute order is binding order: attribute i lands at shader location i.
/// All attributes must describe the same number of vertices; the count is
/// derived from the first attribute once and never revalidated. Indices are
/// 16-bit, which caps addressable vertices at 65536.
pub struct GeometryBuffer {
    vao: Option<glow::VertexArray>,
    index_count: Option<i32>,
    topology: Topology,
    vertex_count: i32,
}

impl GeometryBuffer {
    /// Builds the vertex array from already uploaded attributes plus an
    /// optional index list.
    ///
    /// An empty attribute list produces an invalid buffer: construction
    /// logs a warning and succeeds, and every draw skips it.
    pub fn new(
        gl: &glow::Context,
        attributes: &[AttributeBuffer],
        indices: Option<&[u16]>,
        topology: Topology,
    ) -> Result<Self> {
        if attributes.is_empty() {
            warn!("geometry constructed with no attributes; it will never draw");
            return Ok(Self {
                vao: None,
                index_count: None,
                topology,
                vertex_count: 0,
            });
        }
        let vertex_count = attributes[0].vertex_count() as i32;
        let vao = unsafe {
            let vao = gl
                .create_vertex_array()
                .map_err(|message| anyhow!("failed to create vertex array: {message}"))?;
            gl.bind_vertex_array(Some(vao));
            for (location, attribute) in attributes.iter().enumerate() {
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(attribute.buffer));
                gl.enable_vertex_attrib_array(location as u32);
                gl.vertex_attrib_pointer_f32(
                    location as u32,
                    attribute.components,
                    attribute.data_type,
                    attribute.normalized,
                    0,
                    0,
                );
            }
            vao
        };
        let index_count = match indices {
            Some(indices) => unsafe {
                let buffer = gl
                    .create_buffer()
                    .map_err(|message| anyhow!("failed to create index buffer: {message}"))?;
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
                gl.buffer_data_u8_slice(
                    glow::ELEMENT_ARRAY_BUFFER,
                    cast_slice(indices),
                    glow::STATIC_DRAW,
                );
                Some(indices.len() as i32)
            },
            None => None,
        };
        unsafe { gl.bind_vertex_array(None) };
        Ok(Self {
            vao: Some(vao),
            index_count,
            topology,
            vertex_count,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.vao.is_some()
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    /// Issues the draw call. Invalid geometry is skipped without error.
    pub fn draw(&self, gl: &glow::Context) {
        let Some(vao) = self.vao else {
            debug!("skipping draw of invalid geometry");
            return;
        };
        unsafe {
            gl.bind_vertex_array(Some(vao));
            match self.index_count {
                Some(count) => {
                    gl.draw_elements(self.topology.gl_mode(), count, glow::UNSIGNED_SHORT, 0)
                }
                None => gl.draw_arrays(self.topology.gl_mode(), 0, self.vertex_count),
            }
        }
    }
}
