//! Immediate-mode 3D line and bitmap-text rendering on OpenGL.
//!
//! The crate draws colored line segments, wireframe boxes and fixed-pitch
//! text labels in world space: accumulate drawables into a [`Scene`], then
//! call [`Scene::render`] once per frame. Window and GL context creation
//! are intentionally left to the embedder; every scene method expects the
//! context handed to [`Scene::new`] to be current on the calling thread.

pub mod camera;
pub mod drawable;
pub mod geometry;
pub mod math;
pub mod scene;
pub mod shader;
pub mod text;
pub mod texture;

pub use camera::Camera;
pub use drawable::{DrawStyle, Drawable};
pub use geometry::{AttributeBuffer, GeometryBuffer, Topology};
pub use scene::{cube_outline, CubeOutline, Scene, DEFAULT_TEXT_SCALE};
pub use shader::{RenderError, ShaderProgram};
pub use text::{glyph_cell, layout_text, TextGeometry};
pub use texture::Texture;
