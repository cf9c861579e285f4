use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use glow::HasContext;
use image::RgbaImage;
use log::{debug, error};
use parking_lot::Mutex;

/// Handoff slot between the decode thread and the render thread.
type DecodeSlot = Arc<Mutex<Option<Result<RgbaImage, String>>>>;

/// A 2D RGBA texture whose pixels arrive asynchronously.
///
/// Construction spawns a background thread that decodes the image and
/// parks the result in a shared slot; GL work is deferred to [`bind`].
/// The first bind uploads a 1x1 transparent placeholder so that binding is
/// always valid, and once the decoded image lands it replaces the
/// placeholder on the next bind. Binds never block and never fail.
///
/// [`bind`]: Texture::bind
pub struct Texture {
    label: String,
    handle: Option<glow::Texture>,
    pending: DecodeSlot,
    image: Option<RgbaImage>,
    needs_upload: bool,
}

impl Texture {
    /// Starts decoding an image file in the background.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        let pending: DecodeSlot = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&pending);
        thread::spawn(move || {
            let result = image::open(&path)
                .map(|decoded| decoded.into_rgba8())
                .map_err(|err| format!("failed to decode {}: {err}", path.display()));
            *slot.lock() = Some(result);
        });
        Self::with_pending(label, pending)
    }

    /// Starts decoding an in-memory encoded image (such as the embedded
    /// font atlas) in the background.
    pub fn from_encoded_bytes(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        let label = label.into();
        let pending: DecodeSlot = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&pending);
        let source = label.clone();
        thread::spawn(move || {
            let result = image::load_from_memory(&bytes)
                .map(|decoded| decoded.into_rgba8())
                .map_err(|err| format!("failed to decode {source}: {err}"));
            *slot.lock() = Some(result);
        });
        Self::with_pending(label, pending)
    }

    fn with_pending(label: String, pending: DecodeSlot) -> Self {
        Self {
            label,
            handle: None,
            pending,
            image: None,
            needs_upload: false,
        }
    }

    /// Takes a finished decode out of the slot, if one arrived. Failed
    /// decodes are logged once and the placeholder stays in place.
    fn poll_pending(&mut self) {
        if let Some(result) = self.pending.lock().take() {
            match result {
                Ok(image) => {
                    self.image = Some(image);
                    self.needs_upload = true;
                }
                Err(message) => error!("{message}"),
            }
        }
    }

    /// Binds the texture to the given texture unit, creating the GL object
    /// and uploading pixels lazily.
    pub fn bind(&mut self, gl: &glow::Context, unit: u32) {
        self.poll_pending();
        unsafe {
            gl.active_texture(glow::TEXTURE0 + unit);
            match self.handle {
                Some(handle) => gl.bind_texture(glow::TEXTURE_2D, Some(handle)),
                None => {
                    let handle = match gl.create_texture() {
                        Ok(handle) => handle,
                        Err(message) => {
                            error!("failed to create texture object for {}: {message}", self.label);
                            return;
                        }
                    };
                    gl.bind_texture(glow::TEXTURE_2D, Some(handle));
                    set_sampling_params(gl);
                    upload_rgba(gl, 1, 1, &[0, 0, 0, 0]);
                    self.handle = Some(handle);
                }
            }
            if self.needs_upload {
                if let Some(image) = &self.image {
                    upload_rgba(gl, image.width() as i32, image.height() as i32, image.as_raw());
                    debug!(
                        "texture {} uploaded ({}x{})",
                        self.label,
                        image.width(),
                        image.height()
                    );
                }
                self.needs_upload = false;
            }
        }
    }
}

unsafe fn set_sampling_params(gl: &glow::Context) {
    gl.tex_parameter_i32(
        glow::TEXTURE_2D,
        glow::TEXTURE_MIN_FILTER,
        glow::LINEAR as i32,
    );
    gl.tex_parameter_i32(
        glow::TEXTURE_2D,
        glow::TEXTURE_MAG_FILTER,
        glow::LINEAR as i32,
    );
    gl.tex_parameter_i32(
        glow::TEXTURE_2D,
        glow::TEXTURE_WRAP_S,
        glow::CLAMP_TO_EDGE as i32,
    );
    gl.tex_parameter_i32(
        glow::TEXTURE_2D,
        glow::TEXTURE_WRAP_T,
        glow::CLAMP_TO_EDGE as i32,
    );
}

unsafe fn upload_rgba(gl: &glow::Context, width: i32, height: i32, pixels: &[u8]) {
    gl.tex_image_2d(
        glow::TEXTURE_2D,
        0,
        glow::RGBA as i32,
        width,
        height,
        0,
        glow::RGBA,
        glow::UNSIGNED_BYTE,
        glow::PixelUnpackData::Slice(Some(pixels)),
    );
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::text::FONT_ATLAS_PNG;

    fn wait_for_decode(texture: &mut Texture) {
        for _ in 0..200 {
            texture.poll_pending();
            if texture.image.is_some() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn decode_thread_delivers_the_font_atlas() {
        let mut texture = Texture::from_encoded_bytes("font atlas", FONT_ATLAS_PNG.to_vec());
        wait_for_decode(&mut texture);
        let image = texture.image.as_ref().expect("atlas should decode");
        assert_eq!((image.width(), image.height()), (128, 64));
        assert!(texture.needs_upload);
        assert!(texture.handle.is_none(), "no GL work before the first bind");
    }

    #[test]
    fn decoded_atlas_is_opaque_with_lit_glyph_pixels() {
        let mut texture = Texture::from_encoded_bytes("font atlas", FONT_ATLAS_PNG.to_vec());
        wait_for_decode(&mut texture);
        let image = texture.image.as_ref().expect("atlas should decode");
        assert!(image.pixels().all(|p| p.0[3] == 255));
        assert!(image.pixels().any(|p| p.0[0] > 0));
    }

    #[test]
    fn from_path_with_missing_file_delivers_an_error() {
        let mut texture = Texture::from_path("/nonexistent/atlas.png");
        for _ in 0..200 {
            if texture.pending.lock().is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        {
            let slot = texture.pending.lock();
            let result = slot.as_ref().expect("decode thread should report");
            let message = result.as_ref().err().expect("missing file should fail");
            assert!(message.contains("/nonexistent/atlas.png"));
        }
        texture.poll_pending();
        assert!(texture.image.is_none());
        assert!(!texture.needs_upload);
        assert!(texture.pending.lock().is_none());
    }

    #[test]
    fn failed_decode_leaves_no_image() {
        let pending: DecodeSlot =
            Arc::new(Mutex::new(Some(Err("failed to decode garbage".into()))));
        let mut texture = Texture::with_pending("garbage".into(), pending);
        texture.poll_pending();
        assert!(texture.image.is_none());
        assert!(!texture.needs_upload);
        assert!(texture.pending.lock().is_none());
    }

    #[test]
    fn pending_result_is_taken_exactly_once() {
        let mut texture = Texture::from_encoded_bytes("font atlas", FONT_ATLAS_PNG.to_vec());
        wait_for_decode(&mut texture);
        assert!(texture.pending.lock().is_none());
        texture.poll_pending();
        assert!(texture.image.is_some());
    }
}
