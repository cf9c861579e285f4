use glam::Vec3;
use log::warn;

/// Encoded bytes of the built-in glyph atlas (128x64 PNG, 18x7 cells,
/// white glyphs on black).
pub const FONT_ATLAS_PNG: &[u8] = include_bytes!("../assets/font.png");

/// Glyph cells per atlas row.
pub const ATLAS_COLUMNS: u32 = 18;
/// Glyph rows in the atlas.
pub const ATLAS_ROWS: u32 = 7;
/// Vertices emitted per glyph quad (two triangles).
pub const VERTICES_PER_GLYPH: usize = 6;

/// Atlas characters in cell order, 18 per line; the remaining cells of the
/// last two rows are blank.
const ALPHABET: &str = concat!(
    " !\"#$%&'()*+,-./01",
    "23456789:;<=>?@ABC",
    "DEFGHIJKLMNOPQRSTU",
    "VWXYZ[\\]^_`abcdefg",
    "hijklmnopqrstuvwxy",
    "z{|}~",
);

/// Finds a character's atlas cell as (column, row), or `None` when the
/// character is not in the atlas alphabet.
pub fn glyph_cell(c: char) -> Option<(u32, u32)> {
    ALPHABET
        .chars()
        .position(|glyph| glyph == c)
        .map(|index| (index as u32 % ATLAS_COLUMNS, index as u32 / ATLAS_COLUMNS))
}

/// CPU-side mesh data for a run of text, one quad per character.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextGeometry {
    /// xyz per vertex.
    pub positions: Vec<f32>,
    /// rgba bytes per vertex, opaque white.
    pub colors: Vec<u8>,
    /// uv per vertex.
    pub uvs: Vec<f32>,
}

impl TextGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Lays out `text` as textured quads in the z = anchor.z plane.
///
/// Each character covers a `scale` x `scale` quad whose bottom-left corner
/// sits at the pen, and advances the pen by `scale` along +x. Characters
/// outside the atlas alphabet still advance the pen but get all-zero UVs,
/// which sample the blank corner of the space cell; each one logs a warning.
pub fn layout_text(anchor: Vec3, text: &str, scale: f32) -> TextGeometry {
    let mut geometry = TextGeometry {
        positions: Vec::with_capacity(text.len() * VERTICES_PER_GLYPH * 3),
        colors: Vec::with_capacity(text.len() * VERTICES_PER_GLYPH * 4),
        uvs: Vec::with_capacity(text.len() * VERTICES_PER_GLYPH * 2),
    };
    for (index, c) in text.chars().enumerate() {
        let x0 = anchor.x + index as f32 * scale;
        let x1 = x0 + scale;
        let y0 = anchor.y;
        let y1 = anchor.y + scale;
        let z = anchor.z;
        #[rustfmt::skip]
        geometry.positions.extend_from_slice(&[
            x0, y0, z,
            x1, y0, z,
            x1, y1, z,
            x0, y0, z,
            x1, y1, z,
            x0, y1, z,
        ]);
        for _ in 0..VERTICES_PER_GLYPH {
            geometry.colors.extend_from_slice(&[255, 255, 255, 255]);
        }
        match glyph_cell(c) {
            Some((col, row)) => {
                let u0 = col as f32 / ATLAS_COLUMNS as f32;
                let v0 = row as f32 / ATLAS_ROWS as f32;
                let u1 = (col + 1) as f32 / ATLAS_COLUMNS as f32;
                let v1 = (row + 1) as f32 / ATLAS_ROWS as f32;
                // Atlas row 0 sits at the top of the image, so v is flipped
                // relative to the quad winding.
                #[rustfmt::skip]
                geometry.uvs.extend_from_slice(&[
                    u0, v1,
                    u1, v1,
                    u1, v0,
                    u0, v1,
                    u1, v0,
                    u0, v0,
                ]);
            }
            None => {
                warn!("character {c:?} is not in the font atlas; drawing a blank cell");
                geometry.uvs.extend_from_slice(&[0.0; 12]);
            }
        }
    }
    geometry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_covers_printable_ascii() {
        assert_eq!(ALPHABET.chars().count(), 95);
        for code in 0x20u8..=0x7e {
            let c = code as char;
            let index = (code - 0x20) as u32;
            assert_eq!(
                glyph_cell(c),
                Some((index % ATLAS_COLUMNS, index / ATLAS_COLUMNS)),
                "glyph {c:?}",
            );
        }
    }

    #[test]
    fn known_glyph_cells() {
        assert_eq!(glyph_cell(' '), Some((0, 0)));
        assert_eq!(glyph_cell('A'), Some((15, 1)));
        assert_eq!(glyph_cell('a'), Some((11, 3)));
        assert_eq!(glyph_cell('~'), Some((4, 5)));
        assert_eq!(glyph_cell('\u{1}'), None);
        assert_eq!(glyph_cell('é'), None);
    }

    #[test]
    fn two_characters_make_twelve_vertices() {
        let geometry = layout_text(Vec3::new(1.0, 2.0, 3.0), "AB", 0.5);
        assert_eq!(geometry.vertex_count(), 12);
        assert_eq!(geometry.positions.len(), 36);
        assert_eq!(geometry.colors.len(), 48);
        assert_eq!(geometry.uvs.len(), 24);
    }

    #[test]
    fn pen_advances_by_scale() {
        let geometry = layout_text(Vec3::new(1.0, 2.0, 3.0), "AB", 0.5);
        // First vertex of the second quad starts one cell to the right.
        assert_eq!(geometry.positions[18], 1.5);
        assert_eq!(geometry.positions[19], 2.0);
        assert_eq!(geometry.positions[20], 3.0);
    }

    #[test]
    fn quads_are_axis_aligned_at_anchor_depth() {
        let geometry = layout_text(Vec3::new(0.0, 0.0, -2.0), "!", 1.0);
        let xs: Vec<f32> = geometry.positions.chunks(3).map(|v| v[0]).collect();
        let ys: Vec<f32> = geometry.positions.chunks(3).map(|v| v[1]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(ys, vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
        assert!(geometry.positions.chunks(3).all(|v| v[2] == -2.0));
    }

    #[test]
    fn uvs_are_v_flipped() {
        let geometry = layout_text(Vec3::ZERO, "A", 1.0);
        let (col, row) = glyph_cell('A').unwrap();
        let u0 = col as f32 / ATLAS_COLUMNS as f32;
        let v0 = row as f32 / ATLAS_ROWS as f32;
        let u1 = (col + 1) as f32 / ATLAS_COLUMNS as f32;
        let v1 = (row + 1) as f32 / ATLAS_ROWS as f32;
        #[rustfmt::skip]
        assert_eq!(
            geometry.uvs,
            vec![
                u0, v1,
                u1, v1,
                u1, v0,
                u0, v1,
                u1, v0,
                u0, v0,
            ]
        );
    }

    #[test]
    fn unsupported_characters_reserve_blank_space() {
        let geometry = layout_text(Vec3::ZERO, "A\u{1}B", 1.0);
        assert_eq!(geometry.vertex_count(), 18);
        assert_eq!(geometry.uvs.len(), 36);
        // The middle quad samples nothing.
        assert!(geometry.uvs[12..24].iter().all(|uv| *uv == 0.0));
        // The pen still advanced past it.
        assert_eq!(geometry.positions[36], 2.0);
    }

    #[test]
    fn empty_text_is_empty_geometry() {
        let geometry = layout_text(Vec3::ZERO, "", 1.0);
        assert_eq!(geometry.vertex_count(), 0);
        assert!(geometry.positions.is_empty());
    }

    #[test]
    fn atlas_png_has_png_signature() {
        assert_eq!(&FONT_ATLAS_PNG[..8], b"\x89PNG\r\n\x1a\n");
    }
}
