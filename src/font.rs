use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::framebuffer::Framebuffer;

pub const DEFAULT_GLYPH_WIDTH: u32 = 8;
pub const DEFAULT_GLYPH_HEIGHT: u32 = 8;
pub const DEFAULT_SPACING: i32 = 1;

const BLANK_GLYPH: [u8; 8] = [0; 8];

// Rows top to bottom, bit 7 is the leftmost pixel.
#[rustfmt::skip]
const DEFAULT_GLYPHS: [(char, [u8; 8]); 63] = [
    ('A', [0x70, 0x88, 0x88, 0xF8, 0x88, 0x88, 0x88, 0x00]),
    ('B', [0xF0, 0x88, 0x88, 0xF0, 0x88, 0x88, 0xF0, 0x00]),
    ('C', [0x70, 0x88, 0x80, 0x80, 0x80, 0x88, 0x70, 0x00]),
    ('D', [0xF0, 0x88, 0x88, 0x88, 0x88, 0x88, 0xF0, 0x00]),
    ('E', [0xF8, 0x80, 0x80, 0xF0, 0x80, 0x80, 0xF8, 0x00]),
    ('F', [0xF8, 0x80, 0x80, 0xF0, 0x80, 0x80, 0x80, 0x00]),
    ('G', [0x70, 0x88, 0x80, 0x98, 0x88, 0x88, 0x70, 0x00]),
    ('H', [0x88, 0x88, 0x88, 0xF8, 0x88, 0x88, 0x88, 0x00]),
    ('I', [0x70, 0x20, 0x20, 0x20, 0x20, 0x20, 0x70, 0x00]),
    ('J', [0x38, 0x08, 0x08, 0x08, 0x88, 0x88, 0x70, 0x00]),
    ('K', [0x88, 0x90, 0xA0, 0xC0, 0xA0, 0x90, 0x88, 0x00]),
    ('L', [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0xF8, 0x00]),
    ('M', [0x88, 0xD8, 0xA8, 0x88, 0x88, 0x88, 0x88, 0x00]),
    ('N', [0x88, 0xC8, 0xA8, 0x98, 0x88, 0x88, 0x88, 0x00]),
    ('O', [0x70, 0x88, 0x88, 0x88, 0x88, 0x88, 0x70, 0x00]),
    ('P', [0xF0, 0x88, 0x88, 0xF0, 0x80, 0x80, 0x80, 0x00]),
    ('Q', [0x70, 0x88, 0x88, 0x88, 0xA8, 0x90, 0x68, 0x00]),
    ('R', [0xF0, 0x88, 0x88, 0xF0, 0xA0, 0x90, 0x88, 0x00]),
    ('S', [0x70, 0x88, 0x80, 0x70, 0x08, 0x88, 0x70, 0x00]),
    ('T', [0xF8, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x00]),
    ('U', [0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x70, 0x00]),
    ('V', [0x88, 0x88, 0x88, 0x88, 0x50, 0x20, 0x20, 0x00]),
    ('W', [0x88, 0x88, 0x88, 0xA8, 0xA8, 0xD8, 0x88, 0x00]),
    ('X', [0x88, 0x50, 0x20, 0x20, 0x50, 0x88, 0x88, 0x00]),
    ('Y', [0x88, 0x88, 0x50, 0x20, 0x20, 0x20, 0x20, 0x00]),
    ('Z', [0xF8, 0x08, 0x10, 0x20, 0x40, 0x80, 0xF8, 0x00]),
    ('0', [0x70, 0x88, 0x98, 0xA8, 0xC8, 0x88, 0x70, 0x00]),
    ('1', [0x20, 0x60, 0x20, 0x20, 0x20, 0x20, 0x70, 0x00]),
    ('2', [0x70, 0x88, 0x08, 0x30, 0x40, 0x80, 0xF8, 0x00]),
    ('3', [0x70, 0x88, 0x08, 0x30, 0x08, 0x88, 0x70, 0x00]),
    ('4', [0x10, 0x30, 0x50, 0x90, 0xF8, 0x10, 0x10, 0x00]),
    ('5', [0xF8, 0x80, 0xF0, 0x08, 0x08, 0x88, 0x70, 0x00]),
    ('6', [0x30, 0x40, 0x80, 0xF0, 0x88, 0x88, 0x70, 0x00]),
    ('7', [0xF8, 0x08, 0x10, 0x20, 0x40, 0x40, 0x40, 0x00]),
    ('8', [0x70, 0x88, 0x88, 0x70, 0x88, 0x88, 0x70, 0x00]),
    ('9', [0x70, 0x88, 0x88, 0x78, 0x08, 0x10, 0x60, 0x00]),
    (' ', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x60, 0x60, 0x00]),
    (',', [0x00, 0x00, 0x00, 0x00, 0x00, 0x60, 0x20, 0x40]),
    (':', [0x00, 0x60, 0x60, 0x00, 0x60, 0x60, 0x00, 0x00]),
    (';', [0x00, 0x60, 0x60, 0x00, 0x60, 0x20, 0x40, 0x00]),
    ('!', [0x20, 0x20, 0x20, 0x20, 0x20, 0x00, 0x20, 0x00]),
    ('?', [0x70, 0x88, 0x08, 0x30, 0x20, 0x00, 0x20, 0x00]),
    ('+', [0x00, 0x20, 0x20, 0xF8, 0x20, 0x20, 0x00, 0x00]),
    ('-', [0x00, 0x00, 0x00, 0xF8, 0x00, 0x00, 0x00, 0x00]),
    ('*', [0x00, 0x88, 0x50, 0x20, 0x50, 0x88, 0x00, 0x00]),
    ('/', [0x08, 0x08, 0x10, 0x20, 0x40, 0x80, 0x80, 0x00]),
    ('\\', [0x80, 0x80, 0x40, 0x20, 0x10, 0x08, 0x08, 0x00]),
    ('(', [0x10, 0x20, 0x40, 0x40, 0x40, 0x20, 0x10, 0x00]),
    (')', [0x40, 0x20, 0x10, 0x10, 0x10, 0x20, 0x40, 0x00]),
    ('[', [0x70, 0x40, 0x40, 0x40, 0x40, 0x40, 0x70, 0x00]),
    (']', [0x70, 0x10, 0x10, 0x10, 0x10, 0x10, 0x70, 0x00]),
    ('<', [0x10, 0x20, 0x40, 0x80, 0x40, 0x20, 0x10, 0x00]),
    ('>', [0x80, 0x40, 0x20, 0x10, 0x20, 0x40, 0x80, 0x00]),
    ('=', [0x00, 0x00, 0xF8, 0x00, 0xF8, 0x00, 0x00, 0x00]),
    ('_', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF8, 0x00]),
    ('|', [0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x00]),
    ('"', [0x50, 0x50, 0x50, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('\'', [0x20, 0x20, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('#', [0x50, 0x50, 0xF8, 0x50, 0xF8, 0x50, 0x50, 0x00]),
    ('%', [0xC0, 0xC8, 0x10, 0x20, 0x40, 0x98, 0x18, 0x00]),
    ('&', [0x40, 0xA0, 0x40, 0xA8, 0x90, 0x98, 0x60, 0x00]),
    ('@', [0x70, 0x88, 0xB8, 0xA8, 0xB8, 0x80, 0x78, 0x00]),
];

pub static DEFAULT_FONT: LazyLock<Font> = LazyLock::new(|| Font {
    width: DEFAULT_GLYPH_WIDTH,
    height: DEFAULT_GLYPH_HEIGHT,
    spacing: DEFAULT_SPACING,
    glyphs: DEFAULT_GLYPHS
        .iter()
        .map(|(ch, rows)| (*ch, rows.to_vec()))
        .collect(),
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontError {
    ZeroWidth,
    ZeroHeight,
    TooWide(u32),
    GlyphKey(String),
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::ZeroWidth => write!(f, "glyph width must be at least 1"),
            FontError::ZeroHeight => write!(f, "glyph height must be at least 1"),
            FontError::TooWide(width) => {
                write!(f, "glyph width {width} does not fit in a row byte")
            }
            FontError::GlyphKey(key) => {
                write!(f, "glyph key {key:?} is not a single character")
            }
        }
    }
}

impl std::error::Error for FontError {}

/// Caller-supplied font description. Unset fields take the defaults
/// (8x8 cells, spacing 1); a missing space glyph is synthesized blank.
#[derive(Debug, Clone, Default)]
pub struct FontSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub spacing: Option<i32>,
    pub glyphs: Vec<(String, Vec<u8>)>,
}

impl FontSpec {
    pub fn new() -> Self {
        FontSpec::default()
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn spacing(mut self, spacing: i32) -> Self {
        self.spacing = Some(spacing);
        self
    }

    pub fn glyph(mut self, key: impl Into<String>, rows: impl Into<Vec<u8>>) -> Self {
        self.glyphs.push((key.into(), rows.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    pub width: u32,
    pub height: u32,
    pub spacing: i32,
    glyphs: HashMap<char, Vec<u8>>,
}

impl TryFrom<FontSpec> for Font {
    type Error = FontError;

    fn try_from(spec: FontSpec) -> Result<Self, Self::Error> {
        let width = spec.width.unwrap_or(DEFAULT_GLYPH_WIDTH);
        let height = spec.height.unwrap_or(DEFAULT_GLYPH_HEIGHT);
        if width == 0 {
            return Err(FontError::ZeroWidth);
        }
        if height == 0 {
            return Err(FontError::ZeroHeight);
        }
        if width > 8 {
            return Err(FontError::TooWide(width));
        }

        let mut glyphs = HashMap::with_capacity(spec.glyphs.len() + 1);
        for (key, rows) in spec.glyphs {
            let mut chars = key.chars();
            let ch = match (chars.next(), chars.next()) {
                (Some(ch), None) => ch,
                _ => return Err(FontError::GlyphKey(key)),
            };
            glyphs.insert(ch, rows);
        }
        glyphs
            .entry(' ')
            .or_insert_with(|| vec![0; height as usize]);

        Ok(Font {
            width,
            height,
            spacing: spec.spacing.unwrap_or(DEFAULT_SPACING),
            glyphs,
        })
    }
}

fn uppercase(ch: char) -> char {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => single,
        _ => ch,
    }
}

impl Font {
    /// Rows for `ch`, falling back to space, then `?`, then a blank cell.
    pub fn glyph(&self, ch: char) -> &[u8] {
        self.glyphs
            .get(&uppercase(ch))
            .or_else(|| self.glyphs.get(&' '))
            .or_else(|| self.glyphs.get(&'?'))
            .map(Vec::as_slice)
            .unwrap_or(&BLANK_GLYPH)
    }

    pub fn advance(&self) -> i32 {
        self.width as i32 + self.spacing
    }

    pub fn line_height(&self) -> i32 {
        self.height as i32 + self.spacing
    }

    pub fn draw_char(&self, fb: &mut Framebuffer, ch: char, x: i32, y: i32, color: u32) {
        let pattern = self.glyph(ch);
        for row in 0..self.height {
            let bits = pattern.get(row as usize).copied().unwrap_or(0);
            if bits == 0 {
                continue;
            }
            for col in 0..self.width {
                let mask = 0x80u8.checked_shr(col).unwrap_or(0);
                if bits & mask != 0 {
                    fb.set_pixel(
                        x.saturating_add(col as i32),
                        y.saturating_add(row as i32),
                        color,
                    );
                }
            }
        }
    }

    pub fn draw_text(&self, fb: &mut Framebuffer, text: &str, x: i32, mut y: i32, color: u32) {
        let mut cursor = x;
        for ch in text.chars() {
            if ch == '\n' {
                cursor = x;
                y = y.saturating_add(self.line_height());
                continue;
            }
            self.draw_char(fb, ch, cursor, y, color);
            cursor = cursor.saturating_add(self.advance());
        }
    }
}

/// The font drawing currently goes through: the shared default or a
/// caller-installed replacement.
#[derive(Debug, Clone, Default)]
pub enum ActiveFont {
    #[default]
    Default,
    Custom(Font),
}

impl ActiveFont {
    pub fn get(&self) -> &Font {
        match self {
            ActiveFont::Default => &*DEFAULT_FONT,
            ActiveFont::Custom(font) => font,
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::framebuffer::ColorMode;

    fn lit(fb: &Framebuffer) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for y in 0..fb.height() as i32 {
            for x in 0..fb.width() as i32 {
                if fb.pixel(x, y) != Some(&[0][..]) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_default_font_metrics() {
        let font = ActiveFont::Default;
        assert_eq!(font.get().width, 8);
        assert_eq!(font.get().height, 8);
        assert_eq!(font.get().spacing, 1);
        assert_eq!(font.get().glyph('A'), &[0x70, 0x88, 0x88, 0xF8, 0x88, 0x88, 0x88, 0x00]);
    }

    #[test]
    fn test_lowercase_renders_uppercase_glyph() {
        let font = &*DEFAULT_FONT;
        assert_eq!(font.glyph('q'), font.glyph('Q'));
    }

    #[test]
    fn test_missing_glyph_falls_back_to_space_then_question() {
        let font = &*DEFAULT_FONT;
        assert_eq!(font.glyph('~'), font.glyph(' '));

        let no_space = Font {
            width: 8,
            height: 8,
            spacing: 1,
            glyphs: [('?', vec![0xFF; 8])].into_iter().collect(),
        };
        assert_eq!(no_space.glyph('~'), &[0xFF; 8]);

        let empty = Font {
            width: 8,
            height: 8,
            spacing: 1,
            glyphs: HashMap::new(),
        };
        assert_eq!(empty.glyph('~'), &BLANK_GLYPH);
    }

    #[test]
    fn test_draw_char_sets_bits_msb_left() {
        let mut fb = Framebuffer::new(16, 16, ColorMode::Palette);
        let font = Font::try_from(FontSpec::new().glyph("I", vec![0x81, 0x40])).unwrap();

        font.draw_char(&mut fb, 'i', 2, 3, 5);

        assert_eq!(lit(&fb), vec![(2, 3), (9, 3), (3, 4)]);
        assert_eq!(fb.pixel(2, 3), Some(&[5][..]));
    }

    #[test]
    fn test_draw_text_advances_and_wraps_on_newline() {
        let mut fb = Framebuffer::new(64, 32, ColorMode::Palette);
        let font = Font::try_from(
            FontSpec::new()
                .size(3, 4)
                .spacing(2)
                .glyph("X", vec![0x80]),
        )
        .unwrap();

        font.draw_text(&mut fb, "XX\nX", 1, 2, 1);

        assert_eq!(lit(&fb), vec![(1, 2), (6, 2), (1, 8)]);
    }

    #[test]
    fn test_font_spec_defaults_and_space_synthesis() {
        let font = Font::try_from(FontSpec::new().glyph("A", vec![0xFF])).unwrap();
        assert_eq!((font.width, font.height, font.spacing), (8, 8, 1));
        assert_eq!(font.glyph(' '), &[0u8; 8]);

        let tall = Font::try_from(FontSpec::new().size(4, 12)).unwrap();
        assert_eq!(tall.glyph(' ').len(), 12);
    }

    #[test]
    fn test_font_spec_rejects_malformed() {
        assert_eq!(
            Font::try_from(FontSpec::new().size(0, 8)),
            Err(FontError::ZeroWidth)
        );
        assert_eq!(
            Font::try_from(FontSpec::new().size(8, 0)),
            Err(FontError::ZeroHeight)
        );
        assert_eq!(
            Font::try_from(FontSpec::new().glyph("AB", vec![0])),
            Err(FontError::GlyphKey("AB".to_string()))
        );
    }

    #[test]
    fn test_font_wider_than_row_byte_is_rejected() {
        assert_eq!(
            Font::try_from(FontSpec::new().size(12, 1)),
            Err(FontError::TooWide(12))
        );

        let mut fb = Framebuffer::new(32, 8, ColorMode::Palette);
        let font = Font::try_from(FontSpec::new().size(8, 1).glyph("A", vec![0x01])).unwrap();
        font.draw_char(&mut fb, 'A', 0, 0, 1);
        assert_eq!(lit(&fb), vec![(7, 0)]);
    }

    #[test]
    fn test_text_near_coordinate_limit_is_clipped() {
        let mut fb = Framebuffer::new(16, 16, ColorMode::Truecolor);
        fb.clear(0x203040);
        let before = fb.data().to_vec();

        DEFAULT_FONT.draw_char(&mut fb, 'A', i32::MAX - 3, 0, 0xFFFFFF);
        DEFAULT_FONT.draw_text(&mut fb, "AB", i32::MAX - 12, 0, 0xFFFFFF);
        DEFAULT_FONT.draw_text(&mut fb, "A\nB", 0, i32::MAX - 3, 0xFFFFFF);

        assert_eq!(fb.data(), &before[..]);
    }
}
