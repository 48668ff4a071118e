/// Pixel storage layout of a [`Framebuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// One byte per pixel, an index into the 256-entry palette.
    Palette,
    /// Four bytes per pixel, RGBA8 with alpha always 255.
    #[default]
    Truecolor,
}

impl ColorMode {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorMode::Palette => 1,
            ColorMode::Truecolor => 4,
        }
    }
}

/// Splits a packed `0xRRGGBB` color into its channels.
pub fn unpack_rgb(color: u32) -> (u8, u8, u8) {
    (
        ((color >> 16) & 0xFF) as u8,
        ((color >> 8) & 0xFF) as u8,
        (color & 0xFF) as u8,
    )
}

pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// The addressable pixel grid every drawing primitive writes into.
///
/// Writes outside `[0, width) x [0, height)` are dropped without error. The
/// `color` argument of every write is interpreted by the buffer's mode: the
/// low byte is the palette index in palette mode, the low 24 bits are
/// `0xRRGGBB` in truecolor mode.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    mode: ColorMode,
    data: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32, mode: ColorMode) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Framebuffer {
            width,
            height,
            mode,
            data: vec![0; Self::byte_len(width, height, mode)],
        }
    }

    fn byte_len(width: u32, height: u32, mode: ColorMode) -> usize {
        width as usize * height as usize * mode.bytes_per_pixel()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        Some(index * self.mode.bytes_per_pixel())
    }

    /// Bytes of the pixel at `(x, y)`: one index byte in palette mode, four
    /// RGBA bytes in truecolor mode.
    pub fn pixel(&self, x: i32, y: i32) -> Option<&[u8]> {
        let base = self.offset(x, y)?;
        Some(&self.data[base..base + self.mode.bytes_per_pixel()])
    }

    pub fn clear(&mut self, color: u32) {
        match self.mode {
            ColorMode::Palette => self.data.fill(color as u8),
            ColorMode::Truecolor => {
                let (r, g, b) = unpack_rgb(color);
                for px in self.data.chunks_exact_mut(4) {
                    px.copy_from_slice(&[r, g, b, 0xFF]);
                }
            }
        }
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        let Some(base) = self.offset(x, y) else {
            return;
        };
        match self.mode {
            ColorMode::Palette => self.data[base] = color as u8,
            ColorMode::Truecolor => {
                let (r, g, b) = unpack_rgb(color);
                self.data[base] = r;
                self.data[base + 1] = g;
                self.data[base + 2] = b;
                self.data[base + 3] = 0xFF;
            }
        }
    }

    /// Fills the `w x h` rectangle anchored at `(x, y)`. Cells off-screen are
    /// clipped one pixel at a time; non-positive spans draw nothing.
    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        for dy in 0..h.max(0) {
            for dx in 0..w.max(0) {
                self.set_pixel(x.saturating_add(dx), y.saturating_add(dy), color);
            }
        }
    }

    /// Reallocates a zeroed buffer when the dimensions change. Returns
    /// `false` (and keeps the contents) when they are unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width && height == self.height {
            return false;
        }
        log::debug!(
            "framebuffer resized {}x{} -> {}x{}",
            self.width,
            self.height,
            width,
            height
        );
        self.width = width;
        self.height = height;
        self.data = vec![0; Self::byte_len(width, height, self.mode)];
        true
    }

    /// Scales every RGB channel by `factor` (clamped to `0.0..=1.0`).
    /// Palette indices are not colors, so palette mode is left untouched.
    pub fn darken(&mut self, factor: f64) {
        if self.mode != ColorMode::Truecolor {
            return;
        }
        let factor = factor.clamp(0.0, 1.0);
        for px in self.data.chunks_exact_mut(4) {
            for channel in &mut px[..3] {
                *channel = (*channel as f64 * factor).floor() as u8;
            }
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_buffer_sizes_per_mode() {
        let palette = Framebuffer::new(10, 4, ColorMode::Palette);
        let truecolor = Framebuffer::new(10, 4, ColorMode::Truecolor);

        assert_eq!(palette.data().len(), 40);
        assert_eq!(truecolor.data().len(), 160);
    }

    #[test]
    fn test_truecolor_clear_and_set_pixel() {
        let mut fb = Framebuffer::new(320, 240, ColorMode::Truecolor);
        fb.clear(0x102030);
        assert!(
            fb.data()
                .chunks_exact(4)
                .all(|px| px == [0x10, 0x20, 0x30, 0xFF])
        );

        fb.set_pixel(5, 5, 0xFF0000);
        assert_eq!(fb.pixel(5, 5), Some(&[0xFF, 0x00, 0x00, 0xFF][..]));
        assert_eq!(fb.pixel(4, 5), Some(&[0x10, 0x20, 0x30, 0xFF][..]));
        assert_eq!(fb.pixel(6, 5), Some(&[0x10, 0x20, 0x30, 0xFF][..]));
    }

    #[test]
    fn test_palette_set_pixel_keeps_low_byte() {
        let mut fb = Framebuffer::new(8, 8, ColorMode::Palette);
        fb.set_pixel(1, 2, 0x1234);
        assert_eq!(fb.pixel(1, 2), Some(&[0x34][..]));

        fb.clear(7);
        assert!(fb.data().iter().all(|&b| b == 7));
    }

    #[test]
    fn test_out_of_bounds_writes_are_dropped() {
        let mut fb = Framebuffer::new(16, 16, ColorMode::Truecolor);
        fb.clear(0x000000);
        let before = fb.data().to_vec();

        for (x, y) in [(-1, 0), (0, -1), (16, 0), (0, 16), (i32::MIN, i32::MAX)] {
            fb.set_pixel(x, y, 0xFFFFFF);
        }

        assert_eq!(fb.data(), &before[..]);
        assert_eq!(fb.pixel(16, 0), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut fb = Framebuffer::new(12, 7, ColorMode::Truecolor);
        fb.clear(0xABCDEF);
        let once = fb.data().to_vec();
        fb.clear(0xABCDEF);
        assert_eq!(fb.data(), &once[..]);
    }

    #[test]
    fn test_draw_rect_clips_at_origin() {
        let mut fb = Framebuffer::new(320, 240, ColorMode::Truecolor);
        fb.clear(0x102030);
        fb.draw_rect(-2, -2, 5, 5, 0x00FF00);

        for y in 0..240 {
            for x in 0..320 {
                let expected: &[u8] = if x <= 2 && y <= 2 {
                    &[0x00, 0xFF, 0x00, 0xFF]
                } else {
                    &[0x10, 0x20, 0x30, 0xFF]
                };
                assert_eq!(fb.pixel(x, y), Some(expected), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_draw_rect_non_positive_span_is_noop() {
        let mut fb = Framebuffer::new(8, 8, ColorMode::Palette);
        fb.draw_rect(1, 1, 0, 4, 9);
        fb.draw_rect(1, 1, 4, -3, 9);
        fb.draw_rect(1, 1, -2, -2, 9);
        assert!(fb.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_resize_reallocates_only_on_change() {
        let mut fb = Framebuffer::new(4, 4, ColorMode::Truecolor);
        fb.clear(0xFFFFFF);

        assert!(!fb.resize(4, 4));
        assert_eq!(fb.pixel(0, 0), Some(&[0xFF, 0xFF, 0xFF, 0xFF][..]));

        assert!(fb.resize(6, 2));
        assert_eq!(fb.size(), (6, 2));
        assert_eq!(fb.data().len(), 6 * 2 * 4);
        assert!(fb.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_darken_scales_rgb_only() {
        let mut fb = Framebuffer::new(2, 1, ColorMode::Truecolor);
        fb.clear(0x804020);
        fb.darken(0.5);
        assert_eq!(fb.pixel(1, 0), Some(&[0x40, 0x20, 0x10, 0xFF][..]));
    }
}
