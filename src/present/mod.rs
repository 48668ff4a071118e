mod gpu;

use crate::error::Error;
use crate::framebuffer::{ColorMode, Framebuffer};
use crate::palette::Palette;

pub use gpu::PixelsSurface;

/// A host surface that can take a full RGBA8 frame as one texture and draw
/// it through a fixed full-screen quad.
pub trait Surface {
    /// Uploads `rgba` (exactly `width * height * 4` bytes) and draws it.
    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<(), Error>;

    /// Called when the host window or container changes physical size.
    fn resize_viewport(&mut self, _width: u32, _height: u32) -> Result<(), Error> {
        Ok(())
    }
}

/// Turns the framebuffer into an RGBA upload once per frame.
#[derive(Debug, Default)]
pub struct Presenter {
    staging: Vec<u8>,
}

impl Presenter {
    pub fn new() -> Self {
        Presenter::default()
    }

    pub fn present<S: Surface + ?Sized>(
        &mut self,
        fb: &Framebuffer,
        palette: &Palette,
        surface: &mut S,
    ) -> Result<(), Error> {
        let (width, height) = fb.size();
        match fb.mode() {
            ColorMode::Truecolor => surface.upload(width, height, fb.data()),
            ColorMode::Palette => {
                palette.expand_into(fb.data(), &mut self.staging);
                surface.upload(width, height, &self.staging)
            }
        }
    }
}

/// Keeps the most recent upload in memory. Used headless and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    width: u32,
    height: u32,
    frame: Vec<u8>,
    uploads: usize,
    viewport: Option<(u32, u32)>,
}

impl MemorySurface {
    pub fn new() -> Self {
        MemorySurface::default()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    pub fn rgba_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let base = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.frame.get(base..base + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl Surface for MemorySurface {
    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<(), Error> {
        self.width = width;
        self.height = height;
        self.frame.clear();
        self.frame.extend_from_slice(rgba);
        self.uploads += 1;
        Ok(())
    }

    fn resize_viewport(&mut self, width: u32, height: u32) -> Result<(), Error> {
        self.viewport = Some((width, height));
        Ok(())
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_truecolor_upload_matches_buffer() {
        let mut fb = Framebuffer::new(3, 2, ColorMode::Truecolor);
        fb.clear(0x010203);
        fb.set_pixel(2, 1, 0xFFEEDD);

        let mut surface = MemorySurface::new();
        Presenter::new()
            .present(&fb, &Palette::default(), &mut surface)
            .unwrap();

        assert_eq!(surface.size(), (3, 2));
        assert_eq!(surface.frame(), fb.data());
        assert_eq!(surface.rgba_at(2, 1), Some([0xFF, 0xEE, 0xDD, 0xFF]));
    }

    #[test]
    fn test_palette_upload_expands_indices() {
        let mut fb = Framebuffer::new(2, 2, ColorMode::Palette);
        fb.clear(0x20);
        fb.set_pixel(1, 0, 9);

        let mut palette = Palette::default();
        palette.set_entry(9, 0xC0, 0x10, 0x80).unwrap();

        let mut surface = MemorySurface::new();
        let mut presenter = Presenter::new();
        presenter.present(&fb, &palette, &mut surface).unwrap();

        assert_eq!(surface.frame().len(), 16);
        assert_eq!(surface.rgba_at(0, 0), Some([0x20, 0x20, 0x20, 0xFF]));
        assert_eq!(surface.rgba_at(1, 0), Some([0xC0, 0x10, 0x80, 0xFF]));
    }

    #[test]
    fn test_every_present_is_a_full_upload() {
        let fb = Framebuffer::new(4, 4, ColorMode::Palette);
        let palette = Palette::default();
        let mut surface = MemorySurface::new();
        let mut presenter = Presenter::new();

        for _ in 0..3 {
            presenter.present(&fb, &palette, &mut surface).unwrap();
        }

        assert_eq!(surface.uploads(), 3);
        assert_eq!(surface.frame().len(), 4 * 4 * 4);
    }
}
