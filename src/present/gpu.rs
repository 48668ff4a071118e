use std::sync::Arc;

use pixels::wgpu::Color;
use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use winit::window::Window;

use super::Surface;
use crate::error::Error;

/// GPU presentation through `pixels`.
///
/// Building the `Pixels` context compiles the scaling shader pair, creates
/// the static full-screen quad and allocates the texture with nearest
/// filtering and clamp-to-edge addressing. Any of those failing is a
/// construction error; there is no partially usable surface.
pub struct PixelsSurface {
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl PixelsSurface {
    pub fn new(window: Arc<Window>, width: u32, height: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, window);
        let pixels = PixelsBuilder::new(width, height, surface_texture)
            .clear_color(Color::BLACK)
            .build()?;

        log::info!(
            "presentation pipeline ready: {width}x{height} texture on {}x{} surface",
            size.width,
            size.height
        );

        Ok(PixelsSurface {
            pixels,
            width,
            height,
        })
    }
}

impl Surface for PixelsSurface {
    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<(), Error> {
        if (width, height) != (self.width, self.height) {
            self.pixels.resize_buffer(width, height)?;
            self.width = width;
            self.height = height;
            log::debug!("texture reallocated at {width}x{height}");
        }

        let frame = self.pixels.frame_mut();
        if frame.len() != rgba.len() {
            return Err(Error::InvalidSize { width, height });
        }
        frame.copy_from_slice(rgba);
        self.pixels.render()?;
        Ok(())
    }

    fn resize_viewport(&mut self, width: u32, height: u32) -> Result<(), Error> {
        self.pixels.resize_surface(width, height)?;
        Ok(())
    }
}
