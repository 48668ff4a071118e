pub use crate::framebuffer::ColorMode;

pub const DEFAULT_WIDTH: u32 = 320;
pub const DEFAULT_HEIGHT: u32 = 240;

/// Construction options. `width`/`height` are the minimum internal
/// resolution; expandable axes may grow past them to fill the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
    pub expandable_width: bool,
    pub expandable_height: bool,
    pub show_startup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            mode: ColorMode::Truecolor,
            expandable_width: false,
            expandable_height: false,
            show_startup: true,
        }
    }
}

impl Config {
    pub fn min_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Internal resolution for a container of `container` logical pixels.
    pub fn internal_resolution(&self, container: (u32, u32)) -> (u32, u32) {
        let (min_w, min_h) = (self.width as f64, self.height as f64);
        let (cw, ch) = (container.0 as f64, container.1 as f64);

        match (self.expandable_width, self.expandable_height) {
            (true, true) => {
                let scale = (cw / min_w).min(ch / min_h);
                if scale >= 1.0 {
                    ((min_w * scale).floor() as u32, (min_h * scale).floor() as u32)
                } else {
                    self.min_size()
                }
            }
            (true, false) => {
                let scale = (ch / min_h).max(1.0);
                let width = ((cw / scale).floor() as u32).max(self.width);
                (width, self.height)
            }
            (false, true) => {
                let scale = (cw / min_w).max(1.0);
                let height = ((ch / scale).floor() as u32).max(self.height);
                (self.width, height)
            }
            (false, false) => self.min_size(),
        }
    }
}
