use std::fmt;
use std::path::PathBuf;

use crate::font::FontError;

/// Errors surfaced by engine construction, presentation and asset loading.
///
/// Drawing primitives never produce these; a bad draw call is a silent
/// no-op instead.
#[derive(Debug)]
pub enum Error {
    InvalidSize { width: u32, height: u32 },
    PaletteIndex(usize),
    Font(FontError),
    Image {
        path: PathBuf,
        source: png::DecodingError,
    },
    UnsupportedImage(String),
    Pixels(pixels::Error),
    Texture(pixels::TextureError),
    Audio(String),
    EventLoop(winit::error::EventLoopError),
    Window(winit::error::OsError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidSize { width, height } => {
                write!(f, "invalid screen size {width}x{height}")
            }
            Error::PaletteIndex(index) => {
                write!(f, "palette index {index} out of range (0..=255)")
            }
            Error::Font(err) => write!(f, "invalid font: {err}"),
            Error::Image { path, .. } => write!(f, "failed to load image {}", path.display()),
            Error::UnsupportedImage(reason) => write!(f, "unsupported image: {reason}"),
            Error::Pixels(_) => write!(f, "graphics pipeline failure"),
            Error::Texture(_) => write!(f, "texture reallocation failed"),
            Error::Audio(reason) => write!(f, "audio unavailable: {reason}"),
            Error::EventLoop(_) => write!(f, "event loop failure"),
            Error::Window(_) => write!(f, "window creation failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Font(err) => Some(err),
            Error::Image { source, .. } => Some(source),
            Error::Pixels(err) => Some(err),
            Error::Texture(err) => Some(err),
            Error::EventLoop(err) => Some(err),
            Error::Window(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FontError> for Error {
    fn from(err: FontError) -> Self {
        Error::Font(err)
    }
}

impl From<pixels::Error> for Error {
    fn from(err: pixels::Error) -> Self {
        Error::Pixels(err)
    }
}

impl From<pixels::TextureError> for Error {
    fn from(err: pixels::TextureError) -> Self {
        Error::Texture(err)
    }
}

impl From<winit::error::EventLoopError> for Error {
    fn from(err: winit::error::EventLoopError) -> Self {
        Error::EventLoop(err)
    }
}

impl From<winit::error::OsError> for Error {
    fn from(err: winit::error::OsError) -> Self {
        Error::Window(err)
    }
}
