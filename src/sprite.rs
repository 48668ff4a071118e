use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::rc::Rc;

use crate::error::Error;
use crate::framebuffer::{Framebuffer, pack_rgb};

pub const DEFAULT_SHEET: &str = "default";

/// An external image the blitter can sample. The engine only reads from it.
pub trait SpriteSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// RGBA sample at `(x, y)`, `None` outside the image.
    fn rgba_at(&self, x: u32, y: u32) -> Option<[u8; 4]>;
}

/// Owned RGBA8 image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbaImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, Error> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(Error::UnsupportedImage(format!(
                "{width}x{height} image needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(RgbaImage {
            width,
            height,
            data,
        })
    }

    pub fn load_png<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::Image {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        Self::decode_png(BufReader::new(file)).map_err(|err| match err {
            DecodeFailure::Png(source) => Error::Image {
                path: path.to_path_buf(),
                source,
            },
            DecodeFailure::Layout(reason) => Error::UnsupportedImage(reason),
        })
    }

    pub fn decode_png<R: Read>(reader: R) -> Result<Self, DecodeFailure> {
        let mut decoder = png::Decoder::new(reader);
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder.read_info().map_err(DecodeFailure::Png)?;

        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).map_err(DecodeFailure::Png)?;
        let bytes = &buf[..info.buffer_size()];

        if info.bit_depth != png::BitDepth::Eight {
            return Err(DecodeFailure::Layout(format!(
                "unexpected bit depth {:?}",
                info.bit_depth
            )));
        }

        let data: Vec<u8> = match info.color_type {
            png::ColorType::Rgba => bytes.to_vec(),
            png::ColorType::Rgb => bytes
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 0xFF])
                .collect(),
            png::ColorType::Grayscale => bytes.iter().flat_map(|&v| [v, v, v, 0xFF]).collect(),
            png::ColorType::GrayscaleAlpha => bytes
                .chunks_exact(2)
                .flat_map(|px| [px[0], px[0], px[0], px[1]])
                .collect(),
            png::ColorType::Indexed => {
                return Err(DecodeFailure::Layout(
                    "indexed image was not expanded".to_string(),
                ));
            }
        };

        Ok(RgbaImage {
            width: info.width,
            height: info.height,
            data,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Why an in-memory PNG could not become an `RgbaImage`.
#[derive(Debug)]
pub enum DecodeFailure {
    Png(png::DecodingError),
    Layout(String),
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFailure::Png(err) => write!(f, "png decode failed: {err}"),
            DecodeFailure::Layout(reason) => write!(f, "unsupported pixel layout: {reason}"),
        }
    }
}

impl std::error::Error for DecodeFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeFailure::Png(err) => Some(err),
            DecodeFailure::Layout(_) => None,
        }
    }
}

impl SpriteSource for RgbaImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn rgba_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let base = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[base..base + 4];
        Some([px[0], px[1], px[2], px[3]])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub name: String,
}

/// Named sprite sources. Registering an existing name replaces it.
#[derive(Default)]
pub struct SpriteSheets {
    sheets: HashMap<String, Rc<dyn SpriteSource>>,
}

impl SpriteSheets {
    pub fn new() -> Self {
        SpriteSheets::default()
    }

    pub fn register(&mut self, name: impl Into<String>, source: Rc<dyn SpriteSource>) {
        let name = name.into();
        log::debug!(
            "sprite sheet {name:?} registered ({}x{})",
            source.width(),
            source.height()
        );
        self.sheets.insert(name, source);
    }

    pub fn get(&self, name: &str) -> Option<&Rc<dyn SpriteSource>> {
        self.sheets.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Rc<dyn SpriteSource>> {
        self.sheets.remove(name)
    }

    pub fn clear(&mut self) {
        self.sheets.clear();
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn image_info(&self, name: &str) -> Option<ImageInfo> {
        let source = self.sheets.get(name)?;
        Some(ImageInfo {
            width: source.width(),
            height: source.height(),
            name: name.to_string(),
        })
    }
}

/// Copies the `sw x sh` rectangle at `(sx, sy)` of `source` to `(dx, dy)`.
///
/// Samples with alpha 0, including those outside the source image, are
/// skipped; every other sample overwrites the destination with its RGB.
#[allow(clippy::too_many_arguments)]
pub fn blit_sub(
    fb: &mut Framebuffer,
    source: &dyn SpriteSource,
    sx: i32,
    sy: i32,
    sw: i32,
    sh: i32,
    dx: i32,
    dy: i32,
) {
    for y in 0..sh.max(0) {
        for x in 0..sw.max(0) {
            let (src_x, src_y) = (sx.saturating_add(x), sy.saturating_add(y));
            if src_x < 0 || src_y < 0 {
                continue;
            }
            let Some([r, g, b, a]) = source.rgba_at(src_x as u32, src_y as u32) else {
                continue;
            };
            if a > 0 {
                fb.set_pixel(dx.saturating_add(x), dy.saturating_add(y), pack_rgb(r, g, b));
            }
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::framebuffer::ColorMode;

    // 2x2: red opaque, green transparent / blue half alpha, white opaque
    fn checker() -> RgbaImage {
        RgbaImage::new(
            2,
            2,
            vec![
                0xFF, 0x00, 0x00, 0xFF, //
                0x00, 0xFF, 0x00, 0x00, //
                0x00, 0x00, 0xFF, 0x80, //
                0xFF, 0xFF, 0xFF, 0xFF,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_image_rejects_wrong_length() {
        assert!(matches!(
            RgbaImage::new(2, 2, vec![0; 15]),
            Err(Error::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_blit_skips_transparent_and_copies_rgb() {
        let mut fb = Framebuffer::new(4, 4, ColorMode::Truecolor);
        fb.clear(0x123456);

        blit_sub(&mut fb, &checker(), 0, 0, 2, 2, 1, 1);

        assert_eq!(fb.pixel(1, 1), Some(&[0xFF, 0x00, 0x00, 0xFF][..]));
        assert_eq!(fb.pixel(2, 1), Some(&[0x12, 0x34, 0x56, 0xFF][..]));
        assert_eq!(fb.pixel(1, 2), Some(&[0x00, 0x00, 0xFF, 0xFF][..]));
        assert_eq!(fb.pixel(2, 2), Some(&[0xFF, 0xFF, 0xFF, 0xFF][..]));
        assert_eq!(fb.pixel(0, 0), Some(&[0x12, 0x34, 0x56, 0xFF][..]));
    }

    #[test]
    fn test_blit_sub_rectangle_and_clipping() {
        let mut fb = Framebuffer::new(4, 4, ColorMode::Truecolor);
        fb.clear(0x000000);

        // bottom-right source pixel only, placed in the corner
        blit_sub(&mut fb, &checker(), 1, 1, 1, 1, 3, 3);
        assert_eq!(fb.pixel(3, 3), Some(&[0xFF, 0xFF, 0xFF, 0xFF][..]));

        // source rectangle hanging off the image reads as transparent
        let before = fb.data().to_vec();
        blit_sub(&mut fb, &checker(), 2, -3, 3, 3, 0, 0);
        assert_eq!(fb.data(), &before[..]);

        // destination off-screen is clipped per pixel
        blit_sub(&mut fb, &checker(), 0, 0, 2, 2, -1, -1);
        assert_eq!(fb.pixel(0, 0), Some(&[0xFF, 0xFF, 0xFF, 0xFF][..]));
    }

    #[test]
    fn test_sheets_last_registration_wins() {
        let mut sheets = SpriteSheets::new();
        sheets.register("hero", Rc::new(checker()));
        sheets.register("hero", Rc::new(RgbaImage::new(1, 3, vec![0; 12]).unwrap()));

        assert_eq!(sheets.len(), 1);
        assert_eq!(
            sheets.image_info("hero"),
            Some(ImageInfo {
                width: 1,
                height: 3,
                name: "hero".to_string()
            })
        );
        assert_eq!(sheets.image_info("villain"), None);
    }

    #[test]
    fn test_decode_png_rgb_adds_opaque_alpha() {
        let mut encoded = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut encoded, 2, 1);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[1, 2, 3, 4, 5, 6]).unwrap();
        }

        let image = RgbaImage::decode_png(&encoded[..]).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.rgba_at(1, 0), Some([4, 5, 6, 0xFF]));
        assert_eq!(image.rgba_at(2, 0), None);
    }

    #[test]
    fn test_decode_failure_reports_cause() {
        let err = RgbaImage::decode_png(&b"not a png"[..]).unwrap_err();
        assert!(matches!(err, DecodeFailure::Png(_)));
        assert!(err.to_string().starts_with("png decode failed"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
