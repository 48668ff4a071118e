use crate::error::Error;

pub const PALETTE_SIZE: usize = 256;

/// 256-entry RGB lookup table used to expand palette-mode pixels at
/// present time. Defaults to a grayscale ramp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [(u8, u8, u8); PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        Palette::grayscale()
    }
}

impl Palette {
    pub fn grayscale() -> Self {
        let mut entries = [(0, 0, 0); PALETTE_SIZE];
        for (i, entry) in entries.iter_mut().enumerate() {
            let level = i as u8;
            *entry = (level, level, level);
        }
        Palette { entries }
    }

    pub fn entry(&self, index: u8) -> (u8, u8, u8) {
        self.entries[index as usize]
    }

    pub fn set_entry(&mut self, index: usize, r: u8, g: u8, b: u8) -> Result<(), Error> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(Error::PaletteIndex(index))?;
        *entry = (r, g, b);
        Ok(())
    }

    /// Expands palette indices into RGBA8, alpha forced to 255. `rgba` is
    /// resized to exactly four bytes per index.
    pub fn expand_into(&self, indices: &[u8], rgba: &mut Vec<u8>) {
        rgba.resize(indices.len() * 4, 0);
        for (&index, px) in indices.iter().zip(rgba.chunks_exact_mut(4)) {
            let (r, g, b) = self.entries[index as usize];
            px.copy_from_slice(&[r, g, b, 0xFF]);
        }
    }
}
