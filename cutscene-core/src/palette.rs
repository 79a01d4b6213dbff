use crate::format::{PALETTE_ENTRIES, PALETTE_SIZE};
use crate::render::{RenderBackend, NATIVE_PALETTE_SIZE};

/// Expand packed RGB entries into RGBX slots. The fourth byte of each slot is not written.
pub fn expand_palette(src: &[u8; PALETTE_SIZE], dst: &mut [u8; NATIVE_PALETTE_SIZE]) {
    for (rgb, slot) in src.chunks_exact(3).zip(dst.chunks_exact_mut(4)) {
        slot[..3].copy_from_slice(rgb);
    }
}

/// Pushes decoder palettes to the screen as full 256-entry refreshes.
#[derive(Debug)]
pub struct PaletteBridge {
    buffer: [u8; NATIVE_PALETTE_SIZE],
}

impl PaletteBridge {
    pub fn new() -> Self {
        Self {
            buffer: [0; NATIVE_PALETTE_SIZE],
        }
    }

    pub fn apply(&mut self, src: &[u8; PALETTE_SIZE], screen: &mut dyn RenderBackend) {
        expand_palette(src, &mut self.buffer);
        screen.install_palette(&self.buffer, 0, PALETTE_ENTRIES, 0);
    }

    /// Last palette pushed, in native layout.
    pub fn native(&self) -> &[u8; NATIVE_PALETTE_SIZE] {
        &self.buffer
    }
}

impl Default for PaletteBridge {
    fn default() -> Self {
        Self::new()
    }
}
