use cutscene_core::format::{PALETTE_ENTRIES, PALETTE_SIZE};

/// Fixed 3-3-2 palette: index bits are RRRGGGBB.
pub fn rgb332_palette() -> [u8; PALETTE_SIZE] {
    let mut pal = [0u8; PALETTE_SIZE];
    for i in 0..PALETTE_ENTRIES {
        let r = (i >> 5) & 0x07;
        let g = (i >> 2) & 0x07;
        let b = i & 0x03;
        pal[i * 3] = (r * 255 / 7) as u8;
        pal[i * 3 + 1] = (g * 255 / 7) as u8;
        pal[i * 3 + 2] = (b * 255 / 3) as u8;
    }
    pal
}

/// Map RGB24 pixels onto the 3-3-2 palette, row-major.
pub fn quantize_rgb332(rgb: &[u8]) -> Vec<u8> {
    rgb.chunks_exact(3)
        .map(|p| (p[0] & 0xE0) | ((p[1] >> 3) & 0x1C) | (p[2] >> 6))
        .collect()
}
