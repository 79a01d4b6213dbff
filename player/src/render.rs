use cutscene_core::frame::{Frame, Rect};
use cutscene_core::render::{RenderBackend, NATIVE_PALETTE_SIZE};

const HALF_BLOCK: &str = "▄";

/// Indexed framebuffer presented to the terminal as half-block cells.
/// Each cell shows two vertical pixels: bg = top pixel, fg = bottom pixel.
pub struct TerminalScreen {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    palette: [[u8; 3]; 256],
}

impl TerminalScreen {
    pub fn new(width: u16, height: u16) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            palette: [[0; 3]; 256],
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        if y >= self.height {
            return [0, 0, 0];
        }
        self.palette[self.pixel(x, y) as usize]
    }

    /// Render the framebuffer to an ANSI byte buffer.
    /// Writes every cell, row by row, with color optimization (skip escape if same as previous).
    pub fn present(&self, buf: &mut Vec<u8>) {
        buf.clear();

        // Move cursor to top-left
        buf.extend_from_slice(b"\x1b[H");

        let mut prev_bg = [0u8; 3];
        let mut prev_fg = [0u8; 3];
        let mut first = true;

        for row in 0..self.height.div_ceil(2) {
            if row > 0 {
                buf.extend_from_slice(b"\r\n");
            }
            for col in 0..self.width {
                let bg = self.rgb(col, row * 2);
                let fg = self.rgb(col, row * 2 + 1);

                if first || bg != prev_bg {
                    write_bg(buf, bg);
                    prev_bg = bg;
                }
                if first || fg != prev_fg {
                    write_fg(buf, fg);
                    prev_fg = fg;
                }
                first = false;

                buf.extend_from_slice(HALF_BLOCK.as_bytes());
            }
        }

        // Reset colors
        buf.extend_from_slice(b"\x1b[0m");
    }
}

impl RenderBackend for TerminalScreen {
    fn draw_surface(&mut self, frame: &Frame, dest: Rect, clip: Rect, scaled: bool) {
        let scale: i32 = if scaled { 2 } else { 1 };
        let target = Rect::new(
            dest.x,
            dest.y,
            (frame.width as i32 * scale).min(i16::MAX as i32) as i16,
            (frame.height as i32 * scale).min(i16::MAX as i32) as i16,
        );
        let screen = Rect::new(0, 0, self.width as i16, self.height as i16);
        let Some(area) = target.intersect(&clip).and_then(|r| r.intersect(&screen)) else {
            return;
        };

        for ty in area.y as i32..(area.y as i32 + area.height as i32) {
            let sy = ((ty - dest.y as i32) / scale) as u16;
            for tx in area.x as i32..(area.x as i32 + area.width as i32) {
                let sx = ((tx - dest.x as i32) / scale) as u16;
                self.pixels[ty as usize * self.width + tx as usize] = frame.pixel(sx, sy);
            }
        }
    }

    fn install_palette(&mut self, palette: &[u8; NATIVE_PALETTE_SIZE], start: usize, count: usize, _flags: u32) {
        for i in start..(start + count).min(self.palette.len()) {
            let slot = &palette[(i - start) * 4..(i - start) * 4 + 3];
            self.palette[i] = [slot[0], slot[1], slot[2]];
        }
    }
}

fn write_bg(buf: &mut Vec<u8>, [r, g, b]: [u8; 3]) {
    buf.extend_from_slice(b"\x1b[48;2;");
    write_u8(buf, r);
    buf.push(b';');
    write_u8(buf, g);
    buf.push(b';');
    write_u8(buf, b);
    buf.push(b'm');
}

fn write_fg(buf: &mut Vec<u8>, [r, g, b]: [u8; 3]) {
    buf.extend_from_slice(b"\x1b[38;2;");
    write_u8(buf, r);
    buf.push(b';');
    write_u8(buf, g);
    buf.push(b';');
    write_u8(buf, b);
    buf.push(b'm');
}

/// Fast integer-to-ASCII for u8 values (0-255), no allocation.
fn write_u8(buf: &mut Vec<u8>, v: u8) {
    if v >= 100 {
        buf.push(b'0' + v / 100);
        buf.push(b'0' + (v / 10) % 10);
        buf.push(b'0' + v % 10);
    } else if v >= 10 {
        buf.push(b'0' + v / 10);
        buf.push(b'0' + v % 10);
    } else {
        buf.push(b'0' + v);
    }
}
