/// An 8-bit palette-indexed bitmap, row-major.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u16, y: u16) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn set_pixel(&mut self, x: u16, y: u16, index: u8) {
        let idx = y as usize * self.width as usize + x as usize;
        self.pixels[idx] = index;
    }
}

/// Screen-space rectangle. Width/height are signed so an unset rect reads as empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i16,
    pub y: i16,
    pub width: i16,
    pub height: i16,
}

impl Rect {
    pub fn new(x: i16, y: i16, width: i16, height: i16) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Overlap of two rects, or `None` if they do not touch.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = (self.x as i32).max(other.x as i32);
        let y0 = (self.y as i32).max(other.y as i32);
        let x1 = (self.x as i32 + self.width as i32).min(other.x as i32 + other.width as i32);
        let y1 = (self.y as i32 + self.height as i32).min(other.y as i32 + other.height as i32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0 as i16, y0 as i16, (x1 - x0) as i16, (y1 - y0) as i16))
    }
}
