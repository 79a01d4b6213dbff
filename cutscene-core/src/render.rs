use crate::frame::{Frame, Rect};

/// Size of a palette in the backend's native RGBX layout.
pub const NATIVE_PALETTE_SIZE: usize = 1024;

/// Screen the player presents into.
pub trait RenderBackend {
    /// Blit `frame` at `dest`, clipped to `clip`. `scaled` blits at 2x.
    fn draw_surface(&mut self, frame: &Frame, dest: Rect, clip: Rect, scaled: bool);

    /// Install `count` RGBX entries from `palette` starting at palette index `start`.
    fn install_palette(&mut self, palette: &[u8; NATIVE_PALETTE_SIZE], start: usize, count: usize, flags: u32);
}

/// Canvas sizes used to center cutscenes on their first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    pub screen_width: i16,
    pub screen_height: i16,
    /// Reference canvas for the doubled surface.
    pub double_width: i16,
    pub double_height: i16,
}

impl DisplayConfig {
    pub const fn for_screen(screen_width: i16, screen_height: i16) -> Self {
        Self {
            screen_width,
            screen_height,
            double_width: screen_width / 2,
            double_height: screen_height / 2,
        }
    }

    pub fn screen_rect(&self) -> Rect {
        Rect::new(0, 0, self.screen_width, self.screen_height)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::for_screen(640, 480)
    }
}
