//! Presentable surfaces for decoded cutscene frames.
//!
//! A surface never owns the frame it shows. It holds a [`Weak`] reference to the
//! decoder's bitmap, which stops resolving once the decoder decodes over that frame
//! or is dropped, so a stale surface draws nothing.

use std::rc::{Rc, Weak};

use crate::frame::{Frame, Rect};
use crate::render::RenderBackend;

/// Common interface of the single and doubled display variants.
///
/// Implementors only supply their [`SurfaceState`] and the way they blit it.
pub trait FrameSurface {
    fn state(&self) -> &SurfaceState;

    fn state_mut(&mut self) -> &mut SurfaceState;

    /// Blit the bound frame, if there is one to show.
    fn draw(&self, screen: &mut dyn RenderBackend);

    fn is_doubled(&self) -> bool;

    /// Alias `frame` and size the draw rect to it. The position is left alone.
    fn bind_frame(&mut self, frame: &Rc<Frame>) {
        self.state_mut().bind(frame);
    }

    fn draw_rect(&self) -> Rect {
        self.state().draw_rect
    }

    fn draw_rect_mut(&mut self) -> &mut Rect {
        &mut self.state_mut().draw_rect
    }

    fn clip_rect(&self) -> Rect {
        self.state().clip_rect
    }

    fn set_clip_rect(&mut self, clip: Rect) {
        self.state_mut().clip_rect = clip;
    }

    fn is_visible(&self) -> bool {
        self.state().visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.state_mut().visible = visible;
    }

    /// The frame this surface currently shows, if it is still alive.
    fn frame(&self) -> Option<Rc<Frame>> {
        self.state().frame.upgrade()
    }
}

/// State shared by both surface variants.
#[derive(Debug)]
pub struct SurfaceState {
    frame: Weak<Frame>,
    draw_rect: Rect,
    clip_rect: Rect,
    visible: bool,
}

impl SurfaceState {
    pub fn new(clip_rect: Rect) -> Self {
        Self {
            frame: Weak::new(),
            draw_rect: Rect::default(),
            clip_rect,
            visible: true,
        }
    }

    fn bind(&mut self, frame: &Rc<Frame>) {
        self.draw_rect.width = i16::try_from(frame.width).unwrap_or(i16::MAX);
        self.draw_rect.height = i16::try_from(frame.height).unwrap_or(i16::MAX);
        self.frame = Rc::downgrade(frame);
    }

    fn blit(&self, screen: &mut dyn RenderBackend, scaled: bool) {
        if !self.visible || self.draw_rect.is_empty() {
            return;
        }
        if let Some(frame) = self.frame.upgrade() {
            screen.draw_surface(&frame, self.draw_rect, self.clip_rect, scaled);
        }
    }
}

/// Presents frames 1:1.
#[derive(Debug)]
pub struct StandardSurface {
    state: SurfaceState,
}

impl StandardSurface {
    pub fn new(clip_rect: Rect) -> Self {
        Self {
            state: SurfaceState::new(clip_rect),
        }
    }
}

impl FrameSurface for StandardSurface {
    fn state(&self) -> &SurfaceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SurfaceState {
        &mut self.state
    }

    fn draw(&self, screen: &mut dyn RenderBackend) {
        self.state.blit(screen, false);
    }

    fn is_doubled(&self) -> bool {
        false
    }
}

/// Presents frames scaled 2x.
#[derive(Debug)]
pub struct DoubleSurface {
    state: SurfaceState,
}

impl DoubleSurface {
    pub fn new(clip_rect: Rect) -> Self {
        Self {
            state: SurfaceState::new(clip_rect),
        }
    }
}

impl FrameSurface for DoubleSurface {
    fn state(&self) -> &SurfaceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SurfaceState {
        &mut self.state
    }

    fn draw(&self, screen: &mut dyn RenderBackend) {
        self.state.blit(screen, true);
    }

    fn is_doubled(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NATIVE_PALETTE_SIZE;

    #[derive(Default)]
    struct Blits(Vec<(Rect, Rect, bool)>);

    impl RenderBackend for Blits {
        fn draw_surface(&mut self, _frame: &Frame, dest: Rect, clip: Rect, scaled: bool) {
            self.0.push((dest, clip, scaled));
        }

        fn install_palette(&mut self, _palette: &[u8; NATIVE_PALETTE_SIZE], _start: usize, _count: usize, _flags: u32) {}
    }

    #[test]
    fn bind_keeps_position() {
        let mut surface = StandardSurface::new(Rect::new(0, 0, 640, 480));
        *surface.draw_rect_mut() = Rect::new(12, 34, 0, 0);
        surface.bind_frame(&Rc::new(Frame::new(8, 4)));
        assert_eq!(surface.draw_rect(), Rect::new(12, 34, 8, 4));
    }

    #[test]
    fn draw_picks_scaling_by_variant() {
        let clip = Rect::new(0, 0, 640, 480);
        let frame = Rc::new(Frame::new(8, 4));
        let mut screen = Blits::default();

        let mut single = StandardSurface::new(clip);
        single.bind_frame(&frame);
        single.draw(&mut screen);

        let mut double = DoubleSurface::new(clip);
        double.bind_frame(&frame);
        double.draw(&mut screen);

        assert_eq!(screen.0.len(), 2);
        assert!(!screen.0[0].2);
        assert!(screen.0[1].2);
        assert_eq!(screen.0[1].1, clip);
    }

    #[test]
    fn draw_skips_hidden_unbound_or_dead_frames() {
        let mut screen = Blits::default();
        let mut surface = StandardSurface::new(Rect::new(0, 0, 640, 480));
        surface.draw(&mut screen);

        let frame = Rc::new(Frame::new(8, 4));
        surface.bind_frame(&frame);
        surface.set_visible(false);
        surface.draw(&mut screen);

        surface.set_visible(true);
        drop(frame);
        surface.draw(&mut screen);
        assert!(surface.frame().is_none());
        assert!(screen.0.is_empty());
    }

    #[test]
    fn zero_sized_frame_is_not_drawn() {
        let mut screen = Blits::default();
        let mut surface = DoubleSurface::new(Rect::new(0, 0, 640, 480));
        let frame = Rc::new(Frame::new(0, 4));
        surface.bind_frame(&frame);
        surface.draw(&mut screen);
        assert!(screen.0.is_empty());
    }

    #[test]
    fn oversized_frame_saturates_draw_rect() {
        let mut surface = DoubleSurface::new(Rect::new(0, 0, 640, 480));
        surface.bind_frame(&Rc::new(Frame::new(40000, 1)));
        assert_eq!(surface.draw_rect().width, i16::MAX);
        assert_eq!(surface.draw_rect().height, 1);
    }
}
