//! Cutscene playback controller.
//!
//! [`VideoPlayer`] owns one decoder (which owns its stream), one surface and one
//! palette bridge. The host calls [`VideoPlayer::update`] once per tick to decode the
//! next frame, and [`VideoPlayer::draw`] from its render pass.

use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::decoder::{CutsceneDecoder, VideoDecoder};
use crate::error::Result;
use crate::frame::Rect;
use crate::palette::PaletteBridge;
use crate::render::{DisplayConfig, RenderBackend};
use crate::resource::ResourceManager;
use crate::surface::{DoubleSurface, FrameSurface, StandardSurface};

/// Message sent once when a non-looping cutscene runs out of frames.
pub const END_OF_PLAYBACK: u32 = 0x3002;

static NEXT_PLAYER_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a player, carried by the messages it sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlayerId(u32);

impl PlayerId {
    fn next() -> Self {
        Self(NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Receives playback messages. Called synchronously from [`VideoPlayer::update`].
pub trait PlaybackListener {
    fn send_message(&mut self, message: u32, param: u32, sender: PlayerId);
}

pub type DecoderFactory = Box<dyn Fn() -> Box<dyn VideoDecoder>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Present frames through a 2x surface. Fixed for the player's lifetime.
    pub double_surface: bool,
    pub display: DisplayConfig,
}

pub struct VideoPlayer {
    id: PlayerId,
    resources: Rc<dyn ResourceManager>,
    config: PlayerConfig,
    listener: Option<Box<dyn PlaybackListener>>,
    new_decoder: DecoderFactory,

    file_hash: u32,
    keep_last_frame: bool,
    decoder: Option<Box<dyn VideoDecoder>>,
    palette: Option<PaletteBridge>,
    surface: Option<Box<dyn FrameSurface>>,

    first_frame_pending: bool,
    draw_pos: Option<(i16, i16)>,
    explicit_pos: bool,
    ended: bool,
    dirty: bool,
}

impl VideoPlayer {
    pub fn new(
        resources: Rc<dyn ResourceManager>,
        config: PlayerConfig,
        listener: Option<Box<dyn PlaybackListener>>,
    ) -> Self {
        Self::with_decoder_factory(
            resources,
            config,
            listener,
            Box::new(|| Box::new(CutsceneDecoder::new())),
        )
    }

    pub fn with_decoder_factory(
        resources: Rc<dyn ResourceManager>,
        config: PlayerConfig,
        listener: Option<Box<dyn PlaybackListener>>,
        new_decoder: DecoderFactory,
    ) -> Self {
        Self {
            id: PlayerId::next(),
            resources,
            config,
            listener,
            new_decoder,
            file_hash: 0,
            keep_last_frame: false,
            decoder: None,
            palette: None,
            surface: None,
            first_frame_pending: false,
            draw_pos: None,
            explicit_pos: false,
            ended: false,
            dirty: false,
        }
    }

    /// Start playing `file_hash`, replacing whatever was open.
    ///
    /// With `keep_last_frame` the cutscene loops; otherwise it stops on its last frame
    /// and sends [`END_OF_PLAYBACK`]. On error the player is left closed.
    pub fn open(&mut self, file_hash: u32, keep_last_frame: bool) -> Result<()> {
        log::debug!("open {file_hash:08X} (keep_last_frame: {keep_last_frame})");

        self.close();
        self.file_hash = file_hash;
        self.keep_last_frame = keep_last_frame;

        let decoder = self.load_decoder()?;
        let clip = self.config.display.screen_rect();
        let surface: Box<dyn FrameSurface> = if self.config.double_surface {
            Box::new(DoubleSurface::new(clip))
        } else {
            Box::new(StandardSurface::new(clip))
        };

        self.decoder = Some(decoder);
        self.palette = Some(PaletteBridge::new());
        self.surface = Some(surface);
        if !self.explicit_pos {
            self.draw_pos = None;
        }
        self.first_frame_pending = true;
        self.ended = false;
        self.dirty = false;
        Ok(())
    }

    /// Release decoder (and its stream), palette and surface, in that order.
    pub fn close(&mut self) {
        if self.decoder.is_some() || self.surface.is_some() {
            log::debug!("close {:08X}", self.file_hash);
        }
        drop(self.decoder.take());
        drop(self.palette.take());
        drop(self.surface.take());
        self.first_frame_pending = false;
        self.ended = false;
        self.dirty = false;
    }

    /// Restart the current cutscene from a freshly opened stream.
    ///
    /// Surface, palette and draw position survive. A closed player is left as is; a
    /// player whose stream cannot be reopened is closed.
    pub fn rewind(&mut self) -> Result<()> {
        if self.decoder.is_none() {
            return Ok(());
        }
        log::debug!("rewind {:08X}", self.file_hash);
        drop(self.decoder.take());
        self.first_frame_pending = true;
        match self.load_decoder() {
            Ok(decoder) => {
                self.decoder = Some(decoder);
                Ok(())
            }
            Err(e) => {
                log::warn!("rewind {:08X} failed: {e}", self.file_hash);
                self.close();
                Err(e)
            }
        }
    }

    fn load_decoder(&self) -> Result<Box<dyn VideoDecoder>> {
        let stream = self.resources.create_stream(self.file_hash)?;
        let mut decoder = (self.new_decoder)();
        decoder.load_stream(stream)?;
        Ok(decoder)
    }

    /// Per-tick step: decode one frame, loop, or report the end of playback.
    pub fn update(&mut self, screen: &mut dyn RenderBackend) -> Result<()> {
        let Some(decoder) = self.decoder.as_ref() else {
            return Ok(());
        };
        log::trace!("update {:08X} frame {}", self.file_hash, decoder.cur_frame());

        if !decoder.end_of_video() {
            self.advance_frame(screen)?;
        } else if !self.keep_last_frame {
            if !self.ended {
                self.ended = true;
                log::debug!("end of playback {:08X}", self.file_hash);
                if let Some(listener) = self.listener.as_mut() {
                    listener.send_message(END_OF_PLAYBACK, 0, self.id);
                }
            }
        } else {
            self.rewind()?;
            let has_frames = self.decoder.as_ref().is_some_and(|d| !d.end_of_video());
            if has_frames {
                self.advance_frame(screen)?;
            } else {
                log::warn!("cutscene {:08X} has no frames to loop", self.file_hash);
            }
        }
        Ok(())
    }

    fn advance_frame(&mut self, screen: &mut dyn RenderBackend) -> Result<()> {
        let (Some(decoder), Some(surface)) = (self.decoder.as_mut(), self.surface.as_mut()) else {
            return Ok(());
        };

        let frame = decoder.decode_next_frame()?;
        surface.bind_frame(&frame);

        if self.first_frame_pending {
            let (x, y) = match self.draw_pos {
                Some(pos) => pos,
                None => {
                    let pos = centered(&self.config, frame.width, frame.height);
                    self.draw_pos = Some(pos);
                    pos
                }
            };
            let rect = surface.draw_rect_mut();
            rect.x = x;
            rect.y = y;
            self.first_frame_pending = false;
        }

        self.dirty = true;

        if decoder.has_dirty_palette() {
            if let Some(bridge) = self.palette.as_mut() {
                bridge.apply(decoder.palette(), screen);
            }
        }
        Ok(())
    }

    /// Render the current frame, if any.
    pub fn draw(&self, screen: &mut dyn RenderBackend) {
        if let Some(surface) = self.surface.as_ref() {
            surface.draw(screen);
        }
    }

    /// Place the cutscene explicitly. A negative coordinate re-enables auto-centering.
    pub fn set_draw_position(&mut self, x: i16, y: i16) {
        if x >= 0 && y >= 0 {
            self.draw_pos = Some((x, y));
            self.explicit_pos = true;
        } else {
            self.draw_pos = None;
            self.explicit_pos = false;
        }
        if let Some(surface) = self.surface.as_mut() {
            let rect = surface.draw_rect_mut();
            rect.x = x;
            rect.y = y;
        }
    }

    pub fn draw_position(&self) -> Option<(i16, i16)> {
        self.draw_pos
    }

    pub fn set_visible(&mut self, visible: bool) {
        if let Some(surface) = self.surface.as_mut() {
            surface.set_visible(visible);
        }
    }

    pub fn set_clip_rect(&mut self, clip: Rect) {
        if let Some(surface) = self.surface.as_mut() {
            surface.set_clip_rect(clip);
        }
    }

    pub fn surface(&self) -> Option<&dyn FrameSurface> {
        self.surface.as_deref()
    }

    pub fn frame_count(&self) -> u32 {
        self.decoder.as_ref().map(|d| d.frame_count()).unwrap_or(0)
    }

    pub fn frame_number(&self) -> u32 {
        self.decoder.as_ref().map(|d| d.cur_frame()).unwrap_or(0)
    }

    pub fn frame_rate(&self) -> f64 {
        self.decoder.as_ref().map(|d| d.frame_rate()).unwrap_or(0.0)
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn file_hash(&self) -> u32 {
        self.file_hash
    }

    pub fn is_open(&self) -> bool {
        self.decoder.is_some()
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    /// Consume the redraw flag set by the last decoded frame.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Auto-placement for a frame whose position was never set.
fn centered(config: &PlayerConfig, width: u16, height: u16) -> (i16, i16) {
    let display = &config.display;
    let (w, h) = (width as i32, height as i32);
    let (x, y) = if config.double_surface {
        (display.double_width as i32 - w, display.double_height as i32 - h)
    } else {
        ((display.screen_width as i32 - w) / 2, (display.screen_height as i32 - h) / 2)
    };
    (clamp_coord(x), clamp_coord(y))
}

fn clamp_coord(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
