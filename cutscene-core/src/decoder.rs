use std::rc::Rc;

use crate::decode::CutsceneReader;
use crate::error::{PlaybackError, Result};
use crate::format::{FrameType, PALETTE_SIZE};
use crate::frame::Frame;
use crate::resource::ByteStream;

/// Sequential frame source the player drives one step per tick.
///
/// The decoder owns the stream handed to [`load_stream`](Self::load_stream) and the
/// bitmap it returns from [`decode_next_frame`](Self::decode_next_frame). Callers may
/// hold the returned `Rc` only until the next decode; surfaces keep a `Weak` instead.
pub trait VideoDecoder {
    fn load_stream(&mut self, stream: Box<dyn ByteStream>) -> Result<()>;

    fn decode_next_frame(&mut self) -> Result<Rc<Frame>>;

    fn end_of_video(&self) -> bool;

    fn frame_count(&self) -> u32;

    /// Index of the most recently decoded frame; 0 before the first decode.
    fn cur_frame(&self) -> u32;

    /// True if the last decoded frame changed the palette.
    fn has_dirty_palette(&self) -> bool;

    fn palette(&self) -> &[u8; PALETTE_SIZE];

    fn width(&self) -> u16;

    fn height(&self) -> u16;

    /// Nominal playback rate in frames per second; 0 if unknown.
    fn frame_rate(&self) -> f64;
}

/// Decoder for .csf cutscene containers.
pub struct CutsceneDecoder {
    reader: Option<CutsceneReader<Box<dyn ByteStream>>>,
    frame: Rc<Frame>,
    palette: [u8; PALETTE_SIZE],
    dirty_palette: bool,
    next_frame: u32,
}

impl CutsceneDecoder {
    pub fn new() -> Self {
        Self {
            reader: None,
            frame: Rc::new(Frame::default()),
            palette: [0; PALETTE_SIZE],
            dirty_palette: false,
            next_frame: 0,
        }
    }
}

impl Default for CutsceneDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoDecoder for CutsceneDecoder {
    fn load_stream(&mut self, stream: Box<dyn ByteStream>) -> Result<()> {
        let reader = CutsceneReader::new(stream)?;
        log::debug!(
            "loaded cutscene {}x{}, {} frames",
            reader.header.width,
            reader.header.height,
            reader.frame_count()
        );
        self.frame = Rc::new(Frame::new(reader.header.width, reader.header.height));
        self.reader = Some(reader);
        self.palette = [0; PALETTE_SIZE];
        self.dirty_palette = false;
        self.next_frame = 0;
        Ok(())
    }

    fn decode_next_frame(&mut self) -> Result<Rc<Frame>> {
        if self.end_of_video() {
            return Err(PlaybackError::EndOfStream);
        }
        let reader = self.reader.as_mut().ok_or(PlaybackError::EndOfStream)?;
        let payload = reader.read_frame(self.next_frame as usize)?;

        self.dirty_palette = false;
        if let Some(pal) = payload.palette {
            self.palette = pal;
            self.dirty_palette = true;
        }

        // Only weak references may be outstanding here, so this moves the bitmap
        // and leaves surfaces bound to the previous frame dangling.
        let frame = Rc::make_mut(&mut self.frame);
        match payload.frame_type {
            FrameType::Keyframe => frame.pixels.copy_from_slice(&payload.body),
            FrameType::Delta => {
                for d in payload.deltas() {
                    if d.x < frame.width && d.y < frame.height {
                        frame.set_pixel(d.x, d.y, d.index);
                    }
                }
            }
        }

        self.next_frame += 1;
        Ok(Rc::clone(&self.frame))
    }

    fn end_of_video(&self) -> bool {
        self.next_frame >= self.frame_count()
    }

    fn frame_count(&self) -> u32 {
        self.reader.as_ref().map(|r| r.frame_count() as u32).unwrap_or(0)
    }

    fn cur_frame(&self) -> u32 {
        self.next_frame.saturating_sub(1)
    }

    fn has_dirty_palette(&self) -> bool {
        self.dirty_palette
    }

    fn palette(&self) -> &[u8; PALETTE_SIZE] {
        &self.palette
    }

    fn width(&self) -> u16 {
        self.frame.width
    }

    fn height(&self) -> u16 {
        self.frame.height
    }

    fn frame_rate(&self) -> f64 {
        self.reader.as_ref().map(|r| r.fps()).unwrap_or(0.0)
    }
}
