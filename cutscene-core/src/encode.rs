use std::io::{Seek, SeekFrom, Write};

use crate::compress;
use crate::format::*;

/// Writes .csf files incrementally.
pub struct CutsceneWriter<W: Write + Seek> {
    writer: W,
    header: CutsceneHeader,
    index: Vec<FrameIndexEntry>,
}

impl<W: Write + Seek> CutsceneWriter<W> {
    /// Create a new writer. Writes a placeholder header immediately.
    pub fn new(mut writer: W, width: u16, height: u16, fps: u16, keyframe_interval: u16) -> anyhow::Result<Self> {
        anyhow::ensure!(
            width <= MAX_DIMENSION && height <= MAX_DIMENSION,
            "frame size {width}x{height} exceeds {MAX_DIMENSION}"
        );
        let header = CutsceneHeader {
            width,
            height,
            fps_num: fps,
            fps_den: 1,
            frame_count: 0,
            keyframe_interval,
            index_offset: 0,
        };
        writer.write_all(&header.to_bytes())?;
        Ok(Self {
            writer,
            header,
            index: Vec::new(),
        })
    }

    /// Write a keyframe (full grid of palette indices, row-major).
    pub fn write_keyframe(&mut self, pixels: &[u8], palette: Option<&[u8; PALETTE_SIZE]>) -> anyhow::Result<()> {
        anyhow::ensure!(
            pixels.len() == self.header.frame_area(),
            "keyframe has {} pixels, expected {}",
            pixels.len(),
            self.header.frame_area()
        );
        self.write_frame(FrameType::Keyframe, pixels, palette)
    }

    /// Write a delta frame (list of changed pixels).
    pub fn write_delta(&mut self, deltas: &[DeltaPixel], palette: Option<&[u8; PALETTE_SIZE]>) -> anyhow::Result<()> {
        let mut raw = Vec::with_capacity(deltas.len() * DeltaPixel::SIZE);
        for d in deltas {
            anyhow::ensure!(
                d.x < self.header.width && d.y < self.header.height,
                "delta pixel ({}, {}) outside {}x{} frame",
                d.x,
                d.y,
                self.header.width,
                self.header.height
            );
            raw.extend_from_slice(&d.to_bytes());
        }
        self.write_frame(FrameType::Delta, &raw, palette)
    }

    fn write_frame(&mut self, frame_type: FrameType, body: &[u8], palette: Option<&[u8; PALETTE_SIZE]>) -> anyhow::Result<()> {
        let mut raw = Vec::with_capacity(PALETTE_SIZE + body.len());
        let mut flags = 0u8;
        if let Some(pal) = palette {
            raw.extend_from_slice(pal);
            flags |= FLAG_PALETTE;
        }
        raw.extend_from_slice(body);

        let compressed = compress::compress(&raw);
        let offset = self.writer.stream_position()?;
        self.writer.write_all(&compressed)?;

        self.index.push(FrameIndexEntry {
            offset,
            compressed_size: compressed.len() as u32,
            frame_type,
            flags,
        });
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.index.len()
    }

    /// Finalize: write frame index, update header, flush.
    pub fn finish(mut self) -> anyhow::Result<W> {
        let index_offset = self.writer.stream_position()?;
        for entry in &self.index {
            self.writer.write_all(&entry.to_bytes())?;
        }

        self.header.frame_count = self.index.len() as u32;
        self.header.index_offset = index_offset;

        // Seek back and rewrite header
        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_all(&self.header.to_bytes())?;

        self.writer.seek(SeekFrom::End(0))?;
        self.writer.flush()?;

        Ok(self.writer)
    }
}
