use std::io::{Read, Seek, SeekFrom};

use crate::compress;
use crate::error::{PlaybackError, Result};
use crate::format::*;

/// One decompressed frame record, split into its palette chunk and pixel body.
#[derive(Debug)]
pub struct FramePayload {
    pub frame_type: FrameType,
    pub palette: Option<[u8; PALETTE_SIZE]>,
    pub body: Vec<u8>,
}

impl FramePayload {
    /// Interpret the body of a delta frame.
    pub fn deltas(&self) -> impl Iterator<Item = DeltaPixel> + '_ {
        self.body.chunks_exact(DeltaPixel::SIZE).map(DeltaPixel::from_bytes)
    }
}

/// Reads .csf files.
pub struct CutsceneReader<R: Read + Seek> {
    reader: R,
    pub header: CutsceneHeader,
    pub index: Vec<FrameIndexEntry>,
}

impl<R: Read + Seek> CutsceneReader<R> {
    /// Open and parse header + index.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut header_buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header_buf)?;
        let header = CutsceneHeader::from_bytes(&header_buf)?;

        let stream_len = reader.seek(SeekFrom::End(0))?;
        let index_end = (header.frame_count as u64)
            .checked_mul(FrameIndexEntry::SIZE as u64)
            .and_then(|size| size.checked_add(header.index_offset));
        if !index_end.is_some_and(|end| end <= stream_len) {
            return Err(PlaybackError::InvalidContainer(format!(
                "index of {} frames at {} overruns {stream_len}-byte stream",
                header.frame_count, header.index_offset
            )));
        }

        reader.seek(SeekFrom::Start(header.index_offset))?;
        let mut index = Vec::with_capacity(header.frame_count as usize);
        for i in 0..header.frame_count {
            let mut entry_buf = [0u8; FrameIndexEntry::SIZE];
            reader.read_exact(&mut entry_buf).map_err(|e| {
                PlaybackError::InvalidContainer(format!("truncated frame index at entry {i}: {e}"))
            })?;
            index.push(FrameIndexEntry::from_bytes(&entry_buf));
        }

        Ok(Self { reader, header, index })
    }

    /// Read and decompress a single frame by index.
    pub fn read_frame(&mut self, frame_idx: usize) -> Result<FramePayload> {
        let entry = *self
            .index
            .get(frame_idx)
            .ok_or_else(|| PlaybackError::InvalidContainer(format!("frame {frame_idx} not in index")))?;
        self.reader.seek(SeekFrom::Start(entry.offset))?;
        let mut compressed = vec![0u8; entry.compressed_size as usize];
        self.reader.read_exact(&mut compressed)?;
        let mut raw = compress::decompress(&compressed)?;

        let palette = if entry.has_palette() {
            if raw.len() < PALETTE_SIZE {
                return Err(PlaybackError::InvalidContainer(format!(
                    "frame {frame_idx} palette chunk is {} bytes",
                    raw.len()
                )));
            }
            let body = raw.split_off(PALETTE_SIZE);
            let mut pal = [0u8; PALETTE_SIZE];
            pal.copy_from_slice(&raw);
            raw = body;
            Some(pal)
        } else {
            None
        };

        if entry.frame_type == FrameType::Keyframe && raw.len() != self.header.frame_area() {
            return Err(PlaybackError::InvalidContainer(format!(
                "keyframe {frame_idx} has {} pixels, expected {}",
                raw.len(),
                self.header.frame_area()
            )));
        }

        Ok(FramePayload {
            frame_type: entry.frame_type,
            palette,
            body: raw,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.index.len()
    }

    pub fn fps(&self) -> f64 {
        self.header.fps_num as f64 / self.header.fps_den.max(1) as f64
    }
}
