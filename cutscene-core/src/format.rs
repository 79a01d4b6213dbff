use crate::error::{PlaybackError, Result};

/// Number of palette entries carried by a palette chunk.
pub const PALETTE_ENTRIES: usize = 256;
/// Size of a packed RGB palette chunk.
pub const PALETTE_SIZE: usize = PALETTE_ENTRIES * 3;

/// A changed pixel in a delta frame: position + new palette index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeltaPixel {
    pub x: u16,
    pub y: u16,
    pub index: u8,
}

impl DeltaPixel {
    pub const SIZE: usize = 5; // 2 + 2 + 1

    pub fn to_bytes(&self) -> [u8; 5] {
        let xb = self.x.to_le_bytes();
        let yb = self.y.to_le_bytes();
        [xb[0], xb[1], yb[0], yb[1], self.index]
    }

    pub fn from_bytes(b: &[u8]) -> Self {
        Self {
            x: u16::from_le_bytes([b[0], b[1]]),
            y: u16::from_le_bytes([b[2], b[3]]),
            index: b[4],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameType {
    Keyframe = 0,
    Delta = 1,
}

impl FrameType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => FrameType::Keyframe,
            _ => FrameType::Delta,
        }
    }
}

/// Index entry flag: the payload starts with a 768-byte palette.
pub const FLAG_PALETTE: u8 = 0x01;

pub const MAGIC: &[u8; 4] = b"CSF1";
pub const VERSION: u16 = 1;
pub const HEADER_SIZE: usize = 64;
/// Largest width or height a frame may have; screen coordinates are `i16`.
pub const MAX_DIMENSION: u16 = i16::MAX as u16;

/// File header — fixed 64 bytes at the start of a .csf file.
#[derive(Clone, Debug)]
pub struct CutsceneHeader {
    // magic: [u8; 4] = "CSF1"
    // version: u16
    pub width: u16,
    pub height: u16,
    pub fps_num: u16,
    pub fps_den: u16,
    pub frame_count: u32,
    pub keyframe_interval: u16,
    pub index_offset: u64,
}

impl CutsceneHeader {
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4..6].copy_from_slice(&VERSION.to_le_bytes());
        buf[6..8].copy_from_slice(&self.width.to_le_bytes());
        buf[8..10].copy_from_slice(&self.height.to_le_bytes());
        buf[10..12].copy_from_slice(&self.fps_num.to_le_bytes());
        buf[12..14].copy_from_slice(&self.fps_den.to_le_bytes());
        buf[14..18].copy_from_slice(&self.frame_count.to_le_bytes());
        buf[18..20].copy_from_slice(&self.keyframe_interval.to_le_bytes());
        buf[20..28].copy_from_slice(&self.index_offset.to_le_bytes());
        // bytes 28..64 reserved
        buf
    }

    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        if &buf[0..4] != MAGIC {
            return Err(PlaybackError::InvalidContainer("invalid magic: expected CSF1".into()));
        }
        let version = u16::from_le_bytes([buf[4], buf[5]]);
        if version != VERSION {
            return Err(PlaybackError::InvalidContainer(format!(
                "unsupported version: {version}"
            )));
        }
        let width = u16::from_le_bytes([buf[6], buf[7]]);
        let height = u16::from_le_bytes([buf[8], buf[9]]);
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(PlaybackError::InvalidContainer(format!(
                "frame size {width}x{height} exceeds {MAX_DIMENSION}"
            )));
        }
        let mut offset = [0u8; 8];
        offset.copy_from_slice(&buf[20..28]);
        Ok(Self {
            width,
            height,
            fps_num: u16::from_le_bytes([buf[10], buf[11]]),
            fps_den: u16::from_le_bytes([buf[12], buf[13]]),
            frame_count: u32::from_le_bytes([buf[14], buf[15], buf[16], buf[17]]),
            keyframe_interval: u16::from_le_bytes([buf[18], buf[19]]),
            index_offset: u64::from_le_bytes(offset),
        })
    }

    /// Pixel count of one full frame.
    pub fn frame_area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// One entry in the frame index at the end of the file.
#[derive(Clone, Copy, Debug)]
pub struct FrameIndexEntry {
    pub offset: u64,
    pub compressed_size: u32,
    pub frame_type: FrameType,
    pub flags: u8,
}

impl FrameIndexEntry {
    pub const SIZE: usize = 16;

    pub fn has_palette(&self) -> bool {
        self.flags & FLAG_PALETTE != 0
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..12].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf[12] = self.frame_type as u8;
        buf[13] = self.flags;
        // bytes 14..16 reserved
        buf
    }

    pub fn from_bytes(buf: &[u8; 16]) -> Self {
        let mut offset = [0u8; 8];
        offset.copy_from_slice(&buf[0..8]);
        Self {
            offset: u64::from_le_bytes(offset),
            compressed_size: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            frame_type: FrameType::from_u8(buf[12]),
            flags: buf[13],
        }
    }
}
