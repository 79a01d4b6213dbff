use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use crate::error::{PlaybackError, Result};

pub fn compress(data: &[u8]) -> Vec<u8> {
    compress_prepend_size(data)
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_size_prepended(data).map_err(|e| PlaybackError::Decompress(e.to_string()))
}
