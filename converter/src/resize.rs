use anyhow::Context;
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};

/// Scales RGB24 frames to the cutscene's pixel size.
pub struct FrameResizer {
    width: u32,
    height: u32,
    resizer: Resizer,
    options: ResizeOptions,
}

impl FrameResizer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width: width as u32,
            height: height as u32,
            resizer: Resizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        }
    }

    pub fn resize(&mut self, src: &[u8], src_width: u32, src_height: u32) -> anyhow::Result<Vec<u8>> {
        if src_width == self.width && src_height == self.height {
            return Ok(src.to_vec());
        }

        let src_image = Image::from_vec_u8(src_width, src_height, src.to_vec(), PixelType::U8x3)
            .context("failed to create source image")?;
        let mut dst_image = Image::new(self.width, self.height, PixelType::U8x3);

        self.resizer
            .resize(&src_image, &mut dst_image, &self.options)
            .context("resize failed")?;

        Ok(dst_image.into_vec())
    }
}
