use base64::{prelude::BASE64_STANDARD, Engine};
use clap::ValueEnum;
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::DynamicImage;
use ndarray::{Array3, ArrayD, Axis};
use rayon::prelude::*;

use crate::error::Result;

/// Memory order of the model input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// `[batch, height, width, channels]`, as exported from Keras
    Nhwc,
    /// `[batch, channels, height, width]`
    Nchw,
}

#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub height: usize,
    pub width: usize,
    pub layout: Layout,
}

impl Default for PreprocessConfig {
    /// 224x224 NHWC, pixels scaled to `[0, 1]`.
    fn default() -> Self {
        Self {
            mean: [0.0, 0.0, 0.0],
            std: [1.0, 1.0, 1.0],
            height: 224,
            width: 224,
            layout: Layout::Nhwc,
        }
    }
}

impl PreprocessConfig {
    pub fn with_size(mut self, size: usize) -> Self {
        self.height = size;
        self.width = size;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

/// Decodes an uploaded image from raw bytes.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Decodes base64 image text, tolerating a `data:image/...;base64,` prefix and
/// embedded whitespace.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(BASE64_STANDARD.decode(cleaned)?)
}

#[derive(Debug)]
pub struct Processor {
    pub config: PreprocessConfig,
}

impl Processor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Converts to RGB8 and stretches to the configured size.
    pub fn resize(&self, x: &DynamicImage) -> Result<Image<'static>> {
        let rgb = DynamicImage::ImageRgb8(x.to_rgb8());
        let mut dst_image = Image::new(
            self.config.width as u32,
            self.config.height as u32,
            fast_image_resize::PixelType::U8x3,
        );
        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::CatmullRom));
        Resizer::new().resize(&rgb, &mut dst_image, Some(&options))?;
        Ok(dst_image)
    }

    /// Normalizes one resized RGB8 buffer into a `[H, W, C]` or `[C, H, W]` array.
    fn normalize(&self, resized: &Image<'_>) -> Array3<f32> {
        let (h, w) = (self.config.height, self.config.width);
        let buffer = resized.buffer();
        let mean = self.config.mean;
        let std = self.config.std;
        let value = |y: usize, x: usize, c: usize| {
            let pixel = buffer[(y * w + x) * 3 + c] as f32;
            (pixel / 255.0 - mean[c]) / std[c]
        };
        match self.config.layout {
            Layout::Nhwc => Array3::from_shape_fn((h, w, 3), |(y, x, c)| value(y, x, c)),
            Layout::Nchw => Array3::from_shape_fn((3, h, w), |(c, y, x)| value(y, x, c)),
        }
    }

    /// Preprocesses a batch of images in parallel and stacks them along a new
    /// leading batch axis.
    pub fn preprocess(&self, xs: &[DynamicImage]) -> Result<ArrayD<f32>> {
        let arrays: Vec<Array3<f32>> = xs
            .par_iter()
            .map(|x| -> Result<Array3<f32>> {
                let t = std::time::Instant::now();
                let resized = self.resize(x)?;
                let arr = self.normalize(&resized);
                tracing::trace!(elapsed = ?t.elapsed(), "preprocessed image");
                Ok(arr)
            })
            .collect::<Result<_>>()?;

        let views: Vec<_> = arrays.iter().map(|arr| arr.view()).collect();
        let ys = ndarray::stack(Axis(0), &views)?.into_dyn();
        Ok(ys)
    }
}
