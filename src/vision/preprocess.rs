use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use crate::config::{IMAGENET_MEAN, IMAGENET_STD, INPUT_SIZE};
use crate::error::BrainError;

/// Raw row-major pixel storage.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Vec<u8>),
    /// Any numeric range. `[0, 1]` is scaled up, anything else is clipped to `[0, 255]`.
    F32(Vec<f32>),
}

impl PixelData {
    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(v) => v.len(),
            PixelData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Row-major H×W×C buffer as delivered by a camera driver or bridge.
/// Shape is validated at prediction time, not at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub shape: Vec<usize>,
    pub data: PixelData,
}

impl PixelBuffer {
    pub fn new(shape: Vec<usize>, data: PixelData) -> Self {
        Self { shape, data }
    }

    pub fn rgb8(width: usize, height: usize, bytes: Vec<u8>) -> Self {
        Self::new(vec![height, width, 3], PixelData::U8(bytes))
    }

    /// Solid color frame, handy for probes and tests.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let bytes = rgb.iter().copied().cycle().take(width * height * 3).collect();
        Self::rgb8(width, height, bytes)
    }
}

#[derive(Debug, Clone)]
pub enum ImageInput {
    Pixels(PixelBuffer),
    Decoded(DynamicImage),
}

impl From<PixelBuffer> for ImageInput {
    fn from(buffer: PixelBuffer) -> Self {
        ImageInput::Pixels(buffer)
    }
}

impl From<DynamicImage> for ImageInput {
    fn from(image: DynamicImage) -> Self {
        ImageInput::Decoded(image)
    }
}

/// Normalized CHW float tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub data: Vec<f32>,
}

impl InputTensor {
    #[inline]
    pub fn at(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[(c * self.height + y) * self.width + x]
    }
}

/// Resize -> scale to [0, 1] -> per-channel mean/std normalization.
pub fn to_tensor(input: &ImageInput) -> Result<InputTensor, BrainError> {
    let rgb = match input {
        ImageInput::Pixels(buffer) => to_rgb(buffer)?,
        ImageInput::Decoded(image) => image.to_rgb8(),
    };
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(BrainError::Input(format!(
            "image has empty extent {}x{}",
            rgb.width(),
            rgb.height()
        )));
    }

    let (width, height) = INPUT_SIZE;
    let resized = if rgb.dimensions() == (width, height) {
        rgb
    } else {
        image::imageops::resize(&rgb, width, height, FilterType::Triangle)
    };

    let (w, h) = (width as usize, height as usize);
    let mut data = vec![0.0f32; 3 * h * w];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let scaled = pixel[c] as f32 / 255.0;
            data[(c * h + y) * w + x] = (scaled - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    Ok(InputTensor {
        channels: 3,
        height: h,
        width: w,
        data,
    })
}

fn to_rgb(buffer: &PixelBuffer) -> Result<RgbImage, BrainError> {
    let (height, width, channels) = match buffer.shape.as_slice() {
        [h, w, c] => (*h, *w, *c),
        shape => {
            return Err(BrainError::Input(format!(
                "image must be HWC with 3 or 4 channels, got rank {}",
                shape.len()
            )))
        }
    };
    if channels != 3 && channels != 4 {
        return Err(BrainError::Input(format!(
            "image must be HWC with 3 or 4 channels, got {} channels",
            channels
        )));
    }
    if height == 0 || width == 0 {
        return Err(BrainError::Input(format!("image has empty extent {}x{}", width, height)));
    }
    let too_large = || BrainError::Input(format!("image shape {:?} is too large", buffer.shape));
    let (w32, h32) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(too_large()),
    };
    let expected = height
        .checked_mul(width)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(too_large)?;
    if buffer.data.len() != expected {
        return Err(BrainError::Input(format!(
            "buffer holds {} values, shape {:?} needs {}",
            buffer.data.len(),
            buffer.shape,
            expected
        )));
    }

    let bytes = match &buffer.data {
        PixelData::U8(v) => v.clone(),
        PixelData::F32(v) => quantize(v),
    };

    let rgb: Vec<u8> = if channels == 4 {
        bytes.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect()
    } else {
        bytes
    };

    RgbImage::from_raw(w32, h32, rgb)
        .ok_or_else(|| BrainError::Input("pixel buffer does not fit its shape".to_string()))
}

fn quantize(values: &[f32]) -> Vec<u8> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max <= 1.0 {
        values.iter().map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8).collect()
    } else {
        values.iter().map(|v| v.clamp(0.0, 255.0) as u8).collect()
    }
}
