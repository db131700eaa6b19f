//! In-memory RGB rasters and the bilinear sampler.
//!
//! Panoramas are processed as 3-channel RGB at either 8 or 16 bits per
//! channel. Deeper or float sources are carried as 16-bit so that lossless
//! intermediates (TIFF, PNG) do not lose precision between the two pipelines.

use image::{ColorType, DynamicImage, ImageBuffer, Pixel, Rgb, RgbImage};

/// 16-bit RGB image buffer.
pub type Rgb16Image = ImageBuffer<Rgb<u16>, Vec<u16>>;

/// RGB image buffer generic over the channel type.
pub type Plane<T> = ImageBuffer<Rgb<T>, Vec<T>>;

/// A channel sample type the projection kernels can read and write.
pub trait Channel: image::Primitive + Send + Sync + 'static {
    fn to_f64(self) -> f64;

    /// Round and saturate a filtered value back into the channel range.
    fn from_f64(value: f64) -> Self;
}

impl Channel for u8 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value.round().clamp(0.0, u8::MAX as f64) as u8
    }
}

impl Channel for u16 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value.round().clamp(0.0, u16::MAX as f64) as u16
    }
}

/// A decoded RGB image at its working bit depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    Rgb8(RgbImage),
    Rgb16(Rgb16Image),
}

impl Raster {
    /// Convert a decoded image to RGB, dropping alpha.
    ///
    /// Anything deeper than 8 bits per channel becomes 16-bit.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        match img.color() {
            ColorType::L16
            | ColorType::La16
            | ColorType::Rgb16
            | ColorType::Rgba16
            | ColorType::Rgb32F
            | ColorType::Rgba32F => Raster::Rgb16(img.into_rgb16()),
            _ => Raster::Rgb8(img.into_rgb8()),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Raster::Rgb8(buf) => buf.dimensions(),
            Raster::Rgb16(buf) => buf.dimensions(),
        }
    }

    pub fn is_high_depth(&self) -> bool {
        matches!(self, Raster::Rgb16(_))
    }

    pub fn into_rgb8(self) -> RgbImage {
        match self {
            Raster::Rgb8(buf) => buf,
            Raster::Rgb16(buf) => DynamicImage::ImageRgb16(buf).into_rgb8(),
        }
    }

    pub fn into_rgb16(self) -> Rgb16Image {
        match self {
            Raster::Rgb8(buf) => DynamicImage::ImageRgb8(buf).into_rgb16(),
            Raster::Rgb16(buf) => buf,
        }
    }
}

/// How the sampler treats coordinates beyond the horizontal edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    /// Cyclic: column `width` is column `0` (equirect longitude seam).
    Wrap,
    /// Edge pixels extend outwards (cube faces).
    Clamp,
}

/// Bilinear sample at index-space coordinates (pixel centres on integers).
///
/// The vertical axis always clamps; the horizontal axis follows `horizontal`.
pub fn sample_bilinear<T: Channel>(plane: &Plane<T>, x: f64, y: f64, horizontal: EdgeMode) -> [T; 3]
where
    Rgb<T>: Pixel<Subpixel = T>,
{
    let (width, height) = plane.dimensions();
    let (w, h) = (width as i64, height as i64);

    let fx0 = x.floor();
    let fy0 = y.floor();
    let tx = x - fx0;
    let ty = y - fy0;
    let (x0, y0) = (fx0 as i64, fy0 as i64);

    let (x0, x1) = match horizontal {
        EdgeMode::Wrap => (x0.rem_euclid(w), (x0 + 1).rem_euclid(w)),
        EdgeMode::Clamp => (x0.clamp(0, w - 1), (x0 + 1).clamp(0, w - 1)),
    };
    let y1 = (y0 + 1).clamp(0, h - 1);
    let y0 = y0.clamp(0, h - 1);

    let data = plane.as_raw();
    let at = |px: i64, py: i64| ((py * w + px) * 3) as usize;
    let (i00, i10, i01, i11) = (at(x0, y0), at(x1, y0), at(x0, y1), at(x1, y1));

    let mut out = [T::from_f64(0.0); 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let top =
            Channel::to_f64(data[i00 + c]) * (1.0 - tx) + Channel::to_f64(data[i10 + c]) * tx;
        let bottom =
            Channel::to_f64(data[i01 + c]) * (1.0 - tx) + Channel::to_f64(data[i11 + c]) * tx;
        *slot = T::from_f64(top * (1.0 - ty) + bottom * ty);
    }
    out
}
