use crate::config::Interpolation;
use crate::error::{Error, Result};
use crate::transform::SimilarityTransform;
use image::{ColorType, DynamicImage, ImageBuffer, Luma, Rgb, Rgb32FImage, RgbImage};
use imageproc::geometric_transformations::{self as geo, Projection, warp_into};
use tracing::{Level, span, trace};

pub type GrayF32Image = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Source or resampled pixels kept in f32 on the 0..=255 scale. Resampling
/// results may leave that range until they are quantized.
#[derive(Debug, Clone, PartialEq)]
pub enum FloatImage {
    Gray(GrayF32Image),
    Rgb(Rgb32FImage),
}

impl FloatImage {
    /// Reads a decoded source image. Gray images keep a single channel,
    /// everything else is reduced to RGB.
    pub fn from_dynamic(img: &DynamicImage) -> Result<Self> {
        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Err(Error::SourceImageInvalid(format!(
                "image is empty ({width}x{height})"
            )));
        }

        Ok(match img.color() {
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
                let gray = img.to_luma8();
                FloatImage::Gray(ImageBuffer::from_fn(width, height, |x, y| {
                    Luma([gray.get_pixel(x, y).0[0] as f32])
                }))
            }
            _ => {
                let rgb = img.to_rgb8();
                FloatImage::Rgb(ImageBuffer::from_fn(width, height, |x, y| {
                    Rgb(rgb.get_pixel(x, y).0.map(f32::from))
                }))
            }
        })
    }

    pub fn width(&self) -> u32 {
        match self {
            FloatImage::Gray(img) => img.width(),
            FloatImage::Rgb(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            FloatImage::Gray(img) => img.height(),
            FloatImage::Rgb(img) => img.height(),
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            FloatImage::Gray(_) => 1,
            FloatImage::Rgb(_) => 3,
        }
    }

    pub fn as_raw(&self) -> &[f32] {
        match self {
            FloatImage::Gray(img) => img.as_raw(),
            FloatImage::Rgb(img) => img.as_raw(),
        }
    }

    /// Channel `c` of pixel `(x, y)`. Gray images answer every channel with
    /// their single value.
    pub fn get(&self, x: u32, y: u32, c: usize) -> f32 {
        match self {
            FloatImage::Gray(img) => img.get_pixel(x, y).0[0],
            FloatImage::Rgb(img) => img.get_pixel(x, y).0[c],
        }
    }
}

impl From<Interpolation> for geo::Interpolation {
    fn from(interpolation: Interpolation) -> geo::Interpolation {
        match interpolation {
            Interpolation::Nearest => geo::Interpolation::Nearest,
            Interpolation::Bilinear => geo::Interpolation::Bilinear,
            Interpolation::Bicubic => geo::Interpolation::Bicubic,
        }
    }
}

/// Projection for `warp_into`, whose output-to-source mapping is the f64
/// inverse of `transform` rather than imageproc's f32 one.
fn projection(transform: &SimilarityTransform) -> Result<Projection> {
    let [[a, b, tx], [c, d, ty]] = transform.invert()?.matrix;

    Projection::from_matrix([
        a as f32, b as f32, tx as f32, c as f32, d as f32, ty as f32, 0., 0., 1.,
    ])
    .map(Projection::invert)
    .ok_or(Error::DegenerateGeometry {
        distance: transform.determinant().abs(),
    })
}

/// Resamples `src` into a `width` x `height` canvas. Every output pixel is
/// mapped back through the inverse of `transform` and interpolated from the
/// source; samples whose neighbourhood leaves the source read as black.
pub fn warp(
    src: &FloatImage,
    transform: &SimilarityTransform,
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> Result<FloatImage> {
    let span = span!(Level::DEBUG, "warp");
    let _guard = span.enter();

    let projection = projection(transform)?;
    let method = geo::Interpolation::from(interpolation);

    let out = match src {
        FloatImage::Gray(img) => {
            let mut out = GrayF32Image::new(width, height);
            warp_into(img, &projection, method, Luma([0.]), &mut out);
            FloatImage::Gray(out)
        }
        FloatImage::Rgb(img) => {
            let mut out = Rgb32FImage::new(width, height);
            warp_into(img, &projection, method, Rgb([0.; 3]), &mut out);
            FloatImage::Rgb(out)
        }
    };

    trace!(
        "Warped {}x{} -> {width}x{height} ({interpolation:?})",
        src.width(),
        src.height()
    );

    Ok(out)
}

/// Clamps to the 8-bit range, then rounds and casts. NaN becomes black.
pub fn quantize(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0., 255.).round() as u8
}

/// Converts resampled data to an 8-bit RGB image. Values are clamped before
/// the cast, and a single gray channel is replicated across R, G and B.
pub fn to_rgb8(img: &FloatImage) -> RgbImage {
    match img {
        FloatImage::Gray(gray) => RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
            Rgb([quantize(gray.get_pixel(x, y).0[0]); 3])
        }),
        FloatImage::Rgb(rgb) => RgbImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            Rgb(rgb.get_pixel(x, y).0.map(quantize))
        }),
    }
}
