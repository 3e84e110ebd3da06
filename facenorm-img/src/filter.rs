use crate::config::FilterConfig;
use image::{DynamicImage, GrayImage, RgbImage, imageops};
use imageproc::filter::median_filter;
use tracing::{Level, span, trace};

const BINS: usize = 256;

/// Contrast normalization followed by denoising, on the grayscale version of
/// an aligned face. The result is broadcast back to three channels.
pub fn apply(img: &RgbImage, config: &FilterConfig) -> RgbImage {
    DynamicImage::ImageLuma8(apply_gray(img, config)).to_rgb8()
}

pub fn apply_gray(img: &RgbImage, config: &FilterConfig) -> GrayImage {
    let span = span!(Level::DEBUG, "photometric_filter");
    let _guard = span.enter();

    let gray = imageops::grayscale(img);
    let equalized = clahe(&gray, config.clahe_clip_limit, config.clahe_tiles);
    median_filter(&equalized, config.median_radius, config.median_radius)
}

/// Pixels scaled to `[0, 1]`, row major, as embedding models expect.
pub fn normalized_pixels(img: &GrayImage) -> Vec<f32> {
    img.as_raw().iter().map(|v| *v as f32 / 255.).collect()
}

/// Contrast limited adaptive histogram equalization over a `tiles` x `tiles`
/// grid. Each tile's histogram is clipped at `clip_limit` times the mean bin
/// height, and pixel values are bilinearly blended between the mappings of
/// the four nearest tiles.
pub fn clahe(img: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let nx = tiles.clamp(1, width) as usize;
    let ny = tiles.clamp(1, height) as usize;
    let x_bounds = tile_bounds(width, nx);
    let y_bounds = tile_bounds(height, ny);

    let mut luts = Vec::with_capacity(nx * ny);
    for (y0, y1) in &y_bounds {
        for (x0, x1) in &x_bounds {
            luts.push(tile_lut(img, (*x0, *x1), (*y0, *y1), clip_limit));
        }
    }
    trace!("CLAHE with {nx}x{ny} tiles");

    let tile_w = width as f32 / nx as f32;
    let tile_h = height as f32 / ny as f32;

    GrayImage::from_fn(width, height, |x, y| {
        let (tx0, tx1, ax) = neighbours(x, tile_w, nx);
        let (ty0, ty1, ay) = neighbours(y, tile_h, ny);
        let v = img.get_pixel(x, y).0[0] as usize;

        let top = luts[ty0 * nx + tx0][v] * (1. - ax) + luts[ty0 * nx + tx1][v] * ax;
        let bottom = luts[ty1 * nx + tx0][v] * (1. - ax) + luts[ty1 * nx + tx1][v] * ax;

        image::Luma([(top * (1. - ay) + bottom * ay).round().clamp(0., 255.) as u8])
    })
}

fn tile_bounds(len: u32, n: usize) -> Vec<(u32, u32)> {
    (0..n)
        .map(|i| {
            let start = (i as u64 * len as u64 / n as u64) as u32;
            let end = ((i as u64 + 1) * len as u64 / n as u64) as u32;
            (start, end)
        })
        .collect()
}

/// The two tiles whose centers surround `pos` and the blend weight of the
/// second one.
fn neighbours(pos: u32, tile_len: f32, n: usize) -> (usize, usize, f32) {
    let g = (pos as f32 + 0.5) / tile_len - 0.5;
    if g <= 0. {
        return (0, 0, 0.);
    }

    let i0 = g.floor() as usize;
    if i0 >= n - 1 {
        return (n - 1, n - 1, 0.);
    }

    (i0, i0 + 1, g - i0 as f32)
}

fn tile_lut(img: &GrayImage, xs: (u32, u32), ys: (u32, u32), clip_limit: f32) -> [f32; BINS] {
    let mut hist = [0u32; BINS];
    for y in ys.0..ys.1 {
        for x in xs.0..xs.1 {
            hist[img.get_pixel(x, y).0[0] as usize] += 1;
        }
    }

    let area = (xs.1 - xs.0) * (ys.1 - ys.0);
    let limit = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);

    let mut excess = 0;
    for h in hist.iter_mut() {
        if *h > limit {
            excess += *h - limit;
            *h = limit;
        }
    }

    // spread the clipped mass evenly, leftovers at a regular stride
    let per_bin = excess / BINS as u32;
    let residual = excess as usize % BINS;
    for h in hist.iter_mut() {
        *h += per_bin;
    }
    if residual > 0 {
        let step = (BINS / residual).max(1);
        for h in hist.iter_mut().step_by(step).take(residual) {
            *h += 1;
        }
    }

    let scale = 255. / area.max(1) as f32;
    let mut lut = [0.; BINS];
    let mut cdf = 0;
    for (v, h) in hist.iter().enumerate() {
        cdf += h;
        lut[v] = cdf as f32 * scale;
    }

    lut
}
