use crate::landmarks::LandmarkSet;
use crate::shapes::{Point, Rect};
use crate::transform::SimilarityTransform;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing;

const LANDMARK_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const BOUNDS_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const EYE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LANDMARK_RADIUS: i32 = 2;

/// Copy of `img` with every landmark marked and the landmark bounding box
/// outlined.
pub fn draw_landmarks(img: &DynamicImage, landmarks: &LandmarkSet) -> RgbImage {
    let mut out = img.to_rgb8();
    let size = out.dimensions();

    for p in landmarks.points() {
        if let Some(center) = pixel(p, LANDMARK_RADIUS, size) {
            drawing::draw_filled_circle_mut(&mut out, center, LANDMARK_RADIUS, LANDMARK_COLOR);
        }
    }

    if let Some(bounds) = landmarks.all().bounds() {
        drawing::draw_hollow_rect_mut(&mut out, clip(bounds, size).into(), BOUNDS_COLOR);
    }

    out
}

/// Marks where the source eye centers land on an aligned face.
pub fn draw_alignment(
    aligned: &RgbImage,
    transform: &SimilarityTransform,
    eyes: [Point; 2],
) -> RgbImage {
    let mut out = aligned.clone();
    let size = out.dimensions();
    for eye in eyes {
        if let Some((x, y)) = pixel(&transform.apply(eye), 1, size) {
            drawing::draw_cross_mut(&mut out, EYE_COLOR, x, y);
        }
    }
    out
}

/// Pixel under `p`, or `None` when a mark of `radius` around it cannot
/// touch the canvas.
fn pixel(p: &Point, radius: i32, (w, h): (u32, u32)) -> Option<(i32, i32)> {
    let r = radius as f64;
    let visible = p.x >= -r && p.y >= -r && p.x <= w as f64 + r && p.y <= h as f64 + r;
    visible.then(|| (p.x.round() as i32, p.y.round() as i32))
}

// edges beyond the canvas end up one pixel outside it
fn clip(r: Rect, (w, h): (u32, u32)) -> Rect {
    let (w, h) = (w as f64, h as f64);
    let left = r.left().clamp(-1., w);
    let top = r.top().clamp(-1., h);
    let right = r.right().clamp(-1., w);
    let bottom = r.bottom().clamp(-1., h);
    Rect::from_tl(left, top, right - left, bottom - top)
}
