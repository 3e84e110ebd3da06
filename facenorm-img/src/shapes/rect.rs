#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    // top-left corner
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn from_tl(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect { x, y, w, h }
    }

    pub fn left(&self) -> f64 {
        self.x
    }
    pub fn right(&self) -> f64 {
        self.x + self.w
    }
    pub fn top(&self) -> f64 {
        self.y
    }
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

impl From<Rect> for imageproc::rect::Rect {
    fn from(r: Rect) -> imageproc::rect::Rect {
        // inclusive of the pixels under both edges
        let (x0, x1) = (r.left().round() as i32, r.right().round() as i32);
        let (y0, y1) = (r.top().round() as i32, r.bottom().round() as i32);
        let w = x1.saturating_sub(x0).saturating_add(1).max(1) as u32;
        let h = y1.saturating_sub(y0).saturating_add(1).max(1) as u32;
        imageproc::rect::Rect::at(x0, y0).of_size(w, h)
    }
}
