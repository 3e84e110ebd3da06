use super::point::Point;
use super::rect::Rect;

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Mean of all points. `None` for an empty polygon.
    pub fn centroid(&self) -> Option<Point> {
        if self.points.is_empty() {
            return None;
        }

        let sum = self
            .points
            .iter()
            .fold(Point::default(), |acc, p| acc + *p);

        Some(sum / self.points.len() as f64)
    }

    pub fn min_y(&self) -> f64 {
        self.points.iter().fold(f64::INFINITY, |min, p| min.min(p.y))
    }

    pub fn max_y(&self) -> f64 {
        self.points
            .iter()
            .fold(f64::NEG_INFINITY, |max, p| max.max(p.y))
    }

    pub fn min_x(&self) -> f64 {
        self.points.iter().fold(f64::INFINITY, |min, p| min.min(p.x))
    }

    pub fn max_x(&self) -> f64 {
        self.points
            .iter()
            .fold(f64::NEG_INFINITY, |max, p| max.max(p.x))
    }

    pub fn bounds(&self) -> Option<Rect> {
        if self.points.is_empty() {
            return None;
        }

        let min_x = self.min_x();
        let min_y = self.min_y();

        Some(Rect::from_tl(
            min_x,
            min_y,
            self.max_x() - min_x,
            self.max_y() - min_y,
        ))
    }
}

impl From<Polygon> for Vec<Point> {
    fn from(poly: Polygon) -> Vec<Point> {
        poly.points
    }
}
