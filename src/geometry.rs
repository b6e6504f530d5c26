// src/geometry.rs - Relative/absolute zone rectangles and hit tests
use nalgebra::Point2;

/// Pointer or landmark position in [0,1]-normalized frame coordinates.
pub type RelPoint = Point2<f64>;

/// Axis-aligned rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub w: T,
    pub h: T,
}

/// Rectangle in [0,1]-normalized frame coordinates.
pub type RelRect = Rect<f64>;

/// Rectangle in frame pixels, rebuilt every frame from a `RelRect`.
pub type AbsRect = Rect<i32>;

/// Coordinate type that can compute a rectangle's far edge.
pub trait Edge: Copy + PartialOrd {
    fn edge(origin: Self, len: Self) -> Self;
}

impl Edge for f64 {
    fn edge(origin: Self, len: Self) -> Self {
        origin + len
    }
}

/// Saturates so zones scaled from huge relative sizes cannot overflow.
impl Edge for i32 {
    fn edge(origin: Self, len: Self) -> Self {
        origin.saturating_add(len)
    }
}

impl<T> Rect<T> {
    pub const fn new(x: T, y: T, w: T, h: T) -> Self {
        Self { x, y, w, h }
    }
}

impl<T: Edge> Rect<T> {
    pub fn right(&self) -> T {
        T::edge(self.x, self.w)
    }

    pub fn bottom(&self) -> T {
        T::edge(self.y, self.h)
    }

    pub fn contains(&self, px: T, py: T) -> bool {
        point_in_rect(px, py, self)
    }
}

impl RelRect {
    pub fn to_absolute(&self, width: u32, height: u32) -> AbsRect {
        let (x, y) = to_absolute_point(&RelPoint::new(self.x, self.y), width, height);
        let (w, h) = to_absolute_size(self.w, self.h, width, height);
        AbsRect::new(x, y, w, h)
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.w, self.h]
    }
}

impl From<[f64; 4]> for RelRect {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Scales a relative point to pixels, truncating toward zero.
pub fn to_absolute_point(p: &RelPoint, width: u32, height: u32) -> (i32, i32) {
    ((p.x * width as f64) as i32, (p.y * height as f64) as i32)
}

pub fn to_absolute_size(w: f64, h: f64, width: u32, height: u32) -> (i32, i32) {
    ((w * width as f64) as i32, (h * height as f64) as i32)
}

/// Inclusive on all four edges.
pub fn point_in_rect<T: Edge>(x: T, y: T, rect: &Rect<T>) -> bool {
    rect.x <= x && x <= rect.right() && rect.y <= y && y <= rect.bottom()
}

/// True when `(x, y)` is closer than `margin` to one of the rectangle's edges
/// while staying within `margin` of that edge's extent. A corner point counts
/// for both adjacent edges.
pub fn is_on_border(x: f64, y: f64, rect: &RelRect, margin: f64) -> bool {
    let within_y = rect.y - margin <= y && y <= rect.y + rect.h + margin;
    let within_x = rect.x - margin <= x && x <= rect.x + rect.w + margin;

    let on_left = (x - rect.x).abs() < margin && within_y;
    let on_right = (x - (rect.x + rect.w)).abs() < margin && within_y;
    let on_top = (y - rect.y).abs() < margin && within_x;
    let on_bottom = (y - (rect.y + rect.h)).abs() < margin && within_x;

    on_left || on_right || on_top || on_bottom
}

/// `v` limited to `[lo, hi]`. Unlike `f64::clamp` this never panics when a
/// malformed rectangle makes `hi < lo`; the upper bound wins.
pub fn clip(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_conversion_truncates() {
        let p = RelPoint::new(0.999, 0.5);
        assert_eq!(to_absolute_point(&p, 100, 51), (99, 25));
        assert_eq!(to_absolute_size(0.126, 0.2, 1280, 720), (161, 144));
    }

    #[test]
    fn rel_rect_to_absolute() {
        let r = RelRect::new(0.44, 0.40, 0.12, 0.20);
        assert_eq!(r.to_absolute(1000, 500), AbsRect::new(440, 200, 120, 100));
    }

    #[test]
    fn containment_is_inclusive() {
        let r = AbsRect::new(10, 10, 20, 20);
        assert!(point_in_rect(10, 10, &r));
        assert!(point_in_rect(30, 30, &r));
        assert!(!point_in_rect(31, 30, &r));
        assert!(!point_in_rect(9, 15, &r));

        let rel = RelRect::new(0.1, 0.1, 0.2, 0.2);
        assert!(rel.contains(0.2, 0.3));
        assert!(!rel.contains(0.05, 0.2));
    }

    #[test]
    fn pixel_edges_saturate() {
        let huge = RelRect::new(0.5, 0.5, 1e12, 0.1).to_absolute(1280, 720);
        assert_eq!(huge.w, i32::MAX);
        assert_eq!(huge.right(), i32::MAX);
        assert!(huge.contains(700, 400));
        assert!(!huge.contains(600, 400));
    }

    #[test]
    fn border_hits_each_edge() {
        let r = RelRect::new(0.2, 0.2, 0.4, 0.4);
        let m = 0.02;
        assert!(is_on_border(0.21, 0.4, &r, m)); // left
        assert!(is_on_border(0.59, 0.4, &r, m)); // right
        assert!(is_on_border(0.4, 0.19, &r, m)); // top
        assert!(is_on_border(0.4, 0.61, &r, m)); // bottom
    }

    #[test]
    fn border_counts_corners_and_rejects_interior() {
        let r = RelRect::new(0.2, 0.2, 0.4, 0.4);
        let m = 0.02;
        assert!(is_on_border(0.2, 0.2, &r, m));
        assert!(is_on_border(0.61, 0.61, &r, m));
        assert!(!is_on_border(0.4, 0.4, &r, m));
        // next to the left edge line but past the bottom of the rect
        assert!(!is_on_border(0.2, 0.65, &r, m));
    }

    #[test]
    fn clip_prefers_upper_bound_when_inverted() {
        assert_eq!(clip(0.5, 0.0, 0.3), 0.3);
        assert_eq!(clip(-1.0, 0.0, 0.3), 0.0);
        assert_eq!(clip(0.2, 0.0, -0.1), -0.1);
    }
}
