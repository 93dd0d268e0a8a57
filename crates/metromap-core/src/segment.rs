//! Cubic Bezier curves and the line segments that make up a drawn path.
//!
//! A path between two stations is an ordered list of [`LineSegment`]s,
//! each either a straight line or a [`CubicBezier`]. Consecutive segments
//! share endpoints, and a path always runs from its `from` station to its
//! `to` station.

use crate::geometry::{Point, Reflection};

/// Number of intervals sampled before refining a closest-point search.
const CLOSEST_POINT_SAMPLES: usize = 64;

/// Width of the parameter bracket at which golden-section search stops.
const CLOSEST_POINT_TOLERANCE: f64 = 1e-9;

/// A cubic Bezier curve with control points `p0..p3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
}

impl CubicBezier {
    pub fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    pub fn p0(&self) -> Point {
        self.p0
    }

    pub fn p1(&self) -> Point {
        self.p1
    }

    pub fn p2(&self) -> Point {
        self.p2
    }

    pub fn p3(&self) -> Point {
        self.p3
    }

    /// Returns the control points in order.
    pub fn points(&self) -> [Point; 4] {
        [self.p0, self.p1, self.p2, self.p3]
    }

    /// Returns a copy with `p0` replaced.
    pub fn with_start(mut self, p0: Point) -> Self {
        self.p0 = p0;
        self
    }

    /// Returns a copy with `p3` replaced.
    pub fn with_end(mut self, p3: Point) -> Self {
        self.p3 = p3;
        self
    }

    /// Applies `f` to every control point.
    pub fn map_points(self, f: impl Fn(Point) -> Point) -> Self {
        Self::new(f(self.p0), f(self.p1), f(self.p2), f(self.p3))
    }

    /// Translates the curve by `offset`.
    pub fn translate(self, offset: Point) -> Self {
        self.map_points(|p| p.add_point(offset))
    }

    /// Rounds every control point to integer coordinates.
    pub fn round(self) -> Self {
        self.map_points(Point::round)
    }

    /// The same curve traversed from `p3` to `p0`.
    pub fn reversed(self) -> Self {
        Self::new(self.p3, self.p2, self.p1, self.p0)
    }

    /// Evaluates the curve at parameter `t` in `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use metromap_core::{geometry::Point, segment::CubicBezier};
    /// let curve = CubicBezier::new(
    ///     Point::new(0.0, 0.0),
    ///     Point::new(0.0, 10.0),
    ///     Point::new(10.0, 10.0),
    ///     Point::new(10.0, 0.0),
    /// );
    /// assert_eq!(curve.eval(0.0), Point::new(0.0, 0.0));
    /// assert_eq!(curve.eval(0.5), Point::new(5.0, 7.5));
    /// assert_eq!(curve.eval(1.0), Point::new(10.0, 0.0));
    /// ```
    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        self.p0
            .scale(mt * mt * mt)
            .add_point(self.p1.scale(3.0 * mt * mt * t))
            .add_point(self.p2.scale(3.0 * mt * t * t))
            .add_point(self.p3.scale(t * t * t))
    }

    /// First derivative with respect to `t`.
    pub fn derivative(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        self.p1
            .sub_point(self.p0)
            .scale(3.0 * mt * mt)
            .add_point(self.p2.sub_point(self.p1).scale(6.0 * mt * t))
            .add_point(self.p3.sub_point(self.p2).scale(3.0 * t * t))
    }

    /// Second derivative with respect to `t`.
    pub fn second_derivative(&self, t: f64) -> Point {
        let a = self.p2.sub_point(self.p1.scale(2.0)).add_point(self.p0);
        let b = self.p3.sub_point(self.p2.scale(2.0)).add_point(self.p1);
        a.scale(6.0 * (1.0 - t)).add_point(b.scale(6.0 * t))
    }

    /// Signed curvature at `t`.
    ///
    /// Positive curvature turns towards the left-hand normal
    /// `(-dy, dx)` of the tangent. Returns `0.0` where the tangent vanishes.
    pub fn curvature(&self, t: f64) -> f64 {
        let d1 = self.derivative(t);
        let d2 = self.second_derivative(t);
        let speed = d1.hypot();
        if speed == 0.0 {
            return 0.0;
        }
        (d1.x() * d2.y() - d1.y() * d2.x()) / (speed * speed * speed)
    }

    /// Unit normal at `t`, pointing to the left of the direction of travel.
    ///
    /// Falls back to the chord direction when the tangent vanishes at `t`.
    pub fn unit_normal(&self, t: f64) -> Point {
        let mut tangent = self.derivative(t);
        if tangent.hypot() == 0.0 {
            tangent = self.p3.sub_point(self.p0);
        }
        let length = tangent.hypot();
        if length == 0.0 {
            return Point::default();
        }
        Point::new(-tangent.y() / length, tangent.x() / length)
    }

    /// Finds the parameter of the point on the curve closest to `target`.
    ///
    /// The curve is sampled coarsely first and the best bracket is refined
    /// with golden-section search, so the global minimum is found for the
    /// well-behaved curves used on the map.
    pub fn closest_parameter(&self, target: Point) -> f64 {
        let distance = |t: f64| self.eval(t).distance(target);

        let step = 1.0 / CLOSEST_POINT_SAMPLES as f64;
        let best_sample = (0..=CLOSEST_POINT_SAMPLES)
            .map(|i| i as f64 * step)
            .min_by(|a, b| distance(*a).total_cmp(&distance(*b)))
            .unwrap_or(0.0);

        let mut lo = (best_sample - step).max(0.0);
        let mut hi = (best_sample + step).min(1.0);

        let inv_phi = (5.0f64.sqrt() - 1.0) / 2.0;
        let mut c = hi - inv_phi * (hi - lo);
        let mut d = lo + inv_phi * (hi - lo);
        while hi - lo > CLOSEST_POINT_TOLERANCE {
            if distance(c) < distance(d) {
                hi = d;
            } else {
                lo = c;
            }
            c = hi - inv_phi * (hi - lo);
            d = lo + inv_phi * (hi - lo);
        }

        (lo + hi) / 2.0
    }

    /// Splits the curve at `t` with de Casteljau's construction.
    ///
    /// The first curve covers `[0, t]` and the second `[t, 1]`; they share
    /// the point `eval(t)`.
    pub fn split(&self, t: f64) -> (CubicBezier, CubicBezier) {
        let lerp = |a: Point, b: Point| a.add_point(b.sub_point(a).scale(t));

        let p01 = lerp(self.p0, self.p1);
        let p12 = lerp(self.p1, self.p2);
        let p23 = lerp(self.p2, self.p3);
        let p012 = lerp(p01, p12);
        let p123 = lerp(p12, p23);
        let mid = lerp(p012, p123);

        (
            CubicBezier::new(self.p0, p01, p012, mid),
            CubicBezier::new(mid, p123, p23, self.p3),
        )
    }
}

/// One piece of a drawn path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineSegment {
    /// A straight line from `p0` to `p1`.
    Straight { p0: Point, p1: Point },

    /// A cubic Bezier curve.
    Bezier(CubicBezier),
}

impl LineSegment {
    pub fn straight(p0: Point, p1: Point) -> Self {
        Self::Straight { p0, p1 }
    }

    pub fn is_straight(&self) -> bool {
        matches!(self, Self::Straight { .. })
    }

    pub fn as_bezier(&self) -> Option<&CubicBezier> {
        match self {
            Self::Bezier(curve) => Some(curve),
            Self::Straight { .. } => None,
        }
    }

    /// First point of the segment.
    pub fn start(&self) -> Point {
        match self {
            Self::Straight { p0, .. } => *p0,
            Self::Bezier(curve) => curve.p0(),
        }
    }

    /// Last point of the segment.
    pub fn end(&self) -> Point {
        match self {
            Self::Straight { p1, .. } => *p1,
            Self::Bezier(curve) => curve.p3(),
        }
    }

    /// Applies `f` to every defining point.
    pub fn map_points(self, f: impl Fn(Point) -> Point) -> Self {
        match self {
            Self::Straight { p0, p1 } => Self::Straight {
                p0: f(p0),
                p1: f(p1),
            },
            Self::Bezier(curve) => Self::Bezier(curve.map_points(f)),
        }
    }

    /// The same segment traversed backwards.
    pub fn reversed(self) -> Self {
        match self {
            Self::Straight { p0, p1 } => Self::Straight { p0: p1, p1: p0 },
            Self::Bezier(curve) => Self::Bezier(curve.reversed()),
        }
    }

    pub fn reflect(self, mirror: Reflection) -> Self {
        self.map_points(|p| mirror.apply(p))
    }
}

/// Reflects every segment of a path.
pub fn reflect_path(path: &[LineSegment], mirror: Reflection) -> Vec<LineSegment> {
    path.iter().map(|segment| segment.reflect(mirror)).collect()
}

/// Reverses a path: segment order is reversed and so is each segment.
pub fn reverse_path(path: Vec<LineSegment>) -> Vec<LineSegment> {
    path.into_iter().rev().map(LineSegment::reversed).collect()
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    fn quarter_turn() -> CubicBezier {
        CubicBezier::new(
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(40.0, 20.0),
            Point::new(40.0, 40.0),
        )
    }

    #[test]
    fn test_eval_endpoints() {
        let curve = quarter_turn();
        assert_eq!(curve.eval(0.0), curve.p0());
        assert_eq!(curve.eval(1.0), curve.p3());
    }

    #[test]
    fn test_derivative_matches_control_polygon() {
        let curve = quarter_turn();
        assert_eq!(curve.derivative(0.0), Point::new(60.0, 0.0));
        assert_eq!(curve.derivative(1.0), Point::new(0.0, 60.0));
    }

    #[test]
    fn test_curvature_sign() {
        // Right then down turns clockwise on screen, i.e. towards the
        // left-hand normal (-dy, dx) = (0, 1) of the initial tangent.
        let curve = quarter_turn();
        assert!(curve.curvature(0.5) > 0.0);
        assert!(curve.reversed().curvature(0.5) < 0.0);
    }

    #[test]
    fn test_curvature_of_straight_curve_is_zero() {
        let line = CubicBezier::new(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(3.0, 3.0),
        );
        assert!(approx_eq!(f64, line.curvature(0.3), 0.0, epsilon = 1e-12));
    }

    #[test]
    fn test_closest_parameter_of_point_on_curve() {
        let curve = quarter_turn();
        let target = curve.eval(0.3);
        let t = curve.closest_parameter(target);
        assert!(approx_eq!(f64, t, 0.3, epsilon = 1e-6));
    }

    #[test]
    fn test_closest_parameter_clamps_to_ends() {
        let curve = quarter_turn();
        assert!(curve.closest_parameter(Point::new(-100.0, 0.0)) < 1e-6);
        assert!(curve.closest_parameter(Point::new(40.0, 100.0)) > 1.0 - 1e-6);
    }

    #[test]
    fn test_split_shares_midpoint() {
        let curve = quarter_turn();
        let (first, second) = curve.split(0.25);

        assert_eq!(first.p0(), curve.p0());
        assert_eq!(second.p3(), curve.p3());
        assert_eq!(first.p3(), second.p0());

        let on_curve = curve.eval(0.25);
        assert!(approx_eq!(f64, first.p3().x(), on_curve.x(), epsilon = 1e-9));
        assert!(approx_eq!(f64, first.p3().y(), on_curve.y(), epsilon = 1e-9));
    }

    #[test]
    fn test_split_halves_follow_original() {
        let curve = quarter_turn();
        let (first, second) = curve.split(0.5);

        let a = first.eval(0.5);
        let b = curve.eval(0.25);
        assert!(approx_eq!(f64, a.x(), b.x(), epsilon = 1e-9));
        assert!(approx_eq!(f64, a.y(), b.y(), epsilon = 1e-9));

        let a = second.eval(0.5);
        let b = curve.eval(0.75);
        assert!(approx_eq!(f64, a.x(), b.x(), epsilon = 1e-9));
        assert!(approx_eq!(f64, a.y(), b.y(), epsilon = 1e-9));
    }

    #[test]
    fn test_reverse_path() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        let path = vec![
            LineSegment::straight(a, b),
            LineSegment::Bezier(quarter_turn().translate(b)),
        ];

        let reversed = reverse_path(path.clone());

        assert_eq!(reversed.len(), 2);
        assert_eq!(reversed[0].start(), path[1].end());
        assert_eq!(reversed[1].end(), a);
        assert_eq!(reverse_path(reversed), path);
    }
}
