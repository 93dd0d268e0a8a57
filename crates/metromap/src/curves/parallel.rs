//! Curves drawn alongside another curve.
//!
//! A parallel curve follows its target one line width further out, so two
//! lines turning together keep their spacing through the bend. Offsets of
//! Bezier curves are not Bezier curves; [`OffsetCurveFitter`] approximates
//! them.

use log::trace;
use nalgebra::{Matrix2, Vector2};

use metromap_core::{
    geometry::Point,
    segment::{CubicBezier, LineSegment, reverse_path},
};

use crate::MetroMapError;

/// Approximates the offset of a cubic Bezier curve.
pub trait OffsetCurveFitter {
    /// Fits curves running `distance` outside `curve`, on the side away
    /// from which the curve turns. The returned curves are contiguous and
    /// follow the direction of `curve`.
    ///
    /// # Errors
    ///
    /// Returns [`MetroMapError::Synthesis`] when the offset cannot be
    /// fitted, for example when `curve` does not turn.
    fn fit_offset_curve(
        &self,
        curve: &CubicBezier,
        distance: f64,
    ) -> Result<Vec<CubicBezier>, MetroMapError>;
}

/// Samples the offset curve and fits two cubic Beziers to the samples by
/// least squares, one for each half.
#[derive(Debug, Clone, Copy)]
pub struct SampledOffsetFitter {
    samples: usize,
}

impl SampledOffsetFitter {
    /// Samples the offset curve `samples` times. At least 8 samples are
    /// taken.
    pub fn new(samples: usize) -> Self {
        Self {
            samples: samples.max(8),
        }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl Default for SampledOffsetFitter {
    fn default() -> Self {
        Self::new(64)
    }
}

impl OffsetCurveFitter for SampledOffsetFitter {
    fn fit_offset_curve(
        &self,
        curve: &CubicBezier,
        distance: f64,
    ) -> Result<Vec<CubicBezier>, MetroMapError> {
        let turn = turning_sign(curve).ok_or_else(|| {
            MetroMapError::Synthesis("cannot offset a curve that does not turn".to_string())
        })?;

        // The left normal points into the turn when the curvature is positive.
        let outward = -turn * distance;
        let intervals = self.samples;
        let samples: Vec<Point> = (0..=intervals)
            .map(|i| {
                let t = i as f64 / intervals as f64;
                curve.eval(t).add_point(curve.unit_normal(t).scale(outward))
            })
            .collect();

        let middle = intervals / 2;
        let first = fit_cubic(&samples[..=middle])?;
        let second = fit_cubic(&samples[middle..])?;
        Ok(vec![first, second])
    }
}

/// `1.0` for curves turning towards their left normal, `-1.0` for the other
/// way, `None` for straight curves.
fn turning_sign(curve: &CubicBezier) -> Option<f64> {
    let at_middle = curve.curvature(0.5);
    let turn = if at_middle != 0.0 {
        at_middle
    } else {
        let start = curve.p1().sub_point(curve.p0());
        let end = curve.p3().sub_point(curve.p2());
        start.x() * end.y() - start.y() * end.x()
    };

    if turn > 0.0 {
        Some(1.0)
    } else if turn < 0.0 {
        Some(-1.0)
    } else {
        None
    }
}

/// Least-squares cubic through `points` with fixed endpoints and
/// chord-length parameters.
fn fit_cubic(points: &[Point]) -> Result<CubicBezier, MetroMapError> {
    let singular = || MetroMapError::Synthesis("degenerate offset samples".to_string());
    let (Some(&start), Some(&end)) = (points.first(), points.last()) else {
        return Err(singular());
    };

    let mut chord = Vec::with_capacity(points.len());
    let mut travelled = 0.0;
    chord.push(0.0);
    for pair in points.windows(2) {
        travelled += pair[0].distance(pair[1]);
        chord.push(travelled);
    }
    if travelled == 0.0 {
        return Err(singular());
    }

    let mut normal = Matrix2::<f64>::zeros();
    let mut rhs_x = Vector2::<f64>::zeros();
    let mut rhs_y = Vector2::<f64>::zeros();
    for (point, length) in points.iter().zip(&chord) {
        let t = length / travelled;
        let u = 1.0 - t;
        let (b0, b1, b2, b3) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);

        let residual = point
            .sub_point(start.scale(b0))
            .sub_point(end.scale(b3));
        normal[(0, 0)] += b1 * b1;
        normal[(0, 1)] += b1 * b2;
        normal[(1, 0)] += b1 * b2;
        normal[(1, 1)] += b2 * b2;
        rhs_x[0] += b1 * residual.x();
        rhs_x[1] += b2 * residual.x();
        rhs_y[0] += b1 * residual.y();
        rhs_y[1] += b2 * residual.y();
    }

    let lu = normal.lu();
    let xs = lu.solve(&rhs_x).ok_or_else(singular)?;
    let ys = lu.solve(&rhs_y).ok_or_else(singular)?;

    Ok(CubicBezier::new(
        start,
        Point::new(xs[0], ys[0]),
        Point::new(xs[1], ys[1]),
        end,
    ))
}

/// Orients `path` so that it runs from near `from` to near `to`.
fn oriented(path: &[LineSegment], from: Point, to: Point) -> Vec<LineSegment> {
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        return Vec::new();
    };
    let (start, end) = (first.start(), last.end());
    let along = start.distance(from) + end.distance(to);
    let against = start.distance(to) + end.distance(from);
    if against < along {
        reverse_path(path.to_vec())
    } else {
        path.to_vec()
    }
}

/// Draws the path from `from` to `to` running `width` outside `target`.
///
/// Only the Bezier segments of the target are offset. Offsets of
/// consecutive Bezier segments are stitched at the midpoint of their
/// adjoining ends. Where a target Bezier ends at the target's station, the
/// offset ends exactly at this curve's station instead. Straight segments
/// close every remaining gap.
pub(crate) fn parallel_path(
    target: &[LineSegment],
    from: Point,
    to: Point,
    width: f64,
    fitter: &dyn OffsetCurveFitter,
) -> Result<Vec<LineSegment>, MetroMapError> {
    let target = oriented(target, from, to);
    let last_index = target.len().saturating_sub(1);

    // Runs of consecutive Bezier segments, with the index range they cover.
    let mut runs: Vec<(usize, usize, Vec<CubicBezier>)> = Vec::new();
    let mut in_run = false;
    for (index, segment) in target.iter().enumerate() {
        let LineSegment::Bezier(curve) = segment else {
            in_run = false;
            continue;
        };
        let pieces: Vec<CubicBezier> = fitter
            .fit_offset_curve(curve, width)?
            .into_iter()
            .map(CubicBezier::round)
            .collect();
        match runs.last_mut() {
            Some((_, end, run)) if in_run => {
                *end = index;
                run.extend(pieces);
            }
            _ => {
                runs.push((index, index, pieces));
                in_run = true;
            }
        }
    }
    trace!(target_segments = target.len(), runs = runs.len(); "Offsetting curve");

    let mut path = Vec::new();
    let mut cursor = from;
    for (first_index, end_index, mut run) in runs {
        for i in 1..run.len() {
            let joint = run[i - 1].p3().midpoint(run[i].p0()).round();
            run[i - 1] = run[i - 1].with_end(joint);
            run[i] = run[i].with_start(joint);
        }
        if first_index == 0 {
            if let Some(head) = run.first_mut() {
                *head = head.with_start(from);
            }
        }
        if end_index == last_index {
            if let Some(tail) = run.last_mut() {
                *tail = tail.with_end(to);
            }
        }

        for curve in run {
            if curve.p0() != cursor {
                path.push(LineSegment::straight(cursor, curve.p0()));
            }
            path.push(LineSegment::Bezier(curve));
            cursor = curve.p3();
        }
    }
    if cursor != to || path.is_empty() {
        path.push(LineSegment::straight(cursor, to));
    }

    Ok(path)
}
