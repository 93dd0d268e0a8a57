//! Paths for single bends between two placed stations.

use log::trace;

use metromap_core::{
    curve::{Bend, BendKind},
    geometry::{Point, Reflection},
    segment::{CubicBezier, LineSegment, reflect_path, reverse_path},
};

use super::{
    canonical::{self, BaseCase},
    templates::ScaledTemplates,
};

/// Draws the path of `bend` from `from` to `to`.
///
/// Non-canonical bends are drawn from the other end and reversed. Canonical
/// bends are mirrored onto a base case, so the result always starts exactly
/// at `from` and ends exactly at `to`.
///
/// The error is a plain message; callers add which curve it is about.
pub(crate) fn bend_path(
    bend: Bend,
    from: Point,
    to: Point,
    templates: &ScaledTemplates,
) -> Result<Vec<LineSegment>, String> {
    match bend.kind() {
        None => return Err(format!("`{bend}` is not a drawable bend")),
        Some(BendKind::Straight) => return Ok(vec![LineSegment::straight(from, to)]),
        Some(BendKind::Sharp | BendKind::Wide) => {}
    }

    let (canonical, reversed) = bend
        .canonicalize()
        .ok_or_else(|| format!("`{bend}` has no canonical form"))?;
    let (start, end) = if reversed { (to, from) } else { (from, to) };

    let reduction = canonical::reduce(canonical)
        .ok_or_else(|| format!("`{canonical}` cannot be reduced to a base curve"))?;
    let mirrors: Vec<Reflection> = reduction.mirrors.iter().map(|m| m.at(start)).collect();
    let target = mirrors.iter().fold(end, |point, mirror| mirror.apply(point));
    trace!(bend:% = bend, reversed, base:? = reduction.base; "Drawing bend");

    let mut path = base_path(reduction.base, start, target, templates)?;
    for mirror in mirrors.iter().rev() {
        path = reflect_path(&path, *mirror);
    }
    let path = if reversed { reverse_path(path) } else { path };

    Ok(path
        .into_iter()
        .map(|segment| segment.map_points(Point::round))
        .collect())
}

/// Draws a base case curve running right from `from` and arriving at `to`
/// heading down (sharp) or down-right (wide).
fn base_path(
    base: BaseCase,
    from: Point,
    to: Point,
    templates: &ScaledTemplates,
) -> Result<Vec<LineSegment>, String> {
    let (dx, dy) = (to.x() - from.x(), to.y() - from.y());
    if dx <= 0.0 || dy <= 0.0 {
        return Err(format!(
            "the stations at {from:?} and {to:?} are not placed for this bend"
        ));
    }

    // The corner where the horizontal run out of `from` meets the run into `to`.
    let (corner, offsets) = match base {
        BaseCase::Sharp => (Point::new(to.x(), from.y()), &templates.sharp),
        BaseCase::Wide => (Point::new(to.x() - dy, from.y()), &templates.wide),
    };
    let [p0, p1, p2, p3] = offsets.map(|offset| corner.add_point(offset));
    let mut curve = CubicBezier::new(p0, p1, p2, p3);

    if curve.p0().x() <= from.x() {
        let t = curve.closest_parameter(from);
        let (_, rest) = curve.split(t);
        curve = rest.round().with_start(from);
    }
    if curve.p3().y() >= to.y() {
        let t = curve.closest_parameter(to);
        let (head, _) = curve.split(t);
        curve = head.round().with_end(to);
    }

    let mut path = Vec::with_capacity(3);
    if curve.p0() != from {
        path.push(LineSegment::straight(from, curve.p0()));
    }
    path.push(LineSegment::Bezier(curve));
    if curve.p3() != to {
        path.push(LineSegment::straight(curve.p3(), to));
    }
    Ok(path)
}
