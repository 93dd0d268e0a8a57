//! Bezier templates for the two base curve shapes.
//!
//! A template holds the four control points of its curve as offsets from
//! the corner where the straight runs leaving both stations would meet.
//! The sharp template turns right then down, the wide template turns right
//! then down-right.

use serde::Deserialize;

use metromap_core::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct Offset {
    x: f64,
    y: f64,
}

impl From<Point> for Offset {
    fn from(point: Point) -> Self {
        Self {
            x: point.x(),
            y: point.y(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplatePoints {
    p0_offset: Offset,
    p1_offset: Offset,
    p2_offset: Offset,
    p3_offset: Offset,
}

/// One curve template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveTemplate {
    points: TemplatePoints,
    scale_factor: f64,
}

impl CurveTemplate {
    pub fn new(offsets: [Point; 4], scale_factor: f64) -> Self {
        let [p0, p1, p2, p3] = offsets.map(Offset::from);
        Self {
            points: TemplatePoints {
                p0_offset: p0,
                p1_offset: p1,
                p2_offset: p2,
                p3_offset: p3,
            },
            scale_factor,
        }
    }

    /// Control point offsets multiplied by `scale` and the template's own
    /// scale factor, rounded to the grid.
    pub fn offsets(&self, scale: f64) -> [Point; 4] {
        let factor = scale * self.scale_factor;
        let points = &self.points;
        [
            points.p0_offset,
            points.p1_offset,
            points.p2_offset,
            points.p3_offset,
        ]
        .map(|offset| Point::new(offset.x, offset.y).scale(factor).round())
    }
}

/// The sharp and wide templates, as read from the template file.
///
/// # Examples
///
/// ```
/// # use metromap::CurveTemplates;
/// let json = r#"{
///     "sharp_curve": { "scaleFactor": 1, "points": {
///         "p0Offset": { "x": -8, "y": 0 }, "p1Offset": { "x": -3.5, "y": 0 },
///         "p2Offset": { "x": 0, "y": 3.5 }, "p3Offset": { "x": 0, "y": 8 } } },
///     "wide_curve": { "scaleFactor": 1, "points": {
///         "p0Offset": { "x": -6, "y": 0 }, "p1Offset": { "x": -2, "y": 0 },
///         "p2Offset": { "x": 1.5, "y": 1.5 }, "p3Offset": { "x": 4.5, "y": 4.5 } } }
/// }"#;
///
/// let templates = CurveTemplates::from_json(json).unwrap();
/// assert_eq!(templates.sharp().offsets(2.0)[0].x(), -16.0);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurveTemplates {
    sharp_curve: CurveTemplate,
    wide_curve: CurveTemplate,
}

impl CurveTemplates {
    pub fn new(sharp: CurveTemplate, wide: CurveTemplate) -> Self {
        Self {
            sharp_curve: sharp,
            wide_curve: wide,
        }
    }

    /// Reads the template file.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn sharp(&self) -> &CurveTemplate {
        &self.sharp_curve
    }

    pub fn wide(&self) -> &CurveTemplate {
        &self.wide_curve
    }

    /// Both templates scaled for drawing.
    pub(crate) fn scaled(&self, scale: f64) -> ScaledTemplates {
        ScaledTemplates {
            sharp: self.sharp_curve.offsets(scale),
            wide: self.wide_curve.offsets(scale),
        }
    }
}

/// Template offsets ready to be placed on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScaledTemplates {
    pub sharp: [Point; 4],
    pub wide: [Point; 4],
}
