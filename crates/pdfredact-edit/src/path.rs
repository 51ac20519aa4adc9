//! Vector path data in object-local coordinates.
//!
//! Unlike painted device-space paths, these segments stay in the path
//! object's local space; the object's matrix carries the placement.

use pdfredact_core::geometry::{Point, Rect};

/// A segment of a PDF path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Move to a new point (starts a new subpath).
    MoveTo(Point),
    /// Straight line from current point to target.
    LineTo(Point),
    /// Cubic Bezier curve with two control points and an endpoint.
    CurveTo {
        /// First control point.
        cp1: Point,
        /// Second control point.
        cp2: Point,
        /// Endpoint of the curve.
        end: Point,
    },
    /// Close the current subpath (line back to the subpath start).
    ClosePath,
}

/// A complete path consisting of segments in local coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    /// The path segments.
    pub segments: Vec<PathSegment>,
}

impl PathData {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// An axis-aligned rectangle as moveto + 3 lineto + closepath, the
    /// `re` operator expansion.
    pub fn rect(r: Rect) -> Self {
        Self {
            segments: vec![
                PathSegment::MoveTo(Point::new(r.left, r.bottom)),
                PathSegment::LineTo(Point::new(r.right, r.bottom)),
                PathSegment::LineTo(Point::new(r.right, r.top)),
                PathSegment::LineTo(Point::new(r.left, r.top)),
                PathSegment::ClosePath,
            ],
        }
    }

    /// Check whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The axis-aligned bounding box over all segment points, control
    /// points included. Empty paths yield a degenerate rect at the origin.
    pub fn bounding_box(&self) -> Rect {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut any = false;

        let mut visit = |p: &Point| {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
            any = true;
        };

        for segment in &self.segments {
            match segment {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => visit(p),
                PathSegment::CurveTo { cp1, cp2, end } => {
                    visit(cp1);
                    visit(cp2);
                    visit(end);
                }
                PathSegment::ClosePath => {}
            }
        }

        if !any {
            return Rect::default();
        }
        Rect::new(min_x, min_y, max_x, max_y)
    }
}
