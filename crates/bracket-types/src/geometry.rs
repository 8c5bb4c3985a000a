use serde::{Deserialize, Serialize};

pub use nalgebra::{Point2, Vector2};

/// Absolute tolerance for comparing planned coordinates (mm).
pub const GEOM_EPS: f64 = 1e-6;

/// Axis a 2D reflection is taken about.
///
/// Reflecting about the Y axis negates X; reflecting about the X axis negates Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorAxis {
    None,
    X,
    Y,
}

impl MirrorAxis {
    /// Reflect a point in the profile plane.
    pub fn reflect_point(self, p: &Point2<f64>) -> Point2<f64> {
        match self {
            MirrorAxis::None => *p,
            MirrorAxis::X => Point2::new(p.x, -p.y),
            MirrorAxis::Y => Point2::new(-p.x, p.y),
        }
    }

    /// Reflect a direction in the profile plane.
    pub fn reflect_vector(self, v: &Vector2<f64>) -> Vector2<f64> {
        match self {
            MirrorAxis::None => *v,
            MirrorAxis::X => Vector2::new(v.x, -v.y),
            MirrorAxis::Y => Vector2::new(-v.x, v.y),
        }
    }

    /// A true reflection flips the traversal sense of any polygon.
    pub fn reverses_winding(self) -> bool {
        !matches!(self, MirrorAxis::None)
    }

    /// Normal of the 3D mirror plane through the origin, if any.
    pub fn plane_normal(self) -> Option<[f64; 3]> {
        match self {
            MirrorAxis::None => None,
            MirrorAxis::X => Some([0.0, 1.0, 0.0]),
            MirrorAxis::Y => Some([1.0, 0.0, 0.0]),
        }
    }
}

/// Axis-aligned rectangle in the profile plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Bounds2 {
    pub fn new(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self { min, max }
    }

    /// Smallest rectangle containing every point. `None` for an empty input.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2<f64>>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut min = *first;
        let mut max = *first;
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self { min, max })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Shrink by `inset` on every side. May produce an inverted rectangle.
    pub fn inset(&self, inset: f64) -> Self {
        Self {
            min: Point2::new(self.min.x + inset, self.min.y + inset),
            max: Point2::new(self.max.x - inset, self.max.y - inset),
        }
    }

    /// Inclusive containment with [`GEOM_EPS`] slack.
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        p.x >= self.min.x - GEOM_EPS
            && p.x <= self.max.x + GEOM_EPS
            && p.y >= self.min.y - GEOM_EPS
            && p.y <= self.max.y + GEOM_EPS
    }

    /// Distance from an interior point to the nearest side.
    pub fn edge_distance(&self, p: &Point2<f64>) -> f64 {
        (p.x - self.min.x)
            .min(self.max.x - p.x)
            .min(p.y - self.min.y)
            .min(self.max.y - p.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_y_negates_x_only() {
        let p = Point2::new(-17.5, 10.0);
        assert_eq!(MirrorAxis::Y.reflect_point(&p), Point2::new(17.5, 10.0));
        assert_eq!(MirrorAxis::X.reflect_point(&p), Point2::new(-17.5, -10.0));
        assert_eq!(MirrorAxis::None.reflect_point(&p), p);
    }

    #[test]
    fn bounds_from_points() {
        let pts = [
            Point2::new(-45.0, -4.0),
            Point2::new(4.0, 39.0),
            Point2::new(0.0, 10.0),
        ];
        let b = Bounds2::from_points(pts.iter()).unwrap();
        assert_eq!(b.width(), 49.0);
        assert_eq!(b.height(), 43.0);
        assert!(b.contains(&Point2::new(0.0, 0.0)));
        assert!(!b.contains(&Point2::new(5.0, 0.0)));
        assert_eq!(b.edge_distance(&Point2::new(0.0, 0.0)), 4.0);
    }

    #[test]
    fn bounds_of_nothing() {
        let empty: [Point2<f64>; 0] = [];
        assert!(Bounds2::from_points(empty.iter()).is_none());
    }
}
