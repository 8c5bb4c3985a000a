use std::f64::consts::{PI, TAU};

use bracket_types::{Point2, Profile, ProfileVertex, Triangle, Vector2, VertexTag, GEOM_EPS};
use tracing::debug;

use crate::dims::DimensionSet;
use crate::error::DimensionError;

/// Largest turn a simple polygon corner may make before it folds back on itself.
const MAX_TURN: f64 = PI - 1e-9;

/// Compute the L-shaped bracket cross-section.
///
/// The inside edge of the frame leg sits on x = 0 and the top of the frame leg
/// on y = 0; the frame leg reaches toward -X, the rail leg rises toward +Y.
/// Vertices are emitted counter-clockwise starting at the frame leg's toe.
pub fn build_profile(dims: &DimensionSet) -> Result<Profile, DimensionError> {
    let d = dims.frame_leg_depth;
    let tf = dims.frame_leg_thickness;
    let tr = dims.rail_leg_thickness;
    let h = dims.rail_leg_height;
    let bw = dims.brace_width;
    let bh = dims.brace_height;

    let v = |tag, x, y| ProfileVertex {
        tag,
        position: Point2::new(x, y),
    };
    let profile = Profile::new(vec![
        v(VertexTag::FrameToeOuter, -d, -tf),
        v(VertexTag::OuterHeel, tr, -tf),
        v(VertexTag::RailHeel, tr, 0.0),
        v(VertexTag::RailTipOuter, tr, h),
        v(VertexTag::RailTipInner, 0.0, h),
        v(VertexTag::BraceRail, 0.0, bh),
        v(VertexTag::BraceFrame, -bw, 0.0),
        v(VertexTag::FrameToeInner, -d, 0.0),
    ]);
    validate_profile(&profile)?;
    check_corner_senses(&profile)?;
    debug!(
        vertices = profile.len(),
        area = profile.signed_area(),
        "built bracket profile"
    );
    Ok(profile)
}

/// The triangular reinforcement filling the inside corner of the L.
pub fn brace_triangle(dims: &DimensionSet) -> Triangle {
    Triangle {
        points: [
            Point2::new(-dims.brace_width, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, dims.brace_height),
        ],
    }
}

/// Signed turning angle from `a` to `b`, in (-PI, PI].
fn turn_angle(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.perp(b).atan2(a.dot(b))
}

/// Proper or touching intersection of segments `p1p2` and `q1q2`.
fn segments_intersect(
    p1: &Point2<f64>,
    p2: &Point2<f64>,
    q1: &Point2<f64>,
    q2: &Point2<f64>,
) -> bool {
    let orient = |a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>| (b - a).perp(&(c - a));
    let on_segment = |a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>| {
        c.x >= a.x.min(b.x) - GEOM_EPS
            && c.x <= a.x.max(b.x) + GEOM_EPS
            && c.y >= a.y.min(b.y) - GEOM_EPS
            && c.y <= a.y.max(b.y) + GEOM_EPS
    };
    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);
    if ((d1 > GEOM_EPS && d2 < -GEOM_EPS) || (d1 < -GEOM_EPS && d2 > GEOM_EPS))
        && ((d3 > GEOM_EPS && d4 < -GEOM_EPS) || (d3 < -GEOM_EPS && d4 > GEOM_EPS))
    {
        return true;
    }
    (d1.abs() <= GEOM_EPS && on_segment(q1, q2, p1))
        || (d2.abs() <= GEOM_EPS && on_segment(q1, q2, p2))
        || (d3.abs() <= GEOM_EPS && on_segment(p1, p2, q1))
        || (d4.abs() <= GEOM_EPS && on_segment(p1, p2, q2))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sense {
    Convex,
    Straight,
    Reflex,
}

/// How each corner of an L-bracket must turn when walked counter-clockwise.
fn expected_sense(tag: VertexTag) -> Sense {
    match tag {
        VertexTag::RailHeel => Sense::Straight,
        VertexTag::BraceRail | VertexTag::BraceFrame => Sense::Reflex,
        VertexTag::FrameToeOuter
        | VertexTag::OuterHeel
        | VertexTag::RailTipOuter
        | VertexTag::RailTipInner
        | VertexTag::FrameToeInner => Sense::Convex,
    }
}

/// A brace longer than the leg it sits on still yields a simple polygon, but
/// one of its corners flips from reflex to convex. Catch that per corner.
fn check_corner_senses(profile: &Profile) -> Result<(), DimensionError> {
    for (tag, corner) in profile.corners() {
        let turn = turn_angle(&corner.incoming, &corner.outgoing);
        let sense = if turn > 1e-9 {
            Sense::Convex
        } else if turn < -1e-9 {
            Sense::Reflex
        } else {
            Sense::Straight
        };
        if sense != expected_sense(tag) {
            return Err(invalid(format!(
                "corner {tag:?} turns {:.1} degrees; brace or leg dimensions overshoot",
                turn.to_degrees()
            )));
        }
    }
    Ok(())
}

fn invalid(reason: String) -> DimensionError {
    DimensionError::Profile { reason }
}

/// Check that a profile is a simple, closed, counter-clockwise polygon.
///
/// The winding check walks the loop once: every corner must turn by less than
/// a half turn, and the turns must add up to exactly one counter-clockwise
/// revolution. Non-adjacent edges must not touch.
pub fn validate_profile(profile: &Profile) -> Result<(), DimensionError> {
    let n = profile.len();
    if n < 3 {
        return Err(invalid(format!("{n} vertices, need at least 3")));
    }
    let vertices = profile.vertices();
    for i in 0..n {
        let a = &vertices[i];
        let b = &vertices[(i + 1) % n];
        if (b.position - a.position).norm() <= GEOM_EPS {
            return Err(invalid(format!(
                "{:?} and {:?} coincide",
                a.tag, b.tag
            )));
        }
    }

    let mut total_turn = 0.0;
    for (tag, corner) in profile.corners() {
        let turn = turn_angle(&corner.incoming, &corner.outgoing);
        if turn.abs() >= MAX_TURN {
            return Err(invalid(format!("edges fold back on each other at {tag:?}")));
        }
        total_turn += turn;
    }
    if (total_turn - TAU).abs() > 1e-6 {
        return Err(invalid(format!(
            "winding turns {:.1} degrees instead of 360",
            total_turn.to_degrees()
        )));
    }

    let edges: Vec<(Point2<f64>, Point2<f64>)> = profile.edges().collect();
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (p1, p2) = &edges[i];
            let (q1, q2) = &edges[j];
            if segments_intersect(p1, p2, q1, q2) {
                return Err(invalid(format!(
                    "edge {:?}->{:?} crosses edge {:?}->{:?}",
                    vertices[i].tag,
                    vertices[(i + 1) % n].tag,
                    vertices[j].tag,
                    vertices[(j + 1) % n].tag
                )));
            }
        }
    }

    if profile.signed_area() <= 0.0 {
        return Err(invalid("enclosed area is not positive".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_profile_has_eight_ccw_vertices() {
        let p = build_profile(&DimensionSet::prusa_6u()).unwrap();
        assert_eq!(p.len(), 8);
        assert!(p.signed_area() > 0.0);
        let bb = p.bounds().unwrap();
        assert_eq!(bb.width(), 49.0);
        assert_eq!(bb.height(), 43.0);
    }

    #[test]
    fn profile_area_is_two_legs_plus_brace() {
        let dims = DimensionSet::prusa_6u();
        let p = build_profile(&dims).unwrap();
        // Frame leg 49x4, rail leg 4x39, brace 10x10/2.
        assert_relative_eq!(p.signed_area(), 196.0 + 156.0 + 50.0);
        assert_relative_eq!(brace_triangle(&dims).signed_area(), 50.0);
    }

    #[test]
    fn brace_past_frame_leg_folds_the_profile() {
        let mut dims = DimensionSet::prusa_6u();
        dims.brace_width = 50.0;
        assert!(matches!(
            build_profile(&dims),
            Err(DimensionError::Profile { .. })
        ));
    }

    #[test]
    fn brace_past_rail_leg_is_rejected() {
        let mut dims = DimensionSet::prusa_6u();
        dims.brace_height = 60.0;
        assert!(build_profile(&dims).is_err());
    }

    #[test]
    fn brace_flush_with_frame_toe_is_rejected() {
        let mut dims = DimensionSet::prusa_6u();
        dims.brace_width = dims.frame_leg_depth;
        assert!(build_profile(&dims).is_err());
    }

    #[test]
    fn clockwise_loop_is_rejected() {
        let p = build_profile(&DimensionSet::prusa_6u()).unwrap();
        let mut vs = p.vertices().to_vec();
        vs.reverse();
        assert!(validate_profile(&Profile::new(vs)).is_err());
    }

    #[test]
    fn bow_tie_is_rejected() {
        let vs = [(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]
            .iter()
            .zip([
                VertexTag::FrameToeOuter,
                VertexTag::OuterHeel,
                VertexTag::RailTipOuter,
                VertexTag::RailTipInner,
            ])
            .map(|(&(x, y), tag)| ProfileVertex {
                tag,
                position: Point2::new(x, y),
            })
            .collect();
        assert!(validate_profile(&Profile::new(vs)).is_err());
    }

    #[test]
    fn asymmetric_brace_keeps_eight_vertices() {
        let mut dims = DimensionSet::prusa_6u();
        dims.brace_width = 20.0;
        dims.brace_height = 6.0;
        let p = build_profile(&dims).unwrap();
        assert_eq!(p.len(), 8);
        assert_eq!(
            p.find(VertexTag::BraceFrame).unwrap().position,
            Point2::new(-20.0, 0.0)
        );
        assert_eq!(
            p.find(VertexTag::BraceRail).unwrap().position,
            Point2::new(0.0, 6.0)
        );
    }
}
