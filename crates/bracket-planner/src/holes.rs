use bracket_types::{
    BracketFamily, Bounds2, HoleKind, HolePattern, HoleSpec, MountFace, Point2, Vector2,
    GEOM_EPS,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::dims::{DimensionSet, ExtensionDirection, FrameHoleLayout};
use crate::error::HoleOutOfBounds;

/// Number of holes in one EIA-310 rail group.
pub const EIA_HOLES: usize = 3;

/// Which of the two independent hole groups to plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSide {
    Frame,
    Rail,
}

/// Centers `base + i * step` for `i` in `0..count`.
///
/// Each center is computed directly from its index so that rounding does not
/// accumulate along the row.
pub fn linear_centers(base: Point2<f64>, step: Vector2<f64>, count: usize) -> Vec<Point2<f64>> {
    (0..count).map(|i| base + step * i as f64).collect()
}

/// Physical order: top to bottom along the extrusion axis, then along `u`.
pub fn sort_holes(holes: &mut [HoleSpec]) {
    holes.sort_by(|a, b| {
        b.center
            .y
            .total_cmp(&a.center.y)
            .then_with(|| a.center.x.total_cmp(&b.center.x))
    });
}

/// Usable area of a mount face in its local `(u, v)` frame.
pub fn face_region(dims: &DimensionSet, family: BracketFamily, face: MountFace) -> Bounds2 {
    let w = dims.frame_leg_width;
    match face {
        // The brace covers the frame leg from the inside edge out to -brace_width.
        MountFace::FrameLeg => Bounds2::new(
            Point2::new(-dims.frame_leg_depth, 0.0),
            Point2::new(-dims.brace_width, w),
        ),
        MountFace::RailLeg => {
            let f = dims.family(family);
            let (v_min, v_max) = match f.extension_direction {
                ExtensionDirection::Up => (0.0, f.rail_leg_length),
                ExtensionDirection::Down => (w - f.rail_leg_length, w),
            };
            Bounds2::new(
                Point2::new(0.0, v_min),
                Point2::new(dims.rail_leg_height, v_max),
            )
        }
    }
}

/// Reject a hole whose rim comes closer than `margin` to any side of `region`.
pub fn check_hole(
    region: &Bounds2,
    hole: &HoleSpec,
    margin: f64,
) -> Result<(), HoleOutOfBounds> {
    let allowed = region.inset(hole.radius() + margin);
    let inside = allowed.min.x <= allowed.max.x + GEOM_EPS
        && allowed.min.y <= allowed.max.y + GEOM_EPS
        && allowed.contains(&hole.center);
    if inside {
        Ok(())
    } else {
        Err(HoleOutOfBounds {
            pattern: hole.pattern,
            face: hole.face,
            center: hole.center,
            diameter: hole.diameter,
            margin,
        })
    }
}

fn frame_holes(
    dims: &DimensionSet,
    family: BracketFamily,
    region: &Bounds2,
) -> Result<Vec<HoleSpec>, HoleOutOfBounds> {
    let f = dims.family(family);
    // Frame holes are measured from the inside edge outward, i.e. toward -X.
    let base = Point2::new(-f.frame_hole_offset, f.frame_hole_z);
    let step = Vector2::new(-dims.frame_hole_spacing, 0.0);
    let round = |pattern, center| HoleSpec {
        pattern,
        face: MountFace::FrameLeg,
        center,
        diameter: dims.frame_hole_diameter,
        kind: HoleKind::Round,
    };

    match f.frame_holes {
        FrameHoleLayout::Linear { count } => {
            // The farthest hole bounds the row; check it before allocating.
            if count > 0 {
                let last = round(HolePattern::FrameLinear, base + step * (count - 1) as f64);
                check_hole(region, &last, dims.min_edge_margin)?;
            }
            Ok(linear_centers(base, step, count)
                .into_iter()
                .map(|c| round(HolePattern::FrameLinear, c))
                .collect())
        }
        FrameHoleLayout::Triangle {
            apex_offset,
            apex_z,
            apex_diameter,
        } => {
            let mut holes: Vec<HoleSpec> = linear_centers(base, step, 2)
                .into_iter()
                .map(|c| round(HolePattern::FrameTriangle, c))
                .collect();
            let kind = if (apex_diameter - dims.frame_hole_diameter).abs() > GEOM_EPS {
                HoleKind::Slotted
            } else {
                HoleKind::Round
            };
            holes.extend(
                linear_centers(Point2::new(-apex_offset, apex_z), Vector2::zeros(), 1)
                    .into_iter()
                    .map(|center| HoleSpec {
                        pattern: HolePattern::FrameTriangle,
                        face: MountFace::FrameLeg,
                        center,
                        diameter: apex_diameter,
                        kind,
                    }),
            );
            Ok(holes)
        }
    }
}

/// EIA-310 group: the middle hole is the slotted clearance hole, the outer two
/// take the smaller diameter.
fn rail_holes(dims: &DimensionSet, family: BracketFamily) -> Vec<HoleSpec> {
    let f = dims.family(family);
    let base = Point2::new(dims.rail_hole_offset, f.rail_hole_base_z);
    let step = Vector2::new(0.0, dims.rail_hole_spacing);
    linear_centers(base, step, EIA_HOLES)
        .into_iter()
        .enumerate()
        .map(|(i, center)| {
            let (diameter, kind) = if i == EIA_HOLES / 2 {
                (dims.rail_hole_center_diameter, HoleKind::Slotted)
            } else {
                (dims.rail_hole_outer_diameter, HoleKind::Round)
            };
            HoleSpec {
                pattern: HolePattern::RailEia,
                face: MountFace::RailLeg,
                center,
                diameter,
                kind,
            }
        })
        .collect()
}

/// Plan one hole group for a bracket family, in physical order.
#[instrument(skip(dims))]
pub fn plan_holes(
    dims: &DimensionSet,
    family: BracketFamily,
    side: PatternSide,
) -> Result<Vec<HoleSpec>, HoleOutOfBounds> {
    let face = match side {
        PatternSide::Frame => MountFace::FrameLeg,
        PatternSide::Rail => MountFace::RailLeg,
    };
    let region = face_region(dims, family, face);
    let mut holes = match side {
        PatternSide::Frame => frame_holes(dims, family, &region)?,
        PatternSide::Rail => rail_holes(dims, family),
    };
    for hole in &holes {
        check_hole(&region, hole, dims.min_edge_margin)?;
    }
    sort_holes(&mut holes);
    debug!(count = holes.len(), "planned holes");
    Ok(holes)
}
