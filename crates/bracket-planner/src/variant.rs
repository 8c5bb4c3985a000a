use bracket_types::{
    BracketFamily, FilletSpec, Hand, HoleSpec, MirrorAxis, Point2, Profile, ProfileVertex,
    RoleTag, Triangle, GEOM_EPS,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::dims::{DimensionSet, ExtensionDirection};
use crate::error::PlanError;
use crate::fillets::{plan_fillets, requested_fillets};
use crate::holes::{plan_holes, sort_holes, PatternSide};
use crate::profile::{brace_triangle, build_profile};

/// The part of the rail leg that runs past the frame leg along Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RailExtension {
    /// Counter-clockwise rail-leg cross-section.
    pub outline: Vec<Point2<f64>>,
    pub z_start: f64,
    pub depth: f64,
}

impl RailExtension {
    pub fn outline_coords(&self) -> Vec<[f64; 2]> {
        self.outline.iter().map(|p| [p.x, p.y]).collect()
    }

    pub fn z_end(&self) -> f64 {
        self.z_start + self.depth
    }
}

/// Everything needed to build one bracket, before any solid exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketPlan {
    pub role: RoleTag,
    pub profile: Profile,
    pub brace: Triangle,
    /// Extrusion length of the L cross-section.
    pub width: f64,
    pub rail_extension: Option<RailExtension>,
    pub frame_holes: Vec<HoleSpec>,
    pub rail_holes: Vec<HoleSpec>,
    pub fillets: Vec<FilletSpec>,
}

impl BracketPlan {
    /// Frame holes first, then rail holes, each group in physical order.
    pub fn holes(&self) -> impl Iterator<Item = &HoleSpec> + '_ {
        self.frame_holes.iter().chain(self.rail_holes.iter())
    }

    pub fn hole_count(&self) -> usize {
        self.frame_holes.len() + self.rail_holes.len()
    }

    /// Extent of the finished part along Z, extension included.
    pub fn z_range(&self) -> (f64, f64) {
        match &self.rail_extension {
            Some(ext) => (ext.z_start.min(0.0), ext.z_end().max(self.width)),
            None => (0.0, self.width),
        }
    }
}

/// Rail-leg pad for the family, or `None` when the rail leg is no longer than the frame leg.
pub fn rail_extension(dims: &DimensionSet, family: BracketFamily) -> Option<RailExtension> {
    let f = dims.family(family);
    let w = dims.frame_leg_width;
    let depth = f.rail_leg_length - w;
    if depth <= GEOM_EPS {
        return None;
    }
    let z_start = match f.extension_direction {
        ExtensionDirection::Up => w,
        ExtensionDirection::Down => w - f.rail_leg_length,
    };
    let tr = dims.rail_leg_thickness;
    let h = dims.rail_leg_height;
    Some(RailExtension {
        outline: vec![
            Point2::new(0.0, 0.0),
            Point2::new(tr, 0.0),
            Point2::new(tr, h),
            Point2::new(0.0, h),
        ],
        z_start,
        depth,
    })
}

/// Plan the canonical (left-hand) bracket of a family.
#[instrument(skip(dims))]
pub fn plan_bracket(dims: &DimensionSet, family: BracketFamily) -> Result<BracketPlan, PlanError> {
    let profile = build_profile(dims)?;
    let frame_holes = plan_holes(dims, family, PatternSide::Frame)?;
    let rail_holes = plan_holes(dims, family, PatternSide::Rail)?;
    let fillets = plan_fillets(&profile, &requested_fillets(dims), dims)?;
    let plan = BracketPlan {
        role: RoleTag::new(family, Hand::Left),
        brace: brace_triangle(dims),
        width: dims.frame_leg_width,
        rail_extension: rail_extension(dims, family),
        profile,
        frame_holes,
        rail_holes,
        fillets,
    };
    debug!(
        role = %plan.role,
        holes = plan.hole_count(),
        fillets = plan.fillets.len(),
        "planned bracket"
    );
    Ok(plan)
}

fn reflect_loop(points: &[Point2<f64>], axis: MirrorAxis) -> Vec<Point2<f64>> {
    let mut out: Vec<Point2<f64>> = points.iter().map(|p| axis.reflect_point(p)).collect();
    if axis.reverses_winding() {
        out.reverse();
    }
    out
}

/// Reflect a profile, restoring counter-clockwise order. Tags stay with their vertices.
pub fn mirror_profile(profile: &Profile, axis: MirrorAxis) -> Profile {
    let mut vertices: Vec<ProfileVertex> = profile
        .vertices()
        .iter()
        .map(|v| ProfileVertex {
            tag: v.tag,
            position: axis.reflect_point(&v.position),
        })
        .collect();
    if axis.reverses_winding() {
        vertices.reverse();
    }
    Profile::new(vertices)
}

fn mirror_holes(holes: &[HoleSpec], axis: MirrorAxis) -> Vec<HoleSpec> {
    let mut out: Vec<HoleSpec> = holes.iter().map(|h| h.mirrored(axis)).collect();
    sort_holes(&mut out);
    out
}

/// Derive the plan of a mirrored variant.
///
/// Lengths are untouched: only positions change. Fillets are carried over
/// as-is since their roles name tagged corners, and the tags travel with the
/// reflected vertices. Mirroring about Y swaps the hand.
pub fn mirror_plan(plan: &BracketPlan, axis: MirrorAxis) -> BracketPlan {
    let role = match axis {
        MirrorAxis::Y => plan.role.sibling(),
        MirrorAxis::None | MirrorAxis::X => plan.role,
    };
    let mut brace = Triangle {
        points: plan.brace.points.map(|p| axis.reflect_point(&p)),
    };
    if axis.reverses_winding() {
        brace.points.reverse();
    }
    BracketPlan {
        role,
        profile: mirror_profile(&plan.profile, axis),
        brace,
        width: plan.width,
        rail_extension: plan.rail_extension.as_ref().map(|ext| RailExtension {
            outline: reflect_loop(&ext.outline, axis),
            z_start: ext.z_start,
            depth: ext.depth,
        }),
        frame_holes: mirror_holes(&plan.frame_holes, axis),
        rail_holes: mirror_holes(&plan.rail_holes, axis),
        fillets: plan.fillets.clone(),
    }
}

/// Plan any role: the canonical bracket, mirrored when the role asks for it.
pub fn plan_variant(dims: &DimensionSet, role: RoleTag) -> Result<BracketPlan, PlanError> {
    let canonical = plan_bracket(dims, role.family)?;
    Ok(match role.mirror_axis() {
        MirrorAxis::None => canonical,
        axis => mirror_plan(&canonical, axis),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_types::VertexTag;

    #[test]
    fn top_extension_runs_up_from_the_frame_leg() {
        let ext = rail_extension(&DimensionSet::prusa_6u(), BracketFamily::Top).unwrap();
        assert_eq!(ext.z_start, 40.0);
        assert_eq!(ext.depth, 57.0);
        assert_eq!(ext.z_end(), 97.0);
    }

    #[test]
    fn bottom_extension_runs_down_below_zero() {
        let ext = rail_extension(&DimensionSet::prusa_6u(), BracketFamily::Bottom).unwrap();
        assert_eq!(ext.z_start, -55.0);
        assert_eq!(ext.z_end(), 0.0);
    }

    #[test]
    fn flush_rail_leg_has_no_extension() {
        let mut dims = DimensionSet::prusa_6u();
        dims.top.rail_leg_length = dims.frame_leg_width;
        assert!(rail_extension(&dims, BracketFamily::Top).is_none());
    }

    #[test]
    fn right_variant_is_reflected_and_stays_ccw() {
        let dims = DimensionSet::prusa_6u();
        let right = plan_variant(&dims, RoleTag::new(BracketFamily::Top, Hand::Right)).unwrap();
        assert_eq!(right.role.to_string(), "top_bracket_right");
        assert!(right.profile.signed_area() > 0.0);
        assert_eq!(
            right.profile.find(VertexTag::OuterHeel).unwrap().position,
            Point2::new(-4.0, -4.0)
        );
        assert!(right.brace.signed_area() > 0.0);
        let bb = right.profile.bounds().unwrap();
        assert_eq!((bb.min.x, bb.max.x), (-4.0, 45.0));
    }

    #[test]
    fn right_frame_holes_flip_u_only() {
        let dims = DimensionSet::prusa_6u();
        let left = plan_variant(&dims, RoleTag::new(BracketFamily::Top, Hand::Left)).unwrap();
        let right = plan_variant(&dims, RoleTag::new(BracketFamily::Top, Hand::Right)).unwrap();
        let us: Vec<f64> = right.frame_holes.iter().map(|h| h.center.x).collect();
        assert_eq!(us, [17.5, 37.5]);
        // Rail holes sit on a face whose u axis is Y: unchanged.
        assert_eq!(left.rail_holes, right.rail_holes);
    }

    #[test]
    fn bottom_plan_uses_triangle_layout() {
        let plan = plan_bracket(&DimensionSet::prusa_6u(), BracketFamily::Bottom).unwrap();
        assert_eq!(plan.frame_holes.len(), 3);
        assert_eq!(plan.rail_holes.len(), 3);
        assert_eq!(plan.z_range(), (-55.0, 40.0));
    }
}
