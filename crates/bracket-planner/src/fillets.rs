use bracket_types::{EdgeRole, FilletSpec, Profile, GEOM_EPS};
use tracing::debug;

use crate::dims::DimensionSet;
use crate::error::FilletError;

/// Fillets requested by the Dimension Set. Zero radii request nothing.
pub fn requested_fillets(dims: &DimensionSet) -> Vec<FilletSpec> {
    EdgeRole::ALL
        .into_iter()
        .map(|role| FilletSpec {
            role,
            radius: match role {
                EdgeRole::WallToFace => dims.heel_fillet_radius,
                EdgeRole::JointFrameCorner | EdgeRole::JointRailCorner => dims.brace_fillet_radius,
            },
        })
        .filter(|f| f.radius != 0.0)
        .collect()
}

/// Thinnest wall meeting at the role's corner.
pub fn adjacent_wall(dims: &DimensionSet, role: EdgeRole) -> f64 {
    match role {
        EdgeRole::WallToFace => dims.frame_leg_thickness.min(dims.rail_leg_thickness),
        EdgeRole::JointFrameCorner => dims.frame_leg_thickness,
        EdgeRole::JointRailCorner => dims.rail_leg_thickness,
    }
}

/// Check each request against the profile and the wall-thickness cap.
///
/// Every role must name a corner that exists in `profile`. A radius above
/// `fillet_cap_ratio` times the thinnest adjacent wall is an error, never
/// clamped. Output follows [`EdgeRole::ALL`] order.
pub fn plan_fillets(
    profile: &Profile,
    requests: &[FilletSpec],
    dims: &DimensionSet,
) -> Result<Vec<FilletSpec>, FilletError> {
    let mut planned = Vec::with_capacity(requests.len());
    for request in requests {
        let role = request.role;
        let corner = role.corner_tag();
        if profile.find(corner).is_none() {
            return Err(FilletError::MissingCorner { role, corner });
        }
        if !(request.radius > 0.0 && request.radius.is_finite()) {
            return Err(FilletError::InvalidRadius {
                role,
                radius: request.radius,
            });
        }
        let wall = adjacent_wall(dims, role);
        let cap = dims.fillet_cap_ratio * wall;
        if request.radius > cap + GEOM_EPS {
            return Err(FilletError::Overflow {
                role,
                edge: corner,
                radius: request.radius,
                cap,
                wall,
            });
        }
        planned.push(*request);
    }
    planned.sort_by_key(|f| EdgeRole::ALL.iter().position(|r| *r == f.role));
    debug!(count = planned.len(), "planned fillets");
    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::build_profile;

    #[test]
    fn no_radii_means_no_fillets() {
        assert!(requested_fillets(&DimensionSet::prusa_6u()).is_empty());
    }

    #[test]
    fn brace_radius_covers_both_joint_corners() {
        let mut dims = DimensionSet::prusa_6u();
        dims.brace_fillet_radius = 1.5;
        let roles: Vec<EdgeRole> = requested_fillets(&dims).iter().map(|f| f.role).collect();
        assert_eq!(
            roles,
            [EdgeRole::JointFrameCorner, EdgeRole::JointRailCorner]
        );
    }

    #[test]
    fn radius_within_cap_is_planned() {
        let dims = DimensionSet::prusa_6u();
        let profile = build_profile(&dims).unwrap();
        let req = [FilletSpec {
            role: EdgeRole::WallToFace,
            radius: 2.0,
        }];
        assert_eq!(plan_fillets(&profile, &req, &dims).unwrap(), req);
    }

    #[test]
    fn radius_over_half_wall_overflows() {
        let dims = DimensionSet::prusa_6u();
        let profile = build_profile(&dims).unwrap();
        let req = [FilletSpec {
            role: EdgeRole::WallToFace,
            radius: 3.0,
        }];
        match plan_fillets(&profile, &req, &dims) {
            Err(FilletError::Overflow {
                role, radius, cap, ..
            }) => {
                assert_eq!(role, EdgeRole::WallToFace);
                assert_eq!(radius, 3.0);
                assert_eq!(cap, 2.0);
            }
            other => panic!("expected overflow, got {other:?}"),
        }
    }

    #[test]
    fn thinner_wall_governs_the_heel() {
        let mut dims = DimensionSet::prusa_6u();
        dims.rail_leg_thickness = 2.0;
        let profile = build_profile(&dims).unwrap();
        let req = [FilletSpec {
            role: EdgeRole::WallToFace,
            radius: 1.5,
        }];
        assert!(plan_fillets(&profile, &req, &dims).is_err());
    }

    #[test]
    fn negative_radius_is_rejected() {
        let dims = DimensionSet::prusa_6u();
        let profile = build_profile(&dims).unwrap();
        let req = [FilletSpec {
            role: EdgeRole::JointRailCorner,
            radius: -1.0,
        }];
        assert!(matches!(
            plan_fillets(&profile, &req, &dims),
            Err(FilletError::InvalidRadius { .. })
        ));
    }
}
