//! Property-based checks of the profile and mirror invariants over random
//! Dimension Sets.

use proptest::prelude::*;

use bracket_planner::{
    build_profile, mirror_plan, plan_bracket, validate_profile, DimensionSet,
};
use bracket_types::{BracketFamily, MirrorAxis};

const TOL: f64 = 1e-6;

/// Cross-section dimensions with the brace kept strictly inside both legs.
fn arb_section() -> impl Strategy<Value = DimensionSet> {
    (
        20.0f64..120.0,
        20.0f64..120.0,
        1.0f64..8.0,
        1.0f64..8.0,
        0.05f64..0.95,
        0.05f64..0.95,
    )
        .prop_map(|(depth, height, tf, tr, bw, bh)| {
            let mut dims = DimensionSet::prusa_6u();
            dims.frame_leg_depth = depth;
            dims.rail_leg_height = height;
            dims.frame_leg_thickness = tf;
            dims.rail_leg_thickness = tr;
            dims.brace_width = depth * bw;
            dims.brace_height = height * bh;
            dims
        })
}

/// Variations that keep the default hole layout on the faces.
fn arb_plannable() -> impl Strategy<Value = DimensionSet> {
    (1.0f64..14.0, 1.0f64..38.0, 1.0f64..8.0, 1.0f64..8.0).prop_map(|(bw, bh, tf, tr)| {
        let mut dims = DimensionSet::prusa_6u();
        dims.brace_width = bw;
        dims.brace_height = bh;
        dims.frame_leg_thickness = tf;
        dims.rail_leg_thickness = tr;
        dims
    })
}

proptest! {
    #[test]
    fn profile_is_simple_and_ccw(dims in arb_section()) {
        let profile = build_profile(&dims).unwrap();
        prop_assert_eq!(profile.len(), 8);
        prop_assert!(profile.signed_area() > 0.0);
        prop_assert!(validate_profile(&profile).is_ok());
    }
}

proptest! {
    #[test]
    fn bounding_box_is_legs_plus_thickness(dims in arb_section()) {
        let bb = build_profile(&dims).unwrap().bounds().unwrap();
        prop_assert!((bb.width() - (dims.frame_leg_depth + dims.rail_leg_thickness)).abs() < TOL);
        prop_assert!((bb.height() - (dims.rail_leg_height + dims.frame_leg_thickness)).abs() < TOL);
    }
}

proptest! {
    #[test]
    fn area_is_two_legs_plus_brace(dims in arb_section()) {
        let area = build_profile(&dims).unwrap().signed_area();
        let expected = (dims.frame_leg_depth + dims.rail_leg_thickness) * dims.frame_leg_thickness
            + dims.rail_leg_thickness * dims.rail_leg_height
            + dims.brace_width * dims.brace_height / 2.0;
        prop_assert!((area - expected).abs() < 1e-6 * expected);
    }
}

proptest! {
    #[test]
    fn mirror_is_an_involution(dims in arb_plannable()) {
        for family in BracketFamily::ALL {
            let plan = plan_bracket(&dims, family).unwrap();
            let once = mirror_plan(&plan, MirrorAxis::Y);
            prop_assert!(once.profile.signed_area() > 0.0);
            prop_assert!(validate_profile(&once.profile).is_ok());
            let twice = mirror_plan(&once, MirrorAxis::Y);
            prop_assert_eq!(&twice, &plan);
        }
    }
}

proptest! {
    #[test]
    fn mirror_preserves_lengths(dims in arb_plannable()) {
        let plan = plan_bracket(&dims, BracketFamily::Top).unwrap();
        let mirrored = mirror_plan(&plan, MirrorAxis::Y);
        prop_assert!((plan.profile.signed_area() - mirrored.profile.signed_area()).abs() < TOL);
        for (a, b) in plan.rail_holes.iter().zip(&mirrored.rail_holes) {
            prop_assert_eq!(a.diameter, b.diameter);
        }
        let mut lhs: Vec<f64> = plan.frame_holes.iter().map(|h| h.center.x.abs()).collect();
        let mut rhs: Vec<f64> = mirrored.frame_holes.iter().map(|h| h.center.x.abs()).collect();
        lhs.sort_by(f64::total_cmp);
        rhs.sort_by(f64::total_cmp);
        prop_assert_eq!(lhs, rhs);
    }
}
