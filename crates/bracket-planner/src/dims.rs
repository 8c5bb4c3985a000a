use std::collections::BTreeSet;

use bracket_types::BracketFamily;
use serde::{Deserialize, Serialize};

use crate::error::DimensionError;
use crate::params::ParamMap;

const COMMON_KEYS: &[&str] = &[
    "frame_leg_depth",
    "frame_leg_width",
    "frame_leg_thickness",
    "rail_leg_height",
    "rail_leg_thickness",
    "brace_size",
    "brace_width",
    "brace_height",
    "frame_hole_diameter",
    "frame_hole_spacing",
    "rail_hole_center_diameter",
    "rail_hole_outer_diameter",
    "rail_hole_spacing",
    "rail_hole_offset",
    "min_edge_margin",
    "fillet_cap_ratio",
    "brace_fillet_radius",
    "heel_fillet_radius",
];

const FAMILY_KEYS: &[&str] = &[
    "rail_leg_length",
    "extension_direction",
    "frame_hole_offset",
    "frame_hole_z",
    "frame_hole_count",
    "frame_hole_apex_offset",
    "frame_hole_apex_z",
    "frame_hole_apex_diameter",
    "rail_hole_base_z",
];

const DEFAULT_MIN_EDGE_MARGIN: f64 = 1.0;
const DEFAULT_FILLET_CAP_RATIO: f64 = 0.5;
const DEFAULT_FRAME_HOLE_COUNT: usize = 2;

/// Which way the rail leg continues past the frame leg along the extrusion axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionDirection {
    /// Beyond the far end of the frame leg (+Z).
    Up,
    /// Below the frame leg's start (-Z).
    Down,
}

impl ExtensionDirection {
    pub fn sign(self) -> f64 {
        match self {
            ExtensionDirection::Up => 1.0,
            ExtensionDirection::Down => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "layout")]
pub enum FrameHoleLayout {
    /// `count` holes in a row, `frame_hole_spacing` apart.
    Linear { count: usize },
    /// A pair of holes plus one apex hole at a different offset and height.
    Triangle {
        apex_offset: f64,
        apex_z: f64,
        apex_diameter: f64,
    },
}

/// Dimensions that differ between the top and bottom bracket families.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamilyDimensions {
    /// Total rail leg length along the extrusion axis, frame leg included.
    pub rail_leg_length: f64,
    pub extension_direction: ExtensionDirection,
    /// Distance of the first frame hole from the inside edge.
    pub frame_hole_offset: f64,
    pub frame_hole_z: f64,
    pub frame_holes: FrameHoleLayout,
    /// Z of the lowest rail hole.
    pub rail_hole_base_z: f64,
}

/// Validated scalar parameters for the whole bracket set (mm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSet {
    pub frame_leg_depth: f64,
    pub frame_leg_width: f64,
    pub frame_leg_thickness: f64,
    pub rail_leg_height: f64,
    pub rail_leg_thickness: f64,
    pub brace_width: f64,
    pub brace_height: f64,
    pub frame_hole_diameter: f64,
    pub frame_hole_spacing: f64,
    pub rail_hole_center_diameter: f64,
    pub rail_hole_outer_diameter: f64,
    pub rail_hole_spacing: f64,
    pub rail_hole_offset: f64,
    pub min_edge_margin: f64,
    pub fillet_cap_ratio: f64,
    pub brace_fillet_radius: f64,
    pub heel_fillet_radius: f64,
    pub top: FamilyDimensions,
    pub bottom: FamilyDimensions,
}

/// Typed lookups over a flat parameter map.
struct Reader<'a> {
    params: &'a ParamMap,
}

impl Reader<'_> {
    fn optional(&self, key: &str) -> Option<f64> {
        self.params.get(key).copied()
    }

    fn required(&self, key: &str) -> Result<f64, DimensionError> {
        self.optional(key).ok_or_else(|| DimensionError::Missing {
            key: key.to_string(),
        })
    }
}

fn family_key(family: BracketFamily, key: &str) -> String {
    format!("{}.{}", family.key_prefix(), key)
}

fn check_known_keys(params: &ParamMap) -> Result<(), DimensionError> {
    let mut known: BTreeSet<String> = COMMON_KEYS.iter().map(|k| k.to_string()).collect();
    for family in BracketFamily::ALL {
        known.extend(FAMILY_KEYS.iter().map(|k| family_key(family, k)));
    }
    match params.keys().find(|k| !known.contains(*k)) {
        Some(key) => Err(DimensionError::Unknown { key: key.clone() }),
        None => Ok(()),
    }
}

fn read_family(r: &Reader<'_>, family: BracketFamily) -> Result<FamilyDimensions, DimensionError> {
    let key = |k: &str| family_key(family, k);

    let direction_key = key("extension_direction");
    let extension_direction = match r.required(&direction_key)? {
        d if d == 1.0 => ExtensionDirection::Up,
        d if d == -1.0 => ExtensionDirection::Down,
        d => {
            return Err(DimensionError::Invalid {
                key: direction_key,
                reason: format!("must be +1 or -1, got {d}"),
            })
        }
    };

    let apex_offset = r.optional(&key("frame_hole_apex_offset"));
    let apex_z = r.optional(&key("frame_hole_apex_z"));
    let count = r.optional(&key("frame_hole_count"));
    let frame_holes = match (apex_offset, apex_z) {
        (Some(apex_offset), Some(apex_z)) => {
            if count.is_some() {
                return Err(DimensionError::Invalid {
                    key: key("frame_hole_count"),
                    reason: "not allowed with the triangle (apex) layout".to_string(),
                });
            }
            let apex_diameter = match r.optional(&key("frame_hole_apex_diameter")) {
                Some(d) => d,
                None => r.required("frame_hole_diameter")?,
            };
            FrameHoleLayout::Triangle {
                apex_offset,
                apex_z,
                apex_diameter,
            }
        }
        (None, None) => {
            if r.optional(&key("frame_hole_apex_diameter")).is_some() {
                return Err(DimensionError::Invalid {
                    key: key("frame_hole_apex_diameter"),
                    reason: "only meaningful with the triangle (apex) layout".to_string(),
                });
            }
            let count = match count {
                None => DEFAULT_FRAME_HOLE_COUNT,
                Some(c) if c >= 1.0 && c.fract() == 0.0 => c as usize,
                Some(c) => {
                    return Err(DimensionError::Invalid {
                        key: key("frame_hole_count"),
                        reason: format!("must be a whole number >= 1, got {c}"),
                    })
                }
            };
            FrameHoleLayout::Linear { count }
        }
        (Some(_), None) => {
            return Err(DimensionError::Missing {
                key: key("frame_hole_apex_z"),
            })
        }
        (None, Some(_)) => {
            return Err(DimensionError::Missing {
                key: key("frame_hole_apex_offset"),
            })
        }
    };

    Ok(FamilyDimensions {
        rail_leg_length: r.required(&key("rail_leg_length"))?,
        extension_direction,
        frame_hole_offset: r.required(&key("frame_hole_offset"))?,
        frame_hole_z: r.required(&key("frame_hole_z"))?,
        frame_holes,
        rail_hole_base_z: r.required(&key("rail_hole_base_z"))?,
    })
}

fn positive(key: &str, value: f64) -> Result<(), DimensionError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(DimensionError::NonPositive {
            key: key.to_string(),
            value,
        })
    }
}

fn ensure(
    condition: bool,
    key: &str,
    reason: impl FnOnce() -> String,
) -> Result<(), DimensionError> {
    if condition {
        Ok(())
    } else {
        Err(DimensionError::Invalid {
            key: key.to_string(),
            reason: reason(),
        })
    }
}

impl DimensionSet {
    /// Parse and validate a flat parameter map.
    pub fn from_params(params: &ParamMap) -> Result<Self, DimensionError> {
        check_known_keys(params)?;
        let r = Reader { params };

        let brace_size = r.optional("brace_size");
        let brace_leg = |key: &str| match (r.optional(key), brace_size) {
            (Some(v), _) | (None, Some(v)) => Ok(v),
            (None, None) => Err(DimensionError::Missing {
                key: "brace_size".to_string(),
            }),
        };

        let dims = DimensionSet {
            frame_leg_depth: r.required("frame_leg_depth")?,
            frame_leg_width: r.required("frame_leg_width")?,
            frame_leg_thickness: r.required("frame_leg_thickness")?,
            rail_leg_height: r.required("rail_leg_height")?,
            rail_leg_thickness: r.required("rail_leg_thickness")?,
            brace_width: brace_leg("brace_width")?,
            brace_height: brace_leg("brace_height")?,
            frame_hole_diameter: r.required("frame_hole_diameter")?,
            frame_hole_spacing: r.required("frame_hole_spacing")?,
            rail_hole_center_diameter: r.required("rail_hole_center_diameter")?,
            rail_hole_outer_diameter: r.required("rail_hole_outer_diameter")?,
            rail_hole_spacing: r.required("rail_hole_spacing")?,
            rail_hole_offset: r.required("rail_hole_offset")?,
            min_edge_margin: r
                .optional("min_edge_margin")
                .unwrap_or(DEFAULT_MIN_EDGE_MARGIN),
            fillet_cap_ratio: r
                .optional("fillet_cap_ratio")
                .unwrap_or(DEFAULT_FILLET_CAP_RATIO),
            brace_fillet_radius: r.optional("brace_fillet_radius").unwrap_or(0.0),
            heel_fillet_radius: r.optional("heel_fillet_radius").unwrap_or(0.0),
            top: read_family(&r, BracketFamily::Top)?,
            bottom: read_family(&r, BracketFamily::Bottom)?,
        };
        dims.validate()?;
        Ok(dims)
    }

    /// The rack brackets for a Prusa-style frame in a 6U rack.
    pub fn prusa_6u() -> Self {
        DimensionSet {
            frame_leg_depth: 45.0,
            frame_leg_width: 40.0,
            frame_leg_thickness: 4.0,
            rail_leg_height: 39.0,
            rail_leg_thickness: 4.0,
            brace_width: 10.0,
            brace_height: 10.0,
            frame_hole_diameter: 3.2,
            frame_hole_spacing: 20.0,
            rail_hole_center_diameter: 6.3,
            rail_hole_outer_diameter: 4.6,
            rail_hole_spacing: 16.0,
            rail_hole_offset: 19.5,
            min_edge_margin: DEFAULT_MIN_EDGE_MARGIN,
            fillet_cap_ratio: DEFAULT_FILLET_CAP_RATIO,
            brace_fillet_radius: 0.0,
            heel_fillet_radius: 0.0,
            top: FamilyDimensions {
                rail_leg_length: 97.0,
                extension_direction: ExtensionDirection::Up,
                frame_hole_offset: 17.5,
                frame_hole_z: 10.0,
                frame_holes: FrameHoleLayout::Linear { count: 2 },
                rail_hole_base_z: 54.0,
            },
            bottom: FamilyDimensions {
                rail_leg_length: 95.0,
                extension_direction: ExtensionDirection::Down,
                frame_hole_offset: 17.5,
                frame_hole_z: 10.0,
                frame_holes: FrameHoleLayout::Triangle {
                    apex_offset: 27.5,
                    apex_z: 30.0,
                    apex_diameter: 3.2,
                },
                rail_hole_base_z: -43.5,
            },
        }
    }

    pub fn family(&self, family: BracketFamily) -> &FamilyDimensions {
        match family {
            BracketFamily::Top => &self.top,
            BracketFamily::Bottom => &self.bottom,
        }
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), DimensionError> {
        let lengths = [
            ("frame_leg_depth", self.frame_leg_depth),
            ("frame_leg_width", self.frame_leg_width),
            ("frame_leg_thickness", self.frame_leg_thickness),
            ("rail_leg_height", self.rail_leg_height),
            ("rail_leg_thickness", self.rail_leg_thickness),
            ("brace_width", self.brace_width),
            ("brace_height", self.brace_height),
            ("frame_hole_diameter", self.frame_hole_diameter),
            ("frame_hole_spacing", self.frame_hole_spacing),
            ("rail_hole_center_diameter", self.rail_hole_center_diameter),
            ("rail_hole_outer_diameter", self.rail_hole_outer_diameter),
            ("rail_hole_spacing", self.rail_hole_spacing),
            ("rail_hole_offset", self.rail_hole_offset),
            ("fillet_cap_ratio", self.fillet_cap_ratio),
        ];
        for (key, value) in lengths {
            positive(key, value)?;
        }

        let smallest_leg = self
            .frame_leg_depth
            .min(self.frame_leg_width)
            .min(self.rail_leg_height);
        for (key, t) in [
            ("frame_leg_thickness", self.frame_leg_thickness),
            ("rail_leg_thickness", self.rail_leg_thickness),
        ] {
            ensure(t <= smallest_leg, key, || {
                format!("thickness {t} exceeds the smallest leg dimension {smallest_leg}")
            })?;
        }

        ensure(self.brace_width < self.frame_leg_depth, "brace_width", || {
            format!(
                "brace {} must be shorter than the frame leg {}",
                self.brace_width, self.frame_leg_depth
            )
        })?;
        ensure(self.brace_height < self.rail_leg_height, "brace_height", || {
            format!(
                "brace {} must be shorter than the rail leg {}",
                self.brace_height, self.rail_leg_height
            )
        })?;

        let frame_face = (self.frame_leg_depth - self.brace_width).min(self.frame_leg_width);
        ensure(self.frame_hole_diameter < frame_face, "frame_hole_diameter", || {
            format!(
                "hole {} does not fit the frame face ({frame_face})",
                self.frame_hole_diameter
            )
        })?;
        for (key, d) in [
            ("rail_hole_center_diameter", self.rail_hole_center_diameter),
            ("rail_hole_outer_diameter", self.rail_hole_outer_diameter),
        ] {
            ensure(d < self.rail_leg_height, key, || {
                format!("hole {d} does not fit the rail face ({})", self.rail_leg_height)
            })?;
        }

        ensure(
            self.min_edge_margin >= 0.0 && self.min_edge_margin.is_finite(),
            "min_edge_margin",
            || format!("must be >= 0, got {}", self.min_edge_margin),
        )?;
        ensure(self.fillet_cap_ratio <= 1.0, "fillet_cap_ratio", || {
            format!("must be in (0, 1], got {}", self.fillet_cap_ratio)
        })?;
        for (key, r) in [
            ("brace_fillet_radius", self.brace_fillet_radius),
            ("heel_fillet_radius", self.heel_fillet_radius),
        ] {
            ensure(r >= 0.0 && r.is_finite(), key, || format!("must be >= 0, got {r}"))?;
        }

        for family in BracketFamily::ALL {
            self.validate_family(family)?;
        }
        Ok(())
    }

    fn validate_family(&self, family: BracketFamily) -> Result<(), DimensionError> {
        let f = self.family(family);
        let key = |k: &str| family_key(family, k);

        positive(&key("rail_leg_length"), f.rail_leg_length)?;
        positive(&key("frame_hole_offset"), f.frame_hole_offset)?;
        ensure(
            f.rail_leg_length >= self.frame_leg_width,
            &key("rail_leg_length"),
            || {
                format!(
                    "{} is shorter than the frame leg width {}",
                    f.rail_leg_length, self.frame_leg_width
                )
            },
        )?;
        for (k, v) in [
            ("frame_hole_z", f.frame_hole_z),
            ("rail_hole_base_z", f.rail_hole_base_z),
        ] {
            ensure(v.is_finite(), &key(k), || format!("must be finite, got {v}"))?;
        }
        match f.frame_holes {
            FrameHoleLayout::Linear { count } => {
                ensure(count >= 1, &key("frame_hole_count"), || {
                    "must be at least 1".to_string()
                })?;
                // The row runs outward from the first hole; the last one must
                // still sit on the frame leg.
                let reach = f.frame_hole_offset
                    + count.saturating_sub(1) as f64 * self.frame_hole_spacing;
                ensure(reach <= self.frame_leg_depth, &key("frame_hole_count"), || {
                    format!(
                        "{count} holes at spacing {} reach {reach}, past the frame leg {}",
                        self.frame_hole_spacing, self.frame_leg_depth
                    )
                })?;
            }
            FrameHoleLayout::Triangle {
                apex_offset,
                apex_z,
                apex_diameter,
            } => {
                positive(&key("frame_hole_apex_offset"), apex_offset)?;
                positive(&key("frame_hole_apex_diameter"), apex_diameter)?;
                ensure(apex_z.is_finite(), &key("frame_hole_apex_z"), || {
                    format!("must be finite, got {apex_z}")
                })?;
            }
        }
        Ok(())
    }

    /// Flat parameter map that [`DimensionSet::from_params`] reads back unchanged.
    pub fn to_params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        let mut put = |k: &str, v: f64| {
            map.insert(k.to_string(), v);
        };
        put("frame_leg_depth", self.frame_leg_depth);
        put("frame_leg_width", self.frame_leg_width);
        put("frame_leg_thickness", self.frame_leg_thickness);
        put("rail_leg_height", self.rail_leg_height);
        put("rail_leg_thickness", self.rail_leg_thickness);
        put("brace_width", self.brace_width);
        put("brace_height", self.brace_height);
        put("frame_hole_diameter", self.frame_hole_diameter);
        put("frame_hole_spacing", self.frame_hole_spacing);
        put("rail_hole_center_diameter", self.rail_hole_center_diameter);
        put("rail_hole_outer_diameter", self.rail_hole_outer_diameter);
        put("rail_hole_spacing", self.rail_hole_spacing);
        put("rail_hole_offset", self.rail_hole_offset);
        put("min_edge_margin", self.min_edge_margin);
        put("fillet_cap_ratio", self.fillet_cap_ratio);
        put("brace_fillet_radius", self.brace_fillet_radius);
        put("heel_fillet_radius", self.heel_fillet_radius);
        for family in BracketFamily::ALL {
            let f = self.family(family);
            let key = |k: &str| family_key(family, k);
            put(&key("rail_leg_length"), f.rail_leg_length);
            put(&key("extension_direction"), f.extension_direction.sign());
            put(&key("frame_hole_offset"), f.frame_hole_offset);
            put(&key("frame_hole_z"), f.frame_hole_z);
            put(&key("rail_hole_base_z"), f.rail_hole_base_z);
            match f.frame_holes {
                FrameHoleLayout::Linear { count } => {
                    put(&key("frame_hole_count"), count as f64);
                }
                FrameHoleLayout::Triangle {
                    apex_offset,
                    apex_z,
                    apex_diameter,
                } => {
                    put(&key("frame_hole_apex_offset"), apex_offset);
                    put(&key("frame_hole_apex_z"), apex_z);
                    put(&key("frame_hole_apex_diameter"), apex_diameter);
                }
            }
        }
        map
    }
}
