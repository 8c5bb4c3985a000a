//! Loading Dimension Set parameter maps from JSON or TOML.
//!
//! Nested tables are flattened into dotted keys, so
//! `[top] rail_leg_length = 97` and `"top.rail_leg_length" = 97` are equivalent.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::DimensionError;

/// Flat `name -> value` map, lengths in mm.
pub type ParamMap = BTreeMap<String, f64>;

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn flatten_json_into(
    prefix: &str,
    value: &serde_json::Value,
    out: &mut ParamMap,
) -> Result<(), DimensionError> {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                flatten_json_into(&join(prefix, k), v, out)?;
            }
            Ok(())
        }
        serde_json::Value::Number(n) => {
            let v = n.as_f64().ok_or_else(|| DimensionError::Parse {
                reason: format!("'{prefix}' is not representable as a number"),
            })?;
            out.insert(prefix.to_string(), v);
            Ok(())
        }
        other => Err(DimensionError::Parse {
            reason: format!("'{prefix}' must be a number, got {other}"),
        }),
    }
}

fn flatten_toml_into(
    prefix: &str,
    value: &toml::Value,
    out: &mut ParamMap,
) -> Result<(), DimensionError> {
    match value {
        toml::Value::Table(table) => {
            for (k, v) in table {
                flatten_toml_into(&join(prefix, k), v, out)?;
            }
            Ok(())
        }
        toml::Value::Integer(i) => {
            out.insert(prefix.to_string(), *i as f64);
            Ok(())
        }
        toml::Value::Float(f) => {
            out.insert(prefix.to_string(), *f);
            Ok(())
        }
        other => Err(DimensionError::Parse {
            reason: format!("'{prefix}' must be a number, got {}", other.type_str()),
        }),
    }
}

pub fn parse_json(text: &str) -> Result<ParamMap, DimensionError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| DimensionError::Parse {
            reason: e.to_string(),
        })?;
    if !value.is_object() {
        return Err(DimensionError::Parse {
            reason: "top level must be an object".to_string(),
        });
    }
    let mut out = ParamMap::new();
    flatten_json_into("", &value, &mut out)?;
    Ok(out)
}

pub fn parse_toml(text: &str) -> Result<ParamMap, DimensionError> {
    let value: toml::Value = toml::from_str(text).map_err(|e| DimensionError::Parse {
        reason: e.to_string(),
    })?;
    let mut out = ParamMap::new();
    flatten_toml_into("", &value, &mut out)?;
    Ok(out)
}

/// Read a parameter file, choosing the format by extension (`.json` or `.toml`).
pub fn load_file(path: &Path) -> Result<ParamMap, DimensionError> {
    let text = std::fs::read_to_string(path).map_err(|e| DimensionError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_json(&text),
        Some("toml") => parse_toml(&text),
        _ => Err(DimensionError::Parse {
            reason: format!(
                "'{}' has no .json or .toml extension",
                path.display()
            ),
        }),
    }
}

/// Render a flat map back into nested TOML tables.
pub fn to_toml_string(params: &ParamMap) -> Result<String, DimensionError> {
    let mut root = toml::map::Map::new();
    let mut sections: BTreeMap<&str, toml::map::Map<String, toml::Value>> = BTreeMap::new();
    for (key, value) in params {
        match key.split_once('.') {
            Some((section, rest)) => {
                sections
                    .entry(section)
                    .or_default()
                    .insert(rest.to_string(), toml::Value::Float(*value));
            }
            None => {
                root.insert(key.clone(), toml::Value::Float(*value));
            }
        }
    }
    for (section, table) in sections {
        root.insert(section.to_string(), toml::Value::Table(table));
    }
    toml::to_string(&toml::Value::Table(root)).map_err(|e| DimensionError::Parse {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_json_flattens_to_dotted_keys() {
        let map = parse_json(r#"{"frame_leg_depth": 45, "top": {"rail_leg_length": 97.5}}"#)
            .unwrap();
        assert_eq!(map["frame_leg_depth"], 45.0);
        assert_eq!(map["top.rail_leg_length"], 97.5);
    }

    #[test]
    fn toml_tables_and_dotted_keys_agree() {
        let a = parse_toml("[top]\nrail_leg_length = 97\n").unwrap();
        let b = parse_toml("\"top.rail_leg_length\" = 97.0\n").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let err = parse_json(r#"{"frame_leg_depth": "45"}"#).unwrap_err();
        assert!(matches!(err, DimensionError::Parse { .. }));
        assert!(parse_toml("frame_leg_depth = true").is_err());
        assert!(parse_json("[1, 2]").is_err());
    }

    #[test]
    fn toml_rendering_parses_back() {
        let mut map = ParamMap::new();
        map.insert("frame_leg_depth".into(), 45.0);
        map.insert("bottom.rail_hole_base_z".into(), -43.5);
        let text = to_toml_string(&map).unwrap();
        assert_eq!(parse_toml(&text).unwrap(), map);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_file(Path::new("/nonexistent/dims.toml")).unwrap_err();
        assert!(matches!(err, DimensionError::Io { .. }));
    }
}
