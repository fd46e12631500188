//! Spatial footprint conversion utilities.
//!
//! Providers describe dataset footprints either as Well-Known Text or
//! as GeoJSON geometry objects. Both normalize to a serialized GeoJSON
//! geometry on the output record. The WKT reader covers the geometry
//! types catalogue providers actually emit: POINT, LINESTRING, POLYGON
//! and MULTIPOLYGON. Malformed input is a `FieldParse` error on the
//! `spatial` field.

use serde_json::{json, Value};

use crate::error::{HarvesterError, Result};

fn spatial_err(reason: impl Into<String>) -> HarvesterError {
    HarvesterError::field_parse("spatial", reason)
}

/// Convert a WKT geometry string into a GeoJSON geometry value.
pub fn wkt_to_geojson(wkt: &str) -> Result<Value> {
    let trimmed = wkt.trim();
    let open = trimmed
        .find('(')
        .ok_or_else(|| spatial_err(format!("no coordinate list in '{trimmed}'")))?;
    let (tag, body) = trimmed.split_at(open);
    let tag = tag.trim().to_ascii_uppercase();
    let inner = strip_parens(body.trim())?;

    match tag.as_str() {
        "POINT" => Ok(json!({"type": "Point", "coordinates": parse_position(inner)?})),
        "LINESTRING" => Ok(json!({
            "type": "LineString",
            "coordinates": parse_position_list(inner)?
        })),
        "POLYGON" => Ok(json!({"type": "Polygon", "coordinates": parse_rings(inner)?})),
        "MULTIPOLYGON" => {
            let polygons = split_top_level(inner)
                .into_iter()
                .map(|part| parse_rings(strip_parens(part.trim())?))
                .collect::<Result<Vec<_>>>()?;
            Ok(json!({"type": "MultiPolygon", "coordinates": polygons}))
        }
        other => Err(spatial_err(format!("unsupported WKT type '{other}'"))),
    }
}

/// Normalize a GeoJSON geometry value to its serialized form.
///
/// Accepts either an already-parsed geometry object or a JSON string
/// holding one; validates the `type`/`coordinates` shape and
/// re-serializes for uniformity.
pub fn normalize_geojson(value: &Value) -> Result<String> {
    let geometry = match value {
        Value::String(raw) => serde_json::from_str::<Value>(raw)
            .map_err(|e| spatial_err(format!("invalid GeoJSON string: {e}")))?,
        other => other.clone(),
    };

    let obj = geometry
        .as_object()
        .ok_or_else(|| spatial_err("GeoJSON geometry must be an object"))?;
    if !obj.get("type").is_some_and(Value::is_string) {
        return Err(spatial_err("GeoJSON geometry missing 'type'"));
    }
    if !obj.contains_key("coordinates") {
        return Err(spatial_err("GeoJSON geometry missing 'coordinates'"));
    }

    serde_json::to_string(&geometry).map_err(HarvesterError::from)
}

/// Strip one balanced pair of outer parentheses.
fn strip_parens(s: &str) -> Result<&str> {
    let s = s.trim();
    if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        Ok(&s[1..s.len() - 1])
    } else {
        Err(spatial_err(format!("unbalanced parentheses in '{s}'")))
    }
}

/// Split on commas at parenthesis depth zero.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Parse `"x y"` into a `[lon, lat]` position.
fn parse_position(s: &str) -> Result<Vec<f64>> {
    let coords = s
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| spatial_err(format!("invalid coordinate '{token}'")))
        })
        .collect::<Result<Vec<f64>>>()?;
    if coords.len() < 2 {
        return Err(spatial_err(format!("position '{s}' needs two coordinates")));
    }
    Ok(coords)
}

/// Parse `"x y, x y, ..."` into a position list.
fn parse_position_list(s: &str) -> Result<Vec<Vec<f64>>> {
    let positions = split_top_level(s)
        .into_iter()
        .map(|part| parse_position(part.trim()))
        .collect::<Result<Vec<_>>>()?;
    if positions.is_empty() {
        return Err(spatial_err("empty coordinate list"));
    }
    Ok(positions)
}

/// Parse polygon rings: `"(x y, ...), (x y, ...)"`.
fn parse_rings(s: &str) -> Result<Vec<Vec<Vec<f64>>>> {
    split_top_level(s)
        .into_iter()
        .map(|part| parse_position_list(strip_parens(part.trim())?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_point() {
        let geometry = wkt_to_geojson("POINT (30.5 -10.1)").unwrap();
        assert_eq!(
            geometry,
            json!({"type": "Point", "coordinates": [30.5, -10.1]})
        );
    }

    #[test]
    fn test_linestring() {
        let geometry = wkt_to_geojson("LINESTRING (0 0, 1 1, 2 0)").unwrap();
        assert_eq!(
            geometry,
            json!({"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]]})
        );
    }

    #[test]
    fn test_polygon_with_hole() {
        let geometry =
            wkt_to_geojson("POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0), (1 1, 2 1, 2 2, 1 1))").unwrap();
        assert_eq!(
            geometry,
            json!({
                "type": "Polygon",
                "coordinates": [
                    [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
                    [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]]
                ]
            })
        );
    }

    #[test]
    fn test_multipolygon() {
        let geometry =
            wkt_to_geojson("MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))")
                .unwrap();
        assert_eq!(geometry["type"], json!("MultiPolygon"));
        assert_eq!(geometry["coordinates"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_lowercase_tag_accepted() {
        assert!(wkt_to_geojson("point (1 2)").is_ok());
    }

    #[test]
    fn test_malformed_wkt_errors() {
        assert!(wkt_to_geojson("POLYGON").is_err());
        assert!(wkt_to_geojson("POLYGON ((0 0, 1 x))").is_err());
        assert!(wkt_to_geojson("TRIANGLE ((0 0, 1 0, 0 1))").is_err());
        assert!(wkt_to_geojson("POINT (5)").is_err());
    }

    #[test]
    fn test_normalize_geojson_object() {
        let value = json!({"type": "Point", "coordinates": [1.0, 2.0]});
        let serialized = normalize_geojson(&value).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&serialized).unwrap(),
            value
        );
    }

    #[test]
    fn test_normalize_geojson_string_input() {
        let raw = json!(r#"{"type": "Point", "coordinates": [1, 2]}"#);
        let serialized = normalize_geojson(&raw).unwrap();
        assert!(serialized.contains("Point"));
    }

    #[test]
    fn test_normalize_geojson_rejects_non_geometry() {
        assert!(normalize_geojson(&json!("not json")).is_err());
        assert!(normalize_geojson(&json!({"coordinates": []})).is_err());
        assert!(normalize_geojson(&json!({"type": "Point"})).is_err());
        assert!(normalize_geojson(&json!(42)).is_err());
    }

    #[test]
    fn test_wkt_geojson_round_trip() {
        let wkt = "POLYGON ((-10 35, 15 35, 15 60, -10 60, -10 35))";
        let geometry = wkt_to_geojson(wkt).unwrap();
        let serialized = normalize_geojson(&geometry).unwrap();
        let reparsed: Value = serde_json::from_str(&serialized).unwrap();
        assert_eq!(reparsed, geometry);
    }
}
