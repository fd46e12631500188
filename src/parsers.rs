//! Named field parsers applied to raw extracted values.
//!
//! A collection description tags each mandatory field with the parser
//! to run on its raw value. The set is closed: parser tags deserialize
//! into this enum, so unknown tags are rejected when the schema loads,
//! not when an entry is built. Tags are the literal names used by the
//! provider description files (`"custom"` and `"WKT"` included).

use serde::Deserialize;
use serde_json::Value;

use crate::error::{HarvesterError, Result};
use crate::path::as_scalar_string;
use crate::spatial::{normalize_geojson, wkt_to_geojson};

/// Which end of a time range a parser is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Start,
    End,
}

/// Closed set of field parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FieldParser {
    /// The raw value is a single instant; start and end are equal.
    #[serde(rename = "single_date")]
    SingleDate,

    /// Positional date-in-title extraction: the source string is split
    /// on whitespace and the date token sits at a fixed offset from
    /// the end. Third-from-last token for the start role, last token
    /// for the end role. The offsets are a literal reproduction of one
    /// provider's title format.
    #[serde(rename = "custom")]
    TitleToken,

    /// `start/end` range in one value; without a `/` the single value
    /// covers both roles.
    #[serde(rename = "complete_slash")]
    CompleteSlash,

    /// Well-Known-Text geometry, re-emitted as serialized GeoJSON.
    #[serde(rename = "WKT")]
    Wkt,

    /// GeoJSON geometry passed through, re-serialized for uniformity.
    #[serde(rename = "GeoJSON")]
    GeoJson,
}

impl FieldParser {
    /// The wire tag this parser deserializes from.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleDate => "single_date",
            Self::TitleToken => "custom",
            Self::CompleteSlash => "complete_slash",
            Self::Wkt => "WKT",
            Self::GeoJson => "GeoJSON",
        }
    }

    /// Apply this parser to a resolved raw value.
    ///
    /// The date parsers never fail on missing separators; they degrade
    /// to the same value for both roles. The spatial parsers fail with
    /// `FieldParse` on malformed geometry.
    pub fn apply(&self, raw: &Value, role: Role) -> Result<String> {
        match self {
            Self::SingleDate => scalar(raw, self.as_str()),
            Self::TitleToken => {
                let text = scalar(raw, self.as_str())?;
                Ok(title_token(&text, role))
            }
            Self::CompleteSlash => {
                let text = scalar(raw, self.as_str())?;
                Ok(complete_slash(&text, role))
            }
            Self::Wkt => {
                let text = scalar(raw, "spatial")?;
                normalize_geojson(&wkt_to_geojson(&text)?)
            }
            Self::GeoJson => normalize_geojson(raw),
        }
    }
}

fn scalar(raw: &Value, field: &str) -> Result<String> {
    as_scalar_string(raw)
        .ok_or_else(|| HarvesterError::field_parse(field, format!("expected a scalar, got {raw}")))
}

/// Pick the date token out of a whitespace-split title.
///
/// Falls back to the whole string when the title has fewer tokens than
/// the offset expects.
fn title_token(text: &str, role: Role) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let picked = match role {
        Role::Start => tokens.len().checked_sub(3).and_then(|i| tokens.get(i)),
        Role::End => tokens.last(),
    };
    picked.map_or_else(|| text.trim().to_string(), |t| (*t).to_string())
}

fn complete_slash(text: &str, role: Role) -> String {
    match text.split_once('/') {
        Some((start, end)) => match role {
            Role::Start => start.to_string(),
            Role::End => end.to_string(),
        },
        None => text.to_string(),
    }
}
