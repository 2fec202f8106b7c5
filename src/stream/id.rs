use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::delays::Delays;
use crate::logging::log_horizon_reset;

/// Separator between a horizon prefix and a stream name, e.g. `310::bart_delays`.
pub const HORIZON_SEP: &str = "::";
/// Separator between segments of a composite stream name.
pub const SEGMENT_SEP: char = '~';
const JSON_SUFFIX: &str = ".json";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("query has no stream parameter")]
    MissingStream,
    #[error("stream name is empty")]
    EmptyName,
    #[error("stream name {0:?} contains a reserved '::' separator")]
    ReservedSeparator(String),
}

/// Competition family of a stream, decided once from its leading segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Plain,
    Z1,
    Z2,
    Z3,
}

impl Family {
    fn from_marker(segment: &str) -> Self {
        match segment {
            "z1" => Family::Z1,
            "z2" => Family::Z2,
            "z3" => Family::Z3,
            _ => Family::Plain,
        }
    }

    pub fn is_z(&self) -> bool {
        !matches!(self, Family::Plain)
    }
}

/// `[horizon::]base[~modifier]*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamId {
    pub horizon: Option<u64>,
    pub base: String,
    pub modifiers: Vec<String>,
    pub family: Family,
}

impl StreamId {
    /// Parse a bare name (no horizon prefix, no `.json` suffix).
    pub fn from_name(name: &str) -> Result<Self, CodecError> {
        if name.is_empty() {
            return Err(CodecError::EmptyName);
        }
        if name.contains(HORIZON_SEP) {
            return Err(CodecError::ReservedSeparator(name.to_string()));
        }
        let mut segments = name.split(SEGMENT_SEP).map(str::to_string);
        let base = segments.next().unwrap_or_default();
        let modifiers: Vec<String> = segments.collect();
        let family = if modifiers.is_empty() {
            Family::Plain
        } else {
            Family::from_marker(&base)
        };
        Ok(Self {
            horizon: None,
            base,
            modifiers,
            family,
        })
    }

    /// Parse a server dictionary key such as `310::bart_delays.json`.
    ///
    /// A horizon prefix outside the permitted set is reset to the smallest
    /// permitted delay, as for query parameters.
    pub fn from_dictionary_key(key: &str, delays: &Delays) -> Result<Self, CodecError> {
        let trimmed = key.trim().trim_end_matches('"');
        let trimmed = trimmed.strip_suffix(JSON_SUFFIX).unwrap_or(trimmed);
        Self::from_display_name(trimmed, delays)
    }

    /// Parse a listing label such as `70::z1~bart_delays~70`.
    pub fn from_display_name(label: &str, delays: &Delays) -> Result<Self, CodecError> {
        let (horizon, name) = split_horizon(label)?;
        let mut id = Self::from_name(name)?;
        id.horizon = horizon.and_then(|h| resolve_horizon(h, delays));
        Ok(id)
    }

    /// Read `stream` and `horizon` from a query string or full URL.
    ///
    /// A horizon outside the permitted set is reset to the smallest
    /// permitted delay. A `H::` prefix on the stream value is used when no
    /// explicit horizon parameter is present.
    pub fn parse_query(raw: &str, delays: &Delays) -> Result<Self, CodecError> {
        let query = if raw.contains("://") {
            raw.split_once('?').map(|(_, q)| q).unwrap_or_default()
        } else {
            raw.strip_prefix('?').unwrap_or(raw)
        };
        let query = query.split('#').next().unwrap_or_default();

        let mut stream = None;
        let mut horizon_raw = None;
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            match k.as_ref() {
                "stream" => stream = Some(v.into_owned()),
                "horizon" => horizon_raw = Some(v.into_owned()),
                _ => {}
            }
        }

        let stream = stream.filter(|s| !s.trim().is_empty()).ok_or(CodecError::MissingStream)?;
        let stream = stream.trim();
        let stream = stream.strip_suffix(JSON_SUFFIX).unwrap_or(stream);

        let (prefixed, name) = split_horizon(stream)?;
        let mut id = Self::from_name(name)?;
        let raw_horizon = match horizon_raw {
            Some(h) if !h.trim().is_empty() => Some(h),
            _ => prefixed.map(|h| h.to_string()),
        };
        id.horizon = raw_horizon.as_deref().and_then(|h| resolve_horizon(h, delays));
        Ok(id)
    }

    /// `base~modifier~...`
    pub fn name(&self) -> String {
        let mut out = self.base.clone();
        for m in &self.modifiers {
            out.push(SEGMENT_SEP);
            out.push_str(m);
        }
        out
    }

    /// Key for the leaderboards and live endpoints.
    pub fn request_key(&self) -> String {
        match self.horizon {
            Some(h) => format!("{}{}{}{}", h, HORIZON_SEP, self.name(), JSON_SUFFIX),
            None => format!("{}{}", self.name(), JSON_SUFFIX),
        }
    }

    /// Lagged series are published per stream, independent of horizon.
    pub fn lagged_key(&self) -> String {
        format!("{}{}", self.name(), JSON_SUFFIX)
    }

    pub fn with_horizon(&self, horizon: Option<u64>) -> Self {
        Self {
            horizon,
            ..self.clone()
        }
    }

    /// Competition delay carried as the last segment of a z-stream name.
    pub fn trailing_delay(&self, delays: &Delays) -> Option<u64> {
        let last = self.modifiers.last()?;
        if delays.is_delay_str(last) {
            last.parse().ok()
        } else {
            None
        }
    }

    /// Segments between the first and last `~` of a z1 stream.
    pub fn z1_parent(&self) -> Option<String> {
        if self.family != Family::Z1 {
            return None;
        }
        let (_, inner) = self.modifiers.split_last()?;
        if inner.is_empty() {
            return None;
        }
        Some(inner.join(SEGMENT_SEP.to_string().as_str()))
    }

    /// Component stream names of a z-stream, without the family marker or
    /// the numeric trailing segment. Empty for plain streams.
    pub fn components(&self) -> Vec<String> {
        if !self.family.is_z() {
            return Vec::new();
        }
        let mut parts: &[String] = &self.modifiers;
        if let Some((last, rest)) = parts.split_last() {
            if !rest.is_empty() && last.parse::<u64>().is_ok() {
                parts = rest;
            }
        }
        parts.to_vec()
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.horizon {
            Some(h) => write!(f, "{}{}{}", h, HORIZON_SEP, self.name()),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// Permitted delays pass through; anything else becomes the smallest.
fn resolve_horizon(raw: &str, delays: &Delays) -> Option<u64> {
    let resolved = delays.resolve(raw)?;
    if raw.trim() != resolved.to_string() {
        log_horizon_reset(raw, resolved);
    }
    Some(resolved)
}

fn split_horizon(label: &str) -> Result<(Option<&str>, &str), CodecError> {
    match label.split_once(HORIZON_SEP) {
        Some((h, rest)) if h.parse::<u64>().is_ok() => Ok((Some(h), rest)),
        Some(_) => Err(CodecError::ReservedSeparator(label.to_string())),
        None => Ok((None, label)),
    }
}

/// Plain stream names offered by the chooser, in dictionary order.
pub fn chooser_streams<'a>(keys: impl IntoIterator<Item = &'a str>, delays: &Delays) -> Vec<String> {
    keys.into_iter()
        .filter_map(|key| StreamId::from_dictionary_key(key, delays).ok())
        .filter(|id| id.horizon.is_none() && id.modifiers.is_empty())
        .map(|id| id.base)
        .collect()
}

/// Secondary and tertiary filters wrap the primary choice when a secondary is set.
pub fn compose_selection(primary: &str, secondary: &str, tertiary: &str) -> String {
    if secondary.is_empty() {
        primary.to_string()
    } else {
        format!("{}{}{}", secondary, primary, tertiary)
    }
}
