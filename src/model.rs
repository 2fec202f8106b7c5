//! Typed payloads decoded from the prediction API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fetch::{FetchError, Fetched};

/// One dashboard section's data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Section<T> {
    Ready(T),
    NoData,
    Failed(FetchError),
}

impl<T> Section<T> {
    /// `decode` returns `Ok(None)` for a well-formed but empty payload.
    pub fn from_fetched(fetched: Fetched, decode: impl FnOnce(Value) -> Result<Option<T>, String>) -> Self {
        match fetched {
            Fetched::Data(v) => match decode(v) {
                Ok(Some(t)) => Section::Ready(t),
                Ok(None) => Section::NoData,
                Err(e) => Section::Failed(FetchError::Malformed(e)),
            },
            Fetched::Null | Fetched::Empty => Section::NoData,
            Fetched::Failed(e) => Section::Failed(e),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(t) => Some(t),
            _ => None,
        }
    }

    pub fn state(&self) -> &'static str {
        match self {
            Section::Ready(_) => "ready",
            Section::NoData => "no_data",
            Section::Failed(_) => "failed",
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Section<U> {
        match self {
            Section::Ready(t) => Section::Ready(f(t)),
            Section::NoData => Section::NoData,
            Section::Failed(e) => Section::Failed(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub participant_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaggedPoint {
    pub timestamp: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeEntry {
    pub sponsor_key: String,
    pub value: f64,
    /// Display name resolved through the per-item endpoint.
    pub sponsor: Option<String>,
}

impl PrizeEntry {
    /// Last path segment of the sponsor key, the lookup code for its display name.
    pub fn sponsor_code(&self) -> &str {
        self.sponsor_key.rsplit('/').next().unwrap_or(&self.sponsor_key)
    }

    pub fn display_sponsor(&self) -> &str {
        self.sponsor.as_deref().unwrap_or_else(|| self.sponsor_code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Numbers arrive either as JSON numbers or numeric strings.
pub fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_or_err(v: &Value, what: &str) -> Result<f64, String> {
    as_number(v).ok_or_else(|| format!("{} is not numeric: {}", what, v))
}

/// `{participant: score, ...}` in server order; rank is position from 1.
pub fn decode_leaderboard(v: Value) -> Result<Option<Vec<LeaderboardEntry>>, String> {
    let Value::Object(map) = v else {
        return Err("leaderboard is not an object".to_string());
    };
    if map.is_empty() {
        return Ok(None);
    }
    map.iter()
        .enumerate()
        .map(|(i, (participant, score))| {
            Ok(LeaderboardEntry {
                rank: i as u32 + 1,
                participant_id: participant.clone(),
                score: number_or_err(score, participant)?,
            })
        })
        .collect::<Result<Vec<_>, String>>()
        .map(Some)
}

pub fn decode_current_value(v: Value) -> Result<Option<f64>, String> {
    number_or_err(&v, "live value").map(Some)
}

/// `[[ts, value], ...]`, keeping at most `limit` points from the front.
pub fn decode_lagged(v: Value, limit: usize) -> Result<Option<Vec<LaggedPoint>>, String> {
    let Value::Array(rows) = v else {
        return Err("lagged values are not a list".to_string());
    };
    if rows.is_empty() {
        return Ok(None);
    }
    rows.iter()
        .take(limit)
        .map(|row| {
            let pair = row.as_array().filter(|p| p.len() >= 2).ok_or_else(|| format!("lagged row is not a pair: {}", row))?;
            Ok(LaggedPoint {
                timestamp: number_or_err(&pair[0], "timestamp")? as i64,
                value: number_or_err(&pair[1], "lagged value")?,
            })
        })
        .collect::<Result<Vec<_>, String>>()
        .map(Some)
}

pub fn decode_prizes(v: Value) -> Result<Option<Vec<PrizeEntry>>, String> {
    let Value::Object(map) = v else {
        return Err("prizes are not an object".to_string());
    };
    if map.is_empty() {
        return Ok(None);
    }
    map.iter()
        .map(|(key, value)| {
            Ok(PrizeEntry {
                sponsor_key: key.clone(),
                value: number_or_err(value, key)?,
                sponsor: None,
            })
        })
        .collect::<Result<Vec<_>, String>>()
        .map(Some)
}

/// `{stream_key: budget}` in server order. Non-numeric budgets read as 0.
pub fn decode_budgets(v: Value) -> Result<Option<Vec<(String, f64)>>, String> {
    let Value::Object(map) = v else {
        return Err("budgets are not an object".to_string());
    };
    if map.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        map.iter()
            .map(|(k, b)| (k.clone(), as_number(b).unwrap_or(0.0)))
            .collect(),
    ))
}

/// Accepts a figure `{"data": [trace, ..]}`, a bare trace list, or a single
/// trace `{"x": [..], "y": [..]}`; the first trace is used.
pub fn decode_chart(v: Value) -> Result<Option<ChartSeries>, String> {
    let trace = match &v {
        Value::Object(m) if m.contains_key("data") => m.get("data").and_then(|d| d.as_array()).and_then(|a| a.first()),
        Value::Object(_) => Some(&v),
        Value::Array(a) => a.first(),
        _ => return Err("chart payload is not a figure".to_string()),
    };
    let Some(trace) = trace else {
        return Ok(None);
    };
    let axis = |name: &str| -> Result<Vec<f64>, String> {
        trace
            .get(name)
            .and_then(|a| a.as_array())
            .ok_or_else(|| format!("trace has no {} axis", name))?
            .iter()
            .map(|p| number_or_err(p, name))
            .collect()
    };
    let (x, y) = (axis("x")?, axis("y")?);
    if x.len() != y.len() {
        return Err(format!("trace axes differ in length: {} vs {}", x.len(), y.len()));
    }
    if x.is_empty() {
        return Ok(None);
    }
    Ok(Some(ChartSeries { x, y }))
}
