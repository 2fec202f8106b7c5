use serde::{Deserialize, Serialize};

pub const DEFAULT_DELAYS: [u64; 4] = [70, 310, 910, 3555];

/// Permitted prediction horizons in seconds. Always sorted, deduplicated and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>")]
pub struct Delays(Vec<u64>);

impl TryFrom<Vec<u64>> for Delays {
    type Error = String;

    fn try_from(values: Vec<u64>) -> Result<Self, Self::Error> {
        if values.is_empty() {
            return Err("delay list must not be empty".to_string());
        }
        Ok(Self::new(values))
    }
}

impl Delays {
    pub fn new(values: impl IntoIterator<Item = u64>) -> Self {
        let mut v: Vec<u64> = values.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        if v.is_empty() {
            return Self::default();
        }
        Self(v)
    }

    /// Comma separated list; unparseable entries are ignored.
    pub fn parse_list(raw: &str) -> Self {
        Self::new(raw.split(',').filter_map(|s| s.trim().parse().ok()))
    }

    pub fn contains(&self, delay: u64) -> bool {
        self.0.binary_search(&delay).is_ok()
    }

    /// Reset target for out-of-range horizons.
    pub fn smallest(&self) -> u64 {
        self.0.first().copied().unwrap_or(DEFAULT_DELAYS[0])
    }

    pub fn largest(&self) -> u64 {
        self.0.last().copied().unwrap_or(DEFAULT_DELAYS[DEFAULT_DELAYS.len() - 1])
    }

    /// Delays offered by the "Go to Z1" menu.
    pub fn first_and_last(&self) -> Vec<u64> {
        if self.0.len() == 1 {
            vec![self.smallest()]
        } else {
            vec![self.smallest(), self.largest()]
        }
    }

    /// Coerce a raw horizon parameter. Empty means no horizon.
    pub fn resolve(&self, raw: &str) -> Option<u64> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<u64>() {
            Ok(d) if self.contains(d) => Some(d),
            _ => Some(self.smallest()),
        }
    }

    pub fn is_delay_str(&self, s: &str) -> bool {
        s.parse::<u64>().map(|d| self.contains(d)).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }
}

impl Default for Delays {
    fn default() -> Self {
        Self(DEFAULT_DELAYS.to_vec())
    }
}
