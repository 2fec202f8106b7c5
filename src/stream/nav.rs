//! Navigation targets derived from a stream identifier.

use serde::{Deserialize, Serialize};

use super::delays::Delays;
use super::id::{Family, StreamId, SEGMENT_SEP};

pub const DASHBOARD_PAGE: &str = "stream_dashboard.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavKind {
    GoToStream,
    Competitions,
    Parent,
    GoToZ1,
    Horizon,
    Listing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavTarget {
    pub kind: NavKind,
    pub label: String,
    pub stream: String,
    pub horizon: Option<u64>,
}

impl NavTarget {
    fn new(kind: NavKind, label: impl Into<String>, stream: impl Into<String>, horizon: Option<u64>) -> Self {
        Self {
            kind,
            label: label.into(),
            stream: stream.into(),
            horizon,
        }
    }

    /// Dashboard link for a listed stream; `310::x` opens `stream=x&horizon=310`.
    pub fn dashboard(id: &StreamId) -> Self {
        Self::new(NavKind::Listing, id.to_string(), id.name(), id.horizon)
    }

    pub fn query(&self) -> String {
        match self.horizon {
            Some(h) => format!("stream={}&horizon={}", self.stream, h),
            None => format!("stream={}", self.stream),
        }
    }

    pub fn href(&self) -> String {
        format!("{}?{}", DASHBOARD_PAGE, self.query())
    }
}

/// Horizon button row. Empty when the identifier has no horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonButton {
    pub delay: u64,
    pub current: bool,
    pub target: NavTarget,
}

pub fn horizon_buttons(id: &StreamId, delays: &Delays) -> Vec<HorizonButton> {
    let Some(current) = id.horizon else {
        return Vec::new();
    };
    let name = id.name();
    delays
        .iter()
        .map(|delay| HorizonButton {
            delay,
            current: delay == current,
            target: NavTarget::new(NavKind::Horizon, format!("{} sec", delay), name.clone(), Some(delay)),
        })
        .collect()
}

pub fn links(id: &StreamId, delays: &Delays) -> Vec<NavTarget> {
    let name = id.name();
    if id.horizon.is_some() {
        return vec![NavTarget::new(NavKind::GoToStream, "Go to Stream", name, None)];
    }

    let mut out = vec![NavTarget::new(
        NavKind::Competitions,
        "Go to Competitions",
        name.clone(),
        Some(delays.smallest()),
    )];

    match id.family {
        Family::Z1 => {
            if let Some(parent) = id.z1_parent() {
                out.push(NavTarget::new(NavKind::Parent, "Go to Parent", parent, None));
            }
        }
        Family::Z2 | Family::Z3 => {
            for component in id.components() {
                out.push(NavTarget::new(NavKind::Parent, component.clone(), component, None));
            }
        }
        Family::Plain => {
            for delay in delays.first_and_last() {
                out.push(NavTarget::new(
                    NavKind::GoToZ1,
                    format!("{} sec", delay),
                    format!("z1{}{}{}{}", SEGMENT_SEP, name, SEGMENT_SEP, delay),
                    None,
                ));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> StreamId {
        StreamId::from_display_name(s, &Delays::default()).unwrap()
    }

    #[test]
    fn test_horizon_gives_single_stream_link() {
        let l = links(&id("310::bart_delays"), &Delays::default());
        assert_eq!(l.len(), 1);
        assert_eq!(l[0].kind, NavKind::GoToStream);
        assert_eq!(l[0].href(), "stream_dashboard.html?stream=bart_delays");
    }

    #[test]
    fn test_plain_stream_offers_z1_links() {
        let l = links(&id("bart_delays"), &Delays::default());
        let hrefs: Vec<String> = l.iter().map(|t| t.href()).collect();
        assert_eq!(
            hrefs,
            vec![
                "stream_dashboard.html?stream=bart_delays&horizon=70",
                "stream_dashboard.html?stream=z1~bart_delays~70",
                "stream_dashboard.html?stream=z1~bart_delays~3555",
            ]
        );
    }

    #[test]
    fn test_z1_parent() {
        let l = links(&id("z1~bart_delays~70"), &Delays::default());
        assert_eq!(l[1].kind, NavKind::Parent);
        assert_eq!(l[1].stream, "bart_delays");
    }

    #[test]
    fn test_z1_parent_with_non_numeric_last_segment() {
        let l = links(&id("z1~a~b"), &Delays::default());
        let parents: Vec<&str> = l
            .iter()
            .filter(|t| t.kind == NavKind::Parent)
            .map(|t| t.stream.as_str())
            .collect();
        assert_eq!(parents, vec!["a"]);
        assert!(links(&id("z1~a"), &Delays::default()).iter().all(|t| t.kind != NavKind::Parent));
    }

    #[test]
    fn test_dashboard_target_for_listing_label() {
        let t = NavTarget::dashboard(&id("310::bart_delays"));
        assert_eq!(t.kind, NavKind::Listing);
        assert_eq!(t.label, "310::bart_delays");
        assert_eq!(t.href(), "stream_dashboard.html?stream=bart_delays&horizon=310");
        let t = NavTarget::dashboard(&id("z1~cop~70"));
        assert_eq!(t.href(), "stream_dashboard.html?stream=z1~cop~70");
    }

    #[test]
    fn test_z2_lists_each_component() {
        let l = links(&id("z2~three_body_x~three_body_y~910"), &Delays::default());
        let parents: Vec<&str> = l
            .iter()
            .filter(|t| t.kind == NavKind::Parent)
            .map(|t| t.stream.as_str())
            .collect();
        assert_eq!(parents, vec!["three_body_x", "three_body_y"]);
    }

    #[test]
    fn test_horizon_buttons_mark_current() {
        let b = horizon_buttons(&id("910::cop"), &Delays::default());
        assert_eq!(b.len(), 4);
        assert!(b.iter().filter(|x| x.current).all(|x| x.delay == 910));
        assert_eq!(b.iter().filter(|x| x.current).count(), 1);
        assert_eq!(b[0].target.href(), "stream_dashboard.html?stream=cop&horizon=70");
        assert!(horizon_buttons(&id("cop"), &Delays::default()).is_empty());
    }
}
