//! Bar-period enum with the UI/wire token split.
//!
//! The UI speaks `day`; the server speaks `D`. The rewrite happens once, at
//! the wire boundary, in [`Timeframe::wire_token`].

use serde::{Deserialize, Serialize};

/// Bar period of the historical series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1min")]
    Min1,
    #[serde(rename = "3min")]
    Min3,
    #[serde(rename = "5min")]
    Min5,
    #[serde(rename = "15min")]
    Min15,
    #[serde(rename = "30min")]
    Min30,
    #[serde(rename = "60min")]
    Min60,
    #[serde(rename = "day", alias = "D")]
    Day,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::Min1,
        Timeframe::Min3,
        Timeframe::Min5,
        Timeframe::Min15,
        Timeframe::Min30,
        Timeframe::Min60,
        Timeframe::Day,
    ];

    /// Token shown in the UI.
    pub fn ui_token(self) -> &'static str {
        match self {
            Timeframe::Min1 => "1min",
            Timeframe::Min3 => "3min",
            Timeframe::Min5 => "5min",
            Timeframe::Min15 => "15min",
            Timeframe::Min30 => "30min",
            Timeframe::Min60 => "60min",
            Timeframe::Day => "day",
        }
    }

    /// Token sent to the server. Identical to the UI token except `day` → `D`.
    pub fn wire_token(self) -> &'static str {
        match self {
            Timeframe::Day => "D",
            other => other.ui_token(),
        }
    }

    /// Parse either a UI token or the wire alias `D`.
    pub fn parse(s: &str) -> Option<Timeframe> {
        match s {
            "D" => return Some(Timeframe::Day),
            _ => {}
        }
        Timeframe::ALL.into_iter().find(|t| t.ui_token() == s)
    }

    pub fn next(self) -> Timeframe {
        let i = Timeframe::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Timeframe::ALL[(i + 1) % Timeframe::ALL.len()]
    }

    pub fn prev(self) -> Timeframe {
        let i = Timeframe::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Timeframe::ALL[(i + Timeframe::ALL.len() - 1) % Timeframe::ALL.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_alias_rewrite() {
        assert_eq!(Timeframe::Day.ui_token(), "day");
        assert_eq!(Timeframe::Day.wire_token(), "D");
        assert_eq!(Timeframe::Min15.wire_token(), "15min");
    }

    #[test]
    fn parse_accepts_both_tokens() {
        assert_eq!(Timeframe::parse("day"), Some(Timeframe::Day));
        assert_eq!(Timeframe::parse("D"), Some(Timeframe::Day));
        assert_eq!(Timeframe::parse("5min"), Some(Timeframe::Min5));
        assert_eq!(Timeframe::parse("2min"), None);
    }

    #[test]
    fn cycle_covers_all() {
        let mut t = Timeframe::Min1;
        for _ in 0..Timeframe::ALL.len() {
            t = t.next();
        }
        assert_eq!(t, Timeframe::Min1);
        assert_eq!(Timeframe::Min1.prev(), Timeframe::Day);
    }

    #[test]
    fn serde_round_trip() {
        let json = serde_json::to_string(&Timeframe::Day).unwrap();
        assert_eq!(json, "\"day\"");
        let t: Timeframe = serde_json::from_str("\"D\"").unwrap();
        assert_eq!(t, Timeframe::Day);
    }
}
