//! Symbol entries and the instrument-kind whitelist.

use serde::{Deserialize, Serialize};

/// Instrument kind reported by the symbol master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Instrument {
    #[serde(rename = "EQ")]
    Equity,
    #[serde(rename = "INDEX")]
    Index,
    #[serde(rename = "FUTIDX")]
    IndexFuture,
    #[serde(rename = "FUTSTK")]
    StockFuture,
    #[serde(rename = "OPTIDX")]
    IndexOption,
    #[serde(rename = "OPTSTK")]
    StockOption,
    #[serde(other)]
    #[default]
    Unspecified,
}

impl Instrument {
    /// Kinds shown in the symbol dropdown. Everything else (including
    /// unspecified) is filtered out.
    pub fn is_tradeable(self) -> bool {
        !matches!(self, Instrument::Unspecified)
    }

    pub fn label(self) -> &'static str {
        match self {
            Instrument::Equity => "EQ",
            Instrument::Index => "INDEX",
            Instrument::IndexFuture => "FUTIDX",
            Instrument::StockFuture => "FUTSTK",
            Instrument::IndexOption => "OPTIDX",
            Instrument::StockOption => "OPTSTK",
            Instrument::Unspecified => "?",
        }
    }
}

/// One row of the symbol master. The `token` is the opaque backend id; the
/// `trading_symbol` is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub token: String,
    pub trading_symbol: String,
    #[serde(default)]
    pub instrument: Instrument,
}

/// Apply the instrument whitelist to a fetched symbol list.
pub fn filter_tradeable(all: &[SymbolEntry]) -> Vec<SymbolEntry> {
    all.iter()
        .filter(|s| s.instrument.is_tradeable())
        .cloned()
        .collect()
}

/// Re-insert a token that the whitelist dropped, but only if the unfiltered
/// fetch actually contains it. Returns true if the token ended up present.
pub fn ensure_token_present(
    filtered: &mut Vec<SymbolEntry>,
    all: &[SymbolEntry],
    token: &str,
) -> bool {
    if filtered.iter().any(|s| s.token == token) {
        return true;
    }
    if let Some(entry) = all.iter().find(|s| s.token == token) {
        filtered.insert(0, entry.clone());
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(token: &str, instrument: Instrument) -> SymbolEntry {
        SymbolEntry {
            token: token.into(),
            trading_symbol: format!("SYM{token}"),
            instrument,
        }
    }

    #[test]
    fn unknown_instrument_parses_as_unspecified() {
        let s: SymbolEntry = serde_json::from_str(
            r#"{"token":"2885","trading_symbol":"RELIANCE-EQ","instrument":"AMXIDX"}"#,
        )
        .unwrap();
        assert_eq!(s.instrument, Instrument::Unspecified);
    }

    #[test]
    fn missing_instrument_defaults_to_unspecified() {
        let s: SymbolEntry =
            serde_json::from_str(r#"{"token":"2885","trading_symbol":"RELIANCE-EQ"}"#).unwrap();
        assert_eq!(s.instrument, Instrument::Unspecified);
    }

    #[test]
    fn whitelist_drops_unspecified() {
        let all = vec![
            entry("1", Instrument::Equity),
            entry("2", Instrument::Unspecified),
            entry("3", Instrument::IndexFuture),
        ];
        let filtered = filter_tradeable(&all);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|s| s.instrument.is_tradeable()));
    }

    #[test]
    fn dropped_default_token_is_reinserted() {
        let all = vec![
            entry("1", Instrument::Equity),
            entry("2", Instrument::Unspecified),
        ];
        let mut filtered = filter_tradeable(&all);
        assert!(ensure_token_present(&mut filtered, &all, "2"));
        assert_eq!(filtered[0].token, "2");
    }

    #[test]
    fn token_absent_from_fetch_stays_absent() {
        let all = vec![entry("1", Instrument::Equity)];
        let mut filtered = filter_tradeable(&all);
        assert!(!ensure_token_present(&mut filtered, &all, "99"));
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn present_token_is_not_duplicated() {
        let all = vec![entry("1", Instrument::Equity)];
        let mut filtered = filter_tradeable(&all);
        assert!(ensure_token_present(&mut filtered, &all, "1"));
        assert_eq!(filtered.len(), 1);
    }
}
