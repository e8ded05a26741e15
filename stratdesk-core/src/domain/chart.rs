//! Chart series types and timestamp coercion.
//!
//! The chart sink consumes times as UTC epoch **seconds**. Server payloads
//! are less disciplined: numbers may be milliseconds, and some revisions
//! send ISO-8601 strings. Coercion happens exactly once, here, before any
//! point reaches a sink.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric timestamps above this are taken to be milliseconds.
pub const MILLIS_CUTOFF: i64 = 2_000_000_000_000;

/// Normalize a raw timestamp value to UTC epoch seconds.
///
/// Numbers > 2·10¹² are divided by 1000; ISO-8601 strings parse as UTC;
/// anything else yields `None` and the point is dropped (and counted).
pub fn coerce_epoch_seconds(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(if i > MILLIS_CUTOFF { i / 1000 } else { i })
            } else {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    return None;
                }
                let secs = if f > MILLIS_CUTOFF as f64 { f / 1000.0 } else { f };
                Some(secs as i64)
            }
        }
        Value::String(s) => parse_iso_utc(s),
        _ => None,
    }
}

fn parse_iso_utc(s: &str) -> Option<i64> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt.and_utc().timestamp());
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt.and_utc().timestamp());
    }
    if let Ok(nd) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(nd.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
    }
    None
}

/// One candlestick, time in UTC epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One point of an indicator or equity/drawdown series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: i64,
    pub value: f64,
}

/// Whether a trade marker hangs above or below its bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MarkerPosition {
    #[serde(rename = "aboveBar")]
    AboveBar,
    #[serde(rename = "belowBar")]
    #[default]
    BelowBar,
}

/// Marker glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MarkerShape {
    #[serde(rename = "arrowUp")]
    ArrowUp,
    #[serde(rename = "arrowDown")]
    ArrowDown,
    #[serde(rename = "circle")]
    #[default]
    Circle,
    #[serde(rename = "square")]
    Square,
}

/// A buy/sell annotation on the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMarker {
    pub time: i64,
    pub position: MarkerPosition,
    pub shape: MarkerShape,
    pub color: String,
    pub label: String,
}

/// Everything a chart render needs, times already normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub ohlc: Vec<OhlcBar>,
    /// Named indicator series, in server order.
    pub indicators: Vec<(String, Vec<SeriesPoint>)>,
    pub markers: Vec<TradeMarker>,
    /// Points discarded because their timestamp could not be normalized.
    pub dropped_points: usize,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.ohlc.is_empty()
    }

    /// Push the full data set into a sink: clear, series, markers, fit.
    pub fn apply_to(&self, sink: &mut dyn ChartSink) {
        sink.clear();
        sink.set_candlesticks(&self.ohlc);
        for (name, points) in &self.indicators {
            sink.set_indicator_series(name, points);
        }
        sink.set_trade_markers(&self.markers);
        sink.fit_visible_range();
    }
}

/// The rendering surface the pages draw into. The core never renders; it
/// only guarantees that every `time` handed over is finite epoch seconds.
pub trait ChartSink {
    fn set_candlesticks(&mut self, bars: &[OhlcBar]);
    fn set_indicator_series(&mut self, name: &str, points: &[SeriesPoint]);
    fn set_trade_markers(&mut self, markers: &[TradeMarker]);
    fn clear(&mut self);
    fn fit_visible_range(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seconds_pass_through() {
        assert_eq!(coerce_epoch_seconds(&json!(1_700_000_000)), Some(1_700_000_000));
    }

    #[test]
    fn milliseconds_are_divided() {
        assert_eq!(
            coerce_epoch_seconds(&json!(2_100_000_000_123_i64)),
            Some(2_100_000_000)
        );
        assert_eq!(
            coerce_epoch_seconds(&json!(2_100_000_000_500.0)),
            Some(2_100_000_000)
        );
    }

    #[test]
    fn iso_strings_parse_as_utc() {
        assert_eq!(coerce_epoch_seconds(&json!("1970-01-01T00:00:10Z")), Some(10));
        assert_eq!(coerce_epoch_seconds(&json!("1970-01-01T00:00:10")), Some(10));
        assert_eq!(coerce_epoch_seconds(&json!("1970-01-02")), Some(86_400));
    }

    #[test]
    fn garbage_is_dropped() {
        assert_eq!(coerce_epoch_seconds(&json!(null)), None);
        assert_eq!(coerce_epoch_seconds(&json!("not a date")), None);
        assert_eq!(coerce_epoch_seconds(&json!([1, 2])), None);
        assert_eq!(coerce_epoch_seconds(&json!(f64::NAN)), None);
    }

    struct RecordingSink {
        calls: Vec<String>,
    }

    impl ChartSink for RecordingSink {
        fn set_candlesticks(&mut self, bars: &[OhlcBar]) {
            self.calls.push(format!("candles:{}", bars.len()));
        }
        fn set_indicator_series(&mut self, name: &str, points: &[SeriesPoint]) {
            self.calls.push(format!("indicator:{name}:{}", points.len()));
        }
        fn set_trade_markers(&mut self, markers: &[TradeMarker]) {
            self.calls.push(format!("markers:{}", markers.len()));
        }
        fn clear(&mut self) {
            self.calls.push("clear".into());
        }
        fn fit_visible_range(&mut self) {
            self.calls.push("fit".into());
        }
    }

    #[test]
    fn apply_clears_then_fits() {
        let data = ChartData {
            ohlc: vec![OhlcBar {
                time: 1,
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
                volume: 100.0,
            }],
            indicators: vec![("ema_10".into(), vec![SeriesPoint { time: 1, value: 1.2 }])],
            markers: vec![],
            dropped_points: 0,
        };
        let mut sink = RecordingSink { calls: vec![] };
        data.apply_to(&mut sink);
        assert_eq!(
            sink.calls,
            vec!["clear", "candles:1", "indicator:ema_10:1", "markers:0", "fit"]
        );
    }
}
