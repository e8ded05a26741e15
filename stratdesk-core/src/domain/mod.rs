//! Domain types shared by every page: instruments, timeframes, the run
//! context, chart series, and date-window helpers.

pub mod chart;
pub mod context;
pub mod dates;
pub mod instrument;
pub mod timeframe;

pub use chart::{ChartData, ChartSink, MarkerPosition, MarkerShape, OhlcBar, SeriesPoint, TradeMarker};
pub use context::RunContext;
pub use instrument::{Instrument, SymbolEntry};
pub use timeframe::Timeframe;
